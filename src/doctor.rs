use std::{fs, path::Path};

use crate::config;

pub fn report() -> serde_json::Value {
    let uinput_ok = Path::new("/dev/uinput").exists();
    let in_input_group = check_in_input_group();
    let profile_path = config::user_profile_path();
    let profile_present = profile_path.as_ref().is_some_and(|p| p.exists());
    serde_json::json!({
        "uinput_present": uinput_ok,
        "input_group_member": in_input_group,
        "user_profile": profile_path,
        "user_profile_present": profile_present,
        "hints": {
            "udev_rule": "/etc/udev/rules.d/80-uinput.rules",
            "add_user_to_input_group": "sudo usermod -aG input $USER && newgrp input",
            "dry_run": "gazectl run --dry-run logs actions without a uinput device"
        }
    })
}

fn check_in_input_group() -> bool {
    match fs::read_to_string("/etc/group") {
        Ok(s) => member_of_input(&s, &whoami::username()),
        Err(_) => false,
    }
}

fn member_of_input(group_file: &str, user: &str) -> bool {
    group_file
        .lines()
        .filter(|line| line.starts_with("input:"))
        .any(|line| {
            line.split(':')
                .nth(3)
                .unwrap_or("")
                .split(',')
                .any(|u| u == user)
        })
}
