use anyhow::{Result, anyhow};
use log::warn;
use pico_args::Arguments;
use std::{env, path::PathBuf};

use crate::actions::{Action, UinputSink};
use crate::config::{Profile, Screen};
use crate::dispatch::dispatch_action;
use crate::doctor;
use crate::pipeline::{self, RunOptions};

pub fn run() -> Result<()> {
    // No args -> general help
    if env::args().len() == 1 {
        print_help();
        return Ok(());
    }

    let mut pargs = Arguments::from_env();

    // Flags-based help (-h/--help)
    if pargs.contains("-h") || pargs.contains("--help") {
        print_help();
        return Ok(());
    }

    let subcmd = pargs.subcommand()?;
    let config: Option<PathBuf> = pargs
        .opt_value_from_str::<_, String>("--config")?
        .map(PathBuf::from);

    match subcmd.as_deref() {
        Some("help") => {
            let topic: Option<String> = pargs.opt_free_from_str()?;
            if let Some(t) = topic {
                print_subcmd_help(&t);
            } else {
                print_help();
            }
            Ok(())
        }

        Some("run") => {
            let opts = RunOptions {
                config,
                input: pargs
                    .opt_value_from_str("--input")?
                    .unwrap_or_else(|| "-".to_string()),
                screen: pargs.opt_value_from_fn("--screen", Screen::parse)?,
                dry_run: pargs.contains("--dry-run"),
                overlay: pargs
                    .opt_value_from_str::<_, String>("--overlay")?
                    .map(PathBuf::from),
            };
            warn_unused(pargs);
            pipeline::run(&opts)?;
            Ok(())
        }

        Some("check") => {
            warn_unused(pargs);
            let profile = Profile::load(config.as_deref())?;
            println!("{}", serde_json::to_string_pretty(&profile)?);
            Ok(())
        }

        Some("doctor") => {
            warn_unused(pargs);
            print_response(&doctor::report());
            Ok(())
        }

        Some("emit") => {
            // usage:
            //   gazectl emit click <left|right|double>
            //   gazectl emit scroll 3
            //   gazectl emit key CTRL+W
            //   gazectl emit move 960 540
            let what: String = pargs
                .free_from_str()
                .map_err(|_| anyhow!("usage: gazectl emit <click|scroll|key|move> ..."))?;
            let action = match what.as_str() {
                "click" => {
                    let btn: String = pargs.free_from_str().map_err(|_| {
                        anyhow!("usage: gazectl emit click <left|right|double>")
                    })?;
                    match btn.to_ascii_lowercase().as_str() {
                        "left" => Action::Click,
                        "right" => Action::RightClick,
                        "double" => Action::DoubleClick,
                        other => return Err(anyhow!("unknown click kind: {other}")),
                    }
                }
                "scroll" => {
                    let steps: i32 = pargs
                        .free_from_str()
                        .map_err(|_| anyhow!("usage: gazectl emit scroll <steps>"))?;
                    Action::Scroll(steps)
                }
                "key" => {
                    let chord: String = pargs
                        .free_from_str()
                        .map_err(|_| anyhow!("usage: gazectl emit key CTRL+W"))?;
                    Action::KeyChord(chord)
                }
                "move" => {
                    let x: f64 = pargs
                        .free_from_str()
                        .map_err(|_| anyhow!("usage: gazectl emit move <x> <y>"))?;
                    let y: f64 = pargs
                        .free_from_str()
                        .map_err(|_| anyhow!("usage: gazectl emit move <x> <y>"))?;
                    Action::MoveTo { x, y }
                }
                other => return Err(anyhow!("unknown emit kind: {other}")),
            };
            warn_unused(pargs);
            let profile = Profile::load(config.as_deref())?;
            let mut sink = UinputSink::new(profile.screen)?;
            dispatch_action(&action, &mut sink)?;
            println!("ok: {action:?}");
            Ok(())
        }

        Some(other) => {
            eprintln!("unknown subcommand: {other}\n");
            print_help();
            Ok(())
        }

        None => {
            print_help();
            Ok(())
        }
    }
}

fn warn_unused(pargs: Arguments) {
    let rest = pargs.finish();
    if !rest.is_empty() {
        warn!("ignoring unexpected arguments: {rest:?}");
    }
}

fn print_help() {
    println!(
        r#"gazectl — hands-free pointer control from eye landmarks

USAGE:
  gazectl help [command]                   Show general or command-specific help
  gazectl run [options]                    Run the gaze/blink control loop
  gazectl check [--config P]               Validate a profile and print it
  gazectl doctor                           Diagnose uinput permissions
  gazectl emit click <left|right|double>   Emit a mouse click
  gazectl emit scroll <steps>              Emit vertical scroll (+/- steps)
  gazectl emit key CTRL+W                  Emit a key or chord
  gazectl emit move <x> <y>                Move the pointer to screen pixels

RUN OPTIONS:
  --input <path|->     Landmark frames as JSON lines (default: stdin)
  --config <path>      Profile TOML (default: ~/.config/gazectl/profile.toml, else builtin)
  --screen <WxH>       Override the profile's screen size
  --overlay <path>     Write per-frame overlay state as JSON lines
  --dry-run            Log actions instead of injecting them

GESTURES:
  blink x1 click, x2 double-click, x3 pause/resume, x4+ right-click
  close right eye      hold left button (drag/select) until it opens
  close both eyes 5s   shut down
  look up/down         scroll
"#
    );
}

fn print_subcmd_help(cmd: &str) {
    match cmd {
        "run" => println!(
            "usage: gazectl run [--input P|-] [--config P] [--screen WxH] [--overlay P] [--dry-run]\nReads landmark frames and drives the pointer until end of stream, shutdown gesture or Ctrl-C."
        ),
        "check" => println!(
            "usage: gazectl check [--config P]\nValidates the effective profile and prints it as JSON."
        ),
        "doctor" => println!(
            "usage: gazectl doctor\nChecks /dev/uinput, input group membership and the profile location."
        ),
        "emit" => println!(
            "usage:\n  gazectl emit click <left|right|double>\n  gazectl emit scroll <steps>\n  gazectl emit key CTRL+W\n  gazectl emit move <x> <y>"
        ),
        _ => {
            eprintln!("unknown command: {cmd}\n");
            print_help();
        }
    }
}

fn print_response(v: &serde_json::Value) {
    println!("{}", serde_json::to_string_pretty(v).unwrap_or_default());
}
