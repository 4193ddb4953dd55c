use env_logger::{Builder, Env};

/// `GAZECTL_LOG` takes precedence over `RUST_LOG`; both default to `info`.
pub fn init() {
    let env = Env::default()
        .filter_or("GAZECTL_LOG", std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()))
        .write_style("GAZECTL_LOG_STYLE");
    Builder::from_env(env).format_timestamp_millis().init();
}
