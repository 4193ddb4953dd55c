use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse profile: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid profile: {0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum ActuationError {
    #[error("uinput device error: {0}")]
    Device(#[from] uinput::Error),

    #[error("unsupported key token: {0}")]
    UnsupportedKey(String),

    #[error("empty key chord")]
    EmptyChord,
}
