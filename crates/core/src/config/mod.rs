//! Engine configuration.
//!
//! A TOML file provides the sections (`[search]`, `[control_plane]`,
//! `[streaming]`, `[storage]`, `[transcoder]`, `[extractor]`,
//! `[orchestrator]`, `[server]`); `RESTREAMER_*` environment variables
//! override individual keys. Only `[search]` is mandatory.

mod loader;
mod types;
mod validate;

pub use loader::{load_config, load_config_from_str};
pub use types::*;
pub use validate::validate_config;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file {0} does not exist")]
    FileNotFound(String),

    #[error("invalid configuration: {0}")]
    ParseError(String),

    #[error("configuration rejected: {0}")]
    ValidationError(String),
}
