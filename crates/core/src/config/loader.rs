use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Prefix of environment overrides; nested keys use `__`.
const ENV_PREFIX: &str = "RESTREAMER_";

/// Read `path` and apply environment overrides on top of it, e.g.
/// `RESTREAMER_STORAGE__DOWNLOAD_LIMIT_KBPS=200`.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.is_file() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    layered(Toml::file(path))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Parse a TOML document alone, without environment overrides.
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

fn layered(file: figment::providers::Data<Toml>) -> Figment {
    Figment::new()
        .merge(file)
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
}
