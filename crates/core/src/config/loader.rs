use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::{Path, PathBuf};
use tracing::debug;

use super::{types::Config, ConfigError};

/// Prefix for environment overrides. Nested keys are separated by `__`,
/// e.g. `GRAPHRELAY_JOBS__TIMEOUT_SECS=600`.
pub const ENV_PREFIX: &str = "GRAPHRELAY_";

/// Variable naming the config file. Not itself a config key.
pub const CONFIG_PATH_VAR: &str = "GRAPHRELAY_CONFIG";

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Config file location: `$GRAPHRELAY_CONFIG`, else `config.toml`.
pub fn config_path() -> PathBuf {
    std::env::var_os(CONFIG_PATH_VAR)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// TOML file first, then `GRAPHRELAY_*` overrides on top.
fn figment(path: &Path) -> Figment {
    Figment::new().merge(Toml::file(path)).merge(
        Env::prefixed(ENV_PREFIX)
            .ignore(&["CONFIG"])
            .split("__"),
    )
}

/// Load configuration from file with environment variable overrides
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    let config: Config = figment(path).extract().map_err(parse_error)?;
    debug!("Configuration read from {:?}", path);
    Ok(config)
}

/// Load configuration from a TOML string, without environment overrides.
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.message().to_string()))
}

/// Names the offending key when figment knows it, so
/// `GRAPHRELAY_JOBS__TIMEOUT_SECS=soon` reports `jobs.timeout_secs`.
fn parse_error(e: figment::Error) -> ConfigError {
    if e.path.is_empty() {
        ConfigError::ParseError(e.kind.to_string())
    } else {
        ConfigError::InvalidValue {
            key: e.path.join("."),
            message: e.kind.to_string(),
        }
    }
}
