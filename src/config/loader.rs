//! Configuration loading from disk.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::schema::{DeployConfig, Password, Settings};
use crate::config::validation::{validate_config, ValidationError};

/// Env file key holding the node RPC endpoint.
pub const URL_ENV_KEY: &str = "DEPLOY_URL";

/// Env file key holding the keystore password.
pub const PASSWORD_ENV_KEY: &str = "PASS_WALLET_OWNER";

/// Settings file consulted when none is given explicitly.
pub const DEFAULT_SETTINGS_PATH: &str = "deployer.toml";

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Env(PathBuf, dotenvy::Error),
    Io(PathBuf, std::io::Error),
    Parse(PathBuf, toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Env(path, e) => {
                write!(f, "Error loading env file {}: {}", path.display(), e)
            }
            ConfigError::Io(path, e) => write!(f, "IO error reading {}: {}", path.display(), e),
            ConfigError::Parse(path, e) => write!(f, "Parse error in {}: {}", path.display(), e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Where a run's configuration comes from.
#[derive(Debug, Clone)]
pub struct ConfigSources {
    /// Dotenv file with `DEPLOY_URL` and `PASS_WALLET_OWNER`.
    pub env_file: PathBuf,
    /// Explicit settings file. When `None`, `deployer.toml` is used if present.
    pub settings_file: Option<PathBuf>,
    /// Keystore path taking precedence over the settings file.
    pub keystore_override: Option<PathBuf>,
}

impl Default for ConfigSources {
    fn default() -> Self {
        Self {
            env_file: PathBuf::from(".env"),
            settings_file: None,
            keystore_override: None,
        }
    }
}

/// Parse a dotenv file into a key/value map.
///
/// The process environment is left untouched so business logic never reads
/// ambient variables. Unquoted values may contain inner whitespace
/// (`PASS_WALLET_OWNER=correct horse battery staple`).
pub fn load_env_file(path: &Path) -> Result<HashMap<String, String>, ConfigError> {
    let env_error = |e| ConfigError::Env(path.to_path_buf(), e);

    let content = fs::read_to_string(path).map_err(|e| env_error(dotenvy::Error::Io(e)))?;
    let normalized = content.lines().map(quote_spaced_value).collect::<Vec<_>>().join("\n");

    dotenvy::from_read_iter(normalized.as_bytes())
        .collect::<Result<HashMap<_, _>, _>>()
        .map_err(env_error)
}

/// Wrap an unquoted value with inner whitespace in double quotes.
///
/// Text after ` #` is an inline comment. Every other line is returned as is.
fn quote_spaced_value(line: &str) -> String {
    let trimmed = line.trim_start();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return line.to_string();
    }
    let Some((key, value)) = trimmed.split_once('=') else {
        return line.to_string();
    };

    let value = value.trim();
    if value.starts_with('"') || value.starts_with('\'') {
        return line.to_string();
    }
    let value = match value.find(" #") {
        Some(idx) => value[..idx].trim_end(),
        None => value,
    };
    if !value.contains(char::is_whitespace) {
        return line.to_string();
    }

    format!("{}=\"{}\"", key.trim_end(), value.replace('"', "\\\""))
}

/// Load settings from a TOML file.
pub fn load_settings(path: &Path) -> Result<Settings, ConfigError> {
    let content = fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
    toml::from_str(&content).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))
}

/// Load, merge and validate the configuration for one run.
pub fn load_config(sources: &ConfigSources) -> Result<DeployConfig, ConfigError> {
    let env = load_env_file(&sources.env_file)?;

    let settings = match &sources.settings_file {
        Some(path) => load_settings(path)?,
        None => {
            let default_path = Path::new(DEFAULT_SETTINGS_PATH);
            if default_path.exists() {
                load_settings(default_path)?
            } else {
                Settings::default()
            }
        }
    };

    let url = env.get(URL_ENV_KEY).map(|v| v.trim().to_string()).unwrap_or_default();
    let password = Password::new(env.get(PASSWORD_ENV_KEY).cloned().unwrap_or_default());

    let mut config = DeployConfig::from_parts(url, password, settings);
    if let Some(keystore) = &sources.keystore_override {
        config.wallet.keystore_path = keystore.clone();
    }

    validate_config(&config).map_err(ConfigError::Validation)?;

    tracing::debug!(
        env_file = %sources.env_file.display(),
        keystore = %config.wallet.keystore_path.display(),
        "Configuration loaded"
    );

    Ok(config)
}
