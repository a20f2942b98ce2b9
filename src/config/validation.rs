//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check that both env secrets are present and non-empty
//! - Validate the node URL and its scheme
//! - Validate value ranges (timeouts > 0, gas limit covers contract creation)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: DeployConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is handed to the deployment procedure

use std::fmt;

use crate::config::loader::{PASSWORD_ENV_KEY, URL_ENV_KEY};
use crate::config::schema::DeployConfig;

/// Intrinsic gas of a contract-creation transaction with empty init code.
pub const MIN_CREATE_GAS: u64 = 53_000;

/// URL schemes the node connector understands.
const SUPPORTED_SCHEMES: &[&str] = &["http", "https", "ws", "wss"];

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Required env key absent or empty.
    MissingKey(&'static str),
    /// Node URL does not parse.
    InvalidUrl { url: String, reason: String },
    /// Node URL parses but uses a transport we cannot dial.
    UnsupportedScheme(String),
    /// A duration or interval that must be positive is zero.
    ZeroValue(&'static str),
    /// Gas limit below the intrinsic cost of a deployment.
    GasLimitTooLow { gas_limit: u64, minimum: u64 },
    /// Keystore path is empty.
    EmptyKeystorePath,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::MissingKey(key) => write!(f, "{} is missing or empty", key),
            ValidationError::InvalidUrl { url, reason } => {
                write!(f, "invalid node URL '{}': {}", url, reason)
            }
            ValidationError::UnsupportedScheme(scheme) => write!(
                f,
                "unsupported node URL scheme '{}' (expected one of {})",
                scheme,
                SUPPORTED_SCHEMES.join(", ")
            ),
            ValidationError::ZeroValue(field) => write!(f, "{} must be greater than zero", field),
            ValidationError::GasLimitTooLow { gas_limit, minimum } => write!(
                f,
                "gas limit {} is below the {} needed to create a contract",
                gas_limit, minimum
            ),
            ValidationError::EmptyKeystorePath => write!(f, "keystore path is empty"),
        }
    }
}

/// Validate a fully merged configuration.
pub fn validate_config(config: &DeployConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.url.trim().is_empty() {
        errors.push(ValidationError::MissingKey(URL_ENV_KEY));
    } else {
        match url::Url::parse(config.url.trim()) {
            Ok(url) if !SUPPORTED_SCHEMES.contains(&url.scheme()) => {
                errors.push(ValidationError::UnsupportedScheme(url.scheme().to_string()));
            }
            Ok(_) => {}
            Err(e) => errors.push(ValidationError::InvalidUrl {
                url: config.url.clone(),
                reason: e.to_string(),
            }),
        }
    }

    if config.password.is_empty() {
        errors.push(ValidationError::MissingKey(PASSWORD_ENV_KEY));
    }

    if config.wallet.keystore_path.as_os_str().is_empty() {
        errors.push(ValidationError::EmptyKeystorePath);
    }

    let node = &config.node;
    for (field, value) in [
        ("node.connect_timeout_secs", node.connect_timeout_secs),
        ("node.rpc_timeout_secs", node.rpc_timeout_secs),
        ("node.confirmation_timeout_secs", node.confirmation_timeout_secs),
        ("node.poll_interval_ms", node.poll_interval_ms),
    ] {
        if value == 0 {
            errors.push(ValidationError::ZeroValue(field));
        }
    }

    if config.fees.gas_limit < MIN_CREATE_GAS {
        errors.push(ValidationError::GasLimitTooLow {
            gas_limit: config.fees.gas_limit,
            minimum: MIN_CREATE_GAS,
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{Password, Settings};

    fn valid_config() -> DeployConfig {
        DeployConfig::from_parts(
            "http://localhost:8545".to_string(),
            Password::new("secret"),
            Settings::default(),
        )
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn test_websocket_url_accepted() {
        let mut config = valid_config();
        config.url = "wss://node.example.org/ws".to_string();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_reports_every_problem() {
        let mut config = valid_config();
        config.url = String::new();
        config.password = Password::default();
        config.node.rpc_timeout_secs = 0;
        config.fees.gas_limit = 21_000;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors.contains(&ValidationError::MissingKey(URL_ENV_KEY)));
        assert!(errors.contains(&ValidationError::MissingKey(PASSWORD_ENV_KEY)));
        assert!(errors.contains(&ValidationError::ZeroValue("node.rpc_timeout_secs")));
        assert!(errors.contains(&ValidationError::GasLimitTooLow {
            gas_limit: 21_000,
            minimum: MIN_CREATE_GAS
        }));
    }

    #[test]
    fn test_rejects_unsupported_scheme() {
        let mut config = valid_config();
        config.url = "ftp://localhost:8545".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors, vec![ValidationError::UnsupportedScheme("ftp".to_string())]);
    }

    #[test]
    fn test_rejects_unparseable_url() {
        let mut config = valid_config();
        config.url = "http://".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(matches!(errors.as_slice(), [ValidationError::InvalidUrl { .. }]));
    }
}
