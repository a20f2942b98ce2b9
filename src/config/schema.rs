//! Configuration schema definitions.
//!
//! Tuning knobs live in an optional TOML settings file and deserialize into
//! [`Settings`]. Secrets (node URL, keystore password) never go through serde;
//! the loader merges them in from the dotenv file to produce a [`DeployConfig`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Keystore file the deployer unlocks when nothing else is configured.
pub const DEFAULT_KEYSTORE_PATH: &str =
    "./UTC--2025-01-14T11-02-41.636529300Z--0d518a4c445bbfad90c8382a051a91087d930253";

/// Base fee added on top of the tip to form the fee cap (wei).
pub const DEFAULT_BASE_FEE_WEI: u64 = 20_000_000;

/// Priority fee paid to the block producer (wei, 1 gwei).
pub const DEFAULT_TIP_WEI: u64 = 1_000_000_000;

/// Gas limit for the contract-creation transaction.
pub const DEFAULT_GAS_LIMIT: u64 = 5_000_000;

/// Fully resolved configuration for one deployer run.
#[derive(Debug, Clone)]
pub struct DeployConfig {
    /// Node JSON-RPC endpoint (`DEPLOY_URL`).
    pub url: String,

    /// Keystore decryption secret (`PASS_WALLET_OWNER`).
    pub password: Password,

    pub wallet: WalletConfig,
    pub node: NodeConfig,
    pub fees: FeePolicy,
    pub observability: ObservabilityConfig,
}

impl DeployConfig {
    /// Combine secrets from the env file with the file-based settings.
    pub fn from_parts(url: String, password: Password, settings: Settings) -> Self {
        Self {
            url,
            password,
            wallet: settings.wallet,
            node: settings.node,
            fees: settings.fees,
            observability: settings.observability,
        }
    }
}

/// Keystore password. Kept out of `Debug` output and logs.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Password(String);

impl Password {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// Borrow the secret for decryption.
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(<redacted>)")
    }
}

/// Root of the optional TOML settings file.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Keystore location.
    pub wallet: WalletConfig,

    /// Node connection and confirmation settings.
    pub node: NodeConfig,

    /// Fee policy for the deployment transaction.
    pub fees: FeePolicy,

    /// Logging settings.
    pub observability: ObservabilityConfig,
}

/// Wallet configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct WalletConfig {
    /// Path to the encrypted keystore JSON file.
    pub keystore_path: PathBuf,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            keystore_path: PathBuf::from(DEFAULT_KEYSTORE_PATH),
        }
    }
}

/// Node connection configuration. Every network call is bounded by one of
/// these deadlines.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct NodeConfig {
    /// Deadline for establishing the connection, in seconds.
    pub connect_timeout_secs: u64,

    /// Deadline for each individual RPC call, in seconds.
    pub rpc_timeout_secs: u64,

    /// Total time to wait for the deployment to be included, in seconds.
    pub confirmation_timeout_secs: u64,

    /// Receipt polling interval in milliseconds.
    pub poll_interval_ms: u64,

    /// Blocks that must be built on top of the inclusion block (0 = included is enough).
    pub confirmation_blocks: u64,
}

impl NodeConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_secs(self.rpc_timeout_secs)
    }

    pub fn confirmation_timeout(&self) -> Duration {
        Duration::from_secs(self.confirmation_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 10,
            rpc_timeout_secs: 15,
            confirmation_timeout_secs: 120,
            poll_interval_ms: 2_000,
            confirmation_blocks: 0,
        }
    }
}

/// Fixed fee policy.
///
/// These are policy values, not live fee-market data: the fee cap is always
/// `base_fee_wei + tip_wei` regardless of the chain's current base fee.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct FeePolicy {
    /// Base fee component of the fee cap, in wei.
    pub base_fee_wei: u64,

    /// Priority fee (tip cap), in wei.
    pub tip_wei: u64,

    /// Gas limit for the deployment transaction.
    pub gas_limit: u64,
}

impl Default for FeePolicy {
    fn default() -> Self {
        Self {
            base_fee_wei: DEFAULT_BASE_FEE_WEI,
            tip_wei: DEFAULT_TIP_WEI,
            gas_limit: DEFAULT_GAS_LIMIT,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit logs as JSON lines instead of the human-readable format.
    pub json: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_fee_policy() {
        let fees = FeePolicy::default();
        assert_eq!(fees.base_fee_wei, 20_000_000);
        assert_eq!(fees.tip_wei, 1_000_000_000);
        assert_eq!(fees.gas_limit, 5_000_000);
    }

    #[test]
    fn test_partial_settings_fill_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [node]
            rpc_timeout_secs = 3

            [fees]
            gas_limit = 3000000
            "#,
        )
        .unwrap();

        assert_eq!(settings.node.rpc_timeout_secs, 3);
        assert_eq!(settings.node.connect_timeout_secs, 10);
        assert_eq!(settings.fees.gas_limit, 3_000_000);
        assert_eq!(settings.fees.tip_wei, DEFAULT_TIP_WEI);
        assert_eq!(settings.wallet.keystore_path, PathBuf::from(DEFAULT_KEYSTORE_PATH));
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let result: Result<Settings, _> = toml::from_str("[fees]\nbase_fee = 1\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_password_not_in_debug_output() {
        let password = Password::new("hunter2");
        let rendered = format!("{:?}", password);
        assert!(!rendered.contains("hunter2"));
        assert_eq!(password.expose(), "hunter2");
    }
}
