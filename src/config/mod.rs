//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! .env (DEPLOY_URL, PASS_WALLET_OWNER)   deployer.toml (optional tuning)
//!     → loader.rs (parse both, merge, apply CLI overrides)
//!     → validation.rs (semantic checks)
//!     → DeployConfig (validated, immutable)
//!     → passed by reference to the deployment procedure
//! ```
//!
//! # Design Decisions
//! - Config is built once at startup; nothing reads env vars afterwards
//! - All settings have defaults so the TOML file is optional
//! - Secrets are never deserialized through serde and never logged

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError, ConfigSources};
pub use schema::{DeployConfig, FeePolicy, NodeConfig, Password, Settings};
