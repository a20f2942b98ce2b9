//! Contract deployer library: keystore unlock, node session, signing context
//! and contract-creation submission.

pub mod blockchain;
pub mod config;
pub mod deploy;
pub mod observability;
pub mod resilience;

pub use config::schema::DeployConfig;
pub use deploy::{DeployError, Deployer, Phase};
