//! Deployment orchestration.
//!
//! # Design Decisions
//! - Fail fast: the first failing step ends the run
//! - Configuration is passed in explicitly, never read from the environment here
//! - The node session lives for exactly one `prepare` or `deploy` call

pub mod artifact;
pub mod procedure;

pub use artifact::load_bytecode;
pub use procedure::{
    resolve_context, unlock, DeployError, Deployer, DeploymentOutcome, DeploymentReceipt, InPhase,
    Phase,
};
