//! Blockchain integration subsystem.
//!
//! # Data Flow
//! ```text
//! keystore file + password
//!     → wallet.rs (decrypt, derive address)
//!     → client.rs (scoped node session, every call with a deadline)
//!     → transaction.rs (params, sign, broadcast, wait for inclusion)
//! ```
//!
//! # Security Constraints
//! - Private keys ONLY from the encrypted keystore
//! - Never log private keys, passwords or URL credentials
//! - All RPC calls have configurable timeouts

pub mod client;
pub mod transaction;
pub mod types;
pub mod wallet;

pub use client::{AlloyConnector, Connector, NodeRpc, NodeSession};
pub use transaction::{ConfirmationPolicy, SignedDeployment, SigningContext, TxParams};
pub use types::{BlockchainError, BlockchainResult, ChainId, TxInclusion};
pub use wallet::Identity;
