//! Chain-specific types and error definitions.

use alloy::primitives::{Address, TxHash, U256};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

// Re-export the config types the chain layer consumes
pub use crate::config::schema::{FeePolicy, NodeConfig};

/// Chain ID type for strong typing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChainId(pub u64);

impl From<u64> for ChainId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<ChainId> for u64 {
    fn from(id: ChainId) -> Self {
        id.0
    }
}

/// Errors that can occur during keystore, RPC and submission operations.
#[derive(Debug, Error)]
pub enum BlockchainError {
    /// Keystore file does not exist.
    #[error("keystore file not found: {}", .0.display())]
    KeystoreNotFound(PathBuf),

    /// Keystore file exists but could not be read.
    #[error("failed to read keystore {}: {source}", .path.display())]
    KeystoreRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Keystore file is not an encrypted-key JSON document.
    #[error("keystore {} is not a valid key file: {reason}", .path.display())]
    KeystoreMalformed { path: PathBuf, reason: String },

    /// Password mismatch or corrupt ciphertext.
    #[error("failed to decrypt keystore (wrong password or corrupt key file): {0}")]
    Decryption(String),

    /// Invalid private key format or derivation error.
    #[error("Wallet error: {0}")]
    Wallet(String),

    /// Node URL could not be parsed.
    #[error("Invalid RPC URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Transport could not be established.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// RPC request failed.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// A network call exceeded its deadline.
    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    /// Transaction was not included within the confirmation window.
    #[error("Transaction {tx_hash} not confirmed within {after:?}")]
    ConfirmationTimeout { tx_hash: TxHash, after: Duration },

    /// Transaction was included but reverted on-chain.
    #[error("Transaction reverted: {0}")]
    Reverted(TxHash),

    /// Sender cannot pay for the worst-case gas cost.
    #[error("Insufficient funds for {address}: balance {balance} wei, required {required} wei")]
    InsufficientFunds {
        address: Address,
        balance: U256,
        required: U256,
    },

    /// Bytecode artifact missing, empty or not hex.
    #[error("Invalid bytecode: {0}")]
    Bytecode(String),

    /// Transaction could not be built or signed.
    #[error("Signing failed: {0}")]
    Signing(String),
}

/// Result type for blockchain operations.
pub type BlockchainResult<T> = Result<T, BlockchainError>;

/// Subset of a transaction receipt the deployer acts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxInclusion {
    /// Block the transaction was included in, if the node reports it.
    pub block_number: Option<u64>,
    /// Execution status (false = reverted).
    pub success: bool,
    /// Gas consumed by the transaction.
    pub gas_used: u64,
    /// Address of the created contract, for creation transactions.
    pub contract_address: Option<Address>,
}
