//! Timeout enforcement.
//!
//! # Responsibilities
//! - Wrap every node call with a deadline
//! - Cancel the in-flight call cleanly when the deadline passes
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - Timeout errors are distinct from RPC errors and name the operation

use std::future::Future;
use std::time::Duration;

use crate::blockchain::types::{BlockchainError, BlockchainResult};

/// Run `fut` under `deadline`, mapping expiry to [`BlockchainError::Timeout`].
pub async fn with_timeout<F, T>(
    operation: &'static str,
    deadline: Duration,
    fut: F,
) -> BlockchainResult<T>
where
    F: Future<Output = BlockchainResult<T>>,
{
    match tokio::time::timeout(deadline, fut).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(
                operation,
                timeout_ms = deadline.as_millis() as u64,
                "Node call timed out"
            );
            Err(BlockchainError::Timeout {
                operation,
                after: deadline,
            })
        }
    }
}
