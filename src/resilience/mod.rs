//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Call to node:
//!     → timeouts.rs (enforce connect / per-call / confirmation deadline)
//!     → on expiry: BlockchainError::Timeout, fatal for the run
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every external call has a deadline
//! - No retries: a failed run is re-run from scratch so the nonce is re-read

pub mod timeouts;
