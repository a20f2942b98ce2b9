//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events with structured fields (address, chain_id, nonce, tx_hash)
//!
//! Consumers:
//!     → stderr, human-readable or JSON lines
//! ```
//!
//! # Design Decisions
//! - Structured fields instead of formatted strings
//! - Secrets (password, private key, URL credentials) never become fields

pub mod logging;
