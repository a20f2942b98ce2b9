//! Signing identity loaded from an encrypted keystore.
//!
//! # Security
//! - The private key is only ever obtained by decrypting the keystore file
//! - Keys are never logged or serialized; `Debug` shows the address only
//! - A failed decryption yields no identity at all

use alloy::network::EthereumWallet;
use alloy::primitives::Address;
use alloy::signers::local::{LocalSignerError, PrivateKeySigner};
use eth_keystore::KeystoreError;
use std::path::Path;

use crate::blockchain::types::{BlockchainError, BlockchainResult};

/// The private key and the address derived from it.
pub struct Identity {
    signer: PrivateKeySigner,
}

impl Identity {
    /// Decrypt a keystore file with `password`.
    ///
    /// # Errors
    /// - [`BlockchainError::KeystoreNotFound`] if the file does not exist
    /// - [`BlockchainError::KeystoreRead`] if it cannot be read
    /// - [`BlockchainError::KeystoreMalformed`] if it is not a keystore document
    /// - [`BlockchainError::Decryption`] on password mismatch or corrupt ciphertext
    pub fn from_keystore(path: &Path, password: &str) -> BlockchainResult<Self> {
        std::fs::metadata(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => BlockchainError::KeystoreNotFound(path.to_path_buf()),
            _ => BlockchainError::KeystoreRead {
                path: path.to_path_buf(),
                source: e,
            },
        })?;

        tracing::debug!(keystore = %path.display(), "Decrypting keystore");

        // Single read: the decryptor parses and decrypts the same bytes.
        let signer = PrivateKeySigner::decrypt_keystore(path, password)
            .map_err(|e| keystore_error(path, e))?;

        let identity = Self { signer };
        tracing::info!(address = %identity.address(), "Wallet unlocked");

        Ok(identity)
    }

    /// Create an identity from a hex-encoded private key string.
    ///
    /// # Arguments
    /// * `private_key_hex` - Hex string (with or without 0x prefix)
    pub fn from_private_key(private_key_hex: &str) -> BlockchainResult<Self> {
        let key_hex = private_key_hex.strip_prefix("0x").unwrap_or(private_key_hex);

        let signer: PrivateKeySigner = key_hex
            .parse()
            .map_err(|e| BlockchainError::Wallet(format!("Invalid private key format: {}", e)))?;

        Ok(Self { signer })
    }

    /// Get the derived address.
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// Network wallet used to sign transactions with this key.
    pub fn wallet(&self) -> EthereumWallet {
        EthereumWallet::from(self.signer.clone())
    }
}

/// Sort a decryptor failure into read, shape and password errors.
fn keystore_error(path: &Path, err: LocalSignerError) -> BlockchainError {
    match err {
        LocalSignerError::EthKeystoreError(inner) => match inner {
            KeystoreError::StdIo(msg) => BlockchainError::KeystoreRead {
                path: path.to_path_buf(),
                source: std::io::Error::other(msg),
            },
            KeystoreError::SerdeJson(reason) => BlockchainError::KeystoreMalformed {
                path: path.to_path_buf(),
                reason,
            },
            params @ (KeystoreError::ScryptInvalidParams(_)
            | KeystoreError::ScryptInvalidOuputLen(_)
            | KeystoreError::AesInvalidKeyNonceLength(_)) => BlockchainError::KeystoreMalformed {
                path: path.to_path_buf(),
                reason: params.to_string(),
            },
            other => BlockchainError::Decryption(other.to_string()),
        },
        LocalSignerError::IoError(source) => BlockchainError::KeystoreRead {
            path: path.to_path_buf(),
            source,
        },
        other => BlockchainError::Decryption(other.to_string()),
    }
}

impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Identity")
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}
