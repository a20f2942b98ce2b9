//! Contract creation bytecode loading.
//!
//! Accepts either a plain hex file (`0x` prefix optional, whitespace ignored)
//! or a compiler JSON artifact with `bytecode` as a string or as
//! `{ "object": "0x..." }` (solc / Foundry layout).

use alloy::primitives::{hex, Bytes};
use serde::Deserialize;
use std::path::Path;

use crate::blockchain::types::{BlockchainError, BlockchainResult};

#[derive(Deserialize)]
struct Artifact {
    bytecode: ArtifactBytecode,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ArtifactBytecode {
    Hex(String),
    Object { object: String },
}

/// Read creation bytecode from `path`.
pub fn load_bytecode(path: &Path) -> BlockchainResult<Bytes> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| BlockchainError::Bytecode(format!("{}: {}", path.display(), e)))?;
    parse_bytecode(&content)
}

/// Parse creation bytecode from hex text or a JSON artifact.
pub fn parse_bytecode(content: &str) -> BlockchainResult<Bytes> {
    let trimmed = content.trim();

    let hex_text = if trimmed.starts_with('{') {
        let artifact: Artifact = serde_json::from_str(trimmed)
            .map_err(|e| BlockchainError::Bytecode(format!("invalid artifact JSON: {}", e)))?;
        match artifact.bytecode {
            ArtifactBytecode::Hex(s) => s,
            ArtifactBytecode::Object { object } => object,
        }
    } else {
        trimmed.to_string()
    };

    let compact: String = hex_text.chars().filter(|c| !c.is_whitespace()).collect();
    let digits = compact.strip_prefix("0x").unwrap_or(&compact);
    if digits.is_empty() {
        return Err(BlockchainError::Bytecode("bytecode is empty".to_string()));
    }

    hex::decode(digits)
        .map(Bytes::from)
        .map_err(|e| BlockchainError::Bytecode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_hex_with_prefix_and_newlines() {
        let bytes = parse_bytecode("0x6080\n6040\n").unwrap();
        assert_eq!(bytes.as_ref(), &[0x60, 0x80, 0x60, 0x40]);
    }

    #[test]
    fn test_plain_hex_without_prefix() {
        let bytes = parse_bytecode("600a").unwrap();
        assert_eq!(bytes.as_ref(), &[0x60, 0x0a]);
    }

    #[test]
    fn test_foundry_artifact() {
        let json = r#"{"abi": [], "bytecode": {"object": "0x6001", "linkReferences": {}}}"#;
        assert_eq!(parse_bytecode(json).unwrap().as_ref(), &[0x60, 0x01]);
    }

    #[test]
    fn test_flat_artifact() {
        let json = r#"{"contractName": "Counter", "bytecode": "0x6002"}"#;
        assert_eq!(parse_bytecode(json).unwrap().as_ref(), &[0x60, 0x02]);
    }

    #[test]
    fn test_empty_bytecode_rejected() {
        assert!(matches!(parse_bytecode("0x"), Err(BlockchainError::Bytecode(_))));
        assert!(matches!(parse_bytecode("  \n"), Err(BlockchainError::Bytecode(_))));
    }

    #[test]
    fn test_non_hex_rejected() {
        assert!(parse_bytecode("0xzz").is_err());
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_bytecode(&dir.path().join("Counter.bin")).unwrap_err();
        assert!(err.to_string().contains("Counter.bin"));
    }
}
