//! Shared utilities for integration tests: an in-memory node behind the
//! `Connector` / `NodeRpc` seams, plus config and key fixtures.

#![allow(dead_code)]

use alloy::primitives::{keccak256, Address, Bytes, TxHash, U256};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use url::Url;

use contract_deployer::blockchain::{
    BlockchainError, BlockchainResult, ChainId, Connector, Identity, NodeRpc, TxInclusion,
};
use contract_deployer::config::{DeployConfig, NodeConfig, Password, Settings};

/// Anvil's first dev account.
pub const TEST_PRIVATE_KEY: &str =
    "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
pub const TEST_ADDRESS: &str = "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266";

/// Password of `tests/fixtures/keystore.json` (which wraps `TEST_PRIVATE_KEY`).
pub const FIXTURE_PASSWORD: &str = "correct horse battery staple";

pub fn fixture_keystore() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/keystore.json")
}

pub fn test_identity() -> Identity {
    Identity::from_private_key(TEST_PRIVATE_KEY).unwrap()
}

pub fn test_address() -> Address {
    TEST_ADDRESS.parse().unwrap()
}

/// Config pointing at the fixture keystore with short deadlines.
pub fn test_config() -> DeployConfig {
    let mut settings = Settings::default();
    settings.wallet.keystore_path = fixture_keystore();
    settings.node = NodeConfig {
        connect_timeout_secs: 1,
        rpc_timeout_secs: 1,
        confirmation_timeout_secs: 1,
        poll_interval_ms: 10,
        confirmation_blocks: 0,
    };
    DeployConfig::from_parts(
        "http://fake-node.invalid:8545".to_string(),
        Password::new(FIXTURE_PASSWORD),
        settings,
    )
}

/// What the fake node does with broadcast transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiptMode {
    /// Included in the next block, successful.
    Mined,
    /// Included in the next block, reverted.
    Reverted,
    /// Never included.
    Never,
}

#[derive(Debug)]
pub struct ChainState {
    pub chain_id: u64,
    pub chain_id_error: Option<String>,
    pub chain_id_hangs: bool,
    pub nonce: u64,
    pub nonce_error: Option<String>,
    pub balance: U256,
    pub block_number: u64,
    pub refuse_connections: bool,
    pub receipt_mode: ReceiptMode,
    pub sent: Vec<Bytes>,
    pub receipts: HashMap<TxHash, TxInclusion>,
}

/// In-memory node for a single funded account.
#[derive(Debug)]
pub struct FakeChain {
    pub account: Address,
    pub state: Mutex<ChainState>,
    pub opened: AtomicUsize,
    pub released: AtomicUsize,
}

impl FakeChain {
    pub fn new(chain_id: u64, nonce: u64) -> Arc<Self> {
        Arc::new(Self {
            account: test_address(),
            state: Mutex::new(ChainState {
                chain_id,
                chain_id_error: None,
                chain_id_hangs: false,
                nonce,
                nonce_error: None,
                balance: U256::from(10u64).pow(U256::from(18u64)),
                block_number: 100,
                refuse_connections: false,
                receipt_mode: ReceiptMode::Mined,
                sent: Vec::new(),
                receipts: HashMap::new(),
            }),
            opened: AtomicUsize::new(0),
            released: AtomicUsize::new(0),
        })
    }

    pub fn with_state(&self, f: impl FnOnce(&mut ChainState)) {
        f(&mut self.state.lock().unwrap());
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    pub fn sent_count(&self) -> usize {
        self.state.lock().unwrap().sent.len()
    }

    pub fn connector(self: &Arc<Self>) -> FakeConnector {
        FakeConnector { chain: self.clone() }
    }
}

pub struct FakeConnector {
    chain: Arc<FakeChain>,
}

#[async_trait]
impl Connector for FakeConnector {
    type Rpc = FakeRpc;

    async fn connect(&self, _url: &Url) -> BlockchainResult<FakeRpc> {
        if self.chain.state.lock().unwrap().refuse_connections {
            return Err(BlockchainError::Connection("connection refused".to_string()));
        }
        self.chain.opened.fetch_add(1, Ordering::SeqCst);
        Ok(FakeRpc {
            chain: self.chain.clone(),
        })
    }
}

pub struct FakeRpc {
    chain: Arc<FakeChain>,
}

impl Drop for FakeRpc {
    fn drop(&mut self) {
        self.chain.released.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl NodeRpc for FakeRpc {
    async fn chain_id(&self) -> BlockchainResult<ChainId> {
        let (hangs, result) = {
            let state = self.chain.state.lock().unwrap();
            let result = match &state.chain_id_error {
                Some(msg) => Err(BlockchainError::Rpc(msg.clone())),
                None => Ok(ChainId(state.chain_id)),
            };
            (state.chain_id_hangs, result)
        };
        if hangs {
            std::future::pending::<()>().await;
        }
        result
    }

    async fn pending_nonce(&self, address: Address) -> BlockchainResult<u64> {
        let state = self.chain.state.lock().unwrap();
        if let Some(msg) = &state.nonce_error {
            return Err(BlockchainError::Rpc(msg.clone()));
        }
        if address == self.chain.account {
            Ok(state.nonce)
        } else {
            Ok(0)
        }
    }

    async fn balance(&self, address: Address) -> BlockchainResult<U256> {
        let state = self.chain.state.lock().unwrap();
        if address == self.chain.account {
            Ok(state.balance)
        } else {
            Ok(U256::ZERO)
        }
    }

    async fn block_number(&self) -> BlockchainResult<u64> {
        Ok(self.chain.state.lock().unwrap().block_number)
    }

    async fn send_raw_transaction(&self, raw: &[u8]) -> BlockchainResult<TxHash> {
        let mut state = self.chain.state.lock().unwrap();
        let tx_hash = keccak256(raw);
        let contract_address = self.chain.account.create(state.nonce);

        state.sent.push(Bytes::copy_from_slice(raw));
        state.nonce += 1;
        state.block_number += 1;

        let block_number = Some(state.block_number);
        let mode = state.receipt_mode;
        match mode {
            ReceiptMode::Mined => {
                state.receipts.insert(
                    tx_hash,
                    TxInclusion {
                        block_number,
                        success: true,
                        gas_used: 120_000,
                        contract_address: Some(contract_address),
                    },
                );
            }
            ReceiptMode::Reverted => {
                state.receipts.insert(
                    tx_hash,
                    TxInclusion {
                        block_number,
                        success: false,
                        gas_used: 5_000_000,
                        contract_address: None,
                    },
                );
            }
            ReceiptMode::Never => {}
        }

        Ok(tx_hash)
    }

    async fn transaction_receipt(&self, tx_hash: TxHash) -> BlockchainResult<Option<TxInclusion>> {
        Ok(self.chain.state.lock().unwrap().receipts.get(&tx_hash).cloned())
    }
}
