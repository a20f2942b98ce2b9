//! Node RPC client with timeout and error handling.
//!
//! # Responsibilities
//! - Connect to a JSON-RPC endpoint (HTTP or WebSocket)
//! - Query chain state (chain id, pending nonce, balance, receipts)
//! - Broadcast signed transactions
//! - Bound every call with a deadline and release the transport on drop

use alloy::primitives::{Address, TxHash, U256};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::TransactionReceipt;
use async_trait::async_trait;
use std::time::Duration;
use url::Url;

use crate::blockchain::types::{
    BlockchainError, BlockchainResult, ChainId, NodeConfig, TxInclusion,
};
use crate::resilience::timeouts::with_timeout;

/// The chain queries and writes the deployer needs from a node.
#[async_trait]
pub trait NodeRpc: Send + Sync {
    /// `eth_chainId`.
    async fn chain_id(&self) -> BlockchainResult<ChainId>;

    /// `eth_getTransactionCount` at the `pending` tag.
    async fn pending_nonce(&self, address: Address) -> BlockchainResult<u64>;

    /// `eth_getBalance` at `latest`.
    async fn balance(&self, address: Address) -> BlockchainResult<U256>;

    /// `eth_blockNumber`.
    async fn block_number(&self) -> BlockchainResult<u64>;

    /// `eth_sendRawTransaction` with an EIP-2718 encoded transaction.
    async fn send_raw_transaction(&self, raw: &[u8]) -> BlockchainResult<TxHash>;

    /// `eth_getTransactionReceipt`; `None` while the transaction is pending.
    async fn transaction_receipt(&self, tx_hash: TxHash) -> BlockchainResult<Option<TxInclusion>>;
}

/// Opens [`NodeRpc`] connections.
#[async_trait]
pub trait Connector: Send + Sync {
    type Rpc: NodeRpc;

    async fn connect(&self, url: &Url) -> BlockchainResult<Self::Rpc>;
}

/// A scoped connection to the node.
///
/// Every call runs under the configured RPC deadline. Dropping the session
/// releases the underlying transport, so it is released on every exit path.
pub struct NodeSession<R: NodeRpc> {
    rpc: R,
    endpoint: String,
    rpc_timeout: Duration,
}

impl<R: NodeRpc> NodeSession<R> {
    /// Connect through `connector` under the configured connect deadline.
    pub async fn open<C>(connector: &C, url: &str, node: &NodeConfig) -> BlockchainResult<Self>
    where
        C: Connector<Rpc = R>,
    {
        let parsed: Url = url.parse().map_err(|e: url::ParseError| BlockchainError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        let endpoint = redact(&parsed);

        let rpc = with_timeout(
            "node connection",
            node.connect_timeout(),
            connector.connect(&parsed),
        )
        .await?;

        tracing::info!(endpoint = %endpoint, "Node session opened");

        Ok(Self::new(rpc, endpoint, node.rpc_timeout()))
    }

    /// Wrap an already connected client.
    pub fn new(rpc: R, endpoint: String, rpc_timeout: Duration) -> Self {
        Self {
            rpc,
            endpoint,
            rpc_timeout,
        }
    }

    /// Get the chain ID from the node.
    pub async fn chain_id(&self) -> BlockchainResult<ChainId> {
        with_timeout("chain id query", self.rpc_timeout, self.rpc.chain_id()).await
    }

    /// Get the next unused nonce for `address`, counting pending transactions.
    pub async fn pending_nonce(&self, address: Address) -> BlockchainResult<u64> {
        with_timeout("pending nonce query", self.rpc_timeout, self.rpc.pending_nonce(address)).await
    }

    /// Get the balance of an address.
    pub async fn balance(&self, address: Address) -> BlockchainResult<U256> {
        with_timeout("balance query", self.rpc_timeout, self.rpc.balance(address)).await
    }

    /// Get the latest block number.
    pub async fn block_number(&self) -> BlockchainResult<u64> {
        with_timeout("block number query", self.rpc_timeout, self.rpc.block_number()).await
    }

    /// Broadcast a signed transaction.
    pub async fn send_raw_transaction(&self, raw: &[u8]) -> BlockchainResult<TxHash> {
        with_timeout(
            "transaction broadcast",
            self.rpc_timeout,
            self.rpc.send_raw_transaction(raw),
        )
        .await
    }

    /// Get a transaction receipt by hash.
    pub async fn transaction_receipt(
        &self,
        tx_hash: TxHash,
    ) -> BlockchainResult<Option<TxInclusion>> {
        with_timeout(
            "receipt query",
            self.rpc_timeout,
            self.rpc.transaction_receipt(tx_hash),
        )
        .await
    }

    /// Endpoint with credentials stripped, for logging.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl<R: NodeRpc> Drop for NodeSession<R> {
    fn drop(&mut self) {
        tracing::debug!(endpoint = %self.endpoint, "Node session released");
    }
}

impl<R: NodeRpc> std::fmt::Debug for NodeSession<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeSession")
            .field("endpoint", &self.endpoint)
            .field("rpc_timeout", &self.rpc_timeout)
            .finish()
    }
}

/// Strip userinfo, query and fragment so API keys in URLs never reach the logs.
fn redact(url: &Url) -> String {
    let mut clean = url.clone();
    let _ = clean.set_username("");
    let _ = clean.set_password(None);
    clean.set_query(None);
    clean.set_fragment(None);
    clean.to_string()
}

/// [`Connector`] backed by an alloy provider.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlloyConnector;

#[async_trait]
impl Connector for AlloyConnector {
    type Rpc = AlloyNode;

    async fn connect(&self, url: &Url) -> BlockchainResult<AlloyNode> {
        let provider = ProviderBuilder::new()
            .connect(url.as_str())
            .await
            .map_err(|e| BlockchainError::Connection(e.to_string()))?;

        Ok(AlloyNode {
            provider: Box::new(provider),
        })
    }
}

/// [`NodeRpc`] over an alloy provider.
pub struct AlloyNode {
    provider: Box<dyn Provider + Send + Sync>,
}

#[async_trait]
impl NodeRpc for AlloyNode {
    async fn chain_id(&self) -> BlockchainResult<ChainId> {
        self.provider
            .get_chain_id()
            .await
            .map(ChainId)
            .map_err(|e| BlockchainError::Rpc(e.to_string()))
    }

    async fn pending_nonce(&self, address: Address) -> BlockchainResult<u64> {
        self.provider
            .get_transaction_count(address)
            .pending()
            .await
            .map_err(|e| BlockchainError::Rpc(e.to_string()))
    }

    async fn balance(&self, address: Address) -> BlockchainResult<U256> {
        self.provider
            .get_balance(address)
            .await
            .map_err(|e| BlockchainError::Rpc(e.to_string()))
    }

    async fn block_number(&self) -> BlockchainResult<u64> {
        self.provider
            .get_block_number()
            .await
            .map_err(|e| BlockchainError::Rpc(e.to_string()))
    }

    async fn send_raw_transaction(&self, raw: &[u8]) -> BlockchainResult<TxHash> {
        let pending = self
            .provider
            .send_raw_transaction(raw)
            .await
            .map_err(|e| BlockchainError::Rpc(e.to_string()))?;
        Ok(*pending.tx_hash())
    }

    async fn transaction_receipt(&self, tx_hash: TxHash) -> BlockchainResult<Option<TxInclusion>> {
        let receipt = self
            .provider
            .get_transaction_receipt(tx_hash)
            .await
            .map_err(|e| BlockchainError::Rpc(e.to_string()))?;
        Ok(receipt.map(|r| inclusion_from_receipt(&r)))
    }
}

fn inclusion_from_receipt(receipt: &TransactionReceipt) -> TxInclusion {
    TxInclusion {
        block_number: receipt.block_number,
        success: receipt.status(),
        gas_used: receipt.gas_used,
        contract_address: receipt.contract_address,
    }
}
