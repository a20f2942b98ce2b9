//! Transaction parameters, signing, broadcast and inclusion monitoring.
//!
//! # Responsibilities
//! - Turn the fee policy and fresh chain state into EIP-1559 parameters
//! - Build and sign contract-creation transactions
//! - Broadcast and wait for inclusion with a deadline

use alloy::eips::eip2718::Encodable2718;
use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, Bytes, TxHash, U256};
use alloy::rpc::types::TransactionRequest;
use std::time::Duration;
use tokio::time::{interval, timeout, MissedTickBehavior};

use crate::blockchain::client::{NodeRpc, NodeSession};
use crate::blockchain::types::{
    BlockchainError, BlockchainResult, ChainId, FeePolicy, NodeConfig, TxInclusion,
};
use crate::blockchain::wallet::Identity;

impl FeePolicy {
    /// Maximum fee per gas: base fee plus tip.
    pub fn fee_cap(&self) -> u128 {
        u128::from(self.base_fee_wei) + u128::from(self.tip_wei)
    }

    /// Maximum priority fee per gas.
    pub fn tip_cap(&self) -> u128 {
        u128::from(self.tip_wei)
    }
}

/// Parameters resolved fresh for every run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxParams {
    pub chain_id: ChainId,
    pub nonce: u64,
    pub gas_limit: u64,
    pub fee_cap: u128,
    pub tip_cap: u128,
}

impl TxParams {
    pub fn new(chain_id: ChainId, nonce: u64, fees: &FeePolicy) -> Self {
        Self {
            chain_id,
            nonce,
            gas_limit: fees.gas_limit,
            fee_cap: fees.fee_cap(),
            tip_cap: fees.tip_cap(),
        }
    }

    /// Worst-case cost of the transaction: `gas_limit * fee_cap`.
    pub fn max_cost(&self) -> U256 {
        U256::from(self.gas_limit) * U256::from(self.fee_cap)
    }
}

/// Identity plus transaction parameters: everything needed to sign.
#[derive(Debug)]
pub struct SigningContext {
    identity: Identity,
    params: TxParams,
}

/// A signed contract-creation transaction ready for broadcast.
#[derive(Debug, Clone)]
pub struct SignedDeployment {
    pub raw: Bytes,
    pub tx_hash: TxHash,
    /// Address the contract will have once the transaction is included.
    pub contract_address: Address,
}

impl SigningContext {
    pub fn new(identity: Identity, params: TxParams) -> Self {
        Self { identity, params }
    }

    pub fn address(&self) -> Address {
        self.identity.address()
    }

    pub fn params(&self) -> &TxParams {
        &self.params
    }

    /// `CREATE` address for this sender and nonce.
    pub fn predicted_contract_address(&self) -> Address {
        self.address().create(self.params.nonce)
    }

    /// Unsigned contract-creation request carrying every signing parameter.
    pub fn deployment_request(&self, bytecode: Bytes) -> TransactionRequest {
        TransactionRequest::default()
            .with_from(self.address())
            .with_deploy_code(bytecode)
            .with_nonce(self.params.nonce)
            .with_chain_id(self.params.chain_id.0)
            .with_gas_limit(self.params.gas_limit)
            .with_max_fee_per_gas(self.params.fee_cap)
            .with_max_priority_fee_per_gas(self.params.tip_cap)
    }

    /// Sign a contract-creation transaction for `bytecode`.
    pub async fn sign_deployment(&self, bytecode: Bytes) -> BlockchainResult<SignedDeployment> {
        let wallet = self.identity.wallet();
        let envelope = self
            .deployment_request(bytecode)
            .build(&wallet)
            .await
            .map_err(|e| BlockchainError::Signing(e.to_string()))?;

        let signed = SignedDeployment {
            raw: Bytes::from(envelope.encoded_2718()),
            tx_hash: *envelope.tx_hash(),
            contract_address: self.predicted_contract_address(),
        };

        tracing::debug!(
            tx_hash = %signed.tx_hash,
            contract_address = %signed.contract_address,
            size = signed.raw.len(),
            "Deployment transaction signed"
        );

        Ok(signed)
    }
}

/// How long and how often to poll for inclusion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmationPolicy {
    pub timeout: Duration,
    pub poll_interval: Duration,
    /// Blocks built on top of the inclusion block before returning.
    pub confirmation_blocks: u64,
}

impl From<&NodeConfig> for ConfirmationPolicy {
    fn from(node: &NodeConfig) -> Self {
        Self {
            timeout: node.confirmation_timeout(),
            poll_interval: node.poll_interval(),
            confirmation_blocks: node.confirmation_blocks,
        }
    }
}

/// Fail early if the sender cannot cover the worst-case fee.
pub async fn ensure_funds<R: NodeRpc>(
    session: &NodeSession<R>,
    context: &SigningContext,
) -> BlockchainResult<U256> {
    let balance = session.balance(context.address()).await?;
    let required = context.params().max_cost();
    if balance < required {
        return Err(BlockchainError::InsufficientFunds {
            address: context.address(),
            balance,
            required,
        });
    }
    Ok(balance)
}

/// Broadcast a signed deployment.
pub async fn broadcast<R: NodeRpc>(
    session: &NodeSession<R>,
    signed: &SignedDeployment,
) -> BlockchainResult<TxHash> {
    let tx_hash = session.send_raw_transaction(&signed.raw).await?;
    if tx_hash != signed.tx_hash {
        tracing::warn!(
            expected = %signed.tx_hash,
            reported = %tx_hash,
            "Node reported a different transaction hash"
        );
    }
    tracing::info!(tx_hash = %tx_hash, "Deployment transaction broadcast");
    Ok(tx_hash)
}

/// Wait for a transaction to be included (and optionally confirmed).
///
/// # Errors
/// - [`BlockchainError::Reverted`] if the receipt reports failure
/// - [`BlockchainError::ConfirmationTimeout`] if the deadline passes first
pub async fn wait_for_inclusion<R: NodeRpc>(
    session: &NodeSession<R>,
    tx_hash: TxHash,
    policy: &ConfirmationPolicy,
) -> BlockchainResult<TxInclusion> {
    let result = timeout(policy.timeout, async {
        let mut ticker = interval(policy.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            let receipt = match session.transaction_receipt(tx_hash).await? {
                Some(r) => r,
                None => {
                    tracing::debug!(tx_hash = %tx_hash, "Transaction pending");
                    continue;
                }
            };

            if !receipt.success {
                return Err(BlockchainError::Reverted(tx_hash));
            }

            let Some(tx_block) = receipt.block_number else {
                continue;
            };

            if policy.confirmation_blocks == 0 {
                return Ok(receipt);
            }

            let current_block = session.block_number().await?;
            let confirmations = current_block.saturating_sub(tx_block);
            if confirmations >= policy.confirmation_blocks {
                return Ok(receipt);
            }

            tracing::debug!(
                tx_hash = %tx_hash,
                confirmations = confirmations,
                required = policy.confirmation_blocks,
                "Waiting for confirmations"
            );
        }
    })
    .await;

    match result {
        Ok(outcome) => outcome,
        Err(_) => Err(BlockchainError::ConfirmationTimeout {
            tx_hash,
            after: policy.timeout,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::consensus::TxEnvelope;
    use alloy::eips::eip2718::Decodable2718;
    use alloy::primitives::{address, TxKind};

    const TEST_PRIVATE_KEY: &str =
        "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    fn context(nonce: u64) -> SigningContext {
        let identity = Identity::from_private_key(TEST_PRIVATE_KEY).unwrap();
        SigningContext::new(identity, TxParams::new(ChainId(1), nonce, &FeePolicy::default()))
    }

    #[test]
    fn test_params_from_default_policy() {
        let params = TxParams::new(ChainId(1), 5, &FeePolicy::default());
        assert_eq!(params.chain_id, ChainId(1));
        assert_eq!(params.nonce, 5);
        assert_eq!(params.gas_limit, 5_000_000);
        assert_eq!(params.fee_cap, 1_020_000_000);
        assert_eq!(params.tip_cap, 1_000_000_000);
    }

    #[test]
    fn test_fee_cap_cannot_overflow() {
        let fees = FeePolicy {
            base_fee_wei: u64::MAX,
            tip_wei: u64::MAX,
            gas_limit: u64::MAX,
        };
        assert_eq!(fees.fee_cap(), 2 * u128::from(u64::MAX));
        let params = TxParams::new(ChainId(1), 0, &fees);
        assert!(params.max_cost() > U256::from(u128::MAX));
    }

    #[test]
    fn test_predicted_address_matches_create() {
        // First contract deployed by Anvil's default account.
        let ctx = context(0);
        assert_eq!(
            ctx.predicted_contract_address(),
            address!("5FbDB2315678afecb367f032d93F642f64180aa3")
        );
    }

    #[test]
    fn test_deployment_request_fields() {
        let ctx = context(5);
        let request = ctx.deployment_request(Bytes::from_static(&[0x60, 0x00]));
        assert_eq!(request.nonce, Some(5));
        assert_eq!(request.chain_id, Some(1));
        assert_eq!(request.gas, Some(5_000_000));
        assert_eq!(request.max_fee_per_gas, Some(1_020_000_000));
        assert_eq!(request.max_priority_fee_per_gas, Some(1_000_000_000));
        assert_eq!(request.to, Some(TxKind::Create));
    }

    #[tokio::test]
    async fn test_sign_deployment_produces_eip1559_envelope() {
        let ctx = context(3);
        let signed = ctx.sign_deployment(Bytes::from_static(&[0x60, 0x00])).await.unwrap();

        let envelope = TxEnvelope::decode_2718(&mut signed.raw.as_ref()).unwrap();
        assert!(matches!(envelope, TxEnvelope::Eip1559(_)));
        assert_eq!(*envelope.tx_hash(), signed.tx_hash);
        assert_eq!(signed.contract_address, ctx.address().create(3));
    }
}
