//! The deployment procedure.
//!
//! ```text
//! unlock:  keystore + password → Identity
//! prepare: open session → chain id → pending nonce → fee policy → SigningContext
//!          (fee computation cannot fail, so it has no phase of its own)
//! deploy:  prepare → balance check → sign → broadcast → wait for inclusion
//! ```
//!
//! Every step returns a [`DeployError`] tagged with the [`Phase`] it failed in.
//! Nothing here terminates the process; that is left to the binary.

use alloy::primitives::{Address, Bytes, TxHash};
use std::fmt;
use thiserror::Error;

use crate::blockchain::client::{Connector, NodeRpc, NodeSession};
use crate::blockchain::transaction::{
    broadcast, ensure_funds, wait_for_inclusion, ConfirmationPolicy, SigningContext, TxParams,
};
use crate::blockchain::types::{BlockchainError, FeePolicy};
use crate::blockchain::wallet::Identity;
use crate::config::{ConfigError, DeployConfig};

/// Step of the procedure an error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Config,
    Keystore,
    Bytecode,
    Connect,
    ChainId,
    Nonce,
    Balance,
    Sign,
    Broadcast,
    Confirm,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Phase::Config => "loading configuration",
            Phase::Keystore => "opening wallet",
            Phase::Bytecode => "loading bytecode",
            Phase::Connect => "connecting to node",
            Phase::ChainId => "querying chain id",
            Phase::Nonce => "querying pending nonce",
            Phase::Balance => "checking balance",
            Phase::Sign => "signing deployment",
            Phase::Broadcast => "broadcasting deployment",
            Phase::Confirm => "waiting for inclusion",
        };
        f.write_str(label)
    }
}

/// A failed run.
#[derive(Debug, Error)]
pub enum DeployError {
    #[error("Error in loading configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Error in {phase}: {source}")]
    Failed {
        phase: Phase,
        #[source]
        source: BlockchainError,
    },
}

impl DeployError {
    pub fn phase(&self) -> Phase {
        match self {
            DeployError::Config(_) => Phase::Config,
            DeployError::Failed { phase, .. } => *phase,
        }
    }

    /// Underlying chain-layer error, if any.
    pub fn blockchain_error(&self) -> Option<&BlockchainError> {
        match self {
            DeployError::Config(_) => None,
            DeployError::Failed { source, .. } => Some(source),
        }
    }
}

/// Attach the failing phase to a chain-layer result.
pub trait InPhase<T> {
    fn in_phase(self, phase: Phase) -> Result<T, DeployError>;
}

impl<T> InPhase<T> for Result<T, BlockchainError> {
    fn in_phase(self, phase: Phase) -> Result<T, DeployError> {
        self.map_err(|source| DeployError::Failed { phase, source })
    }
}

/// Result of a successful `deploy`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeploymentOutcome {
    /// Broadcast only; inclusion was not awaited.
    Broadcast {
        tx_hash: TxHash,
        contract_address: Address,
    },
    /// Included on chain.
    Included(DeploymentReceipt),
}

impl DeploymentOutcome {
    pub fn tx_hash(&self) -> TxHash {
        match self {
            DeploymentOutcome::Broadcast { tx_hash, .. } => *tx_hash,
            DeploymentOutcome::Included(receipt) => receipt.tx_hash,
        }
    }

    pub fn contract_address(&self) -> Address {
        match self {
            DeploymentOutcome::Broadcast {
                contract_address, ..
            } => *contract_address,
            DeploymentOutcome::Included(receipt) => receipt.contract_address,
        }
    }
}

/// Inclusion report for a deployed contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentReceipt {
    pub tx_hash: TxHash,
    pub contract_address: Address,
    pub block_number: Option<u64>,
    pub gas_used: u64,
}

/// Decrypt the configured keystore.
pub fn unlock(config: &DeployConfig) -> Result<Identity, DeployError> {
    Identity::from_keystore(&config.wallet.keystore_path, config.password.expose())
        .in_phase(Phase::Keystore)
}

/// Query fresh chain state and combine it with the fee policy.
///
/// A failed chain-id or nonce query fails the run; nothing falls back to zero.
pub async fn resolve_context<R: NodeRpc>(
    session: &NodeSession<R>,
    identity: Identity,
    fees: &FeePolicy,
) -> Result<SigningContext, DeployError> {
    let chain_id = session.chain_id().await.in_phase(Phase::ChainId)?;
    let nonce = session
        .pending_nonce(identity.address())
        .await
        .in_phase(Phase::Nonce)?;

    let params = TxParams::new(chain_id, nonce, fees);

    tracing::info!(
        address = %identity.address(),
        chain_id = params.chain_id.0,
        nonce = params.nonce,
        gas_limit = params.gas_limit,
        fee_cap = %params.fee_cap,
        tip_cap = %params.tip_cap,
        "Signing context prepared"
    );

    Ok(SigningContext::new(identity, params))
}

/// Runs the procedure against the node reached through `C`.
pub struct Deployer<'a, C: Connector> {
    config: &'a DeployConfig,
    connector: &'a C,
}

impl<'a, C: Connector> Deployer<'a, C> {
    pub fn new(config: &'a DeployConfig, connector: &'a C) -> Self {
        Self { config, connector }
    }

    async fn open_session(&self) -> Result<NodeSession<C::Rpc>, DeployError> {
        NodeSession::open(self.connector, &self.config.url, &self.config.node)
            .await
            .in_phase(Phase::Connect)
    }

    /// Resolve a signing context. The node session is released before returning.
    pub async fn prepare(&self, identity: Identity) -> Result<SigningContext, DeployError> {
        let session = self.open_session().await?;
        resolve_context(&session, identity, &self.config.fees).await
    }

    /// Prepare, sign and broadcast a contract creation for `bytecode`.
    ///
    /// With `wait` the call returns once the transaction is included (and
    /// has the configured number of confirmations).
    pub async fn deploy(
        &self,
        identity: Identity,
        bytecode: Bytes,
        wait: bool,
    ) -> Result<DeploymentOutcome, DeployError> {
        let session = self.open_session().await?;
        let context = resolve_context(&session, identity, &self.config.fees).await?;

        let balance = ensure_funds(&session, &context).await.in_phase(Phase::Balance)?;
        tracing::debug!(
            balance = %balance,
            required = %context.params().max_cost(),
            "Balance sufficient"
        );

        let signed = context.sign_deployment(bytecode).await.in_phase(Phase::Sign)?;
        let tx_hash = broadcast(&session, &signed).await.in_phase(Phase::Broadcast)?;

        if !wait {
            return Ok(DeploymentOutcome::Broadcast {
                tx_hash,
                contract_address: signed.contract_address,
            });
        }

        let policy = ConfirmationPolicy::from(&self.config.node);
        let inclusion = wait_for_inclusion(&session, tx_hash, &policy)
            .await
            .in_phase(Phase::Confirm)?;

        let contract_address = match inclusion.contract_address {
            Some(reported) if reported != signed.contract_address => {
                tracing::warn!(
                    predicted = %signed.contract_address,
                    reported = %reported,
                    "Receipt contract address differs from prediction"
                );
                reported
            }
            Some(reported) => reported,
            None => signed.contract_address,
        };

        let receipt = DeploymentReceipt {
            tx_hash,
            contract_address,
            block_number: inclusion.block_number,
            gas_used: inclusion.gas_used,
        };

        tracing::info!(
            tx_hash = %receipt.tx_hash,
            contract_address = %receipt.contract_address,
            block_number = ?receipt.block_number,
            gas_used = receipt.gas_used,
            "Contract deployed"
        );

        Ok(DeploymentOutcome::Included(receipt))
    }
}
