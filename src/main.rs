//! contract-deployer
//!
//! Deploys a contract to an Ethereum-compatible network from a single
//! encrypted keystore wallet.
//!
//! # Run Overview
//!
//! ```text
//!   .env ──────────┐
//!   deployer.toml ─┼─▶ config ──▶ keystore unlock ──▶ node session ──▶ chain id / nonce
//!   CLI flags ─────┘                                                        │
//!                                                                           ▼
//!                       receipt ◀── wait ◀── broadcast ◀── sign ◀── signing context
//! ```
//!
//! Any failure logs one line naming the failing phase and exits with status 1.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use contract_deployer::blockchain::{AlloyConnector, SigningContext};
use contract_deployer::config::{load_config, ConfigSources, DeployConfig};
use contract_deployer::deploy::{load_bytecode, unlock, DeploymentOutcome, InPhase};
use contract_deployer::observability::logging::init_logging;
use contract_deployer::{DeployError, Deployer, Phase};

#[derive(Parser)]
#[command(name = "contract-deployer")]
#[command(
    version,
    about = "Deploy a contract using an encrypted keystore wallet",
    long_about = None
)]
struct Cli {
    /// Env file defining DEPLOY_URL and PASS_WALLET_OWNER.
    #[arg(long, env = "DEPLOYER_ENV_FILE", default_value = ".env")]
    env_file: PathBuf,

    /// Optional TOML settings file (defaults to ./deployer.toml when present).
    #[arg(short, long, env = "DEPLOYER_CONFIG")]
    config: Option<PathBuf>,

    /// Keystore file, overriding the settings file.
    #[arg(short, long, env = "DEPLOYER_KEYSTORE")]
    keystore: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, env = "DEPLOYER_LOG_LEVEL")]
    log_level: Option<String>,

    /// Emit logs as JSON lines.
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve chain id, nonce and fees and print the signing context (default)
    Prepare,
    /// Sign and broadcast a contract creation transaction
    Deploy {
        /// Creation bytecode: hex file or compiler JSON artifact
        #[arg(short, long)]
        bytecode: PathBuf,

        /// Return after broadcast instead of waiting for inclusion
        #[arg(long)]
        no_wait: bool,
    },
    /// Decrypt the keystore and print its address
    Address,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let sources = ConfigSources {
        env_file: cli.env_file.clone(),
        settings_file: cli.config.clone(),
        keystore_override: cli.keystore.clone(),
    };
    let loaded = load_config(&sources);

    // Logging needs the configured level, so it starts after config loading
    // and reports config failures itself.
    let (level, json) = match &loaded {
        Ok(config) => (
            cli.log_level.clone().unwrap_or_else(|| config.observability.log_level.clone()),
            cli.json_logs || config.observability.json,
        ),
        Err(_) => (cli.log_level.clone().unwrap_or_else(|| "info".to_string()), cli.json_logs),
    };
    init_logging(&level, json);

    let command = cli.command.unwrap_or(Commands::Prepare);
    let result = match loaded {
        Ok(config) => run(command, &config).await,
        Err(e) => Err(DeployError::from(e)),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(phase = %e.phase(), error = %e, "Deployment aborted");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Commands, config: &DeployConfig) -> Result<(), DeployError> {
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "contract-deployer starting");

    let connector = AlloyConnector;
    let deployer = Deployer::new(config, &connector);

    match command {
        Commands::Address => {
            let identity = unlock(config)?;
            println!("{}", identity.address());
        }
        Commands::Prepare => {
            let identity = unlock(config)?;
            let context = deployer.prepare(identity).await?;
            print_context(&context);
        }
        Commands::Deploy { bytecode, no_wait } => {
            let code = load_bytecode(&bytecode).in_phase(Phase::Bytecode)?;
            let identity = unlock(config)?;
            let outcome = deployer.deploy(identity, code, !no_wait).await?;
            print_outcome(&outcome);
        }
    }

    Ok(())
}

fn print_context(context: &SigningContext) {
    let params = context.params();
    println!("address:    {}", context.address());
    println!("chain id:   {}", params.chain_id.0);
    println!("nonce:      {}", params.nonce);
    println!("gas limit:  {}", params.gas_limit);
    println!("fee cap:    {} wei", params.fee_cap);
    println!("tip cap:    {} wei", params.tip_cap);
    println!("contract:   {} (predicted)", context.predicted_contract_address());
}

fn print_outcome(outcome: &DeploymentOutcome) {
    println!("tx hash:    {}", outcome.tx_hash());
    match outcome {
        DeploymentOutcome::Broadcast { contract_address, .. } => {
            println!("contract:   {} (pending)", contract_address);
        }
        DeploymentOutcome::Included(receipt) => {
            println!("contract:   {}", receipt.contract_address);
            if let Some(block) = receipt.block_number {
                println!("block:      {}", block);
            }
            println!("gas used:   {}", receipt.gas_used);
        }
    }
}
