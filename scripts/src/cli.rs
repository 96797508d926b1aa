//! Definitions of CLI arguments and commands for the administration scripts

use std::{path::PathBuf, time::Duration};

use clap::{ArgAction, Args, Parser, Subcommand};
use tracing::Level;

use crate::{
    commands::{
        create_group, deposit, fund, get, list_settings, mint, node_trusted,
        publish_withdrawal_credentials, query, set, withdrawal_credentials,
    },
    constants::{
        ARTIFACTS_DIR_ENV_VAR, DEFAULT_ARTIFACTS_DIR, DEFAULT_GAS_LIMIT,
        DEFAULT_RECEIPT_TIMEOUT_SECS, DEFAULT_RPC_URL, PRIV_KEY_ENV_VAR, RPC_URL_ENV_VAR,
    },
    dispatcher::DispatchConfig,
    errors::ScriptError,
    submitter::{SentHook, SubmissionPolicy},
    utils::setup_dispatcher,
};

/// Administer a deployed staking network
#[derive(Parser)]
#[command(name = "admin-scripts", version)]
pub struct Cli {
    /// Network RPC URL
    #[arg(short, long, env = RPC_URL_ENV_VAR, default_value = DEFAULT_RPC_URL, global = true)]
    pub rpc_url: String,

    /// Private key of the sender; without one, the node's unlocked account at
    /// `--from-index` signs
    #[arg(short, long, env = PRIV_KEY_ENV_VAR, hide_env_values = true, global = true)]
    pub priv_key: Option<String>,

    /// Index of the sending account among the node's accounts
    #[arg(long, default_value_t = 0, global = true)]
    pub from_index: usize,

    /// Directory containing the contract build artifacts
    #[arg(
        short,
        long,
        env = ARTIFACTS_DIR_ENV_VAR,
        default_value = DEFAULT_ARTIFACTS_DIR,
        global = true
    )]
    pub artifacts: PathBuf,

    /// Network identity to resolve contracts for, instead of the chain id
    #[arg(long, global = true)]
    pub network_id: Option<u64>,

    /// Gas ceiling of every transaction
    #[arg(long, default_value_t = DEFAULT_GAS_LIMIT, global = true)]
    pub gas_limit: u64,

    /// Seconds to wait for each transaction to be included
    #[arg(long, default_value_t = DEFAULT_RECEIPT_TIMEOUT_SECS, global = true)]
    pub receipt_timeout: u64,

    /// Simulate every transaction before sending any of them
    #[arg(long, global = true)]
    pub preflight: bool,

    /// Log verbosity; repeat for more detail
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// The command to run
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// The dispatcher configuration described by the flags
    pub fn dispatch_config(&self, on_sent: Option<SentHook>) -> DispatchConfig {
        DispatchConfig {
            rpc_url: self.rpc_url.clone(),
            priv_key: self.priv_key.clone(),
            from_index: self.from_index,
            artifacts_dir: self.artifacts.clone(),
            network_id: self.network_id,
            policy: SubmissionPolicy {
                gas_limit: self.gas_limit,
                receipt_timeout: Duration::from_secs(self.receipt_timeout),
                ..Default::default()
            },
            preflight: self.preflight,
            on_sent,
        }
    }

    /// The most detailed log level to emit
    pub fn log_level(&self) -> Level {
        match self.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        }
    }
}

/// The administration commands
#[derive(Subcommand)]
pub enum Command {
    /// Register a group, create its default accessor and authorise it
    CreateGroup(CreateGroupArgs),
    /// Mint RPL to one or more addresses
    Mint(AmountArgs),
    /// Send ether to one or more addresses
    Fund(AmountArgs),
    /// Change a network setting
    Set(SetArgs),
    /// Read a network setting
    Get(GetArgs),
    /// List the network settings that can be changed
    Settings,
    /// Mark node operators trusted or untrusted
    NodeTrusted(NodeTrustedArgs),
    /// Derive the withdrawal credentials of a validator public key
    WithdrawalCredentials(PubkeyArgs),
    /// Derive withdrawal credentials and publish them to the node settings
    PublishWithdrawalCredentials(PubkeyArgs),
    /// Deposit into a group through one of its accessors
    Deposit(DepositArgs),
    /// Call a read-only contract method
    Query(QueryArgs),
}

impl Command {
    /// Run the command, returning the report to print
    ///
    /// Commands that never touch the network run without a client.
    pub async fn run(self, config: &DispatchConfig) -> Result<String, ScriptError> {
        match self {
            Command::Settings => return Ok(list_settings()),
            Command::WithdrawalCredentials(args) => return withdrawal_credentials(&args.pubkey),
            _ => {}
        }

        let dispatcher = setup_dispatcher(config)?;
        match self {
            Command::CreateGroup(args) => {
                create_group(&dispatcher, &[args.name, args.staking_fee]).await
            }
            Command::Mint(args) => mint(&dispatcher, &args.tokens()).await,
            Command::Fund(args) => fund(&dispatcher, &args.tokens()).await,
            Command::Set(args) => set(&dispatcher, &args.setting, &args.values).await,
            Command::Get(args) => get(&dispatcher, &args.setting).await,
            Command::NodeTrusted(args) => {
                let mut tokens = vec![args.trusted];
                tokens.extend(args.addresses);
                node_trusted(&dispatcher, &tokens).await
            }
            Command::PublishWithdrawalCredentials(args) => {
                publish_withdrawal_credentials(&dispatcher, &args.pubkey).await
            }
            Command::Deposit(args) => {
                deposit(&dispatcher, &[args.accessor, args.duration_id, args.amount]).await
            }
            Command::Query(args) => {
                query(&dispatcher, &args.contract, &args.method, &args.args).await
            }
            Command::Settings | Command::WithdrawalCredentials(_) => {
                unreachable!("handled without a client")
            }
        }
    }
}

/// Register a new group
#[derive(Args)]
pub struct CreateGroupArgs {
    /// The group's name
    pub name: String,

    /// The group's staking fee, in wei
    pub staking_fee: String,
}

/// An amount applied to each of several addresses
#[derive(Args)]
pub struct AmountArgs {
    /// The amount, in wei
    pub amount: String,

    /// The receiving addresses
    pub addresses: Vec<String>,
}

impl AmountArgs {
    /// The arguments as raw tokens, amount first
    fn tokens(self) -> Vec<String> {
        let mut tokens = vec![self.amount];
        tokens.extend(self.addresses);
        tokens
    }
}

/// Change a setting
#[derive(Args)]
pub struct SetArgs {
    /// The setting's name, see `settings`
    pub setting: String,

    /// The setting's new values
    #[arg(allow_hyphen_values = true)]
    pub values: Vec<String>,
}

/// Read a setting
#[derive(Args)]
pub struct GetArgs {
    /// The setting's name, see `settings`
    pub setting: String,
}

/// Set the trusted flag of node operators
#[derive(Args)]
pub struct NodeTrustedArgs {
    /// `true` or `false`
    pub trusted: String,

    /// The node operators' addresses
    pub addresses: Vec<String>,
}

/// A validator public key
#[derive(Args)]
pub struct PubkeyArgs {
    /// The 48-byte BLS public key, in hex
    pub pubkey: String,
}

/// Deposit through a group accessor
#[derive(Args)]
pub struct DepositArgs {
    /// The accessor contract's address
    pub accessor: String,

    /// The staking duration to deposit for
    pub duration_id: String,

    /// The amount to deposit, in wei
    pub amount: String,
}

/// Call a read-only method
#[derive(Args)]
pub struct QueryArgs {
    /// The contract's name, e.g. `RocketDepositSettings`
    pub contract: String,

    /// The method's name
    pub method: String,

    /// The method's arguments
    #[arg(allow_hyphen_values = true)]
    pub args: Vec<String>,
}
