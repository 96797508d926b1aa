//! A recording chain client and contract fixtures for unit tests

use std::{
    collections::{HashMap, HashSet},
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use admin_common::types::ContractName;
use alloy::{
    dyn_abi::DynSolValue,
    primitives::{address, keccak256, Address, Bytes, FixedBytes, Log, LogData, TxHash, B256, U256},
    rpc::types::TransactionRequest,
};
use async_trait::async_trait;
use serde_json::{json, Value};

use crate::{
    client::{ChainClient, ReceiptSummary},
    dispatcher::{DispatchConfig, Dispatcher},
    errors::ScriptError,
    resolver::{ContractArtifact, StaticArtifacts},
    submitter::SubmissionPolicy,
    types::NetworkId,
};

/// The network the fixtures are deployed on
pub const DEVNET: NetworkId = NetworkId(1337);

/// The account the stub client sends from
pub const OPERATOR: Address = address!("00000000000000000000000000000000000000f0");

/// The fixture address of `RocketAdmin`
pub const ADMIN_ADDRESS: Address = address!("00000000000000000000000000000000000000a1");
/// The fixture address of `RocketDepositSettings`
pub const DEPOSIT_SETTINGS_ADDRESS: Address = address!("00000000000000000000000000000000000000a2");
/// The fixture address of `RocketGroupAPI`
pub const GROUP_API_ADDRESS: Address = address!("00000000000000000000000000000000000000a3");
/// The fixture address of `RocketGroupSettings`
pub const GROUP_SETTINGS_ADDRESS: Address = address!("00000000000000000000000000000000000000a4");
/// The fixture address of `RocketMinipoolSettings`
pub const MINIPOOL_SETTINGS_ADDRESS: Address = address!("00000000000000000000000000000000000000a5");
/// The fixture address of `RocketNodeSettings`
pub const NODE_SETTINGS_ADDRESS: Address = address!("00000000000000000000000000000000000000a6");
/// The fixture address of `RocketPoolToken`
pub const TOKEN_ADDRESS: Address = address!("00000000000000000000000000000000000000a7");

/// The gas the stub reports for a successful transaction
const STUB_GAS_USED: u64 = 21_000;

/// A submission policy with short waits
pub fn fast_policy() -> SubmissionPolicy {
    SubmissionPolicy {
        receipt_timeout: Duration::from_millis(50),
        poll_interval: Duration::from_millis(5),
        ..Default::default()
    }
}

/// Build a token list
pub fn tokens(raw: &[&str]) -> Vec<String> {
    raw.iter().map(|s| s.to_string()).collect()
}

/// The 4-byte selector of a function signature
pub fn selector_of(signature: &str) -> FixedBytes<4> {
    FixedBytes::from_slice(&keccak256(signature.as_bytes())[..4])
}

/// A stub client over fixture artifacts and a dispatcher using it
pub fn dispatcher() -> (Arc<StubClient>, Dispatcher<StubClient>) {
    dispatcher_with(&DispatchConfig::default())
}

/// As [`dispatcher`], with the given configuration and fast receipt polling
pub fn dispatcher_with(config: &DispatchConfig) -> (Arc<StubClient>, Dispatcher<StubClient>) {
    let client = Arc::new(StubClient::default());
    let config = DispatchConfig {
        policy: fast_policy(),
        ..config.clone()
    };
    let dispatcher = Dispatcher::new(client.clone(), Box::new(fixture_artifacts()), &config);

    (client, dispatcher)
}

// ---------------
// | Stub client |
// ---------------

/// The selector of a transaction's calldata, zero for plain transfers
fn selector(tx: &TransactionRequest) -> FixedBytes<4> {
    tx.input
        .input()
        .filter(|data| data.len() >= 4)
        .map(|data| FixedBytes::from_slice(&data[..4]))
        .unwrap_or_default()
}

/// A [`ChainClient`] that records every call and send and answers from a script
///
/// Transactions are included immediately in consecutive blocks and succeed
/// unless their selector is scripted to fail. Read-only calls answer a zero
/// word unless scripted otherwise.
pub struct StubClient {
    /// The chain id reported
    chain_id: u64,
    /// The accounts reported
    accounts: Vec<Address>,
    /// How many times the chain id was requested
    chain_id_requests: AtomicUsize,
    /// The read-only calls made, with the block they were made at
    calls: Mutex<Vec<(TransactionRequest, Option<u64>)>>,
    /// The transactions sent
    sent: Mutex<Vec<TransactionRequest>>,
    /// Scripted read-only call results, by selector
    responses: Mutex<HashMap<FixedBytes<4>, Result<Bytes, ScriptError>>>,
    /// Scripted logs, by selector of the emitting transaction
    logs: Mutex<HashMap<FixedBytes<4>, Vec<Log>>>,
    /// Selectors of transactions that fail, with the gas they consume
    failures: Mutex<HashMap<FixedBytes<4>, u64>>,
    /// Receipts of the transactions sent
    receipts: Mutex<HashMap<TxHash, ReceiptSummary>>,
    /// Selectors whose sends are rejected outright
    rejected: Mutex<HashSet<FixedBytes<4>>>,
    /// Whether receipts are withheld forever
    never_include: AtomicBool,
}

impl Default for StubClient {
    fn default() -> Self {
        Self {
            chain_id: DEVNET.0,
            accounts: vec![OPERATOR],
            chain_id_requests: AtomicUsize::new(0),
            calls: Mutex::new(Vec::new()),
            sent: Mutex::new(Vec::new()),
            responses: Mutex::new(HashMap::new()),
            logs: Mutex::new(HashMap::new()),
            failures: Mutex::new(HashMap::new()),
            receipts: Mutex::new(HashMap::new()),
            rejected: Mutex::new(HashSet::new()),
            never_include: AtomicBool::new(false),
        }
    }
}

impl StubClient {
    /// Answer read-only calls to the given selector with `result`
    pub fn respond(&self, selector: FixedBytes<4>, result: Result<Bytes, ScriptError>) {
        self.responses.lock().unwrap().insert(selector, result);
    }

    /// Answer read-only calls to the given selector with ABI-encoded values
    pub fn respond_with(&self, selector: FixedBytes<4>, values: Vec<DynSolValue>) {
        let encoded = DynSolValue::Tuple(values).abi_encode_params();
        self.respond(selector, Ok(encoded.into()));
    }

    /// Attach logs to the receipts of transactions with the given selector
    pub fn emit_on(&self, selector: FixedBytes<4>, logs: Vec<Log>) {
        self.logs.lock().unwrap().insert(selector, logs);
    }

    /// Make transactions with the given selector fail, consuming `gas_used`
    pub fn fail_on(&self, selector: FixedBytes<4>, gas_used: u64) {
        self.failures.lock().unwrap().insert(selector, gas_used);
    }

    /// Reject sends of transactions with the given selector at the RPC layer
    pub fn reject_on(&self, selector: FixedBytes<4>) {
        self.rejected.lock().unwrap().insert(selector);
    }

    /// Withhold every receipt
    pub fn never_include(&self) {
        self.never_include.store(true, Ordering::SeqCst);
    }

    /// The transactions sent so far
    pub fn sent(&self) -> Vec<TransactionRequest> {
        self.sent.lock().unwrap().clone()
    }

    /// The read-only calls made so far
    pub fn calls(&self) -> Vec<TransactionRequest> {
        self.calls.lock().unwrap().iter().map(|(tx, _)| tx.clone()).collect()
    }

    /// The blocks the read-only calls were made at
    pub fn call_blocks(&self) -> Vec<Option<u64>> {
        self.calls.lock().unwrap().iter().map(|(_, block)| *block).collect()
    }

    /// How many times the chain id was requested
    pub fn chain_id_requests(&self) -> usize {
        self.chain_id_requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChainClient for StubClient {
    async fn chain_id(&self) -> Result<u64, ScriptError> {
        self.chain_id_requests.fetch_add(1, Ordering::SeqCst);
        Ok(self.chain_id)
    }

    async fn accounts(&self) -> Result<Vec<Address>, ScriptError> {
        Ok(self.accounts.clone())
    }

    async fn call(
        &self,
        tx: &TransactionRequest,
        block: Option<u64>,
    ) -> Result<Bytes, ScriptError> {
        self.calls.lock().unwrap().push((tx.clone(), block));
        self.responses
            .lock()
            .unwrap()
            .get(&selector(tx))
            .cloned()
            .unwrap_or_else(|| Ok(Bytes::from(vec![0u8; 32])))
    }

    async fn send_transaction(&self, tx: TransactionRequest) -> Result<TxHash, ScriptError> {
        let selector = selector(&tx);
        if self.rejected.lock().unwrap().contains(&selector) {
            return Err(ScriptError::ContractRevert("rejected by node".to_string()));
        }

        let mut sent = self.sent.lock().unwrap();
        sent.push(tx);
        let block = sent.len() as u64;
        let tx_hash = B256::from(U256::from(block));

        let failure = self.failures.lock().unwrap().get(&selector).copied();
        let logs = match failure {
            Some(_) => Vec::new(),
            None => self.logs.lock().unwrap().get(&selector).cloned().unwrap_or_default(),
        };
        let receipt = ReceiptSummary {
            transaction_hash: tx_hash,
            success: failure.is_none(),
            block_number: Some(block),
            gas_used: failure.unwrap_or(STUB_GAS_USED),
            logs,
        };
        self.receipts.lock().unwrap().insert(tx_hash, receipt);

        Ok(tx_hash)
    }

    async fn receipt(&self, tx_hash: TxHash) -> Result<Option<ReceiptSummary>, ScriptError> {
        if self.never_include.load(Ordering::SeqCst) {
            return Ok(None);
        }

        Ok(self.receipts.lock().unwrap().get(&tx_hash).cloned())
    }
}

// ------------
// | Fixtures |
// ------------

/// A function ABI entry
fn function(name: &str, inputs: &[(&str, &str)], outputs: &[&str], mutability: &str) -> Value {
    json!({
        "type": "function",
        "name": name,
        "inputs": inputs
            .iter()
            .map(|(name, ty)| json!({ "name": name, "type": ty }))
            .collect::<Vec<_>>(),
        "outputs": outputs
            .iter()
            .map(|ty| json!({ "name": "", "type": ty }))
            .collect::<Vec<_>>(),
        "stateMutability": mutability,
    })
}

/// A state-changing function ABI entry
fn setter(name: &str, inputs: &[(&str, &str)]) -> Value {
    function(name, inputs, &[], "nonpayable")
}

/// A view function ABI entry with a single output
fn getter(name: &str, output: &str) -> Value {
    function(name, &[], &[output], "view")
}

/// An event ABI entry
fn event(name: &str, inputs: &[(&str, &str, bool)]) -> Value {
    json!({
        "type": "event",
        "name": name,
        "anonymous": false,
        "inputs": inputs
            .iter()
            .map(|(name, ty, indexed)| json!({ "name": name, "type": ty, "indexed": indexed }))
            .collect::<Vec<_>>(),
    })
}

/// Build an artifact from ABI entries, deployed on [`DEVNET`] when an address
/// is given
fn artifact(abi: Vec<Value>, address: Option<Address>) -> ContractArtifact {
    let networks = match address {
        Some(address) => json!({ (DEVNET.to_string()): { "address": address } }),
        None => json!({}),
    };

    serde_json::from_value(json!({ "abi": abi, "networks": networks }))
        .expect("fixture artifact is well formed")
}

/// Artifacts for every known contract
pub fn fixture_artifacts() -> StaticArtifacts {
    StaticArtifacts::default()
        .with_artifact(
            ContractName::RocketAdmin,
            artifact(
                vec![
                    setter("setNodeTrusted", &[("_nodeAddress", "address"), ("_trusted", "bool")]),
                ],
                Some(ADMIN_ADDRESS),
            ),
        )
        .with_artifact(
            ContractName::RocketDepositSettings,
            artifact(
                vec![
                    setter("setDepositAllowed", &[("_allowed", "bool")]),
                    getter("getDepositAllowed", "bool"),
                    setter("setDepositChunkSize", &[("_size", "uint256")]),
                    getter("getDepositChunkSize", "uint256"),
                    setter("setMinimumDepositAmount", &[("_amount", "uint256")]),
                    getter("getMinimumDepositAmount", "uint256"),
                    setter("setMaximumDepositAmount", &[("_amount", "uint256")]),
                    getter("getMaximumDepositAmount", "uint256"),
                    setter("setWithdrawalAllowed", &[("_allowed", "bool")]),
                    getter("getWithdrawalAllowed", "bool"),
                    setter("setRefundDepositAllowed", &[("_allowed", "bool")]),
                    getter("getRefundDepositAllowed", "bool"),
                ],
                Some(DEPOSIT_SETTINGS_ADDRESS),
            ),
        )
        .with_artifact(
            ContractName::RocketGroupAPI,
            artifact(
                vec![
                    function(
                        "add",
                        &[("_ID", "string"), ("_stakingFee", "uint256")],
                        &["bool"],
                        "payable",
                    ),
                    setter("createDefaultAccessor", &[("_ID", "address")]),
                    event(
                        "GroupAdd",
                        &[
                            ("ID", "address", true),
                            ("name", "string", false),
                            ("stakingFee", "uint256", false),
                            ("created", "uint256", false),
                        ],
                    ),
                    event(
                        "GroupCreateDefaultAccessor",
                        &[
                            ("ID", "address", true),
                            ("accessorAddress", "address", true),
                            ("created", "uint256", false),
                        ],
                    ),
                ],
                Some(GROUP_API_ADDRESS),
            ),
        )
        .with_artifact(
            ContractName::RocketGroupSettings,
            artifact(
                vec![
                    setter("setDefaultFee", &[("_fee", "uint256")]),
                    getter("getDefaultFee", "uint256"),
                    setter("setMaxFee", &[("_fee", "uint256")]),
                    getter("getMaxFee", "uint256"),
                    setter("setNewFee", &[("_fee", "uint256")]),
                    getter("getNewFee", "uint256"),
                    setter("setNewFeeAddress", &[("_address", "address")]),
                    getter("getNewFeeAddress", "address"),
                ],
                Some(GROUP_SETTINGS_ADDRESS),
            ),
        )
        .with_artifact(
            ContractName::RocketGroupContract,
            artifact(
                vec![
                    setter("addDepositor", &[("_depositorAddress", "address")]),
                    setter("addWithdrawer", &[("_withdrawerAddress", "address")]),
                ],
                None,
            ),
        )
        .with_artifact(
            ContractName::RocketGroupAccessorContract,
            artifact(
                vec![function("deposit", &[("_durationID", "string")], &[], "payable")],
                None,
            ),
        )
        .with_artifact(
            ContractName::RocketMinipoolSettings,
            artifact(
                vec![
                    setter("setMinipoolNewEnabled", &[("_enabled", "bool")]),
                    getter("getMinipoolNewEnabled", "bool"),
                    setter("setMinipoolClosingEnabled", &[("_enabled", "bool")]),
                    getter("getMinipoolClosingEnabled", "bool"),
                    setter(
                        "setMinipoolWithdrawalFeeDepositAddress",
                        &[("_depositAddress", "address")],
                    ),
                    getter("getMinipoolWithdrawalFeeDepositAddress", "address"),
                    setter(
                        "setMinipoolStakingDuration",
                        &[("_duration", "string"), ("_blocks", "uint64")],
                    ),
                    setter(
                        "setMinipoolStakingDurationEnabled",
                        &[("_duration", "string"), ("_enabled", "bool")],
                    ),
                ],
                Some(MINIPOOL_SETTINGS_ADDRESS),
            ),
        )
        .with_artifact(
            ContractName::RocketNodeSettings,
            artifact(
                vec![
                    setter("setNewAllowed", &[("_allowed", "bool")]),
                    getter("getNewAllowed", "bool"),
                    setter("setEtherMin", &[("_weiAmount", "uint256")]),
                    getter("getEtherMin", "uint256"),
                    setter("setInactiveAutomatic", &[("_enabled", "bool")]),
                    getter("getInactiveAutomatic", "bool"),
                    setter("setWithdrawalCredentials", &[("_withdrawalCredentials", "bytes32")]),
                    getter("getWithdrawalCredentials", "bytes32"),
                ],
                Some(NODE_SETTINGS_ADDRESS),
            ),
        )
        .with_artifact(
            ContractName::RocketPoolToken,
            artifact(
                vec![
                    function(
                        "mint",
                        &[("_to", "address"), ("_amount", "uint256")],
                        &["bool"],
                        "nonpayable",
                    ),
                    getter("totalSupply", "uint256"),
                ],
                Some(TOKEN_ADDRESS),
            ),
        )
}

/// A `GroupAdd` log emitted by `emitter` for a new group
pub fn group_add_log(emitter: Address, group: Address, name: &str) -> Log {
    let topics = vec![
        keccak256("GroupAdd(address,string,uint256,uint256)"),
        group.into_word(),
    ];
    let body = DynSolValue::Tuple(vec![
        DynSolValue::String(name.to_string()),
        DynSolValue::Uint(U256::from(1), 256),
        DynSolValue::Uint(U256::from(2), 256),
    ])
    .abi_encode_params();

    Log {
        address: emitter,
        data: LogData::new_unchecked(topics, body.into()),
    }
}

/// A `GroupCreateDefaultAccessor` log emitted by `emitter`
pub fn accessor_log(emitter: Address, group: Address, accessor: Address) -> Log {
    let topics = vec![
        keccak256("GroupCreateDefaultAccessor(address,address,uint256)"),
        group.into_word(),
        accessor.into_word(),
    ];
    let body = DynSolValue::Uint(U256::from(3), 256).abi_encode();

    Log {
        address: emitter,
        data: LogData::new_unchecked(topics, body.into()),
    }
}
