//! Type definitions used throughout the scripts

use std::{
    collections::BTreeMap,
    fmt::{self, Display},
    sync::Arc,
};

use admin_common::types::ContractName;
use alloy::{
    dyn_abi::{DynSolValue, JsonAbiExt},
    json_abi::{Function, JsonAbi},
    network::TransactionBuilder,
    primitives::{Address, Bytes, TxHash, U256},
    rpc::types::TransactionRequest,
};

use crate::errors::ScriptError;

/// The identity of a chain, as reported by `eth_chainId` or set by the operator
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NetworkId(pub u64);

impl Display for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A contract interface bound to an address
#[derive(Debug)]
pub struct ContractRef {
    /// The contract's name
    name: ContractName,
    /// The contract's method and event signatures
    abi: Arc<JsonAbi>,
    /// The contract's address
    address: Address,
}

impl ContractRef {
    /// Bind an interface to an address
    pub fn new(name: ContractName, abi: Arc<JsonAbi>, address: Address) -> Self {
        Self { name, abi, address }
    }

    /// The contract's name
    pub fn name(&self) -> ContractName {
        self.name
    }

    /// The contract's interface
    pub fn abi(&self) -> &JsonAbi {
        &self.abi
    }

    /// The contract's address
    pub fn address(&self) -> Address {
        self.address
    }
}

/// Whether an invocation reads state or changes it
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CallKind {
    /// An `eth_call`, returning decoded values immediately
    Query,
    /// A transaction, returning once it is included
    Transaction,
}

/// A fully validated contract call, ready to be queried or submitted
#[derive(Clone, Debug)]
pub struct CallRequest {
    /// The contract being called
    contract: Arc<ContractRef>,
    /// The method overload being called
    function: Function,
    /// The arguments, already checked against `function`'s inputs
    args: Vec<DynSolValue>,
    /// The account sending the call
    sender: Address,
    /// The native-currency amount attached to the call
    value: U256,
    /// The gas ceiling for the call
    gas_limit: u64,
}

impl CallRequest {
    /// Construct a request. Callers must have checked `args` against
    /// `function`'s inputs, see [`crate::invoker::prepare`].
    pub(crate) fn new(
        contract: Arc<ContractRef>,
        function: Function,
        args: Vec<DynSolValue>,
        sender: Address,
        value: U256,
        gas_limit: u64,
    ) -> Self {
        Self {
            contract,
            function,
            args,
            sender,
            value,
            gas_limit,
        }
    }

    /// The contract being called
    pub fn contract(&self) -> &Arc<ContractRef> {
        &self.contract
    }

    /// The method overload being called
    pub fn function(&self) -> &Function {
        &self.function
    }

    /// The name of the method being called
    pub fn method(&self) -> &str {
        &self.function.name
    }

    /// The call arguments
    pub fn args(&self) -> &[DynSolValue] {
        &self.args
    }

    /// The account sending the call
    pub fn sender(&self) -> Address {
        self.sender
    }

    /// The native-currency amount attached to the call
    pub fn value(&self) -> U256 {
        self.value
    }

    /// The gas ceiling for the call
    pub fn gas_limit(&self) -> u64 {
        self.gas_limit
    }

    /// The ABI-encoded calldata
    pub fn calldata(&self) -> Result<Bytes, ScriptError> {
        self.function
            .abi_encode_input(&self.args)
            .map(Bytes::from)
            .map_err(|e| ScriptError::CalldataConstruction(e.to_string()))
    }

    /// The RPC transaction request for this call
    pub fn to_transaction(&self) -> Result<TransactionRequest, ScriptError> {
        Ok(TransactionRequest::default()
            .with_from(self.sender)
            .with_to(self.contract.address())
            .with_input(self.calldata()?)
            .with_value(self.value)
            .with_gas_limit(self.gas_limit))
    }
}

impl Display for CallRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.contract.name(), self.function.name)
    }
}

/// A decoded event log
#[derive(Clone, Debug, PartialEq)]
pub struct EmittedEvent {
    /// The address of the emitting contract
    pub address: Address,
    /// The event's fields, in declaration order
    pub fields: Vec<(String, DynSolValue)>,
}

impl EmittedEvent {
    /// Look up a field by name
    pub fn field(&self, name: &str) -> Option<&DynSolValue> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }
}

/// The result of a submitted transaction
#[derive(Clone, Debug)]
pub struct TransactionOutcome {
    /// The transaction hash
    pub tx_hash: TxHash,
    /// Whether the transaction executed successfully
    pub success: bool,
    /// The block the transaction was included in
    pub block_number: Option<u64>,
    /// The gas consumed by the transaction
    pub gas_used: u64,
    /// The decoded events, keyed by event name, in log order
    pub emitted_events: BTreeMap<String, Vec<EmittedEvent>>,
    /// The failure reason, when `success` is false
    pub error_message: Option<String>,
}

impl TransactionOutcome {
    /// Promote a failed outcome to a [`ScriptError::TransactionFailed`]
    pub fn ensure_success(self) -> Result<Self, ScriptError> {
        if self.success {
            return Ok(self);
        }

        Err(ScriptError::TransactionFailed {
            tx_hash: self.tx_hash,
            reason: self
                .error_message
                .unwrap_or_else(|| "transaction reverted".to_string()),
        })
    }

    /// The given field of the first emitted event with the given name
    pub fn event_field(&self, event: &str, field: &str) -> Option<&DynSolValue> {
        self.emitted_events
            .get(event)
            .and_then(|events| events.first())
            .and_then(|e| e.field(field))
    }

    /// An address carried by an emitted event, e.g. a contract created by the transaction
    pub fn derived_address(&self, event: &str, field: &str) -> Result<Address, ScriptError> {
        self.event_field(event, field)
            .and_then(DynSolValue::as_address)
            .ok_or_else(|| ScriptError::MissingEvent {
                event: event.to_string(),
                field: field.to_string(),
            })
    }
}
