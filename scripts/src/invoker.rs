//! Binding of contract methods into validated calls, and their execution

use std::sync::Arc;

use alloy::{
    dyn_abi::{DynSolType, DynSolValue, FunctionExt},
    json_abi::Function,
    primitives::{Address, U256},
};
use itertools::Itertools;
use tracing::debug;

use crate::{
    client::ChainClient,
    errors::ScriptError,
    submitter::Submitter,
    types::{CallKind, CallRequest, ContractRef, TransactionOutcome},
};

/// The result of an invocation
#[derive(Clone, Debug)]
pub enum Invocation {
    /// The decoded return values of a read-only call
    Returned(Vec<DynSolValue>),
    /// The outcome of a state-changing transaction
    Submitted(TransactionOutcome),
}

impl Invocation {
    /// The return values of a query
    pub fn into_returned(self) -> Result<Vec<DynSolValue>, ScriptError> {
        match self {
            Invocation::Returned(values) => Ok(values),
            Invocation::Submitted(outcome) => Err(ScriptError::Submission(format!(
                "expected return values, {} was sent instead",
                outcome.tx_hash
            ))),
        }
    }

    /// The outcome of a transaction
    pub fn into_outcome(self) -> Result<TransactionOutcome, ScriptError> {
        match self {
            Invocation::Submitted(outcome) => Ok(outcome),
            Invocation::Returned(_) => Err(ScriptError::Submission(
                "expected a transaction, the call was only queried".to_string(),
            )),
        }
    }
}

/// Executes validated calls, either as queries or as transactions
pub struct Invoker<C> {
    /// The client queries are executed through
    client: Arc<C>,
    /// The submitter transactions are delegated to
    submitter: Submitter<C>,
}

impl<C: ChainClient> Invoker<C> {
    /// Create an invoker over the given client and submitter
    pub fn new(client: Arc<C>, submitter: Submitter<C>) -> Self {
        Self { client, submitter }
    }

    /// The submitter transactions are delegated to
    pub fn submitter(&self) -> &Submitter<C> {
        &self.submitter
    }

    /// Execute a read-only call and decode its return values
    async fn query(&self, request: &CallRequest) -> Result<Vec<DynSolValue>, ScriptError> {
        let tx = request.to_transaction()?;
        debug!(call = %request, "querying");
        let data = self.client.call(&tx, None).await?;

        request
            .function()
            .abi_decode_output(&data, true)
            .map_err(|e| ScriptError::CalldataConstruction(format!("{request}: {e}")))
    }

    /// Execute a call as a query or as a transaction
    pub async fn invoke(
        &self,
        request: &CallRequest,
        kind: CallKind,
    ) -> Result<Invocation, ScriptError> {
        match kind {
            CallKind::Query => self.query(request).await.map(Invocation::Returned),
            CallKind::Transaction => {
                self.submitter.submit(request).await.map(Invocation::Submitted)
            }
        }
    }
}

/// Bind a method and arguments into a [`CallRequest`]
///
/// Fails with `UnknownMethod` if the interface has no such method, and with
/// `ArgumentMismatch` if no overload accepts the arguments. No network
/// access happens here.
pub fn prepare(
    contract: Arc<ContractRef>,
    method: &str,
    args: Vec<DynSolValue>,
    sender: Address,
    value: U256,
    gas_limit: u64,
) -> Result<CallRequest, ScriptError> {
    let overloads = contract.abi().function(method).ok_or_else(|| {
        ScriptError::UnknownMethod {
            contract: contract.name().to_string(),
            method: method.to_string(),
        }
    })?;

    let mismatch = |reason: String| ScriptError::ArgumentMismatch {
        contract: contract.name().to_string(),
        method: method.to_string(),
        reason,
    };

    let candidates: Vec<&Function> = overloads
        .iter()
        .filter(|f| f.inputs.len() == args.len())
        .collect();
    if candidates.is_empty() {
        let expected = overloads.iter().map(|f| f.inputs.len()).join(" or ");
        return Err(mismatch(format!(
            "expected {} arguments, got {}",
            expected,
            args.len()
        )));
    }

    let mut first_err = None;
    for function in candidates {
        match conform_args(function, &args) {
            Ok(conformed) => {
                let function = function.clone();
                return Ok(CallRequest::new(
                    contract, function, conformed, sender, value, gas_limit,
                ));
            }
            Err(reason) => {
                first_err.get_or_insert(reason);
            }
        }
    }

    Err(mismatch(first_err.unwrap_or_default()))
}

/// Check arguments against a function's declared inputs, narrowing unsigned
/// integers to the declared width
fn conform_args(function: &Function, args: &[DynSolValue]) -> Result<Vec<DynSolValue>, String> {
    function
        .inputs
        .iter()
        .zip(args)
        .enumerate()
        .map(|(i, (input, arg))| {
            let ty = DynSolType::parse(&input.selector_type())
                .map_err(|e| format!("argument {i} has an unsupported type: {e}"))?;
            let value = match (&ty, arg) {
                (DynSolType::Uint(bits), DynSolValue::Uint(n, _)) => {
                    if n.bit_len() > *bits {
                        return Err(format!("argument {i}: {n} does not fit in uint{bits}"));
                    }
                    DynSolValue::Uint(*n, *bits)
                }
                _ => arg.clone(),
            };

            if !ty.matches(&value) {
                let got = value
                    .as_type()
                    .map(|t| t.sol_type_name().into_owned())
                    .unwrap_or_else(|| "an untyped value".to_string());
                return Err(format!("argument {i}: expected {}, got {got}", ty.sol_type_name()));
            }

            Ok(value)
        })
        .collect()
}
