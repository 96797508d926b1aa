//! Utilities for the administration scripts

use std::sync::Arc;

use alloy::{
    dyn_abi::DynSolValue,
    primitives::{Address, U256},
};
use itertools::Itertools;

use crate::{
    client::AlloyClient,
    dispatcher::{DispatchConfig, Dispatcher},
    errors::ScriptError,
    resolver::ArtifactDir,
    types::TransactionOutcome,
};

/// Sets up a dispatcher over an HTTP client and the artifacts directory,
/// signing with the configured private key if there is one
pub fn setup_dispatcher(config: &DispatchConfig) -> Result<Dispatcher<AlloyClient>, ScriptError> {
    let client = AlloyClient::connect(&config.rpc_url, config.priv_key.as_deref())?;
    let artifacts = ArtifactDir::new(&config.artifacts_dir);

    Ok(Dispatcher::new(Arc::new(client), Box::new(artifacts), config))
}

/// Render a decoded value for display
pub fn format_value(value: &DynSolValue) -> String {
    match value {
        DynSolValue::Bool(b) => b.to_string(),
        DynSolValue::Int(n, _) => n.to_string(),
        DynSolValue::Uint(n, _) => n.to_string(),
        DynSolValue::Address(a) => a.to_checksum(None),
        DynSolValue::FixedBytes(word, len) => format!("0x{}", hex::encode(&word[..*len])),
        DynSolValue::Bytes(b) => format!("0x{}", hex::encode(b)),
        DynSolValue::String(s) => s.clone(),
        DynSolValue::Array(values) | DynSolValue::FixedArray(values) => {
            format!("[{}]", values.iter().map(format_value).join(", "))
        }
        DynSolValue::Tuple(values) => format!("({})", format_values(values)),
        other => format!("{other:?}"),
    }
}

/// Render a list of decoded values, comma separated
pub fn format_values(values: &[DynSolValue]) -> String {
    values.iter().map(format_value).join(", ")
}

/// A one-line summary of a transaction's inclusion
pub fn format_outcome(outcome: &TransactionOutcome) -> String {
    match outcome.block_number {
        Some(block) => format!("tx {:#x} included in block {}", outcome.tx_hash, block),
        None => format!("tx {:#x} included", outcome.tx_hash),
    }
}

/// Unwrap a coerced integer
pub fn expect_uint(value: &DynSolValue) -> Result<U256, ScriptError> {
    value.as_uint().map(|(n, _)| n).ok_or_else(|| {
        ScriptError::CalldataConstruction(format!("expected an integer, got {value:?}"))
    })
}

/// Unwrap a coerced address
pub fn expect_address(value: &DynSolValue) -> Result<Address, ScriptError> {
    value.as_address().ok_or_else(|| {
        ScriptError::CalldataConstruction(format!("expected an address, got {value:?}"))
    })
}
