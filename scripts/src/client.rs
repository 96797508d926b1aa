//! The RPC capabilities the dispatcher relies on, and their implementation
//! over an alloy HTTP provider

use alloy::{
    eips::BlockId,
    network::EthereumWallet,
    primitives::{Address, Bytes, Log, TxHash},
    providers::{DynProvider, Provider, ProviderBuilder},
    rpc::{json_rpc::ErrorPayload, types::TransactionRequest},
    signers::local::PrivateKeySigner,
    transports::{http::reqwest::Url, RpcError, TransportErrorKind},
};
use alloy_sol_types::decode_revert_reason;
use async_trait::async_trait;
use tracing::debug;

use crate::errors::ScriptError;

/// The parts of a transaction receipt the dispatcher consumes
#[derive(Clone, Debug)]
pub struct ReceiptSummary {
    /// The transaction hash
    pub transaction_hash: TxHash,
    /// Whether execution succeeded
    pub success: bool,
    /// The block the transaction was included in
    pub block_number: Option<u64>,
    /// The gas consumed
    pub gas_used: u64,
    /// The logs emitted, in order
    pub logs: Vec<Log>,
}

/// A JSON-RPC capable chain client
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// The chain id of the connected network
    async fn chain_id(&self) -> Result<u64, ScriptError>;

    /// The accounts this client can send from
    async fn accounts(&self) -> Result<Vec<Address>, ScriptError>;

    /// Execute a read-only call, at the latest block unless one is given
    async fn call(
        &self,
        tx: &TransactionRequest,
        block: Option<u64>,
    ) -> Result<Bytes, ScriptError>;

    /// Sign and broadcast a transaction, returning its hash without waiting
    async fn send_transaction(&self, tx: TransactionRequest) -> Result<TxHash, ScriptError>;

    /// Fetch the receipt of a transaction, if it has been included
    async fn receipt(&self, tx_hash: TxHash) -> Result<Option<ReceiptSummary>, ScriptError>;
}

/// A [`ChainClient`] backed by an alloy HTTP provider
///
/// With a private key, transactions are signed locally; otherwise they are sent
/// through `eth_sendTransaction` and signed by the node's unlocked accounts.
pub struct AlloyClient {
    /// The underlying provider
    provider: DynProvider,
    /// The local signer's address, if any
    signer: Option<Address>,
}

impl AlloyClient {
    /// Connect to the given RPC URL, optionally signing with a private key
    pub fn connect(rpc_url: &str, priv_key: Option<&str>) -> Result<Self, ScriptError> {
        let url: Url = rpc_url
            .parse()
            .map_err(|e| ScriptError::ClientInitialization(format!("invalid RPC URL: {e}")))?;

        match priv_key {
            Some(key) => {
                let signer: PrivateKeySigner = key
                    .parse()
                    .map_err(|e| ScriptError::ClientInitialization(format!("invalid key: {e}")))?;
                let address = signer.address();
                let provider = ProviderBuilder::new()
                    .wallet(EthereumWallet::from(signer))
                    .on_http(url)
                    .erased();

                Ok(Self {
                    provider,
                    signer: Some(address),
                })
            }
            None => Ok(Self {
                provider: ProviderBuilder::new().on_http(url).erased(),
                signer: None,
            }),
        }
    }
}

#[async_trait]
impl ChainClient for AlloyClient {
    async fn chain_id(&self) -> Result<u64, ScriptError> {
        self.provider.get_chain_id().await.map_err(map_rpc_error)
    }

    async fn accounts(&self) -> Result<Vec<Address>, ScriptError> {
        if let Some(signer) = self.signer {
            return Ok(vec![signer]);
        }

        self.provider.get_accounts().await.map_err(map_rpc_error)
    }

    async fn call(
        &self,
        tx: &TransactionRequest,
        block: Option<u64>,
    ) -> Result<Bytes, ScriptError> {
        let call = self.provider.call(tx);
        let call = match block {
            Some(number) => call.block(BlockId::number(number)),
            None => call,
        };

        call.await.map_err(map_rpc_error)
    }

    async fn send_transaction(&self, tx: TransactionRequest) -> Result<TxHash, ScriptError> {
        let pending = self
            .provider
            .send_transaction(tx)
            .await
            .map_err(map_rpc_error)?;

        Ok(*pending.tx_hash())
    }

    async fn receipt(&self, tx_hash: TxHash) -> Result<Option<ReceiptSummary>, ScriptError> {
        let receipt = self
            .provider
            .get_transaction_receipt(tx_hash)
            .await
            .map_err(map_rpc_error)?;

        Ok(receipt.map(|r| {
            debug!(tx_hash = %tx_hash, status = r.status(), "fetched receipt");
            ReceiptSummary {
                transaction_hash: r.transaction_hash,
                success: r.status(),
                block_number: r.block_number,
                gas_used: r.gas_used,
                logs: r.inner.logs().iter().map(|l| l.inner.clone()).collect(),
            }
        }))
    }
}

/// The JSON-RPC error code nodes use for reverted execution
const EXECUTION_REVERTED_CODE: i64 = 3;

/// Convert an RPC error into a [`ScriptError`]
fn map_rpc_error(err: RpcError<TransportErrorKind>) -> ScriptError {
    match err.as_error_resp() {
        Some(payload) => payload_error(payload),
        None => ScriptError::Submission(err.to_string()),
    }
}

/// Classify an error response from the node
///
/// Only reverted execution is a contract rejection, carrying the decoded
/// revert reason when the node returned revert data. Any other error response
/// means the request itself failed.
fn payload_error(payload: &ErrorPayload) -> ScriptError {
    let revert_data = payload.as_revert_data();
    let reverted = revert_data.is_some()
        || payload.code == EXECUTION_REVERTED_CODE
        || payload.message.contains("execution reverted");
    if !reverted {
        return ScriptError::Submission(format!("{} (code {})", payload.message, payload.code));
    }

    let reason = revert_data
        .and_then(|data| decode_revert_reason(&data))
        .unwrap_or_else(|| payload.message.to_string());
    ScriptError::ContractRevert(reason)
}
