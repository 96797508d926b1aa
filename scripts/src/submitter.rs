//! Submission of state-changing calls and collection of their outcomes

use std::{collections::BTreeMap, sync::Arc, time::Duration};

use alloy::{
    dyn_abi::{DynSolValue, EventExt},
    json_abi::JsonAbi,
    network::TransactionBuilder,
    primitives::{Address, Log, TxHash, U256},
    rpc::types::TransactionRequest,
};
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use crate::{
    client::{ChainClient, ReceiptSummary},
    constants::{DEFAULT_GAS_LIMIT, DEFAULT_RECEIPT_TIMEOUT_SECS, RECEIPT_POLL_INTERVAL_MS},
    errors::ScriptError,
    types::{CallRequest, EmittedEvent, TransactionOutcome},
};

/// The failure reason reported when a transaction consumed its whole gas budget
pub const OUT_OF_GAS_REASON: &str = "out of gas";

/// The failure reason reported when no revert reason could be recovered
pub const REVERTED_REASON: &str = "transaction reverted";

/// A callback invoked with a description of each transaction once it is sent
pub type SentHook = Arc<dyn Fn(&str, TxHash) + Send + Sync>;

/// The gas and waiting policy applied to every transaction
#[derive(Clone, Debug)]
pub struct SubmissionPolicy {
    /// The gas ceiling of every transaction; gas is never estimated
    pub gas_limit: u64,
    /// How long to wait for a transaction to be included
    pub receipt_timeout: Duration,
    /// How long to sleep between receipt polls
    pub poll_interval: Duration,
}

impl Default for SubmissionPolicy {
    fn default() -> Self {
        Self {
            gas_limit: DEFAULT_GAS_LIMIT,
            receipt_timeout: Duration::from_secs(DEFAULT_RECEIPT_TIMEOUT_SECS),
            poll_interval: Duration::from_millis(RECEIPT_POLL_INTERVAL_MS),
        }
    }
}

/// Sends transactions and waits for their receipts
pub struct Submitter<C> {
    /// The client transactions are sent through
    client: Arc<C>,
    /// The gas and waiting policy
    policy: SubmissionPolicy,
    /// Invoked as soon as a transaction hash is known
    on_sent: Option<SentHook>,
}

impl<C: ChainClient> Submitter<C> {
    /// Create a submitter over the given client
    pub fn new(client: Arc<C>, policy: SubmissionPolicy) -> Self {
        Self {
            client,
            policy,
            on_sent: None,
        }
    }

    /// Invoke `hook` with every transaction hash as soon as it is sent
    pub fn with_sent_hook(mut self, hook: SentHook) -> Self {
        self.on_sent = Some(hook);
        self
    }

    /// The policy applied to every transaction
    pub fn policy(&self) -> &SubmissionPolicy {
        &self.policy
    }

    /// Submit a contract call and wait for it to be included
    ///
    /// A transaction that is included but fails is not an error here: the
    /// outcome carries `success = false` and the failure reason.
    pub async fn submit(&self, request: &CallRequest) -> Result<TransactionOutcome, ScriptError> {
        let tx = request.to_transaction()?;
        let receipt = self
            .send_and_wait(&request.to_string(), tx.clone())
            .await?;

        let emitted_events = decode_events(request.contract().abi(), &receipt.logs);
        let error_message = if receipt.success {
            None
        } else {
            Some(self.failure_reason(&tx, &receipt, request.gas_limit()).await)
        };

        Ok(TransactionOutcome {
            tx_hash: receipt.transaction_hash,
            success: receipt.success,
            block_number: receipt.block_number,
            gas_used: receipt.gas_used,
            emitted_events,
            error_message,
        })
    }

    /// Transfer native currency between accounts
    pub async fn transfer(
        &self,
        from: Address,
        to: Address,
        value: U256,
    ) -> Result<TransactionOutcome, ScriptError> {
        let tx = TransactionRequest::default()
            .with_from(from)
            .with_to(to)
            .with_value(value)
            .with_gas_limit(self.policy.gas_limit);

        let receipt = self
            .send_and_wait(&format!("transfer to {to}"), tx.clone())
            .await?;
        let error_message = if receipt.success {
            None
        } else {
            Some(self.failure_reason(&tx, &receipt, self.policy.gas_limit).await)
        };

        Ok(TransactionOutcome {
            tx_hash: receipt.transaction_hash,
            success: receipt.success,
            block_number: receipt.block_number,
            gas_used: receipt.gas_used,
            emitted_events: BTreeMap::new(),
            error_message,
        })
    }

    /// Send a transaction and poll for its receipt until the deadline
    async fn send_and_wait(
        &self,
        label: &str,
        tx: TransactionRequest,
    ) -> Result<ReceiptSummary, ScriptError> {
        let tx_hash = self.client.send_transaction(tx).await?;
        info!(call = label, tx_hash = %tx_hash, "transaction sent");
        if let Some(hook) = &self.on_sent {
            hook(label, tx_hash);
        }

        let deadline = Instant::now() + self.policy.receipt_timeout;
        loop {
            if let Some(receipt) = self.client.receipt(tx_hash).await? {
                info!(
                    call = label,
                    tx_hash = %tx_hash,
                    success = receipt.success,
                    block = ?receipt.block_number,
                    gas_used = receipt.gas_used,
                    "transaction included"
                );
                return Ok(receipt);
            }

            if Instant::now() >= deadline {
                warn!(call = label, tx_hash = %tx_hash, "receipt wait abandoned");
                return Err(ScriptError::Submission(format!(
                    "transaction {:#x} was not included within {}s and may still be pending",
                    tx_hash,
                    self.policy.receipt_timeout.as_secs_f64()
                )));
            }

            debug!(tx_hash = %tx_hash, "awaiting receipt");
            sleep(self.policy.poll_interval).await;
        }
    }

    /// Recover the reason an included transaction failed
    async fn failure_reason(
        &self,
        tx: &TransactionRequest,
        receipt: &ReceiptSummary,
        gas_limit: u64,
    ) -> String {
        warn!(
            tx_hash = %receipt.transaction_hash,
            gas_used = receipt.gas_used,
            "transaction failed"
        );
        if receipt.gas_used >= gas_limit {
            return OUT_OF_GAS_REASON.to_string();
        }

        match self.client.call(tx, receipt.block_number).await {
            Err(ScriptError::ContractRevert(reason)) => reason,
            Err(e) => {
                debug!(error = %e, "could not replay failed transaction");
                REVERTED_REASON.to_string()
            }
            Ok(_) => REVERTED_REASON.to_string(),
        }
    }
}

/// Decode every log matching a non-anonymous event of the given interface,
/// grouping the results by event name in log order
pub fn decode_events(abi: &JsonAbi, logs: &[Log]) -> BTreeMap<String, Vec<EmittedEvent>> {
    let mut emitted: BTreeMap<String, Vec<EmittedEvent>> = BTreeMap::new();

    for log in logs {
        let Some(topic0) = log.data.topics().first() else {
            continue;
        };
        let Some(event) = abi
            .events()
            .find(|e| !e.anonymous && e.selector() == *topic0)
        else {
            continue;
        };

        let decoded = match event.decode_log(&log.data, true) {
            Ok(decoded) => decoded,
            Err(e) => {
                debug!(event = %event.name, error = %e, "skipping undecodable log");
                continue;
            }
        };

        // Indexed and body values are stored separately; restore declaration order
        let mut indexed = decoded.indexed.into_iter();
        let mut body = decoded.body.into_iter();
        let fields: Vec<(String, DynSolValue)> = event
            .inputs
            .iter()
            .filter_map(|input| {
                let value = if input.indexed { indexed.next() } else { body.next() };
                value.map(|v| (input.name.clone(), v))
            })
            .collect();

        emitted.entry(event.name.clone()).or_default().push(EmittedEvent {
            address: log.address,
            fields,
        });
    }

    emitted
}
