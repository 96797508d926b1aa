//! The contract administration dispatcher, tying resolution, coercion,
//! invocation and submission together

use std::{path::PathBuf, sync::Arc};

use admin_common::types::ContractName;
use alloy::{
    dyn_abi::DynSolValue,
    json_abi::JsonAbi,
    primitives::{Address, U256},
};
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use crate::{
    client::ChainClient,
    coercion::coerce,
    errors::ScriptError,
    invoker::{prepare, Invoker},
    registry::SettingEntry,
    resolver::{ArtifactSource, NetworkResolver},
    submitter::{SentHook, SubmissionPolicy, Submitter},
    types::{CallKind, CallRequest, ContractRef, NetworkId, TransactionOutcome},
};

/// The configuration of a dispatcher, assembled from CLI flags and the
/// environment
#[derive(Clone, Default)]
pub struct DispatchConfig {
    /// The RPC endpoint
    pub rpc_url: String,
    /// The signer's private key; without one the node's unlocked accounts sign
    pub priv_key: Option<String>,
    /// Which of the node's accounts sends, when no private key is given
    pub from_index: usize,
    /// The directory holding the contract build artifacts
    pub artifacts_dir: PathBuf,
    /// The network identity to resolve contracts for, instead of the chain id
    pub network_id: Option<u64>,
    /// The gas and waiting policy of every transaction
    pub policy: SubmissionPolicy,
    /// Whether to simulate every transaction before sending any
    pub preflight: bool,
    /// Invoked with each transaction hash as soon as it is sent
    pub on_sent: Option<SentHook>,
}

/// The result of changing a setting
#[derive(Clone, Debug)]
pub struct SettingChange {
    /// The outcome of every setter call, in order
    pub outcomes: Vec<TransactionOutcome>,
    /// The setting's value read back after the change, if it has a getter
    pub current: Option<Vec<DynSolValue>>,
}

/// Dispatches administration calls against one network
///
/// The network identity and sender are resolved on first use. Tokens are
/// always coerced before either is needed, so malformed input never reaches
/// the network.
pub struct Dispatcher<C> {
    /// The RPC client
    client: Arc<C>,
    /// Resolves contracts for the network
    resolver: NetworkResolver,
    /// Executes prepared calls
    invoker: Invoker<C>,
    /// The configured network identity override
    network_override: Option<u64>,
    /// The index of the sending account among the node's accounts
    from_index: usize,
    /// Whether to simulate transactions before sending
    preflight: bool,
    /// The network identity, once resolved
    network: OnceCell<NetworkId>,
    /// The sending account, once resolved
    sender: OnceCell<Address>,
}

impl<C: ChainClient> Dispatcher<C> {
    /// Create a dispatcher over a client and an artifact source
    pub fn new(
        client: Arc<C>,
        artifacts: Box<dyn ArtifactSource>,
        config: &DispatchConfig,
    ) -> Self {
        let mut submitter = Submitter::new(client.clone(), config.policy.clone());
        if let Some(hook) = &config.on_sent {
            submitter = submitter.with_sent_hook(hook.clone());
        }

        Self {
            client: client.clone(),
            resolver: NetworkResolver::new(artifacts),
            invoker: Invoker::new(client, submitter),
            network_override: config.network_id,
            from_index: config.from_index,
            preflight: config.preflight,
            network: OnceCell::new(),
            sender: OnceCell::new(),
        }
    }

    /// The network identity contracts are resolved for
    pub async fn network(&self) -> Result<NetworkId, ScriptError> {
        self.network
            .get_or_try_init(|| async {
                let network = match self.network_override {
                    Some(id) => NetworkId(id),
                    None => NetworkId(self.client.chain_id().await?),
                };
                debug!(network = %network, "using network");
                Ok::<_, ScriptError>(network)
            })
            .await
            .copied()
    }

    /// The account calls are sent from
    pub async fn sender(&self) -> Result<Address, ScriptError> {
        self.sender
            .get_or_try_init(|| async {
                let accounts = self.client.accounts().await?;
                let sender = accounts.get(self.from_index).copied().ok_or_else(|| {
                    ScriptError::Usage(format!(
                        "no account at index {} ({} available)",
                        self.from_index,
                        accounts.len()
                    ))
                })?;
                debug!(sender = %sender, "using sender");
                Ok::<_, ScriptError>(sender)
            })
            .await
            .copied()
    }

    /// The gas ceiling of every call
    pub fn gas_limit(&self) -> u64 {
        self.invoker.submitter().policy().gas_limit
    }

    /// Resolve a contract deployed on the dispatcher's network
    pub async fn contract(&self, name: ContractName) -> Result<Arc<ContractRef>, ScriptError> {
        let network = self.network().await?;
        self.resolver.resolve(name, network)
    }

    /// The interface of a contract, loaded without touching the network
    pub fn interface(&self, name: ContractName) -> Result<Arc<JsonAbi>, ScriptError> {
        self.resolver.abi(name)
    }

    /// Bind a contract interface to an address learned at runtime
    pub fn contract_at(
        &self,
        name: ContractName,
        address: Address,
    ) -> Result<Arc<ContractRef>, ScriptError> {
        self.resolver.interface_at(name, address)
    }

    /// Bind a call from the dispatcher's sender
    pub async fn prepare(
        &self,
        contract: Arc<ContractRef>,
        method: &str,
        args: Vec<DynSolValue>,
        value: U256,
    ) -> Result<CallRequest, ScriptError> {
        let sender = self.sender().await?;
        prepare(contract, method, args, sender, value, self.gas_limit())
    }

    /// Execute a read-only call
    pub async fn query(
        &self,
        contract: Arc<ContractRef>,
        method: &str,
        args: Vec<DynSolValue>,
    ) -> Result<Vec<DynSolValue>, ScriptError> {
        let request = self.prepare(contract, method, args, U256::ZERO).await?;
        self.invoker.invoke(&request, CallKind::Query).await?.into_returned()
    }

    /// Send a single transaction, failing unless it succeeds
    pub async fn transact(
        &self,
        contract: Arc<ContractRef>,
        method: &str,
        args: Vec<DynSolValue>,
        value: U256,
    ) -> Result<TransactionOutcome, ScriptError> {
        let request = self.prepare(contract, method, args, value).await?;
        let mut outcomes = self.transact_all(vec![request]).await?;
        outcomes
            .pop()
            .ok_or_else(|| ScriptError::Submission("no transaction was sent".to_string()))
    }

    /// Send prepared transactions in order, stopping at the first failure
    ///
    /// With preflight enabled, every request is simulated before the first is
    /// sent, so a revert aborts the whole batch.
    pub async fn transact_all(
        &self,
        requests: Vec<CallRequest>,
    ) -> Result<Vec<TransactionOutcome>, ScriptError> {
        if self.preflight {
            for request in &requests {
                self.simulate(request).await?;
            }
        }

        let mut outcomes = Vec::with_capacity(requests.len());
        for request in &requests {
            let invocation = self.invoker.invoke(request, CallKind::Transaction).await?;
            outcomes.push(invocation.into_outcome()?.ensure_success()?);
        }

        Ok(outcomes)
    }

    /// Transfer the same amount to each recipient, stopping at the first failure
    pub async fn transfer_all(
        &self,
        recipients: &[Address],
        value: U256,
    ) -> Result<Vec<TransactionOutcome>, ScriptError> {
        let sender = self.sender().await?;

        let mut outcomes = Vec::with_capacity(recipients.len());
        for recipient in recipients {
            let outcome = self.invoker.submitter().transfer(sender, *recipient, value).await?;
            outcomes.push(outcome.ensure_success()?);
        }

        Ok(outcomes)
    }

    /// Change a registered setting, reading it back when it has a getter
    pub async fn apply_setting(
        &self,
        entry: &SettingEntry,
        tokens: &[String],
    ) -> Result<SettingChange, ScriptError> {
        let calls = coerce(&entry.descriptor, tokens)?.calls();
        if calls.is_empty() {
            warn!(setting = entry.name(), "no values given, nothing to change");
        }

        let contract = self.contract(entry.contract).await?;
        let mut requests = Vec::with_capacity(calls.len());
        for args in calls {
            requests.push(self.prepare(contract.clone(), entry.setter, args, U256::ZERO).await?);
        }

        let outcomes = self.transact_all(requests).await?;
        let current = match entry.getter {
            Some(getter) => Some(self.query(contract, getter, vec![]).await?),
            None => None,
        };

        Ok(SettingChange { outcomes, current })
    }

    /// Read a registered setting through its getter
    pub async fn read_setting(
        &self,
        entry: &SettingEntry,
    ) -> Result<Vec<DynSolValue>, ScriptError> {
        let getter = entry.getter.ok_or_else(|| {
            ScriptError::Usage(format!("setting {} cannot be read back", entry.name()))
        })?;

        let contract = self.contract(entry.contract).await?;
        self.query(contract, getter, vec![]).await
    }

    /// Simulate a transaction with a read-only call
    async fn simulate(&self, request: &CallRequest) -> Result<(), ScriptError> {
        debug!(call = %request, "simulating");
        let tx = request.to_transaction()?;
        self.client.call(&tx, None).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::address;
    use eyre::Result;

    use super::*;
    use crate::{
        registry::lookup,
        test_helpers::{
            dispatcher, dispatcher_with, fixture_artifacts, selector_of, tokens, StubClient,
            DEPOSIT_SETTINGS_ADDRESS, DEVNET, OPERATOR,
        },
    };

    #[tokio::test]
    async fn test_network_and_sender() -> Result<()> {
        let (client, dispatcher) = dispatcher();
        assert_eq!(dispatcher.network().await?, DEVNET);
        assert_eq!(dispatcher.sender().await?, OPERATOR);

        // Both are resolved once
        dispatcher.network().await?;
        dispatcher.sender().await?;
        assert_eq!(client.chain_id_requests(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_network_override() -> Result<()> {
        let config = DispatchConfig {
            network_id: Some(7),
            ..Default::default()
        };
        let (client, dispatcher) = dispatcher_with(&config);

        assert_eq!(dispatcher.network().await?, NetworkId(7));
        assert_eq!(client.chain_id_requests(), 0);
        assert!(matches!(
            dispatcher.contract(ContractName::RocketAdmin).await,
            Err(ScriptError::UnknownNetwork { network: 7, .. })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_account() {
        let config = DispatchConfig {
            from_index: 3,
            ..Default::default()
        };
        let (_client, dispatcher) = dispatcher_with(&config);

        match dispatcher.sender().await {
            Err(e @ ScriptError::Usage(_)) => {
                assert_eq!(e.to_string(), "usage error: no account at index 3 (1 available)")
            }
            other => panic!("expected a usage error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_apply_setting() -> Result<()> {
        let (client, dispatcher) = dispatcher();
        let entry = lookup("deposit-allowed")?;
        let change = dispatcher.apply_setting(entry, &tokens(&["true"])).await?;

        assert_eq!(change.outcomes.len(), 1);
        assert!(change.current.is_some());

        let sent = client.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].from, Some(OPERATOR));
        assert_eq!(sent[0].to, Some(DEPOSIT_SETTINGS_ADDRESS.into()));
        assert_eq!(
            &sent[0].input.input().unwrap()[..4],
            selector_of("setDepositAllowed(bool)").as_slice()
        );

        // The getter was queried after the change
        assert_eq!(client.calls().len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_bad_token_sends_nothing() {
        let (client, dispatcher) = dispatcher();
        let entry = lookup("deposit-allowed").unwrap();
        let res = dispatcher.apply_setting(entry, &tokens(&["1"])).await;

        assert!(matches!(res, Err(ScriptError::Coercion { .. })));
        assert!(client.sent().is_empty());
        assert_eq!(client.chain_id_requests(), 0);
    }

    #[tokio::test]
    async fn test_variadic_setting_fans_out() -> Result<()> {
        let (client, dispatcher) = dispatcher();
        let entry = lookup("minipool-staking-duration-enabled")?;
        let change = dispatcher
            .apply_setting(entry, &tokens(&["false", "3m", "6m", "12m"]))
            .await?;

        assert_eq!(change.outcomes.len(), 3);
        assert!(change.current.is_none());
        assert_eq!(client.sent().len(), 3);
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_transaction_stops_the_batch() {
        let (client, dispatcher) = dispatcher();
        client.fail_on(selector_of("setMinipoolStakingDurationEnabled(string,bool)"), 40_000);
        client.respond(
            selector_of("setMinipoolStakingDurationEnabled(string,bool)"),
            Err(ScriptError::ContractRevert("Duration not found".to_string())),
        );

        let entry = lookup("minipool-staking-duration-enabled").unwrap();
        let res = dispatcher.apply_setting(entry, &tokens(&["true", "3m", "6m"])).await;

        match res {
            Err(ScriptError::TransactionFailed { reason, .. }) => {
                assert_eq!(reason, "Duration not found")
            }
            other => panic!("expected a failed transaction, got {other:?}"),
        }
        assert_eq!(client.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_rejected_send_stops_the_batch() {
        let (client, dispatcher) = dispatcher();
        client.reject_on(selector_of("setMinipoolStakingDurationEnabled(string,bool)"));

        let entry = lookup("minipool-staking-duration-enabled").unwrap();
        let res = dispatcher.apply_setting(entry, &tokens(&["false", "3m", "6m"])).await;

        assert!(matches!(res, Err(ScriptError::ContractRevert(_))));
        assert!(client.sent().is_empty());
    }

    #[tokio::test]
    async fn test_preflight_revert_sends_nothing() {
        let config = DispatchConfig {
            preflight: true,
            ..Default::default()
        };
        let (client, dispatcher) = dispatcher_with(&config);
        client.respond(
            selector_of("setDepositChunkSize(uint256)"),
            Err(ScriptError::ContractRevert("Chunk size too large".to_string())),
        );

        let entry = lookup("deposit-chunk-size").unwrap();
        let res = dispatcher.apply_setting(entry, &tokens(&["64"])).await;

        assert!(matches!(res, Err(ScriptError::ContractRevert(_))));
        assert!(client.sent().is_empty());
    }

    #[tokio::test]
    async fn test_read_setting_without_getter() {
        let (client, dispatcher) = dispatcher();
        let entry = lookup("minipool-staking-duration").unwrap();

        assert!(matches!(dispatcher.read_setting(entry).await, Err(ScriptError::Usage(_))));
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn test_transfer_all() -> Result<()> {
        let (client, dispatcher) = dispatcher();
        let recipients = [
            address!("00000000000000000000000000000000000000b1"),
            address!("00000000000000000000000000000000000000b2"),
        ];
        let outcomes = dispatcher.transfer_all(&recipients, U256::from(5)).await?;

        assert_eq!(outcomes.len(), 2);
        let sent = client.sent();
        assert_eq!(sent[1].to, Some(recipients[1].into()));
        assert_eq!(sent[1].from, Some(OPERATOR));
        Ok(())
    }

    #[tokio::test]
    async fn test_concurrent_dispatch() -> Result<()> {
        let client = Arc::new(StubClient::default());
        let dispatcher = Arc::new(Dispatcher::new(
            client.clone(),
            Box::new(fixture_artifacts()),
            &DispatchConfig::default(),
        ));

        let a = dispatcher.clone();
        let b = dispatcher.clone();
        let (first, second) = tokio::join!(
            async move {
                let entry = lookup("node-new-allowed")?;
                a.apply_setting(entry, &tokens(&["true"])).await
            },
            async move {
                let entry = lookup("group-max-fee")?;
                b.apply_setting(entry, &tokens(&["500"])).await
            },
        );

        assert_eq!(first?.outcomes.len(), 1);
        assert_eq!(second?.outcomes.len(), 1);
        assert_eq!(client.sent().len(), 2);
        Ok(())
    }
}
