//! Implementations of the administration commands
//!
//! Each command coerces its tokens, drives the dispatcher and returns the
//! report to print.

use admin_common::{
    credentials::{derive_withdrawal_credentials, parse_bls_pubkey},
    types::{
        ContractName,
        ParamType::{Address, Bool, Integer, String as Text},
        SettingDescriptor,
    },
};
use alloy::{
    dyn_abi::DynSolValue,
    primitives::{FixedBytes, U256},
};
use itertools::Itertools;
use tracing::info;

use crate::{
    client::ChainClient,
    coercion::{coerce, coerce_inputs},
    constants::{
        ADD_DEPOSITOR_METHOD, ADD_GROUP_METHOD, ADD_WITHDRAWER_METHOD,
        CREATE_DEFAULT_ACCESSOR_METHOD, DEPOSIT_METHOD, GET_NEW_GROUP_FEE_METHOD,
        GROUP_ACCESSOR_ADDRESS_FIELD, GROUP_ACCESSOR_EVENT, GROUP_ADD_EVENT, GROUP_ADD_ID_FIELD,
        MINT_METHOD, SET_NODE_TRUSTED_METHOD, SET_WITHDRAWAL_CREDENTIALS_METHOD,
    },
    dispatcher::Dispatcher,
    errors::ScriptError,
    registry::{lookup, SETTINGS},
    types::{CallRequest, TransactionOutcome},
    utils::{expect_address, expect_uint, format_outcome, format_values},
};

/// `create-group NAME STAKING_FEE`
pub const CREATE_GROUP: SettingDescriptor =
    SettingDescriptor::fixed("create-group", &[Text, Integer]);

/// `mint AMOUNT ADDRESS...`, each call taking `(address, amount)`
pub const MINT: SettingDescriptor = SettingDescriptor::variadic("mint", &[Integer, Address], 0);

/// `fund AMOUNT ADDRESS...`
pub const FUND: SettingDescriptor = SettingDescriptor::variadic("fund", &[Integer, Address], 0);

/// `node-trusted TRUSTED ADDRESS...`, each call taking `(address, trusted)`
pub const NODE_TRUSTED: SettingDescriptor =
    SettingDescriptor::variadic("node-trusted", &[Bool, Address], 0);

/// `deposit ACCESSOR DURATION_ID AMOUNT`
pub const DEPOSIT: SettingDescriptor =
    SettingDescriptor::fixed("deposit", &[Address, Text, Integer]);

// ----------
// | Groups |
// ----------

/// Register a group, create its default accessor and authorise the accessor
/// to deposit and withdraw on the group's behalf
pub async fn create_group<C: ChainClient>(
    dispatcher: &Dispatcher<C>,
    tokens: &[String],
) -> Result<String, ScriptError> {
    let args = coerce(&CREATE_GROUP, tokens)?.fixed;

    let settings = dispatcher.contract(ContractName::RocketGroupSettings).await?;
    let fee = dispatcher
        .query(settings, GET_NEW_GROUP_FEE_METHOD, vec![])
        .await?;
    let fee = fee.first().map(expect_uint).transpose()?.ok_or_else(|| {
        ScriptError::CalldataConstruction(format!("{GET_NEW_GROUP_FEE_METHOD} returned nothing"))
    })?;
    info!(fee = %fee, "group registration fee");

    let api = dispatcher.contract(ContractName::RocketGroupAPI).await?;
    let added = dispatcher
        .transact(api.clone(), ADD_GROUP_METHOD, args, fee)
        .await?;
    let group = added.derived_address(GROUP_ADD_EVENT, GROUP_ADD_ID_FIELD)?;

    let created = dispatcher
        .transact(
            api,
            CREATE_DEFAULT_ACCESSOR_METHOD,
            vec![DynSolValue::Address(group)],
            U256::ZERO,
        )
        .await?;
    let accessor = created.derived_address(GROUP_ACCESSOR_EVENT, GROUP_ACCESSOR_ADDRESS_FIELD)?;

    let group_contract = dispatcher.contract_at(ContractName::RocketGroupContract, group)?;
    let mut requests = Vec::new();
    for method in [ADD_DEPOSITOR_METHOD, ADD_WITHDRAWER_METHOD] {
        let args = vec![DynSolValue::Address(accessor)];
        requests.push(
            dispatcher
                .prepare(group_contract.clone(), method, args, U256::ZERO)
                .await?,
        );
    }
    let authorised = dispatcher.transact_all(requests).await?;

    let mut report = vec![
        format!("group created at {group}"),
        format_outcome(&added),
        format!("default accessor created at {accessor}"),
        format_outcome(&created),
    ];
    report.extend(authorised.iter().map(format_outcome));
    Ok(report.join("\n"))
}

/// Deposit into a group through one of its accessors
pub async fn deposit<C: ChainClient>(
    dispatcher: &Dispatcher<C>,
    tokens: &[String],
) -> Result<String, ScriptError> {
    let args = coerce(&DEPOSIT, tokens)?.fixed;
    let accessor = expect_address(&args[0])?;
    let amount = expect_uint(&args[2])?;

    let contract = dispatcher.contract_at(ContractName::RocketGroupAccessorContract, accessor)?;
    let outcome = dispatcher
        .transact(contract, DEPOSIT_METHOD, vec![args[1].clone()], amount)
        .await?;

    Ok(format!(
        "deposited {} wei through {}\n{}",
        amount,
        accessor,
        format_outcome(&outcome)
    ))
}

// ------------
// | Accounts |
// ------------

/// Mint tokens to each of several addresses
pub async fn mint<C: ChainClient>(
    dispatcher: &Dispatcher<C>,
    tokens: &[String],
) -> Result<String, ScriptError> {
    let calls = coerce(&MINT, tokens)?.calls();
    let sent = send_each(dispatcher, ContractName::RocketPoolToken, MINT_METHOD, calls).await?;

    Ok(sent
        .iter()
        .map(|(request, outcome)| {
            format!("minted {}\n{}", format_values(request.args()), format_outcome(outcome))
        })
        .join("\n"))
}

/// Send the same amount of native currency to each of several addresses
pub async fn fund<C: ChainClient>(
    dispatcher: &Dispatcher<C>,
    tokens: &[String],
) -> Result<String, ScriptError> {
    let args = coerce(&FUND, tokens)?;
    let amount = expect_uint(&args.fixed[0])?;
    let recipients = args
        .variadic
        .iter()
        .map(expect_address)
        .collect::<Result<Vec<_>, _>>()?;

    let outcomes = dispatcher.transfer_all(&recipients, amount).await?;
    Ok(recipients
        .iter()
        .zip(&outcomes)
        .map(|(recipient, outcome)| {
            format!("funded {} with {} wei\n{}", recipient, amount, format_outcome(outcome))
        })
        .join("\n"))
}

/// Mark node operators trusted or untrusted
pub async fn node_trusted<C: ChainClient>(
    dispatcher: &Dispatcher<C>,
    tokens: &[String],
) -> Result<String, ScriptError> {
    let calls = coerce(&NODE_TRUSTED, tokens)?.calls();
    let sent =
        send_each(dispatcher, ContractName::RocketAdmin, SET_NODE_TRUSTED_METHOD, calls).await?;

    Ok(sent
        .iter()
        .map(|(request, outcome)| {
            format!("set trusted: {}\n{}", format_values(request.args()), format_outcome(outcome))
        })
        .join("\n"))
}

/// Prepare one call per argument list, then send them in order
async fn send_each<C: ChainClient>(
    dispatcher: &Dispatcher<C>,
    contract: ContractName,
    method: &str,
    calls: Vec<Vec<DynSolValue>>,
) -> Result<Vec<(CallRequest, TransactionOutcome)>, ScriptError> {
    let contract = dispatcher.contract(contract).await?;
    let mut requests = Vec::with_capacity(calls.len());
    for args in calls {
        requests.push(
            dispatcher
                .prepare(contract.clone(), method, args, U256::ZERO)
                .await?,
        );
    }

    let outcomes = dispatcher.transact_all(requests.clone()).await?;
    Ok(requests.into_iter().zip(outcomes).collect())
}

// ------------
// | Settings |
// ------------

/// Change a registered setting
pub async fn set<C: ChainClient>(
    dispatcher: &Dispatcher<C>,
    setting: &str,
    tokens: &[String],
) -> Result<String, ScriptError> {
    let entry = lookup(setting)?;
    let change = dispatcher.apply_setting(entry, tokens).await?;

    let mut report = vec![format!(
        "{} updated with {} transaction(s)",
        entry.name(),
        change.outcomes.len()
    )];
    report.extend(change.outcomes.iter().map(format_outcome));
    if let Some(current) = change.current {
        report.push(format!("{} is now {}", entry.name(), format_values(&current)));
    }
    Ok(report.join("\n"))
}

/// Read a registered setting
pub async fn get<C: ChainClient>(
    dispatcher: &Dispatcher<C>,
    setting: &str,
) -> Result<String, ScriptError> {
    let entry = lookup(setting)?;
    let current = dispatcher.read_setting(entry).await?;
    Ok(format!("{} is {}", entry.name(), format_values(&current)))
}

/// List the registered settings and the tokens they accept
pub fn list_settings() -> String {
    SETTINGS
        .iter()
        .map(|entry| {
            format!(
                "{:<36} {:<28} {}.{}",
                entry.name(),
                entry.descriptor.usage(),
                entry.contract,
                entry.setter
            )
        })
        .join("\n")
}

// ---------------------------
// | Withdrawal credentials |
// ---------------------------

/// Derive the withdrawal credentials of a validator public key
pub fn withdrawal_credentials(pubkey: &str) -> Result<String, ScriptError> {
    let pubkey = parse_bls_pubkey(pubkey)?;
    Ok(derive_withdrawal_credentials(&pubkey).to_string())
}

/// Derive withdrawal credentials and publish them to the node settings
pub async fn publish_withdrawal_credentials<C: ChainClient>(
    dispatcher: &Dispatcher<C>,
    pubkey: &str,
) -> Result<String, ScriptError> {
    let credentials = derive_withdrawal_credentials(&parse_bls_pubkey(pubkey)?);
    let word = FixedBytes::<32>::from(credentials);

    let node_settings = dispatcher.contract(ContractName::RocketNodeSettings).await?;
    let outcome = dispatcher
        .transact(
            node_settings,
            SET_WITHDRAWAL_CREDENTIALS_METHOD,
            vec![DynSolValue::FixedBytes(word, 32)],
            U256::ZERO,
        )
        .await?;

    Ok(format!(
        "published withdrawal credentials {}\n{}",
        credentials,
        format_outcome(&outcome)
    ))
}

// ---------
// | Query |
// ---------

/// Call a read-only method, coercing the tokens from its declared inputs
pub async fn query<C: ChainClient>(
    dispatcher: &Dispatcher<C>,
    contract: &str,
    method: &str,
    tokens: &[String],
) -> Result<String, ScriptError> {
    let name = ContractName::from_artifact_name(contract).ok_or_else(|| {
        ScriptError::Usage(format!(
            "unknown contract {contract}, expected one of {}",
            ContractName::ALL.iter().join(", ")
        ))
    })?;

    let abi = dispatcher.interface(name)?;
    let overloads = abi.function(method).ok_or_else(|| ScriptError::UnknownMethod {
        contract: name.to_string(),
        method: method.to_string(),
    })?;
    let function = overloads
        .iter()
        .find(|f| f.inputs.len() == tokens.len())
        .unwrap_or(&overloads[0]);
    let args = coerce_inputs(&format!("{name}.{method}"), function, tokens)?;

    let contract = dispatcher.contract(name).await?;
    let values = dispatcher.query(contract, method, args).await?;
    Ok(format_values(&values))
}
