//! The static registry of network settings the scripts can change

use admin_common::types::{
    BoolMode, ContractName, ParamType,
    ParamType::{Address, Bool, Integer},
    SettingDescriptor,
};

use crate::errors::ScriptError;

/// A setting: how its tokens are coerced and which contract methods change
/// and read it
#[derive(Clone, Copy, Debug)]
pub struct SettingEntry {
    /// The setting's type signature; its name is the registry key
    pub descriptor: SettingDescriptor,
    /// The contract holding the setting
    pub contract: ContractName,
    /// The method changing the setting
    pub setter: &'static str,
    /// The method reading the setting back, if it has one
    pub getter: Option<&'static str>,
}

impl SettingEntry {
    /// The registry key of the setting
    pub fn name(&self) -> &'static str {
        self.descriptor.name
    }
}

/// Shorthand for a fixed-arity setting
const fn entry(
    name: &'static str,
    params: &'static [ParamType],
    contract: ContractName,
    setter: &'static str,
    getter: Option<&'static str>,
) -> SettingEntry {
    SettingEntry {
        descriptor: SettingDescriptor::fixed(name, params),
        contract,
        setter,
        getter,
    }
}

/// Every registered setting
pub static SETTINGS: &[SettingEntry] = &[
    // Deposits
    entry(
        "deposit-allowed",
        &[Bool],
        ContractName::RocketDepositSettings,
        "setDepositAllowed",
        Some("getDepositAllowed"),
    ),
    entry(
        "deposit-chunk-size",
        &[Integer],
        ContractName::RocketDepositSettings,
        "setDepositChunkSize",
        Some("getDepositChunkSize"),
    ),
    entry(
        "minimum-deposit",
        &[Integer],
        ContractName::RocketDepositSettings,
        "setMinimumDepositAmount",
        Some("getMinimumDepositAmount"),
    ),
    entry(
        "maximum-deposit",
        &[Integer],
        ContractName::RocketDepositSettings,
        "setMaximumDepositAmount",
        Some("getMaximumDepositAmount"),
    ),
    entry(
        "withdrawal-allowed",
        &[Bool],
        ContractName::RocketDepositSettings,
        "setWithdrawalAllowed",
        Some("getWithdrawalAllowed"),
    ),
    entry(
        "refund-deposit-allowed",
        &[Bool],
        ContractName::RocketDepositSettings,
        "setRefundDepositAllowed",
        Some("getRefundDepositAllowed"),
    ),
    // Minipools
    SettingEntry {
        descriptor: SettingDescriptor::fixed("minipool-new-enabled", &[Bool])
            .with_bool_mode(BoolMode::IntegerTruthiness),
        contract: ContractName::RocketMinipoolSettings,
        setter: "setMinipoolNewEnabled",
        getter: Some("getMinipoolNewEnabled"),
    },
    SettingEntry {
        descriptor: SettingDescriptor::fixed("minipool-closing-enabled", &[Bool])
            .with_bool_mode(BoolMode::IntegerTruthiness),
        contract: ContractName::RocketMinipoolSettings,
        setter: "setMinipoolClosingEnabled",
        getter: Some("getMinipoolClosingEnabled"),
    },
    entry(
        "minipool-withdrawal-fee-address",
        &[Address],
        ContractName::RocketMinipoolSettings,
        "setMinipoolWithdrawalFeeDepositAddress",
        Some("getMinipoolWithdrawalFeeDepositAddress"),
    ),
    entry(
        "minipool-staking-duration",
        &[ParamType::String, Integer],
        ContractName::RocketMinipoolSettings,
        "setMinipoolStakingDuration",
        None,
    ),
    // One call per duration, each taking `(duration, enabled)`
    SettingEntry {
        descriptor: SettingDescriptor::variadic(
            "minipool-staking-duration-enabled",
            &[Bool, ParamType::String],
            0,
        ),
        contract: ContractName::RocketMinipoolSettings,
        setter: "setMinipoolStakingDurationEnabled",
        getter: None,
    },
    // Nodes
    entry(
        "node-new-allowed",
        &[Bool],
        ContractName::RocketNodeSettings,
        "setNewAllowed",
        Some("getNewAllowed"),
    ),
    entry(
        "node-ether-min",
        &[Integer],
        ContractName::RocketNodeSettings,
        "setEtherMin",
        Some("getEtherMin"),
    ),
    entry(
        "node-inactive-automatic",
        &[Bool],
        ContractName::RocketNodeSettings,
        "setInactiveAutomatic",
        Some("getInactiveAutomatic"),
    ),
    // Groups
    entry(
        "group-default-fee",
        &[Integer],
        ContractName::RocketGroupSettings,
        "setDefaultFee",
        Some("getDefaultFee"),
    ),
    entry(
        "group-max-fee",
        &[Integer],
        ContractName::RocketGroupSettings,
        "setMaxFee",
        Some("getMaxFee"),
    ),
    entry(
        "group-new-fee",
        &[Integer],
        ContractName::RocketGroupSettings,
        "setNewFee",
        Some("getNewFee"),
    ),
    entry(
        "group-new-fee-address",
        &[Address],
        ContractName::RocketGroupSettings,
        "setNewFeeAddress",
        Some("getNewFeeAddress"),
    ),
];

/// Look up a setting by name
pub fn lookup(name: &str) -> Result<&'static SettingEntry, ScriptError> {
    SETTINGS
        .iter()
        .find(|entry| entry.name() == name)
        .ok_or_else(|| ScriptError::UnknownSetting(name.to_string()))
}
