//! Constants used in the administration scripts

/// The default RPC endpoint, a local development node
pub const DEFAULT_RPC_URL: &str = "http://localhost:8545";

/// The default directory containing the contract build artifacts
pub const DEFAULT_ARTIFACTS_DIR: &str = "build/contracts";

/// The extension of a contract build artifact
pub const ARTIFACT_EXTENSION: &str = "json";

/// The gas ceiling applied to every transaction.
///
/// Gas is never estimated; unused gas is refunded, so this only bounds the
/// worst-case cost of a call.
pub const DEFAULT_GAS_LIMIT: u64 = 8_000_000;

/// The number of seconds to wait for a transaction to be included
pub const DEFAULT_RECEIPT_TIMEOUT_SECS: u64 = 120;

/// The number of milliseconds between receipt polls
pub const RECEIPT_POLL_INTERVAL_MS: u64 = 1_000;

/// The name of the environment variable holding the RPC URL
pub const RPC_URL_ENV_VAR: &str = "RPC_URL";

/// The name of the environment variable holding the signer's private key
pub const PRIV_KEY_ENV_VAR: &str = "PKEY";

/// The name of the environment variable pointing at the artifacts directory
pub const ARTIFACTS_DIR_ENV_VAR: &str = "ARTIFACTS_DIR";

// ----------------------
// | Methods and events |
// ----------------------

/// The group settings getter for the group registration fee
pub const GET_NEW_GROUP_FEE_METHOD: &str = "getNewFee";

/// The group API method registering a new group
pub const ADD_GROUP_METHOD: &str = "add";

/// The event emitted when a group is registered
pub const GROUP_ADD_EVENT: &str = "GroupAdd";

/// The field of [`GROUP_ADD_EVENT`] holding the group contract address
pub const GROUP_ADD_ID_FIELD: &str = "ID";

/// The group API method creating a group's default accessor
pub const CREATE_DEFAULT_ACCESSOR_METHOD: &str = "createDefaultAccessor";

/// The event emitted when a default accessor is created
pub const GROUP_ACCESSOR_EVENT: &str = "GroupCreateDefaultAccessor";

/// The field of [`GROUP_ACCESSOR_EVENT`] holding the accessor address
pub const GROUP_ACCESSOR_ADDRESS_FIELD: &str = "accessorAddress";

/// The group contract method authorising a depositor
pub const ADD_DEPOSITOR_METHOD: &str = "addDepositor";

/// The group contract method authorising a withdrawer
pub const ADD_WITHDRAWER_METHOD: &str = "addWithdrawer";

/// The token method minting to an address
pub const MINT_METHOD: &str = "mint";

/// The admin method marking a node operator trusted
pub const SET_NODE_TRUSTED_METHOD: &str = "setNodeTrusted";

/// The node settings method publishing withdrawal credentials
pub const SET_WITHDRAWAL_CREDENTIALS_METHOD: &str = "setWithdrawalCredentials";

/// The accessor method accepting a user deposit
pub const DEPOSIT_METHOD: &str = "deposit";
