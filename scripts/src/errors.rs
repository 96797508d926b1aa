//! Definitions of errors that can occur during the execution of the contract administration scripts

use std::{
    error::Error,
    fmt::{self, Display, Formatter},
};

use admin_common::credentials::CredentialsError;
use alloy::primitives::TxHash;

/// Errors that can occur during the execution of the contract administration scripts
#[derive(Clone, Debug)]
pub enum ScriptError {
    /// The command was invoked with the wrong shape of arguments
    Usage(String),
    /// A token could not be coerced into its declared type
    Coercion {
        /// The setting or command whose descriptor rejected the token
        setting: String,
        /// The position of the token
        index: usize,
        /// The offending token
        token: String,
        /// What was expected instead
        expected: String,
    },
    /// The number of tokens does not satisfy the descriptor
    Arity {
        /// The setting or command whose descriptor rejected the tokens
        setting: String,
        /// A description of the accepted count
        expected: String,
        /// The number of tokens given
        got: usize,
    },
    /// No setting with the given name is registered
    UnknownSetting(String),
    /// Call arguments do not match the declared method inputs
    ArgumentMismatch {
        /// The contract being called
        contract: String,
        /// The method being called
        method: String,
        /// What did not match
        reason: String,
    },
    /// The contract has no deployment on the given network
    UnknownNetwork {
        /// The contract being resolved
        contract: String,
        /// The network identity it was resolved for
        network: u64,
    },
    /// The contract's interface has no method with the given name
    UnknownMethod {
        /// The contract being called
        contract: String,
        /// The missing method
        method: String,
    },
    /// Error reading a contract build artifact
    ReadArtifact(String),
    /// Error parsing a contract build artifact
    ArtifactParsing(String),
    /// Error constructing calldata or decoding return data
    CalldataConstruction(String),
    /// A call was rejected by the contract
    ContractRevert(String),
    /// A transaction was included but did not succeed
    TransactionFailed {
        /// The hash of the failed transaction
        tx_hash: TxHash,
        /// The reason reported by the chain
        reason: String,
    },
    /// A transaction succeeded but did not emit an expected event field
    MissingEvent {
        /// The expected event
        event: String,
        /// The expected field of the event
        field: String,
    },
    /// Error initializing the RPC client
    ClientInitialization(String),
    /// Transport or timeout error talking to the RPC endpoint
    Submission(String),
}

impl ScriptError {
    /// The process exit code for this error
    ///
    /// - 2: usage or input error, caught before any network access
    /// - 3: contract metadata could not be resolved
    /// - 4: the chain rejected a call or transaction
    /// - 5: the RPC endpoint could not be reached or did not answer in time
    pub fn exit_code(&self) -> u8 {
        match self {
            ScriptError::Usage(_)
            | ScriptError::Coercion { .. }
            | ScriptError::Arity { .. }
            | ScriptError::UnknownSetting(_)
            | ScriptError::ArgumentMismatch { .. } => 2,
            ScriptError::UnknownNetwork { .. }
            | ScriptError::UnknownMethod { .. }
            | ScriptError::ReadArtifact(_)
            | ScriptError::ArtifactParsing(_)
            | ScriptError::CalldataConstruction(_) => 3,
            ScriptError::ContractRevert(_)
            | ScriptError::TransactionFailed { .. }
            | ScriptError::MissingEvent { .. } => 4,
            ScriptError::ClientInitialization(_) | ScriptError::Submission(_) => 5,
        }
    }
}

impl Display for ScriptError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ScriptError::Usage(s) => write!(f, "usage error: {}", s),
            ScriptError::Coercion {
                setting,
                index,
                token,
                expected,
            } => write!(
                f,
                "invalid value '{}' for argument {} of {}: expected {}",
                token, index, setting, expected
            ),
            ScriptError::Arity {
                setting,
                expected,
                got,
            } => write!(
                f,
                "wrong number of values for {}: expected {}, got {}",
                setting, expected, got
            ),
            ScriptError::UnknownSetting(s) => write!(f, "unknown setting: {}", s),
            ScriptError::ArgumentMismatch {
                contract,
                method,
                reason,
            } => write!(
                f,
                "arguments do not match {}.{}: {}",
                contract, method, reason
            ),
            ScriptError::UnknownNetwork { contract, network } => write!(
                f,
                "{} is not deployed on network {}",
                contract, network
            ),
            ScriptError::UnknownMethod { contract, method } => {
                write!(f, "{} has no method {}", contract, method)
            }
            ScriptError::ReadArtifact(s) => write!(f, "error reading artifact: {}", s),
            ScriptError::ArtifactParsing(s) => write!(f, "error parsing artifact: {}", s),
            ScriptError::CalldataConstruction(s) => write!(f, "error constructing calldata: {}", s),
            ScriptError::ContractRevert(s) => write!(f, "call reverted: {}", s),
            ScriptError::TransactionFailed { tx_hash, reason } => {
                write!(f, "transaction {:#x} failed: {}", tx_hash, reason)
            }
            ScriptError::MissingEvent { event, field } => write!(
                f,
                "transaction did not emit {} with field {}",
                event, field
            ),
            ScriptError::ClientInitialization(s) => write!(f, "error initializing client: {}", s),
            ScriptError::Submission(s) => write!(f, "error submitting to network: {}", s),
        }
    }
}

impl Error for ScriptError {}

impl From<CredentialsError> for ScriptError {
    fn from(e: CredentialsError) -> Self {
        ScriptError::Usage(e.to_string())
    }
}
