//! Derivation of validator withdrawal credentials from a BLS public key
//!
//! The credentials are `0x00 || sha256(pubkey)[1..32]`: the prefix byte
//! replaces the first byte of the hash.

use std::fmt::{self, Display, Formatter};

use alloy_primitives::B256;
use sha2::{Digest, Sha256};

use crate::constants::{
    BLS_WITHDRAWAL_PREFIX, NUM_BYTES_BLS_PUBKEY, NUM_BYTES_WITHDRAWAL_CREDENTIALS,
};

/// A compressed BLS12-381 public key
pub type BlsPublicKey = [u8; NUM_BYTES_BLS_PUBKEY];

/// Errors parsing a public key from operator input
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CredentialsError {
    /// The input was not valid hex
    InvalidHex(String),
    /// The decoded key had the wrong length
    InvalidLength(usize),
}

impl Display for CredentialsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            CredentialsError::InvalidHex(s) => write!(f, "invalid public key hex: {}", s),
            CredentialsError::InvalidLength(n) => write!(
                f,
                "invalid public key length: expected {} bytes, got {}",
                NUM_BYTES_BLS_PUBKEY, n
            ),
        }
    }
}

impl std::error::Error for CredentialsError {}

/// Withdrawal credentials derived from a BLS public key
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WithdrawalCredentials([u8; NUM_BYTES_WITHDRAWAL_CREDENTIALS]);

impl WithdrawalCredentials {
    /// The raw credential bytes
    pub fn as_bytes(&self) -> &[u8; NUM_BYTES_WITHDRAWAL_CREDENTIALS] {
        &self.0
    }
}

impl From<WithdrawalCredentials> for B256 {
    fn from(credentials: WithdrawalCredentials) -> Self {
        B256::from(credentials.0)
    }
}

impl Display for WithdrawalCredentials {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

/// Derive the withdrawal credentials for the given public key
pub fn derive_withdrawal_credentials(pubkey: &BlsPublicKey) -> WithdrawalCredentials {
    let hash = Sha256::digest(pubkey);

    let mut credentials = [0u8; NUM_BYTES_WITHDRAWAL_CREDENTIALS];
    credentials.copy_from_slice(&hash);
    credentials[0] = BLS_WITHDRAWAL_PREFIX;

    WithdrawalCredentials(credentials)
}

/// Parse a hex-encoded public key, with or without a `0x` prefix
pub fn parse_bls_pubkey(s: &str) -> Result<BlsPublicKey, CredentialsError> {
    let stripped = s.strip_prefix("0x").unwrap_or(s);
    let bytes = hex::decode(stripped).map_err(|e| CredentialsError::InvalidHex(e.to_string()))?;

    BlsPublicKey::try_from(bytes.as_slice())
        .map_err(|_| CredentialsError::InvalidLength(bytes.len()))
}
