//! Constants shared between the dispatcher and its pure helpers

/// The number of bytes in a compressed BLS12-381 public key
pub const NUM_BYTES_BLS_PUBKEY: usize = 48;

/// The number of bytes in a set of withdrawal credentials
pub const NUM_BYTES_WITHDRAWAL_CREDENTIALS: usize = 32;

/// The prefix byte marking withdrawal credentials derived from a BLS key
pub const BLS_WITHDRAWAL_PREFIX: u8 = 0x00;

/// The number of bytes in an Ethereum address
pub const NUM_BYTES_ADDRESS: usize = 20;

/// The number of hex characters in an Ethereum address, excluding the `0x` prefix
pub const NUM_HEX_CHARS_ADDRESS: usize = NUM_BYTES_ADDRESS * 2;

/// The bit width used for integers coerced from CLI input
pub const INTEGER_BITS: usize = 256;

/// The literal token accepted for `true` in literal boolean mode
pub const TRUE_TOKEN: &str = "true";

/// The literal token accepted for `false` in literal boolean mode
pub const FALSE_TOKEN: &str = "false";
