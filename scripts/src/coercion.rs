//! Coercion of raw CLI tokens into typed contract call arguments

use std::str::FromStr;

use admin_common::{
    constants::{FALSE_TOKEN, INTEGER_BITS, NUM_HEX_CHARS_ADDRESS, TRUE_TOKEN},
    types::{Arity, BoolMode, ParamType, SettingDescriptor},
};
use alloy::{
    dyn_abi::{DynSolType, DynSolValue},
    json_abi::Function,
    primitives::{Address, FixedBytes, U256},
};

use crate::errors::ScriptError;

/// The typed values coerced from a list of tokens
#[derive(Clone, Debug, PartialEq)]
pub struct CoercedArgs {
    /// Values of the fixed parameters, in token order
    pub fixed: Vec<DynSolValue>,
    /// Values of the repeated trailing parameter, if the descriptor is variadic
    pub variadic: Vec<DynSolValue>,
    /// Whether the values came from a variadic descriptor
    arity: Arity,
    /// Where each variadic value is inserted among the fixed values
    variadic_position: usize,
}

impl CoercedArgs {
    /// The argument lists of the calls these values expand into
    ///
    /// A fixed descriptor yields a single call. A variadic descriptor yields one
    /// call per variadic value, which may be none at all.
    pub fn calls(&self) -> Vec<Vec<DynSolValue>> {
        match self.arity {
            Arity::Fixed => vec![self.fixed.clone()],
            Arity::Variadic => {
                let position = self.variadic_position.min(self.fixed.len());
                self.variadic
                    .iter()
                    .map(|value| {
                        let mut args = self.fixed.clone();
                        args.insert(position, value.clone());
                        args
                    })
                    .collect()
            }
        }
    }
}

/// Coerce tokens according to a setting descriptor
///
/// The token count is checked first, so an arity error is reported even when
/// some of the tokens are also malformed.
pub fn coerce(
    descriptor: &SettingDescriptor,
    tokens: &[String],
) -> Result<CoercedArgs, ScriptError> {
    if !descriptor.accepts_count(tokens.len()) {
        return Err(ScriptError::Arity {
            setting: descriptor.name.to_string(),
            expected: descriptor.expected_count(),
            got: tokens.len(),
        });
    }

    let fixed_params = descriptor.fixed_params();
    let (fixed_tokens, rest) = tokens.split_at(fixed_params.len());

    let fixed = fixed_params
        .iter()
        .zip(fixed_tokens)
        .enumerate()
        .map(|(i, (param, token))| coerce_token(descriptor, i, *param, token))
        .collect::<Result<Vec<_>, _>>()?;

    let variadic = match descriptor.variadic_param() {
        Some(param) => rest
            .iter()
            .enumerate()
            .map(|(i, token)| coerce_token(descriptor, fixed_params.len() + i, param, token))
            .collect::<Result<Vec<_>, _>>()?,
        None => Vec::new(),
    };

    Ok(CoercedArgs {
        fixed,
        variadic,
        arity: descriptor.arity,
        variadic_position: descriptor.variadic_position,
    })
}

/// Coerce a single token into a value of the given parameter type
pub fn coerce_token(
    descriptor: &SettingDescriptor,
    index: usize,
    param: ParamType,
    token: &str,
) -> Result<DynSolValue, ScriptError> {
    let err = |expected: String| ScriptError::Coercion {
        setting: descriptor.name.to_string(),
        index,
        token: token.to_string(),
        expected,
    };

    match param {
        ParamType::Bool => parse_bool(token, descriptor.bool_mode)
            .map(DynSolValue::Bool)
            .ok_or_else(|| err(descriptor.bool_mode.to_string())),
        ParamType::Integer => parse_integer(token)
            .map(|n| DynSolValue::Uint(n, INTEGER_BITS))
            .ok_or_else(|| err(format!("a base-10 integer of at most {INTEGER_BITS} bits"))),
        ParamType::Address => parse_address(token)
            .map(DynSolValue::Address)
            .ok_or_else(|| err("a 20-byte hex address with a valid checksum".to_string())),
        ParamType::String => Ok(DynSolValue::String(token.to_string())),
    }
}

/// Coerce tokens against a method's declared inputs
///
/// Used for ad hoc queries, where no descriptor is registered. Booleans are
/// parsed literally and unsigned integers must fit the declared width.
pub fn coerce_inputs(
    context: &str,
    function: &Function,
    tokens: &[String],
) -> Result<Vec<DynSolValue>, ScriptError> {
    if function.inputs.len() != tokens.len() {
        return Err(ScriptError::Arity {
            setting: context.to_string(),
            expected: format!("exactly {}", function.inputs.len()),
            got: tokens.len(),
        });
    }

    function
        .inputs
        .iter()
        .zip(tokens)
        .enumerate()
        .map(|(index, (input, token))| {
            let err = |expected: String| ScriptError::Coercion {
                setting: context.to_string(),
                index,
                token: token.clone(),
                expected,
            };
            let ty = DynSolType::parse(&input.selector_type())
                .map_err(|e| err(format!("a supported type ({e})")))?;

            coerce_typed(&ty, token).ok_or_else(|| err(ty.sol_type_name().into_owned()))
        })
        .collect()
}

/// Parse a token as a value of a concrete ABI type
fn coerce_typed(ty: &DynSolType, token: &str) -> Option<DynSolValue> {
    match ty {
        DynSolType::Bool => parse_bool(token, BoolMode::Literal).map(DynSolValue::Bool),
        DynSolType::Uint(bits) => parse_integer(token)
            .filter(|n| n.bit_len() <= *bits)
            .map(|n| DynSolValue::Uint(n, *bits)),
        DynSolType::Address => parse_address(token).map(DynSolValue::Address),
        DynSolType::String => Some(DynSolValue::String(token.to_string())),
        DynSolType::FixedBytes(len) => {
            let bytes = parse_hex(token).filter(|b| b.len() == *len)?;
            let mut word = [0u8; 32];
            word[..*len].copy_from_slice(&bytes);
            Some(DynSolValue::FixedBytes(FixedBytes::from(word), *len))
        }
        DynSolType::Bytes => parse_hex(token).map(DynSolValue::Bytes),
        _ => None,
    }
}

/// Parse a boolean token in the given mode
fn parse_bool(token: &str, mode: BoolMode) -> Option<bool> {
    match mode {
        BoolMode::Literal => match token {
            TRUE_TOKEN => Some(true),
            FALSE_TOKEN => Some(false),
            _ => None,
        },
        BoolMode::IntegerTruthiness => parse_integer(token).map(|n| !n.is_zero()),
    }
}

/// Parse a non-empty run of ASCII digits as a 256-bit unsigned integer
fn parse_integer(token: &str) -> Option<U256> {
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    U256::from_str_radix(token, 10).ok()
}

/// Parse an address, requiring a valid EIP-55 checksum on mixed-case input
fn parse_address(token: &str) -> Option<Address> {
    let digits = token.strip_prefix("0x").unwrap_or(token);
    if digits.len() != NUM_HEX_CHARS_ADDRESS || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }

    let has_lower = digits.bytes().any(|b| b.is_ascii_lowercase());
    let has_upper = digits.bytes().any(|b| b.is_ascii_uppercase());
    if has_lower && has_upper {
        Address::parse_checksummed(format!("0x{digits}"), None).ok()
    } else {
        Address::from_str(digits).ok()
    }
}

/// Parse an optionally `0x`-prefixed hex string
fn parse_hex(token: &str) -> Option<Vec<u8>> {
    hex::decode(token.strip_prefix("0x").unwrap_or(token)).ok()
}
