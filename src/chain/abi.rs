//! Minimal ABI encoding for fixed-selector view calls.

use crate::auth::keccak256;
use crate::error::{Error, Result};
use num_bigint::BigUint;

/// ERC-721 `balanceOf`.
pub const BALANCE_OF: &str = "balanceOf(address)";

/// ERC-1155 `balanceOf`.
pub const BALANCE_OF_ID: &str = "balanceOf(address,uint256)";

/// An ABI word.
pub type Word = [u8; 32];

/// First four bytes of the keccak hash of a function signature.
#[must_use]
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

/// A view-function call: selector plus static 32-byte arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewCall {
    signature: &'static str,
    selector: [u8; 4],
    args: Vec<Word>,
}

impl ViewCall {
    /// Start a call to the function with the given canonical signature.
    #[must_use]
    pub fn new(signature: &'static str) -> Self {
        Self {
            signature,
            selector: selector(signature),
            args: Vec::new(),
        }
    }

    /// Append a static argument.
    #[must_use]
    pub fn arg(mut self, word: Word) -> Self {
        self.args.push(word);
        self
    }

    /// Canonical function signature, e.g. `balanceOf(address)`.
    #[must_use]
    pub fn signature(&self) -> &'static str {
        self.signature
    }

    /// `0x`-prefixed calldata: selector followed by the argument words.
    #[must_use]
    pub fn calldata(&self) -> String {
        let mut data = String::with_capacity(2 + 8 + self.args.len() * 64);
        data.push_str("0x");
        data.push_str(&hex::encode(self.selector));
        for word in &self.args {
            data.push_str(&hex::encode(word));
        }
        data
    }
}

/// Encode an unsigned integer as a left-padded 32-byte word.
///
/// # Errors
///
/// Returns [`Error::BadRequest`] if the value does not fit in 256 bits.
pub fn uint_word(value: &BigUint) -> Result<Word> {
    let bytes = value.to_bytes_be();
    if bytes.len() > 32 {
        return Err(Error::BadRequest(format!(
            "value {value} does not fit in uint256"
        )));
    }
    let mut word = [0u8; 32];
    word[32 - bytes.len()..].copy_from_slice(&bytes);
    Ok(word)
}

/// Parse a hex `eth_call` return value as an unsigned integer.
///
/// # Errors
///
/// Returns an RPC upstream error for an empty (`0x`) or non-hex result.
pub fn parse_uint(result: &str) -> Result<BigUint> {
    let digits = result.strip_prefix("0x").unwrap_or(result);
    if digits.is_empty() {
        return Err(Error::rpc("empty call result (no contract code at address?)"));
    }
    BigUint::parse_bytes(digits.as_bytes(), 16)
        .ok_or_else(|| Error::rpc(format!("call result is not hex: {result}")))
}

/// Parse a token id given as decimal or `0x` hex.
///
/// # Errors
///
/// Returns [`Error::BadRequest`] if the text is not a number.
pub fn parse_token_id(text: &str) -> Result<BigUint> {
    let text = text.trim();
    let parsed = match text.strip_prefix("0x") {
        Some(digits) => BigUint::parse_bytes(digits.as_bytes(), 16),
        None => BigUint::parse_bytes(text.as_bytes(), 10),
    };
    parsed.ok_or_else(|| Error::BadRequest(format!("invalid token id: {text}")))
}
