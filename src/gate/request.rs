//! Request body parsing.

use crate::address::Address;
use crate::auth::{recover_signer, Credential};
use crate::chain::abi::parse_token_id;
use crate::error::{Error, Result};
use num_bigint::BigUint;
use serde::Deserialize;
use serde_json::Value;

/// JSON body of a gated request.
///
/// Every field is optional at the JSON level; [`AccessRequest::credential`]
/// decides which combinations make sense.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessRequest {
    /// Claimed wallet address.
    #[serde(default)]
    pub address: Option<String>,
    /// Signed plaintext.
    #[serde(default)]
    pub message: Option<String>,
    /// Hex `r || s || v` signature over `message`.
    #[serde(default)]
    pub signature: Option<String>,
    /// Token id, as a JSON integer or a decimal / `0x` string.
    #[serde(default)]
    pub token_id: Option<Value>,
}

impl AccessRequest {
    /// Parse a request body.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedBody`] if the body is not a JSON object of
    /// the expected shape.
    pub fn from_body(body: &[u8]) -> Result<Self> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Err(Error::MalformedBody("empty body".to_string()));
        }
        serde_json::from_slice(body).map_err(|e| Error::MalformedBody(e.to_string()))
    }

    /// Build the credential this request presents.
    ///
    /// The address is validated before anything else. Without an address,
    /// a message/signature pair stands for whoever signed it.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidAddress`] for a malformed address
    /// - [`Error::BadRequest`] when only one of message/signature is given,
    ///   or neither an address nor a signature is
    /// - [`Error::Authentication`] when the signer cannot be recovered
    pub fn credential(&self) -> Result<Credential> {
        let address = self
            .address
            .as_deref()
            .map(|a| a.trim().parse::<Address>())
            .transpose()?;

        let proof = match (&self.message, &self.signature) {
            (Some(message), Some(signature)) => Some((message.clone(), signature.clone())),
            (None, None) => None,
            _ => {
                return Err(Error::BadRequest(
                    "message and signature must be given together".to_string(),
                ))
            }
        };

        match (address, proof) {
            (Some(address), Some((message, signature))) => Ok(Credential::Verified {
                address,
                message,
                signature,
            }),
            (Some(address), None) => Ok(Credential::Unverified(address)),
            (None, Some((message, signature))) => {
                let address = recover_signer(&message, &signature)?;
                Ok(Credential::Verified {
                    address,
                    message,
                    signature,
                })
            }
            (None, None) => Err(Error::BadRequest(
                "address or signed message required".to_string(),
            )),
        }
    }

    /// The requested token id, if any.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BadRequest`] if the value is not a non-negative
    /// integer that fits in a uint256.
    pub fn token_id(&self) -> Result<Option<BigUint>> {
        match &self.token_id {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(n)) => n
                .as_u64()
                .map(|v| Some(BigUint::from(v)))
                .ok_or_else(|| Error::BadRequest(format!("invalid tokenId: {n}"))),
            Some(Value::String(s)) => parse_token_id(s).map(Some),
            Some(other) => Err(Error::BadRequest(format!("invalid tokenId: {other}"))),
        }
    }
}

/// Whether a raw query string asks for a nonce (`nonce=1` or `nonce=true`).
#[must_use]
pub fn wants_nonce(query: Option<&str>) -> bool {
    query.is_some_and(|q| {
        q.split('&')
            .filter_map(|pair| pair.split_once('='))
            .any(|(key, value)| key == "nonce" && matches!(value, "1" | "true"))
    })
}
