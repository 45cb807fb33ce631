//! Credential proof for the access gate.
//!
//! A request proves which address it speaks for in one of two ways:
//!
//! ```text
//! Unverified(address)                    caller's word only, opt-in
//! Verified { address, message, sig }     personal_sign recovers to address
//! ```
//!
//! Both resolve to an [`Address`], so the ownership check downstream does
//! not care which variant supplied it.

mod nonce;
mod signature;

pub use nonce::{IssuedNonce, NonceStore, NONCE_PREFIX};
pub use signature::{
    address_of, address_of_secret, decode_signature, keccak256, personal_sign_hash,
    recover_signer, sign_message, verify_signer, PERSONAL_SIGN_PREFIX, SIGNATURE_SIZE,
};

use crate::address::Address;
use crate::error::{Error, Result};
use tracing::debug;

/// How the caller backs its address claim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
    /// Address supplied without proof of control.
    Unverified(Address),
    /// Address backed by a personal-sign signature over `message`.
    Verified {
        /// Claimed signer.
        address: Address,
        /// Plaintext message that was signed.
        message: String,
        /// Hex `r || s || v` signature.
        signature: String,
    },
}

impl Credential {
    /// The claimed address.
    #[must_use]
    pub fn address(&self) -> &Address {
        match self {
            Self::Unverified(address) | Self::Verified { address, .. } => address,
        }
    }

    /// Whether this credential carries a signature.
    #[must_use]
    pub fn is_verified(&self) -> bool {
        matches!(self, Self::Verified { .. })
    }

    /// Check the credential against the gate's policy and return the
    /// address it proves.
    ///
    /// Unsigned credentials pass only when `allow_unsigned` is set. Signed
    /// credentials must recover to the claimed address, and when `nonces`
    /// is given the signed message must embed a live nonce, which is
    /// consumed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Authentication`] when the proof is missing, does not
    /// check out, or carries no usable nonce.
    pub fn authenticate(&self, allow_unsigned: bool, nonces: Option<&NonceStore>) -> Result<Address> {
        match self {
            Self::Unverified(address) => {
                if allow_unsigned {
                    debug!("Accepting unsigned claim for {address}");
                    Ok(*address)
                } else {
                    Err(Error::Authentication("signature required".to_string()))
                }
            }
            Self::Verified {
                address,
                message,
                signature,
            } => {
                verify_signer(message, signature, address)?;
                if let Some(store) = nonces {
                    if !store.consume_from(message) {
                        return Err(Error::Authentication(
                            "nonce missing, expired or already used".to_string(),
                        ));
                    }
                }
                Ok(*address)
            }
        }
    }
}
