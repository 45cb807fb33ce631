//! `personal_sign` signature recovery for wallet authentication.
//!
//! Wallets sign `keccak256("\x19Ethereum Signed Message:\n" + len + message)`
//! with secp256k1. Recovering the public key from the 65-byte `r || s || v`
//! signature and hashing it yields the signer's address.

use crate::address::{Address, ADDRESS_LEN};
use crate::error::{Error, Result};
use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::{Message, PublicKey, Secp256k1, SecretKey};
use sha3::{Digest, Keccak256};
use tracing::debug;

/// Prefix wallets prepend before hashing a personal message.
pub const PERSONAL_SIGN_PREFIX: &str = "\x19Ethereum Signed Message:\n";

/// Signature size in bytes (`r || s || v`).
pub const SIGNATURE_SIZE: usize = 65;

/// Keccak-256 digest.
#[must_use]
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    Keccak256::digest(data).into()
}

/// Digest a wallet signs for `message` under the personal-sign convention.
#[must_use]
pub fn personal_sign_hash(message: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(PERSONAL_SIGN_PREFIX.as_bytes());
    hasher.update(message.len().to_string().as_bytes());
    hasher.update(message);
    hasher.finalize().into()
}

/// Address controlled by a secp256k1 public key.
#[must_use]
pub fn address_of(public_key: &PublicKey) -> Address {
    let uncompressed = public_key.serialize_uncompressed();
    let hash = keccak256(&uncompressed[1..]);
    let mut bytes = [0u8; ADDRESS_LEN];
    bytes.copy_from_slice(&hash[32 - ADDRESS_LEN..]);
    Address::from_bytes(bytes)
}

/// Decode a hex `r || s || v` signature (`0x` optional).
///
/// `v` may be given as 0/1 or 27/28.
///
/// # Errors
///
/// Returns [`Error::Authentication`] if the hex is invalid, the length is
/// not 65 bytes, or `v` is out of range.
pub fn decode_signature(signature: &str) -> Result<RecoverableSignature> {
    let digits = signature.strip_prefix("0x").unwrap_or(signature);
    let bytes = hex::decode(digits)
        .map_err(|e| Error::Authentication(format!("Invalid signature encoding: {e}")))?;

    if bytes.len() != SIGNATURE_SIZE {
        return Err(Error::Authentication(format!(
            "Invalid signature size: expected {SIGNATURE_SIZE}, got {}",
            bytes.len()
        )));
    }

    let recovery = match bytes[64] {
        0 | 27 => 0,
        1 | 28 => 1,
        v => {
            return Err(Error::Authentication(format!(
                "Invalid signature recovery id: {v}"
            )))
        }
    };
    let recovery_id = RecoveryId::from_i32(recovery)
        .map_err(|e| Error::Authentication(format!("Invalid signature recovery id: {e}")))?;

    RecoverableSignature::from_compact(&bytes[..64], recovery_id)
        .map_err(|e| Error::Authentication(format!("Invalid signature format: {e}")))
}

/// Recover the address that personal-signed `message`.
///
/// # Errors
///
/// Returns [`Error::Authentication`] if the signature is malformed or no
/// public key can be recovered from it.
pub fn recover_signer(message: &str, signature: &str) -> Result<Address> {
    let sig = decode_signature(signature)?;
    let digest = Message::from_digest(personal_sign_hash(message.as_bytes()));

    let secp = Secp256k1::verification_only();
    let public_key = secp
        .recover_ecdsa(&digest, &sig)
        .map_err(|e| Error::Authentication(format!("Signature recovery failed: {e}")))?;

    Ok(address_of(&public_key))
}

/// Check that `signature` over `message` recovers to `claimed`.
///
/// # Errors
///
/// Returns [`Error::Authentication`] on a malformed signature or when the
/// recovered signer differs from `claimed`.
pub fn verify_signer(message: &str, signature: &str, claimed: &Address) -> Result<()> {
    let signer = recover_signer(message, signature)?;
    if &signer == claimed {
        debug!("Signature verified for {claimed}");
        Ok(())
    } else {
        debug!("Signature recovered {signer}, claimed {claimed}");
        Err(Error::Authentication(
            "signature does not match address".to_string(),
        ))
    }
}

/// Personal-sign `message` and return the `0x`-prefixed 65-byte signature
/// with `v` in 27/28 form, as wallets produce it.
#[must_use]
pub fn sign_message(secret_key: &SecretKey, message: &str) -> String {
    let secp = Secp256k1::signing_only();
    let digest = Message::from_digest(personal_sign_hash(message.as_bytes()));
    let (recovery_id, compact) = secp
        .sign_ecdsa_recoverable(&digest, secret_key)
        .serialize_compact();

    let mut bytes = [0u8; SIGNATURE_SIZE];
    bytes[..64].copy_from_slice(&compact);
    bytes[64] = if recovery_id.to_i32() == 0 { 27 } else { 28 };
    format!("0x{}", hex::encode(bytes))
}

/// Address of a secret key.
#[must_use]
pub fn address_of_secret(secret_key: &SecretKey) -> Address {
    let secp = Secp256k1::signing_only();
    address_of(&PublicKey::from_secret_key(&secp, secret_key))
}
