//! personal_sign helper for tokengate requests.
//!
//! Signs a message with a secp256k1 key and prints a request body the gate
//! accepts:
//!
//! ```text
//! tokengate-sign --key 0xac09...ff80 --message "View docs" --nonce tg-3f...
//! {"address":"0xf39f...","message":"View docs\nNonce: tg-3f...","signature":"0x..."}
//! ```
//!
//! Without `--key` a fresh key is generated and included in the output.

use clap::Parser;
use color_eyre::eyre::{eyre, WrapErr};
use rand::RngCore;
use secp256k1::SecretKey;
use serde_json::json;
use tokengate::auth::{address_of_secret, sign_message};

/// Sign a message the way a wallet's personal_sign does.
#[derive(Parser, Debug)]
#[command(name = "tokengate-sign")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Hex secp256k1 secret key (`0x` optional). Generated when omitted.
    #[arg(long, env = "TOKENGATE_SIGNING_KEY")]
    key: Option<String>,

    /// Message to sign.
    #[arg(long, short, default_value = "Open the gated document")]
    message: String,

    /// Nonce from `GET /api/view?nonce=1`, appended to the message.
    #[arg(long)]
    nonce: Option<String>,

    /// Token id to request.
    #[arg(long)]
    token_id: Option<String>,
}

fn parse_key(text: &str) -> color_eyre::Result<SecretKey> {
    let trimmed = text.trim();
    let hex_part = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    let bytes = hex::decode(hex_part).wrap_err("secret key is not hex")?;
    SecretKey::from_slice(&bytes).map_err(|e| eyre!("invalid secret key: {e}"))
}

fn generate_key() -> SecretKey {
    let mut raw = [0u8; 32];
    loop {
        rand::rngs::OsRng.fill_bytes(&mut raw);
        // Out-of-range scalars are astronomically rare; draw again.
        if let Ok(key) = SecretKey::from_slice(&raw) {
            return key;
        }
    }
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let args = Args::parse();

    let (key, generated) = match args.key.as_deref() {
        Some(text) => (parse_key(text)?, false),
        None => (generate_key(), true),
    };

    let message = match &args.nonce {
        Some(nonce) => format!("{}\nNonce: {nonce}", args.message),
        None => args.message,
    };

    let mut body = json!({
        "address": address_of_secret(&key).to_string(),
        "message": message,
        "signature": sign_message(&key, &message),
    });
    if let Some(token_id) = args.token_id {
        body["tokenId"] = json!(token_id);
    }
    if generated {
        body["secretKey"] = json!(format!("0x{}", hex::encode(key.secret_bytes())));
    }

    println!("{}", serde_json::to_string_pretty(&body)?);
    Ok(())
}
