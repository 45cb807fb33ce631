//! # tokengate
//!
//! NFT-gated document access.
//!
//! A caller proves control of a wallet by signing a message. The gate
//! recovers the signer, asks the NFT contract for the signer's `balanceOf`
//! over JSON-RPC `eth_call`, and if the balance is positive hands out the
//! PDF, either as bytes fetched from a content gateway (proxy mode) or as
//! the gateway URL (redirect mode).
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                 server (axum)               │
//! ├─────────────────────────────────────────────┤
//! │                 gate::AccessGate            │
//! ├──────────────┬──────────────┬───────────────┤
//! │ auth         │ chain        │ document      │
//! │ signature    │ ViewCaller   │ DocumentSource│
//! │ nonce store  │ balanceOf    │ discovery     │
//! └──────────────┴──────────────┴───────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use tokengate::{GateConfig, ServerBuilder};
//!
//! let config = GateConfig::from_file("tokengate.toml".as_ref())?;
//! let server = ServerBuilder::new(config).build().await?;
//! server.run().await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod address;
pub mod auth;
pub mod chain;
pub mod config;
pub mod document;
pub mod error;
pub mod gate;
pub mod server;

pub use address::Address;
pub use auth::{Credential, NonceStore};
pub use chain::{JsonRpcCaller, OwnershipChecker, OwnershipQuery, OwnershipResult, ViewCaller};
pub use config::{GateConfig, GateSettings, ResponseMode};
pub use document::{DocumentLocation, DocumentSource, GatewayClient};
pub use error::{Error, ErrorKind, Result};
pub use gate::{AccessGate, GateRequest, GateResponse};
pub use server::{router, RunningServer, ServerBuilder, ShutdownHandle};
