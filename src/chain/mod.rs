//! On-chain ownership verification.
//!
//! ```text
//! OwnershipQuery { contract, owner, token_id? }
//!        │
//!        ▼
//! ┌──────────────────────────┐
//! │ ViewCall                 │  balanceOf(address)          (no token id)
//! │ selector ++ 32-byte args │  balanceOf(address,uint256)  (token id)
//! └──────────┬───────────────┘
//!            ▼
//! ┌──────────────────────────┐
//! │ ViewCaller::call_uint    │  JsonRpcCaller: eth_call @ latest, timeout
//! └──────────┬───────────────┘
//!            │
//!     ┌──────┴──────┐
//!     │             │
//!  balance > 0   balance = 0        transport failure
//!     │             │                      │
//!  GRANTED       DENIED (403)      UPSTREAM (502/504)
//! ```

pub mod abi;
mod ownership;
mod rpc;

pub use abi::ViewCall;
pub use ownership::{OwnershipChecker, OwnershipQuery, OwnershipResult, TokenStandard};
pub use rpc::{JsonRpcCaller, JsonRpcConfig};

use crate::address::Address;
use crate::error::Result;
use async_trait::async_trait;
use num_bigint::BigUint;

/// Reads a fixed-selector view function that returns a single integer.
///
/// How the call is encoded and transported is up to the implementation.
#[async_trait]
pub trait ViewCaller: Send + Sync {
    /// Execute `call` against `contract` and decode the integer result.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Upstream`] or
    /// [`crate::Error::UpstreamTimeout`] when the chain cannot be read.
    async fn call_uint(&self, contract: &Address, call: &ViewCall) -> Result<BigUint>;
}
