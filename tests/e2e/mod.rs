//! End-to-end tests: a real tokengate server on an ephemeral port, talking
//! to mock RPC and gateway servers over HTTP.

mod access_tests;
mod chain;
mod gateway;
mod harness;

pub use chain::DEFAULT_WALLET_ADDRESS;
pub use gateway::PDF_BYTES;
pub use harness::{signed, wallet, TestHarness};
