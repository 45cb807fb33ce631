//! Mock JSON-RPC node for ownership checks.
//!
//! Answers every `eth_call` with one configurable `balanceOf` result, so
//! tests can flip an address between holder and non-holder, or make the
//! node fail or stall.

use serde_json::json;
use std::time::Duration;
use tracing::info;
use wiremock::matchers::{body_partial_json, method};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

/// Anvil's first dev account key (address `0xf39F...2266`).
pub const DEFAULT_WALLET_KEY: &str =
    "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

/// The address of [`DEFAULT_WALLET_KEY`].
pub const DEFAULT_WALLET_ADDRESS: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

/// NFT contract the gate is configured with.
pub const NFT_CONTRACT: &str = "0x1c1509ED7DF9eFB38C513089964C400380f8B704";

/// A mock chain reachable over HTTP JSON-RPC.
pub struct TestChain {
    server: MockServer,
}

impl TestChain {
    /// Start a chain on which nobody holds a token.
    pub async fn start() -> Self {
        let chain = Self {
            server: MockServer::start().await,
        };
        chain.set_balance(0).await;
        info!("Mock chain listening on {}", chain.rpc_url());
        chain
    }

    /// RPC URL for the gate's configuration.
    pub fn rpc_url(&self) -> String {
        self.server.uri()
    }

    /// Answer every `balanceOf` with `balance`.
    pub async fn set_balance(&self, balance: u64) {
        self.server.reset().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "method": "eth_call" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "id": 1,
                "result": format!("0x{balance:064x}"),
            })))
            .mount(&self.server)
            .await;
    }

    /// Answer every call with HTTP `status`.
    pub async fn fail_with(&self, status: u16) {
        self.server.reset().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.server)
            .await;
    }

    /// Accept calls but answer only after `delay`.
    pub async fn stall(&self, delay: Duration) {
        self.server.reset().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "jsonrpc": "2.0", "id": 1, "result": "0x01" }))
                    .set_delay(delay),
            )
            .mount(&self.server)
            .await;
    }

    /// Calldata of every `eth_call` received so far.
    pub async fn calls(&self) -> Vec<String> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter_map(calldata)
            .collect()
    }
}

fn calldata(request: &Request) -> Option<String> {
    let body: serde_json::Value = serde_json::from_slice(&request.body).ok()?;
    body["params"][0]["data"].as_str().map(str::to_string)
}
