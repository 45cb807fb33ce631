//! Test harness that runs a real tokengate server against mock upstreams.
//!
//! The `TestHarness` starts a [`TestChain`] and a [`TestGateway`], binds a
//! tokengate server on an ephemeral port pointing at both, and drives it
//! over HTTP with `reqwest`.

use super::chain::{TestChain, DEFAULT_WALLET_KEY, NFT_CONTRACT};
use super::gateway::{TestGateway, DOCS_CID};
use secp256k1::SecretKey;
use serde_json::{json, Value};
use std::net::SocketAddr;
use tokengate::auth::{address_of_secret, sign_message};
use tokengate::{GateConfig, ServerBuilder, ShutdownHandle};
use tokio::task::JoinHandle;
use tracing::info;

/// Error type for test harness operations.
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    /// Server failed to start.
    #[error("Server error: {0}")]
    Server(#[from] tokengate::Error),

    /// Server task failed.
    #[error("Server task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Result type for harness operations.
pub type Result<T> = std::result::Result<T, HarnessError>;

/// A running gate plus its upstreams.
pub struct TestHarness {
    /// Mock JSON-RPC node.
    pub chain: TestChain,
    /// Mock content gateway.
    pub gateway: TestGateway,
    /// HTTP client for talking to the gate.
    pub client: reqwest::Client,
    addr: SocketAddr,
    shutdown: ShutdownHandle,
    task: JoinHandle<tokengate::Result<()>>,
}

impl TestHarness {
    /// Start with the default configuration (proxy mode, signatures required).
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to start.
    pub async fn setup() -> Result<Self> {
        Self::setup_with(|_| {}).await
    }

    /// Start with a configuration adjusted by `configure`.
    ///
    /// Upstream URLs and the listen address are filled in before
    /// `configure` runs, so it may override them.
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to start.
    pub async fn setup_with(configure: impl FnOnce(&mut GateConfig)) -> Result<Self> {
        let chain = TestChain::start().await;
        let gateway = TestGateway::start().await;

        let mut config = GateConfig {
            listen: SocketAddr::from(([127, 0, 0, 1], 0)),
            rpc_url: Some(chain.rpc_url()),
            contract_address: Some(NFT_CONTRACT.to_string()),
            docs_cid: Some(DOCS_CID.to_string()),
            gateway_url: gateway.base_url(),
            ..GateConfig::default()
        };
        config.timeouts.rpc_secs = 2;
        config.timeouts.fetch_secs = 2;
        config.timeouts.probe_secs = 1;
        configure(&mut config);

        let server = ServerBuilder::new(config).build().await?;
        let addr = server.local_addr();
        let shutdown = server.shutdown_handle();
        let task = tokio::spawn(server.run());
        info!("Test gate listening on {addr}");

        Ok(Self {
            chain,
            gateway,
            client: reqwest::Client::new(),
            addr,
            shutdown,
            task,
        })
    }

    /// URL of `path` on the gate.
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    /// POST a JSON body to `/api/view`.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be sent.
    #[allow(clippy::expect_used)]
    pub async fn view(&self, body: &Value) -> reqwest::Response {
        self.client
            .post(self.url("/api/view"))
            .json(body)
            .send()
            .await
            .expect("gate unreachable")
    }

    /// Stop the server and wait for it to finish.
    ///
    /// # Errors
    ///
    /// Returns an error if the server exited with an error.
    pub async fn teardown(self) -> Result<()> {
        self.shutdown.shutdown();
        self.task.await??;
        Ok(())
    }
}

/// The default dev wallet key.
///
/// # Panics
///
/// Never: the constant is a valid key.
#[allow(clippy::expect_used)]
pub fn wallet() -> SecretKey {
    let bytes = hex::decode(DEFAULT_WALLET_KEY.trim_start_matches("0x")).expect("hex key");
    SecretKey::from_slice(&bytes).expect("valid key")
}

/// A signed request body for `message` from `key`.
pub fn signed(key: &SecretKey, message: &str) -> Value {
    json!({
        "address": address_of_secret(key).to_string(),
        "message": message,
        "signature": sign_message(key, message),
    })
}
