//! Raw JSON-RPC `eth_call` client.
//!
//! Assembles calldata by hand and sends one read-only call against the
//! latest block. Every call runs under a timeout; when it fires the request
//! future is dropped, which aborts the underlying connection.

use crate::address::Address;
use crate::chain::abi::{self, ViewCall};
use crate::chain::ViewCaller;
use crate::error::{Error, Result, Upstream};
use async_trait::async_trait;
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Configuration for the JSON-RPC caller.
#[derive(Debug, Clone)]
pub struct JsonRpcConfig {
    /// RPC endpoint URL. Treated as a secret: never logged.
    pub endpoint: String,
    /// Timeout for a whole call (connect, send, read body).
    pub timeout: Duration,
}

impl JsonRpcConfig {
    /// Config for `endpoint` with the default timeout.
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout: Duration::from_secs(8),
        }
    }
}

#[derive(Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'static str,
    params: (CallObject<'a>, &'static str),
}

#[derive(Serialize)]
struct CallObject<'a> {
    to: String,
    data: &'a str,
}

#[derive(Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<String>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

/// [`ViewCaller`] backed by a JSON-RPC endpoint.
pub struct JsonRpcCaller {
    client: reqwest::Client,
    config: JsonRpcConfig,
}

impl JsonRpcCaller {
    /// Create a caller with its own HTTP client.
    #[must_use]
    pub fn new(config: JsonRpcConfig) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    /// Create a caller sharing an existing HTTP client.
    #[must_use]
    pub fn with_client(client: reqwest::Client, config: JsonRpcConfig) -> Self {
        Self { client, config }
    }

    async fn eth_call(&self, contract: &Address, call: &ViewCall) -> Result<BigUint> {
        let data = call.calldata();
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: 1,
            method: "eth_call",
            params: (
                CallObject {
                    to: contract.to_string(),
                    data: &data,
                },
                "latest",
            ),
        };

        let response = self
            .client
            .post(&self.config.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::rpc(format!("request failed: {}", e.without_url())))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::rpc(format!("HTTP {status}")));
        }

        let body: RpcResponse = response
            .json()
            .await
            .map_err(|e| Error::rpc(format!("malformed JSON-RPC response: {}", e.without_url())))?;

        if let Some(err) = body.error {
            return Err(Error::rpc(format!(
                "JSON-RPC error {}: {}",
                err.code, err.message
            )));
        }

        let result = body
            .result
            .ok_or_else(|| Error::rpc("JSON-RPC response has no result"))?;
        abi::parse_uint(&result)
    }
}

#[async_trait]
impl ViewCaller for JsonRpcCaller {
    async fn call_uint(&self, contract: &Address, call: &ViewCall) -> Result<BigUint> {
        debug!("eth_call {} on {contract}", call.signature());

        match tokio::time::timeout(self.config.timeout, self.eth_call(contract, call)).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                warn!("eth_call {} failed: {e}", call.signature());
                Err(e)
            }
            Err(_) => {
                warn!(
                    "eth_call {} timed out after {:?}",
                    call.signature(),
                    self.config.timeout
                );
                Err(Error::UpstreamTimeout(Upstream::Rpc, self.config.timeout))
            }
        }
    }
}
