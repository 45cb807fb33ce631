//! reqwest-backed gateway client.

use crate::document::{DocumentSource, ProbeResponse};
use crate::error::{Error, Result, Upstream};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{CONTENT_TYPE, RANGE};
use reqwest::{RequestBuilder, Response};
use std::time::Duration;
use tracing::{debug, warn};

/// Configuration for the gateway client.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Timeout for downloading the document.
    pub fetch_timeout: Duration,
    /// Timeout for each existence probe.
    pub probe_timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            fetch_timeout: Duration::from_secs(15),
            probe_timeout: Duration::from_secs(5),
        }
    }
}

/// HTTP client for an IPFS-style content gateway.
pub struct GatewayClient {
    client: reqwest::Client,
    config: GatewayConfig,
}

impl GatewayClient {
    /// Create a client with its own HTTP connection pool.
    #[must_use]
    pub fn new(config: GatewayConfig) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    /// Create a client sharing an existing HTTP client.
    #[must_use]
    pub fn with_client(client: reqwest::Client, config: GatewayConfig) -> Self {
        Self { client, config }
    }

    async fn send(&self, request: RequestBuilder, timeout: Duration) -> Result<Response> {
        match tokio::time::timeout(timeout, request.send()).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(e)) => Err(Error::gateway(format!("request failed: {e}"))),
            Err(_) => Err(Error::UpstreamTimeout(Upstream::Gateway, timeout)),
        }
    }
}

fn probe_response(response: &Response) -> ProbeResponse {
    ProbeResponse {
        status: response.status().as_u16(),
        content_type: response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    }
}

#[async_trait]
impl DocumentSource for GatewayClient {
    async fn probe(&self, url: &str) -> Result<ProbeResponse> {
        let timeout = self.config.probe_timeout;

        match self.send(self.client.head(url), timeout).await {
            Ok(response) if response.status().is_success() => {
                return Ok(probe_response(&response));
            }
            Ok(response) => debug!("HEAD {url} returned {}, trying ranged GET", response.status()),
            Err(e) => debug!("HEAD {url} failed ({e}), trying ranged GET"),
        }

        // Some gateways reject HEAD; a one-byte range is the next cheapest check.
        let response = self
            .send(self.client.get(url).header(RANGE, "bytes=0-0"), timeout)
            .await?;
        Ok(probe_response(&response))
    }

    async fn fetch(&self, url: &str) -> Result<Bytes> {
        let timeout = self.config.fetch_timeout;
        debug!("Fetching document from {url}");

        let download = async {
            let response = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|e| Error::gateway(format!("request failed: {e}")))?;
            let status = response.status();
            if !status.is_success() {
                return Err(Error::gateway(format!("GET {url} returned {status}")));
            }
            response
                .bytes()
                .await
                .map_err(|e| Error::gateway(format!("body read failed: {e}")))
        };

        match tokio::time::timeout(timeout, download).await {
            Ok(Ok(bytes)) => {
                debug!("Fetched {} bytes from {url}", bytes.len());
                Ok(bytes)
            }
            Ok(Err(e)) => {
                warn!("Document fetch failed: {e}");
                Err(e)
            }
            Err(_) => {
                warn!("Document fetch from {url} timed out after {timeout:?}");
                Err(Error::UpstreamTimeout(Upstream::Gateway, timeout))
            }
        }
    }
}
