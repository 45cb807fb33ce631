//! Locating and fetching the gated document on a content gateway.

mod discovery;
mod gateway;

pub use discovery::{candidate_paths, confirms, locate, CONVENTIONAL_PATHS};
pub use gateway::{GatewayClient, GatewayConfig};

use crate::error::Result;
use async_trait::async_trait;
use bytes::Bytes;

/// Filename advertised when the path does not name a PDF.
pub const DEFAULT_FILE_NAME: &str = "docs.pdf";

/// Where the document lives: `{base_url}/{cid}[/{path}]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentLocation {
    /// Gateway base URL, e.g. `https://gateway.pinata.cloud/ipfs`.
    pub base_url: String,
    /// Content identifier.
    pub cid: String,
    /// Path inside the CID; empty for the CID root.
    pub path: String,
}

impl DocumentLocation {
    /// Location of the CID root.
    #[must_use]
    pub fn root(base_url: impl Into<String>, cid: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            cid: cid.into(),
            path: String::new(),
        }
    }

    /// Same CID, different path.
    #[must_use]
    pub fn with_path(&self, path: &str) -> Self {
        Self {
            base_url: self.base_url.clone(),
            cid: self.cid.clone(),
            path: path.trim_matches('/').to_string(),
        }
    }

    /// Full gateway URL.
    #[must_use]
    pub fn url(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        if self.path.is_empty() {
            format!("{base}/{}", self.cid)
        } else {
            format!("{base}/{}/{}", self.cid, self.path)
        }
    }

    /// Filename for a `content-disposition` header.
    #[must_use]
    pub fn file_name(&self) -> &str {
        match self.path.rsplit('/').next() {
            Some(name) if name.to_ascii_lowercase().ends_with(".pdf") => name,
            _ => DEFAULT_FILE_NAME,
        }
    }
}

/// Outcome of a lightweight existence check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResponse {
    /// HTTP status of the probe.
    pub status: u16,
    /// `content-type` header, if any.
    pub content_type: Option<String>,
}

impl ProbeResponse {
    /// Whether the status is 2xx (206 from a ranged GET included).
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// HTTP access to the content gateway.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Check whether `url` exists without downloading it.
    ///
    /// # Errors
    ///
    /// Returns an upstream error if no probe response could be obtained.
    async fn probe(&self, url: &str) -> Result<ProbeResponse>;

    /// Download the document at `url`.
    ///
    /// # Errors
    ///
    /// Returns an upstream error on transport failure, non-2xx status or
    /// timeout.
    async fn fetch(&self, url: &str) -> Result<Bytes>;
}
