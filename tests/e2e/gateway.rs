//! Mock content gateway.

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Content identifier the gate is configured with.
pub const DOCS_CID: &str = "bafybeie2etokengatetestdocument";

/// Bytes served as the document.
pub const PDF_BYTES: &[u8] = b"%PDF-1.7\n%tokengate test document\n%%EOF\n";

/// A mock gateway serving PDFs under `/ipfs/{cid}`.
pub struct TestGateway {
    server: MockServer,
}

impl TestGateway {
    /// Start a gateway that serves nothing yet.
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Base URL for the gate's configuration.
    pub fn base_url(&self) -> String {
        format!("{}/ipfs", self.server.uri())
    }

    /// Serve [`PDF_BYTES`] at `file` inside [`DOCS_CID`] (`""` for the root).
    pub async fn serve_pdf(&self, file: &str) {
        let route = if file.is_empty() {
            format!("/ipfs/{DOCS_CID}")
        } else {
            format!("/ipfs/{DOCS_CID}/{file}")
        };

        for verb in ["HEAD", "GET"] {
            Mock::given(method(verb))
                .and(path(route.clone()))
                .respond_with(
                    ResponseTemplate::new(200)
                        .insert_header("content-type", "application/pdf")
                        .set_body_bytes(PDF_BYTES.to_vec()),
                )
                .mount(&self.server)
                .await;
        }
    }

    /// URL of `file` inside [`DOCS_CID`].
    pub fn url_of(&self, file: &str) -> String {
        if file.is_empty() {
            format!("{}/{DOCS_CID}", self.base_url())
        } else {
            format!("{}/{DOCS_CID}/{file}", self.base_url())
        }
    }

    /// Number of requests the gateway has seen.
    pub async fn request_count(&self) -> usize {
        self.server
            .received_requests()
            .await
            .map_or(0, |requests| requests.len())
    }
}
