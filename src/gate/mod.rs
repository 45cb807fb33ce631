//! The access gate: from request to document.
//!
//! ```text
//! GateRequest
//!   │ method      GET → health / nonce, POST → continue, else 405
//!   │ config      missing settings → 500 listing them
//!   │ body        address (400 if invalid), message+signature, tokenId
//!   │ auth        signature → signer == address (401), nonce (401)
//!   │ chain       balanceOf > 0, else 403; RPC failure 502/504
//!   │ document    static path or discovery (404 with tried URLs)
//!   ▼
//! GateResponse  Redirect { url } | Document { bytes }
//! ```
//!
//! The gate is transport-agnostic. [`crate::server`] adapts it to HTTP.

mod request;

pub use request::{wants_nonce, AccessRequest};

use crate::address::Address;
use crate::auth::NonceStore;
use crate::chain::{JsonRpcCaller, JsonRpcConfig, OwnershipChecker, OwnershipQuery, ViewCaller};
use crate::config::{GateConfig, GateSettings, ResponseMode};
use crate::document::{
    candidate_paths, locate, DocumentLocation, DocumentSource, GatewayClient, GatewayConfig,
};
use crate::error::{Error, Result};
use axum::http::Method;
use bytes::Bytes;
use num_bigint::BigUint;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Crate version reported by the health payload.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// A request as the gate sees it.
#[derive(Debug, Clone)]
pub struct GateRequest {
    /// HTTP method.
    pub method: Method,
    /// Raw query string, without the `?`.
    pub query: Option<String>,
    /// Raw body.
    pub body: Bytes,
}

impl GateRequest {
    /// A POST carrying `body`.
    #[must_use]
    pub fn post(body: impl Into<Bytes>) -> Self {
        Self {
            method: Method::POST,
            query: None,
            body: body.into(),
        }
    }

    /// A GET with the given query string.
    #[must_use]
    pub fn get(query: Option<&str>) -> Self {
        Self {
            method: Method::GET,
            query: query.map(str::to_string),
            body: Bytes::new(),
        }
    }
}

/// What the gate answers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateResponse {
    /// Liveness payload.
    Health {
        /// Always `"ok"`.
        status: &'static str,
        /// Crate version.
        version: &'static str,
    },
    /// A freshly issued nonce.
    Nonce {
        /// Value to embed in the signed message.
        nonce: String,
        /// Expiry as unix seconds.
        expires_at: i64,
    },
    /// Granted, redirect mode.
    Redirect {
        /// Gateway URL of the document.
        url: String,
    },
    /// Granted, proxy mode.
    Document {
        /// PDF bytes.
        bytes: Bytes,
        /// Name for `content-disposition`.
        file_name: String,
    },
}

struct Backend {
    settings: GateSettings,
    ownership: OwnershipChecker,
    documents: Arc<dyn DocumentSource>,
    nonces: Option<NonceStore>,
}

enum State {
    Ready(Box<Backend>),
    Misconfigured(Vec<&'static str>),
}

/// NFT-gated document access.
pub struct AccessGate {
    state: State,
}

impl AccessGate {
    /// Build a gate from operator configuration.
    ///
    /// Missing required values do not fail construction: the gate starts and
    /// answers every gated request with a configuration error listing them.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for values that are present but invalid.
    pub fn from_config(config: &GateConfig) -> Result<Self> {
        match config.validate() {
            Ok(settings) => Ok(Self::from_settings(settings)),
            Err(Error::MissingConfig(missing)) => {
                warn!("Missing required configuration: {}", missing.join(", "));
                Ok(Self {
                    state: State::Misconfigured(missing),
                })
            }
            Err(e) => Err(e),
        }
    }

    /// Build a gate talking to the configured RPC endpoint and gateway.
    #[must_use]
    pub fn from_settings(settings: GateSettings) -> Self {
        let client = reqwest::Client::new();
        let caller = JsonRpcCaller::with_client(
            client.clone(),
            JsonRpcConfig {
                endpoint: settings.rpc_url.clone(),
                timeout: settings.rpc_timeout,
            },
        );
        let gateway = GatewayClient::with_client(
            client,
            GatewayConfig {
                fetch_timeout: settings.fetch_timeout,
                probe_timeout: settings.probe_timeout,
            },
        );
        let nonces = settings
            .require_nonce
            .then(|| NonceStore::with_capacity(settings.nonce_ttl, settings.nonce_capacity));

        Self::with_backends(settings, Arc::new(caller), Arc::new(gateway), nonces)
    }

    /// Build a gate over explicit chain and gateway backends.
    #[must_use]
    pub fn with_backends(
        settings: GateSettings,
        caller: Arc<dyn ViewCaller>,
        documents: Arc<dyn DocumentSource>,
        nonces: Option<NonceStore>,
    ) -> Self {
        if settings.allow_unsigned {
            warn!(
                "Unsigned requests are accepted: anyone can query ownership of any address"
            );
        }
        info!(
            "Gate ready: contract {}, mode {:?}, discovery {}, nonce binding {}",
            settings.contract,
            settings.mode,
            settings.discover_path,
            nonces.is_some()
        );
        Self {
            state: State::Ready(Box::new(Backend {
                settings,
                ownership: OwnershipChecker::new(caller),
                documents,
                nonces,
            })),
        }
    }

    /// Whether every required setting is present.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        matches!(self.state, State::Ready(_))
    }

    /// Handle one request.
    ///
    /// # Errors
    ///
    /// Returns the [`Error`] whose status and public message the caller
    /// should see.
    pub async fn handle(&self, request: GateRequest) -> Result<GateResponse> {
        match request.method {
            Method::GET if wants_nonce(request.query.as_deref()) => self.issue_nonce(),
            Method::GET => Ok(GateResponse::Health {
                status: "ok",
                version: VERSION,
            }),
            Method::POST => self.backend()?.grant(&request.body).await,
            other => Err(Error::MethodNotAllowed(other.to_string())),
        }
    }

    fn backend(&self) -> Result<&Backend> {
        match &self.state {
            State::Ready(backend) => Ok(backend),
            State::Misconfigured(missing) => Err(Error::MissingConfig(missing.clone())),
        }
    }

    fn issue_nonce(&self) -> Result<GateResponse> {
        let store = self.backend()?.nonces.as_ref().ok_or(Error::NonceDisabled)?;
        let issued = store.issue()?;
        let ttl = i64::try_from(issued.ttl.as_secs()).unwrap_or(i64::MAX);
        debug!("Issued nonce valid for {:?}", issued.ttl);
        Ok(GateResponse::Nonce {
            nonce: issued.value,
            expires_at: chrono::Utc::now().timestamp().saturating_add(ttl),
        })
    }
}

impl Backend {
    async fn grant(&self, body: &[u8]) -> Result<GateResponse> {
        let request = AccessRequest::from_body(body)?;
        let credential = request.credential()?;
        let token_id = self.effective_token_id(request.token_id()?)?;

        let owner = credential.authenticate(self.settings.allow_unsigned, self.nonces.as_ref())?;

        let query = OwnershipQuery {
            contract: self.settings.contract,
            owner,
            token_id: token_id.clone(),
        };
        if !self.ownership.check(&query).await?.grants_access() {
            info!("Denied {owner}: no token");
            return Err(Error::NoToken(owner.to_string()));
        }

        let location = self.resolve(token_id.as_ref()).await?;
        self.deliver(&owner, location).await
    }

    fn effective_token_id(&self, requested: Option<BigUint>) -> Result<Option<BigUint>> {
        match requested {
            Some(id) if self.settings.is_gated_token(&id) => Ok(Some(id)),
            Some(id) => Err(Error::BadRequest(format!("tokenId {id} is not gated here"))),
            None => Ok(self.settings.token_id.clone()),
        }
    }

    fn document_path(&self, token_id: Option<&BigUint>) -> Option<&str> {
        token_id
            .and_then(|id| self.settings.token_paths.get(id))
            .or(self.settings.docs_file.as_ref())
            .map(String::as_str)
    }

    async fn resolve(&self, token_id: Option<&BigUint>) -> Result<DocumentLocation> {
        let base = DocumentLocation::root(&self.settings.gateway_url, &self.settings.docs_cid);
        let path = self.document_path(token_id);

        if self.settings.discover_path {
            locate(self.documents.as_ref(), &base, &candidate_paths(path)).await
        } else {
            Ok(base.with_path(path.unwrap_or_default()))
        }
    }

    async fn deliver(&self, owner: &Address, location: DocumentLocation) -> Result<GateResponse> {
        let url = location.url();
        match self.settings.mode {
            ResponseMode::Redirect => {
                info!("Granted {owner}: redirect");
                Ok(GateResponse::Redirect { url })
            }
            ResponseMode::Proxy => {
                let bytes = self.documents.fetch(&url).await?;
                info!("Granted {owner}: proxied {} bytes", bytes.len());
                Ok(GateResponse::Document {
                    bytes,
                    file_name: location.file_name().to_string(),
                })
            }
        }
    }
}
