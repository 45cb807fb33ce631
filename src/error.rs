//! Error types for tokengate.
//!
//! Every failure the gate can produce maps onto one [`ErrorKind`], and every
//! kind onto exactly one HTTP status. What the caller sees comes from
//! [`Error::public_message`]; the `Display` text may carry upstream detail
//! and is meant for logs only.

use axum::http::StatusCode;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for tokengate operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The outbound dependency an upstream failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upstream {
    /// The blockchain JSON-RPC endpoint.
    Rpc,
    /// The content gateway serving the document.
    Gateway,
}

impl fmt::Display for Upstream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rpc => f.write_str("rpc"),
            Self::Gateway => f.write_str("gateway"),
        }
    }
}

/// Error categories, one per way a caller has to react.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad method, malformed body, invalid address. Fix the request.
    ClientInput,
    /// Signature (or bound nonce) does not check out.
    Authentication,
    /// Address holds no token.
    Authorization,
    /// Document could not be located on the gateway.
    NotLocated,
    /// RPC or gateway unreachable, failing or timing out.
    UpstreamTransport,
    /// Gate is at capacity. Retry later.
    Overloaded,
    /// Operator has to fix the deployment.
    Configuration,
    /// Anything else.
    Unexpected,
}

impl ErrorKind {
    /// Whether retrying the same request later can succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::UpstreamTransport | Self::Overloaded)
    }
}

/// Error type for tokengate operations.
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP method other than POST (or GET for health/nonce).
    #[error("method not allowed: {0}")]
    MethodNotAllowed(String),

    /// Body is not valid JSON or has the wrong shape.
    #[error("malformed request body: {0}")]
    MalformedBody(String),

    /// Address is not `0x` followed by 40 hex characters.
    #[error("invalid wallet address: {0}")]
    InvalidAddress(String),

    /// Request is well-formed JSON but semantically unusable.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Signature malformed, signer mismatch, or nonce rejected.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// The address holds no token.
    #[error("no token held by {0}")]
    NoToken(String),

    /// None of the candidate document paths confirmed as a PDF.
    #[error("document not located after {} candidates", .tried.len())]
    NotLocated {
        /// Candidate URLs in the order they were probed.
        tried: Vec<String>,
    },

    /// Nonce issuance requested while nonce binding is off.
    #[error("nonce issuance disabled")]
    NonceDisabled,

    /// Every nonce slot holds a live nonce.
    #[error("nonce store full: {0} outstanding")]
    NonceCapacity(usize),

    /// Upstream dependency failed (non-2xx, malformed payload, transport).
    #[error("{service} upstream error: {detail}")]
    Upstream {
        /// Which dependency failed.
        service: Upstream,
        /// Internal detail; never shown to callers.
        detail: String,
    },

    /// Upstream dependency did not answer in time.
    #[error("{0} upstream timed out after {1:?}")]
    UpstreamTimeout(Upstream, Duration),

    /// Required configuration values are absent.
    #[error("missing required configuration: {}", .0.join(", "))]
    MissingConfig(Vec<&'static str>),

    /// Configuration present but invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Shorthand for an RPC-side [`Error::Upstream`].
    pub fn rpc(detail: impl Into<String>) -> Self {
        Self::Upstream {
            service: Upstream::Rpc,
            detail: detail.into(),
        }
    }

    /// Shorthand for a gateway-side [`Error::Upstream`].
    pub fn gateway(detail: impl Into<String>) -> Self {
        Self::Upstream {
            service: Upstream::Gateway,
            detail: detail.into(),
        }
    }

    /// The category this error belongs to.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MethodNotAllowed(_)
            | Self::MalformedBody(_)
            | Self::InvalidAddress(_)
            | Self::BadRequest(_) => ErrorKind::ClientInput,
            Self::Authentication(_) => ErrorKind::Authentication,
            Self::NoToken(_) => ErrorKind::Authorization,
            Self::NotLocated { .. } | Self::NonceDisabled => ErrorKind::NotLocated,
            Self::Upstream { .. } | Self::UpstreamTimeout(..) => ErrorKind::UpstreamTransport,
            Self::MissingConfig(_) | Self::Config(_) => ErrorKind::Configuration,
            Self::NonceCapacity(_) => ErrorKind::Overloaded,
            Self::Io(_) => ErrorKind::Unexpected,
        }
    }

    /// HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            Self::MalformedBody(_) | Self::InvalidAddress(_) | Self::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Authentication(_) => StatusCode::UNAUTHORIZED,
            Self::NoToken(_) => StatusCode::FORBIDDEN,
            Self::NotLocated { .. } | Self::NonceDisabled => StatusCode::NOT_FOUND,
            Self::Upstream { .. } => StatusCode::BAD_GATEWAY,
            Self::UpstreamTimeout(..) => StatusCode::GATEWAY_TIMEOUT,
            Self::NonceCapacity(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::MissingConfig(_) | Self::Config(_) | Self::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message safe to return to the caller.
    ///
    /// Upstream and server-side errors collapse to generic text so RPC URLs and
    /// provider error bodies stay in the logs.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::MethodNotAllowed(_) => "Method Not Allowed".to_string(),
            Self::MalformedBody(detail) => format!("Malformed request body: {detail}"),
            Self::InvalidAddress(_) => {
                "Invalid address: expected 0x followed by 40 hex characters".to_string()
            }
            Self::BadRequest(detail) => format!("Bad Request: {detail}"),
            Self::Authentication(detail) => format!("Unauthorized: {detail}"),
            Self::NoToken(_) => "Forbidden: no token held by this address".to_string(),
            Self::NotLocated { .. } => "Document not located".to_string(),
            Self::NonceDisabled => "Nonce issuance disabled".to_string(),
            Self::Upstream { service, .. } => format!("Upstream {service} error"),
            Self::UpstreamTimeout(service, _) => format!("Upstream {service} timeout"),
            Self::MissingConfig(missing) => format!("Missing env vars: {}", missing.join(", ")),
            Self::NonceCapacity(_) => "Too many outstanding nonces, retry later".to_string(),
            Self::Config(_) | Self::Io(_) => "Server error".to_string(),
        }
    }

    /// Candidate URLs tried during path discovery, if this is a
    /// [`Error::NotLocated`].
    #[must_use]
    pub fn tried(&self) -> Option<&[String]> {
        match self {
            Self::NotLocated { tried } => Some(tried),
            _ => None,
        }
    }
}
