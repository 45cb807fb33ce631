//! HTTP server around the [`AccessGate`].

use crate::config::GateConfig;
use crate::error::{Error, ErrorKind, Result};
use crate::gate::{AccessGate, GateRequest, GateResponse, VERSION};
use axum::body::Bytes;
use axum::extract::{RawQuery, State};
use axum::http::{header, Method};
use axum::response::{IntoResponse, Response};
use axum::routing::{any, get};
use axum::{Json, Router};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

/// Headers sent with every proxied document.
fn document_headers() -> [(header::HeaderName, &'static str); 5] {
    [
        (header::CACHE_CONTROL, "no-store, no-cache, must-revalidate"),
        (header::X_FRAME_OPTIONS, "SAMEORIGIN"),
        (header::REFERRER_POLICY, "no-referrer"),
        (header::CONTENT_SECURITY_POLICY, "frame-ancestors 'self';"),
        (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
    ]
}

/// Build the router: the gate on `/` and `/api/view`, health on `/health`.
pub fn router(gate: Arc<AccessGate>) -> Router {
    Router::new()
        .route("/", any(view))
        .route("/api/view", any(view))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(gate)
}

async fn view(
    State(gate): State<Arc<AccessGate>>,
    method: Method,
    RawQuery(query): RawQuery,
    body: Bytes,
) -> Response {
    let request = GateRequest {
        method,
        query,
        body,
    };
    match gate.handle(request).await {
        Ok(response) => response.into_response(),
        Err(e) => e.into_response(),
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok", "version": VERSION }))
}

impl IntoResponse for GateResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Health { status, version } => {
                Json(json!({ "status": status, "version": version })).into_response()
            }
            Self::Nonce { nonce, expires_at } => {
                Json(json!({ "nonce": nonce, "expiresAt": expires_at })).into_response()
            }
            Self::Redirect { url } => Json(json!({ "url": url })).into_response(),
            Self::Document { bytes, file_name } => {
                let disposition = format!("inline; filename=\"{}\"", header_safe(&file_name));
                (
                    [
                        (header::CONTENT_TYPE, "application/pdf".to_string()),
                        (header::CONTENT_DISPOSITION, disposition),
                    ],
                    document_headers(),
                    bytes,
                )
                    .into_response()
            }
        }
    }
}

/// Replace characters that cannot appear inside a quoted header parameter.
fn header_safe(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c == ' ' || (c.is_ascii_graphic() && c != '"' && c != '\\') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        match self.kind() {
            ErrorKind::UpstreamTransport | ErrorKind::Overloaded => warn!("{self}"),
            ErrorKind::Configuration | ErrorKind::Unexpected => error!("{self}"),
            _ => debug!("Rejected: {self}"),
        }

        let body = match self.tried() {
            Some(tried) => json!({ "error": self.public_message(), "tried": tried }),
            None => json!({ "error": self.public_message() }),
        };
        (status, Json(body)).into_response()
    }
}

/// Builder for the tokengate server.
pub struct ServerBuilder {
    config: GateConfig,
}

impl ServerBuilder {
    /// Create a builder for the given configuration.
    #[must_use]
    pub fn new(config: GateConfig) -> Self {
        Self { config }
    }

    /// Build the gate and bind the listener.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration values are invalid or the listen
    /// address cannot be bound.
    pub async fn build(self) -> Result<RunningServer> {
        let gate = AccessGate::from_config(&self.config)?;
        Self::with_gate(self.config.listen, gate).await
    }

    /// Bind `listen` and serve an already-built gate.
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound.
    pub async fn with_gate(listen: SocketAddr, gate: AccessGate) -> Result<RunningServer> {
        let listener = TcpListener::bind(listen).await?;
        let local_addr = listener.local_addr()?;
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Ok(RunningServer {
            listener,
            local_addr,
            router: router(Arc::new(gate)),
            shutdown_tx: Arc::new(shutdown_tx),
            shutdown_rx,
        })
    }
}

/// A bound, not yet serving, tokengate server.
pub struct RunningServer {
    listener: TcpListener,
    local_addr: SocketAddr,
    router: Router,
    shutdown_tx: Arc<watch::Sender<bool>>,
    shutdown_rx: watch::Receiver<bool>,
}

/// Requests shutdown of a [`RunningServer`] from elsewhere.
#[derive(Clone)]
pub struct ShutdownHandle(Arc<watch::Sender<bool>>);

impl ShutdownHandle {
    /// Ask the server to stop accepting connections and drain.
    pub fn shutdown(&self) {
        let _ = self.0.send(true);
    }
}

impl RunningServer {
    /// Address the server is bound to.
    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Handle for requesting shutdown once `run` owns the server.
    #[must_use]
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle(Arc::clone(&self.shutdown_tx))
    }

    /// Request shutdown.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    /// Serve until Ctrl-C or a shutdown request.
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails while serving.
    pub async fn run(self) -> Result<()> {
        let Self {
            listener,
            local_addr,
            router,
            shutdown_tx,
            mut shutdown_rx,
        } = self;
        info!("tokengate listening on {local_addr}");

        let signal = async move {
            let ctrl_c = async {
                match tokio::signal::ctrl_c().await {
                    Ok(()) => info!("Ctrl-C received, initiating shutdown"),
                    Err(e) => {
                        warn!("Ctrl-C handler unavailable: {e}");
                        std::future::pending::<()>().await;
                    }
                }
            };
            tokio::select! {
                () = wait_for_shutdown(&mut shutdown_rx) => {
                    info!("Shutdown signal received");
                }
                () = ctrl_c => {
                    let _ = shutdown_tx.send(true);
                }
            }
        };

        axum::serve(listener, router)
            .with_graceful_shutdown(signal)
            .await?;

        info!("tokengate shutdown complete");
        Ok(())
    }
}

async fn wait_for_shutdown(rx: &mut watch::Receiver<bool>) {
    while !*rx.borrow() {
        if rx.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
