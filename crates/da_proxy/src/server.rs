//! JSON-RPC server exposing a DA backend over HTTP.

use crate::auth::{required_permission, AuthDisabled, AuthGate, Permission};
use crate::rpc::*;
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use da::{DaError, DataAvailability, SubmitOptions};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

/// Errors from running the server.
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("server task failed: {0}")]
    Task(String),
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Calls running longer than this fail with [`DaError::DeadlineExceeded`].
    pub request_timeout: Option<Duration>,
    /// Maximum accepted request body size in bytes.
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            request_timeout: None,
            // Room for a maximum size blob after base64 expansion.
            max_body_size: 16 * 1024 * 1024,
        }
    }
}

#[derive(Clone)]
struct ServerState {
    da: Arc<dyn DataAvailability>,
    gate: Arc<dyn AuthGate>,
    config: ServerConfig,
}

/// Serves a [`DataAvailability`] implementation as the `da` JSON-RPC service.
pub struct DaServer {
    state: ServerState,
}

impl DaServer {
    /// Create a server for `da` with authorization disabled.
    pub fn new(da: Arc<dyn DataAvailability>) -> Self {
        Self {
            state: ServerState {
                da,
                gate: Arc::new(AuthDisabled),
                config: ServerConfig::default(),
            },
        }
    }

    /// Check callers' permissions with `gate`.
    pub fn with_auth(mut self, gate: Arc<dyn AuthGate>) -> Self {
        self.state.gate = gate;
        self
    }

    pub fn with_config(mut self, config: ServerConfig) -> Self {
        self.state.config = config;
        self
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> Router {
        Router::new()
            .route("/", post(handle_rpc))
            .layer(DefaultBodyLimit::max(self.state.config.max_body_size))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Bind `addr` and serve in a background task.
    pub async fn start(self, addr: SocketAddr) -> Result<ServerHandle, ServerError> {
        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;
        let router = self.router();

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let join = tokio::spawn(async move {
            let server = axum::serve(listener, router).with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            });
            if let Err(e) = server.await {
                warn!("DA server error: {}", e);
            }
        });

        info!("DA server listening on {}", local_addr);

        Ok(ServerHandle {
            local_addr,
            shutdown: shutdown_tx,
            join,
        })
    }
}

/// Handle to a running server. Dropping it also shuts the server down.
pub struct ServerHandle {
    local_addr: SocketAddr,
    shutdown: oneshot::Sender<()>,
    join: JoinHandle<()>,
}

impl ServerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Base URL for clients.
    pub fn url(&self) -> String {
        format!("http://{}", self.local_addr)
    }

    /// Stop accepting connections and wait for in-flight requests.
    pub async fn stop(self) -> Result<(), ServerError> {
        let _ = self.shutdown.send(());
        self.join
            .await
            .map_err(|e| ServerError::Task(e.to_string()))?;
        info!("DA server stopped");
        Ok(())
    }
}

// Handlers

async fn handle_rpc(
    State(state): State<ServerState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let permissions = match state.gate.permissions(bearer_token(&headers)) {
        Ok(permissions) => permissions,
        Err(e) => {
            warn!("Rejected request: {}", e);
            let error = JsonRpcError::new(UNAUTHORIZED, e.to_string());
            return (
                StatusCode::UNAUTHORIZED,
                Json(JsonRpcResponse::<Value>::failure(Value::Null, error)),
            )
                .into_response();
        }
    };

    let request: RawRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            let error = JsonRpcError::new(PARSE_ERROR, format!("parse error: {}", e));
            return rpc_failure(Value::Null, error);
        }
    };

    let id = request.id.clone();
    let outcome = process(&state, &permissions, request).await;

    // Notifications are executed but never answered.
    let Some(id) = id else {
        return StatusCode::NO_CONTENT.into_response();
    };

    match outcome {
        Ok(result) => Json(JsonRpcResponse::success(id, result)).into_response(),
        Err(error) => rpc_failure(id, error),
    }
}

async fn process(
    state: &ServerState,
    permissions: &[Permission],
    request: RawRequest,
) -> Result<Value, JsonRpcError> {
    if request.jsonrpc != JSONRPC_VERSION {
        return Err(JsonRpcError::new(
            INVALID_REQUEST,
            format!("unsupported jsonrpc version: {}", request.jsonrpc),
        ));
    }

    let Some(method) = Method::from_name(&request.method) else {
        return Err(JsonRpcError::new(
            METHOD_NOT_FOUND,
            format!("method '{}' not found", request.method),
        ));
    };

    let needed = required_permission(method);
    if !permissions.contains(&needed) {
        return Err(JsonRpcError::new(
            PERMISSION_DENIED,
            format!(
                "missing permission to invoke '{}' (need '{}')",
                method.name(),
                needed
            ),
        ));
    }

    debug!("Dispatching {}", method.name());

    let call = dispatch(state.da.as_ref(), method, request.params);
    match state.config.request_timeout {
        Some(timeout) => tokio::time::timeout(timeout, call)
            .await
            .unwrap_or_else(|_| Err(da_error(DaError::DeadlineExceeded))),
        None => call.await,
    }
}

async fn dispatch(
    da: &dyn DataAvailability,
    method: Method,
    params: Value,
) -> Result<Value, JsonRpcError> {
    match method {
        Method::MaxBlobSize => {
            let max_blob_size = da.max_blob_size().await.map_err(da_error)?;
            to_result(MaxBlobSizeResponse { max_blob_size })
        }
        Method::Get => {
            let request: GetRequest = parse_params(params)?;
            let blobs = da.get(&request.ids).await.map_err(da_error)?;
            to_result(GetResponse { blobs })
        }
        Method::GetIds => {
            let request: GetIdsRequest = parse_params(params)?;
            let ids = da.get_ids(request.height).await.map_err(da_error)?;
            to_result(GetIdsResponse { ids })
        }
        Method::Commit => {
            let request: CommitRequest = parse_params(params)?;
            let commitments = da.commit(&request.blobs).await.map_err(da_error)?;
            to_result(CommitResponse { commitments })
        }
        Method::Submit => {
            let request: SubmitRequest = parse_params(params)?;
            let options = request.options.map(SubmitOptions::from);
            let result = da
                .submit(&request.blobs, options.as_ref())
                .await
                .map_err(da_error)?;
            to_result(SubmitResponse {
                ids: result.ids,
                proofs: result.proofs,
            })
        }
        Method::Validate => {
            let request: ValidateRequest = parse_params(params)?;
            let results = da
                .validate(&request.ids, &request.proofs)
                .await
                .map_err(da_error)?;
            to_result(ValidateResponse { results })
        }
    }
}

// Helper functions

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

fn parse_params<T: DeserializeOwned>(params: Value) -> Result<T, JsonRpcError> {
    serde_json::from_value(params)
        .map_err(|e| JsonRpcError::new(INVALID_PARAMS, format!("invalid params: {}", e)))
}

fn to_result<T: Serialize>(value: T) -> Result<Value, JsonRpcError> {
    serde_json::to_value(value).map_err(|e| JsonRpcError::new(SERVER_ERROR, e.to_string()))
}

fn da_error(err: DaError) -> JsonRpcError {
    debug!("Call failed: {}", err);
    JsonRpcError::from_da_error(&err)
}

fn rpc_failure(id: Value, error: JsonRpcError) -> Response {
    Json(JsonRpcResponse::<Value>::failure(id, error)).into_response()
}
