//! Care Agent Server
//!
//! HTTP and WebSocket endpoints: the web chat socket, the voice bridge used
//! by the media worker, outbound call placement, health/stats and metrics.

pub mod auth;
pub mod call_bridge;
pub mod http;
pub mod metrics;
pub mod session;
pub mod state;
pub mod websocket;

pub use auth::auth_middleware;
pub use call_bridge::{BridgeInbound, BridgeOutbound};
pub use http::create_router;
pub use crate::metrics::init_metrics;
pub use session::{SessionGuard, SessionInfo, SessionKind, SessionRegistry};
pub use state::AppState;
pub use websocket::{ChatConnection, ChatInbound, ChatOutbound};

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use care_agent_telephony::DispatchError;

/// Server errors
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Max sessions reached ({0})")]
    Capacity(usize),

    #[error("WebSocket error: {0}")]
    WebSocket(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServerError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServerError::Capacity(_) => StatusCode::SERVICE_UNAVAILABLE,
            ServerError::WebSocket(_) => StatusCode::BAD_REQUEST,
            ServerError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Dispatch(DispatchError::InvalidRequest(_))
            | ServerError::Dispatch(DispatchError::InvalidTrunk(_)) => StatusCode::BAD_REQUEST,
            ServerError::Dispatch(e) if e.is_upstream() => StatusCode::BAD_GATEWAY,
            ServerError::Dispatch(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ServerError> for StatusCode {
    fn from(err: ServerError) -> Self {
        err.status_code()
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, status = %status, "Request failed");
        }
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}
