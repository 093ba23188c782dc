//! Prometheus metrics
//!
//! The recorder is installed once at startup; handlers and the agent crates
//! emit through the `metrics` macros.

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::session::SessionKind;
use crate::state::AppState;
use crate::ServerError;

/// Install the global Prometheus recorder
pub fn init_metrics() -> Result<PrometheusHandle, ServerError> {
    PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| ServerError::Internal(format!("Failed to install metrics recorder: {}", e)))
}

/// `GET /metrics`
pub async fn metrics_handler(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => (StatusCode::NOT_FOUND, "metrics disabled").into_response(),
    }
}

pub fn record_session_opened(kind: SessionKind, active: usize) {
    metrics::counter!("care_sessions_total", "kind" => kind.as_str()).increment(1);
    metrics::gauge!("care_active_sessions").set(active as f64);
}

pub fn record_session_closed(kind: SessionKind, active: usize, duration_secs: f64) {
    metrics::histogram!("care_session_duration_seconds", "kind" => kind.as_str())
        .record(duration_secs);
    metrics::gauge!("care_active_sessions").set(active as f64);
}

/// Inbound socket frame, `outcome` is "ok" or "invalid"
pub fn record_message(kind: SessionKind, outcome: &'static str) {
    metrics::counter!(
        "care_socket_messages_total",
        "kind" => kind.as_str(),
        "outcome" => outcome
    )
    .increment(1);
}
