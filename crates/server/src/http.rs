//! HTTP Endpoints
//!
//! Chat page, sockets, health/stats, metrics and outbound call placement.

use std::path::Path;
use std::time::Duration;

use axum::{
    extract::{Json, State},
    http::{HeaderValue, Method, StatusCode},
    response::Html,
    routing::{get, post},
    Extension, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use care_agent_config::Settings;
use care_agent_telephony::CallRequest;

use crate::auth::auth_middleware;
use crate::call_bridge::call_ws_handler;
use crate::metrics::metrics_handler;
use crate::session::SessionKind;
use crate::state::AppState;
use crate::websocket::chat_ws_handler;
use crate::ServerError;

const FALLBACK_PAGE: &str = r#"<html>
    <head><title>Care Check-in Chat</title></head>
    <body>
        <h1>Care Check-in Chat</h1>
        <p>The chat page (index.html) was not found in the static directory.</p>
    </body>
</html>
"#;

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let config = state.config.clone();
    let cors_layer = build_cors_layer(&config.server.cors_origins, config.server.cors_enabled);

    Router::new()
        .route("/", get(index))
        // Web chat and voice bridge sockets
        .route("/ws", get(chat_ws_handler))
        .route("/call/ws", get(call_ws_handler))
        // Outbound calls
        .route("/api/calls", post(place_call))
        // Health and stats
        .route("/health", get(health_check))
        .route("/stats", get(stats))
        .route("/metrics", get(metrics_handler))
        .nest_service("/static", ServeDir::new(&config.server.static_dir))
        .layer(axum::middleware::from_fn(auth_middleware))
        .layer(Extension(config.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(config.server.timeout_seconds)))
        .layer(cors_layer)
        .with_state(state)
}

/// Build CORS layer from configured origins
///
/// - If cors_enabled is false, returns permissive layer (for dev)
/// - If cors_origins is empty or all invalid, allows only the local chat page
fn build_cors_layer(origins: &[String], enabled: bool) -> CorsLayer {
    if !enabled {
        tracing::warn!("CORS is disabled - allowing all origins");
        return CorsLayer::permissive();
    }

    let parsed_origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| {
            origin.parse::<HeaderValue>().ok().or_else(|| {
                tracing::warn!("Invalid CORS origin: {}", origin);
                None
            })
        })
        .collect();

    if parsed_origins.is_empty() {
        tracing::info!("No usable CORS origins configured, defaulting to localhost:8000");
        return CorsLayer::new()
            .allow_origin(HeaderValue::from_static("http://localhost:8000"))
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(Any);
    }

    tracing::info!("CORS configured with {} origins", parsed_origins.len());
    CorsLayer::new()
        .allow_origin(parsed_origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
}

/// `GET /`: the chat page, or a fallback when it is missing
async fn index(State(state): State<AppState>) -> Html<String> {
    let path = Path::new(&state.config.server.static_dir).join("index.html");
    match tokio::fs::read_to_string(&path).await {
        Ok(page) => Html(page),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Chat page not found");
            Html(FALLBACK_PAGE.to_string())
        },
    }
}

async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "active_sessions": state.sessions.count(),
        "message": "Care agent server is running",
        "version": env!("CARGO_PKG_VERSION"),
        "call_dispatch": state.dispatcher.is_some(),
    }))
}

async fn stats(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "active_sessions": state.sessions.count(),
        "session_ids": state.sessions.list(),
        "chat_sessions": state.sessions.count_kind(SessionKind::Chat),
        "call_sessions": state.sessions.count_kind(SessionKind::Call),
        "max_sessions": state.sessions.max_sessions(),
    }))
}

/// Body of `POST /api/calls`
#[derive(Debug, Deserialize)]
pub struct PlaceCallBody {
    pub phone_number: String,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub lang_pref: Option<String>,
    #[serde(default)]
    pub person_id: Option<String>,
}

impl PlaceCallBody {
    /// Fill the gaps from settings and reject values unsafe for metadata
    pub fn into_request(self, config: &Settings) -> Result<CallRequest, ServerError> {
        let mut request = CallRequest::new(self.phone_number.trim())
            .with_lang_pref(
                self.lang_pref
                    .unwrap_or_else(|| config.agent.default_lang_pref.clone()),
            )
            .with_person_id(
                self.person_id
                    .unwrap_or_else(|| config.dispatch.default_person_id.clone()),
            );
        if let Some(reason) = self.reason {
            request = request.with_reason(reason);
        }
        request.validate()?;
        Ok(request)
    }
}

#[derive(Debug, Serialize)]
pub struct PlaceCallResponse {
    pub dispatch_id: String,
    pub participant_id: String,
    pub sip_call_id: String,
    pub room: String,
    pub metadata: String,
}

/// `POST /api/calls`
async fn place_call(
    State(state): State<AppState>,
    Json(body): Json<PlaceCallBody>,
) -> Result<(StatusCode, Json<PlaceCallResponse>), ServerError> {
    let request = body.into_request(&state.config)?;

    let placer = state
        .dispatcher
        .clone()
        .ok_or_else(|| ServerError::Internal("call dispatch is not available".to_string()))?;

    let placed = placer.place_call(&request).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(PlaceCallResponse {
            dispatch_id: placed.dispatch.id,
            participant_id: placed.participant.participant_id,
            sip_call_id: placed.participant.sip_call_id,
            room: placed.participant.room_name,
            metadata: placed.metadata,
        }),
    ))
}
