//! API key authentication
//!
//! Bearer token check for outbound call placement and the voice bridge.
//! The chat page, its socket, health and metrics stay public by default.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::{
    extract::Request,
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use care_agent_config::Settings;

/// Warn once that auth is off
static AUTH_DISABLED_WARNED: AtomicBool = AtomicBool::new(false);

const BEARER_PREFIX: &str = "Bearer ";

/// What the middleware should do with a request
#[derive(Debug, PartialEq, Eq)]
enum AuthCheck {
    Disabled,
    PublicPath,
    ConfigError(&'static str),
    CheckKey(String),
}

fn check_auth_config(config: &Settings, path: &str) -> AuthCheck {
    let auth = &config.server.auth;

    if !auth.is_required(config.environment) {
        if !AUTH_DISABLED_WARNED.swap(true, Ordering::Relaxed) {
            tracing::warn!(
                "API authentication is disabled. Set CARE_AGENT__SERVER__AUTH__ENABLED=true \
                 to protect /api/calls and /call/ws."
            );
        }
        return AuthCheck::Disabled;
    }

    if auth.is_public(path) {
        return AuthCheck::PublicPath;
    }

    // Production without a key fails closed
    match &auth.api_key {
        Some(key) if !key.is_empty() => AuthCheck::CheckKey(key.clone()),
        _ => AuthCheck::ConfigError("Auth is required but no API key is configured"),
    }
}

/// Require `Authorization: Bearer <api_key>` on protected paths
///
/// Set the key via `CARE_AGENT__SERVER__AUTH__API_KEY`. Reads the
/// settings from the `Arc<Settings>` request extension.
pub async fn auth_middleware(request: Request, next: Next) -> Response {
    let config = match request.extensions().get::<Arc<Settings>>() {
        Some(cfg) => cfg.clone(),
        None => {
            tracing::error!("Config extension not found in request");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Server configuration error")
                .into_response();
        },
    };

    let check = check_auth_config(&config, request.uri().path());
    match check {
        AuthCheck::Disabled | AuthCheck::PublicPath => next.run(request).await,
        AuthCheck::ConfigError(msg) => {
            tracing::error!("{}", msg);
            (StatusCode::INTERNAL_SERVER_ERROR, "Server authentication not configured")
                .into_response()
        },
        AuthCheck::CheckKey(expected_key) => {
            let provided = request
                .headers()
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .map(|s| s.to_string());

            match provided {
                Some(value) => match value.strip_prefix(BEARER_PREFIX) {
                    Some(key) if constant_time_compare(key.as_bytes(), expected_key.as_bytes()) => {
                        next.run(request).await
                    },
                    Some(_) => {
                        tracing::warn!(
                            path = %request.uri().path(),
                            forwarded_for = ?request.headers().get("X-Forwarded-For"),
                            "Invalid API key"
                        );
                        metrics::counter!("care_auth_rejections_total", "reason" => "invalid_key")
                            .increment(1);
                        (StatusCode::UNAUTHORIZED, "Invalid API key").into_response()
                    },
                    None => (
                        StatusCode::BAD_REQUEST,
                        "Invalid Authorization header format. Expected: Bearer <token>",
                    )
                        .into_response(),
                },
                None => {
                    metrics::counter!("care_auth_rejections_total", "reason" => "missing_header")
                        .increment(1);
                    (StatusCode::UNAUTHORIZED, "Missing Authorization header").into_response()
                },
            }
        },
    }
}

/// Compare without short-circuiting on the first differing byte
fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}
