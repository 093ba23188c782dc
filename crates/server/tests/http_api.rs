//! Router-level tests driven through `tower::ServiceExt::oneshot`.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use parking_lot::Mutex;
use serde_json::Value;
use tower::ServiceExt;

use care_agent_config::{RuntimeEnvironment, Settings};
use care_agent_server::{create_router, AppState, SessionKind};
use care_agent_telephony::{
    AgentDispatch, CallPlacer, CallRequest, DispatchError, PlacedCall, SipParticipant,
};

enum Outcome {
    Placed,
    BadTrunk,
    Upstream,
}

struct FakePlacer {
    outcome: Outcome,
    requests: Mutex<Vec<CallRequest>>,
}

impl FakePlacer {
    fn new(outcome: Outcome) -> Arc<Self> {
        Arc::new(Self {
            outcome,
            requests: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl CallPlacer for FakePlacer {
    async fn place_call(&self, request: &CallRequest) -> Result<PlacedCall, DispatchError> {
        self.requests.lock().push(request.clone());
        match self.outcome {
            Outcome::Placed => Ok(PlacedCall {
                dispatch: AgentDispatch {
                    id: "AD_1".to_string(),
                    ..AgentDispatch::default()
                },
                participant: SipParticipant {
                    participant_id: "PA_1".to_string(),
                    sip_call_id: "SCL_1".to_string(),
                    room_name: "care-room".to_string(),
                    ..SipParticipant::default()
                },
                metadata: request.metadata().to_wire(),
            }),
            Outcome::BadTrunk => Err(DispatchError::InvalidTrunk("<unset>".to_string())),
            Outcome::Upstream => Err(DispatchError::Api("HTTP 503: unavailable".to_string())),
        }
    }
}

fn settings_with_static(dir: &std::path::Path) -> Settings {
    let mut settings = Settings::default();
    settings.server.static_dir = dir.display().to_string();
    settings
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn post_call(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/calls")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn production_settings(api_key: Option<&str>) -> Settings {
    let mut settings = Settings::default();
    settings.environment = RuntimeEnvironment::Production;
    settings.server.auth.api_key = api_key.map(str::to_string);
    settings
}

fn with_bearer(mut request: Request<Body>, key: &str) -> Request<Body> {
    request.headers_mut().insert(
        "authorization",
        format!("Bearer {}", key).parse().unwrap(),
    );
    request
}

#[tokio::test]
async fn health_reports_active_sessions() {
    let state = AppState::new(Settings::default());
    let _guard = state.sessions.register(SessionKind::Chat).unwrap();
    let app = create_router(state);

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["active_sessions"], 1);
    assert!(json["message"].is_string());
}

#[tokio::test]
async fn stats_lists_session_ids() {
    let state = AppState::new(Settings::default());
    let guard = state.sessions.register(SessionKind::Call).unwrap();
    let app = create_router(state);

    let response = app
        .oneshot(Request::builder().uri("/stats").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let json = body_json(response).await;
    assert_eq!(json["active_sessions"], 1);
    assert_eq!(json["session_ids"][0], guard.id());
}

#[tokio::test]
async fn index_serves_page_or_fallback() {
    let dir = tempfile::tempdir().unwrap();
    let app = create_router(AppState::new(settings_with_static(dir.path())));
    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert!(String::from_utf8_lossy(&bytes).contains("Care Check-in Chat"));

    std::fs::write(dir.path().join("index.html"), "<h1>hello grandma</h1>").unwrap();
    let app = create_router(AppState::new(settings_with_static(dir.path())));
    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"<h1>hello grandma</h1>");
}

#[tokio::test]
async fn place_call_accepted() {
    let placer = FakePlacer::new(Outcome::Placed);
    let state = AppState::new(Settings::default()).with_dispatcher(placer.clone());
    let app = create_router(state);

    let response = app
        .oneshot(post_call(
            r#"{"phone_number":"+15550100","reason":"medication","lang_pref":"es"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let json = body_json(response).await;
    assert_eq!(json["dispatch_id"], "AD_1");
    assert_eq!(json["sip_call_id"], "SCL_1");

    let requests = placer.requests.lock();
    assert_eq!(requests[0].reason, "medication");
    assert_eq!(requests[0].lang_pref, "es");
}

#[tokio::test]
async fn place_call_invalid_trunk_is_bad_request() {
    let state =
        AppState::new(Settings::default()).with_dispatcher(FakePlacer::new(Outcome::BadTrunk));
    let response = create_router(state)
        .oneshot(post_call(r#"{"phone_number":"+15550100"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(response).await["error"].is_string());
}

#[tokio::test]
async fn place_call_upstream_failure_is_bad_gateway() {
    let state =
        AppState::new(Settings::default()).with_dispatcher(FakePlacer::new(Outcome::Upstream));
    let response = create_router(state)
        .oneshot(post_call(r#"{"phone_number":"+15550100"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn place_call_requires_phone_number() {
    let placer = FakePlacer::new(Outcome::Placed);
    let state = AppState::new(Settings::default()).with_dispatcher(placer.clone());
    let response = create_router(state)
        .oneshot(post_call(r#"{"phone_number":"  "}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(placer.requests.lock().is_empty());
}

#[tokio::test]
async fn place_call_rejects_metadata_injection() {
    let placer = FakePlacer::new(Outcome::Placed);
    let state = AppState::new(Settings::default()).with_dispatcher(placer.clone());
    let response = create_router(state)
        .oneshot(post_call(
            r#"{"phone_number":"+15550100","reason":"weather;langPref=es;personId=other"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(response).await["error"]
        .as_str()
        .is_some_and(|e| e.contains("reason")));
    assert!(placer.requests.lock().is_empty());
}

#[tokio::test]
async fn production_place_call_requires_api_key() {
    let placer = FakePlacer::new(Outcome::Placed);
    let state =
        AppState::new(production_settings(Some("server-key"))).with_dispatcher(placer.clone());
    let app = create_router(state);

    let response = app
        .clone()
        .oneshot(post_call(r#"{"phone_number":"+15550100"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(with_bearer(post_call(r#"{"phone_number":"+15550100"}"#), "wrong"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(placer.requests.lock().is_empty());

    let response = app
        .oneshot(with_bearer(
            post_call(r#"{"phone_number":"+15550100"}"#),
            "server-key",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert_eq!(placer.requests.lock().len(), 1);
}

#[tokio::test]
async fn production_without_api_key_fails_closed() {
    let placer = FakePlacer::new(Outcome::Placed);
    let state = AppState::new(production_settings(None)).with_dispatcher(placer.clone());
    let response = create_router(state)
        .oneshot(post_call(r#"{"phone_number":"+15550100"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(placer.requests.lock().is_empty());
}

#[tokio::test]
async fn enabled_auth_protects_voice_bridge_but_not_health() {
    let mut settings = Settings::default();
    settings.server.auth.enabled = true;
    settings.server.auth.api_key = Some("server-key".to_string());
    let app = create_router(AppState::new(settings));

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/call/ws").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/stats").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/call/ws")
                .header("authorization", "Token server-key")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
