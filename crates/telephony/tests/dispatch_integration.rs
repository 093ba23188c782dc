//! Dispatcher against a stub media server running on a local port.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::{json, Value};

use care_agent_config::DispatchConfig;
use care_agent_core::CallMetadata;
use care_agent_telephony::client::{CREATE_DISPATCH_PATH, CREATE_SIP_PARTICIPANT_PATH};
use care_agent_telephony::{CallDispatcher, CallRequest, DispatchError};

#[derive(Default)]
struct Recorded {
    calls: Mutex<Vec<(String, Value, Option<String>)>>,
    fail_sip: bool,
}

fn record(state: &Recorded, path: &str, headers: &HeaderMap, body: Value) {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    state.calls.lock().push((path.to_string(), body, auth));
}

async fn create_dispatch(
    State(state): State<Arc<Recorded>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    record(&state, "dispatch", &headers, body);
    Json(json!({"id": "AD_123", "agent_name": "Agent care", "room": "care-room"}))
}

async fn create_sip_participant(
    State(state): State<Arc<Recorded>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<Json<Value>, (StatusCode, String)> {
    record(&state, "sip", &headers, body);
    if state.fail_sip {
        return Err((StatusCode::INTERNAL_SERVER_ERROR, "trunk busy".to_string()));
    }
    Ok(Json(json!({
        "participant_id": "PA_1",
        "participant_identity": "callee_grandma-001",
        "room_name": "care-room",
        "sip_call_id": "SCL_9"
    })))
}

async fn start_stub(fail_sip: bool) -> (String, Arc<Recorded>) {
    let state = Arc::new(Recorded {
        fail_sip,
        ..Recorded::default()
    });
    let app = Router::new()
        .route(CREATE_DISPATCH_PATH, post(create_dispatch))
        .route(CREATE_SIP_PARTICIPANT_PATH, post(create_sip_participant))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("ws://{}", addr), state)
}

fn config(url: String) -> DispatchConfig {
    DispatchConfig {
        livekit_url: url,
        api_key: "APIkey".to_string(),
        api_secret: "secret".to_string(),
        room_name: "care-room".to_string(),
        agent_name: "Agent care".to_string(),
        sip_trunk_id: Some("ST_trunk".to_string()),
        ..DispatchConfig::default()
    }
}

#[tokio::test]
async fn places_dispatch_then_sip_participant() {
    let (url, state) = start_stub(false).await;
    let dispatcher = CallDispatcher::new(config(url)).unwrap();

    let request = CallRequest::new("+15550100").with_reason("medication");
    let placed = dispatcher.place_call(&request).await.unwrap();

    assert_eq!(placed.dispatch.id, "AD_123");
    assert_eq!(placed.participant.sip_call_id, "SCL_9");

    let calls = state.calls.lock();
    assert_eq!(calls.len(), 2);

    let (first, dispatch_body, auth) = &calls[0];
    assert_eq!(first, "dispatch");
    assert_eq!(dispatch_body["agent_name"], "Agent care");
    assert_eq!(dispatch_body["room"], "care-room");
    assert!(auth.as_deref().is_some_and(|a| a.starts_with("Bearer ")));

    let metadata = CallMetadata::parse(dispatch_body["metadata"].as_str().unwrap());
    assert_eq!(metadata.phone(), Some("+15550100"));
    assert_eq!(metadata.reason(), "medication");
    assert_eq!(metadata.person_id(), Some("grandma-001"));

    let (second, sip_body, _) = &calls[1];
    assert_eq!(second, "sip");
    assert_eq!(sip_body["sip_trunk_id"], "ST_trunk");
    assert_eq!(sip_body["sip_call_to"], "+15550100");
    assert_eq!(sip_body["room_name"], "care-room");
    assert_eq!(sip_body["participant_identity"], "callee_grandma-001");
}

#[tokio::test]
async fn sip_failure_is_reported_as_api_error() {
    let (url, state) = start_stub(true).await;
    let dispatcher = CallDispatcher::new(config(url)).unwrap();

    let err = dispatcher
        .place_call(&CallRequest::new("+15550100"))
        .await
        .unwrap_err();

    match &err {
        DispatchError::Api(message) => assert!(message.contains("trunk busy")),
        other => panic!("expected Api error, got {:?}", other),
    }
    assert!(err.is_upstream());
    // Dispatch was created, nothing retried
    assert_eq!(state.calls.lock().len(), 2);
}

#[tokio::test]
async fn invalid_trunk_never_reaches_the_server() {
    let (url, state) = start_stub(false).await;
    let mut config = config(url);
    config.sip_trunk_id = Some("trunk".to_string());
    let dispatcher = CallDispatcher::new(config).unwrap();

    let err = dispatcher
        .place_call(&CallRequest::new("+15550100"))
        .await
        .unwrap_err();
    assert!(matches!(err, DispatchError::InvalidTrunk(_)));
    assert!(state.calls.lock().is_empty());
}

#[tokio::test]
async fn metadata_injection_never_reaches_the_server() {
    let (url, state) = start_stub(false).await;
    let dispatcher = CallDispatcher::new(config(url)).unwrap();

    let request = CallRequest::new("+15550100").with_person_id("grandma-001;reason=other");
    let err = dispatcher.place_call(&request).await.unwrap_err();
    assert!(matches!(err, DispatchError::InvalidRequest(_)));
    assert!(state.calls.lock().is_empty());
}
