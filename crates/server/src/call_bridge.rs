//! Voice bridge socket
//!
//! `GET /call/ws` is opened by the media worker for each phone call. It
//! forwards the session start and final transcripts, and receives the voice
//! commands the [`CareAgent`] issues (speak, switch recognizer, let the LLM
//! reply). The first frame on every socket is `session_config`, carrying the
//! reply model, the starting recognizer and the synthesis voice. Inputs are
//! handled strictly in order by one [`CallSession`] task.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Response;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, Mutex};
use tokio_stream::wrappers::ReceiverStream;

use care_agent_agent::{CallInput, CallSession, CareAgent, ChannelVoice, VoiceCommand};
use care_agent_config::{AgentConfig, TtsConfig};
use care_agent_core::RecognizerBackend;

use crate::session::{SessionGuard, SessionKind};
use crate::state::AppState;
use crate::websocket::{send_json, INVALID_MESSAGE_FORMAT};

const COMMAND_BUFFER: usize = 64;
const INPUT_BUFFER: usize = 32;

/// Media worker to server
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BridgeInbound {
    SessionStart {
        #[serde(default)]
        metadata: String,
    },
    Transcript {
        text: String,
    },
}

impl From<BridgeInbound> for CallInput {
    fn from(inbound: BridgeInbound) -> Self {
        match inbound {
            BridgeInbound::SessionStart { metadata } => CallInput::Start { metadata },
            BridgeInbound::Transcript { text } => CallInput::Transcript { text },
        }
    }
}

/// Server to media worker
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BridgeOutbound {
    /// How the worker should set up the call's speech pipeline
    SessionConfig {
        llm_model: String,
        recognizer: String,
        tts: TtsConfig,
    },
    Speak {
        text: String,
    },
    SetRecognizer {
        backend: RecognizerBackend,
        /// Concrete recognizer the worker should load
        model: String,
    },
    GenerateReply,
    Error {
        message: String,
    },
}

impl BridgeOutbound {
    pub fn session_config(config: &AgentConfig) -> Self {
        BridgeOutbound::SessionConfig {
            llm_model: config.llm_model.clone(),
            recognizer: config
                .recognizer_model(RecognizerBackend::Primary)
                .to_string(),
            tts: config.tts.clone(),
        }
    }

    pub fn from_command(command: VoiceCommand, config: &AgentConfig) -> Self {
        match command {
            VoiceCommand::Speak { text } => BridgeOutbound::Speak { text },
            VoiceCommand::SetRecognizer { backend } => BridgeOutbound::SetRecognizer {
                backend,
                model: config.recognizer_model(backend).to_string(),
            },
            VoiceCommand::GenerateReply => BridgeOutbound::GenerateReply,
        }
    }
}

/// Parse one inbound frame
pub fn parse_inbound(raw: &str) -> Result<CallInput, serde_json::Error> {
    serde_json::from_str::<BridgeInbound>(raw).map(CallInput::from)
}

/// `GET /call/ws`
pub async fn call_ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> Result<Response, StatusCode> {
    let guard = state.sessions.register(SessionKind::Call)?;
    Ok(ws.on_upgrade(move |socket| handle_call_socket(socket, state, guard)))
}

async fn handle_call_socket(socket: WebSocket, state: AppState, guard: SessionGuard) {
    let (mut sender, mut receiver) = socket.split();

    let setup = BridgeOutbound::session_config(&state.config.agent);
    if let Err(e) = send_json(&mut sender, &setup).await {
        tracing::warn!(session_id = %guard.id(), error = %e, "Failed to send session config");
        return;
    }
    let sender = Arc::new(Mutex::new(sender));

    let (voice, mut commands) = ChannelVoice::channel(COMMAND_BUFFER);
    let agent = CareAgent::new(
        Arc::new(voice),
        state.reporter.clone(),
        state.config.agent.clone(),
    )
    .with_session_id(guard.id());

    let (input_tx, input_rx) = mpsc::channel::<CallInput>(INPUT_BUFFER);
    let session = tokio::spawn(CallSession::new(agent).run(ReceiverStream::new(input_rx)));

    // Voice commands go out in the order the agent issued them
    let forward_sender = sender.clone();
    let agent_config = state.config.agent.clone();
    let session_id = guard.id().to_string();
    let forwarder = tokio::spawn(async move {
        while let Some(command) = commands.recv().await {
            let frame = BridgeOutbound::from_command(command, &agent_config);
            let mut sink = forward_sender.lock().await;
            if let Err(e) = send_json(&mut *sink, &frame).await {
                tracing::warn!(session_id = %session_id, error = %e, "Failed to forward voice command");
                break;
            }
        }
    });

    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => match parse_inbound(&text) {
                Ok(input) => {
                    crate::metrics::record_message(SessionKind::Call, "ok");
                    if input_tx.send(input).await.is_err() {
                        break;
                    }
                },
                Err(e) => {
                    tracing::warn!(session_id = %guard.id(), error = %e, "Invalid bridge frame");
                    crate::metrics::record_message(SessionKind::Call, "invalid");
                    let mut sink = sender.lock().await;
                    let frame = BridgeOutbound::Error {
                        message: INVALID_MESSAGE_FORMAT.to_string(),
                    };
                    if send_json(&mut *sink, &frame).await.is_err() {
                        break;
                    }
                },
            },
            Ok(Message::Close(_)) => break,
            Ok(_) => {},
            Err(e) => {
                tracing::error!(session_id = %guard.id(), error = %e, "Bridge socket error");
                break;
            },
        }
    }

    drop(input_tx);
    match session.await {
        Ok(agent) => tracing::info!(
            session_id = %guard.id(),
            language = agent.language().code(),
            turns = agent.history().len(),
            "Call bridge closed"
        ),
        Err(e) => tracing::error!(session_id = %guard.id(), error = %e, "Call session task failed"),
    }
    // The agent (and its voice sender) is gone, so the forwarder drains and stops
    let _ = forwarder.await;
}
