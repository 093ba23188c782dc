//! Chat WebSocket Handler
//!
//! `GET /ws`: one [`ChatAgent`] per connection. The greeting goes out on
//! connect and after every reset. A frame that is not valid JSON, or does
//! not fit the protocol, gets an error frame and the connection stays open.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Response;
use futures::{Sink, SinkExt, StreamExt};
use serde::{Deserialize, Serialize};

use care_agent_agent::{ChatAgent, RuleBasedReplies};

use crate::session::{SessionGuard, SessionKind};
use crate::state::AppState;
use crate::ServerError;

pub const INVALID_MESSAGE_FORMAT: &str = "Invalid message format";

/// Client to server
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatInbound {
    UserMessage { message: String },
    ResetConversation,
}

/// Server to client
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatOutbound {
    AgentResponse { message: String, language: String },
    Error { message: String },
}

impl ChatOutbound {
    pub fn error(message: impl Into<String>) -> Self {
        ChatOutbound::Error {
            message: message.into(),
        }
    }
}

/// Protocol state of one chat connection, independent of the socket
pub struct ChatConnection {
    session_id: String,
    agent: ChatAgent,
}

impl ChatConnection {
    pub fn new(session_id: impl Into<String>, agent: ChatAgent) -> Self {
        Self {
            session_id: session_id.into(),
            agent,
        }
    }

    pub fn greeting(&self) -> ChatOutbound {
        self.response(self.agent.get_greeting().to_string())
    }

    /// Answer one raw text frame
    pub async fn handle_text(&mut self, raw: &str) -> ChatOutbound {
        let inbound = match serde_json::from_str::<ChatInbound>(raw) {
            Ok(inbound) => inbound,
            Err(e) => {
                tracing::error!(session_id = %self.session_id, error = %e, "Invalid JSON received from client");
                crate::metrics::record_message(SessionKind::Chat, "invalid");
                return ChatOutbound::error(INVALID_MESSAGE_FORMAT);
            },
        };
        crate::metrics::record_message(SessionKind::Chat, "ok");

        match inbound {
            ChatInbound::UserMessage { message } => {
                tracing::info!(
                    session_id = %self.session_id,
                    preview = %message.chars().take(50).collect::<String>(),
                    "Received user message"
                );
                let reply = self.agent.process_message(&message).await;
                self.response(reply)
            },
            ChatInbound::ResetConversation => {
                self.agent.reset_conversation();
                tracing::info!(session_id = %self.session_id, "Reset conversation");
                self.greeting()
            },
        }
    }

    /// Binary frames are outside the chat protocol
    pub fn handle_binary(&self) -> ChatOutbound {
        tracing::warn!(session_id = %self.session_id, "Binary frame received on chat socket");
        crate::metrics::record_message(SessionKind::Chat, "invalid");
        ChatOutbound::error(INVALID_MESSAGE_FORMAT)
    }

    pub fn agent(&self) -> &ChatAgent {
        &self.agent
    }

    fn response(&self, message: String) -> ChatOutbound {
        ChatOutbound::AgentResponse {
            message,
            language: self.agent.language().code().to_string(),
        }
    }
}

/// Serialize a frame and send it as text
pub(crate) async fn send_json<S, T>(sink: &mut S, frame: &T) -> Result<(), ServerError>
where
    S: Sink<Message, Error = axum::Error> + Unpin,
    T: Serialize,
{
    let json = serde_json::to_string(frame).map_err(|e| ServerError::Internal(e.to_string()))?;
    sink.send(Message::Text(json))
        .await
        .map_err(|e| ServerError::WebSocket(e.to_string()))
}

/// `GET /ws`
pub async fn chat_ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> Result<Response, StatusCode> {
    let guard = state.sessions.register(SessionKind::Chat)?;
    Ok(ws.on_upgrade(move |socket| handle_chat_socket(socket, state, guard)))
}

async fn handle_chat_socket(socket: WebSocket, state: AppState, guard: SessionGuard) {
    let agent = ChatAgent::with_strategy(
        Arc::new(RuleBasedReplies::new()),
        state.config.agent.history_limit,
    );
    let mut connection = ChatConnection::new(guard.id(), agent);
    let (mut sender, mut receiver) = socket.split();

    if let Err(e) = send_json(&mut sender, &connection.greeting()).await {
        tracing::warn!(session_id = %guard.id(), error = %e, "Failed to send greeting");
        return;
    }

    while let Some(msg) = receiver.next().await {
        let reply = match msg {
            Ok(Message::Text(text)) => connection.handle_text(&text).await,
            Ok(Message::Binary(_)) => connection.handle_binary(),
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(e) => {
                tracing::error!(session_id = %guard.id(), error = %e, "WebSocket error");
                break;
            },
        };
        if let Err(e) = send_json(&mut sender, &reply).await {
            tracing::warn!(session_id = %guard.id(), error = %e, "Failed to send reply");
            break;
        }
    }

    tracing::info!(
        session_id = %guard.id(),
        turns = connection.agent().history().len(),
        "WebSocket disconnected"
    );
}
