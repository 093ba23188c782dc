//! Care check-in conversation policies
//!
//! Features:
//! - Telephony policy (`CareAgent`): opening line by reason and language,
//!   Spanish switch with recognizer fallback, help escalation, concern flags
//! - Web-chat policy (`ChatAgent`): distress acknowledgment and canned
//!   medication / well-being replies behind a `ReplyStrategy`
//! - Escalation reporting seam with a tracing + metrics reporter
//! - Channel-backed `VoiceChannel` and a stream-driven call session

pub mod call_session;
pub mod care_agent;
pub mod chat_agent;
pub mod escalation;
pub mod replies;
pub mod voice_channel;

pub use call_session::{CallInput, CallSession, CallStep};
pub use care_agent::{escalation_line, opening_line, CareAgent, TurnOutcome};
pub use chat_agent::ChatAgent;
pub use escalation::{EscalationReporter, TracingReporter};
pub use replies::{ReplyStrategy, RuleBasedReplies};
pub use voice_channel::{ChannelVoice, VoiceCommand};

use thiserror::Error;

/// Agent errors
#[derive(Error, Debug)]
pub enum AgentError {
    /// The voice channel rejected a command
    #[error(transparent)]
    Voice(#[from] care_agent_core::Error),

    #[error("Reply generation error: {0}")]
    Reply(String),
}
