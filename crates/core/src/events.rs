//! Escalation and concern events
//!
//! Events are ephemeral: they are handed to a reporter the moment they are
//! raised and are not stored anywhere by this crate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Why a call was escalated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscalationReason {
    /// A help / emergency / fall keyword was heard
    HelpKeywordDetected,
}

impl EscalationReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HelpKeywordDetected => "help_keyword_detected",
        }
    }
}

/// Advisory, non-escalating signals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConcernKind {
    NegativeMood,
    CoughLikeEvent,
}

impl ConcernKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NegativeMood => "negative_mood",
            Self::CoughLikeEvent => "cough_like_event",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum CareEventKind {
    Escalation(EscalationReason),
    Concern(ConcernKind),
}

impl CareEventKind {
    /// `help_keyword_detected`, `negative_mood`, ...
    pub fn label(&self) -> &'static str {
        match self {
            Self::Escalation(reason) => reason.as_str(),
            Self::Concern(kind) => kind.as_str(),
        }
    }

    pub fn is_escalation(&self) -> bool {
        matches!(self, Self::Escalation(_))
    }
}

/// An escalation or concern raised on one utterance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CareEvent {
    pub kind: CareEventKind,
    /// The utterance that triggered the event, verbatim
    pub last_heard: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub person_id: Option<String>,
}

impl CareEvent {
    pub fn new(kind: CareEventKind, last_heard: impl Into<String>) -> Self {
        Self {
            kind,
            last_heard: last_heard.into(),
            timestamp: Utc::now(),
            session_id: None,
            person_id: None,
        }
    }

    pub fn escalation(reason: EscalationReason, last_heard: impl Into<String>) -> Self {
        Self::new(CareEventKind::Escalation(reason), last_heard)
    }

    pub fn concern(kind: ConcernKind, last_heard: impl Into<String>) -> Self {
        Self::new(CareEventKind::Concern(kind), last_heard)
    }

    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_person_id(mut self, person_id: Option<&str>) -> Self {
        self.person_id = person_id.map(str::to_string);
        self
    }
}
