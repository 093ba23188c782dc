//! Reply generation for the web-chat agent

use async_trait::async_trait;

use care_agent_core::ConversationHistory;

use crate::AgentError;

pub const MEDICATION_TAKEN_REPLY: &str =
    "That's wonderful! I'm so glad you took your medications. How are you feeling today?";
pub const MEDICATION_MISSED_REPLY: &str =
    "It's important to take your medications. Can you take them now? I'm here to support you.";
pub const FEELING_WELL_REPLY: &str = "OK, take care and I will call you back in a few hours.";
pub const FEELING_UNWELL_REPLY: &str = "I'm sorry to hear that. Would you like to tell me more about how you're feeling? I'm here to listen.";
pub const DEFAULT_REPLY: &str =
    "I understand. Is there anything specific I can help you with today? Take care of yourself.";

/// Produces the agent's reply to one chat message
///
/// `history` already contains the message being answered as its last entry.
#[async_trait]
pub trait ReplyStrategy: Send + Sync {
    async fn reply(&self, message: &str, history: &ConversationHistory) -> Result<String, AgentError>;

    /// Name for logging
    fn name(&self) -> &str;
}

/// Ordered substring rules, first match wins
static RULES: &[(&[&str], &str)] = &[
    (
        &["yes", "took", "taken", "already", "finished"],
        MEDICATION_TAKEN_REPLY,
    ),
    (
        &["no", "not", "haven't", "didn't", "forgot"],
        MEDICATION_MISSED_REPLY,
    ),
    (&["good", "fine", "well", "okay", "great"], FEELING_WELL_REPLY),
    (&["bad", "sick", "pain", "hurt", "tired"], FEELING_UNWELL_REPLY),
];

/// Canned medication and well-being replies
///
/// Matching is by lowercase substring, so "now" counts as "no" and
/// "know" does too.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleBasedReplies;

impl RuleBasedReplies {
    pub fn new() -> Self {
        Self
    }

    /// Pick the reply for a message
    pub fn select(message: &str) -> &'static str {
        let lowered = message.to_lowercase();
        RULES
            .iter()
            .find(|(words, _)| words.iter().any(|w| lowered.contains(w)))
            .map(|(_, reply)| *reply)
            .unwrap_or(DEFAULT_REPLY)
    }
}

#[async_trait]
impl ReplyStrategy for RuleBasedReplies {
    async fn reply(&self, message: &str, _history: &ConversationHistory) -> Result<String, AgentError> {
        Ok(Self::select(message).to_string())
    }

    fn name(&self) -> &str {
        "rule_based"
    }
}
