//! Web-chat conversation policy
//!
//! English-only sibling of the telephony agent. Distress short-circuits to a
//! fixed acknowledgment; everything else goes to a [`ReplyStrategy`] and is
//! recorded in a bounded history.

use std::sync::Arc;

use care_agent_core::{ConversationHistory, Language, DEFAULT_HISTORY_LIMIT};
use care_agent_text_processing::is_distress;

use crate::replies::{ReplyStrategy, RuleBasedReplies};

pub const GREETING: &str = "Hi there! How are you feeling today? Did you take your medications?";
pub const DISTRESS_REPLY: &str = "I can hear that you might be going through something difficult. I'm here to listen and support you. Would you like to tell me more about how you're feeling?";
pub const APOLOGY_REPLY: &str = "Sorry, I had a small hiccup there. Could you repeat what you said?";

/// One chat conversation
pub struct ChatAgent {
    replies: Arc<dyn ReplyStrategy>,
    history: ConversationHistory,
    language: Language,
}

impl ChatAgent {
    /// Rule-based replies, default history bound
    pub fn new() -> Self {
        Self::with_strategy(Arc::new(RuleBasedReplies::new()), DEFAULT_HISTORY_LIMIT)
    }

    pub fn with_strategy(replies: Arc<dyn ReplyStrategy>, history_limit: usize) -> Self {
        Self {
            replies,
            history: ConversationHistory::with_limit(history_limit),
            language: Language::English,
        }
    }

    /// Answer one message. Never fails: reply errors become an apology.
    pub async fn process_message(&mut self, text: &str) -> String {
        if is_distress(text) {
            tracing::info!(message_len = text.len(), "Distress detected in chat message");
            return DISTRESS_REPLY.to_string();
        }

        self.history.push_user(text);

        let reply = match self.replies.reply(text, &self.history).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::error!(
                    strategy = self.replies.name(),
                    error = %e,
                    "Reply generation failed"
                );
                APOLOGY_REPLY.to_string()
            },
        };

        self.history.push_assistant(reply.as_str());
        tracing::debug!(history_len = self.history.len(), "Chat reply generated");
        reply
    }

    pub fn get_greeting(&self) -> &'static str {
        GREETING
    }

    pub fn reset_conversation(&mut self) {
        self.history.clear();
        self.language = Language::English;
        tracing::info!("Conversation reset");
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }
}

impl Default for ChatAgent {
    fn default() -> Self {
        Self::new()
    }
}
