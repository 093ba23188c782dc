//! Core traits and types for the care check-in agent
//!
//! This crate provides foundational types used across all other crates:
//! - Call metadata parsing (the `key=value;...` dispatch string)
//! - Language definitions (English / Spanish) and the switch rule
//! - Conversation turns and bounded history
//! - Escalation and concern events
//! - The voice channel capability trait consumed by the policies
//! - Error types

pub mod conversation;
pub mod error;
pub mod events;
pub mod language;
pub mod metadata;
pub mod traits;

pub use conversation::{ConversationHistory, Turn, TurnRole, DEFAULT_HISTORY_LIMIT};
pub use error::{Error, Result};
pub use events::{CareEvent, CareEventKind, ConcernKind, EscalationReason};
pub use language::{Language, LanguagePreference};
pub use metadata::{parse_metadata, CallMetadata};
pub use traits::{RecognizerBackend, VoiceChannel};
