//! Voice channel capability

use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Which speech recognizer the channel should listen with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RecognizerBackend {
    /// Default recognizer, used for English
    #[default]
    Primary,
    /// Multilingual recognizer, switched to for Spanish
    Fallback,
}

impl RecognizerBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Fallback => "fallback",
        }
    }
}

impl std::fmt::Display for RecognizerBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output side of a live voice session
///
/// Callers await each method in turn, so commands reach the media layer in
/// the order they were issued.
///
/// # Example
///
/// ```ignore
/// voice.speak("Hello, this is your check-in call.").await?;
/// voice.generate_reply().await?;
/// ```
#[async_trait]
pub trait VoiceChannel: Send + Sync {
    /// Speak a fixed line verbatim
    async fn speak(&self, text: &str) -> Result<()>;

    /// Switch the speech recognizer for the rest of the session
    async fn set_recognizer(&self, backend: RecognizerBackend) -> Result<()>;

    /// Let the underlying language model produce the next reply
    async fn generate_reply(&self) -> Result<()>;
}
