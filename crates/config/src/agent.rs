//! Agent configuration
//!
//! Defaults fall back to the environment variables the voice worker has
//! always read (`DEFAULT_LANG_PREF`, `LLM_MODEL`, `RIME_*`), so an existing
//! `.env` keeps working without a config file.

use serde::{Deserialize, Serialize};

use care_agent_core::{LanguagePreference, RecognizerBackend, DEFAULT_HISTORY_LIMIT};

use crate::constants::models;

/// Agent configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Language preference used when call metadata carries no `langPref`
    /// (`auto`, `en` or `es`)
    #[serde(default = "default_lang_pref")]
    pub default_lang_pref: String,

    /// Conversation entries kept per session; validation pins it to 20
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Speech recognizers for the two backends
    #[serde(default)]
    pub recognizers: RecognizerConfig,

    /// Model the voice worker generates free-form replies with
    #[serde(default = "default_llm_model")]
    pub llm_model: String,

    /// Voice used for speech synthesis
    #[serde(default)]
    pub tts: TtsConfig,
}

fn default_lang_pref() -> String {
    std::env::var("DEFAULT_LANG_PREF").unwrap_or_else(|_| "auto".to_string())
}

fn default_history_limit() -> usize {
    DEFAULT_HISTORY_LIMIT
}

fn default_llm_model() -> String {
    std::env::var("LLM_MODEL").unwrap_or_else(|_| models::LLM_MODEL.to_string())
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            default_lang_pref: default_lang_pref(),
            history_limit: default_history_limit(),
            recognizers: RecognizerConfig::default(),
            llm_model: default_llm_model(),
            tts: TtsConfig::default(),
        }
    }
}

impl AgentConfig {
    /// Parsed default language preference. Unknown values mean `auto`.
    pub fn language_preference(&self) -> LanguagePreference {
        LanguagePreference::parse(&self.default_lang_pref)
    }

    /// Recognizer model name for a backend
    pub fn recognizer_model(&self, backend: RecognizerBackend) -> &str {
        match backend {
            RecognizerBackend::Primary => &self.recognizers.primary,
            RecognizerBackend::Fallback => &self.recognizers.fallback,
        }
    }
}

/// Recognizer selection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognizerConfig {
    /// Low-latency recognizer used from the start of every call
    #[serde(default = "default_primary_recognizer")]
    pub primary: String,

    /// Recognizer switched to once the caller speaks Spanish
    #[serde(default = "default_fallback_recognizer")]
    pub fallback: String,
}

fn default_primary_recognizer() -> String {
    models::PRIMARY_RECOGNIZER.to_string()
}

fn default_fallback_recognizer() -> String {
    models::FALLBACK_RECOGNIZER.to_string()
}

impl Default for RecognizerConfig {
    fn default() -> Self {
        Self {
            primary: default_primary_recognizer(),
            fallback: default_fallback_recognizer(),
        }
    }
}

/// Speech synthesis voice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TtsConfig {
    #[serde(default = "default_tts_model")]
    pub model: String,

    #[serde(default = "default_tts_speaker")]
    pub speaker: String,

    /// Speaking rate multiplier, slower than 1.0 for older listeners
    #[serde(default = "default_tts_speed")]
    pub speed: f32,
}

fn default_tts_model() -> String {
    std::env::var("RIME_MODEL").unwrap_or_else(|_| models::TTS_MODEL.to_string())
}

fn default_tts_speaker() -> String {
    std::env::var("RIME_SPEAKER").unwrap_or_else(|_| models::TTS_SPEAKER.to_string())
}

fn default_tts_speed() -> f32 {
    std::env::var("RIME_SPEED")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(models::TTS_SPEED)
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            model: default_tts_model(),
            speaker: default_tts_speaker(),
            speed: default_tts_speed(),
        }
    }
}
