//! Telephony conversation policy
//!
//! One [`CareAgent`] per call. It reads the dispatch metadata once, opens the
//! call with a line chosen by reason and language, then classifies every final
//! transcript in strict priority order:
//!
//! 1. Spanish heard while speaking English: switch language and recognizer,
//!    confirm in Spanish, keep going
//! 2. Help request: escalate and stop
//! 3. Negative mood, otherwise a cough hint: flag a concern (at most one)

use std::sync::Arc;

use care_agent_config::AgentConfig;
use care_agent_core::{
    CallMetadata, CareEvent, CareEventKind, ConcernKind, ConversationHistory, EscalationReason,
    Language, LanguagePreference, RecognizerBackend, VoiceChannel,
};
use care_agent_text_processing::classify;

use crate::escalation::EscalationReporter;
use crate::AgentError;

pub const OPENING_WEATHER_EN: &str = "Hi, this is your check-in call. How are you feeling today?";
pub const OPENING_WEATHER_ES: &str = "Hola, esta es tu llamada de control. ¿Cómo te sientes hoy?";
pub const OPENING_GENERAL_EN: &str =
    "Hello! I'm calling to check on you and your medicines. How are you feeling?";
pub const OPENING_GENERAL_ES: &str =
    "¡Hola! Llamo para ver cómo estás y tus medicinas. ¿Cómo te sientes?";

pub const SPANISH_SWITCH_LINE: &str = "Entiendo español. Podemos continuar en español.";

pub const ESCALATION_LINE_EN: &str = "I'm contacting your family now and will stay with you.";
pub const ESCALATION_LINE_ES: &str = "Estoy contactando a tu familia ahora y me quedaré contigo.";

/// Call reason that selects the weather opening
pub const WEATHER_REASON: &str = "weather";

/// Opening line for a call reason and language
pub fn opening_line(reason: &str, language: Language) -> &'static str {
    match (reason == WEATHER_REASON, language) {
        (true, Language::English) => OPENING_WEATHER_EN,
        (true, Language::Spanish) => OPENING_WEATHER_ES,
        (false, Language::English) => OPENING_GENERAL_EN,
        (false, Language::Spanish) => OPENING_GENERAL_ES,
    }
}

/// Reassurance spoken after an escalation
pub fn escalation_line(language: Language) -> &'static str {
    match language {
        Language::English => ESCALATION_LINE_EN,
        Language::Spanish => ESCALATION_LINE_ES,
    }
}

/// What one transcript caused
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TurnOutcome {
    /// The session moved to Spanish on this utterance
    pub switched_language: bool,
    /// Escalation or concern raised, if any
    pub event: Option<CareEventKind>,
}

/// Per-call conversation policy
pub struct CareAgent {
    session_id: String,
    voice: Arc<dyn VoiceChannel>,
    reporter: Arc<dyn EscalationReporter>,
    config: AgentConfig,
    language: Language,
    metadata: CallMetadata,
    history: ConversationHistory,
}

impl CareAgent {
    pub fn new(
        voice: Arc<dyn VoiceChannel>,
        reporter: Arc<dyn EscalationReporter>,
        config: AgentConfig,
    ) -> Self {
        let history = ConversationHistory::with_limit(config.history_limit);
        Self {
            session_id: uuid::Uuid::new_v4().to_string(),
            voice,
            reporter,
            config,
            language: Language::English,
            metadata: CallMetadata::new(),
            history,
        }
    }

    /// Use an externally assigned session id (the server's, or the room's)
    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = session_id.into();
        self
    }

    /// Open the call: seed language from `langPref`, speak the opening line,
    /// then hand the turn to the reply generator. Returns the opening line.
    pub async fn on_session_start(&mut self, metadata: CallMetadata) -> Result<&'static str, AgentError> {
        let preference =
            LanguagePreference::parse(metadata.lang_pref_or(&self.config.default_lang_pref));
        if let Some(language) = preference.pinned() {
            self.language = language;
        }

        let opening = opening_line(metadata.reason(), self.language);

        tracing::info!(
            session_id = %self.session_id,
            reason = metadata.reason(),
            lang_pref = %preference,
            language = %self.language,
            person_id = metadata.person_id().unwrap_or("-"),
            "Care call started"
        );

        self.metadata = metadata;
        self.say(opening).await?;
        self.voice.generate_reply().await?;

        Ok(opening)
    }

    /// Apply the keyword policy to one final transcript
    pub async fn on_transcript(&mut self, text: &str) -> Result<TurnOutcome, AgentError> {
        let signals = classify(text);
        let mut outcome = TurnOutcome::default();

        self.history.push_user(text);

        if let Some(hinted) = signals.language_hint {
            if self.language.can_transition_to(hinted) {
                self.switch_language(hinted).await?;
                outcome.switched_language = true;
            }
        }

        if signals.help_request {
            let reason = EscalationReason::HelpKeywordDetected;
            self.escalate(reason, text).await?;
            outcome.event = Some(CareEventKind::Escalation(reason));
            return Ok(outcome);
        }

        let concern = if signals.negative_mood {
            Some(ConcernKind::NegativeMood)
        } else if signals.cough_hint {
            Some(ConcernKind::CoughLikeEvent)
        } else {
            None
        };

        if let Some(kind) = concern {
            self.flag_concern(kind, text);
            outcome.event = Some(CareEventKind::Concern(kind));
        }

        Ok(outcome)
    }

    /// Report the escalation, then reassure the caller in their language
    pub async fn escalate(&mut self, reason: EscalationReason, last_heard: &str) -> Result<(), AgentError> {
        let event = self.event(CareEvent::escalation(reason, last_heard));
        self.reporter.report(&event);
        self.say(escalation_line(self.language)).await
    }

    /// Report a concern; nothing is spoken
    pub fn flag_concern(&self, kind: ConcernKind, last_heard: &str) {
        let event = self.event(CareEvent::concern(kind, last_heard));
        self.reporter.report(&event);
    }

    async fn switch_language(&mut self, language: Language) -> Result<(), AgentError> {
        tracing::info!(
            session_id = %self.session_id,
            from = %self.language,
            to = %language,
            recognizer = self.config.recognizer_model(RecognizerBackend::Fallback),
            "Switching conversation language"
        );
        self.language = language;
        self.voice.set_recognizer(RecognizerBackend::Fallback).await?;
        self.say(SPANISH_SWITCH_LINE).await
    }

    async fn say(&mut self, line: &str) -> Result<(), AgentError> {
        self.voice.speak(line).await?;
        self.history.push_assistant(line);
        Ok(())
    }

    fn event(&self, event: CareEvent) -> CareEvent {
        event
            .with_session_id(self.session_id.as_str())
            .with_person_id(self.metadata.person_id())
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn metadata(&self) -> &CallMetadata {
        &self.metadata
    }

    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }
}
