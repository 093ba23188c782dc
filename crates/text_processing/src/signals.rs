//! Keyword signals over a single utterance
//!
//! Fixed keyword sets, matched case-insensitively against the lowercased
//! utterance. These are heuristics: "no" alone reads as Spanish and "cold"
//! anywhere counts as negative mood.
//!
//! # Example
//!
//! ```
//! use care_agent_core::Language;
//! use care_agent_text_processing::signals::{classify, language_hint};
//!
//! let signals = classify("Hola, I had a fall in the kitchen");
//! assert!(signals.help_request);
//! assert_eq!(signals.language_hint, Some(Language::Spanish));
//! assert_eq!(language_hint("hello"), None);
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use care_agent_core::Language;

/// Help and emergency words, English and Spanish
pub const HELP_KEYWORDS: &[&str] = &["help", "ayuda", "emergency", "auxilio"];

/// Fall mentions, English and Spanish
pub const FALL_MARKERS: &[&str] = &["fall", "caí"];

/// Words suggesting the caller is unwell or low
pub const NEGATIVE_WORDS: &[&str] = &[
    "sick", "dizzy", "pain", "cold", "alone", "sad", "mal", "tos", "dolor", "triste",
];

/// Transcript markers for a cough
pub const COUGH_HINTS: &[&str] = &["*cough*"];

/// Whole-word Spanish markers. `\b` is Unicode-aware, so `sí` matches as a word.
static SPANISH_WORDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(hola|bien|gracias|sí|no|medicina|tiempo|lluvia|tormenta)\b").unwrap()
});

/// All signals for one utterance
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtteranceSignals {
    pub help_request: bool,
    pub negative_mood: bool,
    pub cough_hint: bool,
    /// `Some(Spanish)` when a Spanish marker word was heard, otherwise no signal
    pub language_hint: Option<Language>,
}

impl UtteranceSignals {
    /// True if any signal fired
    pub fn any(&self) -> bool {
        self.help_request || self.negative_mood || self.cough_hint || self.language_hint.is_some()
    }
}

fn contains_any(lowered: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| lowered.contains(needle))
}

fn help_in(lowered: &str) -> bool {
    contains_any(lowered, HELP_KEYWORDS) || contains_any(lowered, FALL_MARKERS)
}

fn negative_in(lowered: &str) -> bool {
    contains_any(lowered, NEGATIVE_WORDS)
}

fn cough_in(lowered: &str) -> bool {
    contains_any(lowered, COUGH_HINTS)
}

fn spanish_in(lowered: &str) -> Option<Language> {
    SPANISH_WORDS
        .is_match(lowered)
        .then_some(Language::Spanish)
}

/// Compute every signal with a single lowercase pass
pub fn classify(text: &str) -> UtteranceSignals {
    let lowered = text.to_lowercase();
    UtteranceSignals {
        help_request: help_in(&lowered),
        negative_mood: negative_in(&lowered),
        cough_hint: cough_in(&lowered),
        language_hint: spanish_in(&lowered),
    }
}

pub fn is_help_request(text: &str) -> bool {
    help_in(&text.to_lowercase())
}

pub fn is_negative_mood(text: &str) -> bool {
    negative_in(&text.to_lowercase())
}

pub fn is_cough_hint(text: &str) -> bool {
    cough_in(&text.to_lowercase())
}

pub fn language_hint(text: &str) -> Option<Language> {
    spanish_in(&text.to_lowercase())
}

/// Web-chat distress check: help request, negative mood, or "emergency"
pub fn is_distress(text: &str) -> bool {
    let lowered = text.to_lowercase();
    help_in(&lowered) || negative_in(&lowered) || lowered.contains("emergency")
}
