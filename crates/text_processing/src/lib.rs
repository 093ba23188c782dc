//! Text processing for the care agent
//!
//! This crate provides the utterance classifier shared by the telephony and
//! web-chat policies:
//! - **Help detection**: help / emergency / fall words in English and Spanish
//! - **Mood and cough hints**: advisory keyword signals
//! - **Language hint**: whole-word Spanish markers
//!
//! # Example
//!
//! ```
//! use care_agent_text_processing::{classify, is_distress};
//!
//! let signals = classify("I feel dizzy");
//! assert!(signals.negative_mood);
//! assert!(is_distress("help"));
//! ```

pub mod signals;

pub use signals::{
    classify, is_cough_hint, is_distress, is_help_request, is_negative_mood, language_hint,
    UtteranceSignals,
};
