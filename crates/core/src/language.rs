//! Conversation languages
//!
//! The check-in agent speaks English and Spanish. A session starts in English
//! (or in the caller's stated preference) and may move to Spanish once the
//! caller is heard speaking it. There is no way back to English mid-call.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Supported conversation languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Language {
    #[default]
    #[serde(rename = "en")]
    English,
    #[serde(rename = "es")]
    Spanish,
}

/// Allowed language transitions.
static LANGUAGE_TRANSITIONS: Lazy<HashMap<Language, &'static [Language]>> = Lazy::new(|| {
    use Language::*;
    let mut map = HashMap::new();
    map.insert(English, &[Spanish] as &[_]);
    map.insert(Spanish, &[] as &[_]);
    map
});

impl Language {
    /// ISO 639-1 code
    pub fn code(&self) -> &'static str {
        match self {
            Self::English => "en",
            Self::Spanish => "es",
        }
    }

    /// Human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            Self::English => "English",
            Self::Spanish => "Spanish",
        }
    }

    /// Parse an exact ISO code (`en` / `es`).
    ///
    /// Anything else, including `auto`, yields `None`.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "en" => Some(Self::English),
            "es" => Some(Self::Spanish),
            _ => None,
        }
    }

    pub fn allowed_transitions(&self) -> &'static [Language] {
        LANGUAGE_TRANSITIONS.get(self).copied().unwrap_or(&[])
    }

    /// Check if a session in this language may switch to `target`
    pub fn can_transition_to(&self, target: Language) -> bool {
        self.allowed_transitions().contains(&target)
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Caller language preference as carried in call metadata (`langPref`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LanguagePreference {
    /// Start in English and follow the caller
    #[default]
    Auto,
    #[serde(rename = "en")]
    English,
    #[serde(rename = "es")]
    Spanish,
}

impl LanguagePreference {
    /// Parse a `langPref` value. Unknown values are treated as `auto`.
    pub fn parse(value: &str) -> Self {
        match Language::from_code(value) {
            Some(Language::English) => Self::English,
            Some(Language::Spanish) => Self::Spanish,
            None => Self::Auto,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::English => "en",
            Self::Spanish => "es",
        }
    }

    /// The language a session should start in, if the preference pins one
    pub fn pinned(&self) -> Option<Language> {
        match self {
            Self::Auto => None,
            Self::English => Some(Language::English),
            Self::Spanish => Some(Language::Spanish),
        }
    }
}

impl std::fmt::Display for LanguagePreference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_english_to_spanish() {
        assert!(Language::English.can_transition_to(Language::Spanish));
        assert!(!Language::Spanish.can_transition_to(Language::English));
        assert!(!Language::English.can_transition_to(Language::English));
    }

    #[test]
    fn test_codes() {
        assert_eq!(Language::from_code("es"), Some(Language::Spanish));
        assert_eq!(Language::from_code("auto"), None);
        assert_eq!(Language::from_code("EN"), None);
        assert_eq!(Language::Spanish.to_string(), "es");
        assert_eq!(
            serde_json::to_string(&Language::English).unwrap(),
            "\"en\""
        );
    }

    #[test]
    fn test_preference() {
        assert_eq!(LanguagePreference::parse("es").pinned(), Some(Language::Spanish));
        assert_eq!(LanguagePreference::parse("auto"), LanguagePreference::Auto);
        assert_eq!(LanguagePreference::parse("fr"), LanguagePreference::Auto);
        assert_eq!(LanguagePreference::Auto.pinned(), None);
    }
}
