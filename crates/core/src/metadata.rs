//! Call metadata
//!
//! The dispatch system hands each call a flat `key=value;key=value` string.
//! Parsing is deliberately permissive: it never fails, and callers apply
//! defaults for anything missing.

use std::collections::HashMap;

use crate::language::LanguagePreference;

pub const KEY_PHONE: &str = "phone";
pub const KEY_REASON: &str = "reason";
pub const KEY_LANG_PREF: &str = "langPref";
pub const KEY_PERSON_ID: &str = "personId";
pub const KEY_TIMESTAMP: &str = "ts";

/// Default call reason when metadata carries none
pub const DEFAULT_REASON: &str = "weather";
/// Default language preference when metadata carries none
pub const DEFAULT_LANG_PREF: &str = "auto";

/// Parsed call metadata.
///
/// Keys keep their first-seen order so the value can be rendered back to
/// the wire format. A repeated key overwrites the earlier value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallMetadata {
    entries: Vec<(String, String)>,
}

/// Parse a `key=value;...` string into [`CallMetadata`].
///
/// Tokens without `=` are dropped. Only the first `=` splits, so values may
/// contain `=` themselves.
pub fn parse_metadata(raw: &str) -> CallMetadata {
    let mut metadata = CallMetadata::new();
    for token in raw.split(';') {
        if let Some((key, value)) = token.split_once('=') {
            metadata.insert(key, value);
        }
    }
    metadata
}

impl CallMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Same as [`parse_metadata`]
    pub fn parse(raw: &str) -> Self {
        parse_metadata(raw)
    }

    /// Insert or overwrite a key
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn to_map(&self) -> HashMap<String, String> {
        self.entries.iter().cloned().collect()
    }

    pub fn phone(&self) -> Option<&str> {
        self.get(KEY_PHONE)
    }

    /// Call reason, `"weather"` when absent
    pub fn reason(&self) -> &str {
        self.get(KEY_REASON).unwrap_or(DEFAULT_REASON)
    }

    /// Raw `langPref` value, `"auto"` when absent
    pub fn lang_pref(&self) -> &str {
        self.get(KEY_LANG_PREF).unwrap_or(DEFAULT_LANG_PREF)
    }

    /// `langPref` falling back to the given default instead of `"auto"`
    pub fn lang_pref_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.get(KEY_LANG_PREF).unwrap_or(default)
    }

    pub fn language_preference(&self) -> LanguagePreference {
        LanguagePreference::parse(self.lang_pref())
    }

    pub fn person_id(&self) -> Option<&str> {
        self.get(KEY_PERSON_ID)
    }

    /// Dispatch timestamp exactly as sent (RFC 3339 by convention)
    pub fn timestamp(&self) -> Option<&str> {
        self.get(KEY_TIMESTAMP)
    }

    /// Render back to the `key=value;...` wire format
    pub fn to_wire(&self) -> String {
        self.entries
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(";")
    }
}

impl std::fmt::Display for CallMetadata {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_wire())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drops_tokens_without_equals() {
        let meta = parse_metadata("a=1;b=2;c");
        let expected: HashMap<String, String> = [("a", "1"), ("b", "2")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        assert_eq!(meta.to_map(), expected);
    }

    #[test]
    fn test_empty_input() {
        assert!(parse_metadata("").is_empty());
        assert!(parse_metadata(";;;").is_empty());
    }

    #[test]
    fn test_splits_on_first_equals() {
        let meta = parse_metadata("k=v=w");
        assert_eq!(meta.len(), 1);
        assert_eq!(meta.get("k"), Some("v=w"));
    }

    #[test]
    fn test_defaults_when_missing() {
        let meta = parse_metadata("phone=+15550100");
        assert_eq!(meta.phone(), Some("+15550100"));
        assert_eq!(meta.reason(), "weather");
        assert_eq!(meta.lang_pref(), "auto");
        assert_eq!(meta.lang_pref_or("en"), "en");
        assert_eq!(meta.person_id(), None);
    }

    #[test]
    fn test_full_dispatch_string() {
        let raw = "phone=+15550100;reason=medication;langPref=es;personId=grandma-001;\
                   ts=2026-10-19T08:00:00+00:00;extra=kept";
        let meta = parse_metadata(raw);
        assert_eq!(meta.reason(), "medication");
        assert_eq!(meta.language_preference(), LanguagePreference::Spanish);
        assert_eq!(meta.person_id(), Some("grandma-001"));
        assert_eq!(meta.timestamp(), Some("2026-10-19T08:00:00+00:00"));
        assert_eq!(meta.get("extra"), Some("kept"));
        assert_eq!(meta.to_wire(), raw);
    }

    #[test]
    fn test_repeated_key_overwrites() {
        let meta = parse_metadata("reason=weather;reason=other");
        assert_eq!(meta.len(), 1);
        assert_eq!(meta.reason(), "other");
    }
}
