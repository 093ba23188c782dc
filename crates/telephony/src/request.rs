//! Outbound call request and its metadata string

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use care_agent_config::constants::dispatch::{DEFAULT_PERSON_ID, PARTICIPANT_IDENTITY_PREFIX};
use care_agent_core::metadata::{
    DEFAULT_LANG_PREF, DEFAULT_REASON, KEY_LANG_PREF, KEY_PERSON_ID, KEY_PHONE, KEY_REASON,
    KEY_TIMESTAMP,
};
use care_agent_core::CallMetadata;

use crate::DispatchError;

/// Separator between metadata pairs; never allowed inside a value
const PAIR_SEPARATOR: char = ';';

/// Who to call and why
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallRequest {
    /// E.164 number dialed through the SIP trunk
    pub phone_number: String,
    pub reason: String,
    pub lang_pref: String,
    pub person_id: String,
}

impl CallRequest {
    pub fn new(phone_number: impl Into<String>) -> Self {
        Self {
            phone_number: phone_number.into(),
            reason: DEFAULT_REASON.to_string(),
            lang_pref: DEFAULT_LANG_PREF.to_string(),
            person_id: DEFAULT_PERSON_ID.to_string(),
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = reason.into();
        self
    }

    pub fn with_lang_pref(mut self, lang_pref: impl Into<String>) -> Self {
        self.lang_pref = lang_pref.into();
        self
    }

    pub fn with_person_id(mut self, person_id: impl Into<String>) -> Self {
        self.person_id = person_id.into();
        self
    }

    /// Reject values that would corrupt the metadata string.
    ///
    /// The worker splits metadata on `;`, so a value carrying one could
    /// inject or override another key.
    pub fn validate(&self) -> Result<(), DispatchError> {
        if self.phone_number.trim().is_empty() {
            return Err(DispatchError::InvalidRequest(
                "phone_number is required".to_string(),
            ));
        }

        let fields = [
            ("phone_number", &self.phone_number),
            ("reason", &self.reason),
            ("lang_pref", &self.lang_pref),
            ("person_id", &self.person_id),
        ];
        for (name, value) in fields {
            if value.contains(PAIR_SEPARATOR) || value.chars().any(char::is_control) {
                return Err(DispatchError::InvalidRequest(format!(
                    "{} contains a forbidden character",
                    name
                )));
            }
        }
        Ok(())
    }

    /// Bounded metric label for the call reason
    pub fn reason_label(&self) -> &'static str {
        if self.reason == DEFAULT_REASON {
            "weather"
        } else {
            "other"
        }
    }

    /// Metadata stamped with the current time
    pub fn metadata(&self) -> CallMetadata {
        self.metadata_at(Utc::now())
    }

    pub fn metadata_at(&self, ts: DateTime<Utc>) -> CallMetadata {
        CallMetadata::new()
            .with(KEY_PHONE, &self.phone_number)
            .with(KEY_REASON, &self.reason)
            .with(KEY_LANG_PREF, &self.lang_pref)
            .with(KEY_PERSON_ID, &self.person_id)
            .with(KEY_TIMESTAMP, ts.to_rfc3339())
    }

    /// Identity of the dialed-in participant
    pub fn participant_identity(&self) -> String {
        format!("{}{}", PARTICIPANT_IDENTITY_PREFIX, self.person_id)
    }
}
