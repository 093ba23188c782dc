//! Outbound call dispatch configuration

use serde::{Deserialize, Serialize};

use crate::constants::dispatch;

/// Connection and naming settings for placing outbound calls
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Media server URL (`wss://…` accepted, HTTP scheme derived from it)
    #[serde(default = "default_livekit_url")]
    pub livekit_url: String,

    #[serde(default = "default_api_key")]
    pub api_key: String,

    #[serde(default = "default_api_secret")]
    pub api_secret: String,

    #[serde(default = "default_room_name")]
    pub room_name: String,

    #[serde(default = "default_agent_name")]
    pub agent_name: String,

    /// Outbound SIP trunk; checked at dial time, not at startup
    #[serde(default = "default_sip_trunk_id")]
    pub sip_trunk_id: Option<String>,

    #[serde(default = "default_person_id")]
    pub default_person_id: String,

    #[serde(default = "default_token_ttl")]
    pub token_ttl_seconds: u64,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

fn default_livekit_url() -> String {
    std::env::var("LIVEKIT_URL").unwrap_or_else(|_| "ws://localhost:7880".to_string())
}

fn default_api_key() -> String {
    std::env::var("LIVEKIT_API_KEY").unwrap_or_default()
}

fn default_api_secret() -> String {
    std::env::var("LIVEKIT_API_SECRET").unwrap_or_default()
}

fn default_room_name() -> String {
    std::env::var("LK_ROOM_NAME").unwrap_or_else(|_| dispatch::DEFAULT_ROOM_NAME.to_string())
}

fn default_agent_name() -> String {
    std::env::var("LK_AGENT_NAME").unwrap_or_else(|_| dispatch::DEFAULT_AGENT_NAME.to_string())
}

fn default_sip_trunk_id() -> Option<String> {
    std::env::var("SIP_OUTBOUND_TRUNK_ID").ok()
}

fn default_person_id() -> String {
    dispatch::DEFAULT_PERSON_ID.to_string()
}

fn default_token_ttl() -> u64 {
    dispatch::DEFAULT_TOKEN_TTL_SECS
}

fn default_request_timeout() -> u64 {
    dispatch::DEFAULT_REQUEST_TIMEOUT_SECS
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            livekit_url: default_livekit_url(),
            api_key: default_api_key(),
            api_secret: default_api_secret(),
            room_name: default_room_name(),
            agent_name: default_agent_name(),
            sip_trunk_id: default_sip_trunk_id(),
            default_person_id: default_person_id(),
            token_ttl_seconds: default_token_ttl(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

impl DispatchConfig {
    /// True when the trunk id is set and carries the `ST_` prefix
    pub fn has_valid_trunk(&self) -> bool {
        self.sip_trunk_id
            .as_deref()
            .is_some_and(|id| id.starts_with(dispatch::SIP_TRUNK_PREFIX))
    }

    /// True when credentials for signing access tokens are present
    pub fn has_credentials(&self) -> bool {
        !self.api_key.is_empty() && !self.api_secret.is_empty()
    }
}
