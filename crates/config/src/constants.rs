//! Centralized defaults for the care agent
//!
//! Values that more than one crate needs live here so the dispatcher, the
//! server and the settings defaults agree.

/// Environment variable prefix for settings overrides (`CARE_AGENT__SERVER__PORT=9000`)
pub const ENV_PREFIX: &str = "CARE_AGENT";

/// Outbound call defaults
pub mod dispatch {
    /// Room the agent and the callee are placed in
    pub const DEFAULT_ROOM_NAME: &str = "care-room";

    /// Name the agent worker registers under
    pub const DEFAULT_AGENT_NAME: &str = "Agent care";

    /// Person checked on when none is given
    pub const DEFAULT_PERSON_ID: &str = "grandma-001";

    /// Outbound SIP trunk ids carry this prefix
    pub const SIP_TRUNK_PREFIX: &str = "ST_";

    /// Prefix of the SIP participant identity (`callee_{person_id}`)
    pub const PARTICIPANT_IDENTITY_PREFIX: &str = "callee_";

    /// Lifetime of signed access tokens
    pub const DEFAULT_TOKEN_TTL_SECS: u64 = 600;

    pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
}

/// Speech and language model defaults
pub mod models {
    pub const PRIMARY_RECOGNIZER: &str = "assemblyai";
    pub const FALLBACK_RECOGNIZER: &str = "deepgram";
    pub const LLM_MODEL: &str = "gpt-4o-mini";
    pub const TTS_MODEL: &str = "mist";
    pub const TTS_SPEAKER: &str = "rainforest";
    pub const TTS_SPEED: f32 = 0.9;
}

/// HTTP server defaults
pub mod server {
    pub const DEFAULT_HOST: &str = "0.0.0.0";
    pub const DEFAULT_PORT: u16 = 8000;
    pub const DEFAULT_MAX_SESSIONS: usize = 100;
    pub const DEFAULT_STATIC_DIR: &str = "static";
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
}
