//! Configuration management for the care agent
//!
//! Supports loading configuration from:
//! - TOML/YAML/JSON files under `config/` (`default`, then `{env}`)
//! - Environment variables (`CARE_AGENT__` prefix, `__` between sections)
//! - The legacy variable names of the voice worker (`LIVEKIT_URL`,
//!   `SIP_OUTBOUND_TRUNK_ID`, `LK_ROOM_NAME`, `RIME_MODEL`, ...) as defaults

pub mod agent;
pub mod constants;
pub mod dispatch;
pub mod settings;

pub use agent::{AgentConfig, RecognizerConfig, TtsConfig};
pub use dispatch::DispatchConfig;
pub use settings::{
    load_settings, load_settings_from, AuthConfig, ObservabilityConfig, RuntimeEnvironment, ServerConfig,
    Settings,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}
