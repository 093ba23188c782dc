//! Main settings module

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

use care_agent_core::DEFAULT_HISTORY_LIMIT;

use crate::constants::{server, ENV_PREFIX};
use crate::{AgentConfig, ConfigError, DispatchConfig};

/// Runtime environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    /// Development mode - relaxed validation, warnings only
    #[default]
    Development,
    /// Staging mode - stricter validation
    Staging,
    /// Production mode - all validations enforced
    Production,
}

impl RuntimeEnvironment {
    /// Check if this is a production environment
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    /// Check if strict validation should be applied
    pub fn is_strict(&self) -> bool {
        matches!(self, Self::Production | Self::Staging)
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    /// Runtime environment (development, staging, production)
    #[serde(default)]
    pub environment: RuntimeEnvironment,

    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Agent configuration
    #[serde(default)]
    pub agent: AgentConfig,

    /// Outbound call dispatch
    #[serde(default)]
    pub dispatch: DispatchConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Settings {
    /// Create default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_server()?;
        self.validate_agent()?;
        self.validate_dispatch()?;
        Ok(())
    }

    fn validate_server(&self) -> Result<(), ConfigError> {
        let server = &self.server;

        if server.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.port".to_string(),
                message: "Port cannot be 0".to_string(),
            });
        }

        if server.max_sessions == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.max_sessions".to_string(),
                message: "Max sessions must be at least 1".to_string(),
            });
        }

        if server.timeout_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.timeout_seconds".to_string(),
                message: "Timeout must be at least 1 second".to_string(),
            });
        }

        if self.environment.is_production() && server.cors_enabled && server.cors_origins.is_empty()
        {
            tracing::warn!(
                "CORS is enabled in production but no origins are configured. \
                 Any origin will be allowed."
            );
        }

        if self.environment.is_production() && !server.auth.has_api_key() {
            return Err(ConfigError::InvalidValue {
                field: "server.auth.api_key".to_string(),
                message: "API key must be set in production".to_string(),
            });
        }

        if server.auth.enabled && !server.auth.has_api_key() {
            return Err(ConfigError::InvalidValue {
                field: "server.auth.api_key".to_string(),
                message: "API key must be set when auth is enabled".to_string(),
            });
        }

        Ok(())
    }

    fn validate_agent(&self) -> Result<(), ConfigError> {
        let agent = &self.agent;

        if !matches!(agent.default_lang_pref.as_str(), "auto" | "en" | "es") {
            return Err(ConfigError::InvalidValue {
                field: "agent.default_lang_pref".to_string(),
                message: format!(
                    "Must be one of auto, en, es; got '{}'",
                    agent.default_lang_pref
                ),
            });
        }

        // Both policies keep exactly the last 20 entries
        if agent.history_limit != DEFAULT_HISTORY_LIMIT {
            return Err(ConfigError::InvalidValue {
                field: "agent.history_limit".to_string(),
                message: format!(
                    "Must be {}, got {}",
                    DEFAULT_HISTORY_LIMIT, agent.history_limit
                ),
            });
        }

        if !(agent.tts.speed > 0.0 && agent.tts.speed <= 2.0) {
            return Err(ConfigError::InvalidValue {
                field: "agent.tts.speed".to_string(),
                message: format!("Must be in (0.0, 2.0], got {}", agent.tts.speed),
            });
        }

        Ok(())
    }

    fn validate_dispatch(&self) -> Result<(), ConfigError> {
        let dispatch = &self.dispatch;

        let scheme_ok = ["ws://", "wss://", "http://", "https://"]
            .iter()
            .any(|scheme| dispatch.livekit_url.starts_with(scheme));
        if !scheme_ok {
            return Err(ConfigError::InvalidValue {
                field: "dispatch.livekit_url".to_string(),
                message: format!(
                    "Expected a ws(s):// or http(s):// URL, got '{}'",
                    dispatch.livekit_url
                ),
            });
        }

        if dispatch.token_ttl_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                field: "dispatch.token_ttl_seconds".to_string(),
                message: "Must be at least 1 second".to_string(),
            });
        }

        if dispatch.request_timeout_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                field: "dispatch.request_timeout_seconds".to_string(),
                message: "Must be at least 1 second".to_string(),
            });
        }

        if !dispatch.has_credentials() {
            if self.environment.is_strict() {
                return Err(ConfigError::MissingField(
                    "dispatch.api_key / dispatch.api_secret".to_string(),
                ));
            }
            tracing::warn!("Dispatch credentials not configured; outbound calls will fail");
        }

        // The trunk is only checked when dialing, so a chat-only deployment can run without one.
        if !dispatch.has_valid_trunk() {
            tracing::debug!("dispatch.sip_trunk_id is not set or lacks the ST_ prefix");
        }

        Ok(())
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP server host
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Maximum concurrent sessions (chat and voice bridge combined)
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Enable CORS
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// CORS allowed origins
    #[serde(default)]
    pub cors_origins: Vec<String>,

    /// Directory holding `index.html` and the chat page assets
    #[serde(default = "default_static_dir")]
    pub static_dir: String,

    /// API key authentication
    #[serde(default)]
    pub auth: AuthConfig,
}

fn default_host() -> String {
    server::DEFAULT_HOST.to_string()
}
fn default_port() -> u16 {
    server::DEFAULT_PORT
}
fn default_max_sessions() -> usize {
    server::DEFAULT_MAX_SESSIONS
}
fn default_timeout() -> u64 {
    server::DEFAULT_TIMEOUT_SECS
}
fn default_true() -> bool {
    true
}
fn default_static_dir() -> String {
    server::DEFAULT_STATIC_DIR.to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_sessions: default_max_sessions(),
            timeout_seconds: default_timeout(),
            cors_enabled: true,
            cors_origins: Vec::new(),
            static_dir: default_static_dir(),
            auth: AuthConfig::default(),
        }
    }
}

/// Authentication configuration
///
/// Requests carry `Authorization: Bearer <api_key>`. Production always
/// requires the key, whatever `enabled` says.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Enable authentication outside production
    #[serde(default)]
    pub enabled: bool,

    /// Shared API key (set via CARE_AGENT__SERVER__AUTH__API_KEY)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Paths that bypass authentication. `/` matches only the root page,
    /// other entries match the path and everything below it.
    #[serde(default = "default_public_paths")]
    pub public_paths: Vec<String>,
}

fn default_public_paths() -> Vec<String> {
    ["/", "/static", "/ws", "/health", "/metrics"]
        .iter()
        .map(|p| p.to_string())
        .collect()
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: None,
            public_paths: default_public_paths(),
        }
    }
}

impl AuthConfig {
    pub fn has_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }

    /// Whether requests must carry the API key in `environment`
    pub fn is_required(&self, environment: RuntimeEnvironment) -> bool {
        self.enabled || environment.is_production()
    }

    pub fn is_public(&self, path: &str) -> bool {
        self.public_paths.iter().any(|public| {
            if public == "/" {
                return path == "/";
            }
            let public = public.trim_end_matches('/');
            path == public
                || path
                    .strip_prefix(public)
                    .is_some_and(|rest| rest.starts_with('/'))
        })
    }
}

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub log_json: bool,

    /// Enable the Prometheus recorder and `/metrics`
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
            metrics_enabled: true,
        }
    }
}

/// Load settings from files and environment
///
/// Priority (highest to lowest):
/// 1. Environment variables (CARE_AGENT__ prefix, `__` between sections)
/// 2. config/{env}.{toml,yaml,json} (if env specified)
/// 3. config/default.{toml,yaml,json}
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    load_settings_from(Path::new("config"), env)
}

/// Same as [`load_settings`] with an explicit config directory
pub fn load_settings_from(dir: &Path, env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    // Load default config
    let default_path = dir.join("default");
    builder = builder.add_source(File::with_name(&default_path.to_string_lossy()).required(false));

    // Load environment-specific config
    if let Some(env_name) = env {
        let env_path = dir.join(env_name);
        builder = builder.add_source(File::with_name(&env_path.to_string_lossy()).required(false));
    }

    // Load from environment variables
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let settings: Settings = config.try_deserialize()?;

    settings.validate()?;

    tracing::debug!(
        environment = ?settings.environment,
        port = settings.server.port,
        "Settings loaded"
    );

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn valid_settings() -> Settings {
        let mut settings = Settings::default();
        settings.dispatch.livekit_url = "wss://example.livekit.cloud".to_string();
        settings.dispatch.api_key = "key".to_string();
        settings.dispatch.api_secret = "secret".to_string();
        settings.agent.default_lang_pref = "auto".to_string();
        settings.agent.tts.speed = 0.9;
        settings
    }

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.server.port, 8000);
        assert_eq!(settings.server.max_sessions, 100);
        assert_eq!(settings.agent.history_limit, 20);
        assert_eq!(settings.agent.recognizers.primary, "assemblyai");
        assert_eq!(settings.agent.recognizers.fallback, "deepgram");
        assert!(settings.observability.metrics_enabled);
    }

    #[test]
    fn test_server_validation() {
        let mut settings = valid_settings();
        assert!(settings.validate().is_ok());

        settings.server.port = 0;
        assert!(settings.validate().is_err());

        settings.server.port = 8000;
        settings.server.max_sessions = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_agent_validation() {
        let mut settings = valid_settings();
        settings.agent.default_lang_pref = "fr".to_string();
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("agent.default_lang_pref"));

        settings.agent.default_lang_pref = "es".to_string();
        settings.agent.history_limit = 0;
        assert!(settings.validate().is_err());

        settings.agent.history_limit = 12;
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("agent.history_limit"));

        settings.agent.history_limit = 20;
        settings.agent.tts.speed = 0.0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_dispatch_url_scheme() {
        let mut settings = valid_settings();
        settings.dispatch.livekit_url = "example.livekit.cloud".to_string();
        assert!(settings.validate().is_err());

        settings.dispatch.livekit_url = "http://localhost:7880".to_string();
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_production_requires_credentials() {
        let mut settings = valid_settings();
        settings.environment = RuntimeEnvironment::Production;
        settings.server.auth.api_key = Some("server-key".to_string());
        settings.dispatch.api_secret.clear();
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::MissingField(_))
        ));

        settings.environment = RuntimeEnvironment::Development;
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_production_requires_api_key() {
        let mut settings = valid_settings();
        settings.environment = RuntimeEnvironment::Production;
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("server.auth.api_key"));

        settings.server.auth.api_key = Some(String::new());
        assert!(settings.validate().is_err());

        settings.server.auth.api_key = Some("server-key".to_string());
        assert!(settings.validate().is_ok());
        assert!(settings.server.auth.is_required(settings.environment));
    }

    #[test]
    fn test_auth_enabled_requires_api_key() {
        let mut settings = valid_settings();
        assert!(!settings.server.auth.is_required(settings.environment));

        settings.server.auth.enabled = true;
        assert!(settings.validate().is_err());

        settings.server.auth.api_key = Some("server-key".to_string());
        assert!(settings.validate().is_ok());
        assert!(settings.server.auth.is_required(settings.environment));
    }

    #[test]
    fn test_public_paths() {
        let auth = AuthConfig::default();
        assert!(auth.is_public("/"));
        assert!(auth.is_public("/health"));
        assert!(auth.is_public("/metrics"));
        assert!(auth.is_public("/static/app.js"));
        assert!(auth.is_public("/ws"));

        assert!(!auth.is_public("/api/calls"));
        assert!(!auth.is_public("/call/ws"));
        assert!(!auth.is_public("/stats"));
        assert!(!auth.is_public("/wsx"));
        assert!(!auth.is_public("/healthz"));
    }

    #[test]
    fn test_trunk_checked_at_dial_time_only() {
        let mut settings = valid_settings();
        settings.dispatch.sip_trunk_id = Some("TR_bogus".to_string());
        assert!(settings.validate().is_ok());
        assert!(!settings.dispatch.has_valid_trunk());

        settings.dispatch.sip_trunk_id = Some("ST_abc123".to_string());
        assert!(settings.dispatch.has_valid_trunk());
    }

    #[test]
    fn test_load_layered_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("default.toml"),
            r#"
[server]
port = 9100
static_dir = "public"

[agent]
default_lang_pref = "auto"
llm_model = "gpt-4o"

[agent.tts]
speed = 0.8

[dispatch]
livekit_url = "wss://care.example.com"
api_key = "key"
api_secret = "secret"
room_name = "care-room-test"
"#,
        )
        .unwrap();
        fs::write(
            dir.path().join("staging.toml"),
            r#"
environment = "staging"

[server]
port = 9200
"#,
        )
        .unwrap();

        let settings = load_settings_from(dir.path(), None).unwrap();
        assert_eq!(settings.server.port, 9100);
        assert_eq!(settings.server.static_dir, "public");
        assert_eq!(settings.agent.llm_model, "gpt-4o");
        assert_eq!(settings.dispatch.room_name, "care-room-test");

        let settings = load_settings_from(dir.path(), Some("staging")).unwrap();
        assert_eq!(settings.environment, RuntimeEnvironment::Staging);
        assert_eq!(settings.server.port, 9200);
        assert_eq!(settings.server.static_dir, "public");
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("default.toml"),
            r#"
[agent]
default_lang_pref = "de"
tts = { speed = 0.9 }

[dispatch]
livekit_url = "wss://care.example.com"
"#,
        )
        .unwrap();

        let err = load_settings_from(dir.path(), None).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_load_rejects_history_limit_override() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("default.toml"),
            r#"
[agent]
history_limit = 12
"#,
        )
        .unwrap();

        match load_settings_from(dir.path(), None) {
            Err(ConfigError::InvalidValue { field, .. }) => {
                assert_eq!(field, "agent.history_limit")
            },
            other => panic!("expected InvalidValue, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_settings_serialize() {
        let json = serde_json::to_value(valid_settings()).unwrap();
        assert_eq!(json["environment"], "development");
        assert_eq!(json["server"]["port"], 8000);
    }
}
