//! Configuration management
//!
//! Layering, lowest precedence first: built-in defaults, an optional TOML
//! file, then `PARLEY__`-prefixed environment variables
//! (`PARLEY__REALTIME__MODEL=...`).

use crate::domain::media::AudioMode;
use crate::domain::session::StartPolicy;
use crate::domain::shared::error::SessionError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

pub const DEFAULT_REALTIME_URL: &str = "https://api.openai.com/v1/realtime";
pub const DEFAULT_MODEL: &str = "gpt-4o-realtime-preview-2024-12-17";
pub const DEFAULT_TOKEN_FUNCTION: &str = "token";
pub const DEFAULT_CHANNEL_LABEL: &str = "oai-events";
pub const DEFAULT_CONFIG_FILE: &str = "parley.toml";
const ENV_PREFIX: &str = "PARLEY";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub realtime: RealtimeConfig,
    pub token_service: TokenServiceConfig,
    pub session: SessionConfig,
    pub audio: AudioMode,
    pub media: MediaConfig,
    pub rtc: RtcConfig,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RealtimeConfig {
    pub base_url: String,
    pub model: String,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_REALTIME_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }
}

/// Edge-function endpoint that mints ephemeral realtime credentials
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenServiceConfig {
    /// Base URL of the functions host, e.g. `https://xyz.supabase.co/functions/v1`
    pub functions_url: String,
    pub function: String,
    #[serde(skip_serializing)]
    pub anon_key: String,
}

impl Default for TokenServiceConfig {
    fn default() -> Self {
        Self {
            functions_url: String::new(),
            function: DEFAULT_TOKEN_FUNCTION.to_string(),
            anon_key: String::new(),
        }
    }
}

impl fmt::Debug for TokenServiceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenServiceConfig")
            .field("functions_url", &self.functions_url)
            .field("function", &self.function)
            .field("anon_key", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub start_policy: StartPolicy,
    pub channel_label: String,
    /// Disable (but keep) any video track the capture yields
    pub voice_only: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            start_policy: StartPolicy::default(),
            channel_label: DEFAULT_CHANNEL_LABEL.to_string(),
            voice_only: true,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    /// Ogg/Opus file streamed in place of a microphone; silence when unset
    pub ogg_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IceServerConfig {
    pub urls: Vec<String>,
    pub username: String,
    #[serde(skip_serializing)]
    pub credential: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RtcConfig {
    pub ice_servers: Vec<IceServerConfig>,
    /// Hold the offer until ICE gathering completes
    pub wait_for_ice_gathering: bool,
}

impl Default for RtcConfig {
    fn default() -> Self {
        Self {
            ice_servers: Vec::new(),
            wait_for_ice_gathering: true,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: Option<u64>,
}

impl Config {
    /// Load configuration from `path` (required if given) or from
    /// `parley.toml` in the working directory when present.
    pub fn load(path: Option<&Path>) -> Result<Self, config::ConfigError> {
        let mut builder =
            config::Config::builder().add_source(config::Config::try_from(&Config::default())?);

        builder = match path {
            Some(path) => builder.add_source(config::File::from(path).required(true)),
            None => builder.add_source(config::File::with_name(DEFAULT_CONFIG_FILE).required(false)),
        };

        builder
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?
            .try_deserialize()
    }

    pub fn validate(&self) -> Result<(), SessionError> {
        if self.realtime.base_url.is_empty() {
            return Err(SessionError::Config("realtime.base_url is empty".to_string()));
        }
        if self.realtime.model.is_empty() {
            return Err(SessionError::Config("realtime.model is empty".to_string()));
        }
        if self.token_service.functions_url.is_empty() {
            return Err(SessionError::Config(
                "token_service.functions_url is not set".to_string(),
            ));
        }
        if self.session.channel_label.is_empty() {
            return Err(SessionError::Config("session.channel_label is empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.realtime.base_url, DEFAULT_REALTIME_URL);
        assert_eq!(config.realtime.model, DEFAULT_MODEL);
        assert_eq!(config.token_service.function, "token");
        assert_eq!(config.session.channel_label, "oai-events");
        assert_eq!(config.session.start_policy, StartPolicy::Reject);
        assert!(config.session.voice_only);
        assert!(config.audio.plays_in_silent_mode);
    }

    #[test]
    fn test_validate_requires_token_service() {
        let config = Config::default();
        let err = tokio_test::assert_err!(config.validate());
        assert!(matches!(err, SessionError::Config(_)));

        let mut config = Config::default();
        config.token_service.functions_url = "https://example.supabase.co/functions/v1".into();
        tokio_test::assert_ok!(config.validate());
    }

    #[test]
    fn test_debug_redacts_anon_key() {
        let mut config = TokenServiceConfig::default();
        config.anon_key = "super-secret".into();
        let printed = format!("{:?}", config);
        assert!(!printed.contains("super-secret"));
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("parley-test-{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(
            &path,
            r#"
[token_service]
functions_url = "https://example.supabase.co/functions/v1"
anon_key = "anon"

[session]
start_policy = "replace"
"#,
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(
            config.token_service.functions_url,
            "https://example.supabase.co/functions/v1"
        );
        assert_eq!(config.token_service.anon_key, "anon");
        assert_eq!(config.session.start_policy, StartPolicy::Replace);
        assert_eq!(config.realtime.model, DEFAULT_MODEL);
        assert_eq!(config.session.channel_label, DEFAULT_CHANNEL_LABEL);
    }
}
