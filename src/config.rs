use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use validator::Validate;

use crate::engine::EngineOptions;

/// Application configuration
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct Settings {
    #[validate(nested)]
    pub store: StoreSettings,
    #[serde(default)]
    pub collections: CollectionSettings,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    #[validate(nested)]
    pub matching: MatchingSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct StoreSettings {
    #[validate(length(min = 1))]
    pub endpoint: String,
    pub api_key: String,
    pub project_id: String,
    pub database_id: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 { 30 }

#[derive(Debug, Clone, Deserialize)]
pub struct CollectionSettings {
    #[serde(default = "default_accounts")]
    pub accounts: String,
    #[serde(default = "default_communities")]
    pub communities: String,
    #[serde(default = "default_meetings")]
    pub meetings: String,
    #[serde(default = "default_ratings")]
    pub ratings: String,
}

impl Default for CollectionSettings {
    fn default() -> Self {
        Self {
            accounts: default_accounts(),
            communities: default_communities(),
            meetings: default_meetings(),
            ratings: default_ratings(),
        }
    }
}

fn default_accounts() -> String { "accounts".to_string() }
fn default_communities() -> String { "communities".to_string() }
fn default_meetings() -> String { "meetings".to_string() }
fn default_ratings() -> String { "ratings".to_string() }

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CacheSettings {
    /// Redis L2 tier; member reads are cached in-process only when unset
    pub redis_url: Option<String>,
    pub ttl_secs: Option<u64>,
    pub l1_cache_size: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct MatchingSettings {
    #[serde(default = "default_min_participants")]
    #[validate(range(min = 2))]
    pub min_participants: usize,
    #[validate(range(min = 1, max = 168))]
    pub default_meeting_length: Option<u32>,
}

impl Default for MatchingSettings {
    fn default() -> Self {
        Self {
            min_participants: default_min_participants(),
            default_meeting_length: None,
        }
    }
}

fn default_min_participants() -> usize { 2 }

impl From<&MatchingSettings> for EngineOptions {
    fn from(settings: &MatchingSettings) -> Self {
        Self {
            min_participants: settings.min_participants,
            default_meeting_length: settings.default_meeting_length,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

/// Errors raised while loading settings
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Invalid settings: {0}")]
    Invalid(#[from] validator::ValidationErrors),
}

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with MEETUP_)
    pub fn load() -> Result<Self, SettingsError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., MEETUP__STORE__ENDPOINT -> store.endpoint
            .add_source(environment())
            .build()?;

        Self::finish(settings)
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(environment())
            .build()?;

        Self::finish(settings)
    }

    fn finish(settings: Config) -> Result<Self, SettingsError> {
        let settings: Settings = settings.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }
}

fn environment() -> Environment {
    Environment::with_prefix("MEETUP")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}
