/// Service configuration.
///
/// Non-secret settings live in a TOML file (default `outbreak_watch.toml`,
/// overridable with `OUTBREAK_WATCH_CONFIG`). Every setting has a default,
/// so a missing file is fine. A file that exists but does not parse is fatal.
///
/// Credentials come from the environment (a `.env` file is honoured):
///   TG_CHANNEL_NAME — channel to post to
///   TG_BOT_TOKEN    — bot token
/// Both are required.

use serde::Deserialize;
use std::env;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::error::ConfigError;
use crate::ingest::scraped::{Landmark, DEFAULT_SCRAPED_URL};
use crate::ingest::spreadsheet::DEFAULT_SPREADSHEET_URL;
use crate::report::DEFAULT_TITLE;
use crate::state::DEFAULT_STATE_PATH;

pub const DEFAULT_CONFIG_PATH: &str = "outbreak_watch.toml";
pub const CONFIG_PATH_VAR: &str = "OUTBREAK_WATCH_CONFIG";
pub const CHANNEL_VAR: &str = "TG_CHANNEL_NAME";
pub const TOKEN_VAR: &str = "TG_BOT_TOKEN";

// ---------------------------------------------------------------------------
// Settings file
// ---------------------------------------------------------------------------

/// Which data source to poll, and where.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceConfig {
    Spreadsheet {
        #[serde(default = "default_spreadsheet_url")]
        url: String,
    },
    Scraped {
        #[serde(default = "default_scraped_url")]
        url: String,
        #[serde(default)]
        landmark: Landmark,
    },
}

impl Default for SourceConfig {
    fn default() -> Self {
        SourceConfig::Spreadsheet {
            url: default_spreadsheet_url(),
        }
    }
}

fn default_spreadsheet_url() -> String {
    DEFAULT_SPREADSHEET_URL.to_string()
}

fn default_scraped_url() -> String {
    DEFAULT_SCRAPED_URL.to_string()
}

/// Contents of `outbreak_watch.toml`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Minutes between poll cycles.
    pub poll_interval_minutes: u64,
    /// Where the last-known state blob is kept.
    pub state_path: String,
    /// Heading of the summary message.
    pub title: String,
    pub source: SourceConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            poll_interval_minutes: 15,
            state_path: DEFAULT_STATE_PATH.to_string(),
            title: DEFAULT_TITLE.to_string(),
            source: SourceConfig::default(),
        }
    }
}

/// Parses settings from TOML text.
pub fn parse_settings(contents: &str, path: &str) -> Result<Settings, ConfigError> {
    toml::from_str(contents).map_err(|e| ConfigError::Parse {
        path: path.to_string(),
        message: e.to_string(),
    })
}

/// Loads settings from `path`; defaults if the file does not exist.
pub fn load_settings(path: impl AsRef<Path>) -> Result<Settings, ConfigError> {
    let path = path.as_ref();
    let display = path.display().to_string();

    match fs::read_to_string(path) {
        Ok(contents) => parse_settings(&contents, &display),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(Settings::default()),
        Err(source) => Err(ConfigError::Read { path: display, source }),
    }
}

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

/// Notifier credentials and destination.
#[derive(Clone, PartialEq)]
pub struct Credentials {
    pub channel: String,
    pub bot_token: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("channel", &self.channel)
            .field("bot_token", &"[REDACTED]")
            .finish()
    }
}

impl Credentials {
    /// Builds credentials from a variable lookup. Empty values count as missing.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let require = |name: &'static str| {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::MissingVar(name))
        };

        Ok(Self {
            channel: require(CHANNEL_VAR)?,
            bot_token: require(TOKEN_VAR)?,
        })
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }
}

/// Everything the daemon needs at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub settings: Settings,
    pub credentials: Credentials,
}

impl Config {
    /// Loads `.env`, the settings file and the credentials.
    pub fn load() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();

        let path = env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Ok(Self {
            settings: load_settings(&path)?,
            credentials: Credentials::from_env()?,
        })
    }
}
