//! # configs
//!
//! Layered settings for the board client. Priority, lowest first:
//! built-in defaults, `config/default.toml`, the file named by `--config`
//! or `RANT_CONFIG`, then `RANT__SECTION__KEY` environment variables.
//! A `.env` file is loaded before any of that.

use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

pub const ENV_PREFIX: &str = "RANT";
pub const CONFIG_PATH_ENV: &str = "RANT_CONFIG";
const DEFAULT_FILE: &str = "config/default";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub api: ApiSettings,
    pub session: SessionSettings,
    pub board: BoardSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiSettings {
    /// Origin (plus optional path prefix) the `/api/...` routes hang off.
    pub base_url: String,
    /// Unset means requests may hang forever.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionSettings {
    pub path: PathBuf,
    pub key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BoardSettings {
    pub title: String,
    pub require_login_to_post: bool,
    pub login_url: String,
    pub time_display: TimeDisplaySetting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeDisplaySetting {
    Local,
    Utc,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

impl Settings {
    /// Loads `.env`, then every layer. `explicit` wins over `RANT_CONFIG`.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(path) => debug!(path = %path.display(), "loaded .env"),
            Err(e) if e.not_found() => {}
            Err(e) => warn!(error = %e, "ignoring unreadable .env"),
        }
        let file = explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from));
        Self::from_sources(file.as_deref(), environment())
    }

    /// Builds settings from an optional file and an environment source.
    pub fn from_sources(file: Option<&Path>, env: Environment) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .set_default("api.base_url", "http://127.0.0.1:3000")?
            .set_default("session.path", "./session.json")?
            .set_default("session.key", "currentUser")?
            .set_default("board.title", "Rants")?
            .set_default("board.require_login_to_post", false)?
            .set_default("board.login_url", "login.html")?
            .set_default("board.time_display", "local")?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            .add_source(File::with_name(DEFAULT_FILE).required(false));

        if let Some(path) = file {
            debug!(path = %path.display(), "using configuration file");
            builder = builder.add_source(File::from(path).required(true));
        }

        let settings: Settings = builder.add_source(env).build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Replaces the API base (e.g. from a command-line flag) and re-validates.
    pub fn override_api_base(&mut self, base_url: impl Into<String>) -> Result<(), ConfigError> {
        self.api.base_url = base_url.into();
        self.validate()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let base = Url::parse(&self.api.base_url)
            .map_err(|e| ConfigError::Invalid(format!("api.base_url {:?}: {e}", self.api.base_url)))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid(format!(
                "api.base_url must be http or https, got {:?}",
                base.scheme()
            )));
        }
        if self.api.request_timeout_secs == Some(0) {
            return Err(ConfigError::Invalid(
                "api.request_timeout_secs must be positive when set".to_string(),
            ));
        }
        if self.session.key.trim().is_empty() {
            return Err(ConfigError::Invalid("session.key must not be empty".to_string()));
        }
        if self.board.login_url.trim().is_empty() {
            return Err(ConfigError::Invalid("board.login_url must not be empty".to_string()));
        }
        Ok(())
    }
}

/// `RANT__API__BASE_URL=...` style variables.
pub fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .separator("__")
        .try_parsing(true)
}
