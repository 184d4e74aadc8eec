// src/config.rs
//! Runtime settings: optional TOML file, then environment overrides.
//!
//! Credentials have no defaults. They must come from the file or from
//! `FB_PAGE_ID` / `FB_ACCESS_TOKEN`, otherwise loading fails.

use std::fmt;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::publish::MAX_BACKOFF_STEP;

pub const ENV_CONFIG_PATH: &str = "ANNOUNCER_CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "config/announcer.toml";

const DEFAULT_NOW_PLAYING_URL: &str = "https://www.mawalkingradio.app/api/nowplaying";
const DEFAULT_STREAM_URL: &str = "https://forwardmystream.com/station/mawalkingradiostation";
const DEFAULT_GRAPH_API_BASE: &str = "https://graph.facebook.com";

#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct AnnouncerConfig {
    pub now_playing_url: String,
    pub stream_url: String,
    pub page_id: String,
    pub access_token: String,
    pub graph_api_base: String,
    pub poll_interval_secs: u64,
    pub fetch_timeout_secs: u64,
    pub publish_timeout_secs: u64,
    pub max_attempts: u32,
    pub backoff_step_secs: u64,
    pub marker_path: PathBuf,
    pub alert_webhook_url: Option<String>,
    pub status_addr: Option<SocketAddr>,
}

impl Default for AnnouncerConfig {
    fn default() -> Self {
        Self {
            now_playing_url: DEFAULT_NOW_PLAYING_URL.to_string(),
            stream_url: DEFAULT_STREAM_URL.to_string(),
            page_id: String::new(),
            access_token: String::new(),
            graph_api_base: DEFAULT_GRAPH_API_BASE.to_string(),
            poll_interval_secs: 7200,
            fetch_timeout_secs: 12,
            publish_timeout_secs: 30,
            max_attempts: 3,
            backoff_step_secs: 3,
            marker_path: PathBuf::from("state/last_posted.txt"),
            alert_webhook_url: None,
            status_addr: None,
        }
    }
}

// Keeps the access token out of logs.
impl fmt::Debug for AnnouncerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnnouncerConfig")
            .field("now_playing_url", &self.now_playing_url)
            .field("stream_url", &self.stream_url)
            .field("page_id", &self.page_id)
            .field("access_token", &format_args!("<{} chars>", self.access_token.len()))
            .field("graph_api_base", &self.graph_api_base)
            .field("poll_interval_secs", &self.poll_interval_secs)
            .field("fetch_timeout_secs", &self.fetch_timeout_secs)
            .field("publish_timeout_secs", &self.publish_timeout_secs)
            .field("max_attempts", &self.max_attempts)
            .field("backoff_step_secs", &self.backoff_step_secs)
            .field("marker_path", &self.marker_path)
            .field("alert_webhook_url", &self.alert_webhook_url.as_ref().map(|_| "<set>"))
            .field("status_addr", &self.status_addr)
            .finish()
    }
}

impl AnnouncerConfig {
    /// Load using file + env fallbacks:
    /// 1) $ANNOUNCER_CONFIG_PATH (must exist)
    /// 2) config/announcer.toml (if present)
    /// 3) built-in defaults
    ///
    /// then apply environment overrides and validate.
    pub fn load() -> Result<Self, ConfigError> {
        let mut cfg = Self::load_file_default()?;
        cfg.apply_env(|key| std::env::var(key).ok())?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    fn load_file_default() -> Result<Self, ConfigError> {
        if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(ConfigError::Invalid {
                    key: ENV_CONFIG_PATH,
                    reason: format!("{} does not exist", pb.display()),
                });
            }
            return Self::from_file(&pb);
        }
        let default_p = PathBuf::from(DEFAULT_CONFIG_PATH);
        if default_p.exists() {
            return Self::from_file(&default_p);
        }
        Ok(Self::default())
    }

    /// Override fields from an environment lookup. Blank values are ignored.
    pub fn apply_env<F>(&mut self, get: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| get(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(v) = get("AZURACAST_API") {
            self.now_playing_url = v;
        }
        if let Some(v) = get("STREAM_URL") {
            self.stream_url = v;
        }
        if let Some(v) = get("FB_PAGE_ID") {
            self.page_id = v;
        }
        if let Some(v) = get("FB_ACCESS_TOKEN") {
            self.access_token = v;
        }
        if let Some(v) = get("FB_GRAPH_API_BASE") {
            self.graph_api_base = v;
        }
        if let Some(v) = get("POST_INTERVAL_SECS") {
            self.poll_interval_secs = parse("POST_INTERVAL_SECS", &v)?;
        }
        if let Some(v) = get("FETCH_TIMEOUT_SECS") {
            self.fetch_timeout_secs = parse("FETCH_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = get("PUBLISH_TIMEOUT_SECS") {
            self.publish_timeout_secs = parse("PUBLISH_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = get("PUBLISH_MAX_ATTEMPTS") {
            self.max_attempts = parse("PUBLISH_MAX_ATTEMPTS", &v)?;
        }
        if let Some(v) = get("PUBLISH_BACKOFF_STEP_SECS") {
            self.backoff_step_secs = parse("PUBLISH_BACKOFF_STEP_SECS", &v)?;
        }
        if let Some(v) = get("LAST_POSTED_PATH") {
            self.marker_path = PathBuf::from(v);
        }
        if let Some(v) = get("ALERT_WEBHOOK_URL") {
            self.alert_webhook_url = Some(v);
        }
        if let Some(v) = get("STATUS_ADDR") {
            self.status_addr = Some(parse("STATUS_ADDR", &v)?);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.page_id.trim().is_empty() {
            return Err(ConfigError::Missing("FB_PAGE_ID"));
        }
        if self.access_token.trim().is_empty() {
            return Err(ConfigError::Missing("FB_ACCESS_TOKEN"));
        }
        if self.now_playing_url.trim().is_empty() {
            return Err(ConfigError::Missing("AZURACAST_API"));
        }
        if self.poll_interval_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "POST_INTERVAL_SECS",
                reason: "must be at least 1".into(),
            });
        }
        if self.max_attempts == 0 {
            return Err(ConfigError::Invalid {
                key: "PUBLISH_MAX_ATTEMPTS",
                reason: "must be at least 1".into(),
            });
        }
        if self.fetch_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "FETCH_TIMEOUT_SECS",
                reason: "must be at least 1".into(),
            });
        }
        if self.publish_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "PUBLISH_TIMEOUT_SECS",
                reason: "must be at least 1".into(),
            });
        }
        if self.backoff_step_secs > MAX_BACKOFF_STEP.as_secs() {
            return Err(ConfigError::Invalid {
                key: "PUBLISH_BACKOFF_STEP_SECS",
                reason: format!("must be at most {}", MAX_BACKOFF_STEP.as_secs()),
            });
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn publish_timeout(&self) -> Duration {
        Duration::from_secs(self.publish_timeout_secs)
    }

    pub fn backoff_step(&self) -> Duration {
        Duration::from_secs(self.backoff_step_secs)
    }
}

fn parse<T>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    raw.parse::<T>().map_err(|e| ConfigError::Invalid {
        key,
        reason: format!("{raw:?}: {e}"),
    })
}
