// src/error.rs
//! Typed failures at the network seams. Everything above them uses `anyhow`.

use thiserror::Error;

/// Why a now-playing fetch produced no payload.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("now-playing request timed out: {0}")]
    Timeout(#[source] reqwest::Error),

    #[error("now-playing request failed: {0}")]
    Connection(#[source] reqwest::Error),

    #[error("now-playing endpoint returned HTTP {status}")]
    Status { status: u16 },

    #[error("now-playing response malformed: {0}")]
    Malformed(String),
}

impl FetchError {
    /// Split a reqwest error into the timeout / connection variants.
    pub fn from_transport(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout(e)
        } else {
            Self::Connection(e)
        }
    }
}

/// A publish attempt that never got an HTTP status back.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("photo post timed out: {0}")]
    Timeout(#[source] reqwest::Error),

    #[error("photo post failed: {0}")]
    Connection(#[source] reqwest::Error),
}

impl PublishError {
    pub fn from_transport(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout(e)
        } else {
            Self::Connection(e)
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),

    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },

    #[error("reading config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("parsing config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}
