// src/station/azuracast.rs
//! AzuraCast `/api/nowplaying` client.

use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use super::{NowPlaying, NowPlayingSource};
use crate::alert::AlertSink;
use crate::error::FetchError;
use crate::resolve::SongFields;

pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 12;

const USER_AGENT: &str = concat!("nowplaying-announcer/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct StationBody {
    #[serde(default)]
    now_playing: Option<NowPlayingBlock>,
}

#[derive(Debug, Deserialize)]
struct NowPlayingBlock {
    #[serde(default)]
    song: Option<SongFields>,
    #[serde(default)]
    art: Option<String>,
}

/// Parse a now-playing body. A station list is reduced to its first entry,
/// and that entry (or the bare document) must be a JSON object.
pub fn parse_now_playing(body: &str, stream_url: &str) -> Result<NowPlaying, FetchError> {
    let doc: Value = serde_json::from_str(body.trim())
        .map_err(|e| FetchError::Malformed(format!("not JSON: {e}")))?;

    let doc = match doc {
        Value::Array(list) => list
            .into_iter()
            .next()
            .ok_or_else(|| FetchError::Malformed("empty station list".into()))?,
        other => other,
    };
    if !doc.is_object() {
        return Err(FetchError::Malformed(format!(
            "expected a station object, got {doc}"
        )));
    }

    let station: StationBody = serde_json::from_value(doc)
        .map_err(|e| FetchError::Malformed(format!("not a now-playing document: {e}")))?;

    let (song, block_art) = match station.now_playing {
        Some(NowPlayingBlock { song, art }) => (song.unwrap_or_default(), art),
        None => (SongFields::default(), None),
    };

    let art_url = [song.art.as_deref(), block_art.as_deref()]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string);

    Ok(NowPlaying {
        song,
        art_url,
        stream_url: stream_url.to_string(),
    })
}

pub struct AzuraCastClient {
    url: String,
    stream_url: String,
    client: Client,
    timeout: Duration,
    alerts: Arc<dyn AlertSink>,
}

impl AzuraCastClient {
    pub fn new(url: String, stream_url: String, alerts: Arc<dyn AlertSink>) -> Self {
        Self {
            url,
            stream_url,
            client: Client::new(),
            timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
            alerts,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// One bounded GET, with the failure kept typed.
    pub async fn fetch_now_playing(&self) -> Result<NowPlaying, FetchError> {
        let resp = self
            .client
            .get(&self.url)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(FetchError::from_transport)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        let body = resp.text().await.map_err(FetchError::from_transport)?;
        parse_now_playing(&body, &self.stream_url)
    }
}

#[async_trait::async_trait]
impl NowPlayingSource for AzuraCastClient {
    async fn fetch(&self) -> Option<NowPlaying> {
        match self.fetch_now_playing().await {
            Ok(np) => Some(np),
            Err(e) => {
                tracing::warn!(target: "announcer", error = %e, url = %self.url, "now-playing fetch failed");
                counter!("announcer_fetch_errors_total").increment(1);
                self.alerts
                    .alert(&format!("Error fetching now playing: {e}"))
                    .await;
                None
            }
        }
    }

    fn name(&self) -> &'static str {
        "AzuraCast"
    }
}
