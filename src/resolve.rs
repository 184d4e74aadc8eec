// src/resolve.rs
//! Turns the station's partially-filled song object into a stable identity.

use serde::{Deserialize, Serialize};

/// Artist label used when the station gives us nothing better.
pub const UNKNOWN_ARTIST: &str = "Unknown/Mix";

/// Separator AzuraCast uses in the combined `text` field ("Artist - Title").
const TEXT_SEPARATOR: &str = " - ";

/// Raw song fields as the station API reports them. Any of them may be
/// missing, null or blank.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SongFields {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub artist: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub art: Option<String>,
}

/// Normalized `(artist, title)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackIdentity {
    pub artist: String,
    pub title: String,
}

impl TrackIdentity {
    /// An empty title means the station is not reporting a song right now.
    pub fn is_song(&self) -> bool {
        !self.title.is_empty()
    }

    /// Key stored in the last-posted marker.
    pub fn dedup_key(&self) -> String {
        format!("{}|{}", self.artist, self.title)
    }
}

fn non_blank(v: Option<&str>) -> Option<&str> {
    v.map(str::trim).filter(|s| !s.is_empty())
}

/// Resolve title and artist with the fallback chain:
/// explicit fields, then the split `text`, then raw `text`, then the
/// placeholder artist.
pub fn resolve(song: &SongFields) -> TrackIdentity {
    let title = non_blank(song.title.as_deref());
    let artist = non_blank(song.artist.as_deref());

    if let (Some(title), Some(artist)) = (title, artist) {
        return TrackIdentity {
            artist: artist.to_string(),
            title: title.to_string(),
        };
    }

    let text = song.text.as_deref().unwrap_or_default();
    let mut title = title.map(str::to_string).unwrap_or_default();
    let mut artist = artist.map(str::to_string).unwrap_or_default();

    let parts: Vec<&str> = text.split(TEXT_SEPARATOR).collect();
    if parts.len() >= 2 {
        if artist.is_empty() {
            artist = parts[0].trim().to_string();
        }
        if title.is_empty() {
            title = parts[1..].join(TEXT_SEPARATOR).trim().to_string();
        }
    }

    if title.is_empty() {
        title = text.trim().to_string();
    }
    if artist.is_empty() {
        artist = UNKNOWN_ARTIST.to_string();
    }

    TrackIdentity { artist, title }
}
