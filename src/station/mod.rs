// src/station/mod.rs
pub mod azuracast;

use crate::resolve::SongFields;

pub use azuracast::AzuraCastClient;

/// One snapshot of what the station is airing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NowPlaying {
    pub song: SongFields,
    /// Song artwork, else the now-playing artwork; never blank.
    pub art_url: Option<String>,
    pub stream_url: String,
}

/// Something that can tell us what is on air. Failures are handled inside
/// the implementation (logged and alerted) and surface here as `None`.
#[async_trait::async_trait]
pub trait NowPlayingSource: Send + Sync {
    async fn fetch(&self) -> Option<NowPlaying>;
    fn name(&self) -> &'static str;
}
