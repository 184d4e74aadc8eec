// src/scheduler.rs
//! The poll loop: fetch, resolve, dedup check, publish, commit, sleep.
//!
//! Runs one cycle immediately, then one cycle per interval. Exactly one sleep
//! happens per cycle whatever the branch. The shutdown future is only
//! observed while sleeping, so a cycle in progress always finishes.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use metrics::{counter, gauge};

use crate::alert::AlertSink;
use crate::dedup::DedupStore;
use crate::publish::{Announcement, AnnouncementPublisher};
use crate::resolve::resolve;
use crate::station::NowPlayingSource;
use crate::telemetry::ensure_metrics_described;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(7200);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Fetch failed or the station reports no song.
    NoSong,
    AlreadyPosted { key: String },
    Posted { key: String },
    /// Retry budget exhausted; the marker was left alone.
    PublishFailed { key: String },
}

pub struct PollLoop {
    source: Arc<dyn NowPlayingSource>,
    store: Arc<dyn DedupStore>,
    publisher: Arc<dyn AnnouncementPublisher>,
    alerts: Arc<dyn AlertSink>,
    interval: Duration,
}

impl PollLoop {
    pub fn new(
        source: Arc<dyn NowPlayingSource>,
        store: Arc<dyn DedupStore>,
        publisher: Arc<dyn AnnouncementPublisher>,
        alerts: Arc<dyn AlertSink>,
    ) -> Self {
        Self {
            source,
            store,
            publisher,
            alerts,
            interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub async fn run_cycle(&self) -> CycleOutcome {
        ensure_metrics_described();
        counter!("announcer_cycles_total").increment(1);
        gauge!("announcer_last_cycle_ts").set(chrono::Utc::now().timestamp() as f64);

        let Some(np) = self.source.fetch().await else {
            tracing::info!(target: "announcer", source = self.source.name(), "no song data retrieved");
            return CycleOutcome::NoSong;
        };

        let track = resolve(&np.song);
        if !track.is_song() {
            tracing::info!(target: "announcer", "no song currently playing");
            return CycleOutcome::NoSong;
        }

        let key = track.dedup_key();
        if self.store.was_last_posted(&key).await {
            counter!("announcer_skips_total").increment(1);
            tracing::info!(target: "announcer", %key, "already posted, skipping");
            return CycleOutcome::AlreadyPosted { key };
        }

        let announcement = Announcement::for_track(&track, np.art_url, np.stream_url);
        if !self.publisher.publish(&announcement).await {
            tracing::error!(target: "announcer", %key, "failed to post, marker unchanged");
            return CycleOutcome::PublishFailed { key };
        }

        if let Err(e) = self.store.commit(&key).await {
            tracing::error!(target: "announcer", %key, error = %format!("{e:#}"), "posted but could not save marker");
            self.alerts
                .alert(&format!(
                    "Posted \"{key}\" but could not save the last-posted marker: {e:#}"
                ))
                .await;
        } else {
            tracing::info!(target: "announcer", %key, "posted to Facebook");
        }
        CycleOutcome::Posted { key }
    }

    /// Run cycles until `shutdown` resolves. Returns the number of cycles run.
    pub async fn run_until<F>(&self, shutdown: F) -> u64
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut cycles = 0u64;

        loop {
            let outcome = self.run_cycle().await;
            cycles += 1;
            tracing::debug!(target: "announcer", cycle = cycles, ?outcome, "cycle finished");

            tracing::info!(
                target: "announcer",
                "sleeping for {:.2} hours",
                self.interval.as_secs_f64() / 3600.0
            );
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    tracing::info!(target: "announcer", cycles, "shutdown requested, stopping poll loop");
                    return cycles;
                }
                _ = tokio::time::sleep(self.interval) => {}
            }
        }
    }
}
