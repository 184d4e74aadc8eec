// src/lib.rs
// Public library surface for the binaries and integration tests.

pub mod alert;
pub mod config;
pub mod dedup;
pub mod error;
pub mod publish;
pub mod resolve;
pub mod scheduler;
pub mod station;
pub mod status;
pub mod telemetry;

use std::sync::Arc;

// ---- Re-exports for stable public API ----
pub use crate::alert::{AlertMux, AlertSink};
pub use crate::config::AnnouncerConfig;
pub use crate::dedup::{DedupStore, FileDedupStore};
pub use crate::resolve::{resolve, TrackIdentity};
pub use crate::scheduler::{CycleOutcome, PollLoop};

use crate::publish::{GraphApiPoster, RetryingPublisher};
use crate::station::AzuraCastClient;

/// Wire the production components described by `cfg`.
/// The marker store is returned separately so the status server can share it.
pub fn build_poll_loop(cfg: &AnnouncerConfig) -> (PollLoop, Arc<FileDedupStore>) {
    let mux = AlertMux::new(cfg.alert_webhook_url.as_deref());
    tracing::info!(target: "announcer", sinks = mux.sink_count(), "alert sinks configured");
    let alerts: Arc<dyn AlertSink> = Arc::new(mux);

    let source = AzuraCastClient::new(
        cfg.now_playing_url.clone(),
        cfg.stream_url.clone(),
        alerts.clone(),
    )
    .with_timeout(cfg.fetch_timeout());

    let poster = GraphApiPoster::new(&cfg.graph_api_base, &cfg.page_id, cfg.access_token.clone())
        .with_timeout(cfg.publish_timeout());
    let publisher = RetryingPublisher::new(poster, alerts.clone())
        .with_max_attempts(cfg.max_attempts)
        .with_backoff_step(cfg.backoff_step());

    let store = Arc::new(FileDedupStore::new(cfg.marker_path.clone()));

    let poll_loop = PollLoop::new(Arc::new(source), store.clone(), Arc::new(publisher), alerts)
        .with_interval(cfg.poll_interval());

    (poll_loop, store)
}
