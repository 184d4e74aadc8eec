// src/telemetry.rs
//! Logging setup and metric registration.

use anyhow::{Context, Result};
use metrics::{describe_counter, describe_gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DEFAULT_FILTER: &str = "nowplaying_announcer=info,announcer=info,alert=info,warn";

/// One-time metrics registration (so series show up on /metrics).
pub fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("announcer_cycles_total", "Poll cycles started.");
        describe_counter!("announcer_posts_total", "Announcements posted successfully.");
        describe_counter!(
            "announcer_skips_total",
            "Cycles skipped because the track was already posted."
        );
        describe_counter!(
            "announcer_fetch_errors_total",
            "Now-playing fetches that failed (transport, status or shape)."
        );
        describe_counter!(
            "announcer_publish_attempts_total",
            "Individual photo post attempts, retries included."
        );
        describe_counter!(
            "announcer_publish_failures_total",
            "Announcements given up after the retry budget."
        );
        describe_counter!("announcer_alerts_total", "Alerts raised to the operator.");
        describe_gauge!(
            "announcer_last_cycle_ts",
            "Unix ts when the poll loop last ran a cycle."
        );
    });
}

/// Install the global tracing subscriber.
/// `RUST_LOG` overrides the default filter; `LOG_FORMAT=json` switches to JSON lines.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    let res = if json {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer().compact()).try_init()
    };
    if let Err(e) = res {
        // Already installed (tests, or a second init from a bin).
        eprintln!("tracing init skipped: {e}");
    }
}

/// Install the Prometheus recorder once per process and hand out its handle.
pub fn install_metrics_recorder() -> Result<PrometheusHandle> {
    static HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();
    let handle = HANDLE.get_or_try_init(|| {
        PrometheusBuilder::new()
            .install_recorder()
            .context("prometheus: install recorder")
    })?;
    ensure_metrics_described();
    Ok(handle.clone())
}
