//! Now-playing announcer — binary entrypoint.
//! Loads settings, starts the optional status server and runs the poll loop
//! until Ctrl-C / SIGTERM.

use anyhow::{Context, Result};
use nowplaying_announcer::{
    build_poll_loop,
    status::{self, StatusState},
    telemetry, AnnouncerConfig,
};

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "ctrl-c handler unavailable");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "SIGTERM handler unavailable");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    telemetry::init_tracing();

    let cfg = AnnouncerConfig::load().context("loading announcer config")?;
    tracing::info!(config = ?cfg, "announcer starting");

    let (poll_loop, store) = build_poll_loop(&cfg);

    if let Some(addr) = cfg.status_addr {
        let metrics = match telemetry::install_metrics_recorder() {
            Ok(h) => Some(h),
            Err(e) => {
                tracing::warn!(error = %format!("{e:#}"), "metrics disabled");
                None
            }
        };
        status::spawn(
            addr,
            StatusState {
                store,
                poll_interval_secs: cfg.poll_interval_secs,
                metrics,
            },
        );
    }

    let cycles = poll_loop.run_until(shutdown_signal()).await;
    tracing::info!(cycles, "announcer stopped");
    Ok(())
}
