//! Runs a single poll cycle and exits (for cron-style scheduling).
//! Exit code 1 only when the announcement could not be posted.

use nowplaying_announcer::{build_poll_loop, telemetry, AnnouncerConfig, CycleOutcome};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    telemetry::init_tracing();

    let cfg = AnnouncerConfig::load()?;
    let (poll_loop, _store) = build_poll_loop(&cfg);

    let outcome = poll_loop.run_cycle().await;
    println!("announce-once: {outcome:?}");

    if matches!(outcome, CycleOutcome::PublishFailed { .. }) {
        std::process::exit(1);
    }
    Ok(())
}
