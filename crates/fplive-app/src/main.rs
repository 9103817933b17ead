// fplive entry point.
//
// Startup sequence:
// 1. Initialize tracing (stderr, so stdout carries only the report)
// 2. Load config and resolve the season's rules
// 3. Build the HTTP client
// 4. Spawn the poller
// 5. Print each scored report until Ctrl+C

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use fplive_app::api::FplClient;
use fplive_app::config;
use fplive_app::poller::{run_poller, PollEvent, PollerSettings};
use fplive_app::summary;
use tokio::sync::{mpsc, watch};
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing()?;
    info!("fplive starting up");

    let config = config::load_config().context("failed to load configuration")?;
    let rules = config.rules().context("failed to resolve scoring rules")?;
    info!(
        entry = config.squad.entry_id,
        season = rules.season,
        interval_secs = config.polling.interval_secs,
        "config loaded"
    );

    let client = FplClient::from_config(&config.api).context("failed to build HTTP client")?;
    let settings = PollerSettings::from_config(&config);

    // The terminal is always visible; the sender only has to stay alive.
    let (_visibility_tx, visibility_rx) = watch::channel(true);
    let (event_tx, mut event_rx) = mpsc::channel(16);

    let poller = tokio::spawn(async move {
        if let Err(e) = run_poller(Arc::new(client), settings, rules, visibility_rx, event_tx).await {
            error!("poller error: {e}");
        }
    });

    loop {
        tokio::select! {
            event = event_rx.recv() => match event {
                Some(PollEvent::Scored(report)) => {
                    println!("{}", summary::headline(&report));
                    for row in summary::pick_rows(&report) {
                        println!("  {row}");
                    }
                }
                Some(PollEvent::FetchFailed { message, attempt, retry_in }) => {
                    println!(
                        "fetch failed ({message}), attempt {attempt}, retrying in {}s",
                        retry_in.as_secs()
                    );
                }
                Some(PollEvent::Paused) | Some(PollEvent::Resumed) => {}
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl+C received, shutting down");
                break;
            }
        }
    }

    drop(event_rx);
    let _ = tokio::time::timeout(Duration::from_secs(5), poller).await;

    info!("fplive shut down cleanly");
    Ok(())
}

/// Log to stderr with an env-overridable filter.
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("fplive=info,fplive_app=info,fplive_scoring=info,warn")
        }))
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
