// Polling loop: fetch a snapshot, score the squad, repeat. Pauses while the
// consuming view is hidden and backs off exponentially on fetch failure.

use std::sync::Arc;
use std::time::Duration;

use fplive_scoring::{score_squad, RuleSet, SquadReport};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::api::{FetchRequest, StatSource};
use crate::config::Config;

// ---------------------------------------------------------------------------
// Backoff
// ---------------------------------------------------------------------------

/// Exponential retry delay: `base * 2^attempt`, capped.
#[derive(Debug, Clone)]
pub struct Backoff {
    base: Duration,
    cap: Duration,
    attempt: u32,
}

impl Backoff {
    pub fn new(base: Duration, cap: Duration) -> Self {
        Backoff {
            base,
            cap,
            attempt: 0,
        }
    }

    /// Delay before the next retry. Advances the attempt counter.
    pub fn next_delay(&mut self) -> Duration {
        let factor = 2u32.checked_pow(self.attempt).unwrap_or(u32::MAX);
        let delay = self.base.checked_mul(factor).unwrap_or(self.cap).min(self.cap);
        self.attempt = self.attempt.saturating_add(1);
        delay
    }

    pub fn reset(&mut self) {
        self.attempt = 0;
    }

    /// Consecutive failures since the last reset.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }
}

// ---------------------------------------------------------------------------
// State machine
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Idle,
    Fetching,
    BackoffWait,
    Paused,
}

/// Tracks where the loop is and how long to wait next.
#[derive(Debug, Clone)]
pub struct PollMachine {
    state: PollState,
    interval: Duration,
    backoff: Backoff,
}

impl PollMachine {
    pub fn new(interval: Duration, backoff: Backoff) -> Self {
        PollMachine {
            state: PollState::Idle,
            interval,
            backoff,
        }
    }

    pub fn state(&self) -> PollState {
        self.state
    }

    pub fn begin_fetch(&mut self) {
        self.state = PollState::Fetching;
    }

    /// Returns the regular interval and clears the backoff.
    pub fn succeeded(&mut self) -> Duration {
        self.backoff.reset();
        self.state = PollState::Idle;
        self.interval
    }

    /// Returns the retry delay.
    pub fn failed(&mut self) -> Duration {
        self.state = PollState::BackoffWait;
        self.backoff.next_delay()
    }

    pub fn pause(&mut self) {
        self.state = PollState::Paused;
    }

    pub fn resume(&mut self) {
        self.state = PollState::Idle;
    }

    pub fn failures(&self) -> u32 {
        self.backoff.attempt()
    }
}

// ---------------------------------------------------------------------------
// Events and settings
// ---------------------------------------------------------------------------

/// Messages from the poller to the presentation layer.
#[derive(Debug)]
pub enum PollEvent {
    Scored(Box<SquadReport>),
    FetchFailed {
        message: String,
        attempt: u32,
        retry_in: Duration,
    },
    Paused,
    Resumed,
}

#[derive(Debug, Clone)]
pub struct PollerSettings {
    pub request: FetchRequest,
    pub interval: Duration,
    pub backoff_base: Duration,
    pub backoff_cap: Duration,
}

impl PollerSettings {
    pub fn from_config(config: &Config) -> Self {
        PollerSettings {
            request: FetchRequest {
                entry_id: config.squad.entry_id,
                gameweek: config.squad.gameweek,
                fallback_depth: config.polling.gameweek_fallback_depth,
            },
            interval: config.polling.interval(),
            backoff_base: config.polling.backoff_base(),
            backoff_cap: config.polling.backoff_cap(),
        }
    }
}

// ---------------------------------------------------------------------------
// Loop
// ---------------------------------------------------------------------------

/// Run until the event receiver or the visibility sender is dropped.
///
/// Each tick scores a brand-new snapshot; nothing from the previous report
/// is reused.
pub async fn run_poller(
    source: Arc<dyn StatSource>,
    settings: PollerSettings,
    rules: &'static RuleSet,
    mut visibility: watch::Receiver<bool>,
    tx: mpsc::Sender<PollEvent>,
) -> anyhow::Result<()> {
    info!(entry = settings.request.entry_id, season = rules.season, "poller started");

    let mut machine = PollMachine::new(
        settings.interval,
        Backoff::new(settings.backoff_base, settings.backoff_cap),
    );

    loop {
        if !*visibility.borrow_and_update() {
            machine.pause();
            debug!("view hidden, pausing");
            if tx.send(PollEvent::Paused).await.is_err() {
                break;
            }
            if !wait_until_visible(&mut visibility).await {
                break;
            }
            machine.resume();
            debug!("view visible, resuming");
            if tx.send(PollEvent::Resumed).await.is_err() {
                break;
            }
        }

        machine.begin_fetch();
        let delay = match source.fetch(&settings.request).await {
            Ok((snapshot, squad)) => {
                let report = score_squad(&snapshot, &squad, rules);
                info!(
                    gameweek = report.gameweek,
                    total = report.total,
                    "squad scored"
                );
                if tx.send(PollEvent::Scored(Box::new(report))).await.is_err() {
                    break;
                }
                machine.succeeded()
            }
            Err(e) => {
                let retry_in = machine.failed();
                let attempt = machine.failures();
                warn!(error = %e, attempt, retry_in_secs = retry_in.as_secs(), "fetch failed");
                let event = PollEvent::FetchFailed {
                    message: e.to_string(),
                    attempt,
                    retry_in,
                };
                if tx.send(event).await.is_err() {
                    break;
                }
                retry_in
            }
        };

        // A visibility change cuts the wait short so pausing (or an
        // immediate refresh on return) takes effect right away.
        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            changed = visibility.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = tx.closed() => break,
        }
    }

    info!("poller stopped");
    Ok(())
}

/// Block until `visibility` reads true. Returns false if the sender is gone.
async fn wait_until_visible(visibility: &mut watch::Receiver<bool>) -> bool {
    loop {
        if visibility.changed().await.is_err() {
            return false;
        }
        if *visibility.borrow_and_update() {
            return true;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
