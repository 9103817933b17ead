// End-to-end: provider JSON payloads through conversion, scoring, and the
// polling loop, with an in-memory source standing in for HTTP.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use fplive_app::api::{
    search_gameweeks, ApiError, BootstrapStatic, EventLive, FetchRequest, StatSource, WireFixture,
    WirePicks,
};
use fplive_app::convert::{build_snapshot, build_squad};
use fplive_app::poller::{run_poller, PollEvent, PollerSettings};
use fplive_scoring::autosub::SubStatus;
use fplive_scoring::model::{Chip, Squad, StatSnapshot};
use fplive_scoring::{score_squad, RuleSet};
use tokio::sync::{mpsc, watch};

// ===========================================================================
// Payloads
// ===========================================================================

/// Elements 1..=15 form the squad (1 GK, 2-5 DEF, 6-9 MID, 10-11 FWD,
/// bench 12 GK, 13 DEF, 14 MID, 15 FWD); 50 is an opponent.
fn bootstrap_json() -> String {
    let mut elements: Vec<String> = (1..=15u32)
        .map(|id| {
            let element_type = match id {
                1 | 12 => 1,
                2..=5 | 13 => 2,
                6..=9 | 14 => 3,
                _ => 4,
            };
            format!(r#"{{"id": {id}, "web_name": "P{id}", "element_type": {element_type}, "team": 1}}"#)
        })
        .collect();
    elements.push(r#"{"id": 50, "web_name": "Rival", "element_type": 4, "team": 2}"#.into());
    format!(
        r#"{{"elements": [{}], "events": [{{"id": 7, "is_current": true, "finished": false}}]}}"#,
        elements.join(",")
    )
}

/// Everyone plays 90 except starting defender 4 and bench MID 14.
/// Element 50 leads the BPS table; 8 is second.
fn live_json() -> String {
    let mut elements: Vec<String> = Vec::new();
    for id in (1..=15u32).chain([50]) {
        let (minutes, bps, points) = match id {
            4 | 14 => (0, 0, 0),
            50 => (90, 45, 9),
            8 => (90, 30, 7),
            _ => (90, 12, 2),
        };
        let explain = if minutes > 0 {
            format!(
                r#"[{{"fixture": 61, "stats": [{{"identifier": "minutes", "points": 2, "value": {minutes}}}]}}]"#
            )
        } else {
            "[]".to_string()
        };
        elements.push(format!(
            r#"{{"id": {id}, "stats": {{"minutes": {minutes}, "bps": {bps}, "total_points": {points}, "bonus": 0}}, "explain": {explain}}}"#
        ));
    }
    format!(r#"{{"elements": [{}]}}"#, elements.join(","))
}

fn fixtures_json() -> &'static str {
    r#"[{"id": 61, "event": 7, "team_h": 1, "team_a": 2, "team_h_score": 2, "team_a_score": 1,
         "started": true, "finished": false, "minutes": 85}]"#
}

fn picks_json() -> String {
    let picks: Vec<String> = (1..=15u32)
        .map(|id| {
            let multiplier = match id {
                8 => 2,
                1..=11 => 1,
                _ => 0,
            };
            format!(
                r#"{{"element": {id}, "position": {id}, "multiplier": {multiplier}, "is_captain": {}, "is_vice_captain": {}}}"#,
                id == 8,
                id == 9
            )
        })
        .collect();
    format!(
        r#"{{"active_chip": null, "entry_history": {{"event_transfers_cost": 4}}, "picks": [{}]}}"#,
        picks.join(",")
    )
}

fn decode() -> (StatSnapshot, Squad) {
    let bootstrap: BootstrapStatic = serde_json::from_str(&bootstrap_json()).unwrap();
    let live: EventLive = serde_json::from_str(&live_json()).unwrap();
    let fixtures: Vec<WireFixture> = serde_json::from_str(fixtures_json()).unwrap();
    let picks: WirePicks = serde_json::from_str(&picks_json()).unwrap();

    let at = Utc.with_ymd_and_hms(2025, 10, 4, 16, 45, 0).unwrap();
    let snapshot = build_snapshot(7, &bootstrap, live, fixtures, at);
    let squad = build_squad(1234, 7, picks);
    (snapshot, squad)
}

// ===========================================================================
// In-memory source
// ===========================================================================

/// Serves the decoded payloads; picks exist only for `picks_gameweek`.
struct MemorySource {
    picks_gameweek: u32,
}

#[async_trait]
impl StatSource for MemorySource {
    async fn fetch(&self, request: &FetchRequest) -> Result<(StatSnapshot, Squad), ApiError> {
        let requested = request.gameweek.unwrap_or(7);
        let (gameweek, (snapshot, squad)) =
            search_gameweeks(requested, request.fallback_depth, |gw| async move {
                if gw == self.picks_gameweek {
                    Ok(decode())
                } else {
                    Err(ApiError::NotFound {
                        url: format!("entry/1234/event/{gw}/picks/"),
                    })
                }
            })
            .await?;
        assert_eq!(gameweek, snapshot.gameweek);
        Ok((snapshot, squad))
    }
}

fn settings(gameweek: u32) -> PollerSettings {
    PollerSettings {
        request: FetchRequest {
            entry_id: 1234,
            gameweek: Some(gameweek),
            fallback_depth: 2,
        },
        interval: Duration::from_secs(60),
        backoff_base: Duration::from_secs(5),
        backoff_cap: Duration::from_secs(300),
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[test]
fn decoded_payloads_score() {
    let (snapshot, squad) = decode();
    let report = score_squad(&snapshot, &squad, RuleSet::current());

    let status = |id: u32| {
        report
            .picks
            .iter()
            .find(|p| p.player.id == id)
            .map(|p| p.status)
            .unwrap()
    };
    // DEF 4 out; bench MID 14 did not play so DEF 13 comes in (4-4-2).
    assert_eq!(status(4), SubStatus::SubbedOut);
    assert_eq!(status(13), SubStatus::SubbedIn);
    assert_eq!(status(14), SubStatus::Unchanged);

    // Rival 3, captain 8 takes 2 provisional: (7 + 2) * 2 = 18.
    let captain = report.picks.iter().find(|p| p.player.id == 8).unwrap();
    assert_eq!(captain.provisional_bonus, 2);
    assert_eq!(captain.effective_points, 18);

    // Nine other playing starters and sub 13 score 2 + 1 provisional each;
    // the whole 12-BPS run ties for third.
    assert_eq!(report.chip, Chip::None);
    assert_eq!(report.transfer_cost, 4);
    assert_eq!(report.total, 18 + 10 * 3 - 4);
}

#[tokio::test]
async fn poller_falls_back_to_earlier_gameweek() {
    tokio::time::pause();
    let (_vis_tx, vis_rx) = watch::channel(true);
    let (tx, mut rx) = mpsc::channel(4);

    let source = Arc::new(MemorySource { picks_gameweek: 7 });
    let handle = tokio::spawn(run_poller(source, settings(8), RuleSet::current(), vis_rx, tx));

    match rx.recv().await {
        Some(PollEvent::Scored(report)) => {
            assert_eq!(report.gameweek, 7);
            assert_eq!(report.entry_id, 1234);
            assert_eq!(report.total, 44);
        }
        other => panic!("expected Scored, got {other:?}"),
    }

    drop(rx);
    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn poller_reports_missing_picks() {
    tokio::time::pause();
    let (_vis_tx, vis_rx) = watch::channel(true);
    let (tx, mut rx) = mpsc::channel(4);

    let source = Arc::new(MemorySource { picks_gameweek: 2 });
    let handle = tokio::spawn(run_poller(source, settings(8), RuleSet::current(), vis_rx, tx));

    match rx.recv().await {
        Some(PollEvent::FetchFailed { message, retry_in, .. }) => {
            assert!(message.contains("6..=8"));
            assert_eq!(retry_in, Duration::from_secs(5));
        }
        other => panic!("expected FetchFailed, got {other:?}"),
    }

    drop(rx);
    handle.await.unwrap().unwrap();
}
