// Wire payloads to the scoring model.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use fplive_scoring::model::{
    Chip, ExplainEntry, ExplainStat, Fixture, LiveStat, Player, Position, Squad, SquadPick,
    StatSnapshot,
};

use crate::api::{BootstrapStatic, EventLive, WireFixture, WireLiveElement, WirePicks};

/// Assemble one poll's snapshot. Fixtures tagged with another gameweek are
/// dropped; untagged ones are kept under `gameweek`.
pub fn build_snapshot(
    gameweek: u32,
    bootstrap: &BootstrapStatic,
    live: EventLive,
    fixtures: Vec<WireFixture>,
    fetched_at: DateTime<Utc>,
) -> StatSnapshot {
    let players: HashMap<u32, Player> = bootstrap
        .elements
        .iter()
        .map(|e| {
            (
                e.id,
                Player {
                    id: e.id,
                    web_name: e.web_name.clone(),
                    position: Position::from_element_type(e.element_type),
                    team: e.team,
                },
            )
        })
        .collect();

    let live: HashMap<u32, LiveStat> = live
        .elements
        .into_iter()
        .map(|e| (e.id, live_stat(e)))
        .collect();

    let fixtures = fixtures
        .into_iter()
        .filter(|f| f.event.map_or(true, |event| event == gameweek))
        .map(|f| Fixture {
            id: f.id,
            gameweek: f.event.unwrap_or(gameweek),
            team_h: f.team_h,
            team_a: f.team_a,
            team_h_score: f.team_h_score,
            team_a_score: f.team_a_score,
            started: f.started.unwrap_or(false),
            finished: f.finished,
            minutes: f.minutes,
        })
        .collect();

    StatSnapshot {
        gameweek,
        players,
        live,
        fixtures,
        fetched_at,
    }
}

fn live_stat(element: WireLiveElement) -> LiveStat {
    let s = element.stats;
    LiveStat {
        minutes: s.minutes,
        goals_scored: s.goals_scored,
        assists: s.assists,
        clean_sheets: s.clean_sheets,
        goals_conceded: s.goals_conceded,
        saves: s.saves,
        saves_inside_box: s.saves_inside_box,
        saves_outside_box: s.saves_outside_box,
        tackles: s.tackles,
        clearances_blocks_interceptions: s.clearances_blocks_interceptions,
        recoveries: s.recoveries,
        goalline_clearances: s.goalline_clearances,
        penalties_saved: s.penalties_saved,
        penalties_missed: s.penalties_missed,
        yellow_cards: s.yellow_cards,
        red_cards: s.red_cards,
        own_goals: s.own_goals,
        bonus: s.bonus,
        bps: s.bps,
        total_points: s.total_points,
        explain: element
            .explain
            .into_iter()
            .map(|x| ExplainEntry {
                fixture_id: x.fixture,
                stats: x
                    .stats
                    .into_iter()
                    .map(|st| ExplainStat {
                        identifier: st.identifier,
                        points: st.points,
                        value: st.value,
                    })
                    .collect(),
            })
            .collect(),
    }
}

/// Squad for `entry_id`, picks ordered by slot.
pub fn build_squad(entry_id: u64, gameweek: u32, wire: WirePicks) -> Squad {
    let mut picks: Vec<SquadPick> = wire
        .picks
        .into_iter()
        .map(|p| SquadPick {
            player_id: p.element,
            slot: p.position,
            multiplier: p.multiplier,
            is_captain: p.is_captain,
            is_vice_captain: p.is_vice_captain,
        })
        .collect();
    picks.sort_by_key(|p| p.slot);

    Squad {
        entry_id,
        gameweek,
        picks,
        chip: Chip::from_wire(wire.active_chip.as_deref()),
        transfer_cost: wire.entry_history.event_transfers_cost,
    }
}
