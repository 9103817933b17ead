// Live squad scoring: one pure pass from a stat snapshot and a squad to a
// scored report. Every call recomputes from scratch; nothing carries over
// between polls.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::aggregate::{effective_points, squad_total};
use crate::autosub::{simulate, PickOutcome, SquadEntry, SubStatus};
use crate::bonus::{allocate_gameweek, provisional_bonus, FixtureBonus};
use crate::captaincy::{resolve_captaincy, ArmbandResolution};
use crate::defensive::{evaluate, DefensiveContributionRecord};
use crate::model::{Chip, Player, Squad, StatSnapshot};
use crate::rules::RuleSet;

/// One pick, fully scored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredPick {
    pub player: Player,
    pub slot: u8,
    pub minutes: u32,
    pub status: SubStatus,
    /// Final multiplier after substitution and armband failover.
    pub multiplier: u8,
    /// Authority's live points plus any provisional bonus.
    pub live_points: i32,
    pub provisional_bonus: u32,
    pub effective_points: i32,
    pub defensive: DefensiveContributionRecord,
}

/// Everything the presentation layer needs for one squad on one poll.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SquadReport {
    pub entry_id: u64,
    pub gameweek: u32,
    pub season: String,
    pub chip: Chip,
    pub fetched_at: DateTime<Utc>,
    pub picks: Vec<ScoredPick>,
    pub armband: ArmbandResolution,
    pub fixture_bonus: Vec<FixtureBonus>,
    pub transfer_cost: i32,
    pub total: i32,
}

impl SquadReport {
    /// Picks that count toward the total.
    pub fn scoring_picks(&self) -> impl Iterator<Item = &ScoredPick> {
        self.picks
            .iter()
            .filter(|p| p.status != SubStatus::SubbedOut && p.multiplier > 0)
    }

    /// Sum of predicted bonus currently included in the total.
    pub fn provisional_bonus_total(&self) -> i32 {
        self.scoring_picks()
            .map(|p| p.provisional_bonus as i32 * i32::from(p.multiplier))
            .sum()
    }
}

/// Score a squad against a snapshot.
pub fn score_squad(snapshot: &StatSnapshot, squad: &Squad, rules: &RuleSet) -> SquadReport {
    let fixture_bonus = allocate_gameweek(snapshot, rules);

    let entries: Vec<SquadEntry> = squad
        .picks
        .iter()
        .map(|pick| SquadEntry {
            pick: pick.clone(),
            position: snapshot.player(pick.player_id).position,
            minutes: snapshot.live_stat(pick.player_id).minutes,
        })
        .collect();

    let mut outcomes = simulate(&entries, &squad.chip, &rules.formation);
    let armband = resolve_captaincy(&mut outcomes, &squad.chip);

    let picks: Vec<ScoredPick> = outcomes
        .iter()
        .map(|outcome| score_pick(snapshot, &fixture_bonus, outcome, rules))
        .collect();

    let total = squad_total(
        outcomes.iter().zip(picks.iter().map(|p| p.live_points)),
        squad.transfer_cost,
    );

    debug!(
        entry = squad.entry_id,
        gameweek = snapshot.gameweek,
        total,
        "squad scored"
    );

    SquadReport {
        entry_id: squad.entry_id,
        gameweek: snapshot.gameweek,
        season: rules.season.to_string(),
        chip: squad.chip.clone(),
        fetched_at: snapshot.fetched_at,
        picks,
        armband,
        fixture_bonus,
        transfer_cost: squad.transfer_cost,
        total,
    }
}

fn score_pick(
    snapshot: &StatSnapshot,
    fixture_bonus: &[FixtureBonus],
    outcome: &PickOutcome,
    rules: &RuleSet,
) -> ScoredPick {
    let player_id = outcome.player_id();
    let player = snapshot.player(player_id).into_owned();
    let stat = snapshot.live_stat(player_id);

    let bonus = provisional_bonus(snapshot, fixture_bonus, player_id);
    let live_points = stat.total_points + bonus as i32;

    ScoredPick {
        defensive: evaluate(player_id, stat, player.position, &rules.defensive),
        player,
        slot: outcome.entry.pick.slot,
        minutes: outcome.entry.minutes,
        status: outcome.status,
        multiplier: outcome.multiplier,
        live_points,
        provisional_bonus: bonus,
        effective_points: effective_points(outcome, live_points),
    }
}
