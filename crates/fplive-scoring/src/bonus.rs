// Per-fixture bonus allocation with tie-aware ranking.

use serde::Serialize;

use crate::bps::effective_bps;
use crate::model::{Fixture, FixtureId, PlayerId, StatSnapshot};
use crate::rules::{RuleSet, BONUS_IDENTIFIER};

/// A player competing for bonus in one fixture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BonusCandidate {
    pub player_id: PlayerId,
    pub bps: i32,
}

/// Bonus awarded to one player in one fixture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BonusAward {
    pub player_id: PlayerId,
    pub bps: i32,
    pub bonus: u32,
}

/// Bonus allocation for a single fixture, highest BPS first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FixtureBonus {
    pub fixture_id: FixtureId,
    /// True once the authority has finished the fixture; predicted awards are
    /// then informational only.
    pub finished: bool,
    pub awards: Vec<BonusAward>,
}

impl FixtureBonus {
    pub fn bonus_for(&self, player_id: PlayerId) -> u32 {
        self.awards
            .iter()
            .find(|a| a.player_id == player_id)
            .map_or(0, |a| a.bonus)
    }
}

/// Allocate bonus from `pool` (normally `[3, 2, 1]`) to candidates ranked by
/// BPS.
///
/// Every player in a run of equal BPS receives the pool value at the cursor,
/// and the cursor then advances by the length of the run. A two-way tie for
/// first therefore takes the 3 and the 2, and the next player gets the 1.
/// Once the cursor passes the end of the pool, everyone else gets 0.
pub fn allocate_bonus(candidates: &[BonusCandidate], pool: &[u32]) -> Vec<BonusAward> {
    let mut ranked = candidates.to_vec();
    // Player id as tiebreak keeps output order deterministic.
    ranked.sort_by(|a, b| b.bps.cmp(&a.bps).then(a.player_id.cmp(&b.player_id)));

    let mut awards = Vec::with_capacity(ranked.len());
    let mut cursor = 0usize;
    let mut i = 0usize;

    while i < ranked.len() {
        let bps = ranked[i].bps;
        let run = ranked[i..].iter().take_while(|c| c.bps == bps).count();
        let bonus = pool.get(cursor).copied().unwrap_or(0);

        for c in &ranked[i..i + run] {
            awards.push(BonusAward {
                player_id: c.player_id,
                bps: c.bps,
                bonus,
            });
        }

        cursor += run;
        i += run;
    }

    awards
}

/// Rank every player who appears in `fixture`'s explain data with minutes
/// played, using effective BPS, and allocate that fixture's bonus.
pub fn allocate_fixture(snapshot: &StatSnapshot, fixture: &Fixture, rules: &RuleSet) -> FixtureBonus {
    let candidates: Vec<BonusCandidate> = snapshot
        .live
        .iter()
        .filter(|(_, stat)| stat.played() && stat.explain_for(fixture.id).is_some())
        .map(|(&player_id, stat)| {
            let position = snapshot.player(player_id).position;
            BonusCandidate {
                player_id,
                bps: effective_bps(stat, position, &rules.bps),
            }
        })
        .collect();

    FixtureBonus {
        fixture_id: fixture.id,
        finished: fixture.finished,
        awards: allocate_bonus(&candidates, rules.bonus_pool),
    }
}

/// Allocate bonus for every started fixture of the snapshot's gameweek.
pub fn allocate_gameweek(snapshot: &StatSnapshot, rules: &RuleSet) -> Vec<FixtureBonus> {
    let mut allocations: Vec<FixtureBonus> = snapshot
        .started_fixtures()
        .map(|f| allocate_fixture(snapshot, f, rules))
        .collect();
    allocations.sort_by_key(|a| a.fixture_id);
    allocations
}

/// Predicted bonus a player should be credited with on top of the
/// authority's live points.
///
/// A fixture's prediction only counts while the authority has not published
/// that fixture's bonus: the fixture is unfinished and the player's explain
/// entry for it carries no bonus line.
pub fn provisional_bonus(
    snapshot: &StatSnapshot,
    allocations: &[FixtureBonus],
    player_id: PlayerId,
) -> u32 {
    let stat = snapshot.live_stat(player_id);
    allocations
        .iter()
        .filter(|a| !a.finished)
        .filter(|a| {
            stat.explain_for(a.fixture_id)
                .is_some_and(|e| !e.has(BONUS_IDENTIFIER))
        })
        .map(|a| a.bonus_for(player_id))
        .sum()
}
