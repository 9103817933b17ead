// Automatic substitution of non-playing starters by bench players.

use serde::Serialize;
use tracing::debug;

use crate::model::{Chip, PlayerId, Position, SquadPick};
use crate::rules::FormationRules;

/// What happened to a pick during substitution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SubStatus {
    Unchanged,
    /// Bench player promoted into the scoring XI.
    SubbedIn,
    /// Starter replaced; scores nothing whatever its nominal multiplier.
    SubbedOut,
}

/// A pick with the live facts substitution needs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SquadEntry {
    pub pick: SquadPick,
    pub position: Position,
    pub minutes: u32,
}

impl SquadEntry {
    pub fn player_id(&self) -> PlayerId {
        self.pick.player_id
    }

    fn is_starter(&self) -> bool {
        self.pick.is_starter()
    }

    fn played(&self) -> bool {
        self.minutes > 0
    }
}

/// Result of substitution for one pick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PickOutcome {
    pub entry: SquadEntry,
    pub status: SubStatus,
    pub multiplier: u8,
}

impl PickOutcome {
    pub fn player_id(&self) -> PlayerId {
        self.entry.player_id()
    }

    /// On the pitch and scoring: an unchanged player with minutes who
    /// counts toward the total, or a promoted bench player.
    pub fn is_playing(&self) -> bool {
        match self.status {
            SubStatus::SubbedIn => true,
            SubStatus::Unchanged => self.entry.played() && self.multiplier > 0,
            SubStatus::SubbedOut => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Formation
// ---------------------------------------------------------------------------

/// Outfield line counts of the scoring XI.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Formation {
    pub defenders: u8,
    pub midfielders: u8,
    pub forwards: u8,
}

impl Formation {
    fn add(&mut self, position: Position) {
        match position {
            Position::Defender => self.defenders += 1,
            Position::Midfielder => self.midfielders += 1,
            Position::Forward => self.forwards += 1,
            Position::Keeper | Position::Unknown => {}
        }
    }

    fn remove(&mut self, position: Position) {
        match position {
            Position::Defender => self.defenders = self.defenders.saturating_sub(1),
            Position::Midfielder => self.midfielders = self.midfielders.saturating_sub(1),
            Position::Forward => self.forwards = self.forwards.saturating_sub(1),
            Position::Keeper | Position::Unknown => {}
        }
    }

    /// Formation after `incoming` takes `outgoing`'s place.
    fn swapped(&self, outgoing: Position, incoming: Position) -> Formation {
        let mut next = *self;
        next.remove(outgoing);
        next.add(incoming);
        next
    }

    pub fn is_legal(&self, rules: &FormationRules) -> bool {
        self.defenders >= rules.min_defenders
            && self.midfielders >= rules.min_midfielders
            && self.forwards >= rules.min_forwards
    }
}

// ---------------------------------------------------------------------------
// Simulation
// ---------------------------------------------------------------------------

/// Run automatic substitutions over a squad.
///
/// With bench boost active every pick scores at a multiplier of at least 1
/// and nothing is substituted. Otherwise:
/// 1. A starting keeper with no minutes is replaced by the bench keeper if
///    the bench keeper has played.
/// 2. Each zero-minute outfield starter, in slot order, is replaced by the
///    first unused bench outfielder with minutes whose promotion keeps the
///    XI's formation legal. A starter with no legal replacement keeps their
///    place and scores nothing.
///
/// Outcomes are returned in slot order.
pub fn simulate(entries: &[SquadEntry], chip: &Chip, formation: &FormationRules) -> Vec<PickOutcome> {
    let mut sorted = entries.to_vec();
    sorted.sort_by_key(|e| e.pick.slot);

    if *chip == Chip::BenchBoost {
        return sorted
            .into_iter()
            .map(|entry| {
                let multiplier = entry.pick.multiplier.max(1);
                PickOutcome {
                    entry,
                    status: SubStatus::Unchanged,
                    multiplier,
                }
            })
            .collect();
    }

    let mut outcomes: Vec<PickOutcome> = sorted
        .into_iter()
        .map(|entry| {
            let multiplier = entry.pick.multiplier;
            PickOutcome {
                entry,
                status: SubStatus::Unchanged,
                multiplier,
            }
        })
        .collect();

    swap_keeper(&mut outcomes);
    swap_outfield(&mut outcomes, formation);

    outcomes
}

fn swap_keeper(outcomes: &mut [PickOutcome]) {
    let starter = outcomes
        .iter()
        .position(|o| o.entry.is_starter() && o.entry.position == Position::Keeper);
    let bench = outcomes
        .iter()
        .position(|o| !o.entry.is_starter() && o.entry.position == Position::Keeper);

    let (Some(starter), Some(bench)) = (starter, bench) else {
        return;
    };

    if !outcomes[starter].entry.played() && outcomes[bench].entry.played() {
        debug!(
            outgoing = outcomes[starter].player_id(),
            incoming = outcomes[bench].player_id(),
            "keeper substitution"
        );
        mark_swap(outcomes, starter, bench);
    }
}

fn swap_outfield(outcomes: &mut [PickOutcome], rules: &FormationRules) {
    // The XI's formation counts every outfield starter still holding a
    // place, including non-players who have not been replaced yet.
    let mut xi = Formation::default();
    for o in outcomes.iter().filter(|o| is_outfield_starter(o)) {
        xi.add(o.entry.position);
    }

    let absentees: Vec<usize> = outcomes
        .iter()
        .enumerate()
        .filter(|(_, o)| is_outfield_starter(o) && !o.entry.played())
        .map(|(i, _)| i)
        .collect();

    let bench: Vec<usize> = outcomes
        .iter()
        .enumerate()
        .filter(|(_, o)| {
            !o.entry.is_starter() && o.entry.position != Position::Keeper && o.entry.played()
        })
        .map(|(i, _)| i)
        .collect();

    let mut used = vec![false; bench.len()];

    for starter in absentees {
        let outgoing = outcomes[starter].entry.position;

        let choice = bench.iter().enumerate().find(|&(b, &idx)| {
            !used[b] && xi.swapped(outgoing, outcomes[idx].entry.position).is_legal(rules)
        });

        match choice {
            Some((b, &idx)) => {
                used[b] = true;
                xi = xi.swapped(outgoing, outcomes[idx].entry.position);
                debug!(
                    outgoing = outcomes[starter].player_id(),
                    incoming = outcomes[idx].player_id(),
                    "outfield substitution"
                );
                mark_swap(outcomes, starter, idx);
            }
            None => {
                debug!(
                    player = outcomes[starter].player_id(),
                    "no legal bench replacement"
                );
            }
        }
    }
}

fn is_outfield_starter(o: &PickOutcome) -> bool {
    o.entry.is_starter() && o.entry.position != Position::Keeper
}

fn mark_swap(outcomes: &mut [PickOutcome], starter: usize, bench: usize) {
    outcomes[starter].status = SubStatus::SubbedOut;
    outcomes[starter].multiplier = 0;
    outcomes[bench].status = SubStatus::SubbedIn;
    outcomes[bench].multiplier = 1;
}
