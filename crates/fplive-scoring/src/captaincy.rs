// Captain armband failover after substitutions.

use serde::Serialize;
use tracing::debug;

use crate::autosub::{PickOutcome, SubStatus};
use crate::model::{Chip, PlayerId};

/// Captain multiplier when the pick does not carry a higher one.
pub const CAPTAIN_MULTIPLIER: u8 = 2;

/// Who ended up wearing the armband.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ArmbandResolution {
    /// The captain played (or no captain was picked).
    Captain,
    /// The captain did not play and the vice-captain took over.
    ViceCaptain { player_id: PlayerId },
    /// Neither played; nobody scores double.
    Vacant,
}

/// Apply armband failover to substitution outcomes in place.
///
/// A captain who was subbed out, or who has no minutes and was not promoted,
/// drops to a multiplier of 0. If the vice-captain is playing they inherit
/// the captain's nominal multiplier (2, or 3 under triple captain). There is
/// no further fallback past the vice-captain.
///
/// Under bench boost every pick scores, so the captain keeps the armband
/// even without minutes.
pub fn resolve_captaincy(outcomes: &mut [PickOutcome], chip: &Chip) -> ArmbandResolution {
    if *chip == Chip::BenchBoost {
        return ArmbandResolution::Captain;
    }

    let Some(captain) = outcomes.iter().position(|o| o.entry.pick.is_captain) else {
        return ArmbandResolution::Captain;
    };

    if !captain_absent(&outcomes[captain]) {
        return ArmbandResolution::Captain;
    }

    let armband = outcomes[captain].entry.pick.multiplier.max(CAPTAIN_MULTIPLIER);
    outcomes[captain].multiplier = 0;

    let vice = outcomes
        .iter()
        .position(|o| o.entry.pick.is_vice_captain && o.is_playing());

    match vice {
        Some(vice) => {
            outcomes[vice].multiplier = armband;
            debug!(
                captain = outcomes[captain].player_id(),
                vice = outcomes[vice].player_id(),
                multiplier = armband,
                "armband passed to vice-captain"
            );
            ArmbandResolution::ViceCaptain {
                player_id: outcomes[vice].player_id(),
            }
        }
        None => {
            debug!(
                captain = outcomes[captain].player_id(),
                "captain and vice-captain both absent"
            );
            ArmbandResolution::Vacant
        }
    }
}

fn captain_absent(outcome: &PickOutcome) -> bool {
    match outcome.status {
        SubStatus::SubbedOut => true,
        SubStatus::SubbedIn => false,
        SubStatus::Unchanged => outcome.entry.minutes == 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autosub::SquadEntry;
    use crate::model::{Position, SquadPick};

    fn outcome(
        player_id: u32,
        slot: u8,
        minutes: u32,
        multiplier: u8,
        status: SubStatus,
    ) -> PickOutcome {
        PickOutcome {
            entry: SquadEntry {
                pick: SquadPick {
                    player_id,
                    slot,
                    multiplier,
                    is_captain: false,
                    is_vice_captain: false,
                },
                position: Position::Midfielder,
                minutes,
            },
            status,
            multiplier,
        }
    }

    fn armband_pair(
        captain_minutes: u32,
        captain_status: SubStatus,
        vice_minutes: u32,
        vice_status: SubStatus,
    ) -> Vec<PickOutcome> {
        let mut captain = outcome(1, 6, captain_minutes, 2, captain_status);
        captain.entry.pick.is_captain = true;
        if captain_status == SubStatus::SubbedOut {
            captain.multiplier = 0;
        }
        let mut vice = outcome(2, 7, vice_minutes, 1, vice_status);
        vice.entry.pick.is_vice_captain = true;
        vec![captain, vice, outcome(3, 8, 90, 1, SubStatus::Unchanged)]
    }

    #[test]
    fn captain_played_nothing_changes() {
        let mut outcomes = armband_pair(90, SubStatus::Unchanged, 90, SubStatus::Unchanged);
        assert_eq!(resolve_captaincy(&mut outcomes, &Chip::None), ArmbandResolution::Captain);
        assert_eq!(outcomes[0].multiplier, 2);
        assert_eq!(outcomes[1].multiplier, 1);
    }

    #[test]
    fn subbed_out_captain_passes_armband() {
        let mut outcomes = armband_pair(0, SubStatus::SubbedOut, 90, SubStatus::Unchanged);
        let resolution = resolve_captaincy(&mut outcomes, &Chip::None);
        assert_eq!(resolution, ArmbandResolution::ViceCaptain { player_id: 2 });
        assert_eq!(outcomes[0].multiplier, 0);
        assert_eq!(outcomes[1].multiplier, 2);
    }

    #[test]
    fn unreplaced_captain_without_minutes_passes_armband() {
        let mut outcomes = armband_pair(0, SubStatus::Unchanged, 45, SubStatus::Unchanged);
        assert_eq!(
            resolve_captaincy(&mut outcomes, &Chip::None),
            ArmbandResolution::ViceCaptain { player_id: 2 }
        );
        assert_eq!(outcomes[0].multiplier, 0);
        assert_eq!(outcomes[1].multiplier, 2);
    }

    #[test]
    fn vice_absent_leaves_armband_vacant() {
        let mut outcomes = armband_pair(0, SubStatus::SubbedOut, 0, SubStatus::SubbedOut);
        outcomes[1].multiplier = 0;
        assert_eq!(resolve_captaincy(&mut outcomes, &Chip::None), ArmbandResolution::Vacant);
        assert_eq!(outcomes[0].multiplier, 0);
        assert_eq!(outcomes[1].multiplier, 0);
        // No third-level fallback.
        assert_eq!(outcomes[2].multiplier, 1);
    }

    #[test]
    fn triple_captain_armband_carries_three() {
        let mut outcomes = armband_pair(0, SubStatus::SubbedOut, 90, SubStatus::Unchanged);
        outcomes[0].entry.pick.multiplier = 3;
        resolve_captaincy(&mut outcomes, &Chip::None);
        assert_eq!(outcomes[1].multiplier, 3);
    }

    #[test]
    fn bench_boost_keeps_armband_on_idle_captain() {
        let mut outcomes = armband_pair(0, SubStatus::Unchanged, 90, SubStatus::Unchanged);
        assert_eq!(
            resolve_captaincy(&mut outcomes, &Chip::BenchBoost),
            ArmbandResolution::Captain
        );
        assert_eq!(outcomes[0].multiplier, 2);
        assert_eq!(outcomes[1].multiplier, 1);
    }

    #[test]
    fn resolution_is_idempotent_on_identical_input() {
        let input = armband_pair(0, SubStatus::SubbedOut, 90, SubStatus::Unchanged);
        let mut first = input.clone();
        let mut second = input.clone();
        let a = resolve_captaincy(&mut first, &Chip::None);
        let b = resolve_captaincy(&mut second, &Chip::None);
        assert_eq!(a, b);
        assert_eq!(first, second);
    }
}
