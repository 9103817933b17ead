// Defensive contribution milestones.
//
// Keepers earn a point per block of saves. Defenders and other outfield
// players earn a flat bonus once their combined defensive actions reach the
// season's threshold.

use serde::Serialize;

use crate::model::{LiveStat, PlayerId, Position};
use crate::rules::{DefensiveRules, Milestone};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DefensiveContributionRecord {
    pub player_id: PlayerId,
    pub position: Position,
    /// Saves for keepers, CBIT for defenders, CBIRT for everyone else.
    pub contribution: u32,
    /// Count needed for the next award; `None` when the season has no
    /// milestone for this position.
    pub threshold: Option<u32>,
    pub bonus: u32,
    /// Fraction of the way to `threshold`, in `0.0..=1.0`.
    pub progress: f64,
}

pub fn evaluate(
    player_id: PlayerId,
    stat: &LiveStat,
    position: Position,
    rules: &DefensiveRules,
) -> DefensiveContributionRecord {
    let cbit = stat.clearances_blocks_interceptions + stat.tackles;

    let (contribution, threshold, bonus, progress) = match position {
        Position::Keeper => keeper_saves(stat.saves, rules.keeper_saves_per_point),
        Position::Defender => milestone(cbit, rules.defender),
        Position::Midfielder | Position::Forward => milestone(cbit + stat.recoveries, rules.outfield),
        Position::Unknown => (0, None, 0, 0.0),
    };

    DefensiveContributionRecord {
        player_id,
        position,
        contribution,
        threshold,
        bonus,
        progress,
    }
}

/// One point per `per_point` saves, uncapped. The next threshold is the next
/// multiple above the current count.
fn keeper_saves(saves: u32, per_point: u32) -> (u32, Option<u32>, u32, f64) {
    if per_point == 0 {
        return (saves, None, 0, 0.0);
    }
    let bonus = saves / per_point;
    let next = (bonus + 1) * per_point;
    (saves, Some(next), bonus, f64::from(saves) / f64::from(next))
}

/// Flat bonus at a single threshold; it does not stack above it.
fn milestone(contribution: u32, rule: Option<Milestone>) -> (u32, Option<u32>, u32, f64) {
    match rule {
        Some(m) if m.threshold > 0 => {
            if contribution >= m.threshold {
                (contribution, Some(m.threshold), m.bonus, 1.0)
            } else {
                let progress = f64::from(contribution) / f64::from(m.threshold);
                (contribution, Some(m.threshold), 0, progress)
            }
        }
        _ => (contribution, None, 0, 0.0),
    }
}
