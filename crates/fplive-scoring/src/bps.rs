// Bonus points system prediction from raw match statistics.
//
// The authority publishes its own BPS once it has processed a match; until
// then the score is rebuilt here from the live counters so bonus can be
// ranked while the match is still in progress.

use crate::model::{LiveStat, Position};
use crate::rules::BpsRules;

/// Predict a player's BPS from their raw stats. Never negative.
pub fn predict_bps(stat: &LiveStat, position: Position, rules: &BpsRules) -> u32 {
    let mut bps: i32 = 0;

    if stat.minutes > 0 {
        bps += rules.appearance;
    }
    if stat.minutes >= rules.long_appearance_minutes {
        bps += rules.long_appearance;
    }

    // Penalty goals score a flat value for every position.
    let penalty_goals = stat.explain_total(rules.penalty_goal_identifier);
    let open_play_goals = stat.goals_scored.saturating_sub(penalty_goals);
    bps += count(penalty_goals) * rules.penalty_goal;
    bps += count(open_play_goals) * rules.open_play_goal(position);

    bps += count(stat.assists) * rules.assist;

    if position == Position::Keeper {
        bps += keeper_saves(stat, rules);
    }

    bps += count(stat.tackles) * rules.tackle;
    bps += count(stat.goalline_clearances) * rules.goalline_clearance;

    if stat.clean_sheets > 0 {
        bps += rules.clean_sheet(position);
    }

    bps += count(stat.penalties_saved) * rules.penalty_saved;
    bps += count(stat.penalties_missed) * rules.penalty_missed;
    bps += count(stat.yellow_cards) * rules.yellow_card;
    bps += count(stat.red_cards) * rules.red_card;
    bps += count(stat.own_goals) * rules.own_goal;

    if position.is_back_line() {
        bps += count(stat.goals_conceded) * rules.goal_conceded_back_line;
    }

    bps.max(0) as u32
}

/// The BPS used for ranking: the authority's value once it exists, the
/// prediction otherwise. The two are never blended.
pub fn effective_bps(stat: &LiveStat, position: Position, rules: &BpsRules) -> i32 {
    if stat.bps > 0 {
        stat.bps
    } else {
        predict_bps(stat, position, rules) as i32
    }
}

/// Inside/outside-box saves when the feed has the breakdown, otherwise the
/// flat per-save value.
fn keeper_saves(stat: &LiveStat, rules: &BpsRules) -> i32 {
    let has_breakdown = stat.saves_inside_box.is_some() || stat.saves_outside_box.is_some();
    if rules.split_saves && has_breakdown {
        count(stat.saves_inside_box.unwrap_or(0)) * rules.save_inside_box
            + count(stat.saves_outside_box.unwrap_or(0)) * rules.save_outside_box
    } else {
        count(stat.saves) * rules.save_total
    }
}

fn count(n: u32) -> i32 {
    i32::try_from(n).unwrap_or(i32::MAX)
}
