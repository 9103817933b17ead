// Season-indexed scoring rules table.
//
// Every coefficient the bonus predictor, defensive-contribution evaluator,
// bonus allocator and substitution simulator read lives here, so a new
// season's rule revision is one more table entry rather than another copy of
// the algorithms.

use thiserror::Error;

use crate::model::Position;

/// Season whose rules apply when none is configured.
pub const DEFAULT_SEASON: &str = "2025/26";

/// Explain identifier under which penalty goals are reported.
pub const PENALTY_GOAL_IDENTIFIER: &str = "penalties_scored";

/// Explain identifier the authority uses once a fixture's bonus is published.
pub const BONUS_IDENTIFIER: &str = "bonus";

#[derive(Debug, Error, PartialEq)]
pub enum RulesError {
    #[error("no scoring rules registered for season {season}")]
    UnknownSeason { season: String },
}

// ---------------------------------------------------------------------------
// Rule groups
// ---------------------------------------------------------------------------

/// Bonus points system coefficients.
#[derive(Debug, Clone, PartialEq)]
pub struct BpsRules {
    pub appearance: i32,
    pub long_appearance_minutes: u32,
    pub long_appearance: i32,
    pub penalty_goal: i32,
    pub goal_back_line: i32,
    pub goal_midfielder: i32,
    pub goal_forward: i32,
    pub assist: i32,
    /// When false, every save scores `save_total` regardless of breakdown.
    pub split_saves: bool,
    pub save_inside_box: i32,
    pub save_outside_box: i32,
    pub save_total: i32,
    pub tackle: i32,
    pub goalline_clearance: i32,
    pub clean_sheet_back_line: i32,
    pub clean_sheet_midfielder: i32,
    pub clean_sheet_forward: i32,
    pub penalty_saved: i32,
    pub penalty_missed: i32,
    pub yellow_card: i32,
    pub red_card: i32,
    pub own_goal: i32,
    pub goal_conceded_back_line: i32,
    pub penalty_goal_identifier: &'static str,
}

impl BpsRules {
    /// BPS for one open-play goal. Placeholder players score like forwards.
    pub fn open_play_goal(&self, position: Position) -> i32 {
        match position {
            Position::Keeper | Position::Defender => self.goal_back_line,
            Position::Midfielder => self.goal_midfielder,
            Position::Forward | Position::Unknown => self.goal_forward,
        }
    }

    pub fn clean_sheet(&self, position: Position) -> i32 {
        match position {
            Position::Keeper | Position::Defender => self.clean_sheet_back_line,
            Position::Midfielder => self.clean_sheet_midfielder,
            Position::Forward | Position::Unknown => self.clean_sheet_forward,
        }
    }
}

/// A single defensive-contribution threshold and the flat bonus it pays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Milestone {
    pub threshold: u32,
    pub bonus: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DefensiveRules {
    /// Saves per keeper bonus point (uncapped).
    pub keeper_saves_per_point: u32,
    /// CBIT milestone for defenders; `None` when the season has none.
    pub defender: Option<Milestone>,
    /// CBIRT milestone for midfielders and forwards.
    pub outfield: Option<Milestone>,
}

/// Minimum outfield line counts for a legal starting XI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormationRules {
    pub min_defenders: u8,
    pub min_midfielders: u8,
    pub min_forwards: u8,
}

/// The complete rule set for one season.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleSet {
    pub season: &'static str,
    pub bps: BpsRules,
    pub defensive: DefensiveRules,
    pub formation: FormationRules,
    /// Bonus awarded to rank slots 1, 2, 3.
    pub bonus_pool: &'static [u32],
}

// ---------------------------------------------------------------------------
// Table
// ---------------------------------------------------------------------------

const BPS_2025_26: BpsRules = BpsRules {
    appearance: 3,
    long_appearance_minutes: 60,
    long_appearance: 3,
    penalty_goal: 12,
    goal_back_line: 12,
    goal_midfielder: 18,
    goal_forward: 24,
    assist: 9,
    split_saves: true,
    save_inside_box: 3,
    save_outside_box: 2,
    save_total: 2,
    tackle: 2,
    goalline_clearance: 9,
    clean_sheet_back_line: 12,
    clean_sheet_midfielder: 6,
    clean_sheet_forward: 0,
    penalty_saved: 8,
    penalty_missed: -6,
    yellow_card: -3,
    red_card: -9,
    own_goal: -6,
    goal_conceded_back_line: -4,
    penalty_goal_identifier: PENALTY_GOAL_IDENTIFIER,
};

const FORMATION: FormationRules = FormationRules {
    min_defenders: 3,
    min_midfielders: 2,
    min_forwards: 1,
};

const BONUS_POOL: &[u32] = &[3, 2, 1];

static RULE_SETS: [RuleSet; 2] = [
    RuleSet {
        season: "2025/26",
        bps: BPS_2025_26,
        defensive: DefensiveRules {
            keeper_saves_per_point: 3,
            defender: Some(Milestone { threshold: 10, bonus: 2 }),
            outfield: Some(Milestone { threshold: 12, bonus: 2 }),
        },
        formation: FORMATION,
        bonus_pool: BONUS_POOL,
    },
    RuleSet {
        season: "2024/25",
        bps: BpsRules {
            split_saves: false,
            ..BPS_2025_26
        },
        defensive: DefensiveRules {
            keeper_saves_per_point: 3,
            defender: None,
            outfield: None,
        },
        formation: FORMATION,
        bonus_pool: BONUS_POOL,
    },
];

impl RuleSet {
    /// Look up the rules for a season key such as `"2025/26"`.
    pub fn for_season(season: &str) -> Result<&'static RuleSet, RulesError> {
        RULE_SETS
            .iter()
            .find(|r| r.season == season)
            .ok_or_else(|| RulesError::UnknownSeason {
                season: season.to_string(),
            })
    }

    /// Rules for [`DEFAULT_SEASON`].
    pub fn current() -> &'static RuleSet {
        RULE_SETS
            .iter()
            .find(|r| r.season == DEFAULT_SEASON)
            .unwrap_or(&RULE_SETS[0])
    }

    /// All registered season keys, newest first.
    pub fn seasons() -> impl Iterator<Item = &'static str> {
        RULE_SETS.iter().map(|r| r.season)
    }
}
