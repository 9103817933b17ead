// Stat snapshot data model: reference players, live stats, fixtures, and
// squad picks as delivered by the data-retrieval layer on each poll.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type PlayerId = u32;
pub type TeamId = u32;
pub type FixtureId = u32;

// ---------------------------------------------------------------------------
// Wire element-type codes
// ---------------------------------------------------------------------------

pub const ELEMENT_TYPE_KEEPER: u8 = 1;
pub const ELEMENT_TYPE_DEFENDER: u8 = 2;
pub const ELEMENT_TYPE_MIDFIELDER: u8 = 3;
pub const ELEMENT_TYPE_FORWARD: u8 = 4;

/// Label given to squad picks whose player id is missing from reference data.
pub const PLACEHOLDER_LABEL: &str = "Unknown player";

/// Highest slot number that belongs to the nominal starting XI.
pub const LAST_STARTING_SLOT: u8 = 11;

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// Position class of a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Position {
    Keeper,
    Defender,
    Midfielder,
    Forward,
    /// Assigned to placeholder players that could not be resolved.
    Unknown,
}

impl Position {
    /// Map a wire element-type code (1..=4) to a position. Anything else is
    /// `Unknown`.
    pub fn from_element_type(code: u8) -> Self {
        match code {
            ELEMENT_TYPE_KEEPER => Position::Keeper,
            ELEMENT_TYPE_DEFENDER => Position::Defender,
            ELEMENT_TYPE_MIDFIELDER => Position::Midfielder,
            ELEMENT_TYPE_FORWARD => Position::Forward,
            _ => Position::Unknown,
        }
    }

    /// Short display label.
    pub fn display_str(&self) -> &'static str {
        match self {
            Position::Keeper => "GKP",
            Position::Defender => "DEF",
            Position::Midfielder => "MID",
            Position::Forward => "FWD",
            Position::Unknown => "UNK",
        }
    }

    /// Keepers and defenders share the goal, clean-sheet and goals-conceded
    /// coefficients.
    pub fn is_back_line(&self) -> bool {
        matches!(self, Position::Keeper | Position::Defender)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_str())
    }
}

// ---------------------------------------------------------------------------
// Reference data
// ---------------------------------------------------------------------------

/// Immutable per-season player reference data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub web_name: String,
    pub position: Position,
    pub team: TeamId,
}

impl Player {
    /// Synthetic stand-in for a pick whose id is not in the reference data.
    pub fn placeholder(id: PlayerId) -> Self {
        Player {
            id,
            web_name: PLACEHOLDER_LABEL.to_string(),
            position: Position::Unknown,
            team: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// Live stats
// ---------------------------------------------------------------------------

/// One line of a fixture's explain breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplainStat {
    pub identifier: String,
    pub points: i32,
    pub value: u32,
}

/// Per-fixture explain breakdown for one player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplainEntry {
    pub fixture_id: FixtureId,
    pub stats: Vec<ExplainStat>,
}

impl ExplainEntry {
    /// Sum of raw values recorded under `identifier`.
    pub fn value_of(&self, identifier: &str) -> u32 {
        self.stats
            .iter()
            .filter(|s| s.identifier == identifier)
            .map(|s| s.value)
            .sum()
    }

    pub fn has(&self, identifier: &str) -> bool {
        self.stats.iter().any(|s| s.identifier == identifier)
    }
}

/// A player's raw statistics for one gameweek, refreshed on every poll.
///
/// Counters the provider omits default to zero. The save breakdown is
/// optional because older feeds only publish the total.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveStat {
    pub minutes: u32,
    pub goals_scored: u32,
    pub assists: u32,
    pub clean_sheets: u32,
    pub goals_conceded: u32,
    pub saves: u32,
    pub saves_inside_box: Option<u32>,
    pub saves_outside_box: Option<u32>,
    pub tackles: u32,
    pub clearances_blocks_interceptions: u32,
    pub recoveries: u32,
    pub goalline_clearances: u32,
    pub penalties_saved: u32,
    pub penalties_missed: u32,
    pub yellow_cards: u32,
    pub red_cards: u32,
    pub own_goals: u32,
    /// Authoritative bonus; 0 until the authority publishes it.
    pub bonus: u32,
    /// Authoritative BPS; 0 until the authority computes it.
    pub bps: i32,
    /// Authoritative live points so far.
    pub total_points: i32,
    pub explain: Vec<ExplainEntry>,
}

static EMPTY_LIVE_STAT: LiveStat = LiveStat {
    minutes: 0,
    goals_scored: 0,
    assists: 0,
    clean_sheets: 0,
    goals_conceded: 0,
    saves: 0,
    saves_inside_box: None,
    saves_outside_box: None,
    tackles: 0,
    clearances_blocks_interceptions: 0,
    recoveries: 0,
    goalline_clearances: 0,
    penalties_saved: 0,
    penalties_missed: 0,
    yellow_cards: 0,
    red_cards: 0,
    own_goals: 0,
    bonus: 0,
    bps: 0,
    total_points: 0,
    explain: Vec::new(),
};

impl LiveStat {
    pub fn played(&self) -> bool {
        self.minutes > 0
    }

    /// Sum of `identifier` values across every fixture's explain entry.
    pub fn explain_total(&self, identifier: &str) -> u32 {
        self.explain.iter().map(|e| e.value_of(identifier)).sum()
    }

    pub fn explain_for(&self, fixture_id: FixtureId) -> Option<&ExplainEntry> {
        self.explain.iter().find(|e| e.fixture_id == fixture_id)
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fixture {
    pub id: FixtureId,
    pub gameweek: u32,
    pub team_h: TeamId,
    pub team_a: TeamId,
    pub team_h_score: Option<u32>,
    pub team_a_score: Option<u32>,
    pub started: bool,
    pub finished: bool,
    pub minutes: u32,
}

// ---------------------------------------------------------------------------
// Squad
// ---------------------------------------------------------------------------

/// One of the 15 picks in a manager's squad.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SquadPick {
    pub player_id: PlayerId,
    /// 1-11 are nominal starters, 12-15 the bench in substitution priority.
    pub slot: u8,
    /// Nominal multiplier: 0 for bench, 1 starter, 2 captain, 3 triple captain.
    pub multiplier: u8,
    pub is_captain: bool,
    pub is_vice_captain: bool,
}

impl SquadPick {
    pub fn is_starter(&self) -> bool {
        self.slot <= LAST_STARTING_SLOT
    }
}

/// Chip active for the gameweek.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Chip {
    #[default]
    None,
    /// Every one of the 15 picks scores; no automatic substitutions.
    BenchBoost,
    TripleCaptain,
    Other(String),
}

impl Chip {
    /// Parse the provider's chip name (`"bboost"`, `"3xc"`, ...).
    pub fn from_wire(name: Option<&str>) -> Self {
        match name {
            None | Some("") => Chip::None,
            Some("bboost") => Chip::BenchBoost,
            Some("3xc") => Chip::TripleCaptain,
            Some(other) => Chip::Other(other.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Chip::None => "none",
            Chip::BenchBoost => "bench boost",
            Chip::TripleCaptain => "triple captain",
            Chip::Other(name) => name,
        }
    }
}

/// A manager's squad for one gameweek. Supplied fresh on every poll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Squad {
    pub entry_id: u64,
    pub gameweek: u32,
    pub picks: Vec<SquadPick>,
    pub chip: Chip,
    /// Points deducted for extra transfers this gameweek.
    pub transfer_cost: i32,
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// Everything the engine needs for one poll tick. Never mutated; each poll
/// produces a new snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatSnapshot {
    pub gameweek: u32,
    pub players: HashMap<PlayerId, Player>,
    pub live: HashMap<PlayerId, LiveStat>,
    pub fixtures: Vec<Fixture>,
    pub fetched_at: DateTime<Utc>,
}

impl StatSnapshot {
    /// Resolve a player, falling back to a placeholder for unknown ids.
    pub fn player(&self, id: PlayerId) -> Cow<'_, Player> {
        match self.players.get(&id) {
            Some(p) => Cow::Borrowed(p),
            None => Cow::Owned(Player::placeholder(id)),
        }
    }

    /// Live stats for a player; a player with no entry has not played.
    pub fn live_stat(&self, id: PlayerId) -> &LiveStat {
        self.live.get(&id).unwrap_or(&EMPTY_LIVE_STAT)
    }

    /// Fixtures of this gameweek that have kicked off.
    pub fn started_fixtures(&self) -> impl Iterator<Item = &Fixture> {
        self.fixtures
            .iter()
            .filter(move |f| f.started && f.gameweek == self.gameweek)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot_with(players: Vec<Player>) -> StatSnapshot {
        StatSnapshot {
            gameweek: 5,
            players: players.into_iter().map(|p| (p.id, p)).collect(),
            live: HashMap::new(),
            fixtures: vec![],
            fetched_at: Utc::now(),
        }
    }

    #[test]
    fn element_type_codes_map_to_positions() {
        assert_eq!(Position::from_element_type(1), Position::Keeper);
        assert_eq!(Position::from_element_type(2), Position::Defender);
        assert_eq!(Position::from_element_type(3), Position::Midfielder);
        assert_eq!(Position::from_element_type(4), Position::Forward);
        assert_eq!(Position::from_element_type(5), Position::Unknown);
        assert_eq!(Position::from_element_type(0), Position::Unknown);
    }

    #[test]
    fn unknown_player_resolves_to_placeholder() {
        let snapshot = snapshot_with(vec![Player {
            id: 1,
            web_name: "Raya".into(),
            position: Position::Keeper,
            team: 1,
        }]);

        assert_eq!(snapshot.player(1).web_name, "Raya");

        let missing = snapshot.player(999);
        assert_eq!(missing.id, 999);
        assert_eq!(missing.web_name, PLACEHOLDER_LABEL);
        assert_eq!(missing.position, Position::Unknown);
    }

    #[test]
    fn missing_live_stat_reads_as_zero_minutes() {
        let snapshot = snapshot_with(vec![]);
        let stat = snapshot.live_stat(42);
        assert!(!stat.played());
        assert_eq!(stat.total_points, 0);
        assert!(stat.explain.is_empty());
    }

    #[test]
    fn explain_values_sum_per_identifier() {
        let stat = LiveStat {
            explain: vec![
                ExplainEntry {
                    fixture_id: 10,
                    stats: vec![
                        ExplainStat { identifier: "minutes".into(), points: 2, value: 90 },
                        ExplainStat { identifier: "penalties_scored".into(), points: 0, value: 1 },
                    ],
                },
                ExplainEntry {
                    fixture_id: 11,
                    stats: vec![ExplainStat {
                        identifier: "penalties_scored".into(),
                        points: 0,
                        value: 1,
                    }],
                },
            ],
            ..Default::default()
        };

        assert_eq!(stat.explain_total("penalties_scored"), 2);
        assert_eq!(stat.explain_total("bonus"), 0);
        assert!(stat.explain_for(10).is_some_and(|e| e.has("minutes")));
        assert!(stat.explain_for(12).is_none());
    }

    #[test]
    fn live_stat_deserializes_with_missing_fields() {
        let stat: LiveStat = serde_json::from_str(r#"{"minutes": 45, "saves": 3}"#).unwrap();
        assert_eq!(stat.minutes, 45);
        assert_eq!(stat.saves, 3);
        assert_eq!(stat.saves_inside_box, None);
        assert_eq!(stat.goals_scored, 0);
    }

    #[test]
    fn chip_names_parse() {
        assert_eq!(Chip::from_wire(None), Chip::None);
        assert_eq!(Chip::from_wire(Some("bboost")), Chip::BenchBoost);
        assert_eq!(Chip::from_wire(Some("3xc")), Chip::TripleCaptain);
        assert_eq!(Chip::from_wire(Some("wildcard")), Chip::Other("wildcard".into()));
    }

    #[test]
    fn starter_slots_are_one_through_eleven() {
        let mut pick = SquadPick {
            player_id: 1,
            slot: 11,
            multiplier: 1,
            is_captain: false,
            is_vice_captain: false,
        };
        assert!(pick.is_starter());
        pick.slot = 12;
        assert!(!pick.is_starter());
    }
}
