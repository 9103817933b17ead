// Live squad scoring engine: predicts bonus from raw match stats, simulates
// automatic substitutions and armband failover, and totals a squad while
// matches are still in progress.

pub mod aggregate;
pub mod autosub;
pub mod bonus;
pub mod bps;
pub mod captaincy;
pub mod defensive;
pub mod engine;
pub mod model;
pub mod rules;

pub use engine::{score_squad, ScoredPick, SquadReport};
pub use rules::{RuleSet, RulesError};
