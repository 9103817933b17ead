// Squad total from resolved multipliers and live points.

use crate::autosub::{PickOutcome, SubStatus};

/// Points a single pick contributes. Subbed-out picks always contribute 0.
pub fn effective_points(outcome: &PickOutcome, live_points: i32) -> i32 {
    match outcome.status {
        SubStatus::SubbedOut => 0,
        SubStatus::Unchanged | SubStatus::SubbedIn => live_points * i32::from(outcome.multiplier),
    }
}

/// Sum of effective points over `(outcome, live_points)` pairs, less the
/// gameweek's transfer deduction.
pub fn squad_total<'a, I>(picks: I, transfer_cost: i32) -> i32
where
    I: IntoIterator<Item = (&'a PickOutcome, i32)>,
{
    let gross: i32 = picks
        .into_iter()
        .map(|(outcome, live_points)| effective_points(outcome, live_points))
        .sum();
    gross - transfer_cost
}
