// Plain-text rendering of a scored squad for the terminal.

use std::fmt::Write;

use fplive_scoring::autosub::SubStatus;
use fplive_scoring::captaincy::ArmbandResolution;
use fplive_scoring::model::Chip;
use fplive_scoring::SquadReport;

/// One-line headline: gameweek, total, and anything that changed the XI.
pub fn headline(report: &SquadReport) -> String {
    let mut line = format!(
        "GW{} entry {}: {} pts",
        report.gameweek, report.entry_id, report.total
    );

    let provisional = report.provisional_bonus_total();
    if provisional != 0 {
        let _ = write!(line, " (incl. {provisional} provisional bonus)");
    }
    if report.transfer_cost != 0 {
        let _ = write!(line, ", -{} transfers", report.transfer_cost);
    }
    if report.chip != Chip::None {
        let _ = write!(line, ", chip: {}", report.chip.label());
    }

    let subs: Vec<String> = report
        .picks
        .iter()
        .filter(|p| p.status == SubStatus::SubbedIn)
        .map(|p| p.player.web_name.clone())
        .collect();
    if !subs.is_empty() {
        let _ = write!(line, ", subs in: {}", subs.join(", "));
    }

    match report.armband {
        ArmbandResolution::Captain => {}
        ArmbandResolution::ViceCaptain { player_id } => {
            let name = report
                .picks
                .iter()
                .find(|p| p.player.id == player_id)
                .map_or("?", |p| p.player.web_name.as_str());
            let _ = write!(line, ", armband: {name} (vice)");
        }
        ArmbandResolution::Vacant => line.push_str(", armband: vacant"),
    }

    let _ = write!(line, " [as of {}]", report.fetched_at.format("%H:%M:%S UTC"));
    line
}

/// Per-pick table, one row per squad slot.
pub fn pick_rows(report: &SquadReport) -> Vec<String> {
    report
        .picks
        .iter()
        .map(|p| {
            let marker = match p.status {
                SubStatus::Unchanged => ' ',
                SubStatus::SubbedIn => '+',
                SubStatus::SubbedOut => '-',
            };
            let mut row = format!(
                "{marker}{:>2} {:<3} {:<16} {:>3}' x{} {:>3}",
                p.slot,
                p.player.position.display_str(),
                p.player.web_name,
                p.minutes,
                p.multiplier,
                p.effective_points
            );
            if p.provisional_bonus > 0 {
                let _ = write!(row, " (+{} bonus)", p.provisional_bonus);
            }
            if let Some(threshold) = p.defensive.threshold {
                if p.defensive.contribution > 0 {
                    let _ = write!(row, " DC {}/{}", p.defensive.contribution, threshold);
                }
            }
            row
        })
        .collect()
}
