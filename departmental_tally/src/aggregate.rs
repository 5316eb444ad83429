// Country-wide statistics.

use std::collections::BTreeMap;

use log::{debug, info};

use crate::config::*;
use crate::dhondt::most_voted;
use crate::enrich::votes_by_lema;

fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

fn add_seats(acc: &mut BTreeMap<String, u32>, seats: &[(String, u32)]) {
    for (lema, s) in seats {
        let total = acc.entry(lema.clone()).or_insert(0);
        *total = total.saturating_add(*s);
    }
}

fn add_win(acc: &mut BTreeMap<String, u32>, winner: &Option<String>) {
    if let Some(w) = winner {
        *acc.entry(w.clone()).or_insert(0) += 1;
    }
}

/// Folds the enriched departments into national totals.
///
/// The votes of a lema are the totals credited to it in the departmental race. The
/// percentages are computed over the sum of those totals and rounded to
/// `percentage_decimals`; they are all zero when nobody got a vote.
pub fn national_stats(
    summary: &EnrichedElectionSummary,
    percentage_decimals: u32,
) -> NationalStats {
    info!(
        "national_stats: aggregating {} departments",
        summary.departments.len()
    );
    let ordered = votes_by_lema(
        summary
            .departments
            .iter()
            .flat_map(|d| d.base.parties.iter())
            .map(|p| (p.name.as_str(), p.total)),
    );
    let total_valid_votes: u64 = ordered.iter().map(|(_, v)| v).sum();
    let most_voted = most_voted(&ordered).map(|idx| ordered[idx].0.clone());

    let percentages: BTreeMap<String, f64> = ordered
        .iter()
        .map(|(lema, v)| {
            let pct = if total_valid_votes == 0 {
                0.0
            } else {
                round_to(*v as f64 * 100.0 / total_valid_votes as f64, percentage_decimals)
            };
            (lema.clone(), pct)
        })
        .collect();

    let mut stats = NationalStats {
        total_valid_votes,
        votes_by_lema: ordered.into_iter().collect(),
        percentages,
        most_voted,
        ..Default::default()
    };
    for d in summary.departments.iter() {
        stats.department_count += 1;
        add_win(&mut stats.departments_won, &d.winner);
        add_seats(&mut stats.board_seats_by_lema, &d.seats_by_party);
        for m in d.municipalities.iter() {
            stats.municipality_count += 1;
            add_win(&mut stats.municipalities_won, &m.winner);
            // The mayor belongs to the winning lema, even when the name is unavailable.
            add_win(&mut stats.mayors_by_lema, &m.winner);
            add_seats(&mut stats.council_seats_by_lema, &m.seats_by_party);
        }
    }
    debug!("national_stats: {:?}", stats);
    stats
}
