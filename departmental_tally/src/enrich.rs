// Winners, seats and officials for every territorial unit.

use log::{debug, info, warn};
use rayon::prelude::*;

use crate::config::*;
use crate::dhondt::{apportion_lists, most_voted, seats_by_lema};
use crate::normalize::format_candidate_name;

/// Sums the votes of the entries of every lema, in order of first appearance.
pub fn votes_by_lema<'a, I>(entries: I) -> Vec<(String, u64)>
where
    I: IntoIterator<Item = (&'a str, u64)>,
{
    let mut res: Vec<(String, u64)> = Vec::new();
    for (name, votes) in entries {
        match res.iter_mut().find(|(n, _)| n == name) {
            Some((_, v)) => *v += votes,
            None => res.push((name.to_string(), votes)),
        }
    }
    res
}

fn winner_of(votes: &[(String, u64)]) -> Option<String> {
    most_voted(votes).map(|idx| votes[idx].0.clone())
}

// Splits the seats of every lema between its lists. `lists_of` returns the lists of a
// lema together with the name of their sub-lema.
fn list_seats<'a, F>(seats: &[(String, u32)], lists_of: F) -> Vec<ListSeats>
where
    F: Fn(&str) -> Vec<(&'a str, &'a List)>,
{
    let mut res: Vec<ListSeats> = Vec::new();
    for (party, party_seats) in seats {
        let lists = lists_of(party.as_str());
        if lists.is_empty() {
            if *party_seats > 0 {
                warn!(
                    "list_seats: {} won {} seats but presented no lists",
                    party, party_seats
                );
            }
            continue;
        }
        let votes: Vec<u64> = lists.iter().map(|(_, l)| l.total).collect();
        let alloc = apportion_lists(&votes, *party_seats);
        for ((sub_lema, list), a) in lists.iter().zip(alloc) {
            res.push(ListSeats {
                party: party.clone(),
                sub_lema: sub_lema.to_string(),
                list_id: list.id,
                description: list.description.clone(),
                votes: list.total,
                seats: a.seats,
                last_quotient: a.last_quotient,
            });
        }
    }
    res
}

// The most voted candidate among (votes, description) pairs. A strict comparison keeps
// the first one on ties. No candidate, or one without votes, is a gap.
fn top_candidate<'a, I>(candidates: I) -> String
where
    I: IntoIterator<Item = (u64, &'a str)>,
{
    let mut best: Option<(u64, &str)> = None;
    for (votes, description) in candidates {
        match best {
            Some((b, _)) if b >= votes => {}
            _ => best = Some((votes, description)),
        }
    }
    match best {
        Some((votes, description)) if votes > 0 => format_candidate_name(description),
        _ => UNAVAILABLE.to_string(),
    }
}

/// The mayor of a municipality: the head of the most voted municipal list of the
/// winning lema.
pub fn mayor(municipality: &Municipality, winner: &str) -> String {
    let candidates = municipality
        .parties
        .iter()
        .filter(|p| p.name == winner)
        .flat_map(|p| p.council.sub_lemas.iter())
        .flat_map(|s| s.municipal_lists.iter())
        .map(|l| (l.total, l.description.as_str()));
    let res = top_candidate(candidates);
    if res == UNAVAILABLE {
        debug!("mayor: no candidate found for {} in {}", winner, municipality.name);
    }
    res
}

/// The intendant of a department: the head of the most voted ballot sheet of the
/// winning lema in the mayoral race.
pub fn intendant(department: &Department, winner: &str) -> String {
    let candidates = department
        .parties
        .iter()
        .filter(|p| p.name == winner)
        .flat_map(|p| p.mayoral.sheets.iter())
        .map(|h| (h.votes, h.name.as_str()));
    let res = top_candidate(candidates);
    if res == UNAVAILABLE {
        debug!("intendant: no candidate found for {} in {}", winner, department.name);
    }
    res
}

pub fn enrich_municipality(
    municipality: &Municipality,
    rule: MajorityRule,
) -> EnrichedMunicipality {
    // Lemas without votes take no part in the council race. A municipality where nobody
    // voted yet has no winner and no seats.
    let votes: Vec<(String, u64)> =
        votes_by_lema(municipality.parties.iter().map(|p| (p.name.as_str(), p.total)))
            .into_iter()
            .filter(|(_, v)| *v > 0)
            .collect();
    let winner = winner_of(&votes);
    let seats_by_party = seats_by_lema(&votes, rule);
    let mayor = match &winner {
        Some(w) => mayor(municipality, w),
        None => UNAVAILABLE.to_string(),
    };
    let list_seats = list_seats(&seats_by_party, |party| {
        municipality
            .parties
            .iter()
            .filter(|p| p.name == party)
            .flat_map(|p| p.council.sub_lemas.iter())
            .flat_map(|s| s.municipal_lists.iter().map(move |l| (s.name.as_str(), l)))
            .collect()
    });
    debug!(
        "enrich_municipality: {}: winner {:?} seats {:?} mayor {}",
        municipality.name, winner, seats_by_party, mayor
    );
    EnrichedMunicipality {
        base: municipality.clone(),
        winner,
        seats_by_party,
        mayor,
        list_seats,
    }
}

pub fn enrich_department(department: &Department, rules: &ProcessingRules) -> EnrichedDepartment {
    let votes = votes_by_lema(department.parties.iter().map(|p| (p.name.as_str(), p.total)));
    let winner = winner_of(&votes);
    let seats_by_party = seats_by_lema(&votes, rules.department_rule);
    let intendant = match &winner {
        Some(w) => intendant(department, w),
        None => UNAVAILABLE.to_string(),
    };
    let list_seats = list_seats(&seats_by_party, |party| {
        department
            .parties
            .iter()
            .filter(|p| p.name == party)
            .flat_map(|p| p.board.sub_lemas.iter())
            .flat_map(|s| s.board_lists.iter().map(move |l| (s.name.as_str(), l)))
            .collect()
    });
    let municipalities = department
        .municipalities
        .iter()
        .map(|m| enrich_municipality(m, rules.municipality_rule))
        .collect();
    debug!(
        "enrich_department: {}: winner {:?} seats {:?} intendant {}",
        department.name, winner, seats_by_party, intendant
    );
    EnrichedDepartment {
        base: department.clone(),
        winner,
        seats_by_party,
        intendant,
        list_seats,
        municipalities,
    }
}

/// Enriches every department of the summary. The input is left untouched and the
/// departments keep their order, whether they are processed in parallel or not.
pub fn enrich(summary: &ElectionSummary, rules: &ProcessingRules) -> EnrichedElectionSummary {
    info!(
        "enrich: {} departments (parallel: {})",
        summary.departments.len(),
        rules.parallel
    );
    let departments: Vec<EnrichedDepartment> = if rules.parallel {
        summary
            .departments
            .par_iter()
            .map(|d| enrich_department(d, rules))
            .collect()
    } else {
        summary
            .departments
            .iter()
            .map(|d| enrich_department(d, rules))
            .collect()
    };
    EnrichedElectionSummary {
        year: summary.year,
        departments,
    }
}
