// D'Hondt apportionment.
//
// Seats are handed one at a time to the entity with the largest quotient
// votes / (seats already won + 1). Quotients are compared exactly by cross multiplication.
// Equal quotients go to the entity with more votes, then to the earlier one in input order.

use std::cmp::Ordering;

use log::{debug, info};

use crate::config::MajorityRule;

// Orders the quotients of two entities. `Greater` means the first one gets the seat.
fn compare_quotients(votes_a: u64, seats_a: u32, votes_b: u64, seats_b: u32) -> Ordering {
    let lhs = votes_a as u128 * (seats_b as u128 + 1);
    let rhs = votes_b as u128 * (seats_a as u128 + 1);
    lhs.cmp(&rhs).then(votes_a.cmp(&votes_b))
}

/// Distributes `seats` seats over the given vote counts with the highest averages method.
///
/// The result has one entry per input entry, in the same order, and always adds up to
/// `seats` unless the input is empty.
pub fn highest_averages(votes: &[u64], seats: u32) -> Vec<u32> {
    let mut won: Vec<u32> = vec![0; votes.len()];
    if votes.is_empty() {
        return won;
    }
    for _ in 0..seats {
        let mut best = 0;
        for idx in 1..votes.len() {
            // Strictly greater: on a complete tie the earlier entity keeps the seat.
            let cmp = compare_quotients(votes[idx], won[idx], votes[best], won[best]);
            if cmp == Ordering::Greater {
                best = idx;
            }
        }
        won[best] += 1;
    }
    won
}

/// The index of the most voted entry. Ties go to the earliest entry.
pub fn most_voted<T>(votes: &[(T, u64)]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (idx, (_, v)) in votes.iter().enumerate() {
        match best {
            Some(b) if votes[b].1 >= *v => {}
            _ => best = Some(idx),
        }
    }
    best
}

/// Apportions the seats of a council between lemas, guaranteeing the majority of the
/// rule to the most voted lema (Article 272).
///
/// The pure D'Hondt distribution stands when it already gives the winner the majority.
/// Otherwise the winner receives exactly the majority and the remaining seats are
/// apportioned between the other lemas only.
///
/// The result lists every lema of the input, in input order, including lemas without
/// seats. An empty input gives an empty result.
///
/// ```
/// use departmental_tally::dhondt::seats_by_lema;
/// use departmental_tally::MajorityRule;
///
/// let votes = vec![("A".to_string(), 40), ("B".to_string(), 35), ("C".to_string(), 25)];
/// let seats = seats_by_lema(&votes, MajorityRule::MUNICIPAL_COUNCIL);
/// assert_eq!(
///     seats,
///     vec![("A".to_string(), 3), ("B".to_string(), 1), ("C".to_string(), 1)]
/// );
/// ```
pub fn seats_by_lema(votes: &[(String, u64)], rule: MajorityRule) -> Vec<(String, u32)> {
    let names = |counts: Vec<u32>| -> Vec<(String, u32)> {
        votes
            .iter()
            .zip(counts)
            .map(|((name, _), s)| (name.clone(), s))
            .collect()
    };

    let winner = match most_voted(votes) {
        Some(w) => w,
        None => return Vec::new(),
    };

    let with_votes = votes.iter().filter(|(_, v)| *v > 0).count();
    if votes.len() == 1 || with_votes == 1 {
        debug!(
            "seats_by_lema: {} is the only lema with votes, gets all {} seats",
            votes[winner].0,
            rule.seats()
        );
        let counts = (0..votes.len())
            .map(|idx| if idx == winner { rule.seats() } else { 0 })
            .collect();
        return names(counts);
    }

    let counts: Vec<u64> = votes.iter().map(|(_, v)| *v).collect();
    let pure = highest_averages(&counts, rule.seats());
    if pure[winner] >= rule.majority() {
        debug!("seats_by_lema: pure distribution {:?} stands", pure);
        return names(pure);
    }

    info!(
        "seats_by_lema: {} won {} seats, raised to the majority of {}",
        votes[winner].0,
        pure[winner],
        rule.majority()
    );
    let others: Vec<u64> = counts
        .iter()
        .enumerate()
        .filter(|(idx, _)| *idx != winner)
        .map(|(_, v)| *v)
        .collect();
    let mut rest = highest_averages(&others, rule.seats() - rule.majority()).into_iter();
    let res: Vec<u32> = (0..votes.len())
        .map(|idx| {
            if idx == winner {
                rule.majority()
            } else {
                rest.next().unwrap_or(0)
            }
        })
        .collect();
    debug!("seats_by_lema: overridden distribution {:?}", res);
    names(res)
}

/// The seats of one list and the quotient of the last seat it won.
#[derive(PartialEq, Debug, Clone, Copy)]
pub struct ListAllocation {
    pub seats: u32,
    /// votes / seats, or zero without seats.
    pub last_quotient: f64,
}

/// Splits the seats won by a party between its lists with plain D'Hondt, no majority
/// rule involved.
pub fn apportion_lists(votes: &[u64], seats: u32) -> Vec<ListAllocation> {
    highest_averages(votes, seats)
        .into_iter()
        .zip(votes)
        .map(|(s, v)| ListAllocation {
            seats: s,
            last_quotient: if s > 0 { *v as f64 / s as f64 } else { 0.0 },
        })
        .collect()
}
