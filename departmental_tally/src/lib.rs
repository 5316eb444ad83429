mod config;
use log::info;

pub mod aggregate;
pub mod builder;
pub mod cache;
pub mod cleaning;
pub mod dhondt;
pub mod enrich;
pub mod manual;
pub mod normalize;
pub mod validate;

pub use crate::config::*;
pub use crate::normalize::PartyAliases;
pub use crate::validate::Validate;

/// Runs the whole pipeline over a validated summary: cleaning, enrichment and national
/// aggregation.
///
/// Arguments:
/// * `summary` the tally tree, as built by a source adapter
/// * `aliases` the party alias table used to canonicalize the lema names
/// * `rules` the seat rules and output settings
///
/// On error nothing is returned: there are no partial results.
pub fn process(
    summary: &ElectionSummary,
    aliases: &PartyAliases,
    rules: &ProcessingRules,
) -> TallyResult<(EnrichedElectionSummary, NationalStats)> {
    info!(
        "Processing {} departments for year {}, rules: {:?}",
        summary.departments.len(),
        summary.year,
        rules
    );
    let cleaned = cleaning::clean(summary, aliases)?;
    let enriched = enrich::enrich(&cleaned, rules);
    let stats = aggregate::national_stats(&enriched, rules.percentage_decimals);
    info!(
        "Processing done: {} valid votes, most voted lema: {:?}",
        stats.total_valid_votes, stats.most_voted
    );
    Ok((enriched, stats))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn party(name: &str, total: u64) -> PartyAtDepartment {
        PartyAtDepartment {
            name: name.to_string(),
            sheet_votes: total,
            total,
            ..Default::default()
        }
    }

    fn muni_party(name: &str, total: u64) -> PartyAtMunicipality {
        PartyAtMunicipality {
            name: name.to_string(),
            sheet_votes: total,
            total,
            ..Default::default()
        }
    }

    fn summary() -> ElectionSummary {
        let mut b = builder::Builder::new(2020).unwrap();
        b.add_department(Department {
            code: "04".to_string(),
            name: "Colonia".to_string(),
            turnout: Turnout {
                valid: 100,
                participation: "88,1".to_string(),
                ..Default::default()
            },
            municipalities: vec![Municipality {
                id: 1,
                name: "Carmelo".to_string(),
                turnout: Turnout {
                    valid: 100,
                    ..Default::default()
                },
                parties: vec![
                    muni_party("partido nacional", 40),
                    muni_party("frente amplio", 35),
                    muni_party("partido colorado", 25),
                ],
            }],
            parties: vec![
                party("partido nacional", 61),
                party("frente amplio", 30),
                party("P. Colorado", 9),
            ],
        })
        .unwrap();
        b.add_department(Department {
            code: "13".to_string(),
            name: "Rivera".to_string(),
            parties: vec![party("partido colorado", 70), party("frente amplio", 30)],
            ..Default::default()
        })
        .unwrap();
        b.build().unwrap()
    }

    fn aliases() -> PartyAliases {
        PartyAliases::new(vec![("P COLORADO", "Partido Colorado")])
    }

    #[test]
    fn full_pipeline() {
        init();
        let (enriched, stats) =
            process(&summary(), &aliases(), &ProcessingRules::DEFAULT_RULES).unwrap();
        let colonia = &enriched.departments[0];
        assert_eq!(colonia.base.name, "COLONIA");
        assert_eq!(colonia.winner.as_deref(), Some("Partido Nacional"));
        assert_eq!(colonia.seats_by_party.iter().map(|(_, s)| s).sum::<u32>(), 31);
        assert!(colonia.seats_by_party[0].1 >= 16);
        let carmelo = &colonia.municipalities[0];
        assert_eq!(
            carmelo.seats_by_party,
            vec![
                ("Partido Nacional".to_string(), 3),
                ("Frente Amplio".to_string(), 1),
                ("Partido Colorado".to_string(), 1)
            ]
        );
        assert_eq!(carmelo.mayor, UNAVAILABLE);
        assert_eq!(stats.mayors_by_lema, stats.municipalities_won);

        assert_eq!(stats.total_valid_votes, 200);
        assert_eq!(stats.votes_by_lema["Partido Colorado"], 79);
        assert_eq!(stats.most_voted.as_deref(), Some("Partido Colorado"));
        assert_eq!(stats.departments_won["Partido Colorado"], 1);
        assert_eq!(stats.board_seats_by_lema.values().sum::<u32>(), 62);
        assert_eq!(stats.percentages["Frente Amplio"], 30.0);
    }

    #[test]
    fn processing_leaves_the_input_untouched() {
        let input = summary();
        let copy = input.clone();
        let _ = process(&input, &aliases(), &ProcessingRules::DEFAULT_RULES).unwrap();
        assert_eq!(input, copy);
    }

    #[test]
    fn invalid_input_fails_without_partial_result() {
        let mut input = summary();
        input.departments[1].turnout.valid = 99;
        let res = process(&input, &aliases(), &ProcessingRules::DEFAULT_RULES);
        match res {
            Err(TallyError::TotalMismatch { node, .. }) => assert_eq!(node, "department RIVERA"),
            r => panic!("unexpected result {:?}", r),
        }
    }

    #[test]
    fn list_seats_match_party_seats() {
        init();
        let list = |id: u32, total: u64| List {
            id,
            description: format!("CANDIDATO {}", id),
            sheet_votes: total,
            total,
            ..Default::default()
        };
        let board_party = |name: &str, lists: Vec<List>| {
            let total: u64 = lists.iter().map(|l| l.total).sum();
            PartyAtDepartment {
                name: name.to_string(),
                sheet_votes: total,
                total,
                board: SubLemaBlock {
                    sub_lemas: vec![SubLema {
                        name: format!("{} UNIDO", name),
                        sheet_votes: total,
                        total,
                        board_lists: lists,
                        ..Default::default()
                    }],
                    total,
                    ..Default::default()
                },
                ..Default::default()
            }
        };
        let input = ElectionSummary::new(
            2015,
            vec![Department {
                name: "DURAZNO".to_string(),
                parties: vec![
                    board_party("A", vec![list(1, 3100), list(2, 1700), list(3, 400)]),
                    board_party("B", vec![list(4, 2900), list(5, 2100)]),
                    board_party("C", vec![list(6, 600)]),
                ],
                ..Default::default()
            }],
        )
        .unwrap();
        let rules = ProcessingRules {
            parallel: false,
            ..ProcessingRules::DEFAULT_RULES
        };
        let (enriched, _) = process(&input, &PartyAliases::empty(), &rules).unwrap();
        let d = &enriched.departments[0];
        for (party, seats) in d.seats_by_party.iter() {
            let from_lists: u32 = d
                .list_seats
                .iter()
                .filter(|l| &l.party == party)
                .map(|l| l.seats)
                .sum();
            assert_eq!(from_lists, *seats, "party {}", party);
        }
    }
}
