// Rebuilds a tally tree with normalized names and decimal strings.
//
// Territory, sub-lema and sheet identifiers get their comparison key, parties get their
// official label, candidate labels are folded without losing their separators.

use log::info;

use crate::config::*;
use crate::normalize::{fold_label, normalize_decimal, simplify, PartyAliases};

fn clean_sheet(h: &BallotSheet) -> BallotSheet {
    BallotSheet {
        name: fold_label(&h.name),
        ..h.clone()
    }
}

fn clean_list(l: &List) -> List {
    List {
        description: fold_label(&l.description),
        ..l.clone()
    }
}

fn clean_sub_lema(s: &SubLema) -> SubLema {
    SubLema {
        id: s.id,
        name: simplify(&s.name),
        sheet_votes: s.sheet_votes,
        sublema_votes: s.sublema_votes,
        total: s.total,
        board_lists: s.board_lists.iter().map(clean_list).collect(),
        municipal_lists: s.municipal_lists.iter().map(clean_list).collect(),
    }
}

fn clean_block(b: &SubLemaBlock) -> SubLemaBlock {
    SubLemaBlock {
        sub_lemas: b.sub_lemas.iter().map(clean_sub_lema).collect(),
        lema_votes: b.lema_votes,
        total: b.total,
    }
}

fn clean_turnout(t: &Turnout) -> Turnout {
    Turnout {
        participation: normalize_decimal(&t.participation),
        ..t.clone()
    }
}

fn clean_party_at_municipality(
    p: &PartyAtMunicipality,
    aliases: &PartyAliases,
) -> PartyAtMunicipality {
    PartyAtMunicipality {
        id: p.id,
        name: aliases.canonical_party(&p.name),
        icon: p.icon.clone(),
        sheet_votes: p.sheet_votes,
        lema_votes: p.lema_votes,
        total: p.total,
        sheets: p.sheets.iter().map(clean_sheet).collect(),
        council: clean_block(&p.council),
    }
}

fn clean_party_at_department(
    p: &PartyAtDepartment,
    aliases: &PartyAliases,
) -> PartyAtDepartment {
    PartyAtDepartment {
        id: p.id,
        name: aliases.canonical_party(&p.name),
        icon: p.icon.clone(),
        sheet_votes: p.sheet_votes,
        lema_votes: p.lema_votes,
        total: p.total,
        sheets: p.sheets.iter().map(clean_sheet).collect(),
        mayoral: MayoralBlock {
            sheets: p.mayoral.sheets.iter().map(clean_sheet).collect(),
            lema_votes: p.mayoral.lema_votes,
            total: p.mayoral.total,
        },
        board: clean_block(&p.board),
    }
}

fn clean_municipality(m: &Municipality, aliases: &PartyAliases) -> Municipality {
    Municipality {
        id: m.id,
        name: simplify(&m.name),
        turnout: clean_turnout(&m.turnout),
        parties: m
            .parties
            .iter()
            .map(|p| clean_party_at_municipality(p, aliases))
            .collect(),
    }
}

fn clean_department(d: &Department, aliases: &PartyAliases) -> Department {
    Department {
        code: d.code.trim().to_string(),
        name: simplify(&d.name),
        turnout: clean_turnout(&d.turnout),
        municipalities: d
            .municipalities
            .iter()
            .map(|m| clean_municipality(m, aliases))
            .collect(),
        parties: d
            .parties
            .iter()
            .map(|p| clean_party_at_department(p, aliases))
            .collect(),
    }
}

/// Returns a new summary with normalized names and decimals. No vote count is touched,
/// and the result is validated again before being returned.
///
/// Cleaning an already clean summary gives the same summary.
pub fn clean(summary: &ElectionSummary, aliases: &PartyAliases) -> TallyResult<ElectionSummary> {
    info!(
        "clean: {} departments, {} party aliases",
        summary.departments.len(),
        aliases.len()
    );
    let departments = summary
        .departments
        .iter()
        .map(|d| clean_department(d, aliases))
        .collect();
    ElectionSummary::new(summary.year, departments)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_summary() -> ElectionSummary {
        let list = List {
            id: 90,
            description: "José Pérez / Ana Díaz".to_string(),
            sheet_votes: 70,
            lema_votes: 0,
            total: 70,
        };
        let party = PartyAtMunicipality {
            id: 3,
            name: "  partido nacional ".to_string(),
            sheet_votes: 70,
            total: 70,
            council: SubLemaBlock {
                sub_lemas: vec![SubLema {
                    name: "Todos  por Paysandú".to_string(),
                    sheet_votes: 70,
                    total: 70,
                    municipal_lists: vec![list],
                    ..Default::default()
                }],
                total: 70,
                ..Default::default()
            },
            ..Default::default()
        };
        ElectionSummary {
            year: 2020,
            departments: vec![Department {
                code: " 11".to_string(),
                name: "Paysandú".to_string(),
                turnout: Turnout {
                    participation: " 85,3 ".to_string(),
                    ..Default::default()
                },
                municipalities: vec![Municipality {
                    id: 1,
                    name: "Guichón".to_string(),
                    turnout: Turnout {
                        valid: 70,
                        participation: "n/d".to_string(),
                        ..Default::default()
                    },
                    parties: vec![party],
                }],
                parties: vec![PartyAtDepartment {
                    name: "F.A.".to_string(),
                    mayoral: MayoralBlock {
                        sheets: vec![BallotSheet {
                            id: 1,
                            name: "Nicolás Olivera".to_string(),
                            votes: 10,
                        }],
                        total: 10,
                        ..Default::default()
                    },
                    ..Default::default()
                }],
            }],
        }
    }

    fn aliases() -> PartyAliases {
        PartyAliases::new(vec![("FA", "Frente Amplio")])
    }

    #[test]
    fn names_and_decimals_are_normalized() {
        let c = clean(&raw_summary(), &aliases()).unwrap();
        let d = &c.departments[0];
        assert_eq!(d.code, "11");
        assert_eq!(d.name, "PAYSANDU");
        assert_eq!(d.turnout.participation, "85.3");
        assert_eq!(d.parties[0].name, "Frente Amplio");
        assert_eq!(d.parties[0].mayoral.sheets[0].name, "NICOLAS OLIVERA");
        let m = &d.municipalities[0];
        assert_eq!(m.name, "GUICHON");
        assert_eq!(m.turnout.participation, "0");
        let p = &m.parties[0];
        assert_eq!(p.name, "Partido Nacional");
        assert_eq!(p.council.sub_lemas[0].name, "TODOS POR PAYSANDU");
        assert_eq!(
            p.council.sub_lemas[0].municipal_lists[0].description,
            "JOSE PEREZ / ANA DIAZ"
        );
        assert_eq!(p.council.sub_lemas[0].municipal_lists[0].total, 70);
    }

    #[test]
    fn clean_is_idempotent() {
        let once = clean(&raw_summary(), &aliases()).unwrap();
        let twice = clean(&once, &aliases()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn invalid_tree_is_rejected() {
        let mut s = raw_summary();
        s.departments[0].municipalities[0].turnout.valid = 71;
        assert!(matches!(
            clean(&s, &aliases()),
            Err(TallyError::TotalMismatch { .. })
        ));
    }
}
