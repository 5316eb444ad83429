// Reader for the JSON summaries published by the Corte Electoral (2020 layout).

use departmental_tally::builder::Builder;
use departmental_tally::*;
use snafu::prelude::*;

use crate::escrutinio::io_common::{Count, Flag, Text};
use crate::escrutinio::*;

/// The keys that identify the 2020 layout on the first department record. Each entry
/// lists the accepted spellings of one key.
const SIGNATURE: [&[&str]; 6] = [
    &["DN"],
    &["Departamentales"],
    &["Municipales"],
    &["TA", "VB"],
    &["TO", "VA"],
    &["TH", "TOT"],
];

/// Checks that the records follow the 2020 layout, by looking at the first one.
pub fn detect_v2020(records: &[JSValue]) -> EscrutinioResult<()> {
    let first = records.first().context(EmptyInputSnafu {})?;
    let keys: Vec<String> = match first.as_object() {
        Some(m) => m.keys().cloned().collect(),
        None => vec![],
    };
    let found = SIGNATURE
        .iter()
        .all(|spellings| spellings.iter().any(|k| keys.iter().any(|x| x == k)));
    ensure!(found, UnknownFormatSnafu { keys });
    debug!("detect_v2020: signature found in {} records", records.len());
    Ok(())
}

/// Converts raw department records into a validated tally tree.
pub fn read_v2020_records(records: Vec<JSValue>, year: u32) -> EscrutinioResult<ElectionSummary> {
    detect_v2020(&records)?;
    let mut builder = Builder::new(year).context(TallySnafu {})?;
    for (idx, record) in records.into_iter().enumerate() {
        let raw: RawDepartment =
            serde_json::from_value(record).context(ParsingJsonSnafu {
                path: format!("record {}", idx),
            })?;
        info!("Reading department {:?}", raw.name.0);
        builder
            .add_department(raw.into_department())
            .context(TallySnafu {})?;
    }
    builder.build().context(TallySnafu {})
}

pub fn read_v2020(path: &str, year: u32) -> EscrutinioResult<ElectionSummary> {
    let (_, js) = read_json_file(path)?;
    let records = match js {
        JSValue::Array(l) => l,
        other => vec![other],
    };
    read_v2020_records(records, year)
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct RawSheet {
    #[serde(rename = "HI")]
    id: Count,
    #[serde(rename = "HN")]
    name: Text,
    #[serde(rename = "Tot")]
    total: Count,
}

impl RawSheet {
    fn into_sheet(self) -> BallotSheet {
        BallotSheet {
            id: self.id.as_id(),
            name: self.name.0,
            votes: self.total.0,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct RawList {
    #[serde(rename = "LId")]
    id: Count,
    #[serde(rename = "Dsc")]
    description: Text,
    #[serde(rename = "VH")]
    sheet_votes: Count,
    #[serde(rename = "VAL")]
    lema_votes: Count,
    #[serde(rename = "Tot")]
    total: Count,
}

impl RawList {
    fn into_list(self) -> List {
        List {
            id: self.id.as_id(),
            description: self.description.0,
            sheet_votes: self.sheet_votes.0,
            lema_votes: self.lema_votes.0,
            total: self.total.0,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct RawSubLema {
    #[serde(rename = "Id")]
    id: Count,
    #[serde(rename = "Nombre")]
    name: Text,
    #[serde(rename = "VH")]
    sheet_votes: Count,
    #[serde(rename = "VAS")]
    sublema_votes: Count,
    #[serde(rename = "Tot")]
    total: Count,
    #[serde(rename = "ListasJunta")]
    board_lists: Vec<RawList>,
    #[serde(rename = "ListasMunicipio")]
    municipal_lists: Vec<RawList>,
}

impl RawSubLema {
    fn into_sub_lema(self) -> SubLema {
        SubLema {
            id: self.id.as_id(),
            name: self.name.0,
            sheet_votes: self.sheet_votes.0,
            sublema_votes: self.sublema_votes.0,
            total: self.total.0,
            board_lists: self.board_lists.into_iter().map(|l| l.into_list()).collect(),
            municipal_lists: self
                .municipal_lists
                .into_iter()
                .map(|l| l.into_list())
                .collect(),
        }
    }
}

// "Junta" for the departmental board, "Municipio" for the municipal council.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct RawCouncil {
    #[serde(rename = "Sublemas")]
    sub_lemas: Vec<RawSubLema>,
    #[serde(rename = "TALDSL")]
    lema_votes: Count,
    #[serde(rename = "Tot")]
    total: Count,
}

impl RawCouncil {
    fn into_block(self) -> SubLemaBlock {
        SubLemaBlock {
            sub_lemas: self.sub_lemas.into_iter().map(|s| s.into_sub_lema()).collect(),
            lema_votes: self.lema_votes.0,
            total: self.total.0,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct RawMayoral {
    #[serde(rename = "Listas")]
    sheets: Vec<RawSheet>,
    #[serde(rename = "TALDI")]
    lema_votes: Count,
    #[serde(rename = "Tot")]
    total: Count,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct RawParty {
    #[serde(rename = "LI")]
    id: Count,
    #[serde(rename = "LN")]
    name: Text,
    #[serde(rename = "LIcon")]
    icon: Text,
    #[serde(rename = "TH")]
    sheet_votes: Count,
    #[serde(rename = "TAL")]
    lema_votes: Count,
    #[serde(rename = "Tot")]
    total: Count,
    #[serde(rename = "Hojas")]
    sheets: Vec<RawSheet>,
    // Municipal races only.
    #[serde(rename = "Municipio")]
    council: RawCouncil,
    // Departmental races only.
    #[serde(rename = "Intendente")]
    mayoral: RawMayoral,
    #[serde(rename = "Junta")]
    board: RawCouncil,
}

impl RawParty {
    fn sheets(&self) -> Vec<BallotSheet> {
        self.sheets.iter().cloned().map(|h| h.into_sheet()).collect()
    }

    fn into_party_at_municipality(self) -> PartyAtMunicipality {
        PartyAtMunicipality {
            id: self.id.as_id(),
            sheets: self.sheets(),
            name: self.name.0,
            icon: self.icon.0,
            sheet_votes: self.sheet_votes.0,
            lema_votes: self.lema_votes.0,
            total: self.total.0,
            council: self.council.into_block(),
        }
    }

    fn into_party_at_department(self) -> PartyAtDepartment {
        PartyAtDepartment {
            id: self.id.as_id(),
            sheets: self.sheets(),
            name: self.name.0,
            icon: self.icon.0,
            sheet_votes: self.sheet_votes.0,
            lema_votes: self.lema_votes.0,
            total: self.total.0,
            mayoral: MayoralBlock {
                sheets: self
                    .mayoral
                    .sheets
                    .into_iter()
                    .map(|h| h.into_sheet())
                    .collect(),
                lema_votes: self.mayoral.lema_votes.0,
                total: self.mayoral.total.0,
            },
            board: self.board.into_block(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct RawTurnout {
    #[serde(rename = "CE")]
    observed: Count,
    #[serde(rename = "CT")]
    eligible: Count,
    #[serde(rename = "CP")]
    participation: Text,
    #[serde(rename = "TA")]
    blank: Option<Count>,
    #[serde(rename = "TO")]
    annulled: Option<Count>,
    #[serde(rename = "TNO")]
    not_observed: Count,
    #[serde(rename = "TE")]
    envelopes: Count,
    #[serde(rename = "TH")]
    valid: Option<Count>,
    #[serde(rename = "CFCO")]
    final_count: Flag,
    #[serde(rename = "TEB")]
    ballots_scrutinized: Count,
    #[serde(rename = "TEBP")]
    scrutinized_percent: Count,
    #[serde(rename = "TOR")]
    observed_recount: Count,
    #[serde(rename = "CCO")]
    precincts_counted: Count,
    // Older spellings of the blank, annulled and valid counters.
    #[serde(rename = "VB")]
    old_blank: Option<Count>,
    #[serde(rename = "VA")]
    old_annulled: Option<Count>,
    #[serde(rename = "TOT")]
    old_valid: Option<Count>,
}

impl RawTurnout {
    fn into_turnout(self) -> Turnout {
        let participation = if self.participation.0.trim().is_empty() {
            "0".to_string()
        } else {
            self.participation.0
        };
        Turnout {
            observed: self.observed.0,
            eligible: self.eligible.0,
            participation,
            blank: self.blank.or(self.old_blank).unwrap_or_default().0,
            annulled: self.annulled.or(self.old_annulled).unwrap_or_default().0,
            not_observed: self.not_observed.0,
            envelopes: self.envelopes.0,
            valid: self.valid.or(self.old_valid).unwrap_or_default().0,
            final_count: self.final_count.0,
            ballots_scrutinized: self.ballots_scrutinized.0,
            scrutinized_percent: self.scrutinized_percent.0,
            observed_recount: self.observed_recount.0,
            precincts_counted: self.precincts_counted.0,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct RawMunicipality {
    #[serde(rename = "MI")]
    id: Count,
    #[serde(rename = "MD")]
    name: Text,
    #[serde(flatten)]
    turnout: RawTurnout,
    #[serde(rename = "Eleccion")]
    parties: Vec<RawParty>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct RawDepartment {
    #[serde(rename = "DI")]
    code: Text,
    #[serde(rename = "DN")]
    name: Text,
    #[serde(flatten)]
    turnout: RawTurnout,
    #[serde(rename = "Municipales")]
    municipalities: Vec<RawMunicipality>,
    #[serde(rename = "Departamentales")]
    parties: Vec<RawParty>,
}

impl RawDepartment {
    fn into_department(self) -> Department {
        let municipalities = self
            .municipalities
            .into_iter()
            .map(|m| Municipality {
                id: m.id.as_id(),
                name: m.name.0,
                turnout: m.turnout.into_turnout(),
                parties: m
                    .parties
                    .into_iter()
                    .map(|p| p.into_party_at_municipality())
                    .collect(),
            })
            .collect();
        Department {
            code: self.code.0,
            name: self.name.0,
            turnout: self.turnout.into_turnout(),
            municipalities,
            parties: self
                .parties
                .into_iter()
                .map(|p| p.into_party_at_department())
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record() -> JSValue {
        json!({
            "DI": "13",
            "DN": "RIVERA",
            "CP": "80,5",
            "VB": "3",
            "VA": 1,
            "TOT": "150",
            "CFCO": "S",
            "Municipales": [{
                "MI": 1,
                "MD": "TRANQUERAS",
                "TA": 0,
                "TO": 0,
                "TH": 40,
                "Eleccion": [{
                    "LI": 2,
                    "LN": "Partido Colorado",
                    "TH": 40,
                    "Tot": 40,
                    "Hojas": [{"HI": 1, "HN": "1", "Tot": 40}],
                    "Municipio": {
                        "Sublemas": [{
                            "Id": 1,
                            "Nombre": "Sublema 1",
                            "VH": 40,
                            "Tot": 40,
                            "ListasMunicipio": [
                                {"LId": 1, "Dsc": "ANA GOMEZ / LUIS SOSA", "VH": 40, "Tot": 40}
                            ]
                        }],
                        "Tot": 40
                    }
                }]
            }],
            "Departamentales": [
                {
                    "LI": 2,
                    "LN": "Partido Colorado",
                    "TH": "100",
                    "Tot": 100,
                    "Intendente": {
                        "Listas": [{"HI": 7, "HN": "Marne Osorio", "Tot": 100}],
                        "Tot": 100
                    }
                },
                {"LI": 3, "LN": "Frente Amplio", "TH": 45, "TAL": 5, "Tot": 50}
            ]
        })
    }

    #[test]
    fn reads_a_department() {
        let s = read_v2020_records(vec![record()], 2020).unwrap();
        assert_eq!(s.year, 2020);
        let d = &s.departments[0];
        assert_eq!(d.code, "13");
        assert_eq!(d.turnout.blank, 3);
        assert_eq!(d.turnout.annulled, 1);
        assert_eq!(d.turnout.valid, 150);
        assert_eq!(d.turnout.participation, "80,5");
        assert!(d.turnout.final_count);
        assert_eq!(d.parties[0].mayoral.sheets[0].name, "Marne Osorio");
        assert_eq!(d.parties[1].lema_votes, 5);
        let m = &d.municipalities[0];
        assert_eq!(m.turnout.participation, "0");
        let sl = &m.parties[0].council.sub_lemas[0];
        assert_eq!(sl.municipal_lists[0].description, "ANA GOMEZ / LUIS SOSA");
    }

    #[test]
    fn unknown_layout_is_rejected() {
        let res = read_v2020_records(vec![json!({"Departamento": "RIVERA"})], 2020);
        match res {
            Err(EscrutinioError::UnknownFormat { keys }) => {
                assert_eq!(keys, vec!["Departamento".to_string()])
            }
            r => panic!("unexpected result {:?}", r),
        }
        assert!(matches!(
            read_v2020_records(vec![], 2020),
            Err(EscrutinioError::EmptyInput {})
        ));
    }

    #[test]
    fn inconsistent_totals_are_reported() {
        let mut r = record();
        r["TOT"] = json!(151);
        let res = read_v2020_records(vec![r], 2020);
        assert!(matches!(res, Err(EscrutinioError::Tally { .. })));
    }

    #[test]
    fn huge_counters_are_reported() {
        let mut r = record();
        r["Departamentales"][1] = json!({
            "LI": 3,
            "LN": "Frente Amplio",
            "TH": "18446744073709551615",
            "TAL": 1,
            "Tot": 5
        });
        match read_v2020_records(vec![r], 2020) {
            Err(EscrutinioError::Tally {
                source: TallyError::TotalMismatch { field, computed, .. },
            }) => assert_eq!((field, computed), ("total", u64::MAX)),
            r => panic!("unexpected result {:?}", r),
        }
    }
}
