use log::{debug, info, warn};

use departmental_tally::cache::{SourceId, SummaryCache};
use departmental_tally::normalize::department_display_name;
use departmental_tally::*;
use snafu::{prelude::*, Snafu};

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::json;
use serde_json::Map as JSMap;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;
use crate::escrutinio::config_reader::*;
use crate::escrutinio::io_common::{read_json_file, read_party_aliases, resolve_path};

pub mod config_reader;
mod io_common;
mod io_v2020;

#[derive(Debug, Snafu)]
pub enum EscrutinioError {
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON in {path}"))]
    ParsingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Error serializing the {what} to JSON"))]
    SerializingJson {
        source: serde_json::Error,
        what: String,
    },
    #[snafu(display("Error writing the summary to {path}"))]
    WritingJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Unknown source format, keys found: {keys:?}"))]
    UnknownFormat { keys: Vec<String> },
    #[snafu(display("The source contains no department"))]
    EmptyInput {},
    #[snafu(display("The configuration file has no parent directory"))]
    MissingParentDir {},
    #[snafu(display("{source}"))]
    Tally { source: TallyError },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type EscrutinioResult<T> = Result<T, EscrutinioError>;

/// Where the raw department records come from.
pub enum DataSource {
    /// A JSON file holding an array of department records.
    Path(String),
    /// Records already in memory.
    Records(Vec<JSValue>),
}

pub const DEFAULT_YEAR: u32 = 2020;

/// Loads the raw records of a source into a validated tally tree.
pub fn build_dataset(
    source: DataSource,
    year: u32,
    provider: &str,
) -> EscrutinioResult<ElectionSummary> {
    match provider {
        "v2020" | "auto" => {}
        x => whatever!("Provider not implemented {:?}", x),
    }
    match source {
        DataSource::Path(p) => io_v2020::read_v2020(&p, year),
        DataSource::Records(records) => io_v2020::read_v2020_records(records, year),
    }
}

fn seats_to_json(seats: &[(String, u32)]) -> JSValue {
    let mut m: JSMap<String, JSValue> = JSMap::new();
    for (lema, s) in seats {
        m.insert(lema.clone(), json!(s));
    }
    JSValue::Object(m)
}

// Only the lists that won a seat are reported.
fn list_seats_to_json(lists: &[ListSeats]) -> Vec<JSValue> {
    lists
        .iter()
        .filter(|l| l.seats > 0)
        .map(|l| {
            json!({
                "lema": l.party,
                "subLema": l.sub_lema,
                "list": l.list_id,
                "description": l.description,
                "votes": l.votes,
                "seats": l.seats,
                "lastQuotient": l.last_quotient
            })
        })
        .collect()
}

fn municipality_to_json(m: &EnrichedMunicipality) -> JSValue {
    json!({
        "id": m.base.id,
        "name": m.base.name,
        "winner": m.winner,
        "mayor": m.mayor,
        "validVotes": m.base.turnout.valid,
        "participation": m.base.turnout.participation,
        "seats": seats_to_json(&m.seats_by_party),
        "listSeats": list_seats_to_json(&m.list_seats)
    })
}

fn department_to_json(d: &EnrichedDepartment) -> JSValue {
    let municipalities: Vec<JSValue> = d.municipalities.iter().map(municipality_to_json).collect();
    json!({
        "code": d.base.code,
        "name": department_display_name(&d.base.name),
        "winner": d.winner,
        "intendant": d.intendant,
        "validVotes": d.base.turnout.valid,
        "blankVotes": d.base.turnout.blank,
        "annulledVotes": d.base.turnout.annulled,
        "participation": d.base.turnout.participation,
        "seats": seats_to_json(&d.seats_by_party),
        "listSeats": list_seats_to_json(&d.list_seats),
        "municipalities": municipalities
    })
}

fn stats_to_json(s: &NationalStats) -> JSValue {
    json!({
        "totalValidVotes": s.total_valid_votes,
        "votesByLema": s.votes_by_lema,
        "percentages": s.percentages,
        "departmentsWon": s.departments_won,
        "municipalitiesWon": s.municipalities_won,
        "mayorsByLema": s.mayors_by_lema,
        "boardSeatsByLema": s.board_seats_by_lema,
        "councilSeatsByLema": s.council_seats_by_lema,
        "mostVoted": s.most_voted,
        "departmentCount": s.department_count,
        "municipalityCount": s.municipality_count
    })
}

fn result_to_json(enriched: &EnrichedElectionSummary, stats: &NationalStats) -> JSValue {
    let departments: Vec<JSValue> = enriched.departments.iter().map(department_to_json).collect();
    json!({
        "year": enriched.year,
        "departments": departments,
        "national": stats_to_json(stats)
    })
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
struct OutputConfig {
    election: String,
    #[serde(rename = "departmentSeats")]
    department_seats: u32,
    #[serde(rename = "departmentMajority")]
    department_majority: u32,
    #[serde(rename = "municipalitySeats")]
    municipality_seats: u32,
    #[serde(rename = "municipalityMajority")]
    municipality_majority: u32,
}

fn build_summary_js(
    election_name: &str,
    rules: &ProcessingRules,
    results: Vec<JSValue>,
) -> JSValue {
    let c = OutputConfig {
        election: election_name.to_string(),
        department_seats: rules.department_rule.seats(),
        department_majority: rules.department_rule.majority(),
        municipality_seats: rules.municipality_rule.seats(),
        municipality_majority: rules.municipality_rule.majority(),
    };
    json!({
        "config": c,
        "results": results
    })
}

// Everything needed for a run, once the configuration file and the flags are merged.
#[derive(Debug, Clone)]
struct RunPlan {
    election_name: String,
    sources: Vec<FileSource>,
    aliases_path: Option<String>,
    rules: ProcessingRules,
    out: Option<String>,
}

fn plan_run(args: &Args) -> EscrutinioResult<RunPlan> {
    let mut plan = match &args.config {
        Some(config_path) => {
            let config = read_config(config_path)?;
            let root_p = Path::new(config_path.as_str())
                .parent()
                .context(MissingParentDirSnafu {})?;
            RunPlan {
                election_name: config.output_settings.election_name.clone(),
                sources: config
                    .sources
                    .iter()
                    .map(|s| FileSource {
                        file_path: resolve_path(root_p, &s.file_path),
                        ..s.clone()
                    })
                    .collect(),
                aliases_path: config
                    .party_aliases_path
                    .as_ref()
                    .map(|p| resolve_path(root_p, p)),
                rules: validate_rules(&config.rules)?,
                out: config
                    .output_settings
                    .output_path
                    .as_ref()
                    .map(|p| resolve_path(root_p, p)),
            }
        }
        None => RunPlan {
            election_name: "escrutinio".to_string(),
            sources: vec![],
            aliases_path: None,
            rules: ProcessingRules::DEFAULT_RULES,
            out: None,
        },
    };

    if let Some(input) = &args.input {
        plan.sources = vec![FileSource {
            provider: args.input_type.clone().unwrap_or_else(|| "auto".to_string()),
            file_path: input.clone(),
            year: args.year,
        }];
    }
    if let Some(aliases) = &args.aliases {
        plan.aliases_path = Some(aliases.clone());
    }
    if let Some(out) = &args.out {
        plan.out = Some(out.clone());
    }
    for source in plan.sources.iter_mut() {
        source.year = source.year.or(args.year);
    }

    if plan.sources.is_empty() {
        whatever!("No source to process: pass --input or a configuration file with sources")
    }
    Ok(plan)
}

/// Runs every source of the plan and returns the summary as a JSON value.
fn run_sources(plan: &RunPlan) -> EscrutinioResult<JSValue> {
    let aliases = match &plan.aliases_path {
        Some(p) => read_party_aliases(p)?,
        None => PartyAliases::empty(),
    };

    // Sources with the same content and year are processed once.
    let mut cache: SummaryCache<JSValue> = SummaryCache::default();
    let mut results: Vec<JSValue> = Vec::new();
    for source in plan.sources.iter() {
        let year = source.year.unwrap_or(DEFAULT_YEAR);
        let (contents, js) = read_json_file(&source.file_path)?;
        let id = SourceId::new(&format!("{}/{}", source.provider, year), &contents);
        let result = cache.get_or_try_insert_with(&id, || {
            let records = match js {
                JSValue::Array(l) => l,
                other => vec![other],
            };
            let summary = build_dataset(DataSource::Records(records), year, &source.provider)?;
            let (enriched, stats) =
                process(&summary, &aliases, &plan.rules).context(TallySnafu {})?;
            Ok::<JSValue, EscrutinioError>(result_to_json(&enriched, &stats))
        })?;
        results.push(result.clone());
    }
    Ok(build_summary_js(&plan.election_name, &plan.rules, results))
}

fn to_pretty_json<T: Serialize>(value: &T, what: &str) -> EscrutinioResult<String> {
    serde_json::to_string_pretty(value).context(SerializingJsonSnafu { what })
}

pub fn run_escrutinio(args: &Args) -> EscrutinioResult<()> {
    let plan = plan_run(args)?;
    info!("plan: {:?}", plan);

    let result_js = run_sources(&plan)?;
    let pretty_js_stats = to_pretty_json(&result_js, "summary")?;

    match plan.out.as_deref() {
        None | Some("stdout") => println!("{}", pretty_js_stats),
        Some("") => debug!("Summary not written"),
        Some(p) => {
            info!("Writing summary to {:?}", p);
            fs::write(p, pretty_js_stats.as_str()).context(WritingJsonSnafu { path: p })?;
        }
    }

    // The reference summary, if provided for comparison
    if let Some(summary_p) = &args.reference {
        let summary_ref = read_summary(summary_p)?;
        let pretty_js_summary_ref = to_pretty_json(&summary_ref, "reference summary")?;
        if pretty_js_summary_ref != pretty_js_stats {
            warn!("Found differences with the reference string");
            print_diff(
                pretty_js_summary_ref.as_str(),
                pretty_js_stats.as_ref(),
                "\n",
            );
            whatever!("Difference detected between calculated summary and reference summary")
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn data_path(name: &str) -> String {
        format!("{}/tests/data/{}", env!("CARGO_MANIFEST_DIR"), name)
    }

    fn args() -> Args {
        Args {
            config: None,
            reference: None,
            out: Some("".to_string()),
            input: None,
            input_type: None,
            year: None,
            aliases: None,
            verbose: false,
        }
    }

    #[test]
    fn config_run_matches_the_reference() {
        init();
        let res = run_escrutinio(&Args {
            config: Some(data_path("config.json")),
            reference: Some(data_path("expected_summary.json")),
            ..args()
        });
        if let Err(e) = &res {
            eprintln!("An error occured {}", e);
        }
        assert!(res.is_ok());
    }

    #[test]
    fn reference_mismatch_is_an_error() {
        init();
        // Without the configuration the election name and the party labels differ.
        let res = run_escrutinio(&Args {
            input: Some(data_path("mini_2020.json")),
            reference: Some(data_path("expected_summary.json")),
            ..args()
        });
        assert!(matches!(res, Err(EscrutinioError::Whatever { .. })));
    }

    #[test]
    fn flags_replace_the_config() {
        let plan = plan_run(&Args {
            config: Some(data_path("config.json")),
            input: Some("other.json".to_string()),
            year: Some(2015),
            aliases: Some("aliases.json".to_string()),
            ..args()
        })
        .unwrap();
        assert_eq!(plan.election_name, "Departamentales 2020 (muestra)");
        assert_eq!(plan.sources.len(), 1);
        assert_eq!(plan.sources[0].file_path, "other.json");
        assert_eq!(plan.sources[0].provider, "auto");
        assert_eq!(plan.sources[0].year, Some(2015));
        assert_eq!(plan.aliases_path.as_deref(), Some("aliases.json"));
        assert_eq!(plan.out.as_deref(), Some(""));
    }

    #[test]
    fn config_paths_are_relative_to_the_config() {
        let plan = plan_run(&Args {
            config: Some(data_path("config.json")),
            ..args()
        })
        .unwrap();
        assert_eq!(plan.sources[0].file_path, data_path("mini_2020.json"));
        assert_eq!(plan.aliases_path, Some(data_path("party_aliases.json")));
    }

    #[test]
    fn nothing_to_process() {
        assert!(matches!(
            plan_run(&args()),
            Err(EscrutinioError::Whatever { .. })
        ));
    }

    #[test]
    fn identical_sources_are_processed_once() {
        init();
        let plan = plan_run(&Args {
            config: Some(data_path("config.json")),
            ..args()
        })
        .unwrap();
        let twice = RunPlan {
            sources: vec![plan.sources[0].clone(), plan.sources[0].clone()],
            ..plan
        };
        let js = run_sources(&twice).unwrap();
        let results = js["results"].as_array().unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0], results[1]);
    }

    #[test]
    fn datasets_from_records_or_files() {
        let (_, js) = read_json_file(&data_path("mini_2020.json")).unwrap();
        let records = js.as_array().unwrap().clone();
        let from_records = build_dataset(DataSource::Records(records), 2020, "v2020").unwrap();
        let from_file =
            build_dataset(DataSource::Path(data_path("mini_2020.json")), 2020, "auto").unwrap();
        assert_eq!(from_records, from_file);
        assert_eq!(from_file.departments.len(), 2);
        assert!(build_dataset(DataSource::Records(vec![]), 2020, "v2025").is_err());
    }

    #[test]
    fn serialization_failures_are_reported_as_such() {
        assert!(to_pretty_json(&json!({"a": 1}), "summary").is_ok());
        // JSON object keys must be strings.
        let mut bad = std::collections::BTreeMap::new();
        bad.insert(vec![1u32], 2u32);
        match to_pretty_json(&bad, "summary") {
            Err(e @ EscrutinioError::SerializingJson { .. }) => {
                assert_eq!(e.to_string(), "Error serializing the summary to JSON")
            }
            r => panic!("unexpected result {:?}", r),
        }
    }
}
