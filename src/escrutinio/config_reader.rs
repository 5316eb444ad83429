use snafu::prelude::*;

use crate::escrutinio::*;

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(rename = "electionName")]
    pub election_name: String,
    #[serde(rename = "outputPath")]
    pub output_path: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct FileSource {
    /// The layout of the file. Only `v2020` is supported, `auto` detects it.
    pub provider: String,
    #[serde(rename = "filePath")]
    pub file_path: String,
    pub year: Option<u32>,
}

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct RulesConfig {
    #[serde(rename = "departmentSeats")]
    pub department_seats: Option<u32>,
    #[serde(rename = "departmentMajority")]
    pub department_majority: Option<u32>,
    #[serde(rename = "municipalitySeats")]
    pub municipality_seats: Option<u32>,
    #[serde(rename = "municipalityMajority")]
    pub municipality_majority: Option<u32>,
    #[serde(rename = "percentageDecimals")]
    pub percentage_decimals: Option<u32>,
    pub parallel: Option<bool>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct EscrutinioConfig {
    #[serde(rename = "outputSettings")]
    pub output_settings: OutputSettings,
    pub sources: Vec<FileSource>,
    #[serde(rename = "partyAliasesPath")]
    pub party_aliases_path: Option<String>,
    #[serde(default)]
    pub rules: RulesConfig,
}

pub fn read_config(path: &str) -> EscrutinioResult<EscrutinioConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let config: EscrutinioConfig =
        serde_json::from_str(&contents).context(ParsingJsonSnafu { path })?;
    info!("config: {:?}", config);
    Ok(config)
}

/// Turns the rules of the configuration into processing rules. Missing values keep their
/// default.
pub fn validate_rules(rules: &RulesConfig) -> EscrutinioResult<ProcessingRules> {
    let d = ProcessingRules::DEFAULT_RULES;
    let department_rule = MajorityRule::new(
        rules.department_seats.unwrap_or(d.department_rule.seats()),
        rules
            .department_majority
            .unwrap_or(d.department_rule.majority()),
    )
    .context(TallySnafu {})?;
    let municipality_rule = MajorityRule::new(
        rules
            .municipality_seats
            .unwrap_or(d.municipality_rule.seats()),
        rules
            .municipality_majority
            .unwrap_or(d.municipality_rule.majority()),
    )
    .context(TallySnafu {})?;
    Ok(ProcessingRules {
        department_rule,
        municipality_rule,
        percentage_decimals: rules.percentage_decimals.unwrap_or(d.percentage_decimals),
        parallel: rules.parallel.unwrap_or(d.parallel),
    })
}

pub fn read_summary(path: &str) -> EscrutinioResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    debug!("read content: {} bytes", contents.len());
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
    Ok(js)
}
