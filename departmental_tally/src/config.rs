// ********* Input data structures ***********

use std::collections::BTreeMap;

use snafu::{ensure, Snafu};

/// A printed ballot sheet ("hoja") and the votes it received.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct BallotSheet {
    /// The number printed on the sheet.
    pub id: u32,
    pub name: String,
    pub votes: u64,
}

/// A list of candidates presented under a sub-lema.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct List {
    pub id: u32,
    /// Free text description. For most lists this is the name of the head candidate,
    /// sometimes followed by the other candidates.
    pub description: String,
    /// Votes cast directly for the list.
    pub sheet_votes: u64,
    /// Votes credited to the list through its lema.
    pub lema_votes: u64,
    pub total: u64,
}

/// A grouping of lists inside a lema.
///
/// The same sub-lema can present different lists for the departmental board and for the
/// municipal council, hence the two flavors of lists.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct SubLema {
    pub id: u32,
    pub name: String,
    pub sheet_votes: u64,
    /// Votes cast for the sub-lema without choosing a list.
    pub sublema_votes: u64,
    pub total: u64,
    pub board_lists: Vec<List>,
    pub municipal_lists: Vec<List>,
}

/// The sub-lema breakdown of a party for a council race (departmental board or
/// municipal council).
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct SubLemaBlock {
    pub sub_lemas: Vec<SubLema>,
    pub lema_votes: u64,
    pub total: u64,
}

/// The mayoral ("Intendente") race inside a party.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct MayoralBlock {
    pub sheets: Vec<BallotSheet>,
    pub lema_votes: u64,
    pub total: u64,
}

#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct PartyAtMunicipality {
    pub id: u32,
    /// The lema.
    pub name: String,
    pub icon: String,
    pub sheet_votes: u64,
    pub lema_votes: u64,
    pub total: u64,
    pub sheets: Vec<BallotSheet>,
    pub council: SubLemaBlock,
}

#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct PartyAtDepartment {
    pub id: u32,
    /// The lema.
    pub name: String,
    pub icon: String,
    pub sheet_votes: u64,
    pub lema_votes: u64,
    pub total: u64,
    pub sheets: Vec<BallotSheet>,
    pub mayoral: MayoralBlock,
    pub board: SubLemaBlock,
}

/// Turnout counters shared by departments and municipalities.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Turnout {
    pub observed: u64,
    pub eligible: u64,
    /// Participation percentage, as a decimal string.
    pub participation: String,
    pub blank: u64,
    pub annulled: u64,
    pub not_observed: u64,
    pub envelopes: u64,
    /// Valid votes: the votes credited to a party.
    pub valid: u64,
    pub final_count: bool,
    pub ballots_scrutinized: u64,
    pub scrutinized_percent: u64,
    pub observed_recount: u64,
    pub precincts_counted: u64,
}

impl Default for Turnout {
    fn default() -> Self {
        Turnout {
            observed: 0,
            eligible: 0,
            participation: "0".to_string(),
            blank: 0,
            annulled: 0,
            not_observed: 0,
            envelopes: 0,
            valid: 0,
            final_count: false,
            ballots_scrutinized: 0,
            scrutinized_percent: 0,
            observed_recount: 0,
            precincts_counted: 0,
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct Municipality {
    pub id: u32,
    pub name: String,
    pub turnout: Turnout,
    pub parties: Vec<PartyAtMunicipality>,
}

#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct Department {
    /// Two digit code ("00" to "19").
    pub code: String,
    pub name: String,
    pub turnout: Turnout,
    pub municipalities: Vec<Municipality>,
    pub parties: Vec<PartyAtDepartment>,
}

/// The root of the tally tree for one election year.
///
/// Build it with [`ElectionSummary::new`] or the [`crate::builder::Builder`]: both check
/// that every declared total matches its parts.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct ElectionSummary {
    pub year: u32,
    pub departments: Vec<Department>,
}

// ******** Output data structures *********

/// Placeholder for names that cannot be resolved from the data.
pub const UNAVAILABLE: &str = "unavailable";

/// The seats won by one list inside its party.
#[derive(PartialEq, Debug, Clone)]
pub struct ListSeats {
    pub party: String,
    pub sub_lema: String,
    pub list_id: u32,
    pub description: String,
    pub votes: u64,
    pub seats: u32,
    /// The quotient of the last seat won by the list (votes / seats), 0 without seats.
    pub last_quotient: f64,
}

#[derive(PartialEq, Debug, Clone)]
pub struct EnrichedMunicipality {
    pub base: Municipality,
    /// The most voted lema, if any lema competed.
    pub winner: Option<String>,
    /// Council seats per lema, in order of first appearance.
    pub seats_by_party: Vec<(String, u32)>,
    pub mayor: String,
    pub list_seats: Vec<ListSeats>,
}

#[derive(PartialEq, Debug, Clone)]
pub struct EnrichedDepartment {
    pub base: Department,
    pub winner: Option<String>,
    /// Board seats per lema, in order of first appearance.
    pub seats_by_party: Vec<(String, u32)>,
    pub intendant: String,
    pub list_seats: Vec<ListSeats>,
    pub municipalities: Vec<EnrichedMunicipality>,
}

#[derive(PartialEq, Debug, Clone)]
pub struct EnrichedElectionSummary {
    pub year: u32,
    pub departments: Vec<EnrichedDepartment>,
}

/// Country-wide statistics computed over an enriched summary.
///
/// Only the votes credited to a party count: blank, annulled and observed ballots are
/// left out of both the vote totals and the percentages.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct NationalStats {
    pub total_valid_votes: u64,
    pub votes_by_lema: BTreeMap<String, u64>,
    pub percentages: BTreeMap<String, f64>,
    pub departments_won: BTreeMap<String, u32>,
    pub municipalities_won: BTreeMap<String, u32>,
    pub mayors_by_lema: BTreeMap<String, u32>,
    pub board_seats_by_lema: BTreeMap<String, u32>,
    pub council_seats_by_lema: BTreeMap<String, u32>,
    pub most_voted: Option<String>,
    pub department_count: u32,
    pub municipality_count: u32,
}

/// Errors that prevent the pipeline from completing.
#[derive(Debug, Snafu, Clone, PartialEq, Eq)]
#[snafu(visibility(pub(crate)))]
pub enum TallyError {
    #[snafu(display("{node}: declared {field} is {declared} but its parts add up to {computed}"))]
    TotalMismatch {
        node: String,
        field: &'static str,
        declared: u64,
        computed: u64,
    },
    #[snafu(display("Invalid seat rule: majority of {majority} out of {seats} seats"))]
    InvalidSeatRule { seats: u32, majority: u32 },
}

pub type TallyResult<T> = Result<T, TallyError>;

// ********* Configuration **********

/// The seats of a council and the majority automatically granted to the most voted lema
/// (Article 272 of the Constitution).
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct MajorityRule {
    seats: u32,
    majority: u32,
}

impl MajorityRule {
    /// Junta Departamental: 31 ediles, 16 for the winner.
    pub const DEPARTMENTAL_BOARD: MajorityRule = MajorityRule {
        seats: 31,
        majority: 16,
    };
    /// Concejo Municipal: 5 concejales, 3 for the winner.
    pub const MUNICIPAL_COUNCIL: MajorityRule = MajorityRule {
        seats: 5,
        majority: 3,
    };

    pub fn new(seats: u32, majority: u32) -> TallyResult<MajorityRule> {
        ensure!(majority <= seats, InvalidSeatRuleSnafu { seats, majority });
        Ok(MajorityRule { seats, majority })
    }

    pub fn seats(&self) -> u32 {
        self.seats
    }

    pub fn majority(&self) -> u32 {
        self.majority
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ProcessingRules {
    pub department_rule: MajorityRule,
    pub municipality_rule: MajorityRule,
    /// Number of decimals kept in the national percentages.
    pub percentage_decimals: u32,
    /// Enrich the departments on the rayon thread pool.
    pub parallel: bool,
}

impl ProcessingRules {
    pub const DEFAULT_RULES: ProcessingRules = ProcessingRules {
        department_rule: MajorityRule::DEPARTMENTAL_BOARD,
        municipality_rule: MajorityRule::MUNICIPAL_COUNCIL,
        percentage_decimals: 2,
        parallel: true,
    };
}

impl Default for ProcessingRules {
    fn default() -> Self {
        ProcessingRules::DEFAULT_RULES
    }
}
