// Consistency checks between declared totals and the totals of the children.
//
// A declared value of zero is treated as absent: the source files leave many counters
// out and the model fills them with zero.

use log::debug;
use snafu::ensure;

use crate::config::*;

/// A node of the tally tree that can check its own totals.
pub trait Validate {
    /// `at` is the path of the parent node, used to build error messages.
    fn validate(&self, at: &str) -> TallyResult<()>;
}

fn child_path(at: &str, kind: &str, label: &str) -> String {
    if at.is_empty() {
        format!("{} {}", kind, label)
    } else {
        format!("{} / {} {}", at, kind, label)
    }
}

// Sums are taken in u128, so that no combination of u64 counters overflows.
fn sum_of<I: IntoIterator<Item = u64>>(values: I) -> u128 {
    values.into_iter().map(u128::from).sum()
}

// A sum that does not fit in a counter is always a mismatch, even against an absent
// declared total. It is reported as u64::MAX.
fn check_total(node: &str, field: &'static str, declared: u64, computed: u128) -> TallyResult<()> {
    let computed = match u64::try_from(computed) {
        Ok(c) => c,
        Err(_) => {
            return TotalMismatchSnafu {
                node,
                field,
                declared,
                computed: u64::MAX,
            }
            .fail()
        }
    };
    if declared == 0 {
        return Ok(());
    }
    ensure!(
        declared == computed,
        TotalMismatchSnafu {
            node,
            field,
            declared,
            computed,
        }
    );
    Ok(())
}

fn validate_all<T: Validate>(items: &[T], at: &str) -> TallyResult<()> {
    items.iter().try_for_each(|x| x.validate(at))
}

impl Validate for List {
    fn validate(&self, at: &str) -> TallyResult<()> {
        let node = child_path(at, "list", &self.id.to_string());
        if self.sheet_votes > 0 || self.lema_votes > 0 {
            let parts = sum_of([self.sheet_votes, self.lema_votes]);
            check_total(&node, "total", self.total, parts)?;
        }
        Ok(())
    }
}

impl Validate for SubLema {
    fn validate(&self, at: &str) -> TallyResult<()> {
        let node = child_path(at, "sub-lema", &self.name);
        validate_all(&self.board_lists, &node)?;
        validate_all(&self.municipal_lists, &node)?;

        let lists = || self.board_lists.iter().chain(self.municipal_lists.iter());
        if lists().next().is_some() {
            let list_totals = sum_of(lists().map(|l| l.total));
            let own = u128::from(self.sublema_votes);
            check_total(&node, "total", self.total, own + list_totals)?;
            let list_sheets = sum_of(lists().map(|l| l.sheet_votes));
            check_total(&node, "sheet votes", self.sheet_votes, list_sheets)?;
        }
        Ok(())
    }
}

impl Validate for SubLemaBlock {
    fn validate(&self, at: &str) -> TallyResult<()> {
        validate_all(&self.sub_lemas, at)?;
        if !self.sub_lemas.is_empty() {
            let parts = sum_of(self.sub_lemas.iter().map(|s| s.total));
            let computed = u128::from(self.lema_votes) + parts;
            check_total(at, "sub-lema block total", self.total, computed)?;
        }
        Ok(())
    }
}

impl Validate for MayoralBlock {
    fn validate(&self, at: &str) -> TallyResult<()> {
        if !self.sheets.is_empty() {
            let parts = sum_of(self.sheets.iter().map(|h| h.votes));
            let computed = u128::from(self.lema_votes) + parts;
            check_total(at, "mayoral total", self.total, computed)?;
        }
        Ok(())
    }
}

// Shared by both party flavors: the sheets add up to the sheet votes, and the sheet votes
// plus the lema votes make the total.
fn check_party_totals(
    node: &str,
    sheets: &[BallotSheet],
    sheet_votes: u64,
    lema_votes: u64,
    total: u64,
) -> TallyResult<()> {
    if !sheets.is_empty() {
        let parts = sum_of(sheets.iter().map(|h| h.votes));
        check_total(node, "sheet votes", sheet_votes, parts)?;
    }
    if sheet_votes > 0 || lema_votes > 0 {
        check_total(node, "total", total, sum_of([sheet_votes, lema_votes]))?;
    }
    Ok(())
}

impl Validate for PartyAtMunicipality {
    fn validate(&self, at: &str) -> TallyResult<()> {
        let node = child_path(at, "party", &self.name);
        check_party_totals(
            &node,
            &self.sheets,
            self.sheet_votes,
            self.lema_votes,
            self.total,
        )?;
        self.council.validate(&node)
    }
}

impl Validate for PartyAtDepartment {
    fn validate(&self, at: &str) -> TallyResult<()> {
        let node = child_path(at, "party", &self.name);
        check_party_totals(
            &node,
            &self.sheets,
            self.sheet_votes,
            self.lema_votes,
            self.total,
        )?;
        self.mayoral.validate(&node)?;
        self.board.validate(&node)
    }
}

impl Validate for Municipality {
    fn validate(&self, at: &str) -> TallyResult<()> {
        let node = child_path(at, "municipality", &self.name);
        validate_all(&self.parties, &node)?;
        if !self.parties.is_empty() {
            let parts = sum_of(self.parties.iter().map(|p| p.total));
            check_total(&node, "valid votes", self.turnout.valid, parts)?;
        }
        Ok(())
    }
}

impl Validate for Department {
    fn validate(&self, at: &str) -> TallyResult<()> {
        let node = child_path(at, "department", &self.name);
        debug!("validate: {}", node);
        validate_all(&self.parties, &node)?;
        validate_all(&self.municipalities, &node)?;
        if !self.parties.is_empty() {
            let parts = sum_of(self.parties.iter().map(|p| p.total));
            check_total(&node, "valid votes", self.turnout.valid, parts)?;
        }
        Ok(())
    }
}

impl Validate for ElectionSummary {
    fn validate(&self, at: &str) -> TallyResult<()> {
        validate_all(&self.departments, at)?;
        // No declared national total: only checks that the national sums fit.
        let node = child_path(at, "election", &self.year.to_string());
        let votes = self
            .departments
            .iter()
            .flat_map(|d| d.parties.iter())
            .map(|p| p.total);
        check_total(&node, "national valid votes", 0, sum_of(votes))
    }
}

impl ElectionSummary {
    /// Builds a summary, checking every total of the tree.
    pub fn new(year: u32, departments: Vec<Department>) -> TallyResult<ElectionSummary> {
        let summary = ElectionSummary { year, departments };
        summary.validate("")?;
        Ok(summary)
    }
}
