pub use crate::config::*;
use crate::validate::Validate;

/// A builder for assembling a tally tree one department at a time.
///
/// Each department is checked when it is added, so a mismatch is reported as close to
/// its source as possible.
///
/// ```
/// use departmental_tally::builder::Builder;
/// use departmental_tally::{Department, TallyError};
///
/// let mut builder = Builder::new(2020)?;
/// builder.add_department(Department {
///     code: "00".to_string(),
///     name: "MONTEVIDEO".to_string(),
///     ..Default::default()
/// })?;
/// let summary = builder.build()?;
/// assert_eq!(summary.departments.len(), 1);
///
/// # Ok::<(), TallyError>(())
/// ```
pub struct Builder {
    pub(crate) _year: u32,
    pub(crate) _departments: Vec<Department>,
}

impl Builder {
    pub fn new(year: u32) -> TallyResult<Builder> {
        Ok(Builder {
            _year: year,
            _departments: Vec::new(),
        })
    }

    /// Replaces all the departments at once.
    pub fn departments(self, departments: &[Department]) -> TallyResult<Builder> {
        departments.iter().try_for_each(|d| d.validate(""))?;
        Ok(Builder {
            _year: self._year,
            _departments: departments.to_vec(),
        })
    }

    pub fn add_department(&mut self, department: Department) -> TallyResult<()> {
        department.validate("")?;
        self._departments.push(department);
        Ok(())
    }

    pub fn build(self) -> TallyResult<ElectionSummary> {
        ElectionSummary::new(self._year, self._departments)
    }
}
