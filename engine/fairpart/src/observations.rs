//! Validated `(s, y)` input pairs

use fairpart_stats::check_observations;

use crate::PartitionError;

/// Borrowed, validated observation set
#[derive(Debug, Clone, Copy)]
pub struct Observations<'a> {
    s: &'a [f64],
    y: &'a [bool],
}

impl<'a> Observations<'a> {
    /// Lengths must match, the sample must be non-empty and `s` finite.
    pub fn new(s: &'a [f64], y: &'a [bool]) -> Result<Self, PartitionError> {
        check_observations(s, y.len())?;
        Ok(Self { s, y })
    }

    pub fn s(&self) -> &'a [f64] {
        self.s
    }

    pub fn y(&self) -> &'a [bool] {
        self.y
    }

    pub fn len(&self) -> usize {
        self.s.len()
    }

    pub fn is_empty(&self) -> bool {
        self.s.is_empty()
    }

    pub fn positives(&self) -> usize {
        self.y.iter().filter(|&&v| v).count()
    }
}

/// Convert numeric 0/1 outcomes into labels; any other value is rejected.
pub fn labels_from_numeric(y: &[f64]) -> Result<Vec<bool>, PartitionError> {
    y.iter()
        .enumerate()
        .map(|(i, &v)| {
            if v == 0.0 {
                Ok(false)
            } else if v == 1.0 {
                Ok(true)
            } else {
                Err(PartitionError::configuration(format!(
                    "outcome at index {i} is {v}, expected 0 or 1"
                )))
            }
        })
        .collect()
}
