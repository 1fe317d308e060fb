//! Contiguous partitions of the attribute range

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::sample::SortedSample;
use crate::PartitionError;

/// `K + 1` increasing boundaries defining `K` contiguous groups.
///
/// Group `k` covers `[b_k, b_{k+1})`; the last group is closed on the right.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "Vec<f64>", into = "Vec<f64>"))]
pub struct Partition {
    boundaries: Vec<f64>,
}

impl Partition {
    /// Build a partition from explicit boundaries. They must be finite,
    /// strictly increasing and at least two.
    pub fn new(boundaries: Vec<f64>) -> Result<Self, PartitionError> {
        if boundaries.len() < 2 {
            return Err(PartitionError::configuration(
                "a partition needs at least two boundaries",
            ));
        }
        if boundaries.iter().any(|b| !b.is_finite()) {
            return Err(PartitionError::configuration(
                "partition boundaries must be finite",
            ));
        }
        if boundaries.windows(2).any(|w| w[0] >= w[1]) {
            return Err(PartitionError::configuration(
                "partition boundaries must be strictly increasing",
            ));
        }
        Ok(Self { boundaries })
    }

    /// Boundaries for the blocks cut at atom `splits`. Interior boundaries sit
    /// halfway between the neighbouring groups' extreme values.
    pub(crate) fn from_splits(
        sample: &SortedSample,
        splits: &[usize],
        domain: Option<(f64, f64)>,
    ) -> Result<Self, PartitionError> {
        let (lo, hi) = domain.unwrap_or((sample.min_value(), sample.max_value()));
        let atoms = sample.atoms();
        let mut boundaries = Vec::with_capacity(splits.len() + 2);
        boundaries.push(lo);
        for &split in splits {
            boundaries.push(midpoint(atoms[split - 1].hi, atoms[split].lo));
        }
        boundaries.push(hi);
        Self::new(boundaries)
    }

    pub fn boundaries(&self) -> &[f64] {
        &self.boundaries
    }

    pub fn n_groups(&self) -> usize {
        self.boundaries.len() - 1
    }

    pub fn lower(&self) -> f64 {
        self.boundaries[0]
    }

    pub fn upper(&self) -> f64 {
        self.boundaries[self.boundaries.len() - 1]
    }

    /// Group index of `x`, or `None` outside `[b_0, b_K]`.
    pub fn group_of(&self, x: f64) -> Option<usize> {
        if !(x >= self.lower() && x <= self.upper()) {
            return None;
        }
        let interior = &self.boundaries[1..self.boundaries.len() - 1];
        Some(interior.partition_point(|&b| b <= x))
    }

    /// `(lower, upper)` per group, left to right.
    pub fn intervals(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.boundaries.windows(2).map(|w| (w[0], w[1]))
    }
}

impl TryFrom<Vec<f64>> for Partition {
    type Error = PartitionError;

    fn try_from(boundaries: Vec<f64>) -> Result<Self, Self::Error> {
        Self::new(boundaries)
    }
}

impl From<Partition> for Vec<f64> {
    fn from(partition: Partition) -> Self {
        partition.boundaries
    }
}

/// A value strictly above `a` and at most `b` (for `a < b`), halfway when the
/// float grid allows it.
pub(crate) fn midpoint(a: f64, b: f64) -> f64 {
    let mid = a + (b - a) / 2.0;
    if mid > a && mid <= b {
        mid
    } else {
        b
    }
}
