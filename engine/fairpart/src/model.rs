//! Fitted partitions and the common partitioner interface

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::config::{PartitionConfig, ResolvedConfig};
use crate::kmeans::KMeansState;
use crate::metrics::{FairnessMetrics, GroupStatistic, MetricsReport};
use crate::observations::{labels_from_numeric, Observations};
use crate::sample::SortedSample;
use crate::{FitWarning, Partition, PartitionError};

/// How a fit arrived at its partition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Diagnostics {
    /// Globally optimal over `candidate_blocks` tied-value blocks
    Exact { candidate_blocks: usize },
    /// Optimal only among splits between `candidate_blocks` merged blocks,
    /// fewer than the sample's distinct values
    Approximate { candidate_blocks: usize },
    /// Alternating refinement
    Iterative {
        converged: bool,
        iterations: usize,
        final_state: KMeansState,
    },
}

/// Immutable result of a fit: the partition and its per-group statistics
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FittedPartition {
    partition: Partition,
    report: MetricsReport,
    cost: f64,
    min_group_size: usize,
    confidence_level: f64,
    diagnostics: Diagnostics,
    warnings: Vec<FitWarning>,
}

impl FittedPartition {
    pub(crate) fn assemble(
        prepared: &Prepared<'_>,
        sample: &SortedSample,
        splits: &[usize],
        diagnostics: Diagnostics,
        warnings: Vec<FitWarning>,
    ) -> Result<Self, PartitionError> {
        let config = &prepared.config;
        let partition = Partition::from_splits(sample, splits, config.domain)?;
        let metrics = FairnessMetrics::new(config.confidence_level, config.interval_method)?;
        let report = metrics.compute(&partition, prepared.obs.s(), prepared.obs.y())?;
        debug_assert!(report
            .groups
            .iter()
            .all(|g| g.size >= config.min_group_size));
        Ok(Self {
            partition,
            report,
            cost: sample.total_cost(splits),
            min_group_size: config.min_group_size,
            confidence_level: config.confidence_level,
            diagnostics,
            warnings,
        })
    }

    pub fn partition(&self) -> &Partition {
        &self.partition
    }

    /// `K + 1` boundary values
    pub fn boundaries(&self) -> &[f64] {
        self.partition.boundaries()
    }

    pub fn n_groups(&self) -> usize {
        self.partition.n_groups()
    }

    /// `Φ_k` per group, left to right in `S`
    pub fn phi_by_group(&self) -> Vec<f64> {
        self.report.groups.iter().map(|g| g.phi).collect()
    }

    /// `(lo, hi)` interval for each `Φ_k`, aligned with [`Self::phi_by_group`]
    pub fn phi_by_group_ci(&self) -> Vec<(f64, f64)> {
        self.report.groups.iter().map(|g| g.phi_ci).collect()
    }

    pub fn group_statistics(&self) -> &[GroupStatistic] {
        &self.report.groups
    }

    pub fn group_sizes(&self) -> Vec<usize> {
        self.report.groups.iter().map(|g| g.size).collect()
    }

    /// Overall positive rate `p̄`
    pub fn base_rate(&self) -> f64 {
        self.report.base_rate
    }

    /// Total within-group sum of squared deviations of `y`
    pub fn cost(&self) -> f64 {
        self.cost
    }

    pub fn min_group_size(&self) -> usize {
        self.min_group_size
    }

    pub fn confidence_level(&self) -> f64 {
        self.confidence_level
    }

    pub fn diagnostics(&self) -> Diagnostics {
        self.diagnostics
    }

    /// `false` only when iterative refinement ran out of iterations; a
    /// completed search always counts as converged.
    pub fn converged(&self) -> bool {
        match self.diagnostics {
            Diagnostics::Exact { .. } | Diagnostics::Approximate { .. } => true,
            Diagnostics::Iterative { converged, .. } => converged,
        }
    }

    /// Whether the partition is known to minimise the cost over every
    /// contiguous split of the sample.
    pub fn is_exact(&self) -> bool {
        matches!(self.diagnostics, Diagnostics::Exact { .. })
    }

    pub fn warnings(&self) -> &[FitWarning] {
        &self.warnings
    }

    pub fn group_of(&self, s: f64) -> Option<usize> {
        self.partition.group_of(s)
    }
}

/// A contiguous `K`-group partitioner
pub trait Partitioner {
    fn name(&self) -> &'static str;

    fn config(&self) -> &PartitionConfig;

    fn fit(&self, s: &[f64], y: &[bool]) -> Result<FittedPartition, PartitionError>;

    /// Fit with numeric outcomes; every value must be exactly 0 or 1.
    fn fit_numeric(&self, s: &[f64], y: &[f64]) -> Result<FittedPartition, PartitionError> {
        let labels = labels_from_numeric(y)?;
        self.fit(s, &labels)
    }
}

/// Validated input shared by the partitioners. Every configuration and
/// shape check happens here, before any search starts.
pub(crate) struct Prepared<'a> {
    pub obs: Observations<'a>,
    pub config: ResolvedConfig,
    pub sample: SortedSample,
    /// See [`SortedSample::upper_split_bounds`]
    pub upper: Vec<usize>,
}

impl<'a> Prepared<'a> {
    pub fn new(
        config: &PartitionConfig,
        s: &'a [f64],
        y: &'a [bool],
    ) -> Result<Self, PartitionError> {
        config.validate()?;
        let obs = Observations::new(s, y)?;
        let config = config.resolve(obs.len())?;
        let sample = SortedSample::new(&obs);
        config.check_domain(sample.min_value(), sample.max_value())?;
        let (lo, hi) = config
            .domain
            .unwrap_or((sample.min_value(), sample.max_value()));
        if lo >= hi {
            return Err(PartitionError::degenerate(format!(
                "attribute range [{lo}, {hi}] has zero width"
            )));
        }
        let sample = sample.fuse_inseparable_top(hi);

        let k = config.n_groups;
        if sample.n_atoms() < k {
            return Err(PartitionError::degenerate(format!(
                "{} separable attribute values cannot form {k} groups",
                sample.n_atoms()
            )));
        }
        let upper = sample
            .upper_split_bounds(k, config.min_group_size)
            .ok_or_else(|| {
                PartitionError::degenerate(format!(
                    "tied attribute values leave no contiguous split into {k} groups of at least {}",
                    config.min_group_size
                ))
            })?;
        Ok(Self {
            obs,
            config,
            sample,
            upper,
        })
    }

    pub fn base_rate(&self) -> f64 {
        self.sample.total_positives() as f64 / self.sample.n_obs() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prepared_fails_fast_on_shape_and_degeneracy() {
        let cfg = PartitionConfig::new(2).with_min_group_size(1);
        assert!(matches!(
            Prepared::new(&cfg, &[1.0, 2.0], &[true]),
            Err(PartitionError::Configuration(_))
        ));
        assert!(matches!(
            Prepared::new(&cfg, &[1.0, 1.0, 1.0], &[true, false, true]),
            Err(PartitionError::DegenerateInput(_))
        ));
        let cfg = PartitionConfig::new(2).with_min_group_size(2);
        assert!(matches!(
            Prepared::new(&cfg, &[1.0, 1.0, 1.0, 2.0], &[true, false, true, false]),
            Err(PartitionError::DegenerateInput(_))
        ));
        let cfg = PartitionConfig::new(2).with_domain(2.0, 3.0);
        assert!(matches!(
            Prepared::new(&cfg, &[1.0, 2.5], &[true, false]),
            Err(PartitionError::Configuration(_))
        ));
    }

    #[test]
    fn zero_width_range_is_degenerate_unless_domain_widens_it() {
        let cfg = PartitionConfig::new(1);
        assert!(matches!(
            Prepared::new(&cfg, &[3.0, 3.0, 3.0], &[true, false, true]),
            Err(PartitionError::DegenerateInput(_))
        ));
        let cfg = PartitionConfig::new(1).with_domain(0.0, 10.0);
        assert!(Prepared::new(&cfg, &[3.0, 3.0, 3.0], &[true, false, true]).is_ok());
        let cfg = PartitionConfig::new(1).with_domain(3.0, 3.0);
        assert!(matches!(
            Prepared::new(&cfg, &[3.0, 3.0], &[true, false]),
            Err(PartitionError::DegenerateInput(_))
        ));
    }

    #[test]
    fn prepared_exposes_base_rate_and_bounds() {
        let cfg = PartitionConfig::new(2).with_min_group_size(1);
        let p = Prepared::new(&cfg, &[3.0, 1.0, 2.0, 4.0], &[true, false, false, true]).unwrap();
        assert_eq!(p.base_rate(), 0.5);
        assert_eq!(p.upper, vec![2, 3, 4]);
    }
}
