//! Per-group fairness statistics.
//!
//! For each group `k` with `n_k` observations and `c_k` positives:
//!
//! - `p_k = c_k / n_k` and the base rate `p̄ = Σc_k / N`
//! - `Φ_k = p_k − p̄`
//! - the interval for `Φ_k` is the binomial interval `(L_k, U_k)` for `p_k`
//!   (Wilson by default) shifted by `p̄` and widened on both sides by the
//!   normal-approximation half width of `p̄` over all `N` observations:
//!   `(L_k − p̄ − δ̄, U_k − p̄ + δ̄)` with `δ̄ = z·sqrt(p̄(1 − p̄)/N)`.
//!
//! Both partitioners report through this module, so their intervals are
//! directly comparable.

use fairpart_stats::{proportion_interval, wald_half_width, z_for_confidence, IntervalMethod};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{Partition, PartitionError};

/// Statistics for one group of a partition
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GroupStatistic {
    /// `n_k`
    pub size: usize,
    /// `c_k`
    pub positives: usize,
    /// `p_k = c_k / n_k`
    pub rate: f64,
    /// Binomial interval for `p_k`
    pub rate_ci: (f64, f64),
    /// `Φ_k = p_k − p̄`
    pub phi: f64,
    pub phi_ci: (f64, f64),
}

/// Base rate plus one record per group
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MetricsReport {
    pub base_rate: f64,
    pub groups: Vec<GroupStatistic>,
}

/// Computes `Φ` and its confidence interval for every group
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FairnessMetrics {
    confidence_level: f64,
    method: IntervalMethod,
    z: f64,
}

impl FairnessMetrics {
    pub fn new(confidence_level: f64, method: IntervalMethod) -> Result<Self, PartitionError> {
        let z = z_for_confidence(confidence_level)?;
        Ok(Self {
            confidence_level,
            method,
            z,
        })
    }

    pub fn confidence_level(&self) -> f64 {
        self.confidence_level
    }

    pub fn method(&self) -> IntervalMethod {
        self.method
    }

    /// Assign raw observations to the groups of `partition` and report.
    pub fn compute(
        &self,
        partition: &Partition,
        s: &[f64],
        y: &[bool],
    ) -> Result<MetricsReport, PartitionError> {
        fairpart_stats::check_observations(s, y.len())?;
        let mut counts = vec![(0usize, 0usize); partition.n_groups()];
        for (i, (&x, &label)) in s.iter().zip(y.iter()).enumerate() {
            let group = partition.group_of(x).ok_or_else(|| {
                PartitionError::configuration(format!(
                    "observation {i} (s = {x}) lies outside the partition [{}, {}]",
                    partition.lower(),
                    partition.upper()
                ))
            })?;
            counts[group].0 += 1;
            counts[group].1 += usize::from(label);
        }
        self.summarize_counts(&counts)
    }

    /// Report from `(n_k, c_k)` pairs, left to right.
    pub fn summarize_counts(
        &self,
        counts: &[(usize, usize)],
    ) -> Result<MetricsReport, PartitionError> {
        if counts.is_empty() {
            return Err(PartitionError::configuration("no groups to report on"));
        }
        if let Some(k) = counts.iter().position(|&(n, _)| n == 0) {
            log::error!("group {k} of {} has no observations", counts.len());
            return Err(PartitionError::undefined(format!(
                "group {k} has no observations"
            )));
        }
        if let Some(k) = counts.iter().position(|&(n, c)| c > n) {
            return Err(PartitionError::configuration(format!(
                "group {k} reports more positives than observations"
            )));
        }

        let total: usize = counts.iter().map(|&(n, _)| n).sum();
        let total_positives: usize = counts.iter().map(|&(_, c)| c).sum();
        let base_rate = total_positives as f64 / total as f64;
        let base_half = wald_half_width(total_positives, total, self.z)?;

        let groups = counts
            .iter()
            .map(|&(size, positives)| {
                let interval = proportion_interval(positives, size, self.z, self.method)?;
                let phi = interval.estimate - base_rate;
                let lo = (interval.lower - base_rate - base_half).min(phi);
                let hi = (interval.upper - base_rate + base_half).max(phi);
                Ok(GroupStatistic {
                    size,
                    positives,
                    rate: interval.estimate,
                    rate_ci: (interval.lower, interval.upper),
                    phi,
                    phi_ci: (lo, hi),
                })
            })
            .collect::<Result<Vec<_>, PartitionError>>()?;

        Ok(MetricsReport { base_rate, groups })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn metrics() -> FairnessMetrics {
        FairnessMetrics::new(0.95, IntervalMethod::Wilson).unwrap()
    }

    #[test]
    fn phi_is_rate_minus_base_rate() {
        let report = metrics().summarize_counts(&[(10, 2), (30, 18)]).unwrap();
        assert_abs_diff_eq!(report.base_rate, 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(report.groups[0].phi, -0.3, epsilon = 1e-12);
        assert_abs_diff_eq!(report.groups[1].phi, 0.1, epsilon = 1e-12);
        for g in &report.groups {
            assert!(g.phi_ci.0 <= g.phi && g.phi <= g.phi_ci.1);
            assert!(g.rate_ci.0 <= g.rate && g.rate <= g.rate_ci.1);
        }
    }

    #[test]
    fn phi_interval_is_wider_than_rate_interval() {
        let report = metrics().summarize_counts(&[(50, 10), (50, 40)]).unwrap();
        for g in &report.groups {
            let rate_width = g.rate_ci.1 - g.rate_ci.0;
            let phi_width = g.phi_ci.1 - g.phi_ci.0;
            assert!(phi_width > rate_width);
        }
    }

    #[test]
    fn phi_interval_narrows_as_the_group_grows() {
        let report = metrics().summarize_counts(&[(20, 6), (200, 60)]).unwrap();
        let width = |g: &GroupStatistic| g.phi_ci.1 - g.phi_ci.0;
        let (small, large) = (&report.groups[0], &report.groups[1]);
        assert_abs_diff_eq!(small.rate, large.rate, epsilon = 1e-12);
        assert_abs_diff_eq!(small.phi, 0.0, epsilon = 1e-12);
        assert!(width(large) < width(small));
        assert!(small.phi_ci.0 < 0.0 && 0.0 < small.phi_ci.1);
        assert!(large.phi_ci.0 < 0.0 && 0.0 < large.phi_ci.1);
    }

    #[test]
    fn single_group_has_zero_phi() {
        let report = metrics().summarize_counts(&[(37, 11)]).unwrap();
        assert_eq!(report.groups[0].phi, 0.0);
    }

    #[test]
    fn empty_group_is_undefined() {
        assert!(matches!(
            metrics().summarize_counts(&[(10, 2), (0, 0)]),
            Err(PartitionError::UndefinedMetric(_))
        ));
        assert!(matches!(
            metrics().summarize_counts(&[(3, 4)]),
            Err(PartitionError::Configuration(_))
        ));
    }

    #[test]
    fn compute_assigns_raw_observations() {
        let partition = Partition::new(vec![0.0, 5.0, 10.0]).unwrap();
        let s = [1.0, 2.0, 5.0, 9.0, 10.0];
        let y = [false, false, true, true, false];
        let report = metrics().compute(&partition, &s, &y).unwrap();
        assert_eq!(report.groups[0].size, 2);
        assert_eq!(report.groups[1].size, 3);
        assert_eq!(report.groups[1].positives, 2);

        let err = metrics().compute(&partition, &[11.0], &[true]);
        assert!(matches!(err, Err(PartitionError::Configuration(_))));
    }

    #[test]
    fn rejects_invalid_confidence() {
        assert!(FairnessMetrics::new(1.5, IntervalMethod::Wald).is_err());
    }
}
