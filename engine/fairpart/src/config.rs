//! Fit configuration for the partitioners.
//!
//! [`PartitionConfig`] holds the options shared by both algorithms. Algorithm
//! specific knobs live in [`GroupsConfig`] and [`KMeansConfig`]. Every config
//! validates itself before any data is touched; [`PartitionConfig::resolve`]
//! additionally fills in data-dependent defaults once `N` is known.

use fairpart_stats::IntervalMethod;
#[cfg(feature = "serde")]
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::PartitionError;

pub const DEFAULT_CONFIDENCE_LEVEL: f64 = 0.95;
pub const DEFAULT_MAX_ITERATIONS: usize = 100;
pub const DEFAULT_TOLERANCE: f64 = 1e-6;
/// Default `min_group_size` is `N / (K * MIN_GROUP_DIVISOR)`, at least 1.
pub const MIN_GROUP_DIVISOR: usize = 20;
const MAX_SIGNAL_BINS: usize = 64;

/// Options shared by every partitioner
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PartitionConfig {
    /// Number of groups `K`
    pub n_groups: usize,
    /// Minimum observations per group; `None` picks `max(1, N / (20 K))`
    pub min_group_size: Option<usize>,
    /// Confidence level for the per-group intervals, in (0, 1)
    pub confidence_level: f64,
    pub interval_method: IntervalMethod,
    /// Outer boundaries `(s_min, s_max)`; defaults to the observed range
    pub domain: Option<(f64, f64)>,
}

impl Default for PartitionConfig {
    fn default() -> Self {
        Self {
            n_groups: 2,
            min_group_size: None,
            confidence_level: DEFAULT_CONFIDENCE_LEVEL,
            interval_method: IntervalMethod::default(),
            domain: None,
        }
    }
}

/// [`PartitionConfig`] with data-dependent defaults filled in
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ResolvedConfig {
    pub n_groups: usize,
    pub min_group_size: usize,
    pub confidence_level: f64,
    pub interval_method: IntervalMethod,
    pub domain: Option<(f64, f64)>,
}

impl PartitionConfig {
    pub fn new(n_groups: usize) -> Self {
        Self {
            n_groups,
            ..Self::default()
        }
    }

    pub fn with_min_group_size(mut self, min_group_size: usize) -> Self {
        self.min_group_size = Some(min_group_size);
        self
    }

    pub fn with_confidence_level(mut self, level: f64) -> Self {
        self.confidence_level = level;
        self
    }

    pub fn with_interval_method(mut self, method: IntervalMethod) -> Self {
        self.interval_method = method;
        self
    }

    pub fn with_domain(mut self, s_min: f64, s_max: f64) -> Self {
        self.domain = Some((s_min, s_max));
        self
    }

    /// Checks that do not depend on the data.
    pub fn validate(&self) -> Result<(), PartitionError> {
        if self.n_groups == 0 {
            return Err(PartitionError::configuration(
                "n_groups must be at least 1",
            ));
        }
        if self.min_group_size == Some(0) {
            return Err(PartitionError::configuration(
                "min_group_size must be positive",
            ));
        }
        if !(self.confidence_level > 0.0 && self.confidence_level < 1.0) {
            return Err(PartitionError::configuration(format!(
                "confidence_level must lie strictly between 0 and 1, got {}",
                self.confidence_level
            )));
        }
        if let Some((lo, hi)) = self.domain {
            if !lo.is_finite() || !hi.is_finite() || lo > hi {
                return Err(PartitionError::configuration(format!(
                    "domain ({lo}, {hi}) must be finite and ordered"
                )));
            }
        }
        Ok(())
    }

    /// Validate against a sample of `n` observations and fill in defaults.
    pub fn resolve(&self, n: usize) -> Result<ResolvedConfig, PartitionError> {
        self.validate()?;
        let k = self.n_groups;
        if n < k {
            return Err(PartitionError::configuration(format!(
                "{n} observations cannot form {k} groups"
            )));
        }
        let min_group_size = self
            .min_group_size
            .unwrap_or_else(|| default_min_group_size(n, k));
        let required = k.checked_mul(min_group_size).ok_or_else(|| {
            PartitionError::configuration("n_groups * min_group_size overflows")
        })?;
        if n < required {
            return Err(PartitionError::configuration(format!(
                "{n} observations cannot give {k} groups at least {min_group_size} each"
            )));
        }
        Ok(ResolvedConfig {
            n_groups: k,
            min_group_size,
            confidence_level: self.confidence_level,
            interval_method: self.interval_method,
            domain: self.domain,
        })
    }

    #[cfg(feature = "serde")]
    pub fn from_json(src: &str) -> Result<Self, PartitionError> {
        from_json(src)
    }
}

impl ResolvedConfig {
    /// The configured domain must enclose the observed range.
    pub fn check_domain(&self, s_min: f64, s_max: f64) -> Result<(), PartitionError> {
        match self.domain {
            Some((lo, hi)) if lo > s_min || hi < s_max => Err(PartitionError::configuration(
                format!("domain ({lo}, {hi}) does not enclose observed range ({s_min}, {s_max})"),
            )),
            _ => Ok(()),
        }
    }
}

pub fn default_min_group_size(n: usize, n_groups: usize) -> usize {
    (n / (n_groups.max(1) * MIN_GROUP_DIVISOR)).max(1)
}

/// Options for the exact dynamic-programming partitioner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GroupsConfig {
    /// Merge tied-value atoms into at most `max_candidate_splits + 1` blocks
    /// of similar size before the search. `None` searches every split point.
    pub max_candidate_splits: Option<usize>,
}

impl GroupsConfig {
    pub fn with_max_candidate_splits(mut self, splits: usize) -> Self {
        self.max_candidate_splits = Some(splits);
        self
    }

    pub fn validate(&self, n_groups: usize) -> Result<(), PartitionError> {
        match self.max_candidate_splits {
            Some(c) if c + 1 < n_groups => Err(PartitionError::configuration(format!(
                "max_candidate_splits {c} leaves no room for {n_groups} groups"
            ))),
            _ => Ok(()),
        }
    }
}

/// Centroid initialisation for the iterative partitioner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum KMeansInit {
    /// Sample the rate curve at `K` equal-width positions over the range of `S`
    #[default]
    CurveRange,
    /// `K` evenly spaced rates between the lowest and highest rate on the curve
    RateRange,
    /// Rates of `K` equal-count blocks of sorted `S`
    Quantile,
    /// Rates of blocks cut at `K - 1` seeded random split points
    Random,
}

/// Options for the iterative partitioner
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct KMeansConfig {
    pub max_iterations: usize,
    /// Stop once the summed absolute centroid shift drops below this
    pub tolerance: f64,
    pub init: KMeansInit,
    pub random_seed: u64,
    /// Bins of the rate signal; `None` picks `clamp(N / min_group_size, 2, 64)`
    pub n_bins: Option<usize>,
    /// Moving-average window over the rate signal (1 disables smoothing)
    pub smoothing_window: usize,
}

impl Default for KMeansConfig {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            tolerance: DEFAULT_TOLERANCE,
            init: KMeansInit::default(),
            random_seed: 0,
            n_bins: None,
            smoothing_window: 1,
        }
    }
}

impl KMeansConfig {
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_init(mut self, init: KMeansInit) -> Self {
        self.init = init;
        self
    }

    pub fn with_random_seed(mut self, seed: u64) -> Self {
        self.random_seed = seed;
        self
    }

    pub fn with_n_bins(mut self, n_bins: usize) -> Self {
        self.n_bins = Some(n_bins);
        self
    }

    pub fn with_smoothing_window(mut self, window: usize) -> Self {
        self.smoothing_window = window;
        self
    }

    pub fn validate(&self) -> Result<(), PartitionError> {
        if self.max_iterations == 0 {
            return Err(PartitionError::configuration(
                "max_iterations must be at least 1",
            ));
        }
        if !(self.tolerance.is_finite() && self.tolerance >= 0.0) {
            return Err(PartitionError::configuration(format!(
                "tolerance must be finite and non-negative, got {}",
                self.tolerance
            )));
        }
        if self.n_bins == Some(0) {
            return Err(PartitionError::configuration("n_bins must be positive"));
        }
        Ok(())
    }

    pub fn signal_bins(&self, n: usize, min_group_size: usize) -> usize {
        self.n_bins
            .unwrap_or_else(|| (n / min_group_size.max(1)).clamp(2, MAX_SIGNAL_BINS))
    }

    #[cfg(feature = "serde")]
    pub fn from_json(src: &str) -> Result<Self, PartitionError> {
        from_json(src)
    }
}

#[cfg(feature = "serde")]
fn from_json<T: DeserializeOwned>(src: &str) -> Result<T, PartitionError> {
    serde_json::from_str(src)
        .map_err(|e| PartitionError::configuration(format!("invalid configuration JSON: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_fills_default_group_size() {
        let cfg = PartitionConfig::new(4).resolve(1000).unwrap();
        assert_eq!(cfg.min_group_size, 12);
        let cfg = PartitionConfig::new(4).resolve(10).unwrap();
        assert_eq!(cfg.min_group_size, 1);
    }

    #[test]
    fn resolve_rejects_bad_shapes() {
        assert!(matches!(
            PartitionConfig::new(0).resolve(10),
            Err(PartitionError::Configuration(_))
        ));
        assert!(matches!(
            PartitionConfig::new(3).resolve(2),
            Err(PartitionError::Configuration(_))
        ));
        assert!(matches!(
            PartitionConfig::new(2).with_min_group_size(0).resolve(10),
            Err(PartitionError::Configuration(_))
        ));
        assert!(matches!(
            PartitionConfig::new(2).with_min_group_size(6).resolve(11),
            Err(PartitionError::Configuration(_))
        ));
        assert!(PartitionConfig::new(2).with_min_group_size(6).resolve(12).is_ok());
        assert!(PartitionConfig::new(2)
            .with_confidence_level(1.0)
            .validate()
            .is_err());
        assert!(PartitionConfig::new(2)
            .with_domain(5.0, 1.0)
            .validate()
            .is_err());
    }

    #[test]
    fn domain_must_enclose_sample() {
        let cfg = PartitionConfig::new(2).with_domain(0.0, 10.0).resolve(4).unwrap();
        assert!(cfg.check_domain(1.0, 9.0).is_ok());
        assert!(cfg.check_domain(-1.0, 9.0).is_err());
        assert!(cfg.check_domain(1.0, 11.0).is_err());
    }

    #[test]
    fn kmeans_config_validation() {
        assert!(KMeansConfig::default().validate().is_ok());
        assert!(KMeansConfig::default().with_max_iterations(0).validate().is_err());
        assert!(KMeansConfig::default().with_tolerance(-1.0).validate().is_err());
        assert!(KMeansConfig::default().with_n_bins(0).validate().is_err());
        assert_eq!(KMeansConfig::default().signal_bins(1000, 50), 20);
        assert_eq!(KMeansConfig::default().signal_bins(10_000, 1), 64);
        assert_eq!(KMeansConfig::default().with_n_bins(7).signal_bins(10, 1), 7);
    }

    #[test]
    fn candidate_splits_must_leave_room() {
        assert!(GroupsConfig::default().with_max_candidate_splits(1).validate(3).is_err());
        assert!(GroupsConfig::default().with_max_candidate_splits(2).validate(3).is_ok());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn configs_load_from_partial_json() {
        let cfg = PartitionConfig::from_json(r#"{"n_groups": 3, "interval_method": "wald"}"#)
            .unwrap();
        assert_eq!(cfg.n_groups, 3);
        assert_eq!(cfg.interval_method, IntervalMethod::Wald);
        assert_eq!(cfg.confidence_level, DEFAULT_CONFIDENCE_LEVEL);

        let km = KMeansConfig::from_json(r#"{"init": "random", "random_seed": 9}"#).unwrap();
        assert_eq!(km.init, KMeansInit::Random);
        assert_eq!(km.max_iterations, DEFAULT_MAX_ITERATIONS);

        assert!(PartitionConfig::from_json("{").is_err());
    }
}
