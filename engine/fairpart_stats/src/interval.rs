//! Binomial proportion intervals (Wilson score and Wald)

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};

use crate::StatsError;

/// Interval construction for a binomial proportion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum IntervalMethod {
    /// Wilson score interval. Well behaved near 0 and 1.
    #[default]
    Wilson,
    /// Normal approximation `p ± z·sqrt(p(1-p)/n)`, clamped to `[0, 1]`.
    Wald,
}

/// Point estimate with its interval
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ProportionInterval {
    pub estimate: f64,
    pub lower: f64,
    pub upper: f64,
}

impl ProportionInterval {
    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }

    pub fn contains(&self, p: f64) -> bool {
        self.lower <= p && p <= self.upper
    }
}

/// Two-sided standard normal critical value for a confidence level in (0, 1).
///
/// `z_for_confidence(0.95)` is ~1.959964.
pub fn z_for_confidence(level: f64) -> Result<f64, StatsError> {
    if !(level > 0.0 && level < 1.0) {
        return Err(StatsError::InvalidConfidence(level));
    }
    let normal = Normal::new(0.0, 1.0).map_err(|_| StatsError::InvalidConfidence(level))?;
    Ok(normal.inverse_cdf(1.0 - (1.0 - level) / 2.0))
}

/// Interval for `successes / trials` at critical value `z`.
///
/// The returned bounds always bracket the point estimate and stay in `[0, 1]`.
pub fn proportion_interval(
    successes: usize,
    trials: usize,
    z: f64,
    method: IntervalMethod,
) -> Result<ProportionInterval, StatsError> {
    if trials == 0 {
        return Err(StatsError::EmptyGroup);
    }
    if successes > trials {
        return Err(StatsError::InvalidCounts {
            positives: successes,
            trials,
        });
    }
    let n = trials as f64;
    let p = successes as f64 / n;
    let (lo, hi) = match method {
        IntervalMethod::Wilson => {
            let z2 = z * z;
            let denom = 1.0 + z2 / n;
            let center = (p + z2 / (2.0 * n)) / denom;
            let radius = z * (p * (1.0 - p) / n + z2 / (4.0 * n * n)).sqrt() / denom;
            (center - radius, center + radius)
        }
        IntervalMethod::Wald => {
            let half = z * (p * (1.0 - p) / n).sqrt();
            (p - half, p + half)
        }
    };
    Ok(ProportionInterval {
        estimate: p,
        lower: lo.clamp(0.0, 1.0).min(p),
        upper: hi.clamp(0.0, 1.0).max(p),
    })
}

/// Normal-approximation half width `z·sqrt(p(1-p)/n)` for `successes / trials`.
pub fn wald_half_width(successes: usize, trials: usize, z: f64) -> Result<f64, StatsError> {
    if trials == 0 {
        return Err(StatsError::EmptyGroup);
    }
    if successes > trials {
        return Err(StatsError::InvalidCounts {
            positives: successes,
            trials,
        });
    }
    let n = trials as f64;
    let p = successes as f64 / n;
    Ok(z * (p * (1.0 - p) / n).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn z_matches_standard_table() {
        assert_abs_diff_eq!(z_for_confidence(0.95).unwrap(), 1.959964, epsilon = 1e-5);
        assert_abs_diff_eq!(z_for_confidence(0.90).unwrap(), 1.644854, epsilon = 1e-5);
        assert!(z_for_confidence(1.0).is_err());
        assert!(z_for_confidence(0.0).is_err());
        assert!(z_for_confidence(f64::NAN).is_err());
    }

    #[test]
    fn wilson_is_ordered_and_bounded() {
        let iv = proportion_interval(8, 10, 1.96, IntervalMethod::Wilson).unwrap();
        assert!(0.0 <= iv.lower && iv.lower <= iv.estimate);
        assert!(iv.estimate <= iv.upper && iv.upper <= 1.0);
        // Reference value for 8/10 at z=1.96
        assert_abs_diff_eq!(iv.lower, 0.4902, epsilon = 1e-4);
        assert_abs_diff_eq!(iv.upper, 0.9433, epsilon = 1e-4);
    }

    #[test]
    fn wald_collapses_at_extremes() {
        let iv = proportion_interval(0, 25, 1.96, IntervalMethod::Wald).unwrap();
        assert_eq!(iv.lower, 0.0);
        assert_eq!(iv.upper, 0.0);
        let wilson = proportion_interval(0, 25, 1.96, IntervalMethod::Wilson).unwrap();
        assert!(wilson.upper > 0.0);
    }

    #[test]
    fn rejects_empty_and_inconsistent_counts() {
        assert_eq!(
            proportion_interval(0, 0, 1.96, IntervalMethod::Wilson),
            Err(StatsError::EmptyGroup)
        );
        assert!(matches!(
            proportion_interval(5, 4, 1.96, IntervalMethod::Wald),
            Err(StatsError::InvalidCounts { .. })
        ));
        assert!(wald_half_width(1, 0, 1.96).is_err());
    }
}
