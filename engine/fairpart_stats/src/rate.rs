//! Empirical conditional positive-outcome rate as a function of the attribute.
//!
//! [`ConditionalRateEstimator`] bins paired `(s, y)` observations over the
//! observed range of `s` and reports `P(y = 1 | bin)` per bin. Bins that
//! receive no observations report `None` rather than a rate of zero, so a
//! plotting or fitting consumer can tell "no data" apart from "no positives".

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{check_observations, StatsError};

/// How the attribute range is cut into bins
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Binning {
    /// Equal-width bins over `[min(s), max(s)]`; the last bin is closed.
    #[default]
    EqualWidth,
    /// Runs of (nearly) equal observation count over the sorted sample.
    EqualCount,
}

/// One bin of a [`RateCurve`]
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RateBin {
    pub lower: f64,
    pub upper: f64,
    pub center: f64,
    pub count: usize,
    pub positives: usize,
    /// `positives / count`, or `None` for an empty bin
    pub rate: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
enum Layout {
    EqualWidth { min: f64, max: f64 },
    EqualCount,
}

/// Ordered bins with their empirical rates
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RateCurve {
    bins: Vec<RateBin>,
    layout: Layout,
}

impl RateCurve {
    pub fn bins(&self) -> &[RateBin] {
        &self.bins
    }

    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    /// `(bin_center, rate)` pairs, left to right. This is the raw curve handed
    /// to plotting collaborators.
    pub fn points(&self) -> Vec<(f64, Option<f64>)> {
        self.bins.iter().map(|b| (b.center, b.rate)).collect()
    }

    /// Smallest and largest defined rate on the curve.
    pub fn rate_range(&self) -> Option<(f64, f64)> {
        self.bins
            .iter()
            .filter_map(|b| b.rate)
            .fold(None, |acc, r| match acc {
                None => Some((r, r)),
                Some((lo, hi)) => Some((lo.min(r), hi.max(r))),
            })
    }

    /// Count-weighted centred moving average over `window` neighbouring bins.
    ///
    /// Empty bins neither contribute nor receive a rate. A window of 0 or 1
    /// returns the curve unchanged.
    pub fn smoothed(&self, window: usize) -> RateCurve {
        if window <= 1 {
            return self.clone();
        }
        let half = window / 2;
        let n = self.bins.len();
        let bins = self
            .bins
            .iter()
            .enumerate()
            .map(|(i, bin)| {
                if bin.count == 0 {
                    return *bin;
                }
                let lo = i.saturating_sub(half);
                let hi = (i + half).min(n - 1);
                let (count, positives) = self.bins[lo..=hi]
                    .iter()
                    .fold((0usize, 0usize), |(c, p), b| (c + b.count, p + b.positives));
                RateBin {
                    rate: Some(positives as f64 / count as f64),
                    ..*bin
                }
            })
            .collect();
        RateCurve {
            bins,
            layout: self.layout,
        }
    }

    /// Index of the bin that `x` falls into, clamped to the curve's ends.
    pub fn bin_index(&self, x: f64) -> usize {
        let last = self.bins.len().saturating_sub(1);
        match self.layout {
            Layout::EqualWidth { min, max } => width_index(x, min, max, self.bins.len()),
            Layout::EqualCount => self
                .bins
                .iter()
                .position(|b| b.count > 0 && b.upper >= x)
                .unwrap_or(last),
        }
    }

    /// Rate of the bin containing `x`; when that bin is empty, the rate of the
    /// nearest non-empty bin (by center). `None` only if every bin is empty.
    pub fn nearest_rate(&self, x: f64) -> Option<f64> {
        if self.bins.is_empty() {
            return None;
        }
        let idx = self.bin_index(x);
        if let Some(rate) = self.bins[idx].rate {
            return Some(rate);
        }
        self.bins
            .iter()
            .filter(|b| b.rate.is_some())
            .min_by(|a, b| (a.center - x).abs().total_cmp(&(b.center - x).abs()))
            .and_then(|b| b.rate)
    }
}

/// Bins `(s, y)` pairs and estimates the positive rate per bin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ConditionalRateEstimator {
    n_bins: usize,
    binning: Binning,
}

impl ConditionalRateEstimator {
    pub fn new(n_bins: usize) -> Self {
        Self {
            n_bins,
            binning: Binning::default(),
        }
    }

    pub fn with_binning(mut self, binning: Binning) -> Self {
        self.binning = binning;
        self
    }

    pub fn n_bins(&self) -> usize {
        self.n_bins
    }

    pub fn binning(&self) -> Binning {
        self.binning
    }

    pub fn estimate(&self, s: &[f64], y: &[bool]) -> Result<RateCurve, StatsError> {
        if self.n_bins == 0 {
            return Err(StatsError::InvalidBins(self.n_bins));
        }
        check_observations(s, y.len())?;
        let curve = match self.binning {
            Binning::EqualWidth => equal_width(s, y, self.n_bins),
            Binning::EqualCount => equal_count(s, y, self.n_bins),
        };
        log::trace!(
            "estimated rate curve over {} observations in {} bins ({:?})",
            s.len(),
            self.n_bins,
            self.binning
        );
        Ok(curve)
    }
}

/// Raw conditional positive-outcome curve with equal-width bins.
pub fn conditional_positive_rate(
    s: &[f64],
    y: &[bool],
    n_bins: usize,
) -> Result<Vec<(f64, Option<f64>)>, StatsError> {
    Ok(ConditionalRateEstimator::new(n_bins)
        .estimate(s, y)?
        .points())
}

// Halved operands keep `max - min` finite over the whole f64 range.
fn width_index(x: f64, min: f64, max: f64, n_bins: usize) -> usize {
    let half_span = max / 2.0 - min / 2.0;
    if half_span <= 0.0 || x <= min {
        return 0;
    }
    let t = (x / 2.0 - min / 2.0) / half_span;
    ((t * n_bins as f64).floor() as usize).min(n_bins - 1)
}

/// Point at fraction `t` of the way from `min` to `max`; exact at both ends.
fn lerp(min: f64, max: f64, t: f64) -> f64 {
    min * (1.0 - t) + max * t
}

fn make_bin(lower: f64, upper: f64, count: usize, positives: usize) -> RateBin {
    RateBin {
        lower,
        upper,
        center: lower / 2.0 + upper / 2.0,
        count,
        positives,
        rate: (count > 0).then(|| positives as f64 / count as f64),
    }
}

fn equal_width(s: &[f64], y: &[bool], n_bins: usize) -> RateCurve {
    let min = s.iter().copied().fold(f64::INFINITY, f64::min);
    let max = s.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let mut counts = vec![(0usize, 0usize); n_bins];
    for (&x, &label) in s.iter().zip(y.iter()) {
        let slot = &mut counts[width_index(x, min, max, n_bins)];
        slot.0 += 1;
        if label {
            slot.1 += 1;
        }
    }

    let bins = counts
        .into_iter()
        .enumerate()
        .map(|(i, (count, positives))| {
            let lower = lerp(min, max, i as f64 / n_bins as f64);
            let upper = lerp(min, max, (i + 1) as f64 / n_bins as f64);
            make_bin(lower, upper, count, positives)
        })
        .collect();

    RateCurve {
        bins,
        layout: Layout::EqualWidth { min, max },
    }
}

fn equal_count(s: &[f64], y: &[bool], n_bins: usize) -> RateCurve {
    let mut order: Vec<usize> = (0..s.len()).collect();
    order.sort_by(|&a, &b| s[a].total_cmp(&s[b]));
    let n = order.len();

    let bins = (0..n_bins)
        .map(|i| {
            let start = i * n / n_bins;
            let end = (i + 1) * n / n_bins;
            if start == end {
                let at = s[order[start.min(n - 1)]];
                return make_bin(at, at, 0, 0);
            }
            let run = &order[start..end];
            let positives = run.iter().filter(|&&idx| y[idx]).count();
            make_bin(s[run[0]], s[run[run.len() - 1]], run.len(), positives)
        })
        .collect();

    RateCurve {
        bins,
        layout: Layout::EqualCount,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn equal_width_counts_and_rates() {
        let s = [0.0, 1.0, 2.0, 3.0, 4.0, 10.0];
        let y = [false, true, true, true, false, true];
        let curve = ConditionalRateEstimator::new(2).estimate(&s, &y).unwrap();
        assert_eq!(curve.len(), 2);
        let b0 = curve.bins()[0];
        let b1 = curve.bins()[1];
        assert_eq!((b0.count, b0.positives), (5, 3));
        assert_eq!((b1.count, b1.positives), (1, 1));
        assert_abs_diff_eq!(b0.rate.unwrap(), 0.6, epsilon = 1e-12);
        assert_abs_diff_eq!(b0.center, 2.5, epsilon = 1e-12);
        assert_eq!(b1.upper, 10.0);
    }

    #[test]
    fn empty_bins_are_undefined_not_zero() {
        let s = [0.0, 0.5, 9.5, 10.0];
        let y = [false, false, false, false];
        let curve = ConditionalRateEstimator::new(4).estimate(&s, &y).unwrap();
        let rates: Vec<_> = curve.points().into_iter().map(|(_, r)| r).collect();
        assert_eq!(rates, vec![Some(0.0), None, None, Some(0.0)]);
    }

    #[test]
    fn equal_count_splits_sorted_runs() {
        let s = [5.0, 1.0, 4.0, 2.0, 3.0, 6.0];
        let y = [true, false, true, false, false, true];
        let curve = ConditionalRateEstimator::new(2)
            .with_binning(Binning::EqualCount)
            .estimate(&s, &y)
            .unwrap();
        assert_eq!(curve.bins()[0].rate, Some(0.0));
        assert_eq!(curve.bins()[1].rate, Some(1.0));
        assert_eq!(curve.bins()[0].upper, 3.0);
        assert_eq!(curve.bin_index(3.5), 1);
    }

    #[test]
    fn zero_width_range_goes_to_first_bin() {
        let s = [2.0, 2.0, 2.0];
        let y = [true, false, true];
        let curve = ConditionalRateEstimator::new(3).estimate(&s, &y).unwrap();
        assert_eq!(curve.bins()[0].count, 3);
        assert_eq!(curve.bins()[1].rate, None);
    }

    #[test]
    fn extreme_range_keeps_edges_finite() {
        let s = [-1e308, -1.0, 1.0, 1e308];
        let y = [false, true, true, false];
        let curve = ConditionalRateEstimator::new(2).estimate(&s, &y).unwrap();
        let bins = curve.bins();
        assert!(bins
            .iter()
            .all(|b| b.lower.is_finite() && b.upper.is_finite() && b.center.is_finite()));
        assert_eq!(bins[0].lower, -1e308);
        assert_eq!(bins[1].upper, 1e308);
        assert!(bins[0].center < bins[1].center);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 4);
        assert_eq!(curve.bin_index(1e308), 1);
        assert_eq!(curve.bin_index(-1e308), 0);
    }

    #[test]
    fn smoothing_pools_neighbours_and_keeps_gaps() {
        let s = [0.0, 1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [false, false, true, true, true, true];
        let curve = ConditionalRateEstimator::new(3).estimate(&s, &y).unwrap();
        let smooth = curve.smoothed(3);
        // middle bin pools all six observations
        assert_abs_diff_eq!(smooth.bins()[1].rate.unwrap(), 4.0 / 6.0, epsilon = 1e-12);
        assert_eq!(smooth.bins()[1].count, 2);
        assert_eq!(curve.smoothed(1), curve);
    }

    #[test]
    fn nearest_rate_skips_empty_bins() {
        let s = [0.0, 0.5, 9.5, 10.0];
        let y = [false, false, true, true];
        let curve = ConditionalRateEstimator::new(4).estimate(&s, &y).unwrap();
        assert_eq!(curve.nearest_rate(3.0), Some(0.0));
        assert_eq!(curve.nearest_rate(7.0), Some(1.0));
        assert_eq!(curve.rate_range(), Some((0.0, 1.0)));
    }

    #[test]
    fn rejects_bad_input() {
        let est = ConditionalRateEstimator::new(0);
        assert_eq!(est.estimate(&[1.0], &[true]), Err(StatsError::InvalidBins(0)));
        let est = ConditionalRateEstimator::new(2);
        assert_eq!(est.estimate(&[], &[]), Err(StatsError::EmptyInput));
        assert_eq!(
            est.estimate(&[1.0, 2.0], &[true]),
            Err(StatsError::LengthMismatch { s_len: 2, y_len: 1 })
        );
        assert_eq!(
            est.estimate(&[1.0, f64::NAN], &[true, false]),
            Err(StatsError::NonFinite { index: 1 })
        );
    }
}
