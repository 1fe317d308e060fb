//! Statistical building blocks for contiguous fair partitioning.
//!
//! - [`ConditionalRateEstimator`]: binned `P(y = 1 | s)` curves
//! - [`proportion_interval`]: Wilson / Wald intervals for binomial rates
mod error;
mod interval;
mod rate;

pub use error::*;
pub use interval::*;
pub use rate::*;

/// Validate an attribute sequence against the outcome count.
///
/// Lengths must agree, the sample must be non-empty and every attribute
/// value must be finite.
pub fn check_observations(s: &[f64], y_len: usize) -> Result<(), StatsError> {
    if s.len() != y_len {
        return Err(StatsError::LengthMismatch {
            s_len: s.len(),
            y_len,
        });
    }
    if s.is_empty() {
        return Err(StatsError::EmptyInput);
    }
    if let Some(index) = s.iter().position(|x| !x.is_finite()) {
        return Err(StatsError::NonFinite { index });
    }
    Ok(())
}

/// Overall positive rate `P(y = 1)`.
pub fn positive_rate(y: &[bool]) -> Result<f64, StatsError> {
    if y.is_empty() {
        return Err(StatsError::EmptyInput);
    }
    let positives = y.iter().filter(|&&v| v).count();
    Ok(positives as f64 / y.len() as f64)
}
