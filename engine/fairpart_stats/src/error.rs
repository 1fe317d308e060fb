//! Error types for rate and interval estimation

use thiserror::Error;

/// Errors raised while estimating rates or intervals
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StatsError {
    #[error("no observations supplied")]
    EmptyInput,
    #[error("length mismatch: {s_len} attribute values but {y_len} outcomes")]
    LengthMismatch { s_len: usize, y_len: usize },
    #[error("invalid bin count: {0}")]
    InvalidBins(usize),
    #[error("non-finite attribute value at index {index}")]
    NonFinite { index: usize },
    #[error("confidence level must lie strictly between 0 and 1, got {0}")]
    InvalidConfidence(f64),
    #[error("{positives} positives exceed {trials} trials")]
    InvalidCounts { positives: usize, trials: usize },
    #[error("cannot estimate a rate from an empty group")]
    EmptyGroup,
}
