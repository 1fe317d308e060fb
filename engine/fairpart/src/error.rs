//! Error and warning types for partition fitting

use fairpart_stats::StatsError;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while fitting a partition or computing its metrics
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PartitionError {
    /// Invalid `K`, group size, confidence level, domain or input shape
    #[error("configuration error: {0}")]
    Configuration(String),
    /// The data cannot support `K` contiguous groups
    #[error("degenerate input: {0}")]
    DegenerateInput(String),
    /// A group statistic has no observations behind it. Indicates a defect
    /// upstream rather than a recoverable condition.
    #[error("undefined metric: {0}")]
    UndefinedMetric(String),
}

impl PartitionError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        PartitionError::Configuration(msg.into())
    }

    pub fn degenerate(msg: impl Into<String>) -> Self {
        PartitionError::DegenerateInput(msg.into())
    }

    pub fn undefined(msg: impl Into<String>) -> Self {
        PartitionError::UndefinedMetric(msg.into())
    }
}

impl From<StatsError> for PartitionError {
    fn from(err: StatsError) -> Self {
        match err {
            StatsError::EmptyGroup => PartitionError::UndefinedMetric(err.to_string()),
            StatsError::EmptyInput
            | StatsError::LengthMismatch { .. }
            | StatsError::InvalidBins(_)
            | StatsError::NonFinite { .. }
            | StatsError::InvalidConfidence(_)
            | StatsError::InvalidCounts { .. } => PartitionError::Configuration(err.to_string()),
        }
    }
}

/// Non-fatal conditions attached to an otherwise usable fit
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FitWarning {
    #[error("refinement stopped after {iterations} iterations without converging")]
    NonConvergence { iterations: usize },
}
