//! Contiguous fair partitioning of a continuous sensitive attribute.
//!
//! Given paired observations `(s_i, y_i)` of a continuous attribute and a
//! binary outcome, split the range of `s` into `K` contiguous groups whose
//! positive rates are as homogeneous as possible, then report the per-group
//! disparity `Φ_k = P(y = 1 | group k) − P(y = 1)` with confidence intervals.
//!
//! Two partitioners share the [`Partitioner`] interface:
//!
//! - [`FairGroups`]: exact dynamic programming over split points
//! - [`FairKMeans`]: iterative contiguous k-means over the local rate signal
//!
//! ```ignore
//! use fairpart::{FairGroups, PartitionConfig, Partitioner};
//!
//! let fitted = FairGroups::new(PartitionConfig::new(3)).fit(&s, &y)?;
//! for (k, (phi, ci)) in fitted.phi_by_group().iter().zip(fitted.phi_by_group_ci()).enumerate() {
//!     println!("group {k}: {phi:+.3} ({:.3}, {:.3})", ci.0, ci.1);
//! }
//! ```
pub mod config;
mod error;
mod groups;
mod kmeans;
mod metrics;
mod model;
mod observations;
mod partition;
mod sample;

pub use config::{GroupsConfig, KMeansConfig, KMeansInit, PartitionConfig, ResolvedConfig};
pub use error::*;
pub use groups::FairGroups;
pub use kmeans::{FairKMeans, KMeansState};
pub use metrics::*;
pub use model::{Diagnostics, FittedPartition, Partitioner};
pub use observations::*;
pub use partition::Partition;

pub use fairpart_stats::{
    conditional_positive_rate, Binning, ConditionalRateEstimator, IntervalMethod, RateBin,
    RateCurve,
};
