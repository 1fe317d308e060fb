//! Exact contiguous partitioning by dynamic programming.
//!
//! Minimises the total within-group sum of squared deviations of `y` over
//! every contiguous split of the sorted sample into `K` groups of at least
//! `min_group_size` observations. The table is a flat arena indexed by
//! `(groups, start atom)`: each cell holds the best way to cover atoms
//! `[start, end)` with that many groups. Filling it costs `O(K · M²)` for
//! `M` distinct attribute values.
//!
//! Ties on cost are broken by the most balanced group sizes (smallest
//! `Σ n_k²`, equivalently the smallest variance of `n_k`), then by the
//! lexicographically smallest split positions.

use crate::config::{GroupsConfig, PartitionConfig};
use crate::model::{Diagnostics, FittedPartition, Partitioner, Prepared};
use crate::sample::SortedSample;
use crate::PartitionError;

/// Relative tolerance under which two costs count as equal
const COST_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, Copy)]
struct Cell {
    cost: f64,
    balance: u64,
    next: usize,
}

impl Cell {
    fn improves_on(&self, other: &Cell) -> bool {
        let tol = COST_TOLERANCE * self.cost.abs().max(other.cost.abs()).max(1.0);
        if self.cost < other.cost - tol {
            true
        } else if self.cost > other.cost + tol {
            false
        } else {
            self.balance < other.balance
        }
    }
}

fn squared(n: usize) -> u64 {
    (n as u64).saturating_mul(n as u64)
}

/// Optimal splits (atom indices) of `sample` into `n_groups` blocks of at
/// least `min_size` observations, or `None` when no such split exists.
pub(crate) fn optimal_splits(
    sample: &SortedSample,
    n_groups: usize,
    min_size: usize,
) -> Option<Vec<usize>> {
    let atoms = sample.n_atoms();
    let width = atoms + 1;
    let at = |groups: usize, start: usize| groups * width + start;
    let mut table: Vec<Option<Cell>> = vec![None; (n_groups + 1) * width];

    for start in 0..atoms {
        let n = sample.count(start, atoms);
        if n >= min_size {
            table[at(1, start)] = Some(Cell {
                cost: sample.cost(start, atoms),
                balance: squared(n),
                next: atoms,
            });
        }
    }

    for groups in 2..=n_groups {
        // the full problem only ever starts at atom 0
        let starts = if groups == n_groups { 0..1 } else { 0..atoms };
        for start in starts {
            let mut best: Option<Cell> = None;
            for end in sample.first_end(start, min_size)..atoms {
                let Some(rest) = table[at(groups - 1, end)] else {
                    continue;
                };
                let candidate = Cell {
                    cost: sample.cost(start, end) + rest.cost,
                    balance: squared(sample.count(start, end)).saturating_add(rest.balance),
                    next: end,
                };
                if best.map_or(true, |b| candidate.improves_on(&b)) {
                    best = Some(candidate);
                }
            }
            table[at(groups, start)] = best;
        }
    }

    let mut splits = Vec::with_capacity(n_groups.saturating_sub(1));
    let mut start = 0;
    for groups in (2..=n_groups).rev() {
        let cell = table[at(groups, start)]?;
        splits.push(cell.next);
        start = cell.next;
    }
    if n_groups == 1 {
        table[at(1, 0)]?;
    }
    Some(splits)
}

/// Globally optimal contiguous partitioner
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FairGroups {
    config: PartitionConfig,
    groups: GroupsConfig,
}

impl FairGroups {
    pub fn new(config: PartitionConfig) -> Self {
        Self {
            config,
            groups: GroupsConfig::default(),
        }
    }

    pub fn with_groups_config(mut self, groups: GroupsConfig) -> Self {
        self.groups = groups;
        self
    }

    pub fn groups_config(&self) -> &GroupsConfig {
        &self.groups
    }
}

impl Partitioner for FairGroups {
    fn name(&self) -> &'static str {
        "fair_groups"
    }

    fn config(&self) -> &PartitionConfig {
        &self.config
    }

    fn fit(&self, s: &[f64], y: &[bool]) -> Result<FittedPartition, PartitionError> {
        self.groups.validate(self.config.n_groups)?;
        let prepared = Prepared::new(&self.config, s, y)?;
        let k = prepared.config.n_groups;
        let m = prepared.config.min_group_size;
        log::debug!(
            "fair_groups: fitting {} observations ({} distinct) into {k} groups, min size {m}",
            prepared.sample.n_obs(),
            prepared.sample.n_atoms()
        );

        let coarse;
        let sample = match self.groups.max_candidate_splits {
            Some(splits) => {
                coarse = prepared.sample.coarsen(splits + 1);
                if coarse.upper_split_bounds(k, m).is_some() {
                    &coarse
                } else {
                    log::debug!(
                        "fair_groups: {} candidate blocks cannot hold {k} groups, searching all splits",
                        coarse.n_atoms()
                    );
                    &prepared.sample
                }
            }
            None => &prepared.sample,
        };

        let splits = optimal_splits(sample, k, m).ok_or_else(|| {
            PartitionError::degenerate(format!(
                "no contiguous split into {k} groups of at least {m} observations"
            ))
        })?;
        let candidate_blocks = sample.n_atoms();
        let diagnostics = if candidate_blocks < prepared.sample.n_atoms() {
            Diagnostics::Approximate { candidate_blocks }
        } else {
            Diagnostics::Exact { candidate_blocks }
        };
        let fitted = FittedPartition::assemble(&prepared, sample, &splits, diagnostics, Vec::new())?;
        log::debug!(
            "fair_groups: boundaries {:?}, cost {:.6}",
            fitted.boundaries(),
            fitted.cost()
        );
        Ok(fitted)
    }
}
