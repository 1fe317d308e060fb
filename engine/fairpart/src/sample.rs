//! Sorted, tie-collapsed view of an observation set.
//!
//! Observations are sorted by `s` and runs of equal `s` are collapsed into
//! atoms. Splits are atom indices, so tied values always land in the same
//! group. Prefix counts make block sizes, positive counts and the binary
//! within-block sum of squares O(1).

use crate::partition::midpoint;
use crate::Observations;

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Atom {
    pub lo: f64,
    pub hi: f64,
    pub count: usize,
    pub positives: usize,
}

#[derive(Debug, Clone)]
pub(crate) struct SortedSample {
    atoms: Vec<Atom>,
    counts: Vec<usize>,
    positives: Vec<usize>,
}

impl SortedSample {
    pub fn new(obs: &Observations<'_>) -> Self {
        let s = obs.s();
        let y = obs.y();
        let mut order: Vec<usize> = (0..s.len()).collect();
        order.sort_by(|&a, &b| s[a].total_cmp(&s[b]));

        let mut atoms: Vec<Atom> = Vec::new();
        for idx in order {
            let value = s[idx];
            let hit = usize::from(y[idx]);
            match atoms.last_mut() {
                Some(atom) if atom.hi == value => {
                    atom.count += 1;
                    atom.positives += hit;
                }
                _ => atoms.push(Atom {
                    lo: value,
                    hi: value,
                    count: 1,
                    positives: hit,
                }),
            }
        }
        Self::from_atoms(atoms)
    }

    fn from_atoms(atoms: Vec<Atom>) -> Self {
        let mut counts = Vec::with_capacity(atoms.len() + 1);
        let mut positives = Vec::with_capacity(atoms.len() + 1);
        counts.push(0);
        positives.push(0);
        for atom in &atoms {
            counts.push(counts[counts.len() - 1] + atom.count);
            positives.push(positives[positives.len() - 1] + atom.positives);
        }
        Self {
            atoms,
            counts,
            positives,
        }
    }

    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    pub fn n_atoms(&self) -> usize {
        self.atoms.len()
    }

    pub fn n_obs(&self) -> usize {
        self.counts[self.atoms.len()]
    }

    pub fn total_positives(&self) -> usize {
        self.positives[self.atoms.len()]
    }

    pub fn min_value(&self) -> f64 {
        self.atoms[0].lo
    }

    pub fn max_value(&self) -> f64 {
        self.atoms[self.atoms.len() - 1].hi
    }

    /// Observations in atoms `[i, j)`
    pub fn count(&self, i: usize, j: usize) -> usize {
        self.counts[j] - self.counts[i]
    }

    pub fn positives(&self, i: usize, j: usize) -> usize {
        self.positives[j] - self.positives[i]
    }

    /// Positive rate of atoms `[i, j)`, `None` when the block is empty
    pub fn rate(&self, i: usize, j: usize) -> Option<f64> {
        let n = self.count(i, j);
        (n > 0).then(|| self.positives(i, j) as f64 / n as f64)
    }

    /// Sum of squared deviations of `y` from the block mean: `c(n - c) / n`.
    pub fn cost(&self, i: usize, j: usize) -> f64 {
        let n = self.count(i, j);
        if n == 0 {
            return 0.0;
        }
        let c = self.positives(i, j);
        (c as f64) * ((n - c) as f64) / n as f64
    }

    /// `[start, end)` atom ranges for the blocks cut at `splits`.
    pub fn blocks<'a>(&self, splits: &'a [usize]) -> impl Iterator<Item = (usize, usize)> + 'a {
        let end = self.n_atoms();
        std::iter::once(0)
            .chain(splits.iter().copied())
            .zip(splits.iter().copied().chain(std::iter::once(end)))
    }

    pub fn total_cost(&self, splits: &[usize]) -> f64 {
        self.blocks(splits).map(|(i, j)| self.cost(i, j)).sum()
    }

    /// Smallest `q > start` such that atoms `[start, q)` hold at least
    /// `min_size` observations, or `n_atoms` when none does.
    pub fn first_end(&self, start: usize, min_size: usize) -> usize {
        let target = self.counts[start] + min_size;
        self.counts
            .partition_point(|&c| c < target)
            .min(self.n_atoms())
    }

    /// Largest `p < end` such that atoms `[p, end)` hold at least `min_size`
    /// observations.
    pub fn last_start(&self, end: usize, min_size: usize) -> Option<usize> {
        let target = self.counts[end].checked_sub(min_size)?;
        Some(self.counts.partition_point(|&c| c <= target) - 1)
    }

    /// Latest admissible position of every split when the groups to its right
    /// are packed at `min_size`. Entry `g` bounds the start of group `g`;
    /// entry `n_groups` is `n_atoms`. `None` when ties make `n_groups`
    /// groups of `min_size` impossible.
    pub fn upper_split_bounds(&self, n_groups: usize, min_size: usize) -> Option<Vec<usize>> {
        let mut bounds = vec![0; n_groups + 1];
        bounds[n_groups] = self.n_atoms();
        for g in (0..n_groups).rev() {
            bounds[g] = self.last_start(bounds[g + 1], min_size)?;
        }
        Some(bounds)
    }

    /// Move each proposed split to the nearest position that keeps every
    /// group at `min_size` or more. `upper` comes from
    /// [`SortedSample::upper_split_bounds`].
    pub fn clamp_splits(&self, proposed: &[usize], min_size: usize, upper: &[usize]) -> Vec<usize> {
        let mut prev = 0;
        proposed
            .iter()
            .enumerate()
            .map(|(i, &p)| {
                let q = p.max(self.first_end(prev, min_size)).min(upper[i + 1]);
                prev = q;
                q
            })
            .collect()
    }

    /// Splits cutting the sorted sample into `n_groups` runs of similar count.
    pub fn quantile_splits(&self, n_groups: usize) -> Vec<usize> {
        let n = self.n_obs();
        (1..n_groups)
            .map(|g| {
                let target = g * n / n_groups;
                self.counts.partition_point(|&c| c < target)
            })
            .collect()
    }

    /// Fold the last atom into its neighbour when no boundary strictly below
    /// `upper`, the closing boundary of the partition, can separate them.
    /// Happens only when the two top values are adjacent floats.
    pub fn fuse_inseparable_top(self, upper: f64) -> SortedSample {
        let n = self.atoms.len();
        if n < 2 || midpoint(self.atoms[n - 2].hi, self.atoms[n - 1].lo) < upper {
            return self;
        }
        let mut atoms = self.atoms;
        if let Some(top) = atoms.pop() {
            if let Some(below) = atoms.last_mut() {
                below.hi = top.hi;
                below.count += top.count;
                below.positives += top.positives;
            }
        }
        Self::from_atoms(atoms)
    }

    /// Merge neighbouring atoms into at most `max_blocks` blocks of similar
    /// count. Atoms are never divided.
    pub fn coarsen(&self, max_blocks: usize) -> SortedSample {
        if self.n_atoms() <= max_blocks || max_blocks == 0 {
            return self.clone();
        }
        let target = self.n_obs().div_ceil(max_blocks);
        let mut blocks: Vec<Atom> = Vec::with_capacity(max_blocks);
        let mut current: Option<Atom> = None;
        for atom in &self.atoms {
            let merged = match current {
                None => *atom,
                Some(block) => Atom {
                    lo: block.lo,
                    hi: atom.hi,
                    count: block.count + atom.count,
                    positives: block.positives + atom.positives,
                },
            };
            if merged.count >= target {
                blocks.push(merged);
                current = None;
            } else {
                current = Some(merged);
            }
        }
        if let Some(block) = current {
            blocks.push(block);
        }
        Self::from_atoms(blocks)
    }
}
