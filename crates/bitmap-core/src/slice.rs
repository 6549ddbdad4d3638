//! Task slicing for parallel traversals
//!
//! Two partitioners are provided:
//!
//! - [`EkSlice`] splits the entries of a sparse or hypersparse matrix into
//!   near-equal contiguous ranges, recording for each task the first and last
//!   vector it touches.
//! - [`IxjSlice`] splits a Cartesian range `nI × nJ` into coarse tasks (whole
//!   vectors) or, when there are fewer vectors than tasks, fine tasks (pieces
//!   of one vector).
//!
//! Only [`EkSlice`] allocates; the Cartesian and flat partitions are computed
//! on demand from the task id.

use crate::error::Result;
use crate::matrix::SparseParts;
use crate::workspace::Workspace;
use std::ops::Range;

/// Block `t` of `n` items split into `ntasks` near-equal contiguous blocks
#[inline]
pub fn partition(n: usize, ntasks: usize, t: usize) -> Range<usize> {
    let ntasks = ntasks.max(1) as u128;
    let start = (t as u128 * n as u128 / ntasks) as usize;
    let end = ((t as u128 + 1) * n as u128 / ntasks) as usize;
    start..end
}

/// One task's share of a sparse matrix's entries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EkTask {
    /// First stored vector touched
    pub kfirst: usize,
    /// Last stored vector touched
    pub klast: usize,
    /// First entry slot
    pub pstart: usize,
    /// One past the last entry slot
    pub pend: usize,
}

impl EkTask {
    pub fn is_empty(&self) -> bool {
        self.pstart >= self.pend
    }
}

/// Entries of a sparse or hypersparse matrix split into balanced tasks
#[derive(Debug, Clone)]
pub struct EkSlice {
    tasks: Vec<EkTask>,
}

impl EkSlice {
    /// Slice `parts` into at most `ntasks` tasks
    ///
    /// Fails only if the task array cannot be allocated.
    pub fn new(parts: SparseParts<'_>, ntasks: usize, ws: &Workspace) -> Result<Self> {
        let nnz = parts.nnz();
        let ntasks = ntasks.clamp(1, nnz.max(1));
        let mut tasks = ws.try_with_capacity(ntasks, "ek_slice tasks")?;
        let p = parts.p;
        for t in 0..ntasks {
            let Range { start, end } = partition(nnz, ntasks, t);
            if start >= end {
                tasks.push(EkTask {
                    kfirst: 0,
                    klast: 0,
                    pstart: start,
                    pend: start,
                });
                continue;
            }
            // vector holding slot `start`, then the one holding `end - 1`
            let kfirst = p.partition_point(|&x| x <= start) - 1;
            let klast = p.partition_point(|&x| x < end) - 1;
            tasks.push(EkTask {
                kfirst,
                klast,
                pstart: start,
                pend: end,
            });
        }
        Ok(Self { tasks })
    }

    pub fn ntasks(&self) -> usize {
        self.tasks.len()
    }

    pub fn task(&self, t: usize) -> EkTask {
        self.tasks[t]
    }

    pub fn tasks(&self) -> &[EkTask] {
        &self.tasks
    }

    /// `(vector index, entry slots)` pairs covered by task `t`
    pub fn vectors<'a>(
        &self,
        t: usize,
        parts: SparseParts<'a>,
    ) -> impl Iterator<Item = (usize, Range<usize>)> + 'a {
        let task = self.tasks[t];
        let ks = if task.is_empty() {
            1..0
        } else {
            task.kfirst..task.klast + 1
        };
        ks.map(move |k| {
            let start = parts.p[k].max(task.pstart);
            let end = parts.p[k + 1].min(task.pend);
            (parts.vector(k), start..end)
        })
    }
}

/// One task's rectangle of a Cartesian range, in local coordinates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IxjTask {
    pub i: Range<usize>,
    pub j: Range<usize>,
}

/// Cartesian range `ni × nj` split into tasks
#[derive(Debug, Clone, Copy)]
pub struct IxjSlice {
    ni: usize,
    nj: usize,
    ntasks: usize,
    /// Tasks per vector when fine, zero when coarse
    fine: usize,
}

impl IxjSlice {
    pub fn new(ni: usize, nj: usize, ntasks: usize) -> Self {
        let ntasks = ntasks.max(1);
        if ntasks == 1 || nj == 0 || nj >= ntasks || ni <= 1 {
            Self {
                ni,
                nj,
                ntasks: ntasks.min(nj.max(1)),
                fine: 0,
            }
        } else {
            let per_vector = ntasks.div_ceil(nj.max(1)).min(ni);
            Self {
                ni,
                nj,
                ntasks: nj * per_vector,
                fine: per_vector,
            }
        }
    }

    pub fn ntasks(&self) -> usize {
        self.ntasks
    }

    pub fn task(&self, t: usize) -> IxjTask {
        if self.fine == 0 {
            IxjTask {
                i: 0..self.ni,
                j: partition(self.nj, self.ntasks, t),
            }
        } else {
            let j = t / self.fine;
            IxjTask {
                i: partition(self.ni, self.fine, t % self.fine),
                j: j..j + 1,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn parts<'a>(p: &'a [usize], h: Option<&'a [usize]>, i: &'a [usize]) -> SparseParts<'a> {
        SparseParts { p, h, i }
    }

    #[test]
    fn test_partition_covers_range() {
        let blocks: Vec<_> = (0..3).map(|t| partition(10, 3, t)).collect();
        assert_eq!(blocks, vec![0..3, 3..6, 6..10]);
        assert_eq!(partition(0, 4, 2), 0..0);
    }

    #[test]
    fn test_ek_slice_visits_every_entry_once() {
        // vectors: 0 -> 3 entries, 1 -> empty, 2 -> 1 entry, 3 -> 4 entries
        let p = [0, 3, 3, 4, 8];
        let i = [0, 1, 2, 5, 0, 1, 2, 3];
        let sp = parts(&p, None, &i);
        let ws = Workspace::unlimited();
        for ntasks in 1..10 {
            let slice = EkSlice::new(sp, ntasks, &ws).unwrap();
            assert!(slice.ntasks() <= 8);
            let mut seen = Vec::new();
            for t in 0..slice.ntasks() {
                for (j, slots) in slice.vectors(t, sp) {
                    for s in slots {
                        assert!(s >= p[j] && s < p[j + 1]);
                        seen.push(s);
                    }
                }
            }
            assert_eq!(seen, (0..8).collect::<Vec<_>>(), "ntasks = {ntasks}");
        }
    }

    #[test]
    fn test_ek_slice_hypersparse_vectors() {
        let p = [0, 2, 3];
        let h = [4, 9];
        let i = [1, 3, 0];
        let sp = parts(&p, Some(&h), &i);
        let slice = EkSlice::new(sp, 2, &Workspace::unlimited()).unwrap();
        let first: Vec<_> = slice.vectors(0, sp).collect();
        let second: Vec<_> = slice.vectors(1, sp).collect();
        assert_eq!(first, vec![(4, 0..1)]);
        assert_eq!(second, vec![(4, 1..2), (9, 2..3)]);
    }

    #[test]
    fn test_ek_slice_empty_matrix() {
        let p = [0, 0, 0];
        let sp = parts(&p, None, &[]);
        let slice = EkSlice::new(sp, 8, &Workspace::unlimited()).unwrap();
        assert_eq!(slice.ntasks(), 1);
        assert_eq!(slice.vectors(0, sp).count(), 0);
    }

    #[test]
    fn test_ek_slice_allocation_failure() {
        let p = [0, 4];
        let i = [0, 1, 2, 3];
        let ws = Workspace::new(Some(8));
        let err = EkSlice::new(parts(&p, None, &i), 4, &ws).unwrap_err();
        assert!(err.is_out_of_memory());
    }

    #[test]
    fn test_ixj_slice_coarse_and_fine() {
        let coarse = IxjSlice::new(5, 8, 4);
        assert_eq!(coarse.ntasks(), 4);
        assert_eq!(coarse.task(1), IxjTask { i: 0..5, j: 2..4 });

        let fine = IxjSlice::new(10, 2, 8);
        assert_eq!(fine.ntasks(), 8);
        assert_eq!(fine.task(0), IxjTask { i: 0..2, j: 0..1 });
        assert_eq!(fine.task(5), IxjTask { i: 2..5, j: 1..2 });

        let mut cells = 0;
        for t in 0..fine.ntasks() {
            let task = fine.task(t);
            cells += task.i.len() * task.j.len();
        }
        assert_eq!(cells, 20);
    }

    proptest! {
        // Property: every entry slot lands in exactly one task, in order
        #[test]
        fn prop_ek_slice_partitions_entries(
            lens in proptest::collection::vec(0usize..6, 1..20),
            ntasks in 1usize..40,
        ) {
            let mut p = vec![0];
            for len in &lens {
                p.push(p[p.len() - 1] + len);
            }
            let nnz = p[p.len() - 1];
            let i: Vec<usize> = (0..nnz).collect();
            let sp = parts(&p, None, &i);
            let slice = EkSlice::new(sp, ntasks, &Workspace::unlimited()).unwrap();

            let seen: Vec<usize> = (0..slice.ntasks())
                .flat_map(|t| slice.vectors(t, sp).flat_map(|(_, slots)| slots))
                .collect();
            prop_assert_eq!(seen, (0..nnz).collect::<Vec<_>>());
        }

        // Property: the rectangles of an IxJ slice tile the range exactly
        #[test]
        fn prop_ixj_slice_tiles_range(ni in 0usize..30, nj in 0usize..30, ntasks in 1usize..64) {
            let slice = IxjSlice::new(ni, nj, ntasks);
            let mut hits = vec![0u8; ni * nj];
            for t in 0..slice.ntasks() {
                let task = slice.task(t);
                for j in task.j.clone() {
                    for i in task.i.clone() {
                        hits[i + j * ni] += 1;
                    }
                }
            }
            prop_assert!(hits.iter().all(|&h| h == 1));
        }
    }

    #[test]
    fn test_ixj_slice_degenerate() {
        let empty = IxjSlice::new(0, 0, 4);
        assert_eq!(empty.ntasks(), 1);
        assert_eq!(empty.task(0), IxjTask { i: 0..0, j: 0..0 });

        let single_row = IxjSlice::new(1, 3, 16);
        assert_eq!(single_row.ntasks(), 3);
    }
}
