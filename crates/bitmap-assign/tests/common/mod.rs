//! Shared utilities for integration tests
//!
//! [`expected`] is a naive dense rendition of `C<M>(I,J) accum= A`: it walks
//! every position of C once, with no presence bytes, no task slicing and no
//! case analysis. The engine's output must match it exactly.

#![allow(dead_code)]

use bitmap_assign::{AssignKind, AssignRequest, BinaryOp, Element, Format, Input, Matrix, Values};
use rand::seq::SliceRandom;
use rand::Rng;
use rand_chacha::ChaCha8Rng;

pub use rand::SeedableRng;

pub type Triplets<T> = Vec<(usize, usize, T)>;

/// Every format a mask or input matrix can take
pub const ALL_FORMATS: [Format; 4] = [
    Format::Hypersparse,
    Format::Sparse,
    Format::Bitmap,
    Format::Full,
];

pub fn rng(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

/// Position `k` of `x` in `list`, if listed
fn position(list: &[usize], x: usize) -> Option<usize> {
    list.iter().position(|&y| y == x)
}

/// Whether the mask of `req` selects target `(row, col)`
///
/// `(ia, ja)` is the position inside `I × J`, needed only for subassign.
fn selected<A, M, Op>(
    req: &AssignRequest<'_, A, M, Op>,
    row: usize,
    col: usize,
    ij: Option<(usize, usize)>,
) -> bool
where
    A: Element,
    M: Element,
{
    let Some(mask) = req.mask() else {
        return !req.mask_comp();
    };
    let entry = match req.assign_kind() {
        AssignKind::Row => mask.get(0, col),
        AssignKind::Col => mask.get(row, 0),
        AssignKind::Assign => mask.get(row, col),
        AssignKind::Subassign => ij.and_then(|(ia, ja)| mask.get(ia, ja)),
    };
    let truth = entry.is_some_and(|v| req.mask_struct() || v.is_nonzero());
    truth != req.mask_comp()
}

/// Result of applying `req` to `c`, as sorted triplets
pub fn expected<T, M, Op>(c: &Matrix<T>, req: &AssignRequest<'_, T, M, Op>) -> Triplets<T>
where
    T: Element,
    M: Element,
    Op: BinaryOp<T>,
{
    let rows: Vec<usize> = req.rows().iter().collect();
    let cols: Vec<usize> = req.cols().iter().collect();
    let kind = req.assign_kind();
    let mut out = Vec::new();

    for row in 0..c.nrows() {
        for col in 0..c.ncols() {
            let current = c.get(row, col);
            let in_region = match kind {
                AssignKind::Row => row == rows[0],
                AssignKind::Col => col == cols[0],
                AssignKind::Assign => true,
                AssignKind::Subassign => rows.contains(&row) && cols.contains(&col),
            };
            let ij = position(&rows, row).zip(position(&cols, col));
            let result = if !in_region {
                current
            } else {
                let sel = selected(req, row, col, ij);
                match ij {
                    Some((ia, ja)) if sel => {
                        let supplied = match req.input() {
                            Input::Scalar(s) => Some(s),
                            Input::Matrix(a) => a.get(ia, ja),
                        };
                        match (supplied, req.accum()) {
                            (Some(a), Some(op)) => Some(current.map_or(a, |x| op.apply(x, a))),
                            (Some(a), None) => Some(a),
                            (None, Some(_)) => current,
                            (None, None) => None,
                        }
                    }
                    _ if req.is_replace() && !sel => None,
                    _ => current,
                }
            };
            if let Some(v) = result {
                out.push((row, col, v));
            }
        }
    }
    out
}

/// Distinct indices from `0..dim`, between 1 and `max` of them, in random order
pub fn random_indices(rng: &mut ChaCha8Rng, dim: usize, max: usize) -> Vec<usize> {
    let mut all: Vec<usize> = (0..dim).collect();
    all.shuffle(rng);
    let n = rng.gen_range(1..=max.min(dim));
    all.truncate(n);
    all
}

/// Random `nrows × ncols` matrix in `format`
///
/// Positions are present with probability `density` except for a full
/// matrix, which has them all.
pub fn random_matrix<T, F>(
    rng: &mut ChaCha8Rng,
    nrows: usize,
    ncols: usize,
    by_col: bool,
    format: Format,
    density: f64,
    mut value: F,
) -> Matrix<T>
where
    T: Element,
    F: FnMut(&mut ChaCha8Rng) -> T,
{
    let mut triplets = Vec::new();
    for row in 0..nrows {
        for col in 0..ncols {
            if format == Format::Full || rng.gen_bool(density) {
                triplets.push((row, col, value(rng)));
            }
        }
    }
    Matrix::from_triplets_with(nrows, ncols, by_col, &triplets, format)
}

/// Small signed values, so sums stay exact
pub fn small_value(rng: &mut ChaCha8Rng) -> i64 {
    rng.gen_range(-9..=9)
}

/// Mask values with some explicit zeros, which a valued mask treats as false
pub fn mask_value(rng: &mut ChaCha8Rng) -> u8 {
    rng.gen_range(0..3)
}

/// Same pattern as `m`, every entry holding `value`
pub fn as_iso<T: Element>(m: &Matrix<T>, value: T) -> Matrix<T> {
    Matrix::from_parts(
        m.vlen(),
        m.vdim(),
        m.is_by_col(),
        m.storage().clone(),
        Values::Iso(value),
        m.nvals(),
    )
}

/// Assert the engine result equals the reference, with a readable context on failure
pub fn assert_matches<T: Element>(got: &Matrix<T>, want: &Triplets<T>, context: &str) {
    assert!(
        got.presence_invariant_holds(),
        "{context}: presence bytes unsettled or nvals wrong"
    );
    assert_eq!(&got.to_triplets(), want, "{context}");
}
