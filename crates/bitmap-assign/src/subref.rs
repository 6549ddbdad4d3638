//! Submatrix extraction from a bitmap or full matrix: `C = A(I,J)`
//!
//! The result has A's orientation, is `|I| × |J|`, stays full when A is full
//! and shares A's iso value when A is iso. Index lists may repeat indices
//! here; only the output is written, and each output position exactly once.

use crate::presence::Presence;
use crate::request::AssignContext;
use crate::templates::ixj;
use bitmap_core::{
    AssignEvent, Element, Error, ExecutionEngine, IndexList, Matrix, Result, Storage, Values,
    Workspace,
};
use std::time::Instant;
use tracing::instrument;

fn check_bounds(list: &IndexList, dim: usize) -> Result<()> {
    match list.iter().find(|&x| x >= dim) {
        Some(index) => Err(Error::IndexOutOfBounds { index, dim }),
        None => Ok(()),
    }
}

/// Empty output of shape `ni × nj` in A's orientation, storage allocated up front
fn allocate<T: Element, U: Element>(
    a: &Matrix<T>,
    ni: usize,
    nj: usize,
    values: impl FnOnce(usize, &Workspace) -> Result<Values<U>>,
    ws: &Workspace,
) -> Result<Matrix<U>> {
    let n = ni
        .checked_mul(nj)
        .ok_or_else(|| Error::out_of_memory::<U>(usize::MAX, "subref output"))?;
    let (storage, nvals) = match a.presence() {
        Some(_) => (
            Storage::Bitmap {
                b: ws.try_filled(n, 0u8, "subref presence")?,
            },
            0,
        ),
        None => (Storage::Full, n),
    };
    let values = values(n, ws)?;
    Ok(Matrix::from_parts(ni, nj, a.is_by_col(), storage, values, nvals))
}

/// Resolve `rows`/`cols` into A's storage orientation
fn oriented<'l, T: Element>(
    a: &Matrix<T>,
    rows: &'l IndexList,
    cols: &'l IndexList,
) -> Result<(&'l IndexList, &'l IndexList)> {
    if !a.format().is_dense_like() {
        return Err(Error::InvalidParameter(format!(
            "subref source must be bitmap or full, got {:?}",
            a.format()
        )));
    }
    check_bounds(rows, a.nrows())?;
    check_bounds(cols, a.ncols())?;
    Ok(if a.is_by_col() { (rows, cols) } else { (cols, rows) })
}

/// Walk the output, handing each position its source position in A
fn fill<T, U, E, F>(
    out: &mut Matrix<U>,
    a: &Matrix<T>,
    i: &IndexList,
    j: &IndexList,
    ctx: &AssignContext<E>,
    phase: &'static str,
    value: F,
) where
    T: Element,
    U: Element,
    E: ExecutionEngine,
    F: Fn(usize) -> U + Sync + Send,
{
    let (ni, nj) = (i.len(), j.len());
    let avlen = a.vlen();
    let ab = a.presence();
    ixj(out, ctx, &IndexList::all(ni), &IndexList::all(nj), phase, |s, cell| {
        let pa = i.get(cell.ia) + j.get(cell.ja) * avlen;
        match ab {
            Some(ab) if ab[pa] == 0 => 0,
            Some(_) => {
                s.write(value(pa));
                s.set(Presence::Present);
                1
            }
            None => {
                s.write(value(pa));
                0
            }
        }
    });
}

/// `C = A(rows, cols)` for a bitmap or full A
///
/// # Errors
/// - [`Error::InvalidParameter`] if A is sparse or hypersparse
/// - [`Error::IndexOutOfBounds`] if an index exceeds A's dimensions
/// - [`Error::OutOfMemory`] if the output cannot be allocated
#[instrument(skip_all, fields(nrows = a.nrows(), ncols = a.ncols(), ni = rows.len(), nj = cols.len()))]
pub fn subref<T, E>(
    a: &Matrix<T>,
    rows: &IndexList,
    cols: &IndexList,
    ctx: &AssignContext<E>,
) -> Result<Matrix<T>>
where
    T: Element,
    E: ExecutionEngine,
{
    let ctx = ctx.for_call();
    let start = Instant::now();
    ctx.diagnostics().emit(AssignEvent::CallStarted {
        trace_id: ctx.trace_id(),
        operation: "subref",
        nrows: a.nrows(),
        ncols: a.ncols(),
    });
    let extracted = oriented(a, rows, cols).and_then(|(i, j)| {
        let ws = ctx.workspace();
        let mut out = allocate(
            a,
            i.len(),
            j.len(),
            |n, ws| match a.values() {
                Values::Iso(v) => Ok(Values::Iso(*v)),
                Values::Array(_) => Ok(Values::Array(ws.try_filled(n, T::default(), "subref values")?)),
            },
            &ws,
        )?;
        let ax = a.values();
        fill(&mut out, a, i, j, &ctx, "subref", |pa| ax.get(pa));
        Ok(out)
    });

    let out = match extracted {
        Ok(out) => out,
        Err(err) => {
            ctx.diagnostics().emit(AssignEvent::CallFailed {
                trace_id: ctx.trace_id(),
                error: err.to_string(),
            });
            return Err(err);
        }
    };
    ctx.diagnostics().emit(AssignEvent::CallCompleted {
        trace_id: ctx.trace_id(),
        nvals: out.nvals(),
        duration: start.elapsed(),
    });
    Ok(out)
}

/// Pattern-only extraction: each present output entry holds its source position in A
///
/// The position is `i + j * vlen` in A's storage orientation, which lets a
/// caller gather values from A later.
pub fn subref_symbolic<T, E>(
    a: &Matrix<T>,
    rows: &IndexList,
    cols: &IndexList,
    ctx: &AssignContext<E>,
) -> Result<Matrix<usize>>
where
    T: Element,
    E: ExecutionEngine,
{
    let (i, j) = oriented(a, rows, cols)?;
    let ws = ctx.workspace();
    let mut out = allocate(
        a,
        i.len(),
        j.len(),
        |n, ws| Ok(Values::Array(ws.try_filled(n, 0usize, "subref positions")?)),
        &ws,
    )?;
    fill(&mut out, a, i, j, ctx, "subref_symbolic", |pa| pa);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitmap_core::{AssignConfig, Format};

    fn source() -> Matrix<i32> {
        // 3x4, entry (r, c) = 10 * r + c except (1, 2) missing
        let triplets: Vec<_> = (0..3)
            .flat_map(|r| (0..4).map(move |c| (r, c, (10 * r + c) as i32)))
            .filter(|&(r, c, _)| (r, c) != (1, 2))
            .collect();
        Matrix::from_triplets(3, 4, &triplets, Format::Bitmap)
    }

    #[test]
    fn test_bitmap_subref() {
        let a = source();
        let ctx = AssignContext::sequential();
        let c = subref(&a, &IndexList::list(vec![2, 1]), &IndexList::strided(3, -1, 1), &ctx).unwrap();
        assert_eq!(c.shape(), (2, 3));
        assert_eq!(c.format(), Format::Bitmap);
        assert_eq!(c.get(0, 0), Some(23));
        assert_eq!(c.get(1, 1), None);
        assert_eq!(c.get(1, 2), Some(11));
        assert_eq!(c.nvals(), 5);
        assert!(c.presence_invariant_holds());
    }

    #[test]
    fn test_full_and_iso_sources() {
        let ctx = AssignContext::sequential();
        let full = Matrix::full_from_fn(3, 3, false, |r, c| (r * 3 + c) as u16);
        let c = subref(&full, &IndexList::list(vec![0, 0, 2]), &IndexList::single(1), &ctx).unwrap();
        assert_eq!(c.format(), Format::Full);
        assert!(!c.is_by_col());
        assert_eq!(c.to_triplets(), vec![(0, 0, 1), (1, 0, 1), (2, 0, 7)]);

        let iso = Matrix::full_iso(4, 4, 2.5f64);
        let c = subref(&iso, &IndexList::range(1, 2), &IndexList::all(4), &ctx).unwrap();
        assert_eq!(c.values(), &Values::Iso(2.5));
        assert_eq!(c.nvals(), 8);
    }

    #[test]
    fn test_symbolic_positions() {
        let a = source();
        let ctx = AssignContext::sequential();
        let p = subref_symbolic(&a, &IndexList::single(2), &IndexList::range(1, 3), &ctx).unwrap();
        // column-oriented A: position of (2, c) is 2 + 3c
        assert_eq!(p.to_triplets(), vec![(0, 0, 5), (0, 1, 8), (0, 2, 11)]);
    }

    #[test]
    fn test_subref_errors() {
        let ctx = AssignContext::sequential();
        let sparse = Matrix::from_triplets(2, 2, &[(0, 0, 1i8)], Format::Sparse);
        assert!(matches!(
            subref(&sparse, &IndexList::all(2), &IndexList::all(2), &ctx),
            Err(Error::InvalidParameter(_))
        ));
        let a = source();
        assert!(matches!(
            subref(&a, &IndexList::single(3), &IndexList::all(4), &ctx),
            Err(Error::IndexOutOfBounds { index: 3, dim: 3 })
        ));
        let tight = AssignContext::sequential().with_config(AssignConfig {
            workspace_limit: Some(4),
            ..AssignConfig::default()
        });
        assert!(subref(&a, &IndexList::all(3), &IndexList::all(4), &tight)
            .unwrap_err()
            .is_out_of_memory());
    }
}
