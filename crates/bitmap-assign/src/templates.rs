//! Traversal templates
//!
//! Each template visits one family of target positions, hands the work
//! closure a [`Slot`] for the position plus its [`Cell`] coordinates, and
//! sums the closure's return values into `nvals` after the join:
//!
//! - [`over_a`] / [`over_a_whole`]: every entry of A, mapped through `I × J`
//! - [`over_ixj`]: every position of `I × J`
//! - [`over_c_whole`]: every position of C
//! - [`over_region`]: the replace region of the call's kind
//! - [`over_mask`]: every true entry of the mask, mapped into C
//! - [`over_mask_whole`]: the same for a mask with C's shape, without mapping
//!
//! Tasks are computed once per traversal; each owns a disjoint set of
//! positions (index lists hold no duplicates, sparse patterns hold no
//! duplicate entries), which is what makes the shared [`BitmapView`] sound.
//! The closures are generic so the per-position work inlines into the loop.

use crate::mask::Cell;
use crate::prepare::{Operands, Source};
use crate::presence::{BitmapView, Slot};
use crate::request::{AssignContext, AssignKind};
use bitmap_core::{
    partition, AssignEvent, CastTo, Element, ExecutionEngine, IndexList, IxjSlice, Matrix,
};

#[inline]
fn apply_delta(nvals: usize, delta: i64) -> usize {
    let updated = nvals as i64 + delta;
    debug_assert!(updated >= 0, "nvals went negative: {nvals} + {delta}");
    updated.max(0) as usize
}

/// Run `ntasks` tasks over a shared view of `c` and fold their deltas into `nvals`
fn run_tasks<T, E, F>(
    c: &mut Matrix<T>,
    ctx: &AssignContext<E>,
    phase: &'static str,
    ntasks: usize,
    task: F,
) where
    T: Element,
    E: ExecutionEngine,
    F: Fn(&BitmapView<'_, T>, usize) -> i64 + Sync + Send,
{
    let size = c.size();
    let parts = c.parts_mut();
    let delta = {
        let view = BitmapView::new(parts.storage, parts.values, size);
        ctx.engine().sum_batch(ntasks, |t| task(&view, t))
    };
    *parts.nvals = apply_delta(*parts.nvals, delta);

    tracing::trace!(phase, ntasks, delta, "traversal complete");
    ctx.diagnostics().emit(AssignEvent::PhaseCompleted {
        trace_id: ctx.trace_id(),
        phase,
        ntasks,
        nvals_delta: delta,
    });
}

/// Every position of `i × j`
pub(crate) fn ixj<T, E, F>(
    c: &mut Matrix<T>,
    ctx: &AssignContext<E>,
    i: &IndexList,
    j: &IndexList,
    phase: &'static str,
    f: F,
) where
    T: Element,
    E: ExecutionEngine,
    F: Fn(Slot<'_, '_, T>, Cell) -> i64 + Sync + Send,
{
    let (ni, nj) = (i.len(), j.len());
    if ni == 0 || nj == 0 {
        return;
    }
    let vlen = c.vlen();
    let slice = IxjSlice::new(ni, nj, ctx.ntasks(ni.saturating_mul(nj)));
    run_tasks(c, ctx, phase, slice.ntasks(), |view, t| {
        let task = slice.task(t);
        let mut delta = 0;
        for ja in task.j {
            let jc = j.get(ja);
            for ia in task.i.clone() {
                let ic = i.get(ia);
                let pc = ic + jc * vlen;
                // SAFETY: (ia, ja) belongs to this task alone and the lists hold no duplicates
                let slot = unsafe { view.slot(pc) };
                delta += f(slot, Cell { pc, ic, jc, ia, ja });
            }
        }
        delta
    });
}

/// Every position of the call's `I × J`
pub(crate) fn over_ixj<T, A, M, E, F>(
    c: &mut Matrix<T>,
    ops: &Operands<'_, T, A, M, E>,
    phase: &'static str,
    f: F,
) where
    T: Element,
    A: Element,
    M: Element,
    E: ExecutionEngine,
    F: Fn(Slot<'_, '_, T>, Cell) -> i64 + Sync + Send,
{
    ixj(c, ops.ctx, ops.i, ops.j, phase, f)
}

/// Every position of C, in storage order
pub(crate) fn over_c_whole<T, E, F>(c: &mut Matrix<T>, ctx: &AssignContext<E>, phase: &'static str, f: F)
where
    T: Element,
    E: ExecutionEngine,
    F: Fn(Slot<'_, '_, T>, Cell) -> i64 + Sync + Send,
{
    let n = c.size();
    if n == 0 {
        return;
    }
    let vlen = c.vlen();
    let ntasks = ctx.ntasks(n);
    run_tasks(c, ctx, phase, ntasks, |view, t| {
        let range = partition(n, ntasks, t);
        let (mut ic, mut jc) = (range.start % vlen, range.start / vlen);
        let mut delta = 0;
        for pc in range {
            // SAFETY: flat partitions are disjoint
            let slot = unsafe { view.slot(pc) };
            delta += f(
                slot,
                Cell {
                    pc,
                    ic,
                    jc,
                    ia: ic,
                    ja: jc,
                },
            );
            ic += 1;
            if ic == vlen {
                ic = 0;
                jc += 1;
            }
        }
        delta
    });
}

/// Positions along one row or column of C
///
/// With `along_vectors` the fixed index `at` is an index within each vector
/// and the line crosses every vector; otherwise `at` is a vector and the line
/// runs along it.
fn line<T, E, F>(
    c: &mut Matrix<T>,
    ctx: &AssignContext<E>,
    at: usize,
    along_vectors: bool,
    phase: &'static str,
    f: F,
) where
    T: Element,
    E: ExecutionEngine,
    F: Fn(Slot<'_, '_, T>, Cell) -> i64 + Sync + Send,
{
    let vlen = c.vlen();
    let n = if along_vectors { c.vdim() } else { vlen };
    if n == 0 {
        return;
    }
    let ntasks = ctx.ntasks(n);
    run_tasks(c, ctx, phase, ntasks, |view, t| {
        let mut delta = 0;
        for k in partition(n, ntasks, t) {
            let (ic, jc) = if along_vectors { (at, k) } else { (k, at) };
            let pc = ic + jc * vlen;
            // SAFETY: flat partitions of k are disjoint and k -> pc is injective
            let slot = unsafe { view.slot(pc) };
            delta += f(
                slot,
                Cell {
                    pc,
                    ic,
                    jc,
                    ia: 0,
                    ja: 0,
                },
            );
        }
        delta
    });
}

/// The replace region: row `I[0]`, column `J[0]`, all of C, or `I × J`
pub(crate) fn over_region<T, A, M, E, F>(
    c: &mut Matrix<T>,
    ops: &Operands<'_, T, A, M, E>,
    phase: &'static str,
    f: F,
) where
    T: Element,
    A: Element,
    M: Element,
    E: ExecutionEngine,
    F: Fn(Slot<'_, '_, T>, Cell) -> i64 + Sync + Send,
{
    match ops.kind {
        AssignKind::Row => line(c, ops.ctx, ops.i.get(0), true, phase, f),
        AssignKind::Col => line(c, ops.ctx, ops.j.get(0), false, phase, f),
        AssignKind::Assign => over_c_whole(c, ops.ctx, phase, f),
        AssignKind::Subassign => over_ixj(c, ops, phase, f),
    }
}

/// Every entry of A, mapped to `C(I[ia], J[ja])`, with its value cast to `T`
///
/// # Panics
/// If the input is a scalar
pub(crate) fn over_a<T, A, M, E, F>(
    c: &mut Matrix<T>,
    ops: &Operands<'_, T, A, M, E>,
    phase: &'static str,
    f: F,
) where
    T: Element,
    A: Element + CastTo<T>,
    M: Element,
    E: ExecutionEngine,
    F: Fn(Slot<'_, '_, T>, Cell, T) -> i64 + Sync + Send,
{
    let Source::Matrix { a, slice } = &ops.source else {
        panic!("over_a called with a scalar input");
    };
    let (i, j, vlen) = (ops.i, ops.j, ops.vlen);
    let ax = a.values();

    match (a.sparse_parts(), slice) {
        (Some(parts), Some(slice)) => {
            run_tasks(c, ops.ctx, phase, slice.ntasks(), |view, t| {
                let mut delta = 0;
                for (ja, slots) in slice.vectors(t, parts) {
                    let jc = j.get(ja);
                    for s in slots {
                        let ia = parts.i[s];
                        let ic = i.get(ia);
                        let pc = ic + jc * vlen;
                        // SAFETY: A's entries are unique and I, J hold no duplicates
                        let slot = unsafe { view.slot(pc) };
                        delta += f(slot, Cell { pc, ic, jc, ia, ja }, ax.get(s).cast_to());
                    }
                }
                delta
            });
        }
        _ => {
            let (avlen, avdim) = (a.vlen(), a.vdim());
            if avlen == 0 || avdim == 0 {
                return;
            }
            let ab = a.presence();
            let tasks = IxjSlice::new(avlen, avdim, ops.ctx.ntasks(a.size()));
            run_tasks(c, ops.ctx, phase, tasks.ntasks(), |view, t| {
                let task = tasks.task(t);
                let mut delta = 0;
                for ja in task.j {
                    let jc = j.get(ja);
                    for ia in task.i.clone() {
                        let pa = ia + ja * avlen;
                        if let Some(ab) = ab {
                            if ab[pa] == 0 {
                                continue;
                            }
                        }
                        let ic = i.get(ia);
                        let pc = ic + jc * vlen;
                        // SAFETY: (ia, ja) belongs to this task alone and I, J hold no duplicates
                        let slot = unsafe { view.slot(pc) };
                        delta += f(slot, Cell { pc, ic, jc, ia, ja }, ax.get(pa).cast_to());
                    }
                }
                delta
            });
        }
    }
}

/// Every entry of an A the same shape as C
///
/// A bitmap or full A is walked in storage order, where A's position equals
/// C's; a sparse A falls back to [`over_a`] with identity index lists.
pub(crate) fn over_a_whole<T, A, M, E, F>(
    c: &mut Matrix<T>,
    ops: &Operands<'_, T, A, M, E>,
    phase: &'static str,
    f: F,
) where
    T: Element,
    A: Element + CastTo<T>,
    M: Element,
    E: ExecutionEngine,
    F: Fn(Slot<'_, '_, T>, Cell, T) -> i64 + Sync + Send,
{
    let Source::Matrix { a, .. } = &ops.source else {
        panic!("over_a_whole called with a scalar input");
    };
    if a.format().is_sparse_like() {
        return over_a(c, ops, phase, f);
    }
    debug_assert_eq!(a.size(), c.size());
    let ab = a.presence();
    let ax = a.values();
    over_c_whole(c, ops.ctx, phase, |slot, cell| match ab {
        Some(ab) if ab[cell.pc] == 0 => 0,
        _ => f(slot, cell, ax.get(cell.pc).cast_to()),
    });
}

/// Every true entry of the mask (before any complement), mapped into C
///
/// The cell's `ia`/`ja` hold the mask coordinates of the entry.
pub(crate) fn over_mask<T, A, M, E, F>(
    c: &mut Matrix<T>,
    ops: &Operands<'_, T, A, M, E>,
    phase: &'static str,
    f: F,
) where
    T: Element,
    A: Element,
    M: Element,
    E: ExecutionEngine,
    F: Fn(Slot<'_, '_, T>, Cell) -> i64 + Sync + Send,
{
    let mask = ops.mask();
    let m = mask.matrix();
    let (i, j, vlen) = (ops.i, ops.j, ops.vlen);

    match (m.sparse_parts(), &mask.slice) {
        (Some(parts), Some(slice)) => {
            run_tasks(c, ops.ctx, phase, slice.ntasks(), |view, t| {
                let mut delta = 0;
                for (jm, slots) in slice.vectors(t, parts) {
                    for s in slots {
                        if !mask.entry_is_true(s) {
                            continue;
                        }
                        let im = parts.i[s];
                        let (ic, jc) = mask.target(im, jm, i, j);
                        let pc = ic + jc * vlen;
                        // SAFETY: mask entries are unique and map injectively into C
                        let slot = unsafe { view.slot(pc) };
                        delta += f(
                            slot,
                            Cell {
                                pc,
                                ic,
                                jc,
                                ia: im,
                                ja: jm,
                            },
                        );
                    }
                }
                delta
            });
        }
        _ => {
            let (mvlen, mvdim) = (m.vlen(), m.vdim());
            if mvlen == 0 || mvdim == 0 {
                return;
            }
            let mb = m.presence();
            let tasks = IxjSlice::new(mvlen, mvdim, ops.ctx.ntasks(m.size()));
            run_tasks(c, ops.ctx, phase, tasks.ntasks(), |view, t| {
                let task = tasks.task(t);
                let mut delta = 0;
                for jm in task.j {
                    for im in task.i.clone() {
                        let pm = im + jm * mvlen;
                        let present = mb.map_or(true, |mb| mb[pm] != 0);
                        if !present || !mask.entry_is_true(pm) {
                            continue;
                        }
                        let (ic, jc) = mask.target(im, jm, i, j);
                        let pc = ic + jc * vlen;
                        // SAFETY: (im, jm) belongs to this task alone and maps injectively into C
                        let slot = unsafe { view.slot(pc) };
                        delta += f(
                            slot,
                            Cell {
                                pc,
                                ic,
                                jc,
                                ia: im,
                                ja: jm,
                            },
                        );
                    }
                }
                delta
            });
        }
    }
}

/// Every true entry of a mask with C's shape
///
/// Mask positions are target positions: a sparse mask is walked by its
/// entries, a bitmap or full mask in C's storage order.
pub(crate) fn over_mask_whole<T, A, M, E, F>(
    c: &mut Matrix<T>,
    ops: &Operands<'_, T, A, M, E>,
    phase: &'static str,
    f: F,
) where
    T: Element,
    A: Element,
    M: Element,
    E: ExecutionEngine,
    F: Fn(Slot<'_, '_, T>, Cell) -> i64 + Sync + Send,
{
    let mask = ops.mask();
    let m = mask.matrix();
    debug_assert_eq!(m.size(), c.size());
    let vlen = ops.vlen;

    match (m.sparse_parts(), &mask.slice) {
        (Some(parts), Some(slice)) => {
            run_tasks(c, ops.ctx, phase, slice.ntasks(), |view, t| {
                let mut delta = 0;
                for (jc, slots) in slice.vectors(t, parts) {
                    for s in slots {
                        if !mask.entry_is_true(s) {
                            continue;
                        }
                        let ic = parts.i[s];
                        let pc = ic + jc * vlen;
                        // SAFETY: mask entries are unique and the mask has C's shape
                        let slot = unsafe { view.slot(pc) };
                        delta += f(
                            slot,
                            Cell {
                                pc,
                                ic,
                                jc,
                                ia: ic,
                                ja: jc,
                            },
                        );
                    }
                }
                delta
            });
        }
        _ => {
            let mb = m.presence();
            over_c_whole(c, ops.ctx, phase, |slot, cell| {
                let present = mb.map_or(true, |mb| mb[cell.pc] != 0);
                if present && mask.entry_is_true(cell.pc) {
                    f(slot, cell)
                } else {
                    0
                }
            });
        }
    }
}
