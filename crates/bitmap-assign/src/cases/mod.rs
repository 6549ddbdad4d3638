//! The sixteen case routines
//!
//! `{no mask, mask, complemented mask, dense mask} × {overwrite, accumulate}
//! × {index subset, whole matrix}`. Every routine is a short pipeline of the
//! shared phases below: an optional mask scatter, a pass over the positions
//! the input supplies, an optional deletion pass, and a final collapse of
//! every transient presence byte back to 0 or 1.
//!
//! Semantics, for each position `p` of the replace region `R` (row `I[0]`,
//! column `J[0]`, all of C, or `I × J` by kind), with `s(p)` the possibly
//! complemented mask:
//!
//! - `p ∈ I × J` and `s(p)`: the input's value is written (or accumulated);
//!   if the input has no entry at `p` the entry is deleted without an
//!   accumulator and kept with one
//! - otherwise: the entry is kept, or deleted when `C_replace` is set and
//!   `s(p)` is false

pub mod dense_mask;
pub mod mask;
pub mod no_mask;
pub mod not_mask;

use crate::mask::Cell;
use crate::prepare::{plan, Operands, Preparation, Source};
use crate::presence::{Presence, Slot};
use crate::request::{AssignContext, AssignRequest};
use crate::scatter::{scatter, ScatterOp};
use crate::templates::{over_a, over_a_whole, over_c_whole, over_ixj, over_mask, over_region};
use bitmap_core::{CastTo, Element, ExecutionEngine, Matrix, Result};

/// A presence state no correct pipeline can reach at this point
#[cold]
#[inline(never)]
pub(crate) fn unexpected(state: Presence) -> i64 {
    unreachable!("presence state {state:?} cannot occur in this phase")
}

/// Every position the input supplies a value for
///
/// A scalar supplies all of `I × J` (all of C when whole); a matrix supplies
/// its entries.
pub(crate) fn supply<T, A, M, E, F>(
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
    match (&ops.source, ops.whole) {
        (Source::Scalar(z), true) => {
            let z = *z;
            over_c_whole(c, ops.ctx, phase, |s, cell| f(s, cell, z))
        }
        (Source::Scalar(z), false) => {
            let z = *z;
            over_ixj(c, ops, phase, |s, cell| f(s, cell, z))
        }
        (Source::Matrix { .. }, true) => over_a_whole(c, ops, phase, f),
        (Source::Matrix { .. }, false) => over_a(c, ops, phase, f),
    }
}

/// Final collapse after a `+2` scatter of a mask that selects its hits
///
/// With `C_replace` the region keeps exactly its mask-hit entries; otherwise
/// every hit is stripped back to its entry bit, whether or not an earlier
/// phase already settled it.
pub(crate) fn collapse_hits<T, A, M, E>(c: &mut Matrix<T>, ops: &Operands<'_, T, A, M, E>)
where
    T: Element,
    A: Element,
    M: Element,
    E: ExecutionEngine,
{
    if ops.replace {
        over_region(c, ops, "replace_unselected", |s, _| match s.state() {
            Presence::PresentMasked => {
                s.set(Presence::Present);
                0
            }
            Presence::Present => {
                s.set(Presence::Absent);
                -1
            }
            Presence::AbsentMasked => {
                s.set(Presence::Absent);
                0
            }
            Presence::Absent => 0,
            state => unexpected(state),
        });
    } else {
        scatter(c, ops, ScatterOp::Mod2);
    }
}

/// Final collapse after a `+2` scatter of a complemented mask
///
/// The hits are exactly the unselected positions: with `C_replace` their
/// entries are deleted, otherwise the scatter is undone.
pub(crate) fn clear_unselected<T, A, M, E>(c: &mut Matrix<T>, ops: &Operands<'_, T, A, M, E>)
where
    T: Element,
    A: Element,
    M: Element,
    E: ExecutionEngine,
{
    if ops.replace {
        over_mask(c, ops, "replace_unselected", |s, _| match s.state() {
            Presence::PresentMasked => {
                s.set(Presence::Absent);
                -1
            }
            Presence::AbsentMasked => {
                s.set(Presence::Absent);
                0
            }
            state => unexpected(state),
        });
    } else {
        scatter(c, ops, ScatterOp::Minus2);
    }
}

/// Settle `Assigned` and delete hits the input skipped
///
/// Used by the overwrite routines for a selecting sparse mask once the
/// input's entries have been written. An assigned position stays a mask hit
/// for the `C_replace` sweep and becomes a plain entry otherwise.
pub(crate) fn settle_assigned_hits<T: Copy>(s: Slot<'_, '_, T>, replace: bool) -> i64 {
    match s.state() {
        Presence::Assigned if replace => {
            s.set(Presence::PresentMasked);
            0
        }
        Presence::Assigned => {
            s.set(Presence::Present);
            0
        }
        Presence::PresentMasked => {
            s.set(Presence::AbsentMasked);
            -1
        }
        Presence::AbsentMasked | Presence::Absent | Presence::Present => 0,
    }
}

/// Turn `Assigned` back into an entry and delete selected entries the input skipped
///
/// Used by the overwrite routines without a selecting mask: every byte of 1
/// left in `I × J` was selected but not supplied.
pub(crate) fn settle_assigned<T: Copy>(s: Slot<'_, '_, T>, _: Cell) -> i64 {
    match s.state() {
        Presence::Assigned => {
            s.set(Presence::Present);
            0
        }
        Presence::Present => {
            s.set(Presence::Absent);
            -1
        }
        Presence::Absent | Presence::AbsentMasked | Presence::PresentMasked => 0,
    }
}

/// `C<!>(I,J) = …` with no mask matrix: nothing is selected
///
/// With `C_replace` the whole replace region is cleared; otherwise C is left
/// as it is.
pub(crate) fn clear_region<T, A, M, Op, E>(
    c: &mut Matrix<T>,
    req: &AssignRequest<'_, A, M, Op>,
    ctx: &AssignContext<E>,
) -> Result<()>
where
    T: Element,
    A: Element + CastTo<T>,
    M: Element,
    E: ExecutionEngine,
{
    if !req.is_replace() {
        return Ok(());
    }
    let ops = plan(c, req, ctx, Preparation::PresenceOnly)?;
    over_region(c, &ops, "clear_region", |s, _| match s.state() {
        Presence::Present => {
            s.set(Presence::Absent);
            -1
        }
        Presence::Absent => 0,
        state => unexpected(state),
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{AssignKind, Input};
    use bitmap_core::{Format, IndexList};

    #[test]
    fn test_clear_region_by_kind() {
        let full = Matrix::full_from_fn(3, 3, true, |r, c| (r * 3 + c) as i32);
        let ctx = AssignContext::sequential();

        let mut c = full.clone();
        let req = AssignRequest::row(1, IndexList::single(0), Input::Scalar(0i32)).replace();
        clear_region(&mut c, &req, &ctx).unwrap();
        assert_eq!(c.nvals(), 6);
        assert_eq!(c.get(1, 2), None);
        assert_eq!(c.get(0, 2), Some(2));

        let mut c = full.clone();
        let req = AssignRequest::new(IndexList::range(0, 1), IndexList::single(2), Input::Scalar(0i32))
            .kind(AssignKind::Subassign)
            .replace();
        clear_region(&mut c, &req, &ctx).unwrap();
        assert_eq!(c.nvals(), 7);
        assert_eq!(c.get(2, 2), Some(8));

        let mut c = full.clone();
        let req = AssignRequest::new(IndexList::single(0), IndexList::single(0), Input::Scalar(0i32));
        clear_region(&mut c, &req, &ctx).unwrap();
        assert_eq!(c, full);
        assert_eq!(c.format(), Format::Full);
    }
}
