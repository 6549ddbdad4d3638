//! Assignment through a bitmap or full mask, complemented or not
//!
//! The mask is read in place with [`MaskRef::mij`](crate::mask::MaskRef::mij),
//! so there is no scatter and no `2`/`3` presence bytes. `C_replace` is
//! handled by one extra pass over the replace region, or folded into the
//! assignment pass when that pass already visits every position of it.

use super::{supply, unexpected};
use crate::prepare::{plan, Operands, Preparation};
use crate::presence::{Presence, Slot};
use crate::request::{AssignContext, AssignKind, AssignRequest};
use crate::templates::{over_a, over_a_whole, over_c_whole, over_ixj, over_region};
use bitmap_core::{BinaryOp, CastTo, Element, ExecutionEngine, Matrix, Result};

#[inline(always)]
fn drop_if<T: Copy>(s: Slot<'_, '_, T>, replace: bool) -> i64 {
    match s.state() {
        Presence::Present if replace => {
            s.set(Presence::Absent);
            -1
        }
        Presence::Absent | Presence::Present => 0,
        state => unexpected(state),
    }
}

/// Delete every entry of the replace region the mask does not select
fn delete_unselected<T, A, M, E>(c: &mut Matrix<T>, ops: &Operands<'_, T, A, M, E>)
where
    T: Element,
    A: Element,
    M: Element,
    E: ExecutionEngine,
{
    let mask = ops.mask();
    over_region(c, ops, "replace_unselected", |s, cell| {
        drop_if(s, !mask.mij(cell))
    });
}

/// `C<M>(I,J) = A` or `C<M>(I,J) = scalar` with a bitmap or full mask
///
/// # Panics
/// If the request has no mask
pub(crate) fn noaccum<T, A, M, Op, E>(
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
    let ops = plan(c, req, ctx, Preparation::Bitmap)?;
    let mask = ops.mask();

    if ops.source.is_dense() {
        supply(c, &ops, "assign_selected", |s, cell, z| {
            if !mask.mij(cell) {
                return 0;
            }
            s.write(z);
            match s.state() {
                Presence::Absent => {
                    s.set(Presence::Present);
                    1
                }
                Presence::Present => 0,
                state => unexpected(state),
            }
        });
        if ops.replace {
            delete_unselected(c, &ops);
        }
        return Ok(());
    }

    over_a(c, &ops, "assign_selected", |s, cell, z| {
        if !mask.mij(cell) {
            return 0;
        }
        s.write(z);
        match s.state() {
            Presence::Absent => {
                s.set(Presence::Assigned);
                1
            }
            Presence::Present => {
                s.set(Presence::Assigned);
                0
            }
            state => unexpected(state),
        }
    });
    // for subassign I × J is the whole replace region
    let fused = ops.replace && ops.kind == AssignKind::Subassign;
    over_ixj(c, &ops, "delete_unassigned", |s, cell| match s.state() {
        Presence::Assigned => {
            s.set(Presence::Present);
            0
        }
        Presence::Present if fused || mask.mij(cell) => {
            s.set(Presence::Absent);
            -1
        }
        Presence::Absent | Presence::Present => 0,
        state => unexpected(state),
    });
    if ops.replace && !fused {
        delete_unselected(c, &ops);
    }
    Ok(())
}

/// `C<M>(I,J) += A` or `C<M>(I,J) += scalar` with a bitmap or full mask
///
/// # Panics
/// If the request has no mask
pub(crate) fn accum<T, A, M, Op, E>(
    c: &mut Matrix<T>,
    req: &AssignRequest<'_, A, M, Op>,
    ctx: &AssignContext<E>,
) -> Result<()>
where
    T: Element,
    A: Element + CastTo<T>,
    M: Element,
    Op: BinaryOp<T>,
    E: ExecutionEngine,
{
    let Some(op) = req.accum() else {
        return noaccum(c, req, ctx);
    };
    let ops = plan(c, req, ctx, Preparation::Bitmap)?;
    let mask = ops.mask();
    supply(c, &ops, "accumulate_selected", |s, cell, z| {
        if !mask.mij(cell) {
            return 0;
        }
        match s.state() {
            Presence::Absent => {
                s.write(z);
                s.set(Presence::Present);
                1
            }
            Presence::Present => {
                s.accumulate(op, z);
                0
            }
            state => unexpected(state),
        }
    });
    if ops.replace {
        delete_unselected(c, &ops);
    }
    Ok(())
}

/// `C<M> = A` or `C<M> = scalar` over the whole matrix with a bitmap or full mask
///
/// # Panics
/// If the request has no mask
pub(crate) fn noaccum_whole<T, A, M, Op, E>(
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
    let ops = plan(c, req, ctx, Preparation::Bitmap)?;
    debug_assert!(ops.is_whole());
    let mask = ops.mask();
    let replace = ops.replace;

    if ops.source.is_dense() {
        // the pass visits every position, so replace needs no second one
        supply(c, &ops, "assign_selected", |s, cell, z| {
            if !mask.mij(cell) {
                return drop_if(s, replace);
            }
            s.write(z);
            match s.state() {
                Presence::Absent => {
                    s.set(Presence::Present);
                    1
                }
                Presence::Present => 0,
                state => unexpected(state),
            }
        });
        return Ok(());
    }

    over_a_whole(c, &ops, "assign_selected", |s, cell, z| {
        if !mask.mij(cell) {
            return 0;
        }
        s.write(z);
        match s.state() {
            Presence::Absent => {
                s.set(Presence::Assigned);
                1
            }
            Presence::Present => {
                s.set(Presence::Assigned);
                0
            }
            state => unexpected(state),
        }
    });
    over_c_whole(c, ops.ctx, "collapse", |s, cell| match s.state() {
        Presence::Assigned => {
            s.set(Presence::Present);
            0
        }
        Presence::Present if replace || mask.mij(cell) => {
            s.set(Presence::Absent);
            -1
        }
        Presence::Absent | Presence::Present => 0,
        state => unexpected(state),
    });
    Ok(())
}

/// `C<M> += A` or `C<M> += scalar` over the whole matrix with a bitmap or full mask
///
/// # Panics
/// If the request has no mask
pub(crate) fn accum_whole<T, A, M, Op, E>(
    c: &mut Matrix<T>,
    req: &AssignRequest<'_, A, M, Op>,
    ctx: &AssignContext<E>,
) -> Result<()>
where
    T: Element,
    A: Element + CastTo<T>,
    M: Element,
    Op: BinaryOp<T>,
    E: ExecutionEngine,
{
    let Some(op) = req.accum() else {
        return noaccum_whole(c, req, ctx);
    };
    let ops = plan(c, req, ctx, Preparation::Bitmap)?;
    debug_assert!(ops.is_whole());
    let mask = ops.mask();
    let dense = ops.source.is_dense();
    let fused = ops.replace && dense;

    supply(c, &ops, "accumulate_selected", |s, cell, z| {
        if !mask.mij(cell) {
            return drop_if(s, fused);
        }
        match s.state() {
            Presence::Absent => {
                s.write(z);
                s.set(Presence::Present);
                1
            }
            Presence::Present => {
                s.accumulate(op, z);
                0
            }
            state => unexpected(state),
        }
    });
    if ops.replace && !dense {
        delete_unselected(c, &ops);
    }
    Ok(())
}
