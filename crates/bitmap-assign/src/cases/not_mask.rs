//! `C<!M>(I,J) = A` and `C<!M>(I,J) += A` with a sparse or hypersparse mask
//!
//! After the `+2` scatter the marked positions are the ones the complemented
//! mask rejects; everything in `I × J` still at 0 or 1 is selected.

use super::{clear_unselected, settle_assigned, supply, unexpected};
use crate::prepare::{plan, Preparation};
use crate::presence::{Presence, Slot};
use crate::request::{AssignContext, AssignRequest};
use crate::scatter::{scatter, scatter_whole, ScatterOp};
use crate::templates::{over_a, over_a_whole, over_c_whole, over_ixj};
use bitmap_core::{BinaryOp, CastTo, Element, ExecutionEngine, Matrix, Result};

/// Collapse a rejected position once the whole matrix has been assigned
#[inline(always)]
fn settle_rejected<T: Copy>(s: Slot<'_, '_, T>, replace: bool) -> i64 {
    match s.state() {
        Presence::AbsentMasked => {
            s.set(Presence::Absent);
            0
        }
        Presence::PresentMasked if replace => {
            s.set(Presence::Absent);
            -1
        }
        Presence::PresentMasked => {
            s.set(Presence::Present);
            0
        }
        state => unexpected(state),
    }
}

/// `C<!M>(I,J) = A` or `C<!M>(I,J) = scalar`
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
    let mark = ScatterOp::mark_for(c);
    scatter(c, &ops, mark);

    if ops.source.is_dense() {
        supply(c, &ops, "assign_unmasked", |s, _, z| match s.state() {
            Presence::Absent => {
                s.write(z);
                s.set(Presence::Present);
                1
            }
            Presence::Present => {
                s.write(z);
                0
            }
            Presence::AbsentMasked | Presence::PresentMasked => 0,
            state => unexpected(state),
        });
    } else {
        over_a(c, &ops, "assign_unmasked", |s, _, z| match s.state() {
            Presence::Absent => {
                s.write(z);
                s.set(Presence::Assigned);
                1
            }
            Presence::Present => {
                s.write(z);
                s.set(Presence::Assigned);
                0
            }
            Presence::AbsentMasked | Presence::PresentMasked => 0,
            state => unexpected(state),
        });
        over_ixj(c, &ops, "delete_unassigned", settle_assigned);
    }

    clear_unselected(c, &ops);
    Ok(())
}

/// `C<!M>(I,J) += A` or `C<!M>(I,J) += scalar`
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
    let mark = ScatterOp::mark_for(c);
    scatter(c, &ops, mark);
    supply(c, &ops, "accumulate_unmasked", |s, _, z| match s.state() {
        Presence::Absent => {
            s.write(z);
            s.set(Presence::Present);
            1
        }
        Presence::Present => {
            s.accumulate(op, z);
            0
        }
        Presence::AbsentMasked | Presence::PresentMasked => 0,
        state => unexpected(state),
    });
    clear_unselected(c, &ops);
    Ok(())
}

/// `C<!M> = A` or `C<!M> = scalar` over the whole matrix
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
    let replace = ops.replace;
    let mark = ScatterOp::mark_for(c);
    scatter_whole(c, &ops, mark);

    match ops.scalar() {
        Some(z) => {
            over_c_whole(c, ops.ctx, "assign_unmasked", |s, _| match s.state() {
                Presence::Absent => {
                    s.write(z);
                    s.set(Presence::Present);
                    1
                }
                Presence::Present => {
                    s.write(z);
                    0
                }
                _ => settle_rejected(s, replace),
            });
        }
        None => {
            over_a_whole(c, &ops, "assign_unmasked", |s, _, z| match s.state() {
                Presence::Absent => {
                    s.write(z);
                    s.set(Presence::Assigned);
                    1
                }
                Presence::Present => {
                    s.write(z);
                    s.set(Presence::Assigned);
                    0
                }
                Presence::AbsentMasked | Presence::PresentMasked => 0,
                state => unexpected(state),
            });
            over_c_whole(c, ops.ctx, "collapse", |s, cell| match s.state() {
                Presence::Absent | Presence::Present | Presence::Assigned => settle_assigned(s, cell),
                _ => settle_rejected(s, replace),
            });
        }
    }
    Ok(())
}

/// `C<!M> += A` or `C<!M> += scalar` over the whole matrix
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
    let replace = ops.replace;
    let mark = ScatterOp::mark_for(c);
    scatter_whole(c, &ops, mark);

    match ops.scalar() {
        Some(z) => {
            over_c_whole(c, ops.ctx, "accumulate_unmasked", |s, _| match s.state() {
                Presence::Absent => {
                    s.write(z);
                    s.set(Presence::Present);
                    1
                }
                Presence::Present => {
                    s.accumulate(op, z);
                    0
                }
                _ => settle_rejected(s, replace),
            });
        }
        None => {
            over_a_whole(c, &ops, "accumulate_unmasked", |s, _, z| match s.state() {
                Presence::Absent => {
                    s.write(z);
                    s.set(Presence::Present);
                    1
                }
                Presence::Present => {
                    s.accumulate(op, z);
                    0
                }
                Presence::AbsentMasked | Presence::PresentMasked => 0,
                state => unexpected(state),
            });
            clear_unselected(c, &ops);
        }
    }
    Ok(())
}
