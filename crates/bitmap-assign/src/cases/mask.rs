//! `C<M>(I,J) = A` and `C<M>(I,J) += A` with a sparse or hypersparse mask
//!
//! The mask is scattered into C's presence bytes first (`+2`), so during the
//! assignment a byte of 2 or 3 marks a selected position. The routines never
//! look at the mask's values again after the scatter.

use super::{collapse_hits, settle_assigned_hits, supply, unexpected};
use crate::prepare::{plan, Preparation};
use crate::presence::{Presence, Slot};
use crate::request::{AssignContext, AssignKind, AssignRequest};
use crate::scatter::{scatter, scatter_whole, ScatterOp};
use crate::templates::{over_a, over_a_whole, over_c_whole, over_ixj, over_mask, over_mask_whole};
use bitmap_core::{BinaryOp, CastTo, Element, ExecutionEngine, Matrix, Result};

/// `C<M>(I,J) = A` or `C<M>(I,J) = scalar`
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
        supply(c, &ops, "assign_masked", |s, _, z| match s.state() {
            Presence::AbsentMasked => {
                s.write(z);
                s.set(Presence::PresentMasked);
                1
            }
            Presence::PresentMasked => {
                s.write(z);
                0
            }
            Presence::Absent | Presence::Present => 0,
            state => unexpected(state),
        });
    } else {
        over_a(c, &ops, "assign_masked", |s, _, z| match s.state() {
            Presence::AbsentMasked => {
                s.write(z);
                s.set(Presence::Assigned);
                1
            }
            Presence::PresentMasked => {
                s.write(z);
                s.set(Presence::Assigned);
                0
            }
            Presence::Absent | Presence::Present => 0,
            state => unexpected(state),
        });
        // a subassign mask lives inside I × J, so its entries are the smaller walk
        let replace = ops.replace;
        if ops.kind == AssignKind::Subassign {
            over_mask(c, &ops, "delete_masked", |s, _| settle_assigned_hits(s, replace));
        } else {
            over_ixj(c, &ops, "delete_masked", |s, _| settle_assigned_hits(s, replace));
        }
    }

    collapse_hits(c, &ops);
    Ok(())
}

/// `C<M>(I,J) += A` or `C<M>(I,J) += scalar`
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
    supply(c, &ops, "accumulate_masked", |s, _, z| match s.state() {
        Presence::AbsentMasked => {
            s.write(z);
            s.set(Presence::PresentMasked);
            1
        }
        Presence::PresentMasked => {
            s.accumulate(op, z);
            0
        }
        Presence::Absent | Presence::Present => 0,
        state => unexpected(state),
    });
    collapse_hits(c, &ops);
    Ok(())
}

/// `C<M> = A` or `C<M> = scalar` over the whole matrix
///
/// A scalar without `C_replace` only touches the mask's entries and needs no
/// scatter at all.
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

    match ops.scalar() {
        Some(z) if !ops.replace => {
            over_mask_whole(c, &ops, "assign_mask_entries", |s, _| {
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
        }
        Some(z) => {
            let mark = ScatterOp::mark_for(c);
            scatter_whole(c, &ops, mark);
            over_c_whole(c, ops.ctx, "assign_replace", |s, _| match s.state() {
                Presence::Absent => 0,
                Presence::Present => {
                    s.set(Presence::Absent);
                    -1
                }
                Presence::AbsentMasked => {
                    s.write(z);
                    s.set(Presence::Present);
                    1
                }
                Presence::PresentMasked => {
                    s.write(z);
                    s.set(Presence::Present);
                    0
                }
                state => unexpected(state),
            });
        }
        None => {
            let mark = ScatterOp::mark_for(c);
            scatter_whole(c, &ops, mark);
            over_a_whole(c, &ops, "assign_masked", |s, _, z| match s.state() {
                Presence::AbsentMasked => {
                    s.write(z);
                    s.set(Presence::Assigned);
                    1
                }
                Presence::PresentMasked => {
                    s.write(z);
                    s.set(Presence::Assigned);
                    0
                }
                Presence::Absent | Presence::Present => 0,
                state => unexpected(state),
            });
            if ops.replace {
                over_c_whole(c, ops.ctx, "collapse_replace", |s, _| settle_whole(s, true));
            } else {
                over_mask_whole(c, &ops, "collapse_masked", |s, _| settle_whole(s, false));
            }
        }
    }
    Ok(())
}

/// Collapse after a whole-matrix overwrite through a scattered mask
///
/// Assigned positions keep their new entry, hits the input skipped lose
/// theirs, and with `replace` every unselected entry goes too.
fn settle_whole<T: Copy>(s: Slot<'_, '_, T>, replace: bool) -> i64 {
    match s.state() {
        Presence::Assigned => {
            s.set(Presence::Present);
            0
        }
        Presence::PresentMasked => {
            s.set(Presence::Absent);
            -1
        }
        Presence::AbsentMasked => {
            s.set(Presence::Absent);
            0
        }
        Presence::Present if replace => {
            s.set(Presence::Absent);
            -1
        }
        Presence::Absent | Presence::Present => 0,
    }
}

/// `C<M> += A` or `C<M> += scalar` over the whole matrix
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

    match ops.scalar() {
        Some(z) if !ops.replace => {
            over_mask_whole(c, &ops, "accumulate_mask_entries", |s, _| match s.state() {
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
            });
        }
        Some(z) => {
            let mark = ScatterOp::mark_for(c);
            scatter_whole(c, &ops, mark);
            over_c_whole(c, ops.ctx, "accumulate_replace", |s, _| match s.state() {
                Presence::Absent => 0,
                Presence::Present => {
                    s.set(Presence::Absent);
                    -1
                }
                Presence::AbsentMasked => {
                    s.write(z);
                    s.set(Presence::Present);
                    1
                }
                Presence::PresentMasked => {
                    s.accumulate(op, z);
                    s.set(Presence::Present);
                    0
                }
                state => unexpected(state),
            });
        }
        None => {
            let mark = ScatterOp::mark_for(c);
            scatter_whole(c, &ops, mark);
            over_a_whole(c, &ops, "accumulate_masked", |s, _, z| match s.state() {
                Presence::AbsentMasked => {
                    s.write(z);
                    s.set(Presence::PresentMasked);
                    1
                }
                Presence::PresentMasked => {
                    s.accumulate(op, z);
                    0
                }
                Presence::Absent | Presence::Present => 0,
                state => unexpected(state),
            });
            collapse_hits(c, &ops);
        }
    }
    Ok(())
}
