//! `C(I,J) = A` and `C(I,J) += A` without a mask
//!
//! Every position of `I × J` is selected, so `C_replace` has no effect.

use super::{settle_assigned, supply, unexpected};
use crate::prepare::{plan, Preparation, Source};
use crate::presence::Presence;
use crate::request::{AssignContext, AssignRequest};
use crate::templates::{over_a, over_a_whole, over_c_whole, over_ixj};
use bitmap_core::{
    AssignEvent, BinaryOp, CastTo, Element, ExecutionEngine, Format, Matrix, Result, Storage,
    Values,
};

/// `C(I,J) = A` or `C(I,J) = scalar`
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

    if let Some(z) = ops.scalar() {
        over_ixj(c, &ops, "assign_scalar", |s, _| {
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
    } else if ops.source.is_dense() {
        over_a(c, &ops, "assign_full", |s, _, z| {
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
    } else {
        over_a(c, &ops, "assign_entries", |s, _, z| {
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
        over_ixj(c, &ops, "delete_unassigned", settle_assigned);
    }
    Ok(())
}

/// `C(I,J) += A` or `C(I,J) += scalar`
///
/// Entries of C that A does not supply are kept, so a full C stays full.
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
    let ops = plan(c, req, ctx, Preparation::Values)?;
    supply(c, &ops, "accumulate", |s, _, z| match s.state() {
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
    Ok(())
}

/// `C = A` or `C = scalar` over the whole matrix
///
/// C is rebuilt from the input: a scalar or full A makes C full, a bitmap A
/// is copied, a sparse A is scattered into a cleared C.
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
    let ops = plan(c, req, ctx, Preparation::Untouched)?;
    debug_assert!(ops.is_whole());
    let before = c.format();
    let iso: Option<T> = req.input().iso_value().map(|v| v.cast_to());

    match (&ops.source, iso) {
        (Source::Scalar(z), _) => c.set_full(Values::Iso(*z)),
        (Source::Matrix { a, .. }, Some(z)) if a.format() == Format::Full => {
            c.set_full(Values::Iso(z))
        }
        (Source::Matrix { a, .. }, iso) => {
            let a = *a;
            let n = c.size();
            let full = a.format() == Format::Full;

            // allocate whatever C lacks before touching it
            let presence = match (full, c.format()) {
                (false, Format::Full) => Some(ops.ws.try_filled(n, 0u8, "bitmap presence")?),
                _ => None,
            };
            let values = match (iso, c.values()) {
                (Some(z), _) => Some(Values::Iso(z)),
                (None, Values::Iso(_)) => {
                    Some(Values::Array(ops.ws.try_filled(n, T::default(), "value array")?))
                }
                (None, Values::Array(_)) => None,
            };
            let parts = c.parts_mut();
            if let Some(b) = presence {
                *parts.storage = Storage::Bitmap { b };
                *parts.nvals = 0;
            }
            if let Some(values) = values {
                *parts.values = values;
            }

            match a.presence() {
                _ if full => {
                    over_a_whole(c, &ops, "copy_full", |s, _, z| {
                        s.write(z);
                        0
                    });
                    let parts = c.parts_mut();
                    *parts.storage = Storage::Full;
                    *parts.nvals = n;
                }
                Some(ab) => {
                    let ax = a.values();
                    over_c_whole(c, ops.ctx, "copy_bitmap", |s, cell| {
                        let had = i64::from(s.state().had_entry());
                        if ab[cell.pc] != 0 {
                            s.write(ax.get(cell.pc).cast_to());
                            s.set(Presence::Present);
                            1 - had
                        } else {
                            s.set(Presence::Absent);
                            -had
                        }
                    });
                }
                None => {
                    over_c_whole(c, ops.ctx, "clear", |s, _| match s.state() {
                        Presence::Present => {
                            s.set(Presence::Absent);
                            -1
                        }
                        Presence::Absent => 0,
                        state => unexpected(state),
                    });
                    over_a_whole(c, &ops, "scatter_entries", |s, _, z| {
                        s.write(z);
                        s.set(Presence::Present);
                        1
                    });
                }
            }
        }
    }

    if c.format() != before {
        ops.emit(AssignEvent::Converted {
            trace_id: ctx.trace_id(),
            from: before,
            to: c.format(),
        });
    }
    Ok(())
}

/// `C += A` or `C += scalar` over the whole matrix
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
    if req.accum().is_none() {
        return noaccum_whole(c, req, ctx);
    }
    // the subset routine already walks all of C when the call is whole
    accum(c, req, ctx)
}
