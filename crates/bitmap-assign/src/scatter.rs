//! Mask scatter
//!
//! Folds a sparse mask into the target's presence bytes in `O(nnz(M))`:
//! after a `+2` scatter a byte of 2 or 3 means "the mask hits here" and 0 or
//! 1 means it does not, while the low bit still says whether C had an entry.
//! Only presence bytes change; values are never touched.

use crate::prepare::Operands;
use crate::presence::{Presence, Slot};
use crate::request::AssignKind;
use crate::templates::{over_mask, over_mask_whole};
use bitmap_core::{Element, ExecutionEngine, Matrix};

/// Update applied to the presence byte of every mask hit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScatterOp {
    /// Mark a hit: 0 → 2, 1 → 3
    Plus2,
    /// Remove the mark: 2 → 0, 3 → 1
    Minus2,
    /// Mark a hit on a position known to hold no entry
    Set2,
    /// Strip any transient state back to the entry bit
    Mod2,
}

impl ScatterOp {
    pub fn apply(self, state: Presence) -> Presence {
        use Presence::*;
        match (self, state) {
            (Self::Plus2, Absent) => AbsentMasked,
            (Self::Plus2, Present) => PresentMasked,
            (Self::Minus2, AbsentMasked) => Absent,
            (Self::Minus2, PresentMasked) => Present,
            (Self::Set2, _) => AbsentMasked,
            (Self::Mod2, Absent | AbsentMasked | Assigned) => Absent,
            (Self::Mod2, Present | PresentMasked) => Present,
            (Self::Plus2, AbsentMasked | PresentMasked | Assigned)
            | (Self::Minus2, Absent | Present | Assigned) => {
                unreachable!("{self:?} applied to {state:?}")
            }
        }
    }

    /// The marking scatter for target `c`: `Set2` when C holds no entry, so
    /// no byte needs reading, `Plus2` otherwise
    pub fn mark_for<T: Element>(c: &Matrix<T>) -> Self {
        if c.nvals() == 0 {
            Self::Set2
        } else {
            Self::Plus2
        }
    }

    fn phase(self) -> &'static str {
        match self {
            Self::Plus2 => "scatter_plus_2",
            Self::Minus2 => "scatter_minus_2",
            Self::Set2 => "scatter_set_2",
            Self::Mod2 => "scatter_mod_2",
        }
    }
}

/// Apply `op` at every true mask entry of the call
///
/// For `Assign` the mask spans all of C; for `Row` and `Col` it spans the
/// row or column; for `Subassign` its entries map through `I × J`. `Set2`
/// loses the entry bit, so the caller accounts for `nvals` itself; the
/// other operations never change it.
pub(crate) fn scatter<T, A, M, E>(c: &mut Matrix<T>, ops: &Operands<'_, T, A, M, E>, op: ScatterOp)
where
    T: Element,
    A: Element,
    M: Element,
    E: ExecutionEngine,
{
    if ops.kind == AssignKind::Assign {
        return scatter_whole(c, ops, op);
    }
    over_mask(c, ops, op.phase(), |slot, _| update(slot, op));
}

/// [`scatter`] for a mask with C's shape
///
/// Every mask entry lands at its own position in C, so the walk reads the
/// mask's pattern directly and never resolves an index list.
pub(crate) fn scatter_whole<T, A, M, E>(c: &mut Matrix<T>, ops: &Operands<'_, T, A, M, E>, op: ScatterOp)
where
    T: Element,
    A: Element,
    M: Element,
    E: ExecutionEngine,
{
    debug_assert_eq!(ops.kind, AssignKind::Assign);
    over_mask_whole(c, ops, op.phase(), |slot, _| update(slot, op));
}

#[inline(always)]
fn update<T: Copy>(slot: Slot<'_, '_, T>, op: ScatterOp) -> i64 {
    match op {
        ScatterOp::Set2 => slot.set(Presence::AbsentMasked),
        _ => slot.set(op.apply(slot.state())),
    }
    0
}
