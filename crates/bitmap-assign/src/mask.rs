//! Mask access
//!
//! A sparse or hypersparse mask is scattered into the target's presence
//! bytes. A bitmap or full mask is read in place: [`MaskRef::mij`] looks up
//! the mask entry that governs a target position. Which mask entry that is
//! depends on the assignment kind:
//!
//! | kind | mask shape | mask position of C cell |
//! |------|-----------|--------------------------|
//! | Row | `1 × vdim` | `jc` |
//! | Col | `vlen × 1` | `ic` |
//! | Assign | `vlen × vdim` | `pc` |
//! | Subassign | `nI × nJ` | `ia + ja * nI` |

use crate::request::AssignKind;
use bitmap_core::{Element, EkSlice, IndexList, Matrix};

/// Coordinates of one target position visited by a traversal
///
/// `ic`/`jc` are the index within the vector and the vector of C; `ia`/`ja`
/// are the local coordinates in `I × J` (or, for mask traversals, in the
/// mask). Region traversals outside `I × J` leave `ia`/`ja` at zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub pc: usize,
    pub ic: usize,
    pub jc: usize,
    pub ia: usize,
    pub ja: usize,
}

/// A mask as seen by one planned call
#[derive(Debug)]
pub struct MaskRef<'r, M: Element> {
    pub(crate) matrix: &'r Matrix<M>,
    pub(crate) comp: bool,
    pub(crate) structural: bool,
    pub(crate) kind: AssignKind,
    /// `|I|` of the call, for subassign mask positions
    pub(crate) ni: usize,
    /// Entry slices when the mask is sparse or hypersparse
    pub(crate) slice: Option<EkSlice>,
}

impl<'r, M: Element> MaskRef<'r, M> {
    pub fn matrix(&self) -> &'r Matrix<M> {
        self.matrix
    }

    pub fn is_complemented(&self) -> bool {
        self.comp
    }

    pub fn is_structural(&self) -> bool {
        self.structural
    }

    /// The mask is bitmap or full and is read in place
    pub fn is_dense(&self) -> bool {
        self.matrix.format().is_dense_like()
    }

    /// Value of mask entry stored at `slot` counts as true
    #[inline(always)]
    pub fn entry_is_true(&self, slot: usize) -> bool {
        self.structural || self.matrix.values().get(slot).is_nonzero()
    }

    /// Mask position governing target cell `cell`
    #[inline(always)]
    pub fn position(&self, cell: Cell) -> usize {
        match self.kind {
            AssignKind::Row => cell.jc,
            AssignKind::Col => cell.ic,
            AssignKind::Assign => cell.pc,
            AssignKind::Subassign => cell.ia + cell.ja * self.ni,
        }
    }

    /// Whether the (possibly complemented) dense mask selects `cell`
    #[inline(always)]
    pub fn mij(&self, cell: Cell) -> bool {
        let pm = self.position(cell);
        let present = match self.matrix.presence() {
            Some(b) => b[pm] != 0,
            None => true,
        };
        (present && self.entry_is_true(pm)) != self.comp
    }

    /// Target coordinates `(ic, jc)` of mask entry `(im, jm)`
    #[inline(always)]
    pub fn target(&self, im: usize, jm: usize, i: &IndexList, j: &IndexList) -> (usize, usize) {
        match self.kind {
            AssignKind::Row => (i.get(0), jm),
            AssignKind::Col => (im, j.get(0)),
            AssignKind::Assign => (im, jm),
            AssignKind::Subassign => (i.get(im), j.get(jm)),
        }
    }
}
