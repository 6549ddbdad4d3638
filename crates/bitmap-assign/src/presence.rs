//! Presence-byte protocol
//!
//! During one assignment call the presence byte of a bitmap position encodes
//! two facts at once: whether C held an entry there before the call, and
//! whether the mask selects the position. Scattering the mask adds 2, so
//!
//! | byte | meaning |
//! |------|---------|
//! | 0 | no entry, mask does not hit |
//! | 1 | entry, mask does not hit |
//! | 2 | no entry, mask hits |
//! | 3 | entry, mask hits |
//! | 4 | mask hit and assigned during this call |
//!
//! Every routine collapses the transient states 2, 3 and 4 back to 0 or 1
//! before it returns.
//!
//! Work closures never see the raw arrays: a traversal hands each of them a
//! [`Slot`] for the one position the current task owns.

use bitmap_core::{BinaryOp, Storage, Values};
use std::marker::PhantomData;

/// State of one presence byte
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Presence {
    /// No entry, not selected by the scattered mask
    Absent = 0,
    /// Entry, not selected by the scattered mask
    Present = 1,
    /// No entry, mask hit
    AbsentMasked = 2,
    /// Entry, mask hit
    PresentMasked = 3,
    /// Mask hit and assigned during this call
    Assigned = 4,
}

impl Presence {
    /// Decode a presence byte
    ///
    /// # Panics
    /// If `byte > 4`; no routine ever stores such a value.
    #[inline(always)]
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            0 => Self::Absent,
            1 => Self::Present,
            2 => Self::AbsentMasked,
            3 => Self::PresentMasked,
            4 => Self::Assigned,
            _ => unreachable!("presence byte {byte} outside the protocol"),
        }
    }

    #[inline(always)]
    pub fn as_byte(self) -> u8 {
        self as u8
    }

    /// The byte is one of the two states allowed between calls
    #[inline]
    pub fn is_settled(self) -> bool {
        matches!(self, Self::Absent | Self::Present)
    }

    /// C held an entry here before the call
    #[inline]
    pub fn had_entry(self) -> bool {
        matches!(self, Self::Present | Self::PresentMasked)
    }

    /// The scattered mask hits this position
    #[inline]
    pub fn is_mask_hit(self) -> bool {
        matches!(self, Self::AbsentMasked | Self::PresentMasked)
    }
}

impl TryFrom<u8> for Presence {
    type Error = u8;

    fn try_from(byte: u8) -> std::result::Result<Self, u8> {
        if byte <= 4 {
            Ok(Self::from_byte(byte))
        } else {
            Err(byte)
        }
    }
}

impl From<Presence> for u8 {
    fn from(state: Presence) -> u8 {
        state.as_byte()
    }
}

/// Shared view of a bitmap (or full) matrix's presence and value arrays
///
/// A full matrix has no presence array: every position reads as
/// [`Presence::Present`] and only values can be written. Iso values have no
/// array: value writes are skipped.
pub(crate) struct BitmapView<'a, T> {
    b: Option<*mut u8>,
    x: Option<*mut T>,
    len: usize,
    _marker: PhantomData<&'a mut [T]>,
}

// SAFETY: traversals hand out one Slot per position and every task owns a
// disjoint set of positions, so no two threads touch the same byte or value.
unsafe impl<T: Send> Send for BitmapView<'_, T> {}
unsafe impl<T: Send> Sync for BitmapView<'_, T> {}

impl<'a, T> BitmapView<'a, T> {
    /// # Panics
    /// If `storage` is sparse or hypersparse
    pub(crate) fn new(storage: &'a mut Storage, values: &'a mut Values<T>, len: usize) -> Self {
        let b = match storage {
            Storage::Bitmap { b } => {
                debug_assert_eq!(b.len(), len);
                Some(b.as_mut_ptr())
            }
            Storage::Full => None,
            Storage::Sparse { .. } | Storage::Hypersparse { .. } => {
                panic!("traversal target must be bitmap or full")
            }
        };
        let x = match values {
            Values::Array(x) => {
                debug_assert_eq!(x.len(), len);
                Some(x.as_mut_ptr())
            }
            Values::Iso(_) => None,
        };
        Self {
            b,
            x,
            len,
            _marker: PhantomData,
        }
    }

    /// Handle for position `p`
    ///
    /// # Panics
    /// If `p` is outside the matrix
    ///
    /// # Safety
    /// While the slot is alive no other thread may use a slot for the same
    /// position.
    #[inline(always)]
    pub(crate) unsafe fn slot(&self, p: usize) -> Slot<'_, 'a, T> {
        assert!(p < self.len, "position {p} outside a matrix of {} entries", self.len);
        Slot { view: self, p }
    }
}

/// Exclusive handle on one position of the target during a traversal
pub struct Slot<'v, 'a, T> {
    view: &'v BitmapView<'a, T>,
    p: usize,
}

impl<T: Copy> Slot<'_, '_, T> {
    /// Linear position `i + j * vlen`
    #[inline(always)]
    pub fn position(&self) -> usize {
        self.p
    }

    #[inline(always)]
    pub fn state(&self) -> Presence {
        match self.view.b {
            // SAFETY: the slot owns position p
            Some(b) => Presence::from_byte(unsafe { *b.add(self.p) }),
            None => Presence::Present,
        }
    }

    #[inline(always)]
    pub fn set(&self, state: Presence) {
        match self.view.b {
            // SAFETY: the slot owns position p
            Some(b) => unsafe { *b.add(self.p) = state.as_byte() },
            None => debug_assert_eq!(state, Presence::Present, "full target cannot lose entries"),
        }
    }

    /// Store a value without touching the presence byte
    #[inline(always)]
    pub fn write(&self, value: T) {
        if let Some(x) = self.view.x {
            // SAFETY: the slot owns position p
            unsafe { *x.add(self.p) = value }
        }
    }

    /// Current value, `None` when the target is iso
    #[inline(always)]
    pub fn value(&self) -> Option<T> {
        // SAFETY: the slot owns position p
        self.view.x.map(|x| unsafe { *x.add(self.p) })
    }

    /// `x = op(x, y)`
    #[inline(always)]
    pub fn accumulate<Op: BinaryOp<T>>(&self, op: &Op, y: T) {
        if let Some(x) = self.view.x {
            // SAFETY: the slot owns position p
            unsafe {
                let slot = x.add(self.p);
                *slot = op.apply(*slot, y);
            }
        }
    }
}
