//! Masked, accumulated and replacing assignment into bitmap matrices
//!
//! Implements `C<M>(I,J) accum= A` (and the row, column and subassign
//! variants) for a target C held in bitmap or full form, plus extraction of
//! `A(I,J)` from a bitmap or full matrix.
//!
//! # How it works
//!
//! Each position of a bitmap C has one presence byte. During a call the
//! byte carries transient states ([`Presence`]) that fold the mask and the
//! "already assigned" bookkeeping into C itself, so no per-call mask copy is
//! needed:
//!
//! 1. [`check_operands`] rejects out-of-range or duplicate indices and
//!    misshapen operands, since every traversal writes through them
//! 2. the call planner resolves the request, slices sparse operands into
//!    tasks and makes every allocation up front
//! 3. [`select_case`] picks one of sixteen routines from five properties of
//!    the call
//! 4. the routine composes traversal templates with a scatter of the mask
//!    and settles every byte back to 0 or 1
//!
//! # Example
//!
//! ```rust
//! use bitmap_assign::prelude::*;
//! use bitmap_assign::Plus;
//!
//! let mut c = Matrix::from_triplets(3, 3, &[(0, 0, 1.0), (1, 1, 2.0)], Format::Bitmap);
//! let mask = Matrix::from_triplets(3, 3, &[(0, 0, true), (2, 2, true)], Format::Sparse);
//! let req = AssignRequest::new(IndexList::all(3), IndexList::all(3), Input::Scalar(10.0))
//!     .with_mask(&mask)
//!     .with_accum(Plus);
//!
//! assign(&mut c, &req, &AssignContext::sequential()).unwrap();
//! assert_eq!(c.get(0, 0), Some(11.0));
//! assert_eq!(c.get(1, 1), Some(2.0));
//! assert_eq!(c.get(2, 2), Some(10.0));
//! ```

mod cases;
pub mod dispatch;
pub mod mask;
mod prepare;
pub mod presence;
pub mod request;
mod scatter;
pub mod subref;
mod templates;

pub use bitmap_core::{
    AssignConfig, AssignEvent, BinaryOp, CastTo, Closure, CollectingSink, DiagnosticsSink,
    Element, Error, ExecutionEngine, First, Format, IndexList, LoggingSink, Lor, Matrix, Max, Min,
    NoAccum, NullSink, Plus, Result, Second, SequentialEngine, Times, Values,
};

pub use dispatch::{assign, bitmap_assign, select_case, Case, CaseFlags, MaskFamily, Route};
pub use mask::{Cell, MaskRef};
pub use prepare::{check_operands, validate};
pub use presence::{Presence, Slot};
pub use request::{AssignContext, AssignKind, AssignRequest, Input};
pub use scatter::ScatterOp;
pub use subref::{subref, subref_symbolic};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        assign, bitmap_assign, subref, AssignConfig, AssignContext, AssignKind, AssignRequest,
        Format, IndexList, Input, Matrix, Result,
    };

    pub use crate::Error;
}
