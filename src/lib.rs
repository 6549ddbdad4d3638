//! Masked and accumulated assignment into bitmap-format sparse matrices
//!
//! This crate re-exports the workspace members under one roof:
//!
//! - [`bitmap_core`]: matrix containers, index lists, task slicing,
//!   execution engines, configuration and diagnostics
//! - [`bitmap_assign`]: the sixteen assignment routines, their dispatcher
//!   and bitmap submatrix extraction
//!
//! # Example
//!
//! ```rust
//! use sparse_bitmap::prelude::*;
//!
//! let mut c = Matrix::<i64>::bitmap(4, 4);
//! let mask = Matrix::from_triplets(4, 4, &[(0, 0, true), (3, 3, true)], Format::Sparse);
//! let req = AssignRequest::new(IndexList::all(4), IndexList::all(4), Input::Scalar(1))
//!     .with_mask(&mask)
//!     .complement();
//!
//! let ctx = AssignContext::new(parallel()).with_config(AssignConfig::default());
//! assign(&mut c, &req, &ctx).unwrap();
//! assert_eq!(c.nvals(), 14);
//! ```

pub use bitmap_assign;
pub use bitmap_core;

pub use ::bitmap_assign::{
    assign, subref, subref_symbolic, AssignContext, AssignKind, AssignRequest, Case, Input, Route,
};
pub use ::bitmap_core::{
    AssignConfig, AssignEvent, CollectingSink, DiagnosticsSink, Error, Format, IndexList,
    LoggingSink, Matrix, ParallelEngine, Result, SequentialEngine,
};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports
pub mod prelude {
    pub use ::bitmap_assign::prelude::*;
    pub use ::bitmap_assign::{CollectingSink, Plus};
    pub use ::bitmap_core::{parallel, sequential, ParallelEngine, SequentialEngine};
}
