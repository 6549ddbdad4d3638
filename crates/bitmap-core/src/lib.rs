//! Core containers and services for bitmap matrix assignment
//!
//! This crate provides the layer the assignment engine is built on: matrix
//! containers in four physical formats, index lists, task slicing, execution
//! engines, configuration, diagnostics and fallible workspace allocation.
//!
//! # Architecture Overview
//!
//! 1. **Containers** - [`Matrix`] in hypersparse, sparse, bitmap or full
//!    format, with array or iso values
//! 2. **Addressing** - [`IndexList`] resolves local positions of `C(I,J)`
//! 3. **Scheduling** - [`EkSlice`] / [`IxjSlice`] split work into tasks that an
//!    [`ExecutionEngine`] runs sequentially or on Rayon
//!
//! # Example
//!
//! ```rust
//! use bitmap_core::{Format, IndexList, Matrix};
//!
//! let m = Matrix::from_triplets(3, 3, &[(0, 1, 2.0), (2, 2, 5.0)], Format::Bitmap);
//! assert_eq!(m.nvals(), 2);
//! assert_eq!(m.get(0, 1), Some(2.0));
//!
//! let rows = IndexList::strided(2, -1, 0);
//! assert_eq!(rows.iter().collect::<Vec<_>>(), vec![2, 1, 0]);
//! ```

pub mod config;
pub mod diagnostics;
pub mod element;
pub mod error;
pub mod execution;
pub mod index;
pub mod matrix;
pub mod slice;
pub mod workspace;

// Re-export core types
pub use error::{Error, Result};

pub use config::AssignConfig;
pub use diagnostics::{AssignEvent, CollectingSink, DiagnosticsSink, LoggingSink, NullSink};
pub use element::{
    BinaryOp, CastTo, Closure, Element, First, Lor, Max, Min, NoAccum, Plus, Second, Times,
};
pub use execution::{auto_engine, sequential, ExecutionEngine, ExecutionStrategy, SequentialEngine};
#[cfg(feature = "parallel")]
pub use execution::{parallel, ParallelEngine};
pub use index::{IndexKind, IndexList};
pub use matrix::{Format, Matrix, MatrixPartsMut, SparseParts, Storage, Values};
pub use slice::{partition, EkSlice, EkTask, IxjSlice, IxjTask};
pub use workspace::Workspace;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        AssignConfig, BinaryOp, CastTo, DiagnosticsSink, Element, ExecutionEngine, Format,
        IndexList, Matrix, Result,
    };

    pub use crate::error::Error;

    // Common engine configurations
    #[cfg(feature = "parallel")]
    pub use crate::execution::parallel;
    pub use crate::execution::{sequential, ExecutionStrategy, SequentialEngine};
}
