//! Assignment requests and the per-call context
//!
//! An [`AssignRequest`] describes one `C<M>(I,J) accum= A` operation in
//! logical row/column terms; the target's orientation is resolved when the
//! call is planned. Setting a mask or an accumulator changes the request's
//! type, so the element types of every operand are fixed before any kernel
//! is monomorphised.

use bitmap_core::{
    AssignConfig, DiagnosticsSink, Element, ExecutionEngine, IndexList, Matrix, NoAccum, NullSink,
    SequentialEngine, Workspace,
};
use std::sync::Arc;
use uuid::Uuid;

/// Which assignment operation is being performed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssignKind {
    /// `C<m'>(i,J) = A`: one row, mask is a `1 × ncols` row vector
    Row,
    /// `C<m>(I,j) = A`: one column, mask is an `nrows × 1` column vector
    Col,
    /// `C<M>(I,J) = A`: mask has the shape of C
    Assign,
    /// `C(I,J)<M> = A`: mask has the shape of `I × J`
    Subassign,
}

impl AssignKind {
    /// The same operation seen through a row-oriented target
    pub fn transposed(self) -> Self {
        match self {
            Self::Row => Self::Col,
            Self::Col => Self::Row,
            other => other,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Row => "row_assign",
            Self::Col => "col_assign",
            Self::Assign => "assign",
            Self::Subassign => "subassign",
        }
    }
}

/// Right-hand side of an assignment
#[derive(Debug, Clone, Copy)]
pub enum Input<'a, A: Element> {
    /// A matrix of shape `|I| × |J|` with the target's orientation
    Matrix(&'a Matrix<A>),
    /// A scalar expanded over `I × J`
    Scalar(A),
}

impl<A: Element> Input<'_, A> {
    pub fn is_scalar(&self) -> bool {
        matches!(self, Self::Scalar(_))
    }

    /// Single value every supplied entry carries, if there is one
    pub fn iso_value(&self) -> Option<A> {
        match self {
            Self::Scalar(s) => Some(*s),
            Self::Matrix(a) => a.values().iso_value(),
        }
    }
}

/// One `C<M>(I,J) accum= A` request
#[derive(Debug, Clone)]
pub struct AssignRequest<'a, A: Element, M: Element = bool, Op = NoAccum> {
    rows: IndexList,
    cols: IndexList,
    input: Input<'a, A>,
    mask: Option<&'a Matrix<M>>,
    mask_comp: bool,
    mask_struct: bool,
    accum: Option<Op>,
    replace: bool,
    kind: AssignKind,
}

impl<'a, A: Element> AssignRequest<'a, A> {
    /// `C(rows, cols) = input` without mask or accumulator
    pub fn new(rows: IndexList, cols: IndexList, input: Input<'a, A>) -> Self {
        Self {
            rows,
            cols,
            input,
            mask: None,
            mask_comp: false,
            mask_struct: false,
            accum: None,
            replace: false,
            kind: AssignKind::Assign,
        }
    }

    /// `C(row, cols) = input`
    pub fn row(row: usize, cols: IndexList, input: Input<'a, A>) -> Self {
        Self::new(IndexList::single(row), cols, input).kind(AssignKind::Row)
    }

    /// `C(rows, col) = input`
    pub fn col(rows: IndexList, col: usize, input: Input<'a, A>) -> Self {
        Self::new(rows, IndexList::single(col), input).kind(AssignKind::Col)
    }
}

impl<'a, A: Element, M: Element, Op> AssignRequest<'a, A, M, Op> {
    /// Gate the assignment with a mask
    pub fn with_mask<M2: Element>(self, mask: &'a Matrix<M2>) -> AssignRequest<'a, A, M2, Op> {
        AssignRequest {
            rows: self.rows,
            cols: self.cols,
            input: self.input,
            mask: Some(mask),
            mask_comp: self.mask_comp,
            mask_struct: self.mask_struct,
            accum: self.accum,
            replace: self.replace,
            kind: self.kind,
        }
    }

    /// Combine with existing entries instead of overwriting them
    pub fn with_accum<Op2>(self, accum: Op2) -> AssignRequest<'a, A, M, Op2> {
        AssignRequest {
            rows: self.rows,
            cols: self.cols,
            input: self.input,
            mask: self.mask,
            mask_comp: self.mask_comp,
            mask_struct: self.mask_struct,
            accum: Some(accum),
            replace: self.replace,
            kind: self.kind,
        }
    }

    /// Use the complement of the mask
    pub fn complement(mut self) -> Self {
        self.mask_comp = true;
        self
    }

    /// Use only the mask's pattern, ignoring its values
    pub fn structural(mut self) -> Self {
        self.mask_struct = true;
        self
    }

    /// Delete entries of the replace region the mask does not select
    pub fn replace(mut self) -> Self {
        self.replace = true;
        self
    }

    pub fn kind(mut self, kind: AssignKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn rows(&self) -> &IndexList {
        &self.rows
    }

    pub fn cols(&self) -> &IndexList {
        &self.cols
    }

    pub fn input(&self) -> Input<'a, A> {
        self.input
    }

    pub fn mask(&self) -> Option<&'a Matrix<M>> {
        self.mask
    }

    pub fn mask_comp(&self) -> bool {
        self.mask_comp
    }

    pub fn mask_struct(&self) -> bool {
        self.mask_struct
    }

    pub fn accum(&self) -> Option<&Op> {
        self.accum.as_ref()
    }

    pub fn is_replace(&self) -> bool {
        self.replace
    }

    pub fn assign_kind(&self) -> AssignKind {
        self.kind
    }
}

/// Engine, configuration and diagnostics shared by the phases of a call
#[derive(Clone)]
pub struct AssignContext<E: ExecutionEngine = SequentialEngine> {
    engine: E,
    config: AssignConfig,
    diagnostics: Arc<dyn DiagnosticsSink>,
    trace_id: Uuid,
}

impl AssignContext<SequentialEngine> {
    /// Single-threaded context with default configuration and no diagnostics
    pub fn sequential() -> Self {
        Self::new(SequentialEngine)
    }
}

impl Default for AssignContext<SequentialEngine> {
    fn default() -> Self {
        Self::sequential()
    }
}

impl<E: ExecutionEngine> AssignContext<E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            config: AssignConfig::default(),
            diagnostics: Arc::new(NullSink),
            trace_id: Uuid::new_v4(),
        }
    }

    pub fn with_config(mut self, config: AssignConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_diagnostics<S: DiagnosticsSink + 'static>(mut self, sink: S) -> Self {
        self.diagnostics = Arc::new(sink);
        self
    }

    pub fn with_shared_diagnostics(mut self, sink: Arc<dyn DiagnosticsSink>) -> Self {
        self.diagnostics = sink;
        self
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn config(&self) -> &AssignConfig {
        &self.config
    }

    pub fn diagnostics(&self) -> &dyn DiagnosticsSink {
        self.diagnostics.as_ref()
    }

    /// Id attached to every event this context emits
    pub fn trace_id(&self) -> Uuid {
        self.trace_id
    }

    /// Copy of this context with a fresh trace id, one per dispatched call
    pub fn for_call(&self) -> Self {
        Self {
            engine: self.engine.clone(),
            config: self.config.clone(),
            diagnostics: Arc::clone(&self.diagnostics),
            trace_id: Uuid::new_v4(),
        }
    }

    /// Fresh allocation budget for one call
    pub fn workspace(&self) -> Workspace {
        Workspace::new(self.config.workspace_limit)
    }

    /// Task count for a traversal over `work` items
    pub fn ntasks(&self, work: usize) -> usize {
        self.config.ntasks(work)
    }
}

impl<E: ExecutionEngine + std::fmt::Debug> std::fmt::Debug for AssignContext<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssignContext")
            .field("engine", &self.engine)
            .field("config", &self.config)
            .field("diagnostics", &self.diagnostics.name())
            .field("trace_id", &self.trace_id)
            .finish()
    }
}
