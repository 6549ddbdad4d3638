//! Call planning
//!
//! Resolves a logical request against the target's orientation, slices the
//! sparse operands into tasks, decides whether the result is iso and brings
//! C into bitmap form. Every allocation a call needs happens here, before
//! the first presence byte changes, so a failed call leaves C untouched.

use crate::mask::MaskRef;
use crate::request::{AssignContext, AssignKind, AssignRequest, Input};
use bitmap_core::{
    AssignConfig, AssignEvent, CastTo, EkSlice, Element, Error, ExecutionEngine, Format,
    IndexList, Matrix, Result, Storage, Values, Workspace,
};

/// Right-hand side resolved for one call
#[derive(Debug)]
pub(crate) enum Source<'r, T, A: Element> {
    /// Scalar already cast to the target type
    Scalar(T),
    Matrix {
        a: &'r Matrix<A>,
        /// Entry slices when A is sparse or hypersparse
        slice: Option<EkSlice>,
    },
}

impl<T, A: Element> Source<'_, T, A> {
    pub fn is_scalar(&self) -> bool {
        matches!(self, Self::Scalar(_))
    }

    /// Every position of `I × J` receives a value
    pub fn is_dense(&self) -> bool {
        match self {
            Self::Scalar(_) => true,
            Self::Matrix { a, .. } => a.format() == Format::Full,
        }
    }
}

/// How much of C the plan should convert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Preparation {
    /// Bitmap presence plus a value array (or iso values when the result is iso)
    Bitmap,
    /// Bitmap presence only; values are left as they are
    PresenceOnly,
    /// Value array (or iso values when the result is iso); a full C stays full
    Values,
    /// Leave C alone; the routine rebuilds it itself
    Untouched,
}

/// Operands of one planned call, in the target's orientation
pub(crate) struct Operands<'r, T: Element, A: Element, M: Element, E: ExecutionEngine> {
    pub(crate) ctx: &'r AssignContext<E>,
    /// Indices within a vector
    pub(crate) i: &'r IndexList,
    /// Vector indices
    pub(crate) j: &'r IndexList,
    pub(crate) kind: AssignKind,
    pub(crate) vlen: usize,
    pub(crate) replace: bool,
    pub(crate) whole: bool,
    pub(crate) source: Source<'r, T, A>,
    pub(crate) mask: Option<MaskRef<'r, M>>,
    /// Allocation budget of the call
    pub(crate) ws: Workspace,
}

impl<'r, T: Element, A: Element, M: Element, E: ExecutionEngine> Operands<'r, T, A, M, E> {
    pub fn ni(&self) -> usize {
        self.i.len()
    }

    pub fn nj(&self) -> usize {
        self.j.len()
    }

    /// The call assigns the whole target: kind `Assign` with both lists covering C
    pub fn is_whole(&self) -> bool {
        self.whole
    }

    pub fn ctx(&self) -> &'r AssignContext<E> {
        self.ctx
    }

    /// The request's mask
    ///
    /// # Panics
    /// If the request has none; masked routines are only reachable with one.
    pub fn mask(&self) -> &MaskRef<'r, M> {
        match &self.mask {
            Some(mask) => mask,
            None => panic!("masked assignment routine called without a mask"),
        }
    }

    /// The scalar input cast to the target type, if the input is a scalar
    pub fn scalar(&self) -> Option<T> {
        match self.source {
            Source::Scalar(z) => Some(z),
            Source::Matrix { .. } => None,
        }
    }

    pub(crate) fn emit(&self, event: AssignEvent) {
        self.ctx.diagnostics().emit(event);
    }
}

/// Check a request and its configuration against the target
///
/// Runs [`check_operands`] after validating `config`.
pub fn validate<T, A, M, Op>(
    c: &Matrix<T>,
    req: &AssignRequest<'_, A, M, Op>,
    config: &AssignConfig,
) -> Result<()>
where
    T: Element,
    A: Element,
    M: Element,
{
    config.validate()?;
    check_operands(c, req)
}

/// Check a request against its target before any kernel runs
///
/// C must be bitmap or full; the index lists must be in bounds and free of
/// duplicates; A must be `|I| × |J|`; the mask must have the shape its kind
/// implies; A and the mask must share C's orientation. Every traversal
/// relies on these to keep its task positions inside C and disjoint.
pub fn check_operands<T, A, M, Op>(c: &Matrix<T>, req: &AssignRequest<'_, A, M, Op>) -> Result<()>
where
    T: Element,
    A: Element,
    M: Element,
{
    if !c.format().is_dense_like() {
        return Err(Error::InvalidParameter(format!(
            "assignment target must be bitmap or full, got {:?}",
            c.format()
        )));
    }
    let (nrows, ncols) = c.shape();
    req.rows().validate(nrows)?;
    req.cols().validate(ncols)?;
    let (ni, nj) = (req.rows().len(), req.cols().len());

    match req.assign_kind() {
        AssignKind::Row if ni != 1 => return Err(Error::size_mismatch(1, ni, "row index list")),
        AssignKind::Col if nj != 1 => {
            return Err(Error::size_mismatch(1, nj, "column index list"))
        }
        _ => {}
    }

    if let Input::Matrix(a) = req.input() {
        if a.is_by_col() != c.is_by_col() {
            return Err(Error::InvalidParameter(
                "input matrix orientation must match the target".to_string(),
            ));
        }
        if a.shape() != (ni, nj) {
            return Err(Error::shape_mismatch((ni, nj), a.shape(), "input matrix"));
        }
    }

    if let Some(m) = req.mask() {
        if m.is_by_col() != c.is_by_col() {
            return Err(Error::InvalidParameter(
                "mask orientation must match the target".to_string(),
            ));
        }
        let expected = match req.assign_kind() {
            AssignKind::Row => (1, ncols),
            AssignKind::Col => (nrows, 1),
            AssignKind::Assign => (nrows, ncols),
            AssignKind::Subassign => (ni, nj),
        };
        if m.shape() != expected {
            return Err(Error::shape_mismatch(expected, m.shape(), "mask"));
        }
    }
    Ok(())
}

/// Whether `C(I,J) = input` with this request can keep a single shared value
fn iso_result<T, A, M, Op>(c: &Matrix<T>, req: &AssignRequest<'_, A, M, Op>) -> Option<T>
where
    T: Element,
    A: Element + CastTo<T>,
    M: Element,
{
    if req.accum().is_some() {
        return None;
    }
    let z: T = req.input().iso_value()?.cast_to();
    if c.nvals() == 0 || c.values().iso_value() == Some(z) {
        Some(z)
    } else {
        None
    }
}

/// Plan one call
///
/// Orientation: a row-oriented C swaps the roles of the row and column
/// lists and turns row assignment into column assignment. A and M must have
/// C's orientation.
pub(crate) fn plan<'r, T, A, M, Op, E>(
    c: &mut Matrix<T>,
    req: &'r AssignRequest<'r, A, M, Op>,
    ctx: &'r AssignContext<E>,
    preparation: Preparation,
) -> Result<Operands<'r, T, A, M, E>>
where
    T: Element,
    A: Element + CastTo<T>,
    M: Element,
    E: ExecutionEngine,
{
    let by_col = c.is_by_col();
    let (i, j, kind) = if by_col {
        (req.rows(), req.cols(), req.assign_kind())
    } else {
        (req.cols(), req.rows(), req.assign_kind().transposed())
    };
    let (vlen, vdim) = (c.vlen(), c.vdim());

    let ws = ctx.workspace();
    let source = match req.input() {
        Input::Scalar(s) => Source::Scalar(s.cast_to()),
        Input::Matrix(a) => {
            let slice = match a.sparse_parts() {
                Some(parts) => Some(EkSlice::new(parts, ctx.ntasks(parts.nnz()), &ws)?),
                None => None,
            };
            Source::Matrix { a, slice }
        }
    };

    let mask = match req.mask() {
        Some(m) => {
            let slice = match m.sparse_parts() {
                Some(parts) => Some(EkSlice::new(parts, ctx.ntasks(parts.nnz()), &ws)?),
                None => None,
            };
            Some(MaskRef {
                matrix: m,
                comp: req.mask_comp(),
                structural: req.mask_struct(),
                kind,
                ni: i.len(),
                slice,
            })
        }
        None => None,
    };

    let whole = kind == AssignKind::Assign && i.covers_all(vlen) && j.covers_all(vdim);
    let iso = match preparation {
        Preparation::Bitmap | Preparation::Values => iso_result(c, req),
        Preparation::PresenceOnly | Preparation::Untouched => None,
    };

    // allocate everything before changing C
    let presence = match (preparation, c.format()) {
        (Preparation::Bitmap | Preparation::PresenceOnly, Format::Full) => {
            Some(ws.try_filled(c.size(), 1u8, "bitmap presence")?)
        }
        _ => None,
    };
    let expanded = match (preparation, iso, c.values()) {
        (Preparation::Bitmap | Preparation::Values, None, Values::Iso(v)) => {
            Some(ws.try_filled(c.size(), *v, "iso expansion")?)
        }
        _ => None,
    };

    let converted = presence.is_some();
    let parts = c.parts_mut();
    if let Some(b) = presence {
        *parts.storage = Storage::Bitmap { b };
    }
    if let Some(x) = expanded {
        *parts.values = Values::Array(x);
    }
    if let Some(z) = iso {
        *parts.values = Values::Iso(z);
    }

    let workspace_bytes = ws.used();
    let ops = Operands {
        ctx,
        i,
        j,
        kind,
        vlen,
        replace: req.is_replace(),
        whole,
        source,
        mask,
        ws,
    };
    if converted {
        ops.emit(AssignEvent::Converted {
            trace_id: ctx.trace_id(),
            from: Format::Full,
            to: Format::Bitmap,
        });
    }
    tracing::trace!(
        kind = ?kind,
        whole,
        iso = iso.is_some(),
        workspace_bytes,
        "planned bitmap assignment"
    );
    Ok(ops)
}
