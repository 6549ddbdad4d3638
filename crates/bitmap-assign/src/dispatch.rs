//! Case selection and the public entry points
//!
//! A call is classified by five properties: whether it has a mask, whether
//! that mask is bitmap/full (read in place) or sparse (scattered), whether it
//! is complemented, whether there is an accumulator, and whether it assigns
//! the whole matrix. Those select exactly one of the sixteen case routines,
//! or the degenerate `C<!>` case where nothing is selected.

use crate::cases::{self, dense_mask, mask, no_mask, not_mask};
use crate::prepare::check_operands;
use crate::request::{AssignContext, AssignKind, AssignRequest};
use bitflags::bitflags;
use bitmap_core::{AssignEvent, BinaryOp, CastTo, Element, ExecutionEngine, Format, Matrix, Result};
use std::time::Instant;
use tracing::{debug, instrument};

bitflags! {
    /// Properties of a call that decide its case routine
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CaseFlags: u8 {
        /// A mask matrix is present
        const MASK = 0b0000_0001;
        /// The mask is bitmap or full
        const DENSE_MASK = 0b0000_0010;
        /// The mask is complemented
        const COMPLEMENT = 0b0000_0100;
        /// An accumulator is present
        const ACCUM = 0b0000_1000;
        /// Kind `Assign` with both index lists covering C
        const WHOLE = 0b0001_0000;
    }
}

impl CaseFlags {
    /// Classify `req` against target `c`
    pub fn of<T, A, M, Op>(c: &Matrix<T>, req: &AssignRequest<'_, A, M, Op>) -> Self
    where
        T: Element,
        A: Element,
        M: Element,
    {
        let mut flags = Self::empty();
        if let Some(m) = req.mask() {
            flags |= Self::MASK;
            flags.set(Self::DENSE_MASK, m.format().is_dense_like());
        }
        flags.set(Self::COMPLEMENT, req.mask_comp());
        flags.set(Self::ACCUM, req.accum().is_some());
        let whole = req.assign_kind() == AssignKind::Assign
            && req.rows().covers_all(c.nrows())
            && req.cols().covers_all(c.ncols());
        flags.set(Self::WHOLE, whole);
        flags
    }
}

/// How the mask is applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MaskFamily {
    NoMask,
    /// Sparse mask, selecting its entries
    Mask,
    /// Sparse mask, complemented
    NotMask,
    /// Bitmap or full mask, either sense
    DenseMask,
}

/// One of the sixteen case routines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Case {
    pub family: MaskFamily,
    pub accum: bool,
    pub whole: bool,
}

impl Case {
    pub fn name(&self) -> &'static str {
        use MaskFamily::*;
        match (self.family, self.accum, self.whole) {
            (NoMask, false, false) => "no_mask_noaccum",
            (NoMask, true, false) => "no_mask_accum",
            (NoMask, false, true) => "no_mask_noaccum_whole",
            (NoMask, true, true) => "no_mask_accum_whole",
            (Mask, false, false) => "mask_noaccum",
            (Mask, true, false) => "mask_accum",
            (Mask, false, true) => "mask_noaccum_whole",
            (Mask, true, true) => "mask_accum_whole",
            (NotMask, false, false) => "not_mask_noaccum",
            (NotMask, true, false) => "not_mask_accum",
            (NotMask, false, true) => "not_mask_noaccum_whole",
            (NotMask, true, true) => "not_mask_accum_whole",
            (DenseMask, false, false) => "dense_mask_noaccum",
            (DenseMask, true, false) => "dense_mask_accum",
            (DenseMask, false, true) => "dense_mask_noaccum_whole",
            (DenseMask, true, true) => "dense_mask_accum_whole",
        }
    }

    /// All sixteen cases
    pub fn all() -> impl Iterator<Item = Case> {
        use MaskFamily::*;
        [NoMask, Mask, NotMask, DenseMask].into_iter().flat_map(|family| {
            [(false, false), (true, false), (false, true), (true, true)]
                .into_iter()
                .map(move |(accum, whole)| Case {
                    family,
                    accum,
                    whole,
                })
        })
    }

    fn run<T, A, M, Op, E>(
        self,
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
        use MaskFamily::*;
        match (self.family, self.accum, self.whole) {
            (NoMask, false, false) => no_mask::noaccum(c, req, ctx),
            (NoMask, true, false) => no_mask::accum(c, req, ctx),
            (NoMask, false, true) => no_mask::noaccum_whole(c, req, ctx),
            (NoMask, true, true) => no_mask::accum_whole(c, req, ctx),
            (Mask, false, false) => mask::noaccum(c, req, ctx),
            (Mask, true, false) => mask::accum(c, req, ctx),
            (Mask, false, true) => mask::noaccum_whole(c, req, ctx),
            (Mask, true, true) => mask::accum_whole(c, req, ctx),
            (NotMask, false, false) => not_mask::noaccum(c, req, ctx),
            (NotMask, true, false) => not_mask::accum(c, req, ctx),
            (NotMask, false, true) => not_mask::noaccum_whole(c, req, ctx),
            (NotMask, true, true) => not_mask::accum_whole(c, req, ctx),
            (DenseMask, false, false) => dense_mask::noaccum(c, req, ctx),
            (DenseMask, true, false) => dense_mask::accum(c, req, ctx),
            (DenseMask, false, true) => dense_mask::noaccum_whole(c, req, ctx),
            (DenseMask, true, true) => dense_mask::accum_whole(c, req, ctx),
        }
    }
}

/// Outcome of case selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Case(Case),
    /// `C<!>` with no mask matrix: no position is selected
    NothingSelected,
}

impl Route {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Case(case) => case.name(),
            Self::NothingSelected => "nothing_selected",
        }
    }
}

/// Pick the routine for a set of call properties
pub fn select_case(flags: CaseFlags) -> Route {
    let family = if !flags.contains(CaseFlags::MASK) {
        if flags.contains(CaseFlags::COMPLEMENT) {
            return Route::NothingSelected;
        }
        MaskFamily::NoMask
    } else if flags.contains(CaseFlags::DENSE_MASK) {
        MaskFamily::DenseMask
    } else if flags.contains(CaseFlags::COMPLEMENT) {
        MaskFamily::NotMask
    } else {
        MaskFamily::Mask
    };
    Route::Case(Case {
        family,
        accum: flags.contains(CaseFlags::ACCUM),
        whole: flags.contains(CaseFlags::WHOLE),
    })
}

/// `C<M>(I,J) accum= A` on a bitmap or full C
///
/// The operands are checked with [`check_operands`] before any routine
/// runs; the configuration is taken as given. On success C holds the result
/// with every presence byte 0 or 1 and `nvals` exact; with `promote_full` a
/// bitmap C whose every position is present becomes full. On failure C is
/// unchanged.
///
/// # Errors
/// Those of [`check_operands`], and
/// [`Error::OutOfMemory`](bitmap_core::Error::OutOfMemory) when workspace
/// cannot be allocated
#[instrument(skip_all, fields(kind = ?req.assign_kind(), nrows = c.nrows(), ncols = c.ncols()))]
pub fn bitmap_assign<T, A, M, Op, E>(
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
    let ctx = ctx.for_call();
    let trace_id = ctx.trace_id();
    let start = Instant::now();
    ctx.diagnostics().emit(AssignEvent::CallStarted {
        trace_id,
        operation: req.assign_kind().name(),
        nrows: c.nrows(),
        ncols: c.ncols(),
    });

    let result = check_operands(c, req).and_then(|()| {
        let flags = CaseFlags::of(c, req);
        let route = select_case(flags);
        debug!(case = route.name(), ?flags, "dispatching bitmap assignment");
        ctx.diagnostics().emit(AssignEvent::CaseSelected {
            trace_id,
            case: route.name(),
        });
        match route {
            Route::Case(case) => case.run(c, req, &ctx),
            Route::NothingSelected => cases::clear_region(c, req, &ctx),
        }
    });
    if let Err(err) = result {
        debug!(error = %err, "bitmap assignment failed");
        ctx.diagnostics().emit(AssignEvent::CallFailed {
            trace_id,
            error: err.to_string(),
        });
        return Err(err);
    }

    if ctx.config().promote_full && c.conform_full() {
        ctx.diagnostics().emit(AssignEvent::Converted {
            trace_id,
            from: Format::Bitmap,
            to: Format::Full,
        });
    }
    debug_assert!(c.presence_invariant_holds(), "presence bytes left unsettled");

    ctx.diagnostics().emit(AssignEvent::CallCompleted {
        trace_id,
        nvals: c.nvals(),
        duration: start.elapsed(),
    });
    Ok(())
}

/// Validating front door: check the configuration, then run [`bitmap_assign`]
///
/// # Errors
/// - [`Error::InvalidParameter`](bitmap_core::Error::InvalidParameter) for a
///   sparse target, mismatched orientations or a bad configuration
/// - [`Error::IndexOutOfBounds`](bitmap_core::Error::IndexOutOfBounds) and
///   [`Error::DuplicateIndex`](bitmap_core::Error::DuplicateIndex) for bad
///   index lists
/// - [`Error::DimensionMismatch`](bitmap_core::Error::DimensionMismatch) for
///   an input or mask of the wrong shape
/// - [`Error::OutOfMemory`](bitmap_core::Error::OutOfMemory) when workspace
///   cannot be allocated; C is then unchanged
pub fn assign<T, A, M, Op, E>(
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
    ctx.config().validate()?;
    bitmap_assign(c, req, ctx)
}
