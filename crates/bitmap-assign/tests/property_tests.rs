//! Property-based tests for bitmap assignment
//!
//! Operands are drawn from a seeded generator so a failing case shrinks to a
//! seed and a handful of switches.

mod common;

use bitmap_assign::{assign, AssignContext, AssignRequest, Format, IndexList, Input, Matrix, Plus};
use common::*;
use proptest::prelude::*;

const NROWS: usize = 7;
const NCOLS: usize = 6;

struct Operands {
    c: Matrix<i64>,
    a: Matrix<i64>,
    mask: Matrix<u8>,
    rows: IndexList,
    cols: IndexList,
}

fn operands(seed: u64, by_col: bool, c_full: bool, a_format: usize, m_format: usize) -> Operands {
    let mut rng = rng(seed);
    let c_format = if c_full { Format::Full } else { Format::Bitmap };
    let c = random_matrix(&mut rng, NROWS, NCOLS, by_col, c_format, 0.5, small_value);
    let rows = IndexList::list(random_indices(&mut rng, NROWS, NROWS));
    let cols = IndexList::list(random_indices(&mut rng, NCOLS, NCOLS));
    let a = random_matrix(
        &mut rng,
        rows.len(),
        cols.len(),
        by_col,
        ALL_FORMATS[a_format],
        0.5,
        small_value,
    );
    let mask = random_matrix(&mut rng, NROWS, NCOLS, by_col, ALL_FORMATS[m_format], 0.4, mask_value);
    Operands {
        c,
        a,
        mask,
        rows,
        cols,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(96))]

    // Property: any masked request matches the dense reference and settles every byte
    #[test]
    fn prop_masked_assign_matches_reference(
        seed in any::<u64>(),
        by_col in any::<bool>(),
        c_full in any::<bool>(),
        a_format in 0usize..4,
        m_format in 0usize..4,
        comp in any::<bool>(),
        replace in any::<bool>(),
        accum in any::<bool>(),
    ) {
        let ops = operands(seed, by_col, c_full, a_format, m_format);
        let req = AssignRequest::new(ops.rows.clone(), ops.cols.clone(), Input::Matrix(&ops.a))
            .with_mask(&ops.mask);
        let req = if comp { req.complement() } else { req };
        let req = if replace { req.replace() } else { req };
        let ctx = AssignContext::sequential();

        let mut c = ops.c.clone();
        if accum {
            let req = req.with_accum(Plus);
            assign(&mut c, &req, &ctx).unwrap();
            prop_assert_eq!(c.to_triplets(), expected(&ops.c, &req));
        } else {
            assign(&mut c, &req, &ctx).unwrap();
            prop_assert_eq!(c.to_triplets(), expected(&ops.c, &req));
        }
        prop_assert!(c.presence_invariant_holds());
    }

    // Property: assignment without an accumulator is idempotent
    #[test]
    fn prop_noaccum_assign_is_idempotent(
        seed in any::<u64>(),
        by_col in any::<bool>(),
        a_format in 0usize..4,
        m_format in 0usize..4,
        comp in any::<bool>(),
        replace in any::<bool>(),
    ) {
        let ops = operands(seed, by_col, false, a_format, m_format);
        let req = AssignRequest::new(ops.rows.clone(), ops.cols.clone(), Input::Matrix(&ops.a))
            .with_mask(&ops.mask);
        let req = if comp { req.complement() } else { req };
        let req = if replace { req.replace() } else { req };
        let ctx = AssignContext::sequential();

        let mut once = ops.c.clone();
        assign(&mut once, &req, &ctx).unwrap();
        let mut twice = once.clone();
        assign(&mut twice, &req, &ctx).unwrap();
        prop_assert_eq!(once.to_triplets(), twice.to_triplets());
    }

    // Property: with replace, no entry survives where the mask rejects
    #[test]
    fn prop_replace_leaves_only_selected_entries(
        seed in any::<u64>(),
        by_col in any::<bool>(),
        c_full in any::<bool>(),
        a_format in 0usize..4,
        m_format in 0usize..4,
        comp in any::<bool>(),
    ) {
        let ops = operands(seed, by_col, c_full, a_format, m_format);
        let req = AssignRequest::new(ops.rows.clone(), ops.cols.clone(), Input::Matrix(&ops.a))
            .with_mask(&ops.mask)
            .structural()
            .replace();
        let req = if comp { req.complement() } else { req };

        let mut c = ops.c.clone();
        assign(&mut c, &req, &AssignContext::sequential()).unwrap();
        for (row, col, _) in c.to_triplets() {
            let in_mask = ops.mask.get(row, col).is_some();
            prop_assert!(in_mask != comp, "({}, {}) survived an unselected position", row, col);
        }
        // inside I x J a position is present exactly when selected and supplied
        for (ia, row) in ops.rows.iter().enumerate() {
            for (ja, col) in ops.cols.iter().enumerate() {
                let selected = ops.mask.get(row, col).is_some() != comp;
                let supplied = ops.a.get(ia, ja).is_some();
                prop_assert_eq!(c.get(row, col).is_some(), selected && supplied);
            }
        }
    }

    // Property: assigning through M and then through !M equals assigning unmasked
    #[test]
    fn prop_mask_and_complement_partition_the_assignment(
        seed in any::<u64>(),
        by_col in any::<bool>(),
        c_full in any::<bool>(),
        a_format in 0usize..4,
        m_format in 0usize..4,
        accum in any::<bool>(),
    ) {
        let ops = operands(seed, by_col, c_full, a_format, m_format);
        let ctx = AssignContext::sequential();
        let base = AssignRequest::new(ops.rows.clone(), ops.cols.clone(), Input::Matrix(&ops.a));

        let mut split = ops.c.clone();
        let mut direct = ops.c.clone();
        if accum {
            let base = base.with_accum(Plus);
            assign(&mut split, &base.clone().with_mask(&ops.mask), &ctx).unwrap();
            assign(&mut split, &base.clone().with_mask(&ops.mask).complement(), &ctx).unwrap();
            assign(&mut direct, &base, &ctx).unwrap();
        } else {
            assign(&mut split, &base.clone().with_mask(&ops.mask), &ctx).unwrap();
            assign(&mut split, &base.clone().with_mask(&ops.mask).complement(), &ctx).unwrap();
            assign(&mut direct, &base, &ctx).unwrap();
        }
        prop_assert_eq!(split.to_triplets(), direct.to_triplets());
    }
}
