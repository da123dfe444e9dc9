//! Unit tests for operations over a live solver

use algsat::{BitVec, Operation, PartialOp, Relation, Solver};

/// Enumerate the models of `ops`, calling `visit` on each constant copy
fn for_each_model(
    solver: &Solver,
    ops: &[&Operation],
    mut visit: impl FnMut(&[Operation]),
) -> usize {
    let mut count = 0;
    while solver.solve().unwrap() {
        let values: Vec<Operation> = ops.iter().map(|op| op.solution().unwrap()).collect();
        visit(&values);
        let mut differs = BitVec::constant([false]);
        for (op, value) in ops.iter().zip(&values) {
            differs = differs.or(&op.comp_ne(value).unwrap()).unwrap();
        }
        differs.ensure_all().unwrap();
        count += 1;
    }
    count
}

fn count_models(solver: &Solver, op: &Operation) -> usize {
    for_each_model(solver, &[op], |_| {})
}

fn less_or_equal(size: usize) -> Relation {
    let tuples = (0..size).flat_map(|x| (x..size).map(move |y| [x, y]));
    Relation::from_tuples(size, 2, tuples).unwrap()
}

#[test]
fn test_commutative_binary_ops() {
    let solver = Solver::new();
    let op = Operation::variable(&solver, 2, 2).unwrap();
    op.comp_eq(&op.polymer_swap(0, 1).unwrap()).unwrap().ensure_all().unwrap();
    assert_eq!(count_models(&solver, &op), 8);
}

#[test]
fn test_idempotent_binary_ops() {
    let solver = Solver::new();
    let op = Operation::variable(&solver, 2, 2).unwrap();
    op.idempotent().unwrap().ensure_all().unwrap();
    assert_eq!(count_models(&solver, &op), 4);
}

#[test]
fn test_monotone_binary_ops() {
    // 0, 1, x, y, and, or
    let solver = Solver::new();
    let op = Operation::variable(&solver, 2, 2).unwrap();
    op.preserves(&less_or_equal(2)).unwrap().ensure_all().unwrap();
    assert_eq!(count_models(&solver, &op), 6);
}

#[test]
fn test_monotone_idempotent_ternary_ops() {
    let solver = Solver::new();
    let op = Operation::variable(&solver, 2, 3).unwrap();
    op.preserves(&less_or_equal(2)).unwrap().ensure_all().unwrap();
    op.idempotent().unwrap().ensure_all().unwrap();
    let mut seen = 0;
    let count = for_each_model(&solver, &[&op], |values| {
        let table = values[0].decode().unwrap();
        assert_eq!(table[0], 0);
        assert_eq!(table[7], 1);
        seen += 1;
    });
    // monotone Boolean functions of 3 variables, minus the two constants
    assert_eq!(count, 18);
    assert_eq!(seen, count);
}

#[test]
fn test_every_total_model_decodes() {
    let solver = Solver::new();
    let op = Operation::variable(&solver, 3, 1).unwrap();
    let count = for_each_model(&solver, &[&op], |values| {
        let decoded = values[0].decode().unwrap();
        assert!(decoded.iter().all(|&v| v < 3));
        // decoding a constant copy again is stable
        assert_eq!(values[0].solution().unwrap().decode().unwrap(), decoded);
    });
    assert_eq!(count, 27);
}

#[test]
fn test_every_partial_model_decodes() {
    let solver = Solver::new();
    let op = PartialOp::variable(&solver, 2, 2).unwrap();
    let mut count = 0;
    while solver.solve().unwrap() {
        let value = op.solution().unwrap();
        let decoded = value.decode().unwrap();
        assert_eq!(decoded.len(), 4);
        op.comp_ne(&value).unwrap().ensure_all().unwrap();
        count += 1;
    }
    assert_eq!(count, 81);
}

#[test]
fn test_compose_with_projections_is_identity() {
    let solver = Solver::new();
    let op = Operation::variable(&solver, 2, 2).unwrap();
    let projections = [
        Operation::projection(2, 2, 0).unwrap(),
        Operation::projection(2, 2, 1).unwrap(),
    ];
    let composed = op.compose(&projections).unwrap();
    composed.comp_ne(&op).unwrap().ensure_all().unwrap();
    assert!(!solver.solve().unwrap());
}

#[test]
fn test_compose_matches_host_evaluation() {
    let solver = Solver::new();
    let f = Operation::variable(&solver, 2, 2).unwrap();
    let g = Operation::variable(&solver, 2, 1).unwrap();
    let h = Operation::variable(&solver, 2, 1).unwrap();
    let composed = f.compose(&[g.clone(), h.clone()]).unwrap();
    let count = for_each_model(&solver, &[&f, &g, &h, &composed], |values| {
        let f = values[0].decode().unwrap();
        let g = values[1].decode().unwrap();
        let h = values[2].decode().unwrap();
        let result = values[3].decode().unwrap();
        for x in 0..2 {
            assert_eq!(result[x], f[g[x] + 2 * h[x]]);
        }
    });
    assert_eq!(count, 16 * 4 * 4);
}

#[test]
fn test_partial_compose_is_partial() {
    let solver = Solver::new();
    let f = PartialOp::variable(&solver, 2, 1).unwrap();
    let twice = f.compose(&[f.clone()]).unwrap();
    let mut count = 0;
    while solver.solve().unwrap() {
        let value = f.solution().unwrap();
        let values = value.decode().unwrap();
        let result = twice.solution().unwrap().decode().unwrap();
        for x in 0..2 {
            assert_eq!(result[x], values[x].and_then(|y| values[y]));
        }
        f.comp_ne(&value).unwrap().ensure_all().unwrap();
        count += 1;
    }
    assert_eq!(count, 9);
}

#[test]
fn test_table_order() {
    let zero = Operation::constant(2, 1, 0).unwrap();
    let one = Operation::constant(2, 1, 1).unwrap();
    // cell 0 is most significant: the zero table starts with a true cell
    assert_eq!(one.comp_lt(&zero).unwrap().decode().unwrap(), [true]);
    assert_eq!(zero.comp_le(&one).unwrap().decode().unwrap(), [false]);
    assert_eq!(zero.comp_le(&zero).unwrap().decode().unwrap(), [true]);
    assert_eq!(zero.comp_gt(&one).unwrap().decode().unwrap(), [true]);
    assert_eq!(one.comp_ge(&zero).unwrap().decode().unwrap(), [false]);
    assert_eq!(one.comp_ge(&one).unwrap().decode().unwrap(), [true]);
    assert_eq!(one.comp_gt(&one).unwrap().decode().unwrap(), [false]);
}

#[test]
fn test_strict_and_weak_orders_agree() {
    let solver = Solver::new();
    let a = PartialOp::variable(&solver, 2, 1).unwrap();
    let b = PartialOp::variable(&solver, 2, 1).unwrap();
    let gt_lt = a.comp_gt(&b).unwrap().xor(&b.comp_lt(&a).unwrap()).unwrap();
    let ge_le = a.comp_ge(&b).unwrap().xor(&b.comp_le(&a).unwrap()).unwrap();
    let ge_lt = a.comp_ge(&b).unwrap().equ(&a.comp_lt(&b).unwrap()).unwrap();
    gt_lt.or(&ge_le).unwrap().or(&ge_lt).unwrap().ensure_all().unwrap();
    assert!(!solver.solve().unwrap());
    assert!(a.comp_gt(&Operation::constant(2, 2, 0).unwrap().as_partial()).is_err());
}

#[test]
fn test_symmetry_breaking_by_order() {
    // commutative ops, keeping the lexicographically largest of each swap pair
    let solver = Solver::new();
    let op = Operation::variable(&solver, 2, 2).unwrap();
    op.comp_eq(&op.polymer_swap(0, 1).unwrap()).unwrap().ensure_all().unwrap();
    let flip = Operation::from_fn(2, 1, |x| 1 - x[0]).unwrap();
    // conjugate by the swap 0 <-> 1
    let args = [
        flip.compose(&[Operation::projection(2, 2, 0).unwrap()]).unwrap(),
        flip.compose(&[Operation::projection(2, 2, 1).unwrap()]).unwrap(),
    ];
    let conjugate = flip.compose(&[op.compose(&args).unwrap()]).unwrap();
    conjugate.comp_le(&op).unwrap().ensure_all().unwrap();
    // no commutative op is its own conjugate, so one of each pair remains
    assert_eq!(count_models(&solver, &op), 4);
}

#[test]
fn test_shape_errors() {
    let add = Operation::from_fn(2, 2, |x| (x[0] + x[1]) % 2).unwrap();
    let id = Operation::projection(2, 1, 0).unwrap();
    assert!(add.compose(&[id.clone()]).is_err());
    assert!(add.compose(&[id.clone(), Operation::projection(2, 2, 0).unwrap()]).is_err());
    assert!(Operation::constant(2, 0, 1).unwrap().compose(&[]).is_err());
    assert!(add.image(&Relation::full(3, 1).unwrap()).is_err());
    assert!(add.comp_eq(&id.polymer_insert(0).unwrap()).is_ok());
}
