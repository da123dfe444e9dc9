//! Cross-checks of the evaluate encodings
//!
//! Each specialized strategy is compared with the generic construction on
//! fully variable inputs, for every universe size up to 3, relation arity up
//! to 3 and operation arity up to 3. A cell where the two images differ in
//! some model would make the solve under that difference satisfiable.

use algsat::{EvalStrategy, Operation, Relation, Solver};

fn check_strategy(strategy: EvalStrategy, size: usize, k: usize, g: usize) {
    assert!(strategy.applies(k, g), "{strategy} with k={k} g={g}");
    let solver = Solver::new();
    let rel = Relation::variable(&solver, size, k).unwrap();
    let graphs: Vec<Relation> = (0..k)
        .map(|_| Relation::variable(&solver, size, g).unwrap())
        .collect();
    let generic = rel.evaluate_using(EvalStrategy::Generic, &graphs).unwrap();
    let image = rel.evaluate_using(strategy, &graphs).unwrap();
    assert_eq!(image.arity(), k);
    let diff = image.table().xor(generic.table()).unwrap();
    for (cell, lit) in diff.iter().enumerate() {
        assert!(
            !solver.solve_with(&[lit]).unwrap(),
            "{strategy} differs from generic at size={size} k={k} g={g} cell={cell}"
        );
    }
}

/// Every shape in range that the strategy accepts
fn check_all_shapes(strategy: EvalStrategy) -> usize {
    let mut shapes = 0;
    for size in 1..=3 {
        for k in 1..=3 {
            for g in 1..=4 {
                if strategy.applies(k, g) {
                    check_strategy(strategy, size, k, g);
                    shapes += 1;
                }
            }
        }
    }
    shapes
}

#[test]
fn test_constants_strategy() {
    assert_eq!(check_all_shapes(EvalStrategy::Constants), 9);
}

#[test]
fn test_unary_relation_strategy() {
    assert_eq!(check_all_shapes(EvalStrategy::UnaryRelation), 12);
}

#[test]
fn test_unary_ops_strategy() {
    assert_eq!(check_all_shapes(EvalStrategy::UnaryOps), 9);
}

#[test]
fn test_binary_relation_strategy() {
    assert_eq!(check_all_shapes(EvalStrategy::BinaryRelation), 12);
}

#[test]
fn test_binary_ops_strategy() {
    assert_eq!(check_all_shapes(EvalStrategy::BinaryOps), 9);
}

#[test]
fn test_unary_ops_on_wide_relation() {
    for size in 2..=3 {
        check_strategy(EvalStrategy::UnaryOps, size, 4, 2);
    }
}

#[test]
fn test_image_of_constant_relation() {
    let not = Operation::from_fn(2, 1, |x| 1 - x[0]).unwrap().as_relation();
    let id = Operation::projection(2, 1, 0).unwrap().as_relation();
    let rel = Relation::from_tuples(2, 2, [[0, 1]]).unwrap();
    let image = rel.evaluate(&[not, id]).unwrap();
    assert_eq!(image.tuples().unwrap(), vec![vec![1, 1]]);
}

#[test]
fn test_image_under_binary_op() {
    // max applied to pairs drawn from {(0, 1), (1, 0)}
    let max = Operation::from_fn(2, 2, |x| x[0].max(x[1])).unwrap();
    let rel = Relation::from_tuples(2, 2, [[0, 1], [1, 0]]).unwrap();
    let image = max.image(&rel).unwrap();
    assert_eq!(image.tuples().unwrap(), vec![vec![1, 0], vec![0, 1], vec![1, 1]]);
}

#[test]
fn test_nullary_graphs_on_empty_relation() {
    // constants read no tuple of the relation
    let zero = Operation::constant(3, 0, 0).unwrap().as_relation();
    let two = Operation::constant(3, 0, 2).unwrap().as_relation();
    let empty = Relation::empty(3, 2).unwrap();
    let image = empty.evaluate(&[zero, two]).unwrap();
    assert_eq!(image.tuples().unwrap(), vec![vec![0, 2]]);
}

#[test]
fn test_evaluate_errors() {
    let graph = Relation::full(2, 2).unwrap();
    let rel = Relation::full(2, 2).unwrap();
    assert!(Relation::full(2, 0).unwrap().evaluate(&[]).is_err());
    assert!(rel.evaluate(&[graph.clone(), Relation::full(3, 2).unwrap()]).is_err());
    assert!(rel.evaluate(&[graph, Relation::full(2, 0).unwrap()]).is_err());
}
