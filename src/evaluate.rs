//! Relational image of a relation under operations.
//!
//! For a `k`-ary relation `R` and `k` operation graphs of common arity
//! `g = m + 1` (coordinate 0 the output), [`Relation::evaluate`] builds
//!
//! ```text
//! E(y_0, ..., y_{k-1})  <=>  exists r^1, ..., r^m in R .
//!                             forall j . graph_j(y_j, r^1_j, ..., r^m_j)
//! ```
//!
//! The generic construction materializes a table of `size^(k*g)` cells. The
//! shapes that dominate in practice have cheaper encodings which quantify one
//! coordinate block at a time; [`EvalStrategy`] names them and picks the
//! first one that applies.

use std::fmt;

use tracing::trace;

use crate::error::{check_shape, Error, Result};
use crate::relation::Relation;

/// Encoding used for one evaluate call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EvalStrategy {
    /// Nullary operations: a product of constants
    Constants,
    /// Unary relation: quantify one argument of the single graph at a time
    UnaryRelation,
    /// Unary operations: map one coordinate of the relation at a time
    UnaryOps,
    /// Binary relation: thread both columns through the relation in turn
    BinaryRelation,
    /// Binary operations: pair up two copies of the relation
    BinaryOps,
    /// Full product of every graph and relation copy
    Generic,
}

impl EvalStrategy {
    pub const ALL: [EvalStrategy; 6] = [
        EvalStrategy::Constants,
        EvalStrategy::UnaryRelation,
        EvalStrategy::UnaryOps,
        EvalStrategy::BinaryRelation,
        EvalStrategy::BinaryOps,
        EvalStrategy::Generic,
    ];

    /// Whether the strategy handles relation arity `k` and graph arity `g`
    pub fn applies(self, k: usize, g: usize) -> bool {
        match self {
            EvalStrategy::Constants => g == 1,
            EvalStrategy::UnaryRelation => k == 1,
            EvalStrategy::UnaryOps => g == 2,
            EvalStrategy::BinaryRelation => k == 2,
            EvalStrategy::BinaryOps => g == 3,
            EvalStrategy::Generic => true,
        }
    }

    /// The first applicable strategy in declaration order
    pub fn select(k: usize, g: usize) -> EvalStrategy {
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.applies(k, g))
            .unwrap_or(EvalStrategy::Generic)
    }
}

impl fmt::Display for EvalStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EvalStrategy::Constants => "constants",
            EvalStrategy::UnaryRelation => "unary-relation",
            EvalStrategy::UnaryOps => "unary-ops",
            EvalStrategy::BinaryRelation => "binary-relation",
            EvalStrategy::BinaryOps => "binary-ops",
            EvalStrategy::Generic => "generic",
        };
        f.write_str(name)
    }
}

impl Relation {
    /// Image of the relation under coordinate-wise application of operations.
    ///
    /// `graphs[j]` is the graph of the operation applied at coordinate `j`.
    pub fn evaluate(&self, graphs: &[Relation]) -> Result<Relation> {
        let g = self.check_graphs(graphs)?;
        self.evaluate_using(EvalStrategy::select(self.arity(), g), graphs)
    }

    /// [`Relation::evaluate`] with a forced encoding
    pub fn evaluate_using(&self, strategy: EvalStrategy, graphs: &[Relation]) -> Result<Relation> {
        let k = self.arity();
        let g = self.check_graphs(graphs)?;
        if !strategy.applies(k, g) {
            return Err(Error::Shape(format!(
                "strategy {strategy} does not apply to relation arity {k} and graph arity {g}"
            )));
        }
        trace!(%strategy, k, g, size = self.size(), "evaluate");
        match strategy {
            EvalStrategy::Constants => self.eval_constants(graphs),
            EvalStrategy::UnaryRelation => self.eval_unary_relation(&graphs[0]),
            EvalStrategy::UnaryOps => self.eval_unary_ops(graphs),
            EvalStrategy::BinaryRelation => self.eval_binary_relation(&graphs[0], &graphs[1]),
            EvalStrategy::BinaryOps => self.eval_binary_ops(graphs),
            EvalStrategy::Generic => self.eval_generic(graphs),
        }
    }

    /// Common graph arity, after checking every precondition
    fn check_graphs(&self, graphs: &[Relation]) -> Result<usize> {
        check_shape!(self.arity() >= 1, "evaluate of a nullary relation");
        check_shape!(
            graphs.len() == self.arity(),
            "evaluate of an arity {} relation with {} graphs",
            self.arity(),
            graphs.len()
        );
        let g = graphs[0].arity();
        for graph in graphs {
            check_shape!(
                graph.size() == self.size(),
                "graph over size {} applied to relation over size {}",
                graph.size(),
                self.size()
            );
            check_shape!(
                graph.arity() == g && g >= 1,
                "graphs of arities {} and {}",
                g,
                graph.arity()
            );
        }
        Ok(g)
    }

    fn eval_constants(&self, graphs: &[Relation]) -> Result<Relation> {
        let k = self.arity();
        let mut result = Relation::full(self.size(), k)?;
        for (j, graph) in graphs.iter().enumerate() {
            result = result.and(&graph.polymer(&[j], k)?)?;
        }
        Ok(result)
    }

    fn eval_unary_relation(&self, graph: &Relation) -> Result<Relation> {
        // arguments first, output last
        let mut test = graph.polymer_rotate(-1)?;
        while test.arity() > 1 {
            test = test.and(&self.polymer(&[0], test.arity())?)?;
            test = test.fold_any(1)?;
        }
        Ok(test)
    }

    fn eval_unary_ops(&self, graphs: &[Relation]) -> Result<Relation> {
        let mut test = self.clone();
        for graph in graphs {
            test = test.polymer_insert(0)?;
            test = test.and(&graph.polymer(&[0, 1], test.arity())?)?;
            test = test.polymer_rotate(-1)?.fold_any(1)?;
        }
        Ok(test)
    }

    fn eval_binary_relation(&self, graph0: &Relation, graph1: &Relation) -> Result<Relation> {
        let g = graph0.arity();
        let pairs = self.polymer(&[0, 1], g + 1)?;

        // (r^1_0, ..., r^m_0, y_0): replace each first column by its partner
        let mut test = graph0.polymer_rotate(-1)?;
        for _ in 1..g {
            test = test.polymer_insert(1)?;
            test = test.and(&pairs)?.fold_any(1)?;
            test = test.polymer_rotate(-1)?;
        }

        // (y_0, r^1_1, ..., r^m_1)
        test = test.polymer_insert(1)?;
        test = test.and(&graph1.polymer_insert(0)?)?;
        test.polymer_rotate(-2)?.fold_any(g - 1)
    }

    fn eval_binary_ops(&self, graphs: &[Relation]) -> Result<Relation> {
        let k = self.arity();
        let evens: Vec<usize> = (0..k).map(|i| 2 * i).collect();
        let odds: Vec<usize> = (0..k).map(|i| 2 * i + 1).collect();
        let first = self.polymer(&evens, 2 * k)?;
        let second = self.polymer(&odds, 2 * k)?;

        // (a_0, b_0, a_1, b_1, ...) with a, b in R
        let mut test = first.and(&second)?;
        for graph in graphs {
            test = test.polymer_insert(0)?;
            test = test.and(&graph.polymer(&[0, 1, 2], test.arity())?)?;
            test = test.polymer_rotate(-1)?.fold_any(2)?;
        }
        Ok(test)
    }

    fn eval_generic(&self, graphs: &[Relation]) -> Result<Relation> {
        let k = self.arity();
        let g = graphs[0].arity();
        let total = k * g;

        // coordinate c * k + j is argument c of graph j (c = 0 the output)
        let mut test = Relation::full(self.size(), total)?;
        for (j, graph) in graphs.iter().enumerate() {
            let targets: Vec<usize> = (j..total).step_by(k).collect();
            test = test.and(&graph.polymer(&targets, total)?)?;
        }
        for c in 1..g {
            let targets: Vec<usize> = (c * k..(c + 1) * k).collect();
            test = test.and(&self.polymer(&targets, total)?)?;
        }
        // k fits in isize for any table that fits in memory
        test.polymer_rotate(-(k as isize))?.fold_any(k * (g - 1))
    }
}
