//! Total and partial operations as one-hot output tables.
//!
//! An operation of arity `a` over `0..size` is a table of `size^(a+1)` cells:
//! one block of `size` cells per input tuple, in flat input order. Viewed as a
//! relation of arity `a + 1` (its *graph*) the output is coordinate 0 and the
//! inputs follow.
//!
//! # Key Types
//!
//! - [`OpTable`]: the table, parameterized by its [`Functionality`]
//! - [`Operation`]: every block has exactly one true cell
//! - [`PartialOp`]: every block has at most one true cell; an all-false block
//!   means the operation is undefined at that input and decodes to `None`
//!
//! The block invariant is asserted once, when fresh variables are allocated.
//! Combinators never re-assert it.

use std::fmt;
use std::marker::PhantomData;

use crate::bitvec::BitVec;
use crate::error::{check_shape, Error, Result};
use crate::relation::Relation;
use crate::sat::{Context, Solver};
use crate::table::{self, power};

mod sealed {
    pub trait Sealed {}
}

/// How many true cells an output block may hold.
pub trait Functionality: sealed::Sealed + Clone + Copy + fmt::Debug + PartialEq + 'static {
    /// Decoded value of one block
    type Value: Clone + fmt::Debug + PartialEq;

    /// Assert the block invariant on fresh variables
    fn constrain(block: &BitVec) -> Result<()>;

    /// Fold the output coordinate of a graph into the block invariant
    fn fold_output(graph: &Relation) -> Result<Relation>;

    /// Decode a block of host booleans
    fn decode_block(index: usize, cells: &[bool]) -> Result<Self::Value>;

    /// One-hot cells of a value
    fn encode(size: usize, value: &Self::Value) -> Result<Vec<bool>>;
}

/// Exactly one output per input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Total;

/// At most one output per input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Partial;

impl sealed::Sealed for Total {}
impl sealed::Sealed for Partial {}

fn true_cells(cells: &[bool]) -> (usize, Option<usize>) {
    let count = cells.iter().filter(|&&c| c).count();
    (count, cells.iter().position(|&c| c))
}

fn one_hot(size: usize, value: Option<usize>) -> Result<Vec<bool>> {
    let mut cells = vec![false; size];
    if let Some(value) = value {
        check_shape!(value < size, "value {} out of range for size {}", value, size);
        cells[value] = true;
    }
    Ok(cells)
}

impl Functionality for Total {
    type Value = usize;

    fn constrain(block: &BitVec) -> Result<()> {
        block.ensure_one()
    }

    fn fold_output(graph: &Relation) -> Result<Relation> {
        graph.fold_one(1)
    }

    fn decode_block(index: usize, cells: &[bool]) -> Result<usize> {
        match true_cells(cells) {
            (1, Some(value)) => Ok(value),
            (count, _) => Err(Error::InvalidBlock { index, count }),
        }
    }

    fn encode(size: usize, value: &usize) -> Result<Vec<bool>> {
        one_hot(size, Some(*value))
    }
}

impl Functionality for Partial {
    type Value = Option<usize>;

    fn constrain(block: &BitVec) -> Result<()> {
        block.ensure_amo()
    }

    fn fold_output(graph: &Relation) -> Result<Relation> {
        graph.fold_amo(1)
    }

    fn decode_block(index: usize, cells: &[bool]) -> Result<Option<usize>> {
        match true_cells(cells) {
            (0, _) => Ok(None),
            (1, value) => Ok(value),
            (count, _) => Err(Error::InvalidBlock { index, count }),
        }
    }

    fn encode(size: usize, value: &Option<usize>) -> Result<Vec<bool>> {
        one_hot(size, *value)
    }
}

/// An operation table with functionality `F`.
#[derive(Clone, Debug, PartialEq)]
pub struct OpTable<F: Functionality> {
    size: usize,
    arity: usize,
    table: BitVec,
    kind: PhantomData<F>,
}

/// A total operation.
pub type Operation = OpTable<Total>;

/// A partial operation.
pub type PartialOp = OpTable<Partial>;

impl<F: Functionality> OpTable<F> {
    /// Wrap a table without asserting the block invariant
    pub fn from_table(size: usize, arity: usize, table: BitVec) -> Result<Self> {
        check_shape!(size >= 1, "universe size must be positive");
        let cells = power(size, arity + 1)?;
        check_shape!(
            table.len() == cells,
            "operation of size {} and arity {} needs {} cells, got {}",
            size,
            arity,
            cells,
            table.len()
        );
        Ok(Self {
            size,
            arity,
            table,
            kind: PhantomData,
        })
    }

    /// Fresh variables with the block invariant asserted
    pub fn variable(solver: &Solver, size: usize, arity: usize) -> Result<Self> {
        check_shape!(size >= 1, "universe size must be positive");
        let table = BitVec::variable(solver, power(size, arity + 1)?);
        let op = Self::from_table(size, arity, table)?;
        for index in 0..op.num_blocks() {
            F::constrain(&op.block(index)?)?;
        }
        Ok(op)
    }

    /// A constant operation from its values in flat input order
    pub fn from_values(size: usize, arity: usize, values: &[F::Value]) -> Result<Self> {
        let blocks = power(size, arity)?;
        check_shape!(
            values.len() == blocks,
            "operation of size {} and arity {} needs {} values, got {}",
            size,
            arity,
            blocks,
            values.len()
        );
        let mut cells = Vec::with_capacity(table::blocks(blocks, size)?);
        for value in values {
            cells.extend(F::encode(size, value)?);
        }
        Self::from_table(size, arity, BitVec::constant(cells))
    }

    /// A constant operation computed by a host function
    pub fn from_fn(
        size: usize,
        arity: usize,
        f: impl Fn(&[usize]) -> F::Value,
    ) -> Result<Self> {
        let values: Vec<F::Value> = (0..power(size, arity)?)
            .map(|index| f(&table::tuple_of(size, arity, index)))
            .collect();
        Self::from_values(size, arity, &values)
    }

    /// Wrap the graph of an operation
    pub fn from_graph(graph: Relation) -> Result<Self> {
        check_shape!(graph.arity() >= 1, "graph of an operation has arity at least 1");
        Self::from_table(graph.size(), graph.arity() - 1, graph.into_table())
    }

    /// The operation returning coordinate `coord` of its input
    pub fn projection(size: usize, arity: usize, coord: usize) -> Result<Self> {
        check_shape!(
            coord < arity,
            "projection to coordinate {} of arity {}",
            coord,
            arity
        );
        let graph = Relation::diagonal(size, 2)?.polymer(&[0, coord + 1], arity + 1)?;
        Self::from_graph(graph)
    }

    /// The operation with the same output everywhere
    pub fn constant(size: usize, arity: usize, value: usize) -> Result<Self> {
        let point = Relation::from_tuples(size, 1, [[value]])?;
        Self::from_graph(point.polymer(&[0], arity + 1)?)
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn arity(&self) -> usize {
        self.arity
    }

    pub fn table(&self) -> &BitVec {
        &self.table
    }

    pub fn context(&self) -> &Context {
        self.table.context()
    }

    /// Number of output blocks, `size^arity`
    pub fn num_blocks(&self) -> usize {
        self.table.len() / self.size
    }

    /// Output block of the input with flat index `index`
    pub fn block(&self, index: usize) -> Result<BitVec> {
        self.table.slice(index * self.size..(index + 1) * self.size)
    }

    /// Output block of an input tuple
    pub fn block_at(&self, inputs: &[usize]) -> Result<BitVec> {
        check_shape!(
            inputs.len() == self.arity,
            "{} inputs to an operation of arity {}",
            inputs.len(),
            self.arity
        );
        self.block(table::flat_index(self.size, inputs)?)
    }

    /// The graph: output at coordinate 0, inputs after it
    pub fn as_relation(&self) -> Relation {
        Relation::from_parts(self.size, self.arity + 1, self.table.clone())
    }

    // ========================================================================
    // REINDEXING
    // ========================================================================

    /// Reindex the inputs; output blocks are moved whole
    pub fn polymer(&self, new_vars: &[usize], new_arity: usize) -> Result<Self> {
        check_shape!(
            new_vars.len() == self.arity,
            "polymer of arity {} operation with {} targets",
            self.arity,
            new_vars.len()
        );
        let lits = table::reindex(self.table.lits(), self.size, self.size, new_vars, new_arity)?;
        Self::from_table(
            self.size,
            new_arity,
            BitVec::with_context(self.context().clone(), lits),
        )
    }

    pub fn polymer_swap(&self, i: usize, j: usize) -> Result<Self> {
        check_shape!(
            i < self.arity && j < self.arity,
            "swap of inputs {} and {} in arity {}",
            i,
            j,
            self.arity
        );
        self.polymer(&table::swap_vars(self.arity, i, j), self.arity)
    }

    pub fn polymer_rotate(&self, offset: isize) -> Result<Self> {
        self.polymer(&table::rotate_vars(self.arity, offset), self.arity)
    }

    /// Add an ignored input at position `pos`
    pub fn polymer_insert(&self, pos: usize) -> Result<Self> {
        check_shape!(
            pos <= self.arity,
            "insert position {} beyond arity {}",
            pos,
            self.arity
        );
        self.polymer(&table::insert_vars(self.arity, pos), self.arity + 1)
    }

    // ========================================================================
    // CLONE OPERATIONS
    // ========================================================================

    /// Substitute `args` into the inputs: `x -> self(args[0](x), ...)`.
    ///
    /// The result has the common arity of the arguments. Its block invariant
    /// (exactly one or at most one output) is asserted on the composed graph.
    pub fn compose(&self, args: &[OpTable<F>]) -> Result<Self> {
        check_shape!(self.arity >= 1, "compose of a nullary operation");
        check_shape!(
            args.len() == self.arity,
            "operation of arity {} composed with {} arguments",
            self.arity,
            args.len()
        );
        let new_arity = args[0].arity;
        for arg in args {
            check_shape!(
                arg.size == self.size && arg.arity == new_arity,
                "argument of shape {}^{} where {}^{} expected",
                arg.size,
                arg.arity,
                self.size,
                new_arity
            );
        }

        // 0..arity: inner outputs, arity: result, arity+1..: new inputs
        let total = self.arity + 1 + new_arity;
        let mut targets = vec![self.arity];
        targets.extend(0..self.arity);
        let mut test = self.as_relation().polymer(&targets, total)?;
        for (idx, arg) in args.iter().enumerate() {
            let mut targets = vec![idx];
            targets.extend(self.arity + 1..total);
            test = test.and(&arg.as_relation().polymer(&targets, total)?)?;
        }
        let graph = test.fold_any(self.arity)?;
        F::fold_output(&graph)?.table().ensure_all()?;
        Self::from_graph(graph)
    }

    /// Image of a relation: every coordinate mapped through this operation
    pub fn image(&self, rel: &Relation) -> Result<Relation> {
        check_shape!(
            rel.size() == self.size,
            "operation over size {} applied to relation over size {}",
            self.size,
            rel.size()
        );
        if rel.arity() == 0 {
            // no coordinates: a constant makes the empty tuple, anything else copies it
            return if self.arity == 0 {
                Relation::full(self.size, 0)
            } else {
                Ok(rel.clone())
            };
        }
        let graph = self.as_relation();
        rel.evaluate(&vec![graph; rel.arity()])
    }

    /// The relation is closed under this operation, as one literal
    pub fn preserves(&self, rel: &Relation) -> Result<BitVec> {
        self.image(rel)?.subset_of(rel)
    }

    /// `f(x, ..., x) == x` for all `x`, as one literal
    pub fn idempotent(&self) -> Result<BitVec> {
        let diagonal = self.polymer(&vec![0; self.arity], 1)?;
        let identity = Self::projection(self.size, 1, 0)?;
        diagonal.table.comp_eq(&identity.table)
    }

    /// Inputs where the operation is defined
    pub fn domain(&self) -> Result<Relation> {
        self.as_relation().fold_any(1)
    }

    // ========================================================================
    // COMPARISONS
    // ========================================================================

    fn check_same_shape(&self, other: &Self) -> Result<()> {
        check_shape!(
            self.size == other.size && self.arity == other.arity,
            "operations of shape {}^{} and {}^{}",
            self.size,
            self.arity,
            other.size,
            other.arity
        );
        Ok(())
    }

    pub fn comp_eq(&self, other: &Self) -> Result<BitVec> {
        self.check_same_shape(other)?;
        self.table.comp_eq(&other.table)
    }

    pub fn comp_ne(&self, other: &Self) -> Result<BitVec> {
        self.check_same_shape(other)?;
        self.table.comp_ne(&other.table)
    }

    /// Table comparison in flat order, cell 0 most significant
    pub fn comp_lt(&self, other: &Self) -> Result<BitVec> {
        self.check_same_shape(other)?;
        self.table.comp_lt(&other.table)
    }

    pub fn comp_le(&self, other: &Self) -> Result<BitVec> {
        self.check_same_shape(other)?;
        self.table.comp_le(&other.table)
    }

    pub fn comp_gt(&self, other: &Self) -> Result<BitVec> {
        self.check_same_shape(other)?;
        self.table.comp_gt(&other.table)
    }

    pub fn comp_ge(&self, other: &Self) -> Result<BitVec> {
        self.check_same_shape(other)?;
        self.table.comp_ge(&other.table)
    }

    // ========================================================================
    // MODELS
    // ========================================================================

    /// Constant copy fixed to the current model
    pub fn solution(&self) -> Result<Self> {
        Self::from_table(self.size, self.arity, self.table.solution()?)
    }

    /// Values of a constant operation in flat input order
    pub fn decode(&self) -> Result<Vec<F::Value>> {
        let cells = self.table.decode()?;
        cells
            .chunks(self.size)
            .enumerate()
            .map(|(index, block)| F::decode_block(index, block))
            .collect()
    }
}

impl Operation {
    /// The same table as a partial operation
    pub fn as_partial(&self) -> PartialOp {
        OpTable {
            size: self.size,
            arity: self.arity,
            table: self.table.clone(),
            kind: PhantomData,
        }
    }
}
