//! Finite relations as flattened truth tables.
//!
//! A [`Relation`] of arity `a` over a universe of `size` elements holds one
//! literal per tuple, `size^a` in total. All derived relations are computed
//! from two primitives: [`Relation::polymer`] (reindexing) and the folds,
//! which quantify away the lowest coordinates.
//!
//! # Key Types
//!
//! - [`Relation`]: the table with its size and arity
//!
//! The relational image under operations lives in [`crate::evaluate`].

use std::ops::Not;

use crate::bitvec::BitVec;
use crate::error::{check_shape, Result};
use crate::operation::{Functionality, OpTable};
use crate::sat::{Context, Gates, Lit, Solver};
use crate::table::{self, power};

use tracing::trace;

/// A relation of fixed arity over `0..size`.
#[derive(Clone, Debug, PartialEq)]
pub struct Relation {
    size: usize,
    arity: usize,
    table: BitVec,
}

impl Relation {
    /// Wrap a table, checking its length
    pub fn new(size: usize, arity: usize, table: BitVec) -> Result<Self> {
        check_shape!(size >= 1, "universe size must be positive");
        let cells = power(size, arity)?;
        check_shape!(
            table.len() == cells,
            "relation of size {} and arity {} needs {} cells, got {}",
            size,
            arity,
            cells,
            table.len()
        );
        Ok(Self { size, arity, table })
    }

    /// Wrap a table whose length is already known to be `size^arity`
    pub(crate) fn from_parts(size: usize, arity: usize, table: BitVec) -> Self {
        debug_assert_eq!(power(size, arity), Ok(table.len()));
        Self { size, arity, table }
    }

    /// A relation of fresh variables
    pub fn variable(solver: &Solver, size: usize, arity: usize) -> Result<Self> {
        check_shape!(size >= 1, "universe size must be positive");
        let table = BitVec::variable(solver, power(size, arity)?);
        Self::new(size, arity, table)
    }

    /// A constant relation from its truth table in flat order
    pub fn from_bools(
        size: usize,
        arity: usize,
        values: impl IntoIterator<Item = bool>,
    ) -> Result<Self> {
        Self::new(size, arity, BitVec::constant(values))
    }

    /// The constant relation holding exactly the listed tuples
    pub fn from_tuples<T: AsRef<[usize]>>(
        size: usize,
        arity: usize,
        tuples: impl IntoIterator<Item = T>,
    ) -> Result<Self> {
        check_shape!(size >= 1, "universe size must be positive");
        let mut values = vec![false; power(size, arity)?];
        for tuple in tuples {
            let tuple = tuple.as_ref();
            check_shape!(
                tuple.len() == arity,
                "tuple of length {} in a relation of arity {}",
                tuple.len(),
                arity
            );
            values[table::flat_index(size, tuple)?] = true;
        }
        Self::from_bools(size, arity, values)
    }

    /// The relation holding every tuple
    pub fn full(size: usize, arity: usize) -> Result<Self> {
        Self::from_bools(size, arity, std::iter::repeat(true).take(power(size, arity)?))
    }

    /// The relation holding no tuple
    pub fn empty(size: usize, arity: usize) -> Result<Self> {
        Self::from_bools(size, arity, std::iter::repeat(false).take(power(size, arity)?))
    }

    /// Tuples whose coordinates are all equal
    pub fn diagonal(size: usize, arity: usize) -> Result<Self> {
        let cells = power(size, arity)?;
        let mut step = 0;
        for exp in 0..arity {
            step += power(size, exp)?;
        }
        let mut values = vec![false; cells];
        for x in 0..size {
            values[x * step] = true;
        }
        Self::from_bools(size, arity, values)
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

    pub fn into_table(self) -> BitVec {
        self.table
    }

    pub fn context(&self) -> &Context {
        self.table.context()
    }

    /// Literal of one tuple
    pub fn get(&self, tuple: &[usize]) -> Result<Lit> {
        check_shape!(
            tuple.len() == self.arity,
            "tuple of length {} in a relation of arity {}",
            tuple.len(),
            self.arity
        );
        Ok(self.table[table::flat_index(self.size, tuple)?])
    }

    fn with_table(&self, arity: usize, table: BitVec) -> Result<Relation> {
        Relation::new(self.size, arity, table)
    }

    // ========================================================================
    // REINDEXING
    // ========================================================================

    /// Reindex: source coordinate `i` becomes target coordinate `new_vars[i]`.
    ///
    /// `new_vars` must have one entry per coordinate. Repeated targets take
    /// the diagonal and untargeted coordinates are broadcast.
    pub fn polymer(&self, new_vars: &[usize], new_arity: usize) -> Result<Relation> {
        check_shape!(
            new_vars.len() == self.arity,
            "polymer of arity {} relation with {} targets",
            self.arity,
            new_vars.len()
        );
        let lits = table::reindex(self.table.lits(), self.size, 1, new_vars, new_arity)?;
        self.with_table(new_arity, BitVec::with_context(self.context().clone(), lits))
    }

    /// Exchange coordinates `i` and `j`
    pub fn polymer_swap(&self, i: usize, j: usize) -> Result<Relation> {
        check_shape!(
            i < self.arity && j < self.arity,
            "swap of coordinates {} and {} in arity {}",
            i,
            j,
            self.arity
        );
        self.polymer(&table::swap_vars(self.arity, i, j), self.arity)
    }

    /// Cyclic shift: coordinate `i` becomes `(i + offset) mod arity`
    pub fn polymer_rotate(&self, offset: isize) -> Result<Relation> {
        self.polymer(&table::rotate_vars(self.arity, offset), self.arity)
    }

    /// Open a fresh broadcast coordinate at `pos`
    pub fn polymer_insert(&self, pos: usize) -> Result<Relation> {
        check_shape!(
            pos <= self.arity,
            "insert position {} beyond arity {}",
            pos,
            self.arity
        );
        self.polymer(&table::insert_vars(self.arity, pos), self.arity + 1)
    }

    // ========================================================================
    // FOLDING
    // ========================================================================

    fn fold(&self, count: usize, gate: fn(&mut dyn Gates, &[Lit]) -> Lit) -> Result<Relation> {
        check_shape!(
            count <= self.arity,
            "fold of {} coordinates in arity {}",
            count,
            self.arity
        );
        let chunk = power(self.size, count)?;
        let context = self.context().clone();
        let lits: Vec<Lit> = context.with_gates(|g| {
            self.table
                .lits()
                .chunks(chunk)
                .map(|cells| gate(g, cells))
                .collect()
        });
        self.with_table(self.arity - count, BitVec::with_context(context, lits))
    }

    /// Existentially quantify the `count` lowest coordinates
    pub fn fold_any(&self, count: usize) -> Result<Relation> {
        self.fold(count, |g, lits| g.fold_any(lits))
    }

    /// Universally quantify the `count` lowest coordinates
    pub fn fold_all(&self, count: usize) -> Result<Relation> {
        self.fold(count, |g, lits| g.fold_all(lits))
    }

    /// Exactly one witness among the `count` lowest coordinates
    pub fn fold_one(&self, count: usize) -> Result<Relation> {
        self.fold(count, |g, lits| g.fold_one(lits))
    }

    /// At most one witness among the `count` lowest coordinates
    pub fn fold_amo(&self, count: usize) -> Result<Relation> {
        self.fold(count, |g, lits| g.fold_amo(lits))
    }

    // ========================================================================
    // BOOLEAN ALGEBRA
    // ========================================================================

    fn check_same_shape(&self, other: &Relation) -> Result<()> {
        check_shape!(
            self.size == other.size && self.arity == other.arity,
            "relations of shape {}^{} and {}^{}",
            self.size,
            self.arity,
            other.size,
            other.arity
        );
        Ok(())
    }

    fn zip(
        &self,
        other: &Relation,
        op: fn(&BitVec, &BitVec) -> Result<BitVec>,
    ) -> Result<Relation> {
        self.check_same_shape(other)?;
        self.with_table(self.arity, op(&self.table, &other.table)?)
    }

    pub fn and(&self, other: &Relation) -> Result<Relation> {
        self.zip(other, BitVec::and)
    }

    pub fn or(&self, other: &Relation) -> Result<Relation> {
        self.zip(other, BitVec::or)
    }

    pub fn xor(&self, other: &Relation) -> Result<Relation> {
        self.zip(other, BitVec::xor)
    }

    pub fn equ(&self, other: &Relation) -> Result<Relation> {
        self.zip(other, BitVec::equ)
    }

    pub fn imp(&self, other: &Relation) -> Result<Relation> {
        self.zip(other, BitVec::imp)
    }

    /// Tables equal as sets
    pub fn comp_eq(&self, other: &Relation) -> Result<BitVec> {
        self.check_same_shape(other)?;
        self.table.comp_eq(&other.table)
    }

    pub fn comp_ne(&self, other: &Relation) -> Result<BitVec> {
        self.check_same_shape(other)?;
        self.table.comp_ne(&other.table)
    }

    /// Table comparison in flat order, cell 0 most significant
    pub fn comp_lt(&self, other: &Relation) -> Result<BitVec> {
        self.check_same_shape(other)?;
        self.table.comp_lt(&other.table)
    }

    pub fn comp_le(&self, other: &Relation) -> Result<BitVec> {
        self.check_same_shape(other)?;
        self.table.comp_le(&other.table)
    }

    pub fn comp_gt(&self, other: &Relation) -> Result<BitVec> {
        self.check_same_shape(other)?;
        self.table.comp_gt(&other.table)
    }

    pub fn comp_ge(&self, other: &Relation) -> Result<BitVec> {
        self.check_same_shape(other)?;
        self.table.comp_ge(&other.table)
    }

    /// Inclusion `self ⊆ other` as a single literal
    pub fn subset_of(&self, other: &Relation) -> Result<BitVec> {
        Ok(self.imp(other)?.table.fold_all())
    }

    // ========================================================================
    // PROPERTIES
    // ========================================================================

    fn check_binary(&self, what: &str) -> Result<()> {
        check_shape!(
            self.arity == 2,
            "{} needs a binary relation, got arity {}",
            what,
            self.arity
        );
        Ok(())
    }

    /// Every constant tuple `(x, ..., x)` is in the relation
    pub fn reflexive(&self) -> Result<BitVec> {
        let diagonal = self.polymer(&vec![0; self.arity], 1)?;
        Ok(diagonal.fold_all(1)?.table)
    }

    pub fn symmetric(&self) -> Result<BitVec> {
        self.check_binary("symmetric")?;
        let converse = self.polymer(&[1, 0], 2)?;
        Ok(self.imp(&converse)?.fold_all(2)?.table)
    }

    pub fn antisymmetric(&self) -> Result<BitVec> {
        self.check_binary("antisymmetric")?;
        let both = self.and(&self.polymer(&[1, 0], 2)?)?;
        let diagonal = Relation::diagonal(self.size, 2)?;
        Ok(both.imp(&diagonal)?.fold_all(2)?.table)
    }

    /// Relational product: `(x, z)` whenever `x self y` and `y other z`
    pub fn compose(&self, other: &Relation) -> Result<Relation> {
        self.check_binary("compose")?;
        other.check_binary("compose")?;
        self.check_same_shape(other)?;
        let left = self.polymer(&[1, 0], 3)?;
        let right = other.polymer(&[0, 2], 3)?;
        left.and(&right)?.fold_any(1)
    }

    pub fn transitive(&self) -> Result<BitVec> {
        let square = self.compose(self)?;
        Ok(square.imp(self)?.fold_all(2)?.table)
    }

    /// Cartesian product: coordinates of `self` first, then `other`
    pub fn product(&self, other: &Relation) -> Result<Relation> {
        check_shape!(
            self.size == other.size,
            "product of relations over sizes {} and {}",
            self.size,
            other.size
        );
        let arity = self.arity + other.arity;
        let left = self.polymer(&(0..self.arity).collect::<Vec<_>>(), arity)?;
        let right = other.polymer(&(self.arity..arity).collect::<Vec<_>>(), arity)?;
        left.and(&right)
    }

    /// Least superset closed under the operations.
    ///
    /// Repeats `current | image(current)` until the table stops changing.
    /// A chain of subsets has at most `size^arity` strict steps, so that many
    /// rounds reach the fixpoint in every model.
    pub fn closure<F: Functionality>(&self, ops: &[OpTable<F>]) -> Result<Relation> {
        let rounds = power(self.size, self.arity)?;
        let mut current = self.clone();
        for round in 0..rounds {
            let mut next = current.clone();
            for op in ops {
                next = next.or(&op.image(&next)?)?;
            }
            trace!(round, cells = next.table.len(), "closure round");
            if next.table.lits() == current.table.lits() {
                return Ok(next);
            }
            current = next;
        }
        Ok(current)
    }

    // ========================================================================
    // MODELS
    // ========================================================================

    /// Constant copy fixed to the current model
    pub fn solution(&self) -> Result<Relation> {
        self.with_table(self.arity, self.table.solution()?)
    }

    /// Truth table of a constant relation in flat order
    pub fn decode(&self) -> Result<Vec<bool>> {
        self.table.decode()
    }

    /// Tuples of a constant relation in flat order
    pub fn tuples(&self) -> Result<Vec<Vec<usize>>> {
        Ok(self
            .decode()?
            .into_iter()
            .enumerate()
            .filter(|&(_, value)| value)
            .map(|(index, _)| table::tuple_of(self.size, self.arity, index))
            .collect())
    }
}

impl Not for &Relation {
    type Output = Relation;

    fn not(self) -> Relation {
        Relation {
            size: self.size,
            arity: self.arity,
            table: !&self.table,
        }
    }
}

impl Not for Relation {
    type Output = Relation;

    fn not(self) -> Relation {
        !&self
    }
}
