//! Literal vectors bound to a context.
//!
//! A [`BitVec`] is the storage of every table in the crate. Slices share the
//! underlying buffer, so splitting product elements or output blocks is O(1).
//! Binary combinators join the contexts of their operands and fail before
//! touching any solver when the lengths or the live solvers disagree.

use std::fmt;
use std::ops::{Index, Not, Range};
use std::rc::Rc;

use itertools::Itertools;

use crate::error::{check_shape, Error, Result};
use crate::sat::{Context, Gates, Lit, Solver};

/// An ordered sequence of literals tagged with its context.
#[derive(Clone)]
pub struct BitVec {
    context: Context,
    lits: Rc<[Lit]>,
    start: usize,
    len: usize,
}

impl BitVec {
    /// Wrap literals of the given context.
    ///
    /// The constant context accepts only TRUE/FALSE, and a live context only
    /// variables its solver has allocated.
    pub fn from_lits(context: Context, lits: Vec<Lit>) -> Result<Self> {
        let belongs = match &context {
            Context::Constant => lits.iter().all(|lit| lit.is_constant()),
            Context::Live(solver) => {
                let vars = solver.num_variables();
                lits.iter().all(|lit| lit.to_dimacs().unsigned_abs() as usize <= vars)
            }
        };
        if !belongs {
            return Err(Error::ContextMismatch);
        }
        Ok(Self::with_context(context, lits))
    }

    /// Wrap literals already known to belong to the context
    pub(crate) fn with_context(context: Context, lits: Vec<Lit>) -> Self {
        let len = lits.len();
        Self {
            context,
            lits: lits.into(),
            start: 0,
            len,
        }
    }

    /// A constant vector from host booleans
    pub fn constant(values: impl IntoIterator<Item = bool>) -> Self {
        Self::with_context(Context::Constant, values.into_iter().map(Lit::lift).collect())
    }

    /// `len` copies of one literal
    pub fn filled(context: Context, lit: Lit, len: usize) -> Result<Self> {
        Self::from_lits(context, vec![lit; len])
    }

    /// `len` fresh variables of the solver
    pub fn variable(solver: &Solver, len: usize) -> Self {
        let lits = (0..len).map(|_| solver.add_variable()).collect();
        Self::with_context(Context::from(solver), lits)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn solver(&self) -> Option<&Solver> {
        self.context.solver()
    }

    /// True when the vector is bound to no live solver
    pub fn is_constant(&self) -> bool {
        self.context.is_constant()
    }

    pub fn lits(&self) -> &[Lit] {
        &self.lits[self.start..self.start + self.len]
    }

    pub fn get(&self, index: usize) -> Option<Lit> {
        self.lits().get(index).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = Lit> + '_ {
        self.lits().iter().copied()
    }

    /// A view of `range`, sharing storage and context
    pub fn slice(&self, range: Range<usize>) -> Result<BitVec> {
        check_shape!(
            range.start <= range.end && range.end <= self.len,
            "slice {}..{} out of bounds for length {}",
            range.start,
            range.end,
            self.len
        );
        Ok(Self {
            context: self.context.clone(),
            lits: Rc::clone(&self.lits),
            start: self.start + range.start,
            len: range.end - range.start,
        })
    }

    /// Concatenate vectors, joining their contexts
    pub fn concat<'a>(parts: impl IntoIterator<Item = &'a BitVec>) -> Result<BitVec> {
        let mut context = Context::Constant;
        let mut lits = Vec::new();
        for part in parts {
            context = context.join(&part.context)?;
            lits.extend_from_slice(part.lits());
        }
        Ok(Self::with_context(context, lits))
    }

    // ========================================================================
    // ELEMENTWISE
    // ========================================================================

    fn zip_with(
        &self,
        other: &BitVec,
        op: &str,
        gate: fn(&mut dyn Gates, Lit, Lit) -> Lit,
    ) -> Result<BitVec> {
        check_shape!(
            self.len == other.len,
            "{} of vectors of length {} and {}",
            op,
            self.len,
            other.len
        );
        let context = self.context.join(&other.context)?;
        let lits: Vec<Lit> = context.with_gates(|g| {
            self.iter()
                .zip(other.iter())
                .map(|(a, b)| gate(g, a, b))
                .collect()
        });
        Ok(Self::with_context(context, lits))
    }

    pub fn and(&self, other: &BitVec) -> Result<BitVec> {
        self.zip_with(other, "conjunction", |g, a, b| g.bool_and(a, b))
    }

    pub fn or(&self, other: &BitVec) -> Result<BitVec> {
        self.zip_with(other, "disjunction", |g, a, b| g.bool_or(a, b))
    }

    pub fn xor(&self, other: &BitVec) -> Result<BitVec> {
        self.zip_with(other, "exclusive or", |g, a, b| g.bool_xor(a, b))
    }

    pub fn equ(&self, other: &BitVec) -> Result<BitVec> {
        self.zip_with(other, "equivalence", |g, a, b| g.bool_equ(a, b))
    }

    pub fn imp(&self, other: &BitVec) -> Result<BitVec> {
        self.zip_with(other, "implication", |g, a, b| g.bool_imp(a, b))
    }

    // ========================================================================
    // COMPARISONS (element 0 is the most significant digit)
    // ========================================================================

    fn compare(
        &self,
        other: &BitVec,
        gate: fn(&mut dyn Gates, &[Lit], &[Lit]) -> Lit,
    ) -> Result<BitVec> {
        check_shape!(
            self.len == other.len,
            "comparison of vectors of length {} and {}",
            self.len,
            other.len
        );
        let context = self.context.join(&other.context)?;
        let lit = context.with_gates(|g| gate(g, self.lits(), other.lits()));
        Ok(Self::with_context(context, vec![lit]))
    }

    pub fn comp_eq(&self, other: &BitVec) -> Result<BitVec> {
        self.compare(other, |g, a, b| g.comp_eq(a, b))
    }

    pub fn comp_ne(&self, other: &BitVec) -> Result<BitVec> {
        self.compare(other, |g, a, b| g.comp_ne(a, b))
    }

    pub fn comp_lt(&self, other: &BitVec) -> Result<BitVec> {
        self.compare(other, |g, a, b| g.comp_lt(a, b))
    }

    pub fn comp_le(&self, other: &BitVec) -> Result<BitVec> {
        self.compare(other, |g, a, b| g.comp_le(a, b))
    }

    pub fn comp_gt(&self, other: &BitVec) -> Result<BitVec> {
        self.compare(other, |g, a, b| g.comp_gt(a, b))
    }

    pub fn comp_ge(&self, other: &BitVec) -> Result<BitVec> {
        self.compare(other, |g, a, b| g.comp_ge(a, b))
    }

    // ========================================================================
    // QUANTIFIERS
    // ========================================================================

    fn fold(&self, gate: fn(&mut dyn Gates, &[Lit]) -> Lit) -> BitVec {
        let lit = self.context.with_gates(|g| gate(g, self.lits()));
        Self::with_context(self.context.clone(), vec![lit])
    }

    /// Conjunction of all elements as a single literal
    pub fn fold_all(&self) -> BitVec {
        self.fold(|g, lits| g.fold_all(lits))
    }

    /// Disjunction of all elements as a single literal
    pub fn fold_any(&self) -> BitVec {
        self.fold(|g, lits| g.fold_any(lits))
    }

    /// Exactly one element is true
    pub fn fold_one(&self) -> BitVec {
        self.fold(|g, lits| g.fold_one(lits))
    }

    /// At most one element is true
    pub fn fold_amo(&self) -> BitVec {
        self.fold(|g, lits| g.fold_amo(lits))
    }

    /// Check a constraint on constants, or emit its clauses.
    fn ensure(
        &self,
        name: &'static str,
        holds: fn(usize, usize) -> bool,
        emit: fn(&mut dyn Gates, &[Lit]),
    ) -> Result<()> {
        match &self.context {
            Context::Live(solver) => {
                solver.with_gates(|g| emit(g, self.lits()));
                Ok(())
            }
            Context::Constant => {
                let count = self.iter().filter(|&lit| lit == Lit::TRUE).count();
                if holds(count, self.len) {
                    Ok(())
                } else {
                    Err(Error::ConstantViolated(name))
                }
            }
        }
    }

    /// Assert that every element holds
    pub fn ensure_all(&self) -> Result<()> {
        self.ensure("all", |count, len| count == len, |g, lits| g.ensure_all(lits))
    }

    /// Assert that some element holds
    pub fn ensure_any(&self) -> Result<()> {
        self.ensure("any", |count, _| count >= 1, |g, lits| g.ensure_any(lits))
    }

    /// Assert that exactly one element holds
    pub fn ensure_one(&self) -> Result<()> {
        self.ensure("exactly-one", |count, _| count == 1, |g, lits| g.ensure_one(lits))
    }

    /// Assert that at most one element holds
    pub fn ensure_amo(&self) -> Result<()> {
        self.ensure("at-most-one", |count, _| count <= 1, |g, lits| g.ensure_amo(lits))
    }

    // ========================================================================
    // MODELS
    // ========================================================================

    /// Constant copy fixed to the current model of the solver
    pub fn solution(&self) -> Result<BitVec> {
        match &self.context {
            Context::Constant => Ok(self.clone()),
            Context::Live(solver) => {
                let values = self
                    .iter()
                    .map(|lit| solver.value(lit))
                    .collect::<Result<Vec<bool>>>()?;
                Ok(Self::constant(values))
            }
        }
    }

    /// Host booleans of a vector made of TRUE/FALSE only
    pub fn decode(&self) -> Result<Vec<bool>> {
        self.iter()
            .map(|lit| lit.as_constant().ok_or(Error::NotConstant))
            .collect()
    }
}

impl Index<usize> for BitVec {
    type Output = Lit;

    fn index(&self, index: usize) -> &Lit {
        &self.lits()[index]
    }
}

impl Not for &BitVec {
    type Output = BitVec;

    fn not(self) -> BitVec {
        let lits = self.iter().map(|lit| !lit).collect();
        BitVec::with_context(self.context.clone(), lits)
    }
}

impl Not for BitVec {
    type Output = BitVec;

    fn not(self) -> BitVec {
        !&self
    }
}

impl PartialEq for BitVec {
    fn eq(&self, other: &Self) -> bool {
        self.context == other.context && self.lits() == other.lits()
    }
}

impl fmt::Debug for BitVec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.is_constant() { "const" } else { "live" };
        write!(f, "BitVec<{kind}>[{:?}]", self.iter().format(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bv(bits: &[u8]) -> BitVec {
        BitVec::constant(bits.iter().map(|&b| b == 1))
    }

    #[test]
    fn test_constant_elementwise() {
        let a = bv(&[0, 0, 1, 1]);
        let b = bv(&[0, 1, 0, 1]);
        assert_eq!(a.and(&b).unwrap().decode().unwrap(), [false, false, false, true]);
        assert_eq!(a.or(&b).unwrap().decode().unwrap(), [false, true, true, true]);
        assert_eq!(a.xor(&b).unwrap().decode().unwrap(), [false, true, true, false]);
        assert_eq!(a.imp(&b).unwrap().decode().unwrap(), [true, true, false, true]);
        assert_eq!((!&a).decode().unwrap(), [true, true, false, false]);
    }

    #[test]
    fn test_length_mismatch() {
        let err = bv(&[0, 1]).and(&bv(&[1])).unwrap_err();
        assert!(matches!(err, Error::Shape(_)));
    }

    #[test]
    fn test_context_mismatch() {
        let a = BitVec::variable(&Solver::new(), 2);
        let b = BitVec::variable(&Solver::new(), 2);
        assert_eq!(a.or(&b).unwrap_err(), Error::ContextMismatch);
        assert!(a.or(&bv(&[0, 1])).is_ok());
    }

    #[test]
    fn test_slice_is_view() {
        let a = bv(&[1, 0, 1, 1, 0]);
        let s = a.slice(1..4).unwrap();
        assert_eq!(s.decode().unwrap(), [false, true, true]);
        assert_eq!(s.slice(1..3).unwrap().decode().unwrap(), [true, true]);
        assert!(a.slice(3..6).is_err());
    }

    #[test]
    fn test_compare_msb_first() {
        let one = bv(&[0, 1]);
        let two = bv(&[1, 0]);
        assert_eq!(one.comp_lt(&two).unwrap().decode().unwrap(), [true]);
        assert_eq!(two.comp_gt(&one).unwrap().decode().unwrap(), [true]);
        assert_eq!(one.comp_ge(&two).unwrap().decode().unwrap(), [false]);
        assert_eq!(one.comp_le(&one).unwrap().decode().unwrap(), [true]);
    }

    #[test]
    fn test_constant_ensure() {
        assert!(bv(&[0, 1, 0]).ensure_one().is_ok());
        assert!(bv(&[0, 0, 0]).ensure_amo().is_ok());
        assert_eq!(
            bv(&[1, 1, 0]).ensure_amo(),
            Err(Error::ConstantViolated("at-most-one"))
        );
        assert_eq!(bv(&[]).ensure_any(), Err(Error::ConstantViolated("any")));
        assert!(bv(&[]).ensure_all().is_ok());
    }

    #[test]
    fn test_ensure_one_models() {
        for len in 1..6 {
            let solver = Solver::new();
            let x = BitVec::variable(&solver, len);
            x.ensure_one().unwrap();
            let mut count = 0;
            while solver.solve().unwrap() {
                let value = x.solution().unwrap();
                assert_eq!(value.decode().unwrap().iter().filter(|&&b| b).count(), 1);
                count += 1;
                x.xor(&value).unwrap().ensure_any().unwrap();
            }
            assert_eq!(count, len);
        }
    }

    #[test]
    fn test_ensure_amo_models() {
        for len in 0..6 {
            let solver = Solver::new();
            let x = BitVec::variable(&solver, len);
            x.ensure_amo().unwrap();
            let mut count = 0;
            while solver.solve().unwrap() {
                let value = x.solution().unwrap();
                count += 1;
                x.xor(&value).unwrap().ensure_any().unwrap();
            }
            assert_eq!(count, len + 1);
        }
    }

    #[test]
    fn test_decode_requires_constants() {
        let solver = Solver::new();
        let x = BitVec::variable(&solver, 3);
        assert_eq!(x.decode(), Err(Error::NotConstant));
        assert_eq!(x.solution(), Err(Error::NoModel));
        assert!(solver.solve().unwrap());
        let value = x.solution().unwrap();
        assert!(value.is_constant());
        assert_eq!(value.decode(), value.decode());
    }

    #[test]
    fn test_from_lits_checks_context() {
        let solver = Solver::new();
        let x = solver.add_variable();
        let y = solver.add_variable();
        assert_eq!(
            BitVec::from_lits(Context::Constant, vec![Lit::TRUE, x]),
            Err(Error::ContextMismatch)
        );
        assert_eq!(
            BitVec::filled(Context::Constant, !y, 2),
            Err(Error::ContextMismatch)
        );
        assert_eq!(
            BitVec::from_lits(Context::from(&Solver::new()), vec![y]),
            Err(Error::ContextMismatch)
        );

        let live = BitVec::from_lits(Context::from(&solver), vec![x, !y, Lit::FALSE]).unwrap();
        let fixed = BitVec::filled(Context::Constant, Lit::TRUE, 3).unwrap();
        let both = live.xor(&fixed).unwrap();
        assert_eq!(both.context(), &Context::from(&solver));
        assert_eq!(both[2], Lit::TRUE);
    }

    #[test]
    fn test_concat_joins_contexts() {
        let solver = Solver::new();
        let x = BitVec::variable(&solver, 2);
        let joined = BitVec::concat([&bv(&[1]), &x]).unwrap();
        assert_eq!(joined.len(), 3);
        assert_eq!(joined.context(), &Context::from(&solver));
        assert_eq!(joined[0], Lit::TRUE);
    }
}
