//! Literal-level layer over the SAT back-end.
//!
//! Literals are DIMACS integers. Variable 1 is reserved and fixed true in
//! every live solver, so the sentinels [`Lit::TRUE`] and [`Lit::FALSE`] are
//! ordinary literals that may appear in emitted clauses.
//!
//! # Key Types
//!
//! - [`Lit`]: a signed literal
//! - [`Gates`]: boolean combinators compiled into clauses, with constant
//!   propagation so that constant inputs never allocate variables
//! - [`SatBackend`]: the consumed contract of the external engine
//! - [`Solver`]: shared handle to one live engine
//! - [`Context`]: either the constant pseudo-context or a live solver

mod backend;
mod solver;

pub use backend::{CadicalBackend, SatBackend};
pub use solver::{Context, Solver};

use std::fmt;
use std::ops::Not;

/// A literal: positive for a variable, negative for its negation.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Lit(i32);

impl Lit {
    /// The always true literal
    pub const TRUE: Lit = Lit(1);

    /// The always false literal
    pub const FALSE: Lit = Lit(-1);

    /// Wrap a non-zero DIMACS integer
    pub fn from_dimacs(value: i32) -> Option<Lit> {
        (value != 0).then_some(Lit(value))
    }

    /// The DIMACS integer of this literal
    #[inline]
    pub fn to_dimacs(self) -> i32 {
        self.0
    }

    /// Positive literal of the given variable index (1-based)
    #[inline]
    pub(crate) fn positive(var: i32) -> Lit {
        debug_assert!(var > 0);
        Lit(var)
    }

    /// The constant literal with the given value
    #[inline]
    pub fn lift(value: bool) -> Lit {
        if value {
            Lit::TRUE
        } else {
            Lit::FALSE
        }
    }

    /// Value of a sentinel, `None` for solver literals
    #[inline]
    pub fn as_constant(self) -> Option<bool> {
        match self {
            Lit::TRUE => Some(true),
            Lit::FALSE => Some(false),
            _ => None,
        }
    }

    #[inline]
    pub fn is_constant(self) -> bool {
        self.as_constant().is_some()
    }
}

impl Not for Lit {
    type Output = Lit;

    #[inline]
    fn not(self) -> Lit {
        Lit(-self.0)
    }
}

impl fmt::Debug for Lit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Lit::TRUE => f.write_str("T"),
            Lit::FALSE => f.write_str("F"),
            Lit(v) => write!(f, "{v}"),
        }
    }
}

// ============================================================================
// GATES
// ============================================================================

/// Boolean combinators over literals.
///
/// Implementors only provide variable allocation and clause emission; every
/// combinator short-circuits on constants and on identical or complementary
/// inputs before introducing a defining variable.
pub trait Gates {
    /// Allocate a fresh variable and return its positive literal
    fn new_lit(&mut self) -> Lit;

    /// Emit a clause
    fn add_clause(&mut self, clause: &[Lit]);

    /// Disjunction of two literals
    fn bool_or(&mut self, a: Lit, b: Lit) -> Lit {
        if a == Lit::TRUE || b == Lit::TRUE || a == !b {
            Lit::TRUE
        } else if a == Lit::FALSE || a == b {
            b
        } else if b == Lit::FALSE {
            a
        } else {
            let c = self.new_lit();
            self.add_clause(&[!a, c]);
            self.add_clause(&[!b, c]);
            self.add_clause(&[a, b, !c]);
            c
        }
    }

    /// Conjunction of two literals
    fn bool_and(&mut self, a: Lit, b: Lit) -> Lit {
        !self.bool_or(!a, !b)
    }

    /// Implication `a -> b`
    fn bool_imp(&mut self, a: Lit, b: Lit) -> Lit {
        self.bool_or(!a, b)
    }

    /// Exclusive or
    fn bool_xor(&mut self, a: Lit, b: Lit) -> Lit {
        if a == Lit::FALSE {
            b
        } else if a == Lit::TRUE {
            !b
        } else if b == Lit::FALSE {
            a
        } else if b == Lit::TRUE {
            !a
        } else if a == b {
            Lit::FALSE
        } else if a == !b {
            Lit::TRUE
        } else {
            let c = self.new_lit();
            self.add_clause(&[!a, b, c]);
            self.add_clause(&[a, !b, c]);
            self.add_clause(&[a, b, !c]);
            self.add_clause(&[!a, !b, !c]);
            c
        }
    }

    /// Equivalence
    fn bool_equ(&mut self, a: Lit, b: Lit) -> Lit {
        self.bool_xor(!a, b)
    }

    /// Majority of three literals
    fn bool_maj(&mut self, a: Lit, b: Lit, c: Lit) -> Lit {
        if a == b || a == c || b == !c {
            a
        } else if b == c || a == !c {
            b
        } else if a == !b {
            c
        } else if a == Lit::FALSE {
            self.bool_and(b, c)
        } else if a == Lit::TRUE {
            self.bool_or(b, c)
        } else if b == Lit::FALSE {
            self.bool_and(a, c)
        } else if b == Lit::TRUE {
            self.bool_or(a, c)
        } else if c == Lit::FALSE {
            self.bool_and(a, b)
        } else if c == Lit::TRUE {
            self.bool_or(a, b)
        } else {
            let d = self.new_lit();
            self.add_clause(&[a, b, !d]);
            self.add_clause(&[a, c, !d]);
            self.add_clause(&[b, c, !d]);
            self.add_clause(&[!a, !b, d]);
            self.add_clause(&[!a, !c, d]);
            self.add_clause(&[!b, !c, d]);
            d
        }
    }

    /// If-then-else: `b` when `a` holds, otherwise `c`
    fn bool_iff(&mut self, a: Lit, b: Lit, c: Lit) -> Lit {
        if b == c || a == Lit::TRUE {
            b
        } else if a == Lit::FALSE {
            c
        } else if b == !c {
            self.bool_xor(a, c)
        } else if a == b || b == Lit::TRUE {
            self.bool_or(a, c)
        } else if a == !b || b == Lit::FALSE {
            self.bool_and(!a, c)
        } else if a == !c || c == Lit::TRUE {
            self.bool_or(!a, b)
        } else if a == c || c == Lit::FALSE {
            self.bool_and(a, b)
        } else {
            let d = self.new_lit();
            self.add_clause(&[!a, !b, d]);
            self.add_clause(&[!a, b, !d]);
            self.add_clause(&[a, !c, d]);
            self.add_clause(&[a, c, !d]);
            d
        }
    }

    /// Conjunction of all literals (true when empty)
    fn fold_all(&mut self, lits: &[Lit]) -> Lit {
        let mut result = Lit::TRUE;
        for &lit in lits {
            result = self.bool_and(result, lit);
        }
        result
    }

    /// Disjunction of all literals (false when empty)
    fn fold_any(&mut self, lits: &[Lit]) -> Lit {
        let mut result = Lit::FALSE;
        for &lit in lits {
            result = self.bool_or(result, lit);
        }
        result
    }

    /// Exactly one of the literals is true
    fn fold_one(&mut self, lits: &[Lit]) -> Lit {
        let (min1, min2) = self.count_to_two(lits);
        self.bool_and(min1, !min2)
    }

    /// At most one of the literals is true
    fn fold_amo(&mut self, lits: &[Lit]) -> Lit {
        let (_, min2) = self.count_to_two(lits);
        !min2
    }

    /// Sequential counter: literals for "at least one" and "at least two"
    fn count_to_two(&mut self, lits: &[Lit]) -> (Lit, Lit) {
        let mut min1 = Lit::FALSE;
        let mut min2 = Lit::FALSE;
        for &lit in lits {
            let both = self.bool_and(min1, lit);
            min2 = self.bool_or(min2, both);
            min1 = self.bool_or(min1, lit);
        }
        (min1, min2)
    }

    /// The two sequences are equal (same length required)
    fn comp_eq(&mut self, lits0: &[Lit], lits1: &[Lit]) -> Lit {
        debug_assert_eq!(lits0.len(), lits1.len());
        let mut result = Lit::TRUE;
        for (&a, &b) in lits0.iter().zip(lits1) {
            let same = self.bool_equ(a, b);
            result = self.bool_and(result, same);
        }
        result
    }

    /// The two sequences differ somewhere
    fn comp_ne(&mut self, lits0: &[Lit], lits1: &[Lit]) -> Lit {
        !self.comp_eq(lits0, lits1)
    }

    /// `lits0 <= lits1` as binary numbers, element 0 most significant
    fn comp_le(&mut self, lits0: &[Lit], lits1: &[Lit]) -> Lit {
        debug_assert_eq!(lits0.len(), lits1.len());
        let mut result = Lit::TRUE;
        for (&a, &b) in lits0.iter().rev().zip(lits1.iter().rev()) {
            let differ = self.bool_xor(a, b);
            result = self.bool_iff(differ, b, result);
        }
        result
    }

    /// `lits0 < lits1`
    fn comp_lt(&mut self, lits0: &[Lit], lits1: &[Lit]) -> Lit {
        !self.comp_le(lits1, lits0)
    }

    /// `lits0 >= lits1` as binary numbers, element 0 most significant
    fn comp_ge(&mut self, lits0: &[Lit], lits1: &[Lit]) -> Lit {
        debug_assert_eq!(lits0.len(), lits1.len());
        let mut result = Lit::TRUE;
        for (&a, &b) in lits0.iter().rev().zip(lits1.iter().rev()) {
            let differ = self.bool_xor(a, b);
            result = self.bool_iff(differ, a, result);
        }
        result
    }

    /// `lits0 > lits1`
    fn comp_gt(&mut self, lits0: &[Lit], lits1: &[Lit]) -> Lit {
        !self.comp_ge(lits1, lits0)
    }

    /// Assert that every literal holds
    fn ensure_all(&mut self, lits: &[Lit]) {
        for &lit in lits {
            self.add_clause(&[lit]);
        }
    }

    /// Assert that some literal holds
    fn ensure_any(&mut self, lits: &[Lit]) {
        if lits.is_empty() {
            self.add_clause(&[Lit::FALSE]);
        } else {
            self.add_clause(lits);
        }
    }

    /// Assert that at most one literal holds (linear sequential encoding)
    fn ensure_amo(&mut self, lits: &[Lit]) {
        let lits: Vec<Lit> = lits.iter().copied().filter(|&l| l != Lit::FALSE).collect();
        let Some((&first, rest)) = lits.split_first() else {
            return;
        };
        let mut seen = first;
        for (i, &lit) in rest.iter().enumerate() {
            self.add_clause(&[!seen, !lit]);
            if i + 1 < rest.len() {
                let next = self.new_lit();
                self.add_clause(&[!seen, next]);
                self.add_clause(&[!lit, next]);
                seen = next;
            }
        }
    }

    /// Assert that exactly one literal holds
    fn ensure_one(&mut self, lits: &[Lit]) {
        self.ensure_any(lits);
        self.ensure_amo(lits);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Gate evaluator over constants only; any allocation is a test failure.
    struct Eval;

    impl Gates for Eval {
        fn new_lit(&mut self) -> Lit {
            panic!("constant inputs must not allocate")
        }

        fn add_clause(&mut self, _clause: &[Lit]) {
            panic!("constant inputs must not emit clauses")
        }
    }

    fn bits(n: usize, width: usize) -> Vec<Lit> {
        (0..width)
            .map(|i| Lit::lift(n >> (width - 1 - i) & 1 == 1))
            .collect()
    }

    #[test]
    fn test_lit_basics() {
        assert_eq!(!Lit::TRUE, Lit::FALSE);
        assert_eq!(Lit::from_dimacs(0), None);
        assert_eq!(Lit::from_dimacs(-7).map(|l| (!l).to_dimacs()), Some(7));
        assert_eq!(Lit::lift(true).as_constant(), Some(true));
        assert!(!Lit::positive(5).is_constant());
    }

    #[test]
    fn test_constant_truth_tables() {
        let mut g = Eval;
        for a in [false, true] {
            for b in [false, true] {
                let (la, lb) = (Lit::lift(a), Lit::lift(b));
                assert_eq!(g.bool_or(la, lb), Lit::lift(a || b));
                assert_eq!(g.bool_and(la, lb), Lit::lift(a && b));
                assert_eq!(g.bool_imp(la, lb), Lit::lift(!a || b));
                assert_eq!(g.bool_xor(la, lb), Lit::lift(a ^ b));
                assert_eq!(g.bool_equ(la, lb), Lit::lift(a == b));
                for c in [false, true] {
                    let lc = Lit::lift(c);
                    let maj = (a as u8 + b as u8 + c as u8) >= 2;
                    assert_eq!(g.bool_maj(la, lb, lc), Lit::lift(maj));
                    assert_eq!(g.bool_iff(la, lb, lc), Lit::lift(if a { b } else { c }));
                }
            }
        }
    }

    #[test]
    fn test_constant_folds() {
        let mut g = Eval;
        let t = Lit::TRUE;
        let f = Lit::FALSE;
        assert_eq!(g.fold_all(&[]), t);
        assert_eq!(g.fold_any(&[]), f);
        assert_eq!(g.fold_one(&[f, t, f]), t);
        assert_eq!(g.fold_one(&[t, t, f]), f);
        assert_eq!(g.fold_one(&[f, f]), f);
        assert_eq!(g.fold_amo(&[f, f]), t);
        assert_eq!(g.fold_amo(&[t, f, t]), f);
    }

    #[test]
    fn test_constant_comparisons_msb_first() {
        let mut g = Eval;
        for x in 0..8 {
            for y in 0..8 {
                let (a, b) = (bits(x, 3), bits(y, 3));
                assert_eq!(g.comp_eq(&a, &b), Lit::lift(x == y));
                assert_eq!(g.comp_ne(&a, &b), Lit::lift(x != y));
                assert_eq!(g.comp_le(&a, &b), Lit::lift(x <= y), "{x} <= {y}");
                assert_eq!(g.comp_lt(&a, &b), Lit::lift(x < y));
                assert_eq!(g.comp_ge(&a, &b), Lit::lift(x >= y));
                assert_eq!(g.comp_gt(&a, &b), Lit::lift(x > y));
            }
        }
    }
}
