//! First-order terms over named finite domains.
//!
//! Terms describe sentences such as "this relation is the graph of a
//! function" independently of any solver. Quantified variables are numbered
//! by a [`TermBuilder`], which hands out indices from its own counter and
//! takes them back once the quantified body is built, so sibling quantifiers
//! reuse the same names.
//!
//! # Key Types
//!
//! - [`Domain`]: a named universe, [`Domain::boolean`] for truth values
//! - [`Operator`]: a function symbol; relations have boolean codomain
//! - [`Term`]: the expression tree
//! - [`TermBuilder`]: allocates bound variables

use std::collections::BTreeSet;
use std::fmt;

use indexmap::IndexSet;
use itertools::Itertools;

use crate::error::{Error, Result};

/// A named universe of a fixed size.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Domain {
    pub name: String,
    pub size: usize,
}

impl Domain {
    pub fn new(name: impl Into<String>, size: usize) -> Self {
        Self {
            name: name.into(),
            size,
        }
    }

    /// The two truth values
    pub fn boolean() -> Self {
        Self::new("boolean", 2)
    }

    pub fn is_boolean(&self) -> bool {
        *self == Self::boolean()
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

fn formula_error(msg: impl Into<String>) -> Error {
    Error::Formula(msg.into())
}

fn expect_boolean(term: &Term, context: &str) -> Result<()> {
    let domain = term.domain();
    if domain.is_boolean() {
        Ok(())
    } else {
        Err(formula_error(format!(
            "{context} expects a boolean term, got `{term}` of domain {domain}"
        )))
    }
}

// ============================================================================
// OPERATORS
// ============================================================================

/// A function symbol with typed arguments.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Operator {
    pub symbol: String,
    pub domains: Vec<Domain>,
    pub codomain: Domain,
}

impl Operator {
    pub fn new(symbol: impl Into<String>, domains: Vec<Domain>, codomain: Domain) -> Self {
        Self {
            symbol: symbol.into(),
            domains,
            codomain,
        }
    }

    /// A relation symbol: an operator into the booleans
    pub fn relation(symbol: impl Into<String>, domains: Vec<Domain>) -> Self {
        Self::new(symbol, domains, Domain::boolean())
    }

    pub fn arity(&self) -> usize {
        self.domains.len()
    }

    pub fn is_relation(&self) -> bool {
        self.codomain.is_boolean()
    }

    /// Split the domains of a relation symbol into prefix and last
    fn split_relation(&self, what: &str) -> Result<(&Domain, &[Domain])> {
        match self.domains.split_last() {
            Some(split) if self.is_relation() => Ok(split),
            _ => Err(formula_error(format!(
                "{what} needs a relation symbol of positive arity, got `{}`",
                self.symbol
            ))),
        }
    }

    /// The relation is the graph of a partial function of its last coordinate
    pub fn functional(&self, builder: &mut TermBuilder) -> Result<Term> {
        let (last, rest) = self.split_relation("functional")?;
        builder.forall(rest, |builder, vars| {
            builder.forall(&[last.clone(), last.clone()], |_, xy| {
                let mut left = vars.to_vec();
                left.push(xy[0].clone());
                let mut right = vars.to_vec();
                right.push(xy[1].clone());
                Term::imp(vec![
                    Term::apply(self, left)?,
                    Term::apply(self, right)?,
                    Term::equ(xy[0].clone(), xy[1].clone())?,
                ])
            })
        })
    }

    /// Every prefix of the relation has some last coordinate
    pub fn existential(&self, builder: &mut TermBuilder) -> Result<Term> {
        let (last, rest) = self.split_relation("existential")?;
        builder.forall(rest, |builder, vars| {
            builder.exists(std::slice::from_ref(last), |_, x| {
                let mut args = vars.to_vec();
                args.push(x[0].clone());
                Term::apply(self, args)
            })
        })
    }
}

// ============================================================================
// TERMS
// ============================================================================

/// A variable of a domain.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Variable {
    pub domain: Domain,
    pub index: usize,
}

impl Variable {
    pub fn new(domain: Domain, index: usize) -> Self {
        Self { domain, index }
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x{}", self.index)
    }
}

/// An expression with a value in some domain.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Term {
    Var(Variable),
    Apply(Operator, Vec<Term>),
    Not(Box<Term>),
    /// Conjunction; the empty conjunction is true
    And(Vec<Term>),
    /// Disjunction; the empty disjunction is false
    Or(Vec<Term>),
    Xor(Vec<Term>),
    ForAll(Vec<Variable>, Box<Term>),
    Exists(Vec<Variable>, Box<Term>),
    /// Equality of two terms of one domain
    Equ(Box<Term>, Box<Term>),
    /// If-then-else: `Iff(test, then, otherwise)`
    Iff(Box<Term>, Box<Term>, Box<Term>),
}

impl Term {
    pub const TRUE: Term = Term::And(Vec::new());
    pub const FALSE: Term = Term::Or(Vec::new());

    /// The domain of the value of the term
    pub fn domain(&self) -> Domain {
        match self {
            Term::Var(var) => var.domain.clone(),
            Term::Apply(op, _) => op.codomain.clone(),
            Term::Iff(_, then, _) => then.domain(),
            _ => Domain::boolean(),
        }
    }

    pub fn var(var: Variable) -> Term {
        Term::Var(var)
    }

    /// Apply an operator, checking the argument domains
    pub fn apply(op: &Operator, args: Vec<Term>) -> Result<Term> {
        if args.len() != op.arity() {
            return Err(formula_error(format!(
                "`{}` of arity {} applied to {} arguments",
                op.symbol,
                op.arity(),
                args.len()
            )));
        }
        for (arg, domain) in args.iter().zip(&op.domains) {
            if arg.domain() != *domain {
                return Err(formula_error(format!(
                    "argument `{arg}` of `{}` is not in domain {domain}",
                    op.symbol
                )));
            }
        }
        Ok(Term::Apply(op.clone(), args))
    }

    /// Negation; a double negation cancels
    pub fn negate(self) -> Result<Term> {
        expect_boolean(&self, "negation")?;
        Ok(match self {
            Term::Not(inner) => *inner,
            term => Term::Not(Box::new(term)),
        })
    }

    fn flatten(
        terms: impl IntoIterator<Item = Term>,
        what: &str,
        unpack: fn(Term) -> std::result::Result<Vec<Term>, Term>,
    ) -> Result<Vec<Term>> {
        let mut flat = Vec::new();
        for term in terms {
            expect_boolean(&term, what)?;
            match unpack(term) {
                Ok(inner) => flat.extend(inner),
                Err(term) => flat.push(term),
            }
        }
        Ok(flat)
    }

    /// Conjunction, absorbing nested conjunctions
    pub fn and(terms: impl IntoIterator<Item = Term>) -> Result<Term> {
        let flat = Self::flatten(terms, "conjunction", |term| match term {
            Term::And(inner) => Ok(inner),
            term => Err(term),
        })?;
        Ok(Term::And(flat))
    }

    /// Disjunction, absorbing nested disjunctions
    pub fn or(terms: impl IntoIterator<Item = Term>) -> Result<Term> {
        let flat = Self::flatten(terms, "disjunction", |term| match term {
            Term::Or(inner) => Ok(inner),
            term => Err(term),
        })?;
        Ok(Term::Or(flat))
    }

    /// Parity, absorbing nested parities
    pub fn xor(terms: impl IntoIterator<Item = Term>) -> Result<Term> {
        let flat = Self::flatten(terms, "exclusive or", |term| match term {
            Term::Xor(inner) => Ok(inner),
            term => Err(term),
        })?;
        Ok(Term::Xor(flat))
    }

    /// `t_0 & ... & t_{n-2} -> t_{n-1}`, written as a disjunction
    pub fn imp(terms: Vec<Term>) -> Result<Term> {
        let mut terms = terms;
        let Some(last) = terms.pop() else {
            return Err(formula_error("implication needs at least one term"));
        };
        let mut disjuncts = terms
            .into_iter()
            .map(Term::negate)
            .collect::<Result<Vec<_>>>()?;
        disjuncts.push(last);
        Term::or(disjuncts)
    }

    pub fn equ(left: Term, right: Term) -> Result<Term> {
        let (l, r) = (left.domain(), right.domain());
        if l != r {
            return Err(formula_error(format!(
                "equality of `{left}` in {l} and `{right}` in {r}"
            )));
        }
        Ok(Term::Equ(Box::new(left), Box::new(right)))
    }

    /// If-then-else on a boolean test
    pub fn iff(test: Term, then: Term, otherwise: Term) -> Result<Term> {
        expect_boolean(&test, "if-then-else test")?;
        let (t, o) = (then.domain(), otherwise.domain());
        if t != o {
            return Err(formula_error(format!(
                "if-then-else branches in {t} and {o}"
            )));
        }
        Ok(Term::Iff(Box::new(test), Box::new(then), Box::new(otherwise)))
    }

    /// Universal quantifier, merged with a directly nested one
    pub fn forall_vars(mut vars: Vec<Variable>, body: Term) -> Result<Term> {
        expect_boolean(&body, "universal quantifier")?;
        Ok(match body {
            Term::ForAll(inner, body) => {
                vars.extend(inner);
                Term::ForAll(vars, body)
            }
            body if vars.is_empty() => body,
            body => Term::ForAll(vars, Box::new(body)),
        })
    }

    /// Existential quantifier, merged with a directly nested one
    pub fn exists_vars(mut vars: Vec<Variable>, body: Term) -> Result<Term> {
        expect_boolean(&body, "existential quantifier")?;
        Ok(match body {
            Term::Exists(inner, body) => {
                vars.extend(inner);
                Term::Exists(vars, body)
            }
            body if vars.is_empty() => body,
            body => Term::Exists(vars, Box::new(body)),
        })
    }

    fn subterms(&self) -> Vec<&Term> {
        match self {
            Term::Var(_) => Vec::new(),
            Term::Apply(_, args) | Term::And(args) | Term::Or(args) | Term::Xor(args) => {
                args.iter().collect()
            }
            Term::Not(inner) | Term::ForAll(_, inner) | Term::Exists(_, inner) => {
                vec![inner.as_ref()]
            }
            Term::Equ(a, b) => vec![a.as_ref(), b.as_ref()],
            Term::Iff(c, a, b) => vec![c.as_ref(), a.as_ref(), b.as_ref()],
        }
    }

    /// Variables occurring outside the scope of their quantifier
    pub fn free_variables(&self) -> BTreeSet<Variable> {
        match self {
            Term::Var(var) => BTreeSet::from([var.clone()]),
            Term::ForAll(bound, body) | Term::Exists(bound, body) => {
                let mut free = body.free_variables();
                for var in bound {
                    free.remove(var);
                }
                free
            }
            term => term
                .subterms()
                .into_iter()
                .flat_map(Term::free_variables)
                .collect(),
        }
    }

    /// Operators used in the term, in order of first occurrence
    pub fn operators(&self) -> Vec<Operator> {
        let mut found = IndexSet::new();
        self.collect_operators(&mut found);
        found.into_iter().collect()
    }

    fn collect_operators(&self, found: &mut IndexSet<Operator>) {
        if let Term::Apply(op, _) = self {
            if !found.contains(op) {
                found.insert(op.clone());
            }
        }
        for sub in self.subterms() {
            sub.collect_operators(found);
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Var(var) => write!(f, "{var}"),
            Term::Apply(op, args) => write!(f, "{}({})", op.symbol, args.iter().format(",")),
            Term::Not(inner) => write!(f, "~{inner}"),
            Term::And(terms) => write!(f, "({})", terms.iter().format(" & ")),
            Term::Or(terms) => write!(f, "({})", terms.iter().format(" | ")),
            Term::Xor(terms) => write!(f, "({})", terms.iter().format(" ^ ")),
            Term::ForAll(vars, body) => write!(f, "![{}]: {body}", vars.iter().format(",")),
            Term::Exists(vars, body) => write!(f, "?[{}]: {body}", vars.iter().format(",")),
            Term::Equ(a, b) => write!(f, "{a}=={b}"),
            Term::Iff(c, a, b) => write!(f, "({c} ? {a} : {b})"),
        }
    }
}

// ============================================================================
// BUILDER
// ============================================================================

/// Allocates bound variables for quantified terms.
#[derive(Clone, Debug, Default)]
pub struct TermBuilder {
    next_index: usize,
}

impl TermBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index the next bound variable will get
    pub fn next_index(&self) -> usize {
        self.next_index
    }

    fn bind(
        &mut self,
        domains: &[Domain],
        body: impl FnOnce(&mut TermBuilder, &[Term]) -> Result<Term>,
    ) -> (Vec<Variable>, Result<Term>) {
        let vars: Vec<Variable> = domains
            .iter()
            .enumerate()
            .map(|(i, domain)| Variable::new(domain.clone(), self.next_index + i))
            .collect();
        let terms: Vec<Term> = vars.iter().cloned().map(Term::Var).collect();
        self.next_index += vars.len();
        let result = body(self, &terms);
        self.next_index -= vars.len();
        (vars, result)
    }

    /// `![vars]: body(vars)` with one fresh variable per domain
    pub fn forall(
        &mut self,
        domains: &[Domain],
        body: impl FnOnce(&mut TermBuilder, &[Term]) -> Result<Term>,
    ) -> Result<Term> {
        let (vars, body) = self.bind(domains, body);
        Term::forall_vars(vars, body?)
    }

    /// `?[vars]: body(vars)` with one fresh variable per domain
    pub fn exists(
        &mut self,
        domains: &[Domain],
        body: impl FnOnce(&mut TermBuilder, &[Term]) -> Result<Term>,
    ) -> Result<Term> {
        let (vars, body) = self.bind(domains, body);
        Term::exists_vars(vars, body?)
    }
}
