//! Solver handle and literal contexts.
//!
//! A [`Solver`] is a cheap, clonable handle to one live engine. Every
//! [`BitVec`](crate::BitVec) carries a [`Context`]: the distinguished
//! [`Context::Constant`] for values built only from TRUE/FALSE, or
//! [`Context::Live`] for values that mention variables of a solver. Two live
//! contexts are compatible only when they are the same handle.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use tracing::debug;

use crate::config::SolverConfig;
use crate::error::{Error, Result};

use super::backend::{CadicalBackend, SatBackend};
use super::{Gates, Lit};

/// Outcome of the most recent solve, invalidated by new clauses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SolveState {
    Unknown,
    Sat,
    Unsat,
}

/// Variable allocation and clause bookkeeping over a back-end.
pub(crate) struct Engine {
    backend: Box<dyn SatBackend>,
    num_vars: i32,
    state: SolveState,
}

impl Engine {
    fn new(mut backend: Box<dyn SatBackend>) -> Self {
        backend.add_clause(&[Lit::TRUE]);
        Self {
            backend,
            num_vars: 1,
            state: SolveState::Unknown,
        }
    }

    fn solve(&mut self, assumptions: &[Lit]) -> Result<bool> {
        let answer = self.backend.solve(assumptions);
        debug!(
            variables = self.num_vars,
            clauses = self.backend.num_clauses(),
            assumptions = assumptions.len(),
            ?answer,
            "solve"
        );
        match answer {
            Some(true) => {
                self.state = SolveState::Sat;
                Ok(true)
            }
            Some(false) => {
                self.state = SolveState::Unsat;
                Ok(false)
            }
            None => {
                self.state = SolveState::Unknown;
                Err(Error::Interrupted)
            }
        }
    }

    fn value(&self, lit: Lit) -> Result<bool> {
        if let Some(value) = lit.as_constant() {
            return Ok(value);
        }
        if self.state != SolveState::Sat {
            return Err(Error::NoModel);
        }
        // Unconstrained variables may take either value; pick false.
        let var = Lit::positive(lit.to_dimacs().abs());
        let positive = self.backend.value(var).unwrap_or(false);
        Ok(if lit == var { positive } else { !positive })
    }
}

impl Gates for Engine {
    fn new_lit(&mut self) -> Lit {
        self.num_vars += 1;
        Lit::positive(self.num_vars)
    }

    fn add_clause(&mut self, clause: &[Lit]) {
        self.state = SolveState::Unknown;
        self.backend.add_clause(clause);
    }
}

// ============================================================================
// SOLVER HANDLE
// ============================================================================

/// Shared handle to a live SAT instance.
///
/// Cloning the handle does not clone the instance. The handle is
/// single-threaded (`Rc`), matching the synchronous combinator layer.
#[derive(Clone)]
pub struct Solver {
    engine: Rc<RefCell<Engine>>,
}

impl Solver {
    /// A CaDiCaL solver with default options
    pub fn new() -> Self {
        Self::with_backend(CadicalBackend::new())
    }

    /// A CaDiCaL solver with the given configuration
    pub fn with_config(config: &SolverConfig) -> Result<Self> {
        Ok(Self::with_backend(CadicalBackend::with_config(config)?))
    }

    /// Wrap an arbitrary back-end
    pub fn with_backend(backend: impl SatBackend + 'static) -> Self {
        Self {
            engine: Rc::new(RefCell::new(Engine::new(Box::new(backend)))),
        }
    }

    /// Allocate a fresh variable
    pub fn add_variable(&self) -> Lit {
        self.engine.borrow_mut().new_lit()
    }

    /// Add a clause
    pub fn add_clause(&self, clause: &[Lit]) {
        self.engine.borrow_mut().add_clause(clause);
    }

    /// Solve the clauses added so far. `Ok(false)` means unsatisfiable.
    pub fn solve(&self) -> Result<bool> {
        self.engine.borrow_mut().solve(&[])
    }

    /// Solve under temporary assumptions
    pub fn solve_with(&self, assumptions: &[Lit]) -> Result<bool> {
        self.engine.borrow_mut().solve(assumptions)
    }

    /// Value of a literal in the current model
    pub fn value(&self, lit: Lit) -> Result<bool> {
        self.engine.borrow().value(lit)
    }

    /// Number of variables, including the reserved TRUE variable
    pub fn num_variables(&self) -> usize {
        self.engine.borrow().num_vars as usize
    }

    pub fn num_clauses(&self) -> usize {
        self.engine.borrow().backend.num_clauses()
    }

    /// Name and version of the back-end
    pub fn signature(&self) -> String {
        self.engine.borrow().backend.signature()
    }

    /// Whether both handles refer to the same instance
    pub fn same_as(&self, other: &Solver) -> bool {
        Rc::ptr_eq(&self.engine, &other.engine)
    }

    pub(crate) fn with_gates<R>(&self, f: impl FnOnce(&mut dyn Gates) -> R) -> R {
        let mut engine = self.engine.borrow_mut();
        f(&mut *engine)
    }
}

impl Default for Solver {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Solver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let engine = self.engine.borrow();
        f.debug_struct("Solver")
            .field("variables", &engine.num_vars)
            .field("clauses", &engine.backend.num_clauses())
            .field("state", &engine.state)
            .finish()
    }
}

// ============================================================================
// CONTEXT
// ============================================================================

/// The context a literal sequence is bound to.
#[derive(Clone, Debug, Default)]
pub enum Context {
    /// Only TRUE/FALSE literals; compatible with every context
    #[default]
    Constant,
    /// Literals of the given solver
    Live(Solver),
}

impl Context {
    /// Merge two contexts, failing on two different live solvers
    pub fn join(&self, other: &Context) -> Result<Context> {
        match (self, other) {
            (Context::Constant, ctx) | (ctx, Context::Constant) => Ok(ctx.clone()),
            (Context::Live(a), Context::Live(b)) if a.same_as(b) => Ok(self.clone()),
            _ => Err(Error::ContextMismatch),
        }
    }

    /// Merge any number of contexts
    pub fn join_all<'a>(contexts: impl IntoIterator<Item = &'a Context>) -> Result<Context> {
        contexts
            .into_iter()
            .try_fold(Context::Constant, |acc, ctx| acc.join(ctx))
    }

    pub fn is_constant(&self) -> bool {
        matches!(self, Context::Constant)
    }

    pub fn solver(&self) -> Option<&Solver> {
        match self {
            Context::Constant => None,
            Context::Live(solver) => Some(solver),
        }
    }

    /// Run literal combinators in this context.
    ///
    /// The constant context evaluates gates on TRUE/FALSE only, which never
    /// allocates variables or emits clauses.
    pub(crate) fn with_gates<R>(&self, f: impl FnOnce(&mut dyn Gates) -> R) -> R {
        match self {
            Context::Constant => f(&mut ConstantGates),
            Context::Live(solver) => solver.with_gates(f),
        }
    }
}

impl PartialEq for Context {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Context::Constant, Context::Constant) => true,
            (Context::Live(a), Context::Live(b)) => a.same_as(b),
            _ => false,
        }
    }
}

impl From<&Solver> for Context {
    fn from(solver: &Solver) -> Self {
        Context::Live(solver.clone())
    }
}

/// Gate evaluation for the constant context.
struct ConstantGates;

impl Gates for ConstantGates {
    fn new_lit(&mut self) -> Lit {
        unreachable!("gates over constant literals never allocate variables")
    }

    fn add_clause(&mut self, _clause: &[Lit]) {
        unreachable!("gates over constant literals never emit clauses")
    }
}
