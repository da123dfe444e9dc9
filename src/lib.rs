//! algsat: finite relations and operations as SAT-literal truth tables
//!
//! Relations and operations over a finite universe are stored as flattened
//! tables whose cells are literals of a SAT solver. Arity-generic combinators
//! (reindexing, quantifier folding, relational evaluation, composition) turn
//! universal-algebra questions such as "is there a commutative idempotent
//! operation preserving this relation?" into a single SAT instance.
//!
//! ```no_run
//! use algsat::{Operation, Relation, Solver};
//!
//! # fn main() -> algsat::Result<()> {
//! let solver = Solver::new();
//! let op = Operation::variable(&solver, 3, 2)?;
//! op.idempotent()?.ensure_all()?;
//! let order = Relation::from_tuples(3, 2, [[0, 0], [0, 1], [1, 1], [1, 2], [0, 2], [2, 2]])?;
//! op.preserves(&order)?.ensure_all()?;
//! if solver.solve()? {
//!     println!("{:?}", op.solution()?.decode()?);
//! }
//! # Ok(())
//! # }
//! ```

pub mod algebra;
pub mod bitvec;
pub mod config;
pub mod error;
pub mod evaluate;
pub mod formula;
pub mod operation;
pub mod relation;
pub mod sat;
mod table;

pub use algebra::{Algebra, Element, ProductAlg, SmallAlg};
pub use bitvec::BitVec;
pub use config::{Preset, SolverConfig};
pub use error::{Error, Result};
pub use evaluate::EvalStrategy;
pub use formula::{Domain, Operator, Term, TermBuilder, Variable};
pub use operation::{Functionality, OpTable, Operation, Partial, PartialOp, Total};
pub use relation::Relation;
pub use sat::{CadicalBackend, Context, Lit, SatBackend, Solver};
