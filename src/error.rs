//! Error type shared by every layer of the crate.
//!
//! Shape and context errors are raised before any clause is emitted, so a
//! failed call never leaves half an encoding behind in the solver. An
//! unsatisfiable instance is not an error: `Solver::solve` returns `Ok(false)`.

use thiserror::Error;

/// Errors raised while building, solving or decoding encodings.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum Error {
    /// Arity, length or index precondition violated.
    #[error("shape mismatch: {0}")]
    Shape(String),

    /// Two bit vectors bound to different live solvers were combined.
    #[error("cannot combine literals of two different solvers")]
    ContextMismatch,

    /// `decode()` was called on a value that still contains solver variables.
    #[error("value is not constant; call solution() after a successful solve")]
    NotConstant,

    /// No satisfying model is available for the solver.
    #[error("no model available: the last solve did not succeed or clauses were added since")]
    NoModel,

    /// A decoded function block has the wrong number of true cells.
    #[error("invalid output block at input {index}: {count} true cells")]
    InvalidBlock { index: usize, count: usize },

    /// A constraint was asserted on constants that do not satisfy it.
    #[error("constant vector violates the {0} constraint")]
    ConstantViolated(&'static str),

    /// The back-end returned without an answer.
    #[error("solver was interrupted before reaching an answer")]
    Interrupted,

    /// Unknown back-end configuration.
    #[error("invalid solver configuration: {0}")]
    Config(String),

    /// Ill-typed formula construction.
    #[error("formula error: {0}")]
    Formula(String),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Return a [`Error::Shape`] unless the condition holds.
macro_rules! check_shape {
    ($cond:expr, $($arg:tt)+) => {
        if !$cond {
            return Err($crate::error::Error::Shape(format!($($arg)+)));
        }
    };
}

pub(crate) use check_shape;
