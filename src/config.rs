//! Solver configuration.
//!
//! CaDiCaL ships a handful of named option sets; a [`SolverConfig`] picks one
//! of them when a [`Solver`](crate::Solver) is created.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Named option set of the SAT back-end.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Preset {
    /// The back-end's default advanced options
    #[default]
    Default,
    /// All internal preprocessing disabled
    Plain,
    /// Tuned for satisfiable instances
    Sat,
    /// Tuned for unsatisfiable instances
    Unsat,
}

impl Preset {
    /// Name understood by the back-end
    pub fn as_str(self) -> &'static str {
        match self {
            Preset::Default => "default",
            Preset::Plain => "plain",
            Preset::Sat => "sat",
            Preset::Unsat => "unsat",
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Preset {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "default" => Ok(Preset::Default),
            "plain" => Ok(Preset::Plain),
            "sat" => Ok(Preset::Sat),
            "unsat" => Ok(Preset::Unsat),
            other => Err(Error::Config(format!("unknown preset `{other}`"))),
        }
    }
}

/// Configuration used when constructing a solver.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SolverConfig {
    pub preset: Preset,
}

impl SolverConfig {
    pub fn with_preset(preset: Preset) -> Self {
        Self { preset }
    }
}
