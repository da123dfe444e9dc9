//! SAT back-end trait and the CaDiCaL implementation.

use crate::config::SolverConfig;
use crate::error::{Error, Result};

use super::Lit;

/// The contract consumed from an external SAT engine.
///
/// Variables are implicit: any literal that appears in a clause exists.
/// Variable allocation, the reserved TRUE variable and all gate encodings
/// live above this trait, in the engine.
pub trait SatBackend {
    /// Adds a clause
    fn add_clause(&mut self, clause: &[Lit]);

    /// Solves under the given assumptions.
    ///
    /// `Some(true)` is satisfiable, `Some(false)` unsatisfiable, `None` means
    /// the engine stopped without an answer.
    fn solve(&mut self, assumptions: &[Lit]) -> Option<bool>;

    /// Value of a literal in the last model, `None` if unconstrained
    fn value(&self, lit: Lit) -> Option<bool>;

    /// Number of clauses currently held
    fn num_clauses(&self) -> usize;

    /// Name and version of the engine
    fn signature(&self) -> String;
}

/// The CaDiCaL incremental SAT solver.
pub struct CadicalBackend {
    solver: cadical::Solver,
}

impl CadicalBackend {
    pub fn new() -> Self {
        Self {
            solver: cadical::Solver::new(),
        }
    }

    /// Create a solver with one of CaDiCaL's named option sets
    pub fn with_config(config: &SolverConfig) -> Result<Self> {
        let solver = cadical::Solver::with_config(config.preset.as_str())
            .map_err(|e| Error::Config(e.msg))?;
        Ok(Self { solver })
    }
}

impl Default for CadicalBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl SatBackend for CadicalBackend {
    fn add_clause(&mut self, clause: &[Lit]) {
        self.solver.add_clause(clause.iter().map(|lit| lit.to_dimacs()));
    }

    fn solve(&mut self, assumptions: &[Lit]) -> Option<bool> {
        if assumptions.is_empty() {
            self.solver.solve()
        } else {
            self.solver
                .solve_with(assumptions.iter().map(|lit| lit.to_dimacs()))
        }
    }

    fn value(&self, lit: Lit) -> Option<bool> {
        self.solver.value(lit.to_dimacs())
    }

    fn num_clauses(&self) -> usize {
        self.solver.num_clauses()
    }

    fn signature(&self) -> String {
        self.solver.signature().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(v: i32) -> Lit {
        Lit::from_dimacs(v).unwrap()
    }

    #[test]
    fn test_cadical_sat_and_unsat() {
        let mut backend = CadicalBackend::new();
        backend.add_clause(&[lit(1), lit(2)]);
        backend.add_clause(&[lit(-1), lit(3)]);
        assert_eq!(backend.solve(&[]), Some(true));

        backend.add_clause(&[lit(-2)]);
        backend.add_clause(&[lit(-3)]);
        assert_eq!(backend.solve(&[]), Some(false));
    }

    #[test]
    fn test_cadical_assumptions() {
        let mut backend = CadicalBackend::new();
        backend.add_clause(&[lit(1), lit(2)]);
        assert_eq!(backend.solve(&[lit(-1), lit(-2)]), Some(false));
        assert_eq!(backend.solve(&[lit(-1)]), Some(true));
        assert_eq!(backend.value(lit(2)), Some(true));
    }

    #[test]
    fn test_cadical_presets() {
        use crate::config::Preset;
        for preset in [Preset::Default, Preset::Plain, Preset::Sat, Preset::Unsat] {
            assert!(CadicalBackend::with_config(&SolverConfig::with_preset(preset)).is_ok());
        }
    }
}
