//! Formulation and solver errors

use depot_core::{DepotError, PointId};
use thiserror::Error;

/// Errors raised while building the model. All are fatal to the run.
#[derive(Debug, Error)]
pub enum FormulationError {
    /// The network description is invalid (schema or configuration)
    #[error(transparent)]
    Input(#[from] DepotError),

    /// Marginal tier costs decrease, so segments would fill out of order
    #[error(
        "warehouse {warehouse} has decreasing tier costs; use tier activation 'enforce-order' to model them"
    )]
    NonConvexTiers { warehouse: PointId },

    #[error("variable name '{0}' is declared twice")]
    DuplicateVariable(String),

    #[error("constraint name '{0}' is declared twice")]
    DuplicateConstraint(String),

    #[error("variable '{name}' has invalid bounds [{lower}, {upper}]")]
    InvalidBounds { name: String, lower: f64, upper: f64 },

    /// A constraint or objective references a variable this model never declared
    #[error("{context} references unknown variable #{index}")]
    UnknownVariable { context: String, index: usize },

    #[error("{0} contains a non-finite coefficient")]
    NonFinite(String),

    #[error("model has no objective")]
    MissingObjective,
}

/// Errors raised by a solver engine other than infeasible/unbounded,
/// which are ordinary outcomes.
#[derive(Debug, Error)]
pub enum SolveError {
    #[error("unknown solver '{label}'; supported values: {available}")]
    UnknownSolver { label: String, available: String },

    #[error("solver {solver} failed: {message}")]
    Engine { solver: String, message: String },
}

impl From<FormulationError> for DepotError {
    fn from(err: FormulationError) -> Self {
        match err {
            FormulationError::Input(inner) => inner,
            FormulationError::NonConvexTiers { .. } => DepotError::Config(err.to_string()),
            other => DepotError::Model(other.to_string()),
        }
    }
}

impl From<SolveError> for DepotError {
    fn from(err: SolveError) -> Self {
        DepotError::Solver(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_errors_pass_through() {
        let err: DepotError =
            FormulationError::Input(DepotError::Schema("dangling route".into())).into();
        assert!(matches!(err, DepotError::Schema(_)));
    }

    #[test]
    fn test_non_convex_is_config_error() {
        let err: DepotError = FormulationError::NonConvexTiers {
            warehouse: PointId::new("W1"),
        }
        .into();
        assert!(matches!(err, DepotError::Config(_)));
        assert!(err.to_string().contains("W1"));
    }

    #[test]
    fn test_solve_error_display() {
        let err = SolveError::Engine {
            solver: "microlp".into(),
            message: "numerical trouble".into(),
        };
        assert_eq!(err.to_string(), "solver microlp failed: numerical trouble");
    }
}
