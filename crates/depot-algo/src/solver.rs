//! Solver engines.
//!
//! A [`SolverEngine`] consumes an immutable [`MilpModel`] and either
//! returns a value for every declared variable or reports that the model
//! is infeasible or unbounded. Those two outcomes are ordinary results,
//! not errors.
//!
//! [`GoodLpEngine`] translates the model into `good_lp` and runs one of
//! the MILP backends compiled into this build:
//!
//! | Backend   | Feature        | Notes                        |
//! |-----------|----------------|------------------------------|
//! | `microlp` | always         | pure Rust branch and bound   |
//! | `highs`   | `solver-highs` | native HiGHS, faster at size |

use std::fmt;
use std::str::FromStr;

use good_lp::{
    constraint, variable, Expression, ProblemVariables, ResolutionError, Solution, Solver,
    SolverModel, Variable,
};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::SolveError;
use crate::model::{Comparison, MilpModel, ObjectiveSense, VariableKind};

/// Values returned by a successful solve
#[derive(Debug, Clone, PartialEq)]
pub struct RawSolution {
    /// One value per declared variable, indexed by [`crate::model::VarId`]
    pub values: Vec<f64>,
    /// Objective recomputed from the model's own expression
    pub objective: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SolveOutcome {
    Optimal(RawSolution),
    Infeasible,
    Unbounded,
}

impl SolveOutcome {
    pub fn status(&self) -> &'static str {
        match self {
            SolveOutcome::Optimal(_) => "optimal",
            SolveOutcome::Infeasible => "infeasible",
            SolveOutcome::Unbounded => "unbounded",
        }
    }
}

/// Something that can solve a [`MilpModel`].
pub trait SolverEngine {
    /// Short identifier, e.g. "microlp"
    fn id(&self) -> &str;

    fn solve(&self, model: &MilpModel) -> Result<SolveOutcome, SolveError>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MilpSolverKind {
    #[default]
    Microlp,
    #[cfg(feature = "solver-highs")]
    Highs,
}

const AVAILABLE_MILP_SOLVERS: &[&str] = &[
    "microlp",
    #[cfg(feature = "solver-highs")]
    "highs",
];

impl MilpSolverKind {
    pub fn available() -> &'static [&'static str] {
        AVAILABLE_MILP_SOLVERS
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MilpSolverKind::Microlp => "microlp",
            #[cfg(feature = "solver-highs")]
            MilpSolverKind::Highs => "highs",
        }
    }
}

impl fmt::Display for MilpSolverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn unknown_solver_error(label: &str) -> SolveError {
    SolveError::UnknownSolver {
        label: label.to_string(),
        available: MilpSolverKind::available().join(", "),
    }
}

impl FromStr for MilpSolverKind {
    type Err = SolveError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.to_ascii_lowercase();
        match normalized.as_str() {
            "microlp" | "default" => Ok(MilpSolverKind::Microlp),
            "highs" => {
                #[cfg(feature = "solver-highs")]
                {
                    Ok(MilpSolverKind::Highs)
                }
                #[cfg(not(feature = "solver-highs"))]
                {
                    Err(unknown_solver_error(&normalized))
                }
            }
            _ => Err(unknown_solver_error(&normalized)),
        }
    }
}

/// Solver selection and result interpretation settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverConfig {
    pub solver: MilpSolverKind,
    /// Slack allowed when reading integer values and checking rows
    pub integrality_tolerance: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            solver: MilpSolverKind::default(),
            integrality_tolerance: 1e-6,
        }
    }
}

/// [`SolverEngine`] backed by `good_lp`
#[derive(Debug, Clone, Copy, Default)]
pub struct GoodLpEngine {
    kind: MilpSolverKind,
}

impl GoodLpEngine {
    pub fn new(kind: MilpSolverKind) -> Self {
        Self { kind }
    }

    pub fn from_config(config: &SolverConfig) -> Self {
        Self::new(config.solver)
    }

    pub fn kind(&self) -> MilpSolverKind {
        self.kind
    }
}

impl SolverEngine for GoodLpEngine {
    fn id(&self) -> &str {
        self.kind.as_str()
    }

    fn solve(&self, model: &MilpModel) -> Result<SolveOutcome, SolveError> {
        info!(
            solver = self.kind.as_str(),
            variables = model.variables().len(),
            constraints = model.constraints().len(),
            "solving model"
        );

        // Rows without variables are decided here; backends differ on
        // whether they accept them.
        for c in model.constraints().iter().filter(|c| c.expr.is_constant()) {
            if c.violation(&[]) > 0.0 {
                debug!(constraint = %c.name, "constant row is violated");
                return Ok(SolveOutcome::Infeasible);
            }
        }
        if model.variables().is_empty() {
            return Ok(SolveOutcome::Optimal(RawSolution {
                values: Vec::new(),
                objective: model.objective_value(&[]),
            }));
        }

        match self.kind {
            MilpSolverKind::Microlp => {
                run_good_lp(model, good_lp::solvers::microlp::microlp, self.id())
            }
            #[cfg(feature = "solver-highs")]
            MilpSolverKind::Highs => run_good_lp(model, good_lp::solvers::highs::highs, self.id()),
        }
    }
}

fn affine(expr: &crate::model::LinearExpr, vars: &[Variable]) -> Expression {
    let mut out = Expression::from(expr.constant_term());
    for (var, coef) in expr.terms() {
        out += *coef * vars[var.index()];
    }
    out
}

fn run_good_lp<S>(model: &MilpModel, solver: S, solver_id: &str) -> Result<SolveOutcome, SolveError>
where
    S: Solver,
    S::Model: SolverModel<Error = ResolutionError>,
{
    let mut problem = ProblemVariables::new();
    let vars: Vec<Variable> = model
        .variables()
        .iter()
        .map(|decl| {
            let mut def = variable().name(decl.name.clone());
            def = match decl.kind {
                VariableKind::Continuous => def,
                VariableKind::Integer => def.integer(),
                VariableKind::Binary => def.binary(),
            };
            def = def.min(decl.lower);
            if let Some(upper) = decl.upper {
                def = def.max(upper);
            }
            problem.add(def)
        })
        .collect();

    let objective = affine(model.objective(), &vars);
    let unsolved = match model.sense() {
        ObjectiveSense::Minimize => problem.minimise(objective),
        ObjectiveSense::Maximize => problem.maximise(objective),
    };
    let mut lp = unsolved.using(solver);

    for c in model.constraints().iter().filter(|c| !c.expr.is_constant()) {
        let lhs = affine(&c.expr, &vars);
        let rhs = c.rhs;
        lp = match c.cmp {
            Comparison::LessEq => lp.with(constraint!(lhs <= rhs)),
            Comparison::GreaterEq => lp.with(constraint!(lhs >= rhs)),
            Comparison::Equal => lp.with(constraint!(lhs == rhs)),
        };
    }

    match lp.solve() {
        Ok(solution) => {
            let values: Vec<f64> = vars.iter().map(|v| solution.value(*v)).collect();
            let objective = model.objective_value(&values);
            debug!(objective, "solver returned a solution");
            Ok(SolveOutcome::Optimal(RawSolution { values, objective }))
        }
        Err(ResolutionError::Infeasible) => Ok(SolveOutcome::Infeasible),
        Err(ResolutionError::Unbounded) => Ok(SolveOutcome::Unbounded),
        Err(other) => Err(SolveError::Engine {
            solver: solver_id.to_string(),
            message: other.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Constraint, ConstraintFamily, LinearExpr, ModelBuilder, OptimizationModel};

    #[test]
    fn test_solver_kind_parsing() {
        assert_eq!("MICROLP".parse::<MilpSolverKind>().unwrap(), MilpSolverKind::Microlp);
        let err = "gurobi".parse::<MilpSolverKind>().unwrap_err();
        assert!(err.to_string().contains("supported values: microlp"));
        assert_eq!(MilpSolverKind::available()[0], "microlp");
    }

    #[test]
    fn test_default_config() {
        let config = SolverConfig::default();
        assert_eq!(config.solver, MilpSolverKind::Microlp);
        assert_eq!(GoodLpEngine::from_config(&config).id(), "microlp");
    }

    #[test]
    fn test_engine_is_object_safe() {
        let engine: Box<dyn SolverEngine> = Box::new(GoodLpEngine::default());
        assert_eq!(engine.id(), "microlp");
    }

    #[test]
    fn test_small_integer_program() {
        // min y  s.t.  5y >= x,  x >= 7,  y integer
        let mut b = ModelBuilder::new("small");
        let x = b
            .add_variable("x".into(), VariableKind::Continuous, 0.0, None)
            .unwrap();
        let y = b
            .add_variable("y".into(), VariableKind::Integer, 0.0, None)
            .unwrap();
        b.add_constraint(Constraint::new(
            "cap",
            ConstraintFamily::TruckCapacity,
            LinearExpr::from(y).scaled(5.0) - LinearExpr::from(x),
            Comparison::GreaterEq,
            0.0,
        ))
        .unwrap();
        b.add_constraint(Constraint::new(
            "demand",
            ConstraintFamily::StoreDemand,
            LinearExpr::from(x),
            Comparison::GreaterEq,
            7.0,
        ))
        .unwrap();
        b.set_objective(ObjectiveSense::Minimize, LinearExpr::from(y));
        let model = b.build().unwrap();

        match GoodLpEngine::default().solve(&model).unwrap() {
            SolveOutcome::Optimal(solution) => {
                assert!((solution.objective - 2.0).abs() < 1e-6);
                assert!((solution.values[y.index()] - 2.0).abs() < 1e-6);
            }
            other => panic!("expected optimal, got {}", other.status()),
        }
    }

    #[test]
    fn test_violated_constant_row_is_infeasible() {
        let mut b = ModelBuilder::new("const");
        b.add_variable("x".into(), VariableKind::Continuous, 0.0, Some(1.0))
            .unwrap();
        b.add_constraint(Constraint::new(
            "impossible",
            ConstraintFamily::StoreDemand,
            LinearExpr::new(),
            Comparison::GreaterEq,
            3.0,
        ))
        .unwrap();
        b.set_objective(ObjectiveSense::Minimize, LinearExpr::new());
        let model = b.build().unwrap();
        assert_eq!(
            GoodLpEngine::default().solve(&model).unwrap(),
            SolveOutcome::Infeasible
        );
    }

    #[test]
    fn test_conflicting_rows_are_infeasible() {
        let mut b = ModelBuilder::new("conflict");
        let x = b
            .add_variable("x".into(), VariableKind::Continuous, 0.0, None)
            .unwrap();
        b.add_constraint(Constraint::new(
            "hi",
            ConstraintFamily::StoreDemand,
            LinearExpr::from(x),
            Comparison::GreaterEq,
            10.0,
        ))
        .unwrap();
        b.add_constraint(Constraint::new(
            "lo",
            ConstraintFamily::FactoryOutput,
            LinearExpr::from(x),
            Comparison::LessEq,
            4.0,
        ))
        .unwrap();
        b.set_objective(ObjectiveSense::Minimize, LinearExpr::from(x));
        let model = b.build().unwrap();
        assert_eq!(
            GoodLpEngine::default().solve(&model).unwrap(),
            SolveOutcome::Infeasible
        );
    }
}
