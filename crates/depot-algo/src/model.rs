//! Solver-independent MILP model description.
//!
//! Construction code talks to the [`OptimizationModel`] capability
//! (declare a variable, add a linear constraint, set the objective).
//! [`ModelBuilder`] implements it and produces an immutable [`MilpModel`]
//! that is handed once to a solver engine. Nothing here depends on a
//! solver being present, so every formulation step can be tested alone.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub};

use serde::Serialize;

use crate::error::FormulationError;

/// Build a name like `flow[A,R1]`, escaping `\ , [ ]` inside keys so that
/// distinct key tuples always give distinct names.
pub fn indexed_name(base: &str, keys: &[&str]) -> String {
    let mut name = String::from(base);
    name.push('[');
    for (i, key) in keys.iter().enumerate() {
        if i > 0 {
            name.push(',');
        }
        for ch in key.chars() {
            if matches!(ch, '\\' | ',' | '[' | ']') {
                name.push('\\');
            }
            name.push(ch);
        }
    }
    name.push(']');
    name
}

/// Handle to a declared variable (its position in declaration order)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarId(usize);

impl VarId {
    #[inline]
    pub fn index(&self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableKind {
    Continuous,
    Integer,
    Binary,
}

impl VariableKind {
    pub fn is_integral(&self) -> bool {
        !matches!(self, VariableKind::Continuous)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariableDecl {
    pub name: String,
    pub kind: VariableKind,
    pub lower: f64,
    /// `None` means unbounded above
    pub upper: Option<f64>,
}

/// Affine expression `Σ coef·var + constant`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinearExpr {
    terms: Vec<(VarId, f64)>,
    constant: f64,
}

impl LinearExpr {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn constant(value: f64) -> Self {
        Self {
            terms: Vec::new(),
            constant: value,
        }
    }

    /// Sum of the given variables with unit coefficients
    pub fn sum_of(vars: impl IntoIterator<Item = VarId>) -> Self {
        Self {
            terms: vars.into_iter().map(|v| (v, 1.0)).collect(),
            constant: 0.0,
        }
    }

    pub fn add_term(&mut self, var: VarId, coef: f64) {
        self.terms.push((var, coef));
    }

    pub fn with_term(mut self, var: VarId, coef: f64) -> Self {
        self.add_term(var, coef);
        self
    }

    pub fn terms(&self) -> &[(VarId, f64)] {
        &self.terms
    }

    pub fn constant_term(&self) -> f64 {
        self.constant
    }

    /// True when the expression has no variable terms
    pub fn is_constant(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn scaled(mut self, factor: f64) -> Self {
        for (_, coef) in &mut self.terms {
            *coef *= factor;
        }
        self.constant *= factor;
        self
    }

    /// Value of the expression under a full assignment indexed by [`VarId`].
    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.terms
            .iter()
            .map(|(var, coef)| coef * values.get(var.index()).copied().unwrap_or(0.0))
            .sum::<f64>()
            + self.constant
    }
}

impl From<VarId> for LinearExpr {
    fn from(var: VarId) -> Self {
        LinearExpr::new().with_term(var, 1.0)
    }
}

impl AddAssign<LinearExpr> for LinearExpr {
    fn add_assign(&mut self, rhs: LinearExpr) {
        self.terms.extend(rhs.terms);
        self.constant += rhs.constant;
    }
}

impl Add for LinearExpr {
    type Output = LinearExpr;

    fn add(mut self, rhs: LinearExpr) -> LinearExpr {
        self += rhs;
        self
    }
}

impl Sub for LinearExpr {
    type Output = LinearExpr;

    fn sub(self, rhs: LinearExpr) -> LinearExpr {
        self + rhs.scaled(-1.0)
    }
}

impl Sum for LinearExpr {
    fn sum<I: Iterator<Item = LinearExpr>>(iter: I) -> Self {
        iter.fold(LinearExpr::new(), |acc, e| acc + e)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Comparison {
    LessEq,
    GreaterEq,
    Equal,
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Comparison::LessEq => write!(f, "<="),
            Comparison::GreaterEq => write!(f, ">="),
            Comparison::Equal => write!(f, "=="),
        }
    }
}

/// Which rule of the distribution model a constraint encodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintFamily {
    FactoryOutput,
    StoreDemand,
    TruckCapacity,
    WarehouseBalance,
    WarehouseCapacity,
    /// Tier fill variables sum to the warehouse's inbound flow
    TierLink,
    /// Tier fill ordering for non-convex cost curves
    TierOrder,
}

impl ConstraintFamily {
    pub const ALL: [ConstraintFamily; 7] = [
        ConstraintFamily::FactoryOutput,
        ConstraintFamily::StoreDemand,
        ConstraintFamily::TruckCapacity,
        ConstraintFamily::WarehouseBalance,
        ConstraintFamily::WarehouseCapacity,
        ConstraintFamily::TierLink,
        ConstraintFamily::TierOrder,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConstraintFamily::FactoryOutput => "factory_output",
            ConstraintFamily::StoreDemand => "store_demand",
            ConstraintFamily::TruckCapacity => "truck_capacity",
            ConstraintFamily::WarehouseBalance => "warehouse_balance",
            ConstraintFamily::WarehouseCapacity => "warehouse_capacity",
            ConstraintFamily::TierLink => "tier_link",
            ConstraintFamily::TierOrder => "tier_order",
        }
    }
}

impl fmt::Display for ConstraintFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `expr cmp rhs`
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    pub name: String,
    pub family: ConstraintFamily,
    pub expr: LinearExpr,
    pub cmp: Comparison,
    pub rhs: f64,
}

impl Constraint {
    pub fn new(
        name: impl Into<String>,
        family: ConstraintFamily,
        expr: LinearExpr,
        cmp: Comparison,
        rhs: f64,
    ) -> Self {
        Self {
            name: name.into(),
            family,
            expr,
            cmp,
            rhs,
        }
    }

    /// How far the assignment is from satisfying the constraint (0 if it does)
    pub fn violation(&self, values: &[f64]) -> f64 {
        let lhs = self.expr.evaluate(values);
        match self.cmp {
            Comparison::LessEq => (lhs - self.rhs).max(0.0),
            Comparison::GreaterEq => (self.rhs - lhs).max(0.0),
            Comparison::Equal => (lhs - self.rhs).abs(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum ObjectiveSense {
    #[default]
    Minimize,
    Maximize,
}

/// The abstract capability formulation code builds against.
pub trait OptimizationModel {
    fn add_variable(
        &mut self,
        name: String,
        kind: VariableKind,
        lower: f64,
        upper: Option<f64>,
    ) -> Result<VarId, FormulationError>;

    fn add_constraint(&mut self, constraint: Constraint) -> Result<(), FormulationError>;

    fn set_objective(&mut self, sense: ObjectiveSense, objective: LinearExpr);
}

/// An assignment that breaks a bound, integrality or a constraint
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Violation {
    pub name: String,
    pub detail: String,
    pub amount: f64,
}

/// Sizes of a model, broken down the way the formulation is organised
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ModelStats {
    pub continuous: usize,
    pub integer: usize,
    pub binary: usize,
    pub constraints: Vec<(ConstraintFamily, usize)>,
}

impl ModelStats {
    pub fn variables(&self) -> usize {
        self.continuous + self.integer + self.binary
    }

    pub fn total_constraints(&self) -> usize {
        self.constraints.iter().map(|(_, n)| n).sum()
    }

    pub fn constraints_in(&self, family: ConstraintFamily) -> usize {
        self.constraints
            .iter()
            .find(|(f, _)| *f == family)
            .map(|(_, n)| *n)
            .unwrap_or(0)
    }
}

/// Immutable model handed to a solver engine
#[derive(Debug, Clone)]
pub struct MilpModel {
    name: String,
    variables: Vec<VariableDecl>,
    variable_names: HashMap<String, VarId>,
    constraints: Vec<Constraint>,
    objective: LinearExpr,
    sense: ObjectiveSense,
}

impl MilpModel {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn variables(&self) -> &[VariableDecl] {
        &self.variables
    }

    pub fn variable(&self, id: VarId) -> &VariableDecl {
        &self.variables[id.index()]
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn objective(&self) -> &LinearExpr {
        &self.objective
    }

    pub fn sense(&self) -> ObjectiveSense {
        self.sense
    }

    /// Look a variable up by its declared name (linear scan).
    pub fn find_variable(&self, name: &str) -> Option<VarId> {
        self.variable_names.get(name).copied()
    }

    pub fn constraints_in(&self, family: ConstraintFamily) -> impl Iterator<Item = &Constraint> {
        self.constraints.iter().filter(move |c| c.family == family)
    }

    pub fn objective_value(&self, values: &[f64]) -> f64 {
        self.objective.evaluate(values)
    }

    pub fn stats(&self) -> ModelStats {
        let mut stats = ModelStats::default();
        for var in &self.variables {
            match var.kind {
                VariableKind::Continuous => stats.continuous += 1,
                VariableKind::Integer => stats.integer += 1,
                VariableKind::Binary => stats.binary += 1,
            }
        }
        stats.constraints = ConstraintFamily::ALL
            .iter()
            .map(|family| (*family, self.constraints_in(*family).count()))
            .collect();
        stats
    }

    /// Check an assignment against bounds, integrality and constraints.
    pub fn check_assignment(&self, values: &[f64], tolerance: f64) -> Vec<Violation> {
        let mut violations = Vec::new();

        for (index, var) in self.variables.iter().enumerate() {
            let value = values.get(index).copied().unwrap_or(f64::NAN);
            if !value.is_finite() {
                violations.push(Violation {
                    name: var.name.clone(),
                    detail: "no finite value".into(),
                    amount: f64::INFINITY,
                });
                continue;
            }
            if value < var.lower - tolerance {
                violations.push(Violation {
                    name: var.name.clone(),
                    detail: format!("below lower bound {}", var.lower),
                    amount: var.lower - value,
                });
            }
            if let Some(upper) = var.upper {
                if value > upper + tolerance {
                    violations.push(Violation {
                        name: var.name.clone(),
                        detail: format!("above upper bound {}", upper),
                        amount: value - upper,
                    });
                }
            }
            if var.kind.is_integral() && (value - value.round()).abs() > tolerance {
                violations.push(Violation {
                    name: var.name.clone(),
                    detail: "not integral".into(),
                    amount: (value - value.round()).abs(),
                });
            }
        }

        for constraint in &self.constraints {
            let amount = constraint.violation(values);
            if amount > tolerance {
                violations.push(Violation {
                    name: constraint.name.clone(),
                    detail: format!(
                        "{} {} {} violated",
                        constraint.family, constraint.cmp, constraint.rhs
                    ),
                    amount,
                });
            }
        }

        violations
    }
}

/// Accumulates declarations and produces a [`MilpModel`].
#[derive(Debug, Default)]
pub struct ModelBuilder {
    name: String,
    variables: Vec<VariableDecl>,
    variable_names: HashMap<String, VarId>,
    constraints: Vec<Constraint>,
    constraint_names: HashSet<String>,
    objective: Option<(ObjectiveSense, LinearExpr)>,
}

impl ModelBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    fn check_expr(&self, context: &str, expr: &LinearExpr) -> Result<(), FormulationError> {
        if !expr.constant_term().is_finite() {
            return Err(FormulationError::NonFinite(context.to_string()));
        }
        for (var, coef) in expr.terms() {
            if var.index() >= self.variables.len() {
                return Err(FormulationError::UnknownVariable {
                    context: context.to_string(),
                    index: var.index(),
                });
            }
            if !coef.is_finite() {
                return Err(FormulationError::NonFinite(context.to_string()));
            }
        }
        Ok(())
    }

    pub fn build(self) -> Result<MilpModel, FormulationError> {
        let (sense, objective) = self.objective.ok_or(FormulationError::MissingObjective)?;
        Ok(MilpModel {
            name: self.name,
            variables: self.variables,
            variable_names: self.variable_names,
            constraints: self.constraints,
            objective,
            sense,
        })
    }
}

impl OptimizationModel for ModelBuilder {
    fn add_variable(
        &mut self,
        name: String,
        kind: VariableKind,
        lower: f64,
        upper: Option<f64>,
    ) -> Result<VarId, FormulationError> {
        let (lower, upper) = match kind {
            VariableKind::Binary => (0.0, Some(1.0)),
            _ => (lower, upper),
        };
        let upper_value = upper.unwrap_or(f64::INFINITY);
        if lower.is_nan() || upper_value.is_nan() || lower > upper_value || lower == f64::INFINITY
        {
            return Err(FormulationError::InvalidBounds {
                name,
                lower,
                upper: upper_value,
            });
        }
        if self.variable_names.contains_key(&name) {
            return Err(FormulationError::DuplicateVariable(name));
        }

        let id = VarId(self.variables.len());
        self.variable_names.insert(name.clone(), id);
        self.variables.push(VariableDecl {
            name,
            kind,
            lower,
            upper,
        });
        Ok(id)
    }

    fn add_constraint(&mut self, mut constraint: Constraint) -> Result<(), FormulationError> {
        let context = format!("constraint '{}'", constraint.name);
        self.check_expr(&context, &constraint.expr)?;
        if !constraint.rhs.is_finite() {
            return Err(FormulationError::NonFinite(context));
        }
        if !self.constraint_names.insert(constraint.name.clone()) {
            return Err(FormulationError::DuplicateConstraint(constraint.name));
        }

        // Keep constants on the right-hand side only.
        constraint.rhs -= constraint.expr.constant;
        constraint.expr.constant = 0.0;
        self.constraints.push(constraint);
        Ok(())
    }

    fn set_objective(&mut self, sense: ObjectiveSense, objective: LinearExpr) {
        self.objective = Some((sense, objective));
    }
}
