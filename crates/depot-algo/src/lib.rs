//! # depot-algo: Distribution Planning MILP
//!
//! Builds the cost-minimizing distribution model of a [`depot_core::SupplyNetwork`]
//! and solves it through a pluggable [`SolverEngine`].
//!
//! ## Problem Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  MULTI-TIER DISTRIBUTION PLANNING                                        │
//! │  ────────────────────────────────                                        │
//! │                                                                          │
//! │  Given:                                                                  │
//! │    • Factories with per-product output limits                           │
//! │    • Warehouses with tiered usage costs                                 │
//! │    • Stores with per-product demand                                     │
//! │    • Directed routes with a per-unit cost                               │
//! │    • Truck types with capacity, day cost and eligible routes            │
//! │                                                                          │
//! │  Decide:                                                                 │
//! │    • Quantity of each product on each route (continuous)                │
//! │    • Trucks of each type dispatched on each route (integer)             │
//! │                                                                          │
//! │  Minimize:                                                               │
//! │    Truck rental + transport + warehouse usage                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## MILP Formulation
//!
//! ```text
//! minimize    Σ_{t,r} dayCost_t · trucks[t,r]
//!           + Σ_{p,r} costPerUnit_r · flow[p,r]
//!           + Σ_w Σ_i cost_{w,i} · tier_fill[w,i]
//!
//! subject to:
//!   Σ_{r ∈ out(f)} flow[p,r] ≤ output(f,p)             factory output cap
//!   Σ_{r ∈ in(s)}  flow[p,r] ≥ demand(s,p)             store demand minimum
//!   Σ_t cap_t · trucks[t,r] ≥ Σ_p flow[p,r]            truck capacity
//!   Σ_{r ∈ in(w)} flow[p,r] = Σ_{r ∈ out(w)} flow[p,r] warehouse equilibrium
//!   0 ≤ Σ_p Σ_{r ∈ in(w)} flow[p,r] ≤ capacity_max(w)  warehouse capacity
//!   Σ_i tier_fill[w,i] = Σ_p Σ_{r ∈ in(w)} flow[p,r]   tier link
//!   flow ≥ 0, trucks ∈ ℤ≥0, 0 ≤ tier_fill[w,i] ≤ width_{w,i}
//! ```
//!
//! ## Pipeline
//!
//! [`TopologyIndex`] → [`Combinations`] → [`VariableFactory`] →
//! [`CostExpressionBuilder`] → [`ConstraintBuilder`] → [`ModelAssembler`]
//! produce an immutable [`MilpModel`]; a [`SolverEngine`] turns it into a
//! [`SolveOutcome`] and [`solve_distribution`] reads that back into a
//! [`DistributionPlan`].

pub mod assembler;
pub mod combinations;
pub mod constraints;
pub mod cost;
pub mod error;
pub mod model;
pub mod plan;
pub mod solver;
pub mod topology;
pub mod variables;

pub use assembler::{formulate, Formulation, FormulationOptions, ModelAssembler};
pub use combinations::{Combinations, ProductRoute, TruckRoute};
pub use constraints::ConstraintBuilder;
pub use cost::{CostExpressionBuilder, CostExpressions};
pub use error::{FormulationError, SolveError};
pub use model::{
    Comparison, Constraint, ConstraintFamily, LinearExpr, MilpModel, ModelBuilder, ModelStats,
    ObjectiveSense, OptimizationModel, VarId, VariableDecl, VariableKind, Violation,
};
pub use plan::{
    solve_distribution, solve_formulation, CostBreakdown, DistributionPlan, NoSolutionReason,
    PlanOutcome,
};
pub use solver::{
    GoodLpEngine, MilpSolverKind, RawSolution, SolveOutcome, SolverConfig, SolverEngine,
};
pub use topology::TopologyIndex;
pub use variables::{DecisionVariables, TierActivation, VariableFactory};
