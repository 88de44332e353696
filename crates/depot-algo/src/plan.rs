//! Formulate, solve and read back a distribution plan.

use std::collections::BTreeMap;
use std::fmt;
use std::time::{Duration, Instant};

use depot_core::{DepotResult, PointId, SupplyNetwork};
use serde::Serialize;
use tracing::{info, warn};

use crate::assembler::{formulate, Formulation, FormulationOptions};
use crate::combinations::{ProductRoute, TruckRoute};
use crate::error::SolveError;
use crate::model::Violation;
use crate::solver::{RawSolution, SolveOutcome, SolverConfig, SolverEngine};

/// Objective split into its three components
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CostBreakdown {
    pub truck_rental: f64,
    pub transport: f64,
    pub warehouse_usage: f64,
}

impl CostBreakdown {
    pub fn total(&self) -> f64 {
        self.truck_rental + self.transport + self.warehouse_usage
    }
}

/// An optimal distribution plan
#[derive(Debug, Clone)]
pub struct DistributionPlan {
    pub solver: String,
    pub objective: f64,
    pub costs: CostBreakdown,
    /// Quantity moved per product and route
    pub flows: BTreeMap<ProductRoute, f64>,
    /// Trucks dispatched per truck type and route
    pub trucks: BTreeMap<TruckRoute, u64>,
    /// Total inbound flow per warehouse
    pub warehouse_throughput: BTreeMap<PointId, f64>,
    /// Every declared variable by name
    pub variable_values: BTreeMap<String, f64>,
    /// Rows or bounds the returned values break beyond tolerance
    pub violations: Vec<Violation>,
    pub solve_time: Duration,
}

impl DistributionPlan {
    fn from_solution(
        formulation: &Formulation,
        solution: &RawSolution,
        solver: &str,
        tolerance: f64,
        solve_time: Duration,
    ) -> Self {
        let model = &formulation.model;
        let value = |index: usize| solution.values.get(index).copied().unwrap_or(0.0);

        let variable_values = model
            .variables()
            .iter()
            .enumerate()
            .map(|(index, decl)| {
                let v = value(index);
                let snapped = if decl.kind.is_integral() && (v - v.round()).abs() <= tolerance {
                    v.round()
                } else {
                    v
                };
                (decl.name.clone(), snapped)
            })
            .collect();

        let flows = formulation
            .variables
            .flow
            .iter()
            .map(|(pr, var)| (pr.clone(), value(var.index())))
            .collect();

        let trucks = formulation
            .variables
            .trucks
            .iter()
            .map(|(tr, var)| (tr.clone(), value(var.index()).round().max(0.0) as u64))
            .collect();

        let mut warehouse_throughput: BTreeMap<PointId, f64> = BTreeMap::new();
        for ((warehouse, _), var) in &formulation.costs.tier_fill {
            *warehouse_throughput.entry(warehouse.clone()).or_default() += value(var.index());
        }

        let costs = CostBreakdown {
            truck_rental: formulation.costs.truck_rental.evaluate(&solution.values),
            transport: formulation.costs.transport.evaluate(&solution.values),
            warehouse_usage: formulation.costs.warehouse_usage.evaluate(&solution.values),
        };

        let violations = model.check_assignment(&solution.values, tolerance);
        for v in &violations {
            warn!(name = %v.name, amount = v.amount, "{}", v.detail);
        }

        Self {
            solver: solver.to_string(),
            objective: solution.objective,
            costs,
            flows,
            trucks,
            warehouse_throughput,
            variable_values,
            violations,
            solve_time,
        }
    }

    pub fn total_trucks(&self) -> u64 {
        self.trucks.values().sum()
    }

    /// Flows above `threshold`, for reporting
    pub fn active_flows(&self, threshold: f64) -> impl Iterator<Item = (&ProductRoute, &f64)> {
        self.flows.iter().filter(move |(_, q)| **q > threshold)
    }

    pub fn summary(&self) -> String {
        let mut s = String::new();
        s.push_str(&format!("Distribution Plan\n{}\n", "=".repeat(40)));
        s.push_str(&format!("Solver: {}\n", self.solver));
        s.push_str(&format!("Objective: {:.2}\n", self.objective));
        s.push_str(&format!("  Truck rental: {:.2}\n", self.costs.truck_rental));
        s.push_str(&format!("  Transport: {:.2}\n", self.costs.transport));
        s.push_str(&format!("  Warehouse usage: {:.2}\n", self.costs.warehouse_usage));
        s.push_str(&format!("Trucks dispatched: {}\n", self.total_trucks()));
        s.push_str(&format!("Solve Time: {:.2?}\n", self.solve_time));

        let flows: Vec<_> = self.active_flows(1e-9).collect();
        if !flows.is_empty() {
            s.push_str("\nFlows:\n");
            for (pr, q) in flows {
                s.push_str(&format!("  {} on {}: {:.2}\n", pr.product, pr.route, q));
            }
        }

        let dispatched: Vec<_> = self.trucks.iter().filter(|(_, n)| **n > 0).collect();
        if !dispatched.is_empty() {
            s.push_str("\nTrucks:\n");
            for (tr, n) in dispatched {
                s.push_str(&format!("  {} x{} on {}\n", tr.truck, n, tr.route));
            }
        }

        if !self.warehouse_throughput.is_empty() {
            s.push_str("\nWarehouse throughput:\n");
            for (warehouse, q) in &self.warehouse_throughput {
                s.push_str(&format!("  {}: {:.2}\n", warehouse, q));
            }
        }

        if !self.violations.is_empty() {
            s.push_str(&format!("\n{} violation(s) beyond tolerance\n", self.violations.len()));
        }
        s
    }
}

/// Why a solve produced no plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoSolutionReason {
    Infeasible,
    Unbounded,
}

impl fmt::Display for NoSolutionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoSolutionReason::Infeasible => write!(f, "infeasible"),
            NoSolutionReason::Unbounded => write!(f, "unbounded"),
        }
    }
}

#[derive(Debug, Clone)]
pub enum PlanOutcome {
    Solved(DistributionPlan),
    NoSolution(NoSolutionReason),
}

impl PlanOutcome {
    pub fn plan(&self) -> Option<&DistributionPlan> {
        match self {
            PlanOutcome::Solved(plan) => Some(plan),
            PlanOutcome::NoSolution(_) => None,
        }
    }
}

/// Solve an already built formulation.
pub fn solve_formulation(
    formulation: &Formulation,
    engine: &dyn SolverEngine,
    config: &SolverConfig,
) -> Result<PlanOutcome, SolveError> {
    let start = Instant::now();
    let outcome = engine.solve(&formulation.model)?;
    let elapsed = start.elapsed();

    info!(
        solver = engine.id(),
        status = outcome.status(),
        elapsed_ms = elapsed.as_millis() as u64,
        "solve finished"
    );

    Ok(match outcome {
        SolveOutcome::Optimal(solution) => PlanOutcome::Solved(DistributionPlan::from_solution(
            formulation,
            &solution,
            engine.id(),
            config.integrality_tolerance,
            elapsed,
        )),
        SolveOutcome::Infeasible => PlanOutcome::NoSolution(NoSolutionReason::Infeasible),
        SolveOutcome::Unbounded => PlanOutcome::NoSolution(NoSolutionReason::Unbounded),
    })
}

/// Formulate and solve the distribution model of `network`.
///
/// Input defects fail with a [`depot_core::DepotError`]; an infeasible or
/// unbounded model is a [`PlanOutcome::NoSolution`].
///
/// ```no_run
/// use depot_algo::{solve_distribution, FormulationOptions, GoodLpEngine, PlanOutcome, SolverConfig};
/// use depot_core::SupplyNetworkBuilder;
///
/// let network = SupplyNetworkBuilder::new()
///     .product("A")
///     .factory("F1", [("A", 10.0)])
///     .store("S1", [("A", 10.0)])
///     .route("R1", "F1", "S1", 2.0)
///     .truck("T1", 20.0, 5.0, ["R1"])
///     .build()?;
///
/// let config = SolverConfig::default();
/// let engine = GoodLpEngine::from_config(&config);
/// match solve_distribution(&network, &FormulationOptions::default(), &engine, &config)? {
///     PlanOutcome::Solved(plan) => println!("{}", plan.summary()),
///     PlanOutcome::NoSolution(reason) => println!("no plan: {reason}"),
/// }
/// # Ok::<(), depot_core::DepotError>(())
/// ```
pub fn solve_distribution(
    network: &SupplyNetwork,
    options: &FormulationOptions,
    engine: &dyn SolverEngine,
    config: &SolverConfig,
) -> DepotResult<PlanOutcome> {
    let formulation = formulate(network, options)?;
    Ok(solve_formulation(&formulation, engine, config)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MilpModel;
    use depot_core::SupplyNetworkBuilder;

    /// Engine returning a fixed outcome, for exercising read-back without a solver
    struct FixedEngine(SolveOutcome);

    impl SolverEngine for FixedEngine {
        fn id(&self) -> &str {
            "fixed"
        }

        fn solve(&self, _model: &MilpModel) -> Result<SolveOutcome, SolveError> {
            Ok(self.0.clone())
        }
    }

    fn network() -> SupplyNetwork {
        SupplyNetworkBuilder::new()
            .product("A")
            .factory("F1", [("A", 10.0)])
            .store("S1", [("A", 10.0)])
            .route("R1", "F1", "S1", 2.0)
            .truck("T1", 20.0, 5.0, ["R1"])
            .build()
            .unwrap()
    }

    #[test]
    fn test_plan_read_back() {
        let network = network();
        let formulation = formulate(&network, &FormulationOptions::default()).unwrap();
        let mut values = vec![0.0; 2];
        values[formulation.model.find_variable("flow[A,R1]").unwrap().index()] = 10.0;
        values[formulation.model.find_variable("trucks[T1,R1]").unwrap().index()] = 0.9999999;
        let engine = FixedEngine(SolveOutcome::Optimal(RawSolution {
            objective: formulation.model.objective_value(&values),
            values,
        }));

        let outcome = solve_formulation(&formulation, &engine, &SolverConfig::default()).unwrap();
        let plan = outcome.plan().unwrap();
        assert_eq!(plan.solver, "fixed");
        assert_eq!(plan.total_trucks(), 1);
        assert_eq!(plan.variable_values["trucks[T1,R1]"], 1.0);
        assert_eq!(plan.costs.transport, 20.0);
        assert!((plan.costs.total() - plan.objective).abs() < 1e-9);
        assert!(plan.violations.is_empty());
        assert!(plan.summary().contains("A on R1: 10.00"));
    }

    #[test]
    fn test_violations_are_reported() {
        let network = network();
        let formulation = formulate(&network, &FormulationOptions::default()).unwrap();
        let engine = FixedEngine(SolveOutcome::Optimal(RawSolution {
            values: vec![0.0, 0.0],
            objective: 0.0,
        }));
        let outcome = solve_formulation(&formulation, &engine, &SolverConfig::default()).unwrap();
        let plan = outcome.plan().unwrap();
        assert!(plan
            .violations
            .iter()
            .any(|v| v.name == "ct_stores_min[S1,A]"));
    }

    #[test]
    fn test_no_solution_outcomes() {
        let network = network();
        let options = FormulationOptions::default();
        let config = SolverConfig::default();

        let outcome =
            solve_distribution(&network, &options, &FixedEngine(SolveOutcome::Infeasible), &config)
                .unwrap();
        assert!(matches!(
            outcome,
            PlanOutcome::NoSolution(NoSolutionReason::Infeasible)
        ));
        assert!(outcome.plan().is_none());

        let outcome =
            solve_distribution(&network, &options, &FixedEngine(SolveOutcome::Unbounded), &config)
                .unwrap();
        assert!(matches!(
            outcome,
            PlanOutcome::NoSolution(NoSolutionReason::Unbounded)
        ));
    }
}
