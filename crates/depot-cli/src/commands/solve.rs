//! `depot solve`

use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use depot_algo::{
    formulate, solve_formulation, DistributionPlan, GoodLpEngine, PlanOutcome, TierActivation,
};
use depot_io::{importers, write_solution, CostBreakdownDocument, SolutionDocument};
use tracing::{info, warn};

use depot_cli::DepotConfig;

/// Exit status when the model has no solution
pub const NO_SOLUTION_EXIT: u8 = 2;

pub struct SolveArgs<'a> {
    pub network: &'a Path,
    pub out: Option<&'a Path>,
    pub solver: Option<&'a str>,
    pub tier_activation: Option<TierActivation>,
    pub verify: bool,
}

fn solution_document(plan: &DistributionPlan) -> SolutionDocument {
    SolutionDocument {
        status: "optimal".to_string(),
        solver: plan.solver.clone(),
        objective_value: plan.objective,
        cost_breakdown: CostBreakdownDocument {
            truck_rental: plan.costs.truck_rental,
            transport: plan.costs.transport,
            warehouse_usage: plan.costs.warehouse_usage,
        },
        variables: plan.variable_values.clone(),
    }
}

pub fn handle(config: &DepotConfig, args: SolveArgs<'_>) -> Result<ExitCode> {
    let solver_config = config.solver_config(args.solver)?;
    let options = config.formulation_options(args.tier_activation);

    let imported = importers::load_network(args.network)
        .with_context(|| format!("loading network {}", args.network.display()))?;
    let network = imported.network;
    let stats = network.stats();
    println!(
        "Network loaded: {} products, {} factories, {} warehouses, {} stores, {} routes, {} truck types",
        stats.products, stats.factories, stats.warehouses, stats.stores, stats.routes, stats.truck_types
    );

    let formulation = formulate(&network, &options).context("building distribution model")?;
    let engine = GoodLpEngine::from_config(&solver_config);
    let outcome =
        solve_formulation(&formulation, &engine, &solver_config).context("solving model")?;

    let plan = match outcome {
        PlanOutcome::Solved(plan) => plan,
        PlanOutcome::NoSolution(reason) => {
            info!(%reason, "solver found no plan");
            println!("No solution found for this model.");
            return Ok(ExitCode::from(NO_SOLUTION_EXIT));
        }
    };

    println!("\n{}", plan.summary());

    if args.verify && !plan.violations.is_empty() {
        for v in &plan.violations {
            println!("  violated: {} ({}, by {:.3e})", v.name, v.detail, v.amount);
        }
        warn!(count = plan.violations.len(), "solution failed verification");
        return Ok(ExitCode::FAILURE);
    }

    if let Some(out) = args.out {
        write_solution(out, &solution_document(&plan))
            .with_context(|| format!("writing solution to {}", out.display()))?;
        println!("Results written to {}", out.display());
    }

    Ok(ExitCode::SUCCESS)
}
