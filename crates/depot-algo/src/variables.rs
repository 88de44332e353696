//! Decision variable declaration.
//!
//! | Variable            | Kind       | Domain   | One per                 |
//! |---------------------|------------|----------|-------------------------|
//! | `flow[p,r]`         | continuous | [0, ∞)   | product-route pair      |
//! | `trucks[t,r]`       | integer    | [0, ∞)   | truck-route pair        |
//! | `tier_active[w,i]`  | binary     | {0, 1}   | warehouse tier (opt-in) |
//!
//! Tier fill variables belong to the warehouse cost linearization and are
//! declared by [`crate::cost`].

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use depot_core::{PointId, ProductId, RouteId, SupplyNetwork};
use serde::{Deserialize, Serialize};

use crate::combinations::{Combinations, ProductRoute, TruckRoute};
use crate::error::FormulationError;
use crate::model::{indexed_name, LinearExpr, OptimizationModel, VarId, VariableKind};

/// How warehouse tier-activation binaries take part in the model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TierActivation {
    /// No activation binaries; convex tier curves only
    #[default]
    Omit,
    /// Declare one binary per warehouse tier without referencing it
    Declare,
    /// Binaries force tiers to fill in order, allowing non-convex curves
    EnforceOrder,
}

impl TierActivation {
    pub fn as_str(&self) -> &'static str {
        match self {
            TierActivation::Omit => "omit",
            TierActivation::Declare => "declare",
            TierActivation::EnforceOrder => "enforce-order",
        }
    }

    pub fn declares_binaries(&self) -> bool {
        !matches!(self, TierActivation::Omit)
    }
}

impl fmt::Display for TierActivation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TierActivation {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().replace('_', "-").as_str() {
            "omit" => Ok(TierActivation::Omit),
            "declare" => Ok(TierActivation::Declare),
            "enforce-order" | "enforce" => Ok(TierActivation::EnforceOrder),
            other => Err(format!(
                "unknown tier activation '{}'; supported values: omit, declare, enforce-order",
                other
            )),
        }
    }
}

/// Handles to every declared decision variable, keyed by combination.
#[derive(Debug, Clone, Default)]
pub struct DecisionVariables {
    pub flow: BTreeMap<ProductRoute, VarId>,
    pub trucks: BTreeMap<TruckRoute, VarId>,
    pub tier_active: BTreeMap<(PointId, usize), VarId>,
}

impl DecisionVariables {
    pub fn flow_var(&self, product: &ProductId, route: &RouteId) -> Option<VarId> {
        self.flow
            .get(&ProductRoute {
                product: product.clone(),
                route: route.clone(),
            })
            .copied()
    }

    /// Σ `flow[product, r]` over `routes`. Routes without a flow variable
    /// contribute nothing, so an empty route list gives the zero expression.
    pub fn flow_sum(&self, product: &ProductId, routes: &[RouteId]) -> LinearExpr {
        LinearExpr::sum_of(routes.iter().filter_map(|r| self.flow_var(product, r)))
    }

    /// Σ `flow[p, r]` over all products and the given routes
    pub fn total_flow(&self, products: &[ProductId], routes: &[RouteId]) -> LinearExpr {
        products.iter().map(|p| self.flow_sum(p, routes)).sum()
    }

    /// Σ `flow[p, route]` over all products
    pub fn route_flow(&self, products: &[ProductId], route: &RouteId) -> LinearExpr {
        self.total_flow(products, std::slice::from_ref(route))
    }

    pub fn tier_active_var(&self, warehouse: &PointId, tier: usize) -> Option<VarId> {
        self.tier_active.get(&(warehouse.clone(), tier)).copied()
    }
}

/// Declares flow, truck and (optionally) tier-activation variables.
pub struct VariableFactory;

impl VariableFactory {
    pub fn declare<M: OptimizationModel>(
        model: &mut M,
        network: &SupplyNetwork,
        combinations: &Combinations,
        activation: TierActivation,
    ) -> Result<DecisionVariables, FormulationError> {
        let mut vars = DecisionVariables::default();

        for pr in &combinations.product_routes {
            let name = indexed_name("flow", &[pr.product.as_str(), pr.route.as_str()]);
            let id = model.add_variable(name, VariableKind::Continuous, 0.0, None)?;
            vars.flow.insert(pr.clone(), id);
        }

        for tr in &combinations.truck_routes {
            let name = indexed_name("trucks", &[tr.truck.as_str(), tr.route.as_str()]);
            let id = model.add_variable(name, VariableKind::Integer, 0.0, None)?;
            vars.trucks.insert(tr.clone(), id);
        }

        if activation.declares_binaries() {
            for (warehouse, tiers) in network.warehouses() {
                for tier in 0..tiers.len() {
                    let name = indexed_name("tier_active", &[warehouse.as_str(), &tier.to_string()]);
                    let id = model.add_variable(name, VariableKind::Binary, 0.0, Some(1.0))?;
                    vars.tier_active.insert((warehouse.clone(), tier), id);
                }
            }
        }

        Ok(vars)
    }
}
