//! The five feasibility constraint families.
//!
//! Every family is materialized once per key, whether or not its summation
//! is empty; an empty sum is the zero expression.
//!
//! | Family                | Key      | Row                                                  |
//! |-----------------------|----------|------------------------------------------------------|
//! | factory output cap    | (f, p)   | Σ_{r ∈ out(f)} flow[p,r] ≤ output(f, p)              |
//! | store demand minimum  | (s, p)   | Σ_{r ∈ in(s)} flow[p,r] ≥ demand(s, p)               |
//! | truck capacity        | r        | Σ_t cap(t)·trucks[t,r] − Σ_p flow[p,r] ≥ 0           |
//! | warehouse equilibrium | (w, p)   | Σ_{r ∈ in(w)} flow[p,r] − Σ_{r ∈ out(w)} flow[p,r] = 0 |
//! | warehouse capacity    | w        | 0 ≤ Σ_p Σ_{r ∈ in(w)} flow[p,r] ≤ max tier capacity  |

use std::collections::BTreeMap;

use depot_core::{DepotError, PointId, ProductId, SupplyNetwork, WarehouseCostCurve};
use tracing::debug;

use crate::combinations::Combinations;
use crate::error::FormulationError;
use crate::model::{
    indexed_name, Comparison, Constraint, ConstraintFamily, LinearExpr, OptimizationModel,
};
use crate::topology::TopologyIndex;
use crate::variables::DecisionVariables;

pub struct ConstraintBuilder<'a> {
    network: &'a SupplyNetwork,
    topology: &'a TopologyIndex,
    combinations: &'a Combinations,
    vars: &'a DecisionVariables,
}

fn quantity(
    table: &BTreeMap<ProductId, f64>,
    point: &PointId,
    product: &ProductId,
    label: &str,
) -> Result<f64, FormulationError> {
    table.get(product).copied().ok_or_else(|| {
        DepotError::Schema(format!(
            "{} of {} has no entry for product '{}'",
            label, point, product
        ))
        .into()
    })
}

impl<'a> ConstraintBuilder<'a> {
    pub fn new(
        network: &'a SupplyNetwork,
        topology: &'a TopologyIndex,
        combinations: &'a Combinations,
        vars: &'a DecisionVariables,
    ) -> Self {
        Self {
            network,
            topology,
            combinations,
            vars,
        }
    }

    /// Add every family to the model, returning the number of rows added.
    pub fn build<M: OptimizationModel>(&self, model: &mut M) -> Result<usize, FormulationError> {
        let mut added = 0;
        added += self.factory_output(model)?;
        added += self.store_demand(model)?;
        added += self.truck_capacity(model)?;
        added += self.warehouse_balance(model)?;
        added += self.warehouse_capacity(model)?;
        debug!(constraints = added, "generated feasibility constraints");
        Ok(added)
    }

    pub fn factory_output<M: OptimizationModel>(
        &self,
        model: &mut M,
    ) -> Result<usize, FormulationError> {
        let mut count = 0;
        for (factory, outputs) in self.network.factories() {
            let routes = self.topology.outgoing(factory);
            for product in &self.network.products {
                let cap = quantity(outputs, factory, product, "productOutputs")?;
                model.add_constraint(Constraint::new(
                    indexed_name("ct_factories_max", &[factory.as_str(), product.as_str()]),
                    ConstraintFamily::FactoryOutput,
                    self.vars.flow_sum(product, routes),
                    Comparison::LessEq,
                    cap,
                ))?;
                count += 1;
            }
        }
        Ok(count)
    }

    pub fn store_demand<M: OptimizationModel>(
        &self,
        model: &mut M,
    ) -> Result<usize, FormulationError> {
        let mut count = 0;
        for (store, inputs) in self.network.stores() {
            let routes = self.topology.incoming(store);
            for product in &self.network.products {
                let demand = quantity(inputs, store, product, "productInputs")?;
                model.add_constraint(Constraint::new(
                    indexed_name("ct_stores_min", &[store.as_str(), product.as_str()]),
                    ConstraintFamily::StoreDemand,
                    self.vars.flow_sum(product, routes),
                    Comparison::GreaterEq,
                    demand,
                ))?;
                count += 1;
            }
        }
        Ok(count)
    }

    /// One row per route, including routes no truck type may service,
    /// which pins their flow to zero.
    pub fn truck_capacity<M: OptimizationModel>(
        &self,
        model: &mut M,
    ) -> Result<usize, FormulationError> {
        let mut count = 0;
        for route in self.network.routes.keys() {
            let mut expr = LinearExpr::new();
            for tr in self.combinations.trucks_on(route) {
                let (Some(var), Some(truck)) =
                    (self.vars.trucks.get(tr), self.network.truck(&tr.truck))
                else {
                    continue;
                };
                expr.add_term(*var, truck.capacity);
            }
            expr = expr - self.vars.route_flow(&self.network.products, route);

            model.add_constraint(Constraint::new(
                indexed_name("ct_truck_capacity_at_least", &[route.as_str()]),
                ConstraintFamily::TruckCapacity,
                expr,
                Comparison::GreaterEq,
                0.0,
            ))?;
            count += 1;
        }
        Ok(count)
    }

    pub fn warehouse_balance<M: OptimizationModel>(
        &self,
        model: &mut M,
    ) -> Result<usize, FormulationError> {
        let mut count = 0;
        for (warehouse, _) in self.network.warehouses() {
            let incoming = self.topology.incoming(warehouse);
            let outgoing = self.topology.outgoing(warehouse);
            for product in &self.network.products {
                let expr =
                    self.vars.flow_sum(product, incoming) - self.vars.flow_sum(product, outgoing);
                model.add_constraint(Constraint::new(
                    indexed_name(
                        "ct_warehouse_equilibrium",
                        &[warehouse.as_str(), product.as_str()],
                    ),
                    ConstraintFamily::WarehouseBalance,
                    expr,
                    Comparison::Equal,
                    0.0,
                ))?;
                count += 1;
            }
        }
        Ok(count)
    }

    pub fn warehouse_capacity<M: OptimizationModel>(
        &self,
        model: &mut M,
    ) -> Result<usize, FormulationError> {
        let mut count = 0;
        for (warehouse, tiers) in self.network.warehouses() {
            let max_capacity = WarehouseCostCurve::new(tiers)?.max_capacity();
            let inbound = self
                .vars
                .total_flow(&self.network.products, self.topology.incoming(warehouse));

            model.add_constraint(Constraint::new(
                indexed_name("ct_warehouse_max_capacity", &[warehouse.as_str()]),
                ConstraintFamily::WarehouseCapacity,
                inbound.clone(),
                Comparison::LessEq,
                max_capacity,
            ))?;
            model.add_constraint(Constraint::new(
                indexed_name("ct_warehouse_min_capacity", &[warehouse.as_str()]),
                ConstraintFamily::WarehouseCapacity,
                inbound,
                Comparison::GreaterEq,
                0.0,
            ))?;
            count += 2;
        }
        Ok(count)
    }
}
