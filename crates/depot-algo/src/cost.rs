//! Cost expressions: truck rental, transport and warehouse usage.
//!
//! ## Warehouse usage linearization
//!
//! Each tier `i` of warehouse `w` gets a continuous fill variable bounded by
//! the tier's width:
//!
//! ```text
//! 0 ≤ tier_fill[w,i] ≤ capacity_i - capacity_{i-1}        (capacity_{-1} = 0)
//! Σ_i tier_fill[w,i] = Σ_{p, r ∈ in(w)} flow[p,r]         (ct_tier_link)
//! usage(w) = Σ_i cost_i · tier_fill[w,i]
//! ```
//!
//! With non-decreasing marginal costs a minimizing solver fills cheaper
//! tiers first, so `usage(w)` equals the step cost at the optimum. For
//! curves whose costs decrease, [`TierActivation::EnforceOrder`] adds
//! ordering rows on the tier binaries:
//!
//! ```text
//! tier_fill[w,i] ≤ width_i · tier_active[w,i]
//! tier_fill[w,i] ≥ width_i · tier_active[w,i+1]
//! ```

use std::collections::BTreeMap;

use depot_core::{PointId, SupplyNetwork, WarehouseCostCurve};
use tracing::debug;

use crate::combinations::Combinations;
use crate::error::FormulationError;
use crate::model::{
    indexed_name, Comparison, Constraint, ConstraintFamily, LinearExpr, OptimizationModel, VarId,
    VariableKind,
};
use crate::topology::TopologyIndex;
use crate::variables::{DecisionVariables, TierActivation};

/// The three objective components, kept apart for reporting
#[derive(Debug, Clone, Default)]
pub struct CostExpressions {
    pub truck_rental: LinearExpr,
    pub transport: LinearExpr,
    /// Sum of every warehouse's usage cost
    pub warehouse_usage: LinearExpr,
    pub per_warehouse: BTreeMap<PointId, LinearExpr>,
    /// Segment variables of the usage linearization
    pub tier_fill: BTreeMap<(PointId, usize), VarId>,
}

impl CostExpressions {
    pub fn total(&self) -> LinearExpr {
        self.truck_rental.clone() + self.transport.clone() + self.warehouse_usage.clone()
    }
}

pub struct CostExpressionBuilder<'a> {
    network: &'a SupplyNetwork,
    topology: &'a TopologyIndex,
    combinations: &'a Combinations,
    vars: &'a DecisionVariables,
    activation: TierActivation,
}

impl<'a> CostExpressionBuilder<'a> {
    pub fn new(
        network: &'a SupplyNetwork,
        topology: &'a TopologyIndex,
        combinations: &'a Combinations,
        vars: &'a DecisionVariables,
        activation: TierActivation,
    ) -> Self {
        Self {
            network,
            topology,
            combinations,
            vars,
            activation,
        }
    }

    /// Σ `trucks[t,r]` × dayCost[t] over truck-route combinations
    pub fn truck_rental(&self) -> LinearExpr {
        let mut expr = LinearExpr::new();
        for (tr, var) in &self.vars.trucks {
            if let Some(truck) = self.network.truck(&tr.truck) {
                expr.add_term(*var, truck.day_cost);
            }
        }
        expr
    }

    /// Σ `flow[p,r]` × costPerUnit[r] over product-route combinations
    pub fn transport(&self) -> LinearExpr {
        let mut expr = LinearExpr::new();
        for (pr, var) in &self.vars.flow {
            if let Some(route) = self.network.route(&pr.route) {
                expr.add_term(*var, route.cost_per_unit);
            }
        }
        expr
    }

    /// Inbound flow of a warehouse summed over all products
    pub fn inbound(&self, warehouse: &PointId) -> LinearExpr {
        self.vars
            .total_flow(&self.network.products, self.topology.incoming(warehouse))
    }

    /// Declare the tier segments of every warehouse and return its usage cost.
    pub fn warehouse_usage<M: OptimizationModel>(
        &self,
        model: &mut M,
    ) -> Result<(BTreeMap<PointId, LinearExpr>, BTreeMap<(PointId, usize), VarId>), FormulationError>
    {
        let mut per_warehouse = BTreeMap::new();
        let mut tier_fill = BTreeMap::new();

        for (warehouse, tiers) in self.network.warehouses() {
            let curve = WarehouseCostCurve::new(tiers)?;
            let enforce = self.activation == TierActivation::EnforceOrder;
            if !curve.is_convex() && !enforce {
                return Err(FormulationError::NonConvexTiers {
                    warehouse: warehouse.clone(),
                });
            }

            let mut usage = LinearExpr::new();
            let mut fills = Vec::with_capacity(curve.segments().len());
            for segment in curve.segments() {
                let tier = segment.index.to_string();
                let name = indexed_name("tier_fill", &[warehouse.as_str(), &tier]);
                let fill = model.add_variable(
                    name,
                    VariableKind::Continuous,
                    0.0,
                    Some(segment.width()),
                )?;
                usage.add_term(fill, segment.marginal_cost);
                tier_fill.insert((warehouse.clone(), segment.index), fill);
                fills.push(fill);
            }

            let link = LinearExpr::sum_of(fills.iter().copied()) - self.inbound(warehouse);
            model.add_constraint(Constraint::new(
                indexed_name("ct_tier_link", &[warehouse.as_str()]),
                ConstraintFamily::TierLink,
                link,
                Comparison::Equal,
                0.0,
            ))?;

            if enforce {
                self.add_tier_order(model, warehouse, &curve, &fills)?;
            }

            debug!(
                warehouse = %warehouse,
                tiers = fills.len(),
                convex = curve.is_convex(),
                "linearized warehouse usage cost"
            );
            per_warehouse.insert(warehouse.clone(), usage);
        }

        Ok((per_warehouse, tier_fill))
    }

    fn add_tier_order<M: OptimizationModel>(
        &self,
        model: &mut M,
        warehouse: &PointId,
        curve: &WarehouseCostCurve,
        fills: &[VarId],
    ) -> Result<(), FormulationError> {
        let active = |tier: usize| {
            self.vars
                .tier_active_var(warehouse, tier)
                .ok_or_else(|| FormulationError::UnknownVariable {
                    context: format!("tier ordering of warehouse {}", warehouse),
                    index: tier,
                })
        };

        for (segment, fill) in curve.segments().iter().zip(fills) {
            let i = segment.index;
            let tier = i.to_string();
            let width = segment.width();

            let upper = LinearExpr::from(*fill) - LinearExpr::from(active(i)?).scaled(width);
            model.add_constraint(Constraint::new(
                indexed_name("ct_tier_order_hi", &[warehouse.as_str(), &tier]),
                ConstraintFamily::TierOrder,
                upper,
                Comparison::LessEq,
                0.0,
            ))?;

            if i + 1 < fills.len() {
                let lower =
                    LinearExpr::from(*fill) - LinearExpr::from(active(i + 1)?).scaled(width);
                model.add_constraint(Constraint::new(
                    indexed_name("ct_tier_order_lo", &[warehouse.as_str(), &tier]),
                    ConstraintFamily::TierOrder,
                    lower,
                    Comparison::GreaterEq,
                    0.0,
                ))?;
            }
        }
        Ok(())
    }

    pub fn build<M: OptimizationModel>(
        &self,
        model: &mut M,
    ) -> Result<CostExpressions, FormulationError> {
        let (per_warehouse, tier_fill) = self.warehouse_usage(model)?;
        let warehouse_usage = per_warehouse.values().cloned().sum();
        debug!(
            truck_routes = self.combinations.truck_routes.len(),
            product_routes = self.combinations.product_routes.len(),
            warehouses = per_warehouse.len(),
            "built cost expressions"
        );
        Ok(CostExpressions {
            truck_rental: self.truck_rental(),
            transport: self.transport(),
            warehouse_usage,
            per_warehouse,
            tier_fill,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ModelBuilder, ObjectiveSense};
    use crate::variables::VariableFactory;
    use depot_core::{SupplyNetworkBuilder, WarehouseTier};

    fn network(tiers: Vec<WarehouseTier>) -> SupplyNetwork {
        SupplyNetworkBuilder::new()
            .product("A")
            .factory("F", [("A", 10.0)])
            .warehouse("W", tiers)
            .store("S", [("A", 10.0)])
            .route("R1", "F", "W", 2.0)
            .route("R2", "W", "S", 3.0)
            .truck("T", 20.0, 5.0, ["R1", "R2"])
            .build()
            .unwrap()
    }

    fn build(
        network: &SupplyNetwork,
        activation: TierActivation,
    ) -> Result<(CostExpressions, crate::model::MilpModel), FormulationError> {
        let topology = TopologyIndex::build(network);
        let combos = Combinations::generate(network);
        let mut builder = ModelBuilder::new("cost");
        let vars = VariableFactory::declare(&mut builder, network, &combos, activation)?;
        let costs = CostExpressionBuilder::new(network, &topology, &combos, &vars, activation)
            .build(&mut builder)?;
        builder.set_objective(ObjectiveSense::Minimize, costs.total());
        Ok((costs, builder.build()?))
    }

    #[test]
    fn test_rental_and_transport_coefficients() {
        let net = network(vec![WarehouseTier::new(20.0, 1.0)]);
        let (costs, model) = build(&net, TierActivation::Omit).unwrap();

        let mut values = vec![0.0; model.variables().len()];
        values[model.find_variable("flow[A,R1]").unwrap().index()] = 10.0;
        values[model.find_variable("flow[A,R2]").unwrap().index()] = 10.0;
        values[model.find_variable("trucks[T,R1]").unwrap().index()] = 1.0;
        values[model.find_variable("trucks[T,R2]").unwrap().index()] = 1.0;
        values[model.find_variable("tier_fill[W,0]").unwrap().index()] = 10.0;

        assert_eq!(costs.truck_rental.evaluate(&values), 10.0);
        assert_eq!(costs.transport.evaluate(&values), 50.0);
        assert_eq!(costs.warehouse_usage.evaluate(&values), 10.0);
        assert_eq!(model.objective_value(&values), 70.0);
        assert!(model.check_assignment(&values, 1e-9).is_empty());
    }

    #[test]
    fn test_tier_fill_bounds_are_tier_widths() {
        let net = network(vec![
            WarehouseTier::new(5.0, 1.0),
            WarehouseTier::new(20.0, 3.0),
        ]);
        let (costs, model) = build(&net, TierActivation::Omit).unwrap();
        assert_eq!(costs.tier_fill.len(), 2);
        let second = model.find_variable("tier_fill[W,1]").unwrap();
        assert_eq!(model.variable(second).upper, Some(15.0));
        assert_eq!(
            model.constraints_in(ConstraintFamily::TierLink).count(),
            1
        );
        assert_eq!(model.constraints_in(ConstraintFamily::TierOrder).count(), 0);
    }

    #[test]
    fn test_usage_matches_curve_when_filled_in_order() {
        let tiers = vec![WarehouseTier::new(5.0, 1.0), WarehouseTier::new(20.0, 3.0)];
        let curve = WarehouseCostCurve::new(&tiers).unwrap();
        let net = network(tiers);
        let (costs, model) = build(&net, TierActivation::Omit).unwrap();

        let mut values = vec![0.0; model.variables().len()];
        values[model.find_variable("tier_fill[W,0]").unwrap().index()] = 5.0;
        values[model.find_variable("tier_fill[W,1]").unwrap().index()] = 7.0;
        let usage = costs.per_warehouse[&PointId::new("W")].evaluate(&values);
        assert_eq!(usage, curve.evaluate(12.0));
    }

    #[test]
    fn test_non_convex_requires_enforce_order() {
        let tiers = vec![WarehouseTier::new(5.0, 3.0), WarehouseTier::new(20.0, 1.0)];
        let net = network(tiers);
        let err = build(&net, TierActivation::Omit).unwrap_err();
        assert!(matches!(err, FormulationError::NonConvexTiers { .. }));

        let (_, model) = build(&net, TierActivation::EnforceOrder).unwrap();
        // two upper rows and one lower row for a two-tier curve
        assert_eq!(model.constraints_in(ConstraintFamily::TierOrder).count(), 3);
        assert!(model.find_variable("tier_active[W,1]").is_some());
    }

    #[test]
    fn test_declared_binaries_stay_unreferenced() {
        let net = network(vec![WarehouseTier::new(20.0, 1.0)]);
        let (_, model) = build(&net, TierActivation::Declare).unwrap();
        let binary = model.find_variable("tier_active[W,0]").unwrap();
        let referenced = model
            .constraints()
            .iter()
            .flat_map(|c| c.expr.terms())
            .chain(model.objective().terms())
            .any(|(var, _)| *var == binary);
        assert!(!referenced);
    }
}
