//! Schema and configuration checks for a network description.
//!
//! Validation runs in phases and collects every issue before deciding:
//!
//! 1. **Products**: no duplicates
//! 2. **References**: route endpoints and truck routes must exist
//! 3. **Quantities**: every factory/store lists every product, with finite
//!    non-negative values
//! 4. **Tiers**: every warehouse defines a valid cost curve
//! 5. **Topology** (warnings only): unserviceable routes, odd directions,
//!    stores no factory can reach
//!
//! Any schema error makes the whole description invalid; configuration
//! errors (tier lists) are reported as such when no schema error exists.

use std::collections::{BTreeMap, HashSet};

use tracing::warn;

use crate::diagnostics::{Diagnostics, IssueCategory};
use crate::graph_utils::unreachable_stores;
use crate::tiers::WarehouseCostCurve;
use crate::{DepotError, DepotResult, PointKind, PointRole, ProductId, SupplyNetwork};

/// Validate a network, returning warnings or the first fatal category.
pub fn validate_network(network: &SupplyNetwork) -> DepotResult<Diagnostics> {
    let diag = collect_issues(network);

    if diag.has_errors() {
        let schema: Vec<String> = diag
            .in_category(IssueCategory::Schema)
            .map(|i| i.to_string())
            .collect();
        if !schema.is_empty() {
            return Err(DepotError::Schema(schema.join("; ")));
        }
        let config: Vec<String> = diag.errors().map(|i| i.to_string()).collect();
        return Err(DepotError::Config(config.join("; ")));
    }

    for issue in diag.warnings() {
        warn!("{}", issue);
    }
    Ok(diag)
}

/// Run every validation phase without failing, for reporting.
pub fn collect_issues(network: &SupplyNetwork) -> Diagnostics {
    let mut diag = Diagnostics::new();

    validate_products(network, &mut diag);
    validate_references(network, &mut diag);
    validate_quantities(network, &mut diag);
    validate_tiers(network, &mut diag);

    // Topology checks assume references resolve.
    if !diag.has_errors() {
        validate_topology(network, &mut diag);
    }

    diag
}

fn validate_products(network: &SupplyNetwork, diag: &mut Diagnostics) {
    let mut seen = HashSet::new();
    for product in &network.products {
        if !seen.insert(product) {
            diag.error(
                IssueCategory::Schema,
                "product is declared twice",
                &format!("product {}", product),
            );
        }
    }
}

fn validate_references(network: &SupplyNetwork, diag: &mut Diagnostics) {
    for route in network.routes.values() {
        let entity = format!("route {}", route.id);
        for (end, point) in [("starts", &route.start), ("ends", &route.end)] {
            if !network.points.contains_key(point) {
                diag.error(
                    IssueCategory::Schema,
                    &format!("{} at unknown point '{}'", end, point),
                    &entity,
                );
            }
        }
        if !route.cost_per_unit.is_finite() || route.cost_per_unit < 0.0 {
            diag.error(
                IssueCategory::Schema,
                &format!("invalid costPerUnit {}", route.cost_per_unit),
                &entity,
            );
        }
    }

    for truck in network.trucks.values() {
        let entity = format!("truck {}", truck.id);
        if !truck.capacity.is_finite() || truck.capacity <= 0.0 {
            diag.error(
                IssueCategory::Schema,
                &format!("capacity must be positive, got {}", truck.capacity),
                &entity,
            );
        }
        if !truck.day_cost.is_finite() || truck.day_cost < 0.0 {
            diag.error(
                IssueCategory::Schema,
                &format!("invalid dayCost {}", truck.day_cost),
                &entity,
            );
        }
        for route in &truck.possible_routes {
            if !network.routes.contains_key(route) {
                diag.error(
                    IssueCategory::Schema,
                    &format!("references unknown route '{}'", route),
                    &entity,
                );
            }
        }
    }
}

fn validate_quantities(network: &SupplyNetwork, diag: &mut Diagnostics) {
    for point in network.points.values() {
        let (label, quantities) = match &point.kind {
            PointKind::Factory { product_outputs } => ("productOutputs", product_outputs),
            PointKind::Store { product_inputs } => ("productInputs", product_inputs),
            PointKind::Warehouse { .. } => continue,
        };
        let entity = format!("{} {}", point.role(), point.id);
        check_quantity_table(network, label, quantities, &entity, diag);
    }
}

fn check_quantity_table(
    network: &SupplyNetwork,
    label: &str,
    quantities: &BTreeMap<ProductId, f64>,
    entity: &str,
    diag: &mut Diagnostics,
) {
    for product in &network.products {
        if !quantities.contains_key(product) {
            diag.error(
                IssueCategory::Schema,
                &format!("{} has no entry for product '{}'", label, product),
                entity,
            );
        }
    }
    for (product, quantity) in quantities {
        if !network.products.contains(product) {
            diag.error(
                IssueCategory::Schema,
                &format!("{} lists undeclared product '{}'", label, product),
                entity,
            );
        }
        if !quantity.is_finite() || *quantity < 0.0 {
            diag.error(
                IssueCategory::Schema,
                &format!("{} for '{}' is invalid: {}", label, product, quantity),
                entity,
            );
        }
    }
}

fn validate_tiers(network: &SupplyNetwork, diag: &mut Diagnostics) {
    for (id, tiers) in network.warehouses() {
        if let Err(err) = WarehouseCostCurve::new(tiers) {
            let message = match err {
                DepotError::Config(msg) => msg,
                other => other.to_string(),
            };
            diag.error(IssueCategory::Config, &message, &format!("warehouse {}", id));
        }
    }
}

fn validate_topology(network: &SupplyNetwork, diag: &mut Diagnostics) {
    for route in network.routes.values() {
        let entity = format!("route {}", route.id);
        if !network.trucks.values().any(|t| t.can_service(&route.id)) {
            diag.warning(
                IssueCategory::Topology,
                "no truck type may service this route; its flow is forced to zero",
                &entity,
            );
        }
        if route.start == route.end {
            diag.warning(IssueCategory::Topology, "route is a self-loop", &entity);
        }
        let role = |id| network.point(id).map(|p| p.role());
        if role(&route.start) == Some(PointRole::Store) {
            diag.warning(IssueCategory::Topology, "route starts at a store", &entity);
        }
        if role(&route.end) == Some(PointRole::Factory) {
            diag.warning(IssueCategory::Topology, "route ends at a factory", &entity);
        }
    }

    for store in unreachable_stores(network) {
        diag.warning(
            IssueCategory::Topology,
            "store has demand but no factory can reach it; the model will be infeasible",
            &format!("store {}", store),
        );
    }
}
