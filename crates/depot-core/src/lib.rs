//! # depot-core: Supply Network Description
//!
//! Typed, read-only view over a multi-tier distribution network:
//! factories produce products, warehouses pass them through subject to a
//! tiered usage cost, and stores consume them. Points are connected by
//! directed routes serviced by truck types.
//!
//! ```text
//!   Factory ──route──▶ Warehouse ──route──▶ Store
//!      │                                      ▲
//!      └───────────────route──────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use depot_core::SupplyNetworkBuilder;
//!
//! let network = SupplyNetworkBuilder::new()
//!     .product("A")
//!     .factory("F1", [("A", 10.0)])
//!     .store("S1", [("A", 10.0)])
//!     .route("R1", "F1", "S1", 2.0)
//!     .truck("T1", 20.0, 5.0, ["R1"])
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(network.stats().routes, 1);
//! ```
//!
//! ## ID System
//!
//! Every entity is keyed by a string-backed newtype ([`ProductId`],
//! [`PointId`], [`RouteId`], [`TruckTypeId`]) so identifiers from
//! different namespaces cannot be confused, even when their text is equal.
//!
//! ## Modules
//!
//! - [`diagnostics`] - warning/error collection during validation
//! - [`graph_utils`] - reachability analysis over the route graph
//! - [`tiers`] - warehouse tiers and the piecewise usage cost curve
//! - [`validation`] - schema and configuration checks

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

pub mod diagnostics;
pub mod error;
pub mod graph_utils;
pub mod tiers;
pub mod validation;

pub use diagnostics::{DiagnosticIssue, Diagnostics, IssueCategory, Severity};
pub use error::{DepotError, DepotResult};
pub use tiers::{WarehouseCostCurve, WarehouseTier};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            #[inline]
            pub fn new(value: impl Into<String>) -> Self {
                $name(value.into())
            }
            #[inline]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                $name(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                $name(value)
            }
        }
    };
}

string_id!(
    /// Identifier of a product
    ProductId
);
string_id!(
    /// Identifier of a factory, warehouse or store
    PointId
);
string_id!(
    /// Identifier of a directed route
    RouteId
);
string_id!(
    /// Identifier of a truck type
    TruckTypeId
);

/// Role a point plays in the network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointRole {
    Factory,
    Warehouse,
    Store,
}

impl fmt::Display for PointRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PointRole::Factory => write!(f, "factory"),
            PointRole::Warehouse => write!(f, "warehouse"),
            PointRole::Store => write!(f, "store"),
        }
    }
}

/// Role-specific attributes of a point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PointKind {
    /// Maximum quantity of each product the factory can ship
    Factory {
        product_outputs: BTreeMap<ProductId, f64>,
    },
    /// Ordered capacity tiers defining the usage cost
    Warehouse { tiers: Vec<WarehouseTier> },
    /// Minimum quantity of each product the store must receive
    Store {
        product_inputs: BTreeMap<ProductId, f64>,
    },
}

/// A factory, warehouse or store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub id: PointId,
    pub kind: PointKind,
}

impl Point {
    pub fn role(&self) -> PointRole {
        match self.kind {
            PointKind::Factory { .. } => PointRole::Factory,
            PointKind::Warehouse { .. } => PointRole::Warehouse,
            PointKind::Store { .. } => PointRole::Store,
        }
    }
}

/// Directed edge between two points
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub id: RouteId,
    pub start: PointId,
    pub end: PointId,
    /// Transport cost per unit of any product
    pub cost_per_unit: f64,
}

/// A kind of truck that can be dispatched on its eligible routes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TruckType {
    pub id: TruckTypeId,
    /// Units of product a single truck carries
    pub capacity: f64,
    /// Rental cost of one truck for the planning day
    pub day_cost: f64,
    pub possible_routes: BTreeSet<RouteId>,
}

impl TruckType {
    pub fn can_service(&self, route: &RouteId) -> bool {
        self.possible_routes.contains(route)
    }
}

/// Counts of the main entities in a network
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NetworkStats {
    pub products: usize,
    pub factories: usize,
    pub warehouses: usize,
    pub stores: usize,
    pub routes: usize,
    pub truck_types: usize,
    /// Number of (truck type, route) eligibility pairs
    pub truck_route_pairs: usize,
}

/// The complete, read-only network description consumed by formulation.
///
/// Maps are ordered so every pass over the network (and therefore every
/// model built from it) is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SupplyNetwork {
    pub products: Vec<ProductId>,
    pub points: BTreeMap<PointId, Point>,
    pub trucks: BTreeMap<TruckTypeId, TruckType>,
    pub routes: BTreeMap<RouteId, Route>,
}

impl SupplyNetwork {
    /// Assemble a network from its parts and validate it.
    ///
    /// Duplicate identifiers within one namespace are a schema violation:
    /// silently keeping one of them would change the model.
    pub fn from_parts(
        products: Vec<ProductId>,
        points: Vec<Point>,
        trucks: Vec<TruckType>,
        routes: Vec<Route>,
    ) -> DepotResult<(Self, Diagnostics)> {
        let mut network = SupplyNetwork {
            products,
            ..SupplyNetwork::default()
        };

        for point in points {
            if let Some(existing) = network.points.get(&point.id) {
                return Err(DepotError::Schema(format!(
                    "point '{}' is declared as both {} and {}",
                    point.id,
                    existing.role(),
                    point.role()
                )));
            }
            network.points.insert(point.id.clone(), point);
        }
        for truck in trucks {
            if network.trucks.contains_key(&truck.id) {
                return Err(DepotError::Schema(format!(
                    "truck type '{}' is declared twice",
                    truck.id
                )));
            }
            network.trucks.insert(truck.id.clone(), truck);
        }
        for route in routes {
            if network.routes.contains_key(&route.id) {
                return Err(DepotError::Schema(format!(
                    "route '{}' is declared twice",
                    route.id
                )));
            }
            network.routes.insert(route.id.clone(), route);
        }

        let diagnostics = network.validate()?;
        Ok((network, diagnostics))
    }

    /// Run schema and configuration checks, returning non-fatal findings.
    pub fn validate(&self) -> DepotResult<Diagnostics> {
        validation::validate_network(self)
    }

    pub fn point(&self, id: &PointId) -> Option<&Point> {
        self.points.get(id)
    }

    pub fn route(&self, id: &RouteId) -> Option<&Route> {
        self.routes.get(id)
    }

    pub fn truck(&self, id: &TruckTypeId) -> Option<&TruckType> {
        self.trucks.get(id)
    }

    /// Factories with their per-product outputs
    pub fn factories(&self) -> impl Iterator<Item = (&PointId, &BTreeMap<ProductId, f64>)> {
        self.points.values().filter_map(|p| match &p.kind {
            PointKind::Factory { product_outputs } => Some((&p.id, product_outputs)),
            _ => None,
        })
    }

    /// Warehouses with their ordered tiers
    pub fn warehouses(&self) -> impl Iterator<Item = (&PointId, &[WarehouseTier])> {
        self.points.values().filter_map(|p| match &p.kind {
            PointKind::Warehouse { tiers } => Some((&p.id, tiers.as_slice())),
            _ => None,
        })
    }

    /// Stores with their per-product demands
    pub fn stores(&self) -> impl Iterator<Item = (&PointId, &BTreeMap<ProductId, f64>)> {
        self.points.values().filter_map(|p| match &p.kind {
            PointKind::Store { product_inputs } => Some((&p.id, product_inputs)),
            _ => None,
        })
    }

    pub fn stats(&self) -> NetworkStats {
        NetworkStats {
            products: self.products.len(),
            factories: self.factories().count(),
            warehouses: self.warehouses().count(),
            stores: self.stores().count(),
            routes: self.routes.len(),
            truck_types: self.trucks.len(),
            truck_route_pairs: self
                .trucks
                .values()
                .map(|t| t.possible_routes.len())
                .sum(),
        }
    }
}

/// Builder for constructing networks in code (tests, generators).
#[derive(Debug, Default)]
pub struct SupplyNetworkBuilder {
    products: Vec<ProductId>,
    points: Vec<Point>,
    trucks: Vec<TruckType>,
    routes: Vec<Route>,
}

impl SupplyNetworkBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn product(mut self, id: impl Into<ProductId>) -> Self {
        self.products.push(id.into());
        self
    }

    pub fn factory<P, I>(mut self, id: impl Into<PointId>, outputs: I) -> Self
    where
        P: Into<ProductId>,
        I: IntoIterator<Item = (P, f64)>,
    {
        let product_outputs = outputs.into_iter().map(|(p, q)| (p.into(), q)).collect();
        self.points.push(Point {
            id: id.into(),
            kind: PointKind::Factory { product_outputs },
        });
        self
    }

    pub fn warehouse(mut self, id: impl Into<PointId>, tiers: Vec<WarehouseTier>) -> Self {
        self.points.push(Point {
            id: id.into(),
            kind: PointKind::Warehouse { tiers },
        });
        self
    }

    pub fn store<P, I>(mut self, id: impl Into<PointId>, inputs: I) -> Self
    where
        P: Into<ProductId>,
        I: IntoIterator<Item = (P, f64)>,
    {
        let product_inputs = inputs.into_iter().map(|(p, q)| (p.into(), q)).collect();
        self.points.push(Point {
            id: id.into(),
            kind: PointKind::Store { product_inputs },
        });
        self
    }

    pub fn route(
        mut self,
        id: impl Into<RouteId>,
        start: impl Into<PointId>,
        end: impl Into<PointId>,
        cost_per_unit: f64,
    ) -> Self {
        self.routes.push(Route {
            id: id.into(),
            start: start.into(),
            end: end.into(),
            cost_per_unit,
        });
        self
    }

    pub fn truck<R, I>(
        mut self,
        id: impl Into<TruckTypeId>,
        capacity: f64,
        day_cost: f64,
        possible_routes: I,
    ) -> Self
    where
        R: Into<RouteId>,
        I: IntoIterator<Item = R>,
    {
        self.trucks.push(TruckType {
            id: id.into(),
            capacity,
            day_cost,
            possible_routes: possible_routes.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Validate and build, discarding warnings.
    pub fn build(self) -> DepotResult<SupplyNetwork> {
        self.build_with_diagnostics().map(|(network, _)| network)
    }

    pub fn build_with_diagnostics(self) -> DepotResult<(SupplyNetwork, Diagnostics)> {
        SupplyNetwork::from_parts(self.products, self.points, self.trucks, self.routes)
    }
}
