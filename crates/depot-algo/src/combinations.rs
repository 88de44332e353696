//! Product-route and truck-route combinations.
//!
//! Combinations are typed pairs of identifiers rather than concatenated
//! strings, so `("A1", "R")` and `("A", "1R")` stay distinct.

use std::collections::{BTreeMap, BTreeSet};

use depot_core::{ProductId, RouteId, SupplyNetwork, TruckTypeId};
use serde::Serialize;

/// A truck type dispatched on a route it may service
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct TruckRoute {
    pub truck: TruckTypeId,
    pub route: RouteId,
}

/// A product moving along a route
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ProductRoute {
    pub product: ProductId,
    pub route: RouteId,
}

#[derive(Debug, Clone, Default)]
pub struct Combinations {
    /// `(t, r)` for every route `r` in truck type `t`'s eligible set
    pub truck_routes: BTreeSet<TruckRoute>,
    /// `(p, r)` for every product and every route
    pub product_routes: BTreeSet<ProductRoute>,
    by_route: BTreeMap<RouteId, Vec<TruckRoute>>,
}

impl Combinations {
    pub fn generate(network: &SupplyNetwork) -> Self {
        let truck_routes: BTreeSet<TruckRoute> = network
            .trucks
            .values()
            .flat_map(|truck| {
                truck.possible_routes.iter().map(move |route| TruckRoute {
                    truck: truck.id.clone(),
                    route: route.clone(),
                })
            })
            .collect();

        let product_routes = network
            .products
            .iter()
            .flat_map(|product| {
                network.routes.keys().map(move |route| ProductRoute {
                    product: product.clone(),
                    route: route.clone(),
                })
            })
            .collect();

        let mut by_route: BTreeMap<RouteId, Vec<TruckRoute>> = BTreeMap::new();
        for tr in &truck_routes {
            by_route.entry(tr.route.clone()).or_default().push(tr.clone());
        }

        Self {
            truck_routes,
            product_routes,
            by_route,
        }
    }

    /// Truck types eligible on `route`, ordered by truck id
    pub fn trucks_on(&self, route: &RouteId) -> &[TruckRoute] {
        self.by_route.get(route).map(Vec::as_slice).unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use depot_core::SupplyNetworkBuilder;

    fn network() -> SupplyNetwork {
        SupplyNetworkBuilder::new()
            .product("A")
            .product("B")
            .factory("F", [("A", 5.0), ("B", 5.0)])
            .store("S", [("A", 1.0), ("B", 1.0)])
            .route("R1", "F", "S", 1.0)
            .route("R2", "F", "S", 2.0)
            .truck("T1", 10.0, 1.0, ["R1"])
            .truck("T2", 20.0, 3.0, ["R1", "R2"])
            .build()
            .unwrap()
    }

    #[test]
    fn test_truck_routes_follow_eligibility() {
        let combos = Combinations::generate(&network());
        let pairs: Vec<(&str, &str)> = combos
            .truck_routes
            .iter()
            .map(|tr| (tr.truck.as_str(), tr.route.as_str()))
            .collect();
        assert_eq!(pairs, vec![("T1", "R1"), ("T2", "R1"), ("T2", "R2")]);

        let on_r2: Vec<&str> = combos
            .trucks_on(&RouteId::new("R2"))
            .iter()
            .map(|tr| tr.truck.as_str())
            .collect();
        assert_eq!(on_r2, vec!["T2"]);
        assert_eq!(combos.trucks_on(&RouteId::new("R1")).len(), 2);
        assert!(combos.trucks_on(&RouteId::new("R9")).is_empty());
    }

    #[test]
    fn test_every_product_on_every_route() {
        let combos = Combinations::generate(&network());
        assert_eq!(combos.product_routes.len(), 4);
        assert!(combos.product_routes.contains(&ProductRoute {
            product: ProductId::new("B"),
            route: RouteId::new("R2"),
        }));
    }

    #[test]
    fn test_prefix_sharing_ids_do_not_collide() {
        let a = ProductRoute {
            product: ProductId::new("A1"),
            route: RouteId::new("R"),
        };
        let b = ProductRoute {
            product: ProductId::new("A"),
            route: RouteId::new("1R"),
        };
        let set: BTreeSet<_> = [a, b].into_iter().collect();
        assert_eq!(set.len(), 2);
    }
}
