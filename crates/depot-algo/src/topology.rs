//! Per-point incoming/outgoing route lookup.

use std::collections::HashMap;

use depot_core::{PointId, RouteId, SupplyNetwork};

/// Routes ending at ("in") and starting from ("out") every point.
///
/// Built in one pass over the route set. Route order within each list
/// follows the network's route ordering.
#[derive(Debug, Clone, Default)]
pub struct TopologyIndex {
    incoming: HashMap<PointId, Vec<RouteId>>,
    outgoing: HashMap<PointId, Vec<RouteId>>,
}

impl TopologyIndex {
    pub fn build(network: &SupplyNetwork) -> Self {
        let mut index = Self {
            incoming: HashMap::with_capacity(network.points.len()),
            outgoing: HashMap::with_capacity(network.points.len()),
        };
        for route in network.routes.values() {
            index
                .outgoing
                .entry(route.start.clone())
                .or_default()
                .push(route.id.clone());
            index
                .incoming
                .entry(route.end.clone())
                .or_default()
                .push(route.id.clone());
        }
        index
    }

    /// Routes whose end is `point`. Empty for points with none.
    pub fn incoming(&self, point: &PointId) -> &[RouteId] {
        self.incoming.get(point).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Routes whose start is `point`. Empty for points with none.
    pub fn outgoing(&self, point: &PointId) -> &[RouteId] {
        self.outgoing.get(point).map(Vec::as_slice).unwrap_or(&[])
    }
}
