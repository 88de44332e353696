use crate::{PointId, RouteId, SupplyNetwork};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Bfs;
use std::collections::{BTreeSet, HashMap};

/// Directed graph of points connected by routes, with a lookup from point
/// identifier to node index.
#[derive(Debug)]
pub struct RouteGraph {
    pub graph: DiGraph<PointId, RouteId>,
    pub nodes: HashMap<PointId, NodeIndex>,
}

/// Builds the route graph.
///
/// With `serviceable_only`, routes no truck type may drive are left out,
/// since no flow can ever use them. Routes whose endpoints are unknown are
/// skipped; validation reports those separately.
pub fn route_graph(network: &SupplyNetwork, serviceable_only: bool) -> RouteGraph {
    let mut graph = DiGraph::with_capacity(network.points.len(), network.routes.len());
    let mut nodes = HashMap::with_capacity(network.points.len());
    for id in network.points.keys() {
        nodes.insert(id.clone(), graph.add_node(id.clone()));
    }

    for route in network.routes.values() {
        if serviceable_only && !network.trucks.values().any(|t| t.can_service(&route.id)) {
            continue;
        }
        if let (Some(&from), Some(&to)) = (nodes.get(&route.start), nodes.get(&route.end)) {
            graph.add_edge(from, to, route.id.clone());
        }
    }

    RouteGraph { graph, nodes }
}

/// Points reachable from at least one factory over serviceable routes.
pub fn reachable_from_factories(network: &SupplyNetwork) -> BTreeSet<PointId> {
    let RouteGraph { graph, nodes } = route_graph(network, true);
    let mut reached = BTreeSet::new();

    for (factory, _) in network.factories() {
        let Some(&start) = nodes.get(factory) else {
            continue;
        };
        let mut bfs = Bfs::new(&graph, start);
        while let Some(node) = bfs.next(&graph) {
            reached.insert(graph[node].clone());
        }
    }

    reached
}

/// Stores with positive demand that no factory can supply.
///
/// Any such store makes the distribution model infeasible.
pub fn unreachable_stores(network: &SupplyNetwork) -> Vec<PointId> {
    let reached = reachable_from_factories(network);
    network
        .stores()
        .filter(|(id, inputs)| !reached.contains(*id) && inputs.values().any(|q| *q > 0.0))
        .map(|(id, _)| id.clone())
        .collect()
}
