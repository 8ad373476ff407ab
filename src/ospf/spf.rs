/*!
Shortest Path First over a router's own LSDB.

The graph is built only from what the router has learned: one node per LSA
originator (the computing router first), one directed edge per advertised link.
*/

use std::collections::HashMap;

use petgraph::graph::{DiGraph, NodeIndex};

use crate::network::{
    path::dijkstra,
    router::{OspfState, Route, RouteType, SpfTreeEdge},
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpfResult {
    /// Parent-to-child edges, in the order their child nodes were settled.
    pub tree: Vec<SpfTreeEdge>,
    pub routes: Vec<Route>,
}

/// Runs SPF rooted at `root` over `state.lsdb`.
pub fn shortest_path_first(root: &str, state: &OspfState) -> SpfResult {
    let mut graph: DiGraph<&str, u32> = DiGraph::new();
    let mut index: HashMap<&str, NodeIndex> = HashMap::new();

    let root_idx = graph.add_node(root);
    index.insert(root, root_idx);
    for lsa in state.lsdb.values() {
        let id = lsa.originator.as_str();
        if !index.contains_key(id) {
            index.insert(id, graph.add_node(id));
        }
    }
    for lsa in state.lsdb.values() {
        for link in &lsa.links {
            let id = link.neighbor_id.as_str();
            if !index.contains_key(id) {
                index.insert(id, graph.add_node(id));
            }
        }
    }
    for lsa in state.lsdb.values() {
        let from = index[lsa.originator.as_str()];
        for link in &lsa.links {
            let to = index[link.neighbor_id.as_str()];
            graph.add_edge(from, to, link.cost.max(1));
        }
    }

    let spt = dijkstra(&graph, root_idx, None);
    let area_of = |router: &str| {
        state
            .lsdb
            .values()
            .find(|lsa| lsa.originator == router)
            .map(|lsa| lsa.area)
            .unwrap_or(state.area)
    };

    let mut result = SpfResult::default();
    for &node in spt.settled().iter().filter(|&&n| n != root_idx) {
        let (Some(parent), Some(cost)) = (spt.parent(node), spt.distance(node)) else {
            continue;
        };
        let parent_cost = spt.distance(parent).unwrap_or(0);
        let destination = graph[node];
        result.tree.push(SpfTreeEdge {
            from: graph[parent].to_string(),
            to: destination.to_string(),
            cost: u32::try_from(cost - parent_cost).unwrap_or(u32::MAX),
        });

        let path: Vec<String> = spt.path_to(node).into_iter().map(|n| graph[n].to_string()).collect();
        let route_type = if area_of(destination) == state.area {
            RouteType::IntraArea
        } else {
            RouteType::InterArea
        };
        result.routes.push(Route {
            destination: destination.to_string(),
            next_hop: path.get(1).cloned(),
            cost,
            route_type,
            path,
        });
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::router::{Lsa, LsaLink};

    fn link(neighbor: &str, cost: u32) -> LsaLink {
        LsaLink { neighbor_id: neighbor.into(), cost, area: 0 }
    }

    fn square() -> OspfState {
        let mut state = OspfState::new(0);
        for lsa in [
            Lsa::router("R1", 0, vec![link("R2", 10), link("R4", 30)]),
            Lsa::router("R2", 0, vec![link("R1", 10), link("R3", 20), link("R4", 15)]),
            Lsa::router("R3", 0, vec![link("R2", 20), link("R4", 10)]),
            Lsa::router("R4", 1, vec![link("R3", 10), link("R1", 30), link("R2", 15)]),
        ] {
            state.install_lsa(&lsa);
        }
        state
    }

    #[test]
    fn routes_to_every_other_router() {
        let result = shortest_path_first("R1", &square());
        let r3 = result.routes.iter().find(|r| r.destination == "R3").unwrap();
        assert_eq!(r3.cost, 30);
        assert_eq!(r3.next_hop.as_deref(), Some("R2"));
        assert_eq!(r3.path, vec!["R1", "R2", "R3"]);
        assert_eq!(result.routes.len(), 3);
        assert!(result.routes.iter().all(|r| r.destination != "R1"));
    }

    #[test]
    fn tree_edges_follow_settle_order() {
        let result = shortest_path_first("R1", &square());
        let edges: Vec<_> = result.tree.iter().map(|e| (e.from.as_str(), e.to.as_str(), e.cost)).collect();
        assert_eq!(edges, vec![("R1", "R2", 10), ("R2", "R4", 15), ("R2", "R3", 20)]);
    }

    #[test]
    fn foreign_area_destination_is_inter_area() {
        let result = shortest_path_first("R1", &square());
        let r4 = result.routes.iter().find(|r| r.destination == "R4").unwrap();
        assert_eq!(r4.route_type, RouteType::InterArea);
        assert_eq!(r4.cost, 25);
        let r2 = result.routes.iter().find(|r| r.destination == "R2").unwrap();
        assert_eq!(r2.route_type, RouteType::IntraArea);
    }

    #[test]
    fn empty_lsdb_yields_nothing() {
        let result = shortest_path_first("R1", &OspfState::new(0));
        assert!(result.routes.is_empty());
        assert!(result.tree.is_empty());
    }
}
