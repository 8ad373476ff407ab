/*!
Shortest-path search over the link graph.

This module defines:
- `dijkstra`: single-source Dijkstra over any petgraph `Graph` with `u32` weights,
  shared by the path finder and the per-router SPF computation.
- `PathFinder`: the device-level path finder used for reachability testing (ping).

Tie-breaking is part of the contract: among equally distant candidates the node
inserted first is settled first, and a node keeps the first predecessor that
reached it at its final distance. Neighbors are relaxed in edge insertion order.
*/

use std::{cmp::Reverse, collections::{BinaryHeap, HashMap}};

use petgraph::{
    EdgeType,
    graph::{Graph, NodeIndex, UnGraph},
    visit::EdgeRef,
};
use tracing::debug;

use crate::{
    network::device::DeviceId,
    topology::store::{TopologyError, TopologyStore},
};

/// Result of a single-source Dijkstra run.
#[derive(Debug, Clone)]
pub(crate) struct ShortestPathTree {
    source: NodeIndex,
    dist: Vec<Option<u64>>,
    prev: Vec<Option<NodeIndex>>,
    settled: Vec<NodeIndex>,
}

impl ShortestPathTree {
    pub fn distance(&self, node: NodeIndex) -> Option<u64> {
        self.dist.get(node.index()).copied().flatten()
    }

    pub fn parent(&self, node: NodeIndex) -> Option<NodeIndex> {
        self.prev.get(node.index()).copied().flatten()
    }

    /// Nodes in the order they were settled (non-decreasing distance).
    pub fn settled(&self) -> &[NodeIndex] {
        &self.settled
    }

    /// Node sequence from the source to `target`, or empty if `target` was not reached.
    pub fn path_to(&self, target: NodeIndex) -> Vec<NodeIndex> {
        if self.distance(target).is_none() {
            return Vec::new();
        }
        let mut path = vec![target];
        let mut current = target;
        while current != self.source {
            match self.parent(current) {
                Some(parent) => {
                    path.push(parent);
                    current = parent;
                }
                None => return Vec::new(),
            }
        }
        path.reverse();
        path
    }
}

/// Runs Dijkstra from `source`, stopping early once `target` (if any) is settled.
pub(crate) fn dijkstra<N, Ty: EdgeType>(
    graph: &Graph<N, u32, Ty>,
    source: NodeIndex,
    target: Option<NodeIndex>,
) -> ShortestPathTree {
    let n = graph.node_count();
    let mut dist: Vec<Option<u64>> = vec![None; n];
    let mut prev: Vec<Option<NodeIndex>> = vec![None; n];
    let mut done = vec![false; n];
    let mut settled = Vec::with_capacity(n);

    let mut heap = BinaryHeap::new();
    dist[source.index()] = Some(0);
    heap.push(Reverse((0u64, source.index())));

    while let Some(Reverse((d, idx))) = heap.pop() {
        if done[idx] {
            continue;
        }
        done[idx] = true;
        let node = NodeIndex::new(idx);
        settled.push(node);
        if Some(node) == target {
            break;
        }

        let mut edges: Vec<_> = graph.edges(node).collect();
        edges.sort_by_key(|e| e.id().index());
        for edge in edges {
            let next = if edge.source() == node { edge.target() } else { edge.source() };
            if done[next.index()] {
                continue;
            }
            let candidate = d + u64::from(*edge.weight());
            if dist[next.index()].is_none_or(|current| candidate < current) {
                dist[next.index()] = Some(candidate);
                prev[next.index()] = Some(node);
                heap.push(Reverse((candidate, next.index())));
            }
        }
    }

    ShortestPathTree { source, dist, prev, settled }
}

/// A resolved path with its total cost.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path {
    pub hops: Vec<DeviceId>,
    pub cost: u64,
}

impl Path {
    pub fn hop_count(&self) -> usize {
        self.hops.len().saturating_sub(1)
    }
}

/// Device-level path finder over every link in a store, regardless of link type.
pub struct PathFinder<'a> {
    graph: UnGraph<&'a str, u32>,
    index: HashMap<&'a str, NodeIndex>,
}

impl<'a> PathFinder<'a> {
    pub fn new(store: &'a TopologyStore) -> Self {
        let mut graph = UnGraph::with_capacity(store.device_count(), store.link_count());
        let mut index = HashMap::with_capacity(store.device_count());
        for device in store.devices() {
            let node = graph.add_node(device.id.as_str());
            index.insert(device.id.as_str(), node);
        }
        for link in store.links() {
            if let (Some(&a), Some(&b)) = (index.get(link.source.as_str()), index.get(link.target.as_str())) {
                graph.add_edge(a, b, link.cost.max(1));
            }
        }
        Self { graph, index }
    }

    fn node(&self, id: &str) -> Result<NodeIndex, TopologyError> {
        self.index
            .get(id)
            .copied()
            .ok_or_else(|| TopologyError::UnknownDevice(id.to_string()))
    }

    /// Minimum-cost path from `source` to `destination`, or `None` when unreachable.
    pub fn route(&self, source: &str, destination: &str) -> Result<Option<Path>, TopologyError> {
        let from = self.node(source)?;
        let to = self.node(destination)?;

        let tree = dijkstra(&self.graph, from, Some(to));
        let Some(cost) = tree.distance(to) else {
            debug!(source, destination, "no path");
            return Ok(None);
        };
        let hops = tree
            .path_to(to)
            .into_iter()
            .map(|n| self.graph[n].to_string())
            .collect();
        Ok(Some(Path { hops, cost }))
    }

    /// Ordered device ids from `source` to `destination`; empty if unreachable.
    pub fn shortest_path(&self, source: &str, destination: &str) -> Result<Vec<DeviceId>, TopologyError> {
        Ok(self.route(source, destination)?.map(|p| p.hops).unwrap_or_default())
    }

    /// Sum of link costs along `hops`, or `None` if consecutive hops are not linked.
    pub fn path_cost(&self, hops: &[DeviceId]) -> Option<u64> {
        hops.windows(2).try_fold(0u64, |acc, pair| {
            let a = *self.index.get(pair[0].as_str())?;
            let b = *self.index.get(pair[1].as_str())?;
            let edge = self.graph.find_edge(a, b)?;
            Some(acc + u64::from(self.graph[edge]))
        })
    }
}
