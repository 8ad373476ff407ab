use std::fmt::Display;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::network::device::DeviceId;

/// Adjacency progression. The engine only ever moves forward through
/// Init, 2-Way and Full; ordering is used to keep transitions monotonic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum AdjacencyState {
    Down,
    #[default]
    Init,
    #[serde(rename = "2-Way")]
    TwoWay,
    Full,
}

impl Display for AdjacencyState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AdjacencyState::Down => "Down",
            AdjacencyState::Init => "Init",
            AdjacencyState::TwoWay => "2-Way",
            AdjacencyState::Full => "Full",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Neighbor {
    #[serde(rename = "routerId")]
    pub peer_router_id: DeviceId,
    #[serde(rename = "state")]
    pub adjacency_state: AdjacencyState,
    #[serde(default)]
    pub area: u32,
    #[serde(rename = "interface")]
    pub local_interface_id: String,
}

impl Neighbor {
    pub fn new(peer_router_id: DeviceId, area: u32, local_interface_id: String) -> Self {
        Self {
            peer_router_id,
            adjacency_state: AdjacencyState::Init,
            area,
            local_interface_id,
        }
    }

    /// Moves the adjacency forward to `state`; never regresses.
    pub fn advance_to(&mut self, state: AdjacencyState) -> bool {
        if state > self.adjacency_state {
            self.adjacency_state = state;
            true
        } else {
            false
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LsaType {
    #[default]
    Router,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LsaLink {
    #[serde(rename = "neighbor")]
    pub neighbor_id: DeviceId,
    pub cost: u32,
    #[serde(default)]
    pub area: u32,
}

/// Router-LSA summarizing the originator's adjacencies at generation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lsa {
    #[serde(rename = "id")]
    pub lsa_id: String,
    #[serde(rename = "router_id")]
    pub originator: DeviceId,
    #[serde(rename = "type", default)]
    pub lsa_type: LsaType,
    /// Primary area of the originator.
    #[serde(default)]
    pub area: u32,
    #[serde(default)]
    pub links: Vec<LsaLink>,
}

impl Lsa {
    pub fn id_for(originator: &str) -> String {
        format!("LSA-{originator}")
    }

    pub fn router(originator: &str, area: u32, links: Vec<LsaLink>) -> Self {
        Self {
            lsa_id: Self::id_for(originator),
            originator: originator.to_string(),
            lsa_type: LsaType::Router,
            area,
            links,
        }
    }
}

pub type Lsdb = IndexMap<String, Lsa>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RouteType {
    #[default]
    IntraArea,
    InterArea,
}

impl RouteType {
    /// Code used by `show ip route`.
    pub fn code(&self) -> &'static str {
        match self {
            RouteType::IntraArea => "O",
            RouteType::InterArea => "O IA",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub destination: DeviceId,
    pub next_hop: Option<DeviceId>,
    pub cost: u64,
    #[serde(rename = "type", default)]
    pub route_type: RouteType,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<DeviceId>,
}

impl Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} [{}] via {}",
            self.route_type.code(),
            self.destination,
            self.cost,
            self.next_hop.as_deref().unwrap_or("direct")
        )
    }
}

/// One edge of a shortest-path tree, parent to child.
///
/// Also read from a bare `[from, to]` pair, with cost 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "SpfTreeEdgeRepr")]
pub struct SpfTreeEdge {
    pub from: DeviceId,
    pub to: DeviceId,
    pub cost: u32,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SpfTreeEdgeRepr {
    Edge {
        from: DeviceId,
        to: DeviceId,
        #[serde(default)]
        cost: u32,
    },
    Pair(DeviceId, DeviceId),
}

impl From<SpfTreeEdgeRepr> for SpfTreeEdge {
    fn from(repr: SpfTreeEdgeRepr) -> Self {
        match repr {
            SpfTreeEdgeRepr::Edge { from, to, cost } => SpfTreeEdge { from, to, cost },
            SpfTreeEdgeRepr::Pair(from, to) => SpfTreeEdge { from, to, cost: 0 },
        }
    }
}

/// Per-router OSPF state. Present only on routers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OspfState {
    pub enabled: bool,
    pub area: u32,
    #[serde(default)]
    pub neighbors: Vec<Neighbor>,
    #[serde(default)]
    pub lsdb: Lsdb,
    #[serde(rename = "routingTable", default)]
    pub routing_table: Vec<Route>,
    #[serde(rename = "isAbr", default)]
    pub is_abr: bool,
    #[serde(rename = "spfTree", default, skip_serializing_if = "Vec::is_empty")]
    pub spf_tree: Vec<SpfTreeEdge>,
}

impl Default for OspfState {
    fn default() -> Self {
        Self::new(0)
    }
}

impl OspfState {
    pub fn new(area: u32) -> Self {
        Self {
            enabled: true,
            area,
            neighbors: Vec::new(),
            lsdb: Lsdb::new(),
            routing_table: Vec::new(),
            is_abr: false,
            spf_tree: Vec::new(),
        }
    }

    pub fn neighbor(&self, peer: &str) -> Option<&Neighbor> {
        self.neighbors.iter().find(|n| n.peer_router_id == peer)
    }

    pub fn neighbor_mut(&mut self, peer: &str) -> Option<&mut Neighbor> {
        self.neighbors.iter_mut().find(|n| n.peer_router_id == peer)
    }

    pub fn remove_neighbor(&mut self, peer: &str) {
        self.neighbors.retain(|n| n.peer_router_id != peer);
    }

    /// Drops everything the OSPF engine derives, keeping configuration and
    /// the neighbor list (returned to Init).
    pub fn reset_runtime(&mut self) {
        for neighbor in &mut self.neighbors {
            neighbor.adjacency_state = AdjacencyState::Init;
        }
        self.lsdb.clear();
        self.routing_table.clear();
        self.is_abr = false;
        self.spf_tree.clear();
    }

    /// Installs `lsa`, replacing an older generation from the same originator.
    /// Returns whether the database changed.
    pub fn install_lsa(&mut self, lsa: &Lsa) -> bool {
        match self.lsdb.get(&lsa.lsa_id) {
            Some(existing) if existing == lsa => false,
            _ => {
                self.lsdb.insert(lsa.lsa_id.clone(), lsa.clone());
                true
            }
        }
    }
}

impl Display for OspfState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "enabled={} area={}", self.enabled, self.area)?;
        if self.is_abr {
            write!(f, " ABR")?;
        }
        write!(
            f,
            " neighbors=[{}] lsdb={} routes={}",
            self.neighbors
                .iter()
                .map(|n| format!("{}:{}", n.peer_router_id, n.adjacency_state))
                .collect::<Vec<_>>()
                .join(", "),
            self.lsdb.len(),
            self.routing_table.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adjacency_never_regresses() {
        let mut n = Neighbor::new("R2".into(), 0, "eth0".into());
        assert!(n.advance_to(AdjacencyState::Full));
        assert!(!n.advance_to(AdjacencyState::TwoWay));
        assert_eq!(n.adjacency_state, AdjacencyState::Full);
    }

    #[test]
    fn newer_lsa_replaces_older_generation() {
        let mut state = OspfState::new(0);
        let first = Lsa::router("R1", 0, vec![LsaLink { neighbor_id: "R2".into(), cost: 10, area: 0 }]);
        assert!(state.install_lsa(&first));
        assert!(!state.install_lsa(&first));

        let second = Lsa::router("R1", 0, vec![]);
        assert!(state.install_lsa(&second));
        assert_eq!(state.lsdb.len(), 1);
        assert!(state.lsdb["LSA-R1"].links.is_empty());
    }

    #[test]
    fn adjacency_state_uses_wire_names() {
        assert_eq!(serde_json::to_string(&AdjacencyState::TwoWay).unwrap(), "\"2-Way\"");
        let route = Route {
            destination: "R3".into(),
            next_hop: None,
            cost: 0,
            route_type: RouteType::InterArea,
            path: vec![],
        };
        assert_eq!(route.to_string(), "O IA R3 [0] via direct");
        let json = serde_json::to_value(&route).unwrap();
        assert_eq!(json["type"], "inter-area");
    }

    #[test]
    fn spf_edges_read_objects_and_pairs() {
        let edges: Vec<SpfTreeEdge> =
            serde_json::from_str(r#"[{"from": "R1", "to": "R2", "cost": 10}, ["R2", "R3"]]"#).unwrap();
        assert_eq!(edges[0].cost, 10);
        assert_eq!((edges[1].from.as_str(), edges[1].to.as_str(), edges[1].cost), ("R2", "R3", 0));
        assert!(serde_json::from_str::<SpfTreeEdge>(r#"["R1"]"#).is_err());
    }

    #[test]
    fn reset_runtime_keeps_configuration() {
        let mut state = OspfState::new(2);
        state.neighbors.push(Neighbor::new("R2".into(), 2, "eth0".into()));
        state.neighbors[0].advance_to(AdjacencyState::Full);
        state.install_lsa(&Lsa::router("R1", 2, vec![]));
        state.is_abr = true;
        state.reset_runtime();
        assert_eq!(state.area, 2);
        assert_eq!(state.neighbors[0].adjacency_state, AdjacencyState::Init);
        assert!(state.lsdb.is_empty());
        assert!(!state.is_abr);
    }
}
