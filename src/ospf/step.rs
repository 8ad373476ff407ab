/*!
Step log model.

A `Step` is one discrete protocol action with a human-readable description and a
payload specific to its kind. On the wire a step is a flat object tagged by
`"type"`, e.g. `{"type": "hello", "description": "...", "router_id": "R1", ...}`.

LSA payloads are also accepted keyed by originating router: `lsdb` on
`lsa_generation` and `lsdb_update` on `lsa_flooding`, as the solver sends them.
*/

use std::{fmt::Display, ops::Index};

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

use crate::network::{
    device::DeviceId,
    router::{AdjacencyState, Lsa, Route, SpfTreeEdge},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NeighborTransition {
    pub router_id: DeviceId,
    pub neighbor_id: DeviceId,
    pub new_state: AdjacencyState,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StepAction {
    Hello {
        router_id: DeviceId,
        neighbors: Vec<DeviceId>,
        neighbor_state: AdjacencyState,
    },
    LsaGeneration {
        router_id: DeviceId,
        lsa_id: String,
        #[serde(alias = "lsdb", deserialize_with = "single_lsa")]
        lsa: Lsa,
    },
    /// `lsa_snapshot` is the source's whole LSDB at send time.
    LsaFlooding {
        source: DeviceId,
        target: DeviceId,
        #[serde(alias = "lsdb_update", deserialize_with = "lsa_set")]
        lsa_snapshot: Vec<Lsa>,
    },
    NeighborUpdate {
        neighbor_updates: Vec<NeighborTransition>,
    },
    Dijkstra {
        router_id: DeviceId,
        shortest_path_edges: Vec<SpfTreeEdge>,
    },
    RoutingUpdate {
        router_id: DeviceId,
        routes: Vec<Route>,
        #[serde(default)]
        is_abr: bool,
    },
}

/// An LSA on its own, or LSAs keyed by originating router.
#[derive(Deserialize)]
#[serde(untagged)]
enum LsaPayload {
    One(Lsa),
    List(Vec<Lsa>),
    ByRouter(IndexMap<DeviceId, Lsa>),
}

impl LsaPayload {
    fn into_vec(self) -> Vec<Lsa> {
        match self {
            LsaPayload::One(lsa) => vec![lsa],
            LsaPayload::List(lsas) => lsas,
            LsaPayload::ByRouter(map) => map.into_values().collect(),
        }
    }
}

fn single_lsa<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Lsa, D::Error> {
    LsaPayload::deserialize(deserializer)?
        .into_vec()
        .into_iter()
        .next()
        .ok_or_else(|| <D::Error as serde::de::Error>::custom("expected one LSA, found none"))
}

fn lsa_set<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Lsa>, D::Error> {
    Ok(LsaPayload::deserialize(deserializer)?.into_vec())
}

impl StepAction {
    pub fn kind(&self) -> &'static str {
        match self {
            StepAction::Hello { .. } => "hello",
            StepAction::LsaGeneration { .. } => "lsa_generation",
            StepAction::LsaFlooding { .. } => "lsa_flooding",
            StepAction::NeighborUpdate { .. } => "neighbor_update",
            StepAction::Dijkstra { .. } => "dijkstra",
            StepAction::RoutingUpdate { .. } => "routing_update",
        }
    }

    /// Every router id the step refers to.
    pub fn routers(&self) -> Vec<&DeviceId> {
        match self {
            StepAction::Hello { router_id, neighbors, .. } => {
                std::iter::once(router_id).chain(neighbors).collect()
            }
            StepAction::LsaGeneration { router_id, .. }
            | StepAction::Dijkstra { router_id, .. }
            | StepAction::RoutingUpdate { router_id, .. } => vec![router_id],
            StepAction::LsaFlooding { source, target, .. } => vec![source, target],
            StepAction::NeighborUpdate { neighbor_updates } => neighbor_updates
                .iter()
                .flat_map(|u| [&u.router_id, &u.neighbor_id])
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub description: String,
    #[serde(flatten)]
    pub action: StepAction,
}

impl Step {
    pub fn new(description: impl Into<String>, action: StepAction) -> Self {
        Self { description: description.into(), action }
    }
}

impl Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.action.kind(), self.description)
    }
}

/// Ordered, immutable record of one simulation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StepLog(Vec<Step>);

impl StepLog {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Step> {
        self.0.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Step> {
        self.0.iter()
    }

    /// Number of steps of the given kind.
    pub fn count_kind(&self, kind: &str) -> usize {
        self.0.iter().filter(|s| s.action.kind() == kind).count()
    }
}

impl From<Vec<Step>> for StepLog {
    fn from(steps: Vec<Step>) -> Self {
        StepLog(steps)
    }
}

impl Index<usize> for StepLog {
    type Output = Step;

    fn index(&self, index: usize) -> &Step {
        &self.0[index]
    }
}

impl<'a> IntoIterator for &'a StepLog {
    type Item = &'a Step;
    type IntoIter = std::slice::Iter<'a, Step>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
