/*!
Per-router OSPF state as the step log sees it.

`RouterStates::apply` is the only place a step mutates router state. The engine
calls it while producing the log and the step player calls it while replaying,
so a replayed prefix always reproduces exactly what the engine had at that point.
*/

use indexmap::IndexMap;

use crate::{
    network::{device::DeviceId, router::OspfState},
    ospf::step::{Step, StepAction},
    topology::store::TopologyStore,
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouterStates(IndexMap<DeviceId, OspfState>);

impl RouterStates {
    /// Every router's state with derived data cleared: configuration kept,
    /// neighbors back to Init, empty LSDB and routing table.
    pub fn baseline(store: &TopologyStore) -> Self {
        RouterStates(
            store
                .routers()
                .filter_map(|device| {
                    let mut state = device.ospf.clone()?;
                    state.reset_runtime();
                    Some((device.id.clone(), state))
                })
                .collect(),
        )
    }

    pub fn get(&self, router: &str) -> Option<&OspfState> {
        self.0.get(router)
    }

    pub(crate) fn get_mut(&mut self, router: &str) -> Option<&mut OspfState> {
        self.0.get_mut(router)
    }

    pub fn contains(&self, router: &str) -> bool {
        self.0.contains_key(router)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&DeviceId, &OspfState)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Applies the mutation a step describes. Steps naming routers that are not
    /// tracked, or neighbors a router does not have, leave that part untouched.
    pub fn apply(&mut self, step: &Step) {
        match &step.action {
            StepAction::Hello { router_id, neighbors, neighbor_state } => {
                if let Some(state) = self.0.get_mut(router_id) {
                    for peer in neighbors {
                        if let Some(neighbor) = state.neighbor_mut(peer) {
                            neighbor.advance_to(*neighbor_state);
                        }
                    }
                }
            }
            StepAction::LsaGeneration { router_id, lsa, .. } => {
                if let Some(state) = self.0.get_mut(router_id) {
                    state.install_lsa(lsa);
                }
            }
            StepAction::LsaFlooding { target, lsa_snapshot, .. } => {
                if let Some(state) = self.0.get_mut(target) {
                    for lsa in lsa_snapshot {
                        state.install_lsa(lsa);
                    }
                }
            }
            StepAction::NeighborUpdate { neighbor_updates } => {
                for update in neighbor_updates {
                    if let Some(neighbor) = self
                        .0
                        .get_mut(&update.router_id)
                        .and_then(|s| s.neighbor_mut(&update.neighbor_id))
                    {
                        neighbor.advance_to(update.new_state);
                    }
                }
            }
            StepAction::Dijkstra { router_id, shortest_path_edges } => {
                if let Some(state) = self.0.get_mut(router_id) {
                    state.spf_tree = shortest_path_edges.clone();
                }
            }
            StepAction::RoutingUpdate { router_id, routes, is_abr } => {
                if let Some(state) = self.0.get_mut(router_id) {
                    state.routing_table = routes.clone();
                    state.is_abr = *is_abr;
                }
            }
        }
    }

    /// Writes every tracked router's state into the store.
    pub fn install_into(&self, store: &mut TopologyStore) {
        for (id, state) in &self.0 {
            store.install_ospf_state(id, state.clone());
        }
    }
}

impl FromIterator<(DeviceId, OspfState)> for RouterStates {
    fn from_iter<T: IntoIterator<Item = (DeviceId, OspfState)>>(iter: T) -> Self {
        RouterStates(iter.into_iter().collect())
    }
}
