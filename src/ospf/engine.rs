/*!
Local OSPF engine.

Given a topology, produces the step log of one simulated OSPF run together with
the per-router state it leaves behind. Phases always run in this order:

1. `hello` for every enabled router
2. `lsa_generation` for every router with at least one adjacency
3. `lsa_flooding` rounds until no LSDB changes (bounded by the router count)
4. `neighbor_update` moving each router's adjacencies to Full
5. `dijkstra` for every router with at least one adjacency
6. `routing_update` for every enabled router

An adjacency exists over an OSPF link whose endpoints are both OSPF-enabled
routers and whose two interfaces are up. Output depends only on the store, so
two runs over the same topology produce identical logs.
*/

use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::{
    network::{
        device::DeviceId,
        link::LinkType,
        router::{AdjacencyState, Lsa, LsaLink, Route},
    },
    ospf::{
        spf::shortest_path_first,
        state::RouterStates,
        step::{NeighborTransition, Step, StepAction, StepLog},
    },
    topology::store::TopologyStore,
};

/// Everything one simulation run produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationOutcome {
    pub log: StepLog,
    /// State before the first step; replay starts here.
    pub baseline: RouterStates,
    /// State after the last step.
    pub states: RouterStates,
    pub abrs: Vec<DeviceId>,
    /// Primary area to the routers configured in it.
    pub areas: BTreeMap<u32, Vec<DeviceId>>,
}

#[derive(Debug, Clone)]
struct Adjacency {
    a: DeviceId,
    b: DeviceId,
    cost: u32,
    area: u32,
}

impl Adjacency {
    fn peer_of(&self, router: &str) -> Option<&DeviceId> {
        if self.a == router {
            Some(&self.b)
        } else if self.b == router {
            Some(&self.a)
        } else {
            None
        }
    }
}

pub struct OspfEngine<'a> {
    store: &'a TopologyStore,
    /// Enabled routers in store order.
    routers: Vec<&'a DeviceId>,
    adjacencies: Vec<Adjacency>,
    states: RouterStates,
    steps: Vec<Step>,
}

impl<'a> OspfEngine<'a> {
    /// Runs the full simulation over `store`.
    pub fn run(store: &'a TopologyStore) -> SimulationOutcome {
        let baseline = RouterStates::baseline(store);
        let mut engine = OspfEngine {
            store,
            routers: store.routers().filter(|d| d.ospf_enabled()).map(|d| &d.id).collect(),
            adjacencies: Self::discover_adjacencies(store),
            states: baseline.clone(),
            steps: Vec::new(),
        };
        debug!(routers = engine.routers.len(), adjacencies = engine.adjacencies.len(), "ospf run starting");

        engine.hello_phase();
        engine.lsa_generation_phase();
        engine.flooding_phase();
        engine.full_adjacency_phase();
        let routes = engine.spf_phase();
        engine.routing_phase(routes);

        let abrs: Vec<DeviceId> = engine
            .states
            .iter()
            .filter(|(_, state)| state.is_abr)
            .map(|(id, _)| id.clone())
            .collect();
        let mut areas: BTreeMap<u32, Vec<DeviceId>> = BTreeMap::new();
        for (id, state) in engine.states.iter().filter(|(_, s)| s.enabled) {
            areas.entry(state.area).or_default().push(id.clone());
        }

        info!(steps = engine.steps.len(), abrs = abrs.len(), areas = areas.len(), "ospf run complete");
        SimulationOutcome {
            log: StepLog::from(engine.steps),
            baseline,
            states: engine.states,
            abrs,
            areas,
        }
    }

    fn discover_adjacencies(store: &TopologyStore) -> Vec<Adjacency> {
        let participates = |device: &str, link_id: &str| {
            store.device(device).is_some_and(|d| {
                d.ospf_enabled() && d.interface_for_link(link_id).is_some_and(|i| i.is_up())
            })
        };
        store
            .links()
            .filter(|l| l.link_type == LinkType::Ospf)
            .filter(|l| participates(&l.source, &l.id) && participates(&l.target, &l.id))
            .map(|l| Adjacency {
                a: l.source.clone(),
                b: l.target.clone(),
                cost: l.cost,
                area: l.area,
            })
            .collect()
    }

    /// Adjacent routers of `router` with the cost and area of the link, in link order.
    fn peers(&self, router: &str) -> Vec<(&DeviceId, u32, u32)> {
        self.adjacencies
            .iter()
            .filter_map(|adj| adj.peer_of(router).map(|peer| (peer, adj.cost, adj.area)))
            .collect()
    }

    fn has_adjacency(&self, router: &str) -> bool {
        self.adjacencies.iter().any(|adj| adj.peer_of(router).is_some())
    }

    fn record(&mut self, step: Step) {
        self.states.apply(&step);
        self.steps.push(step);
    }

    fn hello_phase(&mut self) {
        for router in self.routers.clone() {
            let neighbors: Vec<DeviceId> = self.peers(router).into_iter().map(|(p, _, _)| p.clone()).collect();
            self.record(Step::new(
                format!("Router {router} sends Hello packets"),
                StepAction::Hello {
                    router_id: router.clone(),
                    neighbors,
                    neighbor_state: AdjacencyState::TwoWay,
                },
            ));
        }
    }

    fn lsa_generation_phase(&mut self) {
        for router in self.routers.clone() {
            if !self.has_adjacency(router) {
                continue;
            }
            let links = self
                .peers(router)
                .into_iter()
                .map(|(peer, cost, area)| LsaLink { neighbor_id: peer.clone(), cost, area })
                .collect();
            let area = self.states.get(router).map(|s| s.area).unwrap_or(0);
            let lsa = Lsa::router(router, area, links);
            self.record(Step::new(
                format!("Router {router} generates LSA"),
                StepAction::LsaGeneration { router_id: router.clone(), lsa_id: lsa.lsa_id.clone(), lsa },
            ));
        }
    }

    /// LSDB of `source` as a snapshot, and whether sending it would change `target`.
    fn flood_snapshot(&self, source: &str, target: &str) -> (Vec<Lsa>, bool) {
        let snapshot: Vec<Lsa> = self
            .states
            .get(source)
            .map(|s| s.lsdb.values().cloned().collect())
            .unwrap_or_default();
        let changes = self.states.get(target).is_some_and(|t| {
            snapshot.iter().any(|lsa| t.lsdb.get(&lsa.lsa_id) != Some(lsa))
        });
        (snapshot, changes)
    }

    fn flooding_phase(&mut self) {
        let max_rounds = self.routers.len().max(1);
        let directions: Vec<(DeviceId, DeviceId)> = self
            .adjacencies
            .iter()
            .flat_map(|adj| [(adj.a.clone(), adj.b.clone()), (adj.b.clone(), adj.a.clone())])
            .collect();

        for round in 1..=max_rounds {
            let mut emitted = 0;
            for (source, target) in &directions {
                let (snapshot, changes) = self.flood_snapshot(source, target);
                if round > 1 && !changes {
                    continue;
                }
                self.record(Step::new(
                    format!("Flooding LSA from {source} to {target}"),
                    StepAction::LsaFlooding {
                        source: source.clone(),
                        target: target.clone(),
                        lsa_snapshot: snapshot,
                    },
                ));
                if changes {
                    emitted += 1;
                }
            }
            debug!(round, changed = emitted, "flooding round");
            if emitted == 0 {
                break;
            }
        }
    }

    fn full_adjacency_phase(&mut self) {
        for router in self.routers.clone() {
            let neighbor_updates: Vec<NeighborTransition> = self
                .peers(router)
                .into_iter()
                .map(|(peer, _, _)| NeighborTransition {
                    router_id: router.clone(),
                    neighbor_id: peer.clone(),
                    new_state: AdjacencyState::Full,
                })
                .collect();
            if neighbor_updates.is_empty() {
                continue;
            }
            self.record(Step::new(
                format!("Router {router} adjacencies reach Full state"),
                StepAction::NeighborUpdate { neighbor_updates },
            ));
        }
    }

    fn spf_phase(&mut self) -> Vec<(DeviceId, Vec<Route>)> {
        let mut computed = Vec::new();
        for router in self.routers.clone() {
            if !self.has_adjacency(router) {
                continue;
            }
            let Some(state) = self.states.get(router) else {
                continue;
            };
            let result = shortest_path_first(router, state);
            self.record(Step::new(
                format!("Router {router} runs Dijkstra's algorithm"),
                StepAction::Dijkstra { router_id: router.clone(), shortest_path_edges: result.tree },
            ));
            computed.push((router.clone(), result.routes));
        }
        computed
    }

    fn routing_phase(&mut self, mut computed: Vec<(DeviceId, Vec<Route>)>) {
        for router in self.routers.clone() {
            let routes = computed
                .iter_mut()
                .find(|(id, _)| id == router)
                .map(|(_, routes)| std::mem::take(routes))
                .unwrap_or_default();
            let is_abr = self.store.ospf_link_areas(router).len() > 1;
            if is_abr {
                info!(router = %router, "area border router");
            }
            debug!(router = %router, routes = routes.len(), "routing table installed");
            self.record(Step::new(
                format!("Router {router} updates routing table"),
                StepAction::RoutingUpdate { router_id: router.clone(), routes, is_abr },
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        network::device::{DeviceType, InterfaceState, Position},
        topology::presets::Preset,
    };

    fn kinds(log: &StepLog) -> Vec<&'static str> {
        log.iter().map(|s| s.action.kind()).collect()
    }

    #[test]
    fn single_area_scenario_converges() {
        let store = Preset::SingleArea.build(0).unwrap();
        let outcome = OspfEngine::run(&store);

        for router in ["R1", "R2", "R3", "R4"] {
            let state = outcome.states.get(router).unwrap();
            assert_eq!(state.lsdb.len(), 4, "{router}");
            assert!(state.lsdb.values().all(|lsa| !lsa.links.is_empty()));
            assert_eq!(state.routing_table.len(), 3, "{router}");
            assert!(state.neighbors.iter().all(|n| n.adjacency_state == AdjacencyState::Full));
            assert!(!state.is_abr);
        }
        let r1 = outcome.states.get("R1").unwrap();
        let r3 = r1.routing_table.iter().find(|r| r.destination == "R3").unwrap();
        assert_eq!((r3.cost, r3.next_hop.as_deref()), (30, Some("R2")));
        assert!(outcome.abrs.is_empty());
        assert_eq!(outcome.areas[&0], vec!["R1", "R2", "R3", "R4"]);
    }

    #[test]
    fn phases_appear_in_fixed_order() {
        let store = Preset::SingleArea.build(0).unwrap();
        let outcome = OspfEngine::run(&store);
        let order = ["hello", "lsa_generation", "lsa_flooding", "neighbor_update", "dijkstra", "routing_update"];
        let rank = |k: &str| order.iter().position(|o| *o == k).unwrap();
        let ranks: Vec<usize> = kinds(&outcome.log).into_iter().map(rank).collect();
        assert!(ranks.windows(2).all(|w| w[0] <= w[1]));

        assert_eq!(outcome.log.count_kind("hello"), 4);
        assert_eq!(outcome.log.count_kind("lsa_generation"), 4);
        // First round covers both directions of all five router links.
        assert!(outcome.log.count_kind("lsa_flooding") >= 10);
        assert_eq!(outcome.log.count_kind("dijkstra"), 4);
        assert_eq!(outcome.log.count_kind("routing_update"), 4);
    }

    #[test]
    fn runs_are_deterministic() {
        let store = Preset::Complex.build(0).unwrap();
        assert_eq!(OspfEngine::run(&store), OspfEngine::run(&store));
    }

    #[test]
    fn replaying_log_reproduces_final_state() {
        let store = Preset::MultiArea.build(0).unwrap();
        let outcome = OspfEngine::run(&store);
        let mut replay = outcome.baseline.clone();
        for step in &outcome.log {
            replay.apply(step);
        }
        assert_eq!(replay, outcome.states);
    }

    #[test]
    fn abrs_span_multiple_areas() {
        let store = Preset::MultiArea.build(0).unwrap();
        let outcome = OspfEngine::run(&store);
        assert_eq!(outcome.abrs, vec!["ABR1", "ABR2", "ABR3"]);
        assert_eq!(outcome.areas.keys().copied().collect::<Vec<_>>(), vec![0, 1, 2, 3]);

        // R1-A1 reaches the backbone and the other areas through its ABR.
        let r1 = outcome.states.get("R1-A1").unwrap();
        let to_abr1 = r1.routing_table.iter().find(|r| r.destination == "ABR1").unwrap();
        assert_eq!(to_abr1.route_type, crate::network::router::RouteType::InterArea);
        let to_r2 = r1.routing_table.iter().find(|r| r.destination == "R2-A1").unwrap();
        assert_eq!((to_r2.cost, to_r2.next_hop.as_deref()), (10, Some("R2-A1")));
        assert_eq!(r1.routing_table.len(), 8);
    }

    #[test]
    fn isolated_router_keeps_empty_table() {
        let mut store = Preset::SingleArea.build(0).unwrap();
        store.add_device_with_id("R9", DeviceType::Router, Position::default()).unwrap();
        let outcome = OspfEngine::run(&store);
        let r9 = outcome.states.get("R9").unwrap();
        assert!(r9.routing_table.is_empty());
        assert!(r9.lsdb.is_empty());
        assert!(outcome.log.iter().all(|s| match &s.action {
            StepAction::LsaFlooding { source, target, .. } => source != "R9" && target != "R9",
            StepAction::Dijkstra { router_id, .. } | StepAction::LsaGeneration { router_id, .. } => router_id != "R9",
            _ => true,
        }));
        assert_eq!(outcome.log.count_kind("hello"), 5);
    }

    #[test]
    fn down_interfaces_and_disabled_routers_form_no_adjacency() {
        let mut store = Preset::SingleArea.build(0).unwrap();
        // R3's links: R2-R3 then R3-R4. Take R2-R3 down on R3's side.
        let iface = store
            .device("R3")
            .and_then(|d| d.interfaces.iter().find(|i| i.peer_device_id == "R2"))
            .map(|i| i.id.clone())
            .unwrap();
        store.set_interface_state("R3", &iface, InterfaceState::Down).unwrap();
        store.configure_ospf("R4", 0, false).unwrap();

        let outcome = OspfEngine::run(&store);
        let r3 = outcome.states.get("R3").unwrap();
        assert!(r3.routing_table.is_empty());
        assert_eq!(r3.neighbor("R2").unwrap().adjacency_state, AdjacencyState::Init);
        let r1 = outcome.states.get("R1").unwrap();
        assert_eq!(r1.routing_table.len(), 1);
        assert_eq!(outcome.log.count_kind("hello"), 3);
    }
}
