/*!
Simulation session.

A `Simulator` owns one topology, the latest step log with its player, and the
solver adapter. It exposes the command surface a front end drives:
`run_simulation`, `step_once`, `reset_steps`, `shortest_path`, `routing_table`,
`neighbors` and `lsdb`, plus guarded topology mutation.

Topology changes are refused while a log is being played back (cursor past 0),
since the log no longer describes the topology. A log that has not been stepped
yet is discarded once a change actually lands; rejected or no-op changes keep it.
*/

use std::{collections::BTreeMap, path::Path};

use thiserror::Error;
use tracing::{debug, info};

use crate::{
    config::SimulatorConfig,
    network::{
        device::{Device, DeviceId, DeviceType, InterfaceState, Position},
        link::{Link, LinkType, LinkUpdate},
        path::{Path as NetworkPath, PathFinder},
        router::{Lsdb, Neighbor, Route},
    },
    ospf::{
        engine::OspfEngine,
        player::{Advance, PlaybackError, StepPlayer},
        step::{Step, StepLog},
    },
    solver::adapter::{OutcomeSource, Solution, SolverAdapter},
    topology::{
        events::TopologyEvent,
        presets::Preset,
        snapshot::{SnapshotError, TopologySnapshot},
        store::{TopologyError, TopologyStore},
    },
};

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error(transparent)]
    Topology(#[from] TopologyError),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
    #[error(transparent)]
    Playback(#[from] PlaybackError),
    #[error("Step playback in progress (step {index} of {len}); reset steps or re-run the simulation first")]
    InvalidTopologyMutation { index: usize, len: usize },
    #[error("No OSPF steps available. Run OSPF simulation first.")]
    NoSimulation,
}

/// Summary of the latest run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub steps: usize,
    pub abrs: Vec<DeviceId>,
    pub areas: BTreeMap<u32, Vec<DeviceId>>,
    pub source: OutcomeSource,
}

/// Result of `Simulator::step_once`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Applied { index: usize, total: usize, step: Step },
    /// The log was exhausted; the next step starts over.
    Completed { total: usize },
}

pub struct Simulator {
    store: TopologyStore,
    solver: SolverAdapter,
    player: Option<StepPlayer>,
    last_run: Option<RunSummary>,
    mac_seed: u64,
}

impl Simulator {
    pub fn new(store: TopologyStore, solver: SolverAdapter) -> Self {
        Self {
            store,
            solver,
            player: None,
            last_run: None,
            mac_seed: 0,
        }
    }

    /// An empty topology with the solver and MAC seed from `config`.
    pub fn from_config(config: &SimulatorConfig) -> Self {
        Self {
            mac_seed: config.mac_seed,
            ..Self::new(
                TopologyStore::with_mac_seed(config.mac_seed),
                SolverAdapter::from_config(config.solver.as_ref()),
            )
        }
    }

    pub fn store(&self) -> &TopologyStore {
        &self.store
    }

    pub fn steps(&self) -> Option<&StepLog> {
        self.player.as_ref().map(|p| p.log())
    }

    pub fn player(&self) -> Option<&StepPlayer> {
        self.player.as_ref()
    }

    pub fn last_run(&self) -> Option<&RunSummary> {
        self.last_run.as_ref()
    }

    pub fn drain_events(&mut self) -> Vec<TopologyEvent> {
        self.store.drain_events()
    }

    /* ---------------------- Simulation ---------------------- */

    /// Runs OSPF through the solver adapter (remote, or local on any failure),
    /// installs the final state and rewinds playback to the start of the new log.
    pub async fn run_simulation(&mut self) -> &RunSummary {
        let solution = self.solver.solve(&self.store).await;
        self.install(solution)
    }

    /// Runs the local engine only.
    pub fn run_local(&mut self) -> &RunSummary {
        let solution = Solution {
            outcome: OspfEngine::run(&self.store),
            source: OutcomeSource::Local { reason: None },
        };
        self.install(solution)
    }

    fn install(&mut self, solution: Solution) -> &RunSummary {
        let Solution { outcome, source } = solution;
        outcome.states.install_into(&mut self.store);
        info!(steps = outcome.log.len(), abrs = outcome.abrs.len(), "simulation installed");
        let summary = RunSummary {
            steps: outcome.log.len(),
            abrs: outcome.abrs,
            areas: outcome.areas,
            source,
        };
        self.player = Some(StepPlayer::new(outcome.log, outcome.baseline));
        self.last_run.insert(summary)
    }

    /// Applies the next step and makes the store reflect the replayed state.
    pub fn step_once(&mut self) -> Result<StepOutcome, SimulationError> {
        let player = self.player.as_mut().ok_or(SimulationError::NoSimulation)?;
        let total = player.len();
        match player.advance()? {
            Advance::Applied(index) => {
                player.state().install_into(&mut self.store);
                let step = player.log()[index].clone();
                Ok(StepOutcome::Applied { index, total, step })
            }
            Advance::Completed => Ok(StepOutcome::Completed { total }),
        }
    }

    /// Replays the log from the start through `index`.
    pub fn jump_to(&mut self, index: usize) -> Result<(), SimulationError> {
        let player = self.player.as_mut().ok_or(SimulationError::NoSimulation)?;
        player.jump_to(index)?.install_into(&mut self.store);
        Ok(())
    }

    /// Discards the step log. Router state is left as it is.
    pub fn reset_steps(&mut self) {
        if self.player.take().is_some() {
            info!("ospf steps reset");
        }
    }

    /* ---------------------- Queries ---------------------- */

    pub fn shortest_path(&self, source: &str, destination: &str) -> Result<Vec<DeviceId>, SimulationError> {
        Ok(PathFinder::new(&self.store).shortest_path(source, destination)?)
    }

    /// Path with its cost, or `None` when the devices are not connected.
    pub fn ping(&self, source: &str, destination: &str) -> Result<Option<NetworkPath>, SimulationError> {
        Ok(PathFinder::new(&self.store).route(source, destination)?)
    }

    pub fn routing_table(&self, router: &str) -> Result<&[Route], SimulationError> {
        Ok(&self.store.ospf_state(router)?.routing_table)
    }

    pub fn neighbors(&self, router: &str) -> Result<&[Neighbor], SimulationError> {
        Ok(&self.store.ospf_state(router)?.neighbors)
    }

    pub fn lsdb(&self, router: &str) -> Result<&Lsdb, SimulationError> {
        Ok(&self.store.ospf_state(router)?.lsdb)
    }

    /* ---------------------- Topology mutation ---------------------- */

    fn ensure_not_playing(&self) -> Result<(), SimulationError> {
        match &self.player {
            Some(player) if player.is_started() => Err(SimulationError::InvalidTopologyMutation {
                index: player.index(),
                len: player.len(),
            }),
            _ => Ok(()),
        }
    }

    /// Takes `player` by field so callers can still hold a borrow of the store.
    fn discard_unplayed(player: &mut Option<StepPlayer>) {
        if player.take().is_some() {
            debug!("topology changed, discarding unplayed step log");
        }
    }

    pub fn add_device(&mut self, device_type: DeviceType, position: Position) -> Result<&Device, SimulationError> {
        self.ensure_not_playing()?;
        let device = self.store.add_device(device_type, position);
        Self::discard_unplayed(&mut self.player);
        Ok(device)
    }

    pub fn add_device_with_id(
        &mut self,
        id: &str,
        device_type: DeviceType,
        position: Position,
    ) -> Result<&Device, SimulationError> {
        self.ensure_not_playing()?;
        let device = self.store.add_device_with_id(id, device_type, position)?;
        Self::discard_unplayed(&mut self.player);
        Ok(device)
    }

    pub fn remove_device(&mut self, id: &str) -> Result<Option<Device>, SimulationError> {
        self.ensure_not_playing()?;
        let removed = self.store.remove_device(id);
        if removed.is_some() {
            Self::discard_unplayed(&mut self.player);
        }
        Ok(removed)
    }

    pub fn add_link(
        &mut self,
        a: &str,
        b: &str,
        link_type: LinkType,
        cost: Option<u32>,
        area: Option<u32>,
    ) -> Result<&Link, SimulationError> {
        self.ensure_not_playing()?;
        let link = self.store.add_link(a, b, link_type, cost, area)?;
        Self::discard_unplayed(&mut self.player);
        Ok(link)
    }

    pub fn remove_link(&mut self, id: &str) -> Result<Option<Link>, SimulationError> {
        self.ensure_not_playing()?;
        let removed = self.store.remove_link(id);
        if removed.is_some() {
            Self::discard_unplayed(&mut self.player);
        }
        Ok(removed)
    }

    pub fn update_link(&mut self, id: &str, update: LinkUpdate) -> Result<&Link, SimulationError> {
        self.ensure_not_playing()?;
        let link = self.store.update_link(id, update)?;
        Self::discard_unplayed(&mut self.player);
        Ok(link)
    }

    pub fn configure_ospf(&mut self, router: &str, area: u32, enabled: bool) -> Result<(), SimulationError> {
        self.ensure_not_playing()?;
        self.store.configure_ospf(router, area, enabled)?;
        Self::discard_unplayed(&mut self.player);
        Ok(())
    }

    pub fn set_interface_state(
        &mut self,
        device: &str,
        interface: &str,
        state: InterfaceState,
    ) -> Result<(), SimulationError> {
        self.ensure_not_playing()?;
        self.store.set_interface_state(device, interface, state)?;
        Self::discard_unplayed(&mut self.player);
        Ok(())
    }

    /// Replaces the whole topology.
    pub fn replace_topology(&mut self, store: TopologyStore) -> Result<(), SimulationError> {
        self.ensure_not_playing()?;
        self.store = store;
        self.last_run = None;
        Self::discard_unplayed(&mut self.player);
        Ok(())
    }

    pub fn load_preset(&mut self, preset: Preset) -> Result<(), SimulationError> {
        let store = preset.build(self.mac_seed)?;
        self.replace_topology(store)
    }

    /* ---------------------- Persistence ---------------------- */

    pub fn save_topology(&self, path: impl AsRef<Path>) -> Result<(), SimulationError> {
        Ok(TopologySnapshot::capture(&self.store).save(path)?)
    }

    pub fn load_topology(&mut self, path: impl AsRef<Path>) -> Result<(), SimulationError> {
        let store = TopologySnapshot::load(path)?.into_store(self.mac_seed)?;
        self.replace_topology(store)
    }
}
