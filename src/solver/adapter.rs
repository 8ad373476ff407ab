/*!
Remote solving with a local fallback.

`SolverAdapter::solve` sends the topology to the configured solver and, if the
call fails for any reason (transport, timeout, HTTP status, decode, reported
failure, or a response that does not fit the topology), runs the local
`OspfEngine` instead. A remote response is validated as a whole before any of it
is used.
*/

use std::{collections::BTreeMap, time::Duration};

use tracing::{info, warn};

use crate::{
    config::SolverConfig,
    network::device::DeviceId,
    ospf::{
        engine::{OspfEngine, SimulationOutcome},
        state::RouterStates,
        step::StepLog,
    },
    solver::{
        client::{HttpSolverClient, SolverError, SolverTransport},
        protocol::{SolverRequest, SolverResponse},
    },
    topology::{snapshot::TopologySnapshot, store::TopologyStore},
};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000);

/// Where a simulation outcome came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutcomeSource {
    Remote,
    /// Produced by the local engine; `reason` is set when a remote attempt failed.
    Local { reason: Option<SolverError> },
}

#[derive(Debug, Clone)]
pub struct Solution {
    pub outcome: SimulationOutcome,
    pub source: OutcomeSource,
}

pub struct SolverAdapter {
    transport: Option<Box<dyn SolverTransport>>,
    timeout: Duration,
    step_by_step: bool,
}

impl Default for SolverAdapter {
    fn default() -> Self {
        Self::local()
    }
}

impl SolverAdapter {
    /// An adapter that always uses the local engine.
    pub fn local() -> Self {
        Self {
            transport: None,
            timeout: DEFAULT_TIMEOUT,
            step_by_step: true,
        }
    }

    pub fn new(transport: Box<dyn SolverTransport>, timeout: Duration, step_by_step: bool) -> Self {
        Self {
            transport: Some(transport),
            timeout,
            step_by_step,
        }
    }

    pub fn from_config(config: Option<&SolverConfig>) -> Self {
        match config {
            Some(solver) => Self::new(
                Box::new(HttpSolverClient::new(solver.endpoint.clone())),
                Duration::from_millis(solver.timeout_ms),
                solver.step_by_step,
            ),
            None => Self::local(),
        }
    }

    pub fn is_remote(&self) -> bool {
        self.transport.is_some()
    }

    pub async fn solve(&self, store: &TopologyStore) -> Solution {
        let Some(transport) = self.transport.as_deref() else {
            return Solution {
                outcome: OspfEngine::run(store),
                source: OutcomeSource::Local { reason: None },
            };
        };
        match self.try_remote(transport, store).await {
            Ok(outcome) => {
                info!(steps = outcome.log.len(), "using solver result");
                Solution { outcome, source: OutcomeSource::Remote }
            }
            Err(reason) => {
                warn!(%reason, "solver unavailable, falling back to local engine");
                Solution {
                    outcome: OspfEngine::run(store),
                    source: OutcomeSource::Local { reason: Some(reason) },
                }
            }
        }
    }

    async fn try_remote(
        &self,
        transport: &dyn SolverTransport,
        store: &TopologyStore,
    ) -> Result<SimulationOutcome, SolverError> {
        let request = SolverRequest {
            topology: TopologySnapshot::capture(store),
            step_by_step: self.step_by_step,
        };
        let response = tokio::time::timeout(self.timeout, transport.solve(&request))
            .await
            .map_err(|_| SolverError::Timeout(self.timeout))??;
        outcome_from_response(store, response)
    }
}

/// Checks a solver response against `store` and turns it into an outcome.
///
/// Steps are replayed over the baseline; the reported routing tables, LSDBs and
/// neighbor states then take precedence for the routers they name.
pub fn outcome_from_response(
    store: &TopologyStore,
    response: SolverResponse,
) -> Result<SimulationOutcome, SolverError> {
    if !response.success {
        return Err(SolverError::Rejected(
            response.error.unwrap_or_else(|| "unknown error".to_string()),
        ));
    }

    let baseline = RouterStates::baseline(store);
    let known = |id: &str| -> Result<(), SolverError> {
        if baseline.contains(id) {
            Ok(())
        } else {
            Err(SolverError::Invalid(format!("unknown router {id}")))
        }
    };

    let steps = response.steps.unwrap_or_default();
    for step in &steps {
        for router in step.action.routers() {
            known(router)?;
        }
    }
    for report in &response.routing_tables {
        known(&report.router)?;
    }
    for abr in &response.abrs {
        known(abr)?;
    }
    let mut areas: BTreeMap<u32, Vec<DeviceId>> = BTreeMap::new();
    for (key, routers) in response.areas {
        let area: u32 = key
            .trim()
            .parse()
            .map_err(|_| SolverError::Invalid(format!("bad area id {key:?}")))?;
        for router in &routers {
            known(router)?;
        }
        areas.insert(area, routers);
    }

    // Validated; build the outcome.
    let log = StepLog::from(steps);
    let mut states = baseline.clone();
    for step in &log {
        states.apply(step);
    }
    for report in response.routing_tables {
        let Some(state) = states.get_mut(&report.router) else {
            continue;
        };
        state.routing_table = report.routes;
        // Reports may key LSAs by originating router; re-key by LSA id.
        state.lsdb = report.lsdb.into_values().map(|lsa| (lsa.lsa_id.clone(), lsa)).collect();
        state.is_abr = report.is_abr;
        for reported in &report.neighbors {
            if let Some(neighbor) = state.neighbor_mut(&reported.peer_router_id) {
                neighbor.adjacency_state = reported.adjacency_state;
            }
        }
    }
    for abr in &response.abrs {
        if let Some(state) = states.get_mut(abr) {
            state.is_abr = true;
        }
    }
    let abrs = states
        .iter()
        .filter(|(_, s)| s.is_abr)
        .map(|(id, _)| id.clone())
        .collect();

    Ok(SimulationOutcome { log, baseline, states, abrs, areas })
}
