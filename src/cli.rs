/*!
Router-style command line over a `Simulator`.

`Command::parse` turns one input line into a command; `execute` runs it and
returns the lines to print. Router and device ids are case-sensitive, keywords
are not.
*/

use std::{collections::BTreeMap, path::PathBuf};

use thiserror::Error;

use crate::{
    network::{device::DeviceId, link::LinkType},
    simulation::{SimulationError, Simulator, StepOutcome},
    solver::adapter::OutcomeSource,
};

pub const HELP: &[&str] = &[
    "Available commands:",
    "  show ip route <router>          - Show routing table",
    "  show ip ospf neighbor <router>  - Show OSPF neighbors",
    "  show ip ospf database <router>  - Show OSPF link-state database",
    "  show ip ospf interface <router> - Show OSPF interfaces",
    "  show topology                   - Show topology summary",
    "  show steps                      - Show OSPF steps",
    "  ping <source> <destination>     - Trace the best path between two devices",
    "  ospf simulate                   - Run OSPF simulation",
    "  ospf step | step                - Advance OSPF step",
    "  ospf reset                      - Reset OSPF simulation",
    "  save <file>                     - Save topology to a JSON file",
    "  help                            - Show this help",
    "  exit                            - Leave the CLI",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    ShowRoute(DeviceId),
    ShowNeighbors(DeviceId),
    ShowDatabase(DeviceId),
    ShowInterfaces(DeviceId),
    ShowTopology,
    ShowSteps,
    Ping { source: DeviceId, destination: DeviceId },
    Simulate,
    Step,
    Reset,
    Save(PathBuf),
    Help,
    Exit,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("Unknown command: {0}. Type 'help' for available commands.")]
    Unknown(String),
    #[error("Usage: {0}")]
    Usage(&'static str),
}

const SHOW_USAGE: &str =
    "show [ip route | ip ospf neighbor | ip ospf database | ip ospf interface] <router> | show [topology | steps]";

impl Command {
    /// Parses one line. Empty lines yield `Ok(None)`.
    pub fn parse(line: &str) -> Result<Option<Command>, CommandError> {
        let words: Vec<&str> = line.split_whitespace().collect();
        let Some((first, rest)) = words.split_first() else {
            return Ok(None);
        };
        let keyword = first.to_ascii_lowercase();
        let lowered: Vec<String> = rest.iter().map(|w| w.to_ascii_lowercase()).collect();
        let lowered: Vec<&str> = lowered.iter().map(String::as_str).collect();

        let command = match (keyword.as_str(), lowered.as_slice()) {
            ("show", ["topology"]) => Command::ShowTopology,
            ("show", ["steps"]) => Command::ShowSteps,
            ("show", ["ip", "route", _]) => Command::ShowRoute(rest[2].to_string()),
            ("show", ["ip", "ospf", "neighbor", _]) => Command::ShowNeighbors(rest[3].to_string()),
            ("show", ["ip", "ospf", "database", _]) => Command::ShowDatabase(rest[3].to_string()),
            ("show", ["ip", "ospf", "interface", _]) => Command::ShowInterfaces(rest[3].to_string()),
            ("show", _) => return Err(CommandError::Usage(SHOW_USAGE)),
            ("ping", [_, _]) => Command::Ping {
                source: rest[0].to_string(),
                destination: rest[1].to_string(),
            },
            ("ping", _) => return Err(CommandError::Usage("ping <source> <destination>")),
            ("ospf", ["simulate"]) => Command::Simulate,
            ("ospf", ["step"]) => Command::Step,
            ("ospf", ["reset"]) => Command::Reset,
            ("ospf", ["steps"]) => Command::ShowSteps,
            ("ospf", _) => return Err(CommandError::Usage("ospf [simulate | step | reset | steps]")),
            ("step", []) => Command::Step,
            ("save", [_]) => Command::Save(PathBuf::from(rest[0])),
            ("save", _) => return Err(CommandError::Usage("save <file>")),
            ("help", _) => Command::Help,
            ("exit" | "quit", _) => Command::Exit,
            _ => return Err(CommandError::Unknown(keyword)),
        };
        Ok(Some(command))
    }
}

/// Runs `command` against `sim`, returning the output lines.
pub async fn execute(sim: &mut Simulator, command: &Command) -> Result<Vec<String>, SimulationError> {
    let mut out = Vec::new();
    match command {
        Command::ShowRoute(router) => {
            let routes = sim.routing_table(router)?;
            out.push(format!("Routing Table for {router}:"));
            if routes.is_empty() {
                out.push("  No routes in routing table".to_string());
            }
            out.extend(routes.iter().map(|r| format!("  {r}")));
        }
        Command::ShowNeighbors(router) => {
            let neighbors = sim.neighbors(router)?;
            out.push(format!("OSPF Neighbors for {router}:"));
            if neighbors.is_empty() {
                out.push("  No OSPF neighbors".to_string());
            }
            out.extend(neighbors.iter().map(|n| {
                format!("  {} - State: {}, Area: {}", n.peer_router_id, n.adjacency_state, n.area)
            }));
        }
        Command::ShowDatabase(router) => {
            let lsdb = sim.lsdb(router)?;
            out.push(format!("LSDB for {router}:"));
            if lsdb.is_empty() {
                out.push("  LSDB is empty".to_string());
            }
            out.extend(lsdb.iter().map(|(id, lsa)| {
                format!("  {id}: Type {:?}, Links: {}", lsa.lsa_type, lsa.links.len())
            }));
        }
        Command::ShowInterfaces(router) => {
            let store = sim.store();
            store.ospf_state(router)?;
            out.push(format!("OSPF Interfaces for {router}:"));
            let interfaces = store.device(router).map(|d| d.interfaces.as_slice()).unwrap_or_default();
            for interface in interfaces.iter().filter(|i| i.link_type == LinkType::Ospf) {
                if let Some(link) = store.link(&interface.link_id) {
                    out.push(format!(
                        "  {}: {}, Area {}, Cost: {}, State: {}",
                        interface.id, interface.ip_address, link.area, link.cost, interface.state
                    ));
                }
            }
        }
        Command::ShowTopology => {
            let store = sim.store();
            out.push("Topology Summary:".to_string());
            out.push(format!("  Devices: {}", store.device_count()));
            out.push(format!("  Links: {}", store.link_count()));
            let mut areas: BTreeMap<u32, usize> = BTreeMap::new();
            for router in store.routers() {
                if let Some(ospf) = &router.ospf {
                    *areas.entry(ospf.area).or_default() += 1;
                }
            }
            out.extend(areas.iter().map(|(area, n)| format!("  Area {area}: {n} routers")));
        }
        Command::ShowSteps => match sim.player() {
            None => {
                out.push("OSPF Steps (0/0):".to_string());
                out.push("  No OSPF steps available".to_string());
            }
            Some(player) => {
                out.push(format!("OSPF Steps ({}/{}):", player.index(), player.len()));
                out.extend(player.log().iter().enumerate().map(|(i, step)| {
                    let marker = if i == player.index() { "▶ " } else { "  " };
                    format!("{marker}Step {}: {}", i + 1, step.description)
                }));
            }
        },
        Command::Ping { source, destination } => match sim.ping(source, destination)? {
            Some(path) => {
                out.push(format!("Pinging {destination} from {source}..."));
                out.push(format!("Path: {}", path.hops.join(" -> ")));
                out.push(format!("Reply from {destination}: hops={} cost={}", path.hop_count(), path.cost));
            }
            None => out.push(format!("Destination {destination} unreachable from {source}")),
        },
        Command::Simulate => {
            let summary = sim.run_simulation().await;
            if let OutcomeSource::Local { reason: Some(reason) } = &summary.source {
                out.push(format!("{reason}; using local OSPF engine"));
            }
            out.push("OSPF simulation completed successfully".to_string());
            out.push(format!("Areas found: {}", summary.areas.len()));
            if !summary.abrs.is_empty() {
                out.push(format!("ABRs identified: {}", summary.abrs.join(", ")));
            }
            out.push(format!("Generated {} simulation steps", summary.steps));
        }
        Command::Step => match sim.step_once()? {
            StepOutcome::Applied { index, total, step } => {
                out.push(format!("=== OSPF Step {}/{}: {} ===", index + 1, total, step.description));
            }
            StepOutcome::Completed { .. } => {
                out.push("OSPF simulation completed. Reset to start again.".to_string());
            }
        },
        Command::Reset => {
            sim.reset_steps();
            out.push("OSPF simulation reset".to_string());
        }
        Command::Save(path) => {
            sim.save_topology(path)?;
            out.push(format!("Topology saved to {}", path.display()));
        }
        Command::Help => out.extend(HELP.iter().map(|l| l.to_string())),
        Command::Exit => {}
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{solver::adapter::SolverAdapter, topology::{presets::Preset, store::TopologyStore}};

    fn simulator() -> Simulator {
        let mut sim = Simulator::new(TopologyStore::default(), SolverAdapter::local());
        sim.load_preset(Preset::SingleArea).unwrap();
        sim
    }

    async fn run(sim: &mut Simulator, line: &str) -> Vec<String> {
        let command = Command::parse(line).unwrap().unwrap();
        execute(sim, &command).await.unwrap()
    }

    #[test]
    fn parses_keywords_case_insensitively_but_keeps_ids() {
        assert_eq!(
            Command::parse("SHOW ip Route R1").unwrap(),
            Some(Command::ShowRoute("R1".into()))
        );
        assert_eq!(
            Command::parse("ping PC1 Phone1").unwrap(),
            Some(Command::Ping { source: "PC1".into(), destination: "Phone1".into() })
        );
        assert_eq!(Command::parse("   ").unwrap(), None);
        assert_eq!(Command::parse("ospf steps").unwrap(), Some(Command::ShowSteps));
        assert!(matches!(Command::parse("show ip route"), Err(CommandError::Usage(_))));
        assert_eq!(
            Command::parse("enable").unwrap_err().to_string(),
            "Unknown command: enable. Type 'help' for available commands."
        );
    }

    #[tokio::test]
    async fn simulate_then_show_route() {
        let mut sim = simulator();
        let out = run(&mut sim, "ospf simulate").await;
        assert!(out.contains(&"Areas found: 1".to_string()));

        let out = run(&mut sim, "show ip route R1").await;
        assert_eq!(out[0], "Routing Table for R1:");
        assert!(out.contains(&"  O R3 [30] via R2".to_string()));

        let out = run(&mut sim, "show ip ospf neighbor R1").await;
        assert!(out.contains(&"  R2 - State: Full, Area: 0".to_string()));
    }

    #[tokio::test]
    async fn stepping_and_steps_listing() {
        let mut sim = simulator();
        run(&mut sim, "ospf simulate").await;
        let out = run(&mut sim, "step").await;
        assert_eq!(out, vec![format!(
            "=== OSPF Step 1/{}: Router R1 sends Hello packets ===",
            sim.steps().unwrap().len()
        )]);
        let listing = run(&mut sim, "show steps").await;
        assert!(listing[0].starts_with("OSPF Steps (1/"));
        assert_eq!(listing[2], "▶ Step 2: Router R2 sends Hello packets");

        assert_eq!(run(&mut sim, "ospf reset").await, vec!["OSPF simulation reset"]);
        assert_eq!(run(&mut sim, "show steps").await[1], "  No OSPF steps available");
    }

    #[tokio::test]
    async fn ping_and_topology_summary() {
        let mut sim = simulator();
        let out = run(&mut sim, "ping R1 R3").await;
        assert_eq!(out[1], "Path: R1 -> R2 -> R3");
        assert_eq!(out[2], "Reply from R3: hops=2 cost=30");

        let out = run(&mut sim, "show topology").await;
        assert_eq!(out, vec!["Topology Summary:", "  Devices: 8", "  Links: 9", "  Area 0: 4 routers"]);

        let out = run(&mut sim, "show ip ospf interface R1").await;
        assert_eq!(out[1], "  eth0: 172.16.0.1, Area 0, Cost: 10, State: up");
    }

    #[tokio::test]
    async fn errors_surface_from_session() {
        let mut sim = simulator();
        let step = Command::parse("step").unwrap().unwrap();
        assert!(matches!(execute(&mut sim, &step).await, Err(SimulationError::NoSimulation)));
        let show = Command::parse("show ip route PC1").unwrap().unwrap();
        assert!(execute(&mut sim, &show).await.is_err());
    }
}
