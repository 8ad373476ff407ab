/*!
OSPF network simulator.

- `network`: Devices, interfaces, links, per-router OSPF state and path finding.
- `topology`: The `TopologyStore`, snapshots, presets and change events.
- `ospf`: The local OSPF engine, its step log and the step player.
- `solver`: The external solver protocol, HTTP client and fallback adapter.
- `simulation`: `Simulator`, the session a front end drives.
- `cli`: Router-style commands over a `Simulator`.
- `config`: TOML configuration.
*/

pub mod cli;
pub mod config;
pub mod network;
pub mod ospf;
pub mod simulation;
pub mod solver;
pub mod topology;
