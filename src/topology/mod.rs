/*!
Topology module

This module owns the simulated network and everything that reads or writes it whole.

Structure:
- `store`: The `TopologyStore` holding devices, interfaces and links, with its
           structural invariants and `TopologyError`.
- `events`: Change notifications recorded by store mutations.
- `snapshot`: The persisted `{devices, links, timestamp}` layout, also sent to the solver.
- `presets`: Example topologies.

Re-exports:
- `TopologyStore`, `TopologyError`, `TopologySnapshot` and `TopologyEvent` for easy consumption by callers.
*/

pub mod events;
pub mod presets;
pub mod snapshot;
pub mod store;

pub use events::TopologyEvent;
pub use presets::Preset;
pub use snapshot::{SnapshotError, TopologySnapshot};
pub use store::{TopologyError, TopologyStore};
