/*!
OSPF simulation

Structure:
- `step`: The step log model (`Step`, `StepAction`, `StepLog`).
- `state`: `RouterStates`, the per-router state steps are applied to.
- `spf`: Per-router shortest path first over an LSDB.
- `engine`: `OspfEngine`, the deterministic local simulation producing a log.
- `player`: `StepPlayer`, a replay cursor over a finished log.
*/

pub mod engine;
pub mod player;
pub mod spf;
pub mod state;
pub mod step;

pub use engine::{OspfEngine, SimulationOutcome};
pub use player::{Advance, PlaybackError, StepPlayer};
pub use state::RouterStates;
pub use step::{Step, StepAction, StepLog};
