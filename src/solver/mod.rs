/*!
External solver

Structure:
- `protocol`: Request and response documents exchanged with the solver.
- `client`: `SolverTransport` (async trait), its HTTP implementation and `SolverError`.
- `adapter`: `SolverAdapter`, which validates a remote result or falls back to the local engine.
*/

pub mod adapter;
pub mod client;
pub mod protocol;

pub use adapter::{OutcomeSource, Solution, SolverAdapter};
pub use client::{HttpSolverClient, SolverError, SolverTransport};
pub use protocol::{SolverRequest, SolverResponse};
