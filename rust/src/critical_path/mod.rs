//! Critical Path Method over the project's dependency graph.
//!
//! The analysis is stateless: every call rebuilds the connected subgraph from the current
//! project and runs a fresh forward/backward pass.

mod calculation;
mod types;

pub use calculation::compute_critical_path;
pub use types::{arrow_key, ActivityTiming, CriticalPathResult};
