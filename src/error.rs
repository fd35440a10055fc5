//! Crate-wide error taxonomy (`spec.md` §7).

use std::fmt;

/// Errors raised anywhere in the scheduling kernel.
#[derive(Debug, Clone)]
pub enum SchedKernelError {
    /// Unknown algorithm, contradictory modes (e.g. `QUEUE_ECT` with OLB), or a missing
    /// `master` host when the workflow references one.
    ConfigurationError(String),
    /// Missing root/end, multiple unreconciled roots, or a cycle detected in the workflow graph.
    GraphError(String),
    /// An algorithm produced a schedule that omits a task, assigns a task to no host, or
    /// violates the `Timesheet` non-overlap invariant.
    SchedulingError { message: String, tasks: Vec<String> },
    /// `est` queried with an unscheduled parent, or `update` called at a position that would
    /// break timesheet ordering.
    InvalidState(String),
    /// Propagated from the `SimulatorAdapter` (unreachable hosts, file IO, ...).
    SimulationError(String),
}

impl fmt::Display for SchedKernelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchedKernelError::ConfigurationError(msg) => write!(f, "configuration error: {msg}"),
            SchedKernelError::GraphError(msg) => write!(f, "graph error: {msg}"),
            SchedKernelError::SchedulingError { message, tasks } => {
                write!(f, "scheduling error: {message} (tasks: {})", tasks.join(", "))
            }
            SchedKernelError::InvalidState(msg) => write!(f, "invalid state: {msg}"),
            SchedKernelError::SimulationError(msg) => write!(f, "simulation error: {msg}"),
        }
    }
}

impl std::error::Error for SchedKernelError {}

pub type Result<T> = std::result::Result<T, SchedKernelError>;
