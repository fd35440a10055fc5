//! DAG task.

use enum_iterator::IntoEnumIterator;

/// Kind of a task vertex in the raw (pre-fold) workflow graph.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TaskKind {
    Computation,
    Communication,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, IntoEnumIterator)]
pub enum TaskState {
    /// Waiting for its dependencies.
    NotScheduled,
    /// All dependencies are satisfied, ready to be scheduled.
    Schedulable,
    /// Placed by the scheduler, waiting on dependencies to let it run.
    Scheduled,
    /// Placed and all dependencies satisfied.
    Runnable,
    /// Currently executing.
    Running,
    /// Finished successfully.
    Done,
    /// Reported as failed by the simulator.
    Failed,
}

/// A computational task. Communication ("transfer") tasks are folded into weighted edges by
/// [`crate::graph::TaskGraph`] and are not represented as standalone vertices in the analytical
/// graph used by the scheduling algorithms; this struct models a computation vertex only.
#[derive(Clone, Debug)]
pub struct Task {
    pub name: String,
    pub kind: TaskKind,
    /// Flops for computation tasks, bytes for communication tasks.
    pub amount: f64,
    pub state: TaskState,
    pub parents: Vec<usize>,
    pub children: Vec<usize>,
    /// Host(s) this task is assigned to: one entry for computation, two (src, dst) for
    /// communication. Empty until scheduled.
    pub hosts: Vec<usize>,
    pub start: f64,
    pub finish: f64,
}

impl Task {
    pub fn new(name: &str, kind: TaskKind, amount: f64) -> Self {
        Self {
            name: name.to_string(),
            kind,
            amount,
            state: TaskState::NotScheduled,
            parents: Vec::new(),
            children: Vec::new(),
            hosts: Vec::new(),
            start: f64::NAN,
            finish: f64::NAN,
        }
    }

    /// A boundary task (`root` or `end`) has zero work by construction.
    pub fn is_boundary(&self) -> bool {
        self.amount == 0. && (self.name == "root" || self.name == "end" || self.name == "TRUE_ROOT" || self.name == "TRUE_END")
    }
}
