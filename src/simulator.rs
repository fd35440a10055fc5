//! The narrow contract against the (external) discrete-event simulator.
//!
//! `spec.md` scopes the simulator itself out of this crate: it is consumed as an opaque oracle
//! that reports the clock, tasks becoming schedulable, and task completions. No implementation
//! is provided here; `#[cfg(test)]` code builds a minimal in-memory fake against this trait to
//! exercise the scheduling kernel end-to-end.

use crate::task::TaskState;

/// Operations a discrete-event simulator must expose for the scheduling kernel to drive it.
pub trait SimulatorAdapter {
    /// Current simulation clock.
    fn get_clock(&self) -> f64;

    /// Assigns a computation task to a host.
    fn schedule_task(&mut self, task: usize, host: usize);

    /// Assigns a communication task's source/destination hosts.
    fn schedule_transfer(&mut self, task: usize, src_host: usize, dst_host: usize);

    /// Injects a synthetic precedence edge `parent -> child` (used by the dispatch driver to
    /// enforce sequential execution / ordered data transfers).
    fn add_dependency(&mut self, parent: usize, child: usize);

    /// Registers interest in state transitions of `task`; `simulate` will report it in the
    /// `changed` set once it reaches `state`.
    fn watch(&mut self, task: usize, state: TaskState);

    /// Advances the simulation until a watched task changes state, or no further progress is
    /// possible. Returns the set of changed task ids; empty means quiescence.
    fn simulate(&mut self) -> Vec<usize>;

    fn task_state(&self, task: usize) -> TaskState;

    /// The hosts currently assigned to `task` (one for computation, `(src, dst)` for
    /// communication).
    fn task_hosts(&self, task: usize) -> &[usize];
}
