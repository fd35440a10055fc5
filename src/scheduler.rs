//! Scheduler traits and the run loop that drives a scheduler against a [`SimulatorAdapter`].
//!
//! Two disjoint capability sets: [`StaticScheduler`] computes a full schedule up front via
//! `get_schedule`; [`DynamicScheduler`] reacts incrementally via `prepare` + `on_event`.

use std::collections::HashMap;
use std::time::Instant;

use crate::error::{Result, SchedKernelError};
use crate::graph::TaskGraph;
use crate::platform::PlatformModel;
use crate::task::TaskState;

/// A static schedule: for each host, the ordered list of tasks intended to run there.
pub type Schedule = HashMap<usize, Vec<usize>>;

/// Produces a full schedule up front, given the whole workflow.
pub trait StaticScheduler {
    /// Computes the schedule and, optionally, the scheduler's own makespan prediction
    /// (`= max task_state[*].ect`).
    fn get_schedule(&self, graph: &TaskGraph, platform: &PlatformModel) -> Result<(Schedule, Option<f64>)>;

    /// Whether this algorithm publishes a per-task ECT prediction usable by
    /// `DATA_TRANSFER=QUEUE_ECT` (true for HEFT and Lookahead).
    fn publishes_ect(&self) -> bool {
        false
    }
}

/// Reacts incrementally to simulator events instead of planning the whole workflow up front.
pub trait DynamicScheduler {
    /// Called once before the first `simulate()` call.
    fn prepare(&mut self, graph: &TaskGraph, platform: &PlatformModel);

    /// Called whenever the simulator reports changed tasks; returns newly decided
    /// `(task, host)` assignments.
    fn on_event(
        &mut self,
        graph: &TaskGraph,
        platform: &PlatformModel,
        clock: f64,
        changed: &[usize],
    ) -> Vec<(usize, usize)>;
}

/// Bookkeeping shared by both scheduler kinds once a run has executed: wall-clock time spent
/// inside the algorithm, total run time, and (for static algorithms) the predicted makespan.
#[derive(Clone, Copy, Debug, Default)]
pub struct RunTiming {
    pub scheduler_time: f64,
    pub total_time: f64,
    pub expected_makespan: Option<f64>,
}

/// Validates that a [`Schedule`] returned by a [`StaticScheduler`] actually covers every
/// computation task exactly once: no partial schedule is ever accepted.
pub fn validate_schedule(schedule: &Schedule, graph: &TaskGraph) -> Result<()> {
    let mut seen = vec![false; graph.len()];
    for tasks in schedule.values() {
        for &t in tasks {
            if seen[t] {
                return Err(SchedKernelError::SchedulingError {
                    message: "task scheduled more than once".to_string(),
                    tasks: vec![graph.task(t).name.clone()],
                });
            }
            seen[t] = true;
        }
    }
    let missing: Vec<String> = (0..graph.len())
        .filter(|&t| !seen[t])
        .map(|t| graph.task(t).name.clone())
        .collect();
    if !missing.is_empty() {
        return Err(SchedKernelError::SchedulingError {
            message: "static algorithm left tasks unscheduled".to_string(),
            tasks: missing,
        });
    }
    Ok(())
}

/// Times a scheduling computation, matching `StaticScheduler.run`'s `time.time()` bracketing in
/// the original.
pub fn timed<T>(f: impl FnOnce() -> T) -> (T, f64) {
    let start = Instant::now();
    let result = f();
    (result, start.elapsed().as_secs_f64())
}

/// A task's terminal state for the purposes of the exit contract: a run is
/// successful iff every non-communication task reaches `Done`.
pub fn check_all_done(states: &[TaskState], names: impl Fn(usize) -> String) -> Result<()> {
    let offending: Vec<String> = states
        .iter()
        .enumerate()
        .filter(|(_, &s)| s != TaskState::Done)
        .map(|(i, _)| names(i))
        .collect();
    if !offending.is_empty() {
        return Err(SchedKernelError::SchedulingError {
            message: "some tasks did not reach Done by simulator quiescence".to_string(),
            tasks: offending,
        });
    }
    Ok(())
}
