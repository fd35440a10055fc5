//! Scheduler state: per-host timetable plus per-task placement, shared by every static and
//! dynamic scheduling algorithm.

use crate::error::{Result, SchedKernelError};
use crate::timesheet::Timesheet;

/// Placement of one task: the host it runs on, its earliest completion time, and its position
/// in that host's [`Timesheet`].
#[derive(Clone, Copy, Debug)]
pub struct TaskPlacement {
    pub host: usize,
    pub ect: f64,
    pub position: usize,
}

/// `host -> Timesheet` plus `task -> {host, ect, position}`.
///
/// Copy-on-branch: [`SchedulerState::clone`] deep-copies both maps, which Lookahead and LDCP
/// rely on to evaluate hypothetical completions without mutating the canonical state.
#[derive(Clone)]
pub struct SchedulerState {
    timetable: Vec<Timesheet>,
    task_state: Vec<Option<TaskPlacement>>,
}

impl SchedulerState {
    pub fn new(host_count: usize, task_count: usize) -> Self {
        Self {
            timetable: vec![Timesheet::new(); host_count],
            task_state: vec![None; task_count],
        }
    }

    pub fn timetable(&self, host: usize) -> &Timesheet {
        &self.timetable[host]
    }

    pub fn timetable_mut(&mut self, host: usize) -> &mut Timesheet {
        &mut self.timetable[host]
    }

    pub fn timetables(&self) -> &[Timesheet] {
        &self.timetable
    }

    pub fn task_state(&self, task: usize) -> Option<&TaskPlacement> {
        self.task_state[task].as_ref()
    }

    pub fn is_scheduled(&self, task: usize) -> bool {
        self.task_state[task].is_some()
    }

    /// Places `task` on `host` at `position` with the given `start`/`finish`, updating both the
    /// timetable and the task-state map.
    pub fn update(&mut self, task: usize, host: usize, position: usize, start: f64, finish: f64) {
        self.timetable[host].insert(position, task, start, finish);
        self.task_state[task] = Some(TaskPlacement { host, ect: finish, position });
    }

    /// The predicted makespan: the maximum earliest-completion-time across all scheduled tasks.
    pub fn max_time(&self) -> Result<f64> {
        self.task_state
            .iter()
            .flatten()
            .map(|p| p.ect)
            .fold(None, |acc, ect| Some(acc.map_or(ect, |m: f64| m.max(ect))))
            .ok_or_else(|| SchedKernelError::SchedulingError {
                message: "no task has been scheduled yet".to_string(),
                tasks: Vec::new(),
            })
    }
}
