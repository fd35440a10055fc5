//! Per-run result record, accumulated while the [`dispatch`](crate::dispatch) driver
//! replays a schedule against the simulator and finalized once the run completes.

use serde::{Deserialize, Serialize};

/// Metrics collected from one algorithm invocation against one platform/workflow pair.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ResultRecord {
    pub platform: String,
    pub workflow: String,
    pub algorithm: String,
    /// Final simulator clock once every task has reached `Done`.
    pub makespan: f64,
    /// Sum over computation tasks of `finish - start`.
    pub exec_time: f64,
    /// Sum over communication tasks of `finish - start`.
    pub comm_time: f64,
    /// Wall-clock seconds spent inside the scheduling algorithm (sum over every call for
    /// dynamic schedulers, one call for static ones).
    pub scheduler_time: f64,
    /// Reported by static algorithms only: `= max task_state[*].ect` at the time the schedule
    /// was produced (`spec.md` §9).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_makespan: Option<f64>,

    /// `makespan / lower_bound`, filled in by [`ResultRecord::set_lower_bound`] once the
    /// workflow's critical-path bound ([`crate::lower_bound::makespan_lower_bound`]) is known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub normalized_makespan: Option<f64>,

    #[serde(skip)]
    task_starts: std::collections::HashMap<usize, f64>,
    #[serde(skip)]
    lower_bound: Option<f64>,
}

impl ResultRecord {
    pub fn new(platform: impl Into<String>, workflow: impl Into<String>, algorithm: impl Into<String>) -> Self {
        Self {
            platform: platform.into(),
            workflow: workflow.into(),
            algorithm: algorithm.into(),
            ..Default::default()
        }
    }

    pub fn set_expected_makespan(&mut self, makespan: f64) {
        self.expected_makespan = Some(makespan);
    }

    /// Records the workflow's critical-path lower bound and derives `normalized_makespan` from
    /// whatever `makespan` has accumulated so far; call again after the run finishes to refresh
    /// it against the final makespan.
    pub fn set_lower_bound(&mut self, lower_bound: f64) {
        self.lower_bound = Some(lower_bound);
        self.refresh_normalized_makespan();
    }

    fn refresh_normalized_makespan(&mut self) {
        if let Some(lower_bound) = self.lower_bound {
            if lower_bound > 0. {
                self.normalized_makespan = Some(self.makespan / lower_bound);
            }
        }
    }

    pub fn add_scheduler_time(&mut self, time: f64) {
        self.scheduler_time += time;
    }

    pub fn record_task_start(&mut self, task: usize, time: f64) {
        self.task_starts.insert(task, time);
    }

    /// Folds a finished computation task's duration into `exec_time` and bumps `makespan`.
    pub fn record_task_finish(&mut self, task: usize, time: f64) {
        if let Some(start) = self.task_starts.remove(&task) {
            self.exec_time += time - start;
        }
        self.makespan = self.makespan.max(time);
        self.refresh_normalized_makespan();
    }

    /// Folds a finished communication task's duration into `comm_time` and bumps `makespan`.
    pub fn record_transfer_finish(&mut self, task: usize, time: f64) {
        if let Some(start) = self.task_starts.remove(&task) {
            self.comm_time += time - start;
        }
        self.makespan = self.makespan.max(time);
        self.refresh_normalized_makespan();
    }
}
