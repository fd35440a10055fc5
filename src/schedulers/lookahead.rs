//! Lookahead.
//!
//! Same HEFT task order, but for each `(task, host)` candidate it completes a full HEFT
//! schedule of the *remaining* tasks on a state copy and picks the host minimizing the
//! resulting predicted makespan rather than just the task's own finish time. The state copy
//! (timetable plus task state) is a full, independent clone via [`SchedulerState::clone`] so
//! the hypothetical evaluation can never observably mutate the original.

use crate::error::Result;
use crate::graph::TaskGraph;
use crate::platform::PlatformModel;
use crate::scheduler::{validate_schedule, Schedule, StaticScheduler};
use crate::schedulers::common::{try_schedule_boundary_task, HostKey, MinSelector};
use crate::schedulers::heft::{state_to_schedule, HeftScheduler};
use crate::state::SchedulerState;

pub struct LookaheadScheduler;

impl LookaheadScheduler {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LookaheadScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl StaticScheduler for LookaheadScheduler {
    fn get_schedule(&self, graph: &TaskGraph, platform: &PlatformModel) -> Result<(Schedule, Option<f64>)> {
        let mut state = SchedulerState::new(platform.host_count(), graph.len());
        let ordered = HeftScheduler::order(graph, platform);

        for (idx, &task) in ordered.iter().enumerate() {
            if try_schedule_boundary_task(task, graph, platform, &mut state)? {
                continue;
            }

            let mut best = MinSelector::new();
            for host in 0..platform.host_count() {
                if Some(host) == platform.master_host() {
                    continue;
                }
                let est = platform.est(host, task, graph, &state)?;
                let eet = platform.eet(graph.task(task).amount, host);
                let (pos, start, finish) = state.timetable(host).find_slot(est, eet);

                // Tentatively place `task` on `host` in a throwaway copy, then finish a HEFT
                // schedule of the remaining tasks on *that* copy to observe the resulting
                // makespan. The canonical `state` is never touched by this evaluation.
                let mut lookahead_state = state.clone();
                lookahead_state.update(task, host, pos, start, finish);
                HeftScheduler::schedule_ordered(graph, platform, &mut lookahead_state, &ordered[idx + 1..])?;
                let total_time = lookahead_state.max_time()?;

                let key = HostKey {
                    primary: total_time,
                    speed: platform.speed(host),
                    name: platform.host_name(host),
                };
                best.update(key, (host, pos, start, finish));
            }
            let (host, pos, start, finish) = best
                .into_value()
                .expect("platform has at least one non-master host")
                .1;
            state.update(task, host, pos, start, finish);
        }

        let schedule = state_to_schedule(&state, platform.host_count());
        validate_schedule(&schedule, graph)?;
        let expected_makespan = state.max_time()?;
        log::info!("Lookahead expected makespan: {:.6}", expected_makespan);
        Ok((schedule, Some(expected_makespan)))
    }

    fn publishes_ect(&self) -> bool {
        true
    }
}
