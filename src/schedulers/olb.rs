//! Opportunistic Load Balancing (OLB) — static and dynamic variants.
//!
//! Boundary tasks go straight to the `master` host in `prepare`; every other schedulable task
//! is queued and, as hosts free up, handed to whichever idle execution host is currently
//! fastest — communication cost is never consulted. The static variant below runs the same
//! host-selection policy as a single topological-order pass.

use std::collections::VecDeque;

use crate::error::Result;
use crate::graph::TaskGraph;
use crate::platform::PlatformModel;
use crate::scheduler::{validate_schedule, DynamicScheduler, Schedule, StaticScheduler};
use crate::schedulers::common::try_schedule_boundary_task;
use crate::schedulers::heft::state_to_schedule;
use crate::state::SchedulerState;
use crate::task::TaskState;

/// Baseline for normalization: round-robins tasks, in topological order, to
/// whichever non-master host is currently fastest among those not yet carrying a later-finishing
/// task, entirely ignoring communication cost.
pub struct StaticOlbScheduler;

impl StaticOlbScheduler {
    pub fn new() -> Self {
        Self
    }
}

impl Default for StaticOlbScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl StaticScheduler for StaticOlbScheduler {
    fn get_schedule(&self, graph: &TaskGraph, platform: &PlatformModel) -> Result<(Schedule, Option<f64>)> {
        let mut state = SchedulerState::new(platform.host_count(), graph.len());
        let mut free_at = vec![0.0_f64; platform.host_count()];

        for task in graph.topological_order() {
            if try_schedule_boundary_task(task, graph, platform, &mut state)? {
                continue;
            }
            let host = (0..platform.host_count())
                .filter(|&h| Some(h) != platform.master_host())
                .min_by(|&a, &b| {
                    free_at[a]
                        .total_cmp(&free_at[b])
                        .then(platform.speed(b).total_cmp(&platform.speed(a)))
                        .then(a.cmp(&b))
                })
                .expect("platform has at least one non-master host");
            let est = platform.est(host, task, graph, &state)?;
            let eet = platform.eet(graph.task(task).amount, host);
            let (pos, start, finish) = state.timetable(host).find_slot(est, eet);
            state.update(task, host, pos, start, finish);
            free_at[host] = finish;
        }

        let schedule = state_to_schedule(&state, platform.host_count());
        validate_schedule(&schedule, graph)?;
        Ok((schedule, Some(state.max_time()?)))
    }
}

#[derive(Default)]
pub struct OlbScheduler {
    queue: VecDeque<usize>,
    busy: Vec<bool>,
    boundary_scheduled: bool,
}

impl OlbScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn fastest_idle_host(&self, platform: &PlatformModel) -> Option<usize> {
        let mut best: Option<(f64, usize)> = None;
        for host in 0..platform.host_count() {
            if Some(host) == platform.master_host() || self.busy[host] {
                continue;
            }
            let speed = platform.speed(host);
            match best {
                None => best = Some((speed, host)),
                Some((best_speed, _)) if speed > best_speed => best = Some((speed, host)),
                _ => {}
            }
        }
        best.map(|(_, host)| host)
    }
}

impl DynamicScheduler for OlbScheduler {
    fn prepare(&mut self, _graph: &TaskGraph, platform: &PlatformModel) {
        self.busy = vec![false; platform.host_count()];
        self.queue.clear();
        self.boundary_scheduled = false;
    }

    fn on_event(
        &mut self,
        graph: &TaskGraph,
        platform: &PlatformModel,
        _clock: f64,
        changed: &[usize],
    ) -> Vec<(usize, usize)> {
        let mut assignments = Vec::new();

        if !self.boundary_scheduled {
            if let Some(master) = platform.master_host() {
                for task in 0..graph.len() {
                    if graph.task(task).is_boundary() {
                        assignments.push((task, master));
                    }
                }
            }
            self.boundary_scheduled = true;
        }

        for &task in changed {
            match graph.task(task).state {
                TaskState::Done | TaskState::Failed => {
                    for &host in &graph.task(task).hosts {
                        if Some(host) != platform.master_host() {
                            self.busy[host] = false;
                        }
                    }
                }
                TaskState::Running | TaskState::Scheduled => {
                    for &host in &graph.task(task).hosts {
                        if Some(host) != platform.master_host() {
                            self.busy[host] = true;
                        }
                    }
                }
                TaskState::Schedulable if !graph.task(task).is_boundary() => {
                    if !self.queue.contains(&task) {
                        self.queue.push_back(task);
                    }
                }
                _ => {}
            }
        }

        while let Some(&task) = self.queue.front() {
            match self.fastest_idle_host(platform) {
                Some(host) => {
                    self.queue.pop_front();
                    self.busy[host] = true;
                    assignments.push((task, host));
                }
                None => break,
            }
        }

        assignments
    }
}
