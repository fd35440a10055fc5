//! Minimum Completion Time (MCT).
//!
//! The dynamic variant: boundary tasks go to `master` eagerly, each host tracks an estimated
//! "free-at" time, and every schedulable task is assigned to whichever host promises the
//! earliest completion time, but only actually placed if that host happens to be idle right
//! now (otherwise it waits for the next event).
//!
//! The static variant adapts the same `get_ect` formula into a single topological-order pass.

use std::collections::HashSet;

use crate::error::Result;
use crate::graph::TaskGraph;
use crate::platform::PlatformModel;
use crate::scheduler::{validate_schedule, DynamicScheduler, Schedule, StaticScheduler};
use crate::schedulers::common::{try_schedule_boundary_task, HostKey, MinSelector};
use crate::schedulers::heft::state_to_schedule;
use crate::state::SchedulerState;
use crate::task::TaskState;

pub struct MctScheduler;

impl MctScheduler {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MctScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl StaticScheduler for MctScheduler {
    fn get_schedule(&self, graph: &TaskGraph, platform: &PlatformModel) -> Result<(Schedule, Option<f64>)> {
        let mut state = SchedulerState::new(platform.host_count(), graph.len());
        for task in graph.topological_order() {
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
                let key = HostKey {
                    primary: finish,
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
        log::info!("MCT expected makespan: {:.6}", expected_makespan);
        Ok((schedule, Some(expected_makespan)))
    }
}

/// Online MCT: assigns each schedulable task to the host with the earliest estimated
/// completion time, deferring the assignment until that host is actually free.
#[derive(Default)]
pub struct DynamicMctScheduler {
    host_est: Vec<f64>,
    started: HashSet<usize>,
    boundary_scheduled: bool,
}

impl DynamicMctScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn estimate(&self, est: f64, clock: f64, task: usize, host: usize, graph: &TaskGraph, platform: &PlatformModel) -> f64 {
        let comm = graph
            .parents(task)
            .iter()
            .filter_map(|&p| graph.task(p).hosts.first().map(|&ph| platform.ecomt(graph.edge_weight(p, task), ph, host)))
            .fold(0.0_f64, f64::max);
        est.max(clock) + comm + platform.eet(graph.task(task).amount, host)
    }
}

impl DynamicScheduler for DynamicMctScheduler {
    fn prepare(&mut self, _graph: &TaskGraph, platform: &PlatformModel) {
        self.host_est = vec![0.; platform.host_count()];
        self.started.clear();
        self.boundary_scheduled = false;
    }

    fn on_event(
        &mut self,
        graph: &TaskGraph,
        platform: &PlatformModel,
        clock: f64,
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
            let t = graph.task(task);
            if matches!(t.state, TaskState::Running | TaskState::Scheduled) {
                if let Some(&host) = t.hosts.first() {
                    if Some(host) != platform.master_host() && t.start > 0. && self.started.insert(task) {
                        self.host_est[host] = t.start + platform.eet(t.amount, host);
                    }
                }
            }
        }

        let mut free: Vec<bool> = (0..platform.host_count())
            .map(|h| Some(h) != platform.master_host())
            .collect();
        for task in 0..graph.len() {
            let t = graph.task(task);
            if matches!(t.state, TaskState::Running | TaskState::Scheduled) {
                if let Some(&host) = t.hosts.first() {
                    free[host] = false;
                }
            }
        }

        let mut local_est = self.host_est.clone();
        for task in 0..graph.len() {
            if !free.iter().any(|&f| f) {
                break;
            }
            if graph.task(task).is_boundary() || graph.task(task).state != TaskState::Schedulable {
                continue;
            }
            let mut best: Option<(f64, usize)> = None;
            for host in 0..platform.host_count() {
                if Some(host) == platform.master_host() {
                    continue;
                }
                let ect = self.estimate(local_est[host], clock, task, host, graph, platform);
                match best {
                    None => best = Some((ect, host)),
                    Some((best_ect, _)) if ect < best_ect => best = Some((ect, host)),
                    _ => {}
                }
            }
            let (ect, target) = best.expect("platform has at least one non-master host");
            local_est[target] = ect;
            if free[target] {
                assignments.push((task, target));
                self.host_est[target] = ect;
                free[target] = false;
            }
        }

        assignments
    }
}
