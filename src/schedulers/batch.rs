//! Batch-mode heuristics: MinMin, MaxMin, Sufferage.
//!
//! The dynamic variant: every currently-schedulable task is given an estimated completion
//! time on every host, one task/host pair is picked per `BatchKind`'s heuristic, committed only
//! if the chosen host is free right now, and the process repeats against the shrinking
//! candidate set until no more progress can be made this event.
//!
//! The static variants below run the identical heuristic as a classic static list-scheduling
//! pass: at each round, the ready wavefront (tasks whose parents are already placed) is
//! evaluated against the *real* gap-aware [`crate::timesheet::Timesheet`], one task is
//! committed per iteration, and the round repeats until the whole workflow is placed.

use crate::error::Result;
use crate::graph::TaskGraph;
use crate::platform::PlatformModel;
use crate::scheduler::{validate_schedule, DynamicScheduler, Schedule, StaticScheduler};
use crate::schedulers::common::try_schedule_boundary_task;
use crate::schedulers::heft::state_to_schedule;
use crate::state::SchedulerState;
use crate::task::TaskState;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BatchKind {
    MinMin,
    MaxMin,
    Sufferage,
}

pub struct BatchScheduler {
    kind: BatchKind,
}

impl BatchScheduler {
    pub fn new(kind: BatchKind) -> Self {
        Self { kind }
    }
}

impl StaticScheduler for BatchScheduler {
    fn get_schedule(&self, graph: &TaskGraph, platform: &PlatformModel) -> Result<(Schedule, Option<f64>)> {
        let mut state = SchedulerState::new(platform.host_count(), graph.len());
        let mut scheduled = vec![false; graph.len()];
        let exec_hosts: Vec<usize> = (0..platform.host_count()).filter(|&h| Some(h) != platform.master_host()).collect();

        loop {
            let mut ready: Vec<usize> = (0..graph.len())
                .filter(|&t| !scheduled[t] && graph.parents(t).iter().all(|&p| scheduled[p]))
                .collect();
            if ready.is_empty() {
                break;
            }

            let mut still_ready = Vec::with_capacity(ready.len());
            for t in ready {
                if try_schedule_boundary_task(t, graph, platform, &mut state)? {
                    scheduled[t] = true;
                } else {
                    still_ready.push(t);
                }
            }
            let mut ready = still_ready;

            while !ready.is_empty() {
                // (index into `ready`, best host, best finish, sufferage)
                let mut choices: Vec<(usize, usize, f64, f64, (usize, f64, f64))> = Vec::with_capacity(ready.len());
                for (i, &task) in ready.iter().enumerate() {
                    let mut per_host: Vec<(f64, usize, usize, f64, f64)> = Vec::with_capacity(exec_hosts.len());
                    for &host in &exec_hosts {
                        let est = platform.est(host, task, graph, &state)?;
                        let eet = platform.eet(graph.task(task).amount, host);
                        let (pos, start, finish) = state.timetable(host).find_slot(est, eet);
                        per_host.push((finish, host, pos, start, finish));
                    }
                    per_host.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
                    let (best_finish, best_host, pos, start, finish) = per_host[0];
                    let sufferage = if per_host.len() > 1 { per_host[1].0 - best_finish } else { -best_finish };
                    choices.push((i, best_host, best_finish, sufferage, (pos, start, finish)));
                }

                let picked = match self.kind {
                    BatchKind::MinMin => choices.iter().min_by(|a, b| lexi_cmp((a.2, a.0), (b.2, b.0))),
                    BatchKind::MaxMin => choices.iter().max_by(|a, b| lexi_cmp((a.2, a.0), (b.2, b.0))),
                    BatchKind::Sufferage => choices.iter().max_by(|a, b| lexi_cmp((a.3, a.0), (b.3, b.0))),
                }
                .copied()
                .expect("ready is non-empty");

                let (idx, host, _, _, (pos, start, finish)) = picked;
                let task = ready[idx];
                state.update(task, host, pos, start, finish);
                scheduled[task] = true;
                ready.remove(idx);
            }
        }

        let schedule = state_to_schedule(&state, platform.host_count());
        validate_schedule(&schedule, graph)?;
        let expected_makespan = state.max_time()?;
        log::info!("{:?} expected makespan: {:.6}", self.kind, expected_makespan);
        Ok((schedule, Some(expected_makespan)))
    }
}

fn lexi_cmp(a: (f64, usize), b: (f64, usize)) -> std::cmp::Ordering {
    a.0.total_cmp(&b.0).then(a.1.cmp(&b.1))
}

/// Online batch scheduler: every event, estimates completion times for all schedulable tasks on
/// all hosts and commits the heuristic's pick whenever the chosen host is free.
pub struct DynamicBatchScheduler {
    kind: BatchKind,
    host_est: Vec<f64>,
    boundary_scheduled: bool,
}

impl DynamicBatchScheduler {
    pub fn new(kind: BatchKind) -> Self {
        Self {
            kind,
            host_est: Vec::new(),
            boundary_scheduled: false,
        }
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

impl DynamicScheduler for DynamicBatchScheduler {
    fn prepare(&mut self, _graph: &TaskGraph, platform: &PlatformModel) {
        self.host_est = vec![0.; platform.host_count()];
        self.boundary_scheduled = false;
    }

    fn on_event(
        &mut self,
        graph: &TaskGraph,
        platform: &PlatformModel,
        clock: f64,
        _changed: &[usize],
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

        let exec_hosts: Vec<usize> = (0..platform.host_count()).filter(|&h| Some(h) != platform.master_host()).collect();
        let mut free: Vec<bool> = (0..platform.host_count()).map(|h| Some(h) != platform.master_host()).collect();
        for task in 0..graph.len() {
            let t = graph.task(task);
            if matches!(t.state, TaskState::Running | TaskState::Scheduled) {
                if let Some(&host) = t.hosts.first() {
                    free[host] = false;
                }
            }
        }

        let mut candidates: Vec<usize> = (0..graph.len())
            .filter(|&t| !graph.task(t).is_boundary() && graph.task(t).state == TaskState::Schedulable)
            .collect();
        let mut local_est = self.host_est.clone();

        while !candidates.is_empty() && free.iter().any(|&f| f) {
            let mut choices: Vec<(usize, usize, f64, f64)> = Vec::with_capacity(candidates.len());
            for (i, &task) in candidates.iter().enumerate() {
                let mut per_host: Vec<(f64, usize)> = exec_hosts
                    .iter()
                    .map(|&h| (self.estimate(local_est[h], clock, task, h, graph, platform), h))
                    .collect();
                per_host.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
                let (best_ect, best_host) = per_host[0];
                let sufferage = if per_host.len() > 1 { per_host[1].0 - best_ect } else { -best_ect };
                choices.push((i, best_host, best_ect, sufferage));
            }

            let picked = match self.kind {
                BatchKind::MinMin => choices.iter().min_by(|a, b| lexi_cmp((a.2, a.0), (b.2, b.0))),
                BatchKind::MaxMin => choices.iter().max_by(|a, b| lexi_cmp((a.2, a.0), (b.2, b.0))),
                BatchKind::Sufferage => choices.iter().max_by(|a, b| lexi_cmp((a.3, a.0), (b.3, b.0))),
            }
            .copied()
            .expect("candidates is non-empty");

            let (idx, host, ect, _) = picked;
            let task = candidates[idx];
            local_est[host] = ect;
            if free[host] {
                assignments.push((task, host));
                self.host_est[host] = ect;
                free[host] = false;
            }
            candidates.remove(idx);
        }

        assignments
    }
}

impl std::fmt::Debug for BatchKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BatchKind::MinMin => write!(f, "MinMin"),
            BatchKind::MaxMin => write!(f, "MaxMin"),
            BatchKind::Sufferage => write!(f, "Sufferage"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{Platform, SharingPolicy};
    use crate::task::{Task, TaskKind};

    fn fork_join_platform(n: usize) -> PlatformModel {
        let mut platform = Platform::new();
        for i in 0..n {
            platform.add_host(&format!("h{i}"), 1e9);
        }
        let lo = platform.add_link("lo", f64::INFINITY, 0., SharingPolicy::FatPipe);
        for i in 0..n {
            platform.add_route(i, i, vec![lo], false);
            for j in (i + 1)..n {
                platform.add_route(i, j, vec![lo], true);
            }
        }
        PlatformModel::new(&platform)
    }

    fn fork_join(n: usize, amount: f64) -> TaskGraph {
        let mut tasks = vec![Task::new("root", TaskKind::Computation, 0.)];
        for i in 0..n {
            tasks.push(Task::new(&format!("T{i}"), TaskKind::Computation, amount));
        }
        tasks.push(Task::new("end", TaskKind::Computation, 0.));
        let mut edges = Vec::new();
        for i in 0..n {
            edges.push((0, i + 1, 0.));
            edges.push((i + 1, n + 1, 0.));
        }
        TaskGraph::from_tasks_and_edges(tasks, edges).unwrap()
    }

    #[test]
    fn minmin_spreads_independent_tasks_across_hosts() {
        let graph = fork_join(3, 1e9);
        let platform = fork_join_platform(3);
        let (schedule, makespan) = BatchScheduler::new(BatchKind::MinMin).get_schedule(&graph, &platform).unwrap();
        assert!((makespan.unwrap() - 1.0).abs() < 1e-6);
        assert_eq!(schedule.len(), 3);
    }

    #[test]
    fn sufferage_also_covers_every_task_exactly_once() {
        let graph = fork_join(4, 1e9);
        let platform = fork_join_platform(2);
        let (schedule, _) = BatchScheduler::new(BatchKind::Sufferage).get_schedule(&graph, &platform).unwrap();
        let total: usize = schedule.values().map(|v| v.len()).sum();
        assert_eq!(total, graph.len());
    }
}
