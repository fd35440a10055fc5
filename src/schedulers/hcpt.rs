//! Heterogeneous Critical Parent Trees (HCPT).
//!
//! A "guided" topological sort visits critical-path tasks (`AEST ≈ ALST`) in ascending-AEST order first, recursively pulling
//! in any not-yet-visited parent (critical or not, parents sorted by ascending AEST) before a
//! task is allowed into the placement queue. Placement itself then picks, for each queued task,
//! the host minimizing `(finish, host.speed, host.name)`.

use std::collections::{HashSet, VecDeque};

use crate::analyzer::{aest_alst, is_critical};
use crate::error::Result;
use crate::graph::TaskGraph;
use crate::platform::PlatformModel;
use crate::scheduler::{validate_schedule, Schedule, StaticScheduler};
use crate::schedulers::common::{try_schedule_boundary_task, HostKey, MinSelector};
use crate::schedulers::heft::state_to_schedule;
use crate::state::SchedulerState;

/// Tolerance for treating `AEST` and `ALST` as equal when identifying critical-path tasks.
const CRITICALITY_TOLERANCE: f64 = 1e-6;

pub struct HcptScheduler;

impl HcptScheduler {
    pub fn new() -> Self {
        Self
    }

    /// Builds the guided topological order: critical-path tasks first (ascending AEST),
    /// transitively requiring every parent to be queued first.
    fn guided_order(graph: &TaskGraph, aest: &[f64], alst: &[f64]) -> Vec<usize> {
        let n = graph.len();
        let mut critical_path: Vec<usize> = (0..n).filter(|&t| is_critical(aest, alst, t, CRITICALITY_TOLERANCE)).collect();
        critical_path.sort_by(|&a, &b| aest[a].total_cmp(&aest[b]));
        critical_path.reverse();

        let mut stack = critical_path;
        let mut queue: VecDeque<usize> = VecDeque::new();
        let mut queued: HashSet<usize> = HashSet::new();

        while let Some(task) = stack.pop() {
            let mut untracked: Vec<usize> = graph.parents(task).iter().copied().filter(|p| !queued.contains(p)).collect();
            if untracked.is_empty() {
                queue.push_back(task);
                queued.insert(task);
            } else {
                untracked.sort_by(|&a, &b| aest[a].total_cmp(&aest[b]));
                stack.push(task);
                for p in untracked {
                    stack.push(p);
                }
            }
        }

        queue.into_iter().collect()
    }
}

impl Default for HcptScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl StaticScheduler for HcptScheduler {
    fn get_schedule(&self, graph: &TaskGraph, platform: &PlatformModel) -> Result<(Schedule, Option<f64>)> {
        let mut state = SchedulerState::new(platform.host_count(), graph.len());
        let (aest, alst) = aest_alst(graph, platform);
        let order = Self::guided_order(graph, &aest, &alst);

        let mut scheduled = HashSet::new();
        for task in order {
            if !scheduled.insert(task) {
                continue;
            }
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
        log::info!("HCPT expected makespan: {:.6}", expected_makespan);
        Ok((schedule, Some(expected_makespan)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{Platform, SharingPolicy};
    use crate::task::{Task, TaskKind};

    #[test]
    fn guided_order_respects_precedence() {
        let tasks = vec![
            Task::new("root", TaskKind::Computation, 0.),
            Task::new("A", TaskKind::Computation, 1e9),
            Task::new("B", TaskKind::Computation, 1e9),
            Task::new("C", TaskKind::Computation, 1e9),
            Task::new("end", TaskKind::Computation, 0.),
        ];
        let edges = vec![(0, 1, 0.), (1, 2, 0.), (0, 3, 0.), (2, 4, 0.), (3, 4, 0.)];
        let graph = TaskGraph::from_tasks_and_edges(tasks, edges).unwrap();

        let mut platform = Platform::new();
        platform.add_host("h0", 1e9);
        platform.add_host("h1", 1e9);
        let lo = platform.add_link("lo", f64::INFINITY, 0., SharingPolicy::FatPipe);
        for h in 0..2 {
            platform.add_route(h, h, vec![lo], false);
        }
        platform.add_route(0, 1, vec![lo], true);
        let model = PlatformModel::new(&platform);

        let (aest, alst) = aest_alst(&graph, &model);
        let order = HcptScheduler::guided_order(&graph, &aest, &alst);
        assert_eq!(order.len(), graph.len());

        let position: Vec<usize> = {
            let mut p = vec![0; graph.len()];
            for (i, &t) in order.iter().enumerate() {
                p[t] = i;
            }
            p
        };
        for task in 0..graph.len() {
            for &parent in graph.parents(task) {
                assert!(position[parent] < position[task]);
            }
        }
    }

    #[test]
    fn produces_a_complete_valid_schedule() {
        let tasks = vec![
            Task::new("root", TaskKind::Computation, 0.),
            Task::new("A", TaskKind::Computation, 2e9),
            Task::new("B", TaskKind::Computation, 1e9),
            Task::new("end", TaskKind::Computation, 0.),
        ];
        let edges = vec![(0, 1, 1e6), (0, 2, 1e6), (1, 3, 0.), (2, 3, 0.)];
        let graph = TaskGraph::from_tasks_and_edges(tasks, edges).unwrap();

        let mut platform = Platform::new();
        platform.add_host("h0", 1e9);
        platform.add_host("h1", 1e9);
        let lo = platform.add_link("lo", f64::INFINITY, 0., SharingPolicy::FatPipe);
        let link = platform.add_link("link", 1e7, 0., SharingPolicy::Shared);
        for h in 0..2 {
            platform.add_route(h, h, vec![lo], false);
        }
        platform.add_route(0, 1, vec![link], true);
        let model = PlatformModel::new(&platform);

        let (schedule, makespan) = HcptScheduler::new().get_schedule(&graph, &model).unwrap();
        assert!(makespan.is_some());
        let total: usize = schedule.values().map(|v| v.len()).sum();
        assert_eq!(total, graph.len());
    }
}
