//! Random and round-robin placement.
//!
//! Deliberately naive baselines: every other algorithm in this crate exists to beat them.
//! Boundary tasks are routed to `master` the same way every other static algorithm here does,
//! for consistency.

use rand::Rng;
use rand_pcg::Pcg64;

use crate::error::Result;
use crate::graph::TaskGraph;
use crate::platform::PlatformModel;
use crate::scheduler::{validate_schedule, Schedule, StaticScheduler};
use crate::schedulers::common::try_schedule_boundary_task;
use crate::state::SchedulerState;

/// Assigns each task to a uniformly random non-master host, seeded for reproducibility.
pub struct RandomScheduler {
    seed: u64,
}

impl RandomScheduler {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }
}

impl StaticScheduler for RandomScheduler {
    fn get_schedule(&self, graph: &TaskGraph, platform: &PlatformModel) -> Result<(Schedule, Option<f64>)> {
        let mut state = SchedulerState::new(platform.host_count(), graph.len());
        let mut rng = Pcg64::new(self.seed as u128, 0xa02bdbf7bb3c0a7ac28fa16a64abf96);
        let candidates: Vec<usize> = (0..platform.host_count()).filter(|&h| Some(h) != platform.master_host()).collect();

        for task in graph.topological_order() {
            if try_schedule_boundary_task(task, graph, platform, &mut state)? {
                continue;
            }
            let host = candidates[rng.gen_range(0..candidates.len())];
            let est = platform.est(host, task, graph, &state)?;
            let eet = platform.eet(graph.task(task).amount, host);
            let (pos, start, finish) = state.timetable(host).find_slot(est, eet);
            state.update(task, host, pos, start, finish);
        }

        let schedule = crate::schedulers::heft::state_to_schedule(&state, platform.host_count());
        validate_schedule(&schedule, graph)?;
        Ok((schedule, Some(state.max_time()?)))
    }
}

/// Assigns tasks to non-master hosts in round-robin order, following the workflow's topological
/// order.
pub struct RoundRobinScheduler;

impl RoundRobinScheduler {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RoundRobinScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl StaticScheduler for RoundRobinScheduler {
    fn get_schedule(&self, graph: &TaskGraph, platform: &PlatformModel) -> Result<(Schedule, Option<f64>)> {
        let mut state = SchedulerState::new(platform.host_count(), graph.len());
        let candidates: Vec<usize> = (0..platform.host_count()).filter(|&h| Some(h) != platform.master_host()).collect();
        if candidates.is_empty() {
            return Err(crate::error::SchedKernelError::ConfigurationError(
                "round-robin scheduling requires at least one non-master host".to_string(),
            ));
        }

        let mut next = 0usize;
        for task in graph.topological_order() {
            if try_schedule_boundary_task(task, graph, platform, &mut state)? {
                continue;
            }
            let host = candidates[next % candidates.len()];
            next += 1;
            let est = platform.est(host, task, graph, &state)?;
            let eet = platform.eet(graph.task(task).amount, host);
            let (pos, start, finish) = state.timetable(host).find_slot(est, eet);
            state.update(task, host, pos, start, finish);
        }

        let schedule = crate::schedulers::heft::state_to_schedule(&state, platform.host_count());
        validate_schedule(&schedule, graph)?;
        Ok((schedule, Some(state.max_time()?)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{Platform, SharingPolicy};
    use crate::task::{Task, TaskKind};

    fn platform_fixture(n: usize) -> PlatformModel {
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

    fn chain(n: usize) -> TaskGraph {
        let tasks: Vec<Task> = (0..n).map(|i| Task::new(&format!("T{i}"), TaskKind::Computation, 1e9)).collect();
        let edges: Vec<(usize, usize, f64)> = (0..n - 1).map(|i| (i, i + 1, 0.)).collect();
        TaskGraph::from_tasks_and_edges(tasks, edges).unwrap()
    }

    #[test]
    fn random_is_deterministic_for_a_fixed_seed() {
        let graph = chain(4);
        let platform = platform_fixture(3);
        let (s1, _) = RandomScheduler::new(42).get_schedule(&graph, &platform).unwrap();
        let (s2, _) = RandomScheduler::new(42).get_schedule(&graph, &platform).unwrap();
        assert_eq!(s1, s2);
    }

    #[test]
    fn round_robin_cycles_through_hosts() {
        let graph = chain(6);
        let platform = platform_fixture(3);
        let (schedule, _) = RoundRobinScheduler::new().get_schedule(&graph, &platform).unwrap();
        assert_eq!(schedule.len(), 3);
        for tasks in schedule.values() {
            assert_eq!(tasks.len(), 2);
        }
    }
}
