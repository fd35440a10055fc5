//! Heterogeneous Earliest Finish Time (HEFT).
//!
//! 1. Order tasks by descending `ranku` (ties broken by task name).
//! 2. For each task, evaluate every host's gap-aware insertion and pick the one minimizing
//!    finish time, tie-broken `(finish, host.speed, host.name)`.

use crate::analyzer::ranku;
use crate::error::Result;
use crate::graph::TaskGraph;
use crate::platform::PlatformModel;
use crate::scheduler::{validate_schedule, Schedule, StaticScheduler};
use crate::schedulers::common::{try_schedule_boundary_task, HostKey, MinSelector};
use crate::state::SchedulerState;

pub struct HeftScheduler;

impl HeftScheduler {
    pub fn new() -> Self {
        Self
    }

    /// Orders tasks by descending ranku; ties broken by name for determinism.
    pub fn order(graph: &TaskGraph, platform: &PlatformModel) -> Vec<usize> {
        let ranks = ranku(graph, platform);
        let mut tasks: Vec<usize> = (0..graph.len()).collect();
        tasks.sort_by(|&a, &b| ranks[b].total_cmp(&ranks[a]).then(graph.task(a).name.cmp(&graph.task(b).name)));
        tasks
    }

    /// Runs the HEFT placement loop against `ordered_tasks`, mutating `state` in place.
    ///
    /// Exposed separately from [`StaticScheduler::get_schedule`] so that Lookahead can drive a
    /// HEFT schedule of the *remaining* tasks on a state copy.
    pub fn schedule_ordered(
        graph: &TaskGraph,
        platform: &PlatformModel,
        state: &mut SchedulerState,
        ordered_tasks: &[usize],
    ) -> Result<()> {
        for &task in ordered_tasks {
            if try_schedule_boundary_task(task, graph, platform, state)? {
                continue;
            }
            let mut best = MinSelector::new();
            for host in 0..platform.host_count() {
                if Some(host) == platform.master_host() {
                    continue;
                }
                let est = platform.est(host, task, graph, state)?;
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
        Ok(())
    }
}

impl Default for HeftScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl StaticScheduler for HeftScheduler {
    fn get_schedule(&self, graph: &TaskGraph, platform: &PlatformModel) -> Result<(Schedule, Option<f64>)> {
        let mut state = SchedulerState::new(platform.host_count(), graph.len());
        let ordered = Self::order(graph, platform);
        Self::schedule_ordered(graph, platform, &mut state, &ordered)?;

        let schedule = state_to_schedule(&state, platform.host_count());
        validate_schedule(&schedule, graph)?;
        let expected_makespan = state.max_time()?;
        log::info!("HEFT expected makespan: {:.6}", expected_makespan);
        Ok((schedule, Some(expected_makespan)))
    }

    fn publishes_ect(&self) -> bool {
        true
    }
}

/// Reconstructs a `host -> [task, ...]` [`Schedule`] (in intended execution order) from a fully
/// placed [`SchedulerState`].
pub fn state_to_schedule(state: &SchedulerState, host_count: usize) -> Schedule {
    let mut schedule = Schedule::new();
    for host in 0..host_count {
        let tasks: Vec<usize> = state.timetable(host).iter().map(|slot| slot.task).collect();
        if !tasks.is_empty() {
            schedule.insert(host, tasks);
        }
    }
    schedule
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{Platform, SharingPolicy};
    use crate::task::{Task, TaskKind};

    fn two_host_platform(speed0: f64, speed1: f64, bandwidth: f64) -> PlatformModel {
        let mut platform = Platform::new();
        platform.add_host("h0", speed0);
        platform.add_host("h1", speed1);
        let lo = platform.add_link("lo", f64::INFINITY, 0., SharingPolicy::FatPipe);
        let link = platform.add_link("link", bandwidth, 0., SharingPolicy::Shared);
        platform.add_route(0, 0, vec![lo], false);
        platform.add_route(1, 1, vec![lo], false);
        platform.add_route(0, 1, vec![link], true);
        PlatformModel::new(&platform)
    }

    #[test]
    fn diamond_places_siblings_on_different_hosts() {
        let tasks = vec![
            Task::new("root", TaskKind::Computation, 0.),
            Task::new("A", TaskKind::Computation, 1e9),
            Task::new("B", TaskKind::Computation, 1e9),
            Task::new("end", TaskKind::Computation, 0.),
        ];
        let edges = vec![(0, 1, 0.), (0, 2, 0.), (1, 3, 0.), (2, 3, 0.)];
        let graph = TaskGraph::from_tasks_and_edges(tasks, edges).unwrap();
        let platform = two_host_platform(1e9, 1e9, 1e6);

        let (schedule, makespan) = HeftScheduler::new().get_schedule(&graph, &platform).unwrap();
        assert!((makespan.unwrap() - 1.0).abs() < 1e-6);
        let hosts_used: std::collections::HashSet<_> = schedule
            .iter()
            .filter(|(_, tasks)| tasks.iter().any(|&t| t == 1 || t == 2))
            .map(|(&h, _)| h)
            .collect();
        assert_eq!(hosts_used.len(), 2);
    }

    #[test]
    fn prefers_the_faster_host() {
        let tasks = vec![Task::new("only", TaskKind::Computation, 10e9)];
        let graph = TaskGraph::from_tasks_and_edges(tasks, vec![]).unwrap();
        let platform = two_host_platform(1e9, 10e9, 1e6);

        let (schedule, makespan) = HeftScheduler::new().get_schedule(&graph, &platform).unwrap();
        assert!((makespan.unwrap() - 1.0).abs() < 1e-6);
        assert!(schedule.contains_key(&1));
    }

    #[test]
    fn communication_dominated_chain_colocates_tasks() {
        let tasks = vec![
            Task::new("T1", TaskKind::Computation, 1e9),
            Task::new("T2", TaskKind::Computation, 1e9),
        ];
        let edges = vec![(0, 1, 10e6)];
        let graph = TaskGraph::from_tasks_and_edges(tasks, edges).unwrap();
        let platform = two_host_platform(1e9, 1e9, 1e6);

        let (schedule, makespan) = HeftScheduler::new().get_schedule(&graph, &platform).unwrap();
        assert!((makespan.unwrap() - 2.0).abs() < 1e-6);
        let host_with_both = schedule.values().find(|tasks| tasks.len() == 2);
        assert!(host_with_both.is_some());
    }
}
