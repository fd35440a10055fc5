//! Predicted Earliest Finish Time (PEFT).
//!
//! Precomputes the Optimistic Cost Table ([`crate::analyzer::oct`]) once, ranks tasks by
//! mean-across-hosts OCT in a schedulable order, and places each ready task on the host
//! minimizing `finish + OCT[task][host]` (tie-broken `(host.speed, host.name)`).

use crate::analyzer::oct;
use crate::error::Result;
use crate::graph::TaskGraph;
use crate::platform::PlatformModel;
use crate::scheduler::{validate_schedule, Schedule, StaticScheduler};
use crate::schedulers::common::{try_schedule_boundary_task, HostKey, MinSelector};
use crate::schedulers::heft::state_to_schedule;
use crate::state::SchedulerState;

pub struct PeftScheduler;

impl PeftScheduler {
    pub fn new() -> Self {
        Self
    }

    /// A ready-frontier order driven by descending mean-OCT rank: at each step, the highest
    /// ranked task whose parents are all already ordered is emitted next.
    fn schedulable_order(graph: &TaskGraph, rank: &[f64]) -> Vec<usize> {
        let n = graph.len();
        let mut undone_parents: Vec<usize> = (0..n).map(|t| graph.parents(t).len()).collect();
        let mut emitted = vec![false; n];
        let mut order = Vec::with_capacity(n);

        for _ in 0..n {
            let next = (0..n)
                .filter(|&t| !emitted[t] && undone_parents[t] == 0)
                .max_by(|&a, &b| rank[a].total_cmp(&rank[b]).then(graph.task(b).name.cmp(&graph.task(a).name)))
                .expect("the ready set is never empty mid-schedule");
            emitted[next] = true;
            order.push(next);
            for edge in graph.children(next) {
                undone_parents[edge.to] -= 1;
            }
        }
        order
    }
}

impl Default for PeftScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl StaticScheduler for PeftScheduler {
    fn get_schedule(&self, graph: &TaskGraph, platform: &PlatformModel) -> Result<(Schedule, Option<f64>)> {
        let mut state = SchedulerState::new(platform.host_count(), graph.len());
        let (oct_table, rank) = oct(graph, platform);
        let ordered = Self::schedulable_order(graph, &rank);

        for task in ordered {
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
                    primary: finish + oct_table[task][host],
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
        log::info!("PEFT expected makespan: {:.6}", expected_makespan);
        Ok((schedule, Some(expected_makespan)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{Platform, SharingPolicy};
    use crate::task::{Task, TaskKind};

    #[test]
    fn produces_a_complete_schedule_respecting_precedence() {
        let tasks = vec![
            Task::new("root", TaskKind::Computation, 0.),
            Task::new("A", TaskKind::Computation, 2e9),
            Task::new("B", TaskKind::Computation, 1e9),
            Task::new("C", TaskKind::Computation, 1e9),
            Task::new("end", TaskKind::Computation, 0.),
        ];
        let edges = vec![(0, 1, 1e6), (0, 2, 1e6), (1, 3, 1e6), (2, 3, 1e6), (3, 4, 0.)];
        let graph = TaskGraph::from_tasks_and_edges(tasks, edges).unwrap();

        let mut platform = Platform::new();
        platform.add_host("h0", 1e9);
        platform.add_host("h1", 2e9);
        let lo = platform.add_link("lo", f64::INFINITY, 0., SharingPolicy::FatPipe);
        let link = platform.add_link("link", 1e7, 0., SharingPolicy::Shared);
        for h in 0..2 {
            platform.add_route(h, h, vec![lo], false);
        }
        platform.add_route(0, 1, vec![link], true);
        let model = PlatformModel::new(&platform);

        let (schedule, makespan) = PeftScheduler::new().get_schedule(&graph, &model).unwrap();
        assert!(makespan.is_some());
        let total: usize = schedule.values().map(|v| v.len()).sum();
        assert_eq!(total, graph.len());
    }
}
