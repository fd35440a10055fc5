//! Dynamic Level Scheduling (DLS).
//!
//! At every step, picks the `(task, host)` pair maximizing the Dynamic Level
//!
//! ```text
//! DL(task, host) = SL(task) + (AEC(task) - EET(task, host)) - start(task, host)
//! ```
//!
//! where `SL` is the static level (critical-path weight to the sink, mean-speed units), `AEC`
//! is the mean-speed execution cost, and `start` is the gap-aware insertion point on `host`'s
//! timesheet. Only tasks with no undone parents ("ready") and non-master hosts are candidates.
//! The original tracks readiness with a sentinel "unreal DL"; here that's a plain `Option<f64>`.

use crate::analyzer::{aec, static_level};
use crate::error::Result;
use crate::graph::TaskGraph;
use crate::platform::PlatformModel;
use crate::scheduler::{validate_schedule, Schedule, StaticScheduler};
use crate::schedulers::common::try_schedule_boundary_task;
use crate::schedulers::heft::state_to_schedule;
use crate::state::SchedulerState;

pub struct DlsScheduler;

impl DlsScheduler {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DlsScheduler {
    fn default() -> Self {
        Self::new()
    }
}

fn dynamic_level(
    graph: &TaskGraph,
    platform: &PlatformModel,
    state: &SchedulerState,
    sl: &[f64],
    aec: &[f64],
    task: usize,
    host: usize,
) -> Result<f64> {
    let est = platform.est(host, task, graph, state)?;
    let eet = platform.eet(graph.task(task).amount, host);
    let (_, start, _) = state.timetable(host).find_slot(est, eet);
    Ok(sl[task] + (aec[task] - eet) - start)
}

impl StaticScheduler for DlsScheduler {
    fn get_schedule(&self, graph: &TaskGraph, platform: &PlatformModel) -> Result<(Schedule, Option<f64>)> {
        let mut state = SchedulerState::new(platform.host_count(), graph.len());
        let n = graph.len();
        let aec_vals = aec(graph, platform);
        let sl_vals = static_level(graph, platform);
        let exec_hosts: Vec<usize> = (0..platform.host_count()).filter(|&h| Some(h) != platform.master_host()).collect();

        let mut undone_parents: Vec<usize> = (0..n).map(|t| graph.parents(t).len()).collect();
        let mut ready = vec![false; n];
        let mut scheduled = vec![false; n];
        let mut dl: Vec<Vec<Option<f64>>> = vec![vec![None; n]; platform.host_count()];

        for t in 0..n {
            if undone_parents[t] == 0 {
                ready[t] = true;
                for &host in &exec_hosts {
                    dl[host][t] = Some(sl_vals[t] + (aec_vals[t] - platform.eet(graph.task(t).amount, host)));
                }
            }
        }

        for _ in 0..n {
            let mut best: Option<(f64, usize, usize)> = None;
            for &host in &exec_hosts {
                for t in 0..n {
                    if !ready[t] || scheduled[t] {
                        continue;
                    }
                    if let Some(v) = dl[host][t] {
                        match best {
                            None => best = Some((v, host, t)),
                            Some((bv, _, _)) if v > bv => best = Some((v, host, t)),
                            _ => {}
                        }
                    }
                }
            }
            let (_, host_sel, task_sel) = best.expect("the ready set is never empty mid-schedule");

            if !try_schedule_boundary_task(task_sel, graph, platform, &mut state)? {
                let est = platform.est(host_sel, task_sel, graph, &state)?;
                let eet = platform.eet(graph.task(task_sel).amount, host_sel);
                let (pos, start, finish) = state.timetable(host_sel).find_slot(est, eet);
                state.update(task_sel, host_sel, pos, start, finish);
            }
            scheduled[task_sel] = true;
            ready[task_sel] = false;
            for host in 0..platform.host_count() {
                dl[host][task_sel] = None;
            }

            let mut newly_ready = Vec::new();
            for edge in graph.children(task_sel) {
                undone_parents[edge.to] -= 1;
                if undone_parents[edge.to] == 0 {
                    newly_ready.push(edge.to);
                }
            }
            for &child in &newly_ready {
                ready[child] = true;
                for &host in &exec_hosts {
                    dl[host][child] = Some(dynamic_level(graph, platform, &state, &sl_vals, &aec_vals, child, host)?);
                }
            }

            for t in 0..n {
                if ready[t] && !scheduled[t] {
                    dl[host_sel][t] = Some(dynamic_level(graph, platform, &state, &sl_vals, &aec_vals, t, host_sel)?);
                }
            }
        }

        let schedule = state_to_schedule(&state, platform.host_count());
        validate_schedule(&schedule, graph)?;
        let expected_makespan = state.max_time()?;
        log::info!("DLS expected makespan: {:.6}", expected_makespan);
        Ok((schedule, Some(expected_makespan)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{Platform, SharingPolicy};
    use crate::task::{Task, TaskKind};

    #[test]
    fn heterogeneous_preference_sends_heavy_task_to_fast_host() {
        let tasks = vec![
            Task::new("root", TaskKind::Computation, 0.),
            Task::new("light", TaskKind::Computation, 1e8),
            Task::new("heavy", TaskKind::Computation, 1e10),
            Task::new("end", TaskKind::Computation, 0.),
        ];
        let edges = vec![(0, 1, 0.), (0, 2, 0.), (1, 3, 0.), (2, 3, 0.)];
        let graph = TaskGraph::from_tasks_and_edges(tasks, edges).unwrap();

        let mut platform = Platform::new();
        platform.add_host("slow", 1e9);
        platform.add_host("fast", 1e10);
        let lo = platform.add_link("lo", f64::INFINITY, 0., SharingPolicy::FatPipe);
        for h in 0..2 {
            platform.add_route(h, h, vec![lo], false);
        }
        platform.add_route(0, 1, vec![lo], true);
        let model = PlatformModel::new(&platform);

        let (schedule, _) = DlsScheduler::new().get_schedule(&graph, &model).unwrap();
        let heavy_host = schedule.iter().find(|(_, tasks)| tasks.contains(&2)).map(|(&h, _)| h).unwrap();
        assert_eq!(heavy_host, 1);
    }
}
