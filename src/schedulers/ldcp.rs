//! Longest Dynamic Critical Path (LDCP).
//!
//! The most stateful algorithm here: one `HostDagCopy` per non-master host, each tracking
//! a per-host task `size`, progressively zeroed same-host communication costs, and temporary
//! same-host ordering edges. At every step a "last identified task" / "last used host" pair picks
//! a key node via the Upward-Rank-Associated-Successor (URAS), walks up to the nearest schedulable
//! ancestor if the key node isn't ready yet, places it, and rewrites every per-host DAG copy to
//! reflect that placement before recomputing URank for already-scheduled tasks only.

use std::collections::{HashSet, VecDeque};

use crate::analyzer::{ldcp_urank, HostDagCopy};
use crate::error::Result;
use crate::graph::TaskGraph;
use crate::platform::PlatformModel;
use crate::scheduler::{validate_schedule, Schedule, StaticScheduler};
use crate::schedulers::common::{try_schedule_boundary_task, HostKey, MinSelector};
use crate::schedulers::heft::state_to_schedule;
use crate::state::SchedulerState;

pub struct LdcpScheduler;

impl LdcpScheduler {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LdcpScheduler {
    fn default() -> Self {
        Self::new()
    }
}

/// BFS over `dagp`'s (possibly rewritten) parent edges from `node`, yielding ancestors matching
/// `condition`; an ancestor that fails `condition` is marked visited but not traversed further,
/// mirroring `ldcp.py::get_node_predecessors`.
fn node_predecessors(dagp: &HostDagCopy, node: usize, condition: impl Fn(usize) -> bool) -> Vec<usize> {
    let mut visited: HashSet<usize> = HashSet::new();
    let mut queue: VecDeque<usize> = VecDeque::new();
    queue.push_back(node);
    let mut result = Vec::new();
    while let Some(v) = queue.pop_front() {
        for &p in &dagp.parents[v] {
            if !visited.contains(&p) {
                if condition(p) {
                    result.push(p);
                    queue.push_back(p);
                }
                visited.insert(p);
            }
        }
    }
    result
}

/// Unscheduled ancestors of `node` in `dagp` that are themselves schedulable right now.
fn schedulable_predecessors(dagp: &HostDagCopy, node: usize, unscheduled: &HashSet<usize>, schedulable: &HashSet<usize>) -> Vec<usize> {
    node_predecessors(dagp, node, |p| unscheduled.contains(&p))
        .into_iter()
        .filter(|p| schedulable.contains(p))
        .collect()
}

/// URAS: the child of `task` in `dagp` maximising `edge_cost + urank[child]`, restricted to
/// `scope` (e.g. only-unscheduled children). `None` if no child in scope.
fn uras_with_term(
    dagp: &HostDagCopy,
    task: usize,
    urank: &[f64],
    mean_bandwidth: f64,
    graph: &TaskGraph,
    scope: &HashSet<usize>,
) -> Option<(usize, f64)> {
    dagp.children[task]
        .iter()
        .filter(|&&(child, _)| scope.contains(&child))
        .map(|&(child, weight)| (child, weight / mean_bandwidth + urank[child]))
        .max_by(|&(ca, va), &(cb, vb)| va.total_cmp(&vb).then(graph.task(ca).name.cmp(&graph.task(cb).name)))
}

/// Host (among `non_master_hosts`) maximising `urank[host][node]`.
fn host_max_urank(non_master_hosts: &[usize], urank: &[Vec<f64>], node: usize, platform: &PlatformModel) -> usize {
    *non_master_hosts
        .iter()
        .max_by(|&&a, &&b| {
            urank[a][node]
                .total_cmp(&urank[b][node])
                .then(platform.speed(a).total_cmp(&platform.speed(b)))
                .then(a.cmp(&b))
        })
        .expect("platform has at least one non-master host")
}

impl StaticScheduler for LdcpScheduler {
    fn get_schedule(&self, graph: &TaskGraph, platform: &PlatformModel) -> Result<(Schedule, Option<f64>)> {
        let n = graph.len();
        let host_count = platform.host_count();
        let non_master_hosts: Vec<usize> = (0..host_count).filter(|&h| Some(h) != platform.master_host()).collect();

        let mut state = SchedulerState::new(host_count, n);

        let mut dagp: Vec<Option<HostDagCopy>> = (0..host_count)
            .map(|h| (Some(h) != platform.master_host()).then(|| HostDagCopy::new(graph, h, platform)))
            .collect();
        let mut urank: Vec<Vec<f64>> = vec![vec![0.0; n]; host_count];
        let all_tasks: HashSet<usize> = (0..n).collect();
        for &h in &non_master_hosts {
            ldcp_urank(dagp[h].as_ref().unwrap(), platform.mean_bandwidth, &all_tasks.iter().copied().collect::<Vec<_>>(), &mut urank[h]);
        }

        let mut temporary_edges: Vec<Vec<(usize, usize)>> = vec![Vec::new(); host_count];
        let mut undone_parents: Vec<usize> = (0..n).map(|t| graph.parents(t).len()).collect();
        let mut schedulable: HashSet<usize> = (0..n).filter(|&t| undone_parents[t] == 0).collect();
        let mut unscheduled: HashSet<usize> = (0..n).collect();

        let mut last_identified_task: Option<usize> = None;
        let mut last_used_host: Option<usize> = None;

        for _ in 0..n {
            let task_to_schedule = match last_identified_task {
                None => {
                    let top = graph.root();
                    last_used_host = Some(host_max_urank(&non_master_hosts, &urank, top, platform));
                    last_identified_task = Some(top);
                    top
                }
                Some(identified) => {
                    let host = last_used_host.expect("last_used_host set alongside last_identified_task");
                    let dagp_host = dagp[host].as_ref().expect("non-master host has a DAG copy");
                    let only_unscheduled: HashSet<usize> = unscheduled.clone();
                    let key_node = uras_with_term(dagp_host, identified, &urank[host], platform.mean_bandwidth, graph, &only_unscheduled)
                        .map(|(child, _)| child);

                    match key_node {
                        Some(key_node) => {
                            let key_host = host_max_urank(&non_master_hosts, &urank, key_node, platform);
                            last_used_host = Some(key_host);
                            if schedulable.contains(&key_node) {
                                last_identified_task = Some(key_node);
                                key_node
                            } else {
                                let dagp_key_host = dagp[key_host].as_ref().expect("non-master host has a DAG copy");
                                let mut candidates = schedulable_predecessors(dagp_key_host, key_node, &unscheduled, &schedulable);
                                candidates.sort_by(|&a, &b| {
                                    urank[key_host][a].total_cmp(&urank[key_host][b]).then(graph.task(b).name.cmp(&graph.task(a).name))
                                });
                                candidates
                                    .pop()
                                    .expect("a key node blocked by unscheduled parents has a schedulable ancestor")
                            }
                        }
                        // No unscheduled child reachable from the last identified task: fall back
                        // to the globally highest-urank schedulable task on the last used host, to
                        // guarantee forward progress.
                        None => {
                            let mut candidates: Vec<usize> = schedulable.iter().copied().collect();
                            candidates.sort_by(|&a, &b| {
                                urank[host][a].total_cmp(&urank[host][b]).then(graph.task(b).name.cmp(&graph.task(a).name))
                            });
                            let picked = candidates.pop().expect("schedulable set is non-empty mid-schedule");
                            last_identified_task = Some(picked);
                            picked
                        }
                    }
                }
            };

            schedulable.remove(&task_to_schedule);
            for edge in graph.children(task_to_schedule) {
                undone_parents[edge.to] -= 1;
                if undone_parents[edge.to] == 0 {
                    schedulable.insert(edge.to);
                }
            }
            unscheduled.remove(&task_to_schedule);

            if try_schedule_boundary_task(task_to_schedule, graph, platform, &mut state)? {
                continue;
            }

            // select_host_to_schedule: canonical EST/EET, gap-aware insertion, min (finish, host.speed, host.name).
            let mut best = MinSelector::new();
            for &host in &non_master_hosts {
                let est = platform.est(host, task_to_schedule, graph, &state)?;
                let eet = platform.eet(graph.task(task_to_schedule).amount, host);
                let (pos, start, finish) = state.timetable(host).find_slot(est, eet);
                let key = HostKey {
                    primary: finish,
                    speed: platform.speed(host),
                    name: platform.host_name(host),
                };
                best.update(key, (host, pos, start, finish));
            }
            let (host_to_schedule, pos, start, finish) =
                best.into_value().expect("platform has at least one non-master host");
            state.update(task_to_schedule, host_to_schedule, pos, start, finish);

            // update_size_wrt_selected_task
            let chosen_size = dagp[host_to_schedule].as_ref().unwrap().size[task_to_schedule];
            for &h in &non_master_hosts {
                dagp[h].as_mut().unwrap().size[task_to_schedule] = chosen_size;
            }

            // update_communications_costs: zero same-host parent edges in every DAG copy.
            let tasks_on_selected_host: HashSet<usize> = state.timetable(host_to_schedule).iter().map(|s| s.task).collect();
            let same_host_parents: Vec<usize> = graph
                .parents(task_to_schedule)
                .iter()
                .copied()
                .filter(|p| tasks_on_selected_host.contains(p))
                .collect();
            for &h in &non_master_hosts {
                let copy = dagp[h].as_mut().unwrap();
                for &p in &same_host_parents {
                    for edge in copy.children[p].iter_mut() {
                        if edge.0 == task_to_schedule {
                            edge.1 = 0.;
                        }
                    }
                }
            }

            // update_execution_constraints: splice the placed task into the host's ordering chain.
            let tasks_list: Vec<usize> = state.timetable(host_to_schedule).iter().map(|s| s.task).collect();
            let idx = tasks_list
                .iter()
                .position(|&t| t == task_to_schedule)
                .expect("task was just inserted into this host's timetable");
            let predecessor = (idx > 0).then(|| tasks_list[idx - 1]);
            let successor = (idx + 1 < tasks_list.len()).then(|| tasks_list[idx + 1]);
            for &h in &non_master_hosts {
                let copy = dagp[h].as_mut().unwrap();
                if let (Some(p), Some(s)) = (predecessor, successor) {
                    copy.remove_edge(p, s);
                }
                if let Some(p) = predecessor {
                    debug_assert!(!copy.creates_cycle(p, task_to_schedule), "LDCP ordering edge would introduce a cycle");
                    copy.add_edge(p, task_to_schedule, 0.);
                }
                if let Some(s) = successor {
                    debug_assert!(!copy.creates_cycle(task_to_schedule, s), "LDCP ordering edge would introduce a cycle");
                    copy.add_edge(task_to_schedule, s, 0.);
                }
            }

            // update_zero_cost_edges_on_dagp_wrt_selected_host: refresh temp edges from the last
            // scheduled task on this host to the schedulable frontier, host-local only.
            for (from, to) in temporary_edges[host_to_schedule].drain(..) {
                dagp[host_to_schedule].as_mut().unwrap().remove_edge(from, to);
            }
            let last_scheduled_task = state
                .timetable(host_to_schedule)
                .iter()
                .last()
                .map(|s| s.task)
                .expect("host just received a task");
            let successors_in_dagp: HashSet<usize> =
                dagp[host_to_schedule].as_ref().unwrap().children[last_scheduled_task].iter().map(|&(c, _)| c).collect();
            for &task in &schedulable {
                if !successors_in_dagp.contains(&task) {
                    let copy = dagp[host_to_schedule].as_mut().unwrap();
                    debug_assert!(!copy.creates_cycle(last_scheduled_task, task), "LDCP temporary edge would introduce a cycle");
                    copy.add_edge(last_scheduled_task, task, 0.);
                    temporary_edges[host_to_schedule].push((last_scheduled_task, task));
                }
            }

            // update_urank: recompute only for already-scheduled tasks, using each host's
            // rewritten DAG copy.
            let scheduled_scope: Vec<usize> = (0..n).filter(|t| !unscheduled.contains(t)).collect();
            for &h in &non_master_hosts {
                ldcp_urank(dagp[h].as_ref().unwrap(), platform.mean_bandwidth, &scheduled_scope, &mut urank[h]);
            }
        }

        let schedule = state_to_schedule(&state, host_count);
        validate_schedule(&schedule, graph)?;
        let expected_makespan = state.max_time()?;
        log::info!("LDCP expected makespan: {:.6}", expected_makespan);
        Ok((schedule, Some(expected_makespan)))
    }
}
