//! DispatchDriver: static schedule -> assignment event stream.
//!
//! [`DispatchMode::FreeHost`] is the simplest policy (watch comm-task completions, hand the
//! next queued task to a host the moment it frees up) under an implicit `SEQUENTIAL`/`EAGER`
//! ordering (computation tasks on a host are strictly queued, one at a time). `DispatchMode::
//! {Immediate, ParentsDone, ImmediateOverlap}` and `DataTransferMode::{Lazy, Prefetch, Queue,
//! QueueEct, Parents, LazyParents}` generalize both axes — when the assignment becomes visible
//! to the simulator, and when each inbound data transfer becomes schedulable (see DESIGN.md for
//! the interpretation taken for each).

use std::collections::{HashMap, VecDeque};

use crate::config::{DataTransferMode, DispatchMode, SchedulerConfig, TaskExecutionMode};
use crate::error::{Result, SchedKernelError};
use crate::graph::TaskGraph;
use crate::scheduler::{check_all_done, Schedule};
use crate::simulator::SimulatorAdapter;
use crate::task::TaskState;

/// A synthetic communication-task vertex, one per folded edge of the [`TaskGraph`], numbered
/// past every computation task id so it can share the same `usize` task-id space used by
/// [`SimulatorAdapter`].
#[derive(Clone, Copy, Debug)]
pub struct CommEdge {
    pub id: usize,
    pub from: usize,
    pub to: usize,
    pub weight: f64,
}

/// Every comm edge of `graph`, ids starting right after the last computation task id, in a
/// stable `(from, insertion order)` traversal.
pub fn comm_edges(graph: &TaskGraph) -> Vec<CommEdge> {
    let mut edges = Vec::new();
    let mut next_id = graph.len();
    for from in 0..graph.len() {
        for edge in graph.children(from) {
            edges.push(CommEdge {
                id: next_id,
                from,
                to: edge.to,
                weight: edge.weight,
            });
            next_id += 1;
        }
    }
    edges
}

pub struct DispatchDriver {
    config: SchedulerConfig,
}

impl DispatchDriver {
    pub fn new(config: SchedulerConfig) -> Self {
        Self { config }
    }

    /// Drives `simulator` to completion of `schedule`: injects every synthetic precedence
    /// constraint implied by `self.config`, assigns comm-task hosts, runs the post-injection
    /// sanity check, then executes the `dispatch_initial(); loop { simulate() }` cooperative loop
    /// using `self.config.dispatch_mode` as the host-freeing policy.
    ///
    /// `ect`, when `Some`, is the per-task predicted earliest-completion-time published by an
    /// ECT-publishing algorithm (HEFT, Lookahead); required when `DATA_TRANSFER=QUEUE_ECT`.
    pub fn run(
        &self,
        graph: &TaskGraph,
        schedule: &Schedule,
        ect: Option<&[f64]>,
        simulator: &mut dyn SimulatorAdapter,
    ) -> Result<()> {
        self.config.validate_queue_ect(ect.is_some())?;

        let edges = comm_edges(graph);
        self.assign_comm_hosts(&edges, schedule, simulator);
        if self.config.task_execution == TaskExecutionMode::Sequential {
            self.inject_sequential_constraints(graph, schedule, simulator);
            self.inject_data_transfer_constraints(graph, schedule, &edges, ect, simulator);
        }
        self.sanity_check(&edges, schedule, simulator)?;

        for &task in schedule.values().flatten() {
            simulator.watch(task, TaskState::Done);
        }
        for edge in &edges {
            simulator.watch(edge.id, TaskState::Done);
        }

        let mut pending: HashMap<usize, VecDeque<usize>> =
            schedule.iter().map(|(&host, tasks)| (host, tasks.iter().copied().collect())).collect();
        // Only `FreeHost` uses comm completions to pace dispatch; start every host free.
        let mut hosts_status: HashMap<usize, bool> = pending.keys().map(|&h| (h, true)).collect();

        match self.config.dispatch_mode {
            DispatchMode::Immediate | DispatchMode::ImmediateOverlap => {
                // Every assignment becomes visible to the simulator up front; the injected
                // precedence graph (if any, under SEQUENTIAL) paces actual execution.
                for (&host, tasks) in &mut pending {
                    while let Some(task) = tasks.pop_front() {
                        simulator.schedule_task(task, host);
                    }
                }
            }
            DispatchMode::FreeHost => self.dispatch_free_hosts(&mut hosts_status, &mut pending, simulator),
            DispatchMode::ParentsDone => self.dispatch_parents_done(graph, &mut pending, simulator),
        }

        let n = graph.len();
        loop {
            let changed = simulator.simulate();
            if changed.is_empty() {
                break;
            }
            match self.config.dispatch_mode {
                DispatchMode::FreeHost => {
                    self.update_host_status(&mut hosts_status, &changed, n, simulator);
                    self.dispatch_free_hosts(&mut hosts_status, &mut pending, simulator);
                }
                DispatchMode::ParentsDone => self.dispatch_parents_done(graph, &mut pending, simulator),
                DispatchMode::Immediate | DispatchMode::ImmediateOverlap => {}
            }
        }

        check_all_done(&(0..n).map(|t| simulator.task_state(t)).collect::<Vec<_>>(), |t| graph.task(t).name.clone())
    }

    /// A host is free until a comm task using it completes, at which point its next queued
    /// task (if any) is dispatched.
    fn dispatch_free_hosts(
        &self,
        hosts_status: &mut HashMap<usize, bool>,
        pending: &mut HashMap<usize, VecDeque<usize>>,
        simulator: &mut dyn SimulatorAdapter,
    ) {
        for (&host, tasks) in pending.iter_mut() {
            if hosts_status.get(&host).copied().unwrap_or(true) {
                if let Some(task) = tasks.pop_front() {
                    simulator.schedule_task(task, host);
                    hosts_status.insert(host, false);
                }
            }
        }
    }

    /// A comm task reaching `Done` frees every host it used, matching
    /// `StaticScheduler.__update_host_status`.
    fn update_host_status(&self, hosts_status: &mut HashMap<usize, bool>, changed: &[usize], task_count: usize, simulator: &dyn SimulatorAdapter) {
        for &id in changed {
            if id >= task_count && simulator.task_state(id) == TaskState::Done {
                for &host in simulator.task_hosts(id) {
                    hosts_status.insert(host, true);
                }
            }
        }
    }

    /// Extension: dispatch a host's next queued task once every one of its parents in `graph`
    /// has reached `Done`, independent of host-local comm completions.
    fn dispatch_parents_done(&self, graph: &TaskGraph, pending: &mut HashMap<usize, VecDeque<usize>>, simulator: &mut dyn SimulatorAdapter) {
        for (&host, tasks) in pending.iter_mut() {
            while let Some(&task) = tasks.front() {
                let ready = graph.parents(task).iter().all(|&p| simulator.task_state(p) == TaskState::Done);
                if !ready {
                    break;
                }
                tasks.pop_front();
                simulator.schedule_task(task, host);
            }
        }
    }

    fn assign_comm_hosts(&self, edges: &[CommEdge], schedule: &Schedule, simulator: &mut dyn SimulatorAdapter) {
        let host_of = Self::host_lookup(schedule);
        for edge in edges {
            if let (Some(&src), Some(&dst)) = (host_of.get(&edge.from), host_of.get(&edge.to)) {
                simulator.schedule_transfer(edge.id, src, dst);
            }
        }
    }

    fn inject_sequential_constraints(&self, graph: &TaskGraph, schedule: &Schedule, simulator: &mut dyn SimulatorAdapter) {
        for tasks in schedule.values() {
            for pair in tasks.windows(2) {
                let (prev, task) = (pair[0], pair[1]);
                let already_adjacent = graph.children(prev).iter().any(|e| e.to == task);
                if !already_adjacent {
                    simulator.add_dependency(prev, task);
                }
            }
        }
    }

    fn inject_data_transfer_constraints(
        &self,
        graph: &TaskGraph,
        schedule: &Schedule,
        edges: &[CommEdge],
        ect: Option<&[f64]>,
        simulator: &mut dyn SimulatorAdapter,
    ) {
        let position = Self::position_lookup(schedule);
        let comm_by_edge: HashMap<(usize, usize), usize> = edges.iter().map(|e| ((e.from, e.to), e.id)).collect();

        match self.config.data_transfer {
            DataTransferMode::Eager => {}
            DataTransferMode::Lazy => self.inject_lazy(schedule, &comm_by_edge, graph, simulator),
            DataTransferMode::Prefetch => self.inject_prefetch(schedule, &comm_by_edge, graph, simulator),
            DataTransferMode::Parents => self.inject_parents(graph, &comm_by_edge, simulator),
            DataTransferMode::LazyParents => {
                self.inject_lazy(schedule, &comm_by_edge, graph, simulator);
                self.inject_parents(graph, &comm_by_edge, simulator);
            }
            DataTransferMode::Queue => self.inject_queue(schedule, edges, &position, None, simulator),
            DataTransferMode::QueueEct => self.inject_queue(schedule, edges, &position, ect, simulator),
        }
    }

    /// `prev_task -> c` for every parent-edge comm `c` of a host's non-first task.
    fn inject_lazy(
        &self,
        schedule: &Schedule,
        comm_by_edge: &HashMap<(usize, usize), usize>,
        graph: &TaskGraph,
        simulator: &mut dyn SimulatorAdapter,
    ) {
        for tasks in schedule.values() {
            for window in tasks.windows(2) {
                let (prev_task, task) = (window[0], window[1]);
                for &parent in graph.parents(task) {
                    if let Some(&comm) = comm_by_edge.get(&(parent, task)) {
                        simulator.add_dependency(prev_task, comm);
                    }
                }
            }
        }
    }

    /// `prev_comm -> c` and `prev2_task -> c`: the transfer starts as soon as the task two slots
    /// back finishes and the comm that fed the immediately preceding task has landed, i.e. it may
    /// overlap the execution of the immediately preceding task.
    fn inject_prefetch(
        &self,
        schedule: &Schedule,
        comm_by_edge: &HashMap<(usize, usize), usize>,
        graph: &TaskGraph,
        simulator: &mut dyn SimulatorAdapter,
    ) {
        for tasks in schedule.values() {
            for i in 2..tasks.len() {
                let task = tasks[i];
                let prev_task = tasks[i - 1];
                let prev2_task = tasks[i - 2];
                let prev_comm = graph
                    .parents(prev_task)
                    .iter()
                    .filter_map(|&p| comm_by_edge.get(&(p, prev_task)))
                    .min()
                    .copied();
                for &parent in graph.parents(task) {
                    if let Some(&comm) = comm_by_edge.get(&(parent, task)) {
                        if let Some(prev_comm) = prev_comm {
                            simulator.add_dependency(prev_comm, comm);
                        }
                        simulator.add_dependency(prev2_task, comm);
                    }
                }
            }
        }
    }

    /// `other_parent -> c` for every other parent of `task`, for every parent-edge comm `c`.
    fn inject_parents(&self, graph: &TaskGraph, comm_by_edge: &HashMap<(usize, usize), usize>, simulator: &mut dyn SimulatorAdapter) {
        for (&(from, to), &comm) in comm_by_edge {
            for &other_parent in graph.parents(to) {
                if other_parent != from {
                    simulator.add_dependency(other_parent, comm);
                }
            }
        }
    }

    /// Builds, per host, the full list of inbound comms (one per parent edge of every task
    /// assigned to that host) and chains them into a single sequential queue: by consumer
    /// position for `QUEUE`, by producer ECT (tie-broken by consumer position) for `QUEUE_ECT`.
    fn inject_queue(
        &self,
        schedule: &Schedule,
        edges: &[CommEdge],
        position: &HashMap<usize, usize>,
        ect: Option<&[f64]>,
        simulator: &mut dyn SimulatorAdapter,
    ) {
        let host_of_task: HashMap<usize, usize> = Self::host_lookup(schedule);
        let mut per_host: HashMap<usize, Vec<&CommEdge>> = HashMap::new();
        for edge in edges {
            if let Some(&host) = host_of_task.get(&edge.to) {
                per_host.entry(host).or_default().push(edge);
            }
        }
        for queue in per_host.values_mut() {
            queue.sort_by(|a, b| {
                let pos_a = position.get(&a.to).copied().unwrap_or(usize::MAX);
                let pos_b = position.get(&b.to).copied().unwrap_or(usize::MAX);
                match ect {
                    Some(ect) => ect[a.from].total_cmp(&ect[b.from]).then(pos_a.cmp(&pos_b)),
                    None => pos_a.cmp(&pos_b),
                }
            });
            for window in queue.windows(2) {
                simulator.add_dependency(window[0].id, window[1].id);
            }
        }
    }

    fn sanity_check(&self, edges: &[CommEdge], schedule: &Schedule, simulator: &dyn SimulatorAdapter) -> Result<()> {
        let host_of = Self::host_lookup(schedule);
        for edge in edges {
            let (Some(&src), Some(&dst)) = (host_of.get(&edge.from), host_of.get(&edge.to)) else {
                continue;
            };
            let hosts = simulator.task_hosts(edge.id);
            if hosts != [src, dst] {
                return Err(SchedKernelError::ConfigurationError(format!(
                    "communication task {} hosts {hosts:?} disagree with producer/consumer placement ({src}, {dst})",
                    edge.id
                )));
            }
        }
        Ok(())
    }

    fn host_lookup(schedule: &Schedule) -> HashMap<usize, usize> {
        schedule.iter().flat_map(|(&host, tasks)| tasks.iter().map(move |&t| (t, host))).collect()
    }

    fn position_lookup(schedule: &Schedule) -> HashMap<usize, usize> {
        schedule
            .values()
            .flat_map(|tasks| tasks.iter().enumerate().map(|(i, &t)| (t, i)))
            .collect()
    }
}
