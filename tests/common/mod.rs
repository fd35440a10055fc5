//! In-memory `SimulatorAdapter` fake: a minimal discrete-event engine that knows nothing
//! about the scheduling kernel beyond the contract it exercises.
//!
//! Grounded on dslab-dag's `tests/tests.rs` (`gen_dag`/`gen_resources`/`gen_network` fixture
//! builders, `Pcg64::seed_from_u64` determinism) and, for the event-loop shape, dslab-core's
//! discrete-event runtime the original harness drives.

use std::collections::HashSet;

use dag_sched_kernel::dispatch::comm_edges;
use dag_sched_kernel::graph::TaskGraph;
use dag_sched_kernel::host::{Platform, SharingPolicy};
use dag_sched_kernel::platform::PlatformModel;
use dag_sched_kernel::simulator::SimulatorAdapter;
use dag_sched_kernel::task::TaskState;

/// A completion event ordered by time; `total_cmp` keeps this workable for `f64` the way the
/// rest of the crate orders floats (see `schedulers/common.rs::HostKey`).
#[derive(Clone, Copy, Debug)]
struct Pending {
    time: f64,
    task: usize,
}

pub struct FakeSimulator<'a> {
    platform: &'a PlatformModel,
    prereqs: Vec<Vec<usize>>,
    dependents: Vec<Vec<usize>>,
    amount: Vec<f64>,
    comm_weight: std::collections::HashMap<usize, f64>,
    state: Vec<TaskState>,
    hosts: Vec<Vec<usize>>,
    clock: f64,
    pending: Vec<Pending>,
    watched: HashSet<usize>,
    finish: Vec<f64>,
}

impl<'a> FakeSimulator<'a> {
    pub fn new(graph: &TaskGraph, platform: &'a PlatformModel) -> Self {
        let edges = comm_edges(graph);
        let total = graph.len() + edges.len();
        let mut prereqs = vec![Vec::new(); total];
        let mut dependents = vec![Vec::new(); total];
        let mut amount = vec![0.0_f64; total];
        let mut comm_weight = std::collections::HashMap::new();

        for t in 0..graph.len() {
            amount[t] = graph.task(t).amount;
        }
        for edge in &edges {
            prereqs[edge.id].push(edge.from);
            prereqs[edge.to].push(edge.id);
            comm_weight.insert(edge.id, edge.weight);
        }
        for t in 0..total {
            for &p in &prereqs[t] {
                dependents[p].push(t);
            }
        }

        Self {
            platform,
            prereqs,
            dependents,
            amount,
            comm_weight,
            state: vec![TaskState::NotScheduled; total],
            hosts: vec![Vec::new(); total],
            clock: 0.,
            pending: Vec::new(),
            watched: HashSet::new(),
            finish: vec![0.0_f64; total],
        }
    }

    /// The simulated finish time of `task`, valid once it has reached `Done`.
    pub fn finish_time(&self, task: usize) -> f64 {
        self.finish[task]
    }

    fn prereqs_done(&self, task: usize) -> bool {
        self.prereqs[task].iter().all(|&p| self.state[p] == TaskState::Done)
    }

    fn duration(&self, task: usize) -> f64 {
        if let Some(&weight) = self.comm_weight.get(&task) {
            let hosts = &self.hosts[task];
            self.platform.ecomt(weight, hosts[0], hosts[1])
        } else {
            self.platform.eet(self.amount[task], self.hosts[task][0])
        }
    }

    fn try_activate(&mut self, task: usize) {
        if self.state[task] == TaskState::Scheduled && !self.hosts[task].is_empty() && self.prereqs_done(task) {
            self.state[task] = TaskState::Running;
            let finish = self.clock + self.duration(task);
            self.pending.push(Pending { time: finish, task });
        }
    }

    fn complete(&mut self, task: usize) {
        self.state[task] = TaskState::Done;
        self.finish[task] = self.clock;
        for dependent in self.dependents[task].clone() {
            self.try_activate(dependent);
        }
    }
}

impl<'a> SimulatorAdapter for FakeSimulator<'a> {
    fn get_clock(&self) -> f64 {
        self.clock
    }

    fn schedule_task(&mut self, task: usize, host: usize) {
        self.hosts[task] = vec![host];
        self.state[task] = TaskState::Scheduled;
        self.try_activate(task);
    }

    fn schedule_transfer(&mut self, task: usize, src_host: usize, dst_host: usize) {
        self.hosts[task] = vec![src_host, dst_host];
        self.state[task] = TaskState::Scheduled;
        self.try_activate(task);
    }

    fn add_dependency(&mut self, parent: usize, child: usize) {
        self.prereqs[child].push(parent);
        self.dependents[parent].push(child);
        if self.state[parent] == TaskState::Done {
            self.try_activate(child);
        }
    }

    fn watch(&mut self, task: usize, state: TaskState) {
        assert_eq!(state, TaskState::Done, "fake only supports watching Done transitions");
        self.watched.insert(task);
    }

    fn simulate(&mut self) -> Vec<usize> {
        if self.pending.is_empty() {
            return Vec::new();
        }
        let time = self.pending.iter().map(|p| p.time).fold(f64::INFINITY, f64::min);
        let due: Vec<usize> = self
            .pending
            .iter()
            .filter(|p| p.time == time)
            .map(|p| p.task)
            .collect();
        self.pending.retain(|p| p.time != time);
        self.clock = time;
        for &task in &due {
            self.complete(task);
        }
        due
    }

    fn task_state(&self, task: usize) -> TaskState {
        self.state[task]
    }

    fn task_hosts(&self, task: usize) -> &[usize] {
        &self.hosts[task]
    }
}

/// Deterministic 2-host platform with one shared link, named so tests can distinguish the
/// "slow" from the "fast" host by index.
pub fn two_host_platform(speed_a: f64, speed_b: f64, bandwidth: f64, latency: f64) -> Platform {
    let mut platform = Platform::new();
    platform.add_host("h0", speed_a);
    platform.add_host("h1", speed_b);
    let link = platform.add_link("net", bandwidth, latency, SharingPolicy::FatPipe);
    for h in 0..2 {
        platform.add_route(h, h, vec![link], false);
    }
    platform.add_route(0, 1, vec![link], true);
    platform
}

/// `root -> A, root -> B, A -> end, B -> end`.
pub fn diamond_graph(amount_a: f64, amount_b: f64, edge_weight: f64) -> TaskGraph {
    use dag_sched_kernel::task::{Task, TaskKind};
    let tasks = vec![
        Task::new("root", TaskKind::Computation, 0.),
        Task::new("A", TaskKind::Computation, amount_a),
        Task::new("B", TaskKind::Computation, amount_b),
        Task::new("end", TaskKind::Computation, 0.),
    ];
    let edges = vec![(0, 1, edge_weight), (0, 2, edge_weight), (1, 3, edge_weight), (2, 3, edge_weight)];
    TaskGraph::from_tasks_and_edges(tasks, edges).unwrap()
}

/// `root -> {branch_0, .., branch_{n-1}} -> end`, every fan-in/fan-out edge weighing
/// `edge_weight`. Used for scenarios with more than two independent branches (batch heuristics,
/// LDCP).
pub fn fan_graph(amounts: &[f64], edge_weight: f64) -> TaskGraph {
    let in_weights = vec![edge_weight; amounts.len()];
    let out_weights = vec![edge_weight; amounts.len()];
    fan_graph_weighted(amounts, &in_weights, &out_weights)
}

/// As [`fan_graph`], but with a distinct fan-out (`root -> branch_i`) and fan-in
/// (`branch_i -> end`) weight per branch, for scenarios needing heterogeneous communication
/// costs.
pub fn fan_graph_weighted(amounts: &[f64], in_weights: &[f64], out_weights: &[f64]) -> TaskGraph {
    use dag_sched_kernel::task::{Task, TaskKind};
    assert_eq!(amounts.len(), in_weights.len());
    assert_eq!(amounts.len(), out_weights.len());

    let mut tasks = vec![Task::new("root", TaskKind::Computation, 0.)];
    for (i, &amount) in amounts.iter().enumerate() {
        tasks.push(Task::new(&format!("B{i}"), TaskKind::Computation, amount));
    }
    let end = tasks.len();
    tasks.push(Task::new("end", TaskKind::Computation, 0.));

    let mut edges = Vec::new();
    for i in 0..amounts.len() {
        let branch = i + 1;
        edges.push((0, branch, in_weights[i]));
        edges.push((branch, end, out_weights[i]));
    }
    TaskGraph::from_tasks_and_edges(tasks, edges).unwrap()
}

/// A fully-connected platform of `speeds.len()` hosts, every pair joined by a link of uniform
/// `bandwidth`/`latency`.
pub fn star_platform(speeds: &[f64], bandwidth: f64, latency: f64) -> Platform {
    let mut platform = Platform::new();
    for (i, &speed) in speeds.iter().enumerate() {
        platform.add_host(&format!("h{i}"), speed);
    }
    for i in 0..speeds.len() {
        let loopback = platform.add_link(&format!("lo{i}"), f64::INFINITY, 0., SharingPolicy::FatPipe);
        platform.add_route(i, i, vec![loopback], false);
    }
    for i in 0..speeds.len() {
        for j in (i + 1)..speeds.len() {
            let link = platform.add_link(&format!("link{i}-{j}"), bandwidth, latency, SharingPolicy::FatPipe);
            platform.add_route(i, j, vec![link], true);
        }
    }
    platform
}

/// Runs `schedule` to completion on a fresh [`FakeSimulator`] under `config`, returning the
/// final makespan (the clock once every task is `Done`).
pub fn run_to_completion(
    graph: &TaskGraph,
    platform: &PlatformModel,
    schedule: &dag_sched_kernel::scheduler::Schedule,
    ect: Option<&[f64]>,
    config: dag_sched_kernel::config::SchedulerConfig,
) -> f64 {
    let driver = dag_sched_kernel::dispatch::DispatchDriver::new(config);
    let mut sim = FakeSimulator::new(graph, platform);
    driver.run(graph, schedule, ect, &mut sim).expect("dispatch run should reach completion");
    sim.get_clock()
}
