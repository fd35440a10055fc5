//! Graph ranking functions used by the scheduling algorithms.
//!
//! All functions are pure: `(&TaskGraph, &PlatformModel) -> Vec<f64>` (or a per-host/per-task
//! matrix), none of them mutate the graph or the platform model. Grounded respectively on
//! `heft.py::heft_order` (ranku), `dls.py::get_tasks_sl_aec` (static level), `hcpt.py`
//! (AEST/ALST), `peft.py` (OCT) and `ldcp.py::update_urank` (LDCP URank).

use crate::graph::TaskGraph;
use crate::platform::PlatformModel;

/// Average execution cost: `task.amount / mean_speed`.
pub fn aec(graph: &TaskGraph, platform: &PlatformModel) -> Vec<f64> {
    graph.tasks().iter().map(|t| t.amount / platform.mean_speed).collect()
}

/// HEFT upward rank, computed in reverse topological order.
pub fn ranku(graph: &TaskGraph, platform: &PlatformModel) -> Vec<f64> {
    let aec = aec(graph, platform);
    let mut ranku = vec![0.0_f64; graph.len()];
    for &v in graph.topological_order().iter().rev() {
        let best_child = graph
            .children(v)
            .iter()
            .map(|edge| edge.weight / platform.mean_bandwidth + platform.mean_latency + ranku[edge.to])
            .fold(None, |acc, x| Some(acc.map_or(x, |m: f64| m.max(x))));
        ranku[v] = aec[v] + best_child.unwrap_or(0.);
    }
    ranku
}

/// DLS static level: residual weight (in mean-speed time units) on the critical path from each
/// task to the workflow sink.
pub fn static_level(graph: &TaskGraph, platform: &PlatformModel) -> Vec<f64> {
    let aec = aec(graph, platform);
    let mut sl = aec.clone();
    for &v in graph.topological_order().iter().rev() {
        let best_child = graph
            .children(v)
            .iter()
            .map(|edge| sl[edge.to])
            .fold(None, |acc, x| Some(acc.map_or(x, |m: f64| m.max(x))));
        if let Some(best) = best_child {
            sl[v] = aec[v] + best;
        }
    }
    sl
}

/// Forward AEST pass and reverse ALST pass (HCPT). Returns `(aest, alst)`.
pub fn aest_alst(graph: &TaskGraph, platform: &PlatformModel) -> (Vec<f64>, Vec<f64>) {
    let aec = aec(graph, platform);
    let order = graph.topological_order();
    let n = graph.len();

    let mut aest = vec![0.0_f64; n];
    for &v in &order {
        let best_parent = graph
            .parents(v)
            .iter()
            .map(|&p| aest[p] + aec[p] + graph.edge_weight(p, v) / platform.mean_bandwidth + platform.mean_latency)
            .fold(None, |acc, x| Some(acc.map_or(x, |m: f64| m.max(x))));
        aest[v] = best_parent.unwrap_or(0.);
    }

    let makespan = order.iter().map(|&v| aest[v] + aec[v]).fold(0.0_f64, f64::max);
    let mut alst = vec![makespan; n];
    for &v in order.iter().rev() {
        let best_child = graph
            .children(v)
            .iter()
            .map(|edge| alst[edge.to] - edge.weight / platform.mean_bandwidth - platform.mean_latency)
            .fold(None, |acc, x| Some(acc.map_or(x, |m: f64| m.min(x))));
        alst[v] = best_child.unwrap_or(makespan) - aec[v];
    }

    (aest, alst)
}

/// Whether `task` lies on the critical path, i.e. `AEST ≈ ALST` within `tolerance`.
pub fn is_critical(aest: &[f64], alst: &[f64], task: usize, tolerance: f64) -> bool {
    (aest[task] - alst[task]).abs() <= tolerance
}

/// PEFT's optimistic cost table: `oct[task][host]`, plus the per-task mean-across-hosts rank.
pub fn oct(graph: &TaskGraph, platform: &PlatformModel) -> (Vec<Vec<f64>>, Vec<f64>) {
    let n = graph.len();
    let h = platform.host_count();
    let mut oct = vec![vec![0.0_f64; h]; n];

    for &v in graph.topological_order().iter().rev() {
        if graph.children(v).is_empty() {
            continue;
        }
        for host in 0..h {
            let mut worst_child = 0.0_f64;
            for edge in graph.children(v) {
                let best_over_hosts = (0..h)
                    .map(|host_prime| {
                        let comm = if host == host_prime {
                            0.
                        } else {
                            edge.weight / platform.mean_bandwidth + platform.mean_latency
                        };
                        oct[edge.to][host_prime] + platform.eet(graph.task(edge.to).amount, host_prime) + comm
                    })
                    .fold(f64::INFINITY, f64::min);
                worst_child = worst_child.max(best_over_hosts);
            }
            oct[v][host] = worst_child;
        }
    }

    let rank = oct.iter().map(|row| row.iter().sum::<f64>() / h as f64).collect();
    (oct, rank)
}

/// A private per-host DAG copy used by LDCP: shares node identity (by index) with the canonical
/// [`TaskGraph`] but tracks mutable per-task `size` and temporary same-host ordering edges.
#[derive(Clone)]
pub struct HostDagCopy {
    /// `size[v]` = `task.amount / host.speed` (or an override once `v` is actually placed).
    pub size: Vec<f64>,
    /// `children[v]` = `(child, weight)` including temporary zero-cost ordering edges.
    pub children: Vec<Vec<(usize, f64)>>,
    pub parents: Vec<Vec<usize>>,
}

impl HostDagCopy {
    pub fn new(graph: &TaskGraph, host: usize, platform: &PlatformModel) -> Self {
        let n = graph.len();
        let size = graph.tasks().iter().map(|t| platform.eet(t.amount, host)).collect();
        let mut children = vec![Vec::new(); n];
        let mut parents = vec![Vec::new(); n];
        for v in 0..n {
            for edge in graph.children(v) {
                children[v].push((edge.to, edge.weight));
                parents[edge.to].push(v);
            }
        }
        Self { size, children, parents }
    }

    pub fn add_edge(&mut self, from: usize, to: usize, weight: f64) {
        self.children[from].push((to, weight));
        self.parents[to].push(from);
    }

    pub fn remove_edge(&mut self, from: usize, to: usize) {
        self.children[from].retain(|&(c, _)| c != to);
        self.parents[to].retain(|&p| p != from);
    }

    /// Topological order of this (possibly rewritten) per-host DAG, ties broken by index.
    pub fn topological_order(&self) -> Vec<usize> {
        let n = self.size.len();
        let mut indegree: Vec<usize> = self.parents.iter().map(|p| p.len()).collect();
        let mut ready: std::collections::BTreeSet<usize> =
            (0..n).filter(|&v| indegree[v] == 0).collect();
        let mut order = Vec::with_capacity(n);
        while let Some(&v) = ready.iter().next() {
            ready.remove(&v);
            order.push(v);
            for &(c, _) in &self.children[v] {
                indegree[c] -= 1;
                if indegree[c] == 0 {
                    ready.insert(c);
                }
            }
        }
        order
    }

    /// Would adding `from -> to` introduce a cycle in this DAG copy?
    pub fn creates_cycle(&self, from: usize, to: usize) -> bool {
        if from == to {
            return true;
        }
        let mut stack = vec![to];
        let mut visited = vec![false; self.size.len()];
        while let Some(v) = stack.pop() {
            if v == from {
                return true;
            }
            if visited[v] {
                continue;
            }
            visited[v] = true;
            for &(c, _) in &self.children[v] {
                stack.push(c);
            }
        }
        false
    }
}

/// LDCP URank for a single per-host DAG copy: `urank[v] = size[v] + max_child(edge/mean_bw +
/// urank[child])`, restricted to the given `scope` of tasks to (re)compute (pass `0..n` for a
/// full recomputation).
pub fn ldcp_urank(dagp: &HostDagCopy, mean_bandwidth: f64, scope: &[usize], urank: &mut Vec<f64>) {
    let order = dagp.topological_order();
    for &v in order.iter().rev() {
        if !scope.contains(&v) {
            continue;
        }
        let best_child = dagp.children[v]
            .iter()
            .map(|&(c, w)| w / mean_bandwidth + urank[c])
            .fold(None, |acc, x| Some(acc.map_or(x, |m: f64| m.max(x))));
        urank[v] = dagp.size[v] + best_child.unwrap_or(0.);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{Platform, SharingPolicy};
    use crate::task::{Task, TaskKind};

    fn diamond() -> (TaskGraph, PlatformModel) {
        let tasks = vec![
            Task::new("root", TaskKind::Computation, 0.),
            Task::new("A", TaskKind::Computation, 1e9),
            Task::new("B", TaskKind::Computation, 1e9),
            Task::new("end", TaskKind::Computation, 0.),
        ];
        let edges = vec![(0, 1, 0.), (0, 2, 0.), (1, 3, 0.), (2, 3, 0.)];
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
        (graph, model)
    }

    #[test]
    fn ranku_orders_match_topological_order() {
        let (graph, platform) = diamond();
        let ranks = ranku(&graph, &platform);
        let mut tasks: Vec<usize> = (0..graph.len()).collect();
        tasks.sort_by(|&a, &b| ranks[b].total_cmp(&ranks[a]));
        // root always first, end always last, in a ranku-descending order.
        assert_eq!(tasks[0], graph.root());
        assert_eq!(tasks[tasks.len() - 1], graph.end());
    }
}
