//! Makespan lower bound: critical path time vs. total compute time.
//!
//! Used by the testable-property tests to check every algorithm's reported makespan against a
//! sanity floor.

use crate::graph::TaskGraph;
use crate::platform::PlatformModel;

/// `max(critical_path_time, total_comp_time)`: no schedule can beat either bound, since the
/// critical path must be traversed in order and the aggregate compute capacity bounds how fast
/// all the work can finish even with unlimited hosts and instantaneous communication.
pub fn makespan_lower_bound(graph: &TaskGraph, platform: &PlatformModel) -> f64 {
    critical_path_time(graph, platform).max(total_comp_time(graph, platform))
}

/// Longest path from root to end, each task counted at its fastest available host, ignoring
/// communication (an optimistic per-task execution time, summed along the critical path).
fn critical_path_time(graph: &TaskGraph, platform: &PlatformModel) -> f64 {
    let n = graph.len();
    let mut rank = vec![0.0_f64; n];
    let mut visited = vec![false; n];

    fn visit(v: usize, graph: &TaskGraph, platform: &PlatformModel, rank: &mut Vec<f64>, visited: &mut Vec<bool>) {
        if visited[v] {
            return;
        }
        visited[v] = true;
        let mut best_child = 0.0_f64;
        for edge in graph.children(v) {
            visit(edge.to, graph, platform, rank, visited);
            best_child = best_child.max(rank[edge.to]);
        }
        let fastest = (0..platform.host_count())
            .map(|h| platform.eet(graph.task(v).amount, h))
            .fold(f64::INFINITY, f64::min);
        rank[v] = best_child + fastest;
    }

    for v in 0..n {
        visit(v, graph, platform, &mut rank, &mut visited);
    }
    rank.into_iter().fold(0.0_f64, f64::max)
}

/// Total compute amount divided by the platform's aggregate speed: the time required if every
/// host worked at full speed with no idle gaps, for the entire duration.
fn total_comp_time(graph: &TaskGraph, platform: &PlatformModel) -> f64 {
    let total_amount: f64 = graph.tasks().iter().map(|t| t.amount).sum();
    let total_speed: f64 = (0..platform.host_count()).map(|h| platform.speed(h)).sum();
    if total_speed == 0. {
        return f64::INFINITY;
    }
    total_amount / total_speed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{Platform, SharingPolicy};
    use crate::task::{Task, TaskKind};

    #[test]
    fn chain_lower_bound_matches_the_fastest_host_sum() {
        let tasks = vec![
            Task::new("T0", TaskKind::Computation, 1e9),
            Task::new("T1", TaskKind::Computation, 1e9),
        ];
        let graph = TaskGraph::from_tasks_and_edges(tasks, vec![(0, 1, 0.)]).unwrap();

        let mut platform = Platform::new();
        platform.add_host("slow", 1e9);
        platform.add_host("fast", 1e10);
        let lo = platform.add_link("lo", f64::INFINITY, 0., SharingPolicy::FatPipe);
        for h in 0..2 {
            platform.add_route(h, h, vec![lo], false);
        }
        platform.add_route(0, 1, vec![lo], true);
        let model = PlatformModel::new(&platform);

        let bound = makespan_lower_bound(&graph, &model);
        assert!((bound - 0.2).abs() < 1e-9);
    }
}
