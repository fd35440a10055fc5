//! End-to-end scenarios (S1-S6): seed inputs chosen to pin down one clear-cut behavior per
//! algorithm family, grounded directly on dslab-dag's `tests/tests.rs` `gen_dag`/`gen_resources`
//! fixtures (same shape: a handful of hosts, a handful of tasks, a platform builder).

mod common;

use common::{diamond_graph, fan_graph, run_to_completion, star_platform, two_host_platform};
use dag_sched_kernel::config::SchedulerConfig;
use dag_sched_kernel::platform::PlatformModel;
use dag_sched_kernel::scheduler::StaticScheduler;
use dag_sched_kernel::schedulers::batch::{BatchKind, BatchScheduler};
use dag_sched_kernel::schedulers::heft::HeftScheduler;
use dag_sched_kernel::schedulers::ldcp::LdcpScheduler;
use dag_sched_kernel::schedulers::olb::StaticOlbScheduler;
use dag_sched_kernel::task::{Task, TaskKind};
use dag_sched_kernel::graph::TaskGraph;

const EPS: f64 = 1e-6;

/// S1 - Minimal diamond: two identical 1 Gflop/s hosts, `root -> A(1G) -> end`, `root -> B(1G)
/// -> end`, zero-byte edges. HEFT must parallelize A and B onto different hosts for a makespan
/// of ~1.0s rather than serialize them at ~2.0s.
#[test]
fn s1_minimal_diamond_heft_parallelizes_across_identical_hosts() {
    let graph = diamond_graph(1e9, 1e9, 0.);
    let platform = PlatformModel::new(&two_host_platform(1e9, 1e9, 1e6, 0.));

    let (schedule, makespan) = HeftScheduler::new().get_schedule(&graph, &platform).unwrap();
    assert!((makespan.unwrap() - 1.0).abs() < EPS);

    let host_of = |task: usize| schedule.iter().find(|(_, tasks)| tasks.contains(&task)).map(|(&h, _)| h).unwrap();
    assert_ne!(host_of(1), host_of(2), "A and B must land on different hosts");
}

/// S2 - Heterogeneous preference: a single 10-Gflop task over a 1 Gflop/s and a 10 Gflop/s host.
/// Both HEFT and static OLB must pick the fast host; makespan ~1.0s.
#[test]
fn s2_heterogeneous_preference_picks_the_fast_host() {
    let graph = TaskGraph::from_tasks_and_edges(vec![Task::new("T", TaskKind::Computation, 1e10)], vec![]).unwrap();
    let platform = PlatformModel::new(&two_host_platform(1e9, 1e10, 1e6, 0.));

    for scheduler in [&HeftScheduler::new() as &dyn StaticScheduler, &StaticOlbScheduler::new()] {
        let (schedule, makespan) = scheduler.get_schedule(&graph, &platform).unwrap();
        assert!((makespan.unwrap() - 1.0).abs() < EPS);
        assert!(schedule.get(&1).map(|tasks| tasks.contains(&0)).unwrap_or(false), "task must run on the fast host");
    }
}

/// S3 - Communication dominates: a two-task chain with a 10 MB transfer over a 1 MB/s link
/// between otherwise-identical hosts. Splitting the chain across hosts costs ~10s of transfer;
/// HEFT must co-locate both tasks on one host for a makespan of ~2.0s instead.
#[test]
fn s3_communication_dominates_heft_colocates_the_chain() {
    let tasks = vec![
        Task::new("T1", TaskKind::Computation, 1e9),
        Task::new("T2", TaskKind::Computation, 1e9),
    ];
    let graph = TaskGraph::from_tasks_and_edges(tasks, vec![(0, 1, 1e7)]).unwrap();
    let platform = PlatformModel::new(&two_host_platform(1e9, 1e9, 1e6, 0.));

    let (schedule, makespan) = HeftScheduler::new().get_schedule(&graph, &platform).unwrap();
    assert!((makespan.unwrap() - 2.0).abs() < EPS, "got {:?}", makespan);

    let host_of = |task: usize| schedule.iter().find(|(_, tasks)| tasks.contains(&task)).map(|(&h, _)| h).unwrap();
    assert_eq!(host_of(0), host_of(1), "HEFT must avoid the 10s cross-host transfer");
}

/// S4 - Sufferage vs MinMin: five independent 1-Gflop tasks over three hosts of speed
/// {1,2,4} Gflop/s. Every batch heuristic must finish well within the loose `N_hosts x
/// makespan(OLB)` bound (property 8), and produce a complete, valid schedule.
#[test]
fn s4_batch_heuristics_beat_the_normalized_makespan_bound() {
    let amounts = vec![1e9; 5];
    let graph = fan_graph(&amounts, 0.);
    let platform = PlatformModel::new(&star_platform(&[1e9, 2e9, 4e9], 1e9, 0.));

    let (_, olb_makespan) = StaticOlbScheduler::new().get_schedule(&graph, &platform).unwrap();
    let bound = olb_makespan.unwrap() * platform.host_count() as f64;

    for kind in [BatchKind::MinMin, BatchKind::MaxMin, BatchKind::Sufferage] {
        let (schedule, makespan) = BatchScheduler::new(kind).get_schedule(&graph, &platform).unwrap();
        let total: usize = schedule.values().map(|v| v.len()).sum();
        assert_eq!(total, graph.len(), "{kind:?} must place every task");
        assert!(makespan.unwrap() <= bound + EPS, "{kind:?} makespan {makespan:?} exceeds bound {bound}");
        assert!(makespan.unwrap() <= 2.0 + EPS, "{kind:?} makespan {makespan:?} should comfortably beat 2s with 3 hosts");
    }
}

/// S5 - LDCP on a fork-join: an eight-task workflow (root, six branches, end) with
/// heterogeneous per-branch communication costs. With deterministic host assignment, LDCP's
/// predicted makespan must match the makespan actually observed once the schedule is dispatched
/// against a simulator.
#[test]
fn s5_ldcp_predicted_makespan_matches_simulated_makespan() {
    let amounts = vec![3e9, 1e9, 2e9, 4e9, 1.5e9, 2.5e9];
    let in_weights = vec![1e6, 5e6, 2e6, 8e6, 3e6, 6e6];
    let out_weights = vec![2e6, 1e6, 4e6, 1e6, 5e6, 2e6];
    let graph = common::fan_graph_weighted(&amounts, &in_weights, &out_weights);
    assert_eq!(graph.len(), 8);
    let platform = PlatformModel::new(&star_platform(&[1e9, 2e9, 3e9], 2e6, 1e-3));

    let (schedule, predicted) = LdcpScheduler::new().get_schedule(&graph, &platform).unwrap();
    let predicted = predicted.expect("LDCP publishes a predicted makespan");

    let simulated = run_to_completion(&graph, &platform, &schedule, None, SchedulerConfig::default());
    assert!((simulated - predicted).abs() < EPS, "predicted {predicted} vs simulated {simulated}");
}

/// S6 - Dispatch mode equivalence: under PARALLEL execution (no same-host serialization), a
/// schedule's simulated makespan can never exceed its SEQUENTIAL/EAGER makespan, since PARALLEL
/// only removes constraints.
#[test]
fn s6_parallel_execution_never_worsens_the_sequential_makespan() {
    let graph = diamond_graph(1e9, 2e9, 5e5);
    let platform = PlatformModel::new(&two_host_platform(1e9, 1e9, 1e6, 0.));
    let (schedule, _) = HeftScheduler::new().get_schedule(&graph, &platform).unwrap();

    let sequential = run_to_completion(&graph, &platform, &schedule, None, SchedulerConfig::default());
    let parallel = run_to_completion(
        &graph,
        &platform,
        &schedule,
        None,
        SchedulerConfig {
            task_execution: dag_sched_kernel::config::TaskExecutionMode::Parallel,
            ..SchedulerConfig::default()
        },
    );

    assert!(parallel <= sequential + EPS, "parallel {parallel} should not exceed sequential {sequential}");
}
