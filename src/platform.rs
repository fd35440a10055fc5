//! Analytical platform cost model: per-host speed, pairwise bandwidth/latency, and the
//! `eet`/`ecomt`/`est` cost formulas every scheduling algorithm is built on.

use crate::error::{Result, SchedKernelError};
use crate::graph::TaskGraph;
use crate::host::Platform;
use crate::state::SchedulerState;

/// Derived, immutable analytical model of a [`Platform`]: per-host speed, pairwise
/// bandwidth/latency, and the mean aggregates used by rank-based algorithms.
pub struct PlatformModel {
    speed: Vec<f64>,
    names: Vec<String>,
    bandwidth: Vec<Vec<f64>>,
    latency: Vec<Vec<f64>>,
    pub mean_speed: f64,
    pub mean_bandwidth: f64,
    pub mean_latency: f64,
    master: Option<usize>,
}

impl PlatformModel {
    pub fn new(platform: &Platform) -> Self {
        let n = platform.hosts.len();
        let speed: Vec<f64> = platform.hosts.iter().map(|h| h.speed).collect();
        let names: Vec<String> = platform.hosts.iter().map(|h| h.name.clone()).collect();
        let mut bandwidth = vec![vec![0.; n]; n];
        let mut latency = vec![vec![0.; n]; n];
        for i in 0..n {
            for j in 0..n {
                bandwidth[i][j] = platform.bandwidth(i, j);
                latency[i][j] = platform.latency(i, j);
            }
        }

        let mean_speed = speed.iter().sum::<f64>() / n as f64;

        let mut off_diag_bw_sum = 0.;
        let mut off_diag_lat_sum = 0.;
        let mut off_diag_count = 0usize;
        for i in 0..n {
            for j in 0..n {
                if i != j {
                    off_diag_bw_sum += bandwidth[i][j];
                    off_diag_lat_sum += latency[i][j];
                    off_diag_count += 1;
                }
            }
        }
        let mean_bandwidth = if off_diag_count > 0 {
            off_diag_bw_sum / off_diag_count as f64
        } else {
            bandwidth.first().and_then(|r| r.first()).copied().unwrap_or(f64::INFINITY)
        };
        let mean_latency = if off_diag_count > 0 { off_diag_lat_sum / off_diag_count as f64 } else { 0. };

        Self {
            speed,
            names,
            bandwidth,
            latency,
            mean_speed,
            mean_bandwidth,
            mean_latency,
            master: platform.master_host(),
        }
    }

    pub fn host_count(&self) -> usize {
        self.speed.len()
    }

    pub fn speed(&self, host: usize) -> f64 {
        self.speed[host]
    }

    /// The host's declared name, for use in [`crate::schedulers::common::HostKey`] tie-breaks.
    pub fn host_name(&self, host: usize) -> &str {
        &self.names[host]
    }

    pub fn bandwidth(&self, src: usize, dst: usize) -> f64 {
        self.bandwidth[src][dst]
    }

    pub fn latency(&self, src: usize, dst: usize) -> f64 {
        self.latency[src][dst]
    }

    pub fn master_host(&self) -> Option<usize> {
        self.master
    }

    /// Earliest execution time of `task` on `host`, ignoring data transfer.
    pub fn eet(&self, amount: f64, host: usize) -> f64 {
        amount / self.speed[host]
    }

    /// Estimated communication time of `edge_weight` bytes from `src_host` to `dst_host`.
    pub fn ecomt(&self, edge_weight: f64, src_host: usize, dst_host: usize) -> f64 {
        if src_host == dst_host {
            return 0.;
        }
        edge_weight / self.bandwidth[src_host][dst_host] + self.latency[src_host][dst_host]
    }

    /// Earliest start time of `task` on `host` given its parents' placements in `state`.
    ///
    /// Fails with [`SchedKernelError::InvalidState`] if any parent is not yet scheduled.
    pub fn est(&self, host: usize, task: usize, graph: &TaskGraph, state: &SchedulerState) -> Result<f64> {
        let mut best = 0.0_f64;
        for &parent in graph.parents(task) {
            let parent_state = state.task_state(parent).ok_or_else(|| {
                SchedKernelError::InvalidState(format!("est queried with unscheduled parent task {parent}"))
            })?;
            let weight = graph.edge_weight(parent, task);
            let ready = parent_state.ect + self.ecomt(weight, parent_state.host, host);
            best = best.max(ready);
        }
        Ok(best)
    }
}
