//! Shared helpers used by most static algorithms.

use crate::error::Result;
use crate::graph::TaskGraph;
use crate::platform::PlatformModel;
use crate::state::SchedulerState;

/// If `task` is a zero-work boundary task (`root`/`end`/`TRUE_ROOT`/`TRUE_END`) and the platform
/// has a designated `master` host, schedules it there at zero cost and returns `true`.
/// Otherwise leaves `state` untouched and returns `false`, letting the caller place the task
/// through the normal ranking/placement machinery.
pub fn try_schedule_boundary_task(
    task: usize,
    graph: &TaskGraph,
    platform: &PlatformModel,
    state: &mut SchedulerState,
) -> Result<bool> {
    if !graph.task(task).is_boundary() {
        return Ok(false);
    }
    let Some(master) = platform.master_host() else {
        return Ok(false);
    };
    let est = platform.est(master, task, graph, state)?;
    let (pos, start, finish) = state.timetable(master).find_slot(est, 0.);
    state.update(task, master, pos, start, finish);
    Ok(true)
}

/// Tracks the minimum-key value seen so far, matching `cscheduling.MinSelector`'s role of
/// picking a `(host, pos, start, finish)` tuple by a `(primary_metric, host.speed, host.name)`
/// tie-break key without allocating a sortable `Vec` up front.
pub struct MinSelector<K, V> {
    best: Option<(K, V)>,
}

impl<K: PartialOrd, V> MinSelector<K, V> {
    pub fn new() -> Self {
        Self { best: None }
    }

    pub fn update(&mut self, key: K, value: V) {
        let replace = match &self.best {
            None => true,
            Some((best_key, _)) => key < *best_key,
        };
        if replace {
            self.best = Some((key, value));
        }
    }

    pub fn into_value(self) -> Option<V> {
        self.best.map(|(_, v)| v)
    }
}

impl<K: PartialOrd, V> Default for MinSelector<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Host tie-break key: `(primary_metric, host.speed, host.name)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HostKey<'a> {
    pub primary: f64,
    pub speed: f64,
    pub name: &'a str,
}

impl<'a> PartialOrd for HostKey<'a> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(
            self.primary
                .total_cmp(&other.primary)
                .then(self.speed.total_cmp(&other.speed))
                .then(self.name.cmp(other.name)),
        )
    }
}
