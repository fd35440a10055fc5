//! Structured JSON execution log: every scheduling and execution event, timestamped,
//! suitable for offline Gantt-chart rendering or post-hoc debugging of a run.

use std::fs::File;
use std::io::Write;

use serde::{Deserialize, Serialize};

use crate::graph::TaskGraph;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    TaskScheduled {
        time: f64,
        task_id: usize,
        task_name: String,
        host: String,
    },
    TaskStarted {
        time: f64,
        task_id: usize,
        task_name: String,
    },
    TaskCompleted {
        time: f64,
        task_id: usize,
        task_name: String,
    },
    TransferStarted {
        time: f64,
        from: String,
        to: String,
        transfer_id: usize,
        bytes: f64,
    },
    TransferCompleted {
        time: f64,
        from: String,
        to: String,
        transfer_id: usize,
    },
}

impl Event {
    pub fn time(&self) -> f64 {
        match self {
            Event::TaskScheduled { time, .. }
            | Event::TaskStarted { time, .. }
            | Event::TaskCompleted { time, .. }
            | Event::TransferStarted { time, .. }
            | Event::TransferCompleted { time, .. } => *time,
        }
    }
}

impl std::fmt::Display for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Event::TaskScheduled { task_name, host, .. } => write!(f, "scheduled task {task_name} to {host}"),
            Event::TaskStarted { task_name, .. } => write!(f, "started task {task_name}"),
            Event::TaskCompleted { task_name, .. } => write!(f, "completed task {task_name}"),
            Event::TransferStarted { from, to, bytes, .. } => write!(f, "transfer of {bytes} bytes started from {from} to {to}"),
            Event::TransferCompleted { from, to, .. } => write!(f, "transfer finished from {from} to {to}"),
        }
    }
}

/// Snapshot of the workflow graph recorded alongside the event stream, for offline replay
/// without needing the original `TaskGraph` in scope.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub task_names: Vec<String>,
    pub task_amounts: Vec<f64>,
}

impl GraphSnapshot {
    pub fn from_graph(graph: &TaskGraph) -> Self {
        Self {
            task_names: graph.tasks().iter().map(|t| t.name.clone()).collect(),
            task_amounts: graph.tasks().iter().map(|t| t.amount).collect(),
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TraceLog {
    pub graph: GraphSnapshot,
    pub events: Vec<Event>,
}

impl TraceLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log_graph(&mut self, graph: &TaskGraph) {
        self.graph = GraphSnapshot::from_graph(graph);
    }

    pub fn log_event(&mut self, event: Event) {
        log::debug!("{event}");
        self.events.push(event);
    }

    pub fn save_to_file(&self, path: &str) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self).expect("TraceLog fields are always serializable");
        File::create(path)?.write_all(json.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{Task, TaskKind};

    #[test]
    fn events_are_recorded_in_order() {
        let mut log = TraceLog::new();
        log.log_event(Event::TaskScheduled {
            time: 0.,
            task_id: 0,
            task_name: "A".to_string(),
            host: "h0".to_string(),
        });
        log.log_event(Event::TaskCompleted {
            time: 1.,
            task_id: 0,
            task_name: "A".to_string(),
        });
        assert_eq!(log.events.len(), 2);
        assert_eq!(log.events[1].time(), 1.);
    }

    #[test]
    fn graph_snapshot_captures_names_and_amounts() {
        let tasks = vec![
            Task::new("root", TaskKind::Computation, 0.),
            Task::new("A", TaskKind::Computation, 1e9),
            Task::new("end", TaskKind::Computation, 0.),
        ];
        let edges = vec![(0, 1, 0.), (1, 2, 0.)];
        let graph = TaskGraph::from_tasks_and_edges(tasks, edges).unwrap();
        let snapshot = GraphSnapshot::from_graph(&graph);
        assert_eq!(snapshot.task_names, vec!["root".to_string(), "A".to_string(), "end".to_string()]);
        assert_eq!(snapshot.task_amounts, vec![0., 1e9, 0.]);
    }
}
