//! DAG model of computation: tasks, data edges, and the analytical [`TaskGraph`].
//!
//! Vertices are computational tasks; edges are derived by folding communication tasks between
//! their unique producer and unique consumer. There must be exactly one source
//! (`root`) and one sink (`end`); if the raw workflow has multiple roots/ends, synthetic
//! `TRUE_ROOT`/`TRUE_END` nodes with zero work and zero-weight edges are inserted.

use std::collections::BTreeSet;

use crate::error::{Result, SchedKernelError};
use crate::task::{Task, TaskKind, TaskState};

/// A directed edge between computation tasks, annotated with the transferred byte count.
#[derive(Clone, Copy, Debug)]
pub struct Edge {
    pub to: usize,
    pub weight: f64,
}

/// The workflow DAG used by the analytical scheduling model.
#[derive(Clone, Debug)]
pub struct TaskGraph {
    tasks: Vec<Task>,
    /// `children[v]` lists `(child, weight)` pairs.
    children: Vec<Vec<Edge>>,
    root: usize,
    end: usize,
}

impl TaskGraph {
    /// Builds a [`TaskGraph`] from a list of computation tasks and weighted edges between them
    /// (the edges having already been derived by folding communication tasks in the raw
    /// workflow). Reconciles multiple roots/ends via synthetic `TRUE_ROOT`/`TRUE_END` nodes.
    pub fn from_tasks_and_edges(mut tasks: Vec<Task>, edges: Vec<(usize, usize, f64)>) -> Result<Self> {
        if tasks.is_empty() {
            return Err(SchedKernelError::GraphError("workflow has no tasks".to_string()));
        }
        let mut children = vec![Vec::new(); tasks.len()];
        for &(from, to, weight) in &edges {
            children[from].push(Edge { to, weight });
            tasks[to].parents.push(from);
            tasks[from].children.push(to);
        }

        let mut graph = Self {
            tasks,
            children,
            root: usize::MAX,
            end: usize::MAX,
        };
        graph.check_acyclic()?;
        graph.reconcile_boundaries();
        Ok(graph)
    }

    fn reconcile_boundaries(&mut self) {
        let roots: Vec<usize> = (0..self.tasks.len()).filter(|&t| self.tasks[t].parents.is_empty()).collect();
        let ends: Vec<usize> = (0..self.tasks.len()).filter(|&t| self.tasks[t].children.is_empty()).collect();

        self.root = if roots.len() == 1 {
            roots[0]
        } else {
            let id = self.add_boundary_task("TRUE_ROOT");
            for &r in &roots {
                self.add_edge(id, r, 0.);
            }
            id
        };

        self.end = if ends.len() == 1 && ends[0] != self.root {
            ends[0]
        } else {
            let id = self.add_boundary_task("TRUE_END");
            for &e in &ends {
                if e != id {
                    self.add_edge(e, id, 0.);
                }
            }
            id
        };
    }

    fn add_boundary_task(&mut self, name: &str) -> usize {
        let id = self.tasks.len();
        self.tasks.push(Task::new(name, TaskKind::Computation, 0.));
        self.children.push(Vec::new());
        id
    }

    fn add_edge(&mut self, from: usize, to: usize, weight: f64) {
        self.children[from].push(Edge { to, weight });
        self.tasks[to].parents.push(from);
        self.tasks[from].children.push(to);
    }

    fn check_acyclic(&self) -> Result<()> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Unvisited,
            InProgress,
            Done,
        }
        let mut mark = vec![Mark::Unvisited; self.tasks.len()];

        fn visit(v: usize, children: &[Vec<Edge>], mark: &mut Vec<Mark>) -> Result<()> {
            match mark[v] {
                Mark::Done => return Ok(()),
                Mark::InProgress => return Err(SchedKernelError::GraphError("cycle detected in workflow".to_string())),
                Mark::Unvisited => {}
            }
            mark[v] = Mark::InProgress;
            for edge in &children[v] {
                visit(edge.to, children, mark)?;
            }
            mark[v] = Mark::Done;
            Ok(())
        }

        for v in 0..self.tasks.len() {
            visit(v, &self.children, &mut mark)?;
        }
        Ok(())
    }

    pub fn root(&self) -> usize {
        self.root
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn task(&self, id: usize) -> &Task {
        &self.tasks[id]
    }

    pub fn task_mut(&mut self, id: usize) -> &mut Task {
        &mut self.tasks[id]
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn children(&self, v: usize) -> &[Edge] {
        &self.children[v]
    }

    pub fn parents(&self, v: usize) -> &[usize] {
        &self.tasks[v].parents
    }

    /// Edge weight between `from` and `to`, or `0` if there is no such edge.
    pub fn edge_weight(&self, from: usize, to: usize) -> f64 {
        self.children[from]
            .iter()
            .find(|e| e.to == to)
            .map(|e| e.weight)
            .unwrap_or(0.)
    }

    /// Any deterministic topological order, ties broken by task name for cross-run stability.
    pub fn topological_order(&self) -> Vec<usize> {
        let mut indegree: Vec<usize> = self.tasks.iter().map(|t| t.parents.len()).collect();
        let mut ready: BTreeSet<(String, usize)> = (0..self.tasks.len())
            .filter(|&v| indegree[v] == 0)
            .map(|v| (self.tasks[v].name.clone(), v))
            .collect();
        let mut order = Vec::with_capacity(self.tasks.len());
        while let Some((_, v)) = ready.iter().next().cloned() {
            ready.remove(&(self.tasks[v].name.clone(), v));
            order.push(v);
            for edge in &self.children[v] {
                indegree[edge.to] -= 1;
                if indegree[edge.to] == 0 {
                    ready.insert((self.tasks[edge.to].name.clone(), edge.to));
                }
            }
        }
        order
    }
}
