//! Task dependency graph with a dependency-first resolver.

use std::collections::HashMap;

use petgraph::Direction;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;

use super::{REGISTRY, TaskKind, TaskSpec};
use crate::error::{Error, Result};

/// Directed acyclic graph over the task table.
///
/// Edges point from a dependency to its dependent. The graph is checked for
/// cycles once at construction, so resolution never has to.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    graph: DiGraph<TaskKind, ()>,
    nodes: HashMap<TaskKind, NodeIndex>,
    order: Vec<TaskKind>,
}

impl DependencyGraph {
    /// Build the graph for the built-in [`REGISTRY`]
    pub fn from_registry() -> Result<Self> {
        Self::build(REGISTRY)
    }

    /// Build a graph from an arbitrary task table
    ///
    /// # Errors
    ///
    /// Returns [`Error::DependencyCycle`] if the table is not acyclic, and a
    /// configuration error if a dependency is not itself part of the table.
    pub fn build(specs: &[TaskSpec]) -> Result<Self> {
        let mut graph = DiGraph::with_capacity(specs.len(), specs.len() * 2);
        let mut nodes = HashMap::with_capacity(specs.len());

        for spec in specs {
            nodes.insert(spec.kind, graph.add_node(spec.kind));
        }

        for spec in specs {
            let to = nodes[&spec.kind];
            for dep in spec.dependencies {
                let from = *nodes.get(dep).ok_or_else(|| {
                    Error::config(
                        "tasks",
                        format!("task '{}' depends on unregistered task '{}'", spec.kind, dep),
                    )
                })?;
                graph.add_edge(from, to, ());
            }
        }

        let order = toposort(&graph, None)
            .map_err(|cycle| Error::DependencyCycle(graph[cycle.node_id()].to_string()))?
            .into_iter()
            .map(|idx| graph[idx])
            .collect();

        Ok(Self {
            graph,
            nodes,
            order,
        })
    }

    /// A full topological order of the table
    pub fn topological_order(&self) -> &[TaskKind] {
        &self.order
    }

    /// Direct dependencies of `task`, in declaration order
    pub fn dependencies(&self, task: TaskKind) -> Vec<TaskKind> {
        let Some(&node) = self.nodes.get(&task) else {
            return Vec::new();
        };
        let mut edges: Vec<_> = self
            .graph
            .edges_directed(node, Direction::Incoming)
            .map(|edge| (edge.id(), self.graph[edge.source()]))
            .collect();
        // petgraph walks adjacency lists newest-first
        edges.sort_by_key(|(id, _)| *id);
        edges.into_iter().map(|(_, dep)| dep).collect()
    }

    /// Every transitive dependency of `task` followed by `task` itself.
    ///
    /// Dependencies are visited depth first in declaration order, so each one
    /// appears after everything it depends on and exactly once.
    pub fn resolve(&self, task: TaskKind) -> Vec<TaskKind> {
        let mut out = Vec::new();
        self.visit(task, &mut out);
        out
    }

    fn visit(&self, task: TaskKind, out: &mut Vec<TaskKind>) {
        if out.contains(&task) {
            return;
        }
        for dep in self.dependencies(task) {
            self.visit(dep, out);
        }
        out.push(task);
    }
}
