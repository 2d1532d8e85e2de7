// src/build/graph.rs

use std::collections::HashMap;

use petgraph::Direction;
use petgraph::dot::{Config, Dot};
use petgraph::graph::{DiGraph, NodeIndex};

use crate::types::Target;

/// Dependency edges discovered while building.
///
/// Nothing here is known up front: a node appears the first time a target is
/// demanded and an edge `a -> b` appears when `a`'s handler calls
/// `need("b")`. Used for diagnostics only; scheduling never reads it.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    graph: DiGraph<Target, ()>,
    index: HashMap<Target, NodeIndex>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add_target(&mut self, target: &str) -> NodeIndex {
        if let Some(idx) = self.index.get(target) {
            return *idx;
        }
        let idx = self.graph.add_node(target.to_string());
        self.index.insert(target.to_string(), idx);
        idx
    }

    /// Record that `dependent`'s handler needed `dependency`.
    pub(crate) fn add_dependency(&mut self, dependent: &str, dependency: &str) {
        let from = self.add_target(dependent);
        let to = self.add_target(dependency);
        self.graph.update_edge(from, to, ());
    }

    /// All targets seen so far, in discovery order.
    pub fn targets(&self) -> impl Iterator<Item = &str> {
        self.graph.node_weights().map(|s| s.as_str())
    }

    pub fn contains(&self, target: &str) -> bool {
        self.index.contains_key(target)
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Targets that `target`'s handler needed.
    pub fn dependencies_of(&self, target: &str) -> Vec<&str> {
        self.neighbors(target, Direction::Outgoing)
    }

    /// Targets whose handlers needed `target`.
    pub fn dependents_of(&self, target: &str) -> Vec<&str> {
        self.neighbors(target, Direction::Incoming)
    }

    /// Graphviz rendering, edges pointing from dependent to dependency.
    pub fn to_dot(&self) -> String {
        let labelled = self.graph.map(|_, name| name.clone(), |_, _| "");
        format!("{}", Dot::with_config(&labelled, &[Config::EdgeNoLabel]))
    }

    fn neighbors(&self, target: &str, direction: Direction) -> Vec<&str> {
        let Some(idx) = self.index.get(target) else {
            return Vec::new();
        };
        let mut names: Vec<&str> = self
            .graph
            .neighbors_directed(*idx, direction)
            .map(|n| self.graph[n].as_str())
            .collect();
        names.sort_unstable();
        names
    }
}
