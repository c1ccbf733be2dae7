//! Dependency graph over contract names with eager cycle rejection.

use std::collections::HashMap;

use crate::{
    artifact::ContractArtifact,
    error::{DeployError, DeployResult},
    extract::extract_dependencies,
};

/// Directed graph of `dependent -> dependency` edges.
///
/// Nodes keep their insertion order and each node keeps its successors in insertion
/// order, so traversals are deterministic. The graph is acyclic at all times.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyGraph {
    nodes: Vec<String>,
    index: HashMap<String, usize>,
    edges: Vec<Vec<usize>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `name` if absent and return its node index.
    pub fn add_node(&mut self, name: &str) -> usize {
        if let Some(&idx) = self.index.get(name) {
            return idx;
        }
        let idx = self.nodes.len();
        self.nodes.push(name.to_string());
        self.index.insert(name.to_string(), idx);
        self.edges.push(Vec::new());
        idx
    }

    /// Add the edge `from -> to`, creating both nodes if needed.
    ///
    /// The edge is rejected with [`DeployError::Cycle`] and not retained if it would close
    /// a cycle, including `from == to`. Adding an existing edge is a no-op.
    pub fn add_edge(&mut self, from: &str, to: &str) -> DeployResult<()> {
        let f = self.add_node(from);
        let t = self.add_node(to);

        if self.edges[f].contains(&t) {
            return Ok(());
        }

        // The graph is acyclic, so the new edge closes a cycle iff `to` already reaches `from`.
        if self.reaches(t, f) {
            return Err(DeployError::Cycle {
                from: from.to_string(),
                to: to.to_string(),
            });
        }

        self.edges[f].push(t);
        Ok(())
    }

    fn reaches(&self, start: usize, target: usize) -> bool {
        let mut visited = vec![false; self.nodes.len()];
        let mut stack = vec![start];
        while let Some(node) = stack.pop() {
            if node == target {
                return true;
            }
            if std::mem::replace(&mut visited[node], true) {
                continue;
            }
            stack.extend(self.edges[node].iter().copied().filter(|&n| !visited[n]));
        }
        false
    }

    /// Node names in insertion order.
    pub fn nodes(&self) -> &[String] {
        &self.nodes
    }

    /// Direct dependencies of `name` in insertion order.
    pub fn dependencies(&self, name: &str) -> Option<impl Iterator<Item = &str>> {
        let idx = *self.index.get(name)?;
        Some(self.edges[idx].iter().map(|&n| self.nodes[n].as_str()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.iter().map(Vec::len).sum()
    }

    pub(crate) fn successors(&self, idx: usize) -> &[usize] {
        &self.edges[idx]
    }
}

/// Build the dependency graph of `artifacts`, processed in the given order.
///
/// Fails fast on the first edge that would introduce a cycle.
pub fn build_graph(artifacts: &[ContractArtifact]) -> DeployResult<DependencyGraph> {
    let mut graph = DependencyGraph::new();
    for artifact in artifacts {
        graph.add_node(&artifact.name);
        for dependency in extract_dependencies(artifact) {
            graph.add_edge(&artifact.name, &dependency)?;
        }
    }

    tracing::debug!(
        nodes = graph.len(),
        edges = graph.edge_count(),
        "Dependency graph built"
    );
    Ok(graph)
}
