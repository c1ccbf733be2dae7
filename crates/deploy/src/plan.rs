//! Deployment order planning.

use derive_more::{Deref, From};
use serde::{Deserialize, Serialize};

use crate::graph::DependencyGraph;

/// Contract names in deployment order: index 0 is deployed first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Deref, From)]
pub struct DeploymentPlan(Vec<String>);

impl DeploymentPlan {
    pub fn position(&self, name: &str) -> Option<usize> {
        self.0.iter().position(|n| n == name)
    }

    pub fn into_inner(self) -> Vec<String> {
        self.0
    }
}

/// Post-order depth-first traversal of `graph`.
///
/// Roots are visited in node insertion order and each node's dependencies in edge
/// insertion order, so every dependency is emitted before its dependents and the result
/// is the same on every run.
pub fn plan_order(graph: &DependencyGraph) -> DeploymentPlan {
    let nodes = graph.nodes();
    let mut visited = vec![false; nodes.len()];
    let mut order = Vec::with_capacity(nodes.len());
    // (node, index of the next successor to explore)
    let mut stack: Vec<(usize, usize)> = Vec::new();

    for root in 0..nodes.len() {
        if visited[root] {
            continue;
        }
        visited[root] = true;
        stack.push((root, 0));

        while let Some((node, next)) = stack.last_mut() {
            let node = *node;
            match graph.successors(node).get(*next) {
                Some(&child) => {
                    *next += 1;
                    if !visited[child] {
                        visited[child] = true;
                        stack.push((child, 0));
                    }
                }
                None => {
                    stack.pop();
                    order.push(nodes[node].clone());
                }
            }
        }
    }

    DeploymentPlan(order)
}
