use crate::ir::{DependencyGraph, GraphNode};
use crate::util::{ResolutionError, Result};
use petgraph::graph::NodeIndex;
use petgraph::Direction;
use serde::Serialize;
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use tracing::{debug, error};

/// Resolution order over assignment indices.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Sequence {
    /// Every assignment after all of its dependencies.
    pub order: Vec<usize>,
    /// Kahn levels. Members of one batch never depend on each other.
    pub batches: Vec<Vec<usize>>,
}

impl Sequence {
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

fn rank(node: GraphNode) -> usize {
    match node {
        GraphNode::Root => 0,
        GraphNode::Assignment(i) => i + 1,
    }
}

/// Kahn's algorithm with a min-heap keyed on input position, so that among
/// ready assignments the earlier one in the batch always goes first.
pub fn sequence(graph: &DependencyGraph<'_>) -> Result<Sequence> {
    if !graph.is_dag() {
        let dump = graph.render();
        error!("cyclic dependency between resource assignments");
        return Err(ResolutionError::CyclicDependency(dump));
    }

    let inner = graph.inner();
    let mut in_degree: Vec<usize> = inner
        .node_indices()
        .map(|n| inner.neighbors_directed(n, Direction::Incoming).count())
        .collect();
    let mut level = vec![0usize; graph.len()];
    let mut ready: BinaryHeap<Reverse<(usize, NodeIndex)>> = BinaryHeap::new();
    ready.push(Reverse((rank(GraphNode::Root), graph.root())));

    let mut order = Vec::with_capacity(graph.len());
    while let Some(Reverse((_, node))) = ready.pop() {
        let current_level = match graph.node(node) {
            GraphNode::Assignment(i) => {
                order.push(i);
                level[i] + 1
            }
            GraphNode::Root => 0,
        };
        for next in inner.neighbors_directed(node, Direction::Outgoing) {
            if let GraphNode::Assignment(j) = graph.node(next) {
                level[j] = level[j].max(current_level);
            }
            in_degree[next.index()] -= 1;
            if in_degree[next.index()] == 0 {
                ready.push(Reverse((rank(graph.node(next)), next)));
            }
        }
    }

    if order.len() != graph.len() {
        return Err(ResolutionError::CyclicDependency(graph.render()));
    }

    let depth = level.iter().copied().max().map_or(0, |l| l + 1);
    let mut batches: Vec<Vec<usize>> = vec![Vec::new(); depth];
    for (i, l) in level.iter().enumerate() {
        batches[*l].push(i);
    }

    debug!(order = ?order, batches = batches.len(), "sequenced resource assignments");
    Ok(Sequence { order, batches })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::ResourceAssignment;

    fn ra(name: &str, deps: &[&str]) -> ResourceAssignment {
        ResourceAssignment::new(name)
            .with_dictionary(name)
            .with_dependencies(deps.iter().copied())
    }

    fn names(batch: &[ResourceAssignment], indices: &[usize]) -> Vec<String> {
        indices.iter().map(|&i| batch[i].name.clone()).collect()
    }

    #[test]
    fn dependencies_come_first() {
        let batch = vec![ra("b", &["a"]), ra("a", &[])];
        let graph = DependencyGraph::build(&batch).unwrap();
        let seq = sequence(&graph).unwrap();
        assert_eq!(names(&batch, &seq.order), vec!["a", "b"]);
    }

    #[test]
    fn ties_keep_input_order() {
        let batch = vec![
            ra("z", &[]),
            ra("y", &["z"]),
            ra("x", &[]),
            ra("w", &["x", "z"]),
            ra("v", &[]),
        ];
        let graph = DependencyGraph::build(&batch).unwrap();
        let seq = sequence(&graph).unwrap();
        assert_eq!(names(&batch, &seq.order), vec!["z", "y", "x", "w", "v"]);
        assert_eq!(seq.batches, vec![vec![0, 2, 4], vec![1, 3]]);
    }

    #[test]
    fn every_dependency_precedes_its_dependent() {
        let batch = vec![
            ra("e", &["d", "b"]),
            ra("d", &["c"]),
            ra("c", &["a"]),
            ra("b", &["a"]),
            ra("a", &[]),
        ];
        let graph = DependencyGraph::build(&batch).unwrap();
        let seq = sequence(&graph).unwrap();
        let position = |name: &str| {
            seq.order.iter().position(|&i| batch[i].name == name).unwrap()
        };
        for assignment in &batch {
            for dependency in &assignment.dependencies {
                assert!(position(dependency) < position(&assignment.name));
            }
        }
        assert_eq!(seq.batches.len(), 4);
        assert_eq!(names(&batch, &seq.batches[3]), vec!["e"]);
    }

    #[test]
    fn cycle_reports_both_labels() {
        let batch = vec![ra("c", &["d"]), ra("d", &["c"]), ra("e", &[])];
        let graph = DependencyGraph::build(&batch).unwrap();
        let err = sequence(&graph).unwrap_err();
        let ResolutionError::CyclicDependency(dump) = err else {
            panic!("expected a cycle");
        };
        assert!(dump.contains("(c:c)"));
        assert!(dump.contains("(d:d)"));
        assert!(dump.starts_with("* -> [(e:e)]"));
    }

    #[test]
    fn empty_batch_sequences_to_nothing() {
        let batch: Vec<ResourceAssignment> = vec![];
        let graph = DependencyGraph::build(&batch).unwrap();
        assert_eq!(sequence(&graph).unwrap(), Sequence::default());
    }
}
