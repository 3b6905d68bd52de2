use crate::meta::ResourceAssignment;
use crate::planner::validate::validate_batch;
use crate::util::Result;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::collections::HashMap;
use tracing::trace;

/// A vertex of the dependency graph. Assignments without dependencies hang
/// off the synthetic `Root` so every assignment is reachable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GraphNode {
    Root,
    Assignment(usize),
}

/// Edges point from a dependency to its dependent. Built per resolution
/// request and dropped with it.
#[derive(Debug)]
pub struct DependencyGraph<'a> {
    assignments: &'a [ResourceAssignment],
    graph: DiGraph<GraphNode, ()>,
    root: NodeIndex,
    nodes: Vec<NodeIndex>,
}

impl<'a> DependencyGraph<'a> {
    /// Validates the batch (duplicate names, duplicate dictionary names,
    /// dangling dependency names, all reported together) and then links
    /// every assignment to the assignments it depends on.
    pub fn build(assignments: &'a [ResourceAssignment]) -> Result<Self> {
        validate_batch(assignments)?;

        let mut graph = DiGraph::with_capacity(assignments.len() + 1, assignments.len());
        let root = graph.add_node(GraphNode::Root);
        let nodes: Vec<NodeIndex> = (0..assignments.len())
            .map(|i| graph.add_node(GraphNode::Assignment(i)))
            .collect();
        let by_name: HashMap<&str, usize> = assignments
            .iter()
            .enumerate()
            .map(|(i, ra)| (ra.name.as_str(), i))
            .collect();

        for (i, ra) in assignments.iter().enumerate() {
            if ra.dependencies.is_empty() {
                graph.update_edge(root, nodes[i], ());
                continue;
            }
            for dependency in &ra.dependencies {
                // validate_batch has already rejected dangling names
                if let Some(&d) = by_name.get(dependency.as_str()) {
                    trace!(from = %dependency, to = %ra.name, "graph link");
                    graph.update_edge(nodes[d], nodes[i], ());
                }
            }
        }

        Ok(Self { assignments, graph, root, nodes })
    }

    pub fn assignments(&self) -> &'a [ResourceAssignment] {
        self.assignments
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn is_dag(&self) -> bool {
        !petgraph::algo::is_cyclic_directed(&self.graph)
    }

    pub fn node(&self, index: NodeIndex) -> GraphNode {
        self.graph[index]
    }

    pub fn root(&self) -> NodeIndex {
        self.root
    }

    pub fn index_of(&self, assignment: usize) -> NodeIndex {
        self.nodes[assignment]
    }

    pub fn inner(&self) -> &DiGraph<GraphNode, ()> {
        &self.graph
    }

    /// Assignments that list `node` as a dependency, in input order.
    pub fn dependents(&self, node: NodeIndex) -> Vec<usize> {
        let mut out: Vec<usize> = self
            .graph
            .neighbors_directed(node, Direction::Outgoing)
            .filter_map(|n| match self.graph[n] {
                GraphNode::Assignment(i) => Some(i),
                GraphNode::Root => None,
            })
            .collect();
        out.sort_unstable();
        out
    }

    /// One line per node: `(dictionaryName:name) -> [dependents]`, the root
    /// rendered as `*`.
    pub fn render(&self) -> String {
        let mut lines = Vec::with_capacity(self.nodes.len() + 1);
        let mut line = |label: String, node: NodeIndex| {
            let dependents: Vec<String> = self
                .dependents(node)
                .into_iter()
                .map(|i| self.assignments[i].label())
                .collect();
            lines.push(format!("{} -> [{}]", label, dependents.join(", ")));
        };
        line("*".to_string(), self.root);
        for (i, ra) in self.assignments.iter().enumerate() {
            line(ra.label(), self.nodes[i]);
        }
        lines.join("\n")
    }
}
