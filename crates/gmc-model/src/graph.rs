//! Explicit in-memory transition graphs.
//!
//! `ExplicitGraph` is the simplest possible model: numbered nodes and an
//! ordered edge list. It implements every capability contract, which makes
//! it the reference model for tests and for embedders whose state graph is
//! already materialized.

use std::collections::{BTreeSet, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::enabler::Enabler;
use crate::manager::StateManager;
use crate::predicate::StatePredicate;
use crate::sequence::VecSequence;

pub type NodeId = u32;

#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("graph JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("edge '{label}' references unknown node {node} (graph has {count} nodes)")]
    DanglingEdge {
        label: String,
        node: NodeId,
        count: usize,
    },

    #[error("initial node {0} does not exist")]
    UnknownInitial(NodeId),

    #[error("graph has {0} nodes, more than node ids can address")]
    TooManyNodes(usize),
}

/// A directed, labelled edge. Edges leave a node in insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GraphEdge {
    pub from: NodeId,
    pub to: NodeId,
    pub label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplicitGraph {
    /// Node labels, indexed by `NodeId`.
    pub nodes: Vec<String>,
    pub edges: Vec<GraphEdge>,
    pub initial: NodeId,
}

impl ExplicitGraph {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
            initial: 0,
        }
    }

    /// # Panics
    ///
    /// Panics if the graph already holds `NodeId::MAX + 1` nodes.
    pub fn add_node(&mut self, label: &str) -> NodeId {
        let id = node_id(self.nodes.len());
        self.nodes.push(label.to_string());
        id
    }

    pub fn add_edge(&mut self, from: NodeId, to: NodeId, label: &str) {
        self.edges.push(GraphEdge {
            from,
            to,
            label: label.to_string(),
        });
    }

    pub fn label(&self, node: NodeId) -> &str {
        self.nodes
            .get(node as usize)
            .map(String::as_str)
            .unwrap_or("?")
    }

    /// Node id for a label (first match).
    pub fn node(&self, label: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .position(|l| l == label)
            .and_then(|i| NodeId::try_from(i).ok())
    }

    /// Outgoing edges of `node`, in insertion order.
    pub fn successors(&self, node: NodeId) -> Vec<GraphEdge> {
        self.edges
            .iter()
            .filter(|e| e.from == node)
            .cloned()
            .collect()
    }

    /// Parse and validate a graph from JSON.
    pub fn from_json(json: &str) -> Result<Self, GraphError> {
        let graph: ExplicitGraph = serde_json::from_str(json)?;
        graph.validate()?;
        Ok(graph)
    }

    pub fn to_json(&self) -> Result<String, GraphError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), GraphError> {
        let count = self.nodes.len();
        if NodeId::try_from(count).is_err() {
            return Err(GraphError::TooManyNodes(count));
        }
        if self.initial as usize >= count {
            return Err(GraphError::UnknownInitial(self.initial));
        }
        for edge in &self.edges {
            for node in [edge.from, edge.to] {
                if node as usize >= count {
                    return Err(GraphError::DanglingEdge {
                        label: edge.label.clone(),
                        node,
                        count,
                    });
                }
            }
        }
        Ok(())
    }
}

fn node_id(index: usize) -> NodeId {
    match NodeId::try_from(index) {
        Ok(id) => id,
        Err(_) => panic!("node index {index} exceeds the NodeId range"),
    }
}

impl Default for ExplicitGraph {
    fn default() -> Self {
        Self::new()
    }
}

/// Enables every outgoing edge of a node, in insertion order.
pub struct GraphEnabler<'g> {
    graph: &'g ExplicitGraph,
}

impl<'g> GraphEnabler<'g> {
    pub fn new(graph: &'g ExplicitGraph) -> Self {
        Self { graph }
    }
}

impl<'g> Enabler for GraphEnabler<'g> {
    type State = NodeId;
    type Transition = GraphEdge;
    type Sequence = VecSequence<NodeId, GraphEdge>;

    fn enabled_transitions(&mut self, source: &NodeId) -> Self::Sequence {
        VecSequence::new(*source, self.graph.successors(*source))
    }
}

/// Hash-set backed seen/on-stack bookkeeping over graph nodes.
pub struct GraphStateManager<'g> {
    graph: &'g ExplicitGraph,
    seen: HashSet<NodeId>,
    on_stack: HashSet<NodeId>,
}

impl<'g> GraphStateManager<'g> {
    pub fn new(graph: &'g ExplicitGraph) -> Self {
        Self {
            graph,
            seen: HashSet::new(),
            on_stack: HashSet::new(),
        }
    }

    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }

    /// Nodes currently flagged on-stack, sorted.
    pub fn stack_nodes(&self) -> Vec<NodeId> {
        let sorted: BTreeSet<NodeId> = self.on_stack.iter().copied().collect();
        sorted.into_iter().collect()
    }
}

impl<'g> StateManager for GraphStateManager<'g> {
    type State = NodeId;
    type Transition = GraphEdge;

    fn next_state(&mut self, _state: &NodeId, transition: &GraphEdge) -> NodeId {
        transition.to
    }

    fn seen(&self, state: &NodeId) -> bool {
        self.seen.contains(state)
    }

    fn set_seen(&mut self, state: &NodeId, value: bool) {
        if value {
            self.seen.insert(*state);
        } else {
            self.seen.remove(state);
        }
    }

    fn on_stack(&self, state: &NodeId) -> bool {
        self.on_stack.contains(state)
    }

    fn set_on_stack(&mut self, state: &NodeId, value: bool) {
        if value {
            self.on_stack.insert(*state);
        } else {
            self.on_stack.remove(state);
        }
    }

    fn state_summary(&self, state: &NodeId) -> String {
        self.graph.label(*state).to_string()
    }

    fn state_details(&self, state: &NodeId) -> String {
        format!("node {} ({})", state, self.graph.label(*state))
    }

    fn transition_summary(&self, transition: &GraphEdge) -> String {
        transition.label.clone()
    }
}

/// Holds at any node in a fixed target set.
pub struct NodePredicate {
    name: String,
    targets: HashSet<NodeId>,
    last_hit: Option<NodeId>,
}

impl NodePredicate {
    pub fn new(name: &str, targets: impl IntoIterator<Item = NodeId>) -> Self {
        Self {
            name: name.to_string(),
            targets: targets.into_iter().collect(),
            last_hit: None,
        }
    }
}

impl fmt::Display for NodePredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl StatePredicate<NodeId> for NodePredicate {
    fn holds_at(&mut self, state: &NodeId) -> bool {
        let hit = self.targets.contains(state);
        if hit {
            self.last_hit = Some(*state);
        }
        hit
    }

    fn explanation(&self) -> String {
        match self.last_hit {
            Some(node) => format!("{}: reached target node {}", self.name, node),
            None => format!("{}: no target node reached", self.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_id_in_range() {
        assert_eq!(node_id(0), 0);
        assert_eq!(node_id(NodeId::MAX as usize), NodeId::MAX);
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    #[should_panic(expected = "exceeds the NodeId range")]
    fn test_node_id_overflow_panics() {
        node_id(NodeId::MAX as usize + 1);
    }
}
