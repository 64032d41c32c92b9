// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The immutable, validated topology a run executes.
//!
//! A [`Graph`] is built exactly once, through [`Graph::new`] or [`GraphBuilder`],
//! and every construction path goes through the same validation (see
//! [`crate::config::validate_topology`]). Once built it is never mutated; the
//! scheduler shares it with runners read-only.
//!
//! # Example
//! ```
//! use channel_dag::engine::Graph;
//!
//! let graph = Graph::builder()
//!     .node("A", ["B", "C"])
//!     .node("B", ["D"])
//!     .node("C", ["D"])
//!     .node("D", ["E"])
//!     .node("E", Vec::<String>::new())
//!     .join("D", 2)
//!     .join("E", 1)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(graph.node("D").unwrap().in_degree(), 2);
//! assert_eq!(graph.sources().map(|n| n.id()).collect::<Vec<_>>(), vec!["A"]);
//! ```

use std::collections::HashMap;

use crate::config::{validate_topology, NodeConfig};
use crate::engine::JoinPolicy;
use crate::errors::GraphValidationError;
use crate::observability::messages::validation::{GraphAccepted, GraphRejected};
use crate::observability::messages::StructuredLog;

/// Join requirement of a node: how many arrivals, counted under which policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinSpec {
    pub required: usize,
    pub policy: JoinPolicy,
}

/// One node of a validated graph.
#[derive(Debug, Clone)]
pub struct Node {
    id: String,
    successors: Vec<String>,
    predecessors: Vec<String>,
    join: Option<JoinSpec>,
}

impl Node {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Successors in declaration order
    pub fn successors(&self) -> &[String] {
        &self.successors
    }

    /// One entry per inbound edge
    pub fn predecessors(&self) -> &[String] {
        &self.predecessors
    }

    pub fn in_degree(&self) -> usize {
        self.predecessors.len()
    }

    pub fn join(&self) -> Option<JoinSpec> {
        self.join
    }

    pub fn is_join(&self) -> bool {
        self.join.is_some()
    }
}

/// Immutable node set with successor edges and join requirements.
#[derive(Debug, Clone)]
pub struct Graph {
    nodes: Vec<Node>,
    index: HashMap<String, usize>,
}

impl Graph {
    /// Build a count-based graph from a node → successors mapping and a
    /// node → required-count mapping (join nodes only).
    ///
    /// Nodes are ordered by id so that validating the same maps always reports the
    /// same errors in the same order.
    pub fn new<S, R>(successors: S, required: R) -> Result<Self, Vec<GraphValidationError>>
    where
        S: IntoIterator<Item = (String, Vec<String>)>,
        R: IntoIterator<Item = (String, usize)>,
    {
        let mut nodes: Vec<(String, Vec<String>)> = successors.into_iter().collect();
        nodes.sort_by(|a, b| a.0.cmp(&b.0));

        let mut joins: Vec<(String, usize)> = required.into_iter().collect();
        joins.sort();

        let builder = nodes
            .into_iter()
            .fold(GraphBuilder::new(), |builder, (id, successors)| {
                builder.node(id, successors)
            });

        joins
            .into_iter()
            .fold(builder, |builder, (id, count)| builder.join(id, count))
            .build()
    }

    pub fn builder() -> GraphBuilder {
        GraphBuilder::new()
    }

    /// Nodes in declaration order
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes without inbound edges
    pub fn sources(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(|node| node.in_degree() == 0)
    }

    pub fn join_nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(|node| node.is_join())
    }

    fn assemble(definitions: Vec<NodeConfig>, default_policy: JoinPolicy) -> Self {
        let index: HashMap<String, usize> = definitions
            .iter()
            .enumerate()
            .map(|(i, node)| (node.id.clone(), i))
            .collect();

        let mut nodes: Vec<Node> = definitions
            .into_iter()
            .map(|definition| Node {
                join: definition.requires.map(|required| JoinSpec {
                    required,
                    policy: definition.join_policy.unwrap_or(default_policy),
                }),
                id: definition.id,
                successors: definition.successors,
                predecessors: Vec::new(),
            })
            .collect();

        let edges: Vec<(String, String)> = nodes
            .iter()
            .flat_map(|node| {
                node.successors
                    .iter()
                    .map(move |successor| (node.id.clone(), successor.clone()))
            })
            .collect();

        for (from, to) in edges {
            if let Some(&i) = index.get(&to) {
                nodes[i].predecessors.push(from);
            }
        }

        Self { nodes, index }
    }
}

/// Incremental graph construction.
///
/// Join requirements may be declared before or after the node they apply to; they
/// are matched up in [`GraphBuilder::build`], which also runs validation.
#[derive(Debug, Clone, Default)]
pub struct GraphBuilder {
    nodes: Vec<NodeConfig>,
    joins: Vec<(String, usize, Option<JoinPolicy>)>,
    default_policy: JoinPolicy,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a node and its ordered successors
    pub fn node<I, S>(self, id: impl Into<String>, successors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.add_node(NodeConfig::new(id, successors))
    }

    /// Declare a node from a full definition
    pub fn add_node(mut self, node: NodeConfig) -> Self {
        self.nodes.push(node);
        self
    }

    /// Make `id` a join node requiring `required` arrivals under the default policy
    pub fn join(mut self, id: impl Into<String>, required: usize) -> Self {
        self.joins.push((id.into(), required, None));
        self
    }

    pub fn join_with_policy(
        mut self,
        id: impl Into<String>,
        required: usize,
        policy: JoinPolicy,
    ) -> Self {
        self.joins.push((id.into(), required, Some(policy)));
        self
    }

    /// Policy for join nodes that don't name one
    pub fn default_join_policy(mut self, policy: JoinPolicy) -> Self {
        self.default_policy = policy;
        self
    }

    /// Validate and freeze the topology
    pub fn build(self) -> Result<Graph, Vec<GraphValidationError>> {
        let GraphBuilder {
            mut nodes,
            joins,
            default_policy,
        } = self;

        let mut errors = Vec::new();

        for (id, required, policy) in joins {
            match nodes.iter_mut().find(|node| node.id == id) {
                Some(node) => {
                    node.requires = Some(required);
                    if policy.is_some() {
                        node.join_policy = policy;
                    }
                }
                None => errors.push(GraphValidationError::UnknownJoinNode { node_id: id }),
            }
        }

        if let Err(validation_errors) = validate_topology(&nodes, default_policy) {
            errors.extend(validation_errors);
        }

        if !errors.is_empty() {
            for error in &errors {
                GraphRejected { error }.log();
            }
            return Err(errors);
        }

        let graph = Graph::assemble(nodes, default_policy);
        GraphAccepted {
            node_count: graph.len(),
            join_count: graph.join_nodes().count(),
        }
        .log();

        Ok(graph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference_maps() -> (Vec<(String, Vec<String>)>, Vec<(String, usize)>) {
        let successors = vec![
            ("A".to_string(), vec!["B".to_string(), "C".to_string()]),
            ("B".to_string(), vec!["D".to_string()]),
            ("C".to_string(), vec!["D".to_string()]),
            ("D".to_string(), vec!["E".to_string()]),
            ("E".to_string(), vec![]),
        ];
        let required = vec![("D".to_string(), 2), ("E".to_string(), 1)];
        (successors, required)
    }

    #[test]
    fn test_new_builds_reference_topology() {
        let (successors, required) = reference_maps();
        let graph = Graph::new(successors, required).unwrap();

        assert_eq!(graph.len(), 5);
        let d = graph.node("D").unwrap();
        assert_eq!(d.predecessors(), ["B".to_string(), "C".to_string()]);
        assert_eq!(
            d.join(),
            Some(JoinSpec {
                required: 2,
                policy: JoinPolicy::CountBased
            })
        );
        assert!(!graph.node("A").unwrap().is_join());
        assert_eq!(graph.node("A").unwrap().successors(), ["B", "C"]);
        assert_eq!(graph.join_nodes().count(), 2);
    }

    #[test]
    fn test_new_from_hash_maps_is_deterministic() {
        let (successors, required) = reference_maps();
        let successors: HashMap<String, Vec<String>> = successors.into_iter().collect();
        let required: HashMap<String, usize> = required.into_iter().collect();

        let graph = Graph::new(successors, required).unwrap();
        let ids: Vec<&str> = graph.nodes().map(Node::id).collect();
        assert_eq!(ids, vec!["A", "B", "C", "D", "E"]);
    }

    #[test]
    fn test_unknown_successor_fails_construction() {
        let result = Graph::builder()
            .node("A", ["B"])
            .node("B", ["Nope"])
            .build();

        let errors = result.unwrap_err();
        assert_eq!(
            errors,
            vec![GraphValidationError::UnknownSuccessor {
                node_id: "B".to_string(),
                successor: "Nope".to_string(),
            }]
        );
    }

    #[test]
    fn test_join_for_undeclared_node() {
        let errors = Graph::builder()
            .node("A", Vec::<String>::new())
            .join("ghost", 1)
            .build()
            .unwrap_err();
        assert_eq!(
            errors,
            vec![GraphValidationError::UnknownJoinNode {
                node_id: "ghost".to_string()
            }]
        );
    }

    #[test]
    fn test_join_may_be_declared_before_node() {
        let graph = Graph::builder()
            .join_with_policy("J", 2, JoinPolicy::DistinctSource)
            .node("A", ["J"])
            .node("B", ["J"])
            .node("J", Vec::<String>::new())
            .build()
            .unwrap();

        assert_eq!(
            graph.node("J").unwrap().join(),
            Some(JoinSpec {
                required: 2,
                policy: JoinPolicy::DistinctSource
            })
        );
    }

    #[test]
    fn test_default_policy_applies_to_joins() {
        let graph = Graph::builder()
            .default_join_policy(JoinPolicy::DistinctSource)
            .node("A", ["J"])
            .node("B", ["J"])
            .node("J", Vec::<String>::new())
            .join("J", 2)
            .build()
            .unwrap();

        assert_eq!(
            graph.node("J").unwrap().join().map(|j| j.policy),
            Some(JoinPolicy::DistinctSource)
        );
    }

    #[test]
    fn test_sources_and_lookup() {
        let graph = Graph::builder()
            .node("A", ["C"])
            .node("B", ["C"])
            .node("C", Vec::<String>::new())
            .build()
            .unwrap();

        let sources: Vec<&str> = graph.sources().map(Node::id).collect();
        assert_eq!(sources, vec!["A", "B"]);
        assert!(graph.contains("C"));
        assert!(!graph.contains("Z"));
        assert!(graph.node("Z").is_none());
        assert!(!graph.is_empty());
    }

    #[test]
    fn test_cycle_fails_construction() {
        let errors = Graph::builder()
            .node("A", ["B"])
            .node("B", ["A"])
            .build()
            .unwrap_err();
        assert!(matches!(
            errors[0],
            GraphValidationError::CyclicDependency { .. }
        ));
    }
}
