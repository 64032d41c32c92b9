// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Topology validation for graph integrity and executability.
//!
//! Validation runs before any runner is spawned and accumulates every problem it can
//! find, so a broken topology file reports all of its mistakes at once.
//!
//! # Validation Pipeline
//!
//! 1. **Uniqueness**: every node id is declared once
//! 2. **References**: every successor names a declared node
//! 3. **Join requirements**: every required count is at least 1 and no larger than
//!    the node's in-degree (or its distinct predecessor count under
//!    [`JoinPolicy::DistinctSource`])
//! 4. **Cycle detection**: DFS with a recursion stack, reporting the cycle path
//!
//! Cycle detection needs a structurally valid graph, so it only runs when the
//! uniqueness and reference checks pass. Nodes are visited in declaration order,
//! which makes the result (including error order) deterministic.
//!
//! # Example
//! ```rust
//! use channel_dag::config::{validate_topology, NodeConfig};
//! use channel_dag::engine::JoinPolicy;
//! use channel_dag::errors::GraphValidationError;
//!
//! let nodes = vec![
//!     NodeConfig::new("A", ["B"]),
//!     NodeConfig::new("B", ["Z"]),
//! ];
//!
//! let errors = validate_topology(&nodes, JoinPolicy::CountBased).unwrap_err();
//! assert_eq!(
//!     errors,
//!     vec![GraphValidationError::UnknownSuccessor {
//!         node_id: "B".to_string(),
//!         successor: "Z".to_string(),
//!     }]
//! );
//! ```

use std::collections::{HashMap, HashSet};

use crate::config::{Config, NodeConfig};
use crate::engine::JoinPolicy;
use crate::errors::GraphValidationError;

/// Validates a list of node definitions.
///
/// # Returns
///
/// * `Ok(())` - The topology can be turned into a [`crate::engine::Graph`]
/// * `Err(Vec<GraphValidationError>)` - Every problem found
pub fn validate_topology(
    nodes: &[NodeConfig],
    default_policy: JoinPolicy,
) -> Result<(), Vec<GraphValidationError>> {
    let mut errors = Vec::new();

    if let Err(duplicate_errors) = validate_unique_node_ids(nodes) {
        errors.extend(duplicate_errors);
    }

    if let Err(unresolved_errors) = validate_successor_references(nodes) {
        errors.extend(unresolved_errors);
    }

    let structurally_valid = errors.is_empty();

    if let Err(join_errors) = validate_join_requirements(nodes, default_policy) {
        errors.extend(join_errors);
    }

    // Cycle detection needs resolvable references and unique ids
    if structurally_valid {
        if let Err(cycle_errors) = validate_acyclic_graph(nodes) {
            errors.extend(cycle_errors);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validates a whole configuration: the topology plus every seed target.
pub fn validate_config(config: &Config) -> Result<(), Vec<GraphValidationError>> {
    let mut errors = match validate_topology(&config.nodes, config.join_policy) {
        Ok(()) => Vec::new(),
        Err(errors) => errors,
    };

    let node_ids: HashSet<&str> = config.nodes.iter().map(|n| n.id.as_str()).collect();
    for seed in &config.seeds {
        if !node_ids.contains(seed.node.as_str()) {
            errors.push(GraphValidationError::UnknownSeedNode {
                node_id: seed.node.clone(),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_unique_node_ids(nodes: &[NodeConfig]) -> Result<(), Vec<GraphValidationError>> {
    let mut seen_ids = HashSet::new();
    let mut errors = Vec::new();

    for node in nodes {
        if !seen_ids.insert(node.id.as_str()) {
            errors.push(GraphValidationError::DuplicateNode {
                node_id: node.id.clone(),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Every successor must be declared as a node. A typo in a successor name would
/// otherwise leave a message with nowhere to go.
fn validate_successor_references(nodes: &[NodeConfig]) -> Result<(), Vec<GraphValidationError>> {
    let node_ids: HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
    let mut errors = Vec::new();

    for node in nodes {
        for successor in &node.successors {
            if !node_ids.contains(successor.as_str()) {
                errors.push(GraphValidationError::UnknownSuccessor {
                    node_id: node.id.clone(),
                    successor: successor.clone(),
                });
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// A join node that requires more arrivals than can ever reach it would wait
/// forever, and so would everything downstream of it.
fn validate_join_requirements(
    nodes: &[NodeConfig],
    default_policy: JoinPolicy,
) -> Result<(), Vec<GraphValidationError>> {
    // One entry per inbound edge; repeated edges from the same node count twice
    let mut predecessors: HashMap<&str, Vec<&str>> = HashMap::new();
    for node in nodes {
        for successor in &node.successors {
            predecessors
                .entry(successor.as_str())
                .or_default()
                .push(node.id.as_str());
        }
    }

    let mut errors = Vec::new();

    for node in nodes {
        let Some(required) = node.requires else {
            continue;
        };

        if required == 0 {
            errors.push(GraphValidationError::InvalidRequiredCount {
                node_id: node.id.clone(),
            });
            continue;
        }

        let inbound = predecessors
            .get(node.id.as_str())
            .map(Vec::as_slice)
            .unwrap_or_default();

        if required > inbound.len() {
            errors.push(GraphValidationError::RequiredCountExceedsInDegree {
                node_id: node.id.clone(),
                required,
                in_degree: inbound.len(),
            });
            continue;
        }

        if node.join_policy.unwrap_or(default_policy) == JoinPolicy::DistinctSource {
            let distinct: HashSet<&str> = inbound.iter().copied().collect();
            if required > distinct.len() {
                errors.push(GraphValidationError::RequiredCountExceedsDistinctPredecessors {
                    node_id: node.id.clone(),
                    required,
                    predecessors: distinct.len(),
                });
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// A cycle would keep every join barrier on it (and downstream of it) from ever
/// releasing. Uses the "three colors" DFS approach and reports the first cycle found.
fn validate_acyclic_graph(nodes: &[NodeConfig]) -> Result<(), Vec<GraphValidationError>> {
    let graph: HashMap<&str, Vec<&str>> = nodes
        .iter()
        .map(|node| {
            (
                node.id.as_str(),
                node.successors.iter().map(String::as_str).collect(),
            )
        })
        .collect();

    let mut visited = HashSet::new();
    let mut rec_stack = HashSet::new();
    let mut path = Vec::new();

    for node in nodes {
        if !visited.contains(node.id.as_str()) {
            if let Some(cycle) = dfs_cycle_detection(
                node.id.as_str(),
                &graph,
                &mut visited,
                &mut rec_stack,
                &mut path,
            ) {
                return Err(vec![GraphValidationError::CyclicDependency { cycle }]);
            }
        }
    }

    Ok(())
}

/// Depth-first search with cycle detection and path tracking.
///
/// * `visited` - fully explored nodes (black)
/// * `rec_stack` - nodes on the current path (gray)
/// * `path` - current DFS path, used to cut out the cycle on a back edge
///
/// For A → B → C → A the back edge C → A finds A at position 0 of [A, B, C] and
/// returns [A, B, C, A].
fn dfs_cycle_detection<'a>(
    node: &'a str,
    graph: &HashMap<&'a str, Vec<&'a str>>,
    visited: &mut HashSet<&'a str>,
    rec_stack: &mut HashSet<&'a str>,
    path: &mut Vec<&'a str>,
) -> Option<Vec<String>> {
    visited.insert(node);
    rec_stack.insert(node);
    path.push(node);

    if let Some(neighbors) = graph.get(node) {
        for &neighbor in neighbors {
            if !visited.contains(neighbor) {
                if let Some(cycle) = dfs_cycle_detection(neighbor, graph, visited, rec_stack, path)
                {
                    return Some(cycle);
                }
            } else if rec_stack.contains(neighbor) {
                let cycle_start = path.iter().position(|&p| p == neighbor).unwrap_or(0);
                let mut cycle: Vec<String> =
                    path[cycle_start..].iter().map(|p| p.to_string()).collect();
                cycle.push(neighbor.to_string());
                return Some(cycle);
            }
        }
    }

    rec_stack.remove(node);
    path.pop();
    None
}
