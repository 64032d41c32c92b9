// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt;
use std::path::PathBuf;

use crate::errors::ProcessorMapError;

/// Errors that can occur while validating a graph topology
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphValidationError {
    /// Two nodes were declared with the same id
    DuplicateNode {
        node_id: String,
    },
    /// A node lists a successor that is not declared as a node
    UnknownSuccessor {
        /// The node that declares the edge
        node_id: String,
        /// The successor that couldn't be resolved
        successor: String,
    },
    /// A join specification names a node that does not exist
    UnknownJoinNode {
        node_id: String,
    },
    /// A join node requires zero arrivals
    InvalidRequiredCount {
        node_id: String,
    },
    /// A join node requires more arrivals than it has inbound edges
    RequiredCountExceedsInDegree {
        node_id: String,
        required: usize,
        in_degree: usize,
    },
    /// A distinct-source join node requires more arrivals than it has distinct predecessors
    RequiredCountExceedsDistinctPredecessors {
        node_id: String,
        required: usize,
        predecessors: usize,
    },
    /// A cycle was detected between nodes
    CyclicDependency {
        /// The cycle path, first node repeated at the end
        cycle: Vec<String>,
    },
    /// A seed message targets a node that does not exist
    UnknownSeedNode {
        node_id: String,
    },
}

impl GraphValidationError {
    /// The node the error is about (the first node of the path for cycles)
    pub fn node_id(&self) -> &str {
        match self {
            GraphValidationError::DuplicateNode { node_id }
            | GraphValidationError::UnknownSuccessor { node_id, .. }
            | GraphValidationError::UnknownJoinNode { node_id }
            | GraphValidationError::InvalidRequiredCount { node_id }
            | GraphValidationError::RequiredCountExceedsInDegree { node_id, .. }
            | GraphValidationError::RequiredCountExceedsDistinctPredecessors { node_id, .. }
            | GraphValidationError::UnknownSeedNode { node_id } => node_id,
            GraphValidationError::CyclicDependency { cycle } => {
                cycle.first().map(String::as_str).unwrap_or_default()
            }
        }
    }
}

impl fmt::Display for GraphValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphValidationError::DuplicateNode { node_id } => {
                write!(f, "Duplicate node ID: '{}'", node_id)
            }
            GraphValidationError::UnknownSuccessor { node_id, successor } => {
                write!(
                    f,
                    "Node '{}' forwards to '{}' which does not exist",
                    node_id, successor
                )
            }
            GraphValidationError::UnknownJoinNode { node_id } => {
                write!(
                    f,
                    "Join requirement declared for '{}' which does not exist",
                    node_id
                )
            }
            GraphValidationError::InvalidRequiredCount { node_id } => {
                write!(
                    f,
                    "Join node '{}' must require at least one arrival",
                    node_id
                )
            }
            GraphValidationError::RequiredCountExceedsInDegree {
                node_id,
                required,
                in_degree,
            } => {
                write!(
                    f,
                    "Join node '{}' requires {} arrivals but only has {} inbound edge(s)",
                    node_id, required, in_degree
                )
            }
            GraphValidationError::RequiredCountExceedsDistinctPredecessors {
                node_id,
                required,
                predecessors,
            } => {
                write!(
                    f,
                    "Join node '{}' requires {} distinct sources but only has {} predecessor(s)",
                    node_id, required, predecessors
                )
            }
            GraphValidationError::CyclicDependency { cycle } => {
                write!(f, "Cyclic dependency detected: {}", cycle.join(" -> "))
            }
            GraphValidationError::UnknownSeedNode { node_id } => {
                write!(f, "Seed message targets '{}' which does not exist", node_id)
            }
        }
    }
}

impl std::error::Error for GraphValidationError {}

/// Errors raised while loading a topology file and turning it into a runtime
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid TOML config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("unsupported config format '{0}' (expected .yaml, .yml or .toml)")]
    UnsupportedFormat(String),

    #[error("invalid graph definition: {}", join_errors(.0))]
    InvalidGraph(Vec<GraphValidationError>),

    #[error(transparent)]
    ProcessorMap(#[from] ProcessorMapError),
}

impl From<Vec<GraphValidationError>> for ConfigError {
    fn from(errors: Vec<GraphValidationError>) -> Self {
        ConfigError::InvalidGraph(errors)
    }
}

fn join_errors(errors: &[GraphValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_offending_edge() {
        let error = GraphValidationError::UnknownSuccessor {
            node_id: "B".to_string(),
            successor: "Z".to_string(),
        };
        assert_eq!(error.to_string(), "Node 'B' forwards to 'Z' which does not exist");
        assert_eq!(error.node_id(), "B");
    }

    #[test]
    fn test_cycle_display() {
        let error = GraphValidationError::CyclicDependency {
            cycle: vec!["A".into(), "B".into(), "A".into()],
        };
        assert_eq!(error.to_string(), "Cyclic dependency detected: A -> B -> A");
        assert_eq!(error.node_id(), "A");
    }

    #[test]
    fn test_invalid_graph_config_error_lists_every_problem() {
        let error = ConfigError::from(vec![
            GraphValidationError::DuplicateNode {
                node_id: "A".into(),
            },
            GraphValidationError::InvalidRequiredCount {
                node_id: "D".into(),
            },
        ]);
        let message = error.to_string();
        assert!(message.contains("Duplicate node ID: 'A'"));
        assert!(message.contains("Join node 'D' must require at least one arrival"));
    }
}
