// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for topology validation events.

use crate::errors::GraphValidationError;
use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// Topology passed validation and was frozen into a graph.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use channel_dag::observability::messages::validation::GraphAccepted;
///
/// let msg = GraphAccepted {
///     node_count: 5,
///     join_count: 2,
/// };
///
/// assert_eq!(msg.to_string(), "Graph validated: 5 nodes, 2 join node(s)");
/// ```
pub struct GraphAccepted {
    pub node_count: usize,
    pub join_count: usize,
}

impl Display for GraphAccepted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Graph validated: {} nodes, {} join node(s)",
            self.node_count, self.join_count
        )
    }
}

impl StructuredLog for GraphAccepted {
    fn log(&self) {
        tracing::info!(
            node_count = self.node_count,
            join_count = self.join_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "graph_validation",
            span_name = name,
            node_count = self.node_count,
            join_count = self.join_count,
        )
    }
}

/// One validation error found while building a graph.
///
/// # Log Level
/// `error!` - Configuration error
///
/// # Example
/// ```
/// use channel_dag::errors::GraphValidationError;
/// use channel_dag::observability::messages::validation::GraphRejected;
///
/// let error = GraphValidationError::UnknownSuccessor {
///     node_id: "B".to_string(),
///     successor: "Z".to_string(),
/// };
/// let msg = GraphRejected { error: &error };
///
/// tracing::error!("{}", msg);
/// ```
pub struct GraphRejected<'a> {
    pub error: &'a GraphValidationError,
}

impl Display for GraphRejected<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Graph validation failed: {}", self.error)
    }
}

impl StructuredLog for GraphRejected<'_> {
    fn log(&self) {
        tracing::error!(
            node_id = self.error.node_id(),
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "graph_validation",
            span_name = name,
            node_id = self.error.node_id(),
        )
    }
}
