// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::Serialize;
use uuid::Uuid;

/// An immutable message travelling between nodes.
///
/// A message carries an opaque string payload, the id of the node that produced it
/// (`None` for seed messages injected from outside the graph) and a unique id used
/// when reporting failures and events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    id: Uuid,
    payload: String,
    source: Option<String>,
}

impl Message {
    /// Create a seed message, injected from outside the graph
    pub fn seed(payload: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            payload: payload.into(),
            source: None,
        }
    }

    /// Create a message produced by `source`
    pub fn from_node(source: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            payload: payload.into(),
            source: Some(source.into()),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn payload(&self) -> &str {
        &self.payload
    }

    /// The producing node, or `None` for seeds
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn is_seed(&self) -> bool {
        self.source.is_none()
    }
}
