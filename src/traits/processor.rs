// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;

use crate::engine::Message;
use crate::errors::ProcessorError;

/// Input to one firing of a node: a single message for fan-out nodes, the released
/// batch for join nodes.
#[derive(Debug, Clone)]
pub struct ProcessorRequest {
    pub node_id: String,
    pub inputs: Vec<Message>,
}

impl ProcessorRequest {
    pub fn new(node_id: impl Into<String>, inputs: Vec<Message>) -> Self {
        Self {
            node_id: node_id.into(),
            inputs,
        }
    }

    pub fn payloads(&self) -> impl Iterator<Item = &str> {
        self.inputs.iter().map(Message::payload)
    }

    /// Input payloads joined with `separator`, in arrival order
    pub fn joined_payload(&self, separator: &str) -> String {
        self.payloads().collect::<Vec<_>>().join(separator)
    }
}

/// The unit of work a node performs each time it fires.
///
/// Returns `Ok(Some(payload))` to forward a message to every successor,
/// `Ok(None)` to fire without forwarding, or an error that the runner reports
/// before moving on to its next message.
#[async_trait]
pub trait Processor: Send + Sync {
    async fn process(&self, req: ProcessorRequest) -> Result<Option<String>, ProcessorError>;

    fn name(&self) -> &'static str;
}
