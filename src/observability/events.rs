// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Structured node events.
//!
//! Runners describe what they do as [`NodeEvent`]s and hand them to every
//! registered [`EventSink`]. Sinks decide presentation: [`ChannelEventSink`] feeds
//! an async consumer (tests, a UI), [`JsonLinesEventSink`] writes one JSON object
//! per line.

use std::io::Write;
use std::sync::Mutex;

use serde::Serialize;
use tokio::sync::mpsc;
use uuid::Uuid;

/// What happened at a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeEventKind {
    Received,
    Waiting { remaining: usize },
    Released { batch_size: usize },
    Deferred,
    Processed,
    Forwarded { to: String },
    WorkFailed { error: String },
    Stopped,
}

/// One observable runner event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeEvent {
    pub node_id: String,
    #[serde(flatten)]
    pub kind: NodeEventKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<Uuid>,
}

impl NodeEvent {
    pub fn new(node_id: impl Into<String>, kind: NodeEventKind) -> Self {
        Self {
            node_id: node_id.into(),
            kind,
            payload: None,
            message_id: None,
        }
    }

    pub fn with_payload(mut self, payload: impl Into<String>) -> Self {
        self.payload = Some(payload.into());
        self
    }

    pub fn with_message_id(mut self, message_id: Uuid) -> Self {
        self.message_id = Some(message_id);
        self
    }

    /// Arrivals still missing, for `Waiting` events
    pub fn remaining(&self) -> Option<usize> {
        match self.kind {
            NodeEventKind::Waiting { remaining } => Some(remaining),
            _ => None,
        }
    }
}

/// Receiver of node events. Called synchronously from runner tasks, so
/// implementations must not block for long.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &NodeEvent);
}

/// Forwards events into an unbounded channel.
pub struct ChannelEventSink {
    sender: mpsc::UnboundedSender<NodeEvent>,
}

impl ChannelEventSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<NodeEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: &NodeEvent) {
        // Receiver gone means nobody is listening anymore.
        let _ = self.sender.send(event.clone());
    }
}

/// Writes each event as a single JSON line.
pub struct JsonLinesEventSink<W: Write + Send> {
    writer: Mutex<W>,
}

impl<W: Write + Send> JsonLinesEventSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        match self.writer.into_inner() {
            Ok(writer) => writer,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl<W: Write + Send> EventSink for JsonLinesEventSink<W> {
    fn emit(&self, event: &NodeEvent) {
        let line = match serde_json::to_string(event) {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!(node_id = %event.node_id, error = %e, "Failed to serialize node event");
                return;
            }
        };

        let mut writer = match self.writer.lock() {
            Ok(writer) => writer,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Err(e) = writeln!(writer, "{}", line).and_then(|_| writer.flush()) {
            tracing::warn!(node_id = %event.node_id, error = %e, "Failed to write node event");
        }
    }
}
