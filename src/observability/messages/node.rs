// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for node runner events.
//!
//! This module contains message types for logging events related to:
//! * Message arrival and join barrier progress
//! * Work-step completion and failure
//! * Forwarding to successors
//! * Runner state transitions and shutdown

use crate::engine::RunnerState;
use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use std::time::Duration;
use tracing::Span;

/// A runner moved between lifecycle states.
///
/// # Log Level
/// `trace!` - Very chatty, one per transition
pub struct StateTransition<'a> {
    pub node_id: &'a str,
    pub from: RunnerState,
    pub to: RunnerState,
}

impl Display for StateTransition<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Node '{}': {} -> {}", self.node_id, self.from, self.to)
    }
}

impl StructuredLog for StateTransition<'_> {
    fn log(&self) {
        tracing::trace!(
            node_id = self.node_id,
            from = %self.from,
            to = %self.to,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::trace_span!("state_transition", span_name = name, node_id = self.node_id)
    }
}

/// A message was taken from a node's mailbox.
///
/// # Log Level
/// `debug!` - Per-message detail
pub struct MessageReceived<'a> {
    pub node_id: &'a str,
    pub message_id: &'a str,
    pub source: Option<&'a str>,
    pub payload: &'a str,
}

impl Display for MessageReceived<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Node '{}' received message from {}: {}",
            self.node_id,
            self.source.unwrap_or("seed"),
            self.payload
        )
    }
}

impl StructuredLog for MessageReceived<'_> {
    fn log(&self) {
        tracing::debug!(
            node_id = self.node_id,
            message_id = self.message_id,
            source = self.source.unwrap_or("seed"),
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "message",
            span_name = name,
            node_id = self.node_id,
            message_id = self.message_id,
        )
    }
}

/// A join node recorded an arrival but has not reached its required count.
///
/// # Log Level
/// `info!` - Visible progress of a join
///
/// # Example
/// ```
/// use channel_dag::observability::messages::node::WaitingForArrivals;
///
/// let msg = WaitingForArrivals {
///     node_id: "D",
///     arrived: 1,
///     remaining: 1,
/// };
///
/// assert_eq!(msg.to_string(), "Node 'D' waiting for 1 more message(s) (1 arrived)");
/// ```
pub struct WaitingForArrivals<'a> {
    pub node_id: &'a str,
    pub arrived: usize,
    pub remaining: usize,
}

impl Display for WaitingForArrivals<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Node '{}' waiting for {} more message(s) ({} arrived)",
            self.node_id, self.remaining, self.arrived
        )
    }
}

impl StructuredLog for WaitingForArrivals<'_> {
    fn log(&self) {
        tracing::info!(
            node_id = self.node_id,
            arrived = self.arrived,
            remaining = self.remaining,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "join_waiting",
            span_name = name,
            node_id = self.node_id,
            remaining = self.remaining,
        )
    }
}

/// A join node's barrier released a full batch.
///
/// # Log Level
/// `info!` - Important operational event
pub struct BarrierReleased<'a> {
    pub node_id: &'a str,
    pub batch_size: usize,
}

impl Display for BarrierReleased<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Node '{}' released a batch of {} message(s)",
            self.node_id, self.batch_size
        )
    }
}

impl StructuredLog for BarrierReleased<'_> {
    fn log(&self) {
        tracing::info!(
            node_id = self.node_id,
            batch_size = self.batch_size,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "join_released",
            span_name = name,
            node_id = self.node_id,
            batch_size = self.batch_size,
        )
    }
}

/// A repeat arrival from a source already in the batch was set aside.
///
/// # Log Level
/// `debug!` - Per-message detail
pub struct ArrivalDeferred<'a> {
    pub node_id: &'a str,
    pub source: Option<&'a str>,
    pub deferred: usize,
}

impl Display for ArrivalDeferred<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Node '{}' deferred repeat arrival from {} ({} deferred)",
            self.node_id,
            self.source.unwrap_or("seed"),
            self.deferred
        )
    }
}

impl StructuredLog for ArrivalDeferred<'_> {
    fn log(&self) {
        tracing::debug!(
            node_id = self.node_id,
            source = self.source.unwrap_or("seed"),
            deferred = self.deferred,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("join_deferred", span_name = name, node_id = self.node_id)
    }
}

/// A work step is about to run. Its span wraps the processor call.
///
/// # Log Level
/// `debug!` - Per-firing detail
pub struct WorkStepStarted<'a> {
    pub node_id: &'a str,
    pub processor: &'a str,
    pub batch_size: usize,
}

impl Display for WorkStepStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Node '{}' ({}) firing on {} message(s)",
            self.node_id, self.processor, self.batch_size
        )
    }
}

impl StructuredLog for WorkStepStarted<'_> {
    fn log(&self) {
        tracing::debug!(
            node_id = self.node_id,
            processor = self.processor,
            batch_size = self.batch_size,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "work_step",
            span_name = name,
            node_id = self.node_id,
            processor = self.processor,
            batch_size = self.batch_size,
        )
    }
}

/// A work step finished successfully.
///
/// # Log Level
/// `info!` - Important operational event
pub struct WorkStepCompleted<'a> {
    pub node_id: &'a str,
    pub processor: &'a str,
    pub output: Option<&'a str>,
    pub elapsed: Duration,
}

impl Display for WorkStepCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self.output {
            Some(output) => write!(
                f,
                "Node '{}' ({}) produced: {}",
                self.node_id, self.processor, output
            ),
            None => write!(
                f,
                "Node '{}' ({}) completed without output",
                self.node_id, self.processor
            ),
        }
    }
}

impl StructuredLog for WorkStepCompleted<'_> {
    fn log(&self) {
        tracing::info!(
            node_id = self.node_id,
            processor = self.processor,
            elapsed_ms = self.elapsed.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "work_step",
            span_name = name,
            node_id = self.node_id,
            processor = self.processor,
        )
    }
}

/// A work step failed. The runner keeps going.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct WorkStepFailed<'a> {
    pub node_id: &'a str,
    pub processor: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for WorkStepFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Node '{}' ({}) failed: {}",
            self.node_id, self.processor, self.error
        )
    }
}

impl StructuredLog for WorkStepFailed<'_> {
    fn log(&self) {
        tracing::error!(
            node_id = self.node_id,
            processor = self.processor,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "work_step_failed",
            span_name = name,
            node_id = self.node_id,
            processor = self.processor,
        )
    }
}

/// Output forwarded to a successor's mailbox.
///
/// # Log Level
/// `debug!` - Per-message detail
pub struct MessageForwarded<'a> {
    pub node_id: &'a str,
    pub successor: &'a str,
    pub message_id: &'a str,
}

impl Display for MessageForwarded<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Node '{}' forwarded {} to '{}'",
            self.node_id, self.message_id, self.successor
        )
    }
}

impl StructuredLog for MessageForwarded<'_> {
    fn log(&self) {
        tracing::debug!(
            node_id = self.node_id,
            successor = self.successor,
            message_id = self.message_id,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "forward",
            span_name = name,
            node_id = self.node_id,
            successor = self.successor,
        )
    }
}

/// A successor's mailbox was already closed; the output was dropped for it.
///
/// # Log Level
/// `debug!` - Expected during shutdown
pub struct ForwardSkipped<'a> {
    pub node_id: &'a str,
    pub successor: &'a str,
}

impl Display for ForwardSkipped<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Node '{}' skipped forwarding to '{}': mailbox closed",
            self.node_id, self.successor
        )
    }
}

impl StructuredLog for ForwardSkipped<'_> {
    fn log(&self) {
        tracing::debug!(
            node_id = self.node_id,
            successor = self.successor,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("forward_skipped", span_name = name, node_id = self.node_id)
    }
}

/// A runner left its loop.
///
/// # Log Level
/// `info!` - Important operational event
pub struct RunnerStopped<'a> {
    pub node_id: &'a str,
    pub received: usize,
    pub fired: usize,
    pub pending: usize,
}

impl Display for RunnerStopped<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Node '{}' stopped: received {}, fired {}, {} pending",
            self.node_id, self.received, self.fired, self.pending
        )
    }
}

impl StructuredLog for RunnerStopped<'_> {
    fn log(&self) {
        tracing::info!(
            node_id = self.node_id,
            received = self.received,
            fired = self.fired,
            pending = self.pending,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("runner_stopped", span_name = name, node_id = self.node_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_received_from_seed_names_seed() {
        let msg = MessageReceived {
            node_id: "A",
            message_id: "m-1",
            source: None,
            payload: "Start DAG",
        };
        assert_eq!(msg.to_string(), "Node 'A' received message from seed: Start DAG");
    }

    #[test]
    fn test_completed_without_output() {
        let msg = WorkStepCompleted {
            node_id: "E",
            processor: "sink",
            output: None,
            elapsed: Duration::from_millis(3),
        };
        assert_eq!(msg.to_string(), "Node 'E' (sink) completed without output");
    }

    #[test]
    fn test_work_step_started_display_and_span() {
        let msg = WorkStepStarted {
            node_id: "D",
            processor: "concatenate",
            batch_size: 2,
        };
        assert_eq!(
            msg.to_string(),
            "Node 'D' (concatenate) firing on 2 message(s)"
        );
        // No subscriber is installed, so the span is disabled but still usable.
        let span = msg.span("work_step");
        span.in_scope(|| msg.log());
    }

    #[test]
    fn test_state_transition_display() {
        let msg = StateTransition {
            node_id: "B",
            from: RunnerState::AwaitingMessage,
            to: RunnerState::Processing,
        };
        assert_eq!(msg.to_string(), "Node 'B': awaiting_message -> processing");
    }
}
