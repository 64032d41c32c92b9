// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for scheduler lifecycle events.
//!
//! This module contains message types for logging events related to:
//! * Runner startup and seed injection
//! * Quiescence (graph drained)
//! * Shutdown, force-stop and runner join failures

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use std::time::Duration;
use tracing::Span;

/// Scheduler spawned its runners.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use channel_dag::observability::messages::engine::SchedulerStarted;
///
/// let msg = SchedulerStarted {
///     node_count: 5,
///     join_count: 2,
///     seed_count: 1,
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct SchedulerStarted {
    pub node_count: usize,
    pub join_count: usize,
    pub seed_count: usize,
}

impl Display for SchedulerStarted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Graph execution started: {} nodes ({} joins), {} seed message(s)",
            self.node_count, self.join_count, self.seed_count
        )
    }
}

impl StructuredLog for SchedulerStarted {
    fn log(&self) {
        tracing::info!(
            node_count = self.node_count,
            join_count = self.join_count,
            seed_count = self.seed_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "execution",
            span_name = name,
            node_count = self.node_count,
            join_count = self.join_count,
        )
    }
}

/// Seed message injected into a node's mailbox.
///
/// # Log Level
/// `info!` - Important operational event
pub struct SeedInjected<'a> {
    pub node_id: &'a str,
    pub message_id: &'a str,
    pub payload: &'a str,
}

impl Display for SeedInjected<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Seed injected into '{}': {} ({})",
            self.node_id, self.payload, self.message_id
        )
    }
}

impl StructuredLog for SeedInjected<'_> {
    fn log(&self) {
        tracing::info!(
            node_id = self.node_id,
            message_id = self.message_id,
            payload = self.payload,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "seed",
            span_name = name,
            node_id = self.node_id,
            message_id = self.message_id,
        )
    }
}

/// No message is in flight anywhere in the graph.
///
/// # Log Level
/// `info!` - Important operational event
pub struct QuiescenceReached {
    pub elapsed: Duration,
}

impl Display for QuiescenceReached {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Graph drained after {:?}", self.elapsed)
    }
}

impl StructuredLog for QuiescenceReached {
    fn log(&self) {
        tracing::info!(elapsed_ms = self.elapsed.as_millis() as u64, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("quiescence", span_name = name, elapsed = ?self.elapsed)
    }
}

/// Graceful shutdown requested; mailboxes are being closed.
///
/// # Log Level
/// `info!` - Important operational event
pub struct ShutdownRequested {
    pub in_flight: usize,
}

impl Display for ShutdownRequested {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Shutdown requested with {} message(s) in flight",
            self.in_flight
        )
    }
}

impl StructuredLog for ShutdownRequested {
    fn log(&self) {
        tracing::info!(in_flight = self.in_flight, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("shutdown", span_name = name, in_flight = self.in_flight)
    }
}

/// All runners stopped.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use channel_dag::observability::messages::engine::SchedulerStopped;
/// use std::time::Duration;
///
/// let msg = SchedulerStopped {
///     runner_count: 5,
///     firings: 4,
///     failures: 0,
///     duration: Duration::from_millis(250),
/// };
///
/// assert!(msg.to_string().contains("4 firing(s)"));
/// ```
pub struct SchedulerStopped {
    pub runner_count: usize,
    pub firings: usize,
    pub failures: usize,
    pub duration: Duration,
}

impl Display for SchedulerStopped {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Graph execution stopped: {} runners, {} firing(s), {} failure(s) in {:?}",
            self.runner_count, self.firings, self.failures, self.duration
        )
    }
}

impl StructuredLog for SchedulerStopped {
    fn log(&self) {
        tracing::info!(
            runner_count = self.runner_count,
            firings = self.firings,
            failures = self.failures,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "execution_stopped",
            span_name = name,
            runner_count = self.runner_count,
            duration = ?self.duration,
        )
    }
}

/// Runner tasks aborted without waiting for them.
///
/// # Log Level
/// `warn!` - Unusual, possibly lossy
pub struct ForceStopped {
    pub runner_count: usize,
    pub in_flight: usize,
}

impl Display for ForceStopped {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Force-stopped {} runners with {} message(s) in flight",
            self.runner_count, self.in_flight
        )
    }
}

impl StructuredLog for ForceStopped {
    fn log(&self) {
        tracing::warn!(
            runner_count = self.runner_count,
            in_flight = self.in_flight,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!("force_stop", span_name = name, in_flight = self.in_flight)
    }
}

/// A runner task panicked or was cancelled before reporting.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct RunnerJoinFailed<'a> {
    pub node_id: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for RunnerJoinFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Runner for node '{}' did not stop cleanly: {}",
            self.node_id, self.error
        )
    }
}

impl StructuredLog for RunnerJoinFailed<'_> {
    fn log(&self) {
        tracing::error!(node_id = self.node_id, error = %self.error, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "runner_join_failed",
            span_name = name,
            node_id = self.node_id,
            error = %self.error,
        )
    }
}
