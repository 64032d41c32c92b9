// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Errors raised while the engine is running.

use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

/// How the engine reacts to a failed work step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStrategy {
    /// Report the failure and keep draining the mailbox
    #[default]
    ContinueOnError,
    /// Report the failure and request shutdown of the whole run
    FailFast,
}

/// Error returned by a processor for one firing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProcessorError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("{0}")]
    Failed(String),

    #[error("work step timed out after {0:?}")]
    TimedOut(Duration),

    #[error("processor panicked: {0}")]
    Panicked(String),
}

/// A node's work step failed for a given message or batch.
///
/// Carries the node, the ids and payloads of the input messages and the reason,
/// which is enough to replay the failing firing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("work step failed on node '{node_id}' for message(s) [{}]: {reason}", format_ids(.message_ids))]
pub struct WorkStepError {
    pub node_id: String,
    pub message_ids: Vec<Uuid>,
    pub payloads: Vec<String>,
    pub reason: ProcessorError,
}

fn format_ids(ids: &[Uuid]) -> String {
    ids.iter().map(Uuid::to_string).collect::<Vec<_>>().join(", ")
}

/// Send or receive attempted on a mailbox that has been closed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("mailbox for node '{node_id}' is closed")]
pub struct MailboxClosedError {
    pub node_id: String,
}

/// Run-level failures reported by the scheduler.
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("seed message targets unknown node '{node_id}'")]
    UnknownSeedNode { node_id: String },

    #[error(transparent)]
    Mailbox(#[from] MailboxClosedError),

    #[error("runner for node '{node_id}' did not stop cleanly: {reason}")]
    RunnerFailed { node_id: String, reason: String },
}
