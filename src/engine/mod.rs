// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The channel-based execution engine.
//!
//! * [`Message`] - the immutable unit of data flowing along edges
//! * [`Mailbox`] - per-node FIFO inbox with explicit close
//! * [`JoinBarrier`] - counts arrivals at join nodes and releases batches
//! * [`Graph`] - the validated, immutable topology
//! * [`NodeRunner`] - one task per node, from inbox to successors
//! * [`Scheduler`] - spawns the runners, seeds them and controls the run

pub mod graph;
pub mod join_barrier;
pub mod mailbox;
pub mod message;
pub mod node_runner;
pub mod scheduler;

pub use graph::{Graph, GraphBuilder, JoinSpec, Node};
pub use join_barrier::{JoinBarrier, JoinOutcome, JoinPolicy};
pub use mailbox::{InFlight, Mailbox, MailboxReceiver};
pub use message::Message;
pub use node_runner::{NodeRunner, RunnerContext, RunnerReport, RunnerState};
pub use scheduler::{RunHandle, RunReport, Scheduler, SchedulerOptions, Seed};
