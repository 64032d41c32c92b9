// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Launching and controlling a run.
//!
//! The [`Scheduler`] owns the graph and, per run, the mailbox registry. `start`
//! opens one mailbox per node, spawns one tokio task per node and injects the seed
//! messages. The returned [`RunHandle`] injects more seeds, waits for quiescence,
//! and stops the run, either gracefully (`shutdown`, which joins every runner and
//! returns a [`RunReport`]) or immediately (`force_stop`).
//!
//! # Example
//! ```
//! use channel_dag::engine::{Graph, Scheduler, Seed};
//!
//! # let rt = tokio::runtime::Runtime::new().unwrap();
//! # rt.block_on(async {
//! let graph = Graph::builder()
//!     .node("A", ["B"])
//!     .node("B", Vec::<String>::new())
//!     .build()
//!     .unwrap();
//!
//! let report = Scheduler::new(graph)
//!     .run_to_quiescence(vec![Seed::new("A", "Start DAG")])
//!     .await
//!     .unwrap();
//!
//! assert_eq!(report.fired("A"), 1);
//! assert_eq!(report.fired("B"), 1);
//! # });
//! ```

use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::backends::local::ProcessedByProcessor;
use crate::config::ProcessorMap;
use crate::engine::node_runner::RunnerContext;
use crate::engine::{Graph, InFlight, Mailbox, Message, NodeRunner, RunnerReport};
use crate::errors::{ExecutionError, FailureStrategy, WorkStepError};
use crate::observability::messages::engine::{
    ForceStopped, QuiescenceReached, RunnerJoinFailed, SchedulerStarted, SchedulerStopped,
    SeedInjected, ShutdownRequested,
};
use crate::observability::messages::StructuredLog;
use crate::observability::EventSink;
use crate::traits::Processor;

/// An externally injected message addressed to a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seed {
    pub node_id: String,
    pub payload: String,
}

impl Seed {
    pub fn new(node_id: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            payload: payload.into(),
        }
    }
}

/// Run-wide execution limits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerOptions {
    /// Upper bound on work steps running at the same time, across all nodes
    pub max_concurrency: Option<usize>,
    /// Upper bound on a single work step
    pub work_timeout: Option<Duration>,
    pub failure_strategy: FailureStrategy,
}

/// Owns a validated graph and launches runs over it.
pub struct Scheduler {
    graph: Arc<Graph>,
    processors: ProcessorMap,
    default_processor: Arc<dyn Processor>,
    sinks: Vec<Arc<dyn EventSink>>,
    options: SchedulerOptions,
}

impl Scheduler {
    pub fn new(graph: Graph) -> Self {
        Self {
            graph: Arc::new(graph),
            processors: ProcessorMap::new(),
            default_processor: Arc::new(ProcessedByProcessor::new(Duration::ZERO)),
            sinks: Vec::new(),
            options: SchedulerOptions::default(),
        }
    }

    /// Per-node processors; nodes without an entry use the default processor
    pub fn with_processors(mut self, processors: ProcessorMap) -> Self {
        self.processors = processors;
        self
    }

    pub fn with_default_processor(mut self, processor: Arc<dyn Processor>) -> Self {
        self.default_processor = processor;
        self
    }

    /// Register a sink for node events. May be called more than once.
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn with_options(mut self, options: SchedulerOptions) -> Self {
        self.options = options;
        self
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn options(&self) -> SchedulerOptions {
        self.options
    }

    /// Spawn one runner per node and inject `seeds`.
    ///
    /// Every seed is checked before anything is spawned; an unknown target node
    /// fails the whole start.
    pub fn start(&self, seeds: Vec<Seed>) -> Result<RunHandle, ExecutionError> {
        if let Some(seed) = seeds.iter().find(|seed| !self.graph.contains(&seed.node_id)) {
            return Err(ExecutionError::UnknownSeedNode {
                node_id: seed.node_id.clone(),
            });
        }

        let shutdown = CancellationToken::new();
        let in_flight = InFlight::new();

        let mut mailboxes = HashMap::new();
        let mut inboxes = HashMap::new();
        for node in self.graph.nodes() {
            let (mailbox, inbox) = Mailbox::open(node.id(), shutdown.child_token(), in_flight.clone());
            mailboxes.insert(node.id().to_string(), mailbox);
            inboxes.insert(node.id().to_string(), inbox);
        }

        let context = RunnerContext {
            sinks: Arc::from(self.sinks.clone()),
            in_flight: in_flight.clone(),
            shutdown: shutdown.clone(),
            semaphore: self
                .options
                .max_concurrency
                .map(|limit| Arc::new(Semaphore::new(limit.max(1)))),
            work_timeout: self.options.work_timeout,
            failure_strategy: self.options.failure_strategy,
        };

        let mut runners = Vec::with_capacity(self.graph.len());
        for node in self.graph.nodes() {
            let Some(inbox) = inboxes.remove(node.id()) else {
                continue;
            };
            let successors = node
                .successors()
                .iter()
                .filter_map(|successor| mailboxes.get(successor).cloned())
                .collect();
            let processor = self
                .processors
                .get(node.id())
                .cloned()
                .unwrap_or_else(|| self.default_processor.clone());

            let runner = NodeRunner::new(node, inbox, successors, processor, context.clone());
            runners.push((node.id().to_string(), tokio::spawn(runner.run())));
        }

        SchedulerStarted {
            node_count: self.graph.len(),
            join_count: self.graph.join_nodes().count(),
            seed_count: seeds.len(),
        }
        .log();

        let handle = RunHandle {
            mailboxes,
            runners,
            shutdown,
            in_flight,
            started: Instant::now(),
        };

        for seed in seeds {
            handle.inject(seed)?;
        }

        Ok(handle)
    }

    /// Start, wait until no message is in flight, then shut down.
    pub async fn run_to_quiescence(&self, seeds: Vec<Seed>) -> Result<RunReport, ExecutionError> {
        let handle = self.start(seeds)?;
        handle.wait_idle().await;
        handle.shutdown().await
    }

    /// Start, run until `stop` resolves or the run shuts itself down, then shut down.
    pub async fn run_until<F>(&self, seeds: Vec<Seed>, stop: F) -> Result<RunReport, ExecutionError>
    where
        F: Future<Output = ()>,
    {
        let handle = self.start(seeds)?;
        let token = handle.stop_token();
        tokio::select! {
            _ = stop => {}
            _ = token.cancelled() => {}
        }
        handle.shutdown().await
    }
}

/// Control surface of a running graph.
pub struct RunHandle {
    mailboxes: HashMap<String, Mailbox>,
    runners: Vec<(String, JoinHandle<RunnerReport>)>,
    shutdown: CancellationToken,
    in_flight: InFlight,
    started: Instant,
}

impl RunHandle {
    /// Enqueue a seed message while the run is live.
    pub fn inject(&self, seed: Seed) -> Result<(), ExecutionError> {
        let mailbox = self
            .mailboxes
            .get(&seed.node_id)
            .ok_or_else(|| ExecutionError::UnknownSeedNode {
                node_id: seed.node_id.clone(),
            })?;

        let message = Message::seed(seed.payload);
        let message_id = message.id().to_string();
        SeedInjected {
            node_id: &seed.node_id,
            message_id: &message_id,
            payload: message.payload(),
        }
        .log();

        mailbox.send(message)?;
        Ok(())
    }

    /// Resolve once no message is queued or being handled anywhere, or once the run
    /// is shutting down.
    pub async fn wait_idle(&self) {
        tokio::select! {
            _ = self.in_flight.wait_idle() => {
                QuiescenceReached {
                    elapsed: self.started.elapsed(),
                }
                .log();
            }
            _ = self.shutdown.cancelled() => {}
        }
    }

    /// Messages queued in mailboxes or currently being handled
    pub fn in_flight(&self) -> usize {
        self.in_flight.count()
    }

    /// Cancelling this token closes every mailbox, as `shutdown` does, but does not
    /// wait for the runners.
    pub fn stop_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub fn is_stopping(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Close every mailbox, wait for every runner to finish its current work and
    /// collect their reports.
    ///
    /// A runner task that died (it can no longer report) is listed in
    /// [`RunReport::aborted`]; the other runners' reports are still collected.
    pub async fn shutdown(self) -> Result<RunReport, ExecutionError> {
        let request = ShutdownRequested {
            in_flight: self.in_flight.count(),
        };
        let span = request.span("shutdown");
        span.in_scope(|| request.log());
        self.shutdown.cancel();

        let (runners, aborted) = join_runners(self.runners).instrument(span).await;

        let report = RunReport {
            runners,
            aborted,
            duration: self.started.elapsed(),
        };
        SchedulerStopped {
            runner_count: report.runners.len(),
            firings: report.total_fired(),
            failures: report.failures().count(),
            duration: report.duration,
        }
        .log();

        Ok(report)
    }

    /// Abort every runner without waiting for work in progress.
    pub fn force_stop(self) {
        ForceStopped {
            runner_count: self.runners.len(),
            in_flight: self.in_flight.count(),
        }
        .log();
        self.shutdown.cancel();
        for (_, handle) in &self.runners {
            handle.abort();
        }
    }
}

async fn join_runners(
    runners: Vec<(String, JoinHandle<RunnerReport>)>,
) -> (BTreeMap<String, RunnerReport>, BTreeMap<String, String>) {
    let mut reports = BTreeMap::new();
    let mut aborted = BTreeMap::new();
    for (node_id, handle) in runners {
        match handle.await {
            Ok(report) => {
                reports.insert(node_id, report);
            }
            Err(e) => {
                RunnerJoinFailed {
                    node_id: &node_id,
                    error: &e,
                }
                .log();
                aborted.insert(node_id, e.to_string());
            }
        }
    }
    (reports, aborted)
}

/// Per-node outcome of a run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub runners: BTreeMap<String, RunnerReport>,
    /// Runners whose task died before it could report, with the reason
    pub aborted: BTreeMap<String, String>,
    pub duration: Duration,
}

impl RunReport {
    pub fn runner(&self, node_id: &str) -> Option<&RunnerReport> {
        self.runners.get(node_id)
    }

    /// Work steps executed by `node_id` (0 for unknown nodes)
    pub fn fired(&self, node_id: &str) -> usize {
        self.runner(node_id).map_or(0, |runner| runner.fired)
    }

    pub fn total_fired(&self) -> usize {
        self.runners.values().map(|runner| runner.fired).sum()
    }

    pub fn failures(&self) -> impl Iterator<Item = &WorkStepError> {
        self.runners.values().flat_map(|runner| runner.failures.iter())
    }

    /// Runners that died before reporting, as run-level errors
    pub fn aborted_runners(&self) -> impl Iterator<Item = ExecutionError> + '_ {
        self.aborted
            .iter()
            .map(|(node_id, reason)| ExecutionError::RunnerFailed {
                node_id: node_id.clone(),
                reason: reason.clone(),
            })
    }

    /// Join nodes left holding arrivals they could not release
    pub fn stalled_joins(&self) -> impl Iterator<Item = &RunnerReport> {
        self.runners.values().filter(|runner| runner.is_stalled())
    }
}
