// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Per-node execution loop.
//!
//! A [`NodeRunner`] owns everything one node needs: its inbox, its join barrier,
//! its processor and a sender for each successor. It drains the inbox until the
//! mailbox closes, firing the processor on every single message (fan-out nodes) or
//! on every released batch (join nodes), and forwarding the output to successors
//! in declaration order.

use std::any::Any;
use std::fmt::{Display, Formatter};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::FutureExt;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

use crate::engine::{InFlight, JoinBarrier, JoinOutcome, Mailbox, MailboxReceiver, Message, Node};
use crate::errors::{FailureStrategy, ProcessorError, WorkStepError};
use crate::observability::messages::node::{
    ArrivalDeferred, BarrierReleased, ForwardSkipped, MessageForwarded, MessageReceived,
    RunnerStopped, StateTransition, WaitingForArrivals, WorkStepCompleted, WorkStepFailed,
    WorkStepStarted,
};
use crate::observability::messages::StructuredLog;
use crate::observability::{EventSink, NodeEvent, NodeEventKind};
use crate::traits::{Processor, ProcessorRequest};

/// Lifecycle state of a runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerState {
    Idle,
    AwaitingMessage,
    Processing,
    Forwarding,
    Stopped,
}

impl Display for RunnerState {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        let name = match self {
            RunnerState::Idle => "idle",
            RunnerState::AwaitingMessage => "awaiting_message",
            RunnerState::Processing => "processing",
            RunnerState::Forwarding => "forwarding",
            RunnerState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// What a runner did before it stopped.
#[derive(Debug, Clone)]
pub struct RunnerReport {
    pub node_id: String,
    /// Messages taken from the mailbox
    pub received: usize,
    /// Work steps executed (successful or not)
    pub fired: usize,
    /// Messages sent to successors
    pub forwarded: usize,
    /// Arrivals held by the join barrier when the runner stopped
    pub pending_arrivals: usize,
    /// Arrivals still missing for the next release; `None` for fan-out nodes
    pub remaining: Option<usize>,
    /// Repeat arrivals still deferred by a distinct-source barrier
    pub deferred: usize,
    pub failures: Vec<WorkStepError>,
    pub final_state: RunnerState,
}

impl RunnerReport {
    fn new(node_id: &str) -> Self {
        Self {
            node_id: node_id.to_string(),
            received: 0,
            fired: 0,
            forwarded: 0,
            pending_arrivals: 0,
            remaining: None,
            deferred: 0,
            failures: Vec::new(),
            final_state: RunnerState::Idle,
        }
    }

    /// A join node holding a partial batch it can never release on its own
    pub fn is_stalled(&self) -> bool {
        self.pending_arrivals > 0 || self.deferred > 0
    }
}

/// Run-wide resources shared by every runner.
#[derive(Clone)]
pub struct RunnerContext {
    pub sinks: Arc<[Arc<dyn EventSink>]>,
    pub in_flight: InFlight,
    pub shutdown: CancellationToken,
    pub semaphore: Option<Arc<Semaphore>>,
    pub work_timeout: Option<Duration>,
    pub failure_strategy: FailureStrategy,
}

impl RunnerContext {
    fn emit(&self, event: NodeEvent) {
        for sink in self.sinks.iter() {
            sink.emit(&event);
        }
    }
}

/// Drives one node from its inbox to its successors.
pub struct NodeRunner {
    node_id: String,
    inbox: MailboxReceiver,
    successors: Vec<Mailbox>,
    barrier: Option<JoinBarrier>,
    processor: Arc<dyn Processor>,
    context: RunnerContext,
    state: RunnerState,
    report: RunnerReport,
}

impl NodeRunner {
    /// `successors` must be in the node's declared successor order.
    pub fn new(
        node: &Node,
        inbox: MailboxReceiver,
        successors: Vec<Mailbox>,
        processor: Arc<dyn Processor>,
        context: RunnerContext,
    ) -> Self {
        Self {
            node_id: node.id().to_string(),
            inbox,
            successors,
            barrier: node
                .join()
                .map(|join| JoinBarrier::new(join.required, join.policy)),
            processor,
            context,
            state: RunnerState::Idle,
            report: RunnerReport::new(node.id()),
        }
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    pub fn state(&self) -> RunnerState {
        self.state
    }

    /// Process messages until the mailbox closes, then report.
    pub async fn run(mut self) -> RunnerReport {
        loop {
            self.transition(RunnerState::AwaitingMessage);

            let message = match self.inbox.receive().await {
                Ok(message) => message,
                Err(_) => break,
            };

            self.handle(message).await;
            self.context.in_flight.finish();
        }

        self.stop()
    }

    async fn handle(&mut self, message: Message) {
        self.report.received += 1;
        let message_id = message.id().to_string();
        MessageReceived {
            node_id: &self.node_id,
            message_id: &message_id,
            source: message.source(),
            payload: message.payload(),
        }
        .log();
        self.context.emit(
            NodeEvent::new(&self.node_id, NodeEventKind::Received)
                .with_payload(message.payload())
                .with_message_id(message.id()),
        );

        let Some(barrier) = self.barrier.as_mut() else {
            self.fire(vec![message]).await;
            return;
        };

        let deferred_before = barrier.deferred();
        let source = message.source().map(str::to_string);
        match barrier.arrive(message) {
            JoinOutcome::Waiting { remaining } => {
                let arrived = barrier.arrived();
                if barrier.deferred() > deferred_before {
                    ArrivalDeferred {
                        node_id: &self.node_id,
                        source: source.as_deref(),
                        deferred: barrier.deferred(),
                    }
                    .log();
                    self.context
                        .emit(NodeEvent::new(&self.node_id, NodeEventKind::Deferred));
                }
                WaitingForArrivals {
                    node_id: &self.node_id,
                    arrived,
                    remaining,
                }
                .log();
                self.context.emit(NodeEvent::new(
                    &self.node_id,
                    NodeEventKind::Waiting { remaining },
                ));
            }
            JoinOutcome::Released(batch) => {
                self.release(batch).await;
                while let Some(batch) = self.barrier.as_mut().and_then(JoinBarrier::resume) {
                    self.release(batch).await;
                }
            }
        }
    }

    async fn release(&mut self, batch: Vec<Message>) {
        BarrierReleased {
            node_id: &self.node_id,
            batch_size: batch.len(),
        }
        .log();
        self.context.emit(NodeEvent::new(
            &self.node_id,
            NodeEventKind::Released {
                batch_size: batch.len(),
            },
        ));
        self.fire(batch).await;
    }

    /// Execute one work step and forward its output.
    async fn fire(&mut self, inputs: Vec<Message>) {
        self.transition(RunnerState::Processing);
        self.report.fired += 1;

        let message_ids: Vec<Uuid> = inputs.iter().map(Message::id).collect();
        let payloads: Vec<String> = inputs.iter().map(|m| m.payload().to_string()).collect();
        let request = ProcessorRequest::new(&self.node_id, inputs);

        let start_msg = WorkStepStarted {
            node_id: &self.node_id,
            processor: self.processor.name(),
            batch_size: payloads.len(),
        };
        let span = start_msg.span("work_step");
        span.in_scope(|| start_msg.log());

        let started = Instant::now();
        match self.execute(request).instrument(span).await {
            Ok(output) => {
                WorkStepCompleted {
                    node_id: &self.node_id,
                    processor: self.processor.name(),
                    output: output.as_deref(),
                    elapsed: started.elapsed(),
                }
                .log();

                let mut event = NodeEvent::new(&self.node_id, NodeEventKind::Processed);
                if let Some(output) = &output {
                    event = event.with_payload(output);
                }
                self.context.emit(event);

                if let Some(payload) = output {
                    self.forward(payload);
                }
            }
            Err(reason) => {
                let error = WorkStepError {
                    node_id: self.node_id.clone(),
                    message_ids,
                    payloads,
                    reason,
                };
                self.fail(error);
            }
        }
    }

    /// Run the processor under the concurrency limit and timeout. A panicking
    /// processor fails this work step only; the runner stays alive.
    async fn execute(&self, request: ProcessorRequest) -> Result<Option<String>, ProcessorError> {
        // A closed semaphore only happens on teardown; run unthrottled then.
        let _permit = match &self.context.semaphore {
            Some(semaphore) => semaphore.acquire().await.ok(),
            None => None,
        };

        let work = AssertUnwindSafe(self.processor.process(request)).catch_unwind();
        let outcome = match self.context.work_timeout {
            Some(limit) => tokio::time::timeout(limit, work)
                .await
                .map_err(|_| ProcessorError::TimedOut(limit))?,
            None => work.await,
        };

        outcome.unwrap_or_else(|panic| Err(ProcessorError::Panicked(panic_message(&*panic))))
    }

    fn forward(&mut self, payload: String) {
        self.transition(RunnerState::Forwarding);
        let message = Message::from_node(&self.node_id, payload);
        let message_id = message.id().to_string();

        for successor in &self.successors {
            match successor.send(message.clone()) {
                Ok(()) => {
                    self.report.forwarded += 1;
                    MessageForwarded {
                        node_id: &self.node_id,
                        successor: successor.node_id(),
                        message_id: &message_id,
                    }
                    .log();
                    self.context.emit(
                        NodeEvent::new(
                            &self.node_id,
                            NodeEventKind::Forwarded {
                                to: successor.node_id().to_string(),
                            },
                        )
                        .with_payload(message.payload())
                        .with_message_id(message.id()),
                    );
                }
                Err(_) => ForwardSkipped {
                    node_id: &self.node_id,
                    successor: successor.node_id(),
                }
                .log(),
            }
        }
    }

    fn fail(&mut self, error: WorkStepError) {
        WorkStepFailed {
            node_id: &self.node_id,
            processor: self.processor.name(),
            error: &error,
        }
        .log();
        self.context.emit(
            NodeEvent::new(
                &self.node_id,
                NodeEventKind::WorkFailed {
                    error: error.reason.to_string(),
                },
            )
            .with_payload(error.payloads.join(", ")),
        );
        self.report.failures.push(error);

        if self.context.failure_strategy == FailureStrategy::FailFast {
            self.context.shutdown.cancel();
        }
    }

    fn transition(&mut self, to: RunnerState) {
        if self.state == to {
            return;
        }
        StateTransition {
            node_id: &self.node_id,
            from: self.state,
            to,
        }
        .log();
        self.state = to;
    }

    fn stop(mut self) -> RunnerReport {
        self.transition(RunnerState::Stopped);

        if let Some(barrier) = &self.barrier {
            self.report.pending_arrivals = barrier.arrived();
            self.report.remaining = Some(barrier.remaining());
            self.report.deferred = barrier.deferred();
        }
        self.report.final_state = self.state;

        RunnerStopped {
            node_id: &self.node_id,
            received: self.report.received,
            fired: self.report.fired,
            pending: self.report.pending_arrivals,
        }
        .log();
        self.context
            .emit(NodeEvent::new(&self.node_id, NodeEventKind::Stopped));

        self.report
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::stub::{
        CountingProcessor, FailingProcessor, PanickingProcessor, StubProcessor,
    };
    use crate::engine::{Graph, JoinPolicy};
    use crate::observability::ChannelEventSink;
    use tokio::time::timeout;

    const GUARD: Duration = Duration::from_secs(5);

    struct Harness {
        inbox: Mailbox,
        outbox: MailboxReceiver,
        shutdown: CancellationToken,
        events: tokio::sync::mpsc::UnboundedReceiver<NodeEvent>,
    }

    fn spawn_runner(
        graph: &Graph,
        node_id: &str,
        processor: Arc<dyn Processor>,
        failure_strategy: FailureStrategy,
    ) -> (Harness, tokio::task::JoinHandle<RunnerReport>) {
        let shutdown = CancellationToken::new();
        let in_flight = InFlight::new();
        let (sink, events) = ChannelEventSink::new();

        let (inbox, receiver) = Mailbox::open(node_id, shutdown.child_token(), in_flight.clone());
        let (outbox_sender, outbox) = Mailbox::open("out", shutdown.child_token(), in_flight.clone());

        let context = RunnerContext {
            sinks: Arc::from(vec![Arc::new(sink) as Arc<dyn EventSink>]),
            in_flight: in_flight.clone(),
            shutdown: shutdown.clone(),
            semaphore: None,
            work_timeout: None,
            failure_strategy,
        };

        let node = graph.node(node_id).unwrap();
        let runner = NodeRunner::new(node, receiver, vec![outbox_sender], processor, context);
        let handle = tokio::spawn(runner.run());

        (
            Harness {
                inbox,
                outbox,
                shutdown,
                events,
            },
            handle,
        )
    }

    fn join_graph(required: usize, policy: JoinPolicy) -> Graph {
        Graph::builder()
            .node("A", ["J"])
            .node("B", ["J"])
            .node("C", ["J"])
            .node("J", ["out"])
            .node("out", Vec::<String>::new())
            .join_with_policy("J", required, policy)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_fan_out_fires_once_per_message() {
        let graph = Graph::builder()
            .node("A", ["out"])
            .node("out", Vec::<String>::new())
            .build()
            .unwrap();
        let (mut h, handle) = spawn_runner(
            &graph,
            "A",
            Arc::new(StubProcessor),
            FailureStrategy::ContinueOnError,
        );

        h.inbox.send(Message::seed("one")).unwrap();
        h.inbox.send(Message::seed("two")).unwrap();

        let first = timeout(GUARD, h.outbox.receive()).await.unwrap().unwrap();
        let second = timeout(GUARD, h.outbox.receive()).await.unwrap().unwrap();
        assert_eq!(first.payload(), "one");
        assert_eq!(second.payload(), "two");
        assert_eq!(first.source(), Some("A"));

        h.shutdown.cancel();
        let report = timeout(GUARD, handle).await.unwrap().unwrap();
        assert_eq!(report.received, 2);
        assert_eq!(report.fired, 2);
        assert_eq!(report.forwarded, 2);
        assert_eq!(report.remaining, None);
        assert_eq!(report.final_state, RunnerState::Stopped);
    }

    #[tokio::test]
    async fn test_join_waits_then_releases_batch() {
        let graph = join_graph(2, JoinPolicy::CountBased);
        let counter = Arc::new(CountingProcessor::new());
        let (mut h, handle) = spawn_runner(
            &graph,
            "J",
            counter.clone(),
            FailureStrategy::ContinueOnError,
        );

        h.inbox.send(Message::from_node("A", "a")).unwrap();
        let received = timeout(GUARD, h.events.recv()).await.unwrap().unwrap();
        assert_eq!(received.kind, NodeEventKind::Received);
        let waiting = timeout(GUARD, h.events.recv()).await.unwrap().unwrap();
        assert_eq!(waiting.remaining(), Some(1));
        assert_eq!(counter.fired(), 0);

        h.inbox.send(Message::from_node("B", "b")).unwrap();
        let output = timeout(GUARD, h.outbox.receive()).await.unwrap().unwrap();
        assert_eq!(output.payload(), "a+b");
        assert_eq!(counter.batch_sizes(), vec![2]);

        h.shutdown.cancel();
        let report = timeout(GUARD, handle).await.unwrap().unwrap();
        assert_eq!(report.fired, 1);
        assert_eq!(report.pending_arrivals, 0);
        assert!(!report.is_stalled());
    }

    #[tokio::test]
    async fn test_distinct_source_defers_repeat_until_release() {
        let graph = join_graph(2, JoinPolicy::DistinctSource);
        let counter = Arc::new(CountingProcessor::new());
        let (mut h, handle) = spawn_runner(
            &graph,
            "J",
            counter.clone(),
            FailureStrategy::ContinueOnError,
        );

        h.inbox.send(Message::from_node("A", "a1")).unwrap();
        h.inbox.send(Message::from_node("A", "a2")).unwrap();
        h.inbox.send(Message::from_node("B", "b1")).unwrap();

        let output = timeout(GUARD, h.outbox.receive()).await.unwrap().unwrap();
        assert_eq!(output.payload(), "a1+b1");

        h.shutdown.cancel();
        let report = timeout(GUARD, handle).await.unwrap().unwrap();

        assert_eq!(counter.fired(), 1);
        assert_eq!(report.pending_arrivals, 1);
        assert_eq!(report.remaining, Some(1));
        assert_eq!(report.deferred, 0);
        assert!(report.is_stalled());
    }

    #[tokio::test]
    async fn test_failure_is_reported_and_runner_continues() {
        let graph = Graph::builder()
            .node("A", ["out"])
            .node("out", Vec::<String>::new())
            .build()
            .unwrap();
        let (mut h, handle) = spawn_runner(
            &graph,
            "A",
            Arc::new(FailingProcessor::on_payload("boom")),
            FailureStrategy::ContinueOnError,
        );

        let bad = Message::seed("boom");
        let bad_id = bad.id();
        h.inbox.send(bad).unwrap();
        h.inbox.send(Message::seed("fine")).unwrap();

        let output = timeout(GUARD, h.outbox.receive()).await.unwrap().unwrap();
        assert_eq!(output.payload(), "fine");
        assert!(!h.shutdown.is_cancelled());

        h.shutdown.cancel();
        let report = timeout(GUARD, handle).await.unwrap().unwrap();
        assert_eq!(report.fired, 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].node_id, "A");
        assert_eq!(report.failures[0].message_ids, vec![bad_id]);
        assert_eq!(report.failures[0].payloads, vec!["boom".to_string()]);
    }

    #[tokio::test]
    async fn test_panicking_work_step_is_a_failure_not_a_dead_runner() {
        let graph = Graph::builder()
            .node("A", ["out"])
            .node("out", Vec::<String>::new())
            .build()
            .unwrap();
        let (mut h, handle) = spawn_runner(
            &graph,
            "A",
            Arc::new(PanickingProcessor::on_payload("boom")),
            FailureStrategy::ContinueOnError,
        );

        h.inbox.send(Message::seed("boom")).unwrap();
        h.inbox.send(Message::seed("fine")).unwrap();

        let output = timeout(GUARD, h.outbox.receive()).await.unwrap().unwrap();
        assert_eq!(output.payload(), "fine");

        h.shutdown.cancel();
        let report = timeout(GUARD, handle).await.unwrap().unwrap();
        assert_eq!(report.received, 2);
        assert_eq!(report.fired, 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(
            report.failures[0].reason,
            ProcessorError::Panicked("processor bug".to_string())
        );
    }

    #[test]
    fn test_panic_message_from_payload() {
        assert_eq!(panic_message(&"static str"), "static str");
        assert_eq!(panic_message(&"owned".to_string()), "owned");
        assert_eq!(panic_message(&42_u32), "non-string panic payload");
    }

    #[tokio::test]
    async fn test_fail_fast_requests_shutdown() {
        let graph = Graph::builder()
            .node("A", ["out"])
            .node("out", Vec::<String>::new())
            .build()
            .unwrap();
        let (h, handle) = spawn_runner(
            &graph,
            "A",
            Arc::new(FailingProcessor::always()),
            FailureStrategy::FailFast,
        );

        h.inbox.send(Message::seed("boom")).unwrap();

        timeout(GUARD, h.shutdown.cancelled()).await.unwrap();
        let report = timeout(GUARD, handle).await.unwrap().unwrap();
        assert_eq!(report.failures.len(), 1);
    }

    #[tokio::test]
    async fn test_idle_runner_stops_on_close() {
        let graph = join_graph(3, JoinPolicy::CountBased);
        let (mut h, handle) = spawn_runner(
            &graph,
            "J",
            Arc::new(StubProcessor),
            FailureStrategy::ContinueOnError,
        );

        h.shutdown.cancel();
        let report = timeout(GUARD, handle).await.unwrap().unwrap();
        assert_eq!(report.received, 0);
        assert_eq!(report.remaining, Some(3));
        assert!(!report.is_stalled());

        let stopped = timeout(GUARD, h.events.recv()).await.unwrap().unwrap();
        assert_eq!(stopped.kind, NodeEventKind::Stopped);
    }
}
