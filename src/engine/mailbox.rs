// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Per-node inbound queues.
//!
//! A mailbox is an unbounded multi-producer/single-consumer queue built on
//! `tokio::sync::mpsc`. The sending half ([`Mailbox`]) is cheap to clone and is
//! handed to every predecessor of the node; the receiving half
//! ([`MailboxReceiver`]) is owned by the node's runner.
//!
//! Closing is explicit: every mailbox holds a `CancellationToken` (normally a child
//! of the scheduler's shutdown token). Once cancelled, `receive()` returns
//! [`MailboxClosedError`] even if messages are still queued and `send()` refuses
//! new messages.
//!
//! Every mailbox also shares an [`InFlight`] counter with the rest of the graph so
//! the scheduler can tell when the graph has drained.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

use crate::engine::Message;
use crate::errors::MailboxClosedError;

/// Count of messages enqueued anywhere in the graph and not yet fully handled.
#[derive(Debug, Clone)]
pub struct InFlight {
    counter: Arc<watch::Sender<usize>>,
}

impl InFlight {
    pub fn new() -> Self {
        let (counter, _) = watch::channel(0);
        Self {
            counter: Arc::new(counter),
        }
    }

    /// A message entered a mailbox
    pub(crate) fn begin(&self) {
        self.counter.send_modify(|count| *count += 1);
    }

    /// A message has been received, processed and forwarded
    pub(crate) fn finish(&self) {
        self.counter.send_modify(|count| *count = count.saturating_sub(1));
    }

    pub fn count(&self) -> usize {
        *self.counter.borrow()
    }

    /// Resolve once no message is in flight
    pub async fn wait_idle(&self) {
        let mut receiver = self.counter.subscribe();
        let _ = receiver.wait_for(|count| *count == 0).await;
    }
}

impl Default for InFlight {
    fn default() -> Self {
        Self::new()
    }
}

/// Sending half of a node's mailbox.
#[derive(Debug, Clone)]
pub struct Mailbox {
    node_id: Arc<str>,
    sender: mpsc::UnboundedSender<Message>,
    closed: CancellationToken,
    in_flight: InFlight,
}

/// Receiving half of a node's mailbox, owned by the node's runner.
#[derive(Debug)]
pub struct MailboxReceiver {
    node_id: Arc<str>,
    receiver: mpsc::UnboundedReceiver<Message>,
    closed: CancellationToken,
}

impl Mailbox {
    /// Open a mailbox for `node_id`, closed when `closed` is cancelled
    pub fn open(
        node_id: &str,
        closed: CancellationToken,
        in_flight: InFlight,
    ) -> (Mailbox, MailboxReceiver) {
        let node_id: Arc<str> = Arc::from(node_id);
        let (sender, receiver) = mpsc::unbounded_channel();

        let mailbox = Mailbox {
            node_id: node_id.clone(),
            sender,
            closed: closed.clone(),
            in_flight,
        };
        let inbox = MailboxReceiver {
            node_id,
            receiver,
            closed,
        };
        (mailbox, inbox)
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    /// Enqueue a message. Never blocks; fails only once the mailbox is closed.
    pub fn send(&self, message: Message) -> Result<(), MailboxClosedError> {
        if self.closed.is_cancelled() {
            return Err(MailboxClosedError {
                node_id: self.node_id.to_string(),
            });
        }

        self.in_flight.begin();
        self.sender.send(message).map_err(|_| {
            self.in_flight.finish();
            MailboxClosedError {
                node_id: self.node_id.to_string(),
            }
        })
    }

    /// Close the mailbox; pending and future receives end with `MailboxClosedError`
    pub fn close(&self) {
        self.closed.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }
}

impl MailboxReceiver {
    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    /// Wait for the next message in FIFO order, or for the mailbox to close.
    ///
    /// Close wins over queued messages.
    pub async fn receive(&mut self) -> Result<Message, MailboxClosedError> {
        tokio::select! {
            biased;
            _ = self.closed.cancelled() => Err(MailboxClosedError {
                node_id: self.node_id.to_string(),
            }),
            message = self.receiver.recv() => message.ok_or_else(|| MailboxClosedError {
                node_id: self.node_id.to_string(),
            }),
        }
    }
}
