// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Observability for the execution engine.
//!
//! Two complementary surfaces:
//!
//! * `messages` - one struct per loggable event, implementing `Display` and
//!   [`messages::StructuredLog`], so log text lives in one place and every
//!   `tracing` record carries structured fields.
//! * `events` - the [`events::NodeEvent`] stream. Every runner transition (received,
//!   waiting, released, forwarded, failed, stopped) is handed to the registered
//!   [`events::EventSink`]s for whatever presentation layer sits on top.
//!
//! # Usage
//!
//! ```rust
//! use channel_dag::observability::messages::node::WaitingForArrivals;
//! use channel_dag::observability::messages::StructuredLog;
//!
//! WaitingForArrivals {
//!     node_id: "D",
//!     arrived: 1,
//!     remaining: 1,
//! }
//! .log();
//! ```

pub mod events;
pub mod messages;

pub use events::{ChannelEventSink, EventSink, JsonLinesEventSink, NodeEvent, NodeEventKind};
