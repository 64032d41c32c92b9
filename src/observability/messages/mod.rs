// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging.
//!
//! * `engine` - scheduler lifecycle (start, seeding, quiescence, shutdown)
//! * `node` - runner transitions and work-step outcomes
//! * `validation` - topology acceptance and rejection

use tracing::Span;

pub mod engine;
pub mod node;
pub mod validation;

/// A log message that knows its level and structured fields.
pub trait StructuredLog {
    /// Emit the message at its level with structured fields
    fn log(&self);

    /// Build a span carrying the same fields
    fn span(&self, name: &str) -> Span;
}
