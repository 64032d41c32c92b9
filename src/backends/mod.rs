// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Processor backends: the work a node performs when it fires.
//!
//! # Available Backends
//!
//! ## Local Backend
//! In-process Rust processors, created by name from node configuration:
//! - **Simulated work**: `processed_by`, with an optional delay
//! - **Text Transformation**: case conversion, reversal
//! - **Join helpers**: `concatenate` for batches, `sink` for terminal nodes
//!
//! ## Stub Backend (Test-Only)
//! Testing utilities for engine development (only available in test builds):
//! - **StubProcessor**: echoes its input
//! - **CountingProcessor**: records firings and batch sizes
//! - **FailingProcessor**: fails always or on a trigger payload
//!
//! # Examples
//!
//! ```rust
//! use channel_dag::backends::local::LocalProcessorFactory;
//! use channel_dag::config::{ExecutorOptions, NodeConfig};
//!
//! let mut node = NodeConfig::new("B", ["D"]);
//! node.processor = Some("change_text_case_upper".to_string());
//!
//! let processor = LocalProcessorFactory::create_processor(&node, &ExecutorOptions::default())?;
//! assert_eq!(processor.name(), "change_text_case");
//! # Ok::<(), channel_dag::errors::ProcessorMapError>(())
//! ```

pub mod local;
#[cfg(test)]
pub mod stub;
