// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;
use std::time::Duration;

use super::processors::*;
use crate::config::{ExecutorOptions, NodeConfig};
use crate::errors::ProcessorMapError;
use crate::traits::Processor;

/// Name used for nodes that don't configure a processor
pub const DEFAULT_PROCESSOR: &str = "processed_by";

/// Factory for creating local (in-process) processor instances
pub struct LocalProcessorFactory;

impl LocalProcessorFactory {
    /// Create the processor for a node from its configuration
    ///
    /// The `processor` field of the node determines which processor to create:
    /// - absent or "processed_by" -> ProcessedByProcessor (option `delay_ms`, falling
    ///   back to the executor's `delay_ms`)
    /// - "change_text_case_upper" -> ChangeTextCaseProcessor (uppercase)
    /// - "change_text_case_lower" -> ChangeTextCaseProcessor (lowercase)
    /// - "change_text_case_proper" -> ChangeTextCaseProcessor (proper case)
    /// - "change_text_case_title" -> ChangeTextCaseProcessor (title case)
    /// - "reverse_text" -> ReverseTextProcessor
    /// - "concatenate" -> ConcatenateProcessor (option `separator`)
    /// - "sink" -> SinkProcessor
    pub fn create_processor(
        node: &NodeConfig,
        executor: &ExecutorOptions,
    ) -> Result<Arc<dyn Processor>, ProcessorMapError> {
        let name = node.processor.as_deref().unwrap_or(DEFAULT_PROCESSOR);

        match name {
            "processed_by" => {
                let delay = match u64_option(node, "delay_ms")? {
                    Some(ms) => Duration::from_millis(ms),
                    None => executor.work_delay(),
                };
                Ok(Arc::new(ProcessedByProcessor::new(delay)))
            }

            "change_text_case_upper" => Ok(Arc::new(ChangeTextCaseProcessor::upper())),
            "change_text_case_lower" => Ok(Arc::new(ChangeTextCaseProcessor::lower())),
            "change_text_case_proper" => Ok(Arc::new(ChangeTextCaseProcessor::proper())),
            "change_text_case_title" => Ok(Arc::new(ChangeTextCaseProcessor::title())),

            "reverse_text" => Ok(Arc::new(ReverseTextProcessor::new())),

            "concatenate" => {
                let separator = string_option(node, "separator")?;
                Ok(Arc::new(ConcatenateProcessor::new(separator)))
            }

            "sink" => Ok(Arc::new(SinkProcessor::new())),

            other => Err(ProcessorMapError::UnknownProcessor {
                node_id: node.id.clone(),
                processor: other.to_string(),
            }),
        }
    }

    /// List all available local processor implementations
    pub fn list_available_implementations() -> Vec<&'static str> {
        vec![
            "processed_by",
            "change_text_case_upper",
            "change_text_case_lower",
            "change_text_case_proper",
            "change_text_case_title",
            "reverse_text",
            "concatenate",
            "sink",
        ]
    }

    /// Check if an implementation is available
    pub fn is_implementation_available(name: &str) -> bool {
        Self::list_available_implementations().contains(&name)
    }
}

fn u64_option(node: &NodeConfig, option: &str) -> Result<Option<u64>, ProcessorMapError> {
    match node.options.get(option) {
        None => Ok(None),
        Some(value) => value.as_u64().map(Some).ok_or_else(|| ProcessorMapError::InvalidOption {
            node_id: node.id.clone(),
            option: option.to_string(),
            reason: "expected a non-negative integer".to_string(),
        }),
    }
}

fn string_option(node: &NodeConfig, option: &str) -> Result<Option<String>, ProcessorMapError> {
    match node.options.get(option) {
        None => Ok(None),
        Some(value) => value
            .as_str()
            .map(|s| Some(s.to_string()))
            .ok_or_else(|| ProcessorMapError::InvalidOption {
                node_id: node.id.clone(),
                option: option.to_string(),
                reason: "expected a string".to_string(),
            }),
    }
}
