// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::HashMap;
use std::sync::Arc;

use crate::backends::local::LocalProcessorFactory;
use crate::config::Config;
use crate::errors::ProcessorMapError;
use crate::traits::Processor;

/// A registry mapping node ids to the processors that do their work.
///
/// Processors are held as `Arc<dyn Processor>` so every runner can share them across
/// tasks without cloning. Nodes missing from the map fall back to the scheduler's
/// default processor.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use channel_dag::backends::local::ReverseTextProcessor;
/// use channel_dag::config::ProcessorMap;
///
/// let mut processors = ProcessorMap::new();
/// processors.insert("B".to_string(), Arc::new(ReverseTextProcessor::new()));
///
/// assert!(processors.contains_key("B"));
/// assert_eq!(processors.get("B").unwrap().name(), "reverse_text");
/// ```
#[derive(Clone, Default)]
pub struct ProcessorMap(pub HashMap<String, Arc<dyn Processor>>);

impl ProcessorMap {
    /// Create a new empty processor map
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    /// Create a processor for every node in the configuration
    pub fn from_config(cfg: &Config) -> Result<Self, ProcessorMapError> {
        let mut registry = HashMap::new();

        for node in &cfg.nodes {
            let processor = LocalProcessorFactory::create_processor(node, &cfg.executor_options)?;
            registry.insert(node.id.clone(), processor);
        }

        Ok(Self(registry))
    }

    /// Insert a processor into the map
    pub fn insert(&mut self, id: String, processor: Arc<dyn Processor>) {
        self.0.insert(id, processor);
    }

    /// Get a processor by node id
    pub fn get(&self, id: &str) -> Option<&Arc<dyn Processor>> {
        self.0.get(id)
    }

    pub fn contains_key(&self, id: &str) -> bool {
        self.0.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for ProcessorMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessorMap")
            .field("processor_count", &self.0.len())
            .field("node_ids", &self.0.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl From<HashMap<String, Arc<dyn Processor>>> for ProcessorMap {
    fn from(map: HashMap<String, Arc<dyn Processor>>) -> Self {
        Self(map)
    }
}
