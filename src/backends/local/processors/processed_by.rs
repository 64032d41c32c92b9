// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use std::time::Duration;

use crate::errors::ProcessorError;
use crate::traits::{Processor, ProcessorRequest};

/// Simulated work: waits `delay`, then stamps the output with the node's name.
///
/// The default processor for nodes that don't configure one. Output is
/// `"Processed by <node>"` regardless of input.
pub struct ProcessedByProcessor {
    delay: Duration,
}

impl ProcessedByProcessor {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl Default for ProcessedByProcessor {
    fn default() -> Self {
        Self::new(Duration::ZERO)
    }
}

#[async_trait]
impl Processor for ProcessedByProcessor {
    async fn process(&self, req: ProcessorRequest) -> Result<Option<String>, ProcessorError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(Some(format!("Processed by {}", req.node_id)))
    }

    fn name(&self) -> &'static str {
        "processed_by"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Message;

    #[tokio::test]
    async fn test_stamps_node_name() {
        let processor = ProcessedByProcessor::default();
        let req = ProcessorRequest::new("B", vec![Message::seed("Start DAG")]);

        let output = processor.process(req).await.unwrap();
        assert_eq!(output.as_deref(), Some("Processed by B"));
    }

    #[tokio::test]
    async fn test_waits_for_delay() {
        let processor = ProcessedByProcessor::new(Duration::from_millis(30));
        let req = ProcessorRequest::new("C", vec![Message::seed("x")]);

        let started = std::time::Instant::now();
        processor.process(req).await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(30));
    }
}
