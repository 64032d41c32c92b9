// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;

use crate::engine::Message;
use crate::errors::ProcessorError;
use crate::traits::{Processor, ProcessorRequest};

/// Combines a join batch into one payload.
///
/// Inputs are ordered by source node id (seeds first), so the output does not
/// depend on the order in which predecessors happened to finish. Inputs from the
/// same source keep their arrival order.
pub struct ConcatenateProcessor {
    separator: String,
}

impl ConcatenateProcessor {
    pub fn new(separator: Option<String>) -> Self {
        Self {
            separator: separator.unwrap_or_default(),
        }
    }

    pub fn separator(&self) -> &str {
        &self.separator
    }
}

#[async_trait]
impl Processor for ConcatenateProcessor {
    async fn process(&self, req: ProcessorRequest) -> Result<Option<String>, ProcessorError> {
        if req.inputs.is_empty() {
            return Err(ProcessorError::InvalidInput(
                "no input messages to concatenate".to_string(),
            ));
        }

        let mut inputs: Vec<&Message> = req.inputs.iter().collect();
        inputs.sort_by(|a, b| a.source().cmp(&b.source()));

        let combined = inputs
            .into_iter()
            .map(Message::payload)
            .collect::<Vec<_>>()
            .join(&self.separator);
        Ok(Some(combined))
    }

    fn name(&self) -> &'static str {
        "concatenate"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_orders_by_source() {
        let processor = ConcatenateProcessor::new(Some(" + ".to_string()));
        let req = ProcessorRequest::new(
            "D",
            vec![
                Message::from_node("C", "from C"),
                Message::from_node("B", "from B"),
            ],
        );

        let output = processor.process(req).await.unwrap();
        assert_eq!(output.as_deref(), Some("from B + from C"));
    }

    #[tokio::test]
    async fn test_default_separator_is_empty() {
        let processor = ConcatenateProcessor::new(None);
        let req = ProcessorRequest::new(
            "D",
            vec![Message::from_node("A", "x"), Message::from_node("A", "y")],
        );

        let output = processor.process(req).await.unwrap();
        assert_eq!(output.as_deref(), Some("xy"));
    }

    #[tokio::test]
    async fn test_empty_batch_is_invalid() {
        let processor = ConcatenateProcessor::new(None);
        let result = processor.process(ProcessorRequest::new("D", vec![])).await;
        assert!(matches!(result, Err(ProcessorError::InvalidInput(_))));
    }
}
