// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;

use super::input_text;
use crate::errors::ProcessorError;
use crate::traits::{Processor, ProcessorRequest};

/// Reverse Text processor - reverses the input string
#[derive(Default)]
pub struct ReverseTextProcessor;

impl ReverseTextProcessor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Processor for ReverseTextProcessor {
    async fn process(&self, req: ProcessorRequest) -> Result<Option<String>, ProcessorError> {
        let input = input_text(&req)?;
        Ok(Some(input.chars().rev().collect()))
    }

    fn name(&self) -> &'static str {
        "reverse_text"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Message;

    #[tokio::test]
    async fn test_reverses_unicode() {
        let req = ProcessorRequest::new("R", vec![Message::seed("héllo")]);
        let output = ReverseTextProcessor::new().process(req).await.unwrap();
        assert_eq!(output.as_deref(), Some("olléh"));
    }

    #[tokio::test]
    async fn test_rejects_empty_batch() {
        let req = ProcessorRequest::new("R", vec![]);
        let result = ReverseTextProcessor::new().process(req).await;
        assert!(matches!(result, Err(ProcessorError::InvalidInput(_))));
    }
}
