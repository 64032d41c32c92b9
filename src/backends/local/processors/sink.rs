// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;

use crate::errors::ProcessorError;
use crate::traits::{Processor, ProcessorRequest};

/// Terminal processor: consumes its input and forwards nothing.
#[derive(Default)]
pub struct SinkProcessor;

impl SinkProcessor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Processor for SinkProcessor {
    async fn process(&self, req: ProcessorRequest) -> Result<Option<String>, ProcessorError> {
        tracing::info!(node_id = %req.node_id, inputs = req.inputs.len(), payload = %req.joined_payload(" | "), "Sink consumed input");
        Ok(None)
    }

    fn name(&self) -> &'static str {
        "sink"
    }
}
