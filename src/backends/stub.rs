// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::errors::ProcessorError;
use crate::traits::{Processor, ProcessorRequest};

/// Echoes its input, batch payloads joined with `+`
pub struct StubProcessor;

#[async_trait::async_trait]
impl Processor for StubProcessor {
    async fn process(&self, req: ProcessorRequest) -> Result<Option<String>, ProcessorError> {
        Ok(Some(req.joined_payload("+")))
    }

    fn name(&self) -> &'static str {
        "stub"
    }
}

/// Echoes like [`StubProcessor`] and records every firing
#[derive(Default)]
pub struct CountingProcessor {
    batches: Mutex<Vec<usize>>,
    delay: Duration,
}

impl CountingProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            batches: Mutex::new(Vec::new()),
            delay,
        }
    }

    pub fn fired(&self) -> usize {
        self.batches.lock().unwrap().len()
    }

    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batches.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Processor for CountingProcessor {
    async fn process(&self, req: ProcessorRequest) -> Result<Option<String>, ProcessorError> {
        self.batches.lock().unwrap().push(req.inputs.len());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(Some(req.joined_payload("+")))
    }

    fn name(&self) -> &'static str {
        "counting"
    }
}

/// Fails every firing, or only firings that include a trigger payload
pub struct FailingProcessor {
    trigger: Option<String>,
}

impl FailingProcessor {
    pub fn always() -> Self {
        Self { trigger: None }
    }

    pub fn on_payload(trigger: impl Into<String>) -> Self {
        Self {
            trigger: Some(trigger.into()),
        }
    }
}

#[async_trait::async_trait]
impl Processor for FailingProcessor {
    async fn process(&self, req: ProcessorRequest) -> Result<Option<String>, ProcessorError> {
        let triggered = match &self.trigger {
            None => true,
            Some(trigger) => req.payloads().any(|payload| payload == trigger),
        };

        if triggered {
            return Err(ProcessorError::Failed(
                "Simulated processor failure".to_string(),
            ));
        }
        Ok(Some(req.joined_payload("+")))
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}

/// Panics on firings that include a trigger payload, echoes otherwise
pub struct PanickingProcessor {
    trigger: String,
}

impl PanickingProcessor {
    pub fn on_payload(trigger: impl Into<String>) -> Self {
        Self {
            trigger: trigger.into(),
        }
    }
}

#[async_trait::async_trait]
impl Processor for PanickingProcessor {
    async fn process(&self, req: ProcessorRequest) -> Result<Option<String>, ProcessorError> {
        if req.payloads().any(|payload| payload == self.trigger) {
            panic!("processor bug");
        }
        Ok(Some(req.joined_payload("+")))
    }

    fn name(&self) -> &'static str {
        "panicking"
    }
}

/// Sleeps for a fixed time per firing and records the peak number of firings
/// running at once
pub struct PeakTrackingProcessor {
    delay: Duration,
    running: AtomicUsize,
    peak: AtomicUsize,
}

impl PeakTrackingProcessor {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            running: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Processor for PeakTrackingProcessor {
    async fn process(&self, req: ProcessorRequest) -> Result<Option<String>, ProcessorError> {
        let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.running.fetch_sub(1, Ordering::SeqCst);
        Ok(Some(req.joined_payload("+")))
    }

    fn name(&self) -> &'static str {
        "peak_tracking"
    }
}
