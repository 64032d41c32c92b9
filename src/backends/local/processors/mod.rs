// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod change_text_case;
pub mod concatenate;
pub mod processed_by;
pub mod reverse_text;
pub mod sink;

pub use change_text_case::*;
pub use concatenate::*;
pub use processed_by::*;
pub use reverse_text::*;
pub use sink::*;

use crate::errors::ProcessorError;
use crate::traits::ProcessorRequest;

/// Text of a request: the single payload for fan-out firings, payloads joined by a
/// space for join batches.
pub(crate) fn input_text(req: &ProcessorRequest) -> Result<String, ProcessorError> {
    if req.inputs.is_empty() {
        return Err(ProcessorError::InvalidInput(format!(
            "node '{}' fired without input messages",
            req.node_id
        )));
    }
    Ok(req.joined_payload(" "))
}
