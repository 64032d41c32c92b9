// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Errors for processor map creation and processor instantiation.

use std::error::Error;
use std::fmt;

/// Errors that can occur during processor map creation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessorMapError {
    /// The configured processor name is not a known local implementation
    UnknownProcessor {
        node_id: String,
        processor: String,
    },

    /// A processor option has the wrong shape
    InvalidOption {
        node_id: String,
        option: String,
        reason: String,
    },
}

impl fmt::Display for ProcessorMapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessorMapError::UnknownProcessor { node_id, processor } => {
                write!(
                    f,
                    "Unknown local processor implementation '{}' for node '{}'",
                    processor, node_id
                )
            }
            ProcessorMapError::InvalidOption {
                node_id,
                option,
                reason,
            } => {
                write!(
                    f,
                    "Invalid option '{}' for node '{}': {}",
                    option, node_id, reason
                )
            }
        }
    }
}

impl Error for ProcessorMapError {}
