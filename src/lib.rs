// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod backends;   // node processors
pub mod config;     // topology files + runtime builder
pub mod engine;     // mailboxes, barriers, runners, scheduler
pub mod errors;     // error handling
pub mod observability;
pub mod traits;     // unified abstractions
