// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

/// Payload injected into every source node when a topology declares no seeds
pub const DEFAULT_SEED_PAYLOAD: &str = "Start DAG";
/// Simulated work delay used by the demo topology (the `processed_by` processor defaults to none)
pub const DEMO_WORK_DELAY_MS: u64 = 5_000;
