// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod loader;
mod processor_map;
mod runtime;
mod validation;

pub mod consts;
#[cfg(test)]
mod integration_tests;

pub use loader::{
    load_and_validate_config, load_config, parse_toml, parse_yaml, Config, ExecutorOptions,
    NodeConfig, SeedConfig,
};
pub use processor_map::ProcessorMap;
pub use runtime::RuntimeBuilder;
pub use validation::{validate_config, validate_topology};
