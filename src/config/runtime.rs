// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::validation::validate_config;
use crate::config::{Config, ProcessorMap};
use crate::engine::{Scheduler, SchedulerOptions, Seed};
use crate::errors::ConfigError;

/// Runtime builder: turns a loaded configuration into a ready-to-start scheduler.
///
/// Validates the configuration, builds the immutable [`crate::engine::Graph`],
/// creates a processor for every node and applies the executor options.
///
/// # Example
/// ```
/// use channel_dag::config::{parse_yaml, RuntimeBuilder};
///
/// let config = parse_yaml(r#"
/// nodes:
///   - id: A
///     successors: [B]
///   - id: B
/// "#).unwrap();
///
/// let (scheduler, seeds) = RuntimeBuilder::from_config(&config).unwrap();
/// assert_eq!(scheduler.graph().len(), 2);
/// assert_eq!(seeds[0].node_id, "A");
/// ```
pub struct RuntimeBuilder;

impl RuntimeBuilder {
    /// Build the scheduler and the seed messages for a run.
    pub fn from_config(cfg: &Config) -> Result<(Scheduler, Vec<Seed>), ConfigError> {
        validate_config(cfg)?;

        let graph = cfg.build_graph()?;
        let seeds = cfg.seed_messages(&graph);
        let processors = ProcessorMap::from_config(cfg)?;

        let options = SchedulerOptions {
            max_concurrency: cfg.executor_options.max_concurrency,
            work_timeout: cfg.executor_options.work_timeout(),
            failure_strategy: cfg.failure_strategy,
        };

        let scheduler = Scheduler::new(graph)
            .with_processors(processors)
            .with_options(options);

        Ok((scheduler, seeds))
    }
}
