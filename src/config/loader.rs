// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::config::consts::DEFAULT_SEED_PAYLOAD;
use crate::config::validation::validate_config;
use crate::engine::{Graph, GraphBuilder, JoinPolicy, Seed};
use crate::errors::{ConfigError, FailureStrategy, GraphValidationError};

/// Main configuration structure for a graph run.
///
/// Describes the topology, the default join policy, how work-step failures are
/// handled, executor limits, and the seed messages that start the run. It is
/// typically loaded from a YAML or TOML topology file.
///
/// # Example
/// ```yaml
/// join_policy: count_based
/// failure_strategy: continue_on_error
/// executor_options:
///   max_concurrency: 4
///   delay_ms: 5000
/// nodes:
///   - id: A
///     successors: [B, C]
///   - id: B
///     successors: [D]
///   - id: C
///     successors: [D]
///   - id: D
///     successors: [E]
///     requires: 2
///   - id: E
///     requires: 1
/// seeds:
///   - node: A
///     payload: Start DAG
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub join_policy: JoinPolicy,
    #[serde(default)]
    pub failure_strategy: FailureStrategy,
    #[serde(default)]
    pub executor_options: ExecutorOptions,
    pub nodes: Vec<NodeConfig>,
    #[serde(default)]
    pub seeds: Vec<SeedConfig>,
}

/// Executor-specific configuration options.
///
/// # Fields
/// * `max_concurrency` - Maximum number of work steps running at once (unlimited if absent)
/// * `timeout_seconds` - Timeout for a single work step
/// * `delay_ms` - Simulated work delay for `processed_by` nodes without their own `delay_ms`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExecutorOptions {
    pub max_concurrency: Option<usize>,
    pub timeout_seconds: Option<u64>,
    pub delay_ms: Option<u64>,
}

impl ExecutorOptions {
    pub fn work_timeout(&self) -> Option<Duration> {
        self.timeout_seconds.map(Duration::from_secs)
    }

    pub fn work_delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms.unwrap_or_default())
    }
}

/// Configuration for a single node in the graph.
///
/// # Fields
/// * `id` - Unique node name
/// * `successors` - Ordered list of nodes that receive this node's output
/// * `requires` - Arrivals needed before the node fires (absent for fan-out nodes)
/// * `join_policy` - Overrides the top-level `join_policy` for this node
/// * `processor` - Local processor implementation name (defaults to `processed_by`)
/// * `options` - Processor-specific options
///
/// # Example
/// ```yaml
/// id: D
/// successors: [E]
/// requires: 2
/// processor: concatenate
/// options:
///   separator: " | "
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NodeConfig {
    pub id: String,
    #[serde(default)]
    pub successors: Vec<String>,
    #[serde(default)]
    pub requires: Option<usize>,
    #[serde(default)]
    pub join_policy: Option<JoinPolicy>,
    #[serde(default)]
    pub processor: Option<String>,
    #[serde(default)]
    pub options: HashMap<String, serde_yaml::Value>,
}

impl NodeConfig {
    /// A fan-out node with the given successors and the default processor
    pub fn new<I, S>(id: impl Into<String>, successors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: id.into(),
            successors: successors.into_iter().map(Into::into).collect(),
            requires: None,
            join_policy: None,
            processor: None,
            options: HashMap::new(),
        }
    }
}

/// A seed message injected at startup.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SeedConfig {
    pub node: String,
    #[serde(default = "default_seed_payload")]
    pub payload: String,
}

fn default_seed_payload() -> String {
    DEFAULT_SEED_PAYLOAD.to_string()
}

impl Config {
    /// Build the validated, immutable graph described by this configuration
    pub fn build_graph(&self) -> Result<Graph, Vec<GraphValidationError>> {
        self.nodes
            .iter()
            .cloned()
            .fold(
                GraphBuilder::new().default_join_policy(self.join_policy),
                GraphBuilder::add_node,
            )
            .build()
    }

    /// The configured seeds, or one default seed per source node when none are configured
    pub fn seed_messages(&self, graph: &Graph) -> Vec<Seed> {
        if self.seeds.is_empty() {
            return graph
                .sources()
                .map(|node| Seed::new(node.id(), DEFAULT_SEED_PAYLOAD))
                .collect();
        }

        self.seeds
            .iter()
            .map(|seed| Seed::new(seed.node.clone(), seed.payload.clone()))
            .collect()
    }
}

/// Load a config from a YAML (`.yaml`, `.yml`) or TOML (`.toml`) file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();

    match extension.as_str() {
        "yaml" | "yml" => parse_yaml(&content),
        "toml" => parse_toml(&content),
        other => Err(ConfigError::UnsupportedFormat(other.to_string())),
    }
}

pub fn parse_yaml(content: &str) -> Result<Config, ConfigError> {
    Ok(serde_yaml::from_str(content)?)
}

pub fn parse_toml(content: &str) -> Result<Config, ConfigError> {
    Ok(toml::from_str(content)?)
}

/// Load and validate a config file
pub fn load_and_validate_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let config = load_config(path)?;
    validate_config(&config)?;
    Ok(config)
}
