// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

#[cfg(test)]
mod integration_tests {
    use std::sync::Arc;
    use std::time::Duration;

    use crate::config::consts::DEFAULT_SEED_PAYLOAD;
    use crate::config::{load_and_validate_config, load_config, RuntimeBuilder};
    use crate::engine::{Graph, JoinPolicy, JoinSpec, Seed};
    use crate::errors::FailureStrategy;
    use crate::observability::{ChannelEventSink, NodeEventKind};

    const GUARD: Duration = Duration::from_secs(10);

    fn shape(graph: &Graph) -> Vec<(String, Vec<String>, Option<JoinSpec>)> {
        graph
            .nodes()
            .map(|node| (node.id().to_string(), node.successors().to_vec(), node.join()))
            .collect()
    }

    /// Test that the reference topology loads with its executor options and seed
    #[test]
    fn test_reference_yaml_loading() {
        let config = load_and_validate_config("configs/channel-dag.yaml").unwrap();

        assert_eq!(config.join_policy, JoinPolicy::CountBased);
        assert_eq!(config.failure_strategy, FailureStrategy::ContinueOnError);
        assert_eq!(config.executor_options.delay_ms, Some(5000));
        assert_eq!(config.nodes.len(), 5);
        assert_eq!(config.nodes[0].successors, vec!["B", "C"]);
        assert_eq!(config.nodes[3].requires, Some(2));

        let graph = config.build_graph().unwrap();
        assert_eq!(
            config.seed_messages(&graph),
            vec![Seed::new("A", DEFAULT_SEED_PAYLOAD)]
        );
    }

    /// Test that the YAML and TOML renditions describe the same graph
    #[test]
    fn test_toml_and_yaml_build_the_same_graph() {
        let yaml = load_config("configs/channel-dag.yaml").unwrap();
        let toml = load_config("configs/channel-dag.toml").unwrap();

        let yaml_graph = yaml.build_graph().unwrap();
        let toml_graph = toml.build_graph().unwrap();

        assert_eq!(shape(&yaml_graph), shape(&toml_graph));
        assert_eq!(
            yaml.seed_messages(&yaml_graph),
            toml.seed_messages(&toml_graph)
        );
        assert_eq!(toml.executor_options.delay_ms, None);
    }

    /// Test that validation is stable across repeated loads
    #[test]
    fn test_repeated_validation_is_identical() {
        let first = load_config("configs/text-pipeline.yaml").unwrap();
        let second = load_config("configs/text-pipeline.yaml").unwrap();

        assert_eq!(
            shape(&first.build_graph().unwrap()),
            shape(&second.build_graph().unwrap())
        );
    }

    /// Test the text pipeline end to end through the runtime builder
    #[tokio::test]
    async fn test_text_pipeline_runs_to_quiescence() {
        let config = load_and_validate_config("configs/text-pipeline.yaml").unwrap();
        assert_eq!(config.join_policy, JoinPolicy::DistinctSource);

        let (scheduler, seeds) = RuntimeBuilder::from_config(&config).unwrap();
        assert_eq!(scheduler.options().max_concurrency, Some(2));
        assert_eq!(
            scheduler.options().work_timeout,
            Some(Duration::from_secs(5))
        );

        let (sink, mut events) = ChannelEventSink::new();
        let scheduler = scheduler.with_event_sink(Arc::new(sink));

        let report = tokio::time::timeout(GUARD, scheduler.run_to_quiescence(seeds))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(report.fired("combine"), 1);
        assert_eq!(report.fired("output"), 1);
        assert_eq!(report.failures().count(), 0);

        let mut combined = None;
        while let Ok(event) = events.try_recv() {
            if event.node_id == "combine" && event.kind == NodeEventKind::Processed {
                combined = event.payload;
            }
        }
        assert_eq!(combined.as_deref(), Some("dlroW olleH | HELLO WORLD"));
    }

    /// Test that a join fed by a single predecessor is reported as stalled
    #[tokio::test]
    async fn test_stalled_join_topology() {
        let config = load_and_validate_config("configs/stalled-join.yaml").unwrap();
        let (scheduler, seeds) = RuntimeBuilder::from_config(&config).unwrap();
        assert_eq!(seeds, vec![Seed::new("A", DEFAULT_SEED_PAYLOAD)]);

        let report = tokio::time::timeout(GUARD, scheduler.run_to_quiescence(seeds))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(report.fired("B"), 1);
        assert_eq!(report.fired("D"), 0);
        assert_eq!(report.fired("E"), 0);
        assert_eq!(report.runner("D").unwrap().remaining, Some(1));
    }
}
