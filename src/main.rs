// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::env;
use std::io;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use channel_dag::backends::local::ProcessedByProcessor;
use channel_dag::config::consts::{DEFAULT_SEED_PAYLOAD, DEMO_WORK_DELAY_MS};
use channel_dag::config::{load_config, RuntimeBuilder};
use channel_dag::engine::{Graph, RunReport, Scheduler, Seed};
use channel_dag::errors::ConfigError;
use channel_dag::observability::JsonLinesEventSink;
use tokio::io::{AsyncBufReadExt, BufReader};

struct CliArgs {
    topology: Option<String>,
    until_idle: bool,
    events_json: bool,
}

fn parse_args(args: &[String]) -> Result<CliArgs, String> {
    let mut cli = CliArgs {
        topology: None,
        until_idle: false,
        events_json: false,
    };

    for arg in args.iter().skip(1) {
        match arg.as_str() {
            "--until-idle" => cli.until_idle = true,
            "--events-json" => cli.events_json = true,
            flag if flag.starts_with("--") => return Err(format!("unknown flag '{}'", flag)),
            path if cli.topology.is_none() => cli.topology = Some(path.to_string()),
            extra => return Err(format!("unexpected argument '{}'", extra)),
        }
    }

    Ok(cli)
}

/// The topology the tool runs when no file is given: A fans out to B and C, which
/// join at D, which feeds E.
fn reference_topology() -> anyhow::Result<(Scheduler, Vec<Seed>)> {
    let graph = Graph::builder()
        .node("A", ["B", "C"])
        .node("B", ["D"])
        .node("C", ["D"])
        .node("D", ["E"])
        .node("E", Vec::<String>::new())
        .join("D", 2)
        .join("E", 1)
        .build()
        .map_err(ConfigError::from)?;

    let scheduler = Scheduler::new(graph).with_default_processor(Arc::new(
        ProcessedByProcessor::new(Duration::from_millis(DEMO_WORK_DELAY_MS)),
    ));
    Ok((scheduler, vec![Seed::new("A", DEFAULT_SEED_PAYLOAD)]))
}

async fn wait_for_enter() {
    let mut line = String::new();
    let mut stdin = BufReader::new(tokio::io::stdin());
    if stdin.read_line(&mut line).await.is_err() {
        // No usable stdin: fall back to Ctrl-C only.
        std::future::pending::<()>().await;
    }
}

fn print_summary(report: &RunReport) {
    println!("\n📊 Run summary ({:?})", report.duration);
    for (node_id, runner) in &report.runners {
        println!(
            "  {} → received {}, fired {}, forwarded {}",
            node_id, runner.received, runner.fired, runner.forwarded
        );
    }

    let stalled: Vec<_> = report.stalled_joins().collect();
    if !stalled.is_empty() {
        println!("\n⏳ Join nodes still waiting:");
        for runner in stalled {
            println!(
                "  {} → {} arrival(s) held, {} more needed",
                runner.node_id,
                runner.pending_arrivals,
                runner.remaining.unwrap_or_default()
            );
        }
    }

    let failures: Vec<_> = report.failures().collect();
    if !failures.is_empty() {
        println!("\n❌ Work-step failures:");
        for failure in failures {
            println!("  {}", failure);
        }
    }

    for error in report.aborted_runners() {
        println!("\n💥 {}", error);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(rust_log))
        .with_writer(io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();
    let cli = match parse_args(&args) {
        Ok(cli) => cli,
        Err(e) => {
            eprintln!("{}", e);
            eprintln!(
                "Usage: {} [topology.yaml|topology.toml] [--until-idle] [--events-json]",
                args.first().map(String::as_str).unwrap_or("channel-dag")
            );
            std::process::exit(2);
        }
    };

    let (mut scheduler, seeds) = match &cli.topology {
        Some(path) => {
            let config = load_config(path)
                .with_context(|| format!("failed to load topology '{}'", path))?;
            RuntimeBuilder::from_config(&config)
                .with_context(|| format!("invalid topology '{}'", path))?
        }
        None => {
            println!("🚀 No topology given, running the reference DAG (A → B, C → D → E)");
            reference_topology()?
        }
    };

    if cli.events_json {
        scheduler = scheduler.with_event_sink(Arc::new(JsonLinesEventSink::new(io::stdout())));
    }

    let handle = scheduler.start(seeds).context("failed to start graph execution")?;
    let stop = handle.stop_token();

    if cli.until_idle {
        println!("Running until the graph drains (Ctrl-C to stop early)...");
        tokio::select! {
            _ = handle.wait_idle() => {}
            _ = tokio::signal::ctrl_c() => {}
        }
    } else {
        println!("Running. Press Enter or Ctrl-C to stop...");
        tokio::select! {
            _ = wait_for_enter() => {}
            _ = tokio::signal::ctrl_c() => {}
            _ = stop.cancelled() => {}
        }
    }

    let report = handle.shutdown().await?;
    print_summary(&report);

    Ok(())
}
