// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stepgraph contributors

//! Connect/disconnect commands - edit connections and save

use miette::Result;
use std::path::PathBuf;

use super::report;
use crate::config::EditorConfig;
use crate::graph::PipelineGraph;
use crate::persist::{self, PersistedPipeline};
use crate::utils::{print_info, print_success};

/// Run the connect command
pub async fn connect(
    pipeline_path: PathBuf,
    source: String,
    target: String,
    output: Option<PathBuf>,
    config: &EditorConfig,
    verbose: bool,
) -> Result<()> {
    let persisted = PersistedPipeline::from_file(&pipeline_path)?;
    let mut pipeline = persist::load_checked(persisted, &config.transient_prefix).map_err(report)?;

    if !pipeline.graph.connect(&source, &target).map_err(report)? {
        print_info(&format!("{} → {} already exists, nothing to do", source, target));
        return Ok(());
    }

    let destination = output.unwrap_or(pipeline_path);
    persist::save_with_prefix(&pipeline, &config.transient_prefix)
        .to_file(&destination, config.pretty)?;

    print_success(&format!(
        "Connected {} → {} ({})",
        source,
        target,
        destination.display()
    ));
    if verbose {
        print_incoming(&pipeline.graph, &target);
    }
    Ok(())
}

/// Run the disconnect command
pub async fn disconnect(
    pipeline_path: PathBuf,
    source: String,
    target: String,
    output: Option<PathBuf>,
    config: &EditorConfig,
    verbose: bool,
) -> Result<()> {
    let persisted = PersistedPipeline::from_file(&pipeline_path)?;
    let mut pipeline = persist::load_checked(persisted, &config.transient_prefix).map_err(report)?;

    pipeline.graph.disconnect(&source, &target).map_err(report)?;

    let destination = output.unwrap_or(pipeline_path);
    persist::save_with_prefix(&pipeline, &config.transient_prefix)
        .to_file(&destination, config.pretty)?;

    print_success(&format!(
        "Disconnected {} → {} ({})",
        source,
        target,
        destination.display()
    ));
    if verbose {
        print_incoming(&pipeline.graph, &target);
    }
    Ok(())
}

/// Show what a step now depends on
fn print_incoming(graph: &PipelineGraph, id: &str) {
    if let Some(step) = graph.step(id) {
        let incoming = if step.incoming_connections.is_empty() {
            "(none)".to_string()
        } else {
            step.incoming_connections.join(", ")
        };
        print_info(&format!("{} now runs after: {}", id, incoming));
    }
}
