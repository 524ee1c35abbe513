// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stepgraph contributors

//! Check command - ask the cycle guard about a proposed connection

use colored::Colorize;
use miette::Result;
use std::path::PathBuf;

use super::report;
use crate::config::EditorConfig;
use crate::errors::StepgraphError;
use crate::graph::{find_path, would_create_cycle};
use crate::persist::{self, PersistedPipeline};

/// Run the check command
pub async fn run(
    pipeline_path: PathBuf,
    source: String,
    target: String,
    config: &EditorConfig,
    verbose: bool,
) -> Result<()> {
    let persisted = PersistedPipeline::from_file(&pipeline_path)?;
    let pipeline = persist::load_checked(persisted, &config.transient_prefix).map_err(report)?;
    let graph = &pipeline.graph;

    for id in [&source, &target] {
        if !graph.contains(id) {
            return Err(report(StepgraphError::StepNotFound { step: id.clone() }));
        }
    }

    if !would_create_cycle(graph, &source, &target) {
        println!(
            "  {} {} → {} keeps the pipeline acyclic",
            "✓".green(),
            source,
            target
        );
        if verbose && graph.has_connection(&source, &target) {
            println!("    {}", "(connection already exists)".dimmed());
        }
        return Ok(());
    }

    println!(
        "  {} {} → {} would create a cycle",
        "✗".red(),
        source,
        target
    );

    if source == target {
        return Err(StepgraphError::SelfLoop { step: source }.into());
    }

    let path = find_path(graph, &target, &source).unwrap_or_default();
    Err(report(StepgraphError::CircularDependency {
        source_step: source,
        target,
        path,
    }))
}
