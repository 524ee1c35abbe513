// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stepgraph contributors

//! Graph command - visualize pipeline as a graph

use miette::Result;
use std::path::PathBuf;

use super::GraphFormat;
use super::report;
use crate::config::EditorConfig;
use crate::graph::DagView;
use crate::persist::{self, PersistedPipeline};

/// Run the graph command
pub async fn run(
    pipeline_path: PathBuf,
    format: GraphFormat,
    config: &EditorConfig,
    verbose: bool,
) -> Result<()> {
    let persisted = PersistedPipeline::from_file(&pipeline_path)?;
    let pipeline = persist::load_checked(persisted, &config.transient_prefix).map_err(report)?;

    let dag = DagView::build(&pipeline.graph)?;

    // Summary goes to stderr so the rendering can be piped
    if verbose {
        eprintln!(
            "{}: {} steps, {} connections",
            pipeline.name,
            pipeline.graph.len(),
            pipeline.graph.connections().count()
        );
    }

    let output = match format {
        GraphFormat::Text => dag.to_text()?,
        GraphFormat::Dot => dag.to_dot(),
        GraphFormat::Mermaid => dag.to_mermaid(),
    };

    print!("{}", output);

    Ok(())
}
