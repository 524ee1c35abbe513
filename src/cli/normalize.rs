// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stepgraph contributors

//! Normalize command - load and re-save a pipeline

use miette::Result;
use std::path::PathBuf;

use super::report;
use crate::config::EditorConfig;
use crate::graph::is_transient_key;
use crate::persist::{self, FileFormat, PersistedPipeline};
use crate::utils::print_success;

/// Run the normalize command
pub async fn run(
    pipeline_path: PathBuf,
    output: Option<PathBuf>,
    format: FileFormat,
    config: &EditorConfig,
    verbose: bool,
) -> Result<()> {
    let persisted = PersistedPipeline::from_file(&pipeline_path)?;
    let dropped: Vec<(String, usize)> = persisted
        .steps
        .iter()
        .map(|(id, step)| {
            let count = step
                .meta_data
                .extra
                .keys()
                .filter(|k| is_transient_key(k, &config.transient_prefix))
                .count();
            (id.clone(), count)
        })
        .filter(|(_, count)| *count > 0)
        .collect();

    let pipeline = persist::load_checked(persisted, &config.transient_prefix).map_err(report)?;
    let normalized = persist::save_with_prefix(&pipeline, &config.transient_prefix);

    // Report on stderr; stdout may carry the document
    if verbose {
        for (id, count) in &dropped {
            eprintln!("  {}: dropped {} editor-only metadata key(s)", id, count);
        }
        eprintln!("  {} steps normalized", normalized.steps.len());
    }

    match output {
        Some(path) => {
            normalized.to_file(&path, config.pretty)?;
            print_success(&format!("Wrote {}", path.display()));
        }
        None => println!("{}", normalized.render(format, config.pretty)?.trim_end()),
    }

    Ok(())
}
