// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stepgraph contributors

//! Validate command - check pipeline structure

use colored::Colorize;
use miette::Result;
use std::path::PathBuf;

use crate::config::EditorConfig;
use crate::graph::PipelineValidator;
use crate::persist::PersistedPipeline;

/// Run the validate command
pub async fn run(pipeline_path: PathBuf, config: &EditorConfig, verbose: bool) -> Result<()> {
    println!("{}", "Validating pipeline...".bold());
    println!();

    let pipeline = match PersistedPipeline::from_file(&pipeline_path) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("  {} Failed to parse pipeline", "✗".red());
            eprintln!();
            return Err(e.into());
        }
    };

    println!("  {} Pipeline file parsed", "✓".green());

    let validation = PipelineValidator::validate(&pipeline, &config.transient_prefix);

    if !validation.errors.is_empty() {
        println!();
        println!("{}:", "Errors".red().bold());
        for error in &validation.errors {
            println!("  {} {}", "✗".red(), error);
        }
    }

    if validation.has_warnings() {
        println!();
        println!("{}:", "Warnings".yellow().bold());
        for warning in &validation.warnings {
            println!("  {} {}", "⚠".yellow(), warning);
        }
    }

    if verbose {
        println!();
        println!("{}:", "Pipeline summary".bold());
        println!("  Name: {}", pipeline.name);
        println!("  Steps: {}", pipeline.steps.len());
        for (id, step) in &pipeline.steps {
            let incoming = if step.incoming_connections.is_empty() {
                String::new()
            } else {
                format!(" [after: {}]", step.incoming_connections.join(", "))
            };
            println!("    - {} ({}){}", step.title, id, incoming.dimmed());
        }
    }

    println!();

    if !validation.is_valid() {
        return Err(miette::miette!("Pipeline validation failed"));
    }

    if validation.has_warnings() {
        println!("{}", "Pipeline is valid but has warnings.".yellow().bold());
    } else {
        println!("{}", "Pipeline is valid!".green().bold());
    }

    Ok(())
}
