// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stepgraph contributors

//! stepgraph - Pipeline graph tool
//!
//! Inspect and edit the step graph of a pipeline file.

use clap::Parser;
use miette::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stepgraph::cli::{load_config, Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let default_filter = if cli.verbose { "stepgraph=debug" } else { "stepgraph=info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    if !stepgraph::utils::should_use_colors() {
        colored::control::set_override(false);
    }

    // Change to specified directory if provided
    if let Some(ref dir) = cli.directory {
        std::env::set_current_dir(dir).map_err(|e| {
            miette::miette!("Failed to change to directory '{}': {}", dir.display(), e)
        })?;
    }

    let config = load_config(cli.config.as_deref())?;

    // Dispatch to command handlers
    match cli.command {
        Commands::Validate { pipeline } => {
            stepgraph::cli::validate::run(pipeline, &config, cli.verbose).await
        }
        Commands::Graph { pipeline, format } => {
            stepgraph::cli::graph::run(pipeline, format, &config, cli.verbose).await
        }
        Commands::Check {
            pipeline,
            source,
            target,
        } => stepgraph::cli::check::run(pipeline, source, target, &config, cli.verbose).await,
        Commands::Connect {
            pipeline,
            source,
            target,
            output,
        } => {
            stepgraph::cli::connect::connect(pipeline, source, target, output, &config, cli.verbose)
                .await
        }
        Commands::Disconnect {
            pipeline,
            source,
            target,
            output,
        } => {
            stepgraph::cli::connect::disconnect(pipeline, source, target, output, &config, cli.verbose)
                .await
        }
        Commands::Normalize {
            pipeline,
            output,
            format,
        } => stepgraph::cli::normalize::run(pipeline, output, format, &config, cli.verbose).await,
        Commands::Position {
            container,
            element,
            scale,
        } => stepgraph::cli::position::run(container, element, scale, cli.verbose).await,
    }
}
