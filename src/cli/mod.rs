// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stepgraph contributors

//! CLI command definitions and handlers
//!
//! Defines the command-line interface for stepgraph.

pub mod check;
pub mod connect;
pub mod graph;
pub mod normalize;
pub mod position;
pub mod validate;

use clap::{Parser, Subcommand};
use miette::Result;
use std::path::{Path, PathBuf};

use crate::config::EditorConfig;
use crate::errors::StepgraphError;
use crate::geometry::Offset;
use crate::persist::FileFormat;

/// Pipeline graph tool
///
/// Inspect and edit the step graph of a pipeline file.
#[derive(Parser, Debug)]
#[clap(
    name = "stepgraph",
    version,
    about = "Inspect and edit acyclic pipeline step graphs",
    long_about = None,
    after_help = "Examples:\n\
        stepgraph validate pipeline.json            Check the pipeline structure\n\
        stepgraph graph pipeline.json -f mermaid    Render the step graph\n\
        stepgraph check pipeline.json load extract  Would load → extract close a cycle?\n\
        stepgraph connect pipeline.json a b         Add a connection and save\n\n\
        See 'stepgraph <command> --help' for more information on a specific command."
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[clap(short, long, global = true)]
    pub verbose: bool,

    /// Change to directory before executing
    #[clap(short = 'C', long, global = true, value_name = "DIR")]
    pub directory: Option<PathBuf>,

    /// Editor configuration file (default: .stepgraph.yaml)
    #[clap(long, global = true, value_name = "FILE", env = "STEPGRAPH_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate pipeline structure
    Validate {
        /// Pipeline file to validate
        pipeline: PathBuf,
    },

    /// Show pipeline as a graph
    Graph {
        /// Pipeline file
        pipeline: PathBuf,

        /// Output format (text, dot, mermaid)
        #[clap(short, long, default_value = "text")]
        format: GraphFormat,
    },

    /// Check whether a connection would create a cycle
    Check {
        /// Pipeline file
        pipeline: PathBuf,

        /// Source step id
        source: String,

        /// Target step id
        target: String,
    },

    /// Add a connection (rejected if it would create a cycle)
    Connect {
        /// Pipeline file
        pipeline: PathBuf,

        /// Source step id
        source: String,

        /// Target step id
        target: String,

        /// Write here instead of overwriting the pipeline file
        #[clap(short, long)]
        output: Option<PathBuf>,
    },

    /// Remove a connection
    Disconnect {
        /// Pipeline file
        pipeline: PathBuf,

        /// Source step id
        source: String,

        /// Target step id
        target: String,

        /// Write here instead of overwriting the pipeline file
        #[clap(short, long)]
        output: Option<PathBuf>,
    },

    /// Load and re-save a pipeline, dropping editor-only state
    Normalize {
        /// Pipeline file
        pipeline: PathBuf,

        /// Output file (default: stdout)
        #[clap(short, long)]
        output: Option<PathBuf>,

        /// Output format when writing to stdout (json, yaml)
        #[clap(short, long, default_value = "json")]
        format: FileFormat,
    },

    /// Map an element offset into model space
    Position {
        /// Container offset as TOP,LEFT
        #[clap(long, value_parser = parse_offset, allow_hyphen_values = true)]
        container: Offset,

        /// Element offset as TOP,LEFT
        #[clap(long, value_parser = parse_offset, allow_hyphen_values = true)]
        element: Offset,

        /// Zoom factor
        #[clap(long, default_value = "1.0")]
        scale: f64,
    },
}

/// Graph output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphFormat {
    Text,
    Dot,
    Mermaid,
}

impl std::str::FromStr for GraphFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "dot" => Ok(Self::Dot),
            "mermaid" => Ok(Self::Mermaid),
            _ => Err(format!("Unknown graph format: {}", s)),
        }
    }
}

/// Parse `TOP,LEFT`
fn parse_offset(s: &str) -> Result<Offset, String> {
    let (top, left) = s
        .split_once(',')
        .ok_or_else(|| format!("expected TOP,LEFT, got '{}'", s))?;

    let parse = |v: &str| {
        v.trim()
            .parse::<f64>()
            .map_err(|e| format!("invalid number '{}': {}", v.trim(), e))
    };

    Ok(Offset::new(parse(top)?, parse(left)?))
}

/// Load the editor configuration from `--config` or the working directory
pub fn load_config(path: Option<&Path>) -> Result<EditorConfig> {
    let config = match path {
        Some(p) => EditorConfig::load(p)?,
        None => {
            let cwd = std::env::current_dir()
                .map_err(|e| miette::miette!("Failed to get current directory: {}", e))?;
            EditorConfig::load_from_project(&cwd)?
        }
    };
    Ok(config)
}

/// Print the recovery suggestion for an error, then hand it to miette
pub fn report(err: StepgraphError) -> miette::Report {
    if let Some(suggestion) = err.recovery() {
        eprintln!("{}", suggestion);
    }
    err.into()
}
