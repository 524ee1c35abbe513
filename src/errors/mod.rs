// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stepgraph contributors

//! Error types with actionable messages
//!
//! The graph core itself is total over well-formed input. Errors come from
//! the edges of the system: reading and writing pipeline files, parsing
//! configuration, and the checked mutation helpers used by the CLI and the
//! editor session.

mod recovery;

pub use recovery::RecoverySuggestion;

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for stepgraph operations
pub type StepgraphResult<T> = Result<T, StepgraphError>;

/// Main error type for stepgraph
#[derive(Error, Debug, Diagnostic)]
pub enum StepgraphError {
    // ─────────────────────────────────────────────────────────────────────────
    // Pipeline Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Pipeline file not found: {path}")]
    #[diagnostic(
        code(stepgraph::pipeline_not_found),
        help("Pass the path to a pipeline JSON or YAML file")
    )]
    PipelineNotFound { path: PathBuf },

    #[error("Invalid pipeline: {reason}")]
    #[diagnostic(code(stepgraph::invalid_pipeline))]
    InvalidPipeline {
        reason: String,
        #[help]
        help: Option<String>,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Graph Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Step '{step}' not found in pipeline")]
    #[diagnostic(
        code(stepgraph::step_not_found),
        help("Run 'stepgraph graph <pipeline>' to list the available steps")
    )]
    StepNotFound { step: String },

    #[error("Step '{step}' already exists in pipeline")]
    #[diagnostic(code(stepgraph::duplicate_step))]
    DuplicateStep { step: String },

    #[error("No connection from '{source_step}' to '{target}'")]
    #[diagnostic(code(stepgraph::unknown_connection))]
    UnknownConnection { source_step: String, target: String },

    #[error("Connecting '{source_step}' to '{target}' would create a cycle")]
    #[diagnostic(
        code(stepgraph::circular_dependency),
        help("'{target}' already leads to '{source_step}'; connect in the other direction or remove a connection on that path")
    )]
    CircularDependency {
        source_step: String,
        target: String,
        path: Vec<String>,
    },

    #[error("Step '{step}' cannot be connected to itself")]
    #[diagnostic(code(stepgraph::self_loop))]
    SelfLoop { step: String },

    // ─────────────────────────────────────────────────────────────────────────
    // Editor Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("A connection drag from '{source_step}' is already in progress")]
    #[diagnostic(
        code(stepgraph::connection_in_progress),
        help("Finish or cancel the current connection first")
    )]
    ConnectionInProgress { source_step: String },

    #[error("No connection drag is in progress")]
    #[diagnostic(code(stepgraph::no_connection_in_progress))]
    NoConnectionInProgress,

    #[error("Invalid editor configuration: {reason}")]
    #[diagnostic(code(stepgraph::invalid_config))]
    InvalidConfig { reason: String },

    // ─────────────────────────────────────────────────────────────────────────
    // File Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Failed to read file '{path}': {error}")]
    #[diagnostic(code(stepgraph::file_read_error))]
    FileReadError { path: PathBuf, error: String },

    #[error("Failed to write file '{path}': {error}")]
    #[diagnostic(code(stepgraph::file_write_error))]
    FileWriteError { path: PathBuf, error: String },

    // ─────────────────────────────────────────────────────────────────────────
    // IO/System Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("IO error: {message}")]
    #[diagnostic(code(stepgraph::io_error))]
    Io { message: String },

    #[error("JSON parsing error: {message}")]
    #[diagnostic(code(stepgraph::json_error))]
    Json { message: String },

    #[error("YAML parsing error: {message}")]
    #[diagnostic(code(stepgraph::yaml_error))]
    Yaml { message: String },
}

impl From<std::io::Error> for StepgraphError {
    fn from(e: std::io::Error) -> Self {
        Self::Io { message: e.to_string() }
    }
}

impl From<serde_json::Error> for StepgraphError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json { message: e.to_string() }
    }
}

impl From<serde_yaml::Error> for StepgraphError {
    fn from(e: serde_yaml::Error) -> Self {
        Self::Yaml { message: e.to_string() }
    }
}

impl StepgraphError {
    /// Create an invalid pipeline error from a list of validation failures
    pub fn invalid_pipeline(errors: &[String]) -> Self {
        let reason = match errors {
            [] => "unknown validation failure".to_string(),
            [single] => single.clone(),
            [first, rest @ ..] => format!("{} (and {} more)", first, rest.len()),
        };

        Self::InvalidPipeline {
            reason,
            help: Some("Run 'stepgraph validate <pipeline>' for the full report".into()),
        }
    }

    /// Recovery suggestion for this error, if one applies
    pub fn recovery(&self) -> Option<RecoverySuggestion> {
        match self {
            Self::CircularDependency { path, .. } => {
                Some(RecoverySuggestion::fix_circular_dependency(path))
            }
            Self::StepNotFound { step } => Some(RecoverySuggestion::unknown_step(step)),
            Self::InvalidPipeline { reason, .. } => {
                Some(RecoverySuggestion::invalid_pipeline(reason))
            }
            _ => None,
        }
    }
}
