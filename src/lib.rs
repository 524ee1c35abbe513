// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stepgraph contributors

//! # stepgraph - Pipeline graph core
//!
//! `stepgraph` is the model behind a visual pipeline editor: named steps
//! connected by directed edges, kept acyclic at every mutation, and placed on
//! a zoomable canvas.
//!
//! ## Features
//!
//! - **Step graph** - incoming connections as the source of truth, outgoing as a rebuilt cache
//! - **Cycle guard** - vet a proposed connection without touching the live graph
//! - **Geometry** - map pointer and element offsets into zoom-independent model space
//! - **Load/save** - strip editor-only state on save, hydrate it on load
//!
//! ## Quick Start
//!
//! ```bash
//! # Check a pipeline file
//! stepgraph validate pipeline.json
//!
//! # Would this connection close a cycle?
//! stepgraph check pipeline.json load extract
//!
//! # Render the graph
//! stepgraph graph pipeline.json --format mermaid
//! ```

pub mod cli;
pub mod config;
pub mod editor;
pub mod errors;
pub mod geometry;
pub mod graph;
pub mod persist;
pub mod utils;

// Re-export commonly used types
pub use config::EditorConfig;
pub use editor::{ConnectOutcome, EditorSession};
pub use errors::{StepgraphError, StepgraphResult};
pub use graph::{would_create_cycle, PendingConnection, PipelineGraph, Step};
pub use persist::{PersistedPipeline, Pipeline};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
