// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stepgraph contributors

//! Pipeline graph core
//!
//! The step/connection model, the cycle guard that vets proposed
//! connections, a petgraph view for ordering and export, and validation of
//! externally supplied pipelines.

mod cycle;
mod dag;
mod model;
mod validation;

pub use cycle::{find_path, would_create_cycle};
pub use dag::DagView;
pub use model::*;
pub use validation::{PipelineValidator, ValidationResult};
