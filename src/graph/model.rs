// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stepgraph contributors

//! Step graph data model
//!
//! Connections are stored once, as membership of a source id in the target
//! step's `incoming_connections`. Each step also carries an
//! `outgoing_connections` set, which is a reverse index rebuilt from the
//! incoming lists by [`PipelineGraph::add_outgoing_connections_cache`].
//!
//! The model does not enforce acyclicity on write. Use
//! [`PipelineGraph::connect`] for a checked commit, or ask
//! [`would_create_cycle`](super::would_create_cycle) before calling
//! [`PipelineGraph::add_connection`].

use serde_json::{Map, Value};
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

use crate::errors::{StepgraphError, StepgraphResult};
use crate::geometry::{scale_corrected, Point};

/// Arbitrary per-step key/value data
pub type Metadata = Map<String, Value>;

/// Leading marker of editor-only metadata keys
pub const TRANSIENT_PREFIX: &str = "_";

/// Number of drag gestures applied to a step since it was loaded
pub const DRAG_COUNT_KEY: &str = "_drag_count";

/// Whether the step has been dragged since it was loaded
pub const DRAGGED_KEY: &str = "_dragged";

/// Whether a metadata key denotes editor-only state.
///
/// The built-in drag keys are editor-only under any prefix.
pub fn is_transient_key(key: &str, prefix: &str) -> bool {
    key.starts_with(prefix) || key == DRAG_COUNT_KEY || key == DRAGGED_KEY
}

/// A node in the pipeline graph
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    /// Unique, stable identifier
    pub id: String,

    /// Human readable title
    pub title: String,

    /// Ids of the steps pointing into this one, in insertion order
    pub incoming_connections: Vec<String>,

    /// Derived: ids of the steps this one points to
    pub(crate) outgoing_connections: BTreeSet<String>,

    /// Editor and domain data. Keys starting with [`TRANSIENT_PREFIX`] are never persisted.
    pub metadata: Metadata,

    /// Model-space position, independent of zoom
    pub position: Point,

    /// Remaining persisted fields, carried through untouched
    pub properties: Map<String, Value>,
}

impl Step {
    /// Create a step with no connections and fresh transient metadata
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        let mut step = Self {
            id: id.into(),
            title: title.into(),
            incoming_connections: Vec::new(),
            outgoing_connections: BTreeSet::new(),
            metadata: Map::new(),
            position: Point::default(),
            properties: Map::new(),
        };
        step.reset_transient();
        step
    }

    pub fn with_position(mut self, position: Point) -> Self {
        self.position = position;
        self
    }

    pub fn with_incoming<I, S>(mut self, sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.incoming_connections = sources.into_iter().map(Into::into).collect();
        self
    }

    /// Steps this one points to. Only valid after the cache was rebuilt.
    pub fn outgoing_connections(&self) -> &BTreeSet<String> {
        &self.outgoing_connections
    }

    /// Reset drag tracking to its initial state
    pub fn reset_transient(&mut self) {
        self.metadata.insert(DRAG_COUNT_KEY.into(), Value::from(0u64));
        self.metadata.insert(DRAGGED_KEY.into(), Value::Bool(false));
    }

    /// Number of drag gestures recorded in transient metadata
    pub fn drag_count(&self) -> u64 {
        self.metadata
            .get(DRAG_COUNT_KEY)
            .and_then(Value::as_u64)
            .unwrap_or(0)
    }

    /// Remove every metadata key matching the transient marker
    pub fn strip_transient(&mut self, prefix: &str) {
        self.metadata.retain(|key, _| !is_transient_key(key, prefix));
    }
}

/// An edge being dragged out of a step, not yet part of the graph.
///
/// Dropping it on a target and committing goes through the graph; dropping
/// it anywhere else just discards the descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingConnection {
    pub source: String,
    pub start: Option<Point>,
    pub end: Option<Point>,
    pub target: Option<String>,
}

impl PendingConnection {
    /// Start a connection from `source` with no endpoints or target yet
    pub fn instantiate(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            start: None,
            end: None,
            target: None,
        }
    }

    pub fn set_start(&mut self, point: Point) {
        self.start = Some(point);
    }

    /// Move the free end of the connection
    pub fn set_endpoint(&mut self, point: Point) {
        self.end = Some(point);
    }

    pub fn set_target(&mut self, target: Option<String>) {
        self.target = target;
    }
}

/// Mapping from step id to step, in insertion order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineGraph {
    steps: HashMap<String, Step>,
    order: Vec<String>,
}

impl PipelineGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from steps and rebuild the outgoing cache.
    ///
    /// Later steps with an id already present are ignored.
    pub fn from_steps(steps: impl IntoIterator<Item = Step>) -> Self {
        let mut graph = Self::new();
        for step in steps {
            if !graph.steps.contains_key(&step.id) {
                graph.order.push(step.id.clone());
                graph.steps.insert(step.id.clone(), step);
            }
        }
        graph.add_outgoing_connections_cache();
        graph
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.steps.contains_key(id)
    }

    pub fn step(&self, id: &str) -> Option<&Step> {
        self.steps.get(id)
    }

    /// Mutable access to a step.
    ///
    /// Call [`add_outgoing_connections_cache`](Self::add_outgoing_connections_cache)
    /// after editing `incoming_connections` through this.
    pub fn step_mut(&mut self, id: &str) -> Option<&mut Step> {
        self.steps.get_mut(id)
    }

    /// Step ids in insertion order
    pub fn step_ids(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Steps in insertion order
    pub fn steps(&self) -> impl Iterator<Item = &Step> {
        self.order.iter().filter_map(|id| self.steps.get(id))
    }

    /// All committed connections as `(source, target)` pairs
    pub fn connections(&self) -> impl Iterator<Item = (&str, &str)> {
        self.steps().flat_map(|step| {
            step.incoming_connections
                .iter()
                .map(move |source| (source.as_str(), step.id.as_str()))
        })
    }

    pub fn has_connection(&self, source: &str, target: &str) -> bool {
        self.steps
            .get(target)
            .is_some_and(|step| step.incoming_connections.iter().any(|s| s == source))
    }

    /// Rebuild every step's outgoing set from all incoming lists.
    ///
    /// References to ids that are not in the graph are skipped.
    pub fn add_outgoing_connections_cache(&mut self) {
        for step in self.steps.values_mut() {
            step.outgoing_connections.clear();
        }

        let edges: Vec<(String, String)> = self
            .connections()
            .map(|(source, target)| (source.to_string(), target.to_string()))
            .collect();

        for (source, target) in edges {
            if let Some(step) = self.steps.get_mut(&source) {
                step.outgoing_connections.insert(target);
            }
        }
    }

    /// Add a step, giving it fresh transient metadata
    pub fn add_step(&mut self, mut step: Step) -> StepgraphResult<()> {
        if self.steps.contains_key(&step.id) {
            return Err(StepgraphError::DuplicateStep { step: step.id });
        }

        debug!(step = %step.id, "adding step");
        step.reset_transient();
        self.order.push(step.id.clone());
        self.steps.insert(step.id.clone(), step);
        self.add_outgoing_connections_cache();
        Ok(())
    }

    /// Remove a step together with every connection that references it
    pub fn remove_step(&mut self, id: &str) -> StepgraphResult<Step> {
        let removed = self
            .steps
            .remove(id)
            .ok_or_else(|| StepgraphError::StepNotFound { step: id.to_string() })?;

        debug!(step = %id, "removing step");
        self.order.retain(|s| s != id);
        for step in self.steps.values_mut() {
            step.incoming_connections.retain(|s| s != id);
        }
        self.add_outgoing_connections_cache();
        Ok(removed)
    }

    /// Commit `source → target` without any acyclicity check.
    ///
    /// Idempotent: returns `false` if the connection already existed or the
    /// target is not in the graph.
    pub fn add_connection(&mut self, source: &str, target: &str) -> bool {
        let Some(step) = self.steps.get_mut(target) else {
            return false;
        };

        if step.incoming_connections.iter().any(|s| s == source) {
            return false;
        }

        debug!(source, target, "adding connection");
        step.incoming_connections.push(source.to_string());
        self.add_outgoing_connections_cache();
        true
    }

    /// Remove `source → target`. Returns whether it existed.
    pub fn remove_connection(&mut self, source: &str, target: &str) -> bool {
        let Some(step) = self.steps.get_mut(target) else {
            return false;
        };

        let before = step.incoming_connections.len();
        step.incoming_connections.retain(|s| s != source);
        if step.incoming_connections.len() == before {
            return false;
        }

        debug!(source, target, "removing connection");
        self.add_outgoing_connections_cache();
        true
    }

    /// Checked commit of `source → target`.
    ///
    /// Returns `Ok(false)` when the connection already exists.
    pub fn connect(&mut self, source: &str, target: &str) -> StepgraphResult<bool> {
        for id in [source, target] {
            if !self.contains(id) {
                return Err(StepgraphError::StepNotFound { step: id.to_string() });
            }
        }

        if source == target {
            return Err(StepgraphError::SelfLoop { step: source.to_string() });
        }

        if super::would_create_cycle(self, source, target) {
            let path = super::find_path(self, target, source).unwrap_or_default();
            return Err(StepgraphError::CircularDependency {
                source_step: source.to_string(),
                target: target.to_string(),
                path,
            });
        }

        Ok(self.add_connection(source, target))
    }

    /// Checked removal of `source → target`
    pub fn disconnect(&mut self, source: &str, target: &str) -> StepgraphResult<()> {
        if !self.contains(target) {
            return Err(StepgraphError::StepNotFound { step: target.to_string() });
        }

        if !self.remove_connection(source, target) {
            return Err(StepgraphError::UnknownConnection {
                source_step: source.to_string(),
                target: target.to_string(),
            });
        }

        Ok(())
    }

    /// Set a step's model-space position
    pub fn move_step(&mut self, id: &str, position: Point) -> StepgraphResult<()> {
        let step = self.require_mut(id)?;
        step.position = position;
        Ok(())
    }

    /// Apply a pixel delta measured under `scale_factor` and record the drag.
    ///
    /// Returns the new model-space position.
    pub fn drag_step(
        &mut self,
        id: &str,
        dx_px: f64,
        dy_px: f64,
        scale_factor: f64,
    ) -> StepgraphResult<Point> {
        let step = self.require_mut(id)?;
        step.position = step.position.offset_by(
            scale_corrected(dx_px, scale_factor),
            scale_corrected(dy_px, scale_factor),
        );

        let count = step.drag_count() + 1;
        step.metadata.insert(DRAG_COUNT_KEY.into(), Value::from(count));
        step.metadata.insert(DRAGGED_KEY.into(), Value::Bool(true));
        Ok(step.position)
    }

    /// Set a metadata value, returning the previous one
    pub fn set_metadata(
        &mut self,
        id: &str,
        key: impl Into<String>,
        value: Value,
    ) -> StepgraphResult<Option<Value>> {
        Ok(self.require_mut(id)?.metadata.insert(key.into(), value))
    }

    pub fn remove_metadata(&mut self, id: &str, key: &str) -> StepgraphResult<Option<Value>> {
        Ok(self.require_mut(id)?.metadata.remove(key))
    }

    fn require_mut(&mut self, id: &str) -> StepgraphResult<&mut Step> {
        self.steps
            .get_mut(id)
            .ok_or_else(|| StepgraphError::StepNotFound { step: id.to_string() })
    }
}
