// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stepgraph contributors

//! Gesture-level editing session
//!
//! Ties the geometry layer, the cycle guard and the graph model together
//! the way a canvas drives them: pointer positions are mapped into model
//! space, a connection is dragged out of a step as a [`PendingConnection`],
//! and only a drop that passes the cycle guard touches the graph.
//!
//! At most one gesture is in flight at a time.

use tracing::{debug, warn};

use crate::config::EditorConfig;
use crate::errors::{StepgraphError, StepgraphResult};
use crate::geometry::{center_of, model_position_from_pointer, Offset, Point, Size};
use crate::graph::{would_create_cycle, PendingConnection, PipelineGraph, Step};
use crate::persist::{self, PersistedPipeline, Pipeline};

/// What happened when a dragged connection was dropped on a step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectOutcome {
    /// The connection was added to the graph
    Committed,
    /// The connection already existed; nothing changed
    Duplicate,
    /// Dropped on its own source step
    SelfLoop,
    /// Committing would have closed a cycle
    WouldCycle,
}

impl ConnectOutcome {
    pub fn is_committed(self) -> bool {
        matches!(self, Self::Committed | Self::Duplicate)
    }
}

/// An open pipeline on the canvas
#[derive(Debug)]
pub struct EditorSession {
    pipeline: Pipeline,
    config: EditorConfig,
    scale_factor: f64,
    pending: Option<PendingConnection>,
}

impl EditorSession {
    pub fn new(pipeline: Pipeline, config: EditorConfig) -> Self {
        let scale_factor = config.clamp_zoom(config.default_zoom);
        Self {
            pipeline,
            config,
            scale_factor,
            pending: None,
        }
    }

    /// Open a persisted pipeline, rejecting structurally invalid documents
    pub fn open(persisted: PersistedPipeline, config: EditorConfig) -> StepgraphResult<Self> {
        let pipeline = persist::load_checked(persisted, &config.transient_prefix)?;
        Ok(Self::new(pipeline, config))
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub fn graph(&self) -> &PipelineGraph {
        &self.pipeline.graph
    }

    pub fn graph_mut(&mut self) -> &mut PipelineGraph {
        &mut self.pipeline.graph
    }

    pub fn scale_factor(&self) -> f64 {
        self.scale_factor
    }

    pub fn pending_connection(&self) -> Option<&PendingConnection> {
        self.pending.as_ref()
    }

    /// Change the zoom, clamped to the configured range.
    ///
    /// Returns the zoom actually applied.
    pub fn set_zoom(&mut self, scale_factor: f64) -> StepgraphResult<f64> {
        if !scale_factor.is_finite() {
            return Err(StepgraphError::InvalidConfig {
                reason: format!("zoom factor must be finite, got {}", scale_factor),
            });
        }

        self.scale_factor = self.config.clamp_zoom(scale_factor);
        debug!(scale = self.scale_factor, "zoom changed");
        Ok(self.scale_factor)
    }

    /// Model-space position of a pointer event
    pub fn pointer_position(&self, pointer: Point, container: Offset) -> Point {
        model_position_from_pointer(pointer, container, self.scale_factor)
    }

    /// Add a new step at the pointer's model-space position
    pub fn place_step(&mut self, step: Step, pointer: Point, container: Offset) -> StepgraphResult<Point> {
        let position = self.pointer_position(pointer, container);
        self.pipeline.graph.add_step(step.with_position(position))?;
        Ok(position)
    }

    /// Move a step by a pixel delta measured at the current zoom
    pub fn drag_step(&mut self, id: &str, dx_px: f64, dy_px: f64) -> StepgraphResult<Point> {
        self.pipeline.graph.drag_step(id, dx_px, dy_px, self.scale_factor)
    }

    /// Start dragging a connection out of `source`.
    ///
    /// `element` is the rendered step's offset, if it is on screen; the
    /// connection is anchored at its centre.
    pub fn begin_connection(
        &mut self,
        source: &str,
        element: Option<Offset>,
        size: Size,
        container: Offset,
    ) -> StepgraphResult<&PendingConnection> {
        if let Some(pending) = &self.pending {
            return Err(StepgraphError::ConnectionInProgress {
                source_step: pending.source.clone(),
            });
        }

        if !self.pipeline.graph.contains(source) {
            return Err(StepgraphError::StepNotFound { step: source.to_string() });
        }

        let mut pending = PendingConnection::instantiate(source);
        if let Some(start) = center_of(element, size, container, self.scale_factor) {
            pending.set_start(start);
        }

        debug!(source, "connection drag started");
        Ok(&*self.pending.insert(pending))
    }

    /// Follow the pointer with the free end of the dragged connection
    pub fn drag_connection(&mut self, pointer: Point, container: Offset) -> StepgraphResult<Point> {
        let end = self.pointer_position(pointer, container);
        let pending = self
            .pending
            .as_mut()
            .ok_or(StepgraphError::NoConnectionInProgress)?;

        pending.set_endpoint(end);
        Ok(end)
    }

    /// Drop the dragged connection on `target`.
    ///
    /// The pending descriptor is cleared whatever the outcome.
    pub fn finish_connection(&mut self, target: &str) -> StepgraphResult<ConnectOutcome> {
        let mut pending = self.pending.take().ok_or(StepgraphError::NoConnectionInProgress)?;
        pending.set_target(Some(target.to_string()));

        let graph = &mut self.pipeline.graph;
        let source = pending.source.as_str();

        // The source may have been removed while the drag was in flight.
        for id in [source, target] {
            if !graph.contains(id) {
                return Err(StepgraphError::StepNotFound { step: id.to_string() });
            }
        }

        if source == target {
            warn!(step = target, "rejected self-connection");
            return Ok(ConnectOutcome::SelfLoop);
        }

        if graph.has_connection(source, target) {
            return Ok(ConnectOutcome::Duplicate);
        }

        if would_create_cycle(graph, source, target) {
            warn!(source, target, "rejected connection that would create a cycle");
            return Ok(ConnectOutcome::WouldCycle);
        }

        graph.add_connection(source, target);
        debug!(source, target, "connection committed");
        Ok(ConnectOutcome::Committed)
    }

    /// Abandon the dragged connection without touching the graph
    pub fn cancel_connection(&mut self) -> Option<PendingConnection> {
        let pending = self.pending.take();
        if let Some(p) = &pending {
            debug!(source = %p.source, "connection drag cancelled");
        }
        pending
    }

    /// Persisted form of the current pipeline
    pub fn save(&self) -> PersistedPipeline {
        persist::save_with_prefix(&self.pipeline, &self.config.transient_prefix)
    }

    pub fn into_pipeline(self) -> Pipeline {
        self.pipeline
    }
}
