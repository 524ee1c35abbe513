// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stepgraph contributors

//! Coordinate transforms between the rendered canvas and model space
//!
//! The canvas is drawn under a zoom factor. Pointer events and element
//! offsets arrive in screen pixels; step positions and connection endpoints
//! are stored in model space, which is independent of the zoom. Every
//! function here is pure.
//!
//! Element offsets are `Option`s because the rendered element may not exist
//! (yet) when a gesture fires. In that case the transform yields `None`.
//! Degenerate scale factors (zero or negative) are not rejected here; they
//! produce infinities or mirrored values and must be prevented upstream.

use serde::{Deserialize, Serialize};

/// Page offset of a rendered element, in screen pixels
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Offset {
    pub top: f64,
    pub left: f64,
}

impl Offset {
    pub fn new(top: f64, left: f64) -> Self {
        Self { top, left }
    }
}

/// A point, either in screen pixels or in model space depending on context
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Component-wise sum
    pub fn offset_by(self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

/// Rendered size of an element
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Convert a raw pixel delta into a model-space delta.
///
/// Only meaningful for offsets and deltas, never for absolute page
/// coordinates on their own.
pub fn scale_corrected(value: f64, scale_factor: f64) -> f64 {
    value / scale_factor
}

/// Model-space position of an element relative to its container.
///
/// The container's top/left is subtracted from the element's, then each
/// axis is scale-corrected independently.
pub fn local_position(element: Option<Offset>, container: Offset, scale_factor: f64) -> Option<Point> {
    let element = element?;

    Some(Point::new(
        scale_corrected(element.left - container.left, scale_factor),
        scale_corrected(element.top - container.top, scale_factor),
    ))
}

/// Visual center of a rendered step, used to anchor connection endpoints.
///
/// `size` is the element's rendered size as reported by the caller and is
/// added as-is; its relation to the zoom is the caller's concern.
pub fn center_of(
    element: Option<Offset>,
    size: Size,
    container: Offset,
    scale_factor: f64,
) -> Option<Point> {
    local_position(element, container, scale_factor)
        .map(|corner| corner.offset_by(size.width / 2.0, size.height / 2.0))
}

/// Pointer position in model space.
///
/// Pointer and container are scale-corrected independently and then
/// subtracted. Used to place new steps and to track the free end of a
/// connection while it is being dragged.
pub fn model_position_from_pointer(pointer: Point, container: Offset, scale_factor: f64) -> Point {
    Point::new(
        scale_corrected(pointer.x, scale_factor) - scale_corrected(container.left, scale_factor),
        scale_corrected(pointer.y, scale_factor) - scale_corrected(container.top, scale_factor),
    )
}
