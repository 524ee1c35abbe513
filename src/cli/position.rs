// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stepgraph contributors

//! Position command - map an element offset into model space

use miette::Result;

use crate::geometry::{local_position, Offset};

/// Run the position command
pub async fn run(container: Offset, element: Offset, scale: f64, verbose: bool) -> Result<()> {
    if scale <= 0.0 {
        return Err(miette::miette!(
            "Zoom factor must be positive, got {}",
            scale
        ));
    }

    if let Some(point) = local_position(Some(element), container, scale) {
        if verbose {
            println!(
                "element ({}, {}) in container ({}, {}) at zoom {}",
                element.top, element.left, container.top, container.left, scale
            );
        }
        println!("x={} y={}", point.x, point.y);
    }

    Ok(())
}
