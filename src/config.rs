// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stepgraph contributors

//! Editor configuration
//!
//! Loaded from `.stepgraph.yaml` in the project directory. A missing file
//! yields the defaults.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::errors::{StepgraphError, StepgraphResult};
use crate::graph::TRANSIENT_PREFIX;

/// Default configuration file name
pub const CONFIG_FILE: &str = ".stepgraph.yaml";

/// Editor configuration from .stepgraph.yaml
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorConfig {
    /// Marker that starts every editor-only metadata key
    #[serde(default = "default_transient_prefix")]
    pub transient_prefix: String,

    /// Smallest allowed zoom factor
    #[serde(default = "default_min_zoom")]
    pub min_zoom: f64,

    /// Largest allowed zoom factor
    #[serde(default = "default_max_zoom")]
    pub max_zoom: f64,

    /// Zoom factor of a freshly opened canvas
    #[serde(default = "default_zoom")]
    pub default_zoom: f64,

    /// Pretty-print JSON output
    #[serde(default = "default_true")]
    pub pretty: bool,
}

fn default_transient_prefix() -> String {
    TRANSIENT_PREFIX.to_string()
}

fn default_min_zoom() -> f64 {
    0.25
}

fn default_max_zoom() -> f64 {
    4.0
}

fn default_zoom() -> f64 {
    1.0
}

fn default_true() -> bool {
    true
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            transient_prefix: default_transient_prefix(),
            min_zoom: default_min_zoom(),
            max_zoom: default_max_zoom(),
            default_zoom: default_zoom(),
            pretty: true,
        }
    }
}

impl EditorConfig {
    /// Load from file; a missing file gives the defaults
    pub fn load(path: &Path) -> StepgraphResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| StepgraphError::FileReadError {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let config: Self = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from project directory (looks for .stepgraph.yaml)
    pub fn load_from_project(project_root: &Path) -> StepgraphResult<Self> {
        Self::load(&project_root.join(CONFIG_FILE))
    }

    /// Check that the zoom range is usable and the marker non-empty
    pub fn validate(&self) -> StepgraphResult<()> {
        let invalid = |reason: String| Err(StepgraphError::InvalidConfig { reason });

        if self.transient_prefix.is_empty() {
            return invalid("transient_prefix must not be empty".into());
        }

        if !(self.min_zoom > 0.0 && self.min_zoom.is_finite()) {
            return invalid(format!("min_zoom must be positive, got {}", self.min_zoom));
        }

        if !(self.min_zoom <= self.default_zoom && self.default_zoom <= self.max_zoom) {
            return invalid(format!(
                "default_zoom {} must lie within [{}, {}]",
                self.default_zoom, self.min_zoom, self.max_zoom
            ));
        }

        Ok(())
    }

    /// Clamp a requested zoom factor into the configured range
    pub fn clamp_zoom(&self, scale_factor: f64) -> f64 {
        scale_factor.clamp(self.min_zoom, self.max_zoom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_default() {
        let temp = TempDir::new().unwrap();
        let config = EditorConfig::load_from_project(temp.path()).unwrap();

        assert_eq!(config, EditorConfig::default());
        assert_eq!(config.transient_prefix, "_");
    }

    #[test]
    fn test_load_partial_config() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join(CONFIG_FILE),
            "max_zoom: 8.0\npretty: false\n",
        )
        .unwrap();

        let config = EditorConfig::load_from_project(temp.path()).unwrap();
        assert_eq!(config.max_zoom, 8.0);
        assert_eq!(config.min_zoom, 0.25);
        assert!(!config.pretty);
    }

    #[test]
    fn test_rejects_non_positive_zoom() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join(CONFIG_FILE), "min_zoom: 0\n").unwrap();

        let result = EditorConfig::load_from_project(temp.path());
        assert!(matches!(result, Err(StepgraphError::InvalidConfig { .. })));
    }

    #[test]
    fn test_rejects_default_outside_range() {
        let config = EditorConfig {
            default_zoom: 10.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_clamp_zoom() {
        let config = EditorConfig::default();
        assert_eq!(config.clamp_zoom(0.01), 0.25);
        assert_eq!(config.clamp_zoom(2.0), 2.0);
        assert_eq!(config.clamp_zoom(100.0), 4.0);
    }
}
