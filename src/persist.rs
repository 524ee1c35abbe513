// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stepgraph contributors

//! Persisted pipeline format and the load/save adapter
//!
//! On disk a pipeline is a JSON (or YAML) document with a `steps` mapping
//! keyed by step id. Each step record carries its incoming connections and
//! a `meta_data` block with the canvas position. Outgoing connections and
//! editor-only metadata are never stored.
//!
//! [`load`] turns the persisted form into a working [`Pipeline`] with fresh
//! transient state and a rebuilt outgoing cache. [`save`] snapshots the
//! working pipeline and strips everything editor-only from the snapshot.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

use crate::errors::{StepgraphError, StepgraphResult};
use crate::geometry::Point;
use crate::graph::{PipelineGraph, PipelineValidator, Step, TRANSIENT_PREFIX};

/// Derived field some producers write; always rebuilt instead of read
const OUTGOING_FIELD: &str = "outgoing_connections";

/// Pipeline document as stored on disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedPipeline {
    /// Pipeline name
    #[serde(default)]
    pub name: String,

    /// Pipeline identifier
    #[serde(default)]
    pub uuid: String,

    /// Format version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Steps keyed by id, emitted in id order
    #[serde(default)]
    pub steps: BTreeMap<String, PersistedStep>,

    /// Other pipeline-level fields (parameters, settings, ...)
    #[serde(flatten)]
    pub properties: Map<String, Value>,
}

/// Step record as stored on disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedStep {
    /// Step id; expected to match the key in `steps`
    pub uuid: String,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub incoming_connections: Vec<String>,

    #[serde(default)]
    pub meta_data: PersistedMetadata,

    /// Other step fields (file_path, parameters, ...)
    #[serde(flatten)]
    pub properties: Map<String, Value>,
}

/// Step metadata block
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedMetadata {
    /// Model-space `[x, y]`
    #[serde(default)]
    pub position: [f64; 2],

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Working pipeline: document-level fields plus the live step graph
#[derive(Debug, Clone, PartialEq)]
pub struct Pipeline {
    pub name: String,
    pub uuid: String,
    pub version: Option<String>,
    pub properties: Map<String, Value>,
    pub graph: PipelineGraph,
}

/// Serialization format of a pipeline file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Json,
    Yaml,
}

impl FileFormat {
    /// Pick the format from a file extension; anything but `.yaml`/`.yml` is JSON
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                Self::Yaml
            }
            _ => Self::Json,
        }
    }
}

impl std::str::FromStr for FileFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            _ => Err(format!("Unknown pipeline format: {}", s)),
        }
    }
}

impl PersistedPipeline {
    pub fn from_json(json: &str) -> StepgraphResult<Self> {
        serde_json::from_str(json).map_err(Into::into)
    }

    pub fn from_yaml(yaml: &str) -> StepgraphResult<Self> {
        serde_yaml::from_str(yaml).map_err(Into::into)
    }

    pub fn to_json(&self, pretty: bool) -> StepgraphResult<String> {
        let json = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        Ok(json)
    }

    pub fn to_yaml(&self) -> StepgraphResult<String> {
        serde_yaml::to_string(self).map_err(Into::into)
    }

    /// Render in the given format
    pub fn render(&self, format: FileFormat, pretty: bool) -> StepgraphResult<String> {
        match format {
            FileFormat::Json => self.to_json(pretty),
            FileFormat::Yaml => self.to_yaml(),
        }
    }

    /// Load a pipeline file, choosing the parser from the extension
    pub fn from_file(path: &Path) -> StepgraphResult<Self> {
        if !path.exists() {
            return Err(StepgraphError::PipelineNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| StepgraphError::FileReadError {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        match FileFormat::from_path(path) {
            FileFormat::Json => Self::from_json(&content),
            FileFormat::Yaml => Self::from_yaml(&content),
        }
    }

    /// Write a pipeline file, choosing the format from the extension
    pub fn to_file(&self, path: &Path, pretty: bool) -> StepgraphResult<()> {
        let mut content = self.render(FileFormat::from_path(path), pretty)?;
        if !content.ends_with('\n') {
            content.push('\n');
        }

        std::fs::write(path, content).map_err(|e| StepgraphError::FileWriteError {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        info!(path = %path.display(), "saved pipeline");
        Ok(())
    }
}

/// Hydrate a persisted pipeline into a working pipeline.
///
/// Every step is copied field by field and receives fresh transient
/// metadata; the outgoing cache is rebuilt once all steps are in place.
/// No validation happens here, see [`load_checked`].
pub fn load(persisted: PersistedPipeline) -> Pipeline {
    let steps = persisted.steps.into_iter().map(|(id, record)| {
        let mut step = Step::new(id, record.title);
        step.incoming_connections = record.incoming_connections;
        step.position = Point::new(record.meta_data.position[0], record.meta_data.position[1]);
        step.properties = record.properties;
        step.properties.remove(OUTGOING_FIELD);
        step.metadata = record.meta_data.extra;
        step.reset_transient();
        step
    });

    let graph = PipelineGraph::from_steps(steps);
    debug!(steps = graph.len(), "loaded pipeline");

    Pipeline {
        name: persisted.name,
        uuid: persisted.uuid,
        version: persisted.version,
        properties: persisted.properties,
        graph,
    }
}

/// Validate a persisted pipeline, then [`load`] it.
///
/// Rejects documents whose structure breaks the graph invariants (dangling
/// references, self-loops, cycles); warnings are logged and ignored.
pub fn load_checked(persisted: PersistedPipeline, transient_prefix: &str) -> StepgraphResult<Pipeline> {
    let report = PipelineValidator::validate(&persisted, transient_prefix);

    for warning in &report.warnings {
        tracing::warn!("{}", warning);
    }

    if !report.is_valid() {
        return Err(StepgraphError::invalid_pipeline(&report.errors));
    }

    Ok(load(persisted))
}

/// Persist a working pipeline using the default transient marker
pub fn save(pipeline: &Pipeline) -> PersistedPipeline {
    save_with_prefix(pipeline, TRANSIENT_PREFIX)
}

/// Persist a working pipeline.
///
/// Works on a snapshot: the live pipeline keeps its transient metadata and
/// outgoing cache.
pub fn save_with_prefix(pipeline: &Pipeline, transient_prefix: &str) -> PersistedPipeline {
    let snapshot = pipeline.clone();

    let steps = snapshot
        .graph
        .steps()
        .cloned()
        .map(|mut step| {
            step.strip_transient(transient_prefix);
            let record = PersistedStep {
                uuid: step.id.clone(),
                title: step.title,
                incoming_connections: step.incoming_connections,
                meta_data: PersistedMetadata {
                    position: [step.position.x, step.position.y],
                    extra: step.metadata,
                },
                properties: step.properties,
            };
            (step.id, record)
        })
        .collect();

    PersistedPipeline {
        name: snapshot.name,
        uuid: snapshot.uuid,
        version: snapshot.version,
        steps,
        properties: snapshot.properties,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{DRAGGED_KEY, DRAG_COUNT_KEY};
    use proptest::prelude::*;
    use tempfile::TempDir;

    const PIPELINE_JSON: &str = r#"{
        "name": "etl",
        "uuid": "p-1",
        "version": "1.0.0",
        "parameters": {"threshold": 3},
        "settings": {"auto_eviction": false},
        "steps": {
            "extract": {
                "uuid": "extract",
                "title": "Extract",
                "incoming_connections": [],
                "file_path": "extract.ipynb",
                "meta_data": {"position": [10.0, 20.0], "hidden": false}
            },
            "transform": {
                "uuid": "transform",
                "title": "Transform",
                "incoming_connections": ["extract"],
                "meta_data": {"position": [200.0, 20.0], "hidden": false}
            },
            "load": {
                "uuid": "load",
                "title": "Load",
                "incoming_connections": ["transform"],
                "meta_data": {"position": [400.0, 20.0], "hidden": true}
            }
        }
    }"#;

    fn fixture() -> Pipeline {
        load(PersistedPipeline::from_json(PIPELINE_JSON).unwrap())
    }

    #[test]
    fn test_load_hydrates_transient_state() {
        let pipeline = fixture();
        let step = pipeline.graph.step("transform").unwrap();

        assert_eq!(step.title, "Transform");
        assert_eq!(step.position, Point::new(200.0, 20.0));
        assert_eq!(step.metadata[DRAG_COUNT_KEY], Value::from(0u64));
        assert_eq!(step.metadata[DRAGGED_KEY], Value::Bool(false));
        assert_eq!(step.metadata["hidden"], Value::Bool(false));
    }

    #[test]
    fn test_load_builds_outgoing_cache() {
        let pipeline = fixture();
        let extract = pipeline.graph.step("extract").unwrap();

        assert!(extract.outgoing_connections().contains("transform"));
        assert_eq!(extract.properties["file_path"], Value::from("extract.ipynb"));
        assert_eq!(pipeline.properties["parameters"]["threshold"], Value::from(3));
    }

    #[test]
    fn test_save_strips_transient_keys() {
        let mut pipeline = fixture();
        pipeline.graph.drag_step("load", 5.0, 5.0, 1.0).unwrap();
        pipeline
            .graph
            .set_metadata("load", "_hover", Value::Bool(true))
            .unwrap();

        let persisted = save(&pipeline);
        let meta = &persisted.steps["load"].meta_data;

        assert!(meta.extra.keys().all(|k| !k.starts_with('_')));
        assert_eq!(meta.position, [405.0, 25.0]);
        assert_eq!(meta.extra["hidden"], Value::Bool(true));
    }

    #[test]
    fn test_save_does_not_mutate_live_pipeline() {
        let mut pipeline = fixture();
        pipeline.graph.drag_step("load", 1.0, 1.0, 1.0).unwrap();
        let before = pipeline.clone();

        let _ = save(&pipeline);

        assert_eq!(pipeline, before);
        assert_eq!(pipeline.graph.step("load").unwrap().drag_count(), 1);
    }

    #[test]
    fn test_save_never_writes_outgoing() {
        let json = save(&fixture()).to_json(false).unwrap();

        assert!(!json.contains("outgoing"));
        assert!(!json.contains("_drag"));
    }

    #[test]
    fn test_persisted_outgoing_field_ignored() {
        let json = r#"{
            "name": "x", "uuid": "x",
            "steps": {
                "a": {"uuid": "a", "outgoing_connections": ["b"]},
                "b": {"uuid": "b"}
            }
        }"#;

        let pipeline = load(PersistedPipeline::from_json(json).unwrap());
        assert!(pipeline.graph.step("a").unwrap().outgoing_connections().is_empty());
        assert_eq!(pipeline.graph.step("a").unwrap().position, Point::new(0.0, 0.0));
        assert!(!save(&pipeline).to_json(false).unwrap().contains("outgoing"));
    }

    #[test]
    fn test_load_checked_rejects_cycle() {
        let json = r#"{
            "name": "x", "uuid": "x",
            "steps": {
                "a": {"uuid": "a", "incoming_connections": ["b"]},
                "b": {"uuid": "b", "incoming_connections": ["a"]}
            }
        }"#;

        let result = load_checked(PersistedPipeline::from_json(json).unwrap(), TRANSIENT_PREFIX);
        assert!(matches!(result, Err(StepgraphError::InvalidPipeline { .. })));
    }

    #[test]
    fn test_yaml_file_round_trip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("pipeline.yaml");
        let persisted = save(&fixture());

        persisted.to_file(&path, true).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("incoming_connections"));

        let reloaded = PersistedPipeline::from_file(&path).unwrap();
        assert_eq!(reloaded, persisted);
    }

    #[test]
    fn test_missing_file() {
        let temp = TempDir::new().unwrap();
        let result = PersistedPipeline::from_file(&temp.path().join("nope.json"));
        assert!(matches!(result, Err(StepgraphError::PipelineNotFound { .. })));
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(FileFormat::from_path(Path::new("a.yml")), FileFormat::Yaml);
        assert_eq!(FileFormat::from_path(Path::new("a.YAML")), FileFormat::Yaml);
        assert_eq!(FileFormat::from_path(Path::new("a.orchest")), FileFormat::Json);
    }

    proptest! {
        #[test]
        fn test_round_trip_preserves_connections(
            n in 1usize..10,
            edges in prop::collection::vec((0usize..10, 0usize..10), 0..25)
        ) {
            let mut graph = PipelineGraph::from_steps((0..n).map(|i| Step::new(format!("s{}", i), "")));
            for (a, b) in edges {
                let (a, b) = (a % n, b % n);
                if a < b {
                    graph.add_connection(&format!("s{}", a), &format!("s{}", b));
                }
            }
            let pipeline = Pipeline {
                name: "p".into(),
                uuid: "p".into(),
                version: None,
                properties: Map::new(),
                graph,
            };

            let json = save(&pipeline).to_json(false).unwrap();
            let reloaded = load(PersistedPipeline::from_json(&json).unwrap());

            let mut expected: Vec<_> = pipeline.graph.connections().collect();
            let mut actual: Vec<_> = reloaded.graph.connections().collect();
            expected.sort();
            actual.sort();
            prop_assert_eq!(actual, expected);

            for step in pipeline.graph.steps() {
                let other = reloaded.graph.step(&step.id).unwrap();
                prop_assert_eq!(other.outgoing_connections(), step.outgoing_connections());
            }
        }
    }
}
