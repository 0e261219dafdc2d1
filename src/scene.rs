use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constraint::Constraint;
use crate::geometry::Point;
use crate::graph::GraphAdapter;
use crate::ports::PortSpec;

/// Node record as callers hand it in. `key` is the stable identity across
/// data refreshes; everything else is optional annotation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneNode {
    pub key: String,
    #[serde(default)]
    pub radius: Option<f32>,
    /// Pins the node at a position; the engine will not move it.
    #[serde(default)]
    pub fixed: Option<Point>,
    /// Sort rank for the engine-facing sequence; unranked nodes keep
    /// input order.
    #[serde(default)]
    pub order: Option<f32>,
    #[serde(default)]
    pub ports: Vec<PortSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneEdge {
    pub key: String,
    pub source: String,
    pub target: String,
    /// False draws the edge without letting it pull on the layout.
    #[serde(default = "default_true")]
    pub layout: bool,
    #[serde(default)]
    pub source_port: Option<String>,
    #[serde(default)]
    pub target_port: Option<String>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scene {
    #[serde(default)]
    pub nodes: Vec<SceneNode>,
    #[serde(default)]
    pub edges: Vec<SceneEdge>,
    #[serde(default)]
    pub constraints: Vec<Constraint>,
}

#[derive(Debug, Error)]
pub enum SceneError {
    #[error("failed to read scene {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse scene {path}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("constraint references unknown node key `{key}`")]
    UnknownNode { key: String },
}

/// Accessors for the built-in record format.
pub struct SceneAdapter;

impl GraphAdapter for SceneAdapter {
    type Node = SceneNode;
    type Edge = SceneEdge;

    fn node_key(&self, node: &SceneNode) -> String {
        node.key.clone()
    }

    fn edge_key(&self, edge: &SceneEdge) -> String {
        edge.key.clone()
    }

    fn edge_source(&self, edge: &SceneEdge) -> String {
        edge.source.clone()
    }

    fn edge_target(&self, edge: &SceneEdge) -> String {
        edge.target.clone()
    }

    fn node_radius(&self, node: &SceneNode) -> Option<f32> {
        node.radius
    }

    fn node_fixed(&self, node: &SceneNode) -> Option<Point> {
        node.fixed
    }

    fn edge_in_layout(&self, edge: &SceneEdge) -> bool {
        edge.layout
    }

    fn compare_nodes(&self, a: &SceneNode, b: &SceneNode) -> Ordering {
        match (a.order, b.order) {
            (Some(left), Some(right)) => left.total_cmp(&right),
            _ => Ordering::Equal,
        }
    }

    fn node_ports(&self, node: &SceneNode) -> Vec<PortSpec> {
        node.ports.clone()
    }

    fn edge_source_port(&self, edge: &SceneEdge) -> Option<String> {
        edge.source_port.clone()
    }

    fn edge_target_port(&self, edge: &SceneEdge) -> Option<String> {
        edge.target_port.clone()
    }
}

/// Every node key a constraint names must exist in the scene. Keys that
/// disappear later through filtering are tolerated at translation time;
/// a key that never existed is a configuration error.
pub fn validate_scene(scene: &Scene) -> Result<(), SceneError> {
    let known: Vec<&str> = scene.nodes.iter().map(|node| node.key.as_str()).collect();
    let check = |key: &str| -> Result<(), SceneError> {
        if known.contains(&key) {
            Ok(())
        } else {
            Err(SceneError::UnknownNode {
                key: key.to_string(),
            })
        }
    };
    for constraint in &scene.constraints {
        match constraint {
            Constraint::Alignment { offsets, .. } => {
                for offset in offsets {
                    check(&offset.node)?;
                }
            }
            Constraint::Circle { nodes, .. } => {
                for node in nodes {
                    check(node)?;
                }
            }
            Constraint::Ordering { nodes, .. } => {
                for node in nodes {
                    check(&node.node)?;
                }
            }
        }
    }
    Ok(())
}

pub fn parse_scene(contents: &str) -> Result<Scene, String> {
    match serde_json::from_str(contents) {
        Ok(scene) => Ok(scene),
        Err(json_err) => json5::from_str(contents).map_err(|_| json_err.to_string()),
    }
}

pub fn load_scene(path: &Path) -> Result<Scene, SceneError> {
    let contents = std::fs::read_to_string(path).map_err(|source| SceneError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let scene = parse_scene(&contents).map_err(|message| SceneError::Parse {
        path: path.to_path_buf(),
        message,
    })?;
    validate_scene(&scene)?;
    Ok(scene)
}
