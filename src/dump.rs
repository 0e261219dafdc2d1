use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use serde::Serialize;

use crate::constraint::TranslatedConstraints;
use crate::engine::EngineConstraint;
use crate::graph::{GraphAdapter, GraphStore};

/// Everything the external engine would be handed for the current redraw,
/// plus the reconciler's derived annotations. Written as JSON for
/// inspection and fixture comparison.
#[derive(Debug, Serialize)]
pub struct EngineInputDump {
    pub nodes: Vec<NodeDump>,
    pub edges: Vec<EdgeDump>,
    pub links: Vec<LinkDump>,
    pub constraints: Vec<EngineConstraint>,
    pub ports: Vec<PortDump>,
}

#[derive(Debug, Serialize)]
pub struct NodeDump {
    pub key: String,
    pub index: usize,
    pub x: f32,
    pub y: f32,
    pub fixed: bool,
    pub rx: f32,
    pub ry: f32,
}

#[derive(Debug, Serialize)]
pub struct EdgeDump {
    pub key: String,
    pub source: String,
    pub target: String,
    pub parallel: usize,
    pub in_layout: bool,
}

#[derive(Debug, Serialize)]
pub struct LinkDump {
    pub source: usize,
    pub target: usize,
    pub distance: Option<f32>,
    pub synthetic: bool,
}

#[derive(Debug, Serialize)]
pub struct PortDump {
    pub node: String,
    pub name: String,
    pub theta: Option<f32>,
    pub x: f32,
    pub y: f32,
}

impl EngineInputDump {
    pub fn from_store<A: GraphAdapter>(
        store: &GraphStore<A>,
        translated: &TranslatedConstraints,
    ) -> Self {
        let nodes = store
            .active_nodes()
            .map(|(key, node)| NodeDump {
                key: key.to_string(),
                index: node.index,
                x: node.x,
                y: node.y,
                fixed: node.fixed,
                rx: node.rx,
                ry: node.ry,
            })
            .collect();

        let edges = store
            .active_edges()
            .map(|(key, edge)| EdgeDump {
                key: key.to_string(),
                source: edge.source.clone(),
                target: edge.target.clone(),
                parallel: edge.parallel,
                in_layout: edge.in_layout,
            })
            .collect();

        let mut links: Vec<LinkDump> = store
            .engine_links()
            .iter()
            .map(|link| LinkDump {
                source: link.source,
                target: link.target,
                distance: link.distance,
                synthetic: false,
            })
            .collect();
        links.extend(translated.extra_links.iter().map(|link| LinkDump {
            source: link.source,
            target: link.target,
            distance: link.distance,
            synthetic: true,
        }));

        let mut ports = Vec::new();
        for (key, node) in store.active_nodes() {
            for name in &node.port_order {
                let Some(port) = node.ports.get(name) else {
                    continue;
                };
                ports.push(PortDump {
                    node: key.to_string(),
                    name: name.clone(),
                    theta: port.theta,
                    x: port.pos.x,
                    y: port.pos.y,
                });
            }
        }

        EngineInputDump {
            nodes,
            edges,
            links,
            constraints: translated.constraints.clone(),
            ports,
        }
    }
}

pub fn write_engine_dump(path: &Path, dump: &EngineInputDump) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, dump)?;
    Ok(())
}
