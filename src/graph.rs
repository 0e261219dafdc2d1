use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Serialize;

use crate::config::ReconcileConfig;
use crate::engine::{EngineLink, EngineNode};
use crate::geometry::Point;
use crate::ports::{Port, PortSpec};

/// Caller-supplied accessors over raw node/edge records. The key accessors
/// are mandatory; the rest default to what an unannotated record set would
/// expect. Accessor panics propagate: a broken accessor is a programming
/// error, not a runtime condition.
pub trait GraphAdapter {
    type Node: Clone + Serialize;
    type Edge: Clone + Serialize;

    fn node_key(&self, node: &Self::Node) -> String;
    fn edge_key(&self, edge: &Self::Edge) -> String;
    fn edge_source(&self, edge: &Self::Edge) -> String;
    fn edge_target(&self, edge: &Self::Edge) -> String;

    fn node_radius(&self, _node: &Self::Node) -> Option<f32> {
        None
    }

    /// A pinned position, if the record declares one.
    fn node_fixed(&self, _node: &Self::Node) -> Option<Point> {
        None
    }

    /// Whether the edge participates in layout or is only drawn.
    fn edge_in_layout(&self, _edge: &Self::Edge) -> bool {
        true
    }

    /// Ordering of the engine-facing node sequence; input order by default.
    fn compare_nodes(&self, _a: &Self::Node, _b: &Self::Node) -> Ordering {
        Ordering::Equal
    }

    fn node_ports(&self, _node: &Self::Node) -> Vec<PortSpec> {
        Vec::new()
    }

    fn edge_source_port(&self, _edge: &Self::Edge) -> Option<String> {
        None
    }

    fn edge_target_port(&self, _edge: &Self::Edge) -> Option<String> {
        None
    }
}

/// Long-lived wrapper around the latest node record for one key. Survives
/// across redraws as long as its key does, so positions carry over and the
/// engine can continue instead of restarting.
#[derive(Debug, Clone)]
pub struct InternalNode<N> {
    pub orig: N,
    /// Position in the engine-facing sequence; recomputed every redraw.
    pub index: usize,
    pub x: f32,
    pub y: f32,
    pub fixed: bool,
    pub rx: f32,
    pub ry: f32,
    pub ports: BTreeMap<String, Port>,
    /// Port names in resolved angular order, rebuilt by port placement.
    pub port_order: Vec<String>,
}

impl<N> InternalNode<N> {
    pub fn center(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Long-lived wrapper around the latest edge record for one key. Source and
/// target are node keys, lookups into the store rather than owning references.
#[derive(Debug, Clone)]
pub struct InternalEdge<E> {
    pub orig: E,
    pub source: String,
    pub target: String,
    pub source_port: Option<String>,
    pub target_port: Option<String>,
    /// 0 for the first edge between an unordered node pair, counting up
    /// for each additional one.
    pub parallel: usize,
    pub in_layout: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct ReconcileReport {
    pub nodes: usize,
    pub edges: usize,
    /// False when both record sets serialized byte-identical to the
    /// previous redraw.
    pub changed: bool,
}

/// Explicit key→wrapper arena owned by one diagram instance. Entries are
/// created on first sighting of a key and swept the first redraw the key
/// is absent.
pub struct GraphStore<A: GraphAdapter> {
    adapter: A,
    nodes: HashMap<String, InternalNode<A::Node>>,
    edges: HashMap<String, InternalEdge<A::Edge>>,
    node_seq: Vec<String>,
    edge_seq: Vec<String>,
    prev_node_snapshot: String,
    prev_edge_snapshot: String,
}

impl<A: GraphAdapter> GraphStore<A> {
    pub fn new(adapter: A) -> Self {
        Self {
            adapter,
            nodes: HashMap::new(),
            edges: HashMap::new(),
            node_seq: Vec::new(),
            edge_seq: Vec::new(),
            prev_node_snapshot: String::new(),
            prev_edge_snapshot: String::new(),
        }
    }

    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    /// Match the incoming records onto the persistent wrappers: create on
    /// first sighting, refresh `orig` and derived fields, reassign indices,
    /// filter edges with a missing endpoint out of the active sequence, and
    /// sweep wrappers whose key disappeared.
    pub fn reconcile(
        &mut self,
        node_records: &[A::Node],
        edge_records: &[A::Edge],
        config: &ReconcileConfig,
    ) -> ReconcileReport {
        let mut ordered: Vec<&A::Node> = node_records.iter().collect();
        ordered.sort_by(|a, b| self.adapter.compare_nodes(a, b));

        self.node_seq.clear();
        for (index, record) in ordered.iter().enumerate() {
            let key = self.adapter.node_key(record);
            let radius = self
                .adapter
                .node_radius(record)
                .unwrap_or(config.default_radius);
            let node = self
                .nodes
                .entry(key.clone())
                .or_insert_with(|| InternalNode {
                    orig: (*record).clone(),
                    index: 0,
                    x: 0.0,
                    y: 0.0,
                    fixed: false,
                    rx: radius,
                    ry: radius,
                    ports: BTreeMap::new(),
                    port_order: Vec::new(),
                });
            node.orig = (*record).clone();
            node.index = index;
            node.rx = radius;
            node.ry = radius;
            match self.adapter.node_fixed(record) {
                Some(pin) => {
                    node.fixed = true;
                    node.x = pin.x;
                    node.y = pin.y;
                }
                None => node.fixed = false,
            }
            sync_ports(node, self.adapter.node_ports(record));
            self.node_seq.push(key);
        }

        self.edge_seq.clear();
        for record in edge_records {
            let key = self.adapter.edge_key(record);
            let source = self.adapter.edge_source(record);
            let target = self.adapter.edge_target(record);
            let edge = self
                .edges
                .entry(key.clone())
                .or_insert_with(|| InternalEdge {
                    orig: record.clone(),
                    source: source.clone(),
                    target: target.clone(),
                    source_port: None,
                    target_port: None,
                    parallel: 0,
                    in_layout: true,
                });
            edge.orig = record.clone();
            edge.source = source.clone();
            edge.target = target.clone();
            edge.source_port = self.adapter.edge_source_port(record);
            edge.target_port = self.adapter.edge_target_port(record);
            edge.in_layout = self.adapter.edge_in_layout(record);
            // An endpoint key missing from the current node set drops the
            // edge from this redraw without discarding its wrapper.
            if self.nodes.contains_key(&source) && self.nodes.contains_key(&target) {
                self.edge_seq.push(key);
            }
        }

        self.sweep(node_records, edge_records);

        if config.parallel_edges {
            self.index_parallel_edges();
        }

        let node_snapshot =
            serde_json::to_string(&ordered).expect("node records must serialize");
        let edge_records: Vec<&A::Edge> = edge_records.iter().collect();
        let edge_snapshot =
            serde_json::to_string(&edge_records).expect("edge records must serialize");
        let changed = node_snapshot != self.prev_node_snapshot
            || edge_snapshot != self.prev_edge_snapshot;
        self.prev_node_snapshot = node_snapshot;
        self.prev_edge_snapshot = edge_snapshot;

        ReconcileReport {
            nodes: self.node_seq.len(),
            edges: self.edge_seq.len(),
            changed,
        }
    }

    /// Drop wrappers whose key was not seen this round. Bounds the arena
    /// to the live graph.
    fn sweep(&mut self, node_records: &[A::Node], edge_records: &[A::Edge]) {
        let touched_nodes: HashSet<String> = node_records
            .iter()
            .map(|record| self.adapter.node_key(record))
            .collect();
        let touched_edges: HashSet<String> = edge_records
            .iter()
            .map(|record| self.adapter.edge_key(record))
            .collect();
        self.nodes.retain(|key, _| touched_nodes.contains(key));
        self.edges.retain(|key, _| touched_edges.contains(key));
    }

    /// Per unordered endpoint pair, number the edges between it in
    /// encounter order. Symmetric under swapping source and target.
    fn index_parallel_edges(&mut self) {
        let mut seen: HashMap<(usize, usize), usize> = HashMap::new();
        for key in &self.edge_seq {
            let Some(edge) = self.edges.get(key) else {
                continue;
            };
            let (Some(source), Some(target)) =
                (self.nodes.get(&edge.source), self.nodes.get(&edge.target))
            else {
                continue;
            };
            let pair = (
                source.index.min(target.index),
                source.index.max(target.index),
            );
            let count = seen.entry(pair).or_insert(0);
            if let Some(edge) = self.edges.get_mut(key) {
                edge.parallel = *count;
            }
            *count += 1;
        }
    }

    pub fn node(&self, key: &str) -> Option<&InternalNode<A::Node>> {
        self.nodes.get(key)
    }

    pub fn node_mut(&mut self, key: &str) -> Option<&mut InternalNode<A::Node>> {
        self.nodes.get_mut(key)
    }

    pub fn edge(&self, key: &str) -> Option<&InternalEdge<A::Edge>> {
        self.edges.get(key)
    }

    pub fn node_keys(&self) -> &[String] {
        &self.node_seq
    }

    pub fn edge_keys(&self) -> &[String] {
        &self.edge_seq
    }

    pub fn active_nodes(&self) -> impl Iterator<Item = (&str, &InternalNode<A::Node>)> {
        self.node_seq
            .iter()
            .filter_map(|key| self.nodes.get(key).map(|node| (key.as_str(), node)))
    }

    pub fn active_edges(&self) -> impl Iterator<Item = (&str, &InternalEdge<A::Edge>)> {
        self.edge_seq
            .iter()
            .filter_map(|key| self.edges.get(key).map(|edge| (key.as_str(), edge)))
    }

    pub fn index_of(&self, key: &str) -> Option<usize> {
        self.nodes.get(key).map(|node| node.index)
    }

    pub fn index_map(&self) -> HashMap<String, usize> {
        self.node_seq
            .iter()
            .enumerate()
            .map(|(index, key)| (key.clone(), index))
            .collect()
    }

    /// Snapshot of the active nodes in engine shape, index-aligned with
    /// the wrapper sequence.
    pub fn engine_nodes(&self) -> Vec<EngineNode> {
        self.node_seq
            .iter()
            .filter_map(|key| self.nodes.get(key))
            .map(|node| EngineNode {
                x: node.x,
                y: node.y,
                fixed: node.fixed,
            })
            .collect()
    }

    /// Active layout edges translated into the engine's index space.
    pub fn engine_links(&self) -> Vec<EngineLink> {
        self.active_edges()
            .filter(|(_, edge)| edge.in_layout)
            .filter_map(|(_, edge)| {
                let source = self.index_of(&edge.source)?;
                let target = self.index_of(&edge.target)?;
                Some(EngineLink {
                    source,
                    target,
                    distance: None,
                })
            })
            .collect()
    }

    /// Write engine positions back into the wrappers.
    pub fn apply_positions(&mut self, positions: &[EngineNode]) {
        for (key, position) in self.node_seq.iter().zip(positions) {
            if let Some(node) = self.nodes.get_mut(key) {
                node.x = position.x;
                node.y = position.y;
            }
        }
    }

    pub fn node_count(&self) -> usize {
        self.node_seq.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_seq.len()
    }
}

/// Reconcile a node's port set against the declarations on its latest
/// record: refresh bounds and preset directions, drop undeclared ports.
fn sync_ports<N>(node: &mut InternalNode<N>, specs: Vec<PortSpec>) {
    let declared: Vec<&str> = specs.iter().map(|spec| spec.name.as_str()).collect();
    node.ports.retain(|name, _| declared.contains(&name.as_str()));
    for spec in specs {
        let port = node
            .ports
            .entry(spec.name.clone())
            .or_insert_with(|| Port::new(spec.name.clone()));
        port.bounds = spec.bounds;
        port.preset = spec.theta;
    }
}
