use std::collections::HashMap;
use std::f32::consts::PI;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::config::PortConfig;
use crate::geometry::{
    Point, circular_mean, clip_ray_to_ellipse, direction_between, nearer_bound, normalize_angle,
    unit_vector, within_bounds,
};
use crate::graph::{GraphAdapter, GraphStore, InternalNode};

/// Port declaration carried on a node record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortSpec {
    pub name: String,
    /// Explicit direction, used when no incident edge dictates one.
    #[serde(default)]
    pub theta: Option<f32>,
    /// Valid angular arc, counterclockwise from `bounds[0]` to `bounds[1]`.
    #[serde(default)]
    pub bounds: Option<[f32; 2]>,
}

/// Attachment point on a node boundary, shared by any number of edges.
#[derive(Debug, Clone)]
pub struct Port {
    pub name: String,
    pub preset: Option<f32>,
    pub bounds: Option<[f32; 2]>,
    /// Resolved direction in (-pi, pi], set by placement.
    pub theta: Option<f32>,
    /// Resolved point on the node boundary.
    pub pos: Point,
    /// Incident edge keys in encounter order.
    pub edges: Vec<String>,
}

impl Port {
    pub fn new(name: String) -> Self {
        Self {
            name,
            preset: None,
            bounds: None,
            theta: None,
            pos: Point::default(),
            edges: Vec::new(),
        }
    }
}

/// Resolved endpoints for one edge after port placement.
#[derive(Debug, Clone, Copy)]
pub struct EdgeAnchors {
    pub start: Point,
    pub end: Point,
}

pub struct PortPlacer {
    rng: StdRng,
}

impl PortPlacer {
    pub fn new(config: &PortConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self { rng }
    }

    /// Assign every port of every active node a direction and a boundary
    /// position.
    ///
    /// Ports with incident edges point at the circular mean of the edge
    /// directions; a mean outside the port's bounds is clipped to the
    /// nearer bound edge. Ports left without a direction draw a uniformly
    /// random angle inside their bounds, with no collision avoidance among
    /// them. Known approximation.
    pub fn place<A: GraphAdapter>(&mut self, store: &mut GraphStore<A>) {
        let node_keys: Vec<String> = store.node_keys().to_vec();
        let centers: HashMap<String, Point> = store
            .active_nodes()
            .map(|(key, node)| (key.to_string(), node.center()))
            .collect();

        // (node key, port name) -> incident (edge key, far node key).
        let mut incident: HashMap<(String, String), Vec<(String, String)>> = HashMap::new();
        for (key, edge) in store.active_edges() {
            if let Some(port) = &edge.source_port {
                incident
                    .entry((edge.source.clone(), port.clone()))
                    .or_default()
                    .push((key.to_string(), edge.target.clone()));
            }
            if let Some(port) = &edge.target_port {
                incident
                    .entry((edge.target.clone(), port.clone()))
                    .or_default()
                    .push((key.to_string(), edge.source.clone()));
            }
        }

        for node_key in node_keys {
            let Some(center) = centers.get(&node_key).copied() else {
                continue;
            };
            let Some(node) = store.node_mut(&node_key) else {
                continue;
            };
            place_node_ports(node, &node_key, center, &centers, &incident, &mut self.rng);
        }
    }
}

fn place_node_ports<N>(
    node: &mut InternalNode<N>,
    node_key: &str,
    center: Point,
    centers: &HashMap<String, Point>,
    incident: &HashMap<(String, String), Vec<(String, String)>>,
    rng: &mut StdRng,
) {
    let mut placed: Vec<String> = Vec::new();
    let mut unplaced: Vec<String> = Vec::new();

    for (name, port) in node.ports.iter_mut() {
        port.edges.clear();
        let mut directions = Vec::new();
        if let Some(list) = incident.get(&(node_key.to_string(), name.clone())) {
            for (edge_key, far_key) in list {
                port.edges.push(edge_key.clone());
                // Direction away from this node regardless of which side of
                // the edge it sits on.
                if let Some(far_center) = centers.get(far_key)
                    && let Some(theta) = direction_between(center, *far_center)
                {
                    directions.push(unit_vector(theta));
                }
            }
        }
        let tentative = if port.edges.is_empty() {
            port.preset
        } else {
            // A cancelled-out mean is a degenerate direction; the port
            // falls back to unplaced rather than erroring.
            circular_mean(&directions)
        };
        port.theta = tentative.map(normalize_angle);
        match port.theta {
            Some(_) => placed.push(name.clone()),
            None => unplaced.push(name.clone()),
        }
    }

    // Clip out-of-bounds directions to the angularly nearer bound edge.
    for name in &placed {
        let Some(port) = node.ports.get_mut(name) else {
            continue;
        };
        if let (Some(theta), Some(bounds)) = (port.theta, port.bounds)
            && !within_bounds(theta, bounds)
        {
            port.theta = Some(normalize_angle(nearer_bound(theta, bounds)));
        }
    }

    placed.sort_by(|a, b| {
        let ta = node.ports[a].theta.unwrap_or(0.0);
        let tb = node.ports[b].theta.unwrap_or(0.0);
        ta.total_cmp(&tb)
    });

    for name in &unplaced {
        let Some(port) = node.ports.get_mut(name) else {
            continue;
        };
        let theta = match port.bounds {
            Some(bounds) => {
                let span = (bounds[1] - bounds[0]).rem_euclid(2.0 * PI);
                let span = if span == 0.0 { 2.0 * PI } else { span };
                bounds[0] + rng.random_range(0.0..=span)
            }
            None => rng.random_range(-PI..=PI),
        };
        port.theta = Some(normalize_angle(theta));
    }

    for port in node.ports.values_mut() {
        if let Some(theta) = port.theta {
            port.pos = clip_ray_to_ellipse(center, node.rx, node.ry, theta);
        }
    }

    node.port_order = placed;
    node.port_order.extend(unplaced);
}

/// Resolve the connection point of every active edge endpoint: the named
/// port's position when one is declared, otherwise a synthetic default port
/// in the edge's own direction.
pub fn resolve_edge_anchors<A: GraphAdapter>(store: &GraphStore<A>) -> HashMap<String, EdgeAnchors> {
    let mut anchors = HashMap::new();
    for (key, edge) in store.active_edges() {
        let (Some(source), Some(target)) = (store.node(&edge.source), store.node(&edge.target))
        else {
            continue;
        };
        let start = endpoint_anchor(source, edge.source_port.as_deref(), target.center());
        let end = endpoint_anchor(target, edge.target_port.as_deref(), source.center());
        anchors.insert(key.to_string(), EdgeAnchors { start, end });
    }
    anchors
}

fn endpoint_anchor<N>(node: &InternalNode<N>, port: Option<&str>, toward: Point) -> Point {
    if let Some(port) = port
        && let Some(port) = node.ports.get(port)
        && port.theta.is_some()
    {
        return port.pos;
    }
    match direction_between(node.center(), toward) {
        Some(theta) => clip_ray_to_ellipse(node.center(), node.rx, node.ry, theta),
        // Coincident endpoints degrade to the node center.
        None => node.center(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReconcileConfig;
    use serde::Serialize;

    #[derive(Debug, Clone, Serialize)]
    struct PortNode {
        key: String,
        pos: Option<Point>,
        #[serde(skip)]
        ports: Vec<PortSpec>,
    }

    #[derive(Debug, Clone, Serialize)]
    struct PortEdge {
        key: String,
        source: String,
        target: String,
        source_port: Option<String>,
        target_port: Option<String>,
    }

    struct PortAdapter;

    impl GraphAdapter for PortAdapter {
        type Node = PortNode;
        type Edge = PortEdge;

        fn node_key(&self, node: &PortNode) -> String {
            node.key.clone()
        }

        fn edge_key(&self, edge: &PortEdge) -> String {
            edge.key.clone()
        }

        fn edge_source(&self, edge: &PortEdge) -> String {
            edge.source.clone()
        }

        fn edge_target(&self, edge: &PortEdge) -> String {
            edge.target.clone()
        }

        fn node_fixed(&self, node: &PortNode) -> Option<Point> {
            node.pos
        }

        fn node_ports(&self, node: &PortNode) -> Vec<PortSpec> {
            node.ports.clone()
        }

        fn edge_source_port(&self, edge: &PortEdge) -> Option<String> {
            edge.source_port.clone()
        }

        fn edge_target_port(&self, edge: &PortEdge) -> Option<String> {
            edge.target_port.clone()
        }
    }

    fn node(key: &str, x: f32, y: f32, ports: Vec<PortSpec>) -> PortNode {
        PortNode {
            key: key.to_string(),
            pos: Some(Point::new(x, y)),
            ports,
        }
    }

    fn spec(name: &str, theta: Option<f32>, bounds: Option<[f32; 2]>) -> PortSpec {
        PortSpec {
            name: name.to_string(),
            theta,
            bounds,
        }
    }

    fn edge(key: &str, source: &str, target: &str, source_port: Option<&str>) -> PortEdge {
        PortEdge {
            key: key.to_string(),
            source: source.to_string(),
            target: target.to_string(),
            source_port: source_port.map(|name| name.to_string()),
            target_port: None,
        }
    }

    fn placer() -> PortPlacer {
        PortPlacer::new(&PortConfig { seed: Some(7) })
    }

    #[test]
    fn out_of_bounds_direction_clips_to_nearer_bound() {
        let mut store = GraphStore::new(PortAdapter);
        let nodes = [
            node("a", 0.0, 0.0, vec![spec("p", None, Some([0.0, PI / 2.0]))]),
            node("b", -100.0, 0.0, Vec::new()),
        ];
        let edges = [edge("e", "a", "b", Some("p"))];
        store.reconcile(&nodes, &edges, &ReconcileConfig::default());
        placer().place(&mut store);

        let port = &store.node("a").unwrap().ports["p"];
        // Tentative direction pi is outside [0, pi/2]; pi/2 is nearer.
        assert!((port.theta.unwrap() - PI / 2.0).abs() < 1e-4);
    }

    #[test]
    fn tentative_direction_is_circular_mean_of_incident_edges() {
        let mut store = GraphStore::new(PortAdapter);
        let nodes = [
            node("a", 0.0, 0.0, vec![spec("p", None, None)]),
            node("b", 100.0, 0.0, Vec::new()),
            node("c", 0.0, 100.0, Vec::new()),
        ];
        let edges = [
            edge("e1", "a", "b", Some("p")),
            edge("e2", "a", "c", Some("p")),
        ];
        store.reconcile(&nodes, &edges, &ReconcileConfig::default());
        placer().place(&mut store);

        let port = &store.node("a").unwrap().ports["p"];
        assert!((port.theta.unwrap() - PI / 4.0).abs() < 1e-4);
        assert_eq!(port.edges, vec!["e1".to_string(), "e2".to_string()]);
    }

    #[test]
    fn incoming_edge_direction_is_measured_from_this_node() {
        let mut store = GraphStore::new(PortAdapter);
        let nodes = [
            node("a", 0.0, 0.0, Vec::new()),
            node("b", 100.0, 0.0, vec![spec("in", None, None)]),
        ];
        let edges = [PortEdge {
            key: "e".to_string(),
            source: "a".to_string(),
            target: "b".to_string(),
            source_port: None,
            target_port: Some("in".to_string()),
        }];
        store.reconcile(&nodes, &edges, &ReconcileConfig::default());
        placer().place(&mut store);

        // From b, the far endpoint a lies at angle pi.
        let port = &store.node("b").unwrap().ports["in"];
        assert!((port.theta.unwrap() - PI).abs() < 1e-4);
    }

    #[test]
    fn degenerate_mean_falls_back_to_random_within_bounds() {
        let mut store = GraphStore::new(PortAdapter);
        let bounds = [0.5, 1.5];
        let nodes = [
            node("a", 0.0, 0.0, vec![spec("p", None, Some(bounds))]),
            node("left", -50.0, 0.0, Vec::new()),
            node("right", 50.0, 0.0, Vec::new()),
        ];
        let edges = [
            edge("e1", "a", "left", Some("p")),
            edge("e2", "a", "right", Some("p")),
        ];
        store.reconcile(&nodes, &edges, &ReconcileConfig::default());
        placer().place(&mut store);

        let port = &store.node("a").unwrap().ports["p"];
        let theta = port.theta.unwrap();
        assert!(within_bounds(theta, bounds), "theta {theta} outside bounds");
    }

    #[test]
    fn edgeless_port_keeps_preset_direction() {
        let mut store = GraphStore::new(PortAdapter);
        let nodes = [node("a", 0.0, 0.0, vec![spec("p", Some(1.0), None)])];
        store.reconcile(&nodes, &[], &ReconcileConfig::default());
        placer().place(&mut store);

        let node = store.node("a").unwrap();
        let port = &node.ports["p"];
        assert!((port.theta.unwrap() - 1.0).abs() < 1e-6);
        // Position sits on the node boundary (default radius 20).
        let dx = port.pos.x;
        let dy = port.pos.y;
        assert!(((dx * dx + dy * dy).sqrt() - 20.0).abs() < 1e-3);
    }

    #[test]
    fn seeded_placement_is_reproducible() {
        let build = || {
            let mut store = GraphStore::new(PortAdapter);
            let nodes = [node("a", 0.0, 0.0, vec![spec("p", None, None)])];
            store.reconcile(&nodes, &[], &ReconcileConfig::default());
            placer().place(&mut store);
            store.node("a").unwrap().ports["p"].theta.unwrap()
        };
        assert_eq!(build(), build());
    }

    #[test]
    fn anchors_use_ports_when_named_and_boundary_otherwise() {
        let mut store = GraphStore::new(PortAdapter);
        let nodes = [
            node("a", 0.0, 0.0, vec![spec("p", None, None)]),
            node("b", 100.0, 0.0, Vec::new()),
        ];
        let edges = [edge("e", "a", "b", Some("p"))];
        store.reconcile(&nodes, &edges, &ReconcileConfig::default());
        placer().place(&mut store);

        let anchors = resolve_edge_anchors(&store);
        let anchor = anchors["e"];
        let port_pos = store.node("a").unwrap().ports["p"].pos;
        assert_eq!(anchor.start.x, port_pos.x);
        assert_eq!(anchor.start.y, port_pos.y);
        // Synthetic default port on b: boundary point toward a.
        assert!((anchor.end.x - 80.0).abs() < 1e-3);
        assert!(anchor.end.y.abs() < 1e-3);
    }

    #[test]
    fn port_order_sorts_resolved_directions() {
        let mut store = GraphStore::new(PortAdapter);
        let nodes = [
            node(
                "a",
                0.0,
                0.0,
                vec![
                    spec("north", Some(PI / 2.0), None),
                    spec("east", Some(0.1), None),
                    spec("west", Some(PI), None),
                ],
            ),
        ];
        store.reconcile(&nodes, &[], &ReconcileConfig::default());
        placer().place(&mut store);

        let node = store.node("a").unwrap();
        assert_eq!(node.port_order, vec!["east", "north", "west"]);
    }
}
