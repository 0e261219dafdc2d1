use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use graphcola::config::Config;
use graphcola::constraint::{Constraint, OrderedNode};
use graphcola::driver::CancelToken;
use graphcola::engine::{
    Axis, EngineConstraint, EngineLink, EngineNode, IterationBudget, LayoutEngine,
};
use graphcola::scene::{Scene, SceneAdapter, SceneEdge, SceneNode};
use graphcola::view::GraphView;

/// Converges immediately; the benchmark measures the pipeline around the
/// engine, not the solve.
#[derive(Default)]
struct NoopEngine {
    nodes: Vec<EngineNode>,
}

impl LayoutEngine for NoopEngine {
    fn begin(
        &mut self,
        nodes: Vec<EngineNode>,
        _links: Vec<EngineLink>,
        _constraints: Vec<EngineConstraint>,
        _budget: IterationBudget,
    ) {
        self.nodes = nodes;
    }

    fn step(&mut self) -> bool {
        false
    }

    fn positions(&self) -> &[EngineNode] {
        &self.nodes
    }

    fn stop(&mut self) {}
}

fn synthetic_scene(nodes: usize, extra_edges: usize) -> Scene {
    let mut scene = Scene::default();
    for i in 0..nodes {
        scene.nodes.push(SceneNode {
            key: format!("n{i}"),
            radius: None,
            fixed: None,
            order: None,
            ports: Vec::new(),
        });
    }
    for i in 0..nodes.saturating_sub(1) {
        scene.edges.push(SceneEdge {
            key: format!("chain{i}"),
            source: format!("n{i}"),
            target: format!("n{}", i + 1),
            layout: true,
            source_port: None,
            target_port: None,
        });
    }
    let mut count = 0usize;
    'outer: for i in 0..nodes {
        for j in (i + 2)..nodes {
            if count >= extra_edges {
                break 'outer;
            }
            scene.edges.push(SceneEdge {
                key: format!("extra{count}"),
                source: format!("n{i}"),
                target: format!("n{j}"),
                layout: true,
                source_port: None,
                target_port: None,
            });
            count += 1;
        }
    }
    let ordered = nodes.min(10);
    scene.constraints.push(Constraint::Ordering {
        axis: Axis::X,
        nodes: (0..ordered)
            .map(|i| OrderedNode {
                node: format!("n{i}"),
                rank: i as f32,
            })
            .collect(),
        gap: None,
    });
    scene
}

fn bench_first_redraw(c: &mut Criterion) {
    let mut group = c.benchmark_group("first_redraw");
    for size in [50usize, 200, 800] {
        let scene = synthetic_scene(size, size / 2);
        group.bench_with_input(BenchmarkId::from_parameter(size), &scene, |b, scene| {
            b.iter(|| {
                let mut view =
                    GraphView::new(SceneAdapter, NoopEngine::default(), Config::default());
                let stats = view.redraw(
                    &scene.nodes,
                    &scene.edges,
                    &scene.constraints,
                    &CancelToken::new(),
                    |_| {},
                );
                black_box(stats.nodes)
            });
        });
    }
    group.finish();
}

fn bench_steady_state_redraw(c: &mut Criterion) {
    let mut group = c.benchmark_group("steady_redraw");
    for size in [50usize, 200, 800] {
        let scene = synthetic_scene(size, size / 2);
        let mut view = GraphView::new(SceneAdapter, NoopEngine::default(), Config::default());
        view.redraw(
            &scene.nodes,
            &scene.edges,
            &scene.constraints,
            &CancelToken::new(),
            |_| {},
        );
        group.bench_with_input(BenchmarkId::from_parameter(size), &scene, |b, scene| {
            b.iter(|| {
                let stats = view.redraw(
                    &scene.nodes,
                    &scene.edges,
                    &scene.constraints,
                    &CancelToken::new(),
                    |_| {},
                );
                black_box(stats.changed)
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_first_redraw, bench_steady_state_redraw);
criterion_main!(benches);
