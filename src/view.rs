use std::collections::HashMap;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::config::Config;
use crate::constraint::{Constraint, translate};
use crate::driver::{CancelToken, LayoutDriver, LayoutOutcome};
use crate::engine::LayoutEngine;
use crate::graph::{GraphAdapter, GraphStore};
use crate::ports::{EdgeAnchors, PortPlacer, resolve_edge_anchors};

/// Aggregate result of one redraw cycle.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct RedrawStats {
    pub nodes: usize,
    pub edges: usize,
    pub changed: bool,
    pub outcome: LayoutOutcome,
    #[serde(skip)]
    pub elapsed: Duration,
}

/// One diagram instance: the persistent reconciliation store, the port
/// placer, and the driver around the external engine. Redraws are strictly
/// sequential; each one produces exactly one completion outcome.
pub struct GraphView<A: GraphAdapter, E: LayoutEngine> {
    config: Config,
    store: GraphStore<A>,
    placer: PortPlacer,
    driver: LayoutDriver<E>,
}

impl<A: GraphAdapter, E: LayoutEngine> GraphView<A, E> {
    pub fn new(adapter: A, engine: E, config: Config) -> Self {
        let placer = PortPlacer::new(&config.ports);
        Self {
            store: GraphStore::new(adapter),
            placer,
            driver: LayoutDriver::new(engine),
            config,
        }
    }

    pub fn store(&self) -> &GraphStore<A> {
        &self.store
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn engine(&self) -> &E {
        self.driver.engine()
    }

    /// Resolved connection points of the active edges, for a renderer.
    pub fn edge_anchors(&self) -> HashMap<String, EdgeAnchors> {
        resolve_edge_anchors(&self.store)
    }

    /// Run one full redraw cycle: reconcile the records, translate the
    /// constraints, place ports, then drive the engine, or take the skip
    /// fast path when nothing changed and re-layout was not requested.
    pub fn redraw<F>(
        &mut self,
        nodes: &[A::Node],
        edges: &[A::Edge],
        constraints: &[Constraint],
        cancel: &CancelToken,
        mut on_frame: F,
    ) -> RedrawStats
    where
        F: FnMut(&GraphStore<A>),
    {
        let started = Instant::now();
        let report = self
            .store
            .reconcile(nodes, edges, &self.config.reconcile);

        let skip = !report.changed && !self.config.reconcile.relayout_unchanged;
        let outcome = if skip {
            self.driver.skip(&self.store, &mut on_frame)
        } else {
            let translated = translate(
                constraints,
                &self.store.index_map(),
                &self.config.constraint,
            );
            self.placer.place(&mut self.store);
            let mut links = self.store.engine_links();
            links.extend(translated.extra_links);
            self.driver.run(
                &mut self.store,
                links,
                translated.constraints,
                &self.config.driver,
                cancel,
                &mut on_frame,
            )
        };

        RedrawStats {
            nodes: report.nodes,
            edges: report.edges,
            changed: report.changed,
            outcome,
            elapsed: started.elapsed(),
        }
    }
}
