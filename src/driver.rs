use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

use serde::Serialize;

use crate::config::DriverConfig;
use crate::engine::{EngineConstraint, EngineLink, LayoutEngine};
use crate::graph::{GraphAdapter, GraphStore};

/// Cooperative stop flag shared between a host and an in-flight run. Only
/// checked at iteration boundaries; stopping is best-effort, never
/// preemptive mid-iteration.
#[derive(Clone, Default)]
pub struct CancelToken(Rc<Cell<bool>>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.get()
    }
}

/// How a redraw cycle finished. Exactly one outcome is produced per cycle,
/// and the three cases stay distinguishable for callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LayoutOutcome {
    /// The engine reported convergence on its own.
    Converged,
    /// The time limit or a cancel request stopped the run; positions are
    /// whatever the solve had reached.
    Cancelled,
    /// The graph was byte-identical to the previous redraw and re-layout
    /// was not requested; prior positions are untouched.
    SkippedUnchanged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Idle,
    Running,
}

/// Owns the external engine instance across redraws. Reuse is the default
/// so the engine's incremental solver state carries over between cycles;
/// `DriverConfig::recreate_engine` opts into a fresh solve each time.
pub struct LayoutDriver<E> {
    engine: E,
    state: DriverState,
}

impl<E: LayoutEngine> LayoutDriver<E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            state: DriverState::Idle,
        }
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Hand the reconciled graph to the engine and begin an iterative run
    /// the host pumps one `tick` at a time, interleaving with its own
    /// event loop. Dropping an unfinished run stops the engine first.
    pub fn begin_run<'a, A: GraphAdapter>(
        &'a mut self,
        store: &'a mut GraphStore<A>,
        links: Vec<EngineLink>,
        constraints: Vec<EngineConstraint>,
        config: &DriverConfig,
        cancel: CancelToken,
    ) -> LayoutRun<'a, E, A> {
        if config.recreate_engine {
            self.engine.reset();
        }
        self.state = DriverState::Running;
        self.engine
            .begin(store.engine_nodes(), links, constraints, config.budget);
        LayoutRun {
            engine: &mut self.engine,
            state: &mut self.state,
            store,
            cancel,
            started: Instant::now(),
            time_limit: config.time_limit,
            finished: None,
        }
    }

    /// Run one layout cycle to completion, forwarding positions to
    /// `on_frame` per tick when `show_steps` is set, or exactly once at the
    /// end otherwise. Cancellation still emits that final frame with the
    /// positions reached.
    pub fn run<A, F>(
        &mut self,
        store: &mut GraphStore<A>,
        links: Vec<EngineLink>,
        constraints: Vec<EngineConstraint>,
        config: &DriverConfig,
        cancel: &CancelToken,
        mut on_frame: F,
    ) -> LayoutOutcome
    where
        A: GraphAdapter,
        F: FnMut(&GraphStore<A>),
    {
        let show_steps = config.show_steps;
        let mut run = self.begin_run(store, links, constraints, config, cancel.clone());
        let outcome = loop {
            let finished = run.tick();
            if show_steps {
                on_frame(run.store());
            }
            if let Some(outcome) = finished {
                break outcome;
            }
        };
        drop(run);
        if !show_steps {
            on_frame(store);
        }
        outcome
    }

    /// Fast path for an unchanged graph: emit the completion frame without
    /// invoking the engine, leaving prior positions untouched.
    pub fn skip<A, F>(&self, store: &GraphStore<A>, mut on_frame: F) -> LayoutOutcome
    where
        A: GraphAdapter,
        F: FnMut(&GraphStore<A>),
    {
        on_frame(store);
        LayoutOutcome::SkippedUnchanged
    }
}

/// An in-flight layout cycle: Running until `tick` reports an outcome,
/// after which further ticks are no-ops.
pub struct LayoutRun<'a, E: LayoutEngine, A: GraphAdapter> {
    engine: &'a mut E,
    state: &'a mut DriverState,
    store: &'a mut GraphStore<A>,
    cancel: CancelToken,
    started: Instant,
    time_limit: f32,
    finished: Option<LayoutOutcome>,
}

impl<E: LayoutEngine, A: GraphAdapter> LayoutRun<'_, E, A> {
    /// Advance one engine iteration and sync positions back into the
    /// wrappers. Returns the outcome once the run has ended.
    pub fn tick(&mut self) -> Option<LayoutOutcome> {
        if self.finished.is_some() {
            return self.finished;
        }
        let converging = self.engine.step();
        self.store.apply_positions(self.engine.positions());
        if !converging {
            self.finished = Some(LayoutOutcome::Converged);
        } else {
            let out_of_time = self.time_limit > 0.0
                && self.started.elapsed().as_secs_f32() >= self.time_limit;
            if self.cancel.is_cancelled() || out_of_time {
                self.engine.stop();
                self.store.apply_positions(self.engine.positions());
                self.finished = Some(LayoutOutcome::Cancelled);
            }
        }
        if self.finished.is_some() {
            *self.state = DriverState::Idle;
        }
        self.finished
    }

    pub fn store(&self) -> &GraphStore<A> {
        self.store
    }
}

impl<E: LayoutEngine, A: GraphAdapter> Drop for LayoutRun<'_, E, A> {
    fn drop(&mut self) {
        // An abandoned run is stopped before anything else may start.
        if self.finished.is_none() {
            self.engine.stop();
        }
        *self.state = DriverState::Idle;
    }
}
