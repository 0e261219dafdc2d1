use serde::{Deserialize, Serialize};

/// Axis a gap or alignment constraint acts along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
}

/// Node as the external solver sees it: a mutable position plus a pin flag.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EngineNode {
    pub x: f32,
    pub y: f32,
    pub fixed: bool,
}

/// Link in the solver's index space. `distance` overrides the engine's own
/// length strategy; synthetic links always carry one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EngineLink {
    pub source: usize,
    pub target: usize,
    pub distance: Option<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AlignmentOffset {
    pub node: usize,
    pub offset: f32,
}

/// The solver's primitive constraint vocabulary. Everything richer is
/// reduced to these before the engine ever sees it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum EngineConstraint {
    Gap {
        axis: Axis,
        left: usize,
        right: usize,
        gap: f32,
    },
    Alignment {
        axis: Axis,
        offsets: Vec<AlignmentOffset>,
    },
}

/// Staged iteration counts handed to the engine when a run begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IterationBudget {
    pub unconstrained: u32,
    pub user_constraints: u32,
    pub all_constraints: u32,
}

impl Default for IterationBudget {
    fn default() -> Self {
        Self {
            unconstrained: 10,
            user_constraints: 15,
            all_constraints: 20,
        }
    }
}

/// Contract of the external iterative layout engine. The engine owns the
/// numeric solve; this crate only feeds it inputs and pumps iterations.
///
/// A run is `begin` followed by repeated `step` calls until `step` returns
/// `false` (converged) or the caller gives up and calls `stop`. Positions
/// are readable between iterations, which is also where cancellation is
/// checked; there is no preemption mid-iteration.
pub trait LayoutEngine {
    fn begin(
        &mut self,
        nodes: Vec<EngineNode>,
        links: Vec<EngineLink>,
        constraints: Vec<EngineConstraint>,
        budget: IterationBudget,
    );

    /// Advance one iteration. Returns `false` once the solve has converged.
    fn step(&mut self) -> bool;

    fn positions(&self) -> &[EngineNode];

    /// Cooperative stop of an unfinished run.
    fn stop(&mut self);

    /// Discard incremental solver state carried between runs. The default
    /// keeps it, which improves continuity across redraws.
    fn reset(&mut self) {}
}
