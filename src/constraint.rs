use std::collections::HashMap;
use std::f32::consts::PI;

use serde::{Deserialize, Serialize};

use crate::config::ConstraintConfig;
use crate::engine::{AlignmentOffset, Axis, EngineConstraint, EngineLink};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeOffset {
    pub node: String,
    #[serde(default)]
    pub offset: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderedNode {
    pub node: String,
    #[serde(default)]
    pub rank: f32,
}

/// Declarative constraints referencing nodes by key. Unknown tags fail at
/// deserialization instead of being silently ignored. Translation into the
/// engine's index space happens fresh every redraw; these stay immutable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Constraint {
    /// Nodes held on a shared axis line, each at its own offset.
    Alignment { axis: Axis, offsets: Vec<NodeOffset> },
    /// Nodes arranged evenly on a ring. Realized as geometry (wheel links),
    /// not as a solver constraint.
    Circle {
        nodes: Vec<String>,
        #[serde(default)]
        distance: Option<f32>,
    },
    /// Nodes kept in rank order along an axis with a minimum gap.
    Ordering {
        axis: Axis,
        nodes: Vec<OrderedNode>,
        #[serde(default)]
        gap: Option<f32>,
    },
}

#[derive(Debug, Clone, Default)]
pub struct TranslatedConstraints {
    pub constraints: Vec<EngineConstraint>,
    /// Synthetic links added to the active link set, each carrying its own
    /// distance so it does not depend on the engine's length strategy.
    pub extra_links: Vec<EngineLink>,
}

/// Radius of the ring on which `count` nodes spaced `spacing` apart come
/// to rest.
pub fn ring_radius(count: usize, spacing: f32) -> f32 {
    spacing / (2.0 * (PI / count.max(1) as f32).sin())
}

/// Pure transform from key-space constraints to index-space engine inputs.
/// Keys absent from the current node sequence are skipped the same way
/// edges with a missing endpoint are: filtered data is not an error.
pub fn translate(
    constraints: &[Constraint],
    index_of: &HashMap<String, usize>,
    config: &ConstraintConfig,
) -> TranslatedConstraints {
    let mut out = TranslatedConstraints::default();
    for constraint in constraints {
        match constraint {
            Constraint::Alignment { axis, offsets } => {
                let resolved: Vec<AlignmentOffset> = offsets
                    .iter()
                    .filter_map(|entry| {
                        index_of.get(&entry.node).map(|&node| AlignmentOffset {
                            node,
                            offset: entry.offset,
                        })
                    })
                    .collect();
                if !resolved.is_empty() {
                    out.constraints.push(EngineConstraint::Alignment {
                        axis: *axis,
                        offsets: resolved,
                    });
                }
            }
            Constraint::Circle { nodes, distance } => {
                let ring: Vec<usize> = nodes
                    .iter()
                    .filter_map(|key| index_of.get(key).copied())
                    .collect();
                if ring.len() < 2 {
                    continue;
                }
                let spacing = distance.unwrap_or(4.0 * config.base_length);
                for (slot, &source) in ring.iter().enumerate() {
                    let target = ring[(slot + 1) % ring.len()];
                    out.extra_links.push(EngineLink {
                        source,
                        target,
                        distance: Some(spacing),
                    });
                }
            }
            Constraint::Ordering { axis, nodes, gap } => {
                let mut resolved: Vec<(&OrderedNode, usize)> = nodes
                    .iter()
                    .filter_map(|entry| {
                        index_of.get(&entry.node).map(|&index| (entry, index))
                    })
                    .collect();
                resolved.sort_by(|a, b| a.0.rank.total_cmp(&b.0.rank));
                let gap = gap.unwrap_or(config.ordering_gap);
                // n ordered nodes reduce to n-1 adjacent gap constraints.
                for pair in resolved.windows(2) {
                    out.constraints.push(EngineConstraint::Gap {
                        axis: *axis,
                        left: pair[0].1,
                        right: pair[1].1,
                        gap,
                    });
                }
            }
        }
    }
    out
}
