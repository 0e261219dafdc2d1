use crate::engine::IterationBudget;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReconcileConfig {
    /// Annotate edges with a per-pair parallel index.
    pub parallel_edges: bool,
    /// Re-run the engine even when the record sets are byte-identical to
    /// the previous redraw. Off enables the skip fast path.
    pub relayout_unchanged: bool,
    pub default_radius: f32,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            parallel_edges: true,
            relayout_unchanged: true,
            default_radius: 20.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConstraintConfig {
    /// Base link length; a circle constraint without an explicit distance
    /// spaces its ring nodes `4 * base_length` apart.
    pub base_length: f32,
    /// Minimum gap for ordering constraints that do not carry their own.
    pub ordering_gap: f32,
}

impl Default for ConstraintConfig {
    fn default() -> Self {
        Self {
            base_length: 30.0,
            ordering_gap: 20.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PortConfig {
    /// Seed for the unplaced-port angle draw. Unset seeds from OS entropy;
    /// setting it makes redraw sequences reproducible.
    pub seed: Option<u64>,
}

impl Default for PortConfig {
    fn default() -> Self {
        Self { seed: None }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DriverConfig {
    /// Wall-clock limit in seconds for one layout run; 0 means unlimited.
    pub time_limit: f32,
    /// Forward positions to the frame sink on every engine iteration
    /// instead of only once at the end.
    pub show_steps: bool,
    /// Drop the engine's incremental state before every run.
    pub recreate_engine: bool,
    pub budget: IterationBudget,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            time_limit: 0.0,
            show_steps: true,
            recreate_engine: false,
            budget: IterationBudget::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    pub reconcile: ReconcileConfig,
    pub constraint: ConstraintConfig,
    pub ports: PortConfig,
    pub driver: DriverConfig,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let contents = std::fs::read_to_string(path)?;
    let config = match serde_json::from_str(&contents) {
        Ok(config) => config,
        Err(_) => json5::from_str(&contents)?,
    };
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_the_documented_policy() {
        let config = Config::default();
        assert!(config.reconcile.relayout_unchanged);
        assert!(config.reconcile.parallel_edges);
        assert_eq!(config.driver.time_limit, 0.0);
        assert!(!config.driver.recreate_engine);
    }

    #[test]
    fn partial_json_overlays_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"driver": {"timeLimit": 1.5, "showSteps": false}}"#).unwrap();
        assert_eq!(config.driver.time_limit, 1.5);
        assert!(!config.driver.show_steps);
        assert_eq!(config.constraint.base_length, 30.0);
    }

    #[test]
    fn json5_fallback_accepts_lenient_input() {
        let config: Config = json5::from_str("{driver: {timeLimit: 2,},}").unwrap();
        assert_eq!(config.driver.time_limit, 2.0);
    }
}
