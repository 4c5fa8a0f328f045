use serde::Serialize;
use std::collections::BTreeMap;

/// Outcome of one annotation provider for one structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LayerStatus {
    Applied,
    Failed { reason: String },
}

/// Outcome of one edge construction rule for one structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RuleStatus {
    Applied { candidates: usize },
    Skipped { missing: Vec<String> },
}

/// Records which layers and rules contributed to a graph and which nodes were excluded.
///
/// All maps are keyed and ordered by name.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Provenance {
    pub layers: BTreeMap<String, LayerStatus>,
    pub rules: BTreeMap<String, RuleStatus>,
    pub excluded_nodes: Vec<String>,
}

impl Provenance {
    pub fn layer_applied(&self, name: &str) -> bool {
        matches!(self.layers.get(name), Some(LayerStatus::Applied))
    }

    pub fn rule_skipped(&self, name: &str) -> bool {
        matches!(self.rules.get(name), Some(RuleStatus::Skipped { .. }))
    }
}
