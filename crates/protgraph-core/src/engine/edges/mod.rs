//! Edge construction strategies.
//!
//! Each strategy inspects the structure, the node layout and the applied annotations and
//! proposes [`EdgeCandidate`]s. Strategies never see each other's output; the assembler merges
//! all candidates afterwards, so strategies can run in any order or in parallel.

pub mod distance;
pub mod hbond;
pub mod interactions;
pub mod sequence;

use super::annotations::{AnnotationSet, AttributeValue};
use super::error::GraphError;
use super::nodes::NodeLayout;
use crate::core::models::residue::ResidueKey;
use crate::core::models::structure::Structure;
use std::collections::BTreeMap;

/// A proposed undirected edge between two distinct nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeCandidate {
    pair: (usize, usize),
    pub rule: String,
    pub metadata: BTreeMap<String, AttributeValue>,
}

impl EdgeCandidate {
    /// Creates a candidate with the pair normalised to `(lower, higher)`.
    /// Returns `None` for a self pair.
    pub fn new(a: usize, b: usize, rule: &str) -> Option<Self> {
        if a == b {
            return None;
        }
        Some(Self {
            pair: (a.min(b), a.max(b)),
            rule: rule.to_string(),
            metadata: BTreeMap::new(),
        })
    }

    pub fn with_metadata(mut self, key: &str, value: impl Into<AttributeValue>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }

    pub fn pair(&self) -> (usize, usize) {
        self.pair
    }
}

/// Everything a strategy may read.
pub struct EdgeContext<'a> {
    pub structure: &'a Structure,
    pub layout: &'a NodeLayout,
    pub annotations: &'a AnnotationSet,
}

pub trait EdgeStrategy: Send + Sync {
    /// The rule name recorded on every candidate and in provenance.
    fn name(&self) -> &str;

    /// Attributes that must be available before the strategy can run.
    fn requires(&self) -> &[&'static str] {
        &[]
    }

    fn build_edges(&self, context: &EdgeContext<'_>) -> Result<Vec<EdgeCandidate>, GraphError>;
}

/// Whether two residues of the same chain are closer in sequence than `min_separation`.
/// Residues of different chains are never too close.
pub(crate) fn too_close_in_sequence(a: &ResidueKey, b: &ResidueKey, min_separation: usize) -> bool {
    a.chain == b.chain && a.number.abs_diff(b.number) < min_separation
}
