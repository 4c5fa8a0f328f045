//! # Graph Model
//!
//! The assembled, immutable graph handed to consumers. Nodes keep structure order, edges are
//! unique per unordered node pair and sorted by pair, and every collection that could depend on
//! evaluation order is a sorted map. Serialising the same graph twice yields identical bytes.

pub mod attributes;
pub mod coarse;
pub mod provenance;

use crate::core::models::chain::ChainType;
use crate::core::models::residue::ResidueKey;
use attributes::AttributeValue;
use provenance::Provenance;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

/// Version of the serialised graph layout; bumped whenever node, edge or metadata fields change.
pub const GRAPH_SCHEMA_VERSION: u32 = 1;

/// Whether nodes stand for residues or for individual atoms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    #[default]
    Residue,
    Atom,
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Granularity::Residue => write!(f, "residue"),
            Granularity::Atom => write!(f, "atom"),
        }
    }
}

/// Stable node identifier: `chain:RES:number[insertion]` for residues, with `:ATOM`
/// appended for atoms (e.g. `A:ALA:12`, `A:GLY:100A:CA`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn residue(key: &ResidueKey, residue_name: &str) -> Self {
        let mut id = format!("{}:{}:{}", key.chain, residue_name, key.number);
        if let Some(code) = key.insertion_code {
            id.push(code);
        }
        NodeId(id)
    }

    pub fn atom(key: &ResidueKey, residue_name: &str, atom_name: &str) -> Self {
        let NodeId(mut id) = Self::residue(key, residue_name);
        id.push(':');
        id.push_str(atom_name);
        NodeId(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    pub id: NodeId,
    #[serde(skip)]
    pub residue: ResidueKey,
    pub attributes: BTreeMap<String, AttributeValue>,
}

impl Node {
    pub fn attribute(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name)
    }
}

/// An undirected edge between two node indices, `source < target`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Edge {
    pub source: usize,
    pub target: usize,
    /// Names of every rule that produced this pair.
    pub rules: BTreeSet<String>,
    /// Per-rule metadata, keyed by rule name.
    pub metadata: BTreeMap<String, BTreeMap<String, AttributeValue>>,
}

impl Edge {
    pub fn has_rule(&self, rule: &str) -> bool {
        self.rules.contains(rule)
    }

    pub fn pair(&self) -> (usize, usize) {
        (self.source, self.target)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChainSummary {
    pub id: char,
    pub chain_type: ChainType,
    pub sequence: String,
    pub num_residues: usize,
    /// Chain-scope annotations.
    pub attributes: BTreeMap<String, AttributeValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphMetadata {
    pub name: String,
    pub granularity: Granularity,
    pub schema_version: u32,
    /// Structure-scope annotations.
    pub attributes: BTreeMap<String, AttributeValue>,
}

/// The assembled graph of one structure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProteinGraph {
    metadata: GraphMetadata,
    chains: Vec<ChainSummary>,
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    provenance: Provenance,
    #[serde(skip)]
    node_index: HashMap<NodeId, usize>,
    #[serde(skip)]
    edge_index: BTreeMap<(usize, usize), usize>,
}

impl ProteinGraph {
    /// Creates a graph from already merged parts; `edges` must be keyed by normalised pair.
    pub(crate) fn new(
        metadata: GraphMetadata,
        chains: Vec<ChainSummary>,
        nodes: Vec<Node>,
        edges: BTreeMap<(usize, usize), Edge>,
        provenance: Provenance,
    ) -> Self {
        let node_index = nodes
            .iter()
            .enumerate()
            .map(|(idx, node)| (node.id.clone(), idx))
            .collect();
        let edges: Vec<Edge> = edges.into_values().collect();
        let edge_index = edges
            .iter()
            .enumerate()
            .map(|(idx, edge)| (edge.pair(), idx))
            .collect();
        Self {
            metadata,
            chains,
            nodes,
            edges,
            provenance,
            node_index,
            edge_index,
        }
    }

    pub fn metadata(&self) -> &GraphMetadata {
        &self.metadata
    }

    pub fn chains(&self) -> &[ChainSummary] {
        &self.chains
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, index: usize) -> Option<&Node> {
        self.nodes.get(index)
    }

    pub fn node_index(&self, id: &NodeId) -> Option<usize> {
        self.node_index.get(id).copied()
    }

    /// Edges in ascending `(source, target)` order.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Looks up the edge between two nodes in either orientation.
    pub fn edge(&self, a: usize, b: usize) -> Option<&Edge> {
        let pair = if a <= b { (a, b) } else { (b, a) };
        self.edge_index.get(&pair).map(|&idx| &self.edges[idx])
    }

    /// Indices of the nodes adjacent to `index`, ascending.
    pub fn neighbors(&self, index: usize) -> Vec<usize> {
        let mut neighbors: Vec<usize> = self
            .edges
            .iter()
            .filter_map(|edge| match edge.pair() {
                (s, t) if s == index => Some(t),
                (s, t) if t == index => Some(s),
                _ => None,
            })
            .collect();
        neighbors.sort_unstable();
        neighbors
    }

    pub fn provenance(&self) -> &Provenance {
        &self.provenance
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }
}
