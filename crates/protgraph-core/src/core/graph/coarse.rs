//! Coarse-grained views over an assembled [`ProteinGraph`].
//!
//! A coarse graph groups fine nodes (chains, or runs of secondary structure) into single
//! nodes. Fine edges between groups accumulate into weighted coarse edges that remember how
//! many fine edges each rule contributed.

use super::attributes::AttributeValue;
use super::ProteinGraph;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoarseGraphError {
    #[error("Node '{node}' has no usable '{attribute}' attribute")]
    MissingAttribute { node: String, attribute: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoarseNode {
    pub id: String,
    pub attributes: BTreeMap<String, AttributeValue>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoarseEdge {
    pub source: usize,
    pub target: usize,
    /// Number of fine edges between the two groups.
    pub weight: usize,
    /// Fine-edge count per contributing rule.
    pub rule_counts: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoarseGraph {
    pub name: String,
    pub nodes: Vec<CoarseNode>,
    pub edges: Vec<CoarseEdge>,
}

impl CoarseGraph {
    pub fn edge(&self, a: usize, b: usize) -> Option<&CoarseEdge> {
        let (source, target) = if a <= b { (a, b) } else { (b, a) };
        self.edges
            .iter()
            .find(|e| e.source == source && e.target == target)
    }

    pub fn node_index(&self, id: &str) -> Option<usize> {
        self.nodes.iter().position(|n| n.id == id)
    }
}

/// Options for [`secondary_structure_graph`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecondaryStructureGraphOptions {
    /// Drop coil (`-`) runs.
    pub remove_coil: bool,
    /// Keep only these SS codes; `None` keeps every code.
    pub allowed: Option<BTreeSet<String>>,
    pub remove_self_loops: bool,
}

impl Default for SecondaryStructureGraphOptions {
    fn default() -> Self {
        Self {
            remove_coil: true,
            allowed: None,
            remove_self_loops: true,
        }
    }
}

/// Numbers consecutive runs of equal labels per label: `[H, H, E, H]` becomes
/// `[H1, H1, E1, H2]`.
pub fn number_groups_of_runs(labels: &[String]) -> Vec<String> {
    let items: Vec<(char, &str)> = labels.iter().map(|l| (' ', l.as_str())).collect();
    numbered_runs(&items)
}

/// Like [`number_groups_of_runs`], but a change of group (chain) also starts a new run.
fn numbered_runs(items: &[(char, &str)]) -> Vec<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut previous: Option<(char, &str)> = None;
    items
        .iter()
        .map(|&(group, label)| {
            let count = counts.entry(label).or_insert(0);
            if previous != Some((group, label)) {
                *count += 1;
            }
            previous = Some((group, label));
            format!("{}{}", label, count)
        })
        .collect()
}

/// Accumulates fine edges into coarse edges given a group index per fine node.
fn accumulate_edges(
    graph: &ProteinGraph,
    group_of: &[Option<usize>],
    remove_self_loops: bool,
) -> Vec<CoarseEdge> {
    let mut edges: BTreeMap<(usize, usize), CoarseEdge> = BTreeMap::new();
    for edge in graph.edges() {
        let (Some(Some(a)), Some(Some(b))) = (group_of.get(edge.source), group_of.get(edge.target))
        else {
            continue;
        };
        let pair = if a <= b { (*a, *b) } else { (*b, *a) };
        if remove_self_loops && pair.0 == pair.1 {
            continue;
        }
        let coarse = edges.entry(pair).or_insert_with(|| CoarseEdge {
            source: pair.0,
            target: pair.1,
            weight: 0,
            rule_counts: BTreeMap::new(),
        });
        coarse.weight += 1;
        for rule in &edge.rules {
            *coarse.rule_counts.entry(rule.clone()).or_insert(0) += 1;
        }
    }
    edges.into_values().collect()
}

/// Collapses a graph to one node per chain.
///
/// Chain nodes carry `num_residues` and `sequence`. Intra-chain edges become self loops
/// unless `remove_self_loops` is set.
pub fn chain_graph(graph: &ProteinGraph, remove_self_loops: bool) -> CoarseGraph {
    let chain_index: HashMap<char, usize> = graph
        .chains()
        .iter()
        .enumerate()
        .map(|(idx, chain)| (chain.id, idx))
        .collect();
    let nodes = graph
        .chains()
        .iter()
        .map(|chain| CoarseNode {
            id: chain.id.to_string(),
            attributes: BTreeMap::from([
                ("num_residues".to_string(), chain.num_residues.into()),
                ("sequence".to_string(), chain.sequence.clone().into()),
            ]),
        })
        .collect();
    let group_of: Vec<Option<usize>> = graph
        .nodes()
        .iter()
        .map(|node| chain_index.get(&node.residue.chain).copied())
        .collect();

    CoarseGraph {
        name: format!("{}_chains", graph.metadata().name),
        nodes,
        edges: accumulate_edges(graph, &group_of, remove_self_loops),
    }
}

/// Collapses a graph to one node per numbered run of secondary structure.
///
/// Every node must carry a textual `ss` attribute; runs are formed in node order and never
/// span chains.
///
/// # Errors
///
/// Returns [`CoarseGraphError::MissingAttribute`] for the first node without `ss`.
pub fn secondary_structure_graph(
    graph: &ProteinGraph,
    options: &SecondaryStructureGraphOptions,
) -> Result<CoarseGraph, CoarseGraphError> {
    let mut items: Vec<(char, &str)> = Vec::with_capacity(graph.node_count());
    for node in graph.nodes() {
        let ss = node
            .attribute("ss")
            .and_then(AttributeValue::as_str)
            .ok_or_else(|| CoarseGraphError::MissingAttribute {
                node: node.id.to_string(),
                attribute: "ss".to_string(),
            })?;
        items.push((node.residue.chain, ss));
    }
    let numbered = numbered_runs(&items);

    let mut nodes: Vec<CoarseNode> = Vec::new();
    let mut node_of_element: HashMap<&str, usize> = HashMap::new();
    let mut group_of = Vec::with_capacity(numbered.len());
    let mut sizes: BTreeMap<usize, usize> = BTreeMap::new();
    for (&(_, code), element) in items.iter().zip(&numbered) {
        let excluded = (options.remove_coil && code == "-")
            || options
                .allowed
                .as_ref()
                .is_some_and(|allowed| !allowed.contains(code));
        if excluded {
            group_of.push(None);
            continue;
        }
        let idx = *node_of_element.entry(element.as_str()).or_insert_with(|| {
            nodes.push(CoarseNode {
                id: element.clone(),
                attributes: BTreeMap::from([("ss".to_string(), code.into())]),
            });
            nodes.len() - 1
        });
        *sizes.entry(idx).or_insert(0) += 1;
        group_of.push(Some(idx));
    }
    for (idx, size) in sizes {
        nodes[idx]
            .attributes
            .insert("num_nodes".to_string(), size.into());
    }

    Ok(CoarseGraph {
        name: format!("{}_secondary_structure", graph.metadata().name),
        nodes,
        edges: accumulate_edges(graph, &group_of, options.remove_self_loops),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::graph::provenance::Provenance;
    use crate::core::graph::tests::{edge, graph, node};
    use crate::core::graph::{
        ChainSummary, GRAPH_SCHEMA_VERSION, GraphMetadata, Granularity, Node,
    };
    use crate::core::models::chain::ChainType;

    fn with_ss(mut node: Node, ss: &str) -> Node {
        node.attributes.insert("ss".to_string(), ss.into());
        node
    }

    fn labels(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn number_groups_of_runs_counts_runs_per_label() {
        assert_eq!(
            number_groups_of_runs(&labels(&["H", "H", "E", "H", "-", "E", "E"])),
            labels(&["H1", "H1", "E1", "H2", "-1", "E2", "E2"])
        );
        assert!(number_groups_of_runs(&[]).is_empty());
    }

    fn chain(id: char, sequence: &str) -> ChainSummary {
        ChainSummary {
            id,
            chain_type: ChainType::Protein,
            sequence: sequence.to_string(),
            num_residues: sequence.len(),
            attributes: BTreeMap::new(),
        }
    }

    #[test]
    fn chain_graph_accumulates_rule_counts() {
        let nodes = vec![node('A', 1, "ALA"), node('A', 2, "GLY"), node('B', 1, "SER")];
        let edges = [
            edge(0, 1, &["peptide_bond"]),
            edge(0, 2, &["distance_threshold", "ionic"]),
            edge(1, 2, &["distance_threshold"]),
        ];
        let metadata = GraphMetadata {
            name: "dimer".to_string(),
            granularity: Granularity::Residue,
            schema_version: GRAPH_SCHEMA_VERSION,
            attributes: BTreeMap::new(),
        };
        let g = ProteinGraph::new(
            metadata,
            vec![chain('A', "AG"), chain('B', "S")],
            nodes,
            edges.into_iter().map(|e| (e.pair(), e)).collect(),
            Provenance::default(),
        );

        let with_loops = chain_graph(&g, false);
        assert_eq!(with_loops.name, "dimer_chains");
        assert_eq!(with_loops.nodes.len(), 2);
        assert_eq!(with_loops.nodes[0].attributes["sequence"], AttributeValue::from("AG"));
        assert_eq!(with_loops.nodes[1].attributes["num_residues"], AttributeValue::Int(1));
        assert_eq!(with_loops.edge(0, 0).unwrap().weight, 1);
        let inter = with_loops.edge(0, 1).unwrap();
        assert_eq!(inter.weight, 2);
        assert_eq!(inter.rule_counts["distance_threshold"], 2);
        assert_eq!(inter.rule_counts["ionic"], 1);

        let without_loops = chain_graph(&g, true);
        assert!(without_loops.edge(0, 0).is_none());
        assert_eq!(without_loops.edges.len(), 1);
    }

    #[test]
    fn runs_restart_at_chain_boundaries() {
        let g = graph(
            vec![with_ss(node('A', 1, "ALA"), "H"), with_ss(node('B', 1, "ALA"), "H")],
            vec![edge(0, 1, &["distance_threshold"])],
        );
        let ss = secondary_structure_graph(&g, &SecondaryStructureGraphOptions::default()).unwrap();
        let ids: Vec<&str> = ss.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["H1", "H2"]);
        assert_eq!(ss.edge(0, 1).unwrap().weight, 1);
    }

    #[test]
    fn secondary_structure_graph_groups_runs_and_drops_coil() {
        let g = graph(
            vec![
                with_ss(node('A', 1, "ALA"), "H"),
                with_ss(node('A', 2, "ALA"), "H"),
                with_ss(node('A', 3, "GLY"), "-"),
                with_ss(node('A', 4, "VAL"), "E"),
                with_ss(node('A', 5, "ILE"), "H"),
            ],
            vec![
                edge(0, 1, &["peptide_bond"]),
                edge(0, 3, &["distance_threshold"]),
                edge(1, 3, &["distance_threshold", "hydrogen_bond"]),
                edge(2, 3, &["peptide_bond"]),
                edge(3, 4, &["peptide_bond"]),
            ],
        );
        let ss = secondary_structure_graph(&g, &SecondaryStructureGraphOptions::default()).unwrap();

        let ids: Vec<&str> = ss.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["H1", "E1", "H2"]);
        assert_eq!(ss.nodes[0].attributes["num_nodes"], AttributeValue::Int(2));

        let helix_strand = ss.edge(0, 1).unwrap();
        assert_eq!(helix_strand.weight, 2);
        assert_eq!(helix_strand.rule_counts["distance_threshold"], 2);
        assert_eq!(helix_strand.rule_counts["hydrogen_bond"], 1);
        assert!(ss.edge(0, 0).is_none());
        assert_eq!(ss.edge(1, 2).unwrap().weight, 1);
    }

    #[test]
    fn secondary_structure_graph_respects_allowed_elements() {
        let g = graph(
            vec![with_ss(node('A', 1, "ALA"), "H"), with_ss(node('A', 2, "VAL"), "E")],
            vec![edge(0, 1, &["peptide_bond"])],
        );
        let options = SecondaryStructureGraphOptions {
            allowed: Some(BTreeSet::from(["E".to_string()])),
            ..SecondaryStructureGraphOptions::default()
        };
        let ss = secondary_structure_graph(&g, &options).unwrap();
        assert_eq!(ss.nodes.len(), 1);
        assert!(ss.edges.is_empty());
    }

    #[test]
    fn secondary_structure_graph_requires_ss_on_every_node() {
        let g = graph(vec![node('A', 1, "ALA")], Vec::new());
        assert_eq!(
            secondary_structure_graph(&g, &SecondaryStructureGraphOptions::default()),
            Err(CoarseGraphError::MissingAttribute {
                node: "A:ALA:1".to_string(),
                attribute: "ss".to_string()
            })
        );
    }
}
