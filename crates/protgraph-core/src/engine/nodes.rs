use super::config::{MissingAtomPolicy, NodePosition};
use crate::core::graph::{Granularity, NodeId};
use crate::core::models::ids::{AtomId, ResidueId};
use crate::core::models::residue::ResidueKey;
use crate::core::models::structure::{AtomFallback, MissingAtomError, Structure};
use nalgebra::Point3;
use std::collections::HashMap;
use tracing::{debug, warn};

/// One node of the layout, before attributes are attached.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutNode {
    pub id: NodeId,
    pub residue_id: ResidueId,
    pub key: ResidueKey,
    /// The atom the node stands for, or whose position represents the residue.
    /// `None` for centroid positions.
    pub atom_id: Option<AtomId>,
    pub position: Point3<f64>,
}

/// The ordered node set of a graph and the lookups edge strategies need.
///
/// Nodes follow structure order: chains, then residues, then atoms, each in parse order.
/// At atom granularity only the first atom of each name in a residue becomes a node.
#[derive(Debug, Clone, Default)]
pub struct NodeLayout {
    granularity: Granularity,
    nodes: Vec<LayoutNode>,
    by_residue: HashMap<ResidueId, Vec<usize>>,
    excluded: Vec<String>,
}

impl NodeLayout {
    /// Lays out nodes for a structure.
    ///
    /// # Errors
    ///
    /// Returns [`MissingAtomError`] when a residue position cannot be resolved under
    /// [`MissingAtomPolicy::Fail`].
    pub fn build(
        structure: &Structure,
        granularity: Granularity,
        position: &NodePosition,
        policy: MissingAtomPolicy,
    ) -> Result<Self, MissingAtomError> {
        let mut layout = NodeLayout {
            granularity,
            ..NodeLayout::default()
        };

        for (residue_id, residue) in structure.residues_iter() {
            let Some(key) = structure.residue_key(residue_id) else {
                continue;
            };
            match granularity {
                Granularity::Atom => {
                    for (atom_id, atom) in structure.residue_atoms(residue_id) {
                        // Node ids are unique per atom name; later alternates of a name are
                        // not laid out.
                        if residue.get_atom_id_by_name(&atom.name) != Some(atom_id) {
                            debug!(
                                residue = %structure.residue_label(residue_id),
                                atom = %atom.name,
                                alt_loc = ?atom.alt_loc,
                                "Skipping repeated atom name"
                            );
                            continue;
                        }
                        layout.push(LayoutNode {
                            id: NodeId::atom(&key, &residue.name, &atom.name),
                            residue_id,
                            key,
                            atom_id: Some(atom_id),
                            position: atom.position,
                        });
                    }
                }
                Granularity::Residue => {
                    let resolved = match position {
                        NodePosition::Representative { atom, fallback } => {
                            let named = |name: &str| residue.get_atom_id_by_name(name);
                            let atom_id = named(atom).or_else(|| match fallback {
                                AtomFallback::Atom(alternative) => named(alternative),
                                _ => None,
                            });
                            structure
                                .coordinate(residue_id, atom, fallback)
                                .map(|pos| (atom_id, pos))
                        }
                        NodePosition::Centroid => structure
                            .centroid(residue_id)
                            .map(|pos| (None, pos))
                            .ok_or_else(|| MissingAtomError {
                                residue: structure.residue_label(residue_id),
                                atom: "centroid".to_string(),
                            }),
                    };
                    match resolved {
                        Ok((atom_id, pos)) => layout.push(LayoutNode {
                            id: NodeId::residue(&key, &residue.name),
                            residue_id,
                            key,
                            atom_id,
                            position: pos,
                        }),
                        Err(err) if policy == MissingAtomPolicy::ExcludeNode => {
                            warn!(node = %err.residue, atom = %err.atom, "Excluding node without position");
                            layout.excluded.push(structure.residue_label(residue_id));
                        }
                        Err(err) => return Err(err),
                    }
                }
            }
        }
        Ok(layout)
    }

    fn push(&mut self, node: LayoutNode) {
        self.by_residue
            .entry(node.residue_id)
            .or_default()
            .push(self.nodes.len());
        self.nodes.push(node);
    }

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    pub fn nodes(&self) -> &[LayoutNode] {
        &self.nodes
    }

    pub fn node(&self, index: usize) -> Option<&LayoutNode> {
        self.nodes.get(index)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Labels of residues excluded for lack of a position.
    pub fn excluded(&self) -> &[String] {
        &self.excluded
    }

    pub fn positions(&self) -> Vec<Point3<f64>> {
        self.nodes.iter().map(|node| node.position).collect()
    }

    /// Indices of all nodes belonging to a residue.
    pub fn nodes_of_residue(&self, residue_id: ResidueId) -> &[usize] {
        self.by_residue
            .get(&residue_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Maps a residue to the node a residue-level rule should connect.
    ///
    /// At residue granularity this is the residue's node. At atom granularity it is the node
    /// of the atom named `atom_hint`; without a hint there is no single node and `None` is
    /// returned.
    pub fn residue_node(
        &self,
        structure: &Structure,
        residue_id: ResidueId,
        atom_hint: Option<&str>,
    ) -> Option<usize> {
        let candidates = self.nodes_of_residue(residue_id);
        match self.granularity {
            Granularity::Residue => candidates.first().copied(),
            Granularity::Atom => {
                let atom_id = structure
                    .residue(residue_id)?
                    .get_atom_id_by_name(atom_hint?)?;
                candidates
                    .iter()
                    .copied()
                    .find(|&idx| self.nodes[idx].atom_id == Some(atom_id))
            }
        }
    }
}
