//! Chemistry-conditioned residue interactions.
//!
//! Each rule first selects residues by chemistry, then measures a rule-specific distance for
//! every selected pair. At atom granularity the edge joins the atoms that realise the
//! measurement.

use super::{EdgeCandidate, EdgeContext, EdgeStrategy};
use crate::core::chemistry;
use crate::core::models::atom::{Atom, AtomRole};
use crate::core::models::ids::ResidueId;
use crate::core::models::residue::Residue;
use crate::core::models::structure::Structure;
use crate::core::utils::geometry;
use crate::engine::config::EdgeRule;
use crate::engine::error::GraphError;
use itertools::Itertools;
use nalgebra::Point3;

/// Closest atoms of two residues: distance and the two atom names.
struct Contact<'a> {
    distance: f64,
    first: &'a str,
    second: &'a str,
}

/// Side-chain heavy atoms, or every heavy atom for residues without a side chain.
fn contact_atoms<'a>(structure: &'a Structure, residue_id: ResidueId) -> Vec<&'a Atom> {
    let heavy: Vec<&Atom> = structure
        .residue_atoms(residue_id)
        .map(|(_, atom)| atom)
        .filter(|atom| atom.role != AtomRole::Hydrogen)
        .collect();
    let sidechain: Vec<&Atom> = heavy
        .iter()
        .copied()
        .filter(|atom| atom.role == AtomRole::Sidechain)
        .collect();
    if sidechain.is_empty() { heavy } else { sidechain }
}

fn closest_contact<'a>(first: &[&'a Atom], second: &[&'a Atom]) -> Option<Contact<'a>> {
    first
        .iter()
        .cartesian_product(second.iter())
        .map(|(&a, &b)| Contact {
            distance: geometry::distance(&a.position, &b.position),
            first: a.name.as_str(),
            second: b.name.as_str(),
        })
        .min_by(|x, y| x.distance.total_cmp(&y.distance))
}

fn select_residues<'a>(
    structure: &'a Structure,
    predicate: impl Fn(&Residue) -> bool,
) -> Vec<(ResidueId, &'a Residue)> {
    structure
        .residues_iter()
        .filter(|(_, residue)| predicate(residue))
        .collect()
}

/// Pushes an edge between two residues, mapped through the layout with per-side atom hints.
fn push_edge(
    context: &EdgeContext<'_>,
    candidates: &mut Vec<EdgeCandidate>,
    rule: &str,
    (first, first_atom): (ResidueId, &str),
    (second, second_atom): (ResidueId, &str),
    distance: f64,
) {
    let layout = context.layout;
    let source = layout.residue_node(context.structure, first, Some(first_atom));
    let target = layout.residue_node(context.structure, second, Some(second_atom));
    if let (Some(source), Some(target)) = (source, target) {
        candidates.extend(
            EdgeCandidate::new(source, target, rule).map(|c| c.with_metadata("distance", distance)),
        );
    }
}

/// Contacts between hydrophobic residues.
#[derive(Debug, Clone, Copy)]
pub struct HydrophobicStrategy {
    pub cutoff: f64,
}

impl EdgeStrategy for HydrophobicStrategy {
    fn name(&self) -> &str {
        EdgeRule::HYDROPHOBIC
    }

    fn build_edges(&self, context: &EdgeContext<'_>) -> Result<Vec<EdgeCandidate>, GraphError> {
        let structure = context.structure;
        let residues = select_residues(structure, |r| chemistry::is_hydrophobic(&r.name));
        let mut candidates = Vec::new();
        for ((a, _), (b, _)) in residues.iter().tuple_combinations() {
            let contact = closest_contact(&contact_atoms(structure, *a), &contact_atoms(structure, *b));
            if let Some(contact) = contact.filter(|c| c.distance <= self.cutoff) {
                push_edge(
                    context,
                    &mut candidates,
                    self.name(),
                    (*a, contact.first),
                    (*b, contact.second),
                    contact.distance,
                );
            }
        }
        Ok(candidates)
    }
}

/// Disulfide bridges between cysteine `SG` atoms.
#[derive(Debug, Clone, Copy)]
pub struct DisulfideStrategy {
    pub cutoff: f64,
}

impl EdgeStrategy for DisulfideStrategy {
    fn name(&self) -> &str {
        EdgeRule::DISULFIDE
    }

    fn build_edges(&self, context: &EdgeContext<'_>) -> Result<Vec<EdgeCandidate>, GraphError> {
        let structure = context.structure;
        let sulfurs: Vec<(ResidueId, Point3<f64>)> =
            select_residues(structure, |r| chemistry::parent_residue(&r.name) == "CYS")
                .into_iter()
                .filter_map(|(id, _)| structure.atom_by_name(id, "SG").map(|sg| (id, sg.position)))
                .collect();

        let mut candidates = Vec::new();
        for ((a, sg_a), (b, sg_b)) in sulfurs.iter().tuple_combinations() {
            let distance = geometry::distance(sg_a, sg_b);
            if distance <= self.cutoff {
                push_edge(context, &mut candidates, self.name(), (*a, "SG"), (*b, "SG"), distance);
            }
        }
        Ok(candidates)
    }
}

/// Salt bridges between residues of opposite formal charge.
#[derive(Debug, Clone, Copy)]
pub struct IonicStrategy {
    pub cutoff: f64,
}

impl EdgeStrategy for IonicStrategy {
    fn name(&self) -> &str {
        EdgeRule::IONIC
    }

    fn build_edges(&self, context: &EdgeContext<'_>) -> Result<Vec<EdgeCandidate>, GraphError> {
        let structure = context.structure;
        let residues = select_residues(structure, |r| chemistry::charge(&r.name) != 0);
        let mut candidates = Vec::new();
        for ((a, ra), (b, rb)) in residues.iter().tuple_combinations() {
            if chemistry::charge(&ra.name) * chemistry::charge(&rb.name) >= 0 {
                continue;
            }
            let contact = closest_contact(&contact_atoms(structure, *a), &contact_atoms(structure, *b));
            if let Some(contact) = contact.filter(|c| c.distance <= self.cutoff) {
                push_edge(
                    context,
                    &mut candidates,
                    self.name(),
                    (*a, contact.first),
                    (*b, contact.second),
                    contact.distance,
                );
            }
        }
        Ok(candidates)
    }
}

/// Aromatic stacking between ring centroids.
#[derive(Debug, Clone, Copy)]
pub struct AromaticStrategy {
    pub min_distance: f64,
    pub max_distance: f64,
}

impl AromaticStrategy {
    /// Ring centroid and first ring atom name; `None` unless every ring atom is present.
    fn ring(
        structure: &Structure,
        residue_id: ResidueId,
        residue: &Residue,
    ) -> Option<(Point3<f64>, &'static str)> {
        let names = chemistry::aromatic_ring_atoms(&residue.name)?;
        let points = names
            .iter()
            .map(|name| structure.atom_by_name(residue_id, name).map(|atom| atom.position))
            .collect::<Option<Vec<_>>>()?;
        Some((geometry::centroid(&points)?, names.first().copied()?))
    }
}

impl EdgeStrategy for AromaticStrategy {
    fn name(&self) -> &str {
        EdgeRule::AROMATIC
    }

    fn build_edges(&self, context: &EdgeContext<'_>) -> Result<Vec<EdgeCandidate>, GraphError> {
        let structure = context.structure;
        let rings: Vec<(ResidueId, Point3<f64>, &str)> =
            select_residues(structure, |r| chemistry::is_aromatic(&r.name))
                .into_iter()
                .filter_map(|(id, residue)| {
                    Self::ring(structure, id, residue).map(|(centroid, atom)| (id, centroid, atom))
                })
                .collect();

        let mut candidates = Vec::new();
        for ((a, ca, atom_a), (b, cb, atom_b)) in rings.iter().tuple_combinations() {
            let distance = geometry::distance(ca, cb);
            if (self.min_distance..=self.max_distance).contains(&distance) {
                push_edge(context, &mut candidates, self.name(), (*a, *atom_a), (*b, *atom_b), distance);
            }
        }
        Ok(candidates)
    }
}
