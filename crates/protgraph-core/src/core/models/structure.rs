use super::atom::Atom;
use super::chain::Chain;
use super::ids::{AtomId, ChainId, ResidueId};
use super::residue::{Residue, ResidueKey};
use crate::core::chemistry;
use crate::core::utils::geometry;
use nalgebra::Point3;
use slotmap::SlotMap;
use std::collections::HashMap;
use thiserror::Error;

/// Raised when a requested atom is absent and the fallback policy cannot supply a position.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Atom '{atom}' is missing from residue {residue} and no fallback applies")]
pub struct MissingAtomError {
    pub residue: String,
    pub atom: String,
}

/// Policy applied when a requested atom is absent from a residue.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AtomFallback {
    /// Fail with [`MissingAtomError`].
    #[default]
    Strict,
    /// Use the named representative atom instead (e.g. `CA`).
    Atom(String),
    /// Use the centroid of all atoms of the residue.
    Centroid,
}

/// The immutable, validated in-memory representation of a parsed structure.
///
/// A `Structure` can only be produced by [`StructureBuilder`](super::builder::StructureBuilder),
/// which enforces the record invariants: at least one chain, no empty chains, no empty
/// residues, unique residue identifiers within a chain and non-decreasing residue numbers.
/// All accessors are read-only and iterate in parse order.
#[derive(Debug, Clone, Default)]
pub struct Structure {
    pub(super) name: String,
    pub(super) atoms: SlotMap<AtomId, Atom>,
    pub(super) residues: SlotMap<ResidueId, Residue>,
    pub(super) chains: SlotMap<ChainId, Chain>,
    /// Chains in the order they were first seen.
    pub(super) chain_order: Vec<ChainId>,
    pub(super) chain_id_map: HashMap<char, ChainId>,
    pub(super) residue_key_map: HashMap<ResidueKey, ResidueId>,
}

impl Structure {
    /// The identifier of the structure (PDB code or file stem).
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn chain_count(&self) -> usize {
        self.chain_order.len()
    }

    pub fn residue_count(&self) -> usize {
        self.residues.len()
    }

    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    pub fn atom(&self, id: AtomId) -> Option<&Atom> {
        self.atoms.get(id)
    }

    pub fn residue(&self, id: ResidueId) -> Option<&Residue> {
        self.residues.get(id)
    }

    pub fn chain(&self, id: ChainId) -> Option<&Chain> {
        self.chains.get(id)
    }

    /// Iterates over chains in parse order.
    pub fn chains(&self) -> impl Iterator<Item = (ChainId, &Chain)> {
        self.chain_order
            .iter()
            .filter_map(|&id| self.chains.get(id).map(|chain| (id, chain)))
    }

    /// Iterates over the residues of one chain in parse order.
    pub fn chain_residues(&self, chain_id: ChainId) -> impl Iterator<Item = (ResidueId, &Residue)> {
        self.chains
            .get(chain_id)
            .map(|chain| chain.residues())
            .unwrap_or_default()
            .iter()
            .filter_map(|&id| self.residues.get(id).map(|residue| (id, residue)))
    }

    /// Iterates over every residue of the structure, chain by chain, in parse order.
    pub fn residues_iter(&self) -> impl Iterator<Item = (ResidueId, &Residue)> {
        self.chain_order
            .iter()
            .flat_map(move |&chain_id| self.chain_residues(chain_id))
    }

    /// Iterates over the atoms of one residue in parse order.
    pub fn residue_atoms(&self, residue_id: ResidueId) -> impl Iterator<Item = (AtomId, &Atom)> {
        self.residues
            .get(residue_id)
            .map(|residue| residue.atoms())
            .unwrap_or_default()
            .iter()
            .filter_map(|&id| self.atoms.get(id).map(|atom| (id, atom)))
    }

    pub fn atom_by_name(&self, residue_id: ResidueId, name: &str) -> Option<&Atom> {
        self.residues
            .get(residue_id)
            .and_then(|residue| residue.get_atom_id_by_name(name))
            .and_then(|atom_id| self.atoms.get(atom_id))
    }

    pub fn find_chain(&self, id: char) -> Option<ChainId> {
        self.chain_id_map.get(&id).copied()
    }

    pub fn find_residue(&self, key: &ResidueKey) -> Option<ResidueId> {
        self.residue_key_map.get(key).copied()
    }

    pub fn residue_key(&self, residue_id: ResidueId) -> Option<ResidueKey> {
        let residue = self.residues.get(residue_id)?;
        let chain = self.chains.get(residue.chain_id)?;
        Some(ResidueKey::new(
            chain.id,
            residue.number,
            residue.insertion_code,
        ))
    }

    /// A human-readable label such as `A:ALA:12`, used in error messages and node identifiers.
    pub fn residue_label(&self, residue_id: ResidueId) -> String {
        match (self.residue(residue_id), self.residue_key(residue_id)) {
            (Some(residue), Some(key)) => {
                let mut label = format!("{}:{}:{}", key.chain, residue.name, key.number);
                if let Some(code) = key.insertion_code {
                    label.push(code);
                }
                label
            }
            _ => "<unknown residue>".to_string(),
        }
    }

    /// Resolves the coordinate of `atom_name` in a residue, applying `fallback` when the
    /// atom is absent.
    ///
    /// # Errors
    ///
    /// Returns [`MissingAtomError`] when neither the atom nor its fallback can be resolved.
    pub fn coordinate(
        &self,
        residue_id: ResidueId,
        atom_name: &str,
        fallback: &AtomFallback,
    ) -> Result<Point3<f64>, MissingAtomError> {
        if let Some(atom) = self.atom_by_name(residue_id, atom_name) {
            return Ok(atom.position);
        }
        let resolved = match fallback {
            AtomFallback::Strict => None,
            AtomFallback::Atom(name) => self.atom_by_name(residue_id, name).map(|a| a.position),
            AtomFallback::Centroid => self.centroid(residue_id),
        };
        resolved.ok_or_else(|| MissingAtomError {
            residue: self.residue_label(residue_id),
            atom: atom_name.to_string(),
        })
    }

    /// The mean position of all atoms of a residue.
    pub fn centroid(&self, residue_id: ResidueId) -> Option<Point3<f64>> {
        let positions: Vec<Point3<f64>> = self
            .residue_atoms(residue_id)
            .map(|(_, atom)| atom.position)
            .collect();
        geometry::centroid(&positions)
    }

    /// The one-letter sequence of a chain.
    ///
    /// Modified residues map to their parent amino acid, unknown polymer residues to `X`;
    /// unknown hetero residues (ligands, waters) are not part of the sequence.
    pub fn sequence(&self, chain_id: ChainId) -> String {
        self.chain_residues(chain_id)
            .filter_map(|(_, residue)| match chemistry::one_letter_code(&residue.name) {
                Some(code) => Some(code),
                None if residue.is_hetero => None,
                None => Some('X'),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::builder::{AtomRecord, StructureBuilder};
    use crate::core::models::chain::ChainType;

    fn two_residue_structure() -> Structure {
        let mut builder = StructureBuilder::new("test");
        builder
            .start_chain('A', ChainType::Protein)
            .start_residue(1, None, "GLY", false)
            .add_atom(AtomRecord::new("N", Point3::new(0.0, 0.0, 0.0)))
            .add_atom(AtomRecord::new("CA", Point3::new(1.0, 0.0, 0.0)))
            .start_residue(2, None, "ALA", false)
            .add_atom(AtomRecord::new("N", Point3::new(2.0, 0.0, 0.0)))
            .add_atom(AtomRecord::new("CB", Point3::new(4.0, 0.0, 0.0)));
        builder.build().unwrap()
    }

    fn residue(structure: &Structure, number: isize) -> ResidueId {
        structure
            .find_residue(&ResidueKey::new('A', number, None))
            .unwrap()
    }

    #[test]
    fn coordinate_returns_requested_atom_when_present() {
        let structure = two_residue_structure();
        let pos = structure
            .coordinate(residue(&structure, 1), "CA", &AtomFallback::Strict)
            .unwrap();
        assert_eq!(pos, Point3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn coordinate_fails_strictly_when_atom_is_absent() {
        let structure = two_residue_structure();
        let err = structure
            .coordinate(residue(&structure, 2), "CA", &AtomFallback::Strict)
            .unwrap_err();
        assert_eq!(err.residue, "A:ALA:2");
        assert_eq!(err.atom, "CA");
    }

    #[test]
    fn coordinate_uses_named_fallback_atom() {
        let structure = two_residue_structure();
        let pos = structure
            .coordinate(
                residue(&structure, 2),
                "CA",
                &AtomFallback::Atom("N".to_string()),
            )
            .unwrap();
        assert_eq!(pos, Point3::new(2.0, 0.0, 0.0));
    }

    #[test]
    fn coordinate_fails_when_fallback_atom_is_also_absent() {
        let structure = two_residue_structure();
        let result = structure.coordinate(
            residue(&structure, 2),
            "CA",
            &AtomFallback::Atom("C".to_string()),
        );
        assert!(result.is_err());
    }

    #[test]
    fn coordinate_uses_centroid_fallback() {
        let structure = two_residue_structure();
        let pos = structure
            .coordinate(residue(&structure, 2), "CA", &AtomFallback::Centroid)
            .unwrap();
        assert_eq!(pos, Point3::new(3.0, 0.0, 0.0));
    }

    #[test]
    fn accessors_iterate_in_parse_order() {
        let structure = two_residue_structure();
        let names: Vec<_> = structure
            .residues_iter()
            .map(|(_, r)| r.name.as_str())
            .collect();
        assert_eq!(names, vec!["GLY", "ALA"]);

        let atoms: Vec<_> = structure
            .residue_atoms(residue(&structure, 2))
            .map(|(_, a)| a.name.as_str())
            .collect();
        assert_eq!(atoms, vec!["N", "CB"]);
        assert_eq!(structure.chain_count(), 1);
        assert_eq!(structure.residue_count(), 2);
        assert_eq!(structure.atom_count(), 4);
    }

    #[test]
    fn sequence_maps_modified_and_unknown_residues() {
        let mut builder = StructureBuilder::new("seq");
        builder
            .start_chain('A', ChainType::Protein)
            .start_residue(1, None, "MSE", true)
            .add_atom(AtomRecord::new("CA", Point3::origin()))
            .start_residue(2, None, "LYS", false)
            .add_atom(AtomRecord::new("CA", Point3::origin()))
            .start_residue(3, None, "XYZ", false)
            .add_atom(AtomRecord::new("CA", Point3::origin()))
            .start_residue(4, None, "HOH", true)
            .add_atom(AtomRecord::new("O", Point3::origin()));
        let structure = builder.build().unwrap();
        let chain_id = structure.find_chain('A').unwrap();
        assert_eq!(structure.sequence(chain_id), "MKX");
    }
}
