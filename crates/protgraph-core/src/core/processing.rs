//! Structure clean-up applied before graph construction.
//!
//! Processing never mutates its input. It replays the retained records through a fresh
//! [`StructureBuilder`], so the result carries the same invariants as any parsed record.

use super::chemistry;
use super::models::atom::AtomRole;
use super::models::builder::{AtomRecord, MalformedStructureError, StructureBuilder};
use super::models::residue::Residue;
use super::models::structure::Structure;
use std::collections::{BTreeSet, HashSet};
use tracing::debug;

/// Which chains survive processing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ChainSelection {
    #[default]
    All,
    Only(BTreeSet<char>),
}

impl ChainSelection {
    pub fn includes(&self, chain: char) -> bool {
        match self {
            ChainSelection::All => true,
            ChainSelection::Only(chains) => chains.contains(&chain),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessingConfig {
    /// Remove hydrogen and deuterium atoms.
    pub deprotonate: bool,
    /// Keep residues that carry an insertion code.
    pub keep_insertions: bool,
    pub chain_selection: ChainSelection,
    /// Hetero residue names to retain; all other hetero residues and waters are dropped.
    pub keep_hets: BTreeSet<String>,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            deprotonate: true,
            keep_insertions: false,
            chain_selection: ChainSelection::All,
            keep_hets: BTreeSet::new(),
        }
    }
}

impl ProcessingConfig {
    fn keeps_residue(&self, residue: &Residue) -> bool {
        if residue.insertion_code.is_some() && !self.keep_insertions {
            return false;
        }
        if residue.is_hetero || chemistry::is_water(&residue.name) {
            return self.keep_hets.contains(&residue.name);
        }
        true
    }
}

fn keeps_alt_loc(alt_loc: Option<char>) -> bool {
    matches!(alt_loc, None | Some('A'))
}

/// Produces a new record with the configured filters applied.
///
/// Residues left without atoms and chains left without residues disappear; a record
/// filtered down to nothing fails with [`MalformedStructureError::NoChains`].
pub fn process(
    structure: &Structure,
    config: &ProcessingConfig,
) -> Result<Structure, MalformedStructureError> {
    let mut builder = StructureBuilder::new(structure.name());
    let mut dropped_residues = 0usize;
    let mut dropped_atoms = 0usize;

    for (chain_id, chain) in structure.chains() {
        if !config.chain_selection.includes(chain.id) {
            continue;
        }
        let mut chain_started = false;

        for (residue_id, residue) in structure.chain_residues(chain_id) {
            if !config.keeps_residue(residue) {
                dropped_residues += 1;
                continue;
            }

            let mut seen_names = HashSet::new();
            let records: Vec<AtomRecord> = structure
                .residue_atoms(residue_id)
                .filter(|(_, atom)| !(config.deprotonate && atom.role == AtomRole::Hydrogen))
                .filter(|(_, atom)| keeps_alt_loc(atom.alt_loc))
                .filter(|(_, atom)| seen_names.insert(atom.name.clone()))
                .map(|(_, atom)| AtomRecord::from(atom))
                .collect();
            dropped_atoms += residue.atoms().len() - records.len();
            if records.is_empty() {
                dropped_residues += 1;
                continue;
            }

            if !chain_started {
                builder.start_chain(chain.id, chain.chain_type);
                chain_started = true;
            }
            builder.start_residue(
                residue.number,
                residue.insertion_code,
                &residue.name,
                residue.is_hetero,
            );
            for record in records {
                builder.add_atom(record);
            }
        }
    }

    debug!(
        structure = structure.name(),
        dropped_residues, dropped_atoms, "Processed structure"
    );
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::chain::ChainType;
    use crate::core::models::residue::ResidueKey;
    use nalgebra::Point3;

    fn record(name: &str, alt_loc: Option<char>) -> AtomRecord {
        AtomRecord {
            alt_loc,
            ..AtomRecord::new(name, Point3::origin())
        }
    }

    fn raw_structure() -> Structure {
        let mut builder = StructureBuilder::new("raw");
        builder
            .start_chain('A', ChainType::Protein)
            .start_residue(1, None, "SER", false)
            .add_atom(record("N", None))
            .add_atom(record("H", None))
            .add_atom(record("CA", None))
            .add_atom(record("OG", Some('A')))
            .add_atom(record("OG", Some('B')))
            .start_residue(1, Some('A'), "GLY", false)
            .add_atom(record("CA", None))
            .start_residue(2, None, "HEM", true)
            .add_atom(record("FE", None))
            .start_residue(3, None, "HOH", true)
            .add_atom(record("O", None))
            .start_chain('B', ChainType::Protein)
            .start_residue(1, None, "ALA", false)
            .add_atom(record("CA", None));
        builder.build().unwrap()
    }

    fn atom_names(structure: &Structure, key: ResidueKey) -> Vec<String> {
        let residue_id = structure.find_residue(&key).unwrap();
        structure
            .residue_atoms(residue_id)
            .map(|(_, a)| a.name.clone())
            .collect()
    }

    #[test]
    fn default_processing_removes_hydrogens_alt_locs_insertions_and_hets() {
        let processed = process(&raw_structure(), &ProcessingConfig::default()).unwrap();

        assert_eq!(processed.residue_count(), 2);
        assert_eq!(
            atom_names(&processed, ResidueKey::new('A', 1, None)),
            vec!["N", "CA", "OG"]
        );
        assert!(processed.find_residue(&ResidueKey::new('A', 1, Some('A'))).is_none());
        assert!(processed.find_residue(&ResidueKey::new('A', 2, None)).is_none());
        assert!(processed.find_residue(&ResidueKey::new('A', 3, None)).is_none());
    }

    #[test]
    fn keep_hets_and_insertions_retain_requested_residues() {
        let config = ProcessingConfig {
            deprotonate: false,
            keep_insertions: true,
            keep_hets: BTreeSet::from(["HEM".to_string()]),
            ..ProcessingConfig::default()
        };
        let processed = process(&raw_structure(), &config).unwrap();

        assert!(processed.find_residue(&ResidueKey::new('A', 1, Some('A'))).is_some());
        assert!(processed.find_residue(&ResidueKey::new('A', 2, None)).is_some());
        assert!(processed.find_residue(&ResidueKey::new('A', 3, None)).is_none());
        assert_eq!(
            atom_names(&processed, ResidueKey::new('A', 1, None)),
            vec!["N", "H", "CA", "OG"]
        );
    }

    #[test]
    fn chain_selection_keeps_only_listed_chains() {
        let config = ProcessingConfig {
            chain_selection: ChainSelection::Only(BTreeSet::from(['B'])),
            ..ProcessingConfig::default()
        };
        let processed = process(&raw_structure(), &config).unwrap();
        assert_eq!(processed.chain_count(), 1);
        assert!(processed.find_chain('A').is_none());
        assert!(processed.find_chain('B').is_some());
    }

    #[test]
    fn processing_everything_away_is_an_error() {
        let config = ProcessingConfig {
            chain_selection: ChainSelection::Only(BTreeSet::from(['Z'])),
            ..ProcessingConfig::default()
        };
        assert!(matches!(
            process(&raw_structure(), &config),
            Err(MalformedStructureError::NoChains { .. })
        ));
    }
}
