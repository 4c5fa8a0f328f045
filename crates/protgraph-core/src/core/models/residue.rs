use super::ids::{AtomId, ChainId};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// The stable identity of a residue: chain, sequence number and insertion code.
///
/// Keys order by chain identifier, then number, then insertion code (no code first),
/// and are what annotation layers use to address residues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ResidueKey {
    pub chain: char,
    pub number: isize,
    pub insertion_code: Option<char>,
}

impl ResidueKey {
    pub fn new(chain: char, number: isize, insertion_code: Option<char>) -> Self {
        Self {
            chain,
            number,
            insertion_code,
        }
    }
}

impl fmt::Display for ResidueKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.chain, self.number)?;
        if let Some(code) = self.insertion_code {
            write!(f, "{}", code)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Residue {
    pub number: isize,                      // Residue sequence number from source file
    pub insertion_code: Option<char>,       // PDB insertion code, if any
    pub name: String,                       // Name of the residue (e.g., "ALA", "GLY")
    pub chain_id: ChainId,                  // ID of the parent chain
    pub is_hetero: bool,                    // Whether the residue came from HETATM records
    pub(crate) atoms: Vec<AtomId>,          // Atoms of this residue in parse order
    atom_name_map: HashMap<String, AtomId>, // Map from atom name to its first stable ID
}

impl Residue {
    pub(crate) fn new(
        number: isize,
        insertion_code: Option<char>,
        name: &str,
        chain_id: ChainId,
        is_hetero: bool,
    ) -> Self {
        Self {
            number,
            insertion_code,
            name: name.to_string(),
            chain_id,
            is_hetero,
            atoms: Vec::new(),
            atom_name_map: HashMap::new(),
        }
    }

    pub(crate) fn add_atom(&mut self, atom_name: &str, atom_id: AtomId) {
        self.atoms.push(atom_id);
        self.atom_name_map
            .entry(atom_name.to_string())
            .or_insert(atom_id);
    }

    pub fn atoms(&self) -> &[AtomId] {
        &self.atoms
    }

    pub fn has_atom(&self, name: &str) -> bool {
        self.atom_name_map.contains_key(name)
    }

    /// Returns the first atom parsed with the given name.
    pub fn get_atom_id_by_name(&self, name: &str) -> Option<AtomId> {
        self.atom_name_map.get(name).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::KeyData;

    fn dummy_atom_id(n: u64) -> AtomId {
        AtomId::from(KeyData::from_ffi(n))
    }

    fn dummy_chain_id(n: u64) -> ChainId {
        ChainId::from(KeyData::from_ffi(n))
    }

    #[test]
    fn new_residue_initializes_fields_correctly() {
        let chain_id = dummy_chain_id(1);
        let residue = Residue::new(10, Some('A'), "GLY", chain_id, false);
        assert_eq!(residue.number, 10);
        assert_eq!(residue.insertion_code, Some('A'));
        assert_eq!(residue.name, "GLY");
        assert_eq!(residue.chain_id, chain_id);
        assert!(!residue.is_hetero);
        assert!(residue.atoms().is_empty());
        assert!(residue.get_atom_id_by_name("CA").is_none());
    }

    #[test]
    fn duplicate_atom_names_keep_first_mapping() {
        let mut residue = Residue::new(5, None, "SER", dummy_chain_id(2), false);
        let first = dummy_atom_id(1);
        let second = dummy_atom_id(2);
        residue.add_atom("OG", first);
        residue.add_atom("OG", second);
        assert_eq!(residue.atoms(), &[first, second]);
        assert_eq!(residue.get_atom_id_by_name("OG"), Some(first));
        assert!(residue.has_atom("OG"));
        assert!(!residue.has_atom("CB"));
    }

    #[test]
    fn residue_key_displays_insertion_code_after_number() {
        assert_eq!(ResidueKey::new('A', 12, None).to_string(), "A:12");
        assert_eq!(ResidueKey::new('H', 100, Some('B')).to_string(), "H:100B");
    }

    #[test]
    fn residue_keys_order_by_chain_then_number_then_insertion() {
        let mut keys = vec![
            ResidueKey::new('B', 1, None),
            ResidueKey::new('A', 100, Some('A')),
            ResidueKey::new('A', 100, None),
            ResidueKey::new('A', 7, None),
        ];
        keys.sort();
        assert_eq!(
            keys,
            vec![
                ResidueKey::new('A', 7, None),
                ResidueKey::new('A', 100, None),
                ResidueKey::new('A', 100, Some('A')),
                ResidueKey::new('B', 1, None),
            ]
        );
    }
}
