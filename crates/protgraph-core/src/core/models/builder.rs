use super::atom::{Atom, AtomRole};
use super::chain::{Chain, ChainType};
use super::ids::{ChainId, ResidueId};
use super::residue::{Residue, ResidueKey};
use super::structure::Structure;
use nalgebra::Point3;
use thiserror::Error;

/// Raised when structural input violates the invariants of a [`Structure`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MalformedStructureError {
    #[error("Structure '{structure}' contains no chains")]
    NoChains { structure: String },

    #[error("Chain '{chain}' contains no residues")]
    EmptyChain { chain: char },

    #[error("Residue {residue} contains no atoms")]
    EmptyResidue { residue: ResidueKey },

    #[error("Duplicate residue identifier {residue}")]
    DuplicateResidue { residue: ResidueKey },

    #[error("Residue {residue} follows residue number {previous} in the same chain")]
    NonMonotonicResidue { residue: ResidueKey, previous: isize },

    #[error("Residue {number} was started before any chain")]
    NoActiveChain { number: isize },

    #[error("Atom '{atom}' was added before any residue")]
    NoActiveResidue { atom: String },
}

/// The raw fields of one atom record handed to [`StructureBuilder::add_atom`].
#[derive(Debug, Clone, PartialEq)]
pub struct AtomRecord {
    pub serial: usize,
    pub name: String,
    pub element: Option<String>,
    pub position: Point3<f64>,
    pub b_factor: f64,
    pub occupancy: f64,
    pub alt_loc: Option<char>,
}

impl AtomRecord {
    pub fn new(name: &str, position: Point3<f64>) -> Self {
        Self {
            serial: 0,
            name: name.to_string(),
            element: None,
            position,
            b_factor: 0.0,
            occupancy: 1.0,
            alt_loc: None,
        }
    }

    pub fn with_element(mut self, element: &str) -> Self {
        self.element = Some(element.to_string());
        self
    }
}

impl From<&Atom> for AtomRecord {
    fn from(atom: &Atom) -> Self {
        Self {
            serial: atom.serial,
            name: atom.name.clone(),
            element: atom.element.clone(),
            position: atom.position,
            b_factor: atom.b_factor,
            occupancy: atom.occupancy,
            alt_loc: atom.alt_loc,
        }
    }
}

/// Incrementally assembles a [`Structure`] from chain, residue and atom records.
///
/// Misuse and invariant violations are recorded as they happen; the first one is
/// returned from [`build`](Self::build), so a reader can stream records without checking
/// every call.
pub struct StructureBuilder {
    structure: Structure,
    current_chain: Option<ChainId>,
    current_residue: Option<ResidueId>,
    error: Option<MalformedStructureError>,
}

impl StructureBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            structure: Structure {
                name: name.to_string(),
                ..Structure::default()
            },
            current_chain: None,
            current_residue: None,
            error: None,
        }
    }

    /// Starts a new chain, or resumes an existing chain with the same identifier.
    pub fn start_chain(&mut self, id: char, chain_type: ChainType) -> &mut Self {
        let structure = &mut self.structure;
        let chain_id = *structure.chain_id_map.entry(id).or_insert_with(|| {
            let chain_id = structure.chains.insert(Chain::new(id, chain_type));
            structure.chain_order.push(chain_id);
            chain_id
        });
        self.current_chain = Some(chain_id);
        self.current_residue = None;
        self
    }

    pub fn start_residue(
        &mut self,
        number: isize,
        insertion_code: Option<char>,
        name: &str,
        is_hetero: bool,
    ) -> &mut Self {
        self.current_residue = None;
        let Some(chain_id) = self.current_chain else {
            self.record(MalformedStructureError::NoActiveChain { number });
            return self;
        };
        let structure = &mut self.structure;
        let Some(chain) = structure.chains.get(chain_id) else {
            return self;
        };
        let key = ResidueKey::new(chain.id, number, insertion_code);

        if structure.residue_key_map.contains_key(&key) {
            self.record(MalformedStructureError::DuplicateResidue { residue: key });
            return self;
        }
        let previous = chain
            .residues
            .last()
            .and_then(|&id| structure.residues.get(id))
            .map(|residue| residue.number);
        if let Some(previous) = previous {
            if number < previous {
                self.record(MalformedStructureError::NonMonotonicResidue {
                    residue: key,
                    previous,
                });
                return self;
            }
        }

        let residue_id =
            structure
                .residues
                .insert(Residue::new(number, insertion_code, name, chain_id, is_hetero));
        structure.residue_key_map.insert(key, residue_id);
        if let Some(chain) = structure.chains.get_mut(chain_id) {
            chain.residues.push(residue_id);
        }
        self.current_residue = Some(residue_id);
        self
    }

    pub fn add_atom(&mut self, record: AtomRecord) -> &mut Self {
        let Some(residue_id) = self.current_residue else {
            self.record(MalformedStructureError::NoActiveResidue { atom: record.name });
            return self;
        };
        let structure = &mut self.structure;
        let Some(residue) = structure.residues.get(residue_id) else {
            return self;
        };
        let role = AtomRole::classify(&record.name, record.element.as_deref(), residue.is_hetero);

        let atom = Atom {
            serial: record.serial,
            name: record.name,
            element: record.element,
            residue_id,
            role,
            position: record.position,
            b_factor: record.b_factor,
            occupancy: record.occupancy,
            alt_loc: record.alt_loc,
        };
        let name = atom.name.clone();
        let atom_id = structure.atoms.insert(atom);
        if let Some(residue) = structure.residues.get_mut(residue_id) {
            residue.add_atom(&name, atom_id);
        }
        self
    }

    /// Validates the accumulated records and returns the finished structure.
    ///
    /// # Errors
    ///
    /// Returns the first [`MalformedStructureError`] recorded while streaming, or the first
    /// empty chain or residue found during validation.
    pub fn build(self) -> Result<Structure, MalformedStructureError> {
        if let Some(error) = self.error {
            return Err(error);
        }
        let structure = self.structure;
        if structure.chain_order.is_empty() {
            return Err(MalformedStructureError::NoChains {
                structure: structure.name.clone(),
            });
        }
        for (_, chain) in structure.chains() {
            if chain.residues().is_empty() {
                return Err(MalformedStructureError::EmptyChain { chain: chain.id });
            }
        }
        for (residue_id, residue) in structure.residues_iter() {
            if residue.atoms().is_empty() {
                let key = structure.residue_key(residue_id).ok_or_else(|| {
                    MalformedStructureError::NoChains {
                        structure: structure.name.clone(),
                    }
                })?;
                return Err(MalformedStructureError::EmptyResidue { residue: key });
            }
        }
        Ok(structure)
    }

    fn record(&mut self, error: MalformedStructureError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }
}
