use super::ids::ResidueId;
use crate::core::chemistry::BACKBONE_ATOMS;
use nalgebra::Point3;
use std::str::FromStr;

/// Represents the role of an atom within its residue.
///
/// Roles are assigned once when the structure is built and let edge strategies and
/// processing steps distinguish backbone from sidechain atoms without re-parsing names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum AtomRole {
    /// Main-chain heavy atom (N, CA, C, O, OXT).
    Backbone,
    /// Heavy atom of an amino-acid side chain.
    Sidechain,
    /// Hydrogen or deuterium atom.
    Hydrogen,
    /// Atom of a hetero residue (ligand, ion, water, modified residue record).
    Hetero,
    /// Unknown or unclassified atom role.
    #[default]
    Other,
}

impl AtomRole {
    /// Classifies an atom from its name, element and the hetero flag of its residue.
    pub fn classify(name: &str, element: Option<&str>, is_hetero: bool) -> Self {
        if is_hydrogen(name, element) {
            return AtomRole::Hydrogen;
        }
        if is_hetero {
            return AtomRole::Hetero;
        }
        if BACKBONE_ATOMS.contains(&name) {
            AtomRole::Backbone
        } else {
            AtomRole::Sidechain
        }
    }
}

/// An atom of a parsed structure with its coordinates and per-atom metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    /// The serial number from the source record.
    pub serial: usize,
    /// The name of the atom (e.g., "CA", "N", "OG1").
    pub name: String,
    /// The element symbol, when the source provides one.
    pub element: Option<String>,
    /// The ID of the parent residue this atom belongs to.
    pub residue_id: ResidueId,
    /// The role of the atom within its residue.
    pub role: AtomRole,
    /// The 3D coordinates of the atom in Angstroms.
    pub position: Point3<f64>,
    /// Crystallographic temperature factor.
    pub b_factor: f64,
    /// Crystallographic occupancy.
    pub occupancy: f64,
    /// Alternate location indicator, if any.
    pub alt_loc: Option<char>,
}

impl Atom {
    /// Creates a new `Atom` with default values for the optional metadata.
    pub fn new(name: &str, residue_id: ResidueId, position: Point3<f64>) -> Self {
        Self {
            serial: 0,
            name: name.to_string(),
            element: None,
            residue_id,
            role: AtomRole::default(),
            position,
            b_factor: 0.0,
            occupancy: 1.0,
            alt_loc: None,
        }
    }
}

/// Returns `true` for hydrogen and deuterium atoms.
///
/// The element symbol wins when present; otherwise the first letter of the atom name
/// decides, matching the convention of PDB atom naming.
pub fn is_hydrogen(name: &str, element: Option<&str>) -> bool {
    if let Some(element) = element.map(str::trim).filter(|e| !e.is_empty()) {
        return element.eq_ignore_ascii_case("H") || element.eq_ignore_ascii_case("D");
    }
    let first_char = name
        .trim()
        .chars()
        .find(|c| !c.is_ascii_digit())
        .map(|c| c.to_ascii_uppercase());
    matches!(first_char, Some('H') | Some('D'))
}

impl FromStr for AtomRole {
    type Err = ();

    /// Parses a case-insensitive role name, accepting "side-chain" and "side_chain".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "backbone" => Ok(AtomRole::Backbone),
            "sidechain" | "side-chain" | "side_chain" => Ok(AtomRole::Sidechain),
            "hydrogen" => Ok(AtomRole::Hydrogen),
            "hetero" | "hetatm" => Ok(AtomRole::Hetero),
            "other" | "unknown" => Ok(AtomRole::Other),
            _ => Err(()),
        }
    }
}
