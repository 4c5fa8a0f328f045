//! Residue chemistry lookup tables.
//!
//! All tables are keyed by upper-case three-letter residue codes. Modified residues are
//! resolved through [`parent_residue`] before property lookups, so `MSE` answers like `MET`.

use phf::{Map, Set, phf_map, phf_set};

/// Main-chain heavy atoms.
pub const BACKBONE_ATOMS: [&str; 5] = ["N", "CA", "C", "O", "OXT"];

static THREE_TO_ONE: Map<&'static str, char> = phf_map! {
    "ALA" => 'A', "ARG" => 'R', "ASN" => 'N', "ASP" => 'D', "CYS" => 'C',
    "GLN" => 'Q', "GLU" => 'E', "GLY" => 'G', "HIS" => 'H', "ILE" => 'I',
    "LEU" => 'L', "LYS" => 'K', "MET" => 'M', "PHE" => 'F', "PRO" => 'P',
    "SER" => 'S', "THR" => 'T', "TRP" => 'W', "TYR" => 'Y', "VAL" => 'V',
    "SEC" => 'U', "PYL" => 'O', "ASX" => 'B', "GLX" => 'Z', "UNK" => 'X',
};

static MODIFIED_PARENTS: Map<&'static str, &'static str> = phf_map! {
    "MSE" => "MET", "CSD" => "CYS", "HYP" => "PRO", "BMT" => "THR", "5HP" => "GLU",
    "ABA" => "ALA", "AIB" => "ALA", "CSW" => "CYS", "OCS" => "CYS", "DAL" => "ALA",
    "DAR" => "ARG", "DSG" => "ASN", "DSP" => "ASP", "DCY" => "CYS", "DGL" => "GLU",
    "DGN" => "GLN", "DHI" => "HIS", "DIL" => "ILE", "DIV" => "VAL", "DLE" => "LEU",
    "DLY" => "LYS", "DPN" => "PHE", "DPR" => "PRO", "DSN" => "SER", "DTH" => "THR",
    "DTY" => "TYR", "DVA" => "VAL", "CGU" => "GLU", "KCX" => "LYS", "LLP" => "LYS",
    "CXM" => "MET", "FME" => "MET", "MLE" => "LEU", "MVA" => "VAL", "NLE" => "LEU",
    "PTR" => "TYR", "ORN" => "ALA", "SEP" => "SER", "TPO" => "THR", "PCA" => "GLU",
    "SAR" => "GLY", "CEA" => "CYS", "CSO" => "CYS", "CSS" => "CYS", "CSX" => "CYS",
    "CME" => "CYS", "TYS" => "TYR", "TPQ" => "PHE", "STY" => "TYR",
};

static HYDROPHOBIC: Set<&'static str> = phf_set! {
    "ALA", "VAL", "LEU", "ILE", "MET", "PHE", "TRP", "PRO", "TYR",
};

static CHARGES: Map<&'static str, i8> = phf_map! {
    "HIS" => 1, "LYS" => 1, "ARG" => 1,
    "GLU" => -1, "ASP" => -1,
};

static AROMATIC: Set<&'static str> = phf_set! { "PHE", "TYR", "TRP", "HIS" };

const BENZENE_RING: &[&str] = &["CG", "CD1", "CD2", "CE1", "CE2", "CZ"];
const INDOLE_BENZENE_RING: &[&str] = &["CD2", "CE2", "CE3", "CZ2", "CZ3", "CH2"];
const IMIDAZOLE_RING: &[&str] = &["CG", "ND1", "CD2", "CE1", "NE2"];

static ISOELECTRIC_POINTS: Map<&'static str, f64> = phf_map! {
    "ALA" => 6.11, "ARG" => 10.76, "ASN" => 10.76, "ASP" => 2.98, "CYS" => 5.02,
    "GLU" => 3.08, "GLN" => 5.65, "GLY" => 6.06, "HIS" => 7.64, "ILE" => 6.04,
    "LEU" => 6.04, "LYS" => 9.74, "MET" => 5.74, "PHE" => 5.91, "PRO" => 6.30,
    "SER" => 5.68, "THR" => 5.60, "TRP" => 5.88, "TYR" => 5.63, "VAL" => 6.02,
    "ASX" => 6.87, "GLX" => 4.35,
};

static MOLECULAR_WEIGHTS: Map<&'static str, f64> = phf_map! {
    "ALA" => 89.0935, "ARG" => 174.2017, "ASN" => 132.1184, "ASP" => 133.1032,
    "CYS" => 121.1590, "GLU" => 147.1299, "GLN" => 146.1451, "GLY" => 75.0669,
    "HIS" => 155.1552, "ILE" => 131.1736, "LEU" => 131.1736, "LYS" => 146.1882,
    "MET" => 149.2124, "PHE" => 165.1900, "PRO" => 115.1310, "SER" => 105.0930,
    "THR" => 119.1197, "TRP" => 204.2262, "TYR" => 181.1894, "VAL" => 117.1469,
    "ASX" => 132.6108, "GLX" => 146.6375,
};

// Theoretical maximum accessible surface area, Tien et al. (2013).
static MAX_ASA: Map<&'static str, f64> = phf_map! {
    "ALA" => 129.0, "ARG" => 274.0, "ASN" => 195.0, "ASP" => 193.0, "CYS" => 167.0,
    "GLN" => 225.0, "GLU" => 223.0, "GLY" => 104.0, "HIS" => 224.0, "ILE" => 197.0,
    "LEU" => 201.0, "LYS" => 236.0, "MET" => 224.0, "PHE" => 240.0, "PRO" => 159.0,
    "SER" => 155.0, "THR" => 172.0, "TRP" => 285.0, "TYR" => 263.0, "VAL" => 174.0,
};

static WATERS: Set<&'static str> = phf_set! { "HOH", "WAT", "H2O", "DOD", "SOL", "TIP3" };

/// Resolves a modified residue code to its parent amino acid; standard codes map to themselves.
pub fn parent_residue(name: &str) -> &str {
    MODIFIED_PARENTS.get(name).copied().unwrap_or(name)
}

/// One-letter code of a residue, resolving modified residues through their parent.
pub fn one_letter_code(name: &str) -> Option<char> {
    THREE_TO_ONE.get(parent_residue(name)).copied()
}

pub fn is_standard_residue(name: &str) -> bool {
    THREE_TO_ONE.contains_key(name)
}

pub fn is_hydrophobic(name: &str) -> bool {
    HYDROPHOBIC.contains(parent_residue(name))
}

/// Formal side-chain charge at neutral pH: `1`, `-1` or `0`.
pub fn charge(name: &str) -> i8 {
    CHARGES.get(parent_residue(name)).copied().unwrap_or(0)
}

pub fn is_aromatic(name: &str) -> bool {
    AROMATIC.contains(parent_residue(name))
}

/// Atom names of the aromatic ring used for ring-centroid geometry.
pub fn aromatic_ring_atoms(name: &str) -> Option<&'static [&'static str]> {
    match parent_residue(name) {
        "PHE" | "TYR" => Some(BENZENE_RING),
        "TRP" => Some(INDOLE_BENZENE_RING),
        "HIS" => Some(IMIDAZOLE_RING),
        _ => None,
    }
}

pub fn isoelectric_point(name: &str) -> Option<f64> {
    ISOELECTRIC_POINTS.get(parent_residue(name)).copied()
}

pub fn molecular_weight(name: &str) -> Option<f64> {
    MOLECULAR_WEIGHTS.get(parent_residue(name)).copied()
}

pub fn max_asa(name: &str) -> Option<f64> {
    MAX_ASA.get(parent_residue(name)).copied()
}

pub fn is_water(name: &str) -> bool {
    WATERS.contains(name)
}
