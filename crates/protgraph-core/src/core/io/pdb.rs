use super::{column_char, slice_and_trim};
use super::traits::StructureFile;
use crate::core::chemistry;
use crate::core::models::builder::{AtomRecord, MalformedStructureError, StructureBuilder};
use crate::core::models::chain::ChainType;
use crate::core::models::structure::Structure;
use nalgebra::Point3;
use std::io::{self, BufRead};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PdbError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {kind}")]
    Parse { line: usize, kind: PdbParseErrorKind },
    #[error(transparent)]
    Malformed(#[from] MalformedStructureError),
}

#[derive(Debug, Error)]
pub enum PdbParseErrorKind {
    #[error("Invalid integer format in columns {columns} (value: '{value}')")]
    InvalidInt { columns: String, value: String },
    #[error("Invalid float format in columns {columns} (value: '{value}')")]
    InvalidFloat { columns: String, value: String },
    #[error("Required field in columns {columns} is empty")]
    MissingRequiredField { columns: String },
    #[error("Line is too short for ATOM/HETATM record (must be at least 54 chars)")]
    LineTooShort,
}

const DNA_RESIDUES: [&str; 4] = ["DA", "DC", "DG", "DT"];
const RNA_RESIDUES: [&str; 4] = ["A", "C", "G", "U"];

/// Fixed-column PDB reader for `ATOM`/`HETATM` records.
///
/// Only the first model is read; everything after the first `ENDMDL` is ignored. Residues
/// are identified by chain, sequence number and insertion code.
pub struct PdbFile;

fn classify_chain(residue_name: &str, is_hetero: bool) -> ChainType {
    if DNA_RESIDUES.contains(&residue_name) {
        ChainType::DNA
    } else if RNA_RESIDUES.contains(&residue_name) {
        ChainType::RNA
    } else if !is_hetero || chemistry::one_letter_code(residue_name).is_some() {
        ChainType::Protein
    } else if chemistry::is_water(residue_name) {
        ChainType::Water
    } else {
        ChainType::Ligand
    }
}

fn parse_float(line: &str, line_num: usize, start: usize, end: usize) -> Result<f64, PdbError> {
    let value = slice_and_trim(line, start, end);
    value.parse().map_err(|_| PdbError::Parse {
        line: line_num,
        kind: PdbParseErrorKind::InvalidFloat {
            columns: format!("{}-{}", start + 1, end),
            value: value.into(),
        },
    })
}

fn parse_optional_float(
    line: &str,
    line_num: usize,
    start: usize,
    end: usize,
    default: f64,
) -> Result<f64, PdbError> {
    if slice_and_trim(line, start, end).is_empty() {
        Ok(default)
    } else {
        parse_float(line, line_num, start, end)
    }
}

impl StructureFile for PdbFile {
    type Error = PdbError;

    fn read_from(reader: &mut impl BufRead, name: &str) -> Result<Structure, Self::Error> {
        let mut builder = StructureBuilder::new(name);
        let mut current_chain: Option<char> = None;
        let mut current_residue: Option<(isize, Option<char>)> = None;

        for (line_num, line_res) in reader.lines().enumerate() {
            let line = line_res?;
            let line_num = line_num + 1;

            let record_type = slice_and_trim(&line, 0, 6);
            if record_type == "ENDMDL" {
                break;
            }
            if record_type != "ATOM" && record_type != "HETATM" {
                continue;
            }
            if line.len() < 54 {
                return Err(PdbError::Parse {
                    line: line_num,
                    kind: PdbParseErrorKind::LineTooShort,
                });
            }
            let is_hetero = record_type == "HETATM";

            let serial_str = slice_and_trim(&line, 6, 11);
            let atom_name = slice_and_trim(&line, 12, 16);
            let alt_loc = column_char(&line, 16);
            let res_name = slice_and_trim(&line, 17, 20);
            let chain_id = column_char(&line, 21).unwrap_or('A');
            let res_seq_str = slice_and_trim(&line, 22, 26);
            let insertion_code = column_char(&line, 26);
            let element = slice_and_trim(&line, 76, 78);

            if atom_name.is_empty() {
                return Err(PdbError::Parse {
                    line: line_num,
                    kind: PdbParseErrorKind::MissingRequiredField {
                        columns: "13-16".into(),
                    },
                });
            }
            let serial: usize = serial_str.parse().unwrap_or(0);
            let res_seq: isize = res_seq_str.parse().map_err(|_| PdbError::Parse {
                line: line_num,
                kind: PdbParseErrorKind::InvalidInt {
                    columns: "23-26".into(),
                    value: res_seq_str.into(),
                },
            })?;
            let x = parse_float(&line, line_num, 30, 38)?;
            let y = parse_float(&line, line_num, 38, 46)?;
            let z = parse_float(&line, line_num, 46, 54)?;
            let occupancy = parse_optional_float(&line, line_num, 54, 60, 1.0)?;
            let b_factor = parse_optional_float(&line, line_num, 60, 66, 0.0)?;

            if current_chain != Some(chain_id) {
                builder.start_chain(chain_id, classify_chain(res_name, is_hetero));
                current_chain = Some(chain_id);
                current_residue = None;
            }
            if current_residue != Some((res_seq, insertion_code)) {
                builder.start_residue(res_seq, insertion_code, res_name, is_hetero);
                current_residue = Some((res_seq, insertion_code));
            }
            builder.add_atom(AtomRecord {
                serial,
                name: atom_name.to_string(),
                element: (!element.is_empty()).then(|| element.to_string()),
                position: Point3::new(x, y, z),
                b_factor,
                occupancy,
                alt_loc,
            });
        }

        Ok(builder.build()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::atom::AtomRole;
    use crate::core::models::residue::ResidueKey;
    use std::fs::File;
    use std::io::{Cursor, Write};
    use tempfile::tempdir;

    const SAMPLE: &str = "\
HEADER    TEST STRUCTURE
ATOM      1  N   ALA A   1      11.104   6.134  -6.504  1.00  0.00           N
ATOM      2  CA  ALA A   1      11.639   6.071  -5.147  1.00  0.00           C
ATOM      3  H   ALA A   1      10.500   6.000  -6.900  1.00  0.00           H
ATOM      4  CA AGLY A   2      12.000   7.000  -4.000  0.50 10.00           C
ATOM      5  CA BGLY A   2      12.100   7.100  -4.100  0.50 12.00           C
ATOM      6  CA  SER A   2A     13.000   8.000  -3.000  1.00  0.00           C
TER
HETATM    7  O   HOH B 101      20.000  20.000  20.000  1.00 30.00           O
ENDMDL
MODEL        2
ATOM      8  CA  ALA C   1       0.000   0.000   0.000  1.00  0.00           C
";

    #[test]
    fn read_from_parses_first_model_atoms() {
        let structure = PdbFile::read_from(&mut Cursor::new(SAMPLE), "sample").unwrap();

        assert_eq!(structure.name(), "sample");
        assert_eq!(structure.chain_count(), 2);
        assert_eq!(structure.residue_count(), 4);
        assert_eq!(structure.atom_count(), 7);

        let ala = structure.find_residue(&ResidueKey::new('A', 1, None)).unwrap();
        let ca = structure.atom_by_name(ala, "CA").unwrap();
        assert_eq!(ca.position, Point3::new(11.639, 6.071, -5.147));
        assert_eq!(ca.element.as_deref(), Some("C"));
        assert_eq!(ca.role, AtomRole::Backbone);
        assert_eq!(structure.atom_by_name(ala, "H").unwrap().role, AtomRole::Hydrogen);

        let gly = structure.find_residue(&ResidueKey::new('A', 2, None)).unwrap();
        let first = structure.atom_by_name(gly, "CA").unwrap();
        assert_eq!(first.alt_loc, Some('A'));
        assert_eq!(first.occupancy, 0.5);
        assert_eq!(first.b_factor, 10.0);

        assert!(structure.find_residue(&ResidueKey::new('A', 2, Some('A'))).is_some());
        assert!(structure.find_chain('C').is_none());

        let water_chain = structure.find_chain('B').unwrap();
        assert_eq!(structure.chain(water_chain).unwrap().chain_type, ChainType::Water);
    }

    #[test]
    fn read_from_reports_invalid_coordinates_with_line_number() {
        let text = "ATOM      1  CA  ALA A   1      1x.000   6.134  -6.504  1.00  0.00           C\n";
        let err = PdbFile::read_from(&mut Cursor::new(text), "bad").unwrap_err();
        assert!(matches!(
            err,
            PdbError::Parse {
                line: 1,
                kind: PdbParseErrorKind::InvalidFloat { .. }
            }
        ));
    }

    #[test]
    fn read_from_rejects_truncated_records() {
        let text = "ATOM      1  CA  ALA A   1      11.000\n";
        let err = PdbFile::read_from(&mut Cursor::new(text), "short").unwrap_err();
        assert!(matches!(
            err,
            PdbError::Parse {
                kind: PdbParseErrorKind::LineTooShort,
                ..
            }
        ));
    }

    #[test]
    fn read_from_without_atoms_is_malformed() {
        let err = PdbFile::read_from(&mut Cursor::new("HEADER ONLY\n"), "empty").unwrap_err();
        assert!(matches!(
            err,
            PdbError::Malformed(MalformedStructureError::NoChains { .. })
        ));
    }

    #[test]
    fn read_from_path_names_structure_after_file_stem() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("1abc.pdb");
        let mut file = File::create(&path).unwrap();
        write!(file, "{}", SAMPLE).unwrap();

        let structure = PdbFile::read_from_path(&path).unwrap();
        assert_eq!(structure.name(), "1abc");
    }
}
