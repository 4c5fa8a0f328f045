use super::{column_char, slice_and_trim};
use crate::core::models::residue::ResidueKey;
use thiserror::Error;

const HEADER_PREFIX: &str = "  #  RESIDUE";
const UNDEFINED_ANGLE: f64 = 360.0;

#[derive(Debug, Error, PartialEq)]
pub enum DsspError {
    #[error("DSSP output has no residue table header")]
    MissingHeader,
    #[error("Parse error on line {line}: {kind}")]
    Parse { line: usize, kind: DsspParseErrorKind },
}

#[derive(Debug, Error, PartialEq)]
pub enum DsspParseErrorKind {
    #[error("Invalid number in columns {columns} (value: '{value}')")]
    InvalidNumber { columns: String, value: String },
    #[error("Line is too short for a residue record")]
    LineTooShort,
}

/// One residue row of a classic DSSP residue table.
#[derive(Debug, Clone, PartialEq)]
pub struct DsspRecord {
    pub key: ResidueKey,
    pub amino_acid: char,
    /// 8-state secondary structure code; coil is reported as `-`.
    pub ss: char,
    /// Absolute accessible surface area in square Angstroms.
    pub acc: f64,
    pub phi: Option<f64>,
    pub psi: Option<f64>,
}

fn number(line: &str, line_num: usize, start: usize, end: usize) -> Result<f64, DsspError> {
    let value = slice_and_trim(line, start, end);
    value.parse().map_err(|_| DsspError::Parse {
        line: line_num,
        kind: DsspParseErrorKind::InvalidNumber {
            columns: format!("{}-{}", start + 1, end),
            value: value.into(),
        },
    })
}

fn angle(line: &str, line_num: usize, start: usize, end: usize) -> Result<Option<f64>, DsspError> {
    let value = number(line, line_num, start, end)?;
    Ok(((value - UNDEFINED_ANGLE).abs() > f64::EPSILON).then_some(value))
}

/// Parses the residue table of classic DSSP output.
///
/// Chain-break rows (`!`) are skipped. Angles of `360.0` mean undefined and become `None`.
pub fn parse_dssp(text: &str) -> Result<Vec<DsspRecord>, DsspError> {
    let mut lines = text.lines().enumerate();
    if !lines.any(|(_, line)| line.starts_with(HEADER_PREFIX)) {
        return Err(DsspError::MissingHeader);
    }

    let mut records = Vec::new();
    for (line_num, line) in lines {
        let line_num = line_num + 1;
        if line.trim().is_empty() {
            continue;
        }
        if line.len() < 115 {
            return Err(DsspError::Parse {
                line: line_num,
                kind: DsspParseErrorKind::LineTooShort,
            });
        }
        let amino_acid = column_char(line, 13).unwrap_or('X');
        if amino_acid == '!' {
            continue;
        }

        let residue_number = number(line, line_num, 5, 10)? as isize;
        let insertion_code = column_char(line, 10);
        let chain = column_char(line, 11).unwrap_or('A');
        let ss = column_char(line, 16).unwrap_or('-');

        records.push(DsspRecord {
            key: ResidueKey::new(chain, residue_number, insertion_code),
            amino_acid,
            ss,
            acc: number(line, line_num, 34, 38)?,
            phi: angle(line, line_num, 103, 109)?,
            psi: angle(line, line_num, 109, 115)?,
        });
    }
    Ok(records)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Formats a DSSP residue row with every field at its fixed column.
    pub(crate) fn dssp_row(
        index: usize,
        number: isize,
        chain: char,
        aa: char,
        ss: char,
        acc: f64,
        phi: f64,
        psi: f64,
    ) -> String {
        let mut row: Vec<char> = vec![' '; 136];
        let mut put = |start: usize, text: &str| {
            for (offset, c) in text.chars().enumerate() {
                row[start + offset] = c;
            }
        };
        put(0, &format!("{:>5}", index));
        put(5, &format!("{:>5}", number));
        put(11, &chain.to_string());
        put(13, &aa.to_string());
        put(16, &ss.to_string());
        put(34, &format!("{:>4}", acc.round() as i64));
        put(103, &format!("{:>6.1}", phi));
        put(109, &format!("{:>6.1}", psi));
        row.into_iter().collect()
    }

    pub(crate) fn dssp_text(rows: &[String]) -> String {
        let mut text = String::from(
            "==== Secondary Structure Definition by the program DSSP ====\n\
             HEADER    TEST\n",
        );
        text.push_str("  #  RESIDUE AA STRUCTURE BP1 BP2  ACC     N-H-->O    O-->H-N\n");
        for row in rows {
            text.push_str(row);
            text.push('\n');
        }
        text
    }

    #[test]
    fn parse_dssp_reads_residue_rows() {
        let text = dssp_text(&[
            dssp_row(1, 1, 'A', 'M', ' ', 198.0, 360.0, 145.2),
            dssp_row(2, 2, 'A', 'K', 'H', 85.0, -60.5, -45.0),
        ]);
        let records = parse_dssp(&text).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].key, ResidueKey::new('A', 1, None));
        assert_eq!(records[0].ss, '-');
        assert_eq!(records[0].acc, 198.0);
        assert_eq!(records[0].phi, None);
        assert_eq!(records[0].psi, Some(145.2));
        assert_eq!(records[1].amino_acid, 'K');
        assert_eq!(records[1].ss, 'H');
        assert_eq!(records[1].phi, Some(-60.5));
    }

    #[test]
    fn parse_dssp_skips_chain_break_rows() {
        let text = dssp_text(&[
            dssp_row(1, 1, 'A', 'M', ' ', 10.0, 360.0, 360.0),
            dssp_row(2, 0, ' ', '!', ' ', 0.0, 360.0, 360.0),
            dssp_row(3, 1, 'B', 'G', 'E', 20.0, -120.0, 130.0),
        ]);
        let records = parse_dssp(&text).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].key.chain, 'B');
    }

    #[test]
    fn parse_dssp_without_header_fails() {
        assert_eq!(parse_dssp(""), Err(DsspError::MissingHeader));
        assert_eq!(parse_dssp("garbage\n"), Err(DsspError::MissingHeader));
    }

    #[test]
    fn parse_dssp_reports_short_rows() {
        let text = dssp_text(&["    1    1 A M".to_string()]);
        assert!(matches!(
            parse_dssp(&text),
            Err(DsspError::Parse {
                line: 4,
                kind: DsspParseErrorKind::LineTooShort
            })
        ));
    }
}
