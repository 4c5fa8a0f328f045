//! Readers for structure files and external tool outputs.
//!
//! Structure formats implement [`traits::StructureFile`]. Tool outputs (DSSP, BLAST tabular,
//! cluster membership tables) are parsed from text already produced by the tool; this crate
//! never runs the tools itself.

pub mod blast;
pub mod clusters;
pub mod dssp;
pub mod pdb;
pub mod traits;

fn slice_and_trim(line: &str, start: usize, end: usize) -> &str {
    line.get(start..end).unwrap_or("").trim()
}

fn column_char(line: &str, index: usize) -> Option<char> {
    line.get(index..)
        .and_then(|rest| rest.chars().next())
        .filter(|c| !c.is_whitespace())
}
