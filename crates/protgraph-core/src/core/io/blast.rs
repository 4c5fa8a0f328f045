use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BlastError {
    #[error("Malformed BLAST tabular output: {0}")]
    Csv(#[from] csv::Error),
}

/// One row of BLAST `-outfmt 6` output (the twelve standard columns).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BlastHit {
    pub query: String,
    pub subject: String,
    pub identity: f64,
    pub alignment_length: usize,
    pub mismatches: usize,
    pub gap_opens: usize,
    pub query_start: usize,
    pub query_end: usize,
    pub subject_start: usize,
    pub subject_end: usize,
    pub evalue: f64,
    pub bitscore: f64,
}

impl BlastHit {
    /// Whether the 1-based query position lies inside the aligned query range.
    pub fn covers(&self, position: usize) -> bool {
        let (start, end) = if self.query_start <= self.query_end {
            (self.query_start, self.query_end)
        } else {
            (self.query_end, self.query_start)
        };
        (start..=end).contains(&position)
    }
}

/// Parses tab-separated BLAST output. Comment lines (`#`) are ignored, fields are trimmed and
/// empty input yields no hits.
pub fn parse_blast_tabular(text: &str) -> Result<Vec<BlastHit>, BlastError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .comment(Some(b'#'))
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());
    let mut hits = Vec::new();
    for result in reader.deserialize::<BlastHit>() {
        hits.push(result?);
    }
    Ok(hits)
}
