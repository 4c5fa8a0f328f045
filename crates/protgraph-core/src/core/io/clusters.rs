use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClusterTableError {
    #[error("Malformed cluster membership table: {0}")]
    Csv(#[from] csv::Error),
}

/// One `representative<TAB>member` row of a cluster membership table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClusterMembership {
    pub representative: String,
    pub member: String,
}

/// Parses a two-column cluster membership table (MMseqs2 `easy-cluster` `_cluster.tsv` layout).
pub fn parse_cluster_table(text: &str) -> Result<Vec<ClusterMembership>, ClusterTableError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .from_reader(text.as_bytes());
    let mut rows = Vec::new();
    for result in reader.deserialize::<ClusterMembership>() {
        rows.push(result?);
    }
    Ok(rows)
}
