use super::{
    AnnotationError, AnnotationLayer, AnnotationProvider, AnnotationTarget, AttributeValue,
    SideInputs, ToolKind, sequence_identifier, tool_text,
};
use crate::core::chemistry;
use crate::core::io::blast::{BlastHit, parse_blast_tabular};
use crate::core::models::structure::Structure;
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};

/// Homology summaries from BLAST tabular output.
///
/// Chain level: `homolog_count` (distinct subjects), and the `best_hit`, `best_identity`,
/// `best_evalue` and `best_bitscore` of the best hit (lowest e-value, then highest bit score,
/// then subject id). Residue level: `homolog_coverage`, the number of distinct subjects whose
/// aligned query range covers the residue's 1-based sequence position.
#[derive(Debug, Default, Clone, Copy)]
pub struct HomologyProvider;

impl HomologyProvider {
    pub const NAME: &'static str = "homology";
    const CHAIN_WRITES: [&'static str; 5] = [
        "homolog_count",
        "best_hit",
        "best_identity",
        "best_evalue",
        "best_bitscore",
    ];
    const WRITES: [&'static str; 6] = [
        "homolog_count",
        "best_hit",
        "best_identity",
        "best_evalue",
        "best_bitscore",
        "homolog_coverage",
    ];
}

fn rank(a: &BlastHit, b: &BlastHit) -> Ordering {
    a.evalue
        .total_cmp(&b.evalue)
        .then_with(|| b.bitscore.total_cmp(&a.bitscore))
        .then_with(|| a.subject.cmp(&b.subject))
}

impl AnnotationProvider for HomologyProvider {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn writes(&self) -> &[&'static str] {
        &Self::WRITES
    }

    fn side_input(&self) -> Option<ToolKind> {
        Some(ToolKind::Blast)
    }

    fn annotate(
        &self,
        structure: &Structure,
        inputs: &SideInputs,
    ) -> Result<AnnotationLayer, AnnotationError> {
        let text = tool_text(Self::NAME, structure, ToolKind::Blast, inputs)?;
        let hits = parse_blast_tabular(text)
            .map_err(|e| AnnotationError::malformed(Self::NAME, structure, ToolKind::Blast, e))?;
        let mut by_query: HashMap<&str, Vec<&BlastHit>> = HashMap::new();
        for hit in &hits {
            by_query.entry(hit.query.as_str()).or_default().push(hit);
        }

        let mut layer = AnnotationLayer::new(Self::NAME);
        for (chain_id, chain) in structure.chains() {
            let target = AnnotationTarget::Chain(chain.id);
            let query = sequence_identifier(structure, chain.id);
            let chain_hits = by_query.get(query.as_str()).filter(|hits| !hits.is_empty());

            match chain_hits.and_then(|hits| hits.iter().copied().min_by(|a, b| rank(a, b))) {
                Some(best) => {
                    let subjects: BTreeSet<&str> = chain_hits
                        .into_iter()
                        .flatten()
                        .map(|hit| hit.subject.as_str())
                        .collect();
                    layer.set(target, "homolog_count", subjects.len());
                    layer.set(target, "best_hit", best.subject.as_str());
                    layer.set(target, "best_identity", best.identity);
                    layer.set(target, "best_evalue", best.evalue);
                    layer.set(target, "best_bitscore", best.bitscore);
                }
                None => {
                    for attribute in Self::CHAIN_WRITES {
                        layer.set(target, attribute, AttributeValue::Missing);
                    }
                }
            }

            let mut position = 0usize;
            for (residue_id, residue) in structure.chain_residues(chain_id) {
                let Some(key) = structure.residue_key(residue_id) else {
                    continue;
                };
                let in_sequence =
                    chemistry::one_letter_code(&residue.name).is_some() || !residue.is_hetero;
                let coverage = match (in_sequence, chain_hits) {
                    (true, Some(hits)) => {
                        position += 1;
                        let covering: BTreeSet<&str> = hits
                            .iter()
                            .filter(|hit| hit.covers(position))
                            .map(|hit| hit.subject.as_str())
                            .collect();
                        AttributeValue::from(covering.len())
                    }
                    _ => AttributeValue::Missing,
                };
                layer.set(AnnotationTarget::Residue(key), "homolog_coverage", coverage);
            }
        }
        Ok(layer)
    }
}
