use super::{EdgeCandidate, EdgeContext, EdgeStrategy};
use crate::engine::config::EdgeRule;
use crate::engine::error::GraphError;

/// Connects sequence-adjacent residues of the same chain.
///
/// Two consecutive polymer residues are adjacent when their numbers differ by 0 (insertion
/// codes) or 1; a larger gap is a chain break. Hetero residues never take part. At atom
/// granularity the edge joins `C(i)` to `N(i+1)`.
#[derive(Debug, Default, Clone, Copy)]
pub struct PeptideBondStrategy;

impl EdgeStrategy for PeptideBondStrategy {
    fn name(&self) -> &str {
        EdgeRule::PEPTIDE_BOND
    }

    fn build_edges(&self, context: &EdgeContext<'_>) -> Result<Vec<EdgeCandidate>, GraphError> {
        let structure = context.structure;
        let mut candidates = Vec::new();
        for (chain_id, _) in structure.chains() {
            let residues: Vec<_> = structure.chain_residues(chain_id).collect();
            for window in residues.windows(2) {
                let [(prev_id, prev), (next_id, next)] = window else {
                    continue;
                };
                if prev.is_hetero || next.is_hetero {
                    continue;
                }
                let gap = next.number - prev.number;
                if !(0..=1).contains(&gap) {
                    continue;
                }
                let source = context.layout.residue_node(structure, *prev_id, Some("C"));
                let target = context.layout.residue_node(structure, *next_id, Some("N"));
                if let (Some(source), Some(target)) = (source, target) {
                    candidates.extend(EdgeCandidate::new(source, target, self.name()));
                }
            }
        }
        Ok(candidates)
    }
}
