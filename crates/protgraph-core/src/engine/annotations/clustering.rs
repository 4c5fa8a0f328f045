use super::{
    AnnotationError, AnnotationLayer, AnnotationProvider, AnnotationTarget, AttributeValue,
    SideInputs, ToolKind, sequence_identifier, tool_text,
};
use crate::core::io::clusters::parse_cluster_table;
use crate::core::models::structure::Structure;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Chain-level sequence-similarity cluster membership from a cluster table.
#[derive(Debug, Default, Clone, Copy)]
pub struct SequenceClusterProvider;

impl SequenceClusterProvider {
    pub const NAME: &'static str = "sequence_cluster";
    const WRITES: [&'static str; 3] = ["cluster_representative", "cluster_index", "cluster_size"];
}

impl AnnotationProvider for SequenceClusterProvider {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn writes(&self) -> &[&'static str] {
        &Self::WRITES
    }

    fn side_input(&self) -> Option<ToolKind> {
        Some(ToolKind::Clusters)
    }

    fn annotate(
        &self,
        structure: &Structure,
        inputs: &SideInputs,
    ) -> Result<AnnotationLayer, AnnotationError> {
        let text = tool_text(Self::NAME, structure, ToolKind::Clusters, inputs)?;
        let rows = parse_cluster_table(text).map_err(|e| {
            AnnotationError::malformed(Self::NAME, structure, ToolKind::Clusters, e)
        })?;

        let mut members: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
        let mut representative_of: HashMap<&str, &str> = HashMap::new();
        for row in &rows {
            members
                .entry(row.representative.as_str())
                .or_default()
                .insert(row.member.as_str());
            representative_of
                .entry(row.member.as_str())
                .or_insert(row.representative.as_str());
        }
        let index_of: HashMap<&str, usize> = members
            .keys()
            .enumerate()
            .map(|(idx, rep)| (*rep, idx))
            .collect();

        let mut layer = AnnotationLayer::new(Self::NAME);
        for (_, chain) in structure.chains() {
            let target = AnnotationTarget::Chain(chain.id);
            let id = sequence_identifier(structure, chain.id);
            match representative_of.get(id.as_str()) {
                Some(&rep) => {
                    layer.set(target, "cluster_representative", rep);
                    layer.set(target, "cluster_index", index_of.get(rep).copied());
                    layer.set(target, "cluster_size", members.get(rep).map(BTreeSet::len));
                }
                None => {
                    for attribute in Self::WRITES {
                        layer.set(target, attribute, AttributeValue::Missing);
                    }
                }
            }
        }
        Ok(layer)
    }
}
