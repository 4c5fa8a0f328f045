use super::{
    AnnotationError, AnnotationLayer, AnnotationProvider, AnnotationTarget, AttributeValue,
    SideInputs, ToolKind, tool_text,
};
use crate::core::chemistry;
use crate::core::io::dssp::{DsspRecord, parse_dssp};
use crate::core::models::residue::ResidueKey;
use crate::core::models::structure::Structure;
use std::collections::HashMap;
use tracing::debug;

/// Secondary structure, solvent accessibility and backbone torsions from DSSP output.
///
/// Writes per-residue `ss` (8-state code, `-` for coil), `asa` (Å²), `rsa` (ASA relative to
/// the theoretical maximum of the residue type), `phi` and `psi`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SecondaryStructureProvider;

impl SecondaryStructureProvider {
    pub const NAME: &'static str = "secondary_structure";
    const WRITES: [&'static str; 5] = ["ss", "asa", "rsa", "phi", "psi"];
}

impl AnnotationProvider for SecondaryStructureProvider {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn writes(&self) -> &[&'static str] {
        &Self::WRITES
    }

    fn side_input(&self) -> Option<ToolKind> {
        Some(ToolKind::Dssp)
    }

    fn annotate(
        &self,
        structure: &Structure,
        inputs: &SideInputs,
    ) -> Result<AnnotationLayer, AnnotationError> {
        let text = tool_text(Self::NAME, structure, ToolKind::Dssp, inputs)?;
        let records = parse_dssp(text)
            .map_err(|e| AnnotationError::malformed(Self::NAME, structure, ToolKind::Dssp, e))?;
        let by_key: HashMap<ResidueKey, &DsspRecord> =
            records.iter().map(|record| (record.key, record)).collect();

        let mut layer = AnnotationLayer::new(Self::NAME);
        let mut unresolved = 0usize;
        for (residue_id, residue) in structure.residues_iter() {
            let Some(key) = structure.residue_key(residue_id) else {
                continue;
            };
            let target = AnnotationTarget::Residue(key);
            match by_key.get(&key) {
                Some(record) => {
                    let rsa = chemistry::max_asa(&residue.name).map(|max| record.acc / max);
                    layer.set(target, "ss", record.ss);
                    layer.set(target, "asa", record.acc);
                    layer.set(target, "rsa", rsa);
                    layer.set(target, "phi", record.phi);
                    layer.set(target, "psi", record.psi);
                }
                None => {
                    unresolved += 1;
                    for attribute in Self::WRITES {
                        layer.set(target, attribute, AttributeValue::Missing);
                    }
                }
            }
        }
        debug!(
            structure = structure.name(),
            unresolved, "Applied secondary structure layer"
        );
        Ok(layer)
    }
}
