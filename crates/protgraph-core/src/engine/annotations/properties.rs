use super::{
    AnnotationError, AnnotationLayer, AnnotationProvider, AnnotationTarget, AttributeValue,
    SideInputs,
};
use crate::core::chemistry;
use crate::core::models::structure::Structure;

/// Intrinsic residue chemistry: one-letter code, hydrophobicity, isoelectric point and
/// molecular weight. Needs no external tool.
#[derive(Debug, Default, Clone, Copy)]
pub struct ResiduePropertiesProvider;

impl ResiduePropertiesProvider {
    pub const NAME: &'static str = "residue_properties";
    const WRITES: [&'static str; 4] = [
        "one_letter_code",
        "hydrophobic",
        "isoelectric_point",
        "molecular_weight",
    ];
}

impl AnnotationProvider for ResiduePropertiesProvider {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn writes(&self) -> &[&'static str] {
        &Self::WRITES
    }

    fn annotate(
        &self,
        structure: &Structure,
        _inputs: &SideInputs,
    ) -> Result<AnnotationLayer, AnnotationError> {
        let mut layer = AnnotationLayer::new(Self::NAME);
        for (residue_id, residue) in structure.residues_iter() {
            let Some(key) = structure.residue_key(residue_id) else {
                continue;
            };
            let target = AnnotationTarget::Residue(key);
            let code = chemistry::one_letter_code(&residue.name);
            let hydrophobic = match code {
                Some(_) => AttributeValue::Bool(chemistry::is_hydrophobic(&residue.name)),
                None => AttributeValue::Missing,
            };
            layer.set(target, "one_letter_code", code);
            layer.set(target, "hydrophobic", hydrophobic);
            layer.set(
                target,
                "isoelectric_point",
                chemistry::isoelectric_point(&residue.name),
            );
            layer.set(
                target,
                "molecular_weight",
                chemistry::molecular_weight(&residue.name),
            );
        }
        Ok(layer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::builder::{AtomRecord, StructureBuilder};
    use crate::core::models::chain::ChainType;
    use crate::core::models::residue::ResidueKey;
    use nalgebra::Point3;

    #[test]
    fn annotate_writes_chemistry_and_missing_for_unknown_residues() {
        let mut builder = StructureBuilder::new("props");
        builder
            .start_chain('A', ChainType::Protein)
            .start_residue(1, None, "LEU", false)
            .add_atom(AtomRecord::new("CA", Point3::origin()))
            .start_residue(2, None, "XYZ", false)
            .add_atom(AtomRecord::new("CA", Point3::origin()));
        let structure = builder.build().unwrap();

        let layer = ResiduePropertiesProvider
            .annotate(&structure, &SideInputs::new())
            .unwrap();
        let leu = AnnotationTarget::Residue(ResidueKey::new('A', 1, None));
        let unknown = AnnotationTarget::Residue(ResidueKey::new('A', 2, None));

        assert_eq!(layer.get(&leu, "one_letter_code"), Some(&AttributeValue::from("L")));
        assert_eq!(layer.get(&leu, "hydrophobic"), Some(&AttributeValue::Bool(true)));
        assert_eq!(layer.get(&leu, "isoelectric_point"), Some(&AttributeValue::Float(6.04)));
        assert_eq!(layer.get(&unknown, "one_letter_code"), Some(&AttributeValue::Missing));
        assert_eq!(layer.get(&unknown, "hydrophobic"), Some(&AttributeValue::Missing));
        assert_eq!(layer.get(&unknown, "molecular_weight"), Some(&AttributeValue::Missing));
    }
}
