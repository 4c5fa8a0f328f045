use super::{EdgeCandidate, EdgeContext, EdgeStrategy, too_close_in_sequence};
use crate::core::models::ids::ResidueId;
use crate::core::models::residue::ResidueKey;
use crate::core::utils::geometry;
use crate::engine::config::EdgeRule;
use crate::engine::error::GraphError;
use nalgebra::Point3;

/// Three-state secondary structure class used to decide whether two residues may bond.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SsClass {
    Helix,
    Strand,
}

impl SsClass {
    /// `None` for coil and unknown codes; coil residues never pair.
    fn from_code(code: &str) -> Option<Self> {
        match code {
            "H" | "G" | "I" => Some(SsClass::Helix),
            "E" | "B" => Some(SsClass::Strand),
            _ => None,
        }
    }
}

struct BackboneSite {
    residue_id: ResidueId,
    key: ResidueKey,
    class: SsClass,
    donor: Option<Point3<f64>>,
    acceptor: Option<(Point3<f64>, Point3<f64>)>,
}

/// Backbone hydrogen bonds between the amide `N(i)` and carbonyl `O(j)` of residues with
/// compatible secondary structure.
#[derive(Debug, Clone, Copy)]
pub struct HydrogenBondStrategy {
    pub max_distance: f64,
    pub min_angle_degrees: f64,
    pub min_sequence_separation: usize,
}

impl HydrogenBondStrategy {
    const REQUIRES: [&'static str; 1] = ["ss"];

    fn sites(&self, context: &EdgeContext<'_>) -> Vec<BackboneSite> {
        let structure = context.structure;
        structure
            .residues_iter()
            .filter(|(_, residue)| !residue.is_hetero)
            .filter_map(|(residue_id, residue)| {
                let key = structure.residue_key(residue_id)?;
                let class = context
                    .annotations
                    .residue_attribute(&key, "ss")
                    .and_then(|value| value.as_str())
                    .and_then(SsClass::from_code)?;
                let position = |name: &str| structure.atom_by_name(residue_id, name).map(|a| a.position);
                let donor = if residue.name == "PRO" { None } else { position("N") };
                let acceptor = position("C").zip(position("O"));
                Some(BackboneSite {
                    residue_id,
                    key,
                    class,
                    donor,
                    acceptor,
                })
            })
            .collect()
    }
}

impl EdgeStrategy for HydrogenBondStrategy {
    fn name(&self) -> &str {
        EdgeRule::HYDROGEN_BOND
    }

    fn requires(&self) -> &[&'static str] {
        &Self::REQUIRES
    }

    fn build_edges(&self, context: &EdgeContext<'_>) -> Result<Vec<EdgeCandidate>, GraphError> {
        let sites = self.sites(context);
        let mut candidates = Vec::new();

        for donor_site in &sites {
            let Some(n) = donor_site.donor else { continue };
            for acceptor_site in &sites {
                if donor_site.residue_id == acceptor_site.residue_id
                    || donor_site.class != acceptor_site.class
                    || too_close_in_sequence(
                        &donor_site.key,
                        &acceptor_site.key,
                        self.min_sequence_separation,
                    )
                {
                    continue;
                }
                let Some((c, o)) = acceptor_site.acceptor else { continue };

                let distance = geometry::distance(&n, &o);
                if distance > self.max_distance {
                    continue;
                }
                let Some(angle) = geometry::angle_degrees(&c, &o, &n) else {
                    continue;
                };
                if angle < self.min_angle_degrees {
                    continue;
                }

                let layout = context.layout;
                let source = layout.residue_node(context.structure, donor_site.residue_id, Some("N"));
                let target = layout.residue_node(context.structure, acceptor_site.residue_id, Some("O"));
                if let (Some(source), Some(target)) = (source, target) {
                    candidates.extend(EdgeCandidate::new(source, target, self.name()).map(|candidate| {
                        candidate
                            .with_metadata("distance", distance)
                            .with_metadata("angle", angle)
                    }));
                }
            }
        }
        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::graph::Granularity;
    use crate::core::models::builder::{AtomRecord, StructureBuilder};
    use crate::core::models::chain::ChainType;
    use crate::core::models::structure::Structure;
    use crate::engine::annotations::{AnnotationLayer, AnnotationSet, AnnotationTarget};
    use crate::engine::edges::tests::{layout, run};
    use std::collections::BTreeSet;

    fn strategy() -> HydrogenBondStrategy {
        HydrogenBondStrategy {
            max_distance: 3.5,
            min_angle_degrees: 90.0,
            min_sequence_separation: 2,
        }
    }

    // Residue 1 donates N(1) at the origin to O(5) 2.9 Å above it. Every other backbone
    // atom is far away, so at most one bond exists.
    fn structure(donor_name: &str, acceptor_carbon: [f64; 3]) -> Structure {
        let [cx, cy, cz] = acceptor_carbon;
        let mut builder = StructureBuilder::new("hbond");
        builder
            .start_chain('A', ChainType::Protein)
            .start_residue(1, None, donor_name, false)
            .add_atom(AtomRecord::new("N", Point3::new(0.0, 0.0, 0.0)))
            .add_atom(AtomRecord::new("CA", Point3::new(-1.0, 0.0, 0.0)))
            .add_atom(AtomRecord::new("C", Point3::new(21.0, 0.0, 0.0)))
            .add_atom(AtomRecord::new("O", Point3::new(20.0, 0.0, 0.0)))
            .start_residue(5, None, "ALA", false)
            .add_atom(AtomRecord::new("N", Point3::new(30.0, 0.0, 0.0)))
            .add_atom(AtomRecord::new("CA", Point3::new(0.0, 0.0, 5.0)))
            .add_atom(AtomRecord::new("C", Point3::new(cx, cy, cz)))
            .add_atom(AtomRecord::new("O", Point3::new(0.0, 0.0, 2.9)));
        builder.build().unwrap()
    }

    fn linear() -> Structure {
        structure("ALA", [0.0, 0.0, 4.1])
    }

    fn annotations(first: &str, second: &str) -> AnnotationSet {
        let mut layer = AnnotationLayer::new("secondary_structure");
        layer.set(AnnotationTarget::Residue(ResidueKey::new('A', 1, None)), "ss", first);
        layer.set(AnnotationTarget::Residue(ResidueKey::new('A', 5, None)), "ss", second);
        let mut set = AnnotationSet::new();
        set.insert(layer, &["ss"]);
        set
    }

    #[test]
    fn bonds_residues_in_the_same_helix() {
        let s = linear();
        let l = layout(&s, Granularity::Residue);
        assert_eq!(
            run(&strategy(), &s, &l, &annotations("H", "G")),
            BTreeSet::from([(0, 1)])
        );
    }

    #[test]
    fn incompatible_or_coil_states_never_bond() {
        let s = linear();
        let l = layout(&s, Granularity::Residue);
        assert!(run(&strategy(), &s, &l, &annotations("H", "E")).is_empty());
        assert!(run(&strategy(), &s, &l, &annotations("-", "-")).is_empty());
    }

    #[test]
    fn residues_without_secondary_structure_are_excluded() {
        let s = linear();
        let l = layout(&s, Granularity::Residue);
        assert!(run(&strategy(), &s, &l, &AnnotationSet::new()).is_empty());
    }

    #[test]
    fn rejects_bonds_below_the_minimum_angle() {
        let s = structure("ALA", [0.0, 0.8, 2.0]);
        let l = layout(&s, Granularity::Residue);
        assert!(run(&strategy(), &s, &l, &annotations("E", "E")).is_empty());
    }

    #[test]
    fn proline_cannot_donate() {
        let s = structure("PRO", [0.0, 0.0, 4.1]);
        let l = layout(&s, Granularity::Residue);
        assert!(run(&strategy(), &s, &l, &annotations("H", "H")).is_empty());
    }

    #[test]
    fn honours_minimum_sequence_separation() {
        let s = linear();
        let l = layout(&s, Granularity::Residue);
        let strict = HydrogenBondStrategy {
            min_sequence_separation: 5,
            ..strategy()
        };
        assert!(run(&strict, &s, &l, &annotations("H", "H")).is_empty());
    }

    #[test]
    fn atom_granularity_connects_nitrogen_and_oxygen() {
        let s = linear();
        let l = layout(&s, Granularity::Atom);
        // N(1) is node 0; O(5) is the last of eight atoms.
        assert_eq!(
            run(&strategy(), &s, &l, &annotations("H", "H")),
            BTreeSet::from([(0, 7)])
        );
    }

    #[test]
    fn records_distance_and_angle() {
        let s = linear();
        let l = layout(&s, Granularity::Residue);
        let set = annotations("H", "H");
        let context = EdgeContext {
            structure: &s,
            layout: &l,
            annotations: &set,
        };
        let candidates = strategy().build_edges(&context).unwrap();
        assert_eq!(candidates.len(), 1);
        let distance = candidates[0].metadata["distance"].as_f64().unwrap();
        let angle = candidates[0].metadata["angle"].as_f64().unwrap();
        assert!((distance - 2.9).abs() < 1e-9);
        assert!((angle - 180.0).abs() < 1e-6);
    }
}
