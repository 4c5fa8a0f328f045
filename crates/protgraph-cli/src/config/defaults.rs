use protgraph::engine::config::{AnnotationPolicy, EdgeRule, Granularity, MissingAtomPolicy};

pub struct DefaultsConfig {
    pub granularity: Granularity,
    pub representative_atom: String,
    pub missing_atom_policy: MissingAtomPolicy,
    pub annotation_policy: AnnotationPolicy,
    pub edge_rules: Vec<String>,
    pub deprotonate: bool,
    pub keep_insertions: bool,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            granularity: Granularity::Residue,
            representative_atom: "CA".to_string(),
            missing_atom_policy: MissingAtomPolicy::Fail,
            annotation_policy: AnnotationPolicy::Abort,
            edge_rules: vec![EdgeRule::PEPTIDE_BOND.to_string()],
            deprotonate: true,
            keep_insertions: false,
        }
    }
}
