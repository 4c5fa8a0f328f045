//! Annotation layers and the providers that compute them.
//!
//! A provider turns a [`Structure`] plus, optionally, the text output of one external tool
//! into an [`AnnotationLayer`]: attribute values attached to residues, chains or the whole
//! structure. Providers are pure. They never run tools or touch the file system, and a
//! residue the tool did not resolve receives [`AttributeValue::Missing`] instead of failing
//! the layer.

pub mod clustering;
pub mod homology;
pub mod properties;
pub mod secondary_structure;

use crate::core::models::residue::ResidueKey;
use crate::core::models::structure::Structure;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use thiserror::Error;

pub use crate::core::graph::attributes::AttributeValue;

/// External tools whose output can feed a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ToolKind {
    Dssp,
    Blast,
    Clusters,
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolKind::Dssp => write!(f, "DSSP"),
            ToolKind::Blast => write!(f, "BLAST"),
            ToolKind::Clusters => write!(f, "cluster table"),
        }
    }
}

/// The result of running an external tool, as handed to the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolOutput {
    Completed(String),
    Failed { reason: String },
    TimedOut { seconds: u64 },
}

impl ToolOutput {
    pub fn is_completed(&self) -> bool {
        matches!(self, ToolOutput::Completed(_))
    }
}

/// Tool outputs available for one structure.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SideInputs {
    outputs: BTreeMap<ToolKind, ToolOutput>,
}

impl SideInputs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, tool: ToolKind, output: ToolOutput) -> Self {
        self.insert(tool, output);
        self
    }

    pub fn insert(&mut self, tool: ToolKind, output: ToolOutput) {
        self.outputs.insert(tool, output);
    }

    pub fn get(&self, tool: ToolKind) -> Option<&ToolOutput> {
        self.outputs.get(&tool)
    }

    pub fn contains(&self, tool: ToolKind) -> bool {
        self.outputs.contains_key(&tool)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AnnotationError {
    #[error("Provider '{provider}' for structure '{structure}': {tool} failed: {reason}")]
    ToolFailed {
        provider: String,
        structure: String,
        tool: ToolKind,
        reason: String,
    },

    #[error("Provider '{provider}' for structure '{structure}': {tool} timed out after {seconds}s")]
    ToolTimedOut {
        provider: String,
        structure: String,
        tool: ToolKind,
        seconds: u64,
    },

    #[error("Provider '{provider}' for structure '{structure}': no {tool} output supplied")]
    MissingSideInput {
        provider: String,
        structure: String,
        tool: ToolKind,
    },

    #[error("Provider '{provider}' for structure '{structure}': malformed {tool} output: {reason}")]
    MalformedOutput {
        provider: String,
        structure: String,
        tool: ToolKind,
        reason: String,
    },

    #[error("Required attribute '{attribute}' is unavailable for structure '{structure}'")]
    RequiredAttributeUnavailable { attribute: String, structure: String },
}

impl AnnotationError {
    /// Builds a `MalformedOutput` error from a parser error.
    pub fn malformed(
        provider: &str,
        structure: &Structure,
        tool: ToolKind,
        reason: impl fmt::Display,
    ) -> Self {
        AnnotationError::MalformedOutput {
            provider: provider.to_string(),
            structure: structure.name().to_string(),
            tool,
            reason: reason.to_string(),
        }
    }
}

/// Where an annotation value is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AnnotationTarget {
    Residue(ResidueKey),
    Chain(char),
    Structure,
}

pub type Attributes = BTreeMap<String, AttributeValue>;

/// The attribute values produced by one provider for one structure.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AnnotationLayer {
    provider: String,
    values: BTreeMap<AnnotationTarget, Attributes>,
}

impl AnnotationLayer {
    pub fn new(provider: &str) -> Self {
        Self {
            provider: provider.to_string(),
            values: BTreeMap::new(),
        }
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn set(
        &mut self,
        target: AnnotationTarget,
        attribute: &str,
        value: impl Into<AttributeValue>,
    ) {
        self.values
            .entry(target)
            .or_default()
            .insert(attribute.to_string(), value.into());
    }

    pub fn get(&self, target: &AnnotationTarget, attribute: &str) -> Option<&AttributeValue> {
        self.values.get(target).and_then(|attrs| attrs.get(attribute))
    }

    pub fn attributes(&self, target: &AnnotationTarget) -> Option<&Attributes> {
        self.values.get(target)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&AnnotationTarget, &Attributes)> {
        self.values.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// All layers applied to one structure, keyed by provider name.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AnnotationSet {
    layers: BTreeMap<String, AnnotationLayer>,
    available: BTreeSet<String>,
}

impl AnnotationSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a layer and marks the attributes its provider declares as available.
    pub fn insert(&mut self, layer: AnnotationLayer, writes: &[&str]) {
        self.available
            .extend(writes.iter().map(|attribute| attribute.to_string()));
        self.layers.insert(layer.provider.clone(), layer);
    }

    pub fn layer(&self, provider: &str) -> Option<&AnnotationLayer> {
        self.layers.get(provider)
    }

    pub fn layers(&self) -> impl Iterator<Item = &AnnotationLayer> {
        self.layers.values()
    }

    /// Whether some applied layer declares the attribute.
    pub fn has_attribute(&self, attribute: &str) -> bool {
        self.available.contains(attribute)
    }

    pub fn get(&self, target: &AnnotationTarget, attribute: &str) -> Option<&AttributeValue> {
        self.layers
            .values()
            .find_map(|layer| layer.get(target, attribute))
    }

    pub fn residue_attribute(&self, key: &ResidueKey, attribute: &str) -> Option<&AttributeValue> {
        self.get(&AnnotationTarget::Residue(*key), attribute)
    }

    /// Every attribute attached to a target across all layers, ordered by name.
    pub fn merged(&self, target: &AnnotationTarget) -> Attributes {
        self.layers
            .values()
            .filter_map(|layer| layer.attributes(target))
            .flat_map(|attrs| attrs.iter().map(|(k, v)| (k.clone(), v.clone())))
            .collect()
    }
}

/// Computes one annotation layer for a structure.
pub trait AnnotationProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Attributes of other layers this provider depends on.
    fn reads(&self) -> &[&'static str] {
        &[]
    }

    /// Attributes this provider writes.
    fn writes(&self) -> &[&'static str];

    /// The external tool whose output this provider parses, if any.
    fn side_input(&self) -> Option<ToolKind> {
        None
    }

    fn annotate(
        &self,
        structure: &Structure,
        inputs: &SideInputs,
    ) -> Result<AnnotationLayer, AnnotationError>;
}

/// Resolves a provider's side input to tool text, mapping failed, timed-out and absent
/// outputs to errors.
pub(crate) fn tool_text<'a>(
    provider: &str,
    structure: &Structure,
    tool: ToolKind,
    inputs: &'a SideInputs,
) -> Result<&'a str, AnnotationError> {
    let provider = provider.to_string();
    let structure = structure.name().to_string();
    match inputs.get(tool) {
        Some(ToolOutput::Completed(text)) => Ok(text.as_str()),
        Some(ToolOutput::Failed { reason }) => Err(AnnotationError::ToolFailed {
            provider,
            structure,
            tool,
            reason: reason.clone(),
        }),
        Some(ToolOutput::TimedOut { seconds }) => Err(AnnotationError::ToolTimedOut {
            provider,
            structure,
            tool,
            seconds: *seconds,
        }),
        None => Err(AnnotationError::MissingSideInput {
            provider,
            structure,
            tool,
        }),
    }
}

/// Sequence identifier of a chain in external sequence tools: `<structure>_<chain>`.
pub fn sequence_identifier(structure: &Structure, chain: char) -> String {
    format!("{}_{}", structure.name(), chain)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::core::models::builder::{AtomRecord, StructureBuilder};
    use crate::core::models::chain::ChainType;
    use nalgebra::Point3;

    /// A two-chain structure: chain A `MKV` (residues 1-3) and chain B `G` (residue 10).
    pub(crate) fn small_structure() -> Structure {
        let mut builder = StructureBuilder::new("1abc");
        builder.start_chain('A', ChainType::Protein);
        for (number, name) in [(1, "MET"), (2, "LYS"), (3, "VAL")] {
            builder
                .start_residue(number, None, name, false)
                .add_atom(AtomRecord::new("CA", Point3::new(number as f64 * 3.8, 0.0, 0.0)));
        }
        builder
            .start_chain('B', ChainType::Protein)
            .start_residue(10, None, "GLY", false)
            .add_atom(AtomRecord::new("CA", Point3::new(0.0, 10.0, 0.0)));
        builder.build().unwrap()
    }

    #[test]
    fn tool_text_maps_tool_outcomes_to_errors() {
        let structure = small_structure();
        let inputs = SideInputs::new()
            .with(ToolKind::Dssp, ToolOutput::Completed("text".to_string()))
            .with(ToolKind::Blast, ToolOutput::TimedOut { seconds: 30 })
            .with(
                ToolKind::Clusters,
                ToolOutput::Failed {
                    reason: "exit code 1".to_string(),
                },
            );

        assert_eq!(tool_text("p", &structure, ToolKind::Dssp, &inputs), Ok("text"));
        assert!(matches!(
            tool_text("p", &structure, ToolKind::Blast, &inputs),
            Err(AnnotationError::ToolTimedOut { seconds: 30, .. })
        ));
        let failed = tool_text("p", &structure, ToolKind::Clusters, &inputs).unwrap_err();
        assert!(failed.to_string().contains("exit code 1"));
        assert!(failed.to_string().contains("1abc"));
        assert!(matches!(
            tool_text("p", &structure, ToolKind::Dssp, &SideInputs::new()),
            Err(AnnotationError::MissingSideInput { .. })
        ));
    }

    #[test]
    fn annotation_set_tracks_declared_attributes_and_merges_targets() {
        let key = ResidueKey::new('A', 1, None);
        let mut first = AnnotationLayer::new("first");
        first.set(AnnotationTarget::Residue(key), "ss", "H");
        let mut second = AnnotationLayer::new("second");
        second.set(AnnotationTarget::Residue(key), "asa", 12.5);

        let mut set = AnnotationSet::new();
        set.insert(first, &["ss"]);
        set.insert(second, &["asa", "rsa"]);

        assert!(set.has_attribute("rsa"));
        assert!(!set.has_attribute("phi"));
        assert_eq!(set.residue_attribute(&key, "ss"), Some(&AttributeValue::from("H")));
        let merged = set.merged(&AnnotationTarget::Residue(key));
        assert_eq!(merged.keys().collect::<Vec<_>>(), vec!["asa", "ss"]);
    }
}
