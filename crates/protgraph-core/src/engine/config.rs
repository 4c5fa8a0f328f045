use super::annotations::ToolKind;
use crate::core::models::structure::AtomFallback;
use crate::core::processing::ProcessingConfig;
use std::collections::BTreeSet;
use thiserror::Error;

pub use crate::core::graph::Granularity;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigurationError {
    #[error("Unknown annotation provider '{0}'")]
    UnknownProvider(String),

    #[error("Unknown edge strategy '{0}'")]
    UnknownStrategy(String),

    #[error("Edge rule '{0}' is configured more than once")]
    DuplicateRule(String),

    #[error("Annotation provider '{0}' is enabled more than once")]
    DuplicateProvider(String),

    #[error("'{name}' is already registered")]
    DuplicateRegistration { name: String },

    #[error("Attribute '{attribute}' is written by both '{first}' and '{second}'")]
    ConflictingWriters {
        attribute: String,
        first: String,
        second: String,
    },

    #[error("'{consumer}' needs attribute '{attribute}', which no enabled provider writes")]
    UnsatisfiedRequirement { consumer: String, attribute: String },

    #[error("Provider '{provider}' needs {tool} output, which was not supplied")]
    MissingSideInput { provider: String, tool: ToolKind },

    #[error("Invalid parameter '{parameter}' for rule '{rule}': {reason}")]
    InvalidParameter {
        rule: String,
        parameter: &'static str,
        reason: String,
    },
}

/// How a residue node obtains its position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodePosition {
    /// A named atom, with a fallback when it is absent.
    Representative { atom: String, fallback: AtomFallback },
    /// The mean position of all atoms of the residue.
    Centroid,
}

impl Default for NodePosition {
    fn default() -> Self {
        NodePosition::Representative {
            atom: "CA".to_string(),
            fallback: AtomFallback::Strict,
        }
    }
}

/// What happens when a node position cannot be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingAtomPolicy {
    #[default]
    Fail,
    /// Drop the node and list it in provenance.
    ExcludeNode,
}

/// What happens when an annotation provider fails as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnnotationPolicy {
    #[default]
    Abort,
    /// Build the graph without the failed layer and record the failure in provenance.
    ContinueWithoutLayer,
}

/// An edge construction rule with its parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum EdgeRule {
    PeptideBond,
    DistanceThreshold {
        cutoff: f64,
        min_sequence_separation: usize,
    },
    KNearest {
        k: usize,
    },
    HydrogenBond {
        max_distance: f64,
        min_angle_degrees: f64,
        min_sequence_separation: usize,
    },
    Hydrophobic {
        cutoff: f64,
    },
    Disulfide {
        cutoff: f64,
    },
    Ionic {
        cutoff: f64,
    },
    Aromatic {
        min_distance: f64,
        max_distance: f64,
    },
    /// A strategy registered by name in the [`Registry`](super::registry::Registry).
    Custom {
        name: String,
    },
}

impl EdgeRule {
    pub const PEPTIDE_BOND: &'static str = "peptide_bond";
    pub const DISTANCE_THRESHOLD: &'static str = "distance_threshold";
    pub const K_NEAREST: &'static str = "k_nearest";
    pub const HYDROGEN_BOND: &'static str = "hydrogen_bond";
    pub const HYDROPHOBIC: &'static str = "hydrophobic";
    pub const DISULFIDE: &'static str = "disulfide";
    pub const IONIC: &'static str = "ionic";
    pub const AROMATIC: &'static str = "aromatic";

    pub const BUILTIN_NAMES: [&'static str; 8] = [
        Self::PEPTIDE_BOND,
        Self::DISTANCE_THRESHOLD,
        Self::K_NEAREST,
        Self::HYDROGEN_BOND,
        Self::HYDROPHOBIC,
        Self::DISULFIDE,
        Self::IONIC,
        Self::AROMATIC,
    ];

    pub fn name(&self) -> &str {
        match self {
            EdgeRule::PeptideBond => Self::PEPTIDE_BOND,
            EdgeRule::DistanceThreshold { .. } => Self::DISTANCE_THRESHOLD,
            EdgeRule::KNearest { .. } => Self::K_NEAREST,
            EdgeRule::HydrogenBond { .. } => Self::HYDROGEN_BOND,
            EdgeRule::Hydrophobic { .. } => Self::HYDROPHOBIC,
            EdgeRule::Disulfide { .. } => Self::DISULFIDE,
            EdgeRule::Ionic { .. } => Self::IONIC,
            EdgeRule::Aromatic { .. } => Self::AROMATIC,
            EdgeRule::Custom { name } => name.as_str(),
        }
    }

    /// The built-in rule of the given name with its default parameters.
    pub fn default_for(name: &str) -> Option<Self> {
        let rule = match name {
            Self::PEPTIDE_BOND => EdgeRule::PeptideBond,
            Self::DISTANCE_THRESHOLD => EdgeRule::DistanceThreshold {
                cutoff: 10.0,
                min_sequence_separation: 0,
            },
            Self::K_NEAREST => EdgeRule::KNearest { k: 5 },
            Self::HYDROGEN_BOND => EdgeRule::HydrogenBond {
                max_distance: 3.5,
                min_angle_degrees: 90.0,
                min_sequence_separation: 2,
            },
            Self::HYDROPHOBIC => EdgeRule::Hydrophobic { cutoff: 5.0 },
            Self::DISULFIDE => EdgeRule::Disulfide { cutoff: 2.2 },
            Self::IONIC => EdgeRule::Ionic { cutoff: 6.0 },
            Self::AROMATIC => EdgeRule::Aromatic {
                min_distance: 4.0,
                max_distance: 7.0,
            },
            _ => return None,
        };
        Some(rule)
    }

    /// Checks the rule's parameters.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::InvalidParameter`] for a zero `k`, non-positive or
    /// non-finite distances and inverted distance ranges.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let invalid = |parameter: &'static str, reason: String| {
            Err(ConfigurationError::InvalidParameter {
                rule: self.name().to_string(),
                parameter,
                reason,
            })
        };
        let positive = |parameter: &'static str, value: f64| {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                invalid(parameter, format!("must be a positive distance, got {}", value))
            }
        };
        match self {
            EdgeRule::PeptideBond => Ok(()),
            EdgeRule::DistanceThreshold { cutoff, .. } => positive("cutoff", *cutoff),
            EdgeRule::KNearest { k } if *k == 0 => invalid("k", "must be at least 1".to_string()),
            EdgeRule::KNearest { .. } => Ok(()),
            EdgeRule::HydrogenBond {
                max_distance,
                min_angle_degrees,
                ..
            } => {
                positive("max_distance", *max_distance)?;
                if (0.0..=180.0).contains(min_angle_degrees) {
                    Ok(())
                } else {
                    invalid(
                        "min_angle_degrees",
                        format!("must lie in [0, 180], got {}", min_angle_degrees),
                    )
                }
            }
            EdgeRule::Hydrophobic { cutoff }
            | EdgeRule::Disulfide { cutoff }
            | EdgeRule::Ionic { cutoff } => positive("cutoff", *cutoff),
            EdgeRule::Aromatic {
                min_distance,
                max_distance,
            } => {
                positive("max_distance", *max_distance)?;
                if min_distance.is_finite() && *min_distance >= 0.0 && min_distance <= max_distance
                {
                    Ok(())
                } else {
                    invalid(
                        "min_distance",
                        format!("must lie in [0, {}], got {}", max_distance, min_distance),
                    )
                }
            }
            EdgeRule::Custom { name } if name.trim().is_empty() => {
                invalid("name", "must not be empty".to_string())
            }
            EdgeRule::Custom { .. } => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GraphConfig {
    pub granularity: Granularity,
    pub node_position: NodePosition,
    pub missing_atom_policy: MissingAtomPolicy,
    /// Enabled annotation providers, by registered name.
    pub providers: Vec<String>,
    pub edge_rules: Vec<EdgeRule>,
    pub annotation_policy: AnnotationPolicy,
    /// Attributes every graph must carry; each must be written by an enabled provider.
    pub required_attributes: BTreeSet<String>,
    pub processing: ProcessingConfig,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            granularity: Granularity::Residue,
            node_position: NodePosition::default(),
            missing_atom_policy: MissingAtomPolicy::Fail,
            providers: Vec::new(),
            edge_rules: vec![EdgeRule::PeptideBond],
            annotation_policy: AnnotationPolicy::Abort,
            required_attributes: BTreeSet::new(),
            processing: ProcessingConfig::default(),
        }
    }
}

#[derive(Default)]
pub struct GraphConfigBuilder {
    granularity: Option<Granularity>,
    node_position: Option<NodePosition>,
    missing_atom_policy: Option<MissingAtomPolicy>,
    providers: Vec<String>,
    edge_rules: Option<Vec<EdgeRule>>,
    annotation_policy: Option<AnnotationPolicy>,
    required_attributes: BTreeSet<String>,
    processing: Option<ProcessingConfig>,
}

impl GraphConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn granularity(mut self, granularity: Granularity) -> Self {
        self.granularity = Some(granularity);
        self
    }
    pub fn node_position(mut self, position: NodePosition) -> Self {
        self.node_position = Some(position);
        self
    }
    pub fn missing_atom_policy(mut self, policy: MissingAtomPolicy) -> Self {
        self.missing_atom_policy = Some(policy);
        self
    }
    pub fn provider(mut self, name: &str) -> Self {
        self.providers.push(name.to_string());
        self
    }
    /// Adds an edge rule; the first call replaces the default `peptide_bond` rule set.
    pub fn edge_rule(mut self, rule: EdgeRule) -> Self {
        self.edge_rules.get_or_insert_with(Vec::new).push(rule);
        self
    }
    pub fn annotation_policy(mut self, policy: AnnotationPolicy) -> Self {
        self.annotation_policy = Some(policy);
        self
    }
    pub fn require_attribute(mut self, attribute: &str) -> Self {
        self.required_attributes.insert(attribute.to_string());
        self
    }
    pub fn processing(mut self, processing: ProcessingConfig) -> Self {
        self.processing = Some(processing);
        self
    }

    /// Builds the configuration, checking rule parameters and duplicate names.
    ///
    /// Cross-checks against registered providers and strategies happen when an
    /// [`Assembler`](super::assembler::Assembler) is created.
    pub fn build(self) -> Result<GraphConfig, ConfigurationError> {
        let defaults = GraphConfig::default();
        let config = GraphConfig {
            granularity: self.granularity.unwrap_or(defaults.granularity),
            node_position: self.node_position.unwrap_or(defaults.node_position),
            missing_atom_policy: self
                .missing_atom_policy
                .unwrap_or(defaults.missing_atom_policy),
            providers: self.providers,
            edge_rules: self.edge_rules.unwrap_or(defaults.edge_rules),
            annotation_policy: self.annotation_policy.unwrap_or(defaults.annotation_policy),
            required_attributes: self.required_attributes,
            processing: self.processing.unwrap_or(defaults.processing),
        };
        config.validate_local()?;
        Ok(config)
    }
}

impl GraphConfig {
    /// Checks everything that does not depend on the registry.
    pub fn validate_local(&self) -> Result<(), ConfigurationError> {
        let mut rule_names = BTreeSet::new();
        for rule in &self.edge_rules {
            rule.validate()?;
            if !rule_names.insert(rule.name()) {
                return Err(ConfigurationError::DuplicateRule(rule.name().to_string()));
            }
        }
        let mut provider_names = BTreeSet::new();
        for provider in &self.providers {
            if !provider_names.insert(provider.as_str()) {
                return Err(ConfigurationError::DuplicateProvider(provider.clone()));
            }
        }
        Ok(())
    }
}
