use crate::error::{CliError, Result};
use protgraph::engine::config as core_config;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum FileGranularity {
    Residue,
    Atom,
}

impl From<FileGranularity> for core_config::Granularity {
    fn from(g: FileGranularity) -> Self {
        match g {
            FileGranularity::Residue => core_config::Granularity::Residue,
            FileGranularity::Atom => core_config::Granularity::Atom,
        }
    }
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum FileMissingAtomPolicy {
    Fail,
    ExcludeNode,
}

impl From<FileMissingAtomPolicy> for core_config::MissingAtomPolicy {
    fn from(p: FileMissingAtomPolicy) -> Self {
        match p {
            FileMissingAtomPolicy::Fail => core_config::MissingAtomPolicy::Fail,
            FileMissingAtomPolicy::ExcludeNode => core_config::MissingAtomPolicy::ExcludeNode,
        }
    }
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum FileAnnotationPolicy {
    Abort,
    Continue,
}

impl From<FileAnnotationPolicy> for core_config::AnnotationPolicy {
    fn from(p: FileAnnotationPolicy) -> Self {
        match p {
            FileAnnotationPolicy::Abort => core_config::AnnotationPolicy::Abort,
            FileAnnotationPolicy::Continue => core_config::AnnotationPolicy::ContinueWithoutLayer,
        }
    }
}

/// One `[[edge-rules]]` entry. Parameters left out keep the rule's defaults.
#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileEdgeRule {
    pub name: String,
    pub cutoff: Option<f64>,
    pub min_sequence_separation: Option<usize>,
    pub k: Option<usize>,
    pub max_distance: Option<f64>,
    pub min_angle_degrees: Option<f64>,
    pub min_distance: Option<f64>,
}

impl FileEdgeRule {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    fn given_parameters(&self) -> BTreeSet<&'static str> {
        [
            ("cutoff", self.cutoff.is_some()),
            ("min-sequence-separation", self.min_sequence_separation.is_some()),
            ("k", self.k.is_some()),
            ("max-distance", self.max_distance.is_some()),
            ("min-angle-degrees", self.min_angle_degrees.is_some()),
            ("min-distance", self.min_distance.is_some()),
        ]
        .into_iter()
        .filter_map(|(key, given)| given.then_some(key))
        .collect()
    }

    /// Resolves the entry to a core rule.
    ///
    /// Names that are not built in become [`core_config::EdgeRule::Custom`] and must not
    /// carry parameters. A parameter the named rule does not take is an error.
    pub fn into_rule(self) -> Result<core_config::EdgeRule> {
        let mut unused = self.given_parameters();

        let Some(mut rule) = core_config::EdgeRule::default_for(&self.name) else {
            if let Some(parameter) = unused.first() {
                return Err(CliError::Config(format!(
                    "Edge rule '{}' is not built in and takes no '{}' parameter",
                    self.name, parameter
                )));
            }
            return Ok(core_config::EdgeRule::Custom { name: self.name });
        };

        match &mut rule {
            core_config::EdgeRule::PeptideBond | core_config::EdgeRule::Custom { .. } => {}
            core_config::EdgeRule::DistanceThreshold {
                cutoff,
                min_sequence_separation,
            } => {
                take(&mut unused, "cutoff", self.cutoff, cutoff);
                take(
                    &mut unused,
                    "min-sequence-separation",
                    self.min_sequence_separation,
                    min_sequence_separation,
                );
            }
            core_config::EdgeRule::KNearest { k } => {
                take(&mut unused, "k", self.k, k);
            }
            core_config::EdgeRule::HydrogenBond {
                max_distance,
                min_angle_degrees,
                min_sequence_separation,
            } => {
                take(&mut unused, "max-distance", self.max_distance, max_distance);
                take(
                    &mut unused,
                    "min-angle-degrees",
                    self.min_angle_degrees,
                    min_angle_degrees,
                );
                take(
                    &mut unused,
                    "min-sequence-separation",
                    self.min_sequence_separation,
                    min_sequence_separation,
                );
            }
            core_config::EdgeRule::Hydrophobic { cutoff }
            | core_config::EdgeRule::Disulfide { cutoff }
            | core_config::EdgeRule::Ionic { cutoff } => {
                take(&mut unused, "cutoff", self.cutoff, cutoff);
            }
            core_config::EdgeRule::Aromatic {
                min_distance,
                max_distance,
            } => {
                take(&mut unused, "min-distance", self.min_distance, min_distance);
                take(&mut unused, "max-distance", self.max_distance, max_distance);
            }
        }

        if let Some(parameter) = unused.first() {
            return Err(CliError::Config(format!(
                "Edge rule '{}' does not take a '{}' parameter",
                self.name, parameter
            )));
        }
        Ok(rule)
    }
}

fn take<T>(unused: &mut BTreeSet<&'static str>, key: &'static str, value: Option<T>, slot: &mut T) {
    if let Some(value) = value {
        *slot = value;
        unused.remove(key);
    }
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileProcessingConfig {
    pub deprotonate: Option<bool>,
    pub keep_insertions: Option<bool>,
    pub chains: Option<Vec<char>>,
    pub keep_hets: Option<Vec<String>>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileSideInputs {
    pub dssp_dir: Option<PathBuf>,
    pub blast_dir: Option<PathBuf>,
    pub clusters: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileConfig {
    pub granularity: Option<FileGranularity>,
    /// A representative atom name, or `centroid`.
    pub node_position: Option<String>,
    /// An atom name, `centroid` or `strict`; only used with a representative atom.
    pub node_fallback: Option<String>,
    pub missing_atom_policy: Option<FileMissingAtomPolicy>,
    pub annotation_policy: Option<FileAnnotationPolicy>,
    pub providers: Option<Vec<String>>,
    pub required_attributes: Option<Vec<String>>,
    pub edge_rules: Option<Vec<FileEdgeRule>>,
    pub processing: Option<FileProcessingConfig>,
    pub side_inputs: Option<FileSideInputs>,
}

impl FileConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content).map_err(|source| CliError::FileParsing {
            path: path.to_path_buf(),
            source,
        })
    }

    fn from_toml(content: &str) -> std::result::Result<Self, anyhow::Error> {
        Ok(toml::from_str(content)?)
    }
}
