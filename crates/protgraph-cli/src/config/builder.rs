use super::defaults::DefaultsConfig;
use super::file::{
    FileAnnotationPolicy, FileConfig, FileEdgeRule, FileGranularity, FileMissingAtomPolicy,
};
use super::models::{AppConfig, SideInputSources};
use crate::cli::{AnnotationPolicyArg, GranularityArg, GraphArgs};
use crate::error::{CliError, Result};
use protgraph::core::models::structure::AtomFallback;
use protgraph::core::processing::{ChainSelection, ProcessingConfig};
use protgraph::engine::config as core_config;
use std::collections::BTreeSet;
use std::path::PathBuf;

/// Merges command-line arguments, the optional config file and built-in defaults, in that
/// order of precedence.
pub fn build_config(args: &GraphArgs) -> Result<AppConfig> {
    let defaults = DefaultsConfig::default();

    let file_config = if let Some(config_path) = &args.config {
        FileConfig::from_file(config_path)?
    } else {
        FileConfig::default()
    };

    let mut file_config = apply_set_values(file_config, &args.set_values)?;

    let granularity = match args.granularity {
        Some(GranularityArg::Residue) => core_config::Granularity::Residue,
        Some(GranularityArg::Atom) => core_config::Granularity::Atom,
        None => file_config
            .granularity
            .map(Into::into)
            .unwrap_or(defaults.granularity),
    };

    let annotation_policy = match args.annotation_policy {
        Some(AnnotationPolicyArg::Abort) => core_config::AnnotationPolicy::Abort,
        Some(AnnotationPolicyArg::Continue) => {
            core_config::AnnotationPolicy::ContinueWithoutLayer
        }
        None => file_config
            .annotation_policy
            .map(Into::into)
            .unwrap_or(defaults.annotation_policy),
    };

    let missing_atom_policy = file_config
        .missing_atom_policy
        .map(Into::into)
        .unwrap_or(defaults.missing_atom_policy);

    let node_position = resolve_node_position(
        file_config.node_position.take(),
        file_config.node_fallback.take(),
        &defaults,
    );

    let providers = if args.providers.is_empty() {
        file_config.providers.take().unwrap_or_default()
    } else {
        args.providers.clone()
    };

    let edge_rules = if args.rules.is_empty() {
        file_config.edge_rules.take().unwrap_or_else(|| {
            defaults
                .edge_rules
                .iter()
                .map(|name| FileEdgeRule::named(name))
                .collect()
        })
    } else {
        args.rules.iter().map(|name| FileEdgeRule::named(name)).collect()
    };

    let processing_file = file_config.processing.take().unwrap_or_default();
    let processing = ProcessingConfig {
        deprotonate: processing_file
            .deprotonate
            .unwrap_or(defaults.deprotonate),
        keep_insertions: processing_file
            .keep_insertions
            .unwrap_or(defaults.keep_insertions),
        chain_selection: match processing_file.chains {
            Some(chains) => ChainSelection::Only(chains.into_iter().collect()),
            None => ChainSelection::All,
        },
        keep_hets: processing_file
            .keep_hets
            .unwrap_or_default()
            .into_iter()
            .map(|name| name.trim().to_ascii_uppercase())
            .collect::<BTreeSet<_>>(),
    };

    let sources_file = file_config.side_inputs.take().unwrap_or_default();
    let sources = SideInputSources {
        dssp_dir: args.dssp_dir.clone().or(sources_file.dssp_dir),
        blast_dir: args.blast_dir.clone().or(sources_file.blast_dir),
        clusters: args.clusters.clone().or(sources_file.clusters),
    };

    let mut builder = core_config::GraphConfigBuilder::new()
        .granularity(granularity)
        .node_position(node_position)
        .missing_atom_policy(missing_atom_policy)
        .annotation_policy(annotation_policy)
        .processing(processing);
    for provider in &providers {
        builder = builder.provider(provider);
    }
    for rule in edge_rules {
        builder = builder.edge_rule(rule.into_rule()?);
    }
    for attribute in file_config.required_attributes.take().unwrap_or_default() {
        builder = builder.require_attribute(&attribute);
    }

    let graph = builder
        .build()
        .map_err(|e| CliError::Config(e.to_string()))?;

    Ok(AppConfig { graph, sources })
}

fn resolve_node_position(
    atom: Option<String>,
    fallback: Option<String>,
    defaults: &DefaultsConfig,
) -> core_config::NodePosition {
    let atom = atom.unwrap_or_else(|| defaults.representative_atom.clone());
    if atom.eq_ignore_ascii_case("centroid") {
        return core_config::NodePosition::Centroid;
    }
    let fallback = match fallback.as_deref().map(str::trim) {
        None => AtomFallback::Strict,
        Some(f) if f.eq_ignore_ascii_case("strict") => AtomFallback::Strict,
        Some(f) if f.eq_ignore_ascii_case("centroid") => AtomFallback::Centroid,
        Some(f) => AtomFallback::Atom(f.to_ascii_uppercase()),
    };
    core_config::NodePosition::Representative {
        atom: atom.trim().to_ascii_uppercase(),
        fallback,
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str, kind: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| CliError::Config(format!("Invalid {} value for {}: {}", kind, key, value)))
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn apply_set_values(mut config: FileConfig, set_values: &[String]) -> Result<FileConfig> {
    if set_values.is_empty() {
        return Ok(config);
    }
    for kv_pair in set_values {
        let parts: Vec<_> = kv_pair.splitn(2, '=').collect();
        if parts.len() != 2 {
            return Err(CliError::Config(format!(
                "Invalid --set format: '{}'. Expected KEY=VALUE.",
                kv_pair
            )));
        }
        let key = parts[0];
        let value_str = parts[1];

        match key {
            "granularity" => {
                config.granularity = Some(match value_str {
                    "residue" => FileGranularity::Residue,
                    "atom" => FileGranularity::Atom,
                    _ => {
                        return Err(CliError::Config(format!(
                            "Invalid value for {}: {} (expected 'residue' or 'atom')",
                            key, value_str
                        )));
                    }
                });
            }
            "node-position" => config.node_position = Some(value_str.to_string()),
            "node-fallback" => config.node_fallback = Some(value_str.to_string()),
            "missing-atom-policy" => {
                config.missing_atom_policy = Some(match value_str {
                    "fail" => FileMissingAtomPolicy::Fail,
                    "exclude-node" => FileMissingAtomPolicy::ExcludeNode,
                    _ => {
                        return Err(CliError::Config(format!(
                            "Invalid value for {}: {} (expected 'fail' or 'exclude-node')",
                            key, value_str
                        )));
                    }
                });
            }
            "annotation-policy" => {
                config.annotation_policy = Some(match value_str {
                    "abort" => FileAnnotationPolicy::Abort,
                    "continue" => FileAnnotationPolicy::Continue,
                    _ => {
                        return Err(CliError::Config(format!(
                            "Invalid value for {}: {} (expected 'abort' or 'continue')",
                            key, value_str
                        )));
                    }
                });
            }
            "providers" => config.providers = Some(parse_list(value_str)),
            "required-attributes" => config.required_attributes = Some(parse_list(value_str)),
            "processing.deprotonate" => {
                config
                    .processing
                    .get_or_insert_with(Default::default)
                    .deprotonate = Some(parse_value(key, value_str, "boolean")?);
            }
            "processing.keep-insertions" => {
                config
                    .processing
                    .get_or_insert_with(Default::default)
                    .keep_insertions = Some(parse_value(key, value_str, "boolean")?);
            }
            "processing.chains" => {
                let chains = parse_list(value_str)
                    .iter()
                    .map(|item| parse_value::<char>(key, item, "chain identifier"))
                    .collect::<Result<Vec<_>>>()?;
                config.processing.get_or_insert_with(Default::default).chains = Some(chains);
            }
            "processing.keep-hets" => {
                config
                    .processing
                    .get_or_insert_with(Default::default)
                    .keep_hets = Some(parse_list(value_str));
            }
            "side-inputs.dssp-dir" => {
                config
                    .side_inputs
                    .get_or_insert_with(Default::default)
                    .dssp_dir = Some(PathBuf::from(value_str));
            }
            "side-inputs.blast-dir" => {
                config
                    .side_inputs
                    .get_or_insert_with(Default::default)
                    .blast_dir = Some(PathBuf::from(value_str));
            }
            "side-inputs.clusters" => {
                config
                    .side_inputs
                    .get_or_insert_with(Default::default)
                    .clusters = Some(PathBuf::from(value_str));
            }
            _ => {
                return Err(CliError::Config(format!(
                    "Unsupported configuration key for --set: '{}'",
                    key
                )));
            }
        }
    }
    Ok(config)
}
