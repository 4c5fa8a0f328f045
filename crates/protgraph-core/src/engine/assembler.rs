use super::annotations::{
    AnnotationError, AnnotationProvider, AnnotationSet, AnnotationTarget, AttributeValue,
    SideInputs,
};
use super::config::{AnnotationPolicy, ConfigurationError, GraphConfig};
use super::edges::{EdgeCandidate, EdgeContext, EdgeStrategy};
use super::error::GraphError;
use super::nodes::{LayoutNode, NodeLayout};
use super::progress::ProgressReporter;
use super::registry::Registry;
use crate::core::graph::provenance::{LayerStatus, Provenance, RuleStatus};
use crate::core::graph::{
    ChainSummary, Edge, GRAPH_SCHEMA_VERSION, GraphMetadata, Node, ProteinGraph,
};
use crate::core::models::structure::Structure;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Node attributes the assembler derives from the structure itself.
pub const INTRINSIC_ATTRIBUTES: [&str; 8] = [
    "chain_id",
    "residue_name",
    "residue_number",
    "insertion_code",
    "atom_type",
    "element_symbol",
    "coords",
    "b_factor",
];

enum RuleOutcome {
    Built(Vec<EdgeCandidate>),
    Skipped(Vec<String>),
}

/// Builds graphs for one validated configuration.
///
/// Creating an assembler resolves every provider and strategy against a [`Registry`] and
/// rejects inconsistent configurations; [`assemble`](Self::assemble) can then be called
/// for any number of structures, from any number of threads.
pub struct Assembler {
    config: GraphConfig,
    providers: Vec<Arc<dyn AnnotationProvider>>,
    strategies: Vec<Arc<dyn EdgeStrategy>>,
}

impl std::fmt::Debug for Assembler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Assembler")
            .field("config", &self.config)
            .field(
                "providers",
                &self.providers.iter().map(|p| p.name()).collect::<Vec<_>>(),
            )
            .field(
                "strategies",
                &self.strategies.iter().map(|s| s.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl Assembler {
    /// Resolves and cross-checks a configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError`] for invalid rule parameters, duplicate or unknown names,
    /// attributes written by two providers (or shadowing an intrinsic node attribute), and
    /// provider reads, strategy requirements or required attributes that no enabled provider
    /// writes.
    pub fn new(config: GraphConfig, registry: &Registry) -> Result<Self, ConfigurationError> {
        config.validate_local()?;

        let providers = config
            .providers
            .iter()
            .map(|name| {
                registry
                    .provider(name)
                    .ok_or_else(|| ConfigurationError::UnknownProvider(name.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let strategies = config
            .edge_rules
            .iter()
            .map(|rule| registry.strategy_for(rule))
            .collect::<Result<Vec<_>, _>>()?;

        let mut writers: BTreeMap<&str, &str> = INTRINSIC_ATTRIBUTES
            .iter()
            .map(|attribute| (*attribute, "intrinsic"))
            .collect();
        for provider in &providers {
            for &attribute in provider.writes() {
                if let Some(first) = writers.insert(attribute, provider.name()) {
                    return Err(ConfigurationError::ConflictingWriters {
                        attribute: attribute.to_string(),
                        first: first.to_string(),
                        second: provider.name().to_string(),
                    });
                }
            }
        }

        let unsatisfied = |consumer: &str, attribute: &str| ConfigurationError::UnsatisfiedRequirement {
            consumer: consumer.to_string(),
            attribute: attribute.to_string(),
        };
        for provider in &providers {
            if let Some(attribute) = provider.reads().iter().find(|a| !writers.contains_key(*a)) {
                return Err(unsatisfied(provider.name(), attribute));
            }
        }
        for strategy in &strategies {
            if let Some(attribute) = strategy.requires().iter().find(|a| !writers.contains_key(*a)) {
                return Err(unsatisfied(strategy.name(), attribute));
            }
        }
        if let Some(attribute) = config
            .required_attributes
            .iter()
            .find(|a| !writers.contains_key(a.as_str()))
        {
            return Err(unsatisfied("required_attributes", attribute));
        }

        Ok(Self {
            config,
            providers,
            strategies,
        })
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    pub fn assemble(
        &self,
        structure: &Structure,
        inputs: &SideInputs,
    ) -> Result<ProteinGraph, GraphError> {
        self.assemble_with_progress(structure, inputs, &ProgressReporter::new())
    }

    #[instrument(skip_all, name = "assemble_graph", fields(structure = structure.name()))]
    pub fn assemble_with_progress(
        &self,
        structure: &Structure,
        inputs: &SideInputs,
        reporter: &ProgressReporter,
    ) -> Result<ProteinGraph, GraphError> {
        reporter.phase("Validation", || self.check_side_inputs(inputs))?;

        let layout = reporter.phase("Nodes", || {
            NodeLayout::build(
                structure,
                self.config.granularity,
                &self.config.node_position,
                self.config.missing_atom_policy,
            )
        })?;
        debug!(
            nodes = layout.len(),
            excluded = layout.excluded().len(),
            "Node layout built."
        );

        let mut provenance = Provenance {
            excluded_nodes: layout.excluded().to_vec(),
            ..Provenance::default()
        };

        let annotations =
            reporter.phase("Annotations", || self.annotate(structure, inputs, &mut provenance))?;

        let context = EdgeContext {
            structure,
            layout: &layout,
            annotations: &annotations,
        };
        let outcomes = reporter.phase("Edges", || self.build_candidates(&context))?;

        let graph = reporter.phase("Merge", || {
            let edges = merge_candidates(&outcomes, layout.len(), &mut provenance)?;
            let nodes = build_nodes(structure, &layout, &annotations)?;
            Ok::<_, GraphError>(ProteinGraph::new(
                self.metadata(structure, &annotations),
                chain_summaries(structure, &annotations),
                nodes,
                edges,
                provenance,
            ))
        })?;

        info!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "Graph assembled."
        );
        Ok(graph)
    }

    fn check_side_inputs(&self, inputs: &SideInputs) -> Result<(), ConfigurationError> {
        for provider in &self.providers {
            if let Some(tool) = provider.side_input() {
                if !inputs.contains(tool) {
                    return Err(ConfigurationError::MissingSideInput {
                        provider: provider.name().to_string(),
                        tool,
                    });
                }
            }
        }
        Ok(())
    }

    fn annotate(
        &self,
        structure: &Structure,
        inputs: &SideInputs,
        provenance: &mut Provenance,
    ) -> Result<AnnotationSet, GraphError> {
        #[cfg(not(feature = "parallel"))]
        let iterator = self.providers.iter();

        #[cfg(feature = "parallel")]
        let iterator = self.providers.par_iter();

        let outcomes: Vec<_> = iterator
            .map(|provider| (provider, provider.annotate(structure, inputs)))
            .collect();

        let mut annotations = AnnotationSet::new();
        for (provider, outcome) in outcomes {
            match outcome {
                Ok(layer) => {
                    annotations.insert(layer, provider.writes());
                    provenance
                        .layers
                        .insert(provider.name().to_string(), LayerStatus::Applied);
                }
                Err(err) => match self.config.annotation_policy {
                    AnnotationPolicy::Abort => return Err(err.into()),
                    AnnotationPolicy::ContinueWithoutLayer => {
                        warn!(provider = provider.name(), error = %err, "Continuing without annotation layer.");
                        provenance.layers.insert(
                            provider.name().to_string(),
                            LayerStatus::Failed {
                                reason: err.to_string(),
                            },
                        );
                    }
                },
            }
        }

        if let Some(attribute) = self
            .config
            .required_attributes
            .iter()
            .find(|attribute| !annotations.has_attribute(attribute))
        {
            return Err(AnnotationError::RequiredAttributeUnavailable {
                attribute: attribute.clone(),
                structure: structure.name().to_string(),
            }
            .into());
        }
        Ok(annotations)
    }

    fn build_candidates(
        &self,
        context: &EdgeContext<'_>,
    ) -> Result<Vec<(String, RuleOutcome)>, GraphError> {
        #[cfg(not(feature = "parallel"))]
        let iterator = self.strategies.iter();

        #[cfg(feature = "parallel")]
        let iterator = self.strategies.par_iter();

        let results: Vec<_> = iterator
            .map(|strategy| -> Result<(String, RuleOutcome), GraphError> {
                let missing: Vec<String> = strategy
                    .requires()
                    .iter()
                    .filter(|attribute| !context.annotations.has_attribute(attribute))
                    .map(|attribute| attribute.to_string())
                    .collect();
                let outcome = if missing.is_empty() {
                    RuleOutcome::Built(strategy.build_edges(context)?)
                } else {
                    RuleOutcome::Skipped(missing)
                };
                Ok((strategy.name().to_string(), outcome))
            })
            .collect();

        results.into_iter().collect()
    }

    fn metadata(&self, structure: &Structure, annotations: &AnnotationSet) -> GraphMetadata {
        GraphMetadata {
            name: structure.name().to_string(),
            granularity: self.config.granularity,
            schema_version: GRAPH_SCHEMA_VERSION,
            attributes: annotations.merged(&AnnotationTarget::Structure),
        }
    }
}

/// Groups candidates by node pair. Rule names are unioned; within one rule the first
/// candidate for a pair supplies the metadata.
fn merge_candidates(
    outcomes: &[(String, RuleOutcome)],
    node_count: usize,
    provenance: &mut Provenance,
) -> Result<BTreeMap<(usize, usize), Edge>, GraphError> {
    let mut edges: BTreeMap<(usize, usize), Edge> = BTreeMap::new();
    for (rule, outcome) in outcomes {
        let candidates = match outcome {
            RuleOutcome::Skipped(missing) => {
                warn!(rule = %rule, missing = ?missing, "Skipping edge rule without required annotations.");
                provenance.rules.insert(
                    rule.clone(),
                    RuleStatus::Skipped {
                        missing: missing.clone(),
                    },
                );
                continue;
            }
            RuleOutcome::Built(candidates) => candidates,
        };
        provenance.rules.insert(
            rule.clone(),
            RuleStatus::Applied {
                candidates: candidates.len(),
            },
        );

        for candidate in candidates {
            let (source, target) = candidate.pair();
            if target >= node_count {
                return Err(GraphError::Internal(format!(
                    "rule '{}' proposed edge ({}, {}) for a graph of {} nodes",
                    rule, source, target, node_count
                )));
            }
            let edge = edges.entry((source, target)).or_insert_with(|| Edge {
                source,
                target,
                rules: BTreeSet::new(),
                metadata: BTreeMap::new(),
            });
            edge.rules.insert(candidate.rule.clone());
            if !candidate.metadata.is_empty() {
                edge.metadata
                    .entry(candidate.rule.clone())
                    .or_insert_with(|| candidate.metadata.clone());
            }
        }
    }
    Ok(edges)
}

fn build_nodes(
    structure: &Structure,
    layout: &NodeLayout,
    annotations: &AnnotationSet,
) -> Result<Vec<Node>, GraphError> {
    layout
        .nodes()
        .iter()
        .map(|layout_node| {
            let mut attributes = intrinsic_attributes(structure, layout_node)?;
            attributes.extend(annotations.merged(&AnnotationTarget::Residue(layout_node.key)));
            Ok(Node {
                id: layout_node.id.clone(),
                residue: layout_node.key,
                attributes,
            })
        })
        .collect()
}

fn intrinsic_attributes(
    structure: &Structure,
    node: &LayoutNode,
) -> Result<BTreeMap<String, AttributeValue>, GraphError> {
    let residue = structure.residue(node.residue_id).ok_or_else(|| {
        GraphError::Internal(format!("node '{}' has no residue", node.id))
    })?;
    let atom = node.atom_id.and_then(|id| structure.atom(id));
    let b_factor = match atom {
        Some(atom) => Some(atom.b_factor),
        None => {
            let factors: Vec<f64> = structure
                .residue_atoms(node.residue_id)
                .map(|(_, atom)| atom.b_factor)
                .collect();
            (!factors.is_empty()).then(|| factors.iter().sum::<f64>() / factors.len() as f64)
        }
    };
    let p = node.position;

    let values: [(&str, AttributeValue); 8] = [
        ("chain_id", node.key.chain.into()),
        ("residue_name", residue.name.as_str().into()),
        ("residue_number", (node.key.number as i64).into()),
        ("insertion_code", node.key.insertion_code.into()),
        ("atom_type", atom.map(|a| a.name.clone()).into()),
        ("element_symbol", atom.and_then(|a| a.element.clone()).into()),
        ("coords", AttributeValue::Vector([p.x, p.y, p.z])),
        ("b_factor", b_factor.into()),
    ];
    Ok(values
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect())
}

fn chain_summaries(structure: &Structure, annotations: &AnnotationSet) -> Vec<ChainSummary> {
    structure
        .chains()
        .map(|(chain_id, chain)| ChainSummary {
            id: chain.id,
            chain_type: chain.chain_type,
            sequence: structure.sequence(chain_id),
            num_residues: chain.residues().len(),
            attributes: annotations.merged(&AnnotationTarget::Chain(chain.id)),
        })
        .collect()
}
