use crate::core::graph::ProteinGraph;
use crate::core::models::structure::Structure;
use crate::core::processing;
use crate::engine::annotations::SideInputs;
use crate::engine::assembler::Assembler;
use crate::engine::config::GraphConfig;
use crate::engine::error::GraphError;
use crate::engine::progress::ProgressReporter;
use crate::engine::registry::Registry;
use tracing::{info, instrument};

/// Builds the graph of one structure.
///
/// The configuration is checked against the registry first, so a bad configuration fails
/// before the structure is processed or any provider runs.
#[instrument(skip_all, name = "construct_workflow", fields(structure = structure.name()))]
pub fn run(
    structure: &Structure,
    inputs: &SideInputs,
    config: &GraphConfig,
    registry: &Registry,
    reporter: &ProgressReporter,
) -> Result<ProteinGraph, GraphError> {
    let assembler = reporter.phase("Configuration", || {
        Assembler::new(config.clone(), registry)
    })?;
    run_with(&assembler, structure, inputs, reporter)
}

/// Builds the graph of one structure with an already validated assembler.
pub fn run_with(
    assembler: &Assembler,
    structure: &Structure,
    inputs: &SideInputs,
    reporter: &ProgressReporter,
) -> Result<ProteinGraph, GraphError> {
    let processed = reporter.phase("Processing", || {
        processing::process(structure, &assembler.config().processing)
    })?;
    info!(
        chains = processed.chain_count(),
        residues = processed.residue_count(),
        atoms = processed.atom_count(),
        "Structure processed."
    );
    assembler.assemble_with_progress(&processed, inputs, reporter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::builder::{AtomRecord, StructureBuilder};
    use crate::core::models::chain::ChainType;
    use crate::core::processing::{ChainSelection, ProcessingConfig};
    use crate::engine::config::{ConfigurationError, GraphConfigBuilder};
    use crate::engine::progress::Progress;
    use nalgebra::Point3;
    use std::collections::BTreeSet;
    use std::sync::Mutex;

    fn structure() -> Structure {
        let mut builder = StructureBuilder::new("3xyz");
        builder.start_chain('A', ChainType::Protein);
        for number in 1..=3 {
            builder
                .start_residue(number, None, "ALA", false)
                .add_atom(AtomRecord::new("CA", Point3::new(number as f64 * 3.8, 0.0, 0.0)))
                .add_atom(AtomRecord::new("H", Point3::new(number as f64 * 3.8, 1.0, 0.0)));
        }
        builder
            .start_residue(4, None, "HOH", true)
            .add_atom(AtomRecord::new("O", Point3::new(0.0, 5.0, 0.0)))
            .start_chain('B', ChainType::Protein)
            .start_residue(1, None, "GLY", false)
            .add_atom(AtomRecord::new("CA", Point3::new(0.0, 9.0, 0.0)));
        builder.build().unwrap()
    }

    #[test]
    fn processes_before_assembling() {
        let config = GraphConfigBuilder::new()
            .processing(ProcessingConfig {
                chain_selection: ChainSelection::Only(BTreeSet::from(['A'])),
                ..ProcessingConfig::default()
            })
            .build()
            .unwrap();
        let graph = run(
            &structure(),
            &SideInputs::new(),
            &config,
            &Registry::with_builtins(),
            &ProgressReporter::new(),
        )
        .unwrap();

        // Water and chain B are filtered out; hydrogens never become nodes.
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 2);
        assert_eq!(graph.chains().len(), 1);
        assert_eq!(graph.metadata().name, "3xyz");
    }

    #[test]
    fn invalid_configuration_fails_before_processing() {
        let config = GraphConfigBuilder::new().provider("missing").build().unwrap();
        let phases = Mutex::new(Vec::new());
        let reporter = ProgressReporter::with_callback(Box::new(|event| {
            if let Progress::PhaseStart { name } = event {
                phases.lock().unwrap().push(name);
            }
        }));

        let err = run(
            &structure(),
            &SideInputs::new(),
            &config,
            &Registry::with_builtins(),
            &reporter,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            GraphError::Configuration(ConfigurationError::UnknownProvider(_))
        ));
        assert_eq!(*phases.lock().unwrap(), vec!["Configuration"]);
    }

    #[test]
    fn reports_every_assembly_phase() {
        let phases = Mutex::new(Vec::new());
        let reporter = ProgressReporter::with_callback(Box::new(|event| {
            if let Progress::PhaseStart { name } = event {
                phases.lock().unwrap().push(name);
            }
        }));
        run(
            &structure(),
            &SideInputs::new(),
            &GraphConfig::default(),
            &Registry::with_builtins(),
            &reporter,
        )
        .unwrap();
        assert_eq!(
            *phases.lock().unwrap(),
            vec![
                "Configuration",
                "Processing",
                "Validation",
                "Nodes",
                "Annotations",
                "Edges",
                "Merge"
            ]
        );
    }
}
