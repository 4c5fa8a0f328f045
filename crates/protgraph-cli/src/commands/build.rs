use super::write_json;
use crate::cli::BuildArgs;
use crate::config::build_config;
use crate::error::{CliError, Result};
use crate::utils::inputs::SideInputLoader;
use crate::utils::progress::CliProgressHandler;
use protgraph::core::graph::ProteinGraph;
use protgraph::core::graph::coarse::{self, SecondaryStructureGraphOptions};
use protgraph::engine::assembler::Assembler;
use protgraph::engine::error::GraphError;
use protgraph::engine::progress::ProgressReporter;
use protgraph::engine::registry::Registry;
use protgraph::workflows;
use tracing::info;

pub fn run(args: BuildArgs, quiet: bool) -> Result<()> {
    info!("Merging configuration from file and CLI arguments...");
    let app = build_config(&args.graph)?;
    let registry = Registry::with_builtins();
    let assembler = Assembler::new(app.graph.clone(), &registry).map_err(GraphError::from)?;

    info!("Loading input structure from {:?}", &args.input);
    let loader = SideInputLoader::new(app.sources, &app.graph, &registry);
    let (structure, inputs) = loader.load(&args.input)?;

    let progress_handler = if quiet {
        CliProgressHandler::hidden()
    } else {
        CliProgressHandler::new()
    };
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    eprintln!("Building graph for '{}'...", structure.name());
    let graph = workflows::construct::run_with(&assembler, &structure, &inputs, &reporter)?;
    info!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "Graph assembled."
    );

    write_json(&graph, args.output.as_deref(), args.pretty)?;
    if let Some(path) = &args.output {
        eprintln!(
            "✓ Graph with {} nodes and {} edges written to: {}",
            graph.node_count(),
            graph.edge_count(),
            path.display()
        );
    }

    write_coarse_graphs(&graph, &args)
}

fn write_coarse_graphs(graph: &ProteinGraph, args: &BuildArgs) -> Result<()> {
    if let Some(path) = &args.chain_graph {
        let chains = coarse::chain_graph(graph, true);
        write_json(&chains, Some(path), args.pretty)?;
        eprintln!("✓ Chain graph written to: {}", path.display());
    }
    if let Some(path) = &args.ss_graph {
        let elements =
            coarse::secondary_structure_graph(graph, &SecondaryStructureGraphOptions::default())
                .map_err(|e| CliError::Other(e.into()))?;
        write_json(&elements, Some(path), args.pretty)?;
        eprintln!("✓ Secondary-structure graph written to: {}", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::GraphArgs;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::tempdir;

    const PDB: &str = "\
ATOM      1  CA  MET A   1       0.000   0.000   0.000  1.00  0.00           C
ATOM      2  CA  LYS A   2       3.800   0.000   0.000  1.00  0.00           C
ATOM      3  CA  VAL A   3       7.600   0.000   0.000  1.00  0.00           C
ATOM      4  CA  GLY B   1       0.000  10.000   0.000  1.00  0.00           C
END
";

    fn build_args(input: PathBuf, output: PathBuf) -> BuildArgs {
        BuildArgs {
            input,
            output: Some(output),
            pretty: false,
            chain_graph: None,
            ss_graph: None,
            graph: GraphArgs::default(),
        }
    }

    #[test]
    fn writes_the_graph_as_json() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("1abc.pdb");
        fs::write(&input, PDB).unwrap();
        let output = dir.path().join("1abc.json");
        let mut args = build_args(input, output.clone());
        args.chain_graph = Some(dir.path().join("chains.json"));

        run(args, true).unwrap();

        let graph: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(graph["nodes"].as_array().map(Vec::len), Some(4));
        assert_eq!(graph["edges"].as_array().map(Vec::len), Some(2));
        assert_eq!(graph["metadata"]["name"], "1abc");

        let chains: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(dir.path().join("chains.json")).unwrap())
                .unwrap();
        assert_eq!(chains["nodes"].as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn invalid_configuration_fails_before_reading_input() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("out.json");
        let mut args = build_args(dir.path().join("absent.pdb"), output.clone());
        args.graph.providers = vec!["no_such_provider".to_string()];

        let err = run(args, true).unwrap_err();
        assert!(matches!(
            err,
            CliError::Core(GraphError::Configuration(_))
        ));
        assert!(!output.exists());
    }

    #[test]
    fn secondary_structure_graph_needs_ss_annotations() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("1abc.pdb");
        fs::write(&input, PDB).unwrap();
        let mut args = build_args(input, dir.path().join("1abc.json"));
        args.ss_graph = Some(dir.path().join("ss.json"));

        assert!(matches!(run(args, true), Err(CliError::Other(_))));
    }
}
