use super::write_json;
use crate::cli::BatchArgs;
use crate::config::build_config;
use crate::error::{CliError, Result};
use crate::utils::inputs::{SideInputLoader, stem};
use crate::utils::progress::CliProgressHandler;
use protgraph::engine::progress::ProgressReporter;
use protgraph::engine::registry::Registry;
use protgraph::workflows;
use protgraph::workflows::batch::BatchOutcome;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub fn run(args: BatchArgs, threads: Option<usize>, quiet: bool) -> Result<()> {
    let output_paths = output_paths(&args.inputs, &args.output_dir)?;

    info!("Merging configuration from file and CLI arguments...");
    let app = build_config(&args.graph)?;
    let registry = Registry::with_builtins();
    let loader = SideInputLoader::new(app.sources, &app.graph, &registry);

    std::fs::create_dir_all(&args.output_dir)?;

    let jobs = threads.unwrap_or_else(|| {
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    });
    let identifiers: Vec<String> = args
        .inputs
        .iter()
        .map(|path| path.display().to_string())
        .collect();

    let progress_handler = if quiet {
        CliProgressHandler::hidden()
    } else {
        CliProgressHandler::new()
    };
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    eprintln!(
        "Building graphs for {} structure(s) with {} worker(s)...",
        identifiers.len(),
        jobs
    );
    let output_by_identifier: BTreeMap<&str, &PathBuf> = identifiers
        .iter()
        .map(String::as_str)
        .zip(&output_paths)
        .collect();
    let written = reporter.phase("Building graphs", || {
        workflows::batch::run_map(
            &identifiers,
            |identifier| loader.load(Path::new(identifier)),
            |outcome| write_outcome(outcome, &output_by_identifier, args.pretty),
            &app.graph,
            &registry,
            jobs,
            &reporter,
        )
    })?;

    let total = written.len();
    let mut failed = 0;
    for (identifier, result) in identifiers.iter().zip(written) {
        if let Err(message) = result {
            failed += 1;
            eprintln!("  ✗ {}: {}", identifier, message);
        }
    }

    eprintln!(
        "✓ {} of {} graph(s) written to: {}",
        total - failed,
        total,
        args.output_dir.display()
    );

    if failed > 0 {
        warn!(failed, "Some structures could not be built.");
        return Err(CliError::Other(anyhow::anyhow!(
            "{} of {} structure(s) failed",
            failed,
            total
        )));
    }
    Ok(())
}

/// Writes a built graph to its output file and drops it; the error message otherwise.
fn write_outcome(
    outcome: BatchOutcome,
    outputs: &BTreeMap<&str, &PathBuf>,
    pretty: bool,
) -> std::result::Result<(), String> {
    let graph = outcome.result.map_err(|e| e.to_string())?;
    let path = outputs
        .get(outcome.identifier.as_str())
        .ok_or_else(|| format!("no output path for '{}'", outcome.identifier))?;
    write_json(&graph, Some(path.as_path()), pretty).map_err(|e| e.to_string())?;
    info!("Wrote graph for {} to {:?}", outcome.identifier, path);
    Ok(())
}

/// One `<stem>.json` per input; inputs sharing a stem would overwrite each other.
fn output_paths(inputs: &[PathBuf], output_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut seen: BTreeMap<String, &PathBuf> = BTreeMap::new();
    let mut paths = Vec::with_capacity(inputs.len());
    for input in inputs {
        let name = stem(input);
        if let Some(previous) = seen.insert(name.clone(), input) {
            return Err(CliError::Argument(format!(
                "Inputs '{}' and '{}' would both be written to '{}.json'",
                previous.display(),
                input.display(),
                name
            )));
        }
        paths.push(output_dir.join(format!("{}.json", name)));
    }
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::GraphArgs;
    use std::fs;
    use tempfile::tempdir;

    const PDB: &str = "\
ATOM      1  CA  MET A   1       0.000   0.000   0.000  1.00  0.00           C
ATOM      2  CA  LYS A   2       3.800   0.000   0.000  1.00  0.00           C
END
";

    fn batch_args(inputs: Vec<PathBuf>, output_dir: PathBuf) -> BatchArgs {
        BatchArgs {
            inputs,
            output_dir,
            pretty: false,
            graph: GraphArgs::default(),
        }
    }

    #[test]
    fn writes_one_graph_per_structure() {
        let dir = tempdir().unwrap();
        let inputs: Vec<PathBuf> = ["1abc", "2def"]
            .iter()
            .map(|name| {
                let path = dir.path().join(format!("{}.pdb", name));
                fs::write(&path, PDB).unwrap();
                path
            })
            .collect();
        let out = dir.path().join("graphs");

        run(batch_args(inputs, out.clone()), Some(2), true).unwrap();

        for name in ["1abc", "2def"] {
            let text = fs::read_to_string(out.join(format!("{}.json", name))).unwrap();
            let graph: serde_json::Value = serde_json::from_str(&text).unwrap();
            assert_eq!(graph["metadata"]["name"], name);
            assert_eq!(graph["edges"].as_array().map(Vec::len), Some(1));
        }
    }

    #[test]
    fn failed_structures_do_not_block_the_rest() {
        let dir = tempdir().unwrap();
        let good = dir.path().join("good.pdb");
        fs::write(&good, PDB).unwrap();
        let missing = dir.path().join("missing.pdb");
        let out = dir.path().join("graphs");

        let result = run(batch_args(vec![missing, good], out.clone()), Some(2), true);

        assert!(matches!(result, Err(CliError::Other(_))));
        assert!(out.join("good.json").exists());
        assert!(!out.join("missing.json").exists());
    }

    #[test]
    fn unwritable_output_counts_as_a_failed_structure() {
        let dir = tempdir().unwrap();
        let good = dir.path().join("good.pdb");
        fs::write(&good, PDB).unwrap();
        let out = dir.path().join("graphs");
        fs::create_dir(&out).unwrap();
        fs::create_dir(out.join("good.json")).unwrap();

        let result = run(batch_args(vec![good], out), Some(1), true);
        assert!(matches!(result, Err(CliError::Other(_))));
    }

    #[test]
    fn colliding_stems_are_rejected() {
        let inputs = vec![PathBuf::from("a/1abc.pdb"), PathBuf::from("b/1abc.pdb")];
        assert!(matches!(
            output_paths(&inputs, Path::new("out")),
            Err(CliError::Argument(_))
        ));
    }
}
