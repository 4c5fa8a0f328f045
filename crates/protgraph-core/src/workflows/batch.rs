use super::construct;
use crate::core::graph::ProteinGraph;
use crate::core::models::structure::Structure;
use crate::engine::annotations::SideInputs;
use crate::engine::assembler::Assembler;
use crate::engine::config::GraphConfig;
use crate::engine::error::GraphError;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::registry::Registry;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{info, instrument, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// The result of building one structure of a batch.
#[derive(Debug)]
pub struct BatchOutcome {
    pub identifier: String,
    pub result: Result<ProteinGraph, GraphError>,
}

impl BatchOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Builds graphs for many structures on a pool of at most `jobs` worker threads.
///
/// `load` turns an identifier into a structure and its tool outputs. Failures while loading
/// or building one structure are captured in its [`BatchOutcome`] and never affect the
/// others. Outcomes are returned in the order of `identifiers`.
///
/// # Errors
///
/// Returns an error only when the configuration is invalid or the worker pool cannot be
/// created; in that case no structure is loaded.
pub fn run<L>(
    identifiers: &[String],
    load: L,
    config: &GraphConfig,
    registry: &Registry,
    jobs: usize,
    reporter: &ProgressReporter,
) -> Result<Vec<BatchOutcome>, GraphError>
where
    L: Fn(&str) -> Result<(Structure, SideInputs), GraphError> + Sync,
{
    run_map(identifiers, load, |outcome| outcome, config, registry, jobs, reporter)
}

/// Like [`run`], but hands each outcome to `on_outcome` on the worker that built it and keeps
/// only what it returns, so a graph can be written out and dropped as soon as it is built.
///
/// Results are returned in the order of `identifiers`.
#[instrument(skip_all, name = "batch_workflow", fields(structures = identifiers.len(), jobs = jobs))]
pub fn run_map<L, F, T>(
    identifiers: &[String],
    load: L,
    on_outcome: F,
    config: &GraphConfig,
    registry: &Registry,
    jobs: usize,
    reporter: &ProgressReporter,
) -> Result<Vec<T>, GraphError>
where
    L: Fn(&str) -> Result<(Structure, SideInputs), GraphError> + Sync,
    F: Fn(BatchOutcome) -> T + Sync,
    T: Send,
{
    let assembler = Assembler::new(config.clone(), registry)?;
    info!("Building graphs for {} structure(s).", identifiers.len());

    reporter.report(Progress::TaskStart {
        total_steps: identifiers.len() as u64,
    });
    let failed = AtomicUsize::new(0);
    let build_one = |identifier: &String| {
        let result = load(identifier).and_then(|(structure, inputs)| {
            construct::run_with(&assembler, &structure, &inputs, &ProgressReporter::new())
        });
        if let Err(err) = &result {
            failed.fetch_add(1, Ordering::Relaxed);
            warn!(identifier = %identifier, kind = %err.kind(), error = %err, "Structure failed.");
        }
        let mapped = on_outcome(BatchOutcome {
            identifier: identifier.clone(),
            result,
        });
        reporter.report(Progress::TaskIncrement);
        mapped
    };

    #[cfg(feature = "parallel")]
    let results: Vec<T> = {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(jobs.max(1))
            .build()
            .map_err(|e| GraphError::Internal(format!("failed to create worker pool: {}", e)))?;
        pool.install(|| identifiers.par_iter().map(build_one).collect())
    };

    #[cfg(not(feature = "parallel"))]
    let results: Vec<T> = {
        let _ = jobs;
        identifiers.iter().map(build_one).collect()
    };

    reporter.report(Progress::TaskFinish);

    let failed = failed.into_inner();
    info!(
        succeeded = results.len() - failed,
        failed, "Batch complete."
    );
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::annotations::tests::small_structure;
    use crate::engine::config::{ConfigurationError, GraphConfigBuilder};
    use crate::engine::error::ErrorKind;
    use std::sync::Mutex;

    fn identifiers(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    fn loader(identifier: &str) -> Result<(Structure, SideInputs), GraphError> {
        if identifier.starts_with("bad") {
            return Err(GraphError::Parse {
                path: format!("{}.pdb", identifier),
                message: "no ATOM records".to_string(),
            });
        }
        Ok((small_structure(), SideInputs::new()))
    }

    #[test]
    fn failures_are_isolated_and_order_is_preserved() {
        let ids = identifiers(&["one", "bad1", "two", "three", "bad2"]);
        let outcomes = run(
            &ids,
            loader,
            &GraphConfig::default(),
            &Registry::with_builtins(),
            3,
            &ProgressReporter::new(),
        )
        .unwrap();

        let order: Vec<&str> = outcomes.iter().map(|o| o.identifier.as_str()).collect();
        assert_eq!(order, ["one", "bad1", "two", "three", "bad2"]);
        for outcome in &outcomes {
            match &outcome.result {
                Ok(graph) => assert_eq!(graph.node_count(), 4),
                Err(err) => {
                    assert!(outcome.identifier.starts_with("bad"));
                    assert_eq!(err.kind(), ErrorKind::Parse);
                }
            }
        }
        assert_eq!(outcomes.iter().filter(|o| o.is_ok()).count(), 3);
    }

    #[test]
    fn invalid_configuration_loads_nothing() {
        let loads = AtomicUsize::new(0);
        let config = GraphConfigBuilder::new().provider("unknown").build().unwrap();
        let err = run(
            &identifiers(&["one", "two"]),
            |identifier: &str| {
                loads.fetch_add(1, Ordering::SeqCst);
                loader(identifier)
            },
            &config,
            &Registry::with_builtins(),
            2,
            &ProgressReporter::new(),
        )
        .unwrap_err();

        assert!(matches!(
            err,
            GraphError::Configuration(ConfigurationError::UnknownProvider(_))
        ));
        assert_eq!(loads.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn reports_one_increment_per_structure() {
        let increments = AtomicUsize::new(0);
        let reporter = ProgressReporter::with_callback(Box::new(|event| {
            if matches!(event, Progress::TaskIncrement) {
                increments.fetch_add(1, Ordering::SeqCst);
            }
        }));
        let outcomes = run(
            &identifiers(&["a", "b", "bad", "c"]),
            loader,
            &GraphConfig::default(),
            &Registry::with_builtins(),
            1,
            &reporter,
        )
        .unwrap();
        assert_eq!(outcomes.len(), 4);
        assert_eq!(increments.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn batch_graphs_match_single_construction() {
        let config = GraphConfig::default();
        let registry = Registry::with_builtins();
        let outcomes = run(
            &identifiers(&["one"]),
            loader,
            &config,
            &registry,
            2,
            &ProgressReporter::new(),
        )
        .unwrap();
        let single = construct::run(
            &small_structure(),
            &SideInputs::new(),
            &config,
            &registry,
            &ProgressReporter::new(),
        )
        .unwrap();
        assert_eq!(outcomes[0].result.as_ref().unwrap(), &single);
    }

    #[test]
    fn run_map_hands_over_each_outcome_once() {
        let seen = Mutex::new(Vec::new());
        let nodes = run_map(
            &identifiers(&["one", "bad", "two"]),
            loader,
            |outcome| {
                if let Ok(mut seen) = seen.lock() {
                    seen.push(outcome.identifier.clone());
                }
                outcome.result.map(|graph| graph.node_count()).ok()
            },
            &GraphConfig::default(),
            &Registry::with_builtins(),
            2,
            &ProgressReporter::new(),
        )
        .unwrap();

        assert_eq!(nodes, [Some(4), None, Some(4)]);
        let mut seen = seen.into_inner().unwrap();
        seen.sort();
        assert_eq!(seen, ["bad", "one", "two"]);
    }
}
