use crate::config::models::SideInputSources;
use protgraph::core::io::pdb::{PdbError, PdbFile};
use protgraph::core::io::traits::StructureFile;
use protgraph::core::models::structure::Structure;
use protgraph::engine::annotations::{SideInputs, ToolKind, ToolOutput};
use protgraph::engine::cache::ToolOutputCache;
use protgraph::engine::config::GraphConfig;
use protgraph::engine::error::GraphError;
use protgraph::engine::registry::Registry;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Reads structures and the pre-computed tool outputs their enabled providers need.
///
/// Tool outputs are looked up as `<dir>/<stem>.dssp` and `<dir>/<stem>.blast`; the cluster
/// table is shared by all structures. Outputs are cached by tool, tool file and structure
/// content, so repeated loads of one input read its tool files once.
pub struct SideInputLoader {
    sources: SideInputSources,
    tools: BTreeSet<ToolKind>,
    cache: ToolOutputCache,
}

impl SideInputLoader {
    pub fn new(sources: SideInputSources, config: &GraphConfig, registry: &Registry) -> Self {
        let tools = config
            .providers
            .iter()
            .filter_map(|name| registry.provider(name))
            .filter_map(|provider| provider.side_input())
            .collect();
        Self {
            sources,
            tools,
            cache: ToolOutputCache::new(),
        }
    }

    /// Parses the structure at `path` and gathers its tool outputs.
    ///
    /// A tool whose source is not configured is left out, which the assembler reports as a
    /// missing side input. A configured but unreadable tool file becomes
    /// [`ToolOutput::Failed`] and is handled by the annotation policy.
    pub fn load(&self, path: &Path) -> Result<(Structure, SideInputs), GraphError> {
        let bytes = fs::read(path).map_err(|source| GraphError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let name = stem(path);
        let structure = PdbFile::read_from(&mut bytes.as_slice(), &name)
            .map_err(|e| pdb_error(path, e))?;

        let mut inputs = SideInputs::new();
        for &tool in &self.tools {
            let output = match tool {
                ToolKind::Dssp => self.sources.dssp_dir.as_ref().map(|dir| {
                    let file = dir.join(format!("{}.dssp", name));
                    self.cache
                        .get_or_run(tool, &tool_key(&file, &bytes), || read_tool_file(&file))
                }),
                ToolKind::Blast => self.sources.blast_dir.as_ref().map(|dir| {
                    let file = dir.join(format!("{}.blast", name));
                    self.cache
                        .get_or_run(tool, &tool_key(&file, &bytes), || read_tool_file(&file))
                }),
                ToolKind::Clusters => self.sources.clusters.as_ref().map(|file| {
                    let key = file.to_string_lossy();
                    self.cache
                        .get_or_run(tool, key.as_bytes(), || read_tool_file(file))
                }),
            };
            match output {
                Some(output) => inputs.insert(tool, output),
                None => debug!(structure = %name, tool = %tool, "No source configured."),
            }
        }
        Ok((structure, inputs))
    }
}

pub fn stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_default()
}

fn pdb_error(path: &Path, error: PdbError) -> GraphError {
    match error {
        PdbError::Io(source) => GraphError::Io {
            path: path.display().to_string(),
            source,
        },
        PdbError::Malformed(e) => GraphError::MalformedStructure(e),
        other => GraphError::Parse {
            path: path.display().to_string(),
            message: other.to_string(),
        },
    }
}

/// Cache input for a per-structure tool file: the file path, a NUL, then the structure bytes.
/// Tool outputs name their structure, so equal content under another stem is a different key.
fn tool_key(file: &Path, structure: &[u8]) -> Vec<u8> {
    let mut key = file.to_string_lossy().into_owned().into_bytes();
    key.push(0);
    key.extend_from_slice(structure);
    key
}

fn read_tool_file(path: &Path) -> ToolOutput {
    match fs::read_to_string(path) {
        Ok(text) => ToolOutput::Completed(text),
        Err(e) => ToolOutput::Failed {
            reason: format!("cannot read '{}': {}", path.display(), e),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use protgraph::engine::annotations::homology::HomologyProvider;
    use protgraph::engine::annotations::secondary_structure::SecondaryStructureProvider;
    use protgraph::engine::annotations::{AnnotationProvider, AnnotationTarget, AttributeValue};
    use protgraph::engine::config::GraphConfigBuilder;
    use protgraph::engine::error::ErrorKind;
    use tempfile::tempdir;

    const PDB: &str = "\
ATOM      1  N   ALA A   1      11.104   6.134  -6.504  1.00  0.00           N
ATOM      2  CA  ALA A   1      11.639   6.071  -5.147  1.00  0.00           C
ATOM      3  CA  GLY A   2      12.000   7.000  -4.000  1.00 10.00           C
END
";

    fn dssp_config() -> GraphConfig {
        GraphConfigBuilder::new()
            .provider(SecondaryStructureProvider::NAME)
            .build()
            .unwrap()
    }

    #[test]
    fn tool_files_are_read_once_per_input() {
        let dir = tempdir().unwrap();
        let pdb = dir.path().join("1abc.pdb");
        fs::write(&pdb, PDB).unwrap();
        let dssp_dir = dir.path().join("dssp");
        fs::create_dir(&dssp_dir).unwrap();
        let dssp_file = dssp_dir.join("1abc.dssp");
        fs::write(&dssp_file, "dssp text").unwrap();

        let sources = SideInputSources {
            dssp_dir: Some(dssp_dir),
            ..Default::default()
        };
        let loader = SideInputLoader::new(sources, &dssp_config(), &Registry::with_builtins());

        let (structure, inputs) = loader.load(&pdb).unwrap();
        assert_eq!(structure.name(), "1abc");
        assert_eq!(structure.residue_count(), 2);
        assert_eq!(
            inputs.get(ToolKind::Dssp),
            Some(&ToolOutput::Completed("dssp text".to_string()))
        );

        fs::remove_file(&dssp_file).unwrap();
        let (_, again) = loader.load(&pdb).unwrap();
        assert_eq!(
            again.get(ToolKind::Dssp),
            Some(&ToolOutput::Completed("dssp text".to_string()))
        );
    }

    #[test]
    fn identical_structures_under_different_stems_read_their_own_tool_files() {
        let dir = tempdir().unwrap();
        let blast_dir = dir.path().join("blast");
        fs::create_dir(&blast_dir).unwrap();
        for (stem, subject) in [("1abc", "P1"), ("2xyz", "P2")] {
            fs::write(dir.path().join(format!("{}.pdb", stem)), PDB).unwrap();
            fs::write(
                blast_dir.join(format!("{}.blast", stem)),
                format!("{}_A\t{}\t90.0\t2\t0\t0\t1\t2\t1\t2\t1e-5\t50.0\n", stem, subject),
            )
            .unwrap();
        }

        let config = GraphConfigBuilder::new()
            .provider(HomologyProvider::NAME)
            .build()
            .unwrap();
        let sources = SideInputSources {
            blast_dir: Some(blast_dir),
            ..Default::default()
        };
        let loader = SideInputLoader::new(sources, &config, &Registry::with_builtins());

        for (stem, subject) in [("1abc", "P1"), ("2xyz", "P2")] {
            let (structure, inputs) = loader.load(&dir.path().join(format!("{}.pdb", stem))).unwrap();
            let layer = HomologyProvider.annotate(&structure, &inputs).unwrap();
            assert_eq!(
                layer.get(&AnnotationTarget::Chain('A'), "best_hit"),
                Some(&AttributeValue::from(subject))
            );
        }
    }

    #[test]
    fn unreadable_tool_file_becomes_a_failed_output() {
        let dir = tempdir().unwrap();
        let pdb = dir.path().join("2xyz.pdb");
        fs::write(&pdb, PDB).unwrap();

        let sources = SideInputSources {
            dssp_dir: Some(dir.path().to_path_buf()),
            ..Default::default()
        };
        let loader = SideInputLoader::new(sources, &dssp_config(), &Registry::with_builtins());

        let (_, inputs) = loader.load(&pdb).unwrap();
        assert!(matches!(
            inputs.get(ToolKind::Dssp),
            Some(ToolOutput::Failed { .. })
        ));
    }

    #[test]
    fn unconfigured_sources_and_unused_tools_are_left_out() {
        let dir = tempdir().unwrap();
        let pdb = dir.path().join("3def.pdb");
        fs::write(&pdb, PDB).unwrap();

        let loader = SideInputLoader::new(
            SideInputSources::default(),
            &dssp_config(),
            &Registry::with_builtins(),
        );
        let (_, inputs) = loader.load(&pdb).unwrap();
        assert!(!inputs.contains(ToolKind::Dssp));

        let sources = SideInputSources {
            blast_dir: Some(dir.path().to_path_buf()),
            ..Default::default()
        };
        let loader = SideInputLoader::new(sources, &dssp_config(), &Registry::with_builtins());
        let (_, inputs) = loader.load(&pdb).unwrap();
        assert!(!inputs.contains(ToolKind::Blast));
    }

    #[test]
    fn unreadable_structure_maps_to_io_error() {
        let dir = tempdir().unwrap();
        let loader = SideInputLoader::new(
            SideInputSources::default(),
            &GraphConfig::default(),
            &Registry::with_builtins(),
        );

        let err = loader.load(&dir.path().join("absent.pdb")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
    }

    #[test]
    fn bad_coordinates_map_to_parse_error() {
        let dir = tempdir().unwrap();
        let pdb = dir.path().join("bad.pdb");
        fs::write(
            &pdb,
            "ATOM      1  CA  ALA A   1      xx.xxx   6.071  -5.147  1.00  0.00           C\n",
        )
        .unwrap();
        let loader = SideInputLoader::new(
            SideInputSources::default(),
            &GraphConfig::default(),
            &Registry::with_builtins(),
        );

        let err = loader.load(&pdb).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
    }
}
