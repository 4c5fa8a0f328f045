use protgraph::engine::config as core_config;
use std::path::PathBuf;

/// Where tool outputs for each structure are looked up.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SideInputSources {
    pub dssp_dir: Option<PathBuf>,
    pub blast_dir: Option<PathBuf>,
    pub clusters: Option<PathBuf>,
}

pub struct AppConfig {
    pub graph: core_config::GraphConfig,
    pub sources: SideInputSources,
}
