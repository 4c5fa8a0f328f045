use super::annotations::AnnotationError;
use super::config::ConfigurationError;
use crate::core::models::builder::MalformedStructureError;
use crate::core::models::structure::MissingAtomError;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("Malformed structure: {0}")]
    MalformedStructure(#[from] MalformedStructureError),

    #[error("Missing atom: {0}")]
    MissingAtom(#[from] MissingAtomError),

    #[error("Annotation failed: {0}")]
    Annotation(#[from] AnnotationError),

    #[error("Invalid configuration: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to parse '{path}': {message}")]
    Parse { path: String, message: String },

    #[error("Internal logic error: {0}")]
    Internal(String),
}

/// Coarse classification of a [`GraphError`] for reporting and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    MalformedStructure,
    MissingAtom,
    Annotation,
    Configuration,
    Io,
    Parse,
    Internal,
}

impl GraphError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GraphError::MalformedStructure(_) => ErrorKind::MalformedStructure,
            GraphError::MissingAtom(_) => ErrorKind::MissingAtom,
            GraphError::Annotation(_) => ErrorKind::Annotation,
            GraphError::Configuration(_) => ErrorKind::Configuration,
            GraphError::Io { .. } => ErrorKind::Io,
            GraphError::Parse { .. } => ErrorKind::Parse,
            GraphError::Internal(_) => ErrorKind::Internal,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::MalformedStructure => "malformed_structure",
            ErrorKind::MissingAtom => "missing_atom",
            ErrorKind::Annotation => "annotation",
            ErrorKind::Configuration => "configuration",
            ErrorKind::Io => "io",
            ErrorKind::Parse => "parse",
            ErrorKind::Internal => "internal",
        };
        f.write_str(name)
    }
}
