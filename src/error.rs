//! Error types for extraction and catalog I/O
//!
//! The split mirrors the failure policy: syntax and directive problems are
//! scoped to one file (the batch continues), catalog I/O problems abort the
//! whole run with the failing path attached.

use std::path::PathBuf;

use thiserror::Error;

use crate::syntax::SyntaxError;

/// File-scoped extraction failures
#[derive(Debug, Error)]
pub enum ExtractError {
    /// Malformed source, skip the file and report
    #[error("failed to parse {path}: {source}")]
    Syntax {
        path: PathBuf,
        #[source]
        source: SyntaxError,
    },

    /// Unknown `%x` directive class, abort this file without writing
    #[error("no way to handle '%{directive}' formatting in {path}")]
    UnsupportedDirective { directive: char, path: PathBuf },

    /// A directive has no matching call argument
    #[error("format directive {index} in {path} has no matching argument")]
    MissingFormatArg { index: usize, path: PathBuf },
}

/// Run-fatal catalog failures
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog I/O failed at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed catalog {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl CatalogError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CatalogError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result alias for catalog operations
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Failures that abort a whole batch run
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("cannot access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl RunError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        RunError::Io {
            path: path.into(),
            source,
        }
    }
}
