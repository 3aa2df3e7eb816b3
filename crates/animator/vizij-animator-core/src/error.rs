//! Error types for animator persistence and layer management.
//!
//! The per-frame path never fails; these errors only surface from file I/O and
//! structural operations. Public wrappers such as [`crate::Controller::save`]
//! log them and return `bool` instead.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AnimatorError {
    #[error("empty path")]
    EmptyPath,

    #[error("{path}: expected a .{expected} file")]
    InvalidExtension { path: PathBuf, expected: String },

    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse error in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("serialize animator: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("layer limit reached ({max})")]
    LayerLimit { max: usize },
}

impl AnimatorError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn parse(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Parse {
            path: path.into(),
            source,
        }
    }
}
