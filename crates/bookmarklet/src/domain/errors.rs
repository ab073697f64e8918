//! Domain-specific errors.

use std::fmt;

use thiserror::Error;

/// Which of the two region delimiters an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    Start,
    End,
}

impl fmt::Display for MarkerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarkerKind::Start => f.write_str("start"),
            MarkerKind::End => f.write_str("end"),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[error("{kind} marker '{marker}' not found")]
    MarkerNotFound { kind: MarkerKind, marker: String },
    #[error(transparent)]
    Minify(#[from] MinifyError),
}

/// Failure reported by a [`Minifier`](crate::app::minify::Minifier) implementation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("minification failed: {0}")]
pub struct MinifyError(pub String);
