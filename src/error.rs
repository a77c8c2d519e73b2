//! Error types surfaced by the engine.
//!
//! Parse failures and content-fetch failures are separate classes: a caller
//! expanding context must never mistake a missing file for a malformed diff.

use std::path::PathBuf;

use thiserror::Error;

/// A malformed unified-diff document. Fatal to the parse call.
///
/// `line` is the 1-based line number within the raw document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("line {line}: malformed hunk header `{header}`")]
    InvalidHunkHeader { line: usize, header: String },

    #[error("line {line}: unexpected line in hunk body `{text}`")]
    UnexpectedHunkLine { line: usize, text: String },

    #[error("line {line}: hunk for `{path}` ends before its declared line counts")]
    TruncatedHunk { path: String, line: usize },

    #[error("line {line}: file header for `{path}` is incomplete")]
    TruncatedHeader { path: String, line: usize },

    #[error("line {line}: hunk header appears before any file header")]
    HunkOutsideFile { line: usize },
}

/// Failure to obtain full file text for context expansion.
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("`{path}` does not exist at `{reference}`")]
    NotFound { path: String, reference: String },

    #[error("failed to read `{}`", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("git could not show `{path}` at `{reference}`: {stderr}")]
    Git {
        path: String,
        reference: String,
        stderr: String,
    },
}
