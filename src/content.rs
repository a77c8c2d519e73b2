//! Sources of full file text for context expansion.
//!
//! Providers only ever feed context materialization; their failures are
//! `ContentError`s, never parse errors.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use std::process::Command;

use log::debug;

use crate::error::ContentError;

/// Full text of `path` as of `reference` (commit, branch, tag).
pub trait FileContentProvider {
    /// # Errors
    ///
    /// Returns `ContentError::NotFound` when the file does not exist at
    /// `reference`, or another `ContentError` when it cannot be read.
    fn file_content(&self, path: &str, reference: &str) -> Result<String, ContentError>;
}

/// Reads files out of a git repository with `git show <ref>:<path>`.
#[derive(Debug, Clone)]
pub struct GitContentProvider {
    repo_path: PathBuf,
}

impl GitContentProvider {
    #[must_use]
    pub fn new(repo_path: impl Into<PathBuf>) -> Self {
        Self {
            repo_path: repo_path.into(),
        }
    }
}

impl FileContentProvider for GitContentProvider {
    fn file_content(&self, path: &str, reference: &str) -> Result<String, ContentError> {
        let reference = if reference.is_empty() { "HEAD" } else { reference };
        // Would be read as a `git show` option rather than a revision
        if reference.starts_with('-') {
            return Err(ContentError::Git {
                path: path.to_string(),
                reference: reference.to_string(),
                stderr: "invalid reference".to_string(),
            });
        }

        let mut cmd = Command::new("git");
        cmd.current_dir(&self.repo_path);
        cmd.arg("show").arg(format!("{reference}:{path}"));
        debug!("git show {reference}:{path} in {}", self.repo_path.display());

        let output = cmd.output().map_err(|source| ContentError::Io {
            path: self.repo_path.clone(),
            source,
        })?;

        if output.status.success() {
            return Ok(String::from_utf8_lossy(&output.stdout).into_owned());
        }

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if stderr.contains("does not exist") || stderr.contains("exists on disk, but not in") {
            Err(ContentError::NotFound {
                path: path.to_string(),
                reference: reference.to_string(),
            })
        } else {
            Err(ContentError::Git {
                path: path.to_string(),
                reference: reference.to_string(),
                stderr,
            })
        }
    }
}

/// Reads files from a checked-out tree; the reference is ignored.
#[derive(Debug, Clone)]
pub struct DirContentProvider {
    root: PathBuf,
}

impl DirContentProvider {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl FileContentProvider for DirContentProvider {
    fn file_content(&self, path: &str, reference: &str) -> Result<String, ContentError> {
        let not_found = || ContentError::NotFound {
            path: path.to_string(),
            reference: reference.to_string(),
        };

        // Diff paths are repository-relative; never step outside the root.
        let relative = Path::new(path);
        if !relative
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return Err(not_found());
        }

        let full = self.root.join(relative);
        std::fs::read_to_string(&full).map_err(|source| {
            if source.kind() == ErrorKind::NotFound {
                not_found()
            } else {
                ContentError::Io { path: full, source }
            }
        })
    }
}

/// In-memory files keyed by path, identical at every reference.
impl FileContentProvider for HashMap<String, String> {
    fn file_content(&self, path: &str, reference: &str) -> Result<String, ContentError> {
        self.get(path).cloned().ok_or_else(|| ContentError::NotFound {
            path: path.to_string(),
            reference: reference.to_string(),
        })
    }
}
