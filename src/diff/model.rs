//! Parsed diff data model.
//!
//! Everything here is immutable once the parser hands it out, so a single
//! `ParsedDiff` can be shared read-only across concurrent renders.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Path used by unified diffs for the missing side of a created/deleted file.
pub const NULL_DEVICE: &str = "/dev/null";

/// A parsed multi-file unified diff
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedDiff {
    pub changesets: Vec<Changeset>,
}

impl ParsedDiff {
    /// Look up a changeset by its 1-based id
    #[must_use]
    pub fn changeset(&self, id: u32) -> Option<&Changeset> {
        self.changesets.iter().find(|cs| cs.id == id)
    }

    /// Total added/removed lines across all files
    #[must_use]
    pub fn totals(&self) -> (u32, u32) {
        self.changesets.iter().fold((0, 0), |(added, removed), cs| {
            (added + cs.lines_added, removed + cs.lines_removed)
        })
    }
}

/// One file's worth of diff
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Changeset {
    /// 1-based position in the parsed document
    pub id: u32,
    pub old_path: String,
    pub new_path: String,
    pub is_new: bool,
    pub is_deleted: bool,
    pub is_renamed: bool,
    pub is_binary: bool,
    pub hunks: Vec<DiffHunk>,
    pub lines_added: u32,
    pub lines_removed: u32,
}

/// A single hunk from a diff
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffHunk {
    /// The @@ header line
    pub header: String,
    /// Text following the closing @@ (usually the enclosing function)
    pub section: String,
    /// Starting line in old file
    pub old_start: u32,
    /// Number of lines in old file
    pub old_count: u32,
    /// Starting line in new file
    pub new_start: u32,
    /// Number of lines in new file
    pub new_count: u32,
    /// Lines in this hunk
    pub lines: Vec<DiffLine>,
}

/// A single line in a diff hunk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffLine {
    pub kind: DiffLineKind,
    /// Line number in old file (absent for added lines)
    pub old_line: Option<u32>,
    /// Line number in new file (absent for removed lines)
    pub new_line: Option<u32>,
    /// The line content (without the +/- prefix)
    pub content: String,
}

/// Type of diff line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffLineKind {
    Context,
    Added,
    Removed,
}

/// How a file changed, for file-tree style listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Added,
    Deleted,
    Renamed,
    Modified,
}

/// Per-file metadata a page needs for headers and the file tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangesetSummary {
    pub id: u32,
    pub display_path: String,
    pub icon: &'static str,
    pub status: FileStatus,
    pub lines_added: u32,
    pub lines_removed: u32,
}

impl DiffHunk {
    /// First new-side line number after this hunk
    #[must_use]
    pub const fn new_end_exclusive(&self) -> u32 {
        self.new_start.saturating_add(self.new_count)
    }

    /// First old-side line number after this hunk
    #[must_use]
    pub const fn old_end_exclusive(&self) -> u32 {
        self.old_start.saturating_add(self.old_count)
    }
}

impl Changeset {
    /// The path to show for this file: the new path unless the file was deleted.
    #[must_use]
    pub fn display_path(&self) -> &str {
        if self.new_path.is_empty() || self.new_path == NULL_DEVICE {
            &self.old_path
        } else {
            &self.new_path
        }
    }

    #[must_use]
    pub const fn status(&self) -> FileStatus {
        if self.is_new {
            FileStatus::Added
        } else if self.is_deleted {
            FileStatus::Deleted
        } else if self.is_renamed {
            FileStatus::Renamed
        } else {
            FileStatus::Modified
        }
    }

    #[must_use]
    pub fn summary(&self) -> ChangesetSummary {
        let path = self.display_path();
        ChangesetSummary {
            id: self.id,
            display_path: path.to_string(),
            icon: file_icon(path),
            status: self.status(),
            lines_added: self.lines_added,
            lines_removed: self.lines_removed,
        }
    }

    /// Count added/removed lines across all hunks.
    #[must_use]
    pub fn count_changes(hunks: &[DiffHunk]) -> (u32, u32) {
        let mut added = 0u32;
        let mut removed = 0u32;
        for hunk in hunks {
            for line in &hunk.lines {
                match line.kind {
                    DiffLineKind::Added => added += 1,
                    DiffLineKind::Removed => removed += 1,
                    DiffLineKind::Context => {}
                }
            }
        }
        (added, removed)
    }
}

/// Font Awesome icon class for a filename
#[must_use]
pub fn file_icon(path: &str) -> &'static str {
    let ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();
    match ext {
        "go" | "rs" | "js" | "ts" | "jsx" | "tsx" | "py" | "rb" | "c" | "h" | "cpp" | "java"
        | "css" | "scss" | "less" | "html" | "htm" | "tmpl" | "json" | "yaml" | "yml"
        | "toml" => "fa-file-code-o",
        "png" | "jpg" | "jpeg" | "gif" | "svg" | "ico" => "fa-file-image-o",
        _ => "fa-file-text",
    }
}
