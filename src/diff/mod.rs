//! Unified diff data model and parser

mod model;
mod parse;

pub use model::{
    file_icon, Changeset, ChangesetSummary, DiffHunk, DiffLine, DiffLineKind, FileStatus,
    ParsedDiff, NULL_DEVICE,
};
