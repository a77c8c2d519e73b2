//! Two-up (side-by-side) view construction
//!
//! Sub-modules:
//! - `rows`: pairs removed/added lines into display rows
//! - `comments`: inline annotations and their placement index
//! - `context`: context gaps between hunks and on-demand materialization
//! - `render`: composes rows, highlighting, annotations and gaps
//! - `html`: writes render nodes as two-up table markup

mod comments;
mod context;
pub mod html;
mod render;
mod rows;

use serde::Serialize;

use crate::diff::ChangesetSummary;
use crate::text::Fragment;

pub use comments::{InlineAnnotation, Side};
pub use context::{
    gap_before_hunk, materialize_context, materialize_gap, trailing_gap, ContextGap, GapPosition,
};
pub use render::{render_changeset, render_diff, RenderOptions, DEFAULT_TRAILING_CONTEXT_LINES};
pub use rows::{build_hunk_rows, build_rows_by_hunk};

// ---------------------------------------------------------------------------
// Shared types
// ---------------------------------------------------------------------------

/// Change styling for one side of a row
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LineStyle {
    /// Context or materialized line
    #[default]
    None,
    /// Changed line with a counterpart on the other side of the row
    PairedChange,
    /// Changed line whose other side is blank
    UnpairedChange,
}

impl LineStyle {
    /// CSS classes for the old-side cells
    #[must_use]
    pub const fn old_class(self) -> &'static str {
        match self {
            Self::None => "",
            Self::PairedChange => "old",
            Self::UnpairedChange => "old old-full",
        }
    }

    /// CSS classes for the new-side cells
    #[must_use]
    pub const fn new_class(self) -> &'static str {
        match self {
            Self::None => "",
            Self::PairedChange => "new",
            Self::UnpairedChange => "new new-full",
        }
    }
}

/// One display row of the two-up table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Row {
    pub old_line: Option<u32>,
    pub new_line: Option<u32>,
    pub old_style: LineStyle,
    pub new_style: LineStyle,
    pub old_content: Fragment,
    pub new_content: Fragment,
    pub is_context: bool,
}

impl Row {
    /// A row showing the same line on both sides, unstyled.
    #[must_use]
    pub fn unchanged(old_line: u32, new_line: u32, content: Fragment) -> Self {
        Self {
            old_line: Some(old_line),
            new_line: Some(new_line),
            old_style: LineStyle::None,
            new_style: LineStyle::None,
            old_content: content.clone(),
            new_content: content,
            is_context: true,
        }
    }
}

/// Closed set of things a two-up table is made of
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RenderNode {
    Row(Row),
    Annotation(InlineAnnotation),
    Gap(ContextGap),
}

/// The rendered view of one changeset
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TwoUpView {
    pub changeset: ChangesetSummary,
    /// Opaque reference (commit, branch) used to fetch context for gaps
    pub context_ref: String,
    pub is_binary: bool,
    pub nodes: Vec<RenderNode>,
    /// Annotations for this file that matched no row, in caller order
    pub unplaced: Vec<InlineAnnotation>,
}

impl TwoUpView {
    pub fn rows(&self) -> impl Iterator<Item = &Row> {
        self.nodes.iter().filter_map(|node| match node {
            RenderNode::Row(row) => Some(row),
            _ => None,
        })
    }

    pub fn gaps(&self) -> impl Iterator<Item = &ContextGap> {
        self.nodes.iter().filter_map(|node| match node {
            RenderNode::Gap(gap) => Some(gap),
            _ => None,
        })
    }

    pub fn annotations(&self) -> impl Iterator<Item = &InlineAnnotation> {
        self.nodes.iter().filter_map(|node| match node {
            RenderNode::Annotation(annotation) => Some(annotation),
            _ => None,
        })
    }
}
