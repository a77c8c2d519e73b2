//! sidediff - two-up (side-by-side) diff engine for pull-request review pages
//!
//! Parse a unified diff into changesets, pair old/new lines into display rows,
//! highlight them, and compose the result with inline annotations and
//! expandable context gaps. Every stage is a pure function of its inputs.

#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::too_many_lines)]

pub mod config;
pub mod content;
pub mod diff;
pub mod error;
pub mod syntax;
pub mod text;
pub mod view;

pub use config::{EngineConfig, OutputFormat};
pub use content::{DirContentProvider, FileContentProvider, GitContentProvider};
pub use diff::{Changeset, DiffHunk, DiffLine, DiffLineKind, ParsedDiff};
pub use error::{ContentError, ParseError};
pub use syntax::Highlighter;
pub use text::Fragment;
pub use view::{
    materialize_context, materialize_gap, render_changeset, render_diff, ContextGap,
    InlineAnnotation, LineStyle, RenderNode, RenderOptions, Row, Side, TwoUpView,
};
