//! Context gaps around hunks and on-demand materialization of their lines.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::content::FileContentProvider;
use crate::diff::Changeset;
use crate::error::ContentError;
use crate::syntax::Highlighter;

use super::Row;

/// Where a gap sits relative to the hunks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GapPosition {
    Above,
    Between,
    Below,
}

/// A collapsed run of unchanged new-side lines that can be expanded later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextGap {
    pub path: String,
    /// First new-side line (1-based, inclusive)
    pub start_line: u32,
    /// Last new-side line (inclusive)
    pub end_line: u32,
    pub changeset_id: u32,
    pub position: GapPosition,
    /// old line = new line + `old_offset` throughout the gap
    #[serde(default)]
    pub old_offset: i64,
}

impl ContextGap {
    /// Number of lines the gap spans (a trailing window may extend past EOF)
    #[must_use]
    pub const fn len(&self) -> u32 {
        if self.is_empty() {
            0
        } else {
            (self.end_line - self.start_line).saturating_add(1)
        }
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.end_line < self.start_line
    }

    /// Text for the expand control
    #[must_use]
    pub fn label(&self) -> String {
        match self.position {
            GapPosition::Above => format!("Context above (lines 1\u{2013}{})", self.end_line),
            GapPosition::Between => format!("Show {} more lines", self.len()),
            GapPosition::Below => "Context below".to_string(),
        }
    }
}

/// The gap to show before hunk `idx`, if any.
///
/// Before the first hunk the gap runs from line 1; between hunks it covers
/// the new-side lines neither hunk shows.
#[must_use]
pub fn gap_before_hunk(cs: &Changeset, idx: usize) -> Option<ContextGap> {
    let hunk = cs.hunks.get(idx)?;

    if idx == 0 {
        if hunk.new_start <= 1 {
            return None;
        }
        return Some(ContextGap {
            path: cs.display_path().to_string(),
            start_line: 1,
            end_line: hunk.new_start - 1,
            changeset_id: cs.id,
            position: GapPosition::Above,
            old_offset: i64::from(hunk.old_start) - i64::from(hunk.new_start),
        });
    }

    let prev = &cs.hunks[idx - 1];
    let prev_end = prev.new_end_exclusive();
    if hunk.new_start <= prev_end {
        return None;
    }
    Some(ContextGap {
        path: cs.display_path().to_string(),
        start_line: prev_end,
        end_line: hunk.new_start - 1,
        changeset_id: cs.id,
        position: GapPosition::Between,
        old_offset: i64::from(prev.old_end_exclusive()) - i64::from(prev_end),
    })
}

/// Fixed window of `lines` new-side lines after the last hunk.
///
/// Deleted files have nothing below their last hunk.
#[must_use]
pub fn trailing_gap(cs: &Changeset, lines: u32) -> Option<ContextGap> {
    if lines == 0 || cs.is_deleted {
        return None;
    }
    let last = cs.hunks.last()?;
    let start = last.new_end_exclusive().max(1);
    Some(ContextGap {
        path: cs.display_path().to_string(),
        start_line: start,
        end_line: start.saturating_add(lines - 1),
        changeset_id: cs.id,
        position: GapPosition::Below,
        old_offset: i64::from(last.old_end_exclusive()) - i64::from(start),
    })
}

/// Rows for lines `start..=end` (1-based) of `file_text`.
///
/// The range is clamped to the file; an empty range after clamping yields no
/// rows. Both sides show the same highlighted line with no change styling.
#[must_use]
pub fn materialize_context(
    highlighter: &Highlighter,
    path: &str,
    file_text: &str,
    start: i64,
    end: i64,
) -> Vec<Row> {
    let lines: Vec<&str> = file_text.lines().collect();
    let start = start.max(1);
    let end = end.min(lines.len() as i64);
    if start > end {
        return Vec::new();
    }

    let first = (start - 1) as usize;
    let slice = &lines[first..end as usize];
    let highlighted = highlighter.highlight_lines(path, slice);

    highlighted
        .into_iter()
        .enumerate()
        .map(|(i, fragment)| {
            let line_num = (first + i + 1) as u32;
            Row::unchanged(line_num, line_num, fragment)
        })
        .collect()
}

/// Fetch the file behind `gap` at `reference` and materialize exactly its range.
///
/// # Errors
///
/// Returns a `ContentError` if the provider cannot supply the file.
pub fn materialize_gap(
    highlighter: &Highlighter,
    provider: &dyn FileContentProvider,
    gap: &ContextGap,
    reference: &str,
) -> Result<Vec<Row>, ContentError> {
    let text = provider.file_content(&gap.path, reference)?;
    let mut rows = materialize_context(
        highlighter,
        &gap.path,
        &text,
        i64::from(gap.start_line),
        i64::from(gap.end_line),
    );
    for row in &mut rows {
        row.old_line = row
            .old_line
            .and_then(|n| u32::try_from(i64::from(n) + gap.old_offset).ok())
            .filter(|n| *n > 0);
    }
    debug!(
        "materialized {} context rows for {} [{}, {}]",
        rows.len(),
        gap.path,
        gap.start_line,
        gap.end_line
    );
    Ok(rows)
}
