//! Pairing of diff lines into two-up rows.
//!
//! A run of removed lines followed by a run of added lines is front-aligned:
//! row j shows removed line j beside added line j, and the longer run spills
//! into rows with one blank side. This is not a minimum-edit alignment and is
//! kept that way so rows line up with what reviewers already see elsewhere.

use crate::diff::{Changeset, DiffHunk, DiffLine, DiffLineKind};
use crate::text::Fragment;

use super::{LineStyle, Row};

/// Build rows for every hunk of a changeset, one `Vec` per hunk.
#[must_use]
pub fn build_rows_by_hunk(cs: &Changeset) -> Vec<Vec<Row>> {
    cs.hunks.iter().map(build_hunk_rows).collect()
}

/// Build the rows of a single hunk.
///
/// Row content is the escaped raw line; the renderer swaps in highlighted
/// fragments afterwards.
#[must_use]
pub fn build_hunk_rows(hunk: &DiffHunk) -> Vec<Row> {
    let mut rows = Vec::with_capacity(hunk.lines.len());
    let lines = &hunk.lines;
    let mut i = 0;

    while i < lines.len() {
        let line = &lines[i];
        match line.kind {
            DiffLineKind::Context => {
                let content = Fragment::escaped(&line.content);
                rows.push(Row {
                    old_line: line.old_line,
                    new_line: line.new_line,
                    old_style: LineStyle::None,
                    new_style: LineStyle::None,
                    old_content: content.clone(),
                    new_content: content,
                    is_context: true,
                });
                i += 1;
            }
            DiffLineKind::Removed => {
                let removals = take_run(lines, &mut i, DiffLineKind::Removed);
                let additions = take_run(lines, &mut i, DiffLineKind::Added);
                pair_runs(&mut rows, removals, additions);
            }
            DiffLineKind::Added => {
                // Added lines not preceded by removals
                rows.push(added_only(line));
                i += 1;
            }
        }
    }

    rows
}

/// Consume the maximal run of `kind` lines starting at `*i`.
fn take_run<'a>(lines: &'a [DiffLine], i: &mut usize, kind: DiffLineKind) -> &'a [DiffLine] {
    let start = *i;
    while *i < lines.len() && lines[*i].kind == kind {
        *i += 1;
    }
    &lines[start..*i]
}

fn pair_runs(rows: &mut Vec<Row>, removals: &[DiffLine], additions: &[DiffLine]) {
    let paired_len = removals.len().min(additions.len());
    let max_len = removals.len().max(additions.len());

    for j in 0..max_len {
        let style = if j < paired_len {
            LineStyle::PairedChange
        } else {
            LineStyle::UnpairedChange
        };
        let mut row = Row::default();
        if let Some(old) = removals.get(j) {
            row.old_line = old.old_line;
            row.old_style = style;
            row.old_content = Fragment::escaped(&old.content);
        }
        if let Some(new) = additions.get(j) {
            row.new_line = new.new_line;
            row.new_style = style;
            row.new_content = Fragment::escaped(&new.content);
        }
        rows.push(row);
    }
}

fn added_only(line: &DiffLine) -> Row {
    Row {
        new_line: line.new_line,
        new_style: LineStyle::UnpairedChange,
        new_content: Fragment::escaped(&line.content),
        ..Row::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::ParsedDiff;

    fn hunk(body: &str, header: &str) -> DiffHunk {
        let diff = format!("--- a/f.txt\n+++ b/f.txt\n{header}\n{body}");
        let parsed = ParsedDiff::parse(&diff).expect("valid diff");
        parsed.changesets[0].hunks[0].clone()
    }

    #[test]
    fn pure_modification_pairs_line_by_line() {
        let rows = build_hunk_rows(&hunk("-foo\n+bar\n-baz\n+qux\n", "@@ -1,2 +1,2 @@"));

        // -foo +bar -baz +qux is two separate runs of one each
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].old_content.as_str(), "foo");
        assert_eq!(rows[0].new_content.as_str(), "bar");
        assert_eq!(rows[0].old_style, LineStyle::PairedChange);
        assert_eq!(rows[0].new_style, LineStyle::PairedChange);
        assert_eq!(rows[1].old_content.as_str(), "baz");
        assert_eq!(rows[1].new_content.as_str(), "qux");
        assert_eq!(rows[1].old_style, LineStyle::PairedChange);
        assert_eq!(rows[1].new_style, LineStyle::PairedChange);
        assert!(rows.iter().all(|r| !r.is_context));
    }

    #[test]
    fn unequal_runs_spill_into_unpaired_rows() {
        let rows = build_hunk_rows(&hunk("-a\n-b\n+x\n", "@@ -1,2 +1,1 @@"));

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].old_content.as_str(), "a");
        assert_eq!(rows[0].new_content.as_str(), "x");
        assert_eq!(rows[0].old_style, LineStyle::PairedChange);
        assert_eq!(rows[0].new_style, LineStyle::PairedChange);

        assert_eq!(rows[1].old_content.as_str(), "b");
        assert_eq!(rows[1].old_line, Some(2));
        assert_eq!(rows[1].old_style, LineStyle::UnpairedChange);
        assert_eq!(rows[1].new_line, None);
        assert!(rows[1].new_content.is_empty());
        assert_eq!(rows[1].new_style, LineStyle::None);
    }

    #[test]
    fn more_additions_than_removals() {
        let rows = build_hunk_rows(&hunk("-a\n+x\n+y\n+z\n", "@@ -1,1 +1,3 @@"));
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].old_line, Some(1));
        assert_eq!(rows[0].new_line, Some(1));
        assert_eq!(rows[2].old_line, None);
        assert_eq!(rows[2].new_line, Some(3));
        assert_eq!(rows[2].new_style, LineStyle::UnpairedChange);
    }

    #[test]
    fn pure_insertion_is_new_side_only() {
        let rows = build_hunk_rows(&hunk(" keep\n+one\n+two\n keep2\n", "@@ -1,2 +1,4 @@"));
        assert_eq!(rows.len(), 4);
        assert!(rows[0].is_context);
        assert_eq!((rows[0].old_line, rows[0].new_line), (Some(1), Some(1)));
        for row in &rows[1..3] {
            assert_eq!(row.old_line, None);
            assert_eq!(row.old_style, LineStyle::None);
            assert_eq!(row.new_style, LineStyle::UnpairedChange);
        }
        assert_eq!((rows[3].old_line, rows[3].new_line), (Some(2), Some(4)));
    }

    #[test]
    fn every_line_appears_in_exactly_one_row() {
        let h = hunk(
            " c1\n-r1\n-r2\n-r3\n+a1\n c2\n+a2\n+a3\n-r4\n c3\n",
            "@@ -1,7 +1,6 @@",
        );
        let rows = build_hunk_rows(&h);

        let mut old_seen: Vec<u32> = rows.iter().filter_map(|r| r.old_line).collect();
        let mut new_seen: Vec<u32> = rows.iter().filter_map(|r| r.new_line).collect();
        old_seen.sort_unstable();
        new_seen.sort_unstable();

        let old_expected: Vec<u32> = h.lines.iter().filter_map(|l| l.old_line).collect();
        let new_expected: Vec<u32> = h.lines.iter().filter_map(|l| l.new_line).collect();
        assert_eq!(old_seen, old_expected);
        assert_eq!(new_seen, new_expected);

        // c1, max(3,1)=3, c2, a2, a3, r4, c3
        assert_eq!(rows.len(), 1 + 3 + 1 + 2 + 1 + 1);
    }

    #[test]
    fn removal_run_not_followed_by_additions() {
        let rows = build_hunk_rows(&hunk(" a\n-b\n-c\n d\n", "@@ -1,4 +1,2 @@"));
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[1].old_style, LineStyle::UnpairedChange);
        assert_eq!(rows[2].old_style, LineStyle::UnpairedChange);
        assert_eq!(rows[2].new_line, None);
    }

    #[test]
    fn rows_by_hunk_keeps_hunk_grouping() {
        let diff = "--- a/f\n+++ b/f\n@@ -1 +1 @@\n-a\n+b\n@@ -9 +9 @@\n-y\n+z\n";
        let cs = &ParsedDiff::parse(diff).expect("valid diff").changesets[0];
        let by_hunk = build_rows_by_hunk(cs);
        assert_eq!(by_hunk.len(), 2);
        assert_eq!(by_hunk[1][0].old_line, Some(9));
    }

    #[test]
    fn content_is_escaped() {
        let rows = build_hunk_rows(&hunk("-<a>\n+<b>\n", "@@ -1 +1 @@"));
        assert_eq!(rows[0].old_content.as_str(), "&lt;a&gt;");
        assert_eq!(rows[0].new_content.as_str(), "&lt;b&gt;");
    }
}
