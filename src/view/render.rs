//! Changeset rendering: rows + highlighting + annotations + context gaps.

use log::debug;

use crate::diff::{Changeset, DiffLineKind, ParsedDiff};
use crate::syntax::Highlighter;

use super::comments::{AnnotationIndex, InlineAnnotation};
use super::context::{gap_before_hunk, trailing_gap};
use super::rows::build_rows_by_hunk;
use super::{RenderNode, TwoUpView};

/// Lines offered below the last hunk
pub const DEFAULT_TRAILING_CONTEXT_LINES: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    pub trailing_context_lines: u32,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            trailing_context_lines: DEFAULT_TRAILING_CONTEXT_LINES,
        }
    }
}

/// Render one changeset into its two-up view.
///
/// `context_ref` is carried through untouched so gaps can later be expanded
/// against the right revision. Annotations for other files are ignored;
/// annotations for this file that match no row end up in `unplaced`.
#[must_use]
pub fn render_changeset(
    highlighter: &Highlighter,
    cs: &Changeset,
    context_ref: &str,
    annotations: &[InlineAnnotation],
    options: RenderOptions,
) -> TwoUpView {
    let mut index = AnnotationIndex::new(cs, annotations);
    let mut view = TwoUpView {
        changeset: cs.summary(),
        context_ref: context_ref.to_string(),
        is_binary: cs.is_binary,
        nodes: Vec::new(),
        unplaced: Vec::new(),
    };

    if cs.is_binary {
        view.unplaced = index.into_unplaced();
        return view;
    }

    // One highlighting pass per side over every hunk's lines
    let (old_lines, new_lines) = collect_sides(cs);
    let new_path = cs.display_path();
    let old_path = if cs.is_new { new_path } else { cs.old_path.as_str() };
    let mut old_hl = highlighter.highlight_lines(old_path, &old_lines).into_iter();
    let mut new_hl = highlighter.highlight_lines(new_path, &new_lines).into_iter();

    for (hunk_idx, rows) in build_rows_by_hunk(cs).into_iter().enumerate() {
        if let Some(gap) = gap_before_hunk(cs, hunk_idx) {
            view.nodes.push(RenderNode::Gap(gap));
        }

        for mut row in rows {
            if row.old_line.is_some() {
                if let Some(fragment) = old_hl.next() {
                    row.old_content = fragment;
                }
            }
            if row.new_line.is_some() {
                if let Some(fragment) = new_hl.next() {
                    row.new_content = fragment;
                }
            }

            let placed = index.take_for_row(&row);
            view.nodes.push(RenderNode::Row(row));
            view.nodes
                .extend(placed.into_iter().map(RenderNode::Annotation));
        }
    }

    if let Some(gap) = trailing_gap(cs, options.trailing_context_lines) {
        view.nodes.push(RenderNode::Gap(gap));
    }

    view.unplaced = index.into_unplaced();
    debug!(
        "rendered changeset {} ({}): {} nodes, {} unplaced annotations",
        cs.id,
        new_path,
        view.nodes.len(),
        view.unplaced.len()
    );
    view
}

/// Render every changeset of a parsed diff.
#[must_use]
pub fn render_diff(
    highlighter: &Highlighter,
    diff: &ParsedDiff,
    context_ref: &str,
    annotations: &[InlineAnnotation],
    options: RenderOptions,
) -> Vec<TwoUpView> {
    diff.changesets
        .iter()
        .map(|cs| render_changeset(highlighter, cs, context_ref, annotations, options))
        .collect()
}

/// Old-side and new-side line contents in row order, for the highlighter.
fn collect_sides(cs: &Changeset) -> (Vec<&str>, Vec<&str>) {
    let mut old_lines = Vec::new();
    let mut new_lines = Vec::new();
    for line in cs.hunks.iter().flat_map(|h| &h.lines) {
        match line.kind {
            DiffLineKind::Context => {
                old_lines.push(line.content.as_str());
                new_lines.push(line.content.as_str());
            }
            DiffLineKind::Removed => old_lines.push(line.content.as_str()),
            DiffLineKind::Added => new_lines.push(line.content.as_str()),
        }
    }
    (old_lines, new_lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::{GapPosition, LineStyle, Side};

    const TWO_HUNKS: &str = "diff --git a/src/lib.rs b/src/lib.rs
--- a/src/lib.rs
+++ b/src/lib.rs
@@ -1,5 +1,5 @@
 fn one() {}
 fn two() {}
-fn three() {}
+fn three_renamed() {}
 fn four() {}
 fn five() {}
@@ -10,2 +10,3 @@
 fn ten() {}
+fn ten_and_a_half() {}
 fn eleven() {}
";

    fn parse(diff: &str) -> Changeset {
        ParsedDiff::parse(diff).expect("valid diff").changesets.remove(0)
    }

    fn annotation(id: i64, line: u32, side: Side) -> InlineAnnotation {
        InlineAnnotation {
            id,
            author: "reviewer".to_string(),
            avatar_url: String::new(),
            body: format!("note {id}"),
            path: "src/lib.rs".to_string(),
            line,
            side,
        }
    }

    #[test]
    fn gaps_are_placed_between_and_after_hunks() {
        let highlighter = Highlighter::new();
        let cs = parse(TWO_HUNKS);
        let view = render_changeset(&highlighter, &cs, "abc123", &[], RenderOptions::default());

        let gaps: Vec<_> = view.gaps().collect();
        assert_eq!(gaps.len(), 2);
        assert_eq!((gaps[0].start_line, gaps[0].end_line), (6, 9));
        assert_eq!(gaps[0].position, GapPosition::Between);
        assert_eq!((gaps[1].start_line, gaps[1].end_line), (13, 32));
        assert_eq!(gaps[1].position, GapPosition::Below);
        assert_eq!(view.context_ref, "abc123");

        // Gap node sits right before the first row of hunk 2
        let gap_pos = view
            .nodes
            .iter()
            .position(|n| matches!(n, RenderNode::Gap(_)))
            .expect("gap node");
        match &view.nodes[gap_pos + 1] {
            RenderNode::Row(row) => assert_eq!(row.new_line, Some(10)),
            other => panic!("expected row after gap, got {other:?}"),
        }
    }

    #[test]
    fn rows_carry_highlighted_content() {
        let highlighter = Highlighter::new();
        let cs = parse(TWO_HUNKS);
        let view = render_changeset(&highlighter, &cs, "HEAD", &[], RenderOptions::default());

        let rows: Vec<_> = view.rows().collect();
        assert_eq!(rows.len(), 5 + 3);
        let changed = rows[2];
        assert_eq!(changed.old_style, LineStyle::PairedChange);
        assert!(changed.old_content.as_str().contains("three"));
        assert!(changed.new_content.as_str().contains("three_renamed"));
        assert!(changed.new_content.as_str().contains("<span"));

        let inserted = rows[6];
        assert_eq!(inserted.old_line, None);
        assert!(inserted.old_content.is_empty());
        assert!(inserted.new_content.as_str().contains("ten_and_a_half"));
    }

    #[test]
    fn annotations_follow_their_row_in_caller_order() {
        let highlighter = Highlighter::new();
        let cs = parse(TWO_HUNKS);
        let annotations = vec![
            annotation(1, 3, Side::New),
            annotation(2, 3, Side::Old),
            annotation(3, 3, Side::New),
            annotation(4, 500, Side::New),
        ];
        let view = render_changeset(
            &highlighter,
            &cs,
            "HEAD",
            &annotations,
            RenderOptions::default(),
        );

        let row_pos = view
            .nodes
            .iter()
            .position(|n| matches!(n, RenderNode::Row(r) if r.new_line == Some(3)))
            .expect("row for line 3");
        let following: Vec<i64> = view.nodes[row_pos + 1..]
            .iter()
            .map_while(|n| match n {
                RenderNode::Annotation(a) => Some(a.id),
                _ => None,
            })
            .collect();
        assert_eq!(following, vec![1, 3, 2]);

        assert_eq!(view.unplaced.len(), 1);
        assert_eq!(view.unplaced[0].id, 4);
    }

    #[test]
    fn annotations_for_other_files_are_ignored() {
        let highlighter = Highlighter::new();
        let cs = parse(TWO_HUNKS);
        let mut other = annotation(9, 3, Side::New);
        other.path = "README.md".to_string();
        let view = render_changeset(&highlighter, &cs, "HEAD", &[other], RenderOptions::default());
        assert_eq!(view.annotations().count(), 0);
        assert!(view.unplaced.is_empty());
    }

    #[test]
    fn context_above_first_hunk() {
        let highlighter = Highlighter::new();
        let cs = parse("--- a/a.py\n+++ b/a.py\n@@ -7,1 +7,1 @@\n-x = 1\n+x = 2\n");
        let view = render_changeset(&highlighter, &cs, "HEAD", &[], RenderOptions::default());
        match &view.nodes[0] {
            RenderNode::Gap(gap) => {
                assert_eq!(gap.position, GapPosition::Above);
                assert_eq!((gap.start_line, gap.end_line), (1, 6));
            }
            other => panic!("expected leading gap, got {other:?}"),
        }
    }

    #[test]
    fn binary_changeset_has_no_nodes() {
        let highlighter = Highlighter::new();
        let cs = parse("diff --git a/img.png b/img.png\nBinary files a/img.png and b/img.png differ\n");
        let view = render_changeset(&highlighter, &cs, "HEAD", &[], RenderOptions::default());
        assert!(view.is_binary);
        assert!(view.nodes.is_empty());
        assert_eq!(view.changeset.lines_added, 0);
    }

    #[test]
    fn trailing_window_follows_options() {
        let highlighter = Highlighter::new();
        let cs = parse(TWO_HUNKS);
        let none = render_changeset(
            &highlighter,
            &cs,
            "HEAD",
            &[],
            RenderOptions {
                trailing_context_lines: 0,
            },
        );
        assert_eq!(none.gaps().count(), 1);

        let five = render_changeset(
            &highlighter,
            &cs,
            "HEAD",
            &[],
            RenderOptions {
                trailing_context_lines: 5,
            },
        );
        let last = five.gaps().last().expect("trailing gap");
        assert_eq!((last.start_line, last.end_line), (13, 17));
    }

    #[test]
    fn render_diff_covers_every_changeset() {
        let highlighter = Highlighter::new();
        let diff = ParsedDiff::parse(&format!(
            "{TWO_HUNKS}diff --git a/b.txt b/b.txt\n--- a/b.txt\n+++ b/b.txt\n@@ -1 +1 @@\n-a\n+b\n"
        ))
        .expect("valid diff");
        let views = render_diff(&highlighter, &diff, "HEAD", &[], RenderOptions::default());
        assert_eq!(views.len(), 2);
        assert_eq!(views[1].changeset.id, 2);
        assert_eq!(views[1].changeset.display_path, "b.txt");
    }

    #[test]
    fn view_serializes_with_tagged_nodes() {
        let highlighter = Highlighter::new();
        let cs = parse("--- a/n.txt\n+++ b/n.txt\n@@ -1 +1 @@\n-a\n+b\n");
        let view = render_changeset(&highlighter, &cs, "HEAD", &[], RenderOptions::default());
        let json = serde_json::to_value(&view).expect("serialize");
        assert_eq!(json["nodes"][0]["type"], "row");
        assert_eq!(json["nodes"][0]["old_style"], "paired-change");
        assert_eq!(json["nodes"][1]["type"], "gap");
    }
}
