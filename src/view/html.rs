//! HTML output for two-up views.
//!
//! All escaping happens here or in the highlighter: `Fragment`s are written
//! verbatim, every other string goes through `escape_html`.

use std::fmt::Write;

use crate::text::escape_html;

use super::{ContextGap, InlineAnnotation, RenderNode, Row, TwoUpView};

/// Write a complete changeset block: header, then the two-up table.
#[must_use]
pub fn write_view(view: &TwoUpView) -> String {
    let cs = &view.changeset;
    let mut out = String::new();

    let _ = write!(
        out,
        r#"<div class="differential-changeset" id="diff-C{id}" data-lines-added="{added}" data-lines-removed="{removed}" data-ref="{reference}">"#,
        id = cs.id,
        added = cs.lines_added,
        removed = cs.lines_removed,
        reference = escape_html(&view.context_ref),
    );
    write_header(&mut out, view);

    if view.is_binary {
        out.push_str(r#"<div class="changeset-binary">Binary file not shown.</div></div>"#);
        return out;
    }

    out.push_str(r#"<table class="differential-diff diff-2up">"#);
    out.push_str(
        r#"<colgroup><col class="num"/><col class="left"/><col class="num"/><col class="copy"/><col class="right"/></colgroup>"#,
    );
    for node in &view.nodes {
        match node {
            RenderNode::Row(row) => write_row(&mut out, cs.id, row),
            RenderNode::Annotation(annotation) => write_annotation(&mut out, annotation),
            RenderNode::Gap(gap) => write_gap(&mut out, gap),
        }
    }
    out.push_str("</table>");

    if !view.unplaced.is_empty() {
        out.push_str(r#"<div class="changeset-file-comments">"#);
        for annotation in &view.unplaced {
            write_annotation_body(&mut out, annotation);
        }
        out.push_str("</div>");
    }
    out.push_str("</div>");
    out
}

/// Write materialized context rows as bare `<tr>` elements.
#[must_use]
pub fn write_context_rows(changeset_id: u32, rows: &[Row]) -> String {
    let mut out = String::new();
    for row in rows {
        write_row(&mut out, changeset_id, row);
    }
    out
}

fn write_header(out: &mut String, view: &TwoUpView) {
    let cs = &view.changeset;
    out.push_str(r#"<div class="changeset-header">"#);
    let _ = write!(
        out,
        r#"<span class="phui-font-fa {icon}"></span><span class="changeset-path">{path}</span>"#,
        icon = cs.icon,
        path = escape_html(&cs.display_path),
    );
    out.push_str(r#"<span class="stats">"#);
    if cs.lines_added > 0 {
        let _ = write!(out, r#"<span class="add-stat">+{}</span>"#, cs.lines_added);
    }
    if cs.lines_removed > 0 {
        if cs.lines_added > 0 {
            out.push(' ');
        }
        let _ = write!(out, r#"<span class="del-stat">-{}</span>"#, cs.lines_removed);
    }
    out.push_str("</span></div>");
}

fn write_row(out: &mut String, cs_id: u32, row: &Row) {
    out.push_str("<tr>");
    write_number_cell(out, cs_id, "OL", row.old_line, row.old_style.old_class());
    write_content_cell(out, row.old_style.old_class(), "copy-l", "", row.old_content.as_str());
    write_number_cell(out, cs_id, "NL", row.new_line, row.new_style.new_class());
    out.push_str(r#"<td class="copy"></td>"#);
    write_content_cell(
        out,
        row.new_style.new_class(),
        "copy-r",
        r#" colspan="2""#,
        row.new_content.as_str(),
    );
    out.push_str("</tr>");
}

fn write_number_cell(out: &mut String, cs_id: u32, side: &str, line: Option<u32>, class: &str) {
    match line {
        Some(n) => {
            let class = if class.is_empty() {
                "n".to_string()
            } else {
                format!("{class} n")
            };
            let _ = write!(
                out,
                r#"<td class="{class}" data-n="{n}" id="C{cs_id}{side}{n}"></td>"#
            );
        }
        None => out.push_str(r#"<td class="n"></td>"#),
    }
}

fn write_content_cell(out: &mut String, class: &str, copy_mode: &str, extra: &str, markup: &str) {
    if class.is_empty() {
        let _ = write!(out, r#"<td{extra} data-copy-mode="{copy_mode}">{markup}</td>"#);
    } else {
        let _ = write!(
            out,
            r#"<td class="{class}"{extra} data-copy-mode="{copy_mode}">{markup}</td>"#
        );
    }
}

fn write_gap(out: &mut String, gap: &ContextGap) {
    let _ = write!(
        out,
        r#"<tr class="show-more"><th class="num"></th><td class="show-more-content" colspan="5" data-action="context-expand" data-path="{path}" data-start="{start}" data-end="{end}" data-cs="{cs}">{label}</td></tr>"#,
        path = escape_html(&gap.path),
        start = gap.start_line,
        end = gap.end_line,
        cs = gap.changeset_id,
        label = escape_html(&gap.label()),
    );
}

fn write_annotation(out: &mut String, annotation: &InlineAnnotation) {
    out.push_str(r#"<tr class="inline"><td colspan="6">"#);
    write_annotation_body(out, annotation);
    out.push_str("</td></tr>");
}

fn write_annotation_body(out: &mut String, annotation: &InlineAnnotation) {
    let _ = write!(
        out,
        r#"<div class="differential-inline-comment" data-id="{id}" data-line="{line}" data-side="{side}">"#,
        id = annotation.id,
        line = annotation.line,
        side = annotation.side.as_str(),
    );
    out.push_str(r#"<div class="inline-header">"#);
    if !annotation.avatar_url.is_empty() {
        let _ = write!(
            out,
            r#"<img class="inline-avatar" src="{}" alt="">"#,
            escape_html(&annotation.avatar_url)
        );
    }
    let _ = write!(out, "<strong>{}</strong></div>", escape_html(&annotation.author));

    out.push_str(r#"<div class="inline-body">"#);
    for (i, line) in annotation.body.lines().enumerate() {
        if i > 0 {
            out.push_str("<br>");
        }
        out.push_str(&escape_html(line));
    }
    out.push_str("</div></div>");
}
