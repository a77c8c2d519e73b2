//! Unified diff parser
//!
//! Parses a (possibly multi-file) unified diff into one `Changeset` per file.
//! Git extended headers are understood; plain `---`/`+++` diffs work too.

use log::debug;

use crate::error::ParseError;

use super::model::{Changeset, DiffHunk, DiffLine, DiffLineKind, ParsedDiff, NULL_DEVICE};

impl ParsedDiff {
    /// Parse a unified diff string.
    ///
    /// # Errors
    ///
    /// Returns a `ParseError` on a malformed hunk header, a hunk body that
    /// does not match its declared counts, or an incomplete file header.
    /// No partial result is returned.
    pub fn parse(diff: &str) -> Result<Self, ParseError> {
        let lines: Vec<&str> = diff.lines().collect();
        let mut sections: Vec<FileSection> = Vec::new();
        let mut current: Option<FileSection> = None;
        let mut i = 0;

        while i < lines.len() {
            let line = lines[i];
            let line_no = i + 1;

            if let Some(rest) = line.strip_prefix("diff --git ") {
                sections.extend(current.take());
                current = Some(FileSection::from_git_header(rest, line_no));
                i += 1;
                continue;
            }

            if line.starts_with("--- ") {
                let Some(plus) = lines.get(i + 1).filter(|l| l.starts_with("+++ ")) else {
                    // Outside a file section this is just preamble (commit message etc.)
                    if let Some(section) = &current {
                        return Err(ParseError::TruncatedHeader {
                            path: section.best_path(),
                            line: line_no,
                        });
                    }
                    i += 1;
                    continue;
                };
                let starts_new = current
                    .as_ref()
                    .is_none_or(|s| s.saw_markers || !s.hunks.is_empty());
                if starts_new {
                    sections.extend(current.take());
                    current = Some(FileSection::new(line_no));
                }
                if let Some(section) = current.as_mut() {
                    section.saw_markers = true;
                    section.marker_old = Some(marker_path(&line[4..]));
                    section.marker_new = Some(marker_path(&plus[4..]));
                }
                i += 2;
                continue;
            }

            if line.starts_with("@@") {
                let Some(section) = current.as_mut() else {
                    return Err(ParseError::HunkOutsideFile { line: line_no });
                };
                if section.binary {
                    i += 1;
                    continue;
                }
                let path = section.best_path();
                let (hunk, next) = parse_hunk(&lines, i, &path)?;
                section.hunks.push(hunk);
                i = next;
                continue;
            }

            if let Some(section) = current.as_mut() {
                section.apply_extended(line);
            }
            i += 1;
        }
        sections.extend(current);

        let changesets = sections
            .into_iter()
            .enumerate()
            .map(|(idx, section)| section.finish(idx as u32 + 1))
            .collect::<Result<Vec<_>, _>>()?;

        debug!("parsed {} changesets", changesets.len());
        Ok(Self { changesets })
    }

    /// Get total number of lines across all hunks of all files
    #[must_use]
    pub fn total_lines(&self) -> usize {
        self.changesets
            .iter()
            .flat_map(|cs| &cs.hunks)
            .map(|h| h.lines.len())
            .sum()
    }
}

/// Header state for one file while its lines are being read
#[derive(Debug, Default)]
struct FileSection {
    start_line: usize,
    git_old: Option<String>,
    git_new: Option<String>,
    marker_old: Option<String>,
    marker_new: Option<String>,
    rename_from: Option<String>,
    rename_to: Option<String>,
    saw_markers: bool,
    new_file_mode: bool,
    deleted_file_mode: bool,
    binary: bool,
    hunks: Vec<DiffHunk>,
}

impl FileSection {
    fn new(start_line: usize) -> Self {
        Self {
            start_line,
            ..Self::default()
        }
    }

    fn from_git_header(rest: &str, start_line: usize) -> Self {
        let (git_old, git_new) = split_git_paths(rest).unzip();
        Self {
            start_line,
            git_old,
            git_new,
            ..Self::default()
        }
    }

    /// Record an extended header line (`rename from`, `new file mode`, ...)
    fn apply_extended(&mut self, line: &str) {
        if let Some(path) = line.strip_prefix("rename from ") {
            self.rename_from = Some(unquote(path).to_string());
        } else if let Some(path) = line.strip_prefix("rename to ") {
            self.rename_to = Some(unquote(path).to_string());
        } else if line.starts_with("new file mode") {
            self.new_file_mode = true;
        } else if line.starts_with("deleted file mode") {
            self.deleted_file_mode = true;
        } else if line.contains("Binary files") || line.contains("GIT binary patch") {
            self.binary = true;
        }
    }

    fn best_path(&self) -> String {
        self.marker_new
            .as_ref()
            .filter(|p| p.as_str() != NULL_DEVICE)
            .or(self.marker_old.as_ref())
            .or(self.rename_to.as_ref())
            .or(self.git_new.as_ref())
            .cloned()
            .unwrap_or_default()
    }

    fn finish(self, id: u32) -> Result<Changeset, ParseError> {
        let old_path = self
            .marker_old
            .clone()
            .or_else(|| self.new_file_mode.then(|| NULL_DEVICE.to_string()))
            .or_else(|| self.rename_from.clone())
            .or_else(|| self.git_old.clone());
        let new_path = self
            .marker_new
            .clone()
            .or_else(|| self.deleted_file_mode.then(|| NULL_DEVICE.to_string()))
            .or_else(|| self.rename_to.clone())
            .or_else(|| self.git_new.clone());

        let (Some(old_path), Some(new_path)) = (old_path, new_path) else {
            return Err(ParseError::TruncatedHeader {
                path: self.best_path(),
                line: self.start_line,
            });
        };

        let is_new = old_path == NULL_DEVICE;
        let is_deleted = new_path == NULL_DEVICE;
        let is_renamed = !is_new && !is_deleted && old_path != new_path;
        let (lines_added, lines_removed) = Changeset::count_changes(&self.hunks);

        Ok(Changeset {
            id,
            old_path,
            new_path,
            is_new,
            is_deleted,
            is_renamed,
            is_binary: self.binary,
            hunks: self.hunks,
            lines_added,
            lines_removed,
        })
    }
}

/// Parse one hunk starting at `start` (the @@ line).
///
/// Returns the hunk and the index of the first line after it. The body is
/// delimited by the header's counts, not by the next marker line.
fn parse_hunk(lines: &[&str], start: usize, path: &str) -> Result<(DiffHunk, usize), ParseError> {
    let header = lines[start];
    let (old_start, old_count, new_start, new_count, section) = parse_hunk_header(header)
        .ok_or_else(|| ParseError::InvalidHunkHeader {
            line: start + 1,
            header: header.to_string(),
        })?;

    let mut hunk = DiffHunk {
        header: header.to_string(),
        section: section.to_string(),
        old_start,
        old_count,
        new_start,
        new_count,
        lines: Vec::new(),
    };

    let mut old_line = old_start;
    let mut new_line = new_start;
    let mut old_remaining = old_count;
    let mut new_remaining = new_count;
    let mut i = start + 1;

    while old_remaining > 0 || new_remaining > 0 {
        let Some(&raw) = lines.get(i) else {
            return Err(ParseError::TruncatedHunk {
                path: path.to_string(),
                line: i,
            });
        };

        let (kind, content) = if let Some(content) = raw.strip_prefix('+') {
            (DiffLineKind::Added, content)
        } else if let Some(content) = raw.strip_prefix('-') {
            (DiffLineKind::Removed, content)
        } else if let Some(content) = raw.strip_prefix(' ') {
            (DiffLineKind::Context, content)
        } else if raw.is_empty() {
            // Some tools strip the trailing space of empty context lines
            (DiffLineKind::Context, "")
        } else if raw.starts_with('\\') {
            // "\ No newline at end of file"
            i += 1;
            continue;
        } else if raw.starts_with("@@") || raw.starts_with("diff --git ") {
            return Err(ParseError::TruncatedHunk {
                path: path.to_string(),
                line: i + 1,
            });
        } else {
            return Err(unexpected(i, raw));
        };

        let diff_line = match kind {
            DiffLineKind::Added => {
                if new_remaining == 0 {
                    return Err(unexpected(i, raw));
                }
                new_remaining -= 1;
                let dl = DiffLine {
                    kind,
                    old_line: None,
                    new_line: Some(new_line),
                    content: content.to_string(),
                };
                new_line += 1;
                dl
            }
            DiffLineKind::Removed => {
                if old_remaining == 0 {
                    return Err(unexpected(i, raw));
                }
                old_remaining -= 1;
                let dl = DiffLine {
                    kind,
                    old_line: Some(old_line),
                    new_line: None,
                    content: content.to_string(),
                };
                old_line += 1;
                dl
            }
            DiffLineKind::Context => {
                if old_remaining == 0 || new_remaining == 0 {
                    return Err(unexpected(i, raw));
                }
                old_remaining -= 1;
                new_remaining -= 1;
                let dl = DiffLine {
                    kind,
                    old_line: Some(old_line),
                    new_line: Some(new_line),
                    content: content.to_string(),
                };
                old_line += 1;
                new_line += 1;
                dl
            }
        };

        hunk.lines.push(diff_line);
        i += 1;
    }

    while lines.get(i).is_some_and(|l| l.starts_with('\\')) {
        i += 1;
    }

    Ok((hunk, i))
}

fn unexpected(idx: usize, raw: &str) -> ParseError {
    ParseError::UnexpectedHunkLine {
        line: idx + 1,
        text: raw.to_string(),
    }
}

/// Parse `@@ -start[,count] +start[,count] @@ section`
fn parse_hunk_header(header: &str) -> Option<(u32, u32, u32, u32, &str)> {
    let rest = header.strip_prefix("@@ ")?;
    let (ranges, section) = rest.split_once(" @@")?;
    let section = section.strip_prefix(' ').unwrap_or(section);

    let (old, new) = ranges.split_once(' ')?;
    let (old_start, old_count) = parse_range(old.strip_prefix('-')?)?;
    let (new_start, new_count) = parse_range(new.strip_prefix('+')?)?;
    Some((old_start, old_count, new_start, new_count, section))
}

fn parse_range(s: &str) -> Option<(u32, u32)> {
    let (start, count): (u32, u32) = if let Some((start, count)) = s.split_once(',') {
        (start.parse().ok()?, count.parse().ok()?)
    } else {
        // Single line: "5" means start=5, count=1
        (s.parse().ok()?, 1)
    };
    // Every line number in the range must fit
    start.checked_add(count)?;
    Some((start, count))
}

/// Path from a `---`/`+++` line: drop a trailing timestamp, quotes and the a/ b/ prefix.
fn marker_path(raw: &str) -> String {
    let raw = raw.split_once('\t').map_or(raw, |(path, _)| path);
    clean_path(unquote(raw.trim_end()))
}

/// Split the `a/old b/new` tail of a `diff --git` line.
fn split_git_paths(rest: &str) -> Option<(String, String)> {
    if let Some(quoted) = rest.strip_prefix('"') {
        let (old, new) = quoted.split_once("\" ")?;
        return Some((clean_path(old), clean_path(unquote(new))));
    }
    // Paths may contain spaces; the new path starts at the last " b/".
    let (old, new) = rest
        .rfind(" b/")
        .map(|idx| (&rest[..idx], &rest[idx + 1..]))
        .or_else(|| rest.split_once(' '))?;
    Some((clean_path(old), clean_path(unquote(new))))
}

fn unquote(path: &str) -> &str {
    path.strip_prefix('"')
        .and_then(|p| p.strip_suffix('"'))
        .unwrap_or(path)
}

fn clean_path(path: &str) -> String {
    if path == NULL_DEVICE {
        return path.to_string();
    }
    path.strip_prefix("a/")
        .or_else(|| path.strip_prefix("b/"))
        .unwrap_or(path)
        .to_string()
}
