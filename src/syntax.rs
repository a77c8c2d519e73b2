//! Syntax highlighting module using syntect
//!
//! Highlights a batch of lines in a single pass over the joined text, then
//! cuts the token stream back into one self-contained HTML fragment per
//! input line. Multi-line constructs (block comments, raw strings) keep the
//! classification decided by the whole-text pass.

use std::path::Path;

use log::{debug, warn};
use syntect::easy::HighlightLines;
use syntect::highlighting::{Color, FontStyle, Style, Theme, ThemeSet};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;

use crate::text::{escape_html, Fragment};

/// Light theme closest to GitHub's own palette
pub const DEFAULT_THEME: &str = "InspiredGitHub";
/// Dark variant used when a dark page is requested
pub const DEFAULT_DARK_THEME: &str = "base16-ocean.dark";

/// Syntax highlighter with loaded grammars and theme.
///
/// Construct once and pass by reference; renders that need different
/// grammar sets or themes use different instances.
pub struct Highlighter {
    syntax_set: SyntaxSet,
    theme: Theme,
    theme_name: String,
}

/// A run of text sharing one style
#[derive(Debug, Clone, PartialEq)]
struct Token {
    style: Style,
    text: String,
}

impl Highlighter {
    /// Create a new highlighter with the default (light) theme.
    #[must_use]
    pub fn new() -> Self {
        Self::with_theme(DEFAULT_THEME)
    }

    /// Create a highlighter with a specific syntect theme name.
    ///
    /// Unknown names fall back to the default theme.
    #[must_use]
    pub fn with_theme(theme_name: &str) -> Self {
        let syntax_set = SyntaxSet::load_defaults_newlines();
        let mut theme_set = ThemeSet::load_defaults();

        let (name, theme) = if let Some(theme) = theme_set.themes.remove(theme_name) {
            (theme_name, theme)
        } else {
            warn!("unknown syntax theme `{theme_name}`, using `{DEFAULT_THEME}`");
            let theme = theme_set.themes.remove(DEFAULT_THEME).unwrap_or_default();
            (DEFAULT_THEME, theme)
        };

        Self {
            syntax_set,
            theme,
            theme_name: name.to_string(),
        }
    }

    /// Build from an explicit grammar registry and theme.
    #[must_use]
    pub fn from_parts(syntax_set: SyntaxSet, theme: Theme, theme_name: &str) -> Self {
        Self {
            syntax_set,
            theme,
            theme_name: theme_name.to_string(),
        }
    }

    #[must_use]
    pub fn theme_name(&self) -> &str {
        &self.theme_name
    }

    /// List bundled theme names
    #[must_use]
    pub fn available_themes() -> Vec<String> {
        ThemeSet::load_defaults().themes.into_keys().collect()
    }

    /// Grammar for a file path, falling back to plain text.
    #[must_use]
    pub fn grammar_for(&self, path: &str) -> &SyntaxReference {
        self.syntax_for_path(path)
            .unwrap_or_else(|| self.syntax_set.find_syntax_plain_text())
    }

    /// Name of the grammar `grammar_for` selects
    #[must_use]
    pub fn grammar_name(&self, path: &str) -> &str {
        &self.grammar_for(path).name
    }

    /// Get syntax reference for a file path (by extension)
    fn syntax_for_path(&self, path: &str) -> Option<&SyntaxReference> {
        let path = Path::new(path);

        // First try by extension
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            if let Some(syntax) = self.syntax_set.find_syntax_by_extension(ext) {
                return Some(syntax);
            }
        }

        // Try by filename (for things like Makefile, Dockerfile)
        let name = path.file_name().and_then(|n| n.to_str())?;
        match name {
            "Makefile" | "makefile" | "GNUmakefile" => {
                self.syntax_set.find_syntax_by_extension("make")
            }
            "Dockerfile" => self.syntax_set.find_syntax_by_extension("dockerfile"),
            "Cargo.lock" | "Pipfile" => self.syntax_set.find_syntax_by_extension("toml"),
            "Gemfile" | "Rakefile" => self.syntax_set.find_syntax_by_extension("rb"),
            // Extensionless names syntect knows directly (e.g. ".bashrc")
            _ => self.syntax_set.find_syntax_by_extension(name),
        }
    }

    /// Highlight `lines` as consecutive lines of `file_path`.
    ///
    /// The result always has exactly one fragment per input line. If the
    /// grammar fails on this input, every line degrades to escaped text.
    pub fn highlight_lines<S: AsRef<str>>(&self, file_path: &str, lines: &[S]) -> Vec<Fragment> {
        if lines.is_empty() {
            return Vec::new();
        }

        let syntax = self.grammar_for(file_path);
        let tokens = match self.tokenize(syntax, lines) {
            Ok(tokens) => tokens,
            Err(err) => {
                warn!("highlighting `{file_path}` failed, rendering plain text: {err}");
                return lines.iter().map(|l| Fragment::escaped(l.as_ref())).collect();
            }
        };
        debug!(
            "highlighted {} lines of `{file_path}` as {}",
            lines.len(),
            syntax.name
        );

        let mut fragments: Vec<Fragment> = split_tokens_by_line(tokens)
            .iter()
            .take(lines.len())
            .map(|group| self.render_group(group))
            .collect();
        // Lines the token stream never reached render verbatim
        let reached = fragments.len();
        fragments.extend(lines[reached..].iter().map(|l| Fragment::escaped(l.as_ref())));
        fragments
    }

    /// Tokenize the joined text once, keeping parse state across lines.
    fn tokenize<S: AsRef<str>>(
        &self,
        syntax: &SyntaxReference,
        lines: &[S],
    ) -> Result<Vec<Token>, syntect::Error> {
        let source = lines
            .iter()
            .map(|l| l.as_ref())
            .collect::<Vec<&str>>()
            .join("\n");
        let mut highlighter = HighlightLines::new(syntax, &self.theme);

        let mut tokens: Vec<Token> = Vec::new();
        for line in LinesWithEndings::from(&source) {
            for (style, text) in highlighter.highlight_line(line, &self.syntax_set)? {
                match tokens.last_mut() {
                    Some(last) if last.style == style => last.text.push_str(text),
                    _ => tokens.push(Token {
                        style,
                        text: text.to_string(),
                    }),
                }
            }
        }
        Ok(tokens)
    }

    /// Render one line's tokens into a standalone fragment.
    fn render_group(&self, group: &[Token]) -> Fragment {
        let default_fg = self.theme.settings.foreground;
        let mut html = String::new();
        for token in group {
            let text = escape_html(&token.text);
            let plain = Some(token.style.foreground) == default_fg
                && token.style.font_style.is_empty();
            if plain {
                html.push_str(&text);
            } else {
                html.push_str("<span style=\"");
                html.push_str(&css_for_style(token.style));
                html.push_str("\">");
                html.push_str(&text);
                html.push_str("</span>");
            }
        }
        Fragment::from_markup(html)
    }
}

impl Default for Highlighter {
    fn default() -> Self {
        Self::new()
    }
}

/// Split a flat token stream into per-line groups at every line break.
fn split_tokens_by_line(tokens: Vec<Token>) -> Vec<Vec<Token>> {
    let mut lines: Vec<Vec<Token>> = Vec::new();
    let mut current: Vec<Token> = Vec::new();

    for token in tokens {
        for (j, part) in token.text.split('\n').enumerate() {
            if j > 0 {
                lines.push(std::mem::take(&mut current));
            }
            if !part.is_empty() {
                current.push(Token {
                    style: token.style,
                    text: part.to_string(),
                });
            }
        }
    }
    lines.push(current);
    lines
}

fn css_for_style(style: Style) -> String {
    let mut css = format!("color:{}", hex_color(style.foreground));
    if style.font_style.contains(FontStyle::BOLD) {
        css.push_str(";font-weight:bold");
    }
    if style.font_style.contains(FontStyle::ITALIC) {
        css.push_str(";font-style:italic");
    }
    if style.font_style.contains(FontStyle::UNDERLINE) {
        css.push_str(";text-decoration:underline");
    }
    css
}

fn hex_color(color: Color) -> String {
    format!("#{:02x}{:02x}{:02x}", color.r, color.g, color.b)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first_style(fragment: &Fragment) -> Option<&str> {
        let rest = fragment.as_str().split_once("style=\"")?.1;
        rest.split_once('"').map(|(style, _)| style)
    }

    /// Registry with a grammar that pushes a context it never defines.
    fn broken_registry() -> SyntaxSet {
        let broken = syntect::parsing::SyntaxDefinition::load_from_str(
            r"
            name: Broken
            scope: source.broken
            file_extensions: [brk]
            contexts:
              main:
                - match: 'enter'
                  push: scope:source.missing#main
            ",
            true,
            None,
        )
        .expect("grammar loads");
        let mut builder = syntect::parsing::SyntaxSetBuilder::new();
        builder.add_plain_text_syntax();
        builder.add(broken);
        builder.build()
    }

    #[test]
    fn test_grammar_failure_degrades_to_escaped_text() {
        let highlighter = Highlighter::from_parts(broken_registry(), Theme::default(), "test");
        assert_eq!(highlighter.theme_name(), "test");
        assert_eq!(highlighter.grammar_name("x.brk"), "Broken");

        let lines = ["a < b", "enter & leave", "\"done\""];
        let fragments = highlighter.highlight_lines("x.brk", &lines);
        let rendered: Vec<&str> = fragments.iter().map(Fragment::as_str).collect();
        assert_eq!(rendered, ["a &lt; b", "enter &amp; leave", "&quot;done&quot;"]);

        // Other files keep highlighting with the same instance
        let plain = highlighter.highlight_lines("notes.txt", &["x < y"]);
        assert_eq!(plain.len(), 1);
        assert!(plain[0].as_str().contains("x &lt; y"));
    }

    #[test]
    fn test_output_length_matches_input() {
        let highlighter = Highlighter::new();
        let lines = ["fn main() {", "", "    let x = 1;", "}", ""];
        assert_eq!(highlighter.highlight_lines("main.rs", &lines).len(), 5);

        let empty: [&str; 0] = [];
        assert!(highlighter.highlight_lines("main.rs", &empty).is_empty());

        assert_eq!(highlighter.highlight_lines("main.rs", &[""]).len(), 1);
    }

    #[test]
    fn test_highlight_rust_has_spans() {
        let highlighter = Highlighter::new();
        let out = highlighter.highlight_lines("test.rs", &["let x = 42;"]);
        assert!(out[0].as_str().contains("<span style=\"color:#"));
        assert!(out[0].as_str().contains("42"));
    }

    #[test]
    fn test_block_comment_keeps_classification_across_lines() {
        let highlighter = Highlighter::new();
        let joined = highlighter.highlight_lines("lib.rs", &["/* start of", "still comment */"]);
        let alone = highlighter.highlight_lines("lib.rs", &["still comment */"]);

        assert_eq!(first_style(&joined[0]), first_style(&joined[1]));
        assert_ne!(joined[1], alone[0]);
    }

    #[test]
    fn test_fragments_are_self_contained() {
        let highlighter = Highlighter::new();
        let out = highlighter.highlight_lines("a.py", &["s = '''one", "two'''", "x = 1"]);
        for fragment in &out {
            let opens = fragment.as_str().matches("<span").count();
            let closes = fragment.as_str().matches("</span>").count();
            assert_eq!(opens, closes, "unbalanced fragment: {fragment}");
            assert!(!fragment.as_str().contains('\n'));
        }
    }

    #[test]
    fn test_unknown_extension_falls_back_to_plain_text() {
        let highlighter = Highlighter::new();
        assert_eq!(highlighter.grammar_name("notes.zzz-unknown"), "Plain Text");

        let out = highlighter.highlight_lines("notes.zzz-unknown", &["<b>bold</b> & more"]);
        assert!(out[0].as_str().contains("&lt;b&gt;bold&lt;/b&gt; &amp; more"));
        assert!(!out[0].as_str().contains("<b>"));
    }

    #[test]
    fn test_grammar_by_filename() {
        let highlighter = Highlighter::new();
        assert_eq!(highlighter.grammar_name("src/main.rs"), "Rust");
        assert_eq!(highlighter.grammar_name("build/Makefile"), "Makefile");
    }

    #[test]
    fn test_literal_text_is_escaped_inside_spans() {
        let highlighter = Highlighter::new();
        let out = highlighter.highlight_lines("x.rs", &["let s = \"<tag>\";"]);
        assert!(out[0].as_str().contains("&lt;tag&gt;"));
        assert!(!out[0].as_str().contains("<tag>"));
    }

    #[test]
    fn test_unknown_theme_falls_back() {
        let highlighter = Highlighter::with_theme("no-such-theme");
        assert_eq!(highlighter.theme_name(), DEFAULT_THEME);
        assert!(Highlighter::available_themes().contains(&DEFAULT_DARK_THEME.to_string()));
    }

    #[test]
    fn test_split_tokens_by_line() {
        let style = Style::default();
        let tokens = vec![
            Token {
                style,
                text: "a\nb".to_string(),
            },
            Token {
                style,
                text: "c\n".to_string(),
            },
        ];
        let groups = split_tokens_by_line(tokens);
        assert_eq!(groups.len(), 3);
        assert_eq!(groups[0][0].text, "a");
        assert_eq!(groups[1].len(), 2);
        assert!(groups[2].is_empty());
    }
}
