//! sidediff - render unified diffs as two-up review tables
//!
//! Usage:
//!   sidediff parse <DIFF>
//!   sidediff render <DIFF> [--annotations FILE] [--ref REF] [--format html|json]
//!   sidediff context (--path P | --diff DIFF --cs N) --start N --end N [--repo DIR | --root DIR]
//!   sidediff themes
//!
//! `-` reads the diff from stdin.

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;

use sidediff::config::{load_config, load_config_from, THEME_ENV};
use sidediff::view::html::{write_context_rows, write_view};
use sidediff::{
    materialize_context, render_diff, DirContentProvider, EngineConfig, FileContentProvider,
    GitContentProvider, Highlighter, InlineAnnotation, OutputFormat, ParsedDiff,
};

#[derive(Debug, Parser)]
#[command(name = "sidediff", version, about = "Two-up diff renderer")]
struct Cli {
    /// Config file (defaults to $XDG_CONFIG_HOME/sidediff/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

/// Options shared by commands that highlight code
#[derive(Debug, clap::Args)]
struct StyleArgs {
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,
    /// Use the dark highlighting theme
    #[arg(long)]
    dark: bool,
    /// Explicit syntect theme name
    #[arg(long)]
    theme: Option<String>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the parsed diff as JSON
    Parse { diff: PathBuf },
    /// Render every file of a diff
    Render {
        diff: PathBuf,
        /// JSON array of inline annotations
        #[arg(long)]
        annotations: Option<PathBuf>,
        /// Revision gaps should be expanded against
        #[arg(long = "ref", default_value = "HEAD")]
        reference: String,
        /// Lines offered below the last hunk
        #[arg(long)]
        trailing: Option<u32>,
        #[command(flatten)]
        style: StyleArgs,
    },
    /// Materialize a range of context lines
    Context {
        /// File to expand (defaults to changeset `--cs` of `--diff`)
        #[arg(long, required_unless_present = "diff")]
        path: Option<String>,
        /// Diff the changeset id refers to
        #[arg(long)]
        diff: Option<PathBuf>,
        #[arg(long, allow_negative_numbers = true)]
        start: i64,
        #[arg(long, allow_negative_numbers = true)]
        end: i64,
        /// Changeset id used in row anchors
        #[arg(long, default_value_t = 1)]
        cs: u32,
        #[arg(long = "ref", default_value = "HEAD")]
        reference: String,
        /// Git repository to read the file from
        #[arg(long, conflicts_with = "root")]
        repo: Option<PathBuf>,
        /// Checked-out tree to read the file from
        #[arg(long)]
        root: Option<PathBuf>,
        #[command(flatten)]
        style: StyleArgs,
    },
    /// List bundled highlighting themes
    Themes,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => load_config_from(path)?,
        None => load_config()?.unwrap_or_default(),
    };

    match cli.command {
        Command::Parse { diff } => {
            let parsed = read_and_parse(&diff)?;
            println!("{}", serde_json::to_string_pretty(&parsed)?);
        }
        Command::Render {
            diff,
            annotations,
            reference,
            trailing,
            style,
        } => {
            let parsed = read_and_parse(&diff)?;
            let annotations = match annotations {
                Some(path) => read_annotations(&path)?,
                None => Vec::new(),
            };
            let highlighter = build_highlighter(&config, &style);
            let mut options = config.render_options();
            if let Some(lines) = trailing {
                options.trailing_context_lines = lines;
            }

            let views = render_diff(&highlighter, &parsed, &reference, &annotations, options);
            info!("rendered {} changesets", views.len());
            match style.format.unwrap_or(config.default_format) {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&views)?),
                OutputFormat::Html => {
                    for view in &views {
                        println!("{}", write_view(view));
                    }
                }
            }
        }
        Command::Context {
            path,
            diff,
            start,
            end,
            cs,
            reference,
            repo,
            root,
            style,
        } => {
            let path = match (path, diff) {
                (Some(path), _) => path,
                (None, Some(diff)) => {
                    let parsed = read_and_parse(&diff)?;
                    let changeset = parsed
                        .changeset(cs)
                        .with_context(|| format!("No changeset {cs} in {}", diff.display()))?;
                    changeset.display_path().to_string()
                }
                (None, None) => anyhow::bail!("--path or --diff is required"),
            };
            let provider: Box<dyn FileContentProvider> = match (repo, root) {
                (Some(repo), _) => Box::new(GitContentProvider::new(repo)),
                (None, Some(root)) => Box::new(DirContentProvider::new(root)),
                (None, None) => Box::new(GitContentProvider::new(".")),
            };
            let text = provider
                .file_content(&path, &reference)
                .with_context(|| format!("Failed to fetch {path} at {reference}"))?;

            let highlighter = build_highlighter(&config, &style);
            let rows = materialize_context(&highlighter, &path, &text, start, end);
            match style.format.unwrap_or(config.default_format) {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&rows)?),
                OutputFormat::Html => println!("{}", write_context_rows(cs, &rows)),
            }
        }
        Command::Themes => {
            for name in Highlighter::available_themes() {
                println!("{name}");
            }
        }
    }

    Ok(())
}

fn build_highlighter(config: &EngineConfig, style: &StyleArgs) -> Highlighter {
    let theme = style
        .theme
        .clone()
        .or_else(|| std::env::var(THEME_ENV).ok())
        .unwrap_or_else(|| config.theme(style.dark).to_string());
    Highlighter::with_theme(&theme)
}

fn read_and_parse(path: &Path) -> Result<ParsedDiff> {
    let raw = if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read diff from stdin")?;
        buf
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read diff: {}", path.display()))?
    };
    ParsedDiff::parse(&raw).with_context(|| format!("Failed to parse diff: {}", path.display()))
}

fn read_annotations(path: &Path) -> Result<Vec<InlineAnnotation>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read annotations: {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse annotations: {}", path.display()))
}
