//! Engine configuration handling

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::syntax::{DEFAULT_DARK_THEME, DEFAULT_THEME};
use crate::view::{RenderOptions, DEFAULT_TRAILING_CONTEXT_LINES};

/// Environment variable that overrides the configured syntax theme
pub const THEME_ENV: &str = "SIDEDIFF_THEME";

/// How rendered output is written
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Html,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub trailing_context_lines: u32,
    pub syntax_theme: String,
    pub dark_syntax_theme: String,
    pub default_format: OutputFormat,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            trailing_context_lines: DEFAULT_TRAILING_CONTEXT_LINES,
            syntax_theme: DEFAULT_THEME.to_string(),
            dark_syntax_theme: DEFAULT_DARK_THEME.to_string(),
            default_format: OutputFormat::Html,
        }
    }
}

impl EngineConfig {
    /// Theme for the requested variant
    #[must_use]
    pub fn theme(&self, dark: bool) -> &str {
        if dark {
            &self.dark_syntax_theme
        } else {
            &self.syntax_theme
        }
    }

    #[must_use]
    pub const fn render_options(&self) -> RenderOptions {
        RenderOptions {
            trailing_context_lines: self.trailing_context_lines,
        }
    }
}

/// Load configuration from the user's config directory.
///
/// # Errors
///
/// Returns an error if the config file exists but cannot be read or parsed.
pub fn load_config() -> anyhow::Result<Option<EngineConfig>> {
    let Some(path) = config_path() else {
        return Ok(None);
    };
    if !path.exists() {
        return Ok(None);
    }
    load_config_from(&path).map(Some)
}

/// Load configuration from an explicit file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load_config_from(path: &Path) -> anyhow::Result<EngineConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config: {}", path.display()))?;
    let config = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse config: {}", path.display()))?;
    Ok(config)
}

fn config_path() -> Option<PathBuf> {
    let base = if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        PathBuf::from(xdg)
    } else if let Ok(home) = std::env::var("HOME") {
        Path::new(&home).join(".config")
    } else {
        return None;
    };

    Some(base.join("sidediff").join("config.json"))
}
