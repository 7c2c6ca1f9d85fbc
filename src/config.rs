//! Highlighting configuration
//!
//! Defaults are the constants the documentation site was built around. They can
//! be overridden in `~/.config/sm-highlight/config.yaml` and then by CLI flags.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub const DEFAULT_GRAMMAR_URL: &str = "https://raw.githubusercontent.com/samarium-lang/vscode-samarium/master/syntaxes/samarium.tmLanguage.json";
pub const DEFAULT_THEME: &str = "github-dark";
pub const DEFAULT_SELECTOR: &str = "pre.sm";
pub const DEFAULT_LANGUAGE_ID: &str = "samarium";
pub const DEFAULT_SCOPE_NAME: &str = "source.samarium";
pub const DEFAULT_FENCE_CLASS: &str = "sm";

/// Where the grammar JSON comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrammarSource {
    /// Fetched with a single HTTP GET
    Url(String),
    /// Read from disk (offline builds, tests)
    File(PathBuf),
}

impl GrammarSource {
    /// Classify a user-supplied location. `http(s)://` is remote, `file://` and
    /// anything else is a local path.
    pub fn parse(location: &str) -> Self {
        let trimmed = location.trim();
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            GrammarSource::Url(trimmed.to_string())
        } else if let Some(path) = trimmed.strip_prefix("file://") {
            GrammarSource::File(PathBuf::from(path))
        } else {
            GrammarSource::File(PathBuf::from(trimmed))
        }
    }

    /// Human readable origin, used in logs and errors
    pub fn describe(&self) -> String {
        match self {
            GrammarSource::Url(url) => url.clone(),
            GrammarSource::File(path) => path.display().to_string(),
        }
    }
}

/// Configuration for one highlighting run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighlightConfig {
    /// Grammar location (URL or path)
    #[serde(default = "default_grammar")]
    pub grammar: String,

    /// Theme id (e.g., "github-dark", "github-light")
    #[serde(default = "default_theme")]
    pub theme: String,

    /// CSS selector for the code regions to highlight
    #[serde(default = "default_selector")]
    pub selector: String,

    /// Language id the grammar is registered under
    #[serde(default = "default_language_id")]
    pub language_id: String,

    /// Root scope of the grammar
    #[serde(default = "default_scope_name")]
    pub scope_name: String,

    /// Class given to `<pre>` blocks produced from Markdown fences
    #[serde(default = "default_fence_class")]
    pub fence_class: String,
}

fn default_grammar() -> String {
    DEFAULT_GRAMMAR_URL.to_string()
}

fn default_theme() -> String {
    DEFAULT_THEME.to_string()
}

fn default_selector() -> String {
    DEFAULT_SELECTOR.to_string()
}

fn default_language_id() -> String {
    DEFAULT_LANGUAGE_ID.to_string()
}

fn default_scope_name() -> String {
    DEFAULT_SCOPE_NAME.to_string()
}

fn default_fence_class() -> String {
    DEFAULT_FENCE_CLASS.to_string()
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            grammar: default_grammar(),
            theme: default_theme(),
            selector: default_selector(),
            language_id: default_language_id(),
            scope_name: default_scope_name(),
            fence_class: default_fence_class(),
        }
    }
}

impl HighlightConfig {
    /// Load config from disk, or return defaults if not found
    pub fn load() -> Self {
        let Some(path) = crate::config_paths::config_file() else {
            tracing::debug!("No config directory available, using defaults");
            return Self::default();
        };

        if !path.exists() {
            tracing::debug!(
                "Config file not found at {}, using defaults",
                path.display()
            );
            return Self::default();
        }

        match std::fs::read_to_string(&path) {
            Ok(content) => match Self::from_yaml(&content) {
                Ok(config) => {
                    tracing::info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to parse config at {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!("Failed to read config at {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Parse config YAML; missing keys take their defaults
    pub fn from_yaml(yaml: &str) -> Result<Self, String> {
        serde_yaml::from_str(yaml).map_err(|e| format!("YAML parse error: {}", e))
    }

    pub fn grammar_source(&self) -> GrammarSource {
        GrammarSource::parse(&self.grammar)
    }

    /// Fence info strings that mark a Markdown code block as a target
    pub fn fence_languages(&self) -> [&str; 2] {
        [self.fence_class.as_str(), self.language_id.as_str()]
    }
}
