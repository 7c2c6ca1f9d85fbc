//! Command-line argument parsing
//!
//! Supports:
//! - Highlighting HTML and Markdown pages in place or into an output directory
//! - Overriding the grammar location, theme, selector and language identity
//! - Dry runs and listing the available themes

use clap::Parser;
use std::path::PathBuf;

use crate::config::HighlightConfig;

/// Highlights Samarium code blocks in documentation pages
#[derive(Parser, Debug)]
#[command(
    name = "sm-highlight",
    version,
    about = "Highlights Samarium code blocks in documentation pages"
)]
pub struct CliArgs {
    /// HTML/Markdown files or directories to process
    #[arg(value_name = "PATHS")]
    pub paths: Vec<PathBuf>,

    /// Write results under DIR instead of rewriting sources in place
    #[arg(short = 'o', long, value_name = "DIR")]
    pub out_dir: Option<PathBuf>,

    /// Grammar location (http(s) URL or local path)
    #[arg(long, value_name = "URL|PATH")]
    pub grammar: Option<String>,

    /// Theme id
    #[arg(long, value_name = "ID")]
    pub theme: Option<String>,

    /// CSS selector for code regions
    #[arg(long, value_name = "CSS")]
    pub selector: Option<String>,

    /// Language id the grammar is registered under
    #[arg(long, value_name = "ID")]
    pub lang: Option<String>,

    /// Root scope name of the grammar
    #[arg(long, value_name = "NAME")]
    pub scope: Option<String>,

    /// Run everything but write nothing
    #[arg(long)]
    pub dry_run: bool,

    /// Print available themes and exit
    #[arg(long)]
    pub list_themes: bool,

    /// Log progress to stderr
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

/// Where rendered pages go
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputMode {
    /// Overwrite sources (Markdown gets a sibling `.html`)
    InPlace,
    /// Mirror the input layout under a directory
    Directory(PathBuf),
    /// Write nothing
    DryRun,
}

/// What the invocation asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunMode {
    ListThemes,
    Highlight {
        inputs: Vec<PathBuf>,
        output: OutputMode,
    },
}

/// Configuration derived from CLI arguments
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub mode: RunMode,
    pub highlight: HighlightConfig,
}

impl CliArgs {
    /// Convert parsed CLI args into a run configuration, flags overriding `base`
    pub fn into_config(self, base: HighlightConfig) -> Result<RunConfig, String> {
        let mut highlight = base;
        if let Some(grammar) = self.grammar {
            highlight.grammar = grammar;
        }
        if let Some(theme) = self.theme {
            highlight.theme = theme;
        }
        if let Some(selector) = self.selector {
            if selector.trim().is_empty() {
                return Err("--selector must not be empty".to_string());
            }
            highlight.selector = selector;
        }
        if let Some(lang) = self.lang {
            highlight.language_id = lang;
        }
        if let Some(scope) = self.scope {
            highlight.scope_name = scope;
        }

        let mode = if self.list_themes {
            RunMode::ListThemes
        } else if self.paths.is_empty() {
            return Err("No input paths given (try --help)".to_string());
        } else {
            let output = match (self.dry_run, self.out_dir) {
                (true, Some(_)) => {
                    return Err("--dry-run and --out-dir cannot be combined".to_string())
                }
                (true, None) => OutputMode::DryRun,
                (false, Some(dir)) => OutputMode::Directory(dir),
                (false, None) => OutputMode::InPlace,
            };
            RunMode::Highlight {
                inputs: self.paths,
                output,
            }
        };

        Ok(RunConfig { mode, highlight })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(paths: &[&str]) -> CliArgs {
        CliArgs {
            paths: paths.iter().map(PathBuf::from).collect(),
            out_dir: None,
            grammar: None,
            theme: None,
            selector: None,
            lang: None,
            scope: None,
            dry_run: false,
            list_themes: false,
            verbose: false,
        }
    }

    #[test]
    fn test_no_paths_is_error() {
        assert!(args(&[]).into_config(HighlightConfig::default()).is_err());
    }

    #[test]
    fn test_list_themes_needs_no_paths() {
        let mut a = args(&[]);
        a.list_themes = true;
        let config = a.into_config(HighlightConfig::default()).unwrap();
        assert_eq!(config.mode, RunMode::ListThemes);
    }

    #[test]
    fn test_in_place_by_default() {
        let config = args(&["docs"])
            .into_config(HighlightConfig::default())
            .unwrap();
        assert_eq!(
            config.mode,
            RunMode::Highlight {
                inputs: vec![PathBuf::from("docs")],
                output: OutputMode::InPlace,
            }
        );
    }

    #[test]
    fn test_out_dir_and_dry_run() {
        let mut a = args(&["docs"]);
        a.out_dir = Some(PathBuf::from("site"));
        let config = a.into_config(HighlightConfig::default()).unwrap();
        assert!(matches!(
            config.mode,
            RunMode::Highlight { output: OutputMode::Directory(ref d), .. } if d == &PathBuf::from("site")
        ));

        let mut a = args(&["docs"]);
        a.dry_run = true;
        let config = a.into_config(HighlightConfig::default()).unwrap();
        assert!(matches!(
            config.mode,
            RunMode::Highlight { output: OutputMode::DryRun, .. }
        ));

        let mut a = args(&["docs"]);
        a.dry_run = true;
        a.out_dir = Some(PathBuf::from("site"));
        assert!(a.into_config(HighlightConfig::default()).is_err());
    }

    #[test]
    fn test_flags_override_base_config() {
        let mut a = args(&["docs"]);
        a.theme = Some("github-light".to_string());
        a.grammar = Some("grammars/samarium.json".to_string());
        a.lang = Some("sm".to_string());

        let base = HighlightConfig {
            selector: "pre.samarium".to_string(),
            ..HighlightConfig::default()
        };
        let config = a.into_config(base).unwrap();
        assert_eq!(config.highlight.theme, "github-light");
        assert_eq!(config.highlight.grammar, "grammars/samarium.json");
        assert_eq!(config.highlight.language_id, "sm");
        assert_eq!(config.highlight.selector, "pre.samarium");
        assert_eq!(config.highlight.scope_name, "source.samarium");
    }

    #[test]
    fn test_empty_selector_is_error() {
        let mut a = args(&["docs"]);
        a.selector = Some("  ".to_string());
        assert!(a.into_config(HighlightConfig::default()).is_err());
    }
}
