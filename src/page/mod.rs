//! Documentation pages: target discovery and in-place rendering
//!
//! Discovery parses the page into a tree with `scraper` and reads the text of
//! every element matching the selector. Rendering streams the unmodified HTML
//! through `lol_html`, replacing the inner content of the same elements by
//! document-order ordinal, so everything outside the targets is preserved
//! byte for byte.

use std::path::{Path, PathBuf};

use lol_html::html_content::ContentType;
use lol_html::{element, rewrite_str, RewriteStrSettings};
use scraper::{Html, Selector};

use crate::error::PageError;
use crate::highlight::Highlighter;

/// One documentation page held in memory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub path: PathBuf,
    pub html: String,
}

/// An element whose raw text is a candidate for highlighting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetElement {
    /// Ordinal among the selector's matches, in document order
    pub index: usize,
    /// Decoded text content
    pub text: String,
}

/// Targets discovered on one page, bound to the selector that found them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Targets {
    selector: String,
    elements: Vec<TargetElement>,
}

impl Targets {
    pub fn selector(&self) -> &str {
        &self.selector
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TargetElement> {
        self.elements.iter()
    }
}

/// Result of rendering one page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPage {
    pub path: PathBuf,
    pub html: String,
    /// Elements whose content was replaced
    pub mutated: usize,
    /// Elements left with their raw text because highlighting failed
    pub failed: usize,
}

impl Page {
    pub fn new(path: impl Into<PathBuf>, html: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            html: html.into(),
        }
    }

    /// Read a page from disk
    pub fn read(path: &Path) -> Result<Self, PageError> {
        let html = std::fs::read_to_string(path).map_err(|source| PageError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(path, html))
    }

    /// All elements matching `selector`, in document order
    ///
    /// The selector must be understood by both the query engine and the
    /// rewriter, otherwise it is rejected here before anything else runs.
    pub fn discover_targets(&self, selector: &str) -> Result<Targets, PageError> {
        check_rewriter_selector(selector)?;
        let query = Selector::parse(selector).map_err(|e| PageError::Selector {
            selector: selector.to_string(),
            message: e.to_string(),
        })?;

        let document = Html::parse_document(&self.html);
        let elements: Vec<_> = document
            .select(&query)
            .enumerate()
            .map(|(index, element)| TargetElement {
                index,
                text: element.text().collect(),
            })
            .collect();

        tracing::debug!(
            "{}: {} element(s) match `{}`",
            self.path.display(),
            elements.len(),
            selector
        );

        Ok(Targets {
            selector: selector.to_string(),
            elements,
        })
    }
}

fn check_rewriter_selector(selector: &str) -> Result<(), PageError> {
    selector
        .parse::<lol_html::Selector>()
        .map(|_| ())
        .map_err(|e| PageError::Selector {
            selector: selector.to_string(),
            message: e.to_string(),
        })
}

/// Highlight every target and write the markup back into the page
///
/// Each element is handled on its own: if highlighting its text fails the
/// failure is logged, the element keeps its raw text and the pass continues.
pub fn render_all(
    highlighter: &Highlighter,
    page: &Page,
    targets: Targets,
    lang: &str,
) -> Result<RenderedPage, PageError> {
    if targets.is_empty() {
        return Ok(RenderedPage {
            path: page.path.clone(),
            html: page.html.clone(),
            mutated: 0,
            failed: 0,
        });
    }

    if !highlighter.has_language(lang) {
        tracing::warn!(
            "{}: language `{}` is not registered, {} element(s) left unhighlighted",
            page.path.display(),
            lang,
            targets.len()
        );
        return Ok(RenderedPage {
            path: page.path.clone(),
            html: page.html.clone(),
            mutated: 0,
            failed: targets.len(),
        });
    }

    let selector = targets.selector();
    let max_index = targets.iter().map(|t| t.index).max().unwrap_or(0);
    let mut replacements: Vec<Option<String>> = vec![None; max_index + 1];
    let mut failed = 0;

    for target in targets.iter() {
        match highlighter.code_to_html(&target.text, lang) {
            Ok(markup) => replacements[target.index] = Some(markup),
            Err(e) => {
                failed += 1;
                tracing::warn!(
                    "{}: element #{} left unhighlighted: {}",
                    page.path.display(),
                    target.index,
                    e
                );
            }
        }
    }

    // `discover_targets` already validated the selector for the rewriter
    check_rewriter_selector(selector)?;

    let mut ordinal = 0usize;
    let mut mutated = 0usize;
    let html = rewrite_str(
        &page.html,
        RewriteStrSettings {
            element_content_handlers: vec![element!(selector, |el| {
                if let Some(Some(markup)) = replacements.get_mut(ordinal).map(Option::take) {
                    el.set_inner_content(&markup, ContentType::Html);
                    mutated += 1;
                }
                ordinal += 1;
                Ok(())
            })],
            ..Default::default()
        },
    )
    .map_err(|source| PageError::Rewrite {
        path: page.path.clone(),
        source,
    })?;

    if ordinal != max_index + 1 {
        tracing::warn!(
            "{}: rewriter saw {} element(s) for `{}`, discovery saw {}",
            page.path.display(),
            ordinal,
            selector,
            max_index + 1
        );
    }

    tracing::info!(
        "{}: highlighted {} element(s), {} failed",
        page.path.display(),
        mutated,
        failed
    );

    Ok(RenderedPage {
        path: page.path.clone(),
        html,
        mutated,
        failed,
    })
}
