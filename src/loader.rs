//! The asynchronous load chain
//!
//! ```text
//! discover_targets → fetch_grammar → build_descriptor → init_highlighter → render_all
//! ```
//!
//! Nothing is rendered unless every step before `render_all` succeeded. Errors
//! are returned unmodified; the caller is the single place they end up.

use crate::config::HighlightConfig;
use crate::error::{InitError, LoadError};
use crate::grammar::{build_descriptor, fetch_grammar, GrammarDescriptor};
use crate::highlight::{Highlighter, HighlighterOptions};
use crate::page::{render_all, Page, RenderedPage};

/// Construct a highlighter with a single registered grammar
pub async fn init_highlighter(
    descriptor: GrammarDescriptor,
    theme: &str,
) -> Result<Highlighter, InitError> {
    Highlighter::new(HighlighterOptions {
        theme: theme.to_string(),
        langs: vec![descriptor],
    })
}

/// Run the whole chain over `pages`
///
/// The grammar is fetched even when no page has a target, so a broken grammar
/// location is reported regardless of page content.
pub async fn run(
    config: &HighlightConfig,
    pages: &[Page],
) -> Result<Vec<RenderedPage>, LoadError> {
    let discovered = pages
        .iter()
        .map(|page| page.discover_targets(&config.selector))
        .collect::<Result<Vec<_>, _>>()?;

    let total: usize = discovered.iter().map(|t| t.len()).sum();
    tracing::info!(
        "Found {} target(s) for `{}` across {} page(s)",
        total,
        config.selector,
        pages.len()
    );

    let grammar = fetch_grammar(&config.grammar_source()).await?;
    let descriptor = build_descriptor(grammar, &config.language_id, &config.scope_name);
    let highlighter = init_highlighter(descriptor, &config.theme).await?;

    let mut rendered = Vec::with_capacity(pages.len());
    for (page, targets) in pages.iter().zip(discovered) {
        rendered.push(render_all(&highlighter, page, targets, &config.language_id)?);
    }
    Ok(rendered)
}
