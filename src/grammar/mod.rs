//! Grammar retrieval and descriptor construction
//!
//! The grammar document is fetched once per run, parsed as JSON and wrapped in
//! a [`GrammarDescriptor`] that the highlighter registers under a language id.

mod descriptor;
mod fetch;

pub use descriptor::{build_descriptor, GrammarDescriptor};
pub use fetch::{fetch_grammar, parse_grammar};
