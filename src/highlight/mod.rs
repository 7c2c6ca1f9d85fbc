//! Syntax highlighting engine
//!
//! Provides TextMate grammar based highlighting with:
//! - Grammar compilation (regexes, includes, repositories)
//! - Line-by-line tokenization with a rule stack
//! - Theme resolution and Shiki-compatible HTML output
//!
//! ## Architecture
//!
//! ```text
//! GrammarDescriptor → RawGrammar → CompiledGrammar ─┐
//!                                                   ├→ Highlighter::code_to_html
//! theme id → Theme ─────────────────────────────────┘
//! ```

mod compiled;
mod highlighter;
mod html;
mod raw;
mod regex;
mod tokenizer;

pub use highlighter::{Highlighter, HighlighterOptions, ThemedToken};
pub use html::{escape_html, render_html};
pub use raw::{RawCapture, RawGrammar, RawRule};
pub use tokenizer::ScopedToken;
