//! sm-highlight - Samarium code highlighting for documentation pages
//!
//! Fetches a TextMate grammar, registers it with a highlighting engine and
//! rewrites every tagged code block of a set of HTML pages with highlighted
//! markup. See [`loader::run`] for the chain.

pub mod cli;
pub mod config;
pub mod config_paths;
pub mod error;
pub mod grammar;
pub mod highlight;
pub mod loader;
pub mod markdown;
pub mod page;
pub mod site;
pub mod theme;
pub mod tracing;

// Re-export commonly used types
pub use config::HighlightConfig;
pub use error::{FetchError, HighlightError, InitError, LoadError, PageError, ParseError};
pub use grammar::GrammarDescriptor;
pub use highlight::Highlighter;
pub use page::{Page, RenderedPage, TargetElement};
pub use theme::Theme;
