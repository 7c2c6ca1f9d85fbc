//! Error taxonomy for the grammar fetch → highlight chain
//!
//! None of these are recovered inside the library. They travel up to the
//! binary, which logs them once and exits.

use std::path::PathBuf;

use thiserror::Error;

/// Network or transport failure while retrieving a grammar
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered with HTTP {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("failed to read grammar from {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// The grammar body was retrieved but is not valid JSON
#[derive(Debug, Error)]
#[error("grammar from {origin} is not valid JSON")]
pub struct ParseError {
    pub origin: String,
    #[source]
    pub source: serde_json::Error,
}

/// The highlighting engine rejected its configuration
#[derive(Debug, Error)]
pub enum InitError {
    #[error("grammar `{lang}` has an unexpected shape")]
    Shape {
        lang: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("grammar `{lang}` contains an invalid regex `{pattern}`")]
    Regex {
        lang: String,
        pattern: String,
        #[source]
        source: fancy_regex::Error,
    },

    #[error("language `{0}` was registered twice")]
    DuplicateLanguage(String),

    #[error("theme `{id}` could not be loaded: {message}")]
    Theme { id: String, message: String },
}

/// Highlighting a single code block failed
#[derive(Debug, Error)]
pub enum HighlightError {
    #[error("language `{0}` is not registered with this highlighter")]
    UnknownLanguage(String),

    #[error("regex `{pattern}` failed while tokenizing")]
    Regex {
        pattern: String,
        #[source]
        source: fancy_regex::Error,
    },
}

/// Reading, querying or rewriting a documentation page failed
#[derive(Debug, Error)]
pub enum PageError {
    #[error("invalid selector `{selector}`: {message}")]
    Selector { selector: String, message: String },

    #[error("failed to rewrite {}", path.display())]
    Rewrite {
        path: PathBuf,
        #[source]
        source: lol_html::errors::RewritingError,
    },

    #[error("I/O error on {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Any failure of the load chain, in the order the chain can produce them
#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Page(#[from] PageError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Init(#[from] InitError),
}
