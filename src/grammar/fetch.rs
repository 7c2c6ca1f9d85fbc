use serde_json::Value;

use crate::config::GrammarSource;
use crate::error::{FetchError, LoadError, ParseError};

/// Retrieve and parse the grammar document
///
/// A URL is requested exactly once; any non-success status is a
/// [`FetchError::Status`]. Local files are read as-is.
pub async fn fetch_grammar(source: &GrammarSource) -> Result<Value, LoadError> {
    let origin = source.describe();
    tracing::info!("Fetching grammar from {}", origin);

    let body = match source {
        GrammarSource::Url(url) => fetch_url(url).await?,
        GrammarSource::File(path) => {
            tokio::fs::read_to_string(path)
                .await
                .map_err(|source| FetchError::Io {
                    path: path.clone(),
                    source,
                })?
        }
    };

    tracing::debug!("Grammar body from {}: {} bytes", origin, body.len());
    Ok(parse_grammar(&body, &origin)?)
}

async fn fetch_url(url: &str) -> Result<String, FetchError> {
    let transport = |source| FetchError::Transport {
        url: url.to_string(),
        source,
    };

    let response = reqwest::get(url).await.map_err(transport)?;
    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status,
        });
    }

    response.text().await.map_err(transport)
}

/// Parse a grammar body as JSON; `origin` names where it came from in errors
pub fn parse_grammar(body: &str, origin: &str) -> Result<Value, ParseError> {
    serde_json::from_str(body).map_err(|source| ParseError {
        origin: origin.to_string(),
        source,
    })
}
