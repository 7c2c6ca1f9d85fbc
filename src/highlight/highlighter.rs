//! Highlighter instance: a theme plus registered grammars

use std::collections::HashMap;

use super::compiled::CompiledGrammar;
use super::html::render_html;
use super::raw::RawGrammar;
use super::tokenizer::{tokenize, ScopedToken};
use crate::error::{HighlightError, InitError};
use crate::grammar::GrammarDescriptor;
use crate::theme::{self, Theme, TokenStyle};

/// A run of text with its resolved style
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemedToken {
    pub content: String,
    pub style: TokenStyle,
}

/// Construction options: `{ theme, langs }`
#[derive(Debug, Clone)]
pub struct HighlighterOptions {
    /// Theme id, resolved through [`theme::load_theme`]
    pub theme: String,
    pub langs: Vec<GrammarDescriptor>,
}

/// Converts source code into themed tokens and markup
///
/// Only exists once every grammar it was given has compiled, so callers can
/// never highlight against a partially registered language set.
#[derive(Debug)]
pub struct Highlighter {
    theme: Theme,
    grammars: HashMap<String, CompiledGrammar>,
}

impl Highlighter {
    pub fn new(options: HighlighterOptions) -> Result<Self, InitError> {
        let theme = theme::load_theme(&options.theme).map_err(|message| InitError::Theme {
            id: options.theme.clone(),
            message,
        })?;
        Self::with_theme(theme, options.langs)
    }

    /// Build with an already resolved theme
    pub fn with_theme(theme: Theme, langs: Vec<GrammarDescriptor>) -> Result<Self, InitError> {
        let mut grammars = HashMap::new();

        for descriptor in langs {
            if grammars.contains_key(&descriptor.id) {
                return Err(InitError::DuplicateLanguage(descriptor.id));
            }

            let GrammarDescriptor {
                id,
                scope_name,
                grammar,
            } = descriptor;

            let raw: RawGrammar = serde_json::from_value(grammar).map_err(|source| {
                InitError::Shape {
                    lang: id.clone(),
                    source,
                }
            })?;
            if let Some(declared) = raw.scope_name.as_deref() {
                if declared != scope_name {
                    tracing::debug!(
                        "Grammar `{}` declares scope `{}`, registering as `{}`",
                        id,
                        declared,
                        scope_name
                    );
                }
            }

            let compiled = CompiledGrammar::compile(&id, &scope_name, &raw)?;
            grammars.insert(id, compiled);
        }

        tracing::info!(
            "Highlighter ready: theme `{}`, languages [{}]",
            theme.id,
            grammars.keys().cloned().collect::<Vec<_>>().join(", ")
        );

        Ok(Self { theme, grammars })
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn has_language(&self, lang: &str) -> bool {
        self.grammars.contains_key(lang)
    }

    /// Raw scoped tokens, one vector per line
    pub fn code_to_scopes(
        &self,
        code: &str,
        lang: &str,
    ) -> Result<Vec<Vec<ScopedToken>>, HighlightError> {
        let grammar = self
            .grammars
            .get(lang)
            .ok_or_else(|| HighlightError::UnknownLanguage(lang.to_string()))?;
        tokenize(grammar, code)
    }

    /// Themed tokens, one vector per line; adjacent runs with equal style merge
    pub fn code_to_tokens(
        &self,
        code: &str,
        lang: &str,
    ) -> Result<Vec<Vec<ThemedToken>>, HighlightError> {
        let lines = self.code_to_scopes(code, lang)?;
        Ok(lines
            .into_iter()
            .map(|line| self.theme_line(line))
            .collect())
    }

    /// Shiki-compatible `<pre class="shiki">` markup
    pub fn code_to_html(&self, code: &str, lang: &str) -> Result<String, HighlightError> {
        let lines = self.code_to_tokens(code, lang)?;
        Ok(render_html(&lines, &self.theme))
    }

    fn theme_line(&self, line: Vec<ScopedToken>) -> Vec<ThemedToken> {
        let mut themed: Vec<ThemedToken> = Vec::with_capacity(line.len());
        for token in line {
            let style = self.theme.style_for(&token.scopes);
            match themed.last_mut() {
                Some(last) if last.style == style => last.content.push_str(&token.text),
                _ => themed.push(ThemedToken {
                    content: token.text,
                    style,
                }),
            }
        }
        themed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::build_descriptor;
    use serde_json::json;

    fn highlighter(grammar: serde_json::Value) -> Result<Highlighter, InitError> {
        Highlighter::new(HighlighterOptions {
            theme: "github-dark".to_string(),
            langs: vec![build_descriptor(grammar, "samarium", "source.samarium")],
        })
    }

    #[test]
    fn test_unknown_language() {
        let h = highlighter(json!({ "patterns": [] })).unwrap();
        assert!(matches!(
            h.code_to_html("x", "python"),
            Err(HighlightError::UnknownLanguage(lang)) if lang == "python"
        ));
    }

    #[test]
    fn test_shape_error() {
        let err = highlighter(json!(["not", "an", "object"])).unwrap_err();
        assert!(matches!(err, InitError::Shape { .. }));
    }

    #[test]
    fn test_unknown_theme() {
        let err = Highlighter::new(HighlighterOptions {
            theme: "no-such-theme".to_string(),
            langs: vec![],
        })
        .unwrap_err();
        assert!(matches!(err, InitError::Theme { .. }));
    }

    #[test]
    fn test_duplicate_language() {
        let grammar = json!({ "patterns": [] });
        let err = Highlighter::new(HighlighterOptions {
            theme: "github-dark".to_string(),
            langs: vec![
                build_descriptor(grammar.clone(), "samarium", "source.samarium"),
                build_descriptor(grammar, "samarium", "source.samarium"),
            ],
        })
        .unwrap_err();
        assert!(matches!(err, InitError::DuplicateLanguage(_)));
    }

    #[test]
    fn test_adjacent_equal_styles_merge() {
        let h = highlighter(json!({
            "patterns": [
                { "match": "a", "name": "variable.other.a" },
                { "match": "b", "name": "variable.other.b" }
            ]
        }))
        .unwrap();
        let lines = h.code_to_tokens("ab", "samarium").unwrap();
        assert_eq!(lines[0].len(), 1);
        assert_eq!(lines[0][0].content, "ab");
    }
}
