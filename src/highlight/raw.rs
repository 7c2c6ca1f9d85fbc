//! Raw TextMate grammar shape
//!
//! Only the fields the tokenizer consumes are typed. Everything else a grammar
//! carries (file types, injections, uuid, ...) lands in `extra` and is ignored.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

pub type RawRepository = HashMap<String, RawRule>;
pub type RawCaptures = HashMap<String, RawCapture>;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawGrammar {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub scope_name: Option<String>,
    #[serde(default)]
    pub patterns: Vec<RawRule>,
    #[serde(default)]
    pub repository: RawRepository,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRule {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub content_name: Option<String>,
    #[serde(default, rename = "match")]
    pub match_: Option<String>,
    #[serde(default)]
    pub begin: Option<String>,
    #[serde(default)]
    pub end: Option<String>,
    #[serde(default, rename = "while")]
    pub while_: Option<String>,
    #[serde(default)]
    pub captures: Option<RawCaptures>,
    #[serde(default)]
    pub begin_captures: Option<RawCaptures>,
    #[serde(default)]
    pub end_captures: Option<RawCaptures>,
    #[serde(default)]
    pub while_captures: Option<RawCaptures>,
    #[serde(default)]
    pub patterns: Vec<RawRule>,
    #[serde(default)]
    pub include: Option<String>,
    #[serde(default)]
    pub repository: RawRepository,
    #[serde(default, deserialize_with = "flag")]
    pub apply_end_pattern_last: bool,
    #[serde(default, deserialize_with = "flag")]
    pub disabled: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCapture {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub patterns: Vec<RawRule>,
}

/// Grammars write boolean flags as `true` or as `1`
fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Bool(b) => b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        _ => false,
    })
}
