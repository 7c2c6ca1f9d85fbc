use serde::Serialize;
use serde_json::Value;

/// Language registration passed to the highlighter
///
/// `grammar` is kept as the parsed JSON document; its shape is only checked
/// when a highlighter compiles it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GrammarDescriptor {
    pub id: String,
    #[serde(rename = "scopeName")]
    pub scope_name: String,
    pub grammar: Value,
}

/// Wrap a parsed grammar document. No validation happens here.
pub fn build_descriptor(grammar: Value, id: &str, scope_name: &str) -> GrammarDescriptor {
    GrammarDescriptor {
        id: id.to_string(),
        scope_name: scope_name.to_string(),
        grammar,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_descriptor_keeps_grammar_as_is() {
        let grammar = json!({ "name": "Samarium", "patterns": [] });
        let descriptor = build_descriptor(grammar.clone(), "samarium", "source.samarium");

        assert_eq!(descriptor.id, "samarium");
        assert_eq!(descriptor.scope_name, "source.samarium");
        assert_eq!(descriptor.grammar, grammar);
    }

    #[test]
    fn test_descriptor_accepts_any_json() {
        let descriptor = build_descriptor(json!(42), "samarium", "source.samarium");
        assert_eq!(descriptor.grammar, json!(42));
    }

    #[test]
    fn test_descriptor_serializes_with_scope_name_key() {
        let descriptor = build_descriptor(json!({}), "samarium", "source.samarium");
        let value = serde_json::to_value(&descriptor).unwrap();
        assert_eq!(
            value,
            json!({ "id": "samarium", "scopeName": "source.samarium", "grammar": {} })
        );
    }
}
