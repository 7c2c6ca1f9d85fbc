//! Oniguruma → fancy-regex pattern translation
//!
//! TextMate grammars are written against Oniguruma. fancy-regex covers the
//! lookaround, backreference and atomic group features, but a few escapes
//! need rewriting, and `^`/`$` must be line anchors.
//!
//! `\G` has no fancy-regex equivalent. It is stripped from the pattern and
//! recorded on the [`Pattern`], and the tokenizer only accepts such a match
//! when it starts at the current anchor position.

use std::borrow::Cow;

use fancy_regex::Regex;

/// A compiled grammar regex
#[derive(Debug, Clone)]
pub struct Pattern {
    pub regex: Regex,
    /// The source used `\G`
    pub anchored: bool,
}

impl Pattern {
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}

/// Compile a grammar regex after translating Oniguruma-only syntax
pub fn compile(pattern: &str) -> Result<Pattern, fancy_regex::Error> {
    Ok(Pattern {
        regex: Regex::new(&translate(pattern))?,
        anchored: has_g_anchor(pattern),
    })
}

/// Rewrite Oniguruma escapes fancy-regex does not understand
pub fn translate(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() + 8);
    out.push_str("(?m)");

    let mut chars = pattern.chars().peekable();
    // Depth of `[...]` nesting, POSIX classes like `[[:alpha:]]` included
    let mut depth = 0usize;

    while let Some(c) = chars.next() {
        let in_class = depth > 0;
        match c {
            '\\' => {
                let Some(next) = chars.next() else {
                    out.push('\\');
                    break;
                };
                match (next, in_class) {
                    ('h', false) => out.push_str("[0-9a-fA-F]"),
                    ('h', true) => out.push_str("0-9a-fA-F"),
                    ('H', false) => out.push_str("[^0-9a-fA-F]"),
                    ('Z', false) => out.push_str(r"(?=\n?\z)"),
                    // Enforced by the tokenizer, see `Pattern::anchored`
                    ('G', false) => {}
                    _ => {
                        out.push('\\');
                        out.push(next);
                    }
                }
            }
            '[' if !in_class => {
                depth = 1;
                out.push('[');
                // A leading `]` (or `^]`) is a literal member
                if chars.peek() == Some(&'^') {
                    out.push('^');
                    chars.next();
                }
                if chars.peek() == Some(&']') {
                    out.push_str(r"\]");
                    chars.next();
                }
            }
            '[' => {
                depth += 1;
                out.push('[');
            }
            ']' if in_class => {
                depth -= 1;
                out.push(']');
            }
            _ => out.push(c),
        }
    }

    out
}

/// `true` if the pattern uses `\G` outside a character class
pub fn has_g_anchor(pattern: &str) -> bool {
    let mut chars = pattern.chars();
    let mut depth = 0usize;
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if chars.next() == Some('G') && depth == 0 {
                    return true;
                }
            }
            '[' => depth += 1,
            ']' if depth > 0 => depth -= 1,
            _ => {}
        }
    }
    false
}

/// `true` if the pattern references begin captures (`\1` .. `\9`)
pub fn has_back_references(pattern: &str) -> bool {
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some(d) if d.is_ascii_digit() => return true,
                _ => {}
            }
        }
    }
    false
}

/// Replace `\N` in an end/while pattern with the escaped text of capture N
pub fn resolve_back_references<'a>(pattern: &'a str, captured: &[Option<String>]) -> Cow<'a, str> {
    if !has_back_references(pattern) {
        return Cow::Borrowed(pattern);
    }

    let mut out = String::with_capacity(pattern.len());
    let mut chars = pattern.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.peek().copied() {
            Some(d) if d.is_ascii_digit() => {
                chars.next();
                let index = d.to_digit(10).unwrap_or(0) as usize;
                if let Some(Some(text)) = captured.get(index) {
                    out.push_str(&fancy_regex::escape(text));
                }
            }
            Some(other) => {
                chars.next();
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_escape_outside_and_inside_class() {
        assert_eq!(translate(r"0x\h+"), r"(?m)0x[0-9a-fA-F]+");
        assert_eq!(translate(r"[\h_]"), r"(?m)[0-9a-fA-F_]");
    }

    #[test]
    fn test_escaped_backslash_is_untouched() {
        assert_eq!(translate(r"\\h"), r"(?m)\\h");
    }

    #[test]
    fn test_dollar_matches_before_newline() {
        let re = compile("==.*$").unwrap();
        let m = re.regex.find("x == note\n").unwrap().unwrap();
        assert_eq!(m.as_str(), "== note");
    }

    #[test]
    fn test_g_anchor_is_recorded() {
        let pattern = compile(r"\Gb").unwrap();
        assert!(pattern.anchored);
        assert_eq!(pattern.as_str(), "(?m)b");

        assert!(!has_g_anchor(r"\\G"));
        assert!(!has_g_anchor(r"[\G]"));
        assert!(!compile("b").unwrap().anchored);
    }

    #[test]
    fn test_back_references() {
        assert!(has_back_references(r"\1"));
        assert!(!has_back_references(r"\\1"));
        assert!(!has_back_references(r"\d+"));

        let resolved = resolve_back_references(r"^\1$", &[None, Some("a+b".to_string())]);
        assert_eq!(resolved, r"^a\+b$");
    }
}
