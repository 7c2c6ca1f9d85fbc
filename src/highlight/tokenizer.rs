//! TextMate tokenizer
//!
//! Works line by line. A rule stack carries `begin`/`end` and `begin`/`while`
//! blocks across lines. At each position the earliest match among the end
//! pattern of the innermost block and its candidate patterns wins; on a tie
//! the end pattern wins unless the block sets `applyEndPatternLast`, then the
//! first pattern in grammar order.
//!
//! A `\G` pattern only matches at the anchor: the position right after the
//! innermost block's `begin` (or `while`) matched on the current line.

use fancy_regex::Captures;

use super::compiled::{CaptureScopes, Closer, CompiledGrammar, Rule, RuleId, ROOT};
use super::regex::{self, Pattern};
use crate::error::HighlightError;

/// Upper bound on match steps per line; pathological grammars stop here
const MAX_STEPS_PER_LINE: usize = 10_000;

/// Nesting limit for captures tokenized with their own `patterns`
const MAX_CAPTURE_DEPTH: usize = 16;

/// A run of text and the scope stack (outermost first) it was matched under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopedToken {
    pub text: String,
    pub scopes: Vec<String>,
}

/// How the innermost block may be left
#[derive(Debug, Clone)]
enum FrameCloser {
    Never,
    End(Pattern),
    While(Pattern),
}

#[derive(Debug, Clone)]
struct Frame {
    rule: RuleId,
    /// Scopes including the rule `name`; begin/end captures use these
    name_scopes: Vec<String>,
    /// `name_scopes` plus `contentName`; text between begin and end uses these
    content_scopes: Vec<String>,
    closer: FrameCloser,
    /// Byte position in the current line right after `begin` matched
    entered_at: Option<usize>,
    /// Where `\G` matches on the current line
    anchor: Option<usize>,
    /// `begin` consumed the line end, so `\G` matches at the next line start
    begin_at_eol: bool,
}

impl Frame {
    fn root(rule: RuleId, scopes: Vec<String>) -> Self {
        Self {
            rule,
            name_scopes: scopes.clone(),
            content_scopes: scopes,
            closer: FrameCloser::Never,
            entered_at: None,
            anchor: None,
            begin_at_eol: false,
        }
    }
}

enum StepKind<'t> {
    Close(Captures<'t>),
    Rule(RuleId, Captures<'t>),
}

struct Step<'t> {
    start: usize,
    end: usize,
    kind: StepKind<'t>,
}

/// Collects tokens for one line, clipping at the appended newline
struct LineTokens<'a> {
    line: &'a str,
    tokens: Vec<ScopedToken>,
}

impl<'a> LineTokens<'a> {
    fn new(line: &'a str) -> Self {
        Self {
            line,
            tokens: Vec::new(),
        }
    }

    fn emit(&mut self, start: usize, end: usize, scopes: &[String]) {
        let end = end.min(self.line.len());
        if start >= end {
            return;
        }
        self.tokens.push(ScopedToken {
            text: self.line[start..end].to_string(),
            scopes: scopes.to_vec(),
        });
    }

    fn finish(self) -> Vec<ScopedToken> {
        self.tokens
    }
}

/// Stateful tokenizer for one code block
pub struct Tokenizer<'g> {
    grammar: &'g CompiledGrammar,
    stack: Vec<Frame>,
    /// Capture nesting level; zero for the block itself
    depth: usize,
}

impl<'g> Tokenizer<'g> {
    pub fn new(grammar: &'g CompiledGrammar) -> Self {
        Self {
            grammar,
            stack: vec![Frame::root(ROOT, vec![grammar.scope_name.clone()])],
            depth: 0,
        }
    }

    /// Tokenize the next line (without its line terminator)
    pub fn tokenize_line(&mut self, line: &str) -> Result<Vec<ScopedToken>, HighlightError> {
        let text = format!("{}\n", line);
        let mut out = LineTokens::new(line);

        for frame in &mut self.stack {
            frame.entered_at = None;
            frame.anchor = frame.begin_at_eol.then_some(0);
        }

        let pos = self.check_while_rules(&text, &mut out)?;
        let pos = self.scan(&text, pos, &mut out)?;

        let content_scopes = self.top().content_scopes.clone();
        out.emit(pos, text.len(), &content_scopes);
        Ok(out.finish())
    }

    /// Apply rules from `pos` until `text` is used up or nothing matches
    ///
    /// Returns the position tokenization stopped at; the caller emits the rest.
    fn scan(
        &mut self,
        text: &str,
        mut pos: usize,
        out: &mut LineTokens<'_>,
    ) -> Result<usize, HighlightError> {
        let grammar = self.grammar;
        let mut steps = 0;

        while pos < text.len() {
            steps += 1;
            if steps > MAX_STEPS_PER_LINE {
                tracing::warn!(
                    "Grammar `{}` made no progress on a line, leaving the rest unscoped",
                    grammar.language
                );
                break;
            }

            let Some(step) = self.next_step(text, pos)? else {
                break;
            };

            let content_scopes = self.top().content_scopes.clone();
            out.emit(pos, step.start, &content_scopes);

            match step.kind {
                StepKind::Close(caps) => {
                    let Some(frame) = self.pop() else {
                        break;
                    };
                    let closer_captures = match &grammar.rules[frame.rule] {
                        Rule::Block {
                            closer_captures, ..
                        } => closer_captures,
                        _ => &EMPTY_CAPTURES,
                    };
                    self.emit_captures(out, text, &caps, closer_captures, &frame.name_scopes)?;

                    // Entered and left without consuming anything
                    let stuck = step.end == pos && frame.entered_at == Some(pos);
                    pos = step.end;
                    if stuck {
                        break;
                    }
                }
                StepKind::Rule(id, caps) => match &grammar.rules[id] {
                    Rule::Match { name, captures, .. } => {
                        let mut scopes = content_scopes.clone();
                        scopes.extend(name.iter().cloned());
                        self.emit_captures(out, text, &caps, captures, &scopes)?;

                        if step.end == pos {
                            let next = next_char_boundary(text, pos);
                            out.emit(pos, next, &content_scopes);
                            pos = next;
                        } else {
                            pos = step.end;
                        }
                    }
                    Rule::Block {
                        name,
                        content_name,
                        begin_captures,
                        closer,
                        ..
                    } => {
                        if step.end == pos
                            && self
                                .stack
                                .iter()
                                .any(|f| f.rule == id && f.entered_at == Some(pos))
                        {
                            break;
                        }

                        let mut name_scopes = content_scopes;
                        name_scopes.extend(name.iter().cloned());
                        self.emit_captures(out, text, &caps, begin_captures, &name_scopes)?;

                        let mut inner_scopes = name_scopes.clone();
                        inner_scopes.extend(content_name.iter().cloned());

                        let closer = resolve_closer(closer, &caps)?;
                        self.stack.push(Frame {
                            rule: id,
                            name_scopes,
                            content_scopes: inner_scopes,
                            closer,
                            entered_at: Some(step.end),
                            anchor: Some(step.end),
                            begin_at_eol: step.end == text.len(),
                        });
                        pos = step.end;
                    }
                    // Candidates only ever hold match and block rules
                    Rule::Include(_) | Rule::Group { .. } => break,
                },
            }
        }

        Ok(pos)
    }

    fn top(&self) -> &Frame {
        // The root frame is never popped
        &self.stack[self.stack.len() - 1]
    }

    fn pop(&mut self) -> Option<Frame> {
        if self.stack.len() > 1 {
            self.stack.pop()
        } else {
            None
        }
    }

    /// At the start of a line every open `while` block must match again
    fn check_while_rules(
        &mut self,
        text: &str,
        out: &mut LineTokens<'_>,
    ) -> Result<usize, HighlightError> {
        let grammar = self.grammar;
        let mut pos = 0;

        for index in 1..self.stack.len() {
            let frame = &self.stack[index];
            let FrameCloser::While(pattern) = &frame.closer else {
                continue;
            };

            match captures_at(pattern, text, pos, frame.anchor)? {
                Some(caps) if caps.get(0).map(|m| m.start()) == Some(pos) => {
                    if let Rule::Block {
                        closer_captures, ..
                    } = &grammar.rules[frame.rule]
                    {
                        let scopes = &frame.name_scopes;
                        self.emit_captures(out, text, &caps, closer_captures, scopes)?;
                    }
                    pos = caps.get(0).map_or(pos, |m| m.end());
                    self.stack[index].anchor = Some(pos);
                }
                _ => {
                    self.stack.truncate(index);
                    break;
                }
            }
        }

        Ok(pos)
    }

    fn next_step<'t>(&self, text: &'t str, pos: usize) -> Result<Option<Step<'t>>, HighlightError> {
        let grammar = self.grammar;
        let top = self.top();

        let mut best: Option<(usize, usize, RuleId, Captures<'t>)> = None;
        for &id in &grammar.candidates[top.rule] {
            let pattern = match &grammar.rules[id] {
                Rule::Match { regex, .. } => regex,
                Rule::Block { begin, .. } => begin,
                _ => continue,
            };
            let Some(caps) = captures_at(pattern, text, pos, top.anchor)? else {
                continue;
            };
            let Some(m) = caps.get(0) else {
                continue;
            };
            if best.as_ref().map_or(true, |(start, ..)| m.start() < *start) {
                let at_pos = m.start() == pos;
                best = Some((m.start(), m.end(), id, caps));
                if at_pos {
                    break;
                }
            }
        }

        if let FrameCloser::End(end) = &top.closer {
            if let Some(caps) = captures_at(end, text, pos, top.anchor)? {
                if let Some(m) = caps.get(0) {
                    let end_last = matches!(
                        &grammar.rules[top.rule],
                        Rule::Block {
                            apply_end_pattern_last: true,
                            ..
                        }
                    );
                    let end_wins = match &best {
                        None => true,
                        Some((start, ..)) if end_last => m.start() < *start,
                        Some((start, ..)) => m.start() <= *start,
                    };
                    if end_wins {
                        return Ok(Some(Step {
                            start: m.start(),
                            end: m.end(),
                            kind: StepKind::Close(caps),
                        }));
                    }
                }
            }
        }

        Ok(best.map(|(start, end, id, caps)| Step {
            start,
            end,
            kind: StepKind::Rule(id, caps),
        }))
    }

    /// Emit the matched range, splitting it at named (possibly nested) captures
    ///
    /// A capture with its own `patterns` is tokenized again with them, limited
    /// to the captured text.
    fn emit_captures(
        &self,
        out: &mut LineTokens<'_>,
        text: &str,
        caps: &Captures<'_>,
        captures: &CaptureScopes,
        base: &[String],
    ) -> Result<(), HighlightError> {
        let Some(whole) = caps.get(0) else {
            return Ok(());
        };
        let (start, end) = (whole.start(), whole.end());

        let mut spans: Vec<_> = captures
            .iter()
            .filter_map(|capture| {
                caps.get(capture.index).map(|m| (m.start(), m.end(), capture))
            })
            .filter(|(s, e, _)| e > s)
            .collect();
        spans.sort_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)));

        let mut pos = start;
        let mut open: Vec<(usize, Vec<String>)> = Vec::new();

        for (span_start, span_end, capture) in spans {
            while let Some((close_at, outer)) = open.pop() {
                if close_at > span_start {
                    open.push((close_at, outer));
                    break;
                }
                out.emit(pos, close_at, &outer);
                pos = pos.max(close_at);
            }

            if span_end <= pos {
                continue;
            }
            let span_start = span_start.max(pos);

            let current = open
                .last()
                .map(|(_, s)| s.clone())
                .unwrap_or_else(|| base.to_vec());
            out.emit(pos, span_start, &current);
            pos = span_start;

            let span_end = open
                .last()
                .map_or(span_end, |(close_at, _)| span_end.min(*close_at));
            let mut inner = current;
            inner.extend(capture.scopes.iter().cloned());

            match capture.patterns {
                Some(rule) if self.depth < MAX_CAPTURE_DEPTH => {
                    self.retokenize(out, &text[..span_end], span_start, rule, inner)?;
                    pos = span_end;
                }
                _ => open.push((span_end, inner)),
            }
        }

        while let Some((close_at, scopes)) = open.pop() {
            out.emit(pos, close_at, &scopes);
            pos = pos.max(close_at);
        }
        out.emit(pos, end, base);
        Ok(())
    }

    /// Tokenize `text[start..]` with the group rule of a capture
    fn retokenize(
        &self,
        out: &mut LineTokens<'_>,
        text: &str,
        start: usize,
        rule: RuleId,
        scopes: Vec<String>,
    ) -> Result<(), HighlightError> {
        let mut nested = Tokenizer {
            grammar: self.grammar,
            stack: vec![Frame::root(rule, scopes)],
            depth: self.depth + 1,
        };
        let stopped = nested.scan(text, start, out)?;
        let content_scopes = nested.top().content_scopes.clone();
        out.emit(stopped, text.len(), &content_scopes);
        Ok(())
    }
}

static EMPTY_CAPTURES: CaptureScopes = Vec::new();

/// Search from `pos`; a `\G` pattern must match exactly at `pos == anchor`
fn captures_at<'t>(
    pattern: &Pattern,
    text: &'t str,
    pos: usize,
    anchor: Option<usize>,
) -> Result<Option<Captures<'t>>, HighlightError> {
    if pattern.anchored && anchor != Some(pos) {
        return Ok(None);
    }

    let caps = pattern
        .regex
        .captures_from_pos(text, pos)
        .map_err(|source| HighlightError::Regex {
            pattern: pattern.as_str().to_string(),
            source,
        })?;

    Ok(caps.filter(|caps| !pattern.anchored || caps.get(0).is_some_and(|m| m.start() == pos)))
}

/// Build the closer of a block being entered, filling in back-references
fn resolve_closer(closer: &Closer, caps: &Captures<'_>) -> Result<FrameCloser, HighlightError> {
    Ok(match closer {
        Closer::Never => FrameCloser::Never,
        Closer::End(pattern) => FrameCloser::End(pattern.clone()),
        Closer::While(pattern) => FrameCloser::While(pattern.clone()),
        Closer::DynamicEnd(source) => FrameCloser::End(compile_with_captures(source, caps)?),
        Closer::DynamicWhile(source) => FrameCloser::While(compile_with_captures(source, caps)?),
    })
}

fn compile_with_captures(pattern: &str, caps: &Captures<'_>) -> Result<Pattern, HighlightError> {
    let captured: Vec<Option<String>> = (0..caps.len())
        .map(|i| caps.get(i).map(|m| m.as_str().to_string()))
        .collect();
    let resolved = regex::resolve_back_references(pattern, &captured);
    regex::compile(&resolved).map_err(|source| HighlightError::Regex {
        pattern: resolved.to_string(),
        source,
    })
}

fn next_char_boundary(text: &str, pos: usize) -> usize {
    text[pos..]
        .chars()
        .next()
        .map_or(text.len(), |c| pos + c.len_utf8())
}

/// Tokenize a whole code block
///
/// Lines are split on `\n` (a trailing `\r` is dropped). A single trailing
/// newline does not produce an extra empty line.
pub fn tokenize(
    grammar: &CompiledGrammar,
    code: &str,
) -> Result<Vec<Vec<ScopedToken>>, HighlightError> {
    let code = code.strip_suffix('\n').unwrap_or(code);
    let mut tokenizer = Tokenizer::new(grammar);
    code.split('\n')
        .map(|line| tokenizer.tokenize_line(line.strip_suffix('\r').unwrap_or(line)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::highlight::raw::RawGrammar;
    use serde_json::json;

    fn grammar(value: serde_json::Value) -> CompiledGrammar {
        let raw: RawGrammar = serde_json::from_value(value).unwrap();
        CompiledGrammar::compile("test", "source.test", &raw).unwrap()
    }

    fn render(lines: &[Vec<ScopedToken>]) -> Vec<Vec<(String, String)>> {
        lines
            .iter()
            .map(|line| {
                line.iter()
                    .map(|t| (t.text.clone(), t.scopes[1..].join(" ")))
                    .collect()
            })
            .collect()
    }

    fn pair(text: &str, scopes: &str) -> (String, String) {
        (text.to_string(), scopes.to_string())
    }

    #[test]
    fn test_match_rules() {
        let g = grammar(json!({
            "patterns": [
                { "match": "\\d+", "name": "constant.numeric" },
                { "match": "\\+", "name": "keyword.operator" }
            ]
        }));
        let lines = tokenize(&g, "1 + 1").unwrap();
        assert_eq!(
            render(&lines),
            vec![vec![
                pair("1", "constant.numeric"),
                pair(" ", ""),
                pair("+", "keyword.operator"),
                pair(" ", ""),
                pair("1", "constant.numeric"),
            ]]
        );
    }

    #[test]
    fn test_block_spans_lines() {
        let g = grammar(json!({
            "patterns": [{
                "begin": "==<", "end": ">==", "name": "comment.block",
                "captures": { "0": { "name": "punctuation.definition.comment" } }
            }]
        }));
        let lines = tokenize(&g, "a ==< one\ntwo >== b").unwrap();
        assert_eq!(
            render(&lines),
            vec![
                vec![
                    pair("a ", ""),
                    pair("==<", "comment.block punctuation.definition.comment"),
                    pair(" one", "comment.block"),
                ],
                vec![
                    pair("two ", "comment.block"),
                    pair(">==", "comment.block punctuation.definition.comment"),
                    pair(" b", ""),
                ],
            ]
        );
    }

    #[test]
    fn test_content_name_excludes_delimiters() {
        let g = grammar(json!({
            "patterns": [{
                "begin": "\"", "end": "\"", "name": "string", "contentName": "string.content"
            }]
        }));
        let lines = tokenize(&g, "\"hi\"").unwrap();
        assert_eq!(
            render(&lines),
            vec![vec![
                pair("\"", "string"),
                pair("hi", "string string.content"),
                pair("\"", "string"),
            ]]
        );
    }

    #[test]
    fn test_nested_captures() {
        let g = grammar(json!({
            "patterns": [{
                "match": "(@)(\\w+)",
                "name": "meta.class",
                "captures": {
                    "1": { "name": "keyword.control" },
                    "2": { "name": "entity.name.type" }
                }
            }]
        }));
        let lines = tokenize(&g, "@Point").unwrap();
        assert_eq!(
            render(&lines),
            vec![vec![
                pair("@", "meta.class keyword.control"),
                pair("Point", "meta.class entity.name.type"),
            ]]
        );
    }

    #[test]
    fn test_end_back_reference() {
        let g = grammar(json!({
            "patterns": [{ "begin": "(['\"])", "end": "\\1", "name": "string" }]
        }));
        let lines = tokenize(&g, "'a\"b' c").unwrap();
        assert_eq!(
            render(&lines),
            vec![vec![
                pair("'", "string"),
                pair("a\"b", "string"),
                pair("'", "string"),
                pair(" c", ""),
            ]]
        );
    }

    #[test]
    fn test_while_rule_ends_when_prefix_stops() {
        let g = grammar(json!({
            "patterns": [{ "begin": "^>", "while": "^>", "name": "markup.quote" }]
        }));
        let lines = tokenize(&g, "> a\n> b\nc").unwrap();
        let rendered = render(&lines);
        assert_eq!(rendered[1][1], pair(" b", "markup.quote"));
        assert_eq!(rendered[2], vec![pair("c", "")]);
    }

    #[test]
    fn test_zero_width_match_makes_progress() {
        let g = grammar(json!({
            "patterns": [{ "match": "(?=x)", "name": "meta.lookahead" }]
        }));
        let lines = tokenize(&g, "xx").unwrap();
        let text: String = lines[0].iter().map(|t| t.text.as_str()).collect();
        assert_eq!(text, "xx");
    }

    #[test]
    fn test_trailing_newline_and_empty_input() {
        let g = grammar(json!({ "patterns": [] }));
        assert_eq!(tokenize(&g, "a\n").unwrap().len(), 1);
        assert_eq!(tokenize(&g, "a\r\nb").unwrap()[0][0].text, "a");
        let empty = tokenize(&g, "").unwrap();
        assert_eq!(empty.len(), 1);
        assert!(empty[0].is_empty());
    }

    #[test]
    fn test_g_anchor_only_matches_after_begin() {
        let g = grammar(json!({
            "patterns": [{
                "begin": "a", "end": "(?=;)", "name": "meta.block",
                "patterns": [{ "match": "\\Gb", "name": "keyword.anchored" }]
            }]
        }));

        let lines = tokenize(&g, "a cb;").unwrap();
        assert_eq!(
            render(&lines),
            vec![vec![
                pair("a", "meta.block"),
                pair(" cb", "meta.block"),
                pair(";", ""),
            ]]
        );

        let lines = tokenize(&g, "ab;").unwrap();
        assert_eq!(
            render(&lines),
            vec![vec![
                pair("a", "meta.block"),
                pair("b", "meta.block keyword.anchored"),
                pair(";", ""),
            ]]
        );
    }

    #[test]
    fn test_g_anchor_is_not_carried_to_the_next_line() {
        let g = grammar(json!({
            "patterns": [{
                "begin": "a", "end": ";", "name": "meta.block",
                "patterns": [{ "match": "\\Gb", "name": "keyword.anchored" }]
            }]
        }));
        let lines = tokenize(&g, "a\nb;").unwrap();
        assert_eq!(render(&lines)[1][0], pair("b", "meta.block"));
    }

    #[test]
    fn test_capture_patterns_tokenize_captured_text() {
        let g = grammar(json!({
            "patterns": [{
                "match": "<([^>]*)>",
                "name": "meta.generic",
                "captures": {
                    "1": {
                        "name": "meta.arguments",
                        "patterns": [{ "match": "\\d+", "name": "constant.numeric" }]
                    }
                }
            }]
        }));
        let lines = tokenize(&g, "<a 12> 3").unwrap();
        assert_eq!(
            render(&lines),
            vec![vec![
                pair("<", "meta.generic"),
                pair("a ", "meta.generic meta.arguments"),
                pair("12", "meta.generic meta.arguments constant.numeric"),
                pair(">", "meta.generic"),
                pair(" 3", ""),
            ]]
        );
    }
}
