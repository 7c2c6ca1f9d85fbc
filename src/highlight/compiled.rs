//! Compiled grammar: rules in an arena, regexes built, includes resolved
//!
//! Rule 0 is always the grammar root (its top-level `patterns`), which is what
//! `$self` and `$base` point at.

use std::collections::{HashMap, HashSet};

use super::raw::{RawCaptures, RawGrammar, RawRepository, RawRule};
use super::regex::{self, Pattern};
use crate::error::InitError;

pub type RuleId = usize;

pub const ROOT: RuleId = 0;

/// Scopes (and nested patterns) applied to one capture group
#[derive(Debug, Clone)]
pub struct Capture {
    pub index: usize,
    pub scopes: Vec<String>,
    /// Group rule the captured text is tokenized with again
    pub patterns: Option<RuleId>,
}

/// Captures sorted by index
pub type CaptureScopes = Vec<Capture>;

#[derive(Debug, Clone)]
pub enum Closer {
    /// `begin` without `end`: runs to the end of the block
    Never,
    End(Pattern),
    /// `end` references begin captures; compiled when the rule is entered
    DynamicEnd(String),
    While(Pattern),
    DynamicWhile(String),
}

#[derive(Debug)]
pub enum Rule {
    Match {
        name: Vec<String>,
        regex: Pattern,
        captures: CaptureScopes,
    },
    Block {
        name: Vec<String>,
        content_name: Vec<String>,
        begin: Pattern,
        begin_captures: CaptureScopes,
        closer: Closer,
        /// `endCaptures` or `whileCaptures`
        closer_captures: CaptureScopes,
        patterns: Vec<RuleId>,
        apply_end_pattern_last: bool,
    },
    Include(Option<RuleId>),
    Group {
        patterns: Vec<RuleId>,
    },
}

#[derive(Debug)]
pub struct CompiledGrammar {
    pub language: String,
    pub scope_name: String,
    pub rules: Vec<Rule>,
    /// Flattened match/block candidates for every rule that can be on the stack
    pub candidates: Vec<Vec<RuleId>>,
}

impl CompiledGrammar {
    pub fn compile(
        language: &str,
        scope_name: &str,
        grammar: &RawGrammar,
    ) -> Result<Self, InitError> {
        let mut compiler = Compiler {
            language,
            scope_name,
            rules: Vec::new(),
            seen: HashMap::new(),
        };

        let root = compiler.alloc();
        debug_assert_eq!(root, ROOT);
        let chain = vec![&grammar.repository];
        let patterns = compiler.compile_list(&grammar.patterns, &chain)?;
        compiler.rules[root] = Rule::Group { patterns };

        let rules = compiler.rules;
        let candidates = (0..rules.len())
            .map(|id| candidates_for(&rules, id))
            .collect();

        tracing::debug!(
            "Compiled grammar `{}` ({}) with {} rules",
            language,
            scope_name,
            rules.len()
        );

        Ok(Self {
            language: language.to_string(),
            scope_name: scope_name.to_string(),
            rules,
            candidates,
        })
    }
}

struct Compiler<'a> {
    language: &'a str,
    scope_name: &'a str,
    rules: Vec<Rule>,
    /// Raw rule address → compiled id, so recursive repository entries terminate
    seen: HashMap<*const RawRule, RuleId>,
}

impl<'g> Compiler<'g> {
    fn alloc(&mut self) -> RuleId {
        self.rules.push(Rule::Group {
            patterns: Vec::new(),
        });
        self.rules.len() - 1
    }

    fn compile_list(
        &mut self,
        raws: &'g [RawRule],
        chain: &[&'g RawRepository],
    ) -> Result<Vec<RuleId>, InitError> {
        raws.iter().map(|raw| self.compile_rule(raw, chain)).collect()
    }

    fn compile_rule(
        &mut self,
        raw: &'g RawRule,
        chain: &[&'g RawRepository],
    ) -> Result<RuleId, InitError> {
        let key = raw as *const RawRule;
        if let Some(&id) = self.seen.get(&key) {
            return Ok(id);
        }
        let id = self.alloc();
        self.seen.insert(key, id);

        let mut chain = chain.to_vec();
        if !raw.repository.is_empty() {
            chain.push(&raw.repository);
        }

        let rule = if raw.disabled {
            Rule::Group {
                patterns: Vec::new(),
            }
        } else if let Some(include) = &raw.include {
            Rule::Include(self.resolve_include(include, &chain)?)
        } else if let Some(pattern) = &raw.match_ {
            Rule::Match {
                name: scope_list(raw.name.as_deref()),
                regex: self.regex(pattern)?,
                captures: self.captures(raw.captures.as_ref(), &chain)?,
            }
        } else if let Some(begin) = &raw.begin {
            let (closer, closer_captures) = if let Some(pattern) = &raw.while_ {
                let closer = if regex::has_back_references(pattern) {
                    Closer::DynamicWhile(pattern.clone())
                } else {
                    Closer::While(self.regex(pattern)?)
                };
                (closer, raw.while_captures.as_ref().or(raw.captures.as_ref()))
            } else if let Some(pattern) = &raw.end {
                let closer = if regex::has_back_references(pattern) {
                    Closer::DynamicEnd(pattern.clone())
                } else {
                    Closer::End(self.regex(pattern)?)
                };
                (closer, raw.end_captures.as_ref().or(raw.captures.as_ref()))
            } else {
                (Closer::Never, None)
            };

            Rule::Block {
                name: scope_list(raw.name.as_deref()),
                content_name: scope_list(raw.content_name.as_deref()),
                begin: self.regex(begin)?,
                begin_captures: self.captures(
                    raw.begin_captures.as_ref().or(raw.captures.as_ref()),
                    &chain,
                )?,
                closer,
                closer_captures: self.captures(closer_captures, &chain)?,
                patterns: self.compile_list(&raw.patterns, &chain)?,
                apply_end_pattern_last: raw.apply_end_pattern_last,
            }
        } else {
            Rule::Group {
                patterns: self.compile_list(&raw.patterns, &chain)?,
            }
        };

        self.rules[id] = rule;
        Ok(id)
    }

    fn resolve_include(
        &mut self,
        include: &str,
        chain: &[&'g RawRepository],
    ) -> Result<Option<RuleId>, InitError> {
        if include == "$self" || include == "$base" || include == self.scope_name {
            return Ok(Some(ROOT));
        }

        // `source.x#key` naming this grammar looks in its top-level repository
        let (key, chain) = match include.split_once('#') {
            Some(("", key)) => (key, chain),
            Some((scope, key)) if scope == self.scope_name => (key, &chain[..chain.len().min(1)]),
            _ => {
                tracing::debug!(
                    "Grammar `{}`: external include `{}` is not available",
                    self.language,
                    include
                );
                return Ok(None);
            }
        };

        match chain.iter().rev().find_map(|repo| repo.get(key)) {
            Some(target) => self.compile_rule(target, chain).map(Some),
            None => {
                tracing::debug!(
                    "Grammar `{}`: repository has no entry `{}`",
                    self.language,
                    key
                );
                Ok(None)
            }
        }
    }

    /// Capture scopes, compiling nested `patterns` into a group rule
    fn captures(
        &mut self,
        captures: Option<&'g RawCaptures>,
        chain: &[&'g RawRepository],
    ) -> Result<CaptureScopes, InitError> {
        let Some(captures) = captures else {
            return Ok(Vec::new());
        };

        let mut out = Vec::new();
        for (index, capture) in captures {
            let Ok(index) = index.parse::<usize>() else {
                continue;
            };
            let scopes = scope_list(capture.name.as_deref());
            let patterns = if capture.patterns.is_empty() {
                None
            } else {
                let id = self.alloc();
                let patterns = self.compile_list(&capture.patterns, chain)?;
                self.rules[id] = Rule::Group { patterns };
                Some(id)
            };
            if !scopes.is_empty() || patterns.is_some() {
                out.push(Capture {
                    index,
                    scopes,
                    patterns,
                });
            }
        }
        out.sort_by_key(|capture| capture.index);
        Ok(out)
    }

    fn regex(&self, pattern: &str) -> Result<Pattern, InitError> {
        regex::compile(pattern).map_err(|source| InitError::Regex {
            lang: self.language.to_string(),
            pattern: pattern.to_string(),
            source,
        })
    }
}

fn scope_list(name: Option<&str>) -> Vec<String> {
    name.map(|n| n.split_whitespace().map(str::to_string).collect())
        .unwrap_or_default()
}

/// Patterns tried while `id` is the innermost rule on the stack
fn candidates_for(rules: &[Rule], id: RuleId) -> Vec<RuleId> {
    let patterns = match &rules[id] {
        Rule::Group { patterns } | Rule::Block { patterns, .. } => patterns.as_slice(),
        _ => return Vec::new(),
    };

    let mut out = Vec::new();
    let mut seen = HashSet::new();
    flatten(rules, patterns, &mut out, &mut seen);
    out
}

fn flatten(
    rules: &[Rule],
    patterns: &[RuleId],
    out: &mut Vec<RuleId>,
    seen: &mut HashSet<RuleId>,
) {
    for &id in patterns {
        match &rules[id] {
            Rule::Include(Some(target)) => {
                if seen.insert(id) {
                    flatten(rules, &[*target], out, seen);
                }
            }
            Rule::Include(None) => {}
            Rule::Group { patterns } => {
                if seen.insert(id) {
                    flatten(rules, patterns, out, seen);
                }
            }
            Rule::Match { .. } | Rule::Block { .. } => {
                if !out.contains(&id) {
                    out.push(id);
                }
            }
        }
    }
}
