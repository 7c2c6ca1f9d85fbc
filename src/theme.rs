//! Highlighting themes
//!
//! Provides YAML-based theming support with compile-time embedded themes
//! and user-defined themes from config directories.
//!
//! Theme loading priority:
//! 1. User config: `~/.config/sm-highlight/themes/{id}.yaml`
//! 2. Embedded: Built-in themes compiled into binary

use std::path::Path;

use serde::Deserialize;

// Embed theme YAML files at compile time
pub const GITHUB_DARK_YAML: &str = include_str!("../themes/github-dark.yaml");
pub const GITHUB_LIGHT_YAML: &str = include_str!("../themes/github-light.yaml");

/// A built-in theme entry
pub struct BuiltinTheme {
    /// Stable identifier for config (e.g. "github-dark")
    pub id: &'static str,
    /// Embedded YAML content
    pub yaml: &'static str,
}

/// Registry of all built-in themes
pub const BUILTIN_THEMES: &[BuiltinTheme] = &[
    BuiltinTheme {
        id: "github-dark",
        yaml: GITHUB_DARK_YAML,
    },
    BuiltinTheme {
        id: "github-light",
        yaml: GITHUB_LIGHT_YAML,
    },
];

/// Where the theme came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeSource {
    /// User-defined theme in ~/.config/sm-highlight/themes/
    User,
    /// Built-in theme embedded in binary
    Builtin,
}

/// Information about an available theme
#[derive(Debug, Clone)]
pub struct ThemeInfo {
    /// Stable identifier (e.g., "github-dark", "my-custom-theme")
    pub id: String,
    /// Display name from YAML (e.g., "GitHub Dark")
    pub name: String,
    /// Where this theme is loaded from
    pub source: ThemeSource,
}

/// Load a theme from a YAML file
pub fn from_file(id: &str, path: &Path) -> Result<Theme, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read theme file {}: {}", path.display(), e))?;
    Theme::from_yaml(id, &content)
}

/// Load theme by id with priority: user → builtin
pub fn load_theme(id: &str) -> Result<Theme, String> {
    if let Some(user_path) = crate::config_paths::theme_file(id) {
        if user_path.exists() {
            tracing::info!("Loading user theme from {}", user_path.display());
            return from_file(id, &user_path);
        }
    }

    tracing::debug!("Loading builtin theme: {}", id);
    Theme::from_builtin(id)
}

/// List all available themes from all sources
///
/// User themes override builtins with the same id.
pub fn list_available_themes() -> Vec<ThemeInfo> {
    let mut themes = Vec::new();
    let mut seen_ids = std::collections::HashSet::new();

    if let Some(user_dir) = crate::config_paths::themes_dir() {
        if let Ok(entries) = std::fs::read_dir(&user_dir) {
            for entry in entries.filter_map(|e| e.ok()) {
                let path = entry.path();
                if path
                    .extension()
                    .is_some_and(|ext| ext == "yaml" || ext == "yml")
                {
                    if let Some(id) = path.file_stem().and_then(|s| s.to_str()) {
                        if seen_ids.insert(id.to_string()) {
                            let name = from_file(id, &path)
                                .map(|t| t.name)
                                .unwrap_or_else(|_| id.to_string());
                            themes.push(ThemeInfo {
                                id: id.to_string(),
                                name,
                                source: ThemeSource::User,
                            });
                        }
                    }
                }
            }
        }
    }

    for builtin in BUILTIN_THEMES {
        if seen_ids.insert(builtin.id.to_string()) {
            let name = Theme::from_yaml(builtin.id, builtin.yaml)
                .map(|t| t.name)
                .unwrap_or_else(|_| builtin.id.to_string());
            themes.push(ThemeInfo {
                id: builtin.id.to_string(),
                name,
                source: ThemeSource::Builtin,
            });
        }
    }

    themes
}

/// RGBA color (0-255 per channel)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    /// Create a new color from RGB values (alpha defaults to 255)
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Parse from "#RRGGBB" or "#RRGGBBAA" hex string
    pub fn from_hex(s: &str) -> Result<Self, String> {
        let s = s.trim_start_matches('#');
        if !s.is_ascii() {
            return Err(format!("Invalid color format: {}", s));
        }
        match s.len() {
            6 => Ok(Color {
                r: u8::from_str_radix(&s[0..2], 16).map_err(|e| e.to_string())?,
                g: u8::from_str_radix(&s[2..4], 16).map_err(|e| e.to_string())?,
                b: u8::from_str_radix(&s[4..6], 16).map_err(|e| e.to_string())?,
                a: 255,
            }),
            8 => Ok(Color {
                r: u8::from_str_radix(&s[0..2], 16).map_err(|e| e.to_string())?,
                g: u8::from_str_radix(&s[2..4], 16).map_err(|e| e.to_string())?,
                b: u8::from_str_radix(&s[4..6], 16).map_err(|e| e.to_string())?,
                a: u8::from_str_radix(&s[6..8], 16).map_err(|e| e.to_string())?,
            }),
            _ => Err(format!("Invalid color format: {}", s)),
        }
    }

    /// CSS hex notation, alpha only when not opaque
    pub fn to_css(&self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

/// Font style flags from a theme rule
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct FontStyle {
    pub italic: bool,
    pub bold: bool,
    pub underline: bool,
}

impl FontStyle {
    /// Parse a space separated list such as "italic bold"
    pub fn parse(s: &str) -> Self {
        let mut style = FontStyle::default();
        for word in s.split_whitespace() {
            match word {
                "italic" => style.italic = true,
                "bold" => style.bold = true,
                "underline" => style.underline = true,
                other => tracing::debug!("Ignoring unknown font style `{}`", other),
            }
        }
        style
    }

    pub fn is_plain(&self) -> bool {
        !self.italic && !self.bold && !self.underline
    }
}

/// Raw theme data as parsed from YAML
#[derive(Debug, Clone, Deserialize)]
pub struct ThemeData {
    pub version: u32,
    pub name: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub colors: ThemeColorsData,
    #[serde(default)]
    pub token_colors: Vec<TokenColorData>,
}

/// Page-wide colors (raw strings from YAML)
#[derive(Debug, Clone, Deserialize)]
pub struct ThemeColorsData {
    pub background: String,
    pub foreground: String,
}

/// One scope rule (raw strings from YAML)
#[derive(Debug, Clone, Deserialize)]
pub struct TokenColorData {
    pub scope: Vec<String>,
    #[serde(default)]
    pub foreground: Option<String>,
    #[serde(default)]
    pub font_style: Option<String>,
}

/// A scope selector such as `string` or `markup.heading entity.name`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeSelector {
    /// Descendant path, outermost first; the last part matches the token scope
    parts: Vec<String>,
}

/// Resolved rule: a selector and the style it applies
#[derive(Debug, Clone)]
pub struct TokenColorRule {
    pub selector: ScopeSelector,
    pub foreground: Option<Color>,
    pub font_style: Option<FontStyle>,
}

/// Style applied to a run of text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenStyle {
    pub foreground: Color,
    pub font_style: FontStyle,
}

/// Resolved theme with parsed colors
#[derive(Debug, Clone)]
pub struct Theme {
    pub id: String,
    pub name: String,
    pub background: Color,
    pub foreground: Color,
    pub rules: Vec<TokenColorRule>,
}

/// `true` when `selector` equals `scope` or is a dot-separated prefix of it
fn scope_matches(selector: &str, scope: &str) -> bool {
    scope == selector
        || (scope.len() > selector.len()
            && scope.starts_with(selector)
            && scope.as_bytes()[selector.len()] == b'.')
}

impl ScopeSelector {
    pub fn parse(s: &str) -> Self {
        Self {
            parts: s.split_whitespace().map(str::to_string).collect(),
        }
    }

    /// Match against the scope at `stack[index]`, with ancestors `stack[..index]`.
    ///
    /// Returns a specificity score; higher wins.
    fn matches(&self, stack: &[String], index: usize) -> Option<(usize, usize)> {
        let (last, ancestors) = self.parts.split_last()?;
        if !scope_matches(last, &stack[index]) {
            return None;
        }

        let mut remaining = &stack[..index];
        for part in ancestors.iter().rev() {
            let pos = remaining.iter().rposition(|s| scope_matches(part, s))?;
            remaining = &remaining[..pos];
        }

        let depth = last.split('.').count();
        Some((depth, self.parts.len()))
    }
}

impl Theme {
    /// Load theme from YAML string
    pub fn from_yaml(id: &str, yaml: &str) -> Result<Self, String> {
        let data: ThemeData =
            serde_yaml::from_str(yaml).map_err(|e| format!("YAML parse error: {}", e))?;
        Self::from_data(id, data)
    }

    /// Load a built-in theme by id
    pub fn from_builtin(id: &str) -> Result<Self, String> {
        let entry = BUILTIN_THEMES
            .iter()
            .find(|t| t.id == id)
            .ok_or_else(|| format!("Unknown theme id: {}", id))?;
        Theme::from_yaml(entry.id, entry.yaml)
    }

    /// Convert raw theme data to resolved theme
    pub fn from_data(id: &str, data: ThemeData) -> Result<Self, String> {
        let rules = data
            .token_colors
            .iter()
            .map(|rule| {
                let foreground = rule
                    .foreground
                    .as_ref()
                    .map(|s| Color::from_hex(s))
                    .transpose()?;
                let font_style = rule.font_style.as_deref().map(FontStyle::parse);
                Ok(rule.scope.iter().map(move |scope| TokenColorRule {
                    selector: ScopeSelector::parse(scope),
                    foreground,
                    font_style,
                }))
            })
            .collect::<Result<Vec<_>, String>>()?
            .into_iter()
            .flatten()
            .collect();

        Ok(Theme {
            id: id.to_string(),
            name: data.name,
            background: Color::from_hex(&data.colors.background)?,
            foreground: Color::from_hex(&data.colors.foreground)?,
            rules,
        })
    }

    /// Resolve the style for a scope stack (outermost first)
    ///
    /// Foreground and font style are resolved separately: each comes from the
    /// innermost scope with a matching rule that sets it. Among rules matching
    /// one scope the most specific selector wins, later rules winning ties.
    pub fn style_for(&self, scopes: &[String]) -> TokenStyle {
        let mut foreground = None;
        let mut font_style = None;

        for index in (0..scopes.len()).rev() {
            if foreground.is_none() {
                foreground = self
                    .best_rule(scopes, index, |rule| rule.foreground.is_some())
                    .and_then(|rule| rule.foreground);
            }
            if font_style.is_none() {
                font_style = self
                    .best_rule(scopes, index, |rule| rule.font_style.is_some())
                    .and_then(|rule| rule.font_style);
            }
            if foreground.is_some() && font_style.is_some() {
                break;
            }
        }

        TokenStyle {
            foreground: foreground.unwrap_or(self.foreground),
            font_style: font_style.unwrap_or_default(),
        }
    }

    fn best_rule(
        &self,
        scopes: &[String],
        index: usize,
        sets: impl Fn(&TokenColorRule) -> bool,
    ) -> Option<&TokenColorRule> {
        self.rules
            .iter()
            .filter(|&rule| sets(rule))
            .filter_map(|rule| rule.selector.matches(scopes, index).map(|s| (s, rule)))
            .max_by_key(|(score, _)| *score)
            .map(|(_, rule)| rule)
    }

    pub fn default_style(&self) -> TokenStyle {
        TokenStyle {
            foreground: self.foreground,
            font_style: FontStyle::default(),
        }
    }
}
