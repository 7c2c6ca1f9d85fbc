//! Page style - CSS colors for rendered Markdown pages

use crate::theme::{Color, Theme};

/// Page colors (CSS-formatted)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageStyle {
    pub background: String,
    pub text: String,
    pub heading: String,
    pub link: String,
    pub code_background: String,
    pub border: String,
    pub accent: String,
    pub muted: String,
}

impl PageStyle {
    /// Derive page colors from the highlighting theme so prose and code agree
    pub fn from_theme(theme: &Theme) -> Self {
        let scope = |s: &str| theme.style_for(&[s.to_string()]).foreground.to_css();

        Self {
            background: theme.background.to_css(),
            text: theme.foreground.to_css(),
            heading: scope("keyword"),
            link: scope("string"),
            code_background: mix(&theme.background, &theme.foreground, 0.06).to_css(),
            border: mix(&theme.background, &theme.foreground, 0.2).to_css(),
            accent: scope("entity.name.function"),
            muted: scope("comment"),
        }
    }
}

impl Default for PageStyle {
    fn default() -> Self {
        Self {
            background: "#24292e".to_string(),
            text: "#e1e4e8".to_string(),
            heading: "#f97583".to_string(),
            link: "#9ecbff".to_string(),
            code_background: "#2f353a".to_string(),
            border: "#444d56".to_string(),
            accent: "#b392f0".to_string(),
            muted: "#6a737d".to_string(),
        }
    }
}

/// Linear blend from `base` towards `toward` by `amount` (0.0..=1.0)
fn mix(base: &Color, toward: &Color, amount: f32) -> Color {
    let channel = |a: u8, b: u8| {
        let v = a as f32 + (b as f32 - a as f32) * amount;
        v.round().clamp(0.0, 255.0) as u8
    };
    Color::rgb(
        channel(base.r, toward.r),
        channel(base.g, toward.g),
        channel(base.b, toward.b),
    )
}
