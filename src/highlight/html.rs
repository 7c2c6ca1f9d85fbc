//! HTML output in the layout Shiki produces
//!
//! ```text
//! <pre class="shiki github-dark" style="background-color:#24292e;color:#e1e4e8" tabindex="0"><code>
//! <span class="line"><span style="color:#79b8ff">1</span>…</span>
//! </code></pre>
//! ```
//! (without the line breaks around `<code>`; lines are joined with `\n`)

use super::ThemedToken;
use crate::theme::{Theme, TokenStyle};

/// Render themed lines as a `<pre class="shiki">` block
pub fn render_html(lines: &[Vec<ThemedToken>], theme: &Theme) -> String {
    let mut html = format!(
        r#"<pre class="shiki {}" style="background-color:{};color:{}" tabindex="0"><code>"#,
        escape_html(&theme.id),
        theme.background.to_css(),
        theme.foreground.to_css()
    );

    for (i, line) in lines.iter().enumerate() {
        if i > 0 {
            html.push('\n');
        }
        html.push_str(r#"<span class="line">"#);
        for token in line {
            html.push_str(r#"<span style=""#);
            html.push_str(&style_attr(&token.style));
            html.push_str(r#"">"#);
            html.push_str(&escape_html(&token.content));
            html.push_str("</span>");
        }
        html.push_str("</span>");
    }

    html.push_str("</code></pre>");
    html
}

fn style_attr(style: &TokenStyle) -> String {
    let mut css = format!("color:{}", style.foreground.to_css());
    if style.font_style.italic {
        css.push_str(";font-style:italic");
    }
    if style.font_style.bold {
        css.push_str(";font-weight:bold");
    }
    if style.font_style.underline {
        css.push_str(";text-decoration:underline");
    }
    css
}

/// Escape text for use in HTML element content or a quoted attribute
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
