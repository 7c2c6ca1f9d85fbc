//! Markdown to HTML page renderer using pulldown-cmark

use pulldown_cmark::{html, CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};

use super::PageStyle;
use crate::highlight::escape_html;

/// Convert Markdown to a complete HTML document with styling
///
/// Fenced code blocks whose info string starts with one of `languages` are
/// emitted as `<pre class="{fence_class}">` with their raw text escaped, so a
/// later highlight pass can find them. Other fences keep the default
/// `<pre><code>` rendering.
pub fn markdown_to_page(
    markdown: &str,
    title: &str,
    style: &PageStyle,
    fence_class: &str,
    languages: &[&str],
) -> String {
    let options = Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS;

    let parser = Parser::new_ext(markdown, options);
    let languages = languages.iter().map(|l| l.to_string()).collect();
    let events = mark_code_fences(parser, fence_class.to_string(), languages);

    let mut body = String::new();
    html::push_html(&mut body, events);

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>{}</title>
    <style>{}</style>
</head>
<body>
    <div id="content">{}</div>
</body>
</html>"#,
        escape_html(title),
        generate_css(style),
        body
    )
}

/// Text of the first level-one heading, if any
pub fn page_title(markdown: &str) -> Option<String> {
    let mut in_title = false;
    let mut title = String::new();

    for event in Parser::new(markdown) {
        match event {
            Event::Start(Tag::Heading {
                level: HeadingLevel::H1,
                ..
            }) => in_title = true,
            Event::End(TagEnd::Heading(HeadingLevel::H1)) if in_title => {
                return Some(title.trim().to_string());
            }
            Event::Text(text) | Event::Code(text) if in_title => title.push_str(&text),
            _ => {}
        }
    }
    None
}

/// Replace highlight-target fences with a single raw `<pre>` event
fn mark_code_fences<'a>(
    parser: Parser<'a>,
    fence_class: String,
    languages: Vec<String>,
) -> impl Iterator<Item = Event<'a>> {
    // Some(text) while inside a target fence
    let mut pending: Option<String> = None;

    parser.filter_map(move |event| match event {
        Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(ref info)))
            if is_target_fence(info, &languages) =>
        {
            pending = Some(String::new());
            None
        }
        Event::Text(text) if pending.is_some() => {
            if let Some(code) = pending.as_mut() {
                code.push_str(&text);
            }
            None
        }
        Event::End(TagEnd::CodeBlock) if pending.is_some() => {
            let code = pending.take().unwrap_or_default();
            Some(Event::Html(
                format!(
                    "<pre class=\"{}\">{}</pre>\n",
                    escape_html(&fence_class),
                    escape_html(&code)
                )
                .into(),
            ))
        }
        other => Some(other),
    })
}

fn is_target_fence(info: &str, languages: &[String]) -> bool {
    info.split_whitespace()
        .next()
        .is_some_and(|lang| languages.iter().any(|l| l.eq_ignore_ascii_case(lang)))
}

/// Generate CSS from page colors
fn generate_css(style: &PageStyle) -> String {
    format!(
        r#"
* {{
    box-sizing: border-box;
}}

body {{
    font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Helvetica, Arial, sans-serif;
    font-size: 16px;
    line-height: 1.6;
    color: {text};
    background: {background};
    padding: 20px;
    max-width: 860px;
    margin: 0 auto;
}}

h1, h2, h3, h4, h5, h6 {{
    color: {heading};
    margin-top: 24px;
    margin-bottom: 16px;
    font-weight: 600;
    line-height: 1.25;
}}

h1, h2 {{
    border-bottom: 1px solid {border};
    padding-bottom: 0.3em;
}}

p {{
    margin-top: 0;
    margin-bottom: 16px;
}}

code {{
    background: {code_background};
    padding: 0.2em 0.4em;
    border-radius: 3px;
    font-family: "SF Mono", "Fira Code", Consolas, "Liberation Mono", Menlo, Courier, monospace;
    font-size: 0.9em;
}}

pre {{
    background: {code_background};
    padding: 16px;
    border-radius: 6px;
    overflow-x: auto;
    margin-top: 0;
    margin-bottom: 16px;
    font-family: "SF Mono", "Fira Code", Consolas, "Liberation Mono", Menlo, Courier, monospace;
}}

pre code, pre.shiki code {{
    background: none;
    padding: 0;
    font-size: 0.875em;
    line-height: 1.45;
}}

pre.sm > pre.shiki {{
    margin: -16px;
    padding: 16px;
}}

blockquote {{
    border-left: 4px solid {accent};
    margin: 0 0 16px 0;
    padding: 0 16px;
    color: {muted};
}}

a {{
    color: {link};
    text-decoration: none;
}}

a:hover {{
    text-decoration: underline;
}}

table {{
    border-collapse: collapse;
    margin-bottom: 16px;
}}

th, td {{
    padding: 6px 13px;
    border: 1px solid {border};
}}

.task-list-item {{
    list-style-type: none;
}}

del {{
    color: {muted};
}}
"#,
        text = style.text,
        background = style.background,
        heading = style.heading,
        link = style.link,
        code_background = style.code_background,
        border = style.border,
        accent = style.accent,
        muted = style.muted,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const LANGS: &[&str] = &["sm", "samarium"];

    fn render(md: &str) -> String {
        markdown_to_page(md, "Test", &PageStyle::default(), "sm", LANGS)
    }

    #[test]
    fn test_markdown_to_page_basic() {
        let html = render("# Hello\n\nWorld");
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>Test</title>"));
        assert!(html.contains("<h1>Hello</h1>"));
        assert!(html.contains("<p>World</p>"));
    }

    #[test]
    fn test_samarium_fence_becomes_target() {
        let html = render("```sm\na: <-- 1 < 2;\n```\n\n```samarium\n1 + 1\n```");
        assert!(html.contains("<pre class=\"sm\">a: &lt;-- 1 &lt; 2;\n</pre>"));
        assert!(html.contains("<pre class=\"sm\">1 + 1\n</pre>"));
        assert!(!html.contains("language-sm"));
    }

    #[test]
    fn test_other_fences_keep_default_rendering() {
        let html = render("```rust\nfn main() {}\n```");
        assert!(html.contains("<pre><code class=\"language-rust\">fn main() {}"));
        assert!(!html.contains("<pre class=\"sm\">"));
    }

    #[test]
    fn test_tables_enabled() {
        let html = render("| A | B |\n|---|---|\n| 1 | 2 |");
        assert!(html.contains("<table>"));
        assert!(html.contains("<td>"));
    }

    #[test]
    fn test_page_title() {
        assert_eq!(
            page_title("intro\n\n# The `Samarium` Guide\n\n# Second").as_deref(),
            Some("The Samarium Guide")
        );
        assert_eq!(page_title("no heading"), None);
    }
}
