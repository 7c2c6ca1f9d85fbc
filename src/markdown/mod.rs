//! Markdown documentation pages
//!
//! Renders Markdown sources to standalone HTML documents whose fenced
//! Samarium blocks become `<pre class="sm">` highlight targets.

mod renderer;
mod style;

pub use renderer::{markdown_to_page, page_title};
pub use style::PageStyle;
