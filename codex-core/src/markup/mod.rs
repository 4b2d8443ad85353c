//! Preview renderer for the manuscript Markdown dialect
//!
//! Supports `#`/`##` headings, bold and italic, bullet and task lists,
//! blockquotes, pipe tables and footnotes. Anything else is a paragraph.

pub mod blocks;
pub mod inline;

pub use blocks::{render, FootnoteEntry, RenderBlock, Rendered};
pub use inline::{escape_html, format_inline, InlineHtml, InlineRun};
