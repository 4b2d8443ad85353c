//! Manuscript export

use anyhow::{Context, Result};
use std::path::Path;

use crate::model::Book;

/// Separator placed between segments in an exported manuscript
pub const SEGMENT_SEPARATOR: &str = "\n\n---\n\n";

/// All segment contents in book order, joined by a horizontal rule
pub fn export_markdown(book: &Book) -> String {
    book.full_text(SEGMENT_SEPARATOR)
}

/// File name for an export: the title with whitespace runs replaced by `_`
pub fn export_file_name(title: &str, extension: &str) -> String {
    let stem = title.split_whitespace().collect::<Vec<_>>().join("_");
    let stem = if stem.is_empty() { "untitled" } else { stem.as_str() };
    format!("{}.{}", stem, extension)
}

/// Full CommonMark rendering of the manuscript as a standalone HTML page
#[cfg(feature = "html")]
pub fn export_html(book: &Book) -> String {
    use pulldown_cmark::{html, Options, Parser};

    let markdown = export_markdown(book);
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_TASKLISTS);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let mut body = String::new();
    html::push_html(&mut body, Parser::new_ext(&markdown, options));

    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n</head>\n<body>\n{}</body>\n</html>\n",
        crate::markup::escape_html(&book.title),
        body
    )
}

/// Write an export to `path`
pub fn write_export(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    std::fs::write(path, contents)
        .with_context(|| format!("Failed to write export: {}", path.display()))?;
    log::debug!("exported {} bytes to {}", contents.len(), path.display());
    Ok(())
}
