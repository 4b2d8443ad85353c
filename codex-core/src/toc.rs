//! Generated table of contents for a book

use crate::model::{Book, Matter, SegmentKind};

/// Contents page text in the preview dialect: a heading followed by one
/// list item per body and back matter segment, in book order.
pub fn contents(book: &Book) -> String {
    let mut out = String::from("# Table of Contents\n");

    let entries: Vec<String> = book
        .segments
        .iter()
        .filter(|s| s.kind.matter() != Matter::Front)
        .map(|s| match s.kind {
            SegmentKind::Part => format!("* **{}**", entry_title(&s.title)),
            _ => format!("* {}", entry_title(&s.title)),
        })
        .collect();

    if entries.is_empty() {
        out.push_str("\n*No chapters yet.*");
    } else {
        out.push('\n');
        out.push_str(&entries.join("\n"));
    }
    out
}

fn entry_title(title: &str) -> &str {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        "Untitled"
    } else {
        trimmed
    }
}
