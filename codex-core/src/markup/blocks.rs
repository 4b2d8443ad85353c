//! Line-oriented block segmentation for the preview dialect

use regex::Regex;
use std::sync::LazyLock;

use super::inline::{format_inline, InlineHtml};

static FOOTNOTE_DEF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[\^([^\]]+)\]:\s+(.*)$").unwrap());

/// One renderable unit of a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderBlock {
    Heading { level: u8, inline: InlineHtml },
    Paragraph(InlineHtml),
    ListItem(InlineHtml),
    /// Checked items are shown struck through
    TaskItem { checked: bool, inline: InlineHtml },
    Blockquote(InlineHtml),
    Table {
        header: Vec<InlineHtml>,
        rows: Vec<Vec<InlineHtml>>,
    },
    FootnoteBlock(Vec<FootnoteEntry>),
    /// Vertical rhythm for a blank source line
    Spacer,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FootnoteEntry {
    pub id: String,
    pub text: InlineHtml,
}

/// Output of [`render`]: blocks plus the footnote definitions, in the
/// order each id was first defined
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rendered {
    pub blocks: Vec<RenderBlock>,
    pub footnotes: Vec<(String, String)>,
}

impl Rendered {
    /// Definition text for a footnote id
    pub fn footnote(&self, id: &str) -> Option<&str> {
        self.footnotes
            .iter()
            .find(|(fid, _)| fid == id)
            .map(|(_, text)| text.as_str())
    }
}

/// Render a document. Malformed input degrades to literal text; this
/// never fails.
pub fn render(text: &str) -> Rendered {
    let mut footnotes: Vec<(String, String)> = Vec::new();

    let lines: Vec<&str> = text
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .filter(|line| match FOOTNOTE_DEF_RE.captures(line) {
            Some(caps) => {
                let id = caps[1].to_string();
                let body = caps[2].to_string();
                match footnotes.iter_mut().find(|(fid, _)| *fid == id) {
                    Some(existing) => existing.1 = body,
                    None => footnotes.push((id, body)),
                }
                false
            }
            None => true,
        })
        .collect();

    let mut blocks = Vec::new();
    let mut table: Vec<Vec<&str>> = Vec::new();

    for line in lines {
        let trimmed = line.trim();
        if trimmed.starts_with('|') && trimmed.ends_with('|') {
            table.push(split_cells(trimmed));
            continue;
        }
        flush_table(&mut table, &mut blocks);
        blocks.push(classify(line, trimmed));
    }
    flush_table(&mut table, &mut blocks);

    if !footnotes.is_empty() {
        let entries = footnotes
            .iter()
            .map(|(id, body)| FootnoteEntry {
                id: id.clone(),
                text: format_inline(body),
            })
            .collect();
        blocks.push(RenderBlock::FootnoteBlock(entries));
    }

    Rendered { blocks, footnotes }
}

fn classify(line: &str, trimmed: &str) -> RenderBlock {
    if let Some(rest) = line.strip_prefix("# ") {
        RenderBlock::Heading {
            level: 1,
            inline: format_inline(rest),
        }
    } else if let Some(rest) = line.strip_prefix("## ") {
        RenderBlock::Heading {
            level: 2,
            inline: format_inline(rest),
        }
    } else if let Some(item) = line.strip_prefix("* ").or_else(|| line.strip_prefix("- ")) {
        if let Some(rest) = item.strip_prefix("[ ] ") {
            RenderBlock::TaskItem {
                checked: false,
                inline: format_inline(rest),
            }
        } else if let Some(rest) = item.strip_prefix("[x] ") {
            RenderBlock::TaskItem {
                checked: true,
                inline: format_inline(rest),
            }
        } else {
            RenderBlock::ListItem(format_inline(item))
        }
    } else if let Some(rest) = line.strip_prefix("> ") {
        RenderBlock::Blockquote(format_inline(rest))
    } else if trimmed.is_empty() {
        RenderBlock::Spacer
    } else {
        RenderBlock::Paragraph(format_inline(line))
    }
}

/// Split a `| a | b |` row, dropping the empty pieces outside the pipes
fn split_cells(row: &str) -> Vec<&str> {
    let parts: Vec<&str> = row.split('|').collect();
    parts[1..parts.len() - 1].iter().map(|c| c.trim()).collect()
}

/// First buffered row is the header, the second is taken as the separator
/// and skipped unchecked, the rest are body rows.
fn flush_table(table: &mut Vec<Vec<&str>>, blocks: &mut Vec<RenderBlock>) {
    if table.is_empty() {
        return;
    }
    if table.len() < 2 {
        log::debug!("dropping single-row table");
        table.clear();
        return;
    }

    let format_row = |row: &Vec<&str>| row.iter().map(|c| format_inline(c)).collect::<Vec<_>>();
    let header = format_row(&table[0]);
    let rows = table.iter().skip(2).map(format_row).collect();
    blocks.push(RenderBlock::Table { header, rows });
    table.clear();
}
