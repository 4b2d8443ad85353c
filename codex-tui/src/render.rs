//! Preview rendering and cache

use codex_core::config::ThemeVariant;
use codex_core::markup::{FootnoteEntry, InlineHtml, RenderBlock, Rendered};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use unicode_width::UnicodeWidthStr;

use crate::theme::Theme;

/// Key for render cache
#[derive(Hash, PartialEq, Eq, Clone, Debug)]
pub struct RenderKey {
    pub segment_id: String,
    pub rev: u64,
    pub width: u16,
    pub theme: ThemeVariant,
}

/// LRU cache for rendered previews
pub struct RendererCache {
    cache: lru::LruCache<RenderKey, Vec<Line<'static>>>,
}

impl RendererCache {
    pub fn new() -> Self {
        Self {
            cache: lru::LruCache::new(std::num::NonZeroUsize::new(32).unwrap()),
        }
    }

    pub fn get(&mut self, key: &RenderKey) -> Option<&Vec<Line<'static>>> {
        self.cache.get(key)
    }

    pub fn put(&mut self, key: RenderKey, lines: Vec<Line<'static>>) {
        self.cache.put(key, lines);
    }

    /// Cached lines for `key`, rendering with `render` on a miss
    pub fn get_or_render(
        &mut self,
        key: RenderKey,
        render: impl FnOnce() -> Vec<Line<'static>>,
    ) -> &Vec<Line<'static>> {
        let (segment_id, rev) = (key.segment_id.clone(), key.rev);
        self.cache.get_or_insert(key, || {
            log::debug!("preview cache miss for {} rev {}", segment_id, rev);
            render()
        })
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

impl Default for RendererCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Styled spans for an inline payload
pub fn inline_spans(inline: &InlineHtml, base: Style, theme: &Theme) -> Vec<Span<'static>> {
    inline
        .runs()
        .into_iter()
        .map(|run| {
            let mut style = if run.footnote { theme.footnote } else { base };
            if run.strong {
                style = style.add_modifier(Modifier::BOLD);
            }
            if run.emphasis {
                style = style.add_modifier(Modifier::ITALIC);
            }
            Span::styled(run.text, style)
        })
        .collect()
}

/// Turn rendered blocks into terminal lines. `width` bounds table layout and
/// the footnote rule; paragraphs are wrapped by the widget.
pub fn render_lines(rendered: &Rendered, theme: &Theme, width: u16) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    for block in &rendered.blocks {
        match block {
            RenderBlock::Heading { level, inline } => {
                let style = theme.heading[usize::from(level.saturating_sub(1)).min(1)];
                lines.push(Line::from(inline_spans(inline, style, theme)));
            }
            RenderBlock::Paragraph(inline) => {
                lines.push(Line::from(inline_spans(inline, theme.base, theme)));
            }
            RenderBlock::ListItem(inline) => {
                let mut spans = vec![Span::styled("  • ", theme.list_marker)];
                spans.extend(inline_spans(inline, theme.base, theme));
                lines.push(Line::from(spans));
            }
            RenderBlock::TaskItem { checked, inline } => {
                let (marker, style) = if *checked {
                    ("  [x] ", theme.task_done)
                } else {
                    ("  [ ] ", theme.base)
                };
                let mut spans = vec![Span::styled(marker, theme.list_marker)];
                spans.extend(inline_spans(inline, style, theme));
                lines.push(Line::from(spans));
            }
            RenderBlock::Blockquote(inline) => {
                let mut spans = vec![Span::styled("▎ ", theme.list_marker)];
                spans.extend(inline_spans(inline, theme.quote, theme));
                lines.push(Line::from(spans));
            }
            RenderBlock::Table { header, rows } => {
                lines.extend(table_lines(header, rows, theme, width));
            }
            RenderBlock::FootnoteBlock(entries) => {
                lines.extend(footnote_lines(entries, theme, width));
            }
            RenderBlock::Spacer => lines.push(Line::default()),
        }
    }

    lines
}

fn table_lines(
    header: &[InlineHtml],
    rows: &[Vec<InlineHtml>],
    theme: &Theme,
    width: u16,
) -> Vec<Line<'static>> {
    let columns = rows.iter().map(Vec::len).chain([header.len()]).max().unwrap_or(0);
    if columns == 0 {
        return Vec::new();
    }

    let mut widths = vec![1usize; columns];
    for row in std::iter::once(header).chain(rows.iter().map(Vec::as_slice)) {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.plain_text().width());
        }
    }

    // Shrink the widest columns until the table fits
    let budget = usize::from(width).saturating_sub(3 * columns + 1).max(columns);
    while widths.iter().sum::<usize>() > budget {
        let Some(widest) = widths.iter_mut().max() else { break };
        if *widest <= 1 {
            break;
        }
        *widest -= 1;
    }

    let border = theme.table_border;
    let row_line = |cells: &[InlineHtml], bold: bool| -> Line<'static> {
        let mut spans = vec![Span::styled("│", border)];
        for (i, w) in widths.iter().enumerate() {
            let text = cells.get(i).map(|c| c.plain_text()).unwrap_or_default();
            let text = fit(&text, *w);
            let pad = w.saturating_sub(text.width());
            let style = if bold {
                theme.base.add_modifier(Modifier::BOLD)
            } else {
                theme.base
            };
            spans.push(Span::styled(format!(" {}{} ", text, " ".repeat(pad)), style));
            spans.push(Span::styled("│", border));
        }
        Line::from(spans)
    };

    let rule = |left: &str, mid: &str, right: &str| -> Line<'static> {
        let inner: Vec<String> = widths.iter().map(|w| "─".repeat(w + 2)).collect();
        Line::from(Span::styled(
            format!("{}{}{}", left, inner.join(mid), right),
            border,
        ))
    };

    let mut lines = vec![rule("┌", "┬", "┐"), row_line(header, true), rule("├", "┼", "┤")];
    lines.extend(rows.iter().map(|row| row_line(row, false)));
    lines.push(rule("└", "┴", "┘"));
    lines
}

/// Truncate to a display width, marking the cut with an ellipsis
fn fit(text: &str, width: usize) -> String {
    if text.width() <= width {
        return text.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = unicode_width::UnicodeWidthChar::width(c).unwrap_or(0);
        if used + w + 1 > width {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('…');
    out
}

fn footnote_lines(entries: &[FootnoteEntry], theme: &Theme, width: u16) -> Vec<Line<'static>> {
    let rule_width = usize::from(width).clamp(3, 24);
    let mut lines = vec![
        Line::default(),
        Line::from(Span::styled("─".repeat(rule_width), theme.muted)),
    ];

    for entry in entries {
        let mut spans = vec![Span::styled(format!("[{}] ", entry.id), theme.footnote)];
        spans.extend(inline_spans(&entry.text, theme.muted, theme));
        lines.push(Line::from(spans));
    }
    lines
}
