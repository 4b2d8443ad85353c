//! UI rendering

use crate::app::{App, Focus, Modal, SaveState, View};
use crate::dashboard;
use crate::render::{render_lines, RenderKey};
use codex_core::config::ThemeVariant;
use codex_core::markup::render;
use codex_core::{stats, toc, SegmentBuffer, SegmentKind};
use ratatui::{
    layout::{Constraint, Direction, Layout, Position, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};
use unicode_width::UnicodeWidthChar;

/// Draw the UI
pub fn draw(frame: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),    // Main content area
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    match app.view {
        View::Bookshelf => render_bookshelf(frame, app, chunks[0]),
        View::Workspace => render_workspace(frame, app, chunks[0]),
        View::Analytics => dashboard::render_dashboard(frame, app, chunks[0]),
    }

    render_status_bar(frame, app, chunks[1]);

    if app.modal.is_some() {
        render_modal(frame, app);
    }
}

/// Group digits in threes, e.g. `12,345`
pub fn format_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

fn border_style(app: &App, focused: bool) -> Style {
    Style::default().fg(if focused {
        app.theme.border_focused
    } else {
        app.theme.border
    })
}

fn render_bookshelf(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(area);

    let target = app.config.goals.default_target_words;
    let items: Vec<ListItem> = app
        .books
        .iter()
        .map(|book| {
            let words = book.total_words();
            let percent = stats::book_projection(book, target, 1).percent_complete;
            ListItem::new(Line::from(vec![
                Span::styled(format!(" {:<40}", book.title), app.theme.base),
                Span::styled(format!("{:>10} words", format_thousands(words)), app.theme.muted),
                Span::styled(format!("{:>6.0}%", percent.min(100.0)), app.theme.muted),
                Span::styled(format!("   {} segments", book.segments.len()), app.theme.muted),
            ]))
        })
        .collect();

    let title = format!("Bookshelf ({})", app.books.len());
    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style(app, true))
                .title(title),
        )
        .highlight_style(app.theme.selected)
        .style(app.theme.base);

    if app.books.is_empty() {
        let empty = Paragraph::new("No books yet. Press n to start one.")
            .style(app.theme.muted)
            .block(Block::default().borders(Borders::ALL).title("Bookshelf"));
        frame.render_widget(empty, chunks[0]);
    } else {
        let mut state = ListState::default().with_selected(Some(app.shelf_selected));
        frame.render_stateful_widget(list, chunks[0], &mut state);
    }

    let help = " Enter open  n new  d delete  t theme  b backup  i import  q quit";
    frame.render_widget(Paragraph::new(help).style(app.theme.muted), chunks[1]);
}

fn render_workspace(frame: &mut Frame, app: &mut App, area: Rect) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(app.config.sidebar.width), // Sidebar
            Constraint::Min(1),                           // Editor or preview
        ])
        .split(area);

    render_sidebar(frame, app, columns[0]);

    let main = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(3)])
        .split(columns[1]);

    if app.show_preview {
        render_preview(frame, app, main[0]);
    } else {
        render_editor(frame, app, main[0]);
    }
    render_inspector(frame, app, main[1]);
}

fn render_sidebar(frame: &mut Frame, app: &App, area: Rect) {
    let Some(book) = app.book() else { return };

    let mut lines: Vec<Line> = Vec::new();
    let mut selected_line = 0;
    for (matter, group) in book.segments_by_matter() {
        if !lines.is_empty() {
            lines.push(Line::default());
        }
        lines.push(Line::from(Span::styled(
            matter.label().to_uppercase(),
            app.theme.group_header,
        )));
        for segment in group {
            let active = app.active_segment.as_deref() == Some(segment.id.as_str());
            if active {
                selected_line = lines.len();
            }
            let style = if active {
                app.theme.selected
            } else {
                app.theme.base
            };
            lines.push(Line::from(Span::styled(format!(" {}", segment.title), style)));
        }
    }

    let height = area.height.saturating_sub(2) as usize;
    let scroll = (selected_line + 1).saturating_sub(height);
    let focused = app.focus == Focus::Sidebar;

    let sidebar = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style(app, focused))
                .title(book.title.as_str()),
        )
        .scroll((scroll as u16, 0))
        .style(app.theme.base);

    frame.render_widget(sidebar, area);
}

/// A wrapped row of a buffer line: char offset into the buffer and text
struct VisualRow {
    start: usize,
    text: String,
}

/// Break a line into rows no wider than `width` display columns
fn wrap_line(line: &str, line_start: usize, width: usize) -> Vec<VisualRow> {
    let mut rows = Vec::new();
    let mut current = String::new();
    let mut current_width = 0;
    let mut start = line_start;
    let mut offset = line_start;

    for c in line.chars() {
        let w = c.width().unwrap_or(0);
        if current_width + w > width && !current.is_empty() {
            rows.push(VisualRow {
                start,
                text: std::mem::take(&mut current),
            });
            start = offset;
            current_width = 0;
        }
        current.push(c);
        current_width += w;
        offset += 1;
    }
    rows.push(VisualRow {
        start,
        text: current,
    });
    rows
}

fn visual_rows(buffer: &SegmentBuffer, width: usize) -> Vec<VisualRow> {
    let mut rows = Vec::new();
    let mut line_start = 0;
    for idx in 0..buffer.line_count() {
        let line = buffer.line(idx);
        let len = line.chars().count();
        rows.extend(wrap_line(&line, line_start, width.max(1)));
        // Skip the newline
        line_start += len + 1;
    }
    rows
}

fn render_editor(frame: &mut Frame, app: &mut App, area: Rect) {
    let focused = app.focus == Focus::Editor;
    let title = app
        .segment()
        .map(|s| s.title.clone())
        .unwrap_or_else(|| "No segment".to_string());
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style(app, focused))
        .title(title);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let Some(buffer) = app.buffer.as_ref() else { return };
    let width = inner.width as usize;
    let height = inner.height as usize;
    let rows = visual_rows(buffer, width);

    let cursor = buffer.cursor();
    let cursor_row = rows
        .iter()
        .rposition(|r| r.start <= cursor)
        .unwrap_or(0);

    let mut scroll = app.editor_scroll;
    if cursor_row < scroll {
        scroll = cursor_row;
    } else if height > 0 && cursor_row >= scroll + height {
        scroll = cursor_row + 1 - height;
    }
    app.editor_scroll = scroll;

    let Some(buffer) = app.buffer.as_ref() else { return };
    let selection = buffer.selection();
    let selected = Style::default().bg(app.theme.selection_bg);

    let lines: Vec<Line> = rows
        .iter()
        .skip(scroll)
        .take(height)
        .map(|row| {
            let Some((sel_start, sel_end)) = selection else {
                return Line::from(Span::styled(row.text.clone(), app.theme.base));
            };
            let spans: Vec<Span> = row
                .text
                .chars()
                .enumerate()
                .map(|(i, c)| {
                    let pos = row.start + i;
                    let style = if pos >= sel_start && pos < sel_end {
                        app.theme.base.patch(selected)
                    } else {
                        app.theme.base
                    };
                    Span::styled(c.to_string(), style)
                })
                .collect();
            Line::from(spans)
        })
        .collect();

    frame.render_widget(Paragraph::new(lines).style(app.theme.base), inner);

    if focused {
        if let Some(row) = rows.get(cursor_row) {
            let col: usize = row
                .text
                .chars()
                .take(cursor - row.start)
                .map(|c| c.width().unwrap_or(0))
                .sum();
            let x = inner.x + col.min(width.saturating_sub(1)) as u16;
            let y = inner.y + (cursor_row - scroll) as u16;
            frame.set_cursor_position(Position::new(x, y));
        }
    }
}

/// Source text shown in the preview for the active segment
fn preview_source(app: &App) -> Option<(String, u64)> {
    let book = app.book()?;
    let segment = app.segment()?;
    let buffer = app.buffer.as_ref()?;

    match segment.kind {
        SegmentKind::Toc => Some((toc::contents(book), app.library_rev())),
        SegmentKind::Poster => {
            let mut text = format!("# {}\n\n", book.title);
            if let Some(cover) = &book.cover_image {
                text.push_str(&format!("> Cover image: {}\n\n", cover));
            }
            text.push_str(&buffer.text());
            Some((text, buffer.rev))
        }
        _ => Some((buffer.text(), buffer.rev)),
    }
}

fn render_preview(frame: &mut Frame, app: &mut App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style(app, app.focus == Focus::Editor))
        .title("Preview");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let (Some((source, rev)), Some(id)) = (preview_source(app), app.active_segment.clone()) else {
        return;
    };

    let key = RenderKey {
        segment_id: id,
        rev,
        width: inner.width,
        theme: app.theme_variant,
    };
    let theme = app.theme.clone();
    let lines = app
        .preview_cache
        .get_or_render(key, || render_lines(&render(&source), &theme, inner.width))
        .clone();

    let paragraph = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .scroll((app.preview_scroll as u16, 0))
        .style(app.theme.base);
    frame.render_widget(paragraph, inner);
}

fn render_inspector(frame: &mut Frame, app: &App, area: Rect) {
    let (Some(book), Some(segment)) = (app.book(), app.segment()) else {
        frame.render_widget(Block::default().borders(Borders::ALL), area);
        return;
    };

    let backlinks: Vec<&str> = book
        .backlinks(&segment.id)
        .iter()
        .map(|s| s.title.as_str())
        .collect();
    let links = if backlinks.is_empty() {
        "none".to_string()
    } else {
        backlinks.join(", ")
    };

    let mut spans = vec![
        Span::styled(format!("v{}", segment.version_count), app.theme.muted),
        Span::styled(
            format!(
                "  edited {}",
                segment
                    .last_modified
                    .with_timezone(&chrono::Local)
                    .format("%Y-%m-%d %H:%M")
            ),
            app.theme.muted,
        ),
        Span::styled(format!("  backlinks: {}", links), app.theme.muted),
    ];
    if let Some(summary) = &app.summary {
        spans.push(Span::styled(format!("  summary: {}", summary), app.theme.base));
    }

    let inspector = Paragraph::new(Line::from(spans))
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).border_style(border_style(app, false)));
    frame.render_widget(inspector, area);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let mut parts = vec![" CODEX".to_string()];

    if let Some(book) = app.book() {
        parts.push(book.title.clone());
    }
    if let Some(segment) = app.segment() {
        parts.push(segment.kind.label().to_uppercase());
        let words = app
            .buffer
            .as_ref()
            .map(|b| stats::word_count(&b.text()))
            .unwrap_or(0);
        parts.push(format!("{} words", format_thousands(words as u64)));
    }

    let save = match app.save_state {
        SaveState::Idle => None,
        SaveState::Saving => Some("SAVING"),
        SaveState::Saved => Some("SAVED"),
        SaveState::Failed => Some("SAVE FAILED"),
    };
    parts.extend(save.map(str::to_string));

    parts.push(
        match app.theme_variant {
            ThemeVariant::Dark => "DARK",
            ThemeVariant::Light => "LIGHT",
        }
        .to_string(),
    );

    if let Some(message) = &app.status_message {
        parts.push(message.clone());
    }

    let status = Paragraph::new(Line::from(vec![Span::styled(
        parts.join("  │  "),
        Style::default()
            .fg(app.theme.status_bar_fg)
            .bg(app.theme.status_bar_bg)
            .add_modifier(Modifier::BOLD),
    )]))
    .style(Style::default().bg(app.theme.status_bar_bg));

    frame.render_widget(status, area);
}

/// Centered rectangle of the given size, clamped to `area`
fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

fn render_modal(frame: &mut Frame, app: &App) {
    let Some(modal) = &app.modal else { return };
    let area = centered(frame.area(), 60, 5);

    let (title, lines) = match modal {
        Modal::Input { purpose, value } => {
            let title = match purpose {
                crate::app::InputPurpose::NewBook => "New book title",
                crate::app::InputPurpose::RenameSegment(_) => "Rename segment",
                crate::app::InputPurpose::ImportPath => "Import library from",
            };
            let lines = vec![
                Line::from(vec![
                    Span::styled(value.clone(), app.theme.base),
                    Span::styled("_", app.theme.base.add_modifier(Modifier::SLOW_BLINK)),
                ]),
                Line::from(Span::styled("Enter confirm  Esc cancel", app.theme.muted)),
            ];
            (title, lines)
        }
        Modal::Confirm { message, .. } => (
            "Confirm",
            vec![
                Line::from(Span::styled(message.clone(), app.theme.base)),
                Line::from(Span::styled("y yes  n no", app.theme.muted)),
            ],
        ),
    };

    frame.render_widget(Clear, area);
    let popup = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style(app, true))
                .title(title),
        )
        .style(app.theme.base);
    frame.render_widget(popup, area);
}
