//! Analytics dashboard for the open book

use crate::app::App;
use crate::theme::Theme;
use crate::ui::format_thousands;
use chrono::{NaiveDate, Utc};
use codex_core::stats::{
    activity_heatmap, format_duration, heat_level, session_ledger, DashboardStats, Eta, HeatCell,
};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Cell, Gauge, Paragraph, Row, Sparkline, Table},
    Frame,
};

const LEDGER_ROWS: usize = 8;
const HEATMAP_WEEKS: usize = 20;

pub fn render_dashboard(frame: &mut Frame, app: &App, area: Rect) {
    let Some(book) = app.book() else { return };
    let stats = DashboardStats::compute(
        book,
        app.config.goals.default_target_words,
        app.config.goals.burn_window_days,
        &chrono::Local,
    );
    let theme = &app.theme;

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),  // Metric cards
            Constraint::Length(1),  // Churn warning
            Constraint::Length(7),  // Timeline and goal
            Constraint::Length(10), // Balance and hourly
            Constraint::Min(9),     // Heatmap and ledger
        ])
        .split(area);

    render_cards(frame, &stats, theme, rows[0]);

    let warning = if stats.high_churn() {
        Line::from(Span::styled(
            " High churn: lots of time for few net words. Consider drafting forward before revising.",
            theme.warning,
        ))
    } else {
        Line::from(Span::styled(" Esc back  t theme  q quit", theme.muted))
    };
    frame.render_widget(Paragraph::new(warning), rows[1]);

    let middle = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(rows[2]);
    render_timeline(frame, &stats, theme, middle[0]);
    render_goal(frame, &stats, theme, middle[1]);

    let charts = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[3]);
    render_balance(frame, &stats, theme, charts[0]);
    render_hourly(frame, &stats, theme, charts[1]);

    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(HEATMAP_WEEKS as u16 * 2 + 2), Constraint::Min(1)])
        .split(rows[4]);
    let heatmap = activity_heatmap(&book.sessions, Utc::now().date_naive(), HEATMAP_WEEKS);
    render_heatmap(frame, &heatmap, theme, bottom[0]);
    render_ledger(frame, app, theme, bottom[1]);
}

fn panel<'a>(title: &'a str, theme: &Theme) -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border))
        .title(title)
}

fn render_cards(frame: &mut Frame, stats: &DashboardStats, theme: &Theme, area: Rect) {
    let cards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 4); 4])
        .split(area);

    let value = Style::default().fg(theme.accent).add_modifier(Modifier::BOLD);
    let entries = [
        ("Total words", format_thousands(stats.total_words), String::new()),
        (
            "Lexical diversity",
            format!("{:.0}%", stats.diversity * 100.0),
            "unique / total".to_string(),
        ),
        (
            "Avg sentence",
            format!("{:.1}", stats.avg_sentence),
            "words".to_string(),
        ),
        (
            "Time invested",
            format_duration(stats.total_seconds),
            format!("{:.0} words/hour", stats.words_per_hour),
        ),
    ];

    for (i, (title, main, detail)) in entries.into_iter().enumerate() {
        let card = Paragraph::new(vec![
            Line::from(Span::styled(main, value)),
            Line::from(Span::styled(detail, theme.muted)),
        ])
        .block(panel(title, theme));
        frame.render_widget(card, cards[i]);
    }
}

fn render_timeline(frame: &mut Frame, stats: &DashboardStats, theme: &Theme, area: Rect) {
    let data: Vec<u64> = stats.timeline.iter().map(|p| p.cumulative).collect();
    let title = match (stats.timeline.first(), stats.timeline.last()) {
        (Some(first), Some(last)) => format!("Word count {} to {}", first.date, last.date),
        _ => "Word count".to_string(),
    };

    let sparkline = Sparkline::default()
        .block(panel(&title, theme))
        .data(data)
        .style(Style::default().fg(theme.accent));
    frame.render_widget(sparkline, area);
}

fn render_goal(frame: &mut Frame, stats: &DashboardStats, theme: &Theme, area: Rect) {
    let projection = &stats.projection;
    let eta = match projection.days_to_finish {
        Eta::Days(_) => format!("ETA {}", projection.days_to_finish),
        Eta::Unbounded => "ETA ∞".to_string(),
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(1)])
        .split(area);

    let gauge = Gauge::default()
        .block(panel("Goal", theme))
        .gauge_style(Style::default().fg(theme.accent))
        .ratio((projection.percent_complete / 100.0).clamp(0.0, 1.0))
        .label(format!(
            "{} / {} ({:.0}%)",
            format_thousands(projection.current_words),
            format_thousands(projection.target),
            projection.percent_complete
        ));
    frame.render_widget(gauge, chunks[0]);

    let detail = Paragraph::new(vec![
        Line::from(Span::styled(eta, theme.base.add_modifier(Modifier::BOLD))),
        Line::from(Span::styled(
            format!(
                "{:.0} words/day, {} to go",
                projection.avg_per_day,
                format_thousands(projection.remaining)
            ),
            theme.muted,
        )),
    ]);
    frame.render_widget(detail, chunks[1]);
}

/// Shorten a label to `max` chars
fn short_label(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let mut out: String = text.chars().take(max.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}

fn render_balance(frame: &mut Frame, stats: &DashboardStats, theme: &Theme, area: Rect) {
    let bars: Vec<Bar> = stats
        .balance
        .iter()
        .filter(|b| b.words > 0)
        .map(|b| {
            let style = if b.edit_density > 100.0 {
                theme.warning
            } else {
                Style::default().fg(theme.accent)
            };
            Bar::default()
                .label(Line::from(short_label(&b.title, 12)))
                .value(b.words as u64)
                .text_value(format!("{} ({:.0}%)", b.words, b.edit_density))
                .style(style)
        })
        .collect();

    let chart = BarChart::default()
        .block(panel("Segment balance (edit density)", theme))
        .direction(Direction::Horizontal)
        .bar_width(1)
        .bar_gap(0)
        .data(BarGroup::default().bars(&bars));
    frame.render_widget(chart, area);
}

fn render_hourly(frame: &mut Frame, stats: &DashboardStats, theme: &Theme, area: Rect) {
    let labels: Vec<String> = (0..24).map(|h| format!("{:02}", h)).collect();
    let data: Vec<(&str, u64)> = labels
        .iter()
        .zip(stats.hourly.iter())
        .map(|(label, &net)| (label.as_str(), net.max(0) as u64))
        .collect();

    let chart = BarChart::default()
        .block(panel("Words by hour", theme))
        .bar_width(2)
        .bar_gap(0)
        .bar_style(Style::default().fg(theme.accent))
        .value_style(theme.muted)
        .data(data.as_slice());
    frame.render_widget(chart, area);
}

/// Rows of the heatmap: one line per weekday slot, one cell per week
fn heatmap_lines(columns: &[Vec<HeatCell>], theme: &Theme) -> Vec<Line<'static>> {
    (0..7)
        .map(|day| {
            let spans: Vec<Span> = columns
                .iter()
                .filter_map(|week| week.get(day))
                .map(|cell| {
                    let color = theme.heat[usize::from(heat_level(cell.activity))];
                    Span::styled("■ ", Style::default().fg(color))
                })
                .collect();
            Line::from(spans)
        })
        .collect()
}

fn render_heatmap(frame: &mut Frame, columns: &[Vec<HeatCell>], theme: &Theme, area: Rect) {
    let range = match (columns.first().and_then(|w| w.last()), columns.last().and_then(|w| w.first())) {
        (Some(oldest), Some(newest)) => heatmap_title(oldest.date, newest.date),
        _ => "Consistency".to_string(),
    };
    let heatmap = Paragraph::new(heatmap_lines(columns, theme)).block(panel(&range, theme));
    frame.render_widget(heatmap, area);
}

fn heatmap_title(oldest: NaiveDate, newest: NaiveDate) -> String {
    format!("Consistency {} to {}", oldest.format("%b %d"), newest.format("%b %d"))
}

fn render_ledger(frame: &mut Frame, app: &App, theme: &Theme, area: Rect) {
    let Some(book) = app.book() else { return };
    let ledger = session_ledger(&book.sessions, LEDGER_ROWS);

    let header = Row::new(vec!["Started", "Net", "Minutes", "Words/h"])
        .style(theme.base.add_modifier(Modifier::BOLD));
    let rows: Vec<Row> = ledger
        .iter()
        .map(|entry| {
            let net_style = if entry.net < 0 { theme.warning } else { theme.base };
            Row::new(vec![
                Cell::from(
                    entry
                        .start_time
                        .with_timezone(&chrono::Local)
                        .format("%Y-%m-%d %H:%M")
                        .to_string(),
                ),
                Cell::from(format!("{:+}", entry.net)).style(net_style),
                Cell::from(entry.minutes.to_string()),
                Cell::from(entry.velocity.to_string()),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(17),
            Constraint::Length(8),
            Constraint::Length(8),
            Constraint::Length(8),
        ],
    )
    .header(header)
    .style(theme.base)
    .block(panel("Writing ledger", theme));

    if ledger.is_empty() {
        let empty = Paragraph::new("No sessions recorded yet.")
            .style(theme.muted)
            .block(panel("Writing ledger", theme));
        frame.render_widget(empty, area);
    } else {
        frame.render_widget(table, area);
    }
}
