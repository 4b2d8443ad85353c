//! Theme system for dark/light modes

use codex_core::config::ThemeVariant;
use ratatui::style::{Color, Modifier, Style};

/// Theme definition
#[derive(Clone, Debug)]
pub struct Theme {
    pub base: Style,
    pub muted: Style,
    pub heading: [Style; 2],
    pub quote: Style,
    pub list_marker: Style,
    pub task_done: Style,
    pub footnote: Style,
    pub table_border: Style,
    pub border: Color,
    pub border_focused: Color,
    pub selected: Style,
    pub group_header: Style,
    pub selection_bg: Color,
    pub accent: Color,
    pub warning: Style,
    pub status_bar_fg: Color,
    pub status_bar_bg: Color,
    /// Heatmap intensity colors, level 0 to 4
    pub heat: [Color; 5],
}

impl Theme {
    /// Create a theme for the given variant
    pub fn for_variant(variant: ThemeVariant) -> Self {
        match variant {
            ThemeVariant::Dark => Self::dark(),
            ThemeVariant::Light => Self::light(),
        }
    }

    /// Dark theme (default)
    pub fn dark() -> Self {
        Self {
            base: Style::default().fg(Color::White),
            muted: Style::default().fg(Color::DarkGray),
            heading: [
                Style::default()
                    .fg(Color::LightBlue)
                    .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
                Style::default()
                    .fg(Color::LightCyan)
                    .add_modifier(Modifier::BOLD),
            ],
            quote: Style::default().fg(Color::Gray).add_modifier(Modifier::ITALIC),
            list_marker: Style::default().fg(Color::LightMagenta),
            task_done: Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::CROSSED_OUT),
            footnote: Style::default().fg(Color::LightMagenta),
            table_border: Style::default().fg(Color::DarkGray),
            border: Color::DarkGray,
            border_focused: Color::LightBlue,
            selected: Style::default()
                .fg(Color::Black)
                .bg(Color::LightBlue)
                .add_modifier(Modifier::BOLD),
            group_header: Style::default()
                .fg(Color::Gray)
                .add_modifier(Modifier::BOLD),
            selection_bg: Color::Rgb(60, 60, 90),
            accent: Color::LightBlue,
            warning: Style::default().fg(Color::LightRed),
            status_bar_fg: Color::Black,
            status_bar_bg: Color::LightBlue,
            heat: [
                Color::Rgb(40, 40, 40),
                Color::Rgb(49, 46, 129),
                Color::Rgb(67, 56, 202),
                Color::Rgb(99, 102, 241),
                Color::Rgb(165, 180, 252),
            ],
        }
    }

    /// Light theme
    pub fn light() -> Self {
        Self {
            base: Style::default().fg(Color::Black),
            muted: Style::default().fg(Color::Gray),
            heading: [
                Style::default()
                    .fg(Color::Blue)
                    .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ],
            quote: Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
            list_marker: Style::default().fg(Color::Magenta),
            task_done: Style::default()
                .fg(Color::Gray)
                .add_modifier(Modifier::CROSSED_OUT),
            footnote: Style::default().fg(Color::Magenta),
            table_border: Style::default().fg(Color::Gray),
            border: Color::Gray,
            border_focused: Color::Blue,
            selected: Style::default()
                .fg(Color::White)
                .bg(Color::Blue)
                .add_modifier(Modifier::BOLD),
            group_header: Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
            selection_bg: Color::Rgb(200, 210, 250),
            accent: Color::Blue,
            warning: Style::default().fg(Color::Red),
            status_bar_fg: Color::White,
            status_bar_bg: Color::Blue,
            heat: [
                Color::Rgb(235, 235, 240),
                Color::Rgb(224, 231, 255),
                Color::Rgb(165, 180, 252),
                Color::Rgb(99, 102, 241),
                Color::Rgb(67, 56, 202),
            ],
        }
    }
}
