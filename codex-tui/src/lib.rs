//! Codex TUI - Terminal user interface for the manuscript workspace
//!
//! This crate contains all ratatui/crossterm integration:
//! - App state and the editing session
//! - Event loop and input handling
//! - Preview rendering, sidebar and status bar
//! - Analytics dashboard
//! - Autosave and assistant workers

pub mod app;
pub mod assistant;
pub mod autosave;
pub mod dashboard;
pub mod debounce;
pub mod input;
pub mod render;
pub mod terminal;
pub mod theme;
pub mod ui;

use anyhow::{Context, Result};
use crossterm::event::{Event, KeyEventKind};
use std::time::{Duration, Instant};

// Re-export main types
pub use app::App;

/// Run the TUI application
pub fn run(mut app: App) -> Result<()> {
    let mut terminal = terminal::init().context("Failed to initialize terminal")?;

    let result = run_loop(&mut terminal, &mut app);

    // Always restore terminal, even if run_loop fails
    terminal::restore().context("Failed to restore terminal")?;

    // Flush edits and the final session before reporting loop errors
    let shutdown = app.shutdown().context("Failed to save library on exit");
    result.and(shutdown)
}

fn run_loop(terminal: &mut terminal::Tui, app: &mut App) -> Result<()> {
    loop {
        terminal
            .draw(|frame| ui::draw(frame, app))
            .context("Failed to draw frame")?;

        if app.should_quit {
            break;
        }

        if crossterm::event::poll(Duration::from_millis(100)).context("Failed to poll events")? {
            if let Event::Key(key) = crossterm::event::read().context("Failed to read event")? {
                // Only handle key press events, ignore release
                if key.kind == KeyEventKind::Press {
                    input::handle_input(app, key)?;
                }
            }
        }

        // Debounced commits, autosave outcomes and assistant replies
        app.tick(Instant::now());
    }

    Ok(())
}
