//! Input handling and keybindings

use crate::app::{App, Focus, Modal, View};
use crate::assistant::AssistKind;
use anyhow::Result;
use codex_core::Format;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Result of handling input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Continue,
    Quit,
}

/// Handle a key event
pub fn handle_input(app: &mut App, key: KeyEvent) -> Result<Action> {
    // Messages last until the next keystroke
    if !matches!(key.code, KeyCode::Modifier(_)) && !app.assist_pending {
        app.clear_status_message();
    }

    if matches!(
        key,
        KeyEvent {
            code: KeyCode::Char('c'),
            modifiers: KeyModifiers::CONTROL,
            ..
        }
    ) {
        app.quit();
        return Ok(Action::Quit);
    }

    if app.modal.is_some() {
        handle_modal(app, key);
        return Ok(Action::Continue);
    }

    match app.view {
        View::Bookshelf => handle_bookshelf(app, key),
        View::Workspace => match app.focus {
            Focus::Sidebar => handle_sidebar(app, key),
            Focus::Editor => handle_editor(app, key),
        },
        View::Analytics => handle_analytics(app, key),
    }

    Ok(if app.should_quit {
        Action::Quit
    } else {
        Action::Continue
    })
}

fn handle_modal(app: &mut App, key: KeyEvent) {
    match app.modal.as_mut() {
        Some(Modal::Input { value, .. }) => match key.code {
            KeyCode::Enter => app.submit_modal(),
            KeyCode::Esc => app.cancel_modal(),
            KeyCode::Backspace => {
                value.pop();
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => value.push(c),
            _ => {}
        },
        Some(Modal::Confirm { .. }) => match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => app.submit_modal(),
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => app.cancel_modal(),
            _ => {}
        },
        None => {}
    }
}

fn handle_bookshelf(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.quit(),
        KeyCode::Char('j') | KeyCode::Down => app.shelf_next(),
        KeyCode::Char('k') | KeyCode::Up => app.shelf_prev(),
        KeyCode::Enter => app.open_book(app.shelf_selected),
        KeyCode::Char('n') => app.open_new_book_prompt(),
        KeyCode::Char('d') => app.request_delete_book(),
        KeyCode::Char('t') => app.toggle_theme(),
        KeyCode::Char('b') => app.backup_library(),
        KeyCode::Char('i') => app.open_import_prompt(),
        _ => {}
    }
}

fn handle_sidebar(app: &mut App, key: KeyEvent) {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        if key.code == KeyCode::Char('p') {
            app.toggle_preview();
        }
        return;
    }

    match key.code {
        KeyCode::Esc => app.close_book(),
        KeyCode::Char('j') | KeyCode::Down => app.select_next(),
        KeyCode::Char('k') | KeyCode::Up => app.select_prev(),
        KeyCode::Char('J') => app.move_segment(1),
        KeyCode::Char('K') => app.move_segment(-1),
        KeyCode::Enter => app.enter_editor(),
        KeyCode::Char('a') => app.add_chapter(),
        KeyCode::Char('D') => app.request_delete_segment(),
        KeyCode::Char('r') => app.request_rename(),
        KeyCode::Char('x') => app.export_book(),
        KeyCode::Char('A') => app.open_analytics(),
        KeyCode::Char('g') => app.request_assist(AssistKind::Continue),
        KeyCode::Char('s') => app.request_assist(AssistKind::Summarize),
        KeyCode::Char('y') => app.copy_segment(),
        KeyCode::Char('t') => app.toggle_theme(),
        KeyCode::Char('p') => app.toggle_preview(),
        KeyCode::PageDown => app.preview_scroll += 10,
        KeyCode::PageUp => app.preview_scroll = app.preview_scroll.saturating_sub(10),
        _ => {}
    }
}

fn handle_editor(app: &mut App, key: KeyEvent) {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        match key.code {
            KeyCode::Char('p') => app.toggle_preview(),
            KeyCode::Char('b') => app.apply_format(Format::Bold),
            KeyCode::Char('i') | KeyCode::Char('t') => app.apply_format(Format::Italic),
            KeyCode::Char('l') => app.apply_format(Format::Bullet),
            _ => {}
        }
        return;
    }

    let shift = key.modifiers.contains(KeyModifiers::SHIFT);
    match key.code {
        KeyCode::Esc => app.leave_editor(),
        KeyCode::Left | KeyCode::Right | KeyCode::Up | KeyCode::Down | KeyCode::Home | KeyCode::End => {
            if let Some(buffer) = app.buffer.as_mut() {
                buffer.set_selecting(shift);
                match key.code {
                    KeyCode::Left => buffer.move_left(),
                    KeyCode::Right => buffer.move_right(),
                    KeyCode::Up => buffer.move_up(),
                    KeyCode::Down => buffer.move_down(),
                    KeyCode::Home => buffer.move_home(),
                    _ => buffer.move_end(),
                }
            }
        }
        KeyCode::Enter => app.edit(|b| b.insert_char('\n')),
        KeyCode::Tab => app.edit(|b| b.insert_str("    ")),
        KeyCode::Backspace => app.edit(|b| b.backspace()),
        KeyCode::Delete => app.edit(|b| b.delete()),
        KeyCode::Char(c) => app.edit(|b| b.insert_char(c)),
        _ => {}
    }
}

fn handle_analytics(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Char('A') => app.close_analytics(),
        KeyCode::Char('q') => app.quit(),
        KeyCode::Char('t') => app.toggle_theme(),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use codex_core::{Config, LibraryStore, SegmentKind};
    use tempfile::TempDir;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    fn app(dir: &TempDir) -> anyhow::Result<App> {
        App::new(Config::default(), LibraryStore::new(dir.path()))
    }

    fn open_first_chapter(app: &mut App) {
        app.open_book(0);
        let id = app
            .book()
            .and_then(|b| b.segments.iter().find(|s| s.kind == SegmentKind::Chapter))
            .map(|s| s.id.clone());
        app.select_segment(id);
    }

    #[test]
    fn test_quit_from_bookshelf() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let mut app = app(&dir)?;

        assert_eq!(handle_input(&mut app, key(KeyCode::Char('q')))?, Action::Quit);
        assert!(app.should_quit);
        Ok(())
    }

    #[test]
    fn test_ctrl_c_quits_anywhere() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let mut app = app(&dir)?;
        app.open_book(0);
        app.enter_editor();

        assert_eq!(handle_input(&mut app, ctrl('c'))?, Action::Quit);
        Ok(())
    }

    #[test]
    fn test_new_book_prompt() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let mut app = app(&dir)?;

        handle_input(&mut app, key(KeyCode::Char('n')))?;
        for c in "Draft".chars() {
            handle_input(&mut app, key(KeyCode::Char(c)))?;
        }
        // Shelf keys are text while the prompt is open
        handle_input(&mut app, key(KeyCode::Char('q')))?;
        handle_input(&mut app, key(KeyCode::Backspace))?;
        handle_input(&mut app, key(KeyCode::Enter))?;

        assert!(app.modal.is_none());
        assert!(!app.should_quit);
        assert_eq!(app.books.last().map(|b| b.title.as_str()), Some("Draft"));
        Ok(())
    }

    #[test]
    fn test_delete_needs_confirmation() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let mut app = app(&dir)?;

        handle_input(&mut app, key(KeyCode::Char('d')))?;
        handle_input(&mut app, key(KeyCode::Char('n')))?;
        assert_eq!(app.books.len(), 1);

        handle_input(&mut app, key(KeyCode::Char('d')))?;
        handle_input(&mut app, key(KeyCode::Char('y')))?;
        assert!(app.books.is_empty());
        Ok(())
    }

    #[test]
    fn test_editor_typing_and_formatting() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let mut app = app(&dir)?;
        open_first_chapter(&mut app);
        handle_input(&mut app, key(KeyCode::Enter))?;
        assert_eq!(app.focus, Focus::Editor);

        for c in "hi".chars() {
            handle_input(&mut app, key(KeyCode::Char(c)))?;
        }
        handle_input(&mut app, ctrl('b'))?;
        let text = app.buffer.as_ref().map(|b| b.text()).unwrap_or_default();
        assert!(text.starts_with("hi****"));
        assert!(app.has_uncommitted());

        handle_input(&mut app, key(KeyCode::Esc))?;
        assert_eq!(app.focus, Focus::Sidebar);
        assert!(!app.has_uncommitted());
        Ok(())
    }

    #[test]
    fn test_shift_arrows_select() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let mut app = app(&dir)?;
        open_first_chapter(&mut app);
        app.enter_editor();

        let shift_right = KeyEvent::new(KeyCode::Right, KeyModifiers::SHIFT);
        handle_input(&mut app, shift_right)?;
        handle_input(&mut app, shift_right)?;
        let selection = app.buffer.as_ref().and_then(|b| b.selection());
        assert_eq!(selection, Some((0, 2)));

        handle_input(&mut app, key(KeyCode::Right))?;
        assert!(app.buffer.as_ref().and_then(|b| b.selection()).is_none());
        Ok(())
    }
}
