//! Application state

use anyhow::{Context, Result};
use chrono::Utc;
use codex_core::assist::append_continuation;
use codex_core::config::ThemeVariant;
use codex_core::export::{export_file_name, export_markdown, write_export};
use codex_core::library::{backup_file_name, read_backup, write_backup};
use codex_core::{
    factory, tracking, Book, Config, Format, LibraryStore, Segment, SegmentBuffer, SegmentKind,
    SessionTracker,
};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::assistant::{self, AssistKind, AssistReply, AssistRequest, AssistantWorker};
use crate::autosave::{AutosaveWorker, SaveOutcome, SaveRequest};
use crate::debounce::Debouncer;
use crate::render::RendererCache;
use crate::theme::Theme;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Bookshelf,
    Workspace,
    Analytics,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Sidebar,
    Editor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveState {
    Idle,
    Saving,
    Saved,
    Failed,
}

/// What a text prompt is collecting
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputPurpose {
    NewBook,
    RenameSegment(String),
    ImportPath,
}

/// What a yes/no prompt confirms
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmPurpose {
    DeleteBook(String),
    DeleteSegment(String),
    ReplaceLibrary(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Modal {
    Input { purpose: InputPurpose, value: String },
    Confirm { purpose: ConfirmPurpose, message: String },
}

/// Main application state
pub struct App {
    pub config: Config,
    pub store: LibraryStore,
    pub books: Vec<Book>,
    pub view: View,
    pub focus: Focus,
    pub theme_variant: ThemeVariant,
    pub theme: Theme,
    pub shelf_selected: usize,
    pub active_book: Option<usize>,
    pub active_segment: Option<String>,
    pub buffer: Option<SegmentBuffer>,
    pub show_preview: bool,
    pub editor_scroll: usize,
    pub preview_scroll: usize,
    pub modal: Option<Modal>,
    pub status_message: Option<String>,
    pub save_state: SaveState,
    pub summary: Option<String>,
    pub assist_pending: bool,
    pub export_dir: PathBuf,
    pub preview_cache: RendererCache,
    pub should_quit: bool,
    commit_debounce: Debouncer,
    tracker: SessionTracker,
    autosave: AutosaveWorker,
    assistant: AssistantWorker,
    library_rev: u64,
}

impl App {
    /// Create a new application instance over the library in `store`
    pub fn new(config: Config, store: LibraryStore) -> Result<Self> {
        let books = store.load_books().context("Failed to load library")?;
        let theme_variant = store.load_theme().unwrap_or(config.theme);
        let autosave = AutosaveWorker::spawn(
            store.clone(),
            Duration::from_millis(config.editor.autosave_ms),
        );
        let assistant = AssistantWorker::spawn(assistant::from_config(&config.assistant));
        let tracker = SessionTracker::new(config.editor.idle_threshold_secs);
        let export_dir = store.dir().join("exports");

        Ok(Self {
            config,
            store,
            books,
            view: View::Bookshelf,
            focus: Focus::Sidebar,
            theme_variant,
            theme: Theme::for_variant(theme_variant),
            shelf_selected: 0,
            active_book: None,
            active_segment: None,
            buffer: None,
            show_preview: false,
            editor_scroll: 0,
            preview_scroll: 0,
            modal: None,
            status_message: None,
            save_state: SaveState::Idle,
            summary: None,
            assist_pending: false,
            export_dir,
            preview_cache: RendererCache::new(),
            should_quit: false,
            commit_debounce: Debouncer::new(),
            tracker,
            autosave,
            assistant,
            library_rev: 0,
        })
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    pub fn set_status_message(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
    }

    pub fn clear_status_message(&mut self) {
        self.status_message = None;
    }

    pub fn book(&self) -> Option<&Book> {
        self.active_book.and_then(|idx| self.books.get(idx))
    }

    fn book_mut(&mut self) -> Option<&mut Book> {
        self.active_book.and_then(|idx| self.books.get_mut(idx))
    }

    pub fn segment(&self) -> Option<&Segment> {
        let id = self.active_segment.as_deref()?;
        self.book()?.segment(id)
    }

    /// Segment ids in sidebar order: front, body, then back matter
    pub fn sidebar_ids(&self) -> Vec<String> {
        self.book()
            .map(|book| {
                book.segments_by_matter()
                    .iter()
                    .flat_map(|(_, group)| group.iter().map(|s| s.id.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    // Persistence

    /// Bumped on every library change
    pub fn library_rev(&self) -> u64 {
        self.library_rev
    }

    /// Queue the current library for the autosave worker
    pub fn schedule_save(&mut self) {
        self.library_rev += 1;
        self.autosave.request_save(SaveRequest {
            rev: self.library_rev,
            books: self.books.clone(),
        });
        self.save_state = SaveState::Saving;
    }

    /// Periodic work: debounced commits, save outcomes, assistant replies
    pub fn tick(&mut self, now: Instant) {
        let window = Duration::from_millis(self.config.editor.commit_debounce_ms);
        if self.commit_debounce.check_ready(now, window) {
            self.commit_buffer();
        }

        while let Some(outcome) = self.autosave.try_recv_outcome() {
            self.apply_save_outcome(outcome);
        }

        while let Some(reply) = self.assistant.try_recv_reply() {
            self.apply_assist_reply(reply);
        }
    }

    fn apply_save_outcome(&mut self, outcome: SaveOutcome) {
        match outcome {
            SaveOutcome::Saved { rev } if rev == self.library_rev => {
                self.save_state = SaveState::Saved;
            }
            SaveOutcome::Saved { .. } => {}
            SaveOutcome::Failed { error, .. } => {
                self.save_state = SaveState::Failed;
                self.set_status_message(format!("Save failed: {}", error));
            }
        }
    }

    /// Commit buffered edits, finish the session and write the library
    /// synchronously. Called on exit.
    pub fn shutdown(&mut self) -> Result<()> {
        self.commit_buffer();
        self.finish_session();
        self.autosave.shutdown();
        self.store.save_books(&self.books)?;
        self.save_state = SaveState::Saved;
        Ok(())
    }

    pub fn toggle_theme(&mut self) {
        self.theme_variant = self.theme_variant.toggled();
        self.theme = Theme::for_variant(self.theme_variant);
        if let Err(e) = self.store.save_theme(self.theme_variant) {
            log::error!("failed to save theme: {:#}", e);
            self.set_status_message(format!("Could not save theme: {}", e));
        }
    }

    // Bookshelf

    pub fn shelf_next(&mut self) {
        if self.shelf_selected + 1 < self.books.len() {
            self.shelf_selected += 1;
        }
    }

    pub fn shelf_prev(&mut self) {
        self.shelf_selected = self.shelf_selected.saturating_sub(1);
    }

    /// Add a book from the template and select it
    pub fn create_book(&mut self, title: &str) {
        let title = title.trim();
        if title.is_empty() {
            return;
        }
        self.books.push(factory::new_book(title));
        self.shelf_selected = self.books.len() - 1;
        self.schedule_save();
        log::info!("created book {:?}", title);
    }

    pub fn delete_book(&mut self, book_id: &str) {
        let before = self.books.len();
        self.books.retain(|b| b.id != book_id);
        if self.books.len() == before {
            return;
        }
        self.active_book = None;
        self.shelf_selected = self.shelf_selected.min(self.books.len().saturating_sub(1));
        self.schedule_save();
    }

    pub fn open_book(&mut self, idx: usize) {
        if idx >= self.books.len() {
            return;
        }
        self.active_book = Some(idx);
        self.view = View::Workspace;
        self.focus = Focus::Sidebar;
        self.summary = None;
        let first = self.sidebar_ids().into_iter().next();
        self.select_segment(first);
    }

    /// Leave the workspace for the bookshelf
    pub fn close_book(&mut self) {
        self.commit_buffer();
        self.finish_session();
        self.buffer = None;
        self.active_segment = None;
        if let Some(idx) = self.active_book.take() {
            self.shelf_selected = idx;
        }
        self.view = View::Bookshelf;
    }

    /// Write a backup of the whole library to the export directory
    pub fn backup_library(&mut self) {
        let path = self.export_dir.join(backup_file_name(Utc::now().date_naive()));
        let result = std::fs::create_dir_all(&self.export_dir)
            .context("Failed to create export directory")
            .and_then(|_| write_backup(&self.books, &path));
        match result {
            Ok(()) => self.set_status_message(format!("Backup written to {}", path.display())),
            Err(e) => self.set_status_message(format!("Backup failed: {:#}", e)),
        }
    }

    /// Ask to replace the library with a backup file
    pub fn request_import(&mut self, path: &str) {
        let path = PathBuf::from(path.trim());
        if !path.is_file() {
            self.set_status_message(format!("No such file: {}", path.display()));
            return;
        }
        self.modal = Some(Modal::Confirm {
            message: "Importing a library will replace your current one. Continue?".to_string(),
            purpose: ConfirmPurpose::ReplaceLibrary(path),
        });
    }

    pub fn import_library(&mut self, path: &Path) {
        match read_backup(path) {
            Ok(books) => {
                log::info!("imported {} books from {}", books.len(), path.display());
                self.books = books;
                self.shelf_selected = 0;
                self.active_book = None;
                self.schedule_save();
                self.set_status_message("Library imported");
            }
            Err(e) => self.set_status_message(format!("Import failed: {:#}", e)),
        }
    }

    // Workspace

    /// Make `id` the active segment, committing and closing out the previous one
    pub fn select_segment(&mut self, id: Option<String>) {
        if id.is_some() && id == self.active_segment {
            return;
        }
        self.commit_buffer();
        self.finish_session();
        self.summary = None;
        self.editor_scroll = 0;
        self.preview_scroll = 0;

        self.active_segment = id;
        self.buffer = self
            .segment()
            .map(|s| SegmentBuffer::new(s.id.clone(), &s.content));
        if let Some(segment) = self.segment() {
            let (id, content) = (segment.id.clone(), segment.content.clone());
            self.tracker.start(&id, Utc::now(), &content);
        }
    }

    fn select_offset(&mut self, delta: isize) {
        let ids = self.sidebar_ids();
        if ids.is_empty() {
            return;
        }
        let current = self
            .active_segment
            .as_ref()
            .and_then(|id| ids.iter().position(|i| i == id))
            .unwrap_or(0);
        let next = (current as isize + delta).clamp(0, ids.len() as isize - 1) as usize;
        self.select_segment(Some(ids[next].clone()));
    }

    pub fn select_next(&mut self) {
        self.select_offset(1);
    }

    pub fn select_prev(&mut self) {
        self.select_offset(-1);
    }

    pub fn add_chapter(&mut self) {
        let Some(book) = self.book_mut() else { return };
        let id = book.add_chapter();
        self.schedule_save();
        self.select_segment(Some(id));
    }

    /// Ask to delete the active segment
    pub fn request_delete_segment(&mut self) {
        if let Some(segment) = self.segment() {
            self.modal = Some(Modal::Confirm {
                message: format!("Delete \"{}\"?", segment.title),
                purpose: ConfirmPurpose::DeleteSegment(segment.id.clone()),
            });
        }
    }

    pub fn delete_segment(&mut self, id: &str) {
        let ids = self.sidebar_ids();
        let pos = ids.iter().position(|i| i == id);
        let was_active = self.active_segment.as_deref() == Some(id);
        if was_active {
            self.commit_buffer();
            self.finish_session();
            self.buffer = None;
            self.active_segment = None;
        }

        let Some(book) = self.book_mut() else { return };
        if book.delete_segment(id).is_none() {
            return;
        }
        self.schedule_save();

        if was_active {
            let ids = self.sidebar_ids();
            let next = pos.map(|p| p.min(ids.len().saturating_sub(1)));
            self.select_segment(next.and_then(|p| ids.get(p).cloned()));
        }
    }

    /// Move the active segment up or down within its matter group
    pub fn move_segment(&mut self, delta: isize) {
        let Some(id) = self.active_segment.clone() else { return };
        let Some(book) = self.book() else { return };
        let Some(kind) = book.segment(&id).map(|s| s.kind) else { return };

        let group: Vec<&str> = book
            .segments
            .iter()
            .filter(|s| s.kind.matter() == kind.matter())
            .map(|s| s.id.as_str())
            .collect();
        let Some(pos) = group.iter().position(|g| *g == id) else { return };
        let target = pos as isize + delta;
        if target < 0 || target as usize >= group.len() {
            return;
        }
        let neighbor = group[target as usize];
        let from = book.segments.iter().position(|s| s.id == id);
        let to = book.segments.iter().position(|s| s.id == neighbor);

        if let (Some(from), Some(to)) = (from, to) {
            let offset = to as isize - from as isize;
            if let Some(book) = self.book_mut() {
                if book.move_segment(&id, offset) {
                    self.schedule_save();
                }
            }
        }
    }

    pub fn request_rename(&mut self) {
        if let Some(segment) = self.segment() {
            self.modal = Some(Modal::Input {
                purpose: InputPurpose::RenameSegment(segment.id.clone()),
                value: segment.title.clone(),
            });
        }
    }

    pub fn rename_segment(&mut self, id: &str, title: &str) {
        let title = title.trim();
        if title.is_empty() {
            return;
        }
        self.commit_buffer();
        let Some(book) = self.book_mut() else { return };
        let Some(content) = book.segment(id).map(|s| s.content.clone()) else { return };
        book.update_segment(id, &content, title);
        self.schedule_save();
    }

    pub fn enter_editor(&mut self) {
        if self.buffer.is_some() {
            self.focus = Focus::Editor;
        }
    }

    pub fn leave_editor(&mut self) {
        self.commit_buffer();
        self.focus = Focus::Sidebar;
    }

    pub fn toggle_preview(&mut self) {
        self.commit_buffer();
        self.show_preview = !self.show_preview;
        self.preview_scroll = 0;
    }

    pub fn open_analytics(&mut self) {
        if self.book().is_some() {
            self.commit_buffer();
            self.view = View::Analytics;
        }
    }

    pub fn close_analytics(&mut self) {
        self.view = View::Workspace;
    }

    /// Export the open book as Markdown (and HTML when available)
    pub fn export_book(&mut self) {
        self.commit_buffer();
        let Some(book) = self.book() else { return };
        let path = self.export_dir.join(export_file_name(&book.title, "md"));
        let markdown = export_markdown(book);

        #[cfg(feature = "html")]
        let html = Some((
            self.export_dir.join(export_file_name(&book.title, "html")),
            codex_core::export::export_html(book),
        ));
        #[cfg(not(feature = "html"))]
        let html: Option<(PathBuf, String)> = None;

        let result = write_export(&path, &markdown).and_then(|_| match &html {
            Some((html_path, page)) => write_export(html_path, page),
            None => Ok(()),
        });
        match result {
            Ok(()) => self.set_status_message(format!("Exported to {}", path.display())),
            Err(e) => self.set_status_message(format!("Export failed: {:#}", e)),
        }
    }

    /// Copy the active segment's text to the system clipboard
    pub fn copy_segment(&mut self) {
        let Some(text) = self.buffer.as_ref().map(|b| b.text()) else { return };

        #[cfg(feature = "clipboard")]
        {
            let result = arboard::Clipboard::new().and_then(|mut cb| cb.set_text(text));
            match result {
                Ok(()) => self.set_status_message("Copied segment to clipboard"),
                Err(e) => self.set_status_message(format!("Clipboard error: {}", e)),
            }
        }
        #[cfg(not(feature = "clipboard"))]
        {
            let _ = text;
            self.set_status_message("Clipboard support not available");
        }
    }

    fn active_is_cover(&self) -> bool {
        self.segment().map(|s| s.kind == SegmentKind::Poster).unwrap_or(false)
    }

    /// Ask the assistant to continue or summarize the active segment
    pub fn request_assist(&mut self, kind: AssistKind) {
        if self.assist_pending || self.active_is_cover() {
            return;
        }
        self.commit_buffer();
        let (Some(book), Some(segment)) = (self.book(), self.segment()) else { return };

        let request = AssistRequest {
            kind,
            segment_id: segment.id.clone(),
            title: segment.title.clone(),
            content: segment.content.clone(),
            context: format!("Book: {}", book.title),
        };
        self.assistant.request(request);
        self.assist_pending = true;
        self.set_status_message(match kind {
            AssistKind::Continue => "Writing continuation...",
            AssistKind::Summarize => "Summarizing...",
        });
    }

    pub fn apply_assist_reply(&mut self, reply: AssistReply) {
        self.assist_pending = false;
        self.clear_status_message();
        match reply.kind {
            AssistKind::Summarize => {
                if self.active_segment.as_deref() == Some(reply.segment_id.as_str()) {
                    self.summary = Some(reply.text);
                }
            }
            AssistKind::Continue => {
                // Keystrokes typed while the request was in flight go in first
                if self
                    .buffer
                    .as_ref()
                    .is_some_and(|b| b.segment_id == reply.segment_id)
                {
                    self.commit_buffer();
                }

                // The reply may land after the user switched books
                let Some(book) = self
                    .books
                    .iter_mut()
                    .find(|b| b.segment(&reply.segment_id).is_some())
                else {
                    return;
                };
                let Some(segment) = book.segment(&reply.segment_id) else { return };
                let (title, content) = (segment.title.clone(), segment.content.clone());
                let Some(updated) = append_continuation(&content, &reply.text) else { return };

                book.update_segment(&reply.segment_id, &updated, &title);
                if let Some(buffer) = self
                    .buffer
                    .as_mut()
                    .filter(|b| b.segment_id == reply.segment_id)
                {
                    buffer.replace_all(&updated);
                }
                if self.tracker.segment_id() == Some(reply.segment_id.as_str()) {
                    self.tracker.record_edit(Utc::now(), &updated);
                }
                self.schedule_save();
            }
        }
    }

    // Editing

    /// Apply an edit to the buffer and restart the commit window
    pub fn edit(&mut self, f: impl FnOnce(&mut SegmentBuffer)) {
        let Some(buffer) = self.buffer.as_mut() else { return };
        let rev = buffer.rev;
        f(buffer);
        if buffer.rev != rev {
            self.commit_debounce.touch();
            self.save_state = SaveState::Saving;
        }
    }

    pub fn apply_format(&mut self, format: Format) {
        if self.active_is_cover() {
            return;
        }
        self.edit(|b| b.apply_format(format));
    }

    /// Whether edits are waiting for the commit window
    pub fn has_uncommitted(&self) -> bool {
        self.commit_debounce.has_pending()
    }

    /// Write the buffer back into the book if it changed
    pub fn commit_buffer(&mut self) {
        self.commit_debounce.cancel();
        let Some(buffer) = self.buffer.as_ref() else { return };
        let (id, text) = (buffer.segment_id.clone(), buffer.text());

        let Some(book) = self.book_mut() else { return };
        let Some(title) = book
            .segment(&id)
            .filter(|s| s.content != text)
            .map(|s| s.title.clone())
        else {
            return;
        };

        book.update_segment(&id, &text, &title);
        self.tracker.record_edit(Utc::now(), &text);
        self.schedule_save();
    }

    /// Close out the writing session, recording it on the book
    fn finish_session(&mut self) {
        let now = Utc::now();
        let Some(session) = self.tracker.finish(now) else { return };
        let Some(book) = self.book_mut() else { return };

        log::debug!(
            "session on {}: +{} -{} in {}s",
            session.segment_id,
            session.words_added,
            session.words_deleted,
            session.active_seconds
        );
        tracking::record_daily_snapshot(book, now.date_naive(), &session);
        book.sessions.push(session);
        self.schedule_save();
    }

    // Prompts

    pub fn open_new_book_prompt(&mut self) {
        self.modal = Some(Modal::Input {
            purpose: InputPurpose::NewBook,
            value: String::new(),
        });
    }

    pub fn open_import_prompt(&mut self) {
        self.modal = Some(Modal::Input {
            purpose: InputPurpose::ImportPath,
            value: String::new(),
        });
    }

    pub fn request_delete_book(&mut self) {
        if let Some(book) = self.books.get(self.shelf_selected) {
            self.modal = Some(Modal::Confirm {
                message: format!("Delete \"{}\"? This cannot be undone.", book.title),
                purpose: ConfirmPurpose::DeleteBook(book.id.clone()),
            });
        }
    }

    /// Accept the open prompt
    pub fn submit_modal(&mut self) {
        match self.modal.take() {
            Some(Modal::Input { purpose, value }) => match purpose {
                InputPurpose::NewBook => self.create_book(&value),
                InputPurpose::RenameSegment(id) => self.rename_segment(&id, &value),
                InputPurpose::ImportPath => self.request_import(&value),
            },
            Some(Modal::Confirm { purpose, .. }) => match purpose {
                ConfirmPurpose::DeleteBook(id) => self.delete_book(&id),
                ConfirmPurpose::DeleteSegment(id) => self.delete_segment(&id),
                ConfirmPurpose::ReplaceLibrary(path) => self.import_library(&path),
            },
            None => {}
        }
    }

    pub fn cancel_modal(&mut self) {
        self.modal = None;
    }
}
