//! On-disk library persistence
//!
//! The data directory holds `books.json` (a JSON array of books) and `theme`
//! (`dark` or `light`). A missing or unreadable library falls back to the
//! sample library instead of failing.

use anyhow::{Context, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::config::{Config, ThemeVariant};
use crate::factory;
use crate::model::Book;

const BOOKS_FILE: &str = "books.json";
const THEME_FILE: &str = "theme";

/// Handle to the directory holding the persisted library
#[derive(Debug, Clone)]
pub struct LibraryStore {
    dir: PathBuf,
}

impl LibraryStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store at the configured (or platform default) data directory
    pub fn from_config(config: &Config) -> Result<Self> {
        let dir = config
            .data_dir()
            .context("Could not determine a data directory; set storage.data_dir")?;
        Ok(Self::new(dir))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn books_path(&self) -> PathBuf {
        self.dir.join(BOOKS_FILE)
    }

    pub fn theme_path(&self) -> PathBuf {
        self.dir.join(THEME_FILE)
    }

    /// Load the library. Missing data yields the sample library; corrupt
    /// data is moved aside and also yields the sample library.
    pub fn load_books(&self) -> Result<Vec<Book>> {
        let path = self.books_path();
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::info!("no library at {}, starting with sample", path.display());
                return Ok(factory::sample_library());
            }
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to read library: {}", path.display()))
            }
        };

        match serde_json::from_str::<Vec<Book>>(&content) {
            Ok(books) => {
                log::debug!("loaded {} books from {}", books.len(), path.display());
                Ok(books)
            }
            Err(e) => {
                log::warn!("failed to parse saved books ({}), using sample library", e);
                let aside = path.with_extension("json.corrupt");
                if let Err(e) = fs::rename(&path, &aside) {
                    log::warn!("could not move corrupt library aside: {}", e);
                }
                Ok(factory::sample_library())
            }
        }
    }

    /// Persist the library, replacing the previous file atomically
    pub fn save_books(&self, books: &[Book]) -> Result<()> {
        let json = serde_json::to_string(books).context("Failed to serialize library")?;
        self.write_atomic(&self.books_path(), json.as_bytes())?;
        log::debug!("saved {} books", books.len());
        Ok(())
    }

    /// Persisted theme, if any
    pub fn load_theme(&self) -> Option<ThemeVariant> {
        let content = fs::read_to_string(self.theme_path()).ok()?;
        let theme = ThemeVariant::parse(&content);
        if theme.is_none() {
            log::warn!("ignoring unknown theme {:?}", content.trim());
        }
        theme
    }

    pub fn save_theme(&self, theme: ThemeVariant) -> Result<()> {
        self.write_atomic(&self.theme_path(), theme.as_str().as_bytes())
    }

    fn write_atomic(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create data directory: {}", self.dir.display()))?;

        let tmp = path.with_extension("tmp");
        fs::write(&tmp, bytes)
            .with_context(|| format!("Failed to write file: {}", tmp.display()))?;
        fs::rename(&tmp, path)
            .with_context(|| format!("Failed to replace file: {}", path.display()))?;
        Ok(())
    }
}

/// Write a pretty-printed library backup
pub fn write_backup(books: &[Book], path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(books).context("Failed to serialize library")?;
    fs::write(path, json).with_context(|| format!("Failed to write backup: {}", path.display()))
}

/// Read a library backup. The file must hold a JSON array of books.
pub fn read_backup(path: &Path) -> Result<Vec<Book>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read backup: {}", path.display()))?;

    let value: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("Invalid backup file: {}", path.display()))?;
    if !value.is_array() {
        anyhow::bail!("Invalid backup file {}: expected a list of books", path.display());
    }

    serde_json::from_value(value)
        .with_context(|| format!("Invalid backup file: {}", path.display()))
}

/// Backup file name for a given day, e.g. `codex_library_backup_2024-03-01.json`
pub fn backup_file_name(date: chrono::NaiveDate) -> String {
    format!("codex_library_backup_{}.json", date.format("%Y-%m-%d"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SegmentKind;
    use tempfile::TempDir;

    #[test]
    fn test_missing_library_yields_sample() -> Result<()> {
        let dir = TempDir::new()?;
        let store = LibraryStore::new(dir.path());

        let books = store.load_books()?;
        assert_eq!(books.len(), 1);
        assert_eq!(books[0].title, "The Algorithms of Thought");

        Ok(())
    }

    #[test]
    fn test_save_and_load_round_trip() -> Result<()> {
        let dir = TempDir::new()?;
        let store = LibraryStore::new(dir.path().join("nested"));

        let mut book = factory::new_book("Round Trip");
        let moved = book.segments[3].id.clone();
        book.move_segment(&moved, -2);
        store.save_books(&[book.clone()])?;

        let loaded = store.load_books()?;
        assert_eq!(loaded, vec![book]);
        assert_eq!(loaded[0].segments[1].id, moved);
        assert_eq!(loaded[0].segments[0].kind, SegmentKind::Poster);
        assert!(!store.books_path().with_extension("tmp").exists());

        Ok(())
    }

    #[test]
    fn test_corrupt_library_falls_back() -> Result<()> {
        let dir = TempDir::new()?;
        let store = LibraryStore::new(dir.path());
        fs::write(store.books_path(), "{ not json")?;

        let books = store.load_books()?;
        assert_eq!(books[0].title, "The Algorithms of Thought");
        assert!(dir.path().join("books.json.corrupt").exists());

        Ok(())
    }

    #[test]
    fn test_serialized_shape() -> Result<()> {
        let book = factory::new_book("Shape");
        let value = serde_json::to_value(&book)?;

        assert!(value.get("nodes").is_some());
        assert!(value.get("ownerId").is_some());
        assert!(value.get("coverImage").is_none());
        let node = &value["nodes"][0];
        assert_eq!(node["type"], "poster");
        assert!(node.get("versionCount").is_some());
        assert!(node.get("lastModified").is_some());

        Ok(())
    }

    #[test]
    fn test_reads_external_backup_shape() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("backup.json");
        fs::write(
            &path,
            r#"[{
                "id": "book_1", "title": "Imported", "ownerId": "user_1",
                "targetWordCount": 1000,
                "history": [{"date": "2024-03-01", "totalWords": 10, "netWords": 10, "activeSeconds": 60}],
                "sessions": [{"id": "s1", "startTime": "2024-03-01T10:00:00.000Z",
                              "endTime": "2024-03-01T10:30:00.000Z", "wordsAdded": 12,
                              "wordsDeleted": 2, "activeSeconds": 1800, "nodeId": "node_1"}],
                "nodes": [{"id": "node_1", "bookId": "book_1", "type": "about_author",
                           "title": "Bio", "content": "Hello", "order": 0,
                           "lastModified": "2024-03-01T10:00:00.000Z", "versionCount": 3}]
            }]"#,
        )?;

        let books = read_backup(&path)?;
        assert_eq!(books.len(), 1);
        assert_eq!(books[0].target_word_count, Some(1000));
        assert_eq!(books[0].segments[0].kind, SegmentKind::AboutAuthor);
        assert_eq!(books[0].sessions[0].segment_id, "node_1");
        assert_eq!(books[0].history[0].net_words, 10);

        Ok(())
    }

    #[test]
    fn test_backup_must_be_array() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("backup.json");
        fs::write(&path, r#"{"title": "not a list"}"#)?;

        assert!(read_backup(&path).is_err());
        Ok(())
    }

    #[test]
    fn test_backup_round_trip() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("backup.json");
        let books = vec![factory::new_book("One"), factory::new_book("Two")];

        write_backup(&books, &path)?;
        assert_eq!(read_backup(&path)?, books);
        Ok(())
    }

    #[test]
    fn test_theme_persistence() -> Result<()> {
        let dir = TempDir::new()?;
        let store = LibraryStore::new(dir.path());

        assert_eq!(store.load_theme(), None);
        store.save_theme(ThemeVariant::Light)?;
        assert_eq!(store.load_theme(), Some(ThemeVariant::Light));

        fs::write(store.theme_path(), "purple")?;
        assert_eq!(store.load_theme(), None);

        Ok(())
    }

    #[test]
    fn test_backup_file_name() {
        let date = chrono::NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(backup_file_name(date), "codex_library_backup_2024-03-01.json");
    }
}
