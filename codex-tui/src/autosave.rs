//! Background library autosave worker thread
//!
//! A newer request replaces a pending one. The library is written only after
//! the quiet window passes with no newer request, so a burst of edits becomes
//! a single write.

use codex_core::{Book, LibraryStore};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

/// Snapshot of the library to persist
#[derive(Debug, Clone)]
pub struct SaveRequest {
    pub rev: u64,
    pub books: Vec<Book>,
}

/// Result of a write
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved { rev: u64 },
    Failed { rev: u64, error: String },
}

/// Autosave worker handle
pub struct AutosaveWorker {
    request_tx: Option<Sender<SaveRequest>>,
    result_rx: Receiver<SaveOutcome>,
    worker_thread: Option<thread::JoinHandle<()>>,
}

impl AutosaveWorker {
    /// Spawn a new autosave worker thread
    pub fn spawn(store: LibraryStore, quiet_window: Duration) -> Self {
        let (request_tx, request_rx) = crossbeam_channel::unbounded();
        let (result_tx, result_rx) = crossbeam_channel::unbounded();

        let worker_thread = thread::spawn(move || {
            worker_loop(store, quiet_window, request_rx, result_tx);
        });

        Self {
            request_tx: Some(request_tx),
            result_rx,
            worker_thread: Some(worker_thread),
        }
    }

    /// Schedule a save, replacing any request still waiting
    pub fn request_save(&self, req: SaveRequest) {
        if let Some(tx) = &self.request_tx {
            let _ = tx.send(req);
        }
    }

    /// Try to receive a save outcome (non-blocking)
    pub fn try_recv_outcome(&self) -> Option<SaveOutcome> {
        self.result_rx.try_recv().ok()
    }

    /// Stop the worker, writing any pending request first
    pub fn shutdown(&mut self) {
        self.request_tx.take();
        if let Some(handle) = self.worker_thread.take() {
            if handle.join().is_err() {
                log::error!("autosave worker panicked");
            }
        }
    }
}

impl Drop for AutosaveWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Worker thread main loop
fn worker_loop(
    store: LibraryStore,
    quiet_window: Duration,
    request_rx: Receiver<SaveRequest>,
    result_tx: Sender<SaveOutcome>,
) {
    let mut pending: Option<SaveRequest> = None;
    let mut last_request = Instant::now();
    let poll = quiet_window.min(Duration::from_millis(50)).max(Duration::from_millis(1));

    loop {
        match request_rx.recv_timeout(poll) {
            Ok(req) => {
                if let Some(old) = pending.replace(req) {
                    log::debug!("autosave rev {} superseded", old.rev);
                }
                last_request = Instant::now();
            }
            Err(RecvTimeoutError::Timeout) => {
                if pending.is_some() && last_request.elapsed() >= quiet_window {
                    if let Some(req) = pending.take() {
                        let _ = result_tx.send(write(&store, req));
                    }
                }
            }
            Err(RecvTimeoutError::Disconnected) => {
                if let Some(req) = pending.take() {
                    let _ = result_tx.send(write(&store, req));
                }
                break;
            }
        }
    }
}

fn write(store: &LibraryStore, req: SaveRequest) -> SaveOutcome {
    match store.save_books(&req.books) {
        Ok(()) => SaveOutcome::Saved { rev: req.rev },
        Err(e) => {
            log::error!("autosave failed: {:#}", e);
            SaveOutcome::Failed {
                rev: req.rev,
                error: format!("{:#}", e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use codex_core::factory;
    use tempfile::TempDir;

    fn library(title: &str) -> Vec<Book> {
        vec![factory::new_book(title)]
    }

    #[test]
    fn test_worker_saves_after_quiet_window() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let store = LibraryStore::new(dir.path());
        let worker = AutosaveWorker::spawn(store.clone(), Duration::from_millis(50));

        worker.request_save(SaveRequest {
            rev: 1,
            books: library("Saved"),
        });

        thread::sleep(Duration::from_millis(300));

        assert_eq!(worker.try_recv_outcome(), Some(SaveOutcome::Saved { rev: 1 }));
        assert_eq!(store.load_books()?[0].title, "Saved");

        Ok(())
    }

    #[test]
    fn test_worker_coalesces_requests() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let store = LibraryStore::new(dir.path());
        let worker = AutosaveWorker::spawn(store.clone(), Duration::from_millis(100));

        for rev in 1..=5 {
            worker.request_save(SaveRequest {
                rev,
                books: library(&format!("Revision {}", rev)),
            });
        }

        thread::sleep(Duration::from_millis(400));

        let mut outcomes = Vec::new();
        while let Some(outcome) = worker.try_recv_outcome() {
            outcomes.push(outcome);
        }
        assert_eq!(outcomes, vec![SaveOutcome::Saved { rev: 5 }]);
        assert_eq!(store.load_books()?[0].title, "Revision 5");

        Ok(())
    }

    #[test]
    fn test_shutdown_flushes_pending() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let store = LibraryStore::new(dir.path());
        let mut worker = AutosaveWorker::spawn(store.clone(), Duration::from_secs(60));

        worker.request_save(SaveRequest {
            rev: 7,
            books: library("Flushed"),
        });
        worker.shutdown();

        assert_eq!(store.load_books()?[0].title, "Flushed");
        assert_eq!(worker.try_recv_outcome(), Some(SaveOutcome::Saved { rev: 7 }));

        Ok(())
    }

    #[test]
    fn test_failed_save_is_reported() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "file")?;
        let mut worker = AutosaveWorker::spawn(LibraryStore::new(&blocker), Duration::from_millis(10));

        worker.request_save(SaveRequest {
            rev: 2,
            books: library("Nope"),
        });
        worker.shutdown();

        match worker.try_recv_outcome() {
            Some(SaveOutcome::Failed { rev, .. }) => assert_eq!(rev, 2),
            other => panic!("expected failure, got {:?}", other),
        }

        Ok(())
    }
}
