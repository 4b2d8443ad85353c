//! Writing session tracking
//!
//! Sessions are built from successive committed snapshots of one segment.
//! Word-level diffs between snapshots give words added and deleted; the gaps
//! between edits count as active time while they stay under the idle
//! threshold.

use chrono::{DateTime, NaiveDate, Utc};
use similar::{ChangeTag, TextDiff};

use crate::model::{new_id, Book, DailySnapshot, WritingSession};

/// Default cutoff above which a gap between edits is idle time
pub const DEFAULT_IDLE_THRESHOLD_SECS: u64 = 120;

#[derive(Debug, Clone)]
struct ActiveSession {
    segment_id: String,
    start: DateTime<Utc>,
    last_edit: DateTime<Utc>,
    last_text: String,
    words_added: u64,
    words_deleted: u64,
    active_seconds: u64,
}

#[derive(Debug, Clone)]
pub struct SessionTracker {
    idle_threshold_secs: u64,
    active: Option<ActiveSession>,
}

impl Default for SessionTracker {
    fn default() -> Self {
        Self::new(DEFAULT_IDLE_THRESHOLD_SECS)
    }
}

impl SessionTracker {
    pub fn new(idle_threshold_secs: u64) -> Self {
        Self {
            idle_threshold_secs,
            active: None,
        }
    }

    /// Begin tracking a segment. A session already in progress is finished
    /// first and returned.
    pub fn start(
        &mut self,
        segment_id: &str,
        now: DateTime<Utc>,
        baseline: &str,
    ) -> Option<WritingSession> {
        let finished = self.finish(now);
        self.active = Some(ActiveSession {
            segment_id: segment_id.to_string(),
            start: now,
            last_edit: now,
            last_text: baseline.to_string(),
            words_added: 0,
            words_deleted: 0,
            active_seconds: 0,
        });
        finished
    }

    /// Segment being tracked, if any
    pub fn segment_id(&self) -> Option<&str> {
        self.active.as_ref().map(|a| a.segment_id.as_str())
    }

    /// Record a committed snapshot of the tracked segment
    pub fn record_edit(&mut self, now: DateTime<Utc>, text: &str) {
        let Some(active) = self.active.as_mut() else {
            log::debug!("edit recorded with no active session");
            return;
        };
        if active.last_text == text {
            return;
        }

        let (added, deleted) = word_changes(&active.last_text, text);
        active.words_added += added;
        active.words_deleted += deleted;

        let gap = (now - active.last_edit).num_seconds();
        if gap > 0 && (gap as u64) < self.idle_threshold_secs {
            active.active_seconds += gap as u64;
        }
        active.last_edit = now;
        active.last_text = text.to_string();
    }

    /// End the current session. Returns None when nothing was written.
    pub fn finish(&mut self, now: DateTime<Utc>) -> Option<WritingSession> {
        let active = self.active.take()?;
        if active.words_added == 0 && active.words_deleted == 0 {
            return None;
        }

        Some(WritingSession {
            id: new_id("session"),
            start_time: active.start,
            end_time: now.max(active.last_edit),
            words_added: active.words_added,
            words_deleted: active.words_deleted,
            active_seconds: active.active_seconds,
            segment_id: active.segment_id,
        })
    }
}

/// Words inserted and removed between two texts
pub fn word_changes(old: &str, new: &str) -> (u64, u64) {
    let diff = TextDiff::from_words(old, new);
    let mut added = 0;
    let mut deleted = 0;

    for change in diff.iter_all_changes() {
        if change.value().trim().is_empty() {
            continue;
        }
        match change.tag() {
            ChangeTag::Insert => added += 1,
            ChangeTag::Delete => deleted += 1,
            ChangeTag::Equal => {}
        }
    }
    (added, deleted)
}

/// Upsert the snapshot for `date` after `session` finished. Net words are
/// measured against the latest earlier snapshot. With no earlier snapshot
/// the baseline is the total before the day's sessions, so the first day's
/// writing counts toward the burn rate.
pub fn record_daily_snapshot(book: &mut Book, date: NaiveDate, session: &WritingSession) {
    let total = book.total_words();
    let previous_total = book
        .history
        .iter()
        .filter(|h| h.date < date)
        .max_by_key(|h| h.date)
        .map(|h| h.total_words);
    let net = |recorded: i64| match previous_total {
        Some(prev) => total as i64 - prev as i64,
        None => recorded + session.net_words(),
    };

    match book.history.iter_mut().find(|h| h.date == date) {
        Some(snapshot) => {
            snapshot.total_words = total;
            snapshot.net_words = net(snapshot.net_words);
            snapshot.active_seconds += session.active_seconds;
        }
        None => {
            let idx = book.history.partition_point(|h| h.date < date);
            book.history.insert(
                idx,
                DailySnapshot {
                    date,
                    total_words: total,
                    net_words: net(0),
                    active_seconds: session.active_seconds,
                },
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory;
    use chrono::{Duration, TimeZone};

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap() + Duration::seconds(secs)
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn test_word_changes() {
        assert_eq!(word_changes("the cat sat", "the cat sat down"), (1, 0));
        assert_eq!(word_changes("the cat sat", "the dog sat"), (1, 1));
        assert_eq!(word_changes("one two three", ""), (0, 3));
        assert_eq!(word_changes("same", "same"), (0, 0));
    }

    #[test]
    fn test_session_counts_words_and_active_time() {
        let mut tracker = SessionTracker::new(120);
        assert!(tracker.start("node_1", at(0), "Once upon").is_none());
        assert_eq!(tracker.segment_id(), Some("node_1"));

        tracker.record_edit(at(30), "Once upon a time");
        tracker.record_edit(at(60), "Once upon a time there");
        // A long pause is idle time
        tracker.record_edit(at(600), "Once upon a time");

        let session = tracker.finish(at(610)).unwrap();
        assert_eq!(session.segment_id, "node_1");
        assert_eq!(session.words_added, 3);
        assert_eq!(session.words_deleted, 1);
        assert_eq!(session.active_seconds, 60);
        assert_eq!(session.start_time, at(0));
        assert_eq!(session.end_time, at(610));
        assert!(tracker.segment_id().is_none());
    }

    #[test]
    fn test_unchanged_session_is_discarded() {
        let mut tracker = SessionTracker::default();
        tracker.start("node_1", at(0), "text");
        tracker.record_edit(at(10), "text");
        assert!(tracker.finish(at(20)).is_none());
        assert!(tracker.finish(at(30)).is_none());
    }

    #[test]
    fn test_start_finishes_previous_session() {
        let mut tracker = SessionTracker::default();
        tracker.start("a", at(0), "");
        tracker.record_edit(at(5), "hello world");

        let finished = tracker.start("b", at(10), "other").unwrap();
        assert_eq!(finished.segment_id, "a");
        assert_eq!(finished.words_added, 2);
        assert_eq!(tracker.segment_id(), Some("b"));
    }

    #[test]
    fn test_edit_without_session_is_ignored() {
        let mut tracker = SessionTracker::default();
        tracker.record_edit(at(0), "text");
        assert!(tracker.finish(at(1)).is_none());
    }

    fn finished(added: u64, deleted: u64, active_seconds: u64) -> WritingSession {
        WritingSession {
            id: "session_1".to_string(),
            start_time: at(0),
            end_time: at(active_seconds as i64),
            words_added: added,
            words_deleted: deleted,
            active_seconds,
            segment_id: "node_1".to_string(),
        }
    }

    #[test]
    fn test_daily_snapshot_upsert() {
        let mut book = factory::new_book("Snapshots");
        let baseline = book.total_words();

        record_daily_snapshot(&mut book, day(1), &finished(0, 0, 60));
        assert_eq!(book.history.len(), 1);
        assert_eq!(book.history[0].net_words, 0);
        assert_eq!(book.history[0].total_words, baseline);

        let id = book.add_chapter();
        book.update_segment(&id, "one two three four", "Extra");
        record_daily_snapshot(&mut book, day(2), &finished(4, 0, 30));
        record_daily_snapshot(&mut book, day(2), &finished(0, 0, 30));

        assert_eq!(book.history.len(), 2);
        assert_eq!(book.history[1].net_words, 4);
        assert_eq!(book.history[1].active_seconds, 60);
    }

    #[test]
    fn test_first_day_counts_session_words() {
        let mut book = factory::new_book("Debut");
        let id = book.add_chapter();
        book.update_segment(&id, "one two three four five", "Opening");
        record_daily_snapshot(&mut book, day(1), &finished(5, 0, 300));

        book.update_segment(&id, "one two three four five six seven", "Opening");
        record_daily_snapshot(&mut book, day(1), &finished(3, 1, 120));

        assert_eq!(book.history.len(), 1);
        assert_eq!(book.history[0].net_words, 7);
        assert_eq!(book.history[0].active_seconds, 420);

        let deltas: Vec<i64> = book.history.iter().map(|h| h.net_words).collect();
        let projection = crate::stats::projection(book.total_words(), 100, &deltas);
        assert_ne!(projection.days_to_finish, crate::stats::Eta::Unbounded);
    }

    #[test]
    fn test_daily_snapshot_keeps_date_order() {
        let mut book = factory::new_book("Order");
        record_daily_snapshot(&mut book, day(5), &finished(0, 0, 0));
        record_daily_snapshot(&mut book, day(3), &finished(0, 0, 0));

        let dates: Vec<NaiveDate> = book.history.iter().map(|h| h.date).collect();
        assert_eq!(dates, vec![day(3), day(5)]);
    }
}
