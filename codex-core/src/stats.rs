//! Text analytics and writing productivity metrics
//!
//! Every function here is total: empty input, zero targets and empty
//! histories produce neutral values instead of errors.

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Timelike, Utc};
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::LazyLock;

use crate::model::{Book, Segment, WritingSession};

/// Target used when a book has none
pub const DEFAULT_TARGET_WORDS: u64 = 50_000;

/// Trailing window of daily deltas used for the burn rate
pub const BURN_WINDOW_DAYS: usize = 7;

static WORD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\w+\b").unwrap());
static SENTENCE_END_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[.!?]+").unwrap());

/// Count whitespace-separated tokens
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Ratio of distinct word tokens to total tokens (0.0 for no tokens)
pub fn lexical_diversity(text: &str) -> f64 {
    let lowered = text.to_lowercase();
    let words: Vec<&str> = WORD_RE.find_iter(&lowered).map(|m| m.as_str()).collect();
    if words.is_empty() {
        return 0.0;
    }

    let unique: HashSet<&str> = words.iter().copied().collect();
    unique.len() as f64 / words.len() as f64
}

/// Average sentence length and the per-sentence word counts
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SentenceMetrics {
    pub average: f64,
    pub lengths: Vec<usize>,
}

fn sentences(text: &str) -> impl Iterator<Item = &str> {
    SENTENCE_END_RE
        .split(text)
        .filter(|fragment| !fragment.trim().is_empty())
}

pub fn sentence_metrics(text: &str) -> SentenceMetrics {
    let lengths: Vec<usize> = sentences(text).map(word_count).collect();
    if lengths.is_empty() {
        return SentenceMetrics::default();
    }

    let average = lengths.iter().sum::<usize>() as f64 / lengths.len() as f64;
    SentenceMetrics { average, lengths }
}

/// Words per sentence, a rough complexity proxy
pub fn readability(text: &str) -> f64 {
    let words = word_count(text);
    let sentence_count = sentences(text).count();
    if words == 0 || sentence_count == 0 {
        return 0.0;
    }
    words as f64 / sentence_count as f64
}

/// Word count per segment, in book order
pub fn pacing(segments: &[Segment]) -> Vec<(String, usize)> {
    segments
        .iter()
        .map(|s| (s.title.clone(), word_count(&s.content)))
        .collect()
}

/// Estimated time to reach the word target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eta {
    Days(u64),
    /// No positive burn rate, so no finish date can be estimated
    Unbounded,
}

impl fmt::Display for Eta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Eta::Days(1) => f.write_str("1 day"),
            Eta::Days(n) => write!(f, "{} days", n),
            Eta::Unbounded => f.write_str("∞"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    pub current_words: u64,
    pub target: u64,
    pub remaining: u64,
    pub avg_per_day: f64,
    pub days_to_finish: Eta,
    /// May exceed 100; clamp for display
    pub percent_complete: f64,
}

/// Project completion from the last seven daily net deltas
pub fn projection(current_words: u64, target: u64, daily_net_deltas: &[i64]) -> Projection {
    projection_over(current_words, target, daily_net_deltas, BURN_WINDOW_DAYS)
}

/// Project completion using a trailing window of `window` deltas
pub fn projection_over(
    current_words: u64,
    target: u64,
    daily_net_deltas: &[i64],
    window: usize,
) -> Projection {
    let remaining = target.saturating_sub(current_words);

    let recent = &daily_net_deltas[daily_net_deltas.len().saturating_sub(window)..];
    let avg_per_day = if recent.is_empty() {
        0.0
    } else {
        recent.iter().sum::<i64>() as f64 / recent.len() as f64
    };

    let days_to_finish = if avg_per_day > 0.0 {
        Eta::Days((remaining as f64 / avg_per_day).ceil() as u64)
    } else {
        Eta::Unbounded
    };

    let percent_complete = if target == 0 {
        0.0
    } else {
        current_words as f64 / target as f64 * 100.0
    };

    Projection {
        current_words,
        target,
        remaining,
        avg_per_day,
        days_to_finish,
        percent_complete,
    }
}

/// Projection for a whole book, using its history as the delta series
pub fn book_projection(book: &Book, default_target: u64, window: usize) -> Projection {
    let target = book.target_word_count.filter(|&t| t > 0).unwrap_or(default_target);
    let deltas: Vec<i64> = book.history.iter().map(|h| h.net_words).collect();
    projection_over(book.total_words(), target, &deltas, window)
}

/// One point of the cumulative word-count timeline
#[derive(Debug, Clone, PartialEq)]
pub struct TimelinePoint {
    pub date: NaiveDate,
    pub cumulative: u64,
    pub net: i64,
}

/// Length and revision churn of one segment
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentBalance {
    pub title: String,
    pub words: usize,
    /// (added + deleted) / current words × 100
    pub edit_density: f64,
}

/// Aggregates shown on the analytics dashboard
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardStats {
    pub total_words: u64,
    pub diversity: f64,
    pub avg_sentence: f64,
    pub projection: Projection,
    pub total_seconds: u64,
    pub words_per_hour: f64,
    pub timeline: Vec<TimelinePoint>,
    /// Net words by hour of day in the requested time zone
    pub hourly: [i64; 24],
    pub balance: Vec<SegmentBalance>,
}

impl DashboardStats {
    pub fn compute<Tz: TimeZone>(book: &Book, default_target: u64, window: usize, tz: &Tz) -> Self {
        let total_words = book.total_words();
        let full_text = book.full_text(" ");
        let total_seconds: u64 = book.sessions.iter().map(|s| s.active_seconds).sum();

        let words_per_hour = if total_seconds > 0 {
            total_words as f64 / (total_seconds as f64 / 3600.0)
        } else {
            0.0
        };

        let timeline = book
            .history
            .iter()
            .map(|h| TimelinePoint {
                date: h.date,
                cumulative: h.total_words,
                net: h.net_words,
            })
            .collect();

        Self {
            total_words,
            diversity: lexical_diversity(&full_text),
            avg_sentence: sentence_metrics(&full_text).average,
            projection: book_projection(book, default_target, window),
            total_seconds,
            words_per_hour,
            timeline,
            hourly: hourly_distribution(&book.sessions, tz),
            balance: segment_balance(book),
        }
    }

    /// Net velocity is low relative to time spent: likely over-revision
    pub fn high_churn(&self) -> bool {
        self.words_per_hour > 0.0 && self.words_per_hour < 300.0
    }
}

/// Net words per hour-of-day bucket
pub fn hourly_distribution<Tz: TimeZone>(sessions: &[WritingSession], tz: &Tz) -> [i64; 24] {
    let mut buckets = [0i64; 24];
    for session in sessions {
        let hour = session.start_time.with_timezone(tz).hour() as usize;
        buckets[hour] += session.net_words();
    }
    buckets
}

/// Word count and edit density per segment
pub fn segment_balance(book: &Book) -> Vec<SegmentBalance> {
    book.segments
        .iter()
        .map(|segment| {
            let changes: u64 = book
                .sessions
                .iter()
                .filter(|s| s.segment_id == segment.id)
                .map(|s| s.words_added + s.words_deleted)
                .sum();
            let words = word_count(&segment.content);
            let edit_density = if words > 0 {
                changes as f64 / words as f64 * 100.0
            } else {
                0.0
            };

            SegmentBalance {
                title: segment.title.clone(),
                words,
                edit_density,
            }
        })
        .collect()
}

/// One day of the consistency heatmap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeatCell {
    pub date: NaiveDate,
    pub activity: i64,
}

/// Net words per UTC day laid out as `weeks` columns of 7 days, oldest
/// column first. Within a column days run newest to oldest.
pub fn activity_heatmap(
    sessions: &[WritingSession],
    today: NaiveDate,
    weeks: usize,
) -> Vec<Vec<HeatCell>> {
    let mut by_day: HashMap<NaiveDate, i64> = HashMap::new();
    for session in sessions {
        *by_day.entry(session.start_time.date_naive()).or_default() += session.net_words();
    }

    (0..weeks)
        .rev()
        .map(|week| {
            (0..7)
                .map(|day| {
                    let date = today - Duration::days((week * 7 + day) as i64);
                    HeatCell {
                        date,
                        activity: by_day.get(&date).copied().unwrap_or(0),
                    }
                })
                .collect()
        })
        .collect()
}

/// Intensity bucket 0..=4 for a day's net words
pub fn heat_level(activity: i64) -> u8 {
    match activity {
        a if a <= 0 => 0,
        a if a < 200 => 1,
        a if a < 500 => 2,
        a if a < 1000 => 3,
        _ => 4,
    }
}

/// A row of the raw writing ledger
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerEntry {
    pub start_time: DateTime<Utc>,
    pub net: i64,
    pub minutes: u64,
    /// Net words per hour
    pub velocity: i64,
}

/// The most recent `limit` sessions, newest first
pub fn session_ledger(sessions: &[WritingSession], limit: usize) -> Vec<LedgerEntry> {
    sessions
        .iter()
        .rev()
        .take(limit)
        .map(|s| {
            let net = s.net_words();
            let velocity = if s.active_seconds > 0 {
                (net as f64 / (s.active_seconds as f64 / 3600.0)).round() as i64
            } else {
                0
            };
            LedgerEntry {
                start_time: s.start_time,
                net,
                minutes: (s.active_seconds as f64 / 60.0).round() as u64,
                velocity,
            }
        })
        .collect()
}

/// Format seconds as `"{h}h {m}m"`
pub fn format_duration(seconds: u64) -> String {
    format!("{}h {}m", seconds / 3600, (seconds % 3600) / 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory;
    use crate::model::DailySnapshot;

    fn session(start: &str, added: u64, deleted: u64, secs: u64, segment: &str) -> WritingSession {
        let start_time = DateTime::parse_from_rfc3339(start).unwrap().with_timezone(&Utc);
        WritingSession {
            id: format!("s-{}", start),
            start_time,
            end_time: start_time,
            words_added: added,
            words_deleted: deleted,
            active_seconds: secs,
            segment_id: segment.to_string(),
        }
    }

    #[test]
    fn test_word_count_empty() {
        assert_eq!(word_count(""), 0);
        assert_eq!(word_count("   "), 0);
        assert_eq!(word_count("\n\t "), 0);
    }

    #[test]
    fn test_word_count_collapses_whitespace() {
        assert_eq!(word_count("one two  three"), 3);
        assert_eq!(word_count("  leading\nand\ttrailing  "), 3);
    }

    #[test]
    fn test_lexical_diversity() {
        assert!((lexical_diversity("the the the") - 1.0 / 3.0).abs() < 1e-9);
        assert_eq!(lexical_diversity(""), 0.0);
        assert_eq!(lexical_diversity("... !!!"), 0.0);
        assert_eq!(lexical_diversity("The THE the"), 1.0 / 3.0);
        assert_eq!(lexical_diversity("alpha beta"), 1.0);
    }

    #[test]
    fn test_sentence_metrics() {
        let metrics = sentence_metrics("A b. C d e!");
        assert_eq!(metrics.lengths, vec![2, 3]);
        assert!((metrics.average - 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_sentence_metrics_empty() {
        let metrics = sentence_metrics("");
        assert_eq!(metrics.average, 0.0);
        assert!(metrics.lengths.is_empty());

        let metrics = sentence_metrics("?!...");
        assert_eq!(metrics.average, 0.0);
    }

    #[test]
    fn test_sentence_terminator_runs() {
        let metrics = sentence_metrics("Wait... What?! Yes.");
        assert_eq!(metrics.lengths, vec![1, 1, 1]);
    }

    #[test]
    fn test_readability() {
        assert_eq!(readability(""), 0.0);
        assert_eq!(readability("One two. Three four five six."), 3.0);
    }

    #[test]
    fn test_projection_no_history() {
        let p = projection(0, 50_000, &[]);
        assert_eq!(p.remaining, 50_000);
        assert_eq!(p.avg_per_day, 0.0);
        assert_eq!(p.days_to_finish, Eta::Unbounded);
        assert_eq!(p.percent_complete, 0.0);
    }

    #[test]
    fn test_projection_uses_last_seven_days() {
        // The leading 10_000 falls outside the window
        let deltas = [10_000, 100, 100, 100, 100, 100, 100, 100];
        let p = projection(1_000, 2_000, &deltas);
        assert_eq!(p.avg_per_day, 100.0);
        assert_eq!(p.days_to_finish, Eta::Days(10));
        assert_eq!(p.percent_complete, 50.0);
    }

    #[test]
    fn test_projection_rounds_days_up() {
        let p = projection(0, 1_000, &[300]);
        assert_eq!(p.days_to_finish, Eta::Days(4));
    }

    #[test]
    fn test_projection_negative_rate_is_unbounded() {
        let p = projection(500, 1_000, &[-50, 20]);
        assert_eq!(p.days_to_finish, Eta::Unbounded);
    }

    #[test]
    fn test_projection_past_target() {
        let p = projection(1_500, 1_000, &[100]);
        assert_eq!(p.remaining, 0);
        assert_eq!(p.days_to_finish, Eta::Days(0));
        assert_eq!(p.percent_complete, 150.0);
    }

    #[test]
    fn test_projection_zero_target() {
        let p = projection(10, 0, &[]);
        assert_eq!(p.percent_complete, 0.0);
        assert_eq!(p.remaining, 0);
    }

    #[test]
    fn test_eta_display() {
        assert_eq!(Eta::Days(1).to_string(), "1 day");
        assert_eq!(Eta::Days(12).to_string(), "12 days");
        assert_eq!(Eta::Unbounded.to_string(), "∞");
    }

    #[test]
    fn test_book_projection_defaults_target() {
        let mut book = factory::new_book("Test");
        let p = book_projection(&book, DEFAULT_TARGET_WORDS, BURN_WINDOW_DAYS);
        assert_eq!(p.target, DEFAULT_TARGET_WORDS);
        assert_eq!(p.current_words, book.total_words());

        book.target_word_count = Some(1_000);
        book.history.push(DailySnapshot {
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            total_words: 100,
            net_words: 100,
            active_seconds: 0,
        });
        let p = book_projection(&book, DEFAULT_TARGET_WORDS, BURN_WINDOW_DAYS);
        assert_eq!(p.target, 1_000);
        assert_eq!(p.avg_per_day, 100.0);
    }

    #[test]
    fn test_dashboard_stats() {
        let mut book = factory::new_book("Test");
        let chapter = book.segments[6].id.clone();
        book.sessions.push(session("2024-03-01T09:15:00Z", 600, 100, 3600, &chapter));
        book.sessions.push(session("2024-03-01T21:00:00Z", 50, 0, 0, &chapter));

        let stats = DashboardStats::compute(&book, DEFAULT_TARGET_WORDS, BURN_WINDOW_DAYS, &Utc);
        assert_eq!(stats.total_seconds, 3600);
        assert_eq!(stats.words_per_hour, stats.total_words as f64);
        assert_eq!(stats.hourly[9], 500);
        assert_eq!(stats.hourly[21], 50);
        assert_eq!(stats.hourly.iter().sum::<i64>(), 550);

        let chapter_balance = &stats.balance[6];
        let words = word_count(&book.segments[6].content) as f64;
        assert!((chapter_balance.edit_density - 750.0 / words * 100.0).abs() < 1e-9);
        // Cover is empty
        assert_eq!(stats.balance[0].edit_density, 0.0);
    }

    #[test]
    fn test_dashboard_empty_book() {
        let mut book = factory::new_book("Empty");
        for seg in &mut book.segments {
            seg.content.clear();
        }
        let stats = DashboardStats::compute(&book, DEFAULT_TARGET_WORDS, BURN_WINDOW_DAYS, &Utc);
        assert_eq!(stats.total_words, 0);
        assert_eq!(stats.diversity, 0.0);
        assert_eq!(stats.avg_sentence, 0.0);
        assert_eq!(stats.words_per_hour, 0.0);
        assert!(!stats.high_churn());
    }

    #[test]
    fn test_activity_heatmap() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let sessions = vec![
            session("2024-03-10T08:00:00Z", 300, 0, 60, "n"),
            session("2024-03-10T18:00:00Z", 50, 20, 60, "n"),
            session("2024-03-02T08:00:00Z", 100, 0, 60, "n"),
        ];

        let grid = activity_heatmap(&sessions, today, 22);
        assert_eq!(grid.len(), 22);
        assert!(grid.iter().all(|week| week.len() == 7));

        let newest = grid.last().unwrap();
        assert_eq!(newest[0].date, today);
        assert_eq!(newest[0].activity, 330);

        // Eight days back lands in the previous column, second row
        let previous = &grid[20];
        assert_eq!(previous[1].date, NaiveDate::from_ymd_opt(2024, 3, 2).unwrap());
        assert_eq!(previous[1].activity, 100);
    }

    #[test]
    fn test_heat_level() {
        assert_eq!(heat_level(-10), 0);
        assert_eq!(heat_level(0), 0);
        assert_eq!(heat_level(199), 1);
        assert_eq!(heat_level(200), 2);
        assert_eq!(heat_level(999), 3);
        assert_eq!(heat_level(1000), 4);
    }

    #[test]
    fn test_session_ledger() {
        let sessions = vec![
            session("2024-03-01T08:00:00Z", 100, 0, 1800, "n"),
            session("2024-03-02T08:00:00Z", 10, 40, 0, "n"),
        ];
        let ledger = session_ledger(&sessions, 8);
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger[0].net, -30);
        assert_eq!(ledger[0].velocity, 0);
        assert_eq!(ledger[1].net, 100);
        assert_eq!(ledger[1].minutes, 30);
        assert_eq!(ledger[1].velocity, 200);

        assert_eq!(session_ledger(&sessions, 1).len(), 1);
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0), "0h 0m");
        assert_eq!(format_duration(3 * 3600 + 25 * 60 + 9), "3h 25m");
    }

    #[test]
    fn test_pacing() {
        let book = factory::new_book("Pace");
        let pacing = pacing(&book.segments);
        assert_eq!(pacing.len(), book.segments.len());
        assert_eq!(pacing[0], ("Cover".to_string(), 0));
    }
}
