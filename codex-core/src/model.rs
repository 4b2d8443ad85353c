//! Book, segment and writing-history data model
//!
//! Field names serialize in camelCase and segments live under `nodes`, so a
//! library backup keeps the same JSON shape across versions.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Structural grouping of segments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Matter {
    Front,
    Body,
    Back,
}

impl Matter {
    pub const ALL: [Matter; 3] = [Matter::Front, Matter::Body, Matter::Back];

    pub fn label(&self) -> &'static str {
        match self {
            Matter::Front => "Front Matter",
            Matter::Body => "Body",
            Matter::Back => "Back Matter",
        }
    }
}

/// The kind of a segment. Serialized as snake_case tags (`half_title`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentKind {
    // Front matter
    Poster,
    HalfTitle,
    TitlePage,
    Copyright,
    Dedication,
    Epigraph,
    Foreword,
    Preface,
    Toc,
    // Body matter
    Introduction,
    Part,
    Chapter,
    Interlude,
    // Back matter
    Conclusion,
    Afterword,
    Epilogue,
    Appendix,
    Glossary,
    References,
    Index,
    AboutAuthor,
    Colophon,
}

impl SegmentKind {
    /// Which structural group this kind belongs to
    pub fn matter(&self) -> Matter {
        use SegmentKind::*;
        match self {
            Poster | HalfTitle | TitlePage | Copyright | Dedication | Epigraph | Foreword
            | Preface | Toc => Matter::Front,
            Introduction | Part | Chapter | Interlude => Matter::Body,
            Conclusion | Afterword | Epilogue | Appendix | Glossary | References | Index
            | AboutAuthor | Colophon => Matter::Back,
        }
    }

    /// Serialized tag, e.g. `about_author`
    pub fn as_str(&self) -> &'static str {
        use SegmentKind::*;
        match self {
            Poster => "poster",
            HalfTitle => "half_title",
            TitlePage => "title_page",
            Copyright => "copyright",
            Dedication => "dedication",
            Epigraph => "epigraph",
            Foreword => "foreword",
            Preface => "preface",
            Toc => "toc",
            Introduction => "introduction",
            Part => "part",
            Chapter => "chapter",
            Interlude => "interlude",
            Conclusion => "conclusion",
            Afterword => "afterword",
            Epilogue => "epilogue",
            Appendix => "appendix",
            Glossary => "glossary",
            References => "references",
            Index => "index",
            AboutAuthor => "about_author",
            Colophon => "colophon",
        }
    }

    /// Human-readable classification, e.g. `about author`
    pub fn label(&self) -> String {
        self.as_str().replace('_', " ")
    }
}

impl fmt::Display for SegmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One structural unit of a manuscript
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    pub id: String,
    pub book_id: String,
    #[serde(rename = "type")]
    pub kind: SegmentKind,
    pub title: String,
    pub content: String,
    pub order: usize,
    pub last_modified: DateTime<Utc>,
    pub version_count: u32,
}

/// A span of focused writing on one segment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WritingSession {
    pub id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub words_added: u64,
    pub words_deleted: u64,
    pub active_seconds: u64,
    #[serde(rename = "nodeId")]
    pub segment_id: String,
}

impl WritingSession {
    /// Net words written during the session
    pub fn net_words(&self) -> i64 {
        self.words_added as i64 - self.words_deleted as i64
    }
}

/// Per-day word totals used for burn-rate projection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySnapshot {
    pub date: NaiveDate,
    pub total_words: u64,
    pub net_words: i64,
    #[serde(default)]
    pub active_seconds: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: String,
    pub title: String,
    #[serde(rename = "nodes")]
    pub segments: Vec<Segment>,
    pub owner_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_word_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<String>,
    #[serde(default)]
    pub history: Vec<DailySnapshot>,
    #[serde(default)]
    pub sessions: Vec<WritingSession>,
}

/// Generate a prefixed unique identifier
pub fn new_id(prefix: &str) -> String {
    format!("{}_{}", prefix, Uuid::new_v4().simple())
}

impl Book {
    /// Find a segment by id
    pub fn segment(&self, id: &str) -> Option<&Segment> {
        self.segments.iter().find(|s| s.id == id)
    }

    /// Segments split into front, body and back matter, each in order
    pub fn segments_by_matter(&self) -> [(Matter, Vec<&Segment>); 3] {
        Matter::ALL.map(|matter| {
            let group = self
                .segments
                .iter()
                .filter(|s| s.kind.matter() == matter)
                .collect();
            (matter, group)
        })
    }

    /// Append a new segment and return its id
    pub fn add_segment(
        &mut self,
        kind: SegmentKind,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> String {
        let id = new_id("node");
        self.segments.push(Segment {
            id: id.clone(),
            book_id: self.id.clone(),
            kind,
            title: title.into(),
            content: content.into(),
            order: self.segments.len(),
            last_modified: Utc::now(),
            version_count: 1,
        });
        id
    }

    /// Append the default new chapter
    pub fn add_chapter(&mut self) -> String {
        self.add_segment(
            SegmentKind::Chapter,
            "New Chapter",
            "# New Chapter\n\nStart writing here...",
        )
    }

    /// Replace a segment's content and title. Returns false for unknown ids.
    pub fn update_segment(&mut self, id: &str, content: &str, title: &str) -> bool {
        let Some(segment) = self.segments.iter_mut().find(|s| s.id == id) else {
            return false;
        };

        if segment.content != content {
            segment.version_count += 1;
        }
        segment.content = content.to_string();
        segment.title = title.to_string();
        segment.last_modified = Utc::now();
        true
    }

    /// Remove a segment. Returns the removed segment, if any.
    pub fn delete_segment(&mut self, id: &str) -> Option<Segment> {
        let idx = self.segments.iter().position(|s| s.id == id)?;
        let removed = self.segments.remove(idx);
        self.renumber();
        Some(removed)
    }

    /// Move a segment up (negative delta) or down (positive delta).
    /// Returns false when the segment is unknown or already at the edge.
    pub fn move_segment(&mut self, id: &str, delta: isize) -> bool {
        let Some(idx) = self.segments.iter().position(|s| s.id == id) else {
            return false;
        };
        let target = idx as isize + delta;
        if target < 0 || target >= self.segments.len() as isize {
            return false;
        }

        let segment = self.segments.remove(idx);
        self.segments.insert(target as usize, segment);
        self.renumber();
        true
    }

    fn renumber(&mut self) {
        for (order, segment) in self.segments.iter_mut().enumerate() {
            segment.order = order;
        }
    }

    /// Sum of word counts across all segments
    pub fn total_words(&self) -> u64 {
        self.segments
            .iter()
            .map(|s| crate::stats::word_count(&s.content) as u64)
            .sum()
    }

    /// All segment contents joined with `separator`
    pub fn full_text(&self, separator: &str) -> String {
        self.segments
            .iter()
            .map(|s| s.content.as_str())
            .collect::<Vec<_>>()
            .join(separator)
    }

    /// Other segments whose content links to this one as `[[Title]]`
    pub fn backlinks(&self, segment_id: &str) -> Vec<&Segment> {
        let Some(target) = self.segment(segment_id) else {
            return Vec::new();
        };
        let link = format!("[[{}]]", target.title);

        self.segments
            .iter()
            .filter(|s| s.id != target.id && s.content.contains(&link))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory;

    fn book() -> Book {
        factory::new_book("Test Book")
    }

    #[test]
    fn test_matter_classification() {
        assert_eq!(SegmentKind::Poster.matter(), Matter::Front);
        assert_eq!(SegmentKind::Toc.matter(), Matter::Front);
        assert_eq!(SegmentKind::Chapter.matter(), Matter::Body);
        assert_eq!(SegmentKind::Interlude.matter(), Matter::Body);
        assert_eq!(SegmentKind::Glossary.matter(), Matter::Back);
        assert_eq!(SegmentKind::Colophon.matter(), Matter::Back);
    }

    #[test]
    fn test_kind_label() {
        assert_eq!(SegmentKind::AboutAuthor.label(), "about author");
        assert_eq!(SegmentKind::Chapter.label(), "chapter");
    }

    #[test]
    fn test_kind_serializes_snake_case() -> anyhow::Result<()> {
        let json = serde_json::to_string(&SegmentKind::HalfTitle)?;
        assert_eq!(json, "\"half_title\"");
        let kind: SegmentKind = serde_json::from_str("\"about_author\"")?;
        assert_eq!(kind, SegmentKind::AboutAuthor);
        Ok(())
    }

    #[test]
    fn test_add_segment_appends_in_order() {
        let mut book = book();
        let before = book.segments.len();
        let id = book.add_chapter();

        assert_eq!(book.segments.len(), before + 1);
        let added = book.segment(&id).unwrap();
        assert_eq!(added.order, before);
        assert_eq!(added.title, "New Chapter");
        assert_eq!(added.book_id, book.id);
    }

    #[test]
    fn test_update_segment_bumps_version() {
        let mut book = book();
        let id = book.segments[6].id.clone();

        assert!(book.update_segment(&id, "changed", "Renamed"));
        let seg = book.segment(&id).unwrap();
        assert_eq!(seg.content, "changed");
        assert_eq!(seg.title, "Renamed");
        assert_eq!(seg.version_count, 2);

        // Title-only edits keep the version
        assert!(book.update_segment(&id, "changed", "Again"));
        assert_eq!(book.segment(&id).unwrap().version_count, 2);

        assert!(!book.update_segment("missing", "x", "y"));
    }

    #[test]
    fn test_delete_segment_renumbers() {
        let mut book = book();
        let id = book.segments[2].id.clone();

        assert!(book.delete_segment(&id).is_some());
        assert!(book.segment(&id).is_none());
        for (i, seg) in book.segments.iter().enumerate() {
            assert_eq!(seg.order, i);
        }
        assert!(book.delete_segment(&id).is_none());
    }

    #[test]
    fn test_move_segment() {
        let mut book = book();
        let first = book.segments[0].id.clone();
        let second = book.segments[1].id.clone();

        assert!(!book.move_segment(&first, -1));
        assert!(book.move_segment(&first, 1));
        assert_eq!(book.segments[0].id, second);
        assert_eq!(book.segments[1].id, first);
        assert_eq!(book.segments[1].order, 1);

        let last = book.segments.last().unwrap().id.clone();
        assert!(!book.move_segment(&last, 1));
    }

    #[test]
    fn test_segments_by_matter() {
        let book = book();
        let groups = book.segments_by_matter();

        assert_eq!(groups[0].0, Matter::Front);
        assert!(groups[0].1.iter().all(|s| s.kind.matter() == Matter::Front));
        assert_eq!(groups[1].1.len(), 3);
        let total: usize = groups.iter().map(|(_, g)| g.len()).sum();
        assert_eq!(total, book.segments.len());
    }

    #[test]
    fn test_backlinks() {
        let mut book = book();
        let target = book.segments[6].id.clone();
        let title = book.segments[6].title.clone();
        let source = book.segments[7].id.clone();
        let content = format!("See [[{}]] for the start.", title);
        book.update_segment(&source, &content, "Chapter 2");

        let links = book.backlinks(&target);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].id, source);
        assert!(book.backlinks("missing").is_empty());
    }

    #[test]
    fn test_session_net_words() {
        let now = Utc::now();
        let session = WritingSession {
            id: "s".into(),
            start_time: now,
            end_time: now,
            words_added: 10,
            words_deleted: 25,
            active_seconds: 60,
            segment_id: "n".into(),
        };
        assert_eq!(session.net_words(), -15);
    }
}
