//! Book templates and the demo library

use chrono::{Datelike, Utc};

use crate::model::{new_id, Book, Segment, SegmentKind};

/// Owner id used for locally created books
pub const LOCAL_OWNER: &str = "user_1";

/// Create a new book with the standard manuscript skeleton
pub fn new_book(title: &str) -> Book {
    let book_id = new_id("book");
    let year = Utc::now().year();

    let template: [(SegmentKind, &str, String); 11] = [
        (SegmentKind::Poster, "Cover", String::new()),
        (
            SegmentKind::TitlePage,
            "Title Page",
            format!("# {}\n\n## A Serious Work\n\n**Author Name**\n\nPublisher Name", title),
        ),
        (
            SegmentKind::Copyright,
            "Copyright",
            format!(
                "**Copyright © {} Author Name**\n\nAll rights reserved.\nISBN: 000-0-00-000000-0",
                year
            ),
        ),
        (SegmentKind::Dedication, "Dedication", "*For the ones who read.*".to_string()),
        (SegmentKind::Toc, "Table of Contents", "(Auto-generated placeholder)".to_string()),
        (
            SegmentKind::Preface,
            "Preface",
            "# Preface\n\nEvery book has a reason for being...".to_string(),
        ),
        (SegmentKind::Chapter, "Chapter 1", "# Chapter 1\n\nThe journey begins here.".to_string()),
        (SegmentKind::Chapter, "Chapter 2", "# Chapter 2\n\nThe plot thickens.".to_string()),
        (
            SegmentKind::Chapter,
            "Chapter 3",
            "# Chapter 3\n\nThe resolution approaches.".to_string(),
        ),
        (
            SegmentKind::AboutAuthor,
            "About the Author",
            "# About the Author\n\nWrite your bio here.".to_string(),
        ),
        (
            SegmentKind::References,
            "References",
            "# References\n\n1. Source One\n2. Source Two".to_string(),
        ),
    ];

    let segments = template
        .into_iter()
        .enumerate()
        .map(|(order, (kind, seg_title, content))| segment(&book_id, order, kind, seg_title, content))
        .collect();

    Book {
        id: book_id,
        title: title.to_string(),
        segments,
        owner_id: LOCAL_OWNER.to_string(),
        cover_image: None,
        target_word_count: None,
        deadline: None,
        history: Vec::new(),
        sessions: Vec::new(),
    }
}

/// The library shown on first launch, or when the stored one is unreadable
pub fn sample_library() -> Vec<Book> {
    let book_id = "book_1".to_string();

    let template: [(SegmentKind, &str, &str); 8] = [
        (
            SegmentKind::Poster,
            "Cover",
            "# The Algorithms of Thought\n\n**A Guide to Thinking in Code**",
        ),
        (
            SegmentKind::Copyright,
            "Copyright",
            "**Copyright © 2024 Author Name**\n\nAll rights reserved.",
        ),
        (
            SegmentKind::Preface,
            "Preface",
            "This book explores how computer science concepts can be applied to everyday decision making.",
        ),
        (SegmentKind::Toc, "Table of Contents", "(Auto-generated)"),
        (
            SegmentKind::Chapter,
            "Chapter 1: The Stack",
            "# Chapter 1: The Stack\n\nLife is often LIFO (Last In, First Out).",
        ),
        (
            SegmentKind::Chapter,
            "Chapter 2: The Queue",
            "# Chapter 2: The Queue\n\nFIFO (First In, First Out) is fairer.",
        ),
        (SegmentKind::Glossary, "Glossary", "**LIFO**: Last In, First Out."),
        (
            SegmentKind::AboutAuthor,
            "About the Author",
            "The author is a software engineer.",
        ),
    ];

    let segments = template
        .into_iter()
        .enumerate()
        .map(|(order, (kind, title, content))| {
            segment(&book_id, order, kind, title, content.to_string())
        })
        .collect();

    vec![Book {
        id: book_id,
        title: "The Algorithms of Thought".to_string(),
        segments,
        owner_id: LOCAL_OWNER.to_string(),
        cover_image: None,
        target_word_count: None,
        deadline: None,
        history: Vec::new(),
        sessions: Vec::new(),
    }]
}

fn segment(book_id: &str, order: usize, kind: SegmentKind, title: &str, content: String) -> Segment {
    Segment {
        id: new_id("node"),
        book_id: book_id.to_string(),
        kind,
        title: title.to_string(),
        content,
        order,
        last_modified: Utc::now(),
        version_count: 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_book_template() {
        let book = new_book("My Novel");

        assert_eq!(book.title, "My Novel");
        assert_eq!(book.segments.len(), 11);
        assert_eq!(book.segments[0].kind, SegmentKind::Poster);
        assert!(book.segments[1].content.starts_with("# My Novel"));
        assert!(book.segments.iter().all(|s| s.book_id == book.id));
        for (i, seg) in book.segments.iter().enumerate() {
            assert_eq!(seg.order, i);
        }
        assert!(book.history.is_empty());
        assert!(book.sessions.is_empty());
    }

    #[test]
    fn test_new_books_get_distinct_ids() {
        let a = new_book("A");
        let b = new_book("B");
        assert_ne!(a.id, b.id);
        assert_ne!(a.segments[0].id, b.segments[0].id);
    }

    #[test]
    fn test_sample_library() {
        let library = sample_library();
        assert_eq!(library.len(), 1);
        assert_eq!(library[0].title, "The Algorithms of Thought");
        assert_eq!(library[0].segments.len(), 8);
    }
}
