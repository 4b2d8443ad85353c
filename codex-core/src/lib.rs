//! Codex Core - Manuscript model, analytics, rendering and persistence
//!
//! This crate contains the core logic for codex, independent of terminal UI concerns:
//! - Book and segment model with the JSON library format
//! - Text analytics and completion projection
//! - Preview renderer for the manuscript Markdown dialect
//! - Library persistence, export and configuration
//! - Writing session tracking

pub mod assist;
pub mod buffer;
pub mod config;
pub mod export;
pub mod factory;
pub mod library;
pub mod markup;
pub mod model;
pub mod stats;
pub mod toc;
pub mod tracking;

// Re-export commonly used types
pub use buffer::{Format, SegmentBuffer};
pub use config::{Config, ThemeVariant};
pub use library::LibraryStore;
pub use markup::{render, RenderBlock, Rendered};
pub use model::{Book, Matter, Segment, SegmentKind, WritingSession};
pub use tracking::SessionTracker;
