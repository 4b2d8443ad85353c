//! Writing assistant interface
//!
//! Assistants never fail: transport problems come back as a user-facing
//! message in place of the generated text.

pub const OFFLINE_MESSAGE: &str =
    "AI features require an internet connection. Please check your network.";
pub const UNAVAILABLE_MESSAGE: &str =
    "The AI is currently unavailable. Check your connection or API status.";
pub const SUMMARY_OFFLINE_MESSAGE: &str = "Summary unavailable offline.";
pub const SUMMARY_FAILED_MESSAGE: &str = "Failed to summarize.";

/// Text generation backend
pub trait Assistant: Send {
    /// Continue `content` in the same tone and style
    fn continue_text(&self, content: &str, title: &str, context: &str) -> String;

    /// Two-sentence summary of `content`
    fn summarize(&self, content: &str) -> String;
}

/// Assistant used when no backend is configured
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineAssistant;

impl Assistant for OfflineAssistant {
    fn continue_text(&self, _content: &str, _title: &str, _context: &str) -> String {
        OFFLINE_MESSAGE.to_string()
    }

    fn summarize(&self, _content: &str) -> String {
        SUMMARY_OFFLINE_MESSAGE.to_string()
    }
}

pub fn continuation_prompt(content: &str, title: &str, context: &str) -> String {
    format!(
        "You are a professional editor and co-author.\n\
         Task: Continue the following text naturally, maintaining the tone and style.\n\
         Title of Section: \"{title}\"\n\
         Context from other sections: \"{context}\"\n\
         \n\
         Current Text:\n\
         \"{content}\"\n\
         \n\
         (Generate only the continuation text, no preamble)"
    )
}

pub fn summary_prompt(content: &str) -> String {
    format!("Summarize this text in 2 sentences:\n\n{content}")
}

/// Segment content with a continuation appended after a blank line.
/// Empty suggestions leave the content unchanged.
pub fn append_continuation(content: &str, suggestion: &str) -> Option<String> {
    if suggestion.is_empty() {
        return None;
    }
    Some(format!("{}\n\n{}", content, suggestion))
}
