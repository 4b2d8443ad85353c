//! Inline emphasis and footnote-reference transforms
//!
//! Transforms are substitutions applied in a fixed order over the same
//! string: bold, then italic, then footnote references. `***x***` therefore
//! comes out as `<strong><em>x</strong></em>`; that resolution is kept as-is.

use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

static BOLD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*\*(.*?)\*\*").unwrap());
static ITALIC_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*(.*?)\*").unwrap());
static FOOTNOTE_REF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\^([^\]]+)\]").unwrap());

const STRONG_OPEN: &str = "<strong>";
const STRONG_CLOSE: &str = "</strong>";
const EM_OPEN: &str = "<em>";
const EM_CLOSE: &str = "</em>";
const FOOTNOTE_OPEN: &str = "<span class=\"footnote-ref\">";
const FOOTNOTE_CLOSE: &str = "</span>";

/// Inline markup produced by [`format_inline`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct InlineHtml(String);

/// A run of text sharing one style
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InlineRun {
    pub text: String,
    pub strong: bool,
    pub emphasis: bool,
    pub footnote: bool,
}

impl InlineRun {
    fn same_style(&self, other: &InlineRun) -> bool {
        self.strong == other.strong
            && self.emphasis == other.emphasis
            && self.footnote == other.footnote
    }
}

/// Apply the inline transforms to one line of source text
pub fn format_inline(text: &str) -> InlineHtml {
    let escaped = escape_html(text);
    let bold = BOLD_RE.replace_all(&escaped, "<strong>$1</strong>");
    let italic = ITALIC_RE.replace_all(&bold, "<em>$1</em>");
    let refs = FOOTNOTE_REF_RE.replace_all(&italic, r#"<span class="footnote-ref">[$1]</span>"#);
    InlineHtml(refs.into_owned())
}

/// Escape `&`, `<` and `>` so text cannot be read as markup
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

fn unescape(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

impl InlineHtml {
    #[cfg(test)]
    pub(crate) fn from_markup(markup: &str) -> Self {
        Self(markup.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Decode into styled runs. Tags toggle flags, so mis-nested markup
    /// still decodes; anything unrecognised stays literal text.
    pub fn runs(&self) -> Vec<InlineRun> {
        let mut runs: Vec<InlineRun> = Vec::new();
        let mut style = InlineRun::default();
        let mut pending = String::new();
        let mut rest = self.0.as_str();

        let flush = |pending: &mut String, style: &InlineRun, runs: &mut Vec<InlineRun>| {
            if pending.is_empty() {
                return;
            }
            let text = unescape(pending);
            pending.clear();
            match runs.last_mut() {
                Some(last) if last.same_style(style) => last.text.push_str(&text),
                _ => runs.push(InlineRun {
                    text,
                    ..style.clone()
                }),
            }
        };

        while let Some(pos) = rest.find('<') {
            pending.push_str(&rest[..pos]);
            rest = &rest[pos..];

            let toggle = [
                (STRONG_OPEN, Some(true), None, None),
                (STRONG_CLOSE, Some(false), None, None),
                (EM_OPEN, None, Some(true), None),
                (EM_CLOSE, None, Some(false), None),
                (FOOTNOTE_OPEN, None, None, Some(true)),
                (FOOTNOTE_CLOSE, None, None, Some(false)),
            ]
            .into_iter()
            .find(|(tag, ..)| rest.starts_with(tag));

            match toggle {
                Some((tag, strong, emphasis, footnote)) => {
                    flush(&mut pending, &style, &mut runs);
                    if let Some(v) = strong {
                        style.strong = v;
                    }
                    if let Some(v) = emphasis {
                        style.emphasis = v;
                    }
                    if let Some(v) = footnote {
                        style.footnote = v;
                    }
                    rest = &rest[tag.len()..];
                }
                None => {
                    pending.push('<');
                    rest = &rest[1..];
                }
            }
        }
        pending.push_str(rest);
        flush(&mut pending, &style, &mut runs);

        runs
    }

    /// Text with all markup removed
    pub fn plain_text(&self) -> String {
        self.runs().into_iter().map(|r| r.text).collect()
    }
}

impl fmt::Display for InlineHtml {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
