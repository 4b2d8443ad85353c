//! Rope-backed editing buffer for one segment

use ropey::Rope;

/// Formatting wraps available from the editor
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    Bold,
    Italic,
    Bullet,
}

impl Format {
    /// Prefix and suffix placed around the selection
    pub fn markers(&self) -> (&'static str, &'static str) {
        match self {
            Format::Bold => ("**", "**"),
            Format::Italic => ("*", "*"),
            Format::Bullet => ("\n* ", ""),
        }
    }
}

/// Text of the segment being edited, with a character-indexed cursor and an
/// optional selection anchor
#[derive(Clone, Debug)]
pub struct SegmentBuffer {
    pub segment_id: String,
    rope: Rope,
    cursor: usize,
    anchor: Option<usize>,
    /// Column to return to when moving vertically through shorter lines
    goal_col: Option<usize>,
    /// Bumped on every change
    pub rev: u64,
}

impl SegmentBuffer {
    pub fn new(segment_id: impl Into<String>, content: &str) -> Self {
        Self {
            segment_id: segment_id.into(),
            rope: Rope::from_str(content),
            cursor: 0,
            anchor: None,
            goal_col: None,
            rev: 1,
        }
    }

    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    pub fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    pub fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    /// Line contents without the trailing newline
    pub fn line(&self, idx: usize) -> String {
        if idx >= self.line_count() {
            return String::new();
        }
        let mut line: String = self.rope.line(idx).chunks().collect();
        if line.ends_with('\n') {
            line.pop();
        }
        if line.ends_with('\r') {
            line.pop();
        }
        line
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Cursor position as (line, column), both 0-indexed
    pub fn line_col(&self) -> (usize, usize) {
        let line = self.rope.char_to_line(self.cursor);
        (line, self.cursor - self.rope.line_to_char(line))
    }

    pub fn set_cursor(&mut self, pos: usize) {
        self.cursor = pos.min(self.len_chars());
        self.goal_col = None;
    }

    /// Selected char range, start inclusive, end exclusive
    pub fn selection(&self) -> Option<(usize, usize)> {
        let anchor = self.anchor?;
        if anchor == self.cursor {
            return None;
        }
        Some((anchor.min(self.cursor), anchor.max(self.cursor)))
    }

    pub fn selected_text(&self) -> Option<String> {
        let (start, end) = self.selection()?;
        Some(self.rope.slice(start..end).to_string())
    }

    /// Start or stop extending a selection from the current cursor
    pub fn set_selecting(&mut self, selecting: bool) {
        match (selecting, self.anchor) {
            (true, None) => self.anchor = Some(self.cursor),
            (false, _) => self.anchor = None,
            _ => {}
        }
    }

    pub fn insert_char(&mut self, c: char) {
        let mut tmp = [0u8; 4];
        self.insert_str(c.encode_utf8(&mut tmp));
    }

    /// Insert at the cursor, replacing the selection if there is one
    pub fn insert_str(&mut self, s: &str) {
        self.delete_selection();
        self.rope.insert(self.cursor, s);
        self.cursor += s.chars().count();
        self.changed();
    }

    pub fn backspace(&mut self) {
        if self.delete_selection() {
            self.changed();
            return;
        }
        if self.cursor == 0 {
            return;
        }
        self.rope.remove(self.cursor - 1..self.cursor);
        self.cursor -= 1;
        self.changed();
    }

    pub fn delete(&mut self) {
        if self.delete_selection() {
            self.changed();
            return;
        }
        if self.cursor >= self.len_chars() {
            return;
        }
        self.rope.remove(self.cursor..self.cursor + 1);
        self.changed();
    }

    fn delete_selection(&mut self) -> bool {
        let Some((start, end)) = self.selection() else {
            self.anchor = None;
            return false;
        };
        self.rope.remove(start..end);
        self.cursor = start;
        self.anchor = None;
        true
    }

    /// Wrap the selection (or an empty span at the cursor) in the format's
    /// markers. The wrapped text stays selected.
    pub fn apply_format(&mut self, format: Format) {
        let (prefix, suffix) = format.markers();
        let (start, end) = self.selection().unwrap_or((self.cursor, self.cursor));
        let prefix_len = prefix.chars().count();

        self.rope.insert(end, suffix);
        self.rope.insert(start, prefix);

        self.anchor = (start != end).then_some(start + prefix_len);
        self.cursor = end + prefix_len;
        self.changed();
    }

    /// Replace the whole text, keeping the cursor where it still fits
    pub fn replace_all(&mut self, text: &str) {
        self.rope = Rope::from_str(text);
        self.cursor = self.cursor.min(self.len_chars());
        self.anchor = None;
        self.changed();
    }

    fn changed(&mut self) {
        self.goal_col = None;
        self.rev += 1;
    }

    pub fn move_left(&mut self) {
        self.set_cursor(self.cursor.saturating_sub(1));
    }

    pub fn move_right(&mut self) {
        self.set_cursor(self.cursor + 1);
    }

    pub fn move_home(&mut self) {
        let (line, _) = self.line_col();
        self.set_cursor(self.rope.line_to_char(line));
    }

    pub fn move_end(&mut self) {
        let (line, _) = self.line_col();
        let start = self.rope.line_to_char(line);
        self.set_cursor(start + self.line(line).chars().count());
    }

    pub fn move_up(&mut self) {
        let (line, col) = self.line_col();
        if line == 0 {
            self.set_cursor(0);
            return;
        }
        self.move_to_line(line - 1, col);
    }

    pub fn move_down(&mut self) {
        let (line, col) = self.line_col();
        if line + 1 >= self.line_count() {
            self.set_cursor(self.len_chars());
            return;
        }
        self.move_to_line(line + 1, col);
    }

    fn move_to_line(&mut self, line: usize, col: usize) {
        let goal = self.goal_col.unwrap_or(col);
        let len = self.line(line).chars().count();
        self.cursor = self.rope.line_to_char(line) + goal.min(len);
        self.goal_col = Some(goal);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_text() {
        let mut buf = SegmentBuffer::new("node_1", "");
        buf.insert_str("Hello");
        buf.insert_char(' ');
        buf.insert_char('é');
        assert_eq!(buf.text(), "Hello é");
        assert_eq!(buf.cursor(), 7);
        assert_eq!(buf.rev, 4);
    }

    #[test]
    fn test_backspace_and_delete() {
        let mut buf = SegmentBuffer::new("n", "abc");
        buf.set_cursor(2);
        buf.backspace();
        assert_eq!(buf.text(), "ac");
        buf.delete();
        assert_eq!(buf.text(), "a");
        buf.delete();
        assert_eq!(buf.text(), "a");

        buf.set_cursor(0);
        let rev = buf.rev;
        buf.backspace();
        assert_eq!(buf.rev, rev);
    }

    #[test]
    fn test_line_col_and_vertical_moves() {
        let mut buf = SegmentBuffer::new("n", "long line\nab\nanother line");
        buf.set_cursor(7);
        assert_eq!(buf.line_col(), (0, 7));

        buf.move_down();
        assert_eq!(buf.line_col(), (1, 2));
        // Goal column survives the short line
        buf.move_down();
        assert_eq!(buf.line_col(), (2, 7));

        buf.move_down();
        assert_eq!(buf.cursor(), buf.len_chars());
        buf.move_up();
        buf.move_up();
        assert_eq!(buf.line_col(), (0, 9));
        buf.move_up();
        assert_eq!(buf.cursor(), 0);
    }

    #[test]
    fn test_home_end() {
        let mut buf = SegmentBuffer::new("n", "one\ntwo three");
        buf.set_cursor(6);
        buf.move_end();
        assert_eq!(buf.line_col(), (1, 9));
        buf.move_home();
        assert_eq!(buf.line_col(), (1, 0));
    }

    #[test]
    fn test_format_selection() {
        let mut buf = SegmentBuffer::new("n", "make this bold");
        buf.set_cursor(5);
        buf.set_selecting(true);
        for _ in 0..4 {
            buf.move_right();
        }
        assert_eq!(buf.selected_text().as_deref(), Some("this"));

        buf.apply_format(Format::Bold);
        assert_eq!(buf.text(), "make **this** bold");
        assert_eq!(buf.selected_text().as_deref(), Some("this"));
    }

    #[test]
    fn test_format_without_selection() {
        let mut buf = SegmentBuffer::new("n", "text");
        buf.set_cursor(4);
        buf.apply_format(Format::Italic);
        assert_eq!(buf.text(), "text**");
        assert_eq!(buf.cursor(), 5);

        buf.apply_format(Format::Bullet);
        assert_eq!(buf.text(), "text*\n* *");
        assert_eq!(buf.line_col(), (1, 2));
    }

    #[test]
    fn test_typing_replaces_selection() {
        let mut buf = SegmentBuffer::new("n", "old text");
        buf.set_selecting(true);
        buf.set_cursor(3);
        buf.insert_str("new");
        assert_eq!(buf.text(), "new text");
        assert!(buf.selection().is_none());
    }

    #[test]
    fn test_replace_all_clamps_cursor() {
        let mut buf = SegmentBuffer::new("n", "a longer text");
        buf.set_cursor(10);
        buf.replace_all("short");
        assert_eq!(buf.cursor(), 5);
        assert_eq!(buf.line(0), "short");
        assert_eq!(buf.line(3), "");
    }
}
