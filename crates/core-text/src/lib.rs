//! Rope-based text buffer abstraction.

use anyhow::Result;
use ropey::Rope;

/// A text buffer backed by a `ropey::Rope`.
#[derive(Clone)]
pub struct Buffer {
    rope: Rope,
    pub name: String,
}

/// A position inside a buffer expressed as (line index, byte offset within that line).
/// Lines and byte offsets are guaranteed (when clamped) to be on UTF-8 code unit boundaries; grapheme
/// safety is enforced by higher-level navigation (Phase 1 motions).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: usize,
    pub byte: usize,
}

impl Position {
    pub fn new(line: usize, byte: usize) -> Self {
        Self { line, byte }
    }
    pub fn origin() -> Self {
        Self { line: 0, byte: 0 }
    }
    pub fn clamp_to<F>(&mut self, line_count: usize, mut line_len_fn: F)
    where
        F: FnMut(usize) -> usize,
    {
        if line_count == 0 {
            self.line = 0;
            self.byte = 0;
            return;
        }
        if self.line >= line_count {
            self.line = line_count - 1;
        }
        let max_len = line_len_fn(self.line);
        if self.byte > max_len {
            self.byte = max_len;
        }
    }
}

pub mod motion;
pub mod segment;
pub mod width; // Step 4.1: unified grapheme width indirection
#[cfg(feature = "term-probe")]
pub mod width_probe; // Step 4.4: runtime terminal probe scaffold // Step 4: centralized normalization + segmentation adapter

// Re-export primary width function for convenience in callers that already depend on core-text.
pub use width::egc_width;

/// Bracket pairs recognized by motion/text-object matching, in `(opener, closer)` order.
pub const BRACKET_PAIRS: [(char, char); 4] = [('(', ')'), ('[', ']'), ('{', '}'), ('<', '>')];

impl Buffer {
    /// Construct an empty buffer.
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            rope: Rope::new(),
            name: name.into(),
        }
    }

    /// Construct a buffer from an in-memory string slice.
    pub fn from_str(name: impl Into<String>, content: &str) -> Result<Self> {
        Ok(Self {
            rope: Rope::from_str(content),
            name: name.into(),
        })
    }

    /// Total number of lines in the buffer.
    pub fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    /// Return the requested line as an owned `String` (including trailing newline if present).
    pub fn line(&self, idx: usize) -> Option<String> {
        if idx < self.rope.len_lines() {
            Some(self.rope.line(idx).to_string())
        } else {
            None
        }
    }

    /// Return the requested line without its trailing newline, if any.
    pub fn line_trimmed(&self, idx: usize) -> Option<String> {
        self.line(idx).map(|mut s| {
            if s.ends_with('\n') {
                s.pop();
            }
            s
        })
    }

    /// Joined buffer content with `\n` separators (no trailing newline added).
    pub fn content(&self) -> String {
        let mut out = String::with_capacity(self.rope.len_bytes());
        for idx in 0..self.line_count() {
            out.push_str(&self.line_trimmed(idx).unwrap_or_default());
            if idx + 1 < self.line_count() {
                out.push('\n');
            }
        }
        out
    }

    /// Character at a position, if any (None past end of line).
    pub fn char_at(&self, pos: &Position) -> Option<char> {
        let content = self.line_content_string(pos.line);
        content[pos.byte.min(content.len())..].chars().next()
    }

    /// Byte length of a line (excluding any newline) for clamping purposes.
    pub fn line_byte_len(&self, idx: usize) -> usize {
        if idx >= self.rope.len_lines() {
            return 0;
        }
        let line = self.rope.line(idx);
        // ropey lines include the trailing newline except possibly the last line.
        let s = line.to_string();
        if s.ends_with('\n') {
            s.len() - 1
        } else {
            s.len()
        }
    }

    fn line_content_string(&self, idx: usize) -> String {
        let mut s = self.rope.line(idx).to_string();
        if s.ends_with('\n') {
            s.pop();
        }
        s
    }

    fn absolute_byte_index(&self, pos: &Position) -> usize {
        // Sum bytes of prior lines + byte within line. For early phase simplicity we derive via ropey APIs.
        // ropey lacks direct line_to_byte historically; compute using char indices.
        let line_start_char = self.rope.line_to_char(pos.line);
        let line_start_byte = self.rope.char_to_byte(line_start_char);
        line_start_byte + pos.byte
    }

    fn byte_to_char_index(&self, line: usize, byte_in_line: usize) -> usize {
        let line_start_char = self.rope.line_to_char(line);
        let line_str = self.rope.line(line).to_string();
        let mut trimmed = line_str.as_str();
        if trimmed.ends_with('\n') {
            trimmed = &trimmed[..trimmed.len() - 1];
        }
        // Slice up to byte_in_line (assumed valid grapheme boundary / char boundary) and count chars.
        let within = &trimmed[..byte_in_line.min(trimmed.len())];
        line_start_char + within.chars().count()
    }

    /// Absolute byte offset of `pos` in the whole-buffer content (newline-inclusive).
    pub fn absolute_index(&self, pos: &Position) -> usize {
        self.absolute_byte_index(pos)
    }

    /// Map an absolute byte offset back to a `Position`.
    pub fn position_at(&self, abs: usize) -> Position {
        let mut remaining = abs.min(self.rope.len_bytes());
        let mut line = 0usize;
        while line < self.line_count() {
            let line_len = self.line_byte_len(line);
            let has_newline = self.line(line).map(|l| l.ends_with('\n')).unwrap_or(false);
            if remaining <= line_len {
                return Position {
                    line,
                    byte: remaining,
                };
            }
            remaining -= line_len;
            if has_newline {
                if remaining == 0 {
                    return Position {
                        line,
                        byte: line_len,
                    };
                }
                remaining -= 1;
            }
            line += 1;
        }
        let last = self.line_count().saturating_sub(1);
        Position {
            line: last,
            byte: self.line_byte_len(last),
        }
    }

    /// Insert a grapheme cluster string (may be multi-byte) at the given position; advances position by its byte length.
    pub fn insert_grapheme(&mut self, pos: &mut Position, g: &str) {
        let char_index = self.byte_to_char_index(pos.line, pos.byte);
        self.rope.insert(char_index, g);
        pos.byte += g.len();
    }

    /// Insert a single character at the cursor, advancing the position.
    pub fn insert_char(&mut self, pos: &mut Position, c: char) {
        let mut buf = [0u8; 4];
        let s = c.encode_utf8(&mut buf);
        self.insert_grapheme(pos, s);
    }

    /// Insert an arbitrary (possibly multi-line) text blob at the cursor, splitting on `\n`.
    /// The final cursor position lands immediately after the inserted text.
    pub fn insert_text(&mut self, pos: &mut Position, text: &str) {
        let mut first = true;
        for segment in text.split('\n') {
            if !first {
                self.insert_newline(pos);
            }
            if !segment.is_empty() {
                let char_index = self.byte_to_char_index(pos.line, pos.byte);
                self.rope.insert(char_index, segment);
                pos.byte += segment.len();
            }
            first = false;
        }
    }

    /// Insert a newline at the given position, splitting the current line. Cursor moves to start of new line.
    pub fn insert_newline(&mut self, pos: &mut Position) {
        let char_index = self.byte_to_char_index(pos.line, pos.byte);
        self.rope.insert(char_index, "\n");
        pos.line += 1;
        pos.byte = 0;
    }

    /// Delete the grapheme cluster before the position (like backspace). If at start of line and not first line, joins with previous.
    pub fn delete_grapheme_before(&mut self, pos: &mut Position) {
        if pos.line == 0 && pos.byte == 0 {
            return;
        }
        if pos.byte == 0 {
            // join with previous line: remove the newline at end of previous line
            let prev_line = pos.line - 1;
            let prev_len = self.line_byte_len(prev_line);
            // absolute byte of newline char (after prev_len)
            let line_start_char_prev = self.rope.line_to_char(prev_line);
            let prev_line_start_byte = self.rope.char_to_byte(line_start_char_prev);
            let newline_byte = prev_line_start_byte + prev_len; // the '\n'
            let newline_char_index = self.rope.byte_to_char(newline_byte);
            self.rope.remove(newline_char_index..newline_char_index + 1);
            pos.line = prev_line;
            pos.byte = prev_len;
            return;
        }
        let line_str = self.line_content_string(pos.line);
        let prev = grapheme::prev_boundary(&line_str, pos.byte);
        if prev == pos.byte {
            return;
        }
        let abs_start = self.absolute_byte_index(&Position {
            line: pos.line,
            byte: prev,
        });
        let abs_end = self.absolute_byte_index(pos);
        let start_char = self.rope.byte_to_char(abs_start);
        let end_char = self.rope.byte_to_char(abs_end);
        self.rope.remove(start_char..end_char);
        pos.byte = prev;
    }

    /// Delete the grapheme cluster at the position (like Normal mode 'x'). No-op if at line end.
    pub fn delete_grapheme_at(&mut self, pos: &mut Position) {
        let line_len = self.line_byte_len(pos.line);
        if pos.byte >= line_len {
            return;
        }
        let line_str = self.line_content_string(pos.line);
        let next = grapheme::next_boundary(&line_str, pos.byte);
        if next == pos.byte {
            return;
        }
        let abs_start = self.absolute_byte_index(pos);
        let abs_end = self.absolute_byte_index(&Position {
            line: pos.line,
            byte: next,
        });
        let start_char = self.rope.byte_to_char(abs_start);
        let end_char = self.rope.byte_to_char(abs_end);
        self.rope.remove(start_char..end_char);
        // Position stays at same byte (now pointing at next cluster or EOL)
    }

    /// Replace the grapheme at the cursor with `c` (Normal mode `r`). No-op at end of line.
    pub fn replace_char(&mut self, pos: &mut Position, c: char) {
        let line_len = self.line_byte_len(pos.line);
        if pos.byte >= line_len {
            return;
        }
        let start = pos.byte;
        self.delete_grapheme_at(pos);
        let mut insert_pos = Position::new(pos.line, start);
        self.insert_char(&mut insert_pos, c);
        pos.byte = start;
    }

    /// Delete an entire line (the `dd` building block). Returns the removed content
    /// (without trailing newline).
    pub fn delete_line(&mut self, idx: usize) -> String {
        if idx >= self.line_count() {
            return String::new();
        }
        let removed = self.line_trimmed(idx).unwrap_or_default();
        let start_char = self.rope.line_to_char(idx);
        let end_char = if idx + 1 < self.line_count() {
            self.rope.line_to_char(idx + 1)
        } else {
            self.rope.len_chars()
        };
        self.rope.remove(start_char..end_char);
        removed
    }

    /// Split the line at the cursor. Equivalent to `insert_newline` but named for callers
    /// building Insert-mode `<CR>` handling on top of it.
    pub fn split_line_at_cursor(&mut self, pos: &mut Position) {
        self.insert_newline(pos);
    }

    /// Replace the whole content of line `idx` with `content` (no embedded newlines).
    /// Used by substitution and indentation operators.
    pub fn set_line(&mut self, idx: usize, content: &str) {
        if idx >= self.line_count() {
            return;
        }
        let start_char = self.rope.line_to_char(idx);
        let line_len_chars = self.line_content_string(idx).chars().count();
        let end_char = start_char + line_len_chars;
        self.rope.remove(start_char..end_char);
        self.rope.insert(start_char, content);
    }

    /// Return the UTF-8 slice in the absolute byte range `[start,end)`.
    /// Caller guarantees `start <= end` and both on character boundaries.
    /// (Motion span resolver ensures grapheme boundaries which imply char boundaries.)
    pub fn slice_bytes(&self, start: usize, end: usize) -> String {
        if start >= end {
            return String::new();
        }
        let total = self.rope.len_bytes();
        let s = start.min(total);
        let e = end.min(total);
        if s >= e {
            return String::new();
        }
        // Translate byte offsets to char indices (rope.slice expects char range)
        let start_char = self.rope.byte_to_char(s);
        let end_char = self.rope.byte_to_char(e);
        debug_assert_eq!(self.rope.char_to_byte(start_char), s);
        debug_assert_eq!(self.rope.char_to_byte(end_char), e);
        self.rope.slice(start_char..end_char).to_string()
    }

    /// Delete the UTF-8 slice in absolute byte range `[start,end)` (clamped).
    /// Returns the removed text for register / undo integration.
    pub fn delete_bytes(&mut self, start: usize, end: usize) -> String {
        if start >= end {
            return String::new();
        }
        let total = self.rope.len_bytes();
        let s = start.min(total);
        let e = end.min(total);
        if s >= e {
            return String::new();
        }
        let start_char = self.rope.byte_to_char(s);
        let end_char = self.rope.byte_to_char(e);
        debug_assert_eq!(self.rope.char_to_byte(start_char), s);
        debug_assert_eq!(self.rope.char_to_byte(end_char), e);
        let removed = self.rope.slice(start_char..end_char).to_string();
        self.rope.remove(start_char..end_char);
        removed
    }

    /// Replace the UTF-8 slice in absolute byte range `[start,end)` with `replacement`.
    /// Used by `:s` substitution. Returns the text that was replaced.
    pub fn substitute_range(&mut self, start: usize, end: usize, replacement: &str) -> String {
        let removed = self.delete_bytes(start, end);
        let start_char = self.rope.byte_to_char(start.min(self.rope.len_bytes()));
        self.rope.insert(start_char, replacement);
        removed
    }
}

/// Grapheme and width utilities (Phase 1). These are pure helpers operating on a single line.
pub mod grapheme {
    use crate::egc_width;
    use unicode_segmentation::UnicodeSegmentation; // unified width function

    /// Iterate grapheme clusters in a line.
    pub fn iter(line: &str) -> impl Iterator<Item = &str> {
        line.graphemes(true)
    }

    /// Previous grapheme boundary (returns 0 if already at or below 1st boundary).
    pub fn prev_boundary(line: &str, byte: usize) -> usize {
        if byte == 0 || byte > line.len() {
            return 0;
        }
        let mut last = 0;
        for (idx, _) in line.grapheme_indices(true) {
            if idx >= byte {
                break;
            }
            last = idx;
        }
        last
    }

    /// Next grapheme boundary (returns line.len() if at or beyond end).
    pub fn next_boundary(line: &str, byte: usize) -> usize {
        if byte >= line.len() {
            return line.len();
        }
        for (idx, _) in line.grapheme_indices(true) {
            if idx > byte {
                return idx;
            }
        }
        line.len()
    }

    /// Compute visual column (terminal cells) up to (but not including) byte offset.
    pub fn visual_col(line: &str, byte: usize) -> usize {
        let mut col = 0;
        for (idx, g) in line.grapheme_indices(true) {
            if idx >= byte {
                break;
            }
            col += egc_width(g) as usize;
        }
        col
    }

    /// Width in terminal cells of this grapheme cluster.
    pub fn cluster_width(g: &str) -> usize {
        egc_width(g) as usize
    }

    /// Naive word classification: alphanumeric or underscore start.
    pub fn is_word(g: &str) -> bool {
        g.chars()
            .next()
            .map(|c| c == '_' || c.is_alphanumeric())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::grapheme;
    use super::*;
    use unicode_segmentation::UnicodeSegmentation;
    #[test]
    fn create_buffer_and_read_line() {
        let b = Buffer::from_str("test", "hello\nworld").unwrap();
        assert_eq!(b.line_count(), 2);
        assert_eq!(b.line(0).unwrap(), "hello\n");
        assert_eq!(b.line(1).unwrap(), "world");
    }

    #[test]
    fn grapheme_basic_emoji() {
        let s = "aüòÄb"; // üòÄ is single cluster width 2 usually
        let bytes_a = 0;
        let bytes_emoji = grapheme::next_boundary(s, grapheme::next_boundary(s, bytes_a));
        // Ensure prev/next boundaries align
        assert_eq!(
            grapheme::prev_boundary(s, bytes_emoji),
            grapheme::next_boundary(s, bytes_a)
        );
        let vcol_emoji = grapheme::visual_col(s, bytes_emoji);
        assert!(vcol_emoji >= 1); // At least after 'a'
    }

    #[test]
    fn grapheme_family_emoji() {
        let s = "üë®‚Äçüë©‚Äçüëß‚Äçüë¶X"; // family emoji + ASCII
        // family emoji should count width >= 2 (exact width may vary by terminal, accept >=1)
        let next = grapheme::next_boundary(s, 0);
        assert!(next <= s.len());
        let col = grapheme::visual_col(s, next);
        assert!(col >= 1);
    }

    #[test]
    fn grapheme_combining_mark() {
        let s = "eÃÅ"; // 'e' + U+0301 combining acute
        let nb = grapheme::next_boundary(s, 0);
        assert_eq!(nb, s.len()); // should be single cluster
        assert_eq!(grapheme::prev_boundary(s, nb), 0);
    }

    #[test]
    fn grapheme_cjk() {
        let s = "Êº¢Â≠ó"; // two CJK characters
        let first = grapheme::next_boundary(s, 0);
        let second = grapheme::next_boundary(s, first);
        assert!(second <= s.len());
        assert_eq!(grapheme::prev_boundary(s, second), first);
    }

    #[test]
    fn visual_col_mixed_sequences() {
        // Sequence: ASCII, emoji, combining mark, CJK, family emoji, ASCII
        let s = "aüòÄeÃÅÊº¢Â≠óüë®‚Äçüë©‚Äçüëß‚Äçüë¶Z"; // note combining sequence e + ‚óåÃÅ
        // Walk boundaries and ensure visual_col is non-decreasing and >= byte index of prior ASCII assumption
        let mut b = 0;
        let mut last_col = 0;
        while b < s.len() {
            let next = grapheme::next_boundary(s, b);
            let col = grapheme::visual_col(s, next);
            assert!(col >= last_col, "visual column must be non-decreasing");
            last_col = col;
            b = next;
        }
        // Final column should be at least number of distinct clusters
        // (Width may exceed cluster count due to wide glyphs; just assert lower bound)
        // Count clusters
        let clusters = s.graphemes(true).count();
        assert!(last_col >= clusters - 1);
    }

    #[test]
    fn visual_col_gear_variation_selector() {
        // Ensure gear emoji (with VS16) currently treated as width 1 under temporary override.
        let s = "a‚öôÔ∏èb"; // a, gear+VS16, b
        // byte offsets
        let after_a = grapheme::next_boundary(s, 0);
        let after_gear = grapheme::next_boundary(s, after_a);
        assert_eq!(grapheme::visual_col(s, after_a), 1);
        // Expect gear adds 1 column (temporary narrowing override)
        assert_eq!(grapheme::visual_col(s, after_gear), 2);
    }

    #[test]
    fn insert_grapheme_middle() {
        let mut b = Buffer::from_str("t", "abc").unwrap();
        let mut pos = Position::new(0, 1); // after 'a'
        b.insert_grapheme(&mut pos, "üòÄ");
        let line = b.line(0).unwrap();
        assert!(line.starts_with("a"));
        assert!(line.contains("üòÄ"));
        assert_eq!(pos.byte, 1 + "üòÄ".len());
    }

    #[test]
    fn insert_newline_split() {
        let mut b = Buffer::from_str("t", "abcd").unwrap();
        let mut pos = Position::new(0, 2);
        b.insert_newline(&mut pos);
        assert_eq!(b.line_count(), 2);
        assert_eq!(b.line(0).unwrap(), "ab\n");
        assert_eq!(b.line(1).unwrap(), "cd");
        assert_eq!(pos.line, 1);
        assert_eq!(pos.byte, 0);
    }

    #[test]
    fn delete_grapheme_before_simple() {
        let mut b = Buffer::from_str("t", "abüòÄc").unwrap();
        let mut pos = Position::new(0, b.line_byte_len(0));
        b.delete_grapheme_before(&mut pos); // remove 'c'
        b.delete_grapheme_before(&mut pos); // remove emoji cluster
        let line = b.line(0).unwrap();
        assert_eq!(line, "ab");
        assert_eq!(pos.byte, 2);
    }

    #[test]
    fn delete_grapheme_before_join_lines() {
        let mut b = Buffer::from_str("t", "ab\ncd").unwrap();
        let mut pos = Position::new(1, 0); // start of second line
        b.delete_grapheme_before(&mut pos); // should join lines
        assert_eq!(b.line_count(), 1);
        let line = b.line(0).unwrap();
        assert_eq!(line, "abcd");
        assert_eq!(pos.line, 0);
        assert_eq!(pos.byte, 2); // end of original first line
    }

    #[test]
    fn delete_grapheme_at_end_noop() {
        let mut b = Buffer::from_str("t", "hi").unwrap();
        let mut pos = Position::new(0, 2); // at end
        b.delete_grapheme_at(&mut pos); // no-op
        assert_eq!(b.line(0).unwrap(), "hi");
        assert_eq!(pos.byte, 2);
    }

    #[test]
    fn content_joins_without_trailing_newline() {
        let b = Buffer::from_str("t", "one\ntwo\nthree").unwrap();
        assert_eq!(b.content(), "one\ntwo\nthree");
    }

    #[test]
    fn insert_char_and_text() {
        let mut b = Buffer::from_str("t", "ac").unwrap();
        let mut pos = Position::new(0, 1);
        b.insert_char(&mut pos, 'b');
        assert_eq!(b.line_trimmed(0).unwrap(), "abc");

        let mut b2 = Buffer::from_str("t", "ac").unwrap();
        let mut pos2 = Position::new(0, 1);
        b2.insert_text(&mut pos2, "B\nC");
        assert_eq!(b2.line_count(), 2);
        assert_eq!(b2.line_trimmed(0).unwrap(), "aB");
        assert_eq!(b2.line_trimmed(1).unwrap(), "Cc");
        assert_eq!(pos2, Position::new(1, 1));
    }

    #[test]
    fn replace_char_basic() {
        let mut b = Buffer::from_str("t", "abc").unwrap();
        let mut pos = Position::new(0, 1);
        b.replace_char(&mut pos, 'X');
        assert_eq!(b.line(0).unwrap(), "aXc");
        assert_eq!(pos.byte, 1);
    }

    #[test]
    fn delete_line_removes_content_and_newline() {
        let mut b = Buffer::from_str("t", "a\nb\nc").unwrap();
        let removed = b.delete_line(1);
        assert_eq!(removed, "b");
        assert_eq!(b.line_count(), 2);
        assert_eq!(b.line_trimmed(0).unwrap(), "a");
        assert_eq!(b.line_trimmed(1).unwrap(), "c");
    }

    #[test]
    fn set_line_replaces_content_preserving_newline() {
        let mut b = Buffer::from_str("t", "abc\ndef\n").unwrap();
        b.set_line(0, "xyz");
        assert_eq!(b.line(0).unwrap(), "xyz\n");
    }

    #[test]
    fn substitute_range_replaces_match() {
        let mut b = Buffer::from_str("t", "foo bar foo").unwrap();
        let removed = b.substitute_range(8, 11, "baz");
        assert_eq!(removed, "foo");
        assert_eq!(b.line_trimmed(0).unwrap(), "foo bar baz");
    }

    #[test]
    fn position_roundtrip_through_absolute_index() {
        let b = Buffer::from_str("t", "one\ntwo\nthree\n").unwrap();
        for line in 0..b.line_count() {
            let pos = Position::new(line, 0);
            let abs = b.absolute_index(&pos);
            assert_eq!(b.position_at(abs), pos);
        }
    }
}
