//! Text object resolution (§4.H), grounded on the boundary-scanning
//! algorithms of the original implementation's `text_objects.py`: word/WORD
//! classify-and-expand, single-line sentence/quote scanning, blank-line
//! delimited multi-line paragraphs, and nested-depth bracket matching that
//! may cross several lines.
//!
//! Every resolver works in terms of `core_text::Buffer` byte offsets on the
//! cursor's line (or, for paragraph/bracket, a bounded scan of neighboring
//! lines) and returns `None` when the cursor isn't inside (or adjacent to,
//! for word/quote/bracket scans that tolerate landing just outside) any
//! instance of the object.

use core_keymap::TextObjectKind;
use core_state::{EditorState, SelectionKind, SelectionSpan};
use core_text::{Buffer, Position};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CharClass {
    Word,
    Punct,
    Space,
}

fn classify(c: char) -> CharClass {
    if c.is_whitespace() {
        CharClass::Space
    } else if c.is_alphanumeric() || c == '_' {
        CharClass::Word
    } else {
        CharClass::Punct
    }
}

/// Resolve a text object relative to `cursor`. Returns `None` if no instance
/// of the object can be found (e.g. no matching quote on the line).
pub fn resolve_text_object(state: &EditorState, cursor: Position, kind: TextObjectKind) -> Option<SelectionSpan> {
    let buffer = state.active_buffer();
    match kind {
        TextObjectKind::Word { around } => word_object(buffer, cursor, around, false),
        TextObjectKind::BigWord { around } => word_object(buffer, cursor, around, true),
        TextObjectKind::Sentence { around } => sentence_object(buffer, cursor, around),
        TextObjectKind::Paragraph { around } => paragraph_object(buffer, cursor, around),
        TextObjectKind::Quote { delim, around } => quote_object(buffer, cursor, delim, around),
        TextObjectKind::Bracket { open, around } => bracket_object(buffer, cursor, open, around),
    }
}

fn line_chars(buffer: &Buffer, line: usize) -> Vec<char> {
    buffer.line_trimmed(line).map(|s| s.chars().collect()).unwrap_or_default()
}

fn pos(line: usize, char_idx: usize, chars: &[char]) -> Position {
    let byte: usize = chars[..char_idx.min(chars.len())].iter().map(|c| c.len_utf8()).sum();
    Position { line, byte }
}

/// `iw`/`aw` (and the `iW`/`aW` BIG-word variants via `big`): expand left and
/// right from the cursor while the char class matches, then (for `around`)
/// swallow one contiguous run of adjoining whitespace, preferring trailing
/// whitespace and falling back to leading whitespace when there is none.
fn word_object(buffer: &Buffer, cursor: Position, around: bool, big: bool) -> Option<SelectionSpan> {
    let chars = line_chars(buffer, cursor.line);
    if chars.is_empty() {
        return None;
    }
    let classify_at = |c: char| -> CharClass {
        if big {
            if c.is_whitespace() { CharClass::Space } else { CharClass::Word }
        } else {
            classify(c)
        }
    };
    let start_idx = byte_to_char_idx(buffer, cursor);
    let start_idx = start_idx.min(chars.len().saturating_sub(1));
    let class = classify_at(chars[start_idx]);
    let mut left = start_idx;
    while left > 0 && classify_at(chars[left - 1]) == class {
        left -= 1;
    }
    let mut right = start_idx + 1;
    while right < chars.len() && classify_at(chars[right]) == class {
        right += 1;
    }
    if around {
        let before_ws = left;
        let mut trail = right;
        while trail < chars.len() && chars[trail].is_whitespace() {
            trail += 1;
        }
        if trail > right {
            right = trail;
        } else {
            while left > 0 && chars[left - 1].is_whitespace() {
                left -= 1;
            }
            let _ = before_ws;
        }
    }
    Some(SelectionSpan::new(pos(cursor.line, left, &chars), pos(cursor.line, right, &chars), SelectionKind::Characterwise))
}

fn byte_to_char_idx(buffer: &Buffer, cursor: Position) -> usize {
    let Some(line) = buffer.line_trimmed(cursor.line) else { return 0 };
    let mut idx = 0usize;
    let mut byte = 0usize;
    for c in line.chars() {
        if byte >= cursor.byte {
            return idx;
        }
        byte += c.len_utf8();
        idx += 1;
    }
    idx
}

/// Single-line sentence scan, delimited by `.`, `!`, `?` (the original
/// implementation's own "simplified" heuristic — no abbreviation handling).
fn sentence_object(buffer: &Buffer, cursor: Position, around: bool) -> Option<SelectionSpan> {
    let chars = line_chars(buffer, cursor.line);
    if chars.is_empty() {
        return None;
    }
    let is_end = |c: char| matches!(c, '.' | '!' | '?');
    let start_idx = byte_to_char_idx(buffer, cursor).min(chars.len().saturating_sub(1));
    let mut left = start_idx;
    while left > 0 && !is_end(chars[left - 1]) {
        left -= 1;
    }
    while left < chars.len() && chars[left].is_whitespace() {
        left += 1;
    }
    let mut right = start_idx;
    while right < chars.len() && !is_end(chars[right]) {
        right += 1;
    }
    if right < chars.len() {
        right += 1; // include the terminator itself
    }
    if around {
        while right < chars.len() && chars[right].is_whitespace() {
            right += 1;
        }
    }
    Some(SelectionSpan::new(pos(cursor.line, left, &chars), pos(cursor.line, right, &chars), SelectionKind::Characterwise))
}

/// Blank-line delimited paragraph (linewise), matching the original's
/// `line.strip()` truthiness test for "blank".
fn paragraph_object(buffer: &Buffer, cursor: Position, around: bool) -> Option<SelectionSpan> {
    let is_blank = |l: usize| buffer.line_trimmed(l).map(|s| s.trim().is_empty()).unwrap_or(true);
    let last = buffer.line_count().saturating_sub(1);
    let mut start = cursor.line;
    let mut end = cursor.line;
    if is_blank(cursor.line) {
        while start > 0 && is_blank(start - 1) {
            start -= 1;
        }
        while end < last && is_blank(end + 1) {
            end += 1;
        }
    } else {
        while start > 0 && !is_blank(start - 1) {
            start -= 1;
        }
        while end < last && !is_blank(end + 1) {
            end += 1;
        }
    }
    if around {
        let before = end;
        while end < last && is_blank(end + 1) {
            end += 1;
        }
        if end == before {
            while start > 0 && is_blank(start - 1) {
                start -= 1;
            }
        }
    }
    Some(SelectionSpan::new(
        Position { line: start, byte: 0 },
        Position { line: (end + 1).min(last), byte: 0 },
        SelectionKind::Linewise,
    ))
}

/// Scan backward on the cursor's line for an opening `delim`, then forward
/// for the next occurrence; `inner` excludes both delimiter characters.
fn quote_object(buffer: &Buffer, cursor: Position, delim: char, around: bool) -> Option<SelectionSpan> {
    let chars = line_chars(buffer, cursor.line);
    if chars.is_empty() {
        return None;
    }
    let start_idx = byte_to_char_idx(buffer, cursor).min(chars.len().saturating_sub(1));
    let mut open = None;
    let mut i = start_idx;
    loop {
        if chars[i] == delim {
            open = Some(i);
            break;
        }
        if i == 0 {
            break;
        }
        i -= 1;
    }
    let open = open?;
    let close = (open + 1..chars.len()).find(|&j| chars[j] == delim)?;
    let (left, right) = if around { (open, close + 1) } else { (open + 1, close) };
    Some(SelectionSpan::new(pos(cursor.line, left, &chars), pos(cursor.line, right, &chars), SelectionKind::Characterwise))
}

/// Nested-depth bracket match, allowed to cross multiple lines: scans
/// backward counting close/open pairs to find the enclosing opener, then
/// forward from there counting open/close pairs to find its matching closer.
fn bracket_object(buffer: &Buffer, cursor: Position, open_char: char, around: bool) -> Option<SelectionSpan> {
    let close_char = core_text::BRACKET_PAIRS.iter().find(|(o, _)| *o == open_char).map(|(_, c)| *c)?;
    let cursor_abs = absolute_index(buffer, cursor);
    let content = buffer.content();
    let chars: Vec<char> = content.chars().collect();
    let char_offsets: Vec<usize> = {
        let mut offs = Vec::with_capacity(chars.len() + 1);
        let mut b = 0usize;
        for c in &chars {
            offs.push(b);
            b += c.len_utf8();
        }
        offs.push(b);
        offs
    };
    let cursor_char_idx = char_offsets.partition_point(|&b| b <= cursor_abs).saturating_sub(1);

    let mut depth = 0i32;
    let mut open_idx = None;
    let mut i = cursor_char_idx.min(chars.len().saturating_sub(1));
    loop {
        match chars[i] {
            c if c == close_char && i != cursor_char_idx => depth += 1,
            c if c == open_char => {
                if depth == 0 {
                    open_idx = Some(i);
                    break;
                }
                depth -= 1;
            }
            _ => {}
        }
        if i == 0 {
            break;
        }
        i -= 1;
    }
    let open_idx = open_idx?;

    depth = 0;
    let mut close_idx = None;
    for (j, &c) in chars.iter().enumerate().skip(open_idx + 1) {
        if c == open_char {
            depth += 1;
        } else if c == close_char {
            if depth == 0 {
                close_idx = Some(j);
                break;
            }
            depth -= 1;
        }
    }
    let close_idx = close_idx?;

    let (left_idx, right_idx) = if around { (open_idx, close_idx + 1) } else { (open_idx + 1, close_idx) };
    Some(SelectionSpan::new(
        buffer.position_at(char_offsets[left_idx]),
        buffer.position_at(char_offsets[right_idx]),
        SelectionKind::Characterwise,
    ))
}

fn absolute_index(buffer: &Buffer, pos: Position) -> usize {
    buffer.absolute_index(&pos)
}
