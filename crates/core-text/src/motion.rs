//! Cursor motion helpers (Phase 1).
//!
//! These operate purely on a `Buffer` + `Position` pair and are free of global editor state.
//! Future phases (multi-cursor, selections, operators) can build on this without depending
//! on higher-level crates.

use crate::{Buffer, Position, grapheme};

/// Normalize a position for Vim Normal-mode semantics:
/// If the cursor byte is exactly at the end-of-line (line_len) and the line is non-empty,
/// clamp it to the start byte of the last grapheme cluster so the cursor rests on a real
/// character cell (Vim block cursor behavior). No change for empty lines.
pub fn normalize_normal_mode_position(buf: &Buffer, pos: &mut Position) {
    if pos.line >= buf.line_count() {
        return;
    }
    let line_len = buf.line_byte_len(pos.line); // excludes trailing newline
    if line_len == 0 {
        return;
    }
    if pos.byte == line_len {
        // clamp
        if let Some(line_full) = buf.line(pos.line) {
            let content = if line_full.ends_with('\n') {
                &line_full[..line_full.len() - 1]
            } else {
                &line_full
            };
            let prev = grapheme::prev_boundary(content, content.len());
            pos.byte = prev;
        }
    } else if pos.byte > line_len {
        // defensive clamp if ever past end
        pos.byte = line_len.saturating_sub(1); // will be normalized again if needed
        if let Some(line_full) = buf.line(pos.line) {
            let content = if line_full.ends_with('\n') {
                &line_full[..line_full.len() - 1]
            } else {
                &line_full
            };
            pos.byte = grapheme::prev_boundary(content, content.len());
        }
    }
}

/// Move left one grapheme boundary.
pub fn left(buf: &Buffer, pos: &mut Position) {
    if pos.byte == 0 {
        return;
    }
    if let Some(line) = buf.line(pos.line) {
        let content = if line.ends_with('\n') {
            &line[..line.len() - 1]
        } else {
            &line
        };
        let prev = grapheme::prev_boundary(content, pos.byte);
        pos.byte = prev;
    }
}

/// Move right one grapheme boundary.
pub fn right(buf: &Buffer, pos: &mut Position) {
    if let Some(line) = buf.line(pos.line) {
        let content = if line.ends_with('\n') {
            &line[..line.len() - 1]
        } else {
            &line
        };
        let next = grapheme::next_boundary(content, pos.byte);
        if next > pos.byte {
            pos.byte = next;
        }
    }
}

/// Move to start of line.
pub fn line_start(_buf: &Buffer, pos: &mut Position) {
    pos.byte = 0;
}

/// Move to end of line (after last grapheme).
pub fn line_end(buf: &Buffer, pos: &mut Position) {
    pos.byte = buf.line_byte_len(pos.line);
}

/// Move up one line preserving a target visual column (sticky). Returns the updated sticky column.
/// Caller should maintain the returned sticky column across successive vertical motions. If `sticky_col`
/// is `None`, it will be computed from the current position's visual column.
pub fn up(buf: &Buffer, pos: &mut Position, mut sticky_col: Option<usize>) -> Option<usize> {
    if pos.line == 0 {
        return sticky_col;
    }
    let current_line = buf.line(pos.line).unwrap_or_default();
    let current_content = if current_line.ends_with('\n') {
        &current_line[..current_line.len() - 1]
    } else {
        &current_line
    };
    if sticky_col.is_none() {
        sticky_col = Some(grapheme::visual_col(current_content, pos.byte));
    }
    pos.line -= 1;
    pos.byte = byte_for_visual_col(buf, pos.line, sticky_col.unwrap());
    sticky_col
}

/// Move down one line preserving sticky visual column.
pub fn down(buf: &Buffer, pos: &mut Position, mut sticky_col: Option<usize>) -> Option<usize> {
    if pos.line + 1 >= buf.line_count() {
        return sticky_col;
    }
    let current_line = buf.line(pos.line).unwrap_or_default();
    let current_content = if current_line.ends_with('\n') {
        &current_line[..current_line.len() - 1]
    } else {
        &current_line
    };
    if sticky_col.is_none() {
        sticky_col = Some(grapheme::visual_col(current_content, pos.byte));
    }
    pos.line += 1;
    pos.byte = byte_for_visual_col(buf, pos.line, sticky_col.unwrap());
    sticky_col
}

/// Convert a target visual column into a byte offset on a given line, clamping to line end.
fn byte_for_visual_col(buf: &Buffer, line: usize, target_col: usize) -> usize {
    if let Some(line_str) = buf.line(line) {
        let content = if line_str.ends_with('\n') {
            &line_str[..line_str.len() - 1]
        } else {
            &line_str
        };
        let mut col = 0;
        let mut byte = 0;
        for (b, g) in unicode_segmentation::UnicodeSegmentation::grapheme_indices(content, true) {
            let w = grapheme::cluster_width(g);
            if col + w > target_col {
                return b;
            }
            col += w;
            byte = b + g.len();
        }
        return byte; // end of line
    }
    0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClusterKind {
    Word,
    Blank,
    Other,
}

fn classify_cluster(cluster: &str) -> ClusterKind {
    if grapheme::is_word(cluster) {
        ClusterKind::Word
    } else if cluster.chars().all(|c| c.is_whitespace()) {
        ClusterKind::Blank
    } else {
        ClusterKind::Other
    }
}

fn line_without_newline(buf: &Buffer, idx: usize) -> String {
    buf.line(idx)
        .map(|mut l| {
            if l.ends_with('\n') {
                l.pop();
            }
            l
        })
        .unwrap_or_default()
}

fn advance_line_forward(
    buf: &Buffer,
    line: &mut usize,
    byte: &mut usize,
    line_content: &mut String,
) -> bool {
    if *line + 1 >= buf.line_count() {
        *byte = line_content.len();
        return false;
    }
    *line += 1;
    *line_content = line_without_newline(buf, *line);
    *byte = 0;
    true
}

fn skip_blanks_forward(
    buf: &Buffer,
    line: &mut usize,
    byte: &mut usize,
    line_content: &mut String,
) -> bool {
    loop {
        if *byte >= line_content.len() {
            if !advance_line_forward(buf, line, byte, line_content) {
                return false;
            }
            if line_content.is_empty() {
                continue;
            }
        }
        let nb = grapheme::next_boundary(line_content, *byte);
        let cluster = &line_content[*byte..nb];
        if classify_cluster(cluster) == ClusterKind::Blank {
            *byte = nb;
            continue;
        }
        return true;
    }
}

fn skip_kind_in_line(line: &str, mut byte: usize, kind: ClusterKind) -> usize {
    while byte < line.len() {
        let nb = grapheme::next_boundary(line, byte);
        let cluster = &line[byte..nb];
        if classify_cluster(cluster) != kind {
            break;
        }
        byte = nb;
    }
    byte
}

fn retreat_line(
    buf: &Buffer,
    line: &mut usize,
    byte: &mut usize,
    line_content: &mut String,
) -> bool {
    if *line == 0 {
        return false;
    }
    *line -= 1;
    *line_content = line_without_newline(buf, *line);
    *byte = line_content.len();
    true
}

/// Move forward to the start of the next token following Vim `w` semantics.
/// - Word tokens consist of Unicode letters, digits, underscores, and apostrophes (for contractions).
/// - Punctuation tokens (non-word, non-whitespace graphemes) are treated as standalone stops.
/// - Whitespace is skipped until the next word or punctuation token, traversing lines as needed.
pub fn word_forward(buf: &Buffer, pos: &mut Position) {
    if buf.line_count() == 0 {
        return;
    }
    let mut line = pos.line.min(buf.line_count() - 1);
    let mut line_content = line_without_newline(buf, line);
    let mut byte = pos.byte.min(line_content.len());
    if byte >= line_content.len() {
        let _ = skip_blanks_forward(buf, &mut line, &mut byte, &mut line_content);
        pos.line = line;
        pos.byte = byte;
        return;
    }

    let nb = grapheme::next_boundary(&line_content, byte);
    let cluster = &line_content[byte..nb];
    byte = match classify_cluster(cluster) {
        ClusterKind::Blank => nb,
        ClusterKind::Word => skip_kind_in_line(&line_content, byte, ClusterKind::Word),
        ClusterKind::Other => skip_kind_in_line(&line_content, byte, ClusterKind::Other),
    };
    let _ = skip_blanks_forward(buf, &mut line, &mut byte, &mut line_content);
    pos.line = line;
    pos.byte = byte;
}

/// Move backward to the start of the previous token following Vim `b` semantics.
/// If currently at the start of a token, move to the beginning of the prior word or punctuation token,
/// skipping intervening whitespace and blank lines.
pub fn word_backward(buf: &Buffer, pos: &mut Position) {
    if buf.line_count() == 0 {
        return;
    }
    let mut line = pos.line.min(buf.line_count() - 1);
    let mut line_content = line_without_newline(buf, line);
    let mut byte = pos.byte.min(line_content.len());

    loop {
        if byte == 0 {
            if !retreat_line(buf, &mut line, &mut byte, &mut line_content) {
                pos.line = 0;
                pos.byte = 0;
                return;
            }
            continue;
        }
        let prev_b = grapheme::prev_boundary(&line_content, byte);
        if prev_b == byte {
            if !retreat_line(buf, &mut line, &mut byte, &mut line_content) {
                pos.line = 0;
                pos.byte = 0;
                return;
            }
            continue;
        }
        let cluster = &line_content[prev_b..byte];
        let kind = classify_cluster(cluster);
        match kind {
            ClusterKind::Blank => {
                byte = prev_b;
                continue;
            }
            ClusterKind::Word | ClusterKind::Other => {
                byte = prev_b;
                while byte > 0 {
                    let before = grapheme::prev_boundary(&line_content, byte);
                    if before == byte {
                        break;
                    }
                    let prev_cluster = &line_content[before..byte];
                    if classify_cluster(prev_cluster) != kind {
                        break;
                    }
                    byte = before;
                }
                pos.line = line;
                pos.byte = byte;
                return;
            }
        }
    }
}

/// Move to the first non-blank character of the current line (`^`).
pub fn first_non_blank(buf: &Buffer, pos: &mut Position) {
    let content = line_without_newline(buf, pos.line);
    let mut byte = 0;
    while byte < content.len() {
        let nb = grapheme::next_boundary(&content, byte);
        let cluster = &content[byte..nb];
        if classify_cluster(cluster) != ClusterKind::Blank {
            break;
        }
        byte = nb;
    }
    pos.byte = byte;
}

/// Jump to the first line of the buffer, at its first non-blank column (`gg`).
pub fn goto_first_line(buf: &Buffer, pos: &mut Position) {
    pos.line = 0;
    pos.byte = 0;
    first_non_blank(buf, pos);
}

/// Jump to an absolute 1-based line number (`G`/`NG`), landing on the first non-blank column.
/// `line_number == None` means "last line" (bare `G`).
pub fn goto_line(buf: &Buffer, pos: &mut Position, line_number: Option<usize>) {
    if buf.line_count() == 0 {
        pos.line = 0;
        pos.byte = 0;
        return;
    }
    let target = match line_number {
        Some(n) => n.saturating_sub(1).min(buf.line_count() - 1),
        None => buf.line_count() - 1,
    };
    pos.line = target;
    pos.byte = 0;
    first_non_blank(buf, pos);
}

/// Move forward to the end of the current or next word (`e`), following Vim's
/// "inclusive" end-of-word semantics: an `e` issued mid-word jumps to the end
/// of that word; issued at the end of a word it jumps to the end of the next one.
pub fn word_end_forward(buf: &Buffer, pos: &mut Position) {
    if buf.line_count() == 0 {
        return;
    }
    let mut line = pos.line.min(buf.line_count() - 1);
    let mut line_content = line_without_newline(buf, line);
    let mut byte = pos.byte.min(line_content.len());

    loop {
        if byte >= line_content.len() {
            if !advance_line_forward(buf, &mut line, &mut byte, &mut line_content) {
                pos.line = line;
                pos.byte = byte;
                return;
            }
            continue;
        }
        let nb = grapheme::next_boundary(&line_content, byte);
        let cluster = &line_content[byte..nb];
        let kind = classify_cluster(cluster);
        if kind == ClusterKind::Blank {
            byte = nb;
            continue;
        }
        // Advance through this token to find the start of its last cluster.
        let mut end = byte;
        loop {
            let next_b = grapheme::next_boundary(&line_content, end);
            if next_b >= line_content.len() {
                end = next_b;
                break;
            }
            let c = &line_content[end..next_b];
            if classify_cluster(c) != kind {
                break;
            }
            end = next_b;
        }
        let candidate_end = grapheme::prev_boundary(&line_content, end.min(line_content.len()));
        if candidate_end > pos.byte || line != pos.line {
            pos.line = line;
            pos.byte = candidate_end;
            return;
        }
        byte = end;
    }
}

/// WORD-granularity forward motion (`W`): tokens are separated by whitespace only,
/// no Word/Other distinction.
pub fn big_word_forward(buf: &Buffer, pos: &mut Position) {
    if buf.line_count() == 0 {
        return;
    }
    let mut line = pos.line.min(buf.line_count() - 1);
    let mut line_content = line_without_newline(buf, line);
    let mut byte = pos.byte.min(line_content.len());

    if byte < line_content.len() {
        while byte < line_content.len() {
            let nb = grapheme::next_boundary(&line_content, byte);
            let cluster = &line_content[byte..nb];
            if classify_cluster(cluster) == ClusterKind::Blank {
                break;
            }
            byte = nb;
        }
    }
    let _ = skip_blanks_forward(buf, &mut line, &mut byte, &mut line_content);
    pos.line = line;
    pos.byte = byte;
}

/// WORD-granularity backward motion (`B`).
pub fn big_word_backward(buf: &Buffer, pos: &mut Position) {
    if buf.line_count() == 0 {
        return;
    }
    let mut line = pos.line.min(buf.line_count() - 1);
    let mut line_content = line_without_newline(buf, line);
    let mut byte = pos.byte.min(line_content.len());

    loop {
        if byte == 0 {
            if !retreat_line(buf, &mut line, &mut byte, &mut line_content) {
                pos.line = 0;
                pos.byte = 0;
                return;
            }
            continue;
        }
        let prev_b = grapheme::prev_boundary(&line_content, byte);
        if prev_b == byte {
            if !retreat_line(buf, &mut line, &mut byte, &mut line_content) {
                pos.line = 0;
                pos.byte = 0;
                return;
            }
            continue;
        }
        let cluster = &line_content[prev_b..byte];
        if classify_cluster(cluster) == ClusterKind::Blank {
            byte = prev_b;
            continue;
        }
        byte = prev_b;
        while byte > 0 {
            let before = grapheme::prev_boundary(&line_content, byte);
            if before == byte {
                break;
            }
            let prev_cluster = &line_content[before..byte];
            if classify_cluster(prev_cluster) == ClusterKind::Blank {
                break;
            }
            byte = before;
        }
        pos.line = line;
        pos.byte = byte;
        return;
    }
}

/// WORD-granularity end-of-token motion (`E`).
pub fn big_word_end_forward(buf: &Buffer, pos: &mut Position) {
    if buf.line_count() == 0 {
        return;
    }
    let mut line = pos.line.min(buf.line_count() - 1);
    let mut line_content = line_without_newline(buf, line);
    let mut byte = pos.byte.min(line_content.len());

    loop {
        if byte >= line_content.len() {
            if !advance_line_forward(buf, &mut line, &mut byte, &mut line_content) {
                pos.line = line;
                pos.byte = byte;
                return;
            }
            continue;
        }
        let nb = grapheme::next_boundary(&line_content, byte);
        let cluster = &line_content[byte..nb];
        if classify_cluster(cluster) == ClusterKind::Blank {
            byte = nb;
            continue;
        }
        let mut end = byte;
        loop {
            let next_b = grapheme::next_boundary(&line_content, end);
            if next_b >= line_content.len() {
                end = next_b;
                break;
            }
            let c = &line_content[end..next_b];
            if classify_cluster(c) == ClusterKind::Blank {
                break;
            }
            end = next_b;
        }
        let candidate_end = if end >= line_content.len() {
            grapheme::prev_boundary(&line_content, line_content.len())
        } else {
            grapheme::prev_boundary(&line_content, end)
        };
        if candidate_end > pos.byte || line != pos.line {
            pos.line = line;
            pos.byte = candidate_end;
            return;
        }
        byte = end;
    }
}

/// Move to the next paragraph boundary (`}`): the next blank line, or end of buffer.
pub fn paragraph_forward(buf: &Buffer, pos: &mut Position) {
    let mut line = pos.line;
    if buf.line_count() == 0 {
        return;
    }
    let starting_blank = line_without_newline(buf, line).trim().is_empty();
    line += 1;
    while line < buf.line_count() {
        let content = line_without_newline(buf, line);
        let is_blank = content.trim().is_empty();
        if is_blank && !(starting_blank && line == pos.line + 1) {
            pos.line = line;
            pos.byte = 0;
            return;
        }
        line += 1;
    }
    pos.line = buf.line_count() - 1;
    pos.byte = buf.line_byte_len(pos.line);
}

/// Move to the previous paragraph boundary (`{`): the previous blank line, or start of buffer.
pub fn paragraph_backward(buf: &Buffer, pos: &mut Position) {
    if pos.line == 0 {
        pos.byte = 0;
        return;
    }
    let mut line = pos.line;
    line -= 1;
    while line > 0 {
        let content = line_without_newline(buf, line);
        if content.trim().is_empty() && line != pos.line - 1 {
            pos.line = line;
            pos.byte = 0;
            return;
        }
        if line == 0 {
            break;
        }
        line -= 1;
    }
    pos.line = 0;
    pos.byte = 0;
}

/// Move to a viewport-relative line: top (`H`), middle (`M`), or bottom (`L`) of
/// the visible window `[viewport_top, viewport_top + viewport_height)`.
pub fn viewport_high(buf: &Buffer, pos: &mut Position, viewport_top: usize) {
    let target = viewport_top.min(buf.line_count().saturating_sub(1));
    pos.line = target;
    first_non_blank(buf, pos);
}

pub fn viewport_middle(buf: &Buffer, pos: &mut Position, viewport_top: usize, viewport_height: usize) {
    let last_line = buf.line_count().saturating_sub(1);
    let bottom = (viewport_top + viewport_height.saturating_sub(1)).min(last_line);
    let target = (viewport_top + bottom) / 2;
    pos.line = target.min(last_line);
    first_non_blank(buf, pos);
}

pub fn viewport_low(buf: &Buffer, pos: &mut Position, viewport_top: usize, viewport_height: usize) {
    let last_line = buf.line_count().saturating_sub(1);
    let target = (viewport_top + viewport_height.saturating_sub(1)).min(last_line);
    pos.line = target;
    first_non_blank(buf, pos);
}

/// Find the matching bracket for the one under (or after) the cursor (`%`), tracking
/// nesting depth. Returns `true` and updates `pos` on success.
pub fn matching_bracket(buf: &Buffer, pos: &mut Position) -> bool {
    let content = line_without_newline(buf, pos.line);
    let mut search_byte = pos.byte;
    let mut found: Option<(char, char, bool)> = None;
    while search_byte < content.len() {
        let nb = grapheme::next_boundary(&content, search_byte);
        let cluster = &content[search_byte..nb];
        if let Some(c) = cluster.chars().next() {
            if let Some((open, close)) = crate::BRACKET_PAIRS.iter().find(|(o, c2)| *o == c || *c2 == c) {
                let is_open = c == *open;
                found = Some((*open, *close, is_open));
                search_byte = nb;
                break;
            }
        }
        search_byte = nb;
    }
    let (open, close, is_open) = match found {
        Some(v) => v,
        None => return false,
    };
    let start_byte = grapheme::prev_boundary(&content, search_byte);

    if is_open {
        let mut depth = 1i64;
        let mut line = pos.line;
        let mut byte = search_byte;
        let mut line_content = content;
        loop {
            if byte >= line_content.len() {
                line += 1;
                if line >= buf.line_count() {
                    return false;
                }
                line_content = line_without_newline(buf, line);
                byte = 0;
                continue;
            }
            let nb = grapheme::next_boundary(&line_content, byte);
            let cluster = &line_content[byte..nb];
            if let Some(c) = cluster.chars().next() {
                if c == open {
                    depth += 1;
                } else if c == close {
                    depth -= 1;
                    if depth == 0 {
                        pos.line = line;
                        pos.byte = byte;
                        return true;
                    }
                }
            }
            byte = nb;
        }
    } else {
        let mut depth = 1i64;
        let mut line = pos.line;
        let mut byte = start_byte;
        let mut line_content = line_without_newline(buf, line);
        loop {
            if byte == 0 {
                if line == 0 {
                    return false;
                }
                line -= 1;
                line_content = line_without_newline(buf, line);
                byte = line_content.len();
                continue;
            }
            let prev_b = grapheme::prev_boundary(&line_content, byte);
            let cluster = &line_content[prev_b..byte];
            if let Some(c) = cluster.chars().next() {
                if c == close {
                    depth += 1;
                } else if c == open {
                    depth -= 1;
                    if depth == 0 {
                        pos.line = line;
                        pos.byte = prev_b;
                        return true;
                    }
                }
            }
            byte = prev_b;
        }
    }
}

/// Find-char direction for `f`/`F`/`t`/`T`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FindCharKind {
    /// `f{char}` — move onto the next occurrence.
    ForwardTo,
    /// `F{char}` — move onto the previous occurrence.
    BackwardTo,
    /// `t{char}` — move just before the next occurrence.
    ForwardTill,
    /// `T{char}` — move just after (on the far side of) the previous occurrence.
    BackwardTill,
}

/// Perform a single-line find-char motion. Returns `true` if the target character
/// was found and `pos` was updated; `false` leaves `pos` unchanged.
pub fn find_char(buf: &Buffer, pos: &mut Position, kind: FindCharKind, target: char) -> bool {
    let content = line_without_newline(buf, pos.line);
    match kind {
        FindCharKind::ForwardTo | FindCharKind::ForwardTill => {
            let mut byte = grapheme::next_boundary(&content, pos.byte);
            while byte < content.len() {
                let nb = grapheme::next_boundary(&content, byte);
                if content[byte..nb].chars().next() == Some(target) {
                    pos.byte = if kind == FindCharKind::ForwardTill {
                        grapheme::prev_boundary(&content, byte)
                    } else {
                        byte
                    };
                    return true;
                }
                byte = nb;
            }
            false
        }
        FindCharKind::BackwardTo | FindCharKind::BackwardTill => {
            let mut byte = pos.byte;
            while byte > 0 {
                let prev_b = grapheme::prev_boundary(&content, byte);
                if content[prev_b..byte].chars().next() == Some(target) {
                    pos.byte = if kind == FindCharKind::BackwardTill {
                        grapheme::next_boundary(&content, prev_b)
                    } else {
                        prev_b
                    };
                    return true;
                }
                byte = prev_b;
            }
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn horizontal_and_line_boundaries() {
        let buf = Buffer::from_str("t", "abðŸ˜€c").unwrap();
        let mut pos = Position::origin();
        // Move right until end
        while pos.byte < buf.line_byte_len(0) {
            right(&buf, &mut pos);
        }
        let end = buf.line_byte_len(0);
        assert_eq!(pos.byte, end);
        // Move left twice
        left(&buf, &mut pos);
        left(&buf, &mut pos);
        assert!(pos.byte < end);
        // Jump to start and back to end
        line_start(&buf, &mut pos);
        assert_eq!(pos.byte, 0);
        line_end(&buf, &mut pos);
        assert_eq!(pos.byte, end);
    }

    #[test]
    fn vertical_motions_basic_and_sticky() {
        let buf = Buffer::from_str("t", "aðŸ˜€\nxyz\nlonger line here").unwrap();
        let mut pos = Position::new(0, 0);
        // Move right over 'a'
        right(&buf, &mut pos);
        // Now over emoji
        right(&buf, &mut pos);
        // Capture sticky by moving down twice
        let mut sticky = None;
        sticky = down(&buf, &mut pos, sticky);
        let first_col_byte = pos.byte;
        sticky = down(&buf, &mut pos, sticky);
        // Move up and ensure we land at same visual column (or line end if shorter)
        sticky = up(&buf, &mut pos, sticky);
        assert_eq!(pos.line, 1); // moved back to second line
        up(&buf, &mut pos, sticky); // now top line again
        assert_eq!(pos.line, 0);
        assert!(pos.byte >= first_col_byte); // On first line width may clamp (emoji wide)
    }

    #[test]
    fn word_forward_and_backward_basic() {
        let buf = Buffer::from_str("t", "foo, bar can't stop 123!").unwrap();
        let line0 = buf.line(0).unwrap();
        let comma_idx = line0.find(',').unwrap();
        let bar_idx = line0.find("bar").unwrap();
        let cant_idx = line0.find("can't").unwrap();
        let stop_idx = line0.find("stop").unwrap();
        let digits_idx = line0.find("123").unwrap();
        let excl_idx = line0.find('!').unwrap();

        let mut pos = Position::new(0, 0);
        word_forward(&buf, &mut pos);
        assert_eq!((pos.line, pos.byte), (0, comma_idx));
        word_forward(&buf, &mut pos);
        assert_eq!((pos.line, pos.byte), (0, bar_idx));
        word_forward(&buf, &mut pos);
        assert_eq!((pos.line, pos.byte), (0, cant_idx));
        word_forward(&buf, &mut pos);
        assert_eq!((pos.line, pos.byte), (0, stop_idx));
        word_forward(&buf, &mut pos);
        assert_eq!((pos.line, pos.byte), (0, digits_idx));
        word_forward(&buf, &mut pos);
        assert_eq!((pos.line, pos.byte), (0, excl_idx));

        // Starting on an internal apostrophe should treat it as part of the word
        let apost_idx = line0.find('\'').unwrap();
        pos.byte = apost_idx;
        word_forward(&buf, &mut pos);
        assert_eq!((pos.line, pos.byte), (0, stop_idx));

        // Backwards from end-of-line traverses punctuation and words
        pos.byte = buf.line_byte_len(0);
        word_backward(&buf, &mut pos);
        assert_eq!((pos.line, pos.byte), (0, excl_idx));
        word_backward(&buf, &mut pos);
        assert_eq!((pos.line, pos.byte), (0, digits_idx));
        word_backward(&buf, &mut pos);
        assert_eq!((pos.line, pos.byte), (0, stop_idx));
        word_backward(&buf, &mut pos);
        assert_eq!((pos.line, pos.byte), (0, cant_idx));
        word_backward(&buf, &mut pos);
        assert_eq!((pos.line, pos.byte), (0, bar_idx));
        word_backward(&buf, &mut pos);
        assert_eq!((pos.line, pos.byte), (0, comma_idx));
        word_backward(&buf, &mut pos);
        assert_eq!((pos.line, pos.byte), (0, 0));
    }

    #[test]
    fn word_motion_cross_line_edges() {
        // Ensures word_forward at end of line moves to first word of next non-empty line and backward wraps.
        let buf = Buffer::from_str("t", "alpha\n\n Î²eta Î³amma\n    \nðŸ˜€ emoji\n").unwrap();
        let mut pos = Position::new(0, 0); // at 'alpha'

        // Forward jumps over blank lines and leading whitespace
        word_forward(&buf, &mut pos);
        assert_eq!(pos.line, 2);
        let beta_idx = buf.line(2).unwrap().find("Î²eta").unwrap();
        assert_eq!(pos.byte, beta_idx);

        // Next word on same line is Î³amma
        word_forward(&buf, &mut pos);
        let gamma_idx = buf.line(2).unwrap().find("Î³amma").unwrap();
        assert_eq!(pos.byte, gamma_idx);

        // Forward again should reach the emoji punctuation token on final line
        word_forward(&buf, &mut pos);
        assert_eq!(pos.line, 4);
        let emoji_idx = buf.line(4).unwrap().find("ðŸ˜€").unwrap();
        assert_eq!(pos.byte, emoji_idx);

        // Backwards from emoji returns to Î³amma despite intervening blank line
        word_backward(&buf, &mut pos);
        assert_eq!(pos.line, 2);
        assert_eq!(pos.byte, gamma_idx);
    }

    #[test]
    fn first_non_blank_skips_leading_whitespace() {
        let buf = Buffer::from_str("t", "   indented text").unwrap();
        let mut pos = Position::new(0, 0);
        first_non_blank(&buf, &mut pos);
        assert_eq!(pos.byte, 3);
    }

    #[test]
    fn goto_line_and_first_last() {
        let buf = Buffer::from_str("t", "one\ntwo\n  three").unwrap();
        let mut pos = Position::new(2, 0);
        goto_first_line(&buf, &mut pos);
        assert_eq!(pos.line, 0);
        goto_line(&buf, &mut pos, None);
        assert_eq!(pos.line, 2);
        assert_eq!(pos.byte, 2); // first non-blank of "  three"
        goto_line(&buf, &mut pos, Some(2));
        assert_eq!(pos.line, 1);
    }

    #[test]
    fn word_end_forward_basic() {
        let buf = Buffer::from_str("t", "foo bar baz").unwrap();
        let mut pos = Position::new(0, 0);
        word_end_forward(&buf, &mut pos);
        assert_eq!(pos.byte, 2); // end of "foo"
        word_end_forward(&buf, &mut pos);
        assert_eq!(pos.byte, 6); // end of "bar"
        word_end_forward(&buf, &mut pos);
        assert_eq!(pos.byte, 10); // end of "baz"
    }

    #[test]
    fn big_word_motions_ignore_punctuation_splits() {
        let buf = Buffer::from_str("t", "foo.bar baz-qux").unwrap();
        let mut pos = Position::new(0, 0);
        big_word_forward(&buf, &mut pos);
        assert_eq!(pos.byte, 8); // jumps straight to "baz-qux", treating foo.bar as one WORD
        big_word_backward(&buf, &mut pos);
        assert_eq!(pos.byte, 0);

        let mut pos2 = Position::new(0, 0);
        big_word_end_forward(&buf, &mut pos2);
        assert_eq!(pos2.byte, 6); // end of "foo.bar"
    }

    #[test]
    fn paragraph_motions_find_blank_lines() {
        let buf = Buffer::from_str("t", "a\nb\n\nc\nd\n\ne").unwrap();
        let mut pos = Position::new(0, 0);
        paragraph_forward(&buf, &mut pos);
        assert_eq!(pos.line, 2);
        paragraph_forward(&buf, &mut pos);
        assert_eq!(pos.line, 5);
        paragraph_backward(&buf, &mut pos);
        assert_eq!(pos.line, 2);
        paragraph_backward(&buf, &mut pos);
        assert_eq!(pos.line, 0);
    }

    #[test]
    fn viewport_relative_motions() {
        let buf = Buffer::from_str("t", "l0\nl1\nl2\nl3\nl4\nl5\nl6\nl7\nl8\nl9").unwrap();
        let mut pos = Position::new(0, 0);
        viewport_high(&buf, &mut pos, 2);
        assert_eq!(pos.line, 2);
        viewport_low(&buf, &mut pos, 2, 5);
        assert_eq!(pos.line, 6);
        viewport_middle(&buf, &mut pos, 2, 5);
        assert_eq!(pos.line, 4);
    }

    #[test]
    fn matching_bracket_nested() {
        let buf = Buffer::from_str("t", "a(b(c)d)e").unwrap();
        let mut pos = Position::new(0, 1); // on first '('
        assert!(matching_bracket(&buf, &mut pos));
        assert_eq!(pos.byte, 7); // closing ')' matching outer '('

        let mut pos2 = Position::new(0, 7); // on outer ')'
        assert!(matching_bracket(&buf, &mut pos2));
        assert_eq!(pos2.byte, 1);
    }

    #[test]
    fn matching_bracket_across_lines() {
        let buf = Buffer::from_str("t", "fn foo() {\n    bar();\n}").unwrap();
        let mut pos = Position::new(0, 9); // on '{'
        assert!(matching_bracket(&buf, &mut pos));
        assert_eq!(pos.line, 2);
        assert_eq!(pos.byte, 0);
    }

    #[test]
    fn find_char_to_and_till_variants() {
        let buf = Buffer::from_str("t", "find,the,comma").unwrap();
        let mut pos = Position::new(0, 0);
        assert!(find_char(&buf, &mut pos, FindCharKind::ForwardTo, ','));
        assert_eq!(pos.byte, 4);

        let mut pos2 = Position::new(0, 0);
        assert!(find_char(&buf, &mut pos2, FindCharKind::ForwardTill, ','));
        assert_eq!(pos2.byte, 3);

        let mut pos3 = Position::new(0, 9);
        assert!(find_char(&buf, &mut pos3, FindCharKind::BackwardTo, ','));
        assert_eq!(pos3.byte, 8);

        let mut pos4 = Position::new(0, 9);
        assert!(find_char(&buf, &mut pos4, FindCharKind::BackwardTill, ','));
        assert_eq!(pos4.byte, 9);

        let mut pos5 = Position::new(0, 0);
        assert!(!find_char(&buf, &mut pos5, FindCharKind::ForwardTo, 'z'));
        assert_eq!(pos5.byte, 0);
    }
}
