//! Search engine (§4.I): compiled-pattern cache, forward/backward search
//! with wraparound, whole-buffer match enumeration for highlighting, and
//! word-under-cursor lookup for `*`/`#`.

use core_text::{Buffer, Position};
use regex::Regex;
use std::collections::{HashMap, VecDeque};
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchDirection {
    Forward,
    Backward,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchError {
    NoPreviousPattern,
    PatternNotFound,
    InvalidPattern,
}

const HISTORY_MAX: usize = 50;

/// Lower bound on compiled-pattern cache entries (§5): a long session
/// re-searching many distinct patterns must not grow this without limit, but
/// the common case of a handful of patterns reused via `n`/`N` should never
/// evict.
const PATTERN_CACHE_MAX: usize = 32;

/// Cache key is `(pattern, case_sensitive)` — the same literal pattern
/// compiles differently depending on the `ignorecase`/`smartcase` effective
/// flag, so both must be part of the key.
///
/// Bounded LRU: `order` tracks recency (back = most recently used), evicting
/// the front entry once `entries` exceeds [`PATTERN_CACHE_MAX`].
#[derive(Default)]
struct PatternCache {
    entries: HashMap<(String, bool), Regex>,
    order: VecDeque<(String, bool)>,
}

impl PatternCache {
    fn touch(&mut self, key: &(String, bool)) {
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            self.order.remove(pos);
        }
        self.order.push_back(key.clone());
    }

    fn compile(&mut self, pattern: &str, case_sensitive: bool) -> Result<&Regex, SearchError> {
        let key = (pattern.to_string(), case_sensitive);
        if !self.entries.contains_key(&key) {
            let built = if case_sensitive {
                Regex::new(pattern)
            } else {
                Regex::new(&format!("(?i){pattern}"))
            };
            let re = built.map_err(|_| SearchError::InvalidPattern)?;
            self.entries.insert(key.clone(), re);
            self.touch(&key);
            while self.entries.len() > PATTERN_CACHE_MAX {
                if let Some(oldest) = self.order.pop_front() {
                    self.entries.remove(&oldest);
                } else {
                    break;
                }
            }
        } else {
            self.touch(&key);
        }
        Ok(self.entries.get(&key).expect("just inserted"))
    }
}

/// Per-buffer search session: last pattern/direction, history ring, and the
/// compiled-pattern cache. Invalidated (cache only, not history) whenever
/// the buffer mutates, since match offsets may no longer be valid — callers
/// re-run `find_all` on demand rather than this type tracking dirtiness
/// itself.
#[derive(Default)]
pub struct SearchState {
    last_pattern: Option<String>,
    last_direction: SearchDirection,
    history: VecDeque<String>,
    cache: PatternCache,
}

impl Default for SearchDirection {
    fn default() -> Self {
        SearchDirection::Forward
    }
}

impl SearchState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_pattern(&self) -> Option<&str> {
        self.last_pattern.as_deref()
    }

    pub fn last_direction(&self) -> SearchDirection {
        self.last_direction
    }

    pub fn history(&self) -> impl Iterator<Item = &str> {
        self.history.iter().map(|s| s.as_str())
    }

    fn remember(&mut self, pattern: &str, direction: SearchDirection) {
        self.last_pattern = Some(pattern.to_string());
        self.last_direction = direction;
        if self.history.back().map(|s| s.as_str()) != Some(pattern) {
            self.history.push_back(pattern.to_string());
            if self.history.len() > HISTORY_MAX {
                self.history.pop_front();
            }
        }
    }

    /// Search for `pattern` starting just after `from`, wrapping to the
    /// start of the buffer if `wrap` is set and nothing is found before the
    /// end.
    pub fn search_forward(
        &mut self,
        buffer: &Buffer,
        from: Position,
        pattern: &str,
        case_sensitive: bool,
        wrap: bool,
    ) -> Result<Position, SearchError> {
        let re = self.cache.compile(pattern, case_sensitive)?.clone();
        self.remember(pattern, SearchDirection::Forward);
        let content = buffer.content();
        let start = buffer.absolute_index(&from) + 1;
        if start <= content.len()
            && let Some(m) = re.find(&content[start.min(content.len())..])
        {
            return Ok(buffer.position_at(start + m.start()));
        }
        if wrap
            && let Some(m) = re.find(&content)
        {
            trace!(target: "search", pattern, "wrapscan_forward");
            return Ok(buffer.position_at(m.start()));
        }
        Err(SearchError::PatternNotFound)
    }

    /// Search backward: the last match strictly before `from`.
    pub fn search_backward(
        &mut self,
        buffer: &Buffer,
        from: Position,
        pattern: &str,
        case_sensitive: bool,
        wrap: bool,
    ) -> Result<Position, SearchError> {
        let re = self.cache.compile(pattern, case_sensitive)?.clone();
        self.remember(pattern, SearchDirection::Backward);
        let content = buffer.content();
        let before = buffer.absolute_index(&from).min(content.len());
        if let Some(m) = re.find_iter(&content[..before]).last() {
            return Ok(buffer.position_at(m.start()));
        }
        if wrap
            && let Some(m) = re.find_iter(&content).last()
        {
            trace!(target: "search", pattern, "wrapscan_backward");
            return Ok(buffer.position_at(m.start()));
        }
        Err(SearchError::PatternNotFound)
    }

    /// Re-run the last pattern in the given effective direction (`n`/`N`).
    pub fn repeat(
        &mut self,
        buffer: &Buffer,
        from: Position,
        direction: SearchDirection,
        case_sensitive: bool,
        wrap: bool,
    ) -> Result<Position, SearchError> {
        let pattern = self.last_pattern.clone().ok_or(SearchError::NoPreviousPattern)?;
        match direction {
            SearchDirection::Forward => self.search_forward(buffer, from, &pattern, case_sensitive, wrap),
            SearchDirection::Backward => self.search_backward(buffer, from, &pattern, case_sensitive, wrap),
        }
    }

    /// All non-overlapping matches in the buffer, for `hlsearch` highlighting.
    pub fn find_all(
        &mut self,
        buffer: &Buffer,
        pattern: &str,
        case_sensitive: bool,
    ) -> Result<Vec<(Position, Position)>, SearchError> {
        let re = self.cache.compile(pattern, case_sensitive)?.clone();
        let content = buffer.content();
        Ok(re
            .find_iter(&content)
            .map(|m| (buffer.position_at(m.start()), buffer.position_at(m.end())))
            .collect())
    }
}

/// The word under `pos`, for `*`/`#`. Returns the literal word text with
/// regex metacharacters escaped and whole-word boundaries (`\b...\b`)
/// applied by the caller. If the cursor does not sit on a word character,
/// no pattern is produced — `*`/`#` fail rather than hunting forward for
/// the next word (SPEC_FULL §11, `find_word_boundaries`).
pub fn word_at_cursor(buffer: &Buffer, pos: Position) -> Option<String> {
    let line = buffer.line_trimmed(pos.line)?;
    let bytes = line.as_bytes();
    let is_word_byte = |b: u8| b.is_ascii_alphanumeric() || b == b'_';
    let col = pos.byte;
    if col >= bytes.len() || !is_word_byte(bytes[col]) {
        return None;
    }
    let mut start = col;
    while start > 0 && is_word_byte(bytes[start - 1]) {
        start -= 1;
    }
    let mut end = col;
    while end < bytes.len() && is_word_byte(bytes[end]) {
        end += 1;
    }
    Some(line[start..end].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buf(text: &str) -> Buffer {
        Buffer::from_str("t", text).unwrap()
    }

    #[test]
    fn forward_search_finds_next_occurrence() {
        let b = buf("foo bar foo\n");
        let mut s = SearchState::new();
        let pos = s
            .search_forward(&b, Position::origin(), "foo", true, false)
            .unwrap();
        assert_eq!(pos.byte, 8);
    }

    #[test]
    fn forward_search_wraps_when_enabled() {
        let b = buf("foo bar\n");
        let mut s = SearchState::new();
        let pos = s
            .search_forward(&b, Position { line: 0, byte: 0 }, "foo", true, true)
            .unwrap();
        assert_eq!(pos.byte, 0);
    }

    #[test]
    fn forward_search_fails_without_wrap() {
        let b = buf("foo bar\n");
        let mut s = SearchState::new();
        let err = s
            .search_forward(&b, Position { line: 0, byte: 0 }, "foo", true, false)
            .unwrap_err();
        assert_eq!(err, SearchError::PatternNotFound);
    }

    #[test]
    fn case_insensitive_cache_key_distinct_from_sensitive() {
        let b = buf("FOO\n");
        let mut s = SearchState::new();
        assert!(s.search_forward(&b, Position::origin(), "foo", true, false).is_err());
        assert!(s.search_forward(&b, Position::origin(), "foo", false, false).is_ok());
    }

    #[test]
    fn word_at_cursor_extracts_identifier() {
        let b = buf("let value_1 = 2;\n");
        let w = word_at_cursor(&b, Position { line: 0, byte: 4 }).unwrap();
        assert_eq!(w, "value_1");
    }

    #[test]
    fn word_at_cursor_fails_on_non_word_character() {
        let b = buf("let x = 2;\n");
        assert!(word_at_cursor(&b, Position { line: 0, byte: 7 }).is_none());
    }

    #[test]
    fn pattern_cache_evicts_least_recently_used_past_bound() {
        let b = buf("abc\n");
        let mut s = SearchState::new();
        for i in 0..(PATTERN_CACHE_MAX + 8) {
            let pat = format!("pat{i}");
            let _ = s.search_forward(&b, Position::origin(), &pat, true, false);
        }
        assert!(s.cache.entries.len() <= PATTERN_CACHE_MAX);
        // The earliest patterns should have been evicted, the most recent kept.
        assert!(!s.cache.entries.contains_key(&("pat0".to_string(), true)));
        let last = format!("pat{}", PATTERN_CACHE_MAX + 7);
        assert!(s.cache.entries.contains_key(&(last, true)));
    }

    #[test]
    fn repeat_without_prior_search_errors() {
        let b = buf("abc\n");
        let mut s = SearchState::new();
        let err = s
            .repeat(&b, Position::origin(), SearchDirection::Forward, true, true)
            .unwrap_err();
        assert_eq!(err, SearchError::NoPreviousPattern);
    }
}
