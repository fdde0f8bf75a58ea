//! Ex address parsing: the range atoms preceding a command (§4.J).

use core_state::EditorState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RangeAtom {
    CurrentLine,
    LastLine,
    Line(usize), // 1-based
    Mark(char),
    PatternForward(String),
    PatternBackward(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    pub base: RangeAtom,
    pub offset: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeSpec {
    pub start: Option<Address>,
    pub end: Option<Address>,
}

impl RangeSpec {
    pub fn none() -> Self {
        Self { start: None, end: None }
    }

    pub fn whole_file() -> Self {
        Self {
            start: Some(Address { base: RangeAtom::Line(1), offset: 0 }),
            end: Some(Address { base: RangeAtom::LastLine, offset: 0 }),
        }
    }

    /// Like `resolve` but substitutes the caller-supplied cursor line for
    /// `CurrentLine`/`.` atoms, since `EditorState` has no view/cursor of
    /// its own.
    pub fn resolve_with_cursor(&self, state: &EditorState, cursor_line: usize) -> Option<(usize, usize)> {
        let default = Address { base: RangeAtom::CurrentLine, offset: 0 };
        let start_addr = self.start.clone().unwrap_or_else(|| default.clone());
        let end_addr = self.end.clone().unwrap_or_else(|| start_addr.clone());
        let s = resolve_with(&start_addr, state, cursor_line)?;
        let e = resolve_with(&end_addr, state, cursor_line)?;
        Some(if s <= e { (s, e) } else { (e, s) })
    }
}

fn resolve_with(addr: &Address, state: &EditorState, cursor_line: usize) -> Option<usize> {
    let buffer = state.active_buffer();
    let base = match &addr.base {
        RangeAtom::CurrentLine => cursor_line,
        RangeAtom::LastLine => buffer.line_count().saturating_sub(1),
        RangeAtom::Line(n) => n.saturating_sub(1),
        RangeAtom::Mark(c) => state.resolve_mark(*c)?.line,
        RangeAtom::PatternForward(_) | RangeAtom::PatternBackward(_) => return None,
    };
    let adjusted = base as i64 + addr.offset;
    Some(adjusted.clamp(0, buffer.line_count().saturating_sub(1) as i64) as usize)
}

/// Parses a leading range off `input`, returning the spec and the remaining
/// (unconsumed) command text.
pub fn parse_range(input: &str) -> (RangeSpec, &str) {
    let mut rest = input;
    if let Some(stripped) = rest.strip_prefix('%') {
        return (RangeSpec::whole_file(), stripped);
    }
    let (first, after_first) = match parse_address(rest) {
        Some((addr, r)) => (Some(addr), r),
        None => (None, rest),
    };
    rest = after_first;
    if first.is_none() {
        return (RangeSpec::none(), rest);
    }
    if let Some(r2) = rest.strip_prefix([',', ';']) {
        if let Some((second, r3)) = parse_address(r2) {
            return (RangeSpec { start: first, end: Some(second) }, r3);
        }
        return (RangeSpec { start: first.clone(), end: first }, r2);
    }
    (RangeSpec { start: first.clone(), end: first }, rest)
}

fn parse_address(input: &str) -> Option<(Address, &str)> {
    let mut chars = input.chars();
    let base;
    let mut rest = input;
    match chars.next()? {
        '.' => {
            base = RangeAtom::CurrentLine;
            rest = &input[1..];
        }
        '$' => {
            base = RangeAtom::LastLine;
            rest = &input[1..];
        }
        '\'' => {
            let c = chars.next()?;
            base = RangeAtom::Mark(c);
            rest = &input[2..];
        }
        '/' => {
            let end = input[1..].find('/').map(|i| i + 1).unwrap_or(input.len());
            let pat = input[1..end].to_string();
            base = RangeAtom::PatternForward(pat);
            rest = &input[(end + 1).min(input.len())..];
        }
        '?' => {
            let end = input[1..].find('?').map(|i| i + 1).unwrap_or(input.len());
            let pat = input[1..end].to_string();
            base = RangeAtom::PatternBackward(pat);
            rest = &input[(end + 1).min(input.len())..];
        }
        c if c.is_ascii_digit() => {
            let digits: String = input.chars().take_while(|c| c.is_ascii_digit()).collect();
            let n: usize = digits.parse().ok()?;
            base = RangeAtom::Line(n);
            rest = &input[digits.len()..];
        }
        _ => return None,
    }
    let (offset, rest2) = parse_offset(rest);
    Some((Address { base, offset }, rest2))
}

fn parse_offset(input: &str) -> (i64, &str) {
    let mut total = 0i64;
    let mut rest = input;
    loop {
        let mut chars = rest.chars();
        match chars.next() {
            Some(sign @ ('+' | '-')) => {
                let after_sign = &rest[1..];
                let digits: String = after_sign.chars().take_while(|c| c.is_ascii_digit()).collect();
                let n: i64 = if digits.is_empty() { 1 } else { digits.parse().unwrap_or(1) };
                total += if sign == '+' { n } else { -n };
                rest = &after_sign[digits.len()..];
            }
            _ => break,
        }
    }
    (total, rest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_is_whole_file() {
        let (spec, rest) = parse_range("%s/a/b/");
        assert_eq!(spec, RangeSpec::whole_file());
        assert_eq!(rest, "s/a/b/");
    }

    #[test]
    fn numeric_comma_numeric_range() {
        let (spec, rest) = parse_range("3,8d");
        assert_eq!(spec.start, Some(Address { base: RangeAtom::Line(3), offset: 0 }));
        assert_eq!(spec.end, Some(Address { base: RangeAtom::Line(8), offset: 0 }));
        assert_eq!(rest, "d");
    }

    #[test]
    fn dollar_with_offset() {
        let (spec, rest) = parse_range("$-2p");
        assert_eq!(spec.start, Some(Address { base: RangeAtom::LastLine, offset: -2 }));
        assert_eq!(rest, "p");
    }

    #[test]
    fn no_range_leaves_input_untouched() {
        let (spec, rest) = parse_range("write");
        assert_eq!(spec, RangeSpec::none());
        assert_eq!(rest, "write");
    }

    #[test]
    fn mark_address() {
        let (spec, rest) = parse_range("'ad");
        assert_eq!(spec.start, Some(Address { base: RangeAtom::Mark('a'), offset: 0 }));
        assert_eq!(rest, "d");
    }
}
