//! `:s` substitution (§4.J): per-match backreferences, independent flag
//! parsing, and reuse of the last pattern/replacement when omitted.

use regex::{Captures, Regex};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubstFlags {
    pub global: bool,
    pub case_insensitive: bool,
    pub confirm: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubstituteSpec {
    pub pattern: Option<String>,
    pub replacement: Option<String>,
    pub flags: SubstFlags,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubstituteError {
    InvalidPattern,
    NoPreviousPattern,
}

/// Parses the body after `s` (e.g. `/foo/bar/gi`, or a bare `s` reusing the
/// last pattern and replacement). The delimiter is whatever non-alphanumeric
/// character follows `s` (conventionally `/`, but any punctuation works).
pub fn parse_substitute(body: &str) -> SubstituteSpec {
    let mut chars = body.chars();
    let Some(delim) = chars.next().filter(|c| !c.is_alphanumeric() && *c != '\\') else {
        return SubstituteSpec { pattern: None, replacement: None, flags: parse_flags(body) };
    };
    let rest = &body[delim.len_utf8()..];
    let parts: Vec<&str> = split_unescaped(rest, delim);
    let pattern = parts.first().filter(|s| !s.is_empty()).map(|s| s.to_string());
    let replacement = parts.get(1).map(|s| s.to_string());
    let flags_str = parts.get(2).copied().unwrap_or("");
    SubstituteSpec { pattern, replacement, flags: parse_flags(flags_str) }
}

fn split_unescaped(s: &str, delim: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if s[i..].starts_with(delim) && (i == 0 || bytes[i - 1] != b'\\') {
            parts.push(&s[start..i]);
            start = i + delim.len_utf8();
            i = start;
        } else {
            i += 1;
        }
    }
    parts.push(&s[start..]);
    parts
}

fn parse_flags(s: &str) -> SubstFlags {
    let mut flags = SubstFlags::default();
    for c in s.chars() {
        match c {
            'g' => flags.global = true,
            'i' => flags.case_insensitive = true,
            'c' => flags.confirm = true,
            _ => {}
        }
    }
    flags
}

/// Applies a substitution to a single line of text, expanding `&` (whole
/// match) and `\N` (capture group N) per match, not as a blanket string
/// replace over the whole line.
pub fn apply_to_line(line: &str, pattern: &str, replacement: &str, flags: SubstFlags) -> Result<(String, usize), SubstituteError> {
    let built = if flags.case_insensitive { format!("(?i){pattern}") } else { pattern.to_string() };
    let re = Regex::new(&built).map_err(|_| SubstituteError::InvalidPattern)?;
    let mut count = 0usize;
    let expand = |caps: &Captures| -> String { expand_replacement(replacement, caps) };
    let result = if flags.global {
        re.replace_all(line, |caps: &Captures| {
            count += 1;
            expand(caps)
        })
        .into_owned()
    } else {
        re.replacen(line, 1, |caps: &Captures| {
            count += 1;
            expand(caps)
        })
        .into_owned()
    };
    Ok((result, count))
}

fn expand_replacement(replacement: &str, caps: &Captures) -> String {
    let mut out = String::with_capacity(replacement.len());
    let mut chars = replacement.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '&' => out.push_str(caps.get(0).map(|m| m.as_str()).unwrap_or("")),
            '\\' => match chars.peek() {
                Some(d) if d.is_ascii_digit() => {
                    let d = *d;
                    chars.next();
                    let idx: usize = d.to_digit(10).unwrap() as usize;
                    out.push_str(caps.get(idx).map(|m| m.as_str()).unwrap_or(""));
                }
                Some('&') => {
                    chars.next();
                    out.push('&');
                }
                Some('\\') => {
                    chars.next();
                    out.push('\\');
                }
                _ => out.push('\\'),
            },
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_pattern_replacement_and_flags() {
        let spec = parse_substitute("/foo/bar/gi");
        assert_eq!(spec.pattern.as_deref(), Some("foo"));
        assert_eq!(spec.replacement.as_deref(), Some("bar"));
        assert!(spec.flags.global && spec.flags.case_insensitive);
    }

    #[test]
    fn missing_replacement_is_none_for_reuse() {
        let spec = parse_substitute("/foo/");
        assert_eq!(spec.pattern.as_deref(), Some("foo"));
        assert_eq!(spec.replacement.as_deref(), Some(""));
    }

    #[test]
    fn bare_s_has_no_pattern() {
        let spec = parse_substitute("");
        assert!(spec.pattern.is_none());
        assert!(spec.replacement.is_none());
    }

    #[test]
    fn ampersand_expands_to_whole_match() {
        let (out, n) = apply_to_line("cat dog", "dog", "[&]", SubstFlags::default()).unwrap();
        assert_eq!(out, "cat [dog]");
        assert_eq!(n, 1);
    }

    #[test]
    fn backreference_expands_capture_group() {
        let (out, n) = apply_to_line("John Smith", r"(\w+) (\w+)", r"\2 \1", SubstFlags::default()).unwrap();
        assert_eq!(out, "Smith John");
        assert_eq!(n, 1);
    }

    #[test]
    fn global_flag_replaces_all_occurrences() {
        let (out, n) = apply_to_line("a a a", "a", "b", SubstFlags { global: true, ..Default::default() }).unwrap();
        assert_eq!(out, "b b b");
        assert_eq!(n, 3);
    }

    #[test]
    fn without_global_only_first_match_replaced() {
        let (out, n) = apply_to_line("a a a", "a", "b", SubstFlags::default()).unwrap();
        assert_eq!(out, "b a a");
        assert_eq!(n, 1);
    }
}
