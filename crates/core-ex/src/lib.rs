//! Ex command-line parsing (§4.J): `:` commands, ranges, `:s` substitution
//! and `:set` settings, kept independent of the Normal-mode dispatcher so
//! command-line mode can be driven from any host.

pub mod range;
pub mod settings;
pub mod substitute;

pub use range::{Address, RangeAtom, RangeSpec};
pub use settings::{SettingType, SettingValue, SettingsError, SettingsRegistry};
pub use substitute::{SubstFlags, SubstituteError, SubstituteSpec};

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExError {
    #[error("unknown command: {0}")]
    UnknownCommand(String),
    #[error("no file name")]
    NoFileName,
    #[error("trailing characters after command: {0}")]
    TrailingCharacters(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExCommand {
    Write { range: RangeSpec, path: Option<String> },
    Quit { force: bool },
    WriteQuit { path: Option<String> },
    /// `:x` / `:xit`: write the buffer only if it's modified, then quit —
    /// distinct from both `:wq` (always writes) and `:q!` (never writes).
    Exit,
    Edit { path: Option<String>, force: bool },
    Read { path: String },
    Substitute { range: RangeSpec, spec: SubstituteSpec },
    Set { raw: String },
    Global { range: RangeSpec, invert: bool, pattern: String, command: String },
    PrintRange { range: RangeSpec },
    Noop,
}

struct Abbrev {
    full: &'static str,
    short: &'static str,
}

const ABBREVS: &[Abbrev] = &[
    Abbrev { full: "write", short: "w" },
    Abbrev { full: "quit", short: "q" },
    Abbrev { full: "writequit", short: "wq" },
    Abbrev { full: "xit", short: "x" },
    Abbrev { full: "edit", short: "e" },
    Abbrev { full: "read", short: "r" },
    Abbrev { full: "substitute", short: "s" },
    Abbrev { full: "set", short: "se" },
    Abbrev { full: "global", short: "g" },
    Abbrev { full: "print", short: "p" },
];

/// Parses one line of ex command-line input (without the leading `:`).
pub fn parse_ex(line: &str) -> Result<ExCommand, ExError> {
    let trimmed = line.trim();
    let (range, rest) = range::parse_range(trimmed);
    let rest = rest.trim_start();
    if rest.is_empty() {
        return Ok(ExCommand::PrintRange { range });
    }

    let (name, args) = split_command_name(rest);
    let args = args.trim();

    match name {
        n if matches_abbrev(n, "write") => {
            let (force, args) = strip_bang(args);
            let _ = force;
            let path = if args.is_empty() { None } else { Some(args.to_string()) };
            Ok(ExCommand::Write { range, path })
        }
        n if matches_abbrev(n, "quit") => {
            let (force, _) = strip_bang(args);
            Ok(ExCommand::Quit { force })
        }
        n if matches_abbrev(n, "writequit") => {
            let path = if args.is_empty() { None } else { Some(args.to_string()) };
            Ok(ExCommand::WriteQuit { path })
        }
        n if matches_abbrev(n, "xit") => Ok(ExCommand::Exit),
        n if matches_abbrev(n, "edit") => {
            let (force, args) = strip_bang(args);
            let path = if args.is_empty() { None } else { Some(args.to_string()) };
            Ok(ExCommand::Edit { path, force })
        }
        n if matches_abbrev(n, "read") => {
            if args.is_empty() {
                Err(ExError::NoFileName)
            } else {
                Ok(ExCommand::Read { path: args.to_string() })
            }
        }
        n if matches_abbrev(n, "substitute") => {
            let spec = substitute::parse_substitute(args);
            Ok(ExCommand::Substitute { range, spec })
        }
        n if matches_abbrev(n, "set") => Ok(ExCommand::Set { raw: args.to_string() }),
        n if matches_abbrev(n, "global") => parse_global(range, n, args),
        n if matches_abbrev(n, "print") => Ok(ExCommand::PrintRange { range }),
        "" => Ok(ExCommand::Noop),
        other => Err(ExError::UnknownCommand(other.to_string())),
    }
}

fn parse_global(range: RangeSpec, name: &str, args: &str) -> Result<ExCommand, ExError> {
    let invert = name.starts_with('g') && name.ends_with('!');
    let Some(delim) = args.chars().next() else {
        return Err(ExError::UnknownCommand("global".into()));
    };
    let rest = &args[delim.len_utf8()..];
    let end = rest.find(delim).unwrap_or(rest.len());
    let pattern = rest[..end].to_string();
    let command = rest[(end + delim.len_utf8()).min(rest.len())..].to_string();
    Ok(ExCommand::Global { range: if range == RangeSpec::none() { RangeSpec::whole_file() } else { range }, invert, pattern, command })
}

fn split_command_name(rest: &str) -> (&str, &str) {
    let end = rest
        .char_indices()
        .find(|(_, c)| !c.is_ascii_alphabetic() && *c != '!')
        .map(|(i, _)| i)
        .unwrap_or(rest.len());
    rest.split_at(end)
}

fn strip_bang(args: &str) -> (bool, &str) {
    if let Some(stripped) = args.strip_prefix('!') {
        (true, stripped.trim_start())
    } else {
        (false, args)
    }
}

fn matches_abbrev(name: &str, full: &str) -> bool {
    let bare = name.trim_end_matches('!');
    if bare.is_empty() {
        return false;
    }
    ABBREVS
        .iter()
        .find(|a| a.full == full)
        .map(|a| bare == a.full || bare == a.short)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_without_path() {
        assert_eq!(parse_ex("w").unwrap(), ExCommand::Write { range: RangeSpec::none(), path: None });
    }

    #[test]
    fn write_with_path() {
        assert_eq!(
            parse_ex("write out.txt").unwrap(),
            ExCommand::Write { range: RangeSpec::none(), path: Some("out.txt".to_string()) }
        );
    }

    #[test]
    fn quit_with_bang_forces() {
        assert_eq!(parse_ex("q!").unwrap(), ExCommand::Quit { force: true });
        assert_eq!(parse_ex("q").unwrap(), ExCommand::Quit { force: false });
    }

    #[test]
    fn writequit_abbreviation() {
        assert_eq!(parse_ex("wq").unwrap(), ExCommand::WriteQuit { path: None });
    }

    #[test]
    fn xit_abbreviation_is_conditional_exit() {
        assert_eq!(parse_ex("x").unwrap(), ExCommand::Exit);
        assert_eq!(parse_ex("xit").unwrap(), ExCommand::Exit);
    }

    #[test]
    fn substitute_with_range() {
        match parse_ex("1,5s/foo/bar/g").unwrap() {
            ExCommand::Substitute { range, spec } => {
                assert_eq!(range.start, Some(Address { base: RangeAtom::Line(1), offset: 0 }));
                assert_eq!(range.end, Some(Address { base: RangeAtom::Line(5), offset: 0 }));
                assert_eq!(spec.pattern.as_deref(), Some("foo"));
                assert!(spec.flags.global);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn set_captures_raw_args() {
        assert_eq!(parse_ex("set ic").unwrap(), ExCommand::Set { raw: "ic".to_string() });
        assert_eq!(parse_ex("se ts=4").unwrap(), ExCommand::Set { raw: "ts=4".to_string() });
    }

    #[test]
    fn unknown_command_errors() {
        assert_eq!(parse_ex("bogus").unwrap_err(), ExError::UnknownCommand("bogus".to_string()));
    }

    #[test]
    fn bare_range_prints() {
        assert_eq!(parse_ex("5").unwrap(), ExCommand::PrintRange { range: RangeSpec { start: Some(Address { base: RangeAtom::Line(5), offset: 0 }), end: Some(Address { base: RangeAtom::Line(5), offset: 0 }) } });
    }

    #[test]
    fn read_without_path_errors() {
        assert_eq!(parse_ex("r").unwrap_err(), ExError::NoFileName);
    }
}
