//! Ex command-line parsing, a thin adapter over `core_ex`.
//!
//! The raw command-line buffer (including the leading `:`) is handed to
//! `core_ex::parse_ex`, whose richer `ExCommand` is mapped onto the set of
//! outcomes the dispatcher drives. Every `ExCommand` variant `core_ex`
//! understands now has a matching `ParsedCommand` arm; only a genuine parse
//! failure falls through to `ParsedCommand::Unknown`.

use core_ex::{ExCommand, RangeSpec, SubstituteSpec};

#[derive(Debug, Clone, PartialEq)]
pub enum ParsedCommand {
    Quit,
    ForceQuit,
    Write,
    WriteQuit,
    /// `:x` / `:xit`: write only if modified, then quit.
    Exit,
    Edit { path: Option<std::path::PathBuf>, force: bool },
    Read(std::path::PathBuf),
    Substitute { range: RangeSpec, spec: SubstituteSpec },
    Set(String),
    Global { range: RangeSpec, invert: bool, pattern: String, command: String },
    PrintRange(RangeSpec),
    Unknown(String),
}

pub struct CommandParser;

impl CommandParser {
    /// `raw` is the full command line including its leading `:`.
    pub fn parse(raw: &str) -> ParsedCommand {
        let text = raw.strip_prefix(':').unwrap_or(raw);
        match core_ex::parse_ex(text) {
            Ok(ExCommand::Quit { force: true }) => ParsedCommand::ForceQuit,
            Ok(ExCommand::Quit { force: false }) => ParsedCommand::Quit,
            Ok(ExCommand::Exit) => ParsedCommand::Exit,
            Ok(ExCommand::Write { .. }) => ParsedCommand::Write,
            Ok(ExCommand::WriteQuit { .. }) => ParsedCommand::WriteQuit,
            Ok(ExCommand::Edit { path, force }) => ParsedCommand::Edit {
                path: path.map(std::path::PathBuf::from),
                force,
            },
            Ok(ExCommand::Read { path }) => ParsedCommand::Read(std::path::PathBuf::from(path)),
            Ok(ExCommand::Substitute { range, spec }) => ParsedCommand::Substitute { range, spec },
            Ok(ExCommand::Set { raw }) => ParsedCommand::Set(raw),
            Ok(ExCommand::Global { range, invert, pattern, command }) => {
                ParsedCommand::Global { range, invert, pattern, command }
            }
            Ok(ExCommand::PrintRange { range }) => ParsedCommand::PrintRange(range),
            Ok(_) => ParsedCommand::Unknown(text.to_string()),
            Err(_) => ParsedCommand::Unknown(text.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_quit() {
        assert_eq!(CommandParser::parse(":q"), ParsedCommand::Quit);
    }

    #[test]
    fn parses_write() {
        assert_eq!(CommandParser::parse(":w"), ParsedCommand::Write);
    }

    #[test]
    fn parses_edit_with_path() {
        match CommandParser::parse(":e foo.txt") {
            ParsedCommand::Edit { path: Some(p), force } => {
                assert_eq!(p, std::path::PathBuf::from("foo.txt"));
                assert!(!force);
            }
            other => panic!("expected Edit, got {other:?}"),
        }
    }

    #[test]
    fn parses_edit_bang_as_forced() {
        match CommandParser::parse(":e! foo.txt") {
            ParsedCommand::Edit { force, .. } => assert!(force),
            other => panic!("expected Edit, got {other:?}"),
        }
    }

    #[test]
    fn parses_read_with_path() {
        assert_eq!(
            CommandParser::parse(":r foo.txt"),
            ParsedCommand::Read(std::path::PathBuf::from("foo.txt"))
        );
    }

    #[test]
    fn parses_exit_distinctly_from_writequit() {
        assert_eq!(CommandParser::parse(":x"), ParsedCommand::Exit);
        assert_ne!(ParsedCommand::Exit, ParsedCommand::WriteQuit);
    }

    #[test]
    fn unknown_commands_fall_through() {
        match CommandParser::parse(":boguscmd") {
            ParsedCommand::Unknown(s) => assert_eq!(s, "boguscmd"),
            other => panic!("expected Unknown, got {other:?}"),
        }
    }

    #[test]
    fn set_and_substitute_now_route_to_structured_variants() {
        assert!(matches!(
            CommandParser::parse(":set number"),
            ParsedCommand::Set(_)
        ));
        assert!(matches!(
            CommandParser::parse(":s/foo/bar/g"),
            ParsedCommand::Substitute { .. }
        ));
    }
}
