//! Command line editing & execution (:q, :e <file>, :w, :x, :s, :set, :g).
//!
//! Design Tenet Alignment:
//! * Modularity: isolates ephemeral command line buffer mutations and side
//!   effects (file IO, settings, substitution) from the main dispatcher
//!   control flow.
//! * Evolution Over Legacy: `ParsedCommand` now has a one-to-one arm per
//!   `core_ex::ExCommand` variant; growing the ex vocabulary further is a
//!   local change in both crates.

use super::DispatchResult;
use super::command_parser::{CommandParser, ParsedCommand};
use crate::Action;
use crate::io_ops::{OpenFileResult, WriteFileResult, open_file, write_file_with_backup};
use core_ex::SettingsRegistry;
use core_model::View;
use core_state::EditorState;
use core_text::Position;

pub(crate) fn handle_command_action(
    action: Action,
    state: &mut EditorState,
    view: &mut View,
    settings: &mut SettingsRegistry,
) -> DispatchResult {
    match action {
        Action::CommandStart => {
            state.command_line.begin(':');
            DispatchResult::dirty()
        }
        Action::CommandChar(ch) => {
            state.command_line.push_char(ch);
            DispatchResult::dirty()
        }
        Action::CommandBackspace => {
            state.command_line.backspace();
            DispatchResult::dirty()
        }
        Action::CommandCancel => {
            state.command_line.clear();
            DispatchResult::dirty()
        }
        Action::CommandExecute(cmd) => execute_command(cmd, state, view, settings),
        _ => unreachable!("non-command action routed to command handler"),
    }
}

fn execute_command(
    raw: String,
    state: &mut EditorState,
    view: &mut View,
    settings: &mut SettingsRegistry,
) -> DispatchResult {
    let parsed = CommandParser::parse(&raw);
    let result = match parsed {
        ParsedCommand::Quit => {
            if state.dirty {
                state.set_ephemeral("No write since last change", std::time::Duration::from_secs(3));
                DispatchResult::dirty()
            } else {
                DispatchResult::quit()
            }
        }
        ParsedCommand::ForceQuit => DispatchResult::quit(),
        ParsedCommand::Write => handle_write(state, settings),
        ParsedCommand::WriteQuit => {
            handle_write(state, settings);
            DispatchResult::quit()
        }
        // `:x` / `:xit`: write only if the buffer is dirty, then always quit
        // (distinct from `:wq`'s unconditional write).
        ParsedCommand::Exit => {
            if state.dirty {
                handle_write(state, settings);
            }
            DispatchResult::quit()
        }
        ParsedCommand::Edit { path, force } => handle_edit(path, force, state, view),
        ParsedCommand::Read(path) => handle_read(path, state, view),
        ParsedCommand::Substitute { range, spec } => handle_substitute(range, spec, state, view),
        ParsedCommand::Set(raw_args) => handle_set(&raw_args, state, settings),
        ParsedCommand::Global { range, invert, pattern, command } => {
            handle_global(range, invert, &pattern, &command, state, view)
        }
        ParsedCommand::PrintRange(_) => DispatchResult::dirty(),
        ParsedCommand::Unknown(name) => {
            state.set_ephemeral(format!("Unknown command: {name}"), std::time::Duration::from_secs(3));
            DispatchResult::dirty()
        }
    };
    state.command_line.clear();
    result
}

/// `:e[!] [path]`: replace the active buffer's contents from `path` (or
/// reload the current file name with no argument). Without `!`, refuses
/// when the buffer has unsaved changes (§7 "No write since last change"),
/// matching `:q`'s guard.
fn handle_edit(
    path: Option<std::path::PathBuf>,
    force: bool,
    state: &mut EditorState,
    view: &mut View,
) -> DispatchResult {
    if state.dirty && !force {
        state.set_ephemeral("No write since last change", std::time::Duration::from_secs(3));
        return DispatchResult::dirty();
    }
    let Some(target) = path.or_else(|| state.file_name.clone()) else {
        state.set_ephemeral("No filename", std::time::Duration::from_secs(3));
        return DispatchResult::dirty();
    };
    match open_file(&target) {
        OpenFileResult::Success(s) => {
            state.buffers[state.active] = s.buffer;
            view.cursor = Position::origin();
            state.file_name = Some(s.file_name);
            state.dirty = false;
            state.original_line_ending = s.original_line_ending;
            state.had_trailing_newline = s.had_trailing_newline;
            state.set_ephemeral("Opened", std::time::Duration::from_secs(3));
            if s.mixed_line_endings {
                tracing::warn!(target: "io", "mixed_line_endings_detected");
            }
            DispatchResult::buffer_replaced()
        }
        OpenFileResult::Error => {
            state.set_ephemeral("Open failed", std::time::Duration::from_secs(3));
            DispatchResult::dirty()
        }
    }
}

/// `:r path`: insert the named file's content as new lines below the
/// cursor, without disturbing the rest of the buffer or its file name.
fn handle_read(path: std::path::PathBuf, state: &mut EditorState, view: &mut View) -> DispatchResult {
    match open_file(&path) {
        OpenFileResult::Success(s) => {
            let inserted = s.buffer.content();
            let insert_line = view.cursor.line + 1;
            state.push_discrete_edit_snapshot(view.cursor);
            let mut pos = if insert_line >= state.active_buffer().line_count() {
                let last = state.active_buffer().line_count() - 1;
                Position { line: last, byte: state.active_buffer().line_byte_len(last) }
            } else {
                Position { line: insert_line, byte: 0 }
            };
            if insert_line >= state.active_buffer().line_count() {
                state.active_buffer_mut().insert_newline(&mut pos);
            }
            for line in inserted.lines() {
                state.active_buffer_mut().insert_text(&mut pos, line);
                state.active_buffer_mut().insert_newline(&mut pos);
            }
            state.dirty = true;
            state.set_ephemeral("Read", std::time::Duration::from_secs(3));
            DispatchResult::buffer_replaced()
        }
        OpenFileResult::Error => {
            state.set_ephemeral("Read failed", std::time::Duration::from_secs(3));
            DispatchResult::dirty()
        }
    }
}

/// Backup policy (§13 `backup`/`writebackup`): a `.bak` copy of the prior
/// contents is left behind whenever either setting is on; `writebackup`
/// defaults on, `backup` off, matching vim's "back up while writing, don't
/// keep it around" default.
fn handle_write(state: &mut EditorState, settings: &SettingsRegistry) -> DispatchResult {
    let create_backup = setting_bool(settings, "backup") || setting_bool(settings, "writebackup");
    match write_file_with_backup(state, None, create_backup) {
        WriteFileResult::Success => {
            state.set_ephemeral("Wrote", std::time::Duration::from_secs(3));
        }
        WriteFileResult::NoFilename => {
            tracing::error!(target: "runtime.command", "write_no_filename");
            state.set_ephemeral("No filename", std::time::Duration::from_secs(3));
        }
        WriteFileResult::ReadOnly => {
            state.set_ephemeral("Read-only, use :w!", std::time::Duration::from_secs(3));
        }
        WriteFileResult::Error => {
            state.set_ephemeral("Write failed", std::time::Duration::from_secs(3));
        }
    }
    DispatchResult::dirty()
}

/// `:[range]s/pattern/replacement/flags`: applies line by line over the
/// resolved range, defaulting to the cursor's line when no range is given.
fn handle_substitute(
    range: core_ex::RangeSpec,
    spec: core_ex::SubstituteSpec,
    state: &mut EditorState,
    view: &mut View,
) -> DispatchResult {
    let Some(pattern) = spec.pattern.clone().or_else(|| state.search.last_pattern().map(str::to_string)) else {
        state.set_ephemeral("No previous pattern", std::time::Duration::from_secs(3));
        return DispatchResult::dirty();
    };
    let replacement = spec.replacement.unwrap_or_default();
    let Some((line_start, line_end)) = range.resolve_with_cursor(state, view.cursor.line) else {
        return DispatchResult::dirty();
    };
    state.push_discrete_edit_snapshot(view.cursor);
    let mut total = 0usize;
    let mut lines_touched = 0usize;
    let mut last_touched = None;
    for l in line_start..=line_end {
        let Some(raw) = state.active_buffer().line(l) else { continue };
        let had_nl = raw.ends_with('\n');
        let body = raw.strip_suffix('\n').unwrap_or(&raw);
        match core_ex::substitute::apply_to_line(body, &pattern, &replacement, spec.flags) {
            Ok((replaced, count)) if count > 0 => {
                total += count;
                lines_touched += 1;
                let mut new_line = replaced;
                if had_nl {
                    new_line.push('\n');
                }
                state.active_buffer_mut().set_line(l, &new_line);
                last_touched = Some(l);
            }
            _ => {}
        }
    }
    state.registers.latch_special(
        core_state::RegisterName::LastSearch,
        core_state::RegisterValue::new(pattern, core_state::RegisterKind::Charwise),
    );
    if total == 0 {
        state.set_ephemeral("Pattern not found", std::time::Duration::from_secs(3));
        return DispatchResult::dirty();
    }
    if let Some(l) = last_touched {
        view.cursor = Position { line: l, byte: 0 };
    }
    state.dirty = true;
    let sub_word = if total == 1 { "substitution" } else { "substitutions" };
    let line_word = if lines_touched == 1 { "line" } else { "lines" };
    state.set_ephemeral(
        format!("{total} {sub_word} on {lines_touched} {line_word}"),
        std::time::Duration::from_secs(3),
    );
    DispatchResult::buffer_replaced()
}

/// `:set opt`, `:set opt=value`, `:set noopt`, `:set opt!` (toggle), bare
/// `:set` lists non-default options.
fn handle_set(raw_args: &str, state: &mut EditorState, settings: &mut SettingsRegistry) -> DispatchResult {
    let args = raw_args.trim();
    if args.is_empty() {
        let listed = settings.list_non_default();
        let text = if listed.is_empty() {
            "(defaults)".to_string()
        } else {
            listed.iter().map(|(k, v)| format!("{k}={v}")).collect::<Vec<_>>().join(" ")
        };
        state.set_ephemeral(text, std::time::Duration::from_secs(4));
        return DispatchResult::dirty();
    }
    for token in args.split_whitespace() {
        apply_one_setting(token, settings);
    }
    DispatchResult::dirty()
}

fn setting_bool(settings: &SettingsRegistry, name: &str) -> bool {
    matches!(settings.get(name), Ok(core_ex::SettingValue::Bool(true)))
}

fn apply_one_setting(token: &str, settings: &mut SettingsRegistry) {
    if let Some((name, value)) = token.split_once('=') {
        if let Ok(parsed) = value.parse::<i64>() {
            let _ = settings.set_int(name, parsed);
        } else {
            let _ = settings.set_str(name, value.to_string());
        }
        return;
    }
    if let Some(name) = token.strip_suffix('!') {
        let _ = settings.toggle_bool(name);
        return;
    }
    if let Some(name) = token.strip_prefix("no") {
        if settings.get(name).is_ok() {
            let _ = settings.set_bool(name, false);
            return;
        }
    }
    let _ = settings.set_bool(token, true);
}

/// `:[range]g/pattern/cmd`: runs the ex sub-command on every line in range
/// that matches (or, with `!`, every line that does NOT match) `pattern`.
/// Only a `s///` sub-command is interpreted today; anything else is a no-op
/// per-line scan with no mutation (breadth-first: listing support is the
/// common case, not arbitrary recursive `:g/.../d` chains).
fn handle_global(
    range: core_ex::RangeSpec,
    invert: bool,
    pattern: &str,
    command: &str,
    state: &mut EditorState,
    view: &mut View,
) -> DispatchResult {
    let Some((line_start, line_end)) = range.resolve_with_cursor(state, view.cursor.line) else {
        return DispatchResult::dirty();
    };
    let re = match regex::Regex::new(pattern) {
        Ok(re) => re,
        Err(_) => {
            state.set_ephemeral("Invalid pattern", std::time::Duration::from_secs(3));
            return DispatchResult::dirty();
        }
    };
    let matching: Vec<usize> = (line_start..=line_end)
        .filter(|&l| {
            state
                .active_buffer()
                .line_trimmed(l)
                .map(|t| re.is_match(&t) != invert)
                .unwrap_or(false)
        })
        .collect();
    let command = command.trim();
    if let Some(sub_args) = command.strip_prefix('s') {
        let spec = core_ex::substitute::parse_substitute(sub_args);
        if matching.is_empty() {
            return DispatchResult::dirty();
        }
        state.push_discrete_edit_snapshot(view.cursor);
        let pattern = spec.pattern.unwrap_or_default();
        let replacement = spec.replacement.unwrap_or_default();
        let mut total = 0usize;
        for l in matching {
            let Some(raw) = state.active_buffer().line(l) else { continue };
            let had_nl = raw.ends_with('\n');
            let body = raw.strip_suffix('\n').unwrap_or(&raw);
            if let Ok((replaced, count)) = core_ex::substitute::apply_to_line(body, &pattern, &replacement, spec.flags)
                && count > 0
            {
                total += count;
                let mut new_line = replaced;
                if had_nl {
                    new_line.push('\n');
                }
                state.active_buffer_mut().set_line(l, &new_line);
            }
        }
        state.dirty = total > 0;
        return DispatchResult::buffer_replaced();
    }
    state.set_ephemeral(format!("{} line(s) match", matching.len()), std::time::Duration::from_secs(3));
    DispatchResult::dirty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Action;
    use core_text::Buffer;

    // Helper to construct minimal editor state + view for command tests
    fn mk_state() -> (EditorState, core_model::View, SettingsRegistry) {
        let st = EditorState::new(Buffer::from_str("test", "abc\n").unwrap());
        let view = core_model::View::new(Position::origin(), 0);
        (st, view, SettingsRegistry::new())
    }

    #[test]
    fn unknown_command_stays_dirty_without_mutating_state() {
        let (mut st, mut view, mut settings) = mk_state();
        let _ = handle_command_action(Action::CommandStart, &mut st, &mut view, &mut settings);
        let res = handle_command_action(
            Action::CommandExecute(":boguscmd".to_string()),
            &mut st,
            &mut view,
            &mut settings,
        );
        assert!(res.dirty);
        assert!(!st.dirty, "unknown command must not touch the buffer");
    }

    #[test]
    fn writequit_clears_dirty_and_quits() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wq.txt");
        let (mut st, mut view, mut settings) = mk_state();
        st.file_name = Some(path.clone());
        st.dirty = true;
        let res = handle_command_action(
            Action::CommandExecute(":wq".to_string()),
            &mut st,
            &mut view,
            &mut settings,
        );
        assert!(res.quit);
        assert!(!st.dirty);
        assert!(path.exists());
    }

    #[test]
    fn exit_skips_write_when_not_dirty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.txt");
        let (mut st, mut view, mut settings) = mk_state();
        st.file_name = Some(path.clone());
        st.dirty = false;
        let res = handle_command_action(
            Action::CommandExecute(":x".to_string()),
            &mut st,
            &mut view,
            &mut settings,
        );
        assert!(res.quit);
        assert!(!path.exists(), "`:x` on a clean buffer must not write");
    }

    #[test]
    fn exit_writes_when_dirty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x2.txt");
        let (mut st, mut view, mut settings) = mk_state();
        st.file_name = Some(path.clone());
        st.dirty = true;
        let res = handle_command_action(
            Action::CommandExecute(":x".to_string()),
            &mut st,
            &mut view,
            &mut settings,
        );
        assert!(res.quit);
        assert!(path.exists(), "`:x` on a dirty buffer must write");
    }

    #[test]
    fn quit_refuses_when_buffer_dirty() {
        let (mut st, mut view, mut settings) = mk_state();
        st.dirty = true;
        let res = handle_command_action(
            Action::CommandExecute(":q".to_string()),
            &mut st,
            &mut view,
            &mut settings,
        );
        assert!(!res.quit, "`:q` must refuse on a modified buffer");
        assert!(st.dirty);
    }

    #[test]
    fn force_quit_bypasses_dirty_guard() {
        let (mut st, mut view, mut settings) = mk_state();
        st.dirty = true;
        let res = handle_command_action(
            Action::CommandExecute(":q!".to_string()),
            &mut st,
            &mut view,
            &mut settings,
        );
        assert!(res.quit);
    }

    #[test]
    fn edit_refuses_when_buffer_dirty_without_bang() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("other.txt");
        std::fs::write(&path, "fresh\n").unwrap();
        let (mut st, mut view, mut settings) = mk_state();
        st.dirty = true;
        let res = handle_command_action(
            Action::CommandExecute(format!(":e {}", path.display())),
            &mut st,
            &mut view,
            &mut settings,
        );
        assert!(res.dirty);
        assert_eq!(st.active_buffer().line(0).unwrap(), "abc\n", "buffer must not be replaced");
    }

    #[test]
    fn edit_bang_discards_unsaved_changes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("other2.txt");
        std::fs::write(&path, "fresh\n").unwrap();
        let (mut st, mut view, mut settings) = mk_state();
        st.dirty = true;
        let res = handle_command_action(
            Action::CommandExecute(format!(":e! {}", path.display())),
            &mut st,
            &mut view,
            &mut settings,
        );
        assert!(res.buffer_replaced);
        assert_eq!(st.active_buffer().line(0).unwrap(), "fresh\n");
    }

    #[test]
    fn read_inserts_file_contents_below_cursor() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("insert.txt");
        std::fs::write(&path, "one\ntwo\n").unwrap();
        let (mut st, mut view, mut settings) = mk_state();
        let res = handle_command_action(
            Action::CommandExecute(format!(":r {}", path.display())),
            &mut st,
            &mut view,
            &mut settings,
        );
        assert!(res.buffer_replaced);
        assert_eq!(st.active_buffer().line(0).unwrap(), "abc\n");
        assert_eq!(st.active_buffer().line(1).unwrap(), "one\n");
        assert_eq!(st.active_buffer().line(2).unwrap(), "two\n");
        assert!(st.dirty);
    }

    #[test]
    fn substitute_replaces_on_current_line() {
        let (mut st, mut view, mut settings) = mk_state();
        let res = handle_command_action(
            Action::CommandExecute(":s/abc/xyz/".to_string()),
            &mut st,
            &mut view,
            &mut settings,
        );
        assert!(res.dirty);
        assert_eq!(st.active_buffer().line(0).unwrap(), "xyz\n");
    }

    #[test]
    fn substitute_across_range_reports_counts_message() {
        // spec.md §8 scenario 4.
        let buf = Buffer::from_str("t", "foo foo\nbar foo\nbaz\n").unwrap();
        let mut st = EditorState::new(buf);
        let mut view = core_model::View::new(Position::origin(), 0);
        let mut settings = SettingsRegistry::new();
        let res = handle_command_action(
            Action::CommandExecute(":%s/foo/X/g".to_string()),
            &mut st,
            &mut view,
            &mut settings,
        );
        assert!(res.dirty);
        assert_eq!(st.active_buffer().line(0).unwrap(), "X X\n");
        assert_eq!(st.active_buffer().line(1).unwrap(), "bar X\n");
        assert_eq!(st.active_buffer().line(2).unwrap(), "baz\n");
        assert_eq!(
            st.ephemeral_status.as_ref().map(|m| m.text.as_str()),
            Some("3 substitutions on 2 lines")
        );
    }

    #[test]
    fn write_skips_backup_when_both_settings_off() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nb.txt");
        std::fs::write(&path, "old\n").unwrap();
        let (mut st, mut view, mut settings) = mk_state();
        st.file_name = Some(path.clone());
        st.dirty = true;
        settings.set_bool("writebackup", false).unwrap();
        handle_command_action(
            Action::CommandExecute(":w".to_string()),
            &mut st,
            &mut view,
            &mut settings,
        );
        assert!(!std::path::PathBuf::from(format!("{}.bak", path.display())).exists());
    }

    #[test]
    fn set_toggles_bool_option() {
        let (mut st, mut view, mut settings) = mk_state();
        let _ = handle_command_action(
            Action::CommandExecute(":set number".to_string()),
            &mut st,
            &mut view,
            &mut settings,
        );
        assert_eq!(settings.get("number").unwrap(), &core_ex::SettingValue::Bool(true));
    }
}
