//! Mode transition handling (Normal <-> Insert).
//!
//! Scope (R3 Step 1): minimal synchronous state transition + insert run
//! coalescing finalization. This keeps mode logic isolated for future
//! expansions (Visual, Command, Operator-Pending, etc.).
//!
//! Forward Roadmap:
//! * Introduce additional modes (Visual, VisualLine, Replace) without
//!   inflating unrelated dispatcher code.
//! * Mode change side-effects (cursor shape, status line delta emission,
//!   semantic render delta) will hook here in Step 6 when `StatusLine`
//!   deltas are introduced.

use super::DispatchResult;
use crate::ModeChange;
use core_model::View;
use core_state::InsertRun;
use core_state::{EditorState, Mode};

pub(crate) fn handle_mode_change(
    mc: ModeChange,
    state: &mut EditorState,
    view: &mut View,
) -> DispatchResult {
    match mc {
        ModeChange::EnterInsert => {
            // Starting fresh insert run; ensure any previous run was ended defensively.
            state.end_insert_coalescing();
            state.mode = Mode::Insert;
            DispatchResult::dirty()
        }
        ModeChange::LeaveInsert => {
            // Determine if we should retreat cursor (Vim parity) BEFORE ending run; consult insert_run.
            let should_retreat =
                matches!(state.insert_run(), InsertRun::Active { edits, .. } if *edits > 0);
            state.end_insert_coalescing();
            if should_retreat && let Some(line) = state.active_buffer().line(view.cursor.line) {
                let raw = line.as_str();
                let trimmed = raw.strip_suffix('\n').unwrap_or(raw);
                if view.cursor.byte > 0 && view.cursor.byte <= trimmed.len() {
                    let prev = core_text::grapheme::prev_boundary(trimmed, view.cursor.byte);
                    view.cursor.byte = prev;
                }
            }
            state.mode = Mode::Normal;
            DispatchResult::dirty()
        }
        ModeChange::EnterVisual => {
            // Initialize anchored empty selection at cursor.
            use core_state::{SelectionKind, SelectionSpan};
            let pos = view.cursor;
            let span = SelectionSpan::new(pos, pos, SelectionKind::Characterwise);
            state.selection.set(span);
            state.selection.anchor = Some(pos);
            state.mode = Mode::Visual;
            DispatchResult::dirty()
        }
        ModeChange::LeaveVisual => {
            state.selection.clear();
            state.mode = Mode::Normal;
            DispatchResult::dirty()
        }
        ModeChange::EnterVisualLine => {
            use core_state::{SelectionKind, SelectionSpan};
            let pos = view.cursor;
            let span = SelectionSpan::new(pos, pos, SelectionKind::Linewise);
            state.selection.set(span);
            state.selection.anchor = Some(pos);
            state.mode = Mode::VisualLine;
            DispatchResult::dirty()
        }
        ModeChange::EnterVisualBlock => {
            use core_state::{SelectionKind, SelectionSpan};
            let pos = view.cursor;
            let span = SelectionSpan::new(pos, pos, SelectionKind::Blockwise);
            state.selection.set(span);
            state.selection.anchor = Some(pos);
            state.mode = Mode::VisualBlock;
            DispatchResult::dirty()
        }
        ModeChange::InsertLineStart => {
            core_text::motion::first_non_blank(state.active_buffer(), &mut view.cursor);
            state.begin_insert_coalescing(view.cursor);
            state.mode = Mode::Insert;
            DispatchResult::dirty()
        }
        ModeChange::InsertLineEnd => {
            core_text::motion::line_end(state.active_buffer(), &mut view.cursor);
            state.begin_insert_coalescing(view.cursor);
            state.mode = Mode::Insert;
            DispatchResult::dirty()
        }
        ModeChange::OpenBelow => {
            let line = view.cursor.line;
            let mut pos = core_text::Position { line, byte: state.active_buffer().line_byte_len(line) };
            state.active_buffer_mut().insert_newline(&mut pos);
            view.cursor = pos;
            state.begin_insert_coalescing(view.cursor);
            state.mode = Mode::Insert;
            DispatchResult::buffer_replaced()
        }
        ModeChange::OpenAbove => {
            let mut pos = core_text::Position { line: view.cursor.line, byte: 0 };
            state.active_buffer_mut().insert_newline(&mut pos);
            view.cursor = core_text::Position { line: view.cursor.line, byte: 0 };
            state.begin_insert_coalescing(view.cursor);
            state.mode = Mode::Insert;
            DispatchResult::buffer_replaced()
        }
        ModeChange::ReplaceMode => {
            state.begin_insert_coalescing(view.cursor);
            state.mode = Mode::Replace;
            DispatchResult::dirty()
        }
        ModeChange::SubstituteChar => {
            // `s`: delete the grapheme under the cursor, then behave like `i`.
            state.push_discrete_edit_snapshot(view.cursor);
            state.active_buffer_mut().delete_grapheme_at(&mut view.cursor);
            state.begin_insert_coalescing(view.cursor);
            state.mode = Mode::Insert;
            if !state.dirty {
                state.dirty = true;
            }
            DispatchResult::dirty()
        }
        ModeChange::SubstituteLine => {
            // `S`/`cc`: clear the line's contents (keeping the line itself) and insert.
            let line = view.cursor.line;
            let had_nl = state
                .active_buffer()
                .line(line)
                .is_some_and(|l| l.ends_with('\n'));
            state.push_discrete_edit_snapshot(view.cursor);
            state
                .active_buffer_mut()
                .set_line(line, if had_nl { "\n" } else { "" });
            view.cursor = core_text::Position { line, byte: 0 };
            state.begin_insert_coalescing(view.cursor);
            state.mode = Mode::Insert;
            if !state.dirty {
                state.dirty = true;
            }
            DispatchResult::dirty()
        }
    }
}
