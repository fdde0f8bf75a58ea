//! Motion sub-dispatch (cursor movement).
//!
//! Scope (R3 Step 1):
//! * Pure, synchronous cursor movement logic (no side-effects beyond cursor & sticky column).
//! * Emits only `DispatchResult::{dirty,clean}`; future steps will extend with semantic deltas.
//!
//! Design Tenet Alignment:
//! * Modularity: isolates motion rules from edits & command parsing.
//! * Unicode correctness: delegates to `core_text::motion::*` which operate on grapheme clusters.
//! * Evolution: future operator-pending motions and counts will layer here without touching unrelated code.
//!
//! Forward Roadmap (beyond R3):
//! * Count-aware motions (e.g. `5j`) applied before invoking the underlying motion primitive.
//! * Operator-target resolution (e.g. in `dw`, motion result will be paired with an operator kind).
//! * Horizontal scroll & fold awareness once those concepts enter `View`.
//! * Scroll-region optimization hints (when combined with layout + capabilities) to minimize redraw.
//!
//! Testing: parity covered indirectly via original dispatcher tests moved intact. Additional
//! focused motion tests will be added when count/operator semantics arrive.

use super::DispatchResult;
use crate::MotionKind;
use core_model::View;
use core_state::EditorState;
use core_state::Mode;
use core_text::motion::FindCharKind;
use core_text::{Buffer, Position, motion};

pub(crate) fn handle_motion(
    kind: MotionKind,
    state: &mut EditorState,
    view: &mut View,
    sticky_visual_col: &mut Option<usize>,
) -> DispatchResult {
    let before = view.cursor;
    match kind {
        MotionKind::Left => {
            apply_horizontal_motion(state, &mut view.cursor, motion::left);
            *sticky_visual_col = None;
        }
        MotionKind::Right => {
            apply_horizontal_motion(state, &mut view.cursor, motion::right);
            *sticky_visual_col = None;
        }
        MotionKind::LineStart => {
            apply_horizontal_motion(state, &mut view.cursor, motion::line_start);
            *sticky_visual_col = None;
        }
        MotionKind::LineEnd => {
            apply_horizontal_motion(state, &mut view.cursor, motion::line_end);
            *sticky_visual_col = None;
        }
        MotionKind::FirstNonBlank => {
            apply_horizontal_motion(state, &mut view.cursor, motion::first_non_blank);
            *sticky_visual_col = None;
        }
        MotionKind::Up => {
            *sticky_visual_col =
                apply_vertical_motion(state, &mut view.cursor, *sticky_visual_col, motion::up);
        }
        MotionKind::Down => {
            *sticky_visual_col =
                apply_vertical_motion(state, &mut view.cursor, *sticky_visual_col, motion::down);
        }
        MotionKind::WordForward => {
            apply_horizontal_motion(state, &mut view.cursor, motion::word_forward);
            *sticky_visual_col = None;
        }
        MotionKind::WordBackward => {
            apply_horizontal_motion(state, &mut view.cursor, motion::word_backward);
            *sticky_visual_col = None;
        }
        MotionKind::WordEnd => {
            apply_horizontal_motion(state, &mut view.cursor, motion::word_end_forward);
            *sticky_visual_col = None;
        }
        MotionKind::BigWordForward => {
            apply_horizontal_motion(state, &mut view.cursor, motion::big_word_forward);
            *sticky_visual_col = None;
        }
        MotionKind::BigWordBackward => {
            apply_horizontal_motion(state, &mut view.cursor, motion::big_word_backward);
            *sticky_visual_col = None;
        }
        MotionKind::BigWordEnd => {
            apply_horizontal_motion(state, &mut view.cursor, motion::big_word_end_forward);
            *sticky_visual_col = None;
        }
        MotionKind::GotoFirstLine => {
            state.push_jump(view.cursor);
            motion::goto_first_line(state.active_buffer(), &mut view.cursor);
            *sticky_visual_col = None;
        }
        MotionKind::GotoLine => {
            // Bare `G` (no count) goes to the last line; `NG` is handled by the
            // translator as `MotionWithCount`, which this dispatcher treats as
            // "repeat the plain motion N times" for everything except GotoLine,
            // whose count means an absolute target rather than a repeat factor.
            state.push_jump(view.cursor);
            motion::goto_line(state.active_buffer(), &mut view.cursor, None);
            *sticky_visual_col = None;
        }
        MotionKind::ParagraphForward => {
            apply_horizontal_motion(state, &mut view.cursor, motion::paragraph_forward);
            *sticky_visual_col = None;
        }
        MotionKind::ParagraphBackward => {
            apply_horizontal_motion(state, &mut view.cursor, motion::paragraph_backward);
            *sticky_visual_col = None;
        }
        MotionKind::MatchingBracket => {
            let mut pos = view.cursor;
            if motion::matching_bracket(state.active_buffer(), &mut pos) {
                view.cursor = pos;
            }
            *sticky_visual_col = None;
        }
        MotionKind::FindCharForward(ch) => {
            run_find(state, view, FindCharKind::ForwardTo, ch, true);
            *sticky_visual_col = None;
        }
        MotionKind::FindCharBackward(ch) => {
            run_find(state, view, FindCharKind::BackwardTo, ch, true);
            *sticky_visual_col = None;
        }
        MotionKind::TillCharForward(ch) => {
            run_find(state, view, FindCharKind::ForwardTill, ch, true);
            *sticky_visual_col = None;
        }
        MotionKind::TillCharBackward(ch) => {
            run_find(state, view, FindCharKind::BackwardTill, ch, true);
            *sticky_visual_col = None;
        }
        MotionKind::RepeatFindSame => {
            if let Some((kind, ch)) = state.last_find {
                run_find(state, view, kind, ch, false);
            }
            *sticky_visual_col = None;
        }
        MotionKind::RepeatFindOpposite => {
            if let Some((kind, ch)) = state.last_find {
                run_find(state, view, opposite(kind), ch, false);
            }
            *sticky_visual_col = None;
        }
        MotionKind::ViewportHigh => {
            let top = view.viewport_first_line;
            apply_horizontal_motion(state, &mut view.cursor, |buf, pos| {
                motion::viewport_high(buf, pos, top)
            });
            *sticky_visual_col = None;
        }
        MotionKind::ViewportMiddle => {
            let top = view.viewport_first_line;
            let h = state.last_text_height;
            apply_horizontal_motion(state, &mut view.cursor, move |buf, pos| {
                motion::viewport_middle(buf, pos, top, h)
            });
            *sticky_visual_col = None;
        }
        MotionKind::ViewportLow => {
            let top = view.viewport_first_line;
            let h = state.last_text_height;
            apply_horizontal_motion(state, &mut view.cursor, move |buf, pos| {
                motion::viewport_low(buf, pos, top, h)
            });
            *sticky_visual_col = None;
        }
        MotionKind::PageHalfDown => page_half_down(state, view, sticky_visual_col),
        MotionKind::PageHalfUp => page_half_up(state, view, sticky_visual_col),
    }
    // Apply Normal-mode cursor normalization (Vim semantics: block cursor rests on a real cell)
    if matches!(state.mode, Mode::Normal) {
        motion::normalize_normal_mode_position(state.active_buffer(), &mut view.cursor);
    }
    // Visual selection expansion (Phase 5 / Step 3): if in Visual and cursor moved, update selection span.
    if matches!(state.mode, Mode::Visual) && before != view.cursor {
        expand_visual_char_selection(state, before, view.cursor);
    } else if matches!(state.mode, Mode::Visual) && state.selection.active.is_none() {
        // Defensive: guarantee an active zero-length selection exists while in Visual.
        use core_state::{SelectionKind, SelectionSpan};
        let anchor = view.cursor;
        state.selection.set(SelectionSpan::new(
            anchor,
            anchor,
            SelectionKind::Characterwise,
        ));
        if state.selection.anchor.is_none() {
            state.selection.anchor = Some(anchor);
        }
    }
    if before != view.cursor {
        tracing::trace!(target: "actions.dispatch", motion=?kind, line=before.line, byte=before.byte, to_line=view.cursor.line, to_byte=view.cursor.byte, "motion");
        DispatchResult::dirty()
    } else {
        DispatchResult::clean()
    }
}

fn expand_visual_char_selection(
    state: &mut EditorState,
    anchor_candidate: Position,
    new_cursor: Position,
) {
    use core_state::{SelectionKind, SelectionSpan};
    // Initialize anchor if not already set (defensive for legacy entry paths)
    if state.selection.anchor.is_none() {
        state.selection.anchor = Some(anchor_candidate);
    }
    let anchor = state.selection.anchor.expect("anchor just ensured");
    // Keep span normalized (ordering) while anchor is preserved separately.
    let span = SelectionSpan::new(anchor, new_cursor, SelectionKind::Characterwise);
    state.selection.set(span);
}

fn page_half_down(state: &EditorState, view: &mut View, sticky_visual_col: &mut Option<usize>) {
    // New semantics (Phase 5 / Step 0.2): explicit half-page scroll independent of
    // margin-based auto_scroll. We shift the viewport by half the last known text
    // height and advance the cursor by the same jump, clamping at buffer end.
    let buffer = state.active_buffer();
    let total_lines = buffer.line_count();
    if total_lines == 0 {
        return;
    }
    let h = state.last_text_height.max(1).min(total_lines); // guard small files
    let jump = (h / 2).max(1);
    // Compute new viewport first line; clamp so last page is fully visible.
    let max_first = total_lines.saturating_sub(h);
    let candidate_first = view.viewport_first_line.saturating_add(jump);
    let new_first = candidate_first.min(max_first);
    view.viewport_first_line = new_first;
    // Target cursor line; clamp to last line. Always attempt full jump even when viewport already clamped.
    let target_line = (view.cursor.line + jump).min(total_lines.saturating_sub(1));
    while view.cursor.line < target_line {
        *sticky_visual_col =
            apply_vertical_motion(state, &mut view.cursor, *sticky_visual_col, motion::down);
    }
}

fn page_half_up(state: &EditorState, view: &mut View, sticky_visual_col: &mut Option<usize>) {
    let buffer = state.active_buffer();
    let total_lines = buffer.line_count();
    if total_lines == 0 {
        return;
    }
    let h = state.last_text_height.max(1).min(total_lines);
    let jump = (h / 2).max(1);
    // Compute new viewport first line with saturating subtraction.
    let new_first = view.viewport_first_line.saturating_sub(jump);
    view.viewport_first_line = new_first;
    // Move cursor up by jump lines (clamped at 0).
    let target_line = view.cursor.line.saturating_sub(jump);
    while view.cursor.line > target_line {
        *sticky_visual_col =
            apply_vertical_motion(state, &mut view.cursor, *sticky_visual_col, motion::up);
    }
}

fn apply_horizontal_motion(
    state: &EditorState,
    cursor: &mut Position,
    f: impl FnOnce(&Buffer, &mut Position),
) {
    f(state.active_buffer(), cursor);
}

fn opposite(kind: FindCharKind) -> FindCharKind {
    match kind {
        FindCharKind::ForwardTo => FindCharKind::BackwardTo,
        FindCharKind::BackwardTo => FindCharKind::ForwardTo,
        FindCharKind::ForwardTill => FindCharKind::BackwardTill,
        FindCharKind::BackwardTill => FindCharKind::ForwardTill,
    }
}

/// Run a single-line find-char motion, updating the cursor only on success.
/// `record` is false for `;`/`,` re-runs so they don't overwrite `last_find`
/// with their (possibly direction-flipped) kind.
fn run_find(state: &mut EditorState, view: &mut View, kind: FindCharKind, ch: char, record: bool) {
    let mut pos = view.cursor;
    if motion::find_char(state.active_buffer(), &mut pos, kind, ch) {
        view.cursor = pos;
    }
    if record {
        state.last_find = Some((kind, ch));
    }
}
fn apply_vertical_motion(
    state: &EditorState,
    cursor: &mut Position,
    sticky: Option<usize>,
    f: fn(&Buffer, &mut Position, Option<usize>) -> Option<usize>,
) -> Option<usize> {
    f(state.active_buffer(), cursor, sticky)
}
