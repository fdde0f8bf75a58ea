//! Shared implementation for the non-delete/yank/change operators (`>`, `<`,
//! `=`, `gu`, `gU`, `g~`), used by every call site that applies an
//! `OperatorKind` over a resolved span: plain motions, the `dd`-style
//! linewise shorthand, Visual mode, and text objects.

use super::DispatchResult;
use crate::OperatorKind;
use core_model::View;
use core_state::EditorState;
use core_text::Position;

/// `gu`/`gU`/`g~`: fold the case of every character in `[abs_start, abs_end)`
/// in place, leaving the cursor at the start of the (unchanged-length for
/// single-byte cases, but never assumed so) transformed span.
pub(crate) fn apply_case_operator(
    state: &mut EditorState,
    view: &mut View,
    op: OperatorKind,
    abs_start: usize,
    abs_end: usize,
) -> DispatchResult {
    if abs_start >= abs_end {
        return DispatchResult::clean();
    }
    let original = state.active_buffer().slice_bytes(abs_start, abs_end);
    let transformed = transform_case(op, &original);
    let mut cursor = view.cursor;
    state.delete_span_with_snapshot(&mut cursor, abs_start, abs_end);
    state.active_buffer_mut().insert_text(&mut cursor, &transformed);
    view.cursor = state.active_buffer().position_at(abs_start);
    if !state.dirty {
        state.dirty = true;
    }
    DispatchResult::dirty()
}

fn transform_case(op: OperatorKind, text: &str) -> String {
    match op {
        OperatorKind::LowerCase => text.to_lowercase(),
        OperatorKind::UpperCase => text.to_uppercase(),
        OperatorKind::SwapCase => text
            .chars()
            .map(|c| {
                if c.is_uppercase() {
                    c.to_lowercase().next().unwrap_or(c)
                } else if c.is_lowercase() {
                    c.to_uppercase().next().unwrap_or(c)
                } else {
                    c
                }
            })
            .collect(),
        _ => text.to_string(),
    }
}

/// `>`/`<`/`=` over whole lines `[line_start, line_end]` (inclusive): shift
/// each non-blank line's leading-space indentation by one `shiftwidth`, or
/// (`=`) align it to the nearest preceding non-blank line's indentation.
pub(crate) fn apply_indent_operator(
    state: &mut EditorState,
    view: &mut View,
    op: OperatorKind,
    line_start: usize,
    line_end: usize,
    shiftwidth: usize,
) -> DispatchResult {
    state.push_discrete_edit_snapshot(view.cursor);
    let sw = shiftwidth.max(1);
    let mut touched = false;
    for l in line_start..=line_end {
        let Some(raw) = state.active_buffer().line(l) else { continue };
        let had_nl = raw.ends_with('\n');
        let body = raw.strip_suffix('\n').unwrap_or(&raw);
        let current_indent = body.len() - body.trim_start_matches(' ').len();
        let rest = &body[current_indent..];
        if rest.is_empty() {
            continue; // vi never indents a blank line
        }
        let new_indent = match op {
            OperatorKind::ShiftRight => current_indent + sw,
            OperatorKind::ShiftLeft => current_indent.saturating_sub(sw),
            OperatorKind::AutoIndent => {
                let mut found = current_indent;
                let mut prev = l;
                while prev > 0 {
                    prev -= 1;
                    if let Some(p) = state.active_buffer().line(prev) {
                        let pbody = p.strip_suffix('\n').unwrap_or(&p);
                        if !pbody.trim().is_empty() {
                            found = pbody.len() - pbody.trim_start_matches(' ').len();
                            break;
                        }
                    }
                }
                found
            }
            _ => current_indent,
        };
        if new_indent == current_indent {
            continue;
        }
        let mut new_line = " ".repeat(new_indent);
        new_line.push_str(rest);
        if had_nl {
            new_line.push('\n');
        }
        state.active_buffer_mut().set_line(l, &new_line);
        touched = true;
    }
    if touched {
        view.cursor = Position { line: line_start, byte: 0 };
        core_text::motion::first_non_blank(state.active_buffer(), &mut view.cursor);
        if !state.dirty {
            state.dirty = true;
        }
        DispatchResult::buffer_replaced()
    } else {
        DispatchResult::clean()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_model::View;
    use core_text::Buffer;

    fn setup(text: &str) -> (EditorState, View) {
        let state = EditorState::new(Buffer::from_str("t", text).unwrap());
        (state, View::new(Position::origin(), 0))
    }

    #[test]
    fn shift_right_adds_one_shiftwidth() {
        let (mut state, mut view) = setup("abc\n");
        apply_indent_operator(&mut state, &mut view, OperatorKind::ShiftRight, 0, 0, 4);
        assert_eq!(state.active_buffer().line(0).unwrap(), "    abc\n");
    }

    #[test]
    fn shift_left_never_goes_negative() {
        let (mut state, mut view) = setup("  abc\n");
        apply_indent_operator(&mut state, &mut view, OperatorKind::ShiftLeft, 0, 0, 4);
        assert_eq!(state.active_buffer().line(0).unwrap(), "abc\n");
    }

    #[test]
    fn upper_case_transforms_range() {
        let (mut state, mut view) = setup("abc\n");
        apply_case_operator(&mut state, &mut view, OperatorKind::UpperCase, 0, 3);
        assert_eq!(state.active_buffer().line(0).unwrap(), "ABC\n");
    }
}
