//! Thin adapter translating operator/edit results into `Registers` writes.
//!
//! Operators here only ever know "this text came from a delete/yank/change
//! of this shape"; they don't know about `RegisterName` resolution or the
//! numbered-ring shift rule, so that lives here in one place.

use core_state::{EditorState, RegisterKind, RegisterName, RegisterValue};

fn kind_for(linewise: bool) -> RegisterKind {
    if linewise {
        RegisterKind::Linewise
    } else {
        RegisterKind::Charwise
    }
}

pub(crate) fn record_yank(state: &mut EditorState, text: String, register: Option<char>, linewise: bool) {
    let target = register.and_then(RegisterName::from_char);
    state
        .registers_mut()
        .record_yank(RegisterValue::new(text, kind_for(linewise)), target);
}

/// Delete and change both land in the delete ring under vi's rules; only
/// the insert-vs-stay-in-normal behavior differs, which callers handle
/// themselves after this write.
pub(crate) fn record_delete(
    state: &mut EditorState,
    text: String,
    register: Option<char>,
    linewise: bool,
    shifts_numbered: bool,
) {
    let target = register.and_then(RegisterName::from_char);
    state.registers_mut().record_delete(
        RegisterValue::new(text, kind_for(linewise)),
        target,
        shifts_numbered,
    );
}
