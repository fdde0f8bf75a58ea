//! Action vocabulary and key-translation entry point.
//!
//! `core-keymap` owns the full command/motion/operator vocabulary a front
//! end can bind keys to. This crate is deliberately smaller: it is the
//! dispatcher's own working vocabulary, covering exactly the subset of
//! motions, operators, and edits that `dispatcher` currently implements.
//! As coverage grows the two enumerations converge; until then keeping them
//! separate means an unimplemented `core-keymap` variant can never silently
//! reach the dispatcher and panic on a missing match arm.

pub mod dispatcher;
mod error;
mod io_ops;
mod key_translator;
mod registers_adapter;
mod span_resolver;
mod text_object;

pub use dispatcher::{DispatchResult, dispatch};
pub use error::EditorError;
pub use key_translator::KeyTranslator;

use core_events::KeyEvent;
use core_state::Mode;
use std::cell::RefCell;

/// Cursor motions the dispatcher knows how to apply, bare or as an operator
/// span (§span_resolver).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MotionKind {
    Left,
    Right,
    LineStart,
    LineEnd,
    FirstNonBlank,
    Up,
    Down,
    WordForward,
    WordBackward,
    WordEnd,
    BigWordForward,
    BigWordBackward,
    BigWordEnd,
    GotoLine,
    GotoFirstLine,
    ParagraphForward,
    ParagraphBackward,
    MatchingBracket,
    FindCharForward(char),
    FindCharBackward(char),
    TillCharForward(char),
    TillCharBackward(char),
    RepeatFindSame,
    RepeatFindOpposite,
    PageHalfDown,
    PageHalfUp,
    ViewportHigh,
    ViewportMiddle,
    ViewportLow,
}

/// Operators the dispatcher can apply over a resolved span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorKind {
    Delete,
    Yank,
    Change,
    AutoIndent,
    ShiftRight,
    ShiftLeft,
    LowerCase,
    UpperCase,
    SwapCase,
}

/// Mode transitions the dispatcher currently drives end to end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModeChange {
    EnterInsert,
    LeaveInsert,
    EnterVisual,
    LeaveVisual,
    EnterVisualLine,
    EnterVisualBlock,
    InsertLineStart,
    InsertLineEnd,
    OpenBelow,
    OpenAbove,
    ReplaceMode,
    SubstituteChar,
    SubstituteLine,
}

/// Buffer mutations distinct from operator-driven edits (insert mode typing,
/// `x`, `X`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditKind {
    InsertGrapheme(String),
    InsertNewline,
    Backspace,
    DeleteUnder { count: usize, register: Option<char> },
    DeleteLeft { count: usize, register: Option<char> },
}

/// The dispatcher's unit of work. `translate_key` produces these from raw
/// key events; `dispatch` consumes them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Motion(MotionKind),
    MotionWithCount { motion: MotionKind, count: u32 },
    ModeChange(ModeChange),
    CommandStart,
    CommandChar(char),
    CommandBackspace,
    CommandCancel,
    CommandExecute(String),
    Edit(EditKind),
    Undo,
    Redo,
    PasteAfter { register: Option<char>, count: usize },
    PasteBefore { register: Option<char>, count: usize },
    Quit,
    BeginOperator(OperatorKind),
    ApplyOperator {
        op: OperatorKind,
        motion: MotionKind,
        count: u32,
        register: Option<char>,
    },
    LinewiseOperator {
        op: OperatorKind,
        count: u32,
        register: Option<char>,
    },
    VisualOperator {
        op: OperatorKind,
        register: Option<char>,
    },
    VisualPaste {
        before: bool,
        register: Option<char>,
        count: usize,
    },
    /// An operator applied over a text object's span (`diw`, `ya"`, `c i(`).
    ApplyOperatorObject {
        op: OperatorKind,
        object: core_keymap::TextObjectKind,
        count: u32,
        register: Option<char>,
    },
    /// In Visual mode, `i`/`a` + object char replaces the active selection
    /// with the text object's span instead of applying an operator directly.
    VisualTextObject {
        object: core_keymap::TextObjectKind,
    },
    /// `r{char}`: replace the grapheme under the cursor without entering
    /// Insert mode.
    ReplaceChar { ch: char, count: u32 },
    /// `~`: toggle the case of the grapheme under the cursor and advance.
    ToggleCaseChar { count: u32 },
    /// `J` / `gJ`.
    Join { count: u32, with_space: bool },
    SetMark { name: char },
    JumpToMarkLine { name: char },
    JumpToMarkExact { name: char },
    JumpOlder,
    JumpNewer,
    SearchStart { forward: bool },
    SearchChar(char),
    SearchBackspace,
    SearchCancel,
    SearchExecute(String),
    SearchNext,
    SearchPrev,
    SearchWordForward,
    SearchWordBackward,
    /// `q{reg}` starting a recording, or `q` again stopping the active one.
    MacroRecordToggle { register: Option<char> },
    /// `@{reg}`; `register == None` means `@@` (replay the last-played one).
    MacroPlay { register: Option<char>, count: u32 },
    /// `.`: re-issue the last repeatable change, optionally overriding its count.
    RepeatLastChange { count: Option<u32> },
}

/// Hook for front ends / test harnesses that want to observe every action
/// before it mutates state (e.g. a key-logger status line, a macro recorder).
pub trait ActionObserver {
    fn on_action(&self, action: &Action);
}

/// What `.` re-issues: either a single action verbatim (mirroring vi's
/// notion of "the last change"), or a finalized insert-mode session replayed
/// by re-entering Insert and typing its text again, `count` times.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RepeatRecord {
    Simple(Action),
    InsertRun { text: String, count: u32 },
}

thread_local! {
    static TRANSLATOR: RefCell<KeyTranslator> = RefCell::new(KeyTranslator::new());
    static LAST_CHANGE: RefCell<Option<RepeatRecord>> = const { RefCell::new(None) };
    /// Accumulates the finalized text of the insert-mode session currently
    /// in progress, if any. Started on entering Insert (`i`, `a`, `o`, ...),
    /// updated as graphemes/newlines/backspaces are applied, and drained
    /// into `LAST_CHANGE` as a `RepeatRecord::InsertRun` on `LeaveInsert`.
    static INSERT_SESSION: RefCell<Option<String>> = const { RefCell::new(None) };
}

/// Actions the `.` command knows how to re-issue verbatim. Insert-session
/// typing (`InsertGrapheme`/`InsertNewline`/`Backspace`) is excluded here —
/// it's captured as a whole by [`begin_insert_session`]/[`end_insert_session`]
/// instead, since a single keystroke's `Action` can't represent a multi-key
/// insert run. Motions, searches, marks, and macro control never overwrite
/// this slot, only the change itself does.
fn is_repeatable_change(action: &Action) -> bool {
    matches!(
        action,
        Action::Edit(EditKind::DeleteUnder { .. })
            | Action::Edit(EditKind::DeleteLeft { .. })
            | Action::ApplyOperator { .. }
            | Action::LinewiseOperator { .. }
            | Action::ApplyOperatorObject { .. }
            | Action::ReplaceChar { .. }
            | Action::ToggleCaseChar { .. }
            | Action::Join { .. }
            | Action::PasteAfter { .. }
            | Action::PasteBefore { .. }
    )
}

/// Record `action` as the last repeatable change if it qualifies; called by
/// the dispatcher after every dispatched action that left the buffer dirty.
pub(crate) fn record_last_change(action: &Action) {
    if is_repeatable_change(action) {
        LAST_CHANGE.with(|c| *c.borrow_mut() = Some(RepeatRecord::Simple(action.clone())));
    }
}

/// Start accumulating a fresh insert session, discarding any unfinished one
/// (defensive: `EnterInsert` always follows a clean `LeaveInsert` or a reset).
pub(crate) fn begin_insert_session() {
    INSERT_SESSION.with(|c| *c.borrow_mut() = Some(String::new()));
}

/// Append text typed (or a newline) into the in-progress insert session, if
/// one is active.
pub(crate) fn note_insert_session_text(text: &str) {
    INSERT_SESSION.with(|c| {
        if let Some(buf) = c.borrow_mut().as_mut() {
            buf.push_str(text);
        }
    });
}

/// Remove the last grapheme from the in-progress insert session, mirroring a
/// backspace during the same run.
pub(crate) fn note_insert_session_backspace() {
    INSERT_SESSION.with(|c| {
        if let Some(buf) = c.borrow_mut().as_mut()
            && !buf.is_empty()
        {
            let prev = core_text::grapheme::prev_boundary(buf, buf.len());
            buf.truncate(prev);
        }
    });
}

/// Finalize the in-progress insert session (if any) into the `.` slot, even
/// if it ended up empty (`i<Esc>` is a repeatable no-op, same as vi).
pub(crate) fn end_insert_session() {
    if let Some(text) = INSERT_SESSION.with(|c| c.borrow_mut().take()) {
        LAST_CHANGE.with(|c| *c.borrow_mut() = Some(RepeatRecord::InsertRun { text, count: 1 }));
    }
}

/// The last repeatable change recorded via [`record_last_change`] or
/// [`end_insert_session`], with its count overridden to `count` if one was
/// given (`3.` re-issues the last change with a count of 3 instead of
/// whatever it originally used).
pub(crate) fn last_change_for_repeat(count: Option<u32>) -> Option<RepeatRecord> {
    let record = LAST_CHANGE.with(|c| c.borrow().clone())?;
    let Some(n) = count else { return Some(record) };
    Some(match record {
        RepeatRecord::InsertRun { text, .. } => RepeatRecord::InsertRun { text, count: n },
        RepeatRecord::Simple(action) => RepeatRecord::Simple(match action {
            Action::Edit(EditKind::DeleteUnder { register, .. }) => {
                Action::Edit(EditKind::DeleteUnder { count: n as usize, register })
            }
            Action::Edit(EditKind::DeleteLeft { register, .. }) => {
                Action::Edit(EditKind::DeleteLeft { count: n as usize, register })
            }
            Action::ApplyOperator { op, motion, register, .. } => {
                Action::ApplyOperator { op, motion, count: n, register }
            }
            Action::LinewiseOperator { op, register, .. } => {
                Action::LinewiseOperator { op, count: n, register }
            }
            Action::ApplyOperatorObject { op, object, register, .. } => {
                Action::ApplyOperatorObject { op, object, count: n, register }
            }
            Action::ReplaceChar { ch, .. } => Action::ReplaceChar { ch, count: n },
            Action::ToggleCaseChar { .. } => Action::ToggleCaseChar { count: n },
            Action::Join { with_space, .. } => Action::Join { count: n, with_space },
            Action::PasteAfter { register, .. } => Action::PasteAfter { register, count: n as usize },
            Action::PasteBefore { register, .. } => Action::PasteBefore { register, count: n as usize },
            other => other,
        }),
    })
}

/// Sync the thread-local translator's idea of "is a recording active" so it
/// can tell a `q{reg}`-starting keystroke from a bare `q`-stopping one
/// without needing access to `EditorState` itself.
pub fn set_macro_recording_active(active: bool) {
    TRANSLATOR.with(|t| t.borrow_mut().set_recording_active(active));
}

// `translate_key` wraps a single `KeyTranslator` per OS thread. The engine
// only ever drives one Normal-mode key stream per session, so the translator
// genuinely is thread-local state rather than a global; a caller that wants
// more than one independent stream (embedding more than one buffer view)
// should hold its own `KeyTranslator` and call `.translate()` directly
// instead of going through this free function.
//
/// Translate one key event against the thread-local translator, threading
/// count/operator/register state across calls. Tests that exercise a fresh
/// key sequence on a thread that may have run other tests first should call
/// [`reset_translator`] before the first key.
pub fn translate_key(mode: Mode, pending_command: &str, key: &KeyEvent) -> Option<Action> {
    TRANSLATOR.with(|t| t.borrow_mut().translate(mode, pending_command, key))
}

/// Clear the thread-local translator's count/operator/register state.
pub fn reset_translator() {
    TRANSLATOR.with(|t| t.borrow_mut().reset());
}
