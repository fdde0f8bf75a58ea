//! The dispatcher's unified error vocabulary (§7's error taxonomy).
//!
//! `core-state` and `core-search` raise their own narrower local errors
//! (`PasteError`, `SearchError`) from the operations that can fail; this
//! crate folds them into one type so an embedding program has a single
//! enum to match on and display, regardless of which lower crate raised it.

use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum EditorError {
    #[error("unknown command")]
    UnknownCommand,
    #[error("no previous pattern")]
    NoPreviousPattern,
    #[error("pattern not found")]
    PatternNotFound,
    #[error("mark not set")]
    MarkNotSet,
    #[error("no write since last change")]
    NoWriteSinceLastChange,
    #[error("read-only")]
    ReadOnly,
    #[error("invalid pattern")]
    InvalidPattern,
    #[error("nothing to undo")]
    NothingToUndo,
    #[error("nothing to redo")]
    NothingToRedo,
    #[error("macro playback depth exceeded")]
    MacroDepthExceeded,
    #[error("register empty")]
    RegisterEmpty,
}

impl From<core_search::SearchError> for EditorError {
    fn from(e: core_search::SearchError) -> Self {
        match e {
            core_search::SearchError::NoPreviousPattern => EditorError::NoPreviousPattern,
            core_search::SearchError::PatternNotFound => EditorError::PatternNotFound,
            core_search::SearchError::InvalidPattern => EditorError::InvalidPattern,
        }
    }
}

impl From<core_state::PasteError> for EditorError {
    fn from(e: core_state::PasteError) -> Self {
        match e {
            core_state::PasteError::Empty => EditorError::RegisterEmpty,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_error_converts_to_editor_error() {
        let e: EditorError = core_search::SearchError::PatternNotFound.into();
        assert_eq!(e, EditorError::PatternNotFound);
    }

    #[test]
    fn paste_error_converts_to_editor_error() {
        let e: EditorError = core_state::PasteError::Empty.into();
        assert_eq!(e, EditorError::RegisterEmpty);
    }

    #[test]
    fn display_messages_match_spec_wording() {
        assert_eq!(EditorError::NoWriteSinceLastChange.to_string(), "no write since last change");
        assert_eq!(EditorError::MacroDepthExceeded.to_string(), "macro playback depth exceeded");
    }
}
