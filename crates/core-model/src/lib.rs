//! Editor root model: owns the one `EditorState` plus the single cursor/viewport
//! the dispatcher reads and mutates.
//!
//! Multiple split windows/tabs are an explicit Non-goal (spec §1), so unlike
//! the lineage this workspace is drawn from, there is no `ViewManager` or
//! `View` collection here — just one `View` holding the cursor position and
//! the externally-provided viewport's first visible line (needed by the
//! half-page scroll motions; actual rendering/layout stays outside the core).

use core_ex::SettingsRegistry;
use core_state::EditorState;
use core_text::Position;

/// Per-buffer presentation state the dispatcher mutates: cursor position and
/// the first line of the viewport, as last reported by the external renderer.
#[derive(Debug, Clone)]
pub struct View {
    pub cursor: Position,
    pub viewport_first_line: usize,
}

impl View {
    pub fn new(cursor: Position, viewport_first_line: usize) -> Self {
        Self {
            cursor,
            viewport_first_line,
        }
    }
}

/// Owns `(buffer, mode_state, registers, macro_state, search_state)` via
/// `EditorState`, plus the single `View`. Handlers take `&mut EditorModel`
/// (through the split below) and return structured effects; the renderer is
/// a passive observer queried after each key (spec §9 "shared mutable
/// references" redesign note).
pub struct EditorModel {
    state: EditorState,
    view: View,
    settings: SettingsRegistry,
}

impl EditorModel {
    pub fn new(state: EditorState) -> Self {
        let view = View::new(Position::origin(), 0);
        Self { state, view, settings: SettingsRegistry::new() }
    }

    /// Test/helper constructor allowing an already-prepared view (cursor/viewport) to be injected.
    pub fn with_view(view: View, state: EditorState) -> Self {
        Self { state, view, settings: SettingsRegistry::new() }
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut EditorState {
        &mut self.state
    }

    pub fn active_view(&self) -> &View {
        &self.view
    }

    pub fn active_view_mut(&mut self) -> &mut View {
        &mut self.view
    }

    pub fn settings(&self) -> &SettingsRegistry {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut SettingsRegistry {
        &mut self.settings
    }

    /// Safely obtain mutable references to the underlying `EditorState` and the
    /// `View` in a single call without resorting to raw pointer casts at call
    /// sites. `state` and `view` are distinct fields, so Rust cannot derive two
    /// disjoint `&mut` borrows from a single `&mut self` without this helper;
    /// the unsafety is encapsulated here and never escapes this function.
    pub fn split_state_and_active_view(&mut self) -> (&mut EditorState, &mut View) {
        let state_ptr: *mut EditorState = &mut self.state;
        let view_ptr: *mut View = &mut self.view;
        // SAFETY: the two pointers are derived from distinct, non-overlapping
        // fields of `self`, and both resulting references share this call's
        // borrow of `&mut self`, so no aliasing `&mut` can be produced.
        unsafe { (&mut *state_ptr, &mut *view_ptr) }
    }

    /// Three-way split adding the settings registry, for command handlers
    /// that need to read or mutate `:set` options alongside buffer state.
    pub fn split_state_view_settings(&mut self) -> (&mut EditorState, &mut View, &mut SettingsRegistry) {
        let state_ptr: *mut EditorState = &mut self.state;
        let view_ptr: *mut View = &mut self.view;
        let settings_ptr: *mut SettingsRegistry = &mut self.settings;
        // SAFETY: the three pointers are derived from distinct,
        // non-overlapping fields of `self`; see `split_state_and_active_view`.
        unsafe { (&mut *state_ptr, &mut *view_ptr, &mut *settings_ptr) }
    }

    // -- Renderer query surface (spec §6 "Renderer interface (produced)") --

    /// The buffer's lines, each including its line ending.
    pub fn lines(&self) -> Vec<String> {
        let buf = self.state.active_buffer();
        (0..buf.line_count()).filter_map(|i| buf.line(i)).collect()
    }

    pub fn cursor(&self) -> Position {
        self.view.cursor
    }

    pub fn mode(&self) -> core_state::Mode {
        self.state.mode
    }

    /// Short indicator for a status line (`-- INSERT --`, `-- VISUAL --`, ...),
    /// empty in Normal mode where vi conventionally shows nothing.
    pub fn mode_indicator(&self) -> &'static str {
        match self.state.mode {
            core_state::Mode::Normal => "",
            core_state::Mode::Insert => "-- INSERT --",
            core_state::Mode::Visual => "-- VISUAL --",
            core_state::Mode::VisualLine => "-- VISUAL LINE --",
            core_state::Mode::VisualBlock => "-- VISUAL BLOCK --",
            core_state::Mode::CommandLine => "",
            core_state::Mode::OperatorPending => "",
            core_state::Mode::Replace => "-- REPLACE --",
            core_state::Mode::ReplaceSingle => "-- REPLACE --",
        }
    }

    /// The live `:`/`/`/`?` command line buffer, including its leading prefix
    /// character, or empty outside `CommandLine` mode.
    pub fn command_line_text(&self) -> &str {
        self.state.command_line.buffer()
    }

    /// The current ephemeral status text, if one is still live (unexpired).
    pub fn status_message(&self) -> Option<&str> {
        self.state
            .ephemeral_status
            .as_ref()
            .filter(|m| m.expires_at > std::time::Instant::now())
            .map(|m| m.text.as_str())
    }

    /// Spans of the last search pattern's matches, for `hlsearch`-style
    /// highlighting. Empty if there is no active pattern or it no longer
    /// matches anywhere.
    pub fn search_highlights(&mut self) -> Vec<(Position, Position)> {
        let Some(pattern) = self.state.search.last_pattern().map(str::to_string) else {
            return Vec::new();
        };
        let ignorecase = matches!(
            self.settings.get("ignorecase"),
            Ok(core_ex::SettingValue::Bool(true))
        );
        self.state
            .search
            .find_all(self.state.active_buffer(), &pattern, !ignorecase)
            .unwrap_or_default()
    }

    /// The active Visual-mode selection span, if any.
    pub fn selection(&self) -> Option<core_state::SelectionSpan> {
        self.state.selection.active
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_text::Buffer;

    #[test]
    fn single_view_initialized_at_origin() {
        let st = EditorState::new(Buffer::from_str("test", "hello\n").unwrap());
        let model = EditorModel::new(st);
        let v = model.active_view();
        assert_eq!(v.cursor, Position::origin());
        assert_eq!(v.viewport_first_line, 0);
    }

    #[test]
    fn active_view_mut_updates_visible_via_split() {
        let st = EditorState::new(Buffer::from_str("t", "abc\n").unwrap());
        let mut model = EditorModel::new(st);
        {
            let v = model.active_view_mut();
            v.cursor.line = 0;
            v.cursor.byte = 1;
        }
        assert_eq!(model.active_view().cursor.byte, 1);
        let (state, view) = model.split_state_and_active_view();
        assert_eq!(state.active, 0);
        assert_eq!(view.cursor.byte, 1);
    }

    #[test]
    fn mode_indicator_blank_in_normal_mode() {
        let st = EditorState::new(Buffer::from_str("t", "abc\n").unwrap());
        let model = EditorModel::new(st);
        assert_eq!(model.mode_indicator(), "");
        assert_eq!(model.mode(), core_state::Mode::Normal);
    }

    #[test]
    fn mode_indicator_reflects_insert_mode() {
        let mut st = EditorState::new(Buffer::from_str("t", "abc\n").unwrap());
        st.mode = core_state::Mode::Insert;
        let model = EditorModel::new(st);
        assert_eq!(model.mode_indicator(), "-- INSERT --");
    }

    #[test]
    fn status_message_reflects_live_ephemeral_text() {
        let mut st = EditorState::new(Buffer::from_str("t", "abc\n").unwrap());
        st.set_ephemeral("Wrote", std::time::Duration::from_secs(3));
        let model = EditorModel::new(st);
        assert_eq!(model.status_message(), Some("Wrote"));
    }

    #[test]
    fn lines_returns_buffer_content_with_endings() {
        let st = EditorState::new(Buffer::from_str("t", "a\nb\n").unwrap());
        let model = EditorModel::new(st);
        assert_eq!(model.lines(), vec!["a\n".to_string(), "b\n".to_string()]);
    }

    #[test]
    fn search_highlights_empty_without_pattern() {
        let st = EditorState::new(Buffer::from_str("t", "abc\n").unwrap());
        let mut model = EditorModel::new(st);
        assert!(model.search_highlights().is_empty());
    }
}
