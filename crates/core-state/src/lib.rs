//! Editor state: buffer, mode, undo engine, registers, marks and search
//! session for a single active buffer.
//!
//! This crate stays buffer-centric by design (REDESIGN FLAGS §9): one
//! `EditorState` owns everything an editing command needs to read or
//! mutate, rather than routing through a shared mutable context object the
//! dispatcher threads around.

use core_text::{Buffer, Position};
use std::collections::HashMap;

pub mod macro_state;
pub mod registers;
pub mod undo;

pub use macro_state::MacroState;
pub use registers::{RegisterKind, RegisterName, RegisterValue, Registers};
use undo::UndoEngine;
pub use undo::{InsertRun, SnapshotKind, UNDO_HISTORY_MAX};

/// Persistent (yet optionally empty) selection model covering all three
/// Visual sub-modes (§4.C).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionKind {
    Characterwise,
    Linewise,
    Blockwise,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionSpan {
    pub start: Position,
    pub end: Position,
    pub kind: SelectionKind,
}

impl SelectionSpan {
    /// Construct a new span, normalizing ordering so `start <= end`.
    pub fn new(mut a: Position, mut b: Position, kind: SelectionKind) -> Self {
        if Self::greater(&a, &b) {
            std::mem::swap(&mut a, &mut b);
        }
        Self { start: a, end: b, kind }
    }

    /// Construct a span preserving the supplied ordering so a fixed anchor
    /// stays `start` even when the cursor has moved before it.
    pub fn anchored(anchor: Position, other: Position, kind: SelectionKind) -> Self {
        Self { start: anchor, end: other, kind }
    }

    fn greater(a: &Position, b: &Position) -> bool {
        a.line > b.line || (a.line == b.line && a.byte > b.byte)
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Absolute byte range `[start, end)` covering this span, expanded so a
    /// non-empty Characterwise selection includes the grapheme under its
    /// logical end (internal storage is half-open but Visual character
    /// selections are inclusive of both endpoints).
    pub fn inclusive_byte_range(&self, buffer: &Buffer) -> (usize, usize) {
        let mut a = buffer.absolute_index(&self.start);
        let mut b = buffer.absolute_index(&self.end);
        if a > b {
            std::mem::swap(&mut a, &mut b);
        }
        if a == b {
            return (a, b);
        }
        match self.kind {
            SelectionKind::Characterwise => {
                if let Some(line) = buffer.line(self.end.line) {
                    let trimmed = line.strip_suffix('\n').unwrap_or(&line);
                    let clamped = self.end.byte.min(trimmed.len());
                    let next = core_text::grapheme::next_boundary(trimmed, clamped);
                    let line_start_abs = buffer.absolute_index(&Position { line: self.end.line, byte: 0 });
                    let expanded = line_start_abs + next;
                    if expanded > b {
                        b = expanded;
                    }
                }
                (a, b)
            }
            SelectionKind::Linewise | SelectionKind::Blockwise => (a, b),
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct SelectionModel {
    pub active: Option<SelectionSpan>,
    pub anchor: Option<Position>,
}

impl SelectionModel {
    pub fn clear(&mut self) {
        self.active = None;
        self.anchor = None;
    }
    pub fn set(&mut self, span: SelectionSpan) {
        self.active = Some(span);
    }
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }
}

/// The eight modes of §4.C's mode finite-state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Normal,
    Insert,
    Visual,
    VisualLine,
    VisualBlock,
    CommandLine,
    OperatorPending,
    Replace,
    ReplaceSingle,
}

impl Mode {
    pub fn is_visual(self) -> bool {
        matches!(self, Mode::Visual | Mode::VisualLine | Mode::VisualBlock)
    }
}

/// Line ending style detected from the source file, preserved so writing
/// back doesn't silently convert a CRLF file to LF.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEnding {
    Lf,
    Cr,
    Crlf,
}

impl LineEnding {
    pub fn as_str(self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::Cr => "\r",
            LineEnding::Crlf => "\r\n",
        }
    }
}

pub struct NormalizedText {
    pub normalized: String,
    pub original: LineEnding,
    pub had_trailing_newline: bool,
    pub mixed: bool,
}

/// Detects and normalizes line endings of `input` to LF-only internal
/// representation. Picks the majority style (ties: CRLF > LF > CR).
pub fn normalize_line_endings(input: &str) -> NormalizedText {
    let bytes = input.as_bytes();
    let mut i = 0usize;
    let (mut crlf, mut lf, mut cr) = (0usize, 0usize, 0usize);
    while i < bytes.len() {
        match bytes[i] {
            b'\r' => {
                if i + 1 < bytes.len() && bytes[i + 1] == b'\n' {
                    crlf += 1;
                    i += 2;
                } else {
                    cr += 1;
                    i += 1;
                }
            }
            b'\n' => {
                lf += 1;
                i += 1;
            }
            _ => i += 1,
        }
    }
    let had_trailing_newline = !input.is_empty()
        && (input.ends_with("\r\n") || input.ends_with('\n') || input.ends_with('\r'));
    let mut original = LineEnding::Lf;
    let mut max = 0usize;
    for (style, count) in [(LineEnding::Crlf, crlf), (LineEnding::Lf, lf), (LineEnding::Cr, cr)] {
        if count > max {
            max = count;
            original = style;
        }
    }
    let non_zero = [crlf, lf, cr].iter().filter(|c| **c > 0).count();
    let mixed = non_zero > 1 && [crlf, lf, cr].iter().any(|c| *c > 0 && *c != max);
    if crlf == 0 && cr == 0 {
        return NormalizedText { normalized: input.to_string(), original, had_trailing_newline, mixed };
    }
    let mut out = String::with_capacity(input.len());
    let mut seg_start = 0usize;
    let mut j = 0usize;
    while j < bytes.len() {
        if bytes[j] == b'\r' {
            if seg_start < j {
                out.push_str(&input[seg_start..j]);
            }
            out.push('\n');
            j += if j + 1 < bytes.len() && bytes[j + 1] == b'\n' { 2 } else { 1 };
            seg_start = j;
        } else {
            j += 1;
        }
    }
    if seg_start < input.len() {
        out.push_str(&input[seg_start..]);
    }
    NormalizedText { normalized: out, original, had_trailing_newline, mixed }
}

/// Raw `:`-command-line editing buffer (insertion point always the end).
#[derive(Debug, Default, Clone)]
pub struct CommandLineState {
    buf: String,
}

impl CommandLineState {
    pub fn is_active(&self) -> bool {
        self.buf.starts_with(':') || self.buf.starts_with('/') || self.buf.starts_with('?')
    }
    pub fn buffer(&self) -> &str {
        &self.buf
    }
    pub fn clear(&mut self) {
        self.buf.clear();
    }
    pub fn begin(&mut self, prefix: char) {
        self.buf.clear();
        self.buf.push(prefix);
    }
    pub fn push_char(&mut self, ch: char) {
        self.buf.push(ch);
    }
    pub fn backspace(&mut self) {
        if self.buf.len() > 1 {
            self.buf.pop();
        } else {
            self.buf.clear();
        }
    }
    /// Command text with the leading sentinel stripped.
    pub fn command_text(&self) -> &str {
        self.buf.get(1..).unwrap_or("")
    }
}

#[derive(Debug, Clone)]
pub struct EphemeralMessage {
    pub text: String,
    pub expires_at: std::time::Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasteError {
    Empty,
}

const JUMP_LIST_MAX: usize = 100;

/// Top-level editor state for a single buffer: text, mode, undo history,
/// registers, marks/jumps and the search session.
pub struct EditorState {
    pub buffers: Vec<Buffer>,
    pub active: usize,
    pub last_text_height: usize,
    pub mode: Mode,
    pub file_name: Option<std::path::PathBuf>,
    pub dirty: bool,
    /// Set when the buffer was loaded read-only (or marked so after the
    /// fact); `:w` refuses without `!` (§7 "Read-only").
    pub read_only: bool,
    undo: UndoEngine,
    pub command_line: CommandLineState,
    pub ephemeral_status: Option<EphemeralMessage>,
    pub original_line_ending: LineEnding,
    pub had_trailing_newline: bool,
    pub config_vertical_margin: usize,
    pub registers: Registers,
    pub selection: SelectionModel,
    pub search: core_search::SearchState,
    /// The anonymous mark (`` ` ` `` / `'` with no name): set automatically
    /// before jumps and big motions.
    pub mark: Option<Position>,
    pub named_marks: HashMap<char, Position>,
    jump_list: Vec<Position>,
    jump_index: usize,
    /// Last `f`/`F`/`t`/`T` invocation, so `;`/`,` can repeat it.
    pub last_find: Option<(core_text::motion::FindCharKind, char)>,
    pub macro_state: MacroState,
}

impl EditorState {
    pub fn new(buffer: Buffer) -> Self {
        Self {
            buffers: vec![buffer],
            active: 0,
            last_text_height: 0,
            mode: Mode::Normal,
            file_name: None,
            dirty: false,
            read_only: false,
            undo: UndoEngine::new(),
            command_line: CommandLineState::default(),
            ephemeral_status: None,
            original_line_ending: LineEnding::Lf,
            had_trailing_newline: false,
            config_vertical_margin: 0,
            registers: Registers::new(),
            selection: SelectionModel::default(),
            search: core_search::SearchState::new(),
            mark: None,
            named_marks: HashMap::new(),
            jump_list: Vec::new(),
            jump_index: 0,
            last_find: None,
            macro_state: MacroState::new(),
        }
    }

    pub fn set_ephemeral<S: Into<String>>(&mut self, msg: S, ttl: std::time::Duration) {
        self.ephemeral_status = Some(EphemeralMessage { text: msg.into(), expires_at: std::time::Instant::now() + ttl });
    }

    pub fn tick_ephemeral(&mut self) -> bool {
        if let Some(m) = &self.ephemeral_status
            && std::time::Instant::now() >= m.expires_at
        {
            self.ephemeral_status = None;
            return true;
        }
        false
    }

    pub fn set_last_text_height(&mut self, h: usize) {
        self.last_text_height = h;
    }

    pub fn active_buffer(&self) -> &Buffer {
        &self.buffers[self.active]
    }

    pub fn active_buffer_mut(&mut self) -> &mut Buffer {
        &mut self.buffers[self.active]
    }

    pub fn push_snapshot(&mut self, kind: SnapshotKind, cursor: Position) {
        let mode = self.mode;
        let buf_clone = self.active_buffer().clone();
        self.undo.push_snapshot(kind, cursor, &buf_clone, mode);
        self.buffers[self.active] = buf_clone;
    }

    /// Opens (or re-enters) the compound-change guard shared by Insert-mode
    /// coalescing and multi-step operators like `cw` (§4.G).
    pub fn begin_compound_change(&mut self, cursor: Position) {
        let mode = self.mode;
        let buf_clone = self.active_buffer().clone();
        self.undo.begin_compound_change(cursor, &buf_clone, mode);
        self.buffers[self.active] = buf_clone;
    }

    pub fn end_compound_change(&mut self) {
        self.undo.end_compound_change();
    }

    pub fn begin_insert_coalescing(&mut self, cursor: Position) {
        self.begin_compound_change(cursor);
    }

    pub fn end_insert_coalescing(&mut self) {
        self.end_compound_change();
    }

    pub fn push_discrete_edit_snapshot(&mut self, cursor: Position) {
        self.push_snapshot(SnapshotKind::Edit, cursor);
    }

    /// Delete a byte span `[start,end)` with an undo snapshot, returning the
    /// removed text. The cursor is set to the start of the removed region.
    pub fn delete_span_with_snapshot(&mut self, cursor: &mut Position, start: usize, end: usize) -> String {
        self.push_discrete_edit_snapshot(*cursor);
        let mut working = self.active_buffer().clone();
        let removed = working.delete_bytes(start, end);
        self.buffers[self.active] = working;
        *cursor = self.active_buffer().position_at(start);
        removed
    }

    pub fn note_insert_edit(&mut self) {
        self.undo.note_insert_edit();
    }

    pub fn undo(&mut self, cursor: &mut Position) -> bool {
        let buffer = &mut self.buffers[self.active];
        self.undo.undo(cursor, buffer, &mut self.mode)
    }

    pub fn redo(&mut self, cursor: &mut Position) -> bool {
        let buffer = &mut self.buffers[self.active];
        self.undo.redo(cursor, buffer, &mut self.mode)
    }

    pub fn undo_snapshots_skipped(&self) -> u64 {
        self.undo.snapshots_skipped()
    }
    pub fn undo_depth(&self) -> usize {
        self.undo.undo_depth()
    }
    pub fn redo_depth(&self) -> usize {
        self.undo.redo_depth()
    }
    pub fn insert_run(&self) -> &InsertRun {
        self.undo.insert_run()
    }

    pub fn registers_mut(&mut self) -> &mut Registers {
        &mut self.registers
    }

    pub fn selection(&self) -> Option<SelectionSpan> {
        self.selection.active
    }
    pub fn selection_mut(&mut self) -> &mut SelectionModel {
        &mut self.selection
    }
    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    // --- Marks & jumps (§4.C, open question on invalidation: marks are
    // never proactively cleared or shifted by line deletion; `resolve_mark`
    // clamps at jump time instead.) ---

    pub fn set_named_mark(&mut self, name: char, pos: Position) {
        self.named_marks.insert(name.to_ascii_lowercase(), pos);
    }

    /// Resolve a named mark, clamping it to the buffer's current extent.
    pub fn resolve_mark(&self, name: char) -> Option<Position> {
        let raw = if name == '`' || name == '\'' {
            self.mark
        } else {
            self.named_marks.get(&name.to_ascii_lowercase()).copied()
        }?;
        Some(self.clamp_position(raw))
    }

    fn clamp_position(&self, mut pos: Position) -> Position {
        let buffer = self.active_buffer();
        let last_line = buffer.line_count().saturating_sub(1);
        if pos.line > last_line {
            pos.line = last_line;
        }
        let len = buffer.line_byte_len(pos.line);
        if pos.byte > len {
            pos.byte = len;
        }
        pos
    }

    /// Record the given position as a jump-list entry (call before any
    /// motion that Vim treats as a "jump": `G`, `/`, `` ` ``, `'`, ...).
    /// Consecutive duplicate entries are coalesced.
    pub fn push_jump(&mut self, pos: Position) {
        self.mark = Some(pos);
        if self.jump_list.last() == Some(&pos) {
            return;
        }
        self.jump_list.truncate(self.jump_index);
        self.jump_list.push(pos);
        if self.jump_list.len() > JUMP_LIST_MAX {
            self.jump_list.remove(0);
        }
        self.jump_index = self.jump_list.len();
    }

    pub fn jump_older(&mut self, current: Position) -> Option<Position> {
        if self.jump_index == 0 {
            return None;
        }
        if self.jump_index == self.jump_list.len() {
            self.jump_list.push(current);
        }
        self.jump_index -= 1;
        self.jump_list.get(self.jump_index).copied().map(|p| self.clamp_position(p))
    }

    pub fn jump_newer(&mut self) -> Option<Position> {
        if self.jump_index + 1 >= self.jump_list.len() {
            return None;
        }
        self.jump_index += 1;
        self.jump_list.get(self.jump_index).copied().map(|p| self.clamp_position(p))
    }

    // --- Paste (§4.B "put"): inserts the content of a register at/after the
    // cursor, dispatching on the register's recorded kind. ---

    pub fn paste(&mut self, name: RegisterName, before: bool, cursor: &mut Position, count: usize) -> Result<bool, PasteError> {
        let value = self.registers.read(name).cloned().ok_or(PasteError::Empty)?;
        if value.text.is_empty() {
            return Err(PasteError::Empty);
        }
        self.push_discrete_edit_snapshot(*cursor);
        let structural = match value.kind {
            RegisterKind::Charwise => self.paste_charwise(&value.text, before, cursor, count),
            RegisterKind::Linewise => self.paste_linewise(&value.text, before, cursor, count),
            RegisterKind::Blockwise => self.paste_blockwise(&value.text, before, cursor),
        };
        self.dirty = true;
        Ok(structural)
    }

    fn paste_charwise(&mut self, text: &str, before: bool, cursor: &mut Position, count: usize) -> bool {
        let buffer = self.active_buffer_mut();
        let mut insert_pos = *cursor;
        if !before {
            insert_pos = advance_one_grapheme(buffer, insert_pos);
        }
        let payload = text.repeat(count.max(1));
        let mut idx = 0;
        let mut last_len = 0;
        while idx < payload.len() {
            let next = core_text::grapheme::next_boundary(&payload, idx);
            let g = &payload[idx..next];
            buffer.insert_grapheme(&mut insert_pos, g);
            last_len = g.len();
            idx = next;
        }
        if last_len > 0 {
            insert_pos.byte = insert_pos.byte.saturating_sub(last_len);
        }
        *cursor = insert_pos;
        payload.contains('\n')
    }

    /// Linewise put always lands on its own new line(s), below (`p`) or
    /// above (`P`) the cursor's line; pasting at the very end of the buffer
    /// appends a new final line rather than erroring (open question #4).
    fn paste_linewise(&mut self, text: &str, before: bool, cursor: &mut Position, count: usize) -> bool {
        let buffer = self.active_buffer_mut();
        let target_line = if before { cursor.line } else { cursor.line + 1 };
        let insert_line = target_line.min(buffer.line_count());
        let mut pos = Position { line: insert_line, byte: 0 };
        if insert_line == buffer.line_count() {
            // Appending past the last line: insert a newline to open a fresh
            // line, then the payload, without a trailing duplicate newline.
            let last = Position { line: buffer.line_count() - 1, byte: buffer.line_byte_len(buffer.line_count() - 1) };
            let mut at = last;
            buffer.insert_newline(&mut at);
            pos = at;
        }
        let payload = text.repeat(count.max(1));
        for line in payload.lines() {
            buffer.insert_text(&mut pos, line);
            buffer.insert_newline(&mut pos);
        }
        *cursor = Position { line: insert_line, byte: 0 };
        true
    }

    /// Best-effort rectangular put: each source line is inserted at the same
    /// column on successive destination lines, right-padding short
    /// destination lines with spaces first (open question #2).
    fn paste_blockwise(&mut self, text: &str, before: bool, cursor: &mut Position) -> bool {
        let buffer = self.active_buffer_mut();
        let col = if before { cursor.byte } else { advance_one_grapheme(buffer, *cursor).byte };
        for (i, line) in text.lines().enumerate() {
            let target_line = cursor.line + i;
            if target_line >= buffer.line_count() {
                let mut at = Position { line: buffer.line_count() - 1, byte: buffer.line_byte_len(buffer.line_count() - 1) };
                buffer.insert_newline(&mut at);
            }
            let len = buffer.line_byte_len(target_line);
            let mut pos = Position { line: target_line, byte: len.min(col) };
            if len < col {
                let pad = " ".repeat(col - len);
                buffer.insert_text(&mut pos, &pad);
            }
            buffer.insert_text(&mut pos, line);
        }
        *cursor = Position { line: cursor.line, byte: col };
        false
    }
}

fn advance_one_grapheme(buffer: &Buffer, mut pos: Position) -> Position {
    let line_len = buffer.line_byte_len(pos.line);
    if pos.byte < line_len
        && let Some(line_owned) = buffer.line(pos.line)
    {
        let trimmed = line_owned.strip_suffix('\n').unwrap_or(&line_owned);
        let next = core_text::grapheme::next_boundary(trimmed, pos.byte);
        pos.byte = next.min(trimmed.len());
    }
    pos
}
