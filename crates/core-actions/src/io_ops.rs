//! File IO helpers extracted from dispatcher (Refactor R2 Step 5).
//!
//! Breadth-first: synchronous, minimal, no async abstractions yet. These helpers isolate
//! normalization + reconstruction logic so the dispatcher focuses on command semantics.
//! Future (Phase 3+) replacements can provide async versions with identical signatures.

use core_state::{EditorState, LineEnding, normalize_line_endings};
use core_text::Buffer;

/// Result of attempting to open a file.
#[derive(Debug)]
pub enum OpenFileResult {
    Success(OpenSuccess),
    Error, // caller logs / sets ephemeral already
}

pub struct OpenSuccess {
    pub buffer: Buffer,
    pub file_name: std::path::PathBuf,
    pub original_line_ending: LineEnding,
    pub had_trailing_newline: bool,
    pub mixed_line_endings: bool,
}

impl std::fmt::Debug for OpenSuccess {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenSuccess")
            .field("file_name", &self.file_name)
            .field("original_line_ending", &self.original_line_ending)
            .field("had_trailing_newline", &self.had_trailing_newline)
            .field("mixed_line_endings", &self.mixed_line_endings)
            .finish()
    }
}

/// Open a file path into a new Buffer applying line ending normalization.
/// Returns structured metadata required to update EditorState.
pub fn open_file(path: &std::path::Path) -> OpenFileResult {
    match std::fs::read_to_string(path) {
        Ok(content) => {
            let norm = normalize_line_endings(&content);
            let name = path.file_name().and_then(|s| s.to_str()).unwrap_or("file");
            match Buffer::from_str(name, &norm.normalized) {
                Ok(buffer) => OpenFileResult::Success(OpenSuccess {
                    buffer,
                    file_name: path.to_path_buf(),
                    original_line_ending: norm.original,
                    had_trailing_newline: norm.had_trailing_newline,
                    mixed_line_endings: norm.mixed,
                }),
                Err(e) => {
                    tracing::error!(target: "io", ?e, "buffer_create_failed");
                    OpenFileResult::Error
                }
            }
        }
        Err(e) => {
            tracing::error!(target: "io", ?e, "file_open_error");
            OpenFileResult::Error
        }
    }
}

/// Result of a write attempt.
#[derive(Debug)]
pub enum WriteFileResult {
    Success,
    NoFilename,
    ReadOnly,
    Error,
}

/// Serialize the active buffer out to its associated file name (or provided
/// target), honoring original line ending style and trailing newline
/// presence. Writes atomically (temp file in the same directory + rename)
/// and, when `create_backup` is set, leaves a `.bak` copy of whatever was
/// at `path` before the write (§6 file-I/O interface).
pub fn write_file(state: &mut EditorState, target: Option<&std::path::Path>) -> WriteFileResult {
    write_file_with_backup(state, target, true)
}

pub fn write_file_with_backup(
    state: &mut EditorState,
    target: Option<&std::path::Path>,
    create_backup: bool,
) -> WriteFileResult {
    if state.read_only && target.is_none() {
        return WriteFileResult::ReadOnly;
    }
    let path = if let Some(p) = target {
        p.to_path_buf()
    } else if let Some(existing) = state.file_name.clone() {
        existing
    } else {
        return WriteFileResult::NoFilename;
    };
    // Re-expand line endings based on original metadata
    let mut content = String::new();
    let line_ending = state.original_line_ending.as_str();
    let last_index = state.active_buffer().line_count();
    for i in 0..last_index {
        if let Some(mut l) = state.active_buffer().line(i) {
            let ends_nl = l.ends_with('\n');
            if ends_nl {
                l.pop();
            }
            content.push_str(&l);
            if (i + 1 < last_index) || (state.had_trailing_newline && i + 1 == last_index) {
                content.push_str(line_ending);
            }
        }
    }
    if create_backup && path.exists() {
        let mut backup_name = path.as_os_str().to_os_string();
        backup_name.push(".bak");
        if let Err(e) = std::fs::copy(&path, std::path::PathBuf::from(backup_name)) {
            tracing::warn!(target: "io", ?e, "backup_write_failed");
        }
    }
    match atomic_write(&path, content.as_bytes()) {
        Ok(()) => {
            state.dirty = false; // mark clean after successful write
            WriteFileResult::Success
        }
        Err(e) => {
            tracing::error!(target: "io", ?e, "file_write_error");
            WriteFileResult::Error
        }
    }
}

/// Writes `data` to `path` via a temp file in the same directory followed by
/// a rename, so a crash mid-write never leaves `path` truncated or
/// half-written. Preserves the original file's permissions when it exists.
fn atomic_write(path: &std::path::Path, data: &[u8]) -> std::io::Result<()> {
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or_else(|| std::path::Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    use std::io::Write;
    tmp.write_all(data)?;
    tmp.flush()?;
    #[cfg(unix)]
    if let Ok(meta) = std::fs::metadata(path) {
        use std::os::unix::fs::PermissionsExt;
        let _ = std::fs::set_permissions(tmp.path(), std::fs::Permissions::from_mode(meta.permissions().mode()));
    }
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_text::Buffer;

    #[test]
    fn open_file_normalizes_and_sets_metadata() {
        use std::io::Write;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.txt");
        {
            let mut f = std::fs::File::create(&path).unwrap();
            // Mixed line endings CRLF + LF + final CRLF
            write!(f, "line1\r\nline2\nline3\r\n").unwrap();
        }
        match open_file(&path) {
            OpenFileResult::Success(s) => {
                assert!(s.buffer.line(0).unwrap().starts_with("line1"));
                assert!(s.mixed_line_endings, "should detect mixed endings");
                assert!(s.had_trailing_newline, "should detect trailing newline");
            }
            _ => panic!("expected success"),
        }
    }

    #[test]
    fn write_file_preserves_original_style() {
        // Build state manually after open to focus on write serialization
        let buffer = Buffer::from_str("t", "a\nb\n").unwrap();
        let mut state = EditorState::new(buffer);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        state.file_name = Some(path.clone());
        state.original_line_ending = LineEnding::Crlf;
        state.had_trailing_newline = true;
        state.dirty = true;
        let res = write_file(&mut state, None);
        assert!(matches!(res, WriteFileResult::Success));
        assert!(!state.dirty, "dirty cleared after write");
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("a\r\nb\r\n"));
    }

    #[test]
    fn write_file_no_filename() {
        let buffer = Buffer::from_str("t", "x").unwrap();
        let mut state = EditorState::new(buffer);
        state.dirty = true;
        let res = write_file(&mut state, None);
        assert!(matches!(res, WriteFileResult::NoFilename));
        assert!(state.dirty, "dirty unchanged when no filename");
    }

    #[test]
    fn write_file_leaves_bak_copy_of_prior_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("existing.txt");
        std::fs::write(&path, "old\n").unwrap();
        let buffer = Buffer::from_str("t", "new\n").unwrap();
        let mut state = EditorState::new(buffer);
        state.file_name = Some(path.clone());
        state.dirty = true;
        write_file(&mut state, None);
        let backup = std::fs::read_to_string(format!("{}.bak", path.display())).unwrap();
        assert_eq!(backup, "old\n");
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "new\n");
    }

    #[test]
    fn write_file_refuses_on_read_only_buffer() {
        let buffer = Buffer::from_str("t", "x\n").unwrap();
        let mut state = EditorState::new(buffer);
        let dir = tempfile::tempdir().unwrap();
        state.file_name = Some(dir.path().join("ro.txt"));
        state.dirty = true;
        state.read_only = true;
        let res = write_file(&mut state, None);
        assert!(matches!(res, WriteFileResult::ReadOnly));
        assert!(state.dirty);
    }
}
