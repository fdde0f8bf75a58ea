//! Macro recording/playback state (`q{reg}` / `@{reg}`), grounded on the
//! original implementation's `commands/macros/{state,recorder,player}.py`:
//! raw keys are appended to the target register as they're typed, replay
//! re-feeds those keys through the same key-handling path one at a time,
//! and a depth counter guards against runaway recursive `@`/`.` macros.

/// Maximum nested `@` playback depth before a macro aborts (original
/// implementation's `MAX_PLAYBACK_DEPTH`).
pub const MAX_PLAYBACK_DEPTH: u32 = 100;

#[derive(Debug, Default)]
pub struct MacroState {
    pub is_recording: bool,
    pub recording_register: Option<char>,
    pub recorded_keys: String,
    pub is_playing: bool,
    pub last_played_register: Option<char>,
    pub playback_depth: u32,
    pub stop_on_error: bool,
    pub max_playback_depth: u32,
}

impl MacroState {
    pub fn new() -> Self {
        Self {
            stop_on_error: true,
            max_playback_depth: MAX_PLAYBACK_DEPTH,
            ..Default::default()
        }
    }

    /// Begin recording into `register` (always lowercased: vi treats `q{A-Z}`
    /// as append-to-existing, which the caller resolves via the register
    /// model rather than here).
    pub fn start_recording(&mut self, register: char) {
        self.is_recording = true;
        self.recording_register = Some(register);
        self.recorded_keys.clear();
    }

    /// Stop recording, returning the register to write the accumulated keys
    /// into and the keys themselves (the terminating `q` itself is never
    /// appended by the caller).
    pub fn stop_recording(&mut self) -> Option<(char, String)> {
        if !self.is_recording {
            return None;
        }
        self.is_recording = false;
        let reg = self.recording_register.take()?;
        Some((reg, std::mem::take(&mut self.recorded_keys)))
    }

    /// Record one raw key while a recording is active. Called before the key
    /// is interpreted, so the terminating `q` must be stripped by the caller
    /// once `stop_recording` is invoked.
    pub fn record_key(&mut self, key: char) {
        if self.is_recording {
            self.recorded_keys.push(key);
        }
    }

    /// Convenience for appending a multi-character token (e.g. a reconstructed
    /// `<Esc>`) one char at a time.
    pub fn record_keys(&mut self, keys: &str) {
        for c in keys.chars() {
            self.record_key(c);
        }
    }

    pub fn can_play(&self) -> bool {
        self.playback_depth < self.max_playback_depth
    }

    pub fn enter_playback(&mut self, register: char) {
        self.is_playing = true;
        self.last_played_register = Some(register);
        self.playback_depth += 1;
    }

    pub fn leave_playback(&mut self) {
        self.playback_depth = self.playback_depth.saturating_sub(1);
        if self.playback_depth == 0 {
            self.is_playing = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_accumulates_keys_until_stopped() {
        let mut m = MacroState::new();
        m.start_recording('a');
        for c in "ihello".chars() {
            m.record_key(c);
        }
        let (reg, keys) = m.stop_recording().unwrap();
        assert_eq!(reg, 'a');
        assert_eq!(keys, "ihello");
        assert!(!m.is_recording);
    }

    #[test]
    fn playback_depth_guards_runaway_recursion() {
        let mut m = MacroState::new();
        m.max_playback_depth = 2;
        m.enter_playback('a');
        assert!(m.can_play());
        m.enter_playback('a');
        assert!(!m.can_play());
        m.leave_playback();
        assert!(m.can_play());
    }
}
