//! Key-input token vocabulary consumed by the dispatcher.
//!
//! The core never decodes raw byte streams (spec §6): an external terminal
//! driver is responsible for turning bytes into the tokens defined here.
//! This crate is intentionally tiny — it is the one boundary type shared
//! between the engine and whatever front-end embeds it.

use bitflags::bitflags;

bitflags! {
    /// Control combination modifiers. `Ctrl`/`Alt` combine with a base key;
    /// `Shift` is folded into the produced code point for printable keys by
    /// the terminal driver and is only meaningful here alongside a named
    /// key (e.g. Shift-Tab).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct KeyModifiers: u8 {
        const NONE  = 0b000;
        const CTRL  = 0b001;
        const ALT   = 0b010;
        const SHIFT = 0b100;
    }
}

/// One abstract keystroke as the dispatcher consumes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Char(char),
    Esc,
    Enter,
    Tab,
    Backspace,
    Delete,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    Insert,
    F(u8), // F1..F12
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    pub code: KeyCode,
    pub mods: KeyModifiers,
}

impl KeyEvent {
    pub fn char(c: char) -> Self {
        Self {
            code: KeyCode::Char(c),
            mods: KeyModifiers::NONE,
        }
    }

    pub fn special(code: KeyCode) -> Self {
        Self {
            code,
            mods: KeyModifiers::NONE,
        }
    }

    pub fn ctrl(c: char) -> Self {
        Self {
            code: KeyCode::Char(c),
            mods: KeyModifiers::CTRL,
        }
    }

    pub fn with_modifiers(mut self, mods: KeyModifiers) -> Self {
        self.mods = mods;
        self
    }

    /// A best-effort printable rendering used by macro recording to flatten
    /// a key back into the literal text stored in a register, and by
    /// `showcmd` to echo pending input.
    pub fn as_display(&self) -> String {
        match (self.code, self.mods) {
            (KeyCode::Char(c), m) if m.contains(KeyModifiers::CTRL) => format!("<C-{c}>"),
            (KeyCode::Char(c), _) => c.to_string(),
            (KeyCode::Esc, _) => "<Esc>".to_string(),
            (KeyCode::Enter, _) => "\n".to_string(),
            (KeyCode::Tab, _) => "\t".to_string(),
            (KeyCode::Backspace, _) => "<BS>".to_string(),
            (KeyCode::Delete, _) => "<Del>".to_string(),
            (other, _) => format!("<{other:?}>"),
        }
    }
}

/// Inverse of [`KeyEvent::as_display`]: turn recorded macro text back into
/// the key sequence that produced it, recognizing the bracketed tokens
/// `as_display` emits (`<Esc>`, `<BS>`, `<Del>`, `<C-x>`) alongside literal
/// characters, `"\n"` (Enter), and `"\t"` (Tab). An unrecognized `<...>`
/// token is passed through as its literal characters rather than dropped,
/// so a malformed or hand-edited register still replays something.
pub fn parse_macro_keys(text: &str) -> Vec<KeyEvent> {
    let chars: Vec<char> = text.chars().collect();
    let mut out = Vec::with_capacity(chars.len());
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c == '<' {
            if let Some(end) = chars[i..].iter().position(|&c| c == '>') {
                let token: String = chars[i + 1..i + end].iter().collect();
                let end_idx = i + end;
                match token.as_str() {
                    "Esc" => {
                        out.push(KeyEvent::special(KeyCode::Esc));
                        i = end_idx + 1;
                        continue;
                    }
                    "BS" => {
                        out.push(KeyEvent::special(KeyCode::Backspace));
                        i = end_idx + 1;
                        continue;
                    }
                    "Del" => {
                        out.push(KeyEvent::special(KeyCode::Delete));
                        i = end_idx + 1;
                        continue;
                    }
                    _ if token.len() == 3 && token.starts_with("C-") => {
                        out.push(KeyEvent::ctrl(token.chars().nth(2).unwrap()));
                        i = end_idx + 1;
                        continue;
                    }
                    _ => {}
                }
            }
        }
        out.push(match c {
            '\n' => KeyEvent::special(KeyCode::Enter),
            '\t' => KeyEvent::special(KeyCode::Tab),
            other => KeyEvent::char(other),
        });
        i += 1;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ctrl_display_wraps_char() {
        let k = KeyEvent::ctrl('r');
        assert_eq!(k.as_display(), "<C-r>");
    }

    #[test]
    fn plain_char_displays_itself() {
        let k = KeyEvent::char('x');
        assert_eq!(k.as_display(), "x");
    }

    #[test]
    fn modifiers_are_a_bitset() {
        let m = KeyModifiers::CTRL | KeyModifiers::SHIFT;
        assert!(m.contains(KeyModifiers::CTRL));
        assert!(m.contains(KeyModifiers::SHIFT));
        assert!(!m.contains(KeyModifiers::ALT));
    }

    #[test]
    fn special_key_display() {
        let k = KeyEvent::special(KeyCode::Esc);
        assert_eq!(k.as_display(), "<Esc>");
    }

    #[test]
    fn parse_macro_keys_round_trips_mixed_tokens() {
        let keys = parse_macro_keys("ihello<Esc>");
        assert_eq!(keys.len(), "ihello".len() + 1);
        assert_eq!(keys[0], KeyEvent::char('i'));
        assert_eq!(*keys.last().unwrap(), KeyEvent::special(KeyCode::Esc));
    }

    #[test]
    fn parse_macro_keys_recognizes_ctrl_and_backspace() {
        let keys = parse_macro_keys("<C-r><BS>");
        assert_eq!(keys, vec![KeyEvent::ctrl('r'), KeyEvent::special(KeyCode::Backspace)]);
    }

    #[test]
    fn parse_macro_keys_passes_through_unknown_token_literally() {
        let keys = parse_macro_keys("<Foo>");
        assert_eq!(
            keys,
            vec![
                KeyEvent::char('<'),
                KeyEvent::char('F'),
                KeyEvent::char('o'),
                KeyEvent::char('o'),
                KeyEvent::char('>'),
            ]
        );
    }
}
