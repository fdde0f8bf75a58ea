//! Register bank (§4.B).
//!
//! A write always goes to one "target" register (unnamed unless the user
//! named one explicitly) but several writes also fan out to secondary slots
//! per vi's classic rules: every yank or delete updates the unnamed
//! register, and an un-named delete/change additionally rotates the
//! numbered ring. The black-hole register absorbs writes and never reports
//! content. Special registers are read-only from the editing surface and
//! are instead latched by the owning subsystem (search, ex, insert, file).

use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterKind {
    Charwise,
    Linewise,
    Blockwise,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterValue {
    pub text: String,
    pub kind: RegisterKind,
}

impl RegisterValue {
    pub fn new(text: impl Into<String>, kind: RegisterKind) -> Self {
        Self { text: text.into(), kind }
    }
}

/// Where a write/read is explicitly targeted; `None` means "the unnamed
/// register, or whatever default the calling operator uses".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterName {
    Unnamed,
    Numbered(u8), // 0-9
    Named(char),  // a-z; uppercase requests append
    BlackHole,
    LastSearch,
    LastExCommand,
    LastInserted,
    FileName,
    ClipboardStar,
    ClipboardPlus,
}

impl RegisterName {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '"' => Some(Self::Unnamed),
            '_' => Some(Self::BlackHole),
            '/' => Some(Self::LastSearch),
            ':' => Some(Self::LastExCommand),
            '.' => Some(Self::LastInserted),
            '%' => Some(Self::FileName),
            '*' => Some(Self::ClipboardStar),
            '+' => Some(Self::ClipboardPlus),
            '0'..='9' => Some(Self::Numbered(c as u8 - b'0')),
            'a'..='z' | 'A'..='Z' => Some(Self::Named(c)),
            _ => None,
        }
    }

    fn is_special_readonly(self) -> bool {
        matches!(
            self,
            Self::LastSearch | Self::LastExCommand | Self::LastInserted | Self::FileName
        )
    }
}

#[derive(Debug, Default, Clone)]
pub struct Registers {
    unnamed_value: Option<RegisterValue>,
    /// Plain-text mirror of `unnamed_value`, kept in sync on every write.
    /// Lets callers check "was anything just yanked/deleted" without
    /// matching on `RegisterValue`/`RegisterKind`.
    pub unnamed: String,
    numbered: [Option<RegisterValue>; 10], // index = register digit
    named: HashMap<char, RegisterValue>,   // keys always lowercase a-z
    last_search: Option<RegisterValue>,
    last_ex_command: Option<RegisterValue>,
    last_inserted: Option<RegisterValue>,
    file_name: Option<RegisterValue>,
    clipboard_star: Option<RegisterValue>,
    clipboard_plus: Option<RegisterValue>,
    writes: u64,
    rotations: u64,
}

impl Registers {
    pub fn new() -> Self {
        Self::default()
    }

    fn set_unnamed(&mut self, value: RegisterValue) {
        self.unnamed = value.text.clone();
        self.unnamed_value = Some(value);
    }

    pub fn read(&self, name: RegisterName) -> Option<&RegisterValue> {
        match name {
            RegisterName::Unnamed => self.unnamed_value.as_ref(),
            RegisterName::Numbered(n) => self.numbered.get(n as usize).and_then(|v| v.as_ref()),
            RegisterName::Named(c) => self.named.get(&c.to_ascii_lowercase()),
            RegisterName::BlackHole => None,
            RegisterName::LastSearch => self.last_search.as_ref(),
            RegisterName::LastExCommand => self.last_ex_command.as_ref(),
            RegisterName::LastInserted => self.last_inserted.as_ref(),
            RegisterName::FileName => self.file_name.as_ref(),
            RegisterName::ClipboardStar => self.clipboard_star.as_ref(),
            RegisterName::ClipboardPlus => self.clipboard_plus.as_ref(),
        }
    }

    /// Record a yank. Target `None` writes unnamed + numbered register `0`;
    /// an explicit named/numbered target additionally mirrors to unnamed.
    pub fn record_yank(&mut self, value: RegisterValue, target: Option<RegisterName>) {
        self.writes += 1;
        match target {
            None | Some(RegisterName::Unnamed) => {
                self.numbered[0] = Some(value.clone());
                self.set_unnamed(value);
            }
            Some(RegisterName::BlackHole) => {}
            Some(RegisterName::Named(c)) => {
                self.write_named(c, value.clone());
                self.set_unnamed(value);
            }
            Some(other) => self.write_direct(other, value),
        }
    }

    /// Record a delete/change. An un-named single-character-grapheme delete
    /// only touches unnamed (vim's small-delete exception does not apply
    /// here since we don't track "spans a line"; callers pass
    /// `shifts_numbered = false` for that case).
    pub fn record_delete(&mut self, value: RegisterValue, target: Option<RegisterName>, shifts_numbered: bool) {
        self.writes += 1;
        match target {
            None | Some(RegisterName::Unnamed) => {
                if shifts_numbered {
                    self.shift_numbered_and_write_one(value.clone());
                }
                self.set_unnamed(value);
            }
            Some(RegisterName::BlackHole) => {}
            Some(RegisterName::Named(c)) => {
                self.write_named(c, value.clone());
                self.set_unnamed(value);
            }
            Some(other) => self.write_direct(other, value),
        }
    }

    fn shift_numbered_and_write_one(&mut self, value: RegisterValue) {
        self.rotations += 1;
        for i in (2..=9).rev() {
            self.numbered[i] = self.numbered[i - 1].take();
        }
        self.numbered[1] = Some(value);
    }

    fn write_named(&mut self, c: char, value: RegisterValue) {
        let lower = c.to_ascii_lowercase();
        if c.is_ascii_uppercase() {
            match self.named.get_mut(&lower) {
                Some(existing) if existing.kind == value.kind => {
                    existing.text.push_str(&value.text);
                }
                Some(existing) => {
                    // Kinds differ (e.g. appending a linewise yank onto a
                    // charwise one): still append, joined by a line
                    // separator, never overwrite.
                    if !existing.text.ends_with('\n') {
                        existing.text.push('\n');
                    }
                    existing.text.push_str(&value.text);
                    existing.kind = RegisterKind::Linewise;
                }
                None => {
                    self.named.insert(lower, value);
                }
            }
        } else {
            self.named.insert(lower, value);
        }
    }

    fn write_direct(&mut self, name: RegisterName, value: RegisterValue) {
        match name {
            RegisterName::Numbered(n) => {
                if let Some(slot) = self.numbered.get_mut(n as usize) {
                    *slot = Some(value);
                }
            }
            RegisterName::LastSearch => self.last_search = Some(value),
            RegisterName::LastExCommand => self.last_ex_command = Some(value),
            RegisterName::LastInserted => self.last_inserted = Some(value),
            RegisterName::FileName => self.file_name = Some(value),
            RegisterName::ClipboardStar => self.clipboard_star = Some(value),
            RegisterName::ClipboardPlus => self.clipboard_plus = Some(value),
            RegisterName::Unnamed | RegisterName::Named(_) | RegisterName::BlackHole => unreachable!(),
        }
    }

    /// Latch a special register from internal subsystems. Fails (no-op) on
    /// anything not in the special set so callers can't accidentally
    /// clobber unnamed/numbered/named through this path.
    pub fn latch_special(&mut self, name: RegisterName, value: RegisterValue) {
        if name.is_special_readonly() {
            self.write_direct(name, value);
        }
    }

    /// Total register writes (yank or delete) recorded so far.
    pub fn writes(&self) -> u64 {
        self.writes
    }

    /// Total numbered-ring rotations recorded so far.
    pub fn rotations(&self) -> u64 {
        self.rotations
    }

    pub fn named_snapshot(&self) -> Vec<(char, &RegisterValue)> {
        let mut v: Vec<_> = self.named.iter().map(|(c, r)| (*c, r)).collect();
        v.sort_by_key(|(c, _)| *c);
        v
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yank_mirrors_unnamed_and_zero() {
        let mut regs = Registers::new();
        regs.record_yank(RegisterValue::new("abc", RegisterKind::Charwise), None);
        assert_eq!(regs.read(RegisterName::Unnamed).unwrap().text, "abc");
        assert_eq!(regs.read(RegisterName::Numbered(0)).unwrap().text, "abc");
    }

    #[test]
    fn delete_shifts_numbered_ring() {
        let mut regs = Registers::new();
        regs.record_delete(RegisterValue::new("one", RegisterKind::Linewise), None, true);
        regs.record_delete(RegisterValue::new("two", RegisterKind::Linewise), None, true);
        assert_eq!(regs.read(RegisterName::Numbered(1)).unwrap().text, "two");
        assert_eq!(regs.read(RegisterName::Numbered(2)).unwrap().text, "one");
        assert_eq!(regs.read(RegisterName::Unnamed).unwrap().text, "two");
    }

    #[test]
    fn small_delete_does_not_shift_numbered() {
        let mut regs = Registers::new();
        regs.record_delete(RegisterValue::new("x", RegisterKind::Charwise), None, false);
        assert!(regs.read(RegisterName::Numbered(1)).is_none());
        assert_eq!(regs.read(RegisterName::Unnamed).unwrap().text, "x");
    }

    #[test]
    fn uppercase_named_appends() {
        let mut regs = Registers::new();
        regs.record_yank(RegisterValue::new("foo", RegisterKind::Charwise), Some(RegisterName::Named('a')));
        regs.record_yank(RegisterValue::new("bar", RegisterKind::Charwise), Some(RegisterName::Named('A')));
        assert_eq!(regs.read(RegisterName::Named('a')).unwrap().text, "foobar");
    }

    #[test]
    fn uppercase_named_append_joins_mismatched_kinds_with_separator() {
        let mut regs = Registers::new();
        regs.record_yank(RegisterValue::new("foo", RegisterKind::Charwise), Some(RegisterName::Named('a')));
        regs.record_yank(RegisterValue::new("bar\n", RegisterKind::Linewise), Some(RegisterName::Named('A')));
        assert_eq!(regs.read(RegisterName::Named('a')).unwrap().text, "foo\nbar\n");
    }

    #[test]
    fn black_hole_absorbs() {
        let mut regs = Registers::new();
        regs.record_delete(RegisterValue::new("gone", RegisterKind::Charwise), Some(RegisterName::BlackHole), true);
        assert!(regs.read(RegisterName::BlackHole).is_none());
        assert!(regs.read(RegisterName::Unnamed).is_none());
    }

    #[test]
    fn special_registers_are_latched_not_written_through_yank() {
        let mut regs = Registers::new();
        regs.latch_special(RegisterName::LastSearch, RegisterValue::new("pat", RegisterKind::Charwise));
        assert_eq!(regs.read(RegisterName::LastSearch).unwrap().text, "pat");
    }
}
