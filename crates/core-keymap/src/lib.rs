//! Command registry: the keyed catalog of command definitions (§4.D).
//!
//! Commands are modeled as a tagged variant (`CommandId`) rather than
//! runtime-typed handler functions — dispatch downstream is exhaustive
//! pattern matching in `core-actions`, and the missing-case problem the
//! source's string-keyed dispatch had is a build error here instead.
//!
//! This crate owns two things: the vocabulary of command identities
//! (`MotionKind`/`OperatorKind`/`TextObjectKind`/`ActionKind`/
//! `ModeChangeTarget`) and a trie keyed by key-sequence bytes that answers
//! "is this pending key string a known command, a strict prefix of one, or
//! neither" for the current mode. It does not execute anything — handlers
//! live in `core-actions`, which owns the buffer/state the commands act on.

use bitflags::bitflags;
use std::collections::BTreeMap;

bitflags! {
    /// Which modes a `CommandDef` is valid in. Mirrors `core_state::Mode`
    /// without depending on it, keeping this crate a leaf.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ModeMask: u16 {
        const NORMAL            = 1 << 0;
        const INSERT            = 1 << 1;
        const VISUAL_CHAR       = 1 << 2;
        const VISUAL_LINE       = 1 << 3;
        const VISUAL_BLOCK      = 1 << 4;
        const OPERATOR_PENDING  = 1 << 5;
        const COMMAND_LINE      = 1 << 6;
        const REPLACE           = 1 << 7;
        const REPLACE_SINGLE    = 1 << 8;

        const ANY_VISUAL = Self::VISUAL_CHAR.bits() | Self::VISUAL_LINE.bits() | Self::VISUAL_BLOCK.bits();
        /// Motions are valid standalone in Normal/Visual and as operands in Operator-Pending.
        const MOTION_CONTEXT = Self::NORMAL.bits() | Self::ANY_VISUAL.bits() | Self::OPERATOR_PENDING.bits();
    }
}

/// A command producing a new cursor position; usable standalone or as the
/// operand of an operator (§4.F).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MotionKind {
    Left,
    Right,
    Up,
    Down,
    LineStart,
    FirstNonBlank,
    LineEnd,
    WordForward,
    WordBackward,
    WordEndForward,
    BigWordForward,
    BigWordBackward,
    BigWordEndForward,
    GotoLine,
    GotoFirstLine,
    ParagraphForward,
    ParagraphBackward,
    ViewportHigh,
    ViewportMiddle,
    ViewportLow,
    MatchingBracket,
    FindCharForward,
    FindCharBackward,
    TillCharForward,
    TillCharBackward,
    RepeatFindSame,
    RepeatFindOpposite,
}

impl MotionKind {
    /// Inclusive motions include both endpoints when forming an
    /// operator-motion range (§4.E "Range computation").
    pub fn is_inclusive(self) -> bool {
        matches!(
            self,
            MotionKind::FindCharForward
                | MotionKind::TillCharForward
                | MotionKind::WordEndForward
                | MotionKind::BigWordEndForward
                | MotionKind::MatchingBracket
                | MotionKind::RepeatFindSame
                | MotionKind::RepeatFindOpposite
        )
    }

    /// Line-wise motions operate on the whole lines between start and end row.
    pub fn is_linewise(self) -> bool {
        matches!(
            self,
            MotionKind::Up
                | MotionKind::Down
                | MotionKind::GotoLine
                | MotionKind::GotoFirstLine
                | MotionKind::ParagraphForward
                | MotionKind::ParagraphBackward
        )
    }
}

/// A command that acts on a range produced by a subsequent motion or text
/// object (§4.G).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorKind {
    Delete,
    Change,
    Yank,
    AutoIndent,
    ShiftRight,
    ShiftLeft,
    LowerCase,
    UpperCase,
    SwapCase,
}

/// A command that produces a range (not a position) describing a semantic
/// region around the cursor (§4.H).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextObjectKind {
    Word { around: bool },
    BigWord { around: bool },
    Sentence { around: bool },
    Paragraph { around: bool },
    Quote { delim: char, around: bool },
    Bracket { open: char, around: bool },
}

/// Everything that isn't a motion/operator/text-object/mode-change: direct
/// mutations and meta-commands (paste, undo, marks, search, macros, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    DeleteCharUnder,
    DeleteCharBefore,
    ReplaceChar,
    JoinLines { with_space: bool },
    PasteAfter,
    PasteBefore,
    Undo,
    Redo,
    RepeatLastChange,
    SetMark,
    JumpToMarkLine,
    JumpToMarkExact,
    JumpOlder,
    JumpNewer,
    SearchForward,
    SearchBackward,
    SearchNext,
    SearchPrev,
    SearchWordForward,
    SearchWordBackward,
    ToggleRecording,
    PlayMacro,
}

/// A mode transition, possibly entering `OPERATOR_PENDING` as a sub-state of
/// Normal pending an operand (§4.C).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModeChangeTarget {
    Normal,
    InsertBefore,
    InsertAfter,
    InsertLineStart,
    InsertLineEnd,
    OpenBelow,
    OpenAbove,
    ReplaceMode,
    ReplaceSingle,
    VisualChar,
    VisualLine,
    VisualBlock,
    CommandLine,
    SubstituteChar, // `s`: delete-under then Insert
    SubstituteLine, // `S`: like `cc`
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandId {
    Motion(MotionKind),
    Operator(OperatorKind),
    TextObject(TextObjectKind),
    Action(ActionKind),
    ModeChange(ModeChangeTarget),
}

#[derive(Debug, Clone, Copy)]
pub struct CommandDef {
    pub keys: &'static str,
    pub name: &'static str,
    pub id: CommandId,
    pub modes: ModeMask,
    pub takes_count: bool,
    pub takes_register: bool,
    pub sets_operator_pending: bool,
    pub repeatable: bool,
}

const fn def(keys: &'static str, name: &'static str, id: CommandId, modes: ModeMask) -> CommandDef {
    CommandDef {
        keys,
        name,
        id,
        modes,
        takes_count: true,
        takes_register: false,
        sets_operator_pending: false,
        repeatable: false,
    }
}

impl CommandDef {
    const fn register(mut self) -> Self {
        self.takes_register = true;
        self
    }
    const fn operator_pending(mut self) -> Self {
        self.sets_operator_pending = true;
        self
    }
    const fn no_count(mut self) -> Self {
        self.takes_count = false;
        self
    }
}

macro_rules! motion {
    ($keys:expr, $name:expr, $kind:expr) => {
        def($keys, $name, CommandId::Motion($kind), ModeMask::MOTION_CONTEXT)
    };
}

/// Builds the full static command table (§4.D "keyed catalog"). Order is
/// insertion order only; lookup is by trie, not position.
fn build_defs() -> Vec<CommandDef> {
    use ActionKind::*;
    use ModeChangeTarget::*;
    use MotionKind::*;
    use OperatorKind::*;

    vec![
        // --- Motions ---
        motion!("h", "left", Left),
        motion!("l", "right", Right),
        motion!("j", "down", Down),
        motion!("k", "up", Up),
        motion!("0", "line-start", LineStart).no_count(),
        motion!("^", "first-non-blank", FirstNonBlank).no_count(),
        motion!("$", "line-end", LineEnd),
        motion!("w", "word-forward", WordForward),
        motion!("W", "WORD-forward", BigWordForward),
        motion!("b", "word-backward", WordBackward),
        motion!("B", "WORD-backward", BigWordBackward),
        motion!("e", "word-end-forward", WordEndForward),
        motion!("E", "WORD-end-forward", BigWordEndForward),
        motion!("G", "goto-line", GotoLine),
        motion!("gg", "goto-first-line", GotoFirstLine),
        motion!("}", "paragraph-forward", ParagraphForward),
        motion!("{", "paragraph-backward", ParagraphBackward),
        motion!("H", "viewport-high", ViewportHigh).no_count(),
        motion!("M", "viewport-middle", ViewportMiddle).no_count(),
        motion!("L", "viewport-low", ViewportLow).no_count(),
        motion!("%", "matching-bracket", MatchingBracket).no_count(),
        motion!(";", "repeat-find-same", RepeatFindSame),
        motion!(",", "repeat-find-opposite", RepeatFindOpposite),
        // f/F/t/T are registered as motions but require a following raw key;
        // the dispatcher special-cases them into an `ArgExpected::Find`
        // sub-state before consulting the registry's completed form.
        motion!("f", "find-char-forward", FindCharForward),
        motion!("F", "find-char-backward", FindCharBackward),
        motion!("t", "till-char-forward", TillCharForward),
        motion!("T", "till-char-backward", TillCharBackward),
        // --- Operators ---
        def("d", "delete", CommandId::Operator(Delete), ModeMask::NORMAL)
            .register()
            .operator_pending(),
        def("c", "change", CommandId::Operator(Change), ModeMask::NORMAL)
            .register()
            .operator_pending(),
        def("y", "yank", CommandId::Operator(Yank), ModeMask::NORMAL)
            .register()
            .operator_pending(),
        def("=", "auto-indent", CommandId::Operator(AutoIndent), ModeMask::NORMAL).operator_pending(),
        def(">", "shift-right", CommandId::Operator(ShiftRight), ModeMask::NORMAL).operator_pending(),
        def("<", "shift-left", CommandId::Operator(ShiftLeft), ModeMask::NORMAL).operator_pending(),
        def("gu", "lowercase", CommandId::Operator(LowerCase), ModeMask::NORMAL).operator_pending(),
        def("gU", "uppercase", CommandId::Operator(UpperCase), ModeMask::NORMAL).operator_pending(),
        def("g~", "swap-case", CommandId::Operator(SwapCase), ModeMask::NORMAL).operator_pending(),
        // Visual mode applies the same operators directly to the selection.
        def("d", "delete-visual", CommandId::Operator(Delete), ModeMask::ANY_VISUAL).register(),
        def("x", "delete-visual-x", CommandId::Operator(Delete), ModeMask::ANY_VISUAL).register(),
        def("c", "change-visual", CommandId::Operator(Change), ModeMask::ANY_VISUAL).register(),
        def("y", "yank-visual", CommandId::Operator(Yank), ModeMask::ANY_VISUAL).register(),
        def(">", "shift-right-visual", CommandId::Operator(ShiftRight), ModeMask::ANY_VISUAL),
        def("<", "shift-left-visual", CommandId::Operator(ShiftLeft), ModeMask::ANY_VISUAL),
        def("gu", "lowercase-visual", CommandId::Operator(LowerCase), ModeMask::ANY_VISUAL),
        def("gU", "uppercase-visual", CommandId::Operator(UpperCase), ModeMask::ANY_VISUAL),
        def("g~", "swap-case-visual", CommandId::Operator(SwapCase), ModeMask::ANY_VISUAL),
        // --- Text objects (Operator-Pending / Visual only) ---
        text_object("iw", TextObjectKind::Word { around: false }),
        text_object("aw", TextObjectKind::Word { around: true }),
        text_object("iW", TextObjectKind::BigWord { around: false }),
        text_object("aW", TextObjectKind::BigWord { around: true }),
        text_object("is", TextObjectKind::Sentence { around: false }),
        text_object("as", TextObjectKind::Sentence { around: true }),
        text_object("ip", TextObjectKind::Paragraph { around: false }),
        text_object("ap", TextObjectKind::Paragraph { around: true }),
        text_object("i\"", TextObjectKind::Quote { delim: '"', around: false }),
        text_object("a\"", TextObjectKind::Quote { delim: '"', around: true }),
        text_object("i'", TextObjectKind::Quote { delim: '\'', around: false }),
        text_object("a'", TextObjectKind::Quote { delim: '\'', around: true }),
        text_object("i`", TextObjectKind::Quote { delim: '`', around: false }),
        text_object("a`", TextObjectKind::Quote { delim: '`', around: true }),
        bracket_object("i(", '(', false),
        bracket_object("a(", '(', true),
        bracket_object("i)", '(', false),
        bracket_object("a)", '(', true),
        bracket_object("i[", '[', false),
        bracket_object("a[", '[', true),
        bracket_object("i]", '[', false),
        bracket_object("a]", '[', true),
        bracket_object("i{", '{', false),
        bracket_object("a{", '{', true),
        bracket_object("i}", '{', false),
        bracket_object("a}", '{', true),
        bracket_object("i<", '<', false),
        bracket_object("a<", '<', true),
        bracket_object("i>", '<', false),
        bracket_object("a>", '<', true),
        // --- Actions ---
        def("x", "delete-under", CommandId::Action(DeleteCharUnder), ModeMask::NORMAL).register(),
        def("X", "delete-before", CommandId::Action(DeleteCharBefore), ModeMask::NORMAL).register(),
        def("r", "replace-char", CommandId::Action(ReplaceChar), ModeMask::NORMAL).no_count(),
        def("J", "join", CommandId::Action(JoinLines { with_space: true }), ModeMask::NORMAL),
        def("gJ", "join-no-space", CommandId::Action(JoinLines { with_space: false }), ModeMask::NORMAL),
        def("p", "paste-after", CommandId::Action(PasteAfter), ModeMask::NORMAL).register(),
        def("P", "paste-before", CommandId::Action(PasteBefore), ModeMask::NORMAL).register(),
        def("u", "undo", CommandId::Action(Undo), ModeMask::NORMAL),
        static_ctrl("r", "redo", CommandId::Action(Redo)),
        def(".", "repeat", CommandId::Action(RepeatLastChange), ModeMask::NORMAL),
        def("m", "set-mark", CommandId::Action(SetMark), ModeMask::NORMAL).no_count(),
        def("'", "jump-mark-line", CommandId::Action(JumpToMarkLine), ModeMask::NORMAL).no_count(),
        def("`", "jump-mark-exact", CommandId::Action(JumpToMarkExact), ModeMask::NORMAL).no_count(),
        static_ctrl("o", "jump-older", CommandId::Action(JumpOlder)),
        static_ctrl("i", "jump-newer", CommandId::Action(JumpNewer)),
        def("/", "search-forward", CommandId::Action(SearchForward), ModeMask::NORMAL).no_count(),
        def("?", "search-backward", CommandId::Action(SearchBackward), ModeMask::NORMAL).no_count(),
        def("n", "search-next", CommandId::Action(SearchNext), ModeMask::NORMAL),
        def("N", "search-prev", CommandId::Action(SearchPrev), ModeMask::NORMAL),
        def("*", "search-word-forward", CommandId::Action(SearchWordForward), ModeMask::NORMAL).no_count(),
        def("#", "search-word-backward", CommandId::Action(SearchWordBackward), ModeMask::NORMAL).no_count(),
        def("q", "toggle-recording", CommandId::Action(ToggleRecording), ModeMask::NORMAL).no_count(),
        def("@", "play-macro", CommandId::Action(PlayMacro), ModeMask::NORMAL),
        // --- Mode changes ---
        mode_change("i", InsertBefore),
        mode_change("a", InsertAfter),
        mode_change("I", InsertLineStart),
        mode_change("A", InsertLineEnd),
        mode_change("o", OpenBelow),
        mode_change("O", OpenAbove),
        mode_change("R", ReplaceMode),
        def("s", "substitute-char", CommandId::ModeChange(SubstituteChar), ModeMask::NORMAL).register(),
        def("S", "substitute-line", CommandId::ModeChange(SubstituteLine), ModeMask::NORMAL).register(),
        def("v", "visual-char", CommandId::ModeChange(VisualChar), ModeMask::NORMAL | ModeMask::ANY_VISUAL).no_count(),
        def("V", "visual-line", CommandId::ModeChange(VisualLine), ModeMask::NORMAL | ModeMask::ANY_VISUAL).no_count(),
        static_ctrl("v", "visual-block", CommandId::ModeChange(VisualBlock)),
        def(":", "command-line", CommandId::ModeChange(CommandLine), ModeMask::NORMAL | ModeMask::ANY_VISUAL).no_count(),
    ]
}

fn text_object(keys: &'static str, kind: TextObjectKind) -> CommandDef {
    def(
        keys,
        "text-object",
        CommandId::TextObject(kind),
        ModeMask::OPERATOR_PENDING | ModeMask::ANY_VISUAL,
    )
    .no_count()
}

fn bracket_object(keys: &'static str, open: char, around: bool) -> CommandDef {
    text_object(keys, TextObjectKind::Bracket { open, around })
}

/// Keys preceded by Ctrl are represented in the pending-key string as a
/// literal `\u{1}` sentinel followed by the base char (e.g. Ctrl-R ->
/// `"\u{1}r"`) by the key translator before reaching the registry, keeping
/// the trie's alphabet plain chars rather than a separate modifier axis.
fn static_ctrl(key: &'static str, name: &'static str, id: CommandId) -> CommandDef {
    let keys: &'static str = match key {
        "r" => "\u{1}r",
        "o" => "\u{1}o",
        "i" => "\u{1}i",
        "v" => "\u{1}v",
        _ => unreachable!(),
    };
    def(keys, name, id, ModeMask::NORMAL).no_count()
}

fn mode_change(keys: &'static str, target: ModeChangeTarget) -> CommandDef {
    def(keys, "mode-change", CommandId::ModeChange(target), ModeMask::NORMAL).no_count()
}

/// Cheap `Copy` summary of a matched `CommandDef`'s metadata flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandDefSummary {
    pub takes_count: bool,
    pub takes_register: bool,
    pub sets_operator_pending: bool,
    pub repeatable: bool,
}

impl From<&CommandDef> for CommandDefSummary {
    fn from(d: &CommandDef) -> Self {
        Self {
            takes_count: d.takes_count,
            takes_register: d.takes_register,
            sets_operator_pending: d.sets_operator_pending,
            repeatable: d.repeatable,
        }
    }
}

/// Resolution of a pending key string against the registry for the current mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    /// `keys` exactly names a command valid in this mode.
    Exact(CommandId, CommandDefSummary),
    /// `keys` is a strict prefix of at least one registered sequence valid in
    /// this mode; wait for more input.
    Incomplete,
    /// No registered sequence (in this mode) begins with `keys`.
    None,
}

#[derive(Default)]
struct TrieNode {
    children: BTreeMap<char, TrieNode>,
    /// Defs terminal exactly at this node, one per mode that can match here.
    terminal: Vec<usize>,
    /// Union of modes reachable at or below this node; lets `lookup` answer
    /// "incomplete" without walking the whole subtree on every key.
    reachable: ModeMask,
}

/// Trie keyed by key-sequence bytes (REDESIGN FLAGS §9: "the prefix-match
/// structure ... can be a trie keyed by byte sequences").
pub struct CommandRegistry {
    defs: Vec<CommandDef>,
    root: TrieNode,
}

impl CommandRegistry {
    pub fn new() -> Self {
        let defs = build_defs();
        let mut root = TrieNode::default();
        for (idx, d) in defs.iter().enumerate() {
            root.reachable |= d.modes;
            let mut node = &mut root;
            for ch in d.keys.chars() {
                node = node.children.entry(ch).or_default();
                node.reachable |= d.modes;
            }
            node.terminal.push(idx);
        }
        Self { defs, root }
    }

    pub fn lookup(&self, mode_mask: ModeMask, keys: &str) -> Lookup {
        let mut node = &self.root;
        for ch in keys.chars() {
            match node.children.get(&ch) {
                Some(n) => node = n,
                None => return Lookup::None,
            }
        }
        if !node.reachable.intersects(mode_mask) {
            return Lookup::None;
        }
        for &idx in &node.terminal {
            let d = &self.defs[idx];
            if d.modes.intersects(mode_mask) {
                return Lookup::Exact(d.id, CommandDefSummary::from(d));
            }
        }
        if node.children.values().any(|c| c.reachable.intersects(mode_mask)) {
            Lookup::Incomplete
        } else {
            Lookup::None
        }
    }

    pub fn defs(&self) -> &[CommandDef] {
        &self.defs
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}
