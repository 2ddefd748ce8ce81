//! Undo/redo keyboard chords.
//!
//! The primary modifier is Cmd (Super) on macOS and Ctrl elsewhere:
//! primary+Z undoes, primary+Shift+Z redoes. Chords typed while a text
//! field has focus are left alone so the field's own undo applies.

/// Modifier keys held during a key press.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    pub super_key: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        ctrl: false,
        shift: false,
        alt: false,
        super_key: false,
    };

    pub const CTRL: Modifiers = Modifiers {
        ctrl: true,
        shift: false,
        alt: false,
        super_key: false,
    };

    pub const CTRL_SHIFT: Modifiers = Modifiers {
        ctrl: true,
        shift: true,
        alt: false,
        super_key: false,
    };

    pub const SUPER: Modifiers = Modifiers {
        ctrl: false,
        shift: false,
        alt: false,
        super_key: true,
    };

    pub const SUPER_SHIFT: Modifiers = Modifiers {
        ctrl: false,
        shift: true,
        alt: false,
        super_key: true,
    };
}

/// Which modifier acts as "primary".
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Platform {
    Mac,
    Other,
}

impl Platform {
    /// The platform this binary was built for.
    pub fn current() -> Self {
        if cfg!(target_os = "macos") {
            Platform::Mac
        } else {
            Platform::Other
        }
    }

    fn primary_held(self, mods: Modifiers) -> bool {
        match self {
            Platform::Mac => mods.super_key && !mods.ctrl,
            Platform::Other => mods.ctrl && !mods.super_key,
        }
    }

    /// Modifiers for primary (+ Shift).
    pub fn primary(self, shift: bool) -> Modifiers {
        match (self, shift) {
            (Platform::Mac, false) => Modifiers::SUPER,
            (Platform::Mac, true) => Modifiers::SUPER_SHIFT,
            (Platform::Other, false) => Modifiers::CTRL,
            (Platform::Other, true) => Modifiers::CTRL_SHIFT,
        }
    }
}

/// Where keyboard focus sits when the key is pressed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InputContext {
    /// Anywhere outside a text field.
    #[default]
    Document,
    /// Inside a text-editing field.
    TextInput,
}

/// A single key press.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: char,
    pub modifiers: Modifiers,
}

impl KeyEvent {
    pub fn new(key: char, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }

    /// Parse terminal caret notation: `^z` is primary+Z, `^Z` is
    /// primary+Shift+Z.
    pub fn from_caret(chord: &str, platform: Platform) -> Option<Self> {
        let mut chars = chord.strip_prefix('^')?.chars();
        let key = chars.next()?;
        if chars.next().is_some() {
            return None;
        }
        let shift = key.is_ascii_uppercase();
        Some(Self::new(key.to_ascii_lowercase(), platform.primary(shift)))
    }
}

/// What a chord asks the editor to do.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShortcutAction {
    Undo,
    Redo,
}

/// Result of dispatching one key event.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct KeyOutcome {
    pub action: Option<ShortcutAction>,
    /// Whether the event's default handling should be suppressed.
    pub prevent_default: bool,
}

/// Maps key events to undo/redo.
#[derive(Clone, Copy, Debug)]
pub struct ShortcutDispatcher {
    platform: Platform,
}

impl Default for ShortcutDispatcher {
    fn default() -> Self {
        Self::new(Platform::current())
    }
}

impl ShortcutDispatcher {
    pub fn new(platform: Platform) -> Self {
        Self { platform }
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Decide what `event` does in `context`. At most one action fires.
    pub fn dispatch(&self, event: KeyEvent, context: InputContext) -> KeyOutcome {
        if context == InputContext::TextInput {
            return KeyOutcome::default();
        }
        let mods = event.modifiers;
        if !event.key.eq_ignore_ascii_case(&'z') || mods.alt || !self.platform.primary_held(mods) {
            return KeyOutcome::default();
        }
        let action = if mods.shift {
            ShortcutAction::Redo
        } else {
            ShortcutAction::Undo
        };
        KeyOutcome {
            action: Some(action),
            prevent_default: true,
        }
    }
}
