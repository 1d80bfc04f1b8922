//! Core types for the keymap system: KeyEvent, SingleKey, Modifiers, KeyCode

use std::fmt;

bitflags::bitflags! {
    /// Modifier keys as a bitfield for efficient storage and comparison
    ///
    /// Events coming from the window system may carry bits outside the
    /// recognized set; [`Modifiers::masked`] drops them before lookup.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Modifiers: u32 {
        const SHIFT = 0b0000_0001;
        const CTRL = 0b0000_0010;
        const ALT = 0b0000_0100;
        const SUPER = 0b0000_1000; // Cmd on macOS, Win on Windows
        const HYPER = 0b0001_0000;
        const META = 0b0010_0000;
        const CAPS_LOCK = 0b0100_0000;
        const NUM_LOCK = 0b1000_0000;
    }
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers::empty();

    /// Restrict to the recognized modifier set
    #[inline]
    pub const fn masked(self) -> Modifiers {
        Modifiers::from_bits_truncate(self.bits())
    }

    /// Check if ctrl is held
    #[inline]
    pub const fn ctrl(self) -> bool {
        self.contains(Modifiers::CTRL)
    }

    /// Check if shift is held
    #[inline]
    pub const fn shift(self) -> bool {
        self.contains(Modifiers::SHIFT)
    }

    /// Check if alt/option is held
    #[inline]
    pub const fn alt(self) -> bool {
        self.contains(Modifiers::ALT)
    }

    /// Check if super (cmd/win) is held
    #[inline]
    pub const fn super_key(self) -> bool {
        self.contains(Modifiers::SUPER)
    }

    /// Get the platform-specific "command" modifier (Cmd on macOS, Ctrl elsewhere)
    pub fn cmd() -> Modifiers {
        if cfg!(target_os = "macos") {
            Modifiers::SUPER
        } else {
            Modifiers::CTRL
        }
    }
}

impl fmt::Display for Modifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [(Modifiers, &str); 8] = [
            (Modifiers::CTRL, "ctrl"),
            (Modifiers::ALT, "alt"),
            (Modifiers::SHIFT, "shift"),
            (Modifiers::SUPER, "super"),
            (Modifiers::HYPER, "hyper"),
            (Modifiers::META, "meta"),
            (Modifiers::CAPS_LOCK, "caps_lock"),
            (Modifiers::NUM_LOCK, "num_lock"),
        ];
        let parts: Vec<&str> = NAMES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect();
        write!(f, "{}", parts.join("+"))
    }
}

/// A key code representing a logical key, or a native scancode
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// A character key
    Char(char),

    // Named keys
    Enter,
    Escape,
    Tab,
    Backspace,
    Delete,
    Space,

    // Arrow keys
    Up,
    Down,
    Left,
    Right,

    // Navigation
    Home,
    End,
    PageUp,
    PageDown,
    Insert,

    // Function keys
    F(u8), // F1-F24

    // Numpad (physical keys)
    Numpad0,
    Numpad1,
    Numpad2,
    Numpad3,
    Numpad4,
    Numpad5,
    Numpad6,
    Numpad7,
    Numpad8,
    Numpad9,
    NumpadAdd,
    NumpadSubtract,
    NumpadMultiply,
    NumpadDivide,
    NumpadEnter,
    NumpadDecimal,

    // Modifier keys pressed on their own
    Shift,
    Control,
    Alt,
    Super,
    Hyper,
    Meta,
    CapsLock,
    NumLock,

    /// Layout-dependent code reported by the platform
    Native(u32),
}

impl KeyCode {
    /// Character key normalized the way bindings are declared (ASCII lowercase)
    pub fn char(c: char) -> Self {
        KeyCode::Char(c.to_ascii_lowercase())
    }

    /// True for keys that only ever act as modifiers
    pub const fn is_modifier(self) -> bool {
        matches!(
            self,
            KeyCode::Shift
                | KeyCode::Control
                | KeyCode::Alt
                | KeyCode::Super
                | KeyCode::Hyper
                | KeyCode::Meta
                | KeyCode::CapsLock
                | KeyCode::NumLock
        )
    }
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyCode::Char('+') => write!(f, "plus"),
            KeyCode::Char('>') => write!(f, "greater"),
            KeyCode::Char(c) => write!(f, "{}", c),
            KeyCode::Enter => write!(f, "enter"),
            KeyCode::Escape => write!(f, "escape"),
            KeyCode::Tab => write!(f, "tab"),
            KeyCode::Backspace => write!(f, "backspace"),
            KeyCode::Delete => write!(f, "delete"),
            KeyCode::Space => write!(f, "space"),
            KeyCode::Up => write!(f, "up"),
            KeyCode::Down => write!(f, "down"),
            KeyCode::Left => write!(f, "left"),
            KeyCode::Right => write!(f, "right"),
            KeyCode::Home => write!(f, "home"),
            KeyCode::End => write!(f, "end"),
            KeyCode::PageUp => write!(f, "page_up"),
            KeyCode::PageDown => write!(f, "page_down"),
            KeyCode::Insert => write!(f, "insert"),
            KeyCode::F(n) => write!(f, "f{}", n),
            KeyCode::Numpad0 => write!(f, "numpad0"),
            KeyCode::Numpad1 => write!(f, "numpad1"),
            KeyCode::Numpad2 => write!(f, "numpad2"),
            KeyCode::Numpad3 => write!(f, "numpad3"),
            KeyCode::Numpad4 => write!(f, "numpad4"),
            KeyCode::Numpad5 => write!(f, "numpad5"),
            KeyCode::Numpad6 => write!(f, "numpad6"),
            KeyCode::Numpad7 => write!(f, "numpad7"),
            KeyCode::Numpad8 => write!(f, "numpad8"),
            KeyCode::Numpad9 => write!(f, "numpad9"),
            KeyCode::NumpadAdd => write!(f, "numpad_add"),
            KeyCode::NumpadSubtract => write!(f, "numpad_subtract"),
            KeyCode::NumpadMultiply => write!(f, "numpad_multiply"),
            KeyCode::NumpadDivide => write!(f, "numpad_divide"),
            KeyCode::NumpadEnter => write!(f, "numpad_enter"),
            KeyCode::NumpadDecimal => write!(f, "numpad_decimal"),
            KeyCode::Shift => write!(f, "shift"),
            KeyCode::Control => write!(f, "control"),
            KeyCode::Alt => write!(f, "alt"),
            KeyCode::Super => write!(f, "super"),
            KeyCode::Hyper => write!(f, "hyper"),
            KeyCode::Meta => write!(f, "meta"),
            KeyCode::CapsLock => write!(f, "caps_lock"),
            KeyCode::NumLock => write!(f, "num_lock"),
            KeyCode::Native(code) => write!(f, "{:#x}", code),
        }
    }
}

/// One physical key transition as reported by the window system
///
/// `key` is the unshifted logical key, `shifted_key` the glyph produced with
/// shift held (if the layout reports one) and `native_key` the
/// layout-dependent platform code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    pub mods: Modifiers,
    pub key: KeyCode,
    pub shifted_key: Option<KeyCode>,
    pub native_key: u32,
}

impl KeyEvent {
    /// Create an event with no shifted glyph and no native code
    pub const fn new(key: KeyCode, mods: Modifiers) -> Self {
        Self {
            mods,
            key,
            shifted_key: None,
            native_key: 0,
        }
    }

    /// Create an event for a character key
    pub fn char(c: char, mods: Modifiers) -> Self {
        Self::new(KeyCode::char(c), mods)
    }

    /// Attach the glyph the key produces with shift held
    pub fn with_shifted(mut self, shifted: KeyCode) -> Self {
        self.shifted_key = Some(shifted);
        self
    }

    /// Attach the layout-dependent platform code
    pub fn with_native(mut self, native_key: u32) -> Self {
        self.native_key = native_key;
        self
    }

    /// True if the key itself is a modifier (shift, ctrl, ...)
    pub fn is_modifier_key(&self) -> bool {
        self.key.is_modifier()
    }
}

impl fmt::Display for KeyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&SingleKey::new(self.key, self.mods.masked()), f)
    }
}

/// Normalized lookup identity for a keymap entry
///
/// Two events that normalize to the same `SingleKey` are indistinguishable
/// to the resolver.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SingleKey {
    pub mods: Modifiers,
    pub native: bool,
    pub key: KeyCode,
}

impl SingleKey {
    /// Create a layout-independent key identity
    pub const fn new(key: KeyCode, mods: Modifiers) -> Self {
        Self {
            mods,
            native: false,
            key,
        }
    }

    /// Create a key identity for a native platform code
    pub const fn native(code: u32, mods: Modifiers) -> Self {
        Self {
            mods,
            native: true,
            key: KeyCode::Native(code),
        }
    }

    /// Create a key identity for a character key
    pub fn char(c: char, mods: Modifiers) -> Self {
        Self::new(KeyCode::char(c), mods)
    }

    /// Display the key using platform-specific symbols
    pub fn display_string(&self) -> String {
        let mut parts = String::new();

        if cfg!(target_os = "macos") {
            // macOS uses symbols: ⌃ ⌥ ⇧ ⌘
            if self.mods.ctrl() {
                parts.push('⌃');
            }
            if self.mods.alt() {
                parts.push('⌥');
            }
            if self.mods.shift() {
                parts.push('⇧');
            }
            if self.mods.super_key() {
                parts.push('⌘');
            }
        } else {
            if self.mods.ctrl() {
                parts.push_str("Ctrl+");
            }
            if self.mods.alt() {
                parts.push_str("Alt+");
            }
            if self.mods.shift() {
                parts.push_str("Shift+");
            }
            if self.mods.super_key() {
                parts.push_str("Super+");
            }
        }

        let key_str = match self.key {
            KeyCode::Char(c) => c.to_uppercase().to_string(),
            KeyCode::Up => "↑".to_string(),
            KeyCode::Down => "↓".to_string(),
            KeyCode::Left => "←".to_string(),
            KeyCode::Right => "→".to_string(),
            other => other.to_string(),
        };

        format!("{}{}", parts, key_str)
    }
}

impl fmt::Display for SingleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.mods.is_empty() {
            write!(f, "{}", self.key)
        } else {
            write!(f, "{}+{}", self.mods, self.key)
        }
    }
}
