//! Core types for the keymap system: Keystroke, KeySequence, Modifiers, Platform

use std::fmt;

use serde::Deserialize;

/// Host platform, used to resolve the `accel` modifier
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    /// Mac-like hosts: `accel` means Cmd
    Mac,
    /// Everything else: `accel` means Ctrl
    Other,
}

impl Platform {
    /// The platform this binary was compiled for
    pub const fn current() -> Self {
        if cfg!(target_os = "macos") {
            Platform::Mac
        } else {
            Platform::Other
        }
    }

    /// The native modifier standing in for `accel`
    pub const fn accel(self) -> Modifiers {
        match self {
            Platform::Mac => Modifiers::CMD,
            Platform::Other => Modifiers::CTRL,
        }
    }
}

impl Default for Platform {
    fn default() -> Self {
        Self::current()
    }
}

/// Modifier keys as a bitfield for efficient storage and comparison
///
/// Bit order doubles as the canonical rendering order: Ctrl, Alt, Shift, Cmd.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Modifiers(u8);

impl Modifiers {
    pub const NONE: Modifiers = Modifiers(0);
    pub const CTRL: Modifiers = Modifiers(0b0001);
    pub const ALT: Modifiers = Modifiers(0b0010);
    pub const SHIFT: Modifiers = Modifiers(0b0100);
    pub const CMD: Modifiers = Modifiers(0b1000); // Meta / Super / Win

    /// Every modifier paired with its canonical token, in canonical order
    pub const CANONICAL: [(Modifiers, &'static str); 4] = [
        (Modifiers::CTRL, "ctrl"),
        (Modifiers::ALT, "alt"),
        (Modifiers::SHIFT, "shift"),
        (Modifiers::CMD, "cmd"),
    ];

    /// Create modifiers from individual flags
    pub const fn new(ctrl: bool, alt: bool, shift: bool, cmd: bool) -> Self {
        let mut bits = 0u8;
        if ctrl {
            bits |= Self::CTRL.0;
        }
        if alt {
            bits |= Self::ALT.0;
        }
        if shift {
            bits |= Self::SHIFT.0;
        }
        if cmd {
            bits |= Self::CMD.0;
        }
        Modifiers(bits)
    }

    #[inline]
    pub const fn ctrl(self) -> bool {
        self.contains(Self::CTRL)
    }

    #[inline]
    pub const fn alt(self) -> bool {
        self.contains(Self::ALT)
    }

    #[inline]
    pub const fn shift(self) -> bool {
        self.contains(Self::SHIFT)
    }

    #[inline]
    pub const fn cmd(self) -> bool {
        self.contains(Self::CMD)
    }

    /// Check if no modifiers are held
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Combine two modifier sets
    #[inline]
    pub const fn union(self, other: Modifiers) -> Modifiers {
        Modifiers(self.0 | other.0)
    }

    /// Check if this contains all modifiers in other
    #[inline]
    pub const fn contains(self, other: Modifiers) -> bool {
        (self.0 & other.0) == other.0
    }

    /// Canonical tokens of the held modifiers, in canonical order
    pub fn tokens(self) -> impl Iterator<Item = &'static str> {
        Self::CANONICAL
            .into_iter()
            .filter(move |(m, _)| self.contains(*m))
            .map(|(_, name)| name)
    }
}

impl std::ops::BitOr for Modifiers {
    type Output = Modifiers;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.union(rhs)
    }
}

impl fmt::Display for Modifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<&str> = self.tokens().collect();
        write!(f, "{}", parts.join("+"))
    }
}

/// A single normalized keystroke: modifiers plus exactly one keycap
///
/// The keycap is always the layout's lowercase token, so derived equality is
/// canonical equality. Build these through [`super::normalize_keystroke`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Keystroke {
    mods: Modifiers,
    key: String,
}

impl Keystroke {
    pub(crate) fn new(key: impl Into<String>, mods: Modifiers) -> Self {
        Self {
            key: key.into(),
            mods,
        }
    }

    pub fn mods(&self) -> Modifiers {
        self.mods
    }

    /// The keycap token, e.g. `k` or `pagedown`
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Canonical text form, e.g. `ctrl+shift+k`
    pub fn canonical(&self) -> String {
        self.to_string()
    }

    /// Display the keystroke using platform-specific symbols
    pub fn display_string(&self, platform: Platform) -> String {
        let key = if self.key.chars().count() == 1 {
            self.key.to_uppercase()
        } else {
            match self.key.as_str() {
                "up" => "↑".to_string(),
                "down" => "↓".to_string(),
                "left" => "←".to_string(),
                "right" => "→".to_string(),
                other => other.to_string(),
            }
        };

        match platform {
            // macOS uses symbols: ⌃ ⌥ ⇧ ⌘
            Platform::Mac => {
                let mut out = String::new();
                if self.mods.ctrl() {
                    out.push('⌃');
                }
                if self.mods.alt() {
                    out.push('⌥');
                }
                if self.mods.shift() {
                    out.push('⇧');
                }
                if self.mods.cmd() {
                    out.push('⌘');
                }
                out.push_str(&key);
                out
            }
            Platform::Other => {
                let mut parts = Vec::new();
                if self.mods.ctrl() {
                    parts.push("Ctrl");
                }
                if self.mods.alt() {
                    parts.push("Alt");
                }
                if self.mods.shift() {
                    parts.push("Shift");
                }
                if self.mods.cmd() {
                    parts.push("Win");
                }
                parts.push(&key);
                parts.join("+")
            }
        }
    }
}

impl fmt::Display for Keystroke {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.mods.is_empty() {
            write!(f, "{}", self.key)
        } else {
            write!(f, "{}+{}", self.mods, self.key)
        }
    }
}

/// An ordered, non-empty list of keystrokes
///
/// Length 1 is an ordinary shortcut, anything longer is a chord.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct KeySequence(Vec<Keystroke>);

impl KeySequence {
    /// Returns `None` for an empty list
    pub fn new(keystrokes: Vec<Keystroke>) -> Option<Self> {
        if keystrokes.is_empty() {
            None
        } else {
            Some(Self(keystrokes))
        }
    }

    pub fn keystrokes(&self) -> &[Keystroke] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; kept for API symmetry with `len`
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Check if this is a chord (multi-keystroke) sequence
    pub fn is_chord(&self) -> bool {
        self.0.len() > 1
    }

    /// Check if `prefix` matches the start of this sequence
    pub fn starts_with(&self, prefix: &[Keystroke]) -> bool {
        self.0.starts_with(prefix)
    }

    /// Get display string for this sequence
    pub fn display_string(&self, platform: Platform) -> String {
        self.0
            .iter()
            .map(|k| k.display_string(platform))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for KeySequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(Keystroke::canonical).collect();
        write!(f, "{}", parts.join(" "))
    }
}
