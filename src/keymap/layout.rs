//! Keyboard layouts: mapping platform key events to keycaps
//!
//! The engine never looks at key codes itself. A [`KeyboardLayout`] turns a
//! [`KeyEvent`] into a keycap token and decides which tokens are legal in
//! binding text. [`UsLayout`] is the default.

use super::types::Modifiers;

/// A key-down notification pushed into the engine by the caller
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyEvent {
    /// Physical key code, DOM style (`KeyA`, `Digit1`, `ArrowUp`, `F5`)
    pub code: String,
    /// Logical key text reported by the platform, if any
    pub key: Option<String>,
    pub mods: Modifiers,
}

impl KeyEvent {
    pub fn new(code: impl Into<String>, mods: Modifiers) -> Self {
        Self {
            code: code.into(),
            key: None,
            mods,
        }
    }

    /// Attach the logical key text
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }
}

/// Key-code tables for one keyboard layout
pub trait KeyboardLayout {
    /// Keycap for a platform event, or `None` for modifier-only and unknown keys
    fn keycap_for(&self, event: &KeyEvent) -> Option<String>;

    /// Whether `token` is a canonical keycap of this layout
    fn is_valid_keycap(&self, token: &str) -> bool;

    /// Resolve a user-written key token to its canonical keycap
    fn canonical_keycap(&self, token: &str) -> Option<String> {
        let lower = token.to_lowercase();
        self.is_valid_keycap(&lower).then_some(lower)
    }
}

/// Unshifted printable keys on a US keyboard
const US_PUNCTUATION: &[char] = &['`', '-', '=', '[', ']', '\\', ';', '\'', ',', '.', '/'];

const NAMED_KEYS: &[&str] = &[
    "enter",
    "escape",
    "tab",
    "backspace",
    "delete",
    "space",
    "up",
    "down",
    "left",
    "right",
    "home",
    "end",
    "pageup",
    "pagedown",
    "insert",
    "numpad0",
    "numpad1",
    "numpad2",
    "numpad3",
    "numpad4",
    "numpad5",
    "numpad6",
    "numpad7",
    "numpad8",
    "numpad9",
    "numpad_add",
    "numpad_subtract",
    "numpad_multiply",
    "numpad_divide",
    "numpad_enter",
    "numpad_decimal",
];

/// Key codes that are modifiers on their own
const MODIFIER_CODES: &[&str] = &[
    "ShiftLeft",
    "ShiftRight",
    "ControlLeft",
    "ControlRight",
    "AltLeft",
    "AltRight",
    "MetaLeft",
    "MetaRight",
    "OSLeft",
    "OSRight",
    "CapsLock",
    "Fn",
];

/// Default US-English layout
#[derive(Clone, Copy, Debug, Default)]
pub struct UsLayout;

impl UsLayout {
    fn function_key(token: &str) -> bool {
        token
            .strip_prefix('f')
            .and_then(|n| n.parse::<u8>().ok())
            .is_some_and(|n| (1..=24).contains(&n))
    }

    /// Map a DOM-style key code to a keycap
    fn keycap_for_code(code: &str) -> Option<String> {
        if let Some(letter) = code.strip_prefix("Key") {
            let mut chars = letter.chars();
            return match (chars.next(), chars.next()) {
                (Some(c), None) if c.is_ascii_alphabetic() => Some(c.to_ascii_lowercase().to_string()),
                _ => None,
            };
        }
        if let Some(digit) = code.strip_prefix("Digit") {
            return (digit.len() == 1 && digit.chars().all(|c| c.is_ascii_digit()))
                .then(|| digit.to_string());
        }
        if let Some(n) = code.strip_prefix('F') {
            let token = format!("f{n}");
            return Self::function_key(&token).then_some(token);
        }

        let keycap = match code {
            "Enter" => "enter",
            "Escape" => "escape",
            "Tab" => "tab",
            "Backspace" => "backspace",
            "Delete" => "delete",
            "Space" => "space",

            // Arrows
            "ArrowUp" => "up",
            "ArrowDown" => "down",
            "ArrowLeft" => "left",
            "ArrowRight" => "right",

            // Navigation
            "Home" => "home",
            "End" => "end",
            "PageUp" => "pageup",
            "PageDown" => "pagedown",
            "Insert" => "insert",

            // Punctuation
            "Backquote" => "`",
            "Minus" => "-",
            "Equal" => "=",
            "BracketLeft" => "[",
            "BracketRight" => "]",
            "Backslash" => "\\",
            "Semicolon" => ";",
            "Quote" => "'",
            "Comma" => ",",
            "Period" => ".",
            "Slash" => "/",

            // Numpad
            "Numpad0" => "numpad0",
            "Numpad1" => "numpad1",
            "Numpad2" => "numpad2",
            "Numpad3" => "numpad3",
            "Numpad4" => "numpad4",
            "Numpad5" => "numpad5",
            "Numpad6" => "numpad6",
            "Numpad7" => "numpad7",
            "Numpad8" => "numpad8",
            "Numpad9" => "numpad9",
            "NumpadAdd" => "numpad_add",
            "NumpadSubtract" => "numpad_subtract",
            "NumpadMultiply" => "numpad_multiply",
            "NumpadDivide" => "numpad_divide",
            "NumpadEnter" => "numpad_enter",
            "NumpadDecimal" => "numpad_decimal",

            _ => return None,
        };
        Some(keycap.to_string())
    }
}

impl KeyboardLayout for UsLayout {
    fn keycap_for(&self, event: &KeyEvent) -> Option<String> {
        if MODIFIER_CODES.contains(&event.code.as_str()) {
            return None;
        }

        // Physical code first, then fall back to the logical key text
        Self::keycap_for_code(&event.code).or_else(|| {
            let key = event.key.as_deref()?;
            self.canonical_keycap(key)
        })
    }

    fn is_valid_keycap(&self, token: &str) -> bool {
        let mut chars = token.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            return c.is_ascii_lowercase() || c.is_ascii_digit() || US_PUNCTUATION.contains(&c);
        }
        NAMED_KEYS.contains(&token) || Self::function_key(token)
    }

    fn canonical_keycap(&self, token: &str) -> Option<String> {
        let lower = token.to_lowercase();
        let resolved = match lower.as_str() {
            "return" => "enter",
            "esc" => "escape",
            "back" => "backspace",
            "del" => "delete",
            "arrowup" => "up",
            "arrowdown" => "down",
            "arrowleft" => "left",
            "arrowright" => "right",
            "pgup" => "pageup",
            "pgdown" | "pgdn" => "pagedown",
            "ins" => "insert",
            " " => "space",
            other => {
                if let Some(n) = other.strip_prefix("num").filter(|n| n.len() == 1) {
                    return self
                        .is_valid_keycap(&format!("numpad{n}"))
                        .then(|| format!("numpad{n}"));
                }
                other
            }
        };
        self.is_valid_keycap(resolved).then(|| resolved.to_string())
    }
}
