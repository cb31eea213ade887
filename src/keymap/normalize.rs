//! Keystroke normalization
//!
//! Turns user-written keystrokes like `"Shift+Ctrl+X"` into canonical
//! [`Keystroke`]s and whitespace-separated text like `"ctrl+k ctrl+l"` into
//! [`KeySequence`]s. Modifier input order never matters; the rendered form is
//! always `ctrl+alt+shift+cmd+<key>`.

use super::error::{KeymapError, KeystrokeError};
use super::layout::{KeyEvent, KeyboardLayout};
use super::types::{KeySequence, Keystroke, Modifiers, Platform};

/// Resolve a modifier token, `accel` included
fn modifier_from_token(token: &str, platform: Platform) -> Option<Modifiers> {
    match token.to_lowercase().as_str() {
        "ctrl" | "control" => Some(Modifiers::CTRL),
        "alt" | "option" | "opt" => Some(Modifiers::ALT),
        "shift" => Some(Modifiers::SHIFT),
        "cmd" | "command" | "meta" | "super" | "win" => Some(Modifiers::CMD),
        "accel" => Some(platform.accel()),
        _ => None,
    }
}

/// Parse a key string like `"cmd+shift+s"` into a canonical Keystroke
pub fn normalize_keystroke(
    raw: &str,
    layout: &dyn KeyboardLayout,
    platform: Platform,
) -> Result<Keystroke, KeystrokeError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(KeystrokeError::Empty);
    }

    let mut mods = Modifiers::NONE;
    let mut key: Option<(&str, String)> = None;

    for token in raw.split('+').map(str::trim) {
        if token.is_empty() {
            return Err(KeystrokeError::EmptyToken(raw.to_string()));
        }

        if let Some(modifier) = modifier_from_token(token, platform) {
            if let Some((key_token, _)) = key {
                return Err(KeystrokeError::ModifierAfterKey {
                    modifier: token.to_string(),
                    key: key_token.to_string(),
                });
            }
            if mods.contains(modifier) {
                return Err(KeystrokeError::DuplicateModifier(token.to_lowercase()));
            }
            mods = mods | modifier;
            continue;
        }

        if let Some((first, _)) = key {
            return Err(KeystrokeError::MultipleKeys {
                first: first.to_string(),
                second: token.to_string(),
            });
        }
        let keycap = layout
            .canonical_keycap(token)
            .ok_or_else(|| KeystrokeError::UnknownKey(token.to_string()))?;
        key = Some((token, keycap));
    }

    let (_, keycap) = key.ok_or_else(|| KeystrokeError::MissingKey(raw.to_string()))?;
    Ok(Keystroke::new(keycap, mods))
}

/// Parse whitespace-separated keystrokes into a sequence
pub fn parse_sequence(
    text: &str,
    layout: &dyn KeyboardLayout,
    platform: Platform,
) -> Result<KeySequence, KeymapError> {
    let parts: Vec<&str> = text.split_whitespace().collect();
    parse_keystrokes(&parts, layout, platform)
}

/// Normalize each keystroke of an already-split sequence
pub fn parse_keystrokes<S: AsRef<str>>(
    parts: &[S],
    layout: &dyn KeyboardLayout,
    platform: Platform,
) -> Result<KeySequence, KeymapError> {
    let keystrokes = parts
        .iter()
        .map(|part| {
            normalize_keystroke(part.as_ref(), layout, platform).map_err(|source| {
                KeymapError::InvalidKeystroke {
                    keystroke: part.as_ref().to_string(),
                    source,
                }
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    KeySequence::new(keystrokes).ok_or_else(|| KeymapError::EmptySequence(String::new()))
}

/// Build a keystroke from a live platform event
///
/// Returns `None` when the layout has no keycap for the event, e.g. a bare
/// modifier press. Event modifiers are physical, so no `accel` resolution
/// happens here.
pub fn keystroke_from_event(event: &KeyEvent, layout: &dyn KeyboardLayout) -> Option<Keystroke> {
    layout
        .keycap_for(event)
        .map(|keycap| Keystroke::new(keycap, event.mods))
}
