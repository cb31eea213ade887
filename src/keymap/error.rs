//! Error types for keystroke normalization, registration and keymap files

use thiserror::Error;

/// Why a single keystroke failed to normalize
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeystrokeError {
    #[error("empty keystroke")]
    Empty,
    #[error("empty token in keystroke `{0}`")]
    EmptyToken(String),
    #[error("modifier `{0}` appears more than once")]
    DuplicateModifier(String),
    #[error("modifier `{modifier}` follows key `{key}`")]
    ModifierAfterKey { modifier: String, key: String },
    #[error("no key in keystroke `{0}`")]
    MissingKey(String),
    #[error("more than one key in keystroke: `{first}` and `{second}`")]
    MultipleKeys { first: String, second: String },
    #[error("unknown key `{0}` for the active keyboard layout")]
    UnknownKey(String),
}

/// Errors from keymap files and binding registration
#[derive(Debug, Error)]
pub enum KeymapError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("invalid keystroke `{keystroke}`: {source}")]
    InvalidKeystroke {
        keystroke: String,
        #[source]
        source: KeystrokeError,
    },
    #[error("empty key sequence for command `{0}`")]
    EmptySequence(String),
    #[error("invalid selector `{0}`")]
    InvalidSelector(String),
    #[error("binding for `{0}` has no command")]
    MissingCommand(String),
    #[error("`{sequence}` is already bound on `{selector}`")]
    DuplicateBinding { sequence: String, selector: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_keystroke_message_includes_source() {
        let err = KeymapError::InvalidKeystroke {
            keystroke: "ctrl+ctrl+k".to_string(),
            source: KeystrokeError::DuplicateModifier("ctrl".to_string()),
        };
        let msg = err.to_string();
        assert!(msg.contains("ctrl+ctrl+k"));
        assert!(msg.contains("more than once"));
    }
}
