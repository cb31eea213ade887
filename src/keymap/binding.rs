//! Keybindings: what callers register, and what the registry keeps

use std::cmp::Ordering;

use serde_json::Value;

use super::types::{KeySequence, Platform};

/// The command a binding triggers
#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    pub command: String,
    /// Optional payload handed to the command collaborator
    pub args: Option<Value>,
}

impl Action {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            args: None,
        }
    }
}

/// The keys of a binding, before or after normalization
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Keys {
    /// Whitespace-separated keystrokes, e.g. `"ctrl+k ctrl+l"`
    Text(String),
    /// One keystroke per entry
    List(Vec<String>),
    /// Already normalized
    Sequence(KeySequence),
}

impl Keys {
    /// Human-readable form for diagnostics
    pub fn describe(&self) -> String {
        match self {
            Keys::Text(text) => text.clone(),
            Keys::List(parts) => parts.join(" "),
            Keys::Sequence(seq) => seq.to_string(),
        }
    }
}

impl From<&str> for Keys {
    fn from(text: &str) -> Self {
        Keys::Text(text.to_string())
    }
}

impl From<String> for Keys {
    fn from(text: String) -> Self {
        Keys::Text(text)
    }
}

impl From<Vec<&str>> for Keys {
    fn from(parts: Vec<&str>) -> Self {
        Keys::List(parts.into_iter().map(String::from).collect())
    }
}

impl From<KeySequence> for Keys {
    fn from(seq: KeySequence) -> Self {
        Keys::Sequence(seq)
    }
}

/// A binding as supplied by the caller; validated on registration
#[derive(Debug, Clone, PartialEq)]
pub struct KeyBinding {
    /// Scope selector restricting where the binding applies
    pub selector: String,
    pub keys: Keys,
    pub action: Action,
}

impl KeyBinding {
    pub fn new(selector: impl Into<String>, keys: impl Into<Keys>, command: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            keys: keys.into(),
            action: Action::new(command),
        }
    }

    /// Attach an argument payload (builder pattern)
    pub fn with_args(mut self, args: Value) -> Self {
        self.action.args = Some(args);
        self
    }
}

/// A validated binding owned by the registry
///
/// Immutable once created. `specificity` is computed once from the selector
/// and `insertion_id` is never reused within one registry.
#[derive(Debug, Clone, PartialEq)]
pub struct RegisteredBinding {
    selector: String,
    sequence: KeySequence,
    action: Action,
    specificity: u32,
    insertion_id: u64,
}

impl RegisteredBinding {
    pub(crate) fn new(
        selector: String,
        sequence: KeySequence,
        action: Action,
        specificity: u32,
        insertion_id: u64,
    ) -> Self {
        Self {
            selector,
            sequence,
            action,
            specificity,
            insertion_id,
        }
    }

    pub fn selector(&self) -> &str {
        &self.selector
    }

    pub fn sequence(&self) -> &KeySequence {
        &self.sequence
    }

    pub fn action(&self) -> &Action {
        &self.action
    }

    pub fn command(&self) -> &str {
        &self.action.command
    }

    pub fn specificity(&self) -> u32 {
        self.specificity
    }

    pub fn insertion_id(&self) -> u64 {
        self.insertion_id
    }

    /// Dispatch precedence: higher specificity first, then newer bindings
    pub fn precedence(&self, other: &Self) -> Ordering {
        other
            .specificity
            .cmp(&self.specificity)
            .then_with(|| other.insertion_id.cmp(&self.insertion_id))
    }

    /// Get display string for this keybinding
    pub fn display_string(&self, platform: Platform) -> String {
        self.sequence.display_string(platform)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keymap::layout::UsLayout;
    use crate::keymap::normalize::parse_sequence;

    fn registered(selector: &str, specificity: u32, insertion_id: u64) -> RegisteredBinding {
        let seq = parse_sequence("ctrl+s", &UsLayout, Platform::Other).unwrap();
        RegisteredBinding::new(
            selector.to_string(),
            seq,
            Action::new("save"),
            specificity,
            insertion_id,
        )
    }

    #[test]
    fn test_builder_attaches_args() {
        let binding = KeyBinding::new(".editor", "ctrl+k ctrl+l", "editor:lower-case")
            .with_args(serde_json::json!({ "whole_word": true }));

        assert_eq!(binding.keys, Keys::Text("ctrl+k ctrl+l".to_string()));
        assert_eq!(binding.action.command, "editor:lower-case");
        assert_eq!(binding.action.args.unwrap()["whole_word"], true);
    }

    #[test]
    fn test_keys_from_list() {
        let keys: Keys = vec!["ctrl+k", "ctrl+l"].into();
        assert_eq!(keys.describe(), "ctrl+k ctrl+l");
    }

    #[test]
    fn test_precedence_orders_by_specificity_then_recency() {
        let mut bindings = vec![
            registered("*", 0, 1),
            registered(".editor", 10, 2),
            registered("*", 0, 3),
            registered("#main", 100, 0),
        ];
        bindings.sort_by(RegisteredBinding::precedence);

        let order: Vec<u64> = bindings.iter().map(|b| b.insertion_id()).collect();
        assert_eq!(order, vec![0, 2, 3, 1]);
    }
}
