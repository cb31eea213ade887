//! keyseq - scoped keyboard shortcut resolution
//!
//! This crate turns key-down events into commands: canonical keystrokes,
//! multi-key chords with an ambiguity timeout, and selector-scoped bindings
//! ranked by specificity and recency.

pub mod cli;
pub mod keymap;
pub mod tracing;

// Re-export commonly used types
pub use keymap::{
    Element, EngineSettings, KeyBinding, KeyEvent, Keymap, KeymapError, Keystroke, Modifiers,
};
