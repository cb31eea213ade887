//! Scoped keyboard shortcut resolution
//!
//! This module resolves key-down events into commands:
//! - Normalizes keystrokes so `Shift+Ctrl+X` and `ctrl+shift+x` are equal
//! - Resolves `accel` to Cmd on macOS and Ctrl elsewhere
//! - Supports multi-key sequences/chords with an ambiguity timeout
//! - Scopes bindings with selectors, most specific and most recent first
//! - Loads keymaps from YAML config files
//!
//! # Architecture
//!
//! ```text
//! KeyEvent → Keystroke → pending buffer → match_sequence() → PendingChord
//!          → dispatch::plan() → DispatchPlan::run() → CommandHandler
//! ```
//!
//! # Usage
//!
//! ```ignore
//! let mut keymap = Keymap::with_defaults();
//! keymap.add_bindings(vec![KeyBinding::new(".editor", "ctrl+k ctrl+l", "editor:lower-case")]);
//!
//! let chain = [Element::new("div").with_class("editor"), Element::new("body")];
//! let consumed = keymap.handle_key_event_with(&event, &chain, Instant::now(), &mut handler);
//!
//! // Later, from the event loop:
//! if keymap.next_deadline().is_some_and(|d| d <= Instant::now()) {
//!     keymap.poll_timeout_with(Instant::now(), &mut handler);
//! }
//! ```

mod binding;
mod config;
mod defaults;
pub mod dispatch;
mod error;
#[allow(clippy::module_inception)]
mod keymap;
mod layout;
mod matcher;
mod normalize;
mod pending;
mod registry;
mod selector;
mod types;

pub use binding::{Action, KeyBinding, Keys, RegisteredBinding};
pub use config::{
    load_keymap_file, parse_keymap_yaml, BindingConfig, EngineSettings, KeymapConfig, KeymapFile,
    KeysConfig,
};
pub use defaults::{load_default_keymap, DEFAULT_KEYMAP_YAML};
pub use dispatch::{
    CommandHandler, DispatchPlan, DispatchPolicy, DispatchResult, ElementMatches, Invocation,
};
pub use error::{KeymapError, KeystrokeError};
pub use keymap::{KeyOutcome, Keymap};
pub use layout::{KeyEvent, KeyboardLayout, UsLayout};
pub use matcher::{match_sequence, SequenceMatch};
pub use normalize::{keystroke_from_event, normalize_keystroke, parse_keystrokes, parse_sequence};
pub use pending::{ChordTimer, Expiry, Fallback, PendingChord, Transition, DEFAULT_CHORD_TIMEOUT_MS};
pub use registry::{BindingHandle, BindingRegistry, DuplicatePolicy, Registration};
pub use selector::{CompoundSelectors, Element, Selectors};
pub use types::{KeySequence, Keystroke, Modifiers, Platform};
