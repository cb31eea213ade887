//! Keymap file loading and registration diagnostics

mod common;

use std::io::Write;
use std::time::Instant;

use common::*;
use keyseq::keymap::{
    load_default_keymap, load_keymap_file, DispatchPolicy, DuplicatePolicy, KeyBinding,
    KeymapError, KeystrokeError,
};

fn write_keymap(yaml: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".yaml")
        .tempfile()
        .unwrap();
    file.write_all(yaml.as_bytes()).unwrap();
    file
}

#[test]
fn test_load_keymap_file() {
    let file = write_keymap(
        r#"
settings:
  chord_timeout_ms: 500
  dispatch_policy: veto_chain
bindings:
  - selector: ".editor"
    keys: "ctrl+k ctrl+l"
    command: editor:lower-case
  - keys: ["escape"]
    command: core:cancel
"#,
    );

    let keymap_file = load_keymap_file(file.path()).unwrap();
    assert_eq!(keymap_file.settings.chord_timeout_ms, 500);
    assert_eq!(keymap_file.settings.dispatch_policy, DispatchPolicy::VetoChain);
    assert_eq!(keymap_file.bindings.len(), 2);

    let mut keymap = test_keymap_with(keymap_file.settings);
    let reg = keymap.add_bindings(keymap_file.bindings);
    assert_eq!(reg.handle.len(), 2);
    assert!(keymap.has_binding("Ctrl+K Ctrl+L", Some(".editor")));
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_keymap_file(&dir.path().join("missing.yaml")).unwrap_err();
    assert!(matches!(err, KeymapError::Io(_)));
}

#[test]
fn test_bad_entries_become_diagnostics() {
    let file = write_keymap(
        r#"
bindings:
  - selector: ".editor"
    keys: "ctrl+s"
    command: core:save
  - selector: "div > p"
    keys: "ctrl+p"
    command: nope
  - keys: "ctrl+shift+ctrl+x"
    command: nope
  - keys: "ctrl+q"
  - keys: "ctrl+"
    command: nope
"#,
    );

    let keymap_file = load_keymap_file(file.path()).unwrap();
    let mut keymap = test_keymap();
    let reg = keymap.add_bindings(keymap_file.bindings);

    assert_eq!(reg.handle.len(), 1);
    assert_eq!(reg.diagnostics.len(), 4);
    assert!(matches!(reg.diagnostics[0], KeymapError::InvalidSelector(_)));
    assert!(matches!(
        reg.diagnostics[1],
        KeymapError::InvalidKeystroke {
            source: KeystrokeError::DuplicateModifier(_),
            ..
        }
    ));
    assert!(matches!(reg.diagnostics[2], KeymapError::MissingCommand(_)));
    assert!(matches!(
        reg.diagnostics[3],
        KeymapError::InvalidKeystroke {
            source: KeystrokeError::EmptyToken(_),
            ..
        }
    ));

    // The one good binding still works
    let mut recorder = Recorder::default();
    keymap.handle_key_event_with(&ctrl("KeyS"), &editor_chain(), Instant::now(), &mut recorder.handle());
    assert_eq!(recorder.commands, vec!["core:save"]);
}

#[test]
fn test_reject_duplicates_from_settings() {
    let file = write_keymap(
        r#"
settings:
  duplicates: reject
bindings:
  - selector: ".editor"
    keys: "ctrl+d"
    command: editor:duplicate-line
  - selector: " .editor "
    keys: "Ctrl+D"
    command: editor:select-next
"#,
    );

    let keymap_file = load_keymap_file(file.path()).unwrap();
    assert_eq!(keymap_file.settings.duplicates, DuplicatePolicy::Reject);

    let mut keymap = test_keymap_with(keymap_file.settings);
    let reg = keymap.add_bindings(keymap_file.bindings);
    assert_eq!(reg.handle.len(), 1);
    assert!(matches!(reg.diagnostics[0], KeymapError::DuplicateBinding { .. }));
}

#[test]
fn test_append_duplicates_newest_wins() {
    let mut keymap = test_keymap();
    let reg = keymap.add_bindings(vec![
        KeyBinding::new(".editor", "ctrl+d", "editor:duplicate-line"),
        KeyBinding::new(".editor", "ctrl+d", "editor:select-next"),
    ]);
    assert!(reg.diagnostics.is_empty());

    let outcome = keymap.handle_key_event(&ctrl("KeyD"), &editor_chain(), Instant::now());
    assert_eq!(outcome.dispatch.unwrap().first().unwrap().command(), "editor:select-next");
}

#[test]
fn test_default_keymap_registers_cleanly() {
    let defaults = load_default_keymap();
    let mut keymap = test_keymap_with(defaults.settings);
    let reg = keymap.add_bindings(defaults.bindings);

    assert!(reg.diagnostics.is_empty(), "{:?}", reg.diagnostics);
    assert!(!keymap.bindings_for("core:save", None).is_empty());
    assert!(!keymap.bindings_for("tree:select-first", Some(".tree-view")).is_empty());
}
