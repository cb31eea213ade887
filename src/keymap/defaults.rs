//! Default keybindings
//!
//! The default keymap ships as keymap.yaml at the project root and is
//! compiled into the binary.

use super::config::{parse_keymap_yaml, EngineSettings, KeymapFile};

/// Default keymap YAML embedded at compile time
pub const DEFAULT_KEYMAP_YAML: &str = include_str!("../../keymap.yaml");

/// Parse the embedded default keymap
///
/// Falls back to an empty keymap with default settings if the embedded YAML
/// fails to parse.
pub fn load_default_keymap() -> KeymapFile {
    match parse_keymap_yaml(DEFAULT_KEYMAP_YAML) {
        Ok(file) => {
            tracing::info!("loaded embedded default keymap ({} bindings)", file.bindings.len());
            file
        }
        Err(e) => {
            tracing::warn!("failed to parse embedded keymap: {}", e);
            KeymapFile {
                settings: EngineSettings::default(),
                bindings: Vec::new(),
            }
        }
    }
}
