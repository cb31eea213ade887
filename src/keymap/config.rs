//! YAML configuration parsing for keymaps
//!
//! Parses keymap.yaml files into engine settings and [`KeyBinding`]s.
//! Per-binding problems (bad selector, bad keystroke) are left for
//! registration to report, so one typo never discards a whole file.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;

use super::binding::{KeyBinding, Keys};
use super::dispatch::DispatchPolicy;
use super::error::KeymapError;
use super::pending::DEFAULT_CHORD_TIMEOUT_MS;
use super::registry::DuplicatePolicy;
use super::types::Platform;

/// Engine-wide settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// How long an ambiguous chord waits for another keystroke
    pub chord_timeout_ms: u64,
    pub dispatch_policy: DispatchPolicy,
    pub duplicates: DuplicatePolicy,
    /// Resolves `accel` and filters platform-specific bindings
    pub platform: Platform,
}

impl EngineSettings {
    pub fn chord_timeout(&self) -> Duration {
        Duration::from_millis(self.chord_timeout_ms)
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            chord_timeout_ms: DEFAULT_CHORD_TIMEOUT_MS,
            dispatch_policy: DispatchPolicy::default(),
            duplicates: DuplicatePolicy::default(),
            platform: Platform::current(),
        }
    }
}

/// Root structure of a keymap YAML file
#[derive(Debug, Deserialize)]
pub struct KeymapConfig {
    #[serde(default)]
    pub settings: EngineSettings,
    #[serde(default)]
    pub bindings: Vec<BindingConfig>,
}

/// Keys as written in YAML: one string or a list of keystrokes
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum KeysConfig {
    Text(String),
    List(Vec<String>),
}

/// A single binding entry from YAML
#[derive(Debug, Deserialize)]
pub struct BindingConfig {
    #[serde(default = "default_selector")]
    pub selector: String,
    pub keys: KeysConfig,
    #[serde(default)]
    pub command: String,
    #[serde(default)]
    pub args: Option<Value>,
    #[serde(default)]
    pub platform: Option<Platform>,
}

fn default_selector() -> String {
    "*".to_string()
}

impl From<BindingConfig> for KeyBinding {
    fn from(entry: BindingConfig) -> Self {
        let keys = match entry.keys {
            KeysConfig::Text(text) => Keys::Text(text),
            KeysConfig::List(parts) => Keys::List(parts),
        };
        let mut binding = KeyBinding::new(entry.selector, keys, entry.command);
        binding.action.args = entry.args;
        binding
    }
}

/// A parsed keymap file
#[derive(Debug)]
pub struct KeymapFile {
    pub settings: EngineSettings,
    /// Bindings for the configured platform, in file order
    pub bindings: Vec<KeyBinding>,
}

/// Load a keymap from a YAML file
pub fn load_keymap_file(path: &Path) -> Result<KeymapFile, KeymapError> {
    let content = std::fs::read_to_string(path)?;
    let file = parse_keymap_yaml(&content)?;
    tracing::info!(
        "loaded keymap {} ({} bindings)",
        path.display(),
        file.bindings.len()
    );
    Ok(file)
}

/// Parse a keymap from a YAML string
pub fn parse_keymap_yaml(yaml: &str) -> Result<KeymapFile, KeymapError> {
    let config: KeymapConfig = serde_yaml::from_str(yaml)?;
    let platform = config.settings.platform;

    let bindings = config
        .bindings
        .into_iter()
        // Skip if platform-specific and doesn't match the configured platform
        .filter(|entry| entry.platform.is_none_or(|p| p == platform))
        .map(KeyBinding::from)
        .collect();

    Ok(KeymapFile {
        settings: config.settings,
        bindings,
    })
}
