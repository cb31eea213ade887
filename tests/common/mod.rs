//! Shared test helpers for integration tests
//!
//! Note: Functions may appear unused because each test file compiles separately.

#![allow(dead_code)]

use std::time::Duration;

use keyseq::keymap::{
    CompoundSelectors, Element, EngineSettings, Invocation, KeyEvent, Keymap, Modifiers, Platform,
    UsLayout,
};

pub const TIMEOUT: Duration = Duration::from_millis(1000);

/// Keymap with default settings, pinned to the non-mac platform
pub fn test_keymap() -> Keymap {
    test_keymap_with(EngineSettings::default())
}

pub fn test_keymap_with(settings: EngineSettings) -> Keymap {
    let settings = EngineSettings {
        platform: Platform::Other,
        ..settings
    };
    Keymap::new(UsLayout, CompoundSelectors, settings)
}

/// `input.mini < div.editor < div.pane < body`
pub fn mini_editor_chain() -> Vec<Element> {
    vec![
        Element::new("input").with_class("mini"),
        Element::new("div").with_class("editor"),
        Element::new("div").with_class("pane"),
        Element::new("body"),
    ]
}

pub fn editor_chain() -> Vec<Element> {
    mini_editor_chain().split_off(1)
}

pub fn key(code: &str) -> KeyEvent {
    KeyEvent::new(code, Modifiers::NONE)
}

pub fn ctrl(code: &str) -> KeyEvent {
    KeyEvent::new(code, Modifiers::CTRL)
}

/// Handler that records command names and consumes everything
#[derive(Default)]
pub struct Recorder {
    pub commands: Vec<String>,
}

impl Recorder {
    pub fn handle(&mut self) -> impl FnMut(&Invocation<'_, Element>) -> bool + '_ {
        move |inv: &Invocation<'_, Element>| {
            self.commands.push(inv.command.to_string());
            true
        }
    }
}
