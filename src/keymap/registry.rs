//! Binding registry: validated bindings with specificity and insertion order

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Deserialize;

use super::binding::{KeyBinding, Keys, RegisteredBinding};
use super::error::{KeymapError, KeystrokeError};
use super::layout::KeyboardLayout;
use super::normalize::{parse_keystrokes, parse_sequence};
use super::selector::Selectors;
use super::types::{KeySequence, Platform};

static NEXT_REGISTRY_ID: AtomicU64 = AtomicU64::new(1);

/// What to do when a sequence is registered twice on the same selector
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Keep both; the newer one wins ties at dispatch time
    #[default]
    Append,
    /// Drop the newcomer with a diagnostic
    Reject,
}

/// Removes exactly the bindings accepted by one `add` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingHandle {
    registry_id: u64,
    ids: Vec<u64>,
}

impl BindingHandle {
    /// Insertion ids of the accepted bindings
    pub fn ids(&self) -> &[u64] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Result of a batch registration
#[derive(Debug)]
pub struct Registration {
    pub handle: BindingHandle,
    /// One entry per dropped binding
    pub diagnostics: Vec<KeymapError>,
}

/// Owns every registered binding of one engine
#[derive(Debug)]
pub struct BindingRegistry {
    id: u64,
    /// Registration order
    bindings: Vec<Arc<RegisteredBinding>>,
    next_insertion_id: u64,
    duplicates: DuplicatePolicy,
}

impl BindingRegistry {
    pub fn new(duplicates: DuplicatePolicy) -> Self {
        Self {
            id: NEXT_REGISTRY_ID.fetch_add(1, Ordering::Relaxed),
            bindings: Vec::new(),
            next_insertion_id: 0,
            duplicates,
        }
    }

    /// Validate and append a batch; invalid entries are dropped individually
    pub fn add<S: Selectors>(
        &mut self,
        bindings: Vec<KeyBinding>,
        layout: &dyn KeyboardLayout,
        selectors: &S,
        platform: Platform,
    ) -> Registration {
        let mut ids = Vec::with_capacity(bindings.len());
        let mut diagnostics = Vec::new();

        for binding in bindings {
            let validated = Self::validate(&binding, layout, selectors, platform)
                .and_then(|(selector, sequence)| self.check_duplicate(selector, sequence));

            match validated {
                Ok((selector, sequence)) => {
                    let insertion_id = self.next_insertion_id;
                    self.next_insertion_id += 1;

                    let specificity = selectors.specificity_of(&selector);
                    tracing::debug!(
                        "registered `{}` on `{}` -> {} (specificity {}, id {})",
                        sequence,
                        selector,
                        binding.action.command,
                        specificity,
                        insertion_id
                    );
                    self.bindings.push(Arc::new(RegisteredBinding::new(
                        selector,
                        sequence,
                        binding.action,
                        specificity,
                        insertion_id,
                    )));
                    ids.push(insertion_id);
                }
                Err(e) => {
                    tracing::warn!("dropping keybinding: {}", e);
                    diagnostics.push(e);
                }
            }
        }

        Registration {
            handle: BindingHandle {
                registry_id: self.id,
                ids,
            },
            diagnostics,
        }
    }

    fn validate<S: Selectors>(
        binding: &KeyBinding,
        layout: &dyn KeyboardLayout,
        selectors: &S,
        platform: Platform,
    ) -> Result<(String, KeySequence), KeymapError> {
        let command = binding.action.command.trim();
        if command.is_empty() {
            return Err(KeymapError::MissingCommand(binding.keys.describe()));
        }

        let selector = binding.selector.trim();
        if !selectors.is_valid_selector(selector) {
            return Err(KeymapError::InvalidSelector(binding.selector.clone()));
        }

        let sequence = match &binding.keys {
            Keys::Text(text) => parse_sequence(text, layout, platform),
            Keys::List(parts) => parse_keystrokes(parts, layout, platform),
            Keys::Sequence(seq) => Self::check_keycaps(seq, layout).map(|()| seq.clone()),
        }
        .map_err(|e| match e {
            KeymapError::EmptySequence(_) => KeymapError::EmptySequence(command.to_string()),
            other => other,
        })?;

        Ok((selector.to_string(), sequence))
    }

    /// Pre-built sequences skip normalization, so their keycaps are checked here
    fn check_keycaps(sequence: &KeySequence, layout: &dyn KeyboardLayout) -> Result<(), KeymapError> {
        match sequence
            .keystrokes()
            .iter()
            .find(|k| !layout.is_valid_keycap(k.key()))
        {
            Some(bad) => Err(KeymapError::InvalidKeystroke {
                keystroke: bad.to_string(),
                source: KeystrokeError::UnknownKey(bad.key().to_string()),
            }),
            None => Ok(()),
        }
    }

    fn check_duplicate(
        &self,
        selector: String,
        sequence: KeySequence,
    ) -> Result<(String, KeySequence), KeymapError> {
        if self.duplicates == DuplicatePolicy::Reject
            && self
                .bindings
                .iter()
                .any(|b| b.selector() == selector && *b.sequence() == sequence)
        {
            return Err(KeymapError::DuplicateBinding {
                sequence: sequence.to_string(),
                selector,
            });
        }
        Ok((selector, sequence))
    }

    /// Remove the bindings captured by `handle`; returns how many were removed
    ///
    /// Idempotent. Handles from another registry remove nothing.
    pub fn remove(&mut self, handle: &BindingHandle) -> usize {
        if handle.registry_id != self.id {
            tracing::debug!("ignoring handle from registry {}", handle.registry_id);
            return 0;
        }

        let before = self.bindings.len();
        self.bindings
            .retain(|b| !handle.ids.contains(&b.insertion_id()));
        let removed = before - self.bindings.len();
        if removed > 0 {
            tracing::debug!("removed {} keybindings", removed);
        }
        removed
    }

    /// All live bindings in registration order
    pub fn bindings(&self) -> &[Arc<RegisteredBinding>] {
        &self.bindings
    }

    pub fn get(&self, insertion_id: u64) -> Option<&Arc<RegisteredBinding>> {
        // Insertion ids ascend with position
        self.bindings
            .binary_search_by_key(&insertion_id, |b| b.insertion_id())
            .ok()
            .map(|idx| &self.bindings[idx])
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl Default for BindingRegistry {
    fn default() -> Self {
        Self::new(DuplicatePolicy::default())
    }
}
