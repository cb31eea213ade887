//! Keymap engine: registry, pending chord state and dispatch for one UI root

use std::sync::Arc;
use std::time::Instant;

use super::binding::{KeyBinding, RegisteredBinding};
use super::config::EngineSettings;
use super::dispatch::{self, CommandHandler, DispatchPlan, DispatchResult};
use super::error::KeymapError;
use super::layout::{KeyEvent, KeyboardLayout, UsLayout};
use super::matcher::match_sequence;
use super::normalize::{keystroke_from_event, parse_sequence};
use super::pending::{Expiry, PendingChord, Transition};
use super::registry::{BindingHandle, BindingRegistry, Registration};
use super::selector::{CompoundSelectors, Selectors};
use super::types::KeySequence;

/// Result of handling one key event
#[derive(Debug)]
pub struct KeyOutcome<E> {
    /// Whether default key handling should be suppressed
    ///
    /// Provisional when `dispatch` holds a [`VetoChain`](super::DispatchPolicy::VetoChain) plan:
    /// the key is consumed only if [`DispatchPlan::run`] reports it handled.
    pub consumed: bool,
    /// An overdue timer fired before this key was processed
    pub timed_out: Option<DispatchPlan<E>>,
    /// Bindings resolved by this key
    pub dispatch: Option<DispatchPlan<E>>,
}

impl<E> KeyOutcome<E> {
    fn ignored(timed_out: Option<DispatchPlan<E>>) -> Self {
        Self {
            consumed: false,
            timed_out,
            dispatch: None,
        }
    }
}

/// The key-sequence resolution engine
///
/// Callers push key-down events in and run the returned dispatch plans; the
/// engine never subscribes to anything itself. Each instance owns its own
/// bindings and pending chord state.
pub struct Keymap<S: Selectors = CompoundSelectors> {
    registry: BindingRegistry,
    pending: PendingChord<S::Element>,
    layout: Box<dyn KeyboardLayout>,
    selectors: S,
    settings: EngineSettings,
}

impl Keymap<CompoundSelectors> {
    /// US layout, compound selectors, default settings
    pub fn with_defaults() -> Self {
        Self::new(UsLayout, CompoundSelectors, EngineSettings::default())
    }
}

impl<S: Selectors> Keymap<S> {
    pub fn new(layout: impl KeyboardLayout + 'static, selectors: S, settings: EngineSettings) -> Self {
        Self {
            registry: BindingRegistry::new(settings.duplicates),
            pending: PendingChord::new(settings.chord_timeout()),
            layout: Box::new(layout),
            selectors,
            settings,
        }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Register a batch; invalid entries come back as diagnostics
    pub fn add_bindings(&mut self, bindings: Vec<KeyBinding>) -> Registration {
        self.registry.add(
            bindings,
            self.layout.as_ref(),
            &self.selectors,
            self.settings.platform,
        )
    }

    /// Remove what one `add_bindings` call accepted; idempotent
    ///
    /// A removed binding never runs afterwards, even if it was remembered as
    /// the fallback of a pending chord.
    pub fn remove_bindings(&mut self, handle: &BindingHandle) -> usize {
        self.registry.remove(handle)
    }

    /// Resolve one key-down event against the target chain
    ///
    /// `chain` runs from the event target outward and ends at the element the
    /// caller listens on. Plans in the outcome are snapshots; run them once
    /// the engine borrow has ended.
    pub fn handle_key_event(
        &mut self,
        event: &KeyEvent,
        chain: &[S::Element],
        now: Instant,
    ) -> KeyOutcome<S::Element> {
        let timed_out = self.poll_timeout(now);

        let Some(keystroke) = keystroke_from_event(event, self.layout.as_ref()) else {
            tracing::trace!("no keycap for `{}`, ignoring", event.code);
            return KeyOutcome::ignored(timed_out);
        };

        let in_scope: Vec<Arc<RegisteredBinding>> = self
            .registry
            .bindings()
            .iter()
            .filter(|b| {
                chain
                    .iter()
                    .any(|element| self.selectors.matches(element, b.selector()))
            })
            .cloned()
            .collect();

        let transition = self
            .pending
            .advance(keystroke, event, chain, now, |buffer| match_sequence(&in_scope, buffer));

        match transition {
            Transition::Cleared => KeyOutcome::ignored(timed_out),
            Transition::Pending => KeyOutcome {
                consumed: true,
                timed_out,
                dispatch: None,
            },
            Transition::Dispatch(exact) => {
                let plan = dispatch::plan(
                    exact,
                    chain,
                    &self.selectors,
                    self.settings.dispatch_policy,
                    event,
                );
                KeyOutcome {
                    consumed: !plan.is_empty(),
                    timed_out,
                    dispatch: Some(plan).filter(|p| !p.is_empty()),
                }
            }
        }
    }

    /// Resolve an event and run whatever it dispatches
    ///
    /// Returns whether the key was consumed, as decided by the handlers when a
    /// plan ran.
    pub fn handle_key_event_with<H>(
        &mut self,
        event: &KeyEvent,
        chain: &[S::Element],
        now: Instant,
        handler: &mut H,
    ) -> bool
    where
        H: CommandHandler<S::Element> + ?Sized,
    {
        let outcome = self.handle_key_event(event, chain, now);
        if let Some(plan) = outcome.timed_out {
            plan.run(&mut *handler);
        }
        match outcome.dispatch {
            // Under a veto chain only the handlers know whether the key was used
            Some(plan) => plan.run(&mut *handler).is_handled(),
            None => outcome.consumed,
        }
    }

    /// Fire the ambiguity timer if it is due
    ///
    /// Returns the remembered exact match, re-resolved against the current
    /// registry, dispatched with the event that produced it.
    pub fn poll_timeout(&mut self, now: Instant) -> Option<DispatchPlan<S::Element>> {
        let fallback = match self.pending.expire(now) {
            Expiry::NotDue | Expiry::Cleared => return None,
            Expiry::Fallback(fallback) => fallback,
        };

        let live: Vec<Arc<RegisteredBinding>> = fallback
            .binding_ids
            .iter()
            .filter_map(|id| self.registry.get(*id).cloned())
            .collect();
        if live.is_empty() {
            tracing::debug!("remembered bindings were removed, nothing to dispatch");
            return None;
        }

        let plan = dispatch::plan(
            live,
            &fallback.chain,
            &self.selectors,
            self.settings.dispatch_policy,
            &fallback.event,
        );
        (!plan.is_empty()).then_some(plan)
    }

    /// Fire the timer if due and run the result
    pub fn poll_timeout_with<H>(&mut self, now: Instant, handler: &mut H) -> Option<DispatchResult>
    where
        H: CommandHandler<S::Element> + ?Sized,
    {
        self.poll_timeout(now).map(|plan| plan.run(handler))
    }

    /// When the caller should next call [`Self::poll_timeout`]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.deadline()
    }

    /// Drop any pending chord and cancel the timer
    pub fn cancel_pending(&mut self) {
        self.pending.clear();
    }

    /// Check if any chord is in progress
    pub fn is_pending(&self) -> bool {
        self.pending.is_pending()
    }

    /// Get the pending chord keystrokes (for status bar display)
    pub fn pending_display(&self) -> Option<String> {
        if !self.pending.is_pending() {
            return None;
        }
        Some(
            self.pending
                .buffer()
                .iter()
                .map(|k| k.display_string(self.settings.platform))
                .collect::<Vec<_>>()
                .join(" "),
        )
    }

    /// All live bindings in registration order
    pub fn bindings(&self) -> &[Arc<RegisteredBinding>] {
        self.registry.bindings()
    }

    fn parse(&self, sequence_text: &str) -> Result<KeySequence, KeymapError> {
        parse_sequence(sequence_text, self.layout.as_ref(), self.settings.platform)
    }

    /// Whether `sequence_text` is bound, optionally on exactly `scope`
    pub fn has_binding(&self, sequence_text: &str, scope: Option<&str>) -> bool {
        let Ok(sequence) = self.parse(sequence_text) else {
            return false;
        };
        self.bindings()
            .iter()
            .any(|b| *b.sequence() == sequence && in_scope(b, scope))
    }

    /// Bindings that run `command`, optionally on exactly `scope`
    pub fn bindings_for(&self, command: &str, scope: Option<&str>) -> Vec<Arc<RegisteredBinding>> {
        self.bindings()
            .iter()
            .filter(|b| b.command() == command && in_scope(b, scope))
            .cloned()
            .collect()
    }

    /// Get display string for a command's most recent keybinding
    pub fn display_for(&self, command: &str) -> Option<String> {
        self.bindings()
            .iter()
            .rev()
            .find(|b| b.command() == command)
            .map(|b| b.display_string(self.settings.platform))
    }

    /// Bindings equal to `sequence_text`, or a prefix or extension of it
    pub fn conflicts_with(&self, sequence_text: &str) -> Result<Vec<Arc<RegisteredBinding>>, KeymapError> {
        let sequence = self.parse(sequence_text)?;
        let keys = sequence.keystrokes();
        Ok(self
            .bindings()
            .iter()
            .filter(|b| b.sequence().starts_with(keys) || keys.starts_with(b.sequence().keystrokes()))
            .cloned()
            .collect())
    }
}

fn in_scope(binding: &RegisteredBinding, scope: Option<&str>) -> bool {
    scope.is_none_or(|s| binding.selector() == s.trim())
}

impl Default for Keymap<CompoundSelectors> {
    fn default() -> Self {
        Self::with_defaults()
    }
}
