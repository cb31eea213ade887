//! Pending-chord state machine
//!
//! Holds the keystrokes typed so far and at most one ambiguous exact match
//! waiting for the chord timeout. States:
//!
//! ```text
//! Idle ──key──▶ Pending ──key (exact, no partial)──▶ Idle + dispatch
//!                  │  ▲
//!                  │  └──key (partial)── re-arm timer
//!                  ├──key (nothing)────▶ Idle
//!                  └──timer───────────▶ Idle + dispatch remembered exact (if any)
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use super::binding::RegisteredBinding;
use super::layout::KeyEvent;
use super::matcher::SequenceMatch;
use super::types::Keystroke;

/// Reference ambiguity window
pub const DEFAULT_CHORD_TIMEOUT_MS: u64 = 1000;

/// The single ambiguity timer of an engine
///
/// Modelled as a deadline the caller's event loop polls. Arming always
/// cancels the previous deadline first.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ChordTimer {
    deadline: Option<Instant>,
}

impl ChordTimer {
    pub fn arm(&mut self, now: Instant, timeout: Duration) {
        self.cancel();
        self.deadline = Some(now + timeout);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_due(&self, now: Instant) -> bool {
        self.deadline.is_some_and(|deadline| now >= deadline)
    }
}

/// An exact match remembered while a longer chord is still possible
#[derive(Debug, Clone)]
pub struct Fallback<E> {
    /// Insertion ids; resolved again on fire so removed bindings drop out
    pub binding_ids: Vec<u64>,
    /// The event that produced the match
    pub event: KeyEvent,
    pub chain: Vec<E>,
}

/// Outcome of feeding one keystroke to the controller
#[derive(Debug)]
pub enum Transition {
    /// Nothing matched; state is back to idle and the key is not consumed
    Cleared,
    /// Exact matches with no longer candidates; dispatch them now
    Dispatch(Vec<Arc<RegisteredBinding>>),
    /// A longer chord is still possible; the key is consumed
    Pending,
}

/// Outcome of polling the timer
#[derive(Debug)]
pub enum Expiry<E> {
    NotDue,
    /// Timed out with only partial matches pending
    Cleared,
    /// Timed out with a remembered exact match to dispatch
    Fallback(Fallback<E>),
}

/// Owns the pending keystroke buffer, the remembered exact set and the timer
#[derive(Debug)]
pub struct PendingChord<E> {
    buffer: Vec<Keystroke>,
    fallback: Option<Fallback<E>>,
    timer: ChordTimer,
    timeout: Duration,
}

impl<E: Clone> PendingChord<E> {
    pub fn new(timeout: Duration) -> Self {
        Self {
            buffer: Vec::new(),
            fallback: None,
            timer: ChordTimer::default(),
            timeout,
        }
    }

    /// Append `keystroke`, match the buffer and move to the next state
    pub fn advance<F>(
        &mut self,
        keystroke: Keystroke,
        event: &KeyEvent,
        chain: &[E],
        now: Instant,
        matcher: F,
    ) -> Transition
    where
        F: FnOnce(&[Keystroke]) -> SequenceMatch,
    {
        self.buffer.push(keystroke);
        let SequenceMatch { exact, partial } = matcher(&self.buffer);

        if partial.is_empty() {
            let had_pending = self.buffer.len() > 1;
            self.clear();
            if exact.is_empty() {
                if had_pending {
                    tracing::debug!("chord abandoned, no binding continues it");
                }
                return Transition::Cleared;
            }
            return Transition::Dispatch(exact);
        }

        if !exact.is_empty() {
            self.fallback = Some(Fallback {
                binding_ids: exact.iter().map(|b| b.insertion_id()).collect(),
                event: event.clone(),
                chain: chain.to_vec(),
            });
        }
        self.timer.arm(now, self.timeout);
        tracing::debug!(
            "chord pending after `{}` ({} longer candidate(s), fallback: {})",
            self.display(),
            partial.len(),
            self.fallback.is_some()
        );
        Transition::Pending
    }

    /// Fire the timer if its deadline has passed
    pub fn expire(&mut self, now: Instant) -> Expiry<E> {
        if !self.timer.is_due(now) {
            return Expiry::NotDue;
        }

        let fallback = self.fallback.take();
        self.clear();
        match fallback {
            Some(fallback) => {
                tracing::debug!("chord timed out, dispatching remembered exact match");
                Expiry::Fallback(fallback)
            }
            None => {
                tracing::debug!("chord timed out with no exact match");
                Expiry::Cleared
            }
        }
    }

    /// Drop all pending state and cancel the timer
    pub fn clear(&mut self) {
        self.timer.cancel();
        self.buffer.clear();
        self.fallback = None;
    }

    pub fn is_pending(&self) -> bool {
        !self.buffer.is_empty()
    }

    pub fn buffer(&self) -> &[Keystroke] {
        &self.buffer
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.timer.deadline()
    }

    pub fn has_fallback(&self) -> bool {
        self.fallback.is_some()
    }

    fn display(&self) -> String {
        self.buffer
            .iter()
            .map(Keystroke::canonical)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keymap::binding::Action;
    use crate::keymap::layout::UsLayout;
    use crate::keymap::normalize::{normalize_keystroke, parse_sequence};
    use crate::keymap::types::{Modifiers, Platform};

    const TIMEOUT: Duration = Duration::from_millis(DEFAULT_CHORD_TIMEOUT_MS);

    fn stroke(raw: &str) -> Keystroke {
        normalize_keystroke(raw, &UsLayout, Platform::Other).unwrap()
    }

    fn binding(keys: &str, id: u64) -> Arc<RegisteredBinding> {
        let seq = parse_sequence(keys, &UsLayout, Platform::Other).unwrap();
        Arc::new(RegisteredBinding::new("*".into(), seq, Action::new(keys), 0, id))
    }

    fn event() -> KeyEvent {
        KeyEvent::new("KeyA", Modifiers::NONE)
    }

    fn result(exact: Vec<Arc<RegisteredBinding>>, partial: Vec<Arc<RegisteredBinding>>) -> SequenceMatch {
        SequenceMatch { exact, partial }
    }

    #[test]
    fn test_timer_arm_replaces_deadline() {
        let now = Instant::now();
        let mut timer = ChordTimer::default();
        timer.arm(now, TIMEOUT);
        timer.arm(now + Duration::from_millis(500), TIMEOUT);

        assert!(!timer.is_due(now + TIMEOUT));
        assert!(timer.is_due(now + Duration::from_millis(1500)));

        timer.cancel();
        assert!(!timer.is_armed());
        assert!(!timer.is_due(now + Duration::from_secs(10)));
    }

    #[test]
    fn test_no_candidates_clears() {
        let mut pending: PendingChord<()> = PendingChord::new(TIMEOUT);
        let t = pending.advance(stroke("a"), &event(), &[()], Instant::now(), |_| SequenceMatch::default());
        assert!(matches!(t, Transition::Cleared));
        assert!(!pending.is_pending());
        assert!(pending.deadline().is_none());
    }

    #[test]
    fn test_exact_without_partial_dispatches() {
        let mut pending: PendingChord<()> = PendingChord::new(TIMEOUT);
        let t = pending.advance(stroke("a"), &event(), &[()], Instant::now(), |_| {
            result(vec![binding("a", 0)], vec![])
        });
        assert!(matches!(t, Transition::Dispatch(ref list) if list.len() == 1));
        assert!(!pending.is_pending());
    }

    #[test]
    fn test_partial_arms_timer_and_remembers_exact() {
        let now = Instant::now();
        let mut pending: PendingChord<()> = PendingChord::new(TIMEOUT);
        let t = pending.advance(stroke("a"), &event(), &[()], now, |_| {
            result(vec![binding("a", 0)], vec![binding("a b", 1)])
        });

        assert!(matches!(t, Transition::Pending));
        assert!(pending.has_fallback());
        assert_eq!(pending.deadline(), Some(now + TIMEOUT));
        assert!(matches!(pending.expire(now), Expiry::NotDue));

        match pending.expire(now + TIMEOUT) {
            Expiry::Fallback(fallback) => assert_eq!(fallback.binding_ids, vec![0]),
            other => panic!("expected fallback, got {:?}", other),
        }
        assert!(!pending.is_pending());
        assert!(pending.deadline().is_none());
    }

    #[test]
    fn test_pure_partial_times_out_without_dispatch() {
        let now = Instant::now();
        let mut pending: PendingChord<()> = PendingChord::new(TIMEOUT);
        pending.advance(stroke("ctrl+k"), &event(), &[()], now, |_| {
            result(vec![], vec![binding("ctrl+k ctrl+l", 0)])
        });

        assert!(matches!(pending.expire(now + TIMEOUT), Expiry::Cleared));
        assert!(!pending.is_pending());
    }

    #[test]
    fn test_partial_without_exact_keeps_older_fallback() {
        let now = Instant::now();
        let mut pending: PendingChord<()> = PendingChord::new(TIMEOUT);
        pending.advance(stroke("a"), &event(), &[()], now, |_| {
            result(vec![binding("a", 0)], vec![binding("a b c", 1)])
        });
        pending.advance(stroke("b"), &event(), &[()], now, |buffer| {
            assert_eq!(buffer.len(), 2);
            result(vec![], vec![binding("a b c", 1)])
        });

        assert!(pending.has_fallback());
        assert_eq!(pending.buffer().len(), 2);
    }

    #[test]
    fn test_clear_cancels_everything() {
        let mut pending: PendingChord<()> = PendingChord::new(TIMEOUT);
        pending.advance(stroke("a"), &event(), &[()], Instant::now(), |_| {
            result(vec![binding("a", 0)], vec![binding("a b", 1)])
        });
        pending.clear();

        assert!(!pending.is_pending());
        assert!(!pending.has_fallback());
        assert!(pending.deadline().is_none());
    }
}
