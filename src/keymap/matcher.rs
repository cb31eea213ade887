//! Prefix matching of buffered keystrokes against registered bindings

use std::sync::Arc;

use super::binding::RegisteredBinding;
use super::types::Keystroke;

/// Bindings partitioned against the keystrokes typed so far
#[derive(Debug, Default, Clone)]
pub struct SequenceMatch {
    /// Sequence fully consumed by the pending keystrokes
    pub exact: Vec<Arc<RegisteredBinding>>,
    /// Sequence strictly extends the pending keystrokes
    pub partial: Vec<Arc<RegisteredBinding>>,
}

impl SequenceMatch {
    pub fn is_empty(&self) -> bool {
        self.exact.is_empty() && self.partial.is_empty()
    }

    pub fn has_exact(&self) -> bool {
        !self.exact.is_empty()
    }

    pub fn has_partial(&self) -> bool {
        !self.partial.is_empty()
    }
}

/// Partition `bindings` into exact and partial matches of `pending`
///
/// Input order is preserved within each group.
pub fn match_sequence<'a, I>(bindings: I, pending: &[Keystroke]) -> SequenceMatch
where
    I: IntoIterator<Item = &'a Arc<RegisteredBinding>>,
{
    let mut result = SequenceMatch::default();

    for binding in bindings {
        let sequence = binding.sequence();
        if sequence.len() < pending.len() || !sequence.starts_with(pending) {
            continue;
        }

        if sequence.len() == pending.len() {
            result.exact.push(Arc::clone(binding));
        } else {
            result.partial.push(Arc::clone(binding));
        }
    }

    tracing::trace!(
        "matched {} keystroke(s): {} exact, {} partial",
        pending.len(),
        result.exact.len(),
        result.partial.len()
    );
    result
}
