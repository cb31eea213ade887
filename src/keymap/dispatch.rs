//! Scope dispatch: choosing which binding runs for an event's target chain
//!
//! Dispatch is split in two steps. [`plan`] ranks the candidates and walks
//! the target chain while the engine is borrowed; [`DispatchPlan::run`]
//! invokes the command collaborator afterwards, so handlers are free to add
//! or remove bindings without disturbing an in-flight walk.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use super::binding::RegisteredBinding;
use super::layout::KeyEvent;
use super::selector::Selectors;

/// How many handlers may run for one resolved key sequence
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchPolicy {
    /// Run the single best binding at the innermost matching element
    #[default]
    FirstMatch,
    /// Run bindings in rank order until a handler reports it consumed the event
    VetoChain,
}

/// What a command handler is asked to run
#[derive(Debug)]
pub struct Invocation<'a, E> {
    pub command: &'a str,
    pub args: Option<&'a Value>,
    pub binding: &'a RegisteredBinding,
    /// Chain element whose scope matched
    pub element: &'a E,
    pub event: &'a KeyEvent,
}

/// Command collaborator: receives the winning command(s)
pub trait CommandHandler<E> {
    /// Execute and report whether the event was consumed
    ///
    /// The return value only matters under [`DispatchPolicy::VetoChain`].
    fn execute(&mut self, invocation: &Invocation<'_, E>) -> bool;
}

impl<E, F> CommandHandler<E> for F
where
    F: FnMut(&Invocation<'_, E>) -> bool,
{
    fn execute(&mut self, invocation: &Invocation<'_, E>) -> bool {
        self(invocation)
    }
}

/// Ranked bindings whose scope matched one chain element
#[derive(Debug, Clone)]
pub struct ElementMatches<E> {
    pub element: E,
    pub bindings: Vec<Arc<RegisteredBinding>>,
}

/// Result of running a plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchResult {
    Handled { command: String, insertion_id: u64 },
    Unhandled,
}

impl DispatchResult {
    pub fn is_handled(&self) -> bool {
        matches!(self, DispatchResult::Handled { .. })
    }
}

/// A snapshot of what to invoke, detached from the engine
#[derive(Debug, Clone)]
pub struct DispatchPlan<E> {
    policy: DispatchPolicy,
    event: KeyEvent,
    groups: Vec<ElementMatches<E>>,
}

impl<E> DispatchPlan<E> {
    pub fn event(&self) -> &KeyEvent {
        &self.event
    }

    /// Matching elements, innermost first
    pub fn groups(&self) -> &[ElementMatches<E>] {
        &self.groups
    }

    /// True when no element in the chain matched any candidate
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// The binding that would run first
    pub fn first(&self) -> Option<&Arc<RegisteredBinding>> {
        self.groups.first().and_then(|g| g.bindings.first())
    }

    /// Invoke the handler according to the plan's policy
    pub fn run<H>(self, handler: &mut H) -> DispatchResult
    where
        H: CommandHandler<E> + ?Sized,
    {
        for group in &self.groups {
            for binding in &group.bindings {
                let invocation = Invocation {
                    command: binding.command(),
                    args: binding.action().args.as_ref(),
                    binding,
                    element: &group.element,
                    event: &self.event,
                };
                tracing::debug!(
                    "dispatching `{}` from `{}` on `{}`",
                    binding.command(),
                    binding.sequence(),
                    binding.selector()
                );

                let consumed = handler.execute(&invocation);
                if self.policy == DispatchPolicy::FirstMatch || consumed {
                    return DispatchResult::Handled {
                        command: binding.command().to_string(),
                        insertion_id: binding.insertion_id(),
                    };
                }
            }
        }

        tracing::debug!("no handler consumed `{:?}`", self.event.code);
        DispatchResult::Unhandled
    }
}

/// Rank `candidates` and pair them with the chain elements they match
///
/// `chain` runs from the event target outward; its last element is the
/// boundary the caller listens on, and the walk never goes past it.
pub fn plan<S: Selectors>(
    mut candidates: Vec<Arc<RegisteredBinding>>,
    chain: &[S::Element],
    selectors: &S,
    policy: DispatchPolicy,
    event: &KeyEvent,
) -> DispatchPlan<S::Element> {
    candidates.sort_by(|a, b| a.precedence(b));

    let mut groups = Vec::new();
    for element in chain {
        let mut bindings: Vec<Arc<RegisteredBinding>> = candidates
            .iter()
            .filter(|b| selectors.matches(element, b.selector()))
            .cloned()
            .collect();
        if bindings.is_empty() {
            continue;
        }

        if policy == DispatchPolicy::FirstMatch {
            bindings.truncate(1);
            groups.push(ElementMatches {
                element: element.clone(),
                bindings,
            });
            break;
        }
        groups.push(ElementMatches {
            element: element.clone(),
            bindings,
        });
    }

    DispatchPlan {
        policy,
        event: event.clone(),
        groups,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keymap::binding::Action;
    use crate::keymap::layout::UsLayout;
    use crate::keymap::normalize::parse_sequence;
    use crate::keymap::selector::{CompoundSelectors, Element};
    use crate::keymap::types::{Modifiers, Platform};

    fn binding(selector: &str, command: &str, id: u64) -> Arc<RegisteredBinding> {
        let seq = parse_sequence("ctrl+s", &UsLayout, Platform::Other).unwrap();
        let specificity = CompoundSelectors.specificity_of(selector);
        Arc::new(RegisteredBinding::new(
            selector.to_string(),
            seq,
            Action::new(command),
            specificity,
            id,
        ))
    }

    fn chain() -> Vec<Element> {
        vec![
            Element::new("input").with_class("mini"),
            Element::new("div").with_class("editor"),
            Element::new("body"),
        ]
    }

    fn event() -> KeyEvent {
        KeyEvent::new("KeyS", Modifiers::CTRL)
    }

    fn plan_for(candidates: Vec<Arc<RegisteredBinding>>, policy: DispatchPolicy) -> DispatchPlan<Element> {
        plan(candidates, &chain(), &CompoundSelectors, policy, &event())
    }

    #[test]
    fn test_innermost_matching_element_wins() {
        let p = plan_for(
            vec![binding("body", "global", 0), binding(".editor", "editor", 1)],
            DispatchPolicy::FirstMatch,
        );
        assert_eq!(p.first().unwrap().command(), "editor");
        assert_eq!(p.groups().len(), 1);
    }

    #[test]
    fn test_higher_specificity_wins_at_same_element() {
        let p = plan_for(
            vec![binding("div.editor", "specific", 0), binding(".editor", "loose", 1)],
            DispatchPolicy::FirstMatch,
        );
        assert_eq!(p.first().unwrap().command(), "specific");
    }

    #[test]
    fn test_equal_specificity_prefers_newest() {
        let p = plan_for(
            vec![binding(".editor", "old", 0), binding(".editor", "new", 1)],
            DispatchPolicy::FirstMatch,
        );
        assert_eq!(p.first().unwrap().command(), "new");
    }

    #[test]
    fn test_no_match_is_noop() {
        let p = plan_for(vec![binding(".sidebar", "tree", 0)], DispatchPolicy::FirstMatch);
        assert!(p.is_empty());

        let mut calls = 0;
        let result = p.run(&mut |_: &Invocation<'_, Element>| {
            calls += 1;
            true
        });
        assert_eq!(result, DispatchResult::Unhandled);
        assert_eq!(calls, 0);
    }

    #[test]
    fn test_first_match_runs_exactly_one_handler() {
        let p = plan_for(
            vec![binding("*", "any", 0), binding(".editor", "editor", 1)],
            DispatchPolicy::FirstMatch,
        );

        let mut seen = Vec::new();
        let result = p.run(&mut |inv: &Invocation<'_, Element>| {
            seen.push(inv.command.to_string());
            false
        });
        assert_eq!(seen, vec!["any"]);
        assert!(result.is_handled());
    }

    #[test]
    fn test_veto_chain_continues_until_consumed() {
        let p = plan_for(
            vec![
                binding("input", "inner", 0),
                binding(".mini", "inner-class", 1),
                binding(".editor", "outer", 2),
            ],
            DispatchPolicy::VetoChain,
        );

        let mut seen = Vec::new();
        let result = p.run(&mut |inv: &Invocation<'_, Element>| {
            seen.push(inv.command.to_string());
            inv.command == "outer"
        });

        assert_eq!(seen, vec!["inner-class", "inner", "outer"]);
        assert_eq!(
            result,
            DispatchResult::Handled {
                command: "outer".to_string(),
                insertion_id: 2
            }
        );
    }

    #[test]
    fn test_veto_chain_all_declined() {
        let p = plan_for(vec![binding("*", "any", 0)], DispatchPolicy::VetoChain);
        // `*` matches every element up to and including the boundary
        assert_eq!(p.groups().len(), 3);

        let mut calls = 0;
        let result = p.run(&mut |_: &Invocation<'_, Element>| {
            calls += 1;
            false
        });
        assert_eq!(calls, 3);
        assert_eq!(result, DispatchResult::Unhandled);
    }

    #[test]
    fn test_walk_stops_at_boundary() {
        // Caller listens on the editor, so body is outside the chain
        let chain = &chain()[..2];
        let p = plan(
            vec![binding("body", "global", 0)],
            chain,
            &CompoundSelectors,
            DispatchPolicy::VetoChain,
            &event(),
        );
        assert!(p.is_empty());
    }
}
