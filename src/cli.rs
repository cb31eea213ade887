//! Command-line interface for replaying key scripts against a keymap
//!
//! Supports:
//! - `replay`: feed a script of key presses and waits through the engine
//! - `check`: register a keymap and report rejected bindings and prefix conflicts
//!
//! Script format, one step per line (`#` starts a comment):
//!
//! ```text
//! press ctrl+k at div.editor < body
//! wait 1200
//! press ctrl+l
//! ```
//!
//! Elements after `at` run from the event target outward; without `at` the
//! chain is just `body`.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand, ValueEnum};
use serde_json::Value;
use thiserror::Error;

use crate::keymap::{
    normalize_keystroke, DispatchPolicy, EngineSettings, Element, Invocation, KeyEvent, Keymap,
    KeystrokeError, Platform, RegisteredBinding, UsLayout,
};

/// Replay key sequences against a keymap
#[derive(Parser, Debug)]
#[command(name = "keyseq", version, about = "Replay key sequences against a keymap")]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: CliCommand,

    /// Override the keymap's dispatch policy
    #[arg(long, global = true, value_enum)]
    pub policy: Option<PolicyArg>,

    /// Override the chord timeout in milliseconds
    #[arg(long, global = true, value_name = "MS")]
    pub timeout_ms: Option<u64>,

    /// Also write debug logs to this file
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum CliCommand {
    /// Replay a script and print every dispatched command
    Replay {
        #[arg(value_name = "KEYMAP")]
        keymap: PathBuf,
        #[arg(value_name = "SCRIPT")]
        script: PathBuf,
    },
    /// Register a keymap and print diagnostics and conflicts
    Check {
        #[arg(value_name = "KEYMAP")]
        keymap: PathBuf,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum PolicyArg {
    FirstMatch,
    VetoChain,
}

impl From<PolicyArg> for DispatchPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::FirstMatch => DispatchPolicy::FirstMatch,
            PolicyArg::VetoChain => DispatchPolicy::VetoChain,
        }
    }
}

impl CliArgs {
    /// Apply command-line overrides on top of the keymap file's settings
    pub fn apply_overrides(&self, settings: &mut EngineSettings) {
        if let Some(policy) = self.policy {
            settings.dispatch_policy = policy.into();
        }
        if let Some(ms) = self.timeout_ms {
            settings.chord_timeout_ms = ms;
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ScriptError {
    #[error("line {line}: unknown step `{word}` (expected `press` or `wait`)")]
    UnknownStep { line: usize, word: String },

    #[error("line {line}: `press` needs a keystroke")]
    MissingKeystroke { line: usize },

    #[error("line {line}: invalid keystroke `{text}`: {source}")]
    InvalidKeystroke {
        line: usize,
        text: String,
        #[source]
        source: KeystrokeError,
    },

    #[error("line {line}: invalid element `{text}` (expected tag#id.class)")]
    InvalidElement { line: usize, text: String },

    #[error("line {line}: `wait` needs a duration in milliseconds")]
    InvalidWait { line: usize },
}

/// One line of a replay script
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptStep {
    Press {
        /// Keystroke as written, for output
        text: String,
        event: KeyEvent,
        chain: Vec<Element>,
    },
    Wait(Duration),
}

/// Parse a replay script; keystrokes are resolved for `platform`
pub fn parse_script(text: &str, platform: Platform) -> Result<Vec<ScriptStep>, ScriptError> {
    let mut steps = Vec::new();

    for (idx, raw) in text.lines().enumerate() {
        let line = idx + 1;
        let content = raw.split('#').next().unwrap_or_default().trim();
        if content.is_empty() {
            continue;
        }

        let (word, rest) = content
            .split_once(char::is_whitespace)
            .map(|(w, r)| (w, r.trim()))
            .unwrap_or((content, ""));

        match word {
            "press" => steps.push(parse_press(line, rest, platform)?),
            "wait" => {
                let ms = rest
                    .parse::<u64>()
                    .map_err(|_| ScriptError::InvalidWait { line })?;
                steps.push(ScriptStep::Wait(Duration::from_millis(ms)));
            }
            other => {
                return Err(ScriptError::UnknownStep {
                    line,
                    word: other.to_string(),
                })
            }
        }
    }

    Ok(steps)
}

fn parse_press(line: usize, rest: &str, platform: Platform) -> Result<ScriptStep, ScriptError> {
    let (key_text, chain_text) = match rest.split_once(" at ") {
        Some((keys, chain)) => (keys.trim(), Some(chain.trim())),
        None => (rest, None),
    };
    if key_text.is_empty() {
        return Err(ScriptError::MissingKeystroke { line });
    }

    let keystroke = normalize_keystroke(key_text, &UsLayout, platform).map_err(|source| {
        ScriptError::InvalidKeystroke {
            line,
            text: key_text.to_string(),
            source,
        }
    })?;
    // No physical code: the layout falls back to the logical key
    let event = KeyEvent::new("Unidentified", keystroke.mods()).with_key(keystroke.key());

    let chain = match chain_text {
        Some(text) => text
            .split('<')
            .map(str::trim)
            .map(|part| {
                Element::parse(part).ok_or_else(|| ScriptError::InvalidElement {
                    line,
                    text: part.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?,
        None => vec![Element::new("body")],
    };

    Ok(ScriptStep::Press {
        text: key_text.to_string(),
        event,
        chain,
    })
}

/// Something that happened during a replay, stamped with script time
#[derive(Debug, Clone, PartialEq)]
pub enum ReplayEvent {
    Dispatched {
        at: Duration,
        command: String,
        args: Option<Value>,
        sequence: String,
        element: String,
    },
    Pending {
        at: Duration,
        keys: String,
    },
    Unhandled {
        at: Duration,
        keys: String,
    },
}

impl fmt::Display for ReplayEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReplayEvent::Dispatched {
                at,
                command,
                args,
                sequence,
                element,
            } => {
                write!(f, "{:>6}ms  {command}  [{sequence}] on {element}", at.as_millis())?;
                if let Some(args) = args {
                    write!(f, " {args}")?;
                }
                Ok(())
            }
            ReplayEvent::Pending { at, keys } => {
                write!(f, "{:>6}ms  ({keys} ...)", at.as_millis())
            }
            ReplayEvent::Unhandled { at, keys } => {
                write!(f, "{:>6}ms  {keys}: unhandled", at.as_millis())
            }
        }
    }
}

/// Run `steps` through `keymap` on a simulated clock
///
/// Every dispatched command is reported as consumed. A chord still pending
/// at the end of the script is allowed to time out.
pub fn replay(keymap: &mut Keymap, steps: &[ScriptStep]) -> Vec<ReplayEvent> {
    let start = Instant::now();
    let mut now = start;
    let mut events = Vec::new();

    for step in steps {
        match step {
            ScriptStep::Press { text, event, chain } => {
                let at = now - start;
                let mut record = |inv: &Invocation<'_, Element>| {
                    events.push(dispatched(at, inv));
                    true
                };
                let consumed = keymap.handle_key_event_with(event, chain, now, &mut record);

                if keymap.is_pending() {
                    events.push(ReplayEvent::Pending {
                        at,
                        keys: keymap.pending_display().unwrap_or_default(),
                    });
                } else if !consumed {
                    events.push(ReplayEvent::Unhandled {
                        at,
                        keys: text.clone(),
                    });
                }
            }
            ScriptStep::Wait(duration) => {
                let until = now + *duration;
                fire_due_timer(keymap, start, until, &mut events);
                now = until;
            }
        }
    }

    if let Some(deadline) = keymap.next_deadline() {
        fire_due_timer(keymap, start, deadline, &mut events);
    }
    events
}

fn fire_due_timer(keymap: &mut Keymap, start: Instant, until: Instant, events: &mut Vec<ReplayEvent>) {
    let Some(deadline) = keymap.next_deadline().filter(|d| *d <= until) else {
        return;
    };
    let at = deadline - start;
    keymap.poll_timeout_with(deadline, &mut |inv: &Invocation<'_, Element>| {
        events.push(dispatched(at, inv));
        true
    });
}

fn dispatched(at: Duration, inv: &Invocation<'_, Element>) -> ReplayEvent {
    ReplayEvent::Dispatched {
        at,
        command: inv.command.to_string(),
        args: inv.args.cloned(),
        sequence: inv.binding.sequence().to_string(),
        element: inv.element.to_string(),
    }
}

/// Pairs of bindings where one sequence is a strict prefix of the other
/// and the scopes are identical
///
/// The shorter binding can then only run after the chord timeout.
pub fn find_conflicts(keymap: &Keymap) -> Vec<(Arc<RegisteredBinding>, Arc<RegisteredBinding>)> {
    let mut conflicts = Vec::new();
    for short in keymap.bindings() {
        let Ok(candidates) = keymap.conflicts_with(&short.sequence().to_string()) else {
            continue;
        };
        for long in candidates {
            if long.sequence().len() > short.sequence().len() && long.selector() == short.selector() {
                conflicts.push((Arc::clone(short), long));
            }
        }
    }
    conflicts
}
