//! Per-session conversation state for the "kind → amount → note" entry flow, plus the
//! last-added row reference that powers undo.
//!
//! Absence of a stored state means the session is idle. Every transition goes through
//! [`ConversationState::apply`]; inputs that are not in its table are rejected with a
//! [`TransitionError`] and leave the stored state untouched.

use std::collections::HashMap;
use std::fmt;

use thiserror::Error;
use tracing::debug;

use crate::ledger::EntryKind;

/// Identifies one conversation (a chat). Several people may share a session.
pub type SessionKey = i64;

/// Placeholder note used when the user sends an empty reply.
pub const DEFAULT_EMPTY_NOTE: &str = "—";

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConversationState {
    /// Flow started, kind not chosen yet.
    AwaitingKind,
    AwaitingAmount { kind: EntryKind },
    AwaitingNote { kind: EntryKind, amount: f64 },
}

impl ConversationState {
    pub fn name(&self) -> &'static str {
        match self {
            ConversationState::AwaitingKind => "awaiting-kind",
            ConversationState::AwaitingAmount { .. } => "awaiting-amount",
            ConversationState::AwaitingNote { .. } => "awaiting-note",
        }
    }

    /// Transition table of the entry flow.
    pub fn apply(&self, input: Input<'_>, empty_note: &str) -> Result<Step, TransitionError> {
        match (*self, input) {
            (ConversationState::AwaitingKind, Input::ChooseKind(kind))
            | (ConversationState::AwaitingAmount { .. }, Input::ChooseKind(kind)) => {
                Ok(Step::Next(ConversationState::AwaitingAmount { kind }))
            }
            (ConversationState::AwaitingAmount { kind }, Input::Text(text)) => {
                match parse_amount(text) {
                    Ok(amount) => Ok(Step::Next(ConversationState::AwaitingNote { kind, amount })),
                    Err(error) => Ok(Step::Retry {
                        state: *self,
                        error,
                    }),
                }
            }
            (ConversationState::AwaitingNote { kind, amount }, Input::Text(text)) => {
                Ok(Step::Complete(Draft {
                    kind,
                    amount,
                    note: note_or_placeholder(text, empty_note),
                }))
            }
            (state, input) => Err(TransitionError {
                state: state.name(),
                input: input.name(),
            }),
        }
    }
}

/// Something the user did that may advance the flow.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Input<'a> {
    ChooseKind(EntryKind),
    Text(&'a str),
}

impl Input<'_> {
    fn name(&self) -> &'static str {
        match self {
            Input::ChooseKind(_) => "kind-choice",
            Input::Text(_) => "text",
        }
    }
}

/// Result of a valid transition.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Next(ConversationState),
    /// Input was malformed; the state stays where it was.
    Retry {
        state: ConversationState,
        error: ValidationError,
    },
    /// All fields collected; the session is idle again.
    Complete(Draft),
}

/// A fully captured entry waiting to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct Draft {
    pub kind: EntryKind,
    pub amount: f64,
    pub note: String,
}

/// Field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("input `{input}` is not accepted while {state}")]
pub struct TransitionError {
    pub state: &'static str,
    pub input: &'static str,
}

/// Parses a user-typed amount: comma or dot decimals, spaces anywhere, sign dropped.
pub fn parse_amount(text: &str) -> Result<f64, ValidationError> {
    let normalized: String = text
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    let value: f64 = normalized
        .parse()
        .map_err(|_| ValidationError::new("Enter a number"))?;
    if !value.is_finite() {
        return Err(ValidationError::new("Enter a number"));
    }
    Ok(value.abs())
}

/// Trimmed note text, or `placeholder` when nothing but whitespace was sent.
pub fn note_or_placeholder(text: &str, placeholder: &str) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        placeholder.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Owns every session's conversation state and last-added reference.
#[derive(Debug, Default)]
pub struct SessionManager {
    conversations: HashMap<SessionKey, ConversationState>,
    last_added: HashMap<SessionKey, usize>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts (or restarts) the entry flow.
    pub fn start_add(&mut self, key: SessionKey) {
        self.conversations
            .insert(key, ConversationState::AwaitingKind);
    }

    pub fn state(&self, key: SessionKey) -> Option<&ConversationState> {
        self.conversations.get(&key)
    }

    pub fn is_idle(&self, key: SessionKey) -> bool {
        !self.conversations.contains_key(&key)
    }

    /// Feeds `input` to the session's state machine and stores the outcome.
    pub fn advance(
        &mut self,
        key: SessionKey,
        input: Input<'_>,
        empty_note: &str,
    ) -> Result<Step, TransitionError> {
        let Some(current) = self.conversations.get(&key).copied() else {
            return Err(TransitionError {
                state: "idle",
                input: input.name(),
            });
        };
        let step = current.apply(input, empty_note).map_err(|err| {
            debug!(session = key, %err, "transition rejected");
            err
        })?;
        match &step {
            Step::Next(next) | Step::Retry { state: next, .. } => {
                self.conversations.insert(key, *next);
            }
            Step::Complete(_) => {
                self.conversations.remove(&key);
            }
        }
        Ok(step)
    }

    /// Drops any in-flight conversation.
    pub fn reset(&mut self, key: SessionKey) {
        self.conversations.remove(&key);
    }

    pub fn record_added(&mut self, key: SessionKey, index: usize) {
        self.last_added.insert(key, index);
    }

    pub fn last_added(&self, key: SessionKey) -> Option<usize> {
        self.last_added.get(&key).copied()
    }

    pub fn forget_added(&mut self, key: SessionKey) {
        self.last_added.remove(&key);
    }
}
