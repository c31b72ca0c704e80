//! Event envelopes
//!
//! Immutable payloads describing one occurrence of a plan element doing
//! something: executing with an outcome, or sensing a value. The payload is
//! structural — a fire envelope always carries an outcome, a sense envelope
//! always carries a value — so the "exactly one semantic payload per kind"
//! invariant cannot be violated at runtime.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::log::domain::LogDomain;

/// Event categories a listener can declare interest in.
///
/// `None` is the empty interest: no envelope ever carries it, and a
/// listener interested only in `None` receives nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    None,
    Fire,
    Change,
}

/// Opaque handle identifying one emitter (plan element).
///
/// Listeners use it to correlate envelopes to tree position without owning
/// the emitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmitterId(Uuid);

impl EmitterId {
    /// Mint a fresh emitter identity
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EmitterId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EmitterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Semantic payload of one envelope.
///
/// Two closed variants instead of optional fields: constructing a fire
/// event without an outcome, or a sense event without a value, does not
/// typecheck.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventPayload {
    /// Plan element executed and produced a success/failure outcome
    Fired { outcome: bool },
    /// Plan element evaluated a condition and produced a sensed value
    Sensed {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        outcome: Option<bool>,
        value: Value,
    },
}

impl EventPayload {
    /// Fire-event payload
    pub fn fired(outcome: bool) -> Self {
        Self::Fired { outcome }
    }

    /// Sense-event payload without an outcome
    pub fn sensed(value: impl Into<Value>) -> Self {
        Self::Sensed {
            outcome: None,
            value: value.into(),
        }
    }

    /// Sense-event payload that also carries an outcome
    pub fn sensed_with_outcome(value: impl Into<Value>, outcome: bool) -> Self {
        Self::Sensed {
            outcome: Some(outcome),
            value: value.into(),
        }
    }

    /// The kind this payload dispatches as
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Fired { .. } => EventKind::Fire,
            Self::Sensed { .. } => EventKind::Change,
        }
    }

    /// Outcome, if this payload carries one
    pub fn outcome(&self) -> Option<bool> {
        match self {
            Self::Fired { outcome } => Some(*outcome),
            Self::Sensed { outcome, .. } => *outcome,
        }
    }

    /// Sensed value, for sense events only
    pub fn sensed_value(&self) -> Option<&Value> {
        match self {
            Self::Fired { .. } => None,
            Self::Sensed { value, .. } => Some(value),
        }
    }
}

/// One occurrence, constructed once per fire and never mutated.
///
/// Listeners receive a shared reference; the registry stamps `seq` and
/// `timestamp_ms` at construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Monotonic sequence number per registry (for ordering)
    pub seq: u64,
    /// Which emitter produced this envelope
    pub source: EmitterId,
    /// Hierarchical domain of the source at fire time
    pub domain: LogDomain,
    /// Time since registry creation (ms)
    pub timestamp_ms: u64,
    /// Event type and data
    pub payload: EventPayload,
}

impl EventEnvelope {
    /// The kind this envelope dispatches as
    pub fn kind(&self) -> EventKind {
        self.payload.kind()
    }
}
