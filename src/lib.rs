//! Canopy - event instrumentation and structured logging for behavior-tree
//! agents
//!
//! A hierarchical behavior-based agent is a tree of plan elements (actions,
//! senses, competences, drive collections) executing cyclically. Canopy lets
//! external observers watch what every element does — when it fires, what it
//! senses, whether it succeeds — without the elements depending on any
//! particular observer.
//!
//! ## Module Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        EMITTER SIDE                          │
//! │  plan/      Agent identity, PlanElement (fire/sense/destroy) │
//! └──────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        EVENT CHANNEL                         │
//! │  event/     Envelopes, SubscriptionRegistry, Listeners,      │
//! │             NDJSON EventRecorder                             │
//! └──────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         LOG CHANNEL                          │
//! │  log/       LogDomain naming, process-wide LogSink           │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The event bus and the log sink are independent channels; an observer may
//! use either or both. No instrumentation failure may ever prevent or delay
//! the agent's decision cycle: listener faults are contained per listener,
//! and a failing sink destination drops lines instead of blocking.
//!
//! ## Module Responsibilities
//!
//! | Module | Responsibility |
//! |--------|----------------|
//! | [`plan`] | `Agent` identity boundary, `PlanElement` emitters |
//! | [`event`] | Envelopes, subscription registry, listeners, recording |
//! | [`log`] | Hierarchical domains, process-wide sink with thresholds |
//! | [`config`] | Persistent defaults (`~/.config/canopy/config.toml`) |
//! | [`error`] | Error types with stable codes |

// ═══════════════════════════════════════════════════════════════
// EMITTER SIDE - what the arbitration core talks to
// ═══════════════════════════════════════════════════════════════
pub mod plan;

// ═══════════════════════════════════════════════════════════════
// OBSERVATION CHANNELS - events and textual diagnostics
// ═══════════════════════════════════════════════════════════════
pub mod event;
pub mod log;

// ═══════════════════════════════════════════════════════════════
// CROSS-CUTTING - Error handling, configuration
// ═══════════════════════════════════════════════════════════════
pub mod config;
pub mod error;

// ═══════════════════════════════════════════════════════════════
// PUBLIC API RE-EXPORTS
// ═══════════════════════════════════════════════════════════════

// Error types
pub use error::{CanopyError, Result};

// Config types
pub use config::CanopyConfig;

// Emitter types
pub use plan::{Agent, ElementKind, PlanElement};

// Event types
pub use event::{
    generate_recording_id, list_recordings, list_recordings_in, DispatchOutcome, EmitterId,
    EventEnvelope, EventKind, EventPayload, EventRecorder, Listener, NullListener, RecordingInfo,
    RecordingListener, Subscription, SubscriptionRegistry, TracingListener,
};

// Log types
pub use log::{domain_for, LogDomain, LogSink, Severity, NOID};
