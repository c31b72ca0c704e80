//! Event Module - notification bus for plan-element activity
//!
//! Decouples an arbitrarily deep tree of behavior nodes from zero-or-more
//! independent observers. Key types:
//! - `EventEnvelope`: immutable occurrence (seq + timestamp + payload)
//! - `SubscriptionRegistry`: arena of per-emitter listener lists with
//!   synchronous, fault-isolated dispatch
//! - `Listener`: observer capability (`NullListener`, `TracingListener`,
//!   `RecordingListener` built-ins)
//! - `EventRecorder`: NDJSON file writer for replay tooling

pub(crate) mod envelope;
pub(crate) mod listener;
mod record;
pub(crate) mod registry;

pub(crate) use record::RECORD_DIR;

// Re-export all public types
pub use envelope::{EmitterId, EventEnvelope, EventKind, EventPayload};
pub use listener::{Listener, NullListener, RecordingListener, TracingListener};
pub use record::{
    generate_recording_id, list_recordings, list_recordings_in, EventRecorder, RecordingInfo,
};
pub use registry::{DispatchOutcome, Subscription, SubscriptionRegistry};
