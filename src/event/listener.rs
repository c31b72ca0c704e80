//! Listener capability and built-in listeners
//!
//! A listener is the observer side of the instrumentation boundary: a
//! minimal capability trait plus three concrete implementations. External
//! tooling (debuggers, trace recorders, monitoring UIs) implements
//! [`Listener`] and subscribes through the registry; plan elements never
//! learn who is watching.

use std::sync::Arc;

use crate::event::envelope::{EventEnvelope, EventKind, EventPayload};
use crate::event::record::EventRecorder;
use crate::log::sink::{LogSink, Severity};

/// Observer capability.
///
/// `listens_for` must be stable for the lifetime of the listener; changing
/// interest requires unsubscribe + resubscribe. `on_event` runs inside the
/// firing element's dispatch and must stay lightweight — hand off to your
/// own queue for anything slow. Delivery order is guaranteed only within a
/// single emitter's dispatch, never across emitters.
pub trait Listener: Send + Sync {
    /// Pure interest predicate
    fn listens_for(&self, kind: EventKind) -> bool;

    /// Delivery callback
    fn on_event(&self, envelope: &EventEnvelope);
}

/// Placeholder listener: listens for nothing, receives nothing.
///
/// `EventKind::None` never matches, so the empty interest is total.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullListener;

impl NullListener {
    pub fn new() -> Self {
        Self
    }
}

impl Listener for NullListener {
    fn listens_for(&self, _kind: EventKind) -> bool {
        false
    }

    fn on_event(&self, _envelope: &EventEnvelope) {}
}

/// Pass-through tracer: one formatted sink line per received envelope,
/// written under the envelope's own domain.
pub struct TracingListener {
    sink: Arc<LogSink>,
    severity: Severity,
}

impl TracingListener {
    /// Trace at `Info` severity
    pub fn new(sink: Arc<LogSink>) -> Self {
        Self::with_severity(sink, Severity::Info)
    }

    pub fn with_severity(sink: Arc<LogSink>, severity: Severity) -> Self {
        Self { sink, severity }
    }

    fn describe(payload: &EventPayload) -> String {
        match payload {
            EventPayload::Fired { outcome } => format!("fired outcome={outcome}"),
            EventPayload::Sensed {
                value,
                outcome: None,
            } => format!("sensed value={value}"),
            EventPayload::Sensed {
                value,
                outcome: Some(outcome),
            } => format!("sensed value={value} outcome={outcome}"),
        }
    }
}

impl Listener for TracingListener {
    fn listens_for(&self, kind: EventKind) -> bool {
        matches!(kind, EventKind::Fire | EventKind::Change)
    }

    fn on_event(&self, envelope: &EventEnvelope) {
        self.sink.write(
            &envelope.domain,
            self.severity,
            &Self::describe(&envelope.payload),
        );
    }
}

/// Appends every received envelope to an NDJSON recording.
///
/// Recorder I/O failures stay inside the instrumentation layer: they are
/// logged and the envelope is dropped, never propagated into the dispatch
/// loop.
pub struct RecordingListener {
    recorder: Arc<EventRecorder>,
}

impl RecordingListener {
    pub fn new(recorder: Arc<EventRecorder>) -> Self {
        Self { recorder }
    }
}

impl Listener for RecordingListener {
    fn listens_for(&self, kind: EventKind) -> bool {
        matches!(kind, EventKind::Fire | EventKind::Change)
    }

    fn on_event(&self, envelope: &EventEnvelope) {
        if let Err(err) = self.recorder.record(envelope) {
            tracing::warn!(error = %err, seq = envelope.seq, "event recording failed");
        }
    }
}
