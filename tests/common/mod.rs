//! Test fixtures and helpers shared across integration suites
#![allow(dead_code)]

use std::io::{self, Write};
use std::sync::{Arc, Once};

use parking_lot::Mutex;

use canopy::{Agent, EventEnvelope, EventKind, Listener, LogSink, SubscriptionRegistry};

/// Initialize tracing output for test debugging (idempotent)
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::from_default_env()
                    .add_directive(tracing::Level::WARN.into()),
            )
            .with_test_writer()
            .try_init();
    });
}

/// Agent wired to a fresh registry and a discarding sink
pub fn test_agent(id: &str) -> Agent {
    Agent::new(
        id,
        Arc::new(SubscriptionRegistry::new()),
        Arc::new(LogSink::new(Box::new(io::sink()))),
    )
}

/// Listener that records every envelope it receives
pub struct CollectingListener {
    interests: Vec<EventKind>,
    pub received: Mutex<Vec<EventEnvelope>>,
}

impl CollectingListener {
    pub fn new(interests: Vec<EventKind>) -> Arc<Self> {
        Arc::new(Self {
            interests,
            received: Mutex::new(Vec::new()),
        })
    }

    /// Interested in Fire events only
    pub fn fire_only() -> Arc<Self> {
        Self::new(vec![EventKind::Fire])
    }

    /// Interested in Change events only
    pub fn change_only() -> Arc<Self> {
        Self::new(vec![EventKind::Change])
    }

    /// Interested in both Fire and Change
    pub fn all() -> Arc<Self> {
        Self::new(vec![EventKind::Fire, EventKind::Change])
    }

    pub fn count(&self) -> usize {
        self.received.lock().len()
    }

    pub fn seqs(&self) -> Vec<u64> {
        self.received.lock().iter().map(|e| e.seq).collect()
    }

    pub fn kinds(&self) -> Vec<EventKind> {
        self.received.lock().iter().map(|e| e.kind()).collect()
    }
}

impl Listener for CollectingListener {
    fn listens_for(&self, kind: EventKind) -> bool {
        self.interests.contains(&kind)
    }

    fn on_event(&self, envelope: &EventEnvelope) {
        self.received.lock().push(envelope.clone());
    }
}

/// Shared, inspectable byte destination for sink tests
#[derive(Clone, Default)]
pub struct SharedBuf(pub Arc<Mutex<Vec<u8>>>);

impl SharedBuf {
    pub fn contents(&self) -> String {
        String::from_utf8(self.0.lock().clone()).expect("sink output is utf-8")
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }
}

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Destination that rejects every write
pub struct FailingWriter;

impl Write for FailingWriter {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::WouldBlock, "destination full"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
