//! Process-wide log sink
//!
//! Append-only destination for textual diagnostics, addressed by
//! hierarchical domain. The sink is the one mutable shared resource of the
//! instrumentation layer: writes and redirection are serialized behind a
//! single mutex, thresholds live in a concurrent map, and a destination
//! that stops accepting bytes degrades to a dropped-message counter.
//! Logging must never break behavior execution.
//!
//! Lifecycle: `init → active → (redirect)* → active → shutdown`. The
//! process-global instance is created lazily on first use ([`LogSink::global`])
//! and flushed once at exit via [`LogSink::flush`]. Plan elements receive an
//! injected `Arc<LogSink>`; the global is the documented default to inject,
//! not an ambient lookup.

use std::fmt;
use std::io::{self, Write};
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Instant;

use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};

use crate::error::CanopyError;
use crate::log::domain::LogDomain;

/// Message severity, ordered from most to least verbose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Debug,
    Info,
    Warn,
    Error,
}

impl Severity {
    /// Fixed-width uppercase name used in formatted lines
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // pad() honors width specifiers in the sink's line format
        f.pad(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = CanopyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            other => Err(CanopyError::ConfigError {
                reason: format!("unknown severity '{}': expected debug|info|warn|error", other),
            }),
        }
    }
}

/// Threshold applied when neither a domain nor any of its prefixes has one
const DEFAULT_THRESHOLD: Severity = Severity::Info;

/// Append-only, hierarchically addressed text log.
pub struct LogSink {
    /// Byte destination; one mutex serializes writes and redirection
    dest: Mutex<Box<dyn Write + Send>>,
    /// Per-domain minimum severities (exact domains and prefixes)
    thresholds: DashMap<String, Severity>,
    /// Fallback when no threshold matches
    default_threshold: RwLock<Severity>,
    /// Lines lost to a failing destination
    dropped: AtomicU64,
    /// Epoch for the elapsed-time column
    epoch: Instant,
}

impl LogSink {
    /// Create a sink writing to the given destination
    pub fn new(dest: Box<dyn Write + Send>) -> Self {
        Self {
            dest: Mutex::new(dest),
            thresholds: DashMap::new(),
            default_threshold: RwLock::new(DEFAULT_THRESHOLD),
            dropped: AtomicU64::new(0),
            epoch: Instant::now(),
        }
    }

    /// Create a sink writing to stderr
    pub fn stderr() -> Self {
        Self::new(Box::new(io::stderr()))
    }

    /// The process-global sink, lazily initialized to stderr on first use
    ///
    /// Lives for the remainder of the process; call [`LogSink::flush`] once
    /// at orderly shutdown.
    pub fn global() -> &'static Arc<LogSink> {
        static GLOBAL: OnceLock<Arc<LogSink>> = OnceLock::new();
        GLOBAL.get_or_init(|| Arc::new(LogSink::stderr()))
    }

    /// Append one formatted line under `domain`
    ///
    /// Messages below the effective threshold are filtered before any
    /// formatting work. A destination that cannot accept the write drops
    /// the line and increments the counter; the caller is never blocked
    /// indefinitely and never sees an error.
    pub fn write(&self, domain: &LogDomain, severity: Severity, message: &str) {
        if severity < self.threshold_for(domain) {
            return;
        }

        let thread = std::thread::current();
        let line = format!(
            "{:>8}ms [{}] {:<5} {} - {}\n",
            self.epoch.elapsed().as_millis(),
            thread.name().unwrap_or("?"),
            severity,
            domain,
            message
        );

        // Single write_all per line: a redirect can never observe half a line.
        let mut dest = self.dest.lock();
        if dest.write_all(line.as_bytes()).is_err() {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Swap the byte destination for all future writes, returning the old one
    ///
    /// The old destination is flushed before the swap so buffered lines are
    /// not lost; the swap shares the write mutex, so no line is split across
    /// the two destinations.
    pub fn redirect(&self, new_dest: Box<dyn Write + Send>) -> Box<dyn Write + Send> {
        let mut dest = self.dest.lock();
        if dest.flush().is_err() {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
        let old = std::mem::replace(&mut *dest, new_dest);
        drop(dest);
        tracing::debug!("log sink destination redirected");
        old
    }

    /// Set the minimum severity for a domain (and its sub-domains, unless
    /// they carry their own threshold)
    pub fn set_threshold(&self, domain: &str, severity: Severity) {
        self.thresholds.insert(domain.to_string(), severity);
    }

    /// Remove a per-domain threshold, restoring prefix/default fallback
    pub fn clear_threshold(&self, domain: &str) {
        self.thresholds.remove(domain);
    }

    /// Set the sink-wide fallback threshold
    pub fn set_default_threshold(&self, severity: Severity) {
        *self.default_threshold.write() = severity;
    }

    /// Effective threshold for a domain: the most specific dot-prefix with
    /// a configured threshold wins, else the sink default
    pub fn threshold_for(&self, domain: &LogDomain) -> Severity {
        for prefix in domain.ancestors() {
            if let Some(level) = self.thresholds.get(prefix) {
                return *level;
            }
        }
        *self.default_threshold.read()
    }

    /// Would a write at `severity` under `domain` pass the threshold?
    pub fn enabled(&self, domain: &LogDomain, severity: Severity) -> bool {
        severity >= self.threshold_for(domain)
    }

    /// Number of lines lost to a failing destination
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Flush the current destination (orderly shutdown)
    pub fn flush(&self) {
        if self.dest.lock().flush().is_err() {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
    }
}

impl fmt::Debug for LogSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogSink")
            .field("thresholds", &self.thresholds.len())
            .field("dropped", &self.dropped())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::domain::domain_for;
    use parking_lot::Mutex as PlMutex;

    /// Test destination: shared, inspectable byte buffer
    #[derive(Clone, Default)]
    struct SharedBuf(Arc<PlMutex<Vec<u8>>>);

    impl SharedBuf {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().clone()).unwrap()
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

    /// Test destination that rejects every write
    struct FailingWriter;

    impl Write for FailingWriter {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::WouldBlock, "destination full"))
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn write_formats_all_fields() {
        let buf = SharedBuf::default();
        let sink = LogSink::new(Box::new(buf.clone()));
        let domain = domain_for("agent1", "walk");

        sink.write(&domain, Severity::Info, "step complete");

        let line = buf.contents();
        assert!(line.contains("ms ["), "elapsed column missing: {line}");
        assert!(line.contains("INFO"));
        assert!(line.contains("agent1.walk"));
        assert!(line.contains("- step complete"));
        assert!(line.ends_with('\n'));
    }

    #[test]
    fn below_threshold_is_filtered() {
        let buf = SharedBuf::default();
        let sink = LogSink::new(Box::new(buf.clone()));
        let domain = domain_for("agent1", "walk");

        // Default threshold is Info
        sink.write(&domain, Severity::Debug, "too quiet");
        assert_eq!(buf.contents(), "");

        sink.set_default_threshold(Severity::Debug);
        sink.write(&domain, Severity::Debug, "now audible");
        assert!(buf.contents().contains("now audible"));
    }

    #[test]
    fn threshold_falls_back_to_prefix() {
        let sink = LogSink::new(Box::new(io::sink()));
        sink.set_threshold("agent1", Severity::Warn);

        let node = domain_for("agent1", "nodeA");
        assert_eq!(sink.threshold_for(&node), Severity::Warn);
        assert!(!sink.enabled(&node, Severity::Info));

        // A more specific threshold wins over the prefix
        sink.set_threshold("agent1.nodeA", Severity::Debug);
        assert_eq!(sink.threshold_for(&node), Severity::Debug);
        assert!(sink.enabled(&node, Severity::Debug));

        // Unrelated agents keep the default
        let other = domain_for("agent2", "nodeA");
        assert_eq!(sink.threshold_for(&other), DEFAULT_THRESHOLD);
    }

    #[test]
    fn clear_threshold_restores_fallback() {
        let sink = LogSink::new(Box::new(io::sink()));
        sink.set_threshold("agent1.nodeA", Severity::Error);
        sink.clear_threshold("agent1.nodeA");
        assert_eq!(
            sink.threshold_for(&domain_for("agent1", "nodeA")),
            DEFAULT_THRESHOLD
        );
    }

    #[test]
    fn failing_destination_counts_drops() {
        let sink = LogSink::new(Box::new(FailingWriter));
        let domain = domain_for("agent1", "");

        sink.write(&domain, Severity::Error, "lost");
        sink.write(&domain, Severity::Error, "also lost");

        assert_eq!(sink.dropped(), 2);
    }

    #[test]
    fn filtered_writes_do_not_count_as_dropped() {
        let sink = LogSink::new(Box::new(FailingWriter));
        let domain = domain_for("agent1", "");

        sink.write(&domain, Severity::Debug, "below threshold");
        assert_eq!(sink.dropped(), 0);
    }

    #[test]
    fn redirect_returns_old_destination() {
        let first = SharedBuf::default();
        let second = SharedBuf::default();
        let sink = LogSink::new(Box::new(first.clone()));
        let domain = domain_for("agent1", "");

        sink.write(&domain, Severity::Info, "before");
        let _old = sink.redirect(Box::new(second.clone()));
        sink.write(&domain, Severity::Info, "after");

        assert!(first.contents().contains("before"));
        assert!(!first.contents().contains("after"));
        assert!(second.contents().contains("after"));
    }

    #[test]
    fn global_sink_is_shared() {
        let a = Arc::clone(LogSink::global());
        let b = Arc::clone(LogSink::global());
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn severity_ordering_and_parse() {
        assert!(Severity::Debug < Severity::Info);
        assert!(Severity::Info < Severity::Warn);
        assert!(Severity::Warn < Severity::Error);

        assert_eq!("warn".parse::<Severity>().unwrap(), Severity::Warn);
        assert_eq!("ERROR".parse::<Severity>().unwrap(), Severity::Error);
        assert!("loud".parse::<Severity>().is_err());
    }
}
