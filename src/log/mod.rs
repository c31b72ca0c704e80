//! Log Module - hierarchical textual diagnostics
//!
//! The second observation channel, independent of the event bus:
//! - `domain`: stable dot-separated names (`<agentId>.<nodeLabel>`)
//! - `sink`: process-wide append-only destination with redirection and
//!   per-domain severity thresholds

pub(crate) mod domain;
pub(crate) mod sink;

pub use domain::{domain_for, LogDomain, NOID};
pub use sink::{LogSink, Severity};
