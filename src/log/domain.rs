//! Log domain naming
//!
//! A log domain is the dot-separated hierarchical address of one plan
//! element's textual diagnostics: `<agent_id>.<node_label>`, or the agent id
//! alone for the agent's own top-level logger. Domains are plain strings;
//! two elements sharing one domain is allowed and intentional.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Sentinel agent id used when the owning agent has no id yet.
///
/// Plan elements can be constructed before their owning agent completes
/// setup; the sentinel keeps every domain string syntactically valid.
pub const NOID: &str = "NOID";

/// Hierarchical address for textual diagnostics.
///
/// Uses `Arc<str>` so cloning into every envelope is zero-cost.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LogDomain(Arc<str>);

impl LogDomain {
    /// The domain as a plain string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Iterate the domain and each of its dot-prefixes, most specific first
    ///
    /// `agent1.nodeA` yields `agent1.nodeA`, then `agent1`. Used for
    /// hierarchical threshold fallback in the log sink.
    pub fn ancestors(&self) -> impl Iterator<Item = &str> {
        std::iter::successors(Some(self.0.as_ref()), |cur| {
            cur.rfind('.').map(|dot| &cur[..dot])
        })
    }
}

impl fmt::Display for LogDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LogDomain {
    fn from(s: &str) -> Self {
        Self(Arc::from(s))
    }
}

/// Derive the log domain for a plan element.
///
/// Pure function: an empty `agent_id` falls back to the [`NOID`] sentinel
/// (explicit fallback, not a failure); an empty `node_label` yields the
/// agent domain alone.
pub fn domain_for(agent_id: &str, node_label: &str) -> LogDomain {
    let agent = if agent_id.is_empty() { NOID } else { agent_id };
    if node_label.is_empty() {
        LogDomain(Arc::from(agent))
    } else {
        LogDomain(Arc::from(format!("{agent}.{node_label}")))
    }
}
