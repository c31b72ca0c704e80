//! Plan elements - the emitter side of the instrumentation boundary
//!
//! A plan element is any behavior-tree node the arbitration core triggers
//! during the agent's decision cycle. Instrumentation is composition, not
//! inheritance: an element holds its log domain, a shared registry, and a
//! shared sink. The arbitration core calls `fire`/`sense` when the node
//! runs and `destroy` when it leaves the tree; everything else is the
//! observers' business.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde_json::Value;

use crate::error::{CanopyError, Result};
use crate::event::envelope::{EmitterId, EventPayload};
use crate::event::registry::{DispatchOutcome, SubscriptionRegistry};
use crate::log::domain::{domain_for, LogDomain};
use crate::log::sink::{LogSink, Severity};

/// The four node types of a behavior-selection tree.
///
/// Carried as labels only; arbitration semantics live outside this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Action,
    Sense,
    Competence,
    DriveCollection,
}

impl ElementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Action => "action",
            Self::Sense => "sense",
            Self::Competence => "competence",
            Self::DriveCollection => "drive-collection",
        }
    }
}

/// Identity boundary to the owning agent.
///
/// The id may be absent while the agent is still initializing; elements
/// constructed in that window get `NOID`-rooted domains rather than
/// failing. Factory methods hand out [`PlanElement`]s wired to the agent's
/// registry and sink.
pub struct Agent {
    id: Option<Arc<str>>,
    registry: Arc<SubscriptionRegistry>,
    sink: Arc<LogSink>,
}

impl Agent {
    /// Agent with a stable, non-empty id
    pub fn new(
        id: impl Into<Arc<str>>,
        registry: Arc<SubscriptionRegistry>,
        sink: Arc<LogSink>,
    ) -> Self {
        let id = id.into();
        Self {
            id: (!id.is_empty()).then_some(id),
            registry,
            sink,
        }
    }

    /// Agent whose id is not yet available; domains use the NOID sentinel
    pub fn anonymous(registry: Arc<SubscriptionRegistry>, sink: Arc<LogSink>) -> Self {
        Self {
            id: None,
            registry,
            sink,
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// The agent's own top-level log domain (id alone, or NOID)
    pub fn domain(&self) -> LogDomain {
        domain_for(self.id().unwrap_or(""), "")
    }

    pub fn registry(&self) -> &Arc<SubscriptionRegistry> {
        &self.registry
    }

    pub fn sink(&self) -> &Arc<LogSink> {
        &self.sink
    }

    /// Write under the agent's top-level domain
    pub fn log(&self, severity: Severity, message: &str) {
        self.sink.write(&self.domain(), severity, message);
    }

    /// Construct a plan element owned by this agent
    pub fn element(&self, label: &str, kind: ElementKind) -> Result<PlanElement> {
        validate_label(label)?;

        let id = EmitterId::new();
        let domain = domain_for(self.id().unwrap_or(""), label);
        self.registry.register(id);

        Ok(PlanElement {
            id,
            kind,
            domain,
            registry: Arc::clone(&self.registry),
            sink: Arc::clone(&self.sink),
            destroyed: AtomicBool::new(false),
        })
    }

    pub fn action(&self, label: &str) -> Result<PlanElement> {
        self.element(label, ElementKind::Action)
    }

    pub fn sense(&self, label: &str) -> Result<PlanElement> {
        self.element(label, ElementKind::Sense)
    }

    pub fn competence(&self, label: &str) -> Result<PlanElement> {
        self.element(label, ElementKind::Competence)
    }

    pub fn drive_collection(&self, label: &str) -> Result<PlanElement> {
        self.element(label, ElementKind::DriveCollection)
    }
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent").field("id", &self.id()).finish()
    }
}

/// One behavior-tree node as seen by the instrumentation layer.
pub struct PlanElement {
    id: EmitterId,
    kind: ElementKind,
    domain: LogDomain,
    registry: Arc<SubscriptionRegistry>,
    sink: Arc<LogSink>,
    destroyed: AtomicBool,
}

impl PlanElement {
    pub fn id(&self) -> EmitterId {
        self.id
    }

    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    pub fn domain(&self) -> &LogDomain {
        &self.domain
    }

    /// Notify observers that this element executed with `outcome`
    ///
    /// Synchronous: returns after every interested listener ran. Firing
    /// after [`destroy`](Self::destroy) is a contract violation and
    /// produces no deliveries.
    pub fn fire(&self, outcome: bool) -> Result<DispatchOutcome> {
        self.dispatch(EventPayload::fired(outcome))
    }

    /// Notify observers that this element sensed `value`
    pub fn sense(&self, value: impl Into<Value>) -> Result<DispatchOutcome> {
        self.dispatch(EventPayload::sensed(value))
    }

    /// Notify observers of a sensed value together with an outcome
    pub fn sense_with_outcome(
        &self,
        value: impl Into<Value>,
        outcome: bool,
    ) -> Result<DispatchOutcome> {
        self.dispatch(EventPayload::sensed_with_outcome(value, outcome))
    }

    fn dispatch(&self, payload: EventPayload) -> Result<DispatchOutcome> {
        if self.destroyed.load(Ordering::Acquire) {
            return Err(CanopyError::FiredAfterDestroy {
                domain: self.domain.to_string(),
            });
        }
        let envelope = self
            .registry
            .envelope(self.id, self.domain.clone(), payload);
        self.registry.dispatch(envelope)
    }

    /// Announce destruction: retire the registry slot, dropping all
    /// subscriptions. Idempotent.
    pub fn destroy(&self) {
        if !self.destroyed.swap(true, Ordering::AcqRel) {
            self.registry.retire(self.id);
        }
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::Acquire)
    }

    /// Write a diagnostic line under this element's domain
    pub fn log(&self, severity: Severity, message: &str) {
        self.sink.write(&self.domain, severity, message);
    }
}

impl Drop for PlanElement {
    fn drop(&mut self) {
        // Registry entries must never outlive their emitter
        self.destroy();
    }
}

impl std::fmt::Debug for PlanElement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlanElement")
            .field("kind", &self.kind.as_str())
            .field("domain", &self.domain.as_str())
            .field("destroyed", &self.is_destroyed())
            .finish()
    }
}

fn validate_label(label: &str) -> Result<()> {
    // Empty labels are allowed: the element shares the agent root domain
    if label.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(CanopyError::InvalidLabel {
            label: label.to_string(),
            reason: "must not contain whitespace or control characters".to_string(),
        });
    }
    Ok(())
}
