//! Subscription registry and synchronous dispatch
//!
//! An arena keyed by emitter identity: each live emitter owns an ordered
//! list of listener entries. Observers subscribe and unsubscribe from any
//! thread; dispatch runs in the owning element's execution context and
//! returns only after every interested listener has been invoked. A
//! panicking listener is contained and reported, never propagated into the
//! firing plan element's decision cycle.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Instant;

use dashmap::DashMap;
use smallvec::SmallVec;

use crate::error::{CanopyError, Result};
use crate::event::envelope::{EmitterId, EventEnvelope, EventPayload};
use crate::event::listener::Listener;
use crate::log::domain::LogDomain;

/// Handle returned by [`SubscriptionRegistry::subscribe`].
///
/// Pass it back to `unsubscribe`; removal is idempotent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subscription {
    emitter: EmitterId,
    id: u64,
}

impl Subscription {
    /// The emitter this subscription watches
    pub fn emitter(&self) -> EmitterId {
        self.emitter
    }
}

/// What one dispatch did, reported back to the firing element.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// Listeners whose `on_event` ran to completion
    pub delivered: usize,
    /// Listeners skipped by the kind filter
    pub filtered: usize,
    /// Listeners that panicked during delivery (contained)
    pub faulted: usize,
}

struct SubEntry {
    id: u64,
    // Weak: the registry never keeps a listener alive on its own
    listener: Weak<dyn Listener>,
}

impl SubEntry {
    fn is_listener(&self, listener: &Arc<dyn Listener>) -> bool {
        // Thin-pointer comparison; fat-pointer eq is unreliable across
        // codegen units
        self.listener.as_ptr() as *const () == Arc::as_ptr(listener) as *const ()
    }
}

#[derive(Default)]
struct EmitterSlot {
    entries: SmallVec<[SubEntry; 4]>,
    retired: bool,
}

/// Arena of per-emitter subscription lists.
///
/// `subscribe`/`unsubscribe` are safe from any thread while the owning
/// context dispatches; dispatch snapshots the entry list and releases all
/// locks before invoking callbacks, so a listener may re-enter the registry
/// (including unsubscribing itself) from inside `on_event`.
pub struct SubscriptionRegistry {
    slots: DashMap<EmitterId, EmitterSlot>,
    epoch: Instant,
    next_seq: AtomicU64,
    next_sub: AtomicU64,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self {
            slots: DashMap::new(),
            epoch: Instant::now(),
            next_seq: AtomicU64::new(0),
            next_sub: AtomicU64::new(0),
        }
    }

    /// Create the arena slot for a new emitter (called at element
    /// construction). Idempotent for a live emitter.
    pub fn register(&self, emitter: EmitterId) {
        self.slots.entry(emitter).or_default();
    }

    /// Is this emitter registered and not yet retired?
    pub fn is_live(&self, emitter: EmitterId) -> bool {
        self.slots.get(&emitter).map(|s| !s.retired).unwrap_or(false)
    }

    /// Register a listener's interest in one emitter
    ///
    /// Set semantics: subscribing the same listener (pointer identity) to
    /// the same emitter twice returns the existing subscription, so a fired
    /// event is never delivered to it twice.
    pub fn subscribe(
        &self,
        listener: &Arc<dyn Listener>,
        emitter: EmitterId,
    ) -> Result<Subscription> {
        let mut slot = self
            .slots
            .get_mut(&emitter)
            .ok_or_else(|| CanopyError::UnknownEmitter {
                emitter: emitter.to_string(),
            })?;
        if slot.retired {
            return Err(CanopyError::SubscribeAfterDestroy {
                emitter: emitter.to_string(),
            });
        }

        if let Some(existing) = slot.entries.iter().find(|e| e.is_listener(listener)) {
            return Ok(Subscription {
                emitter,
                id: existing.id,
            });
        }

        let id = self.next_sub.fetch_add(1, Ordering::SeqCst);
        slot.entries.push(SubEntry {
            id,
            listener: Arc::downgrade(listener),
        });
        Ok(Subscription { emitter, id })
    }

    /// Idempotent removal; also prunes entries whose listener was dropped
    pub fn unsubscribe(&self, subscription: &Subscription) {
        if let Some(mut slot) = self.slots.get_mut(&subscription.emitter) {
            slot.entries
                .retain(|e| e.id != subscription.id && e.listener.strong_count() > 0);
        }
    }

    /// Drop all subscriptions for an emitter and mark it retired
    ///
    /// Called when the emitter announces its own destruction. The slot is
    /// kept as a tombstone so a later `fire` is reported as a contract
    /// violation rather than an unknown emitter.
    pub fn retire(&self, emitter: EmitterId) {
        if let Some(mut slot) = self.slots.get_mut(&emitter) {
            slot.retired = true;
            slot.entries.clear();
        }
    }

    /// Number of live subscriptions for an emitter
    pub fn listener_count(&self, emitter: EmitterId) -> usize {
        self.slots
            .get(&emitter)
            .map(|s| {
                s.entries
                    .iter()
                    .filter(|e| e.listener.strong_count() > 0)
                    .count()
            })
            .unwrap_or(0)
    }

    /// Build a stamped envelope for an emitter about to fire
    pub fn envelope(
        &self,
        source: EmitterId,
        domain: LogDomain,
        payload: EventPayload,
    ) -> EventEnvelope {
        EventEnvelope {
            seq: self.next_seq.fetch_add(1, Ordering::SeqCst),
            source,
            domain,
            timestamp_ms: self.epoch.elapsed().as_millis() as u64,
            payload,
        }
    }

    /// Deliver an envelope to every currently subscribed listener whose
    /// interest includes its kind, in subscription (insertion) order
    ///
    /// Synchronous: returns after the last listener was invoked. The entry
    /// list is snapshotted up front, so each listener receives the envelope
    /// at most once even if subscriptions change mid-dispatch. A listener
    /// that panics is counted in `faulted`, logged, and does not prevent
    /// delivery to the rest.
    pub fn dispatch(&self, envelope: EventEnvelope) -> Result<DispatchOutcome> {
        let snapshot: SmallVec<[Arc<dyn Listener>; 4]> = {
            let slot = self
                .slots
                .get(&envelope.source)
                .ok_or_else(|| CanopyError::UnknownEmitter {
                    emitter: envelope.source.to_string(),
                })?;
            if slot.retired {
                return Err(CanopyError::FiredAfterDestroy {
                    domain: envelope.domain.to_string(),
                });
            }
            slot.entries
                .iter()
                .filter_map(|e| e.listener.upgrade())
                .collect()
            // Shard lock released here, before any callback runs
        };

        let mut outcome = DispatchOutcome::default();
        let kind = envelope.kind();
        for listener in snapshot {
            if !listener.listens_for(kind) {
                outcome.filtered += 1;
                continue;
            }
            match catch_unwind(AssertUnwindSafe(|| listener.on_event(&envelope))) {
                Ok(()) => outcome.delivered += 1,
                Err(_) => {
                    outcome.faulted += 1;
                    tracing::warn!(
                        domain = %envelope.domain,
                        seq = envelope.seq,
                        "listener panicked during dispatch; fault contained"
                    );
                }
            }
        }
        Ok(outcome)
    }
}

impl Default for SubscriptionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SubscriptionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionRegistry")
            .field("emitters", &self.slots.len())
            .finish()
    }
}
