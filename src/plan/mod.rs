//! Plan Module - the emitter side of the instrumentation boundary
//!
//! `Agent` is the identity boundary to the owning agent; `PlanElement` is
//! any behavior-tree node, instrumented by composition (domain + registry +
//! sink), exposing `fire`/`sense`/`destroy` to the arbitration core.

mod element;

pub use element::{Agent, ElementKind, PlanElement};
