#![forbid(unsafe_code)]

//! Per-notification observability hook.
//!
//! When [`RenderConfig::trace_dispatch`](crate::RenderConfig) is set, the
//! session hands one [`DispatchTrace`] to its hook after applying each
//! notification. The hook runs on the dispatch stack and must not touch the
//! console or the surface.

use framecon_core::Change;

use crate::dispatcher::DispatchOutcome;

/// Structured record of one applied notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchTrace {
    /// Monotonic per-session sequence number, starting at 1.
    pub seq: u64,
    pub change: Change,
    pub outcome: DispatchOutcome,
}

/// Trace callback type.
pub type TraceHook = Box<dyn FnMut(&DispatchTrace)>;

/// Collects traces into a shared vector. Handy in tests and the harness.
#[must_use]
pub fn collecting_hook(sink: std::rc::Rc<std::cell::RefCell<Vec<DispatchTrace>>>) -> TraceHook {
    Box::new(move |trace| sink.borrow_mut().push(*trace))
}
