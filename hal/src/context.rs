//! Context switch abstraction

use core_types::ThreadId;

/// Low-level thread hand-off trait
///
/// This trait abstracts the machine-dependent register/stack switch that
/// transfers the processor from one thread's execution context to
/// another's.
///
/// ## Contract
///
/// `switch(from, to)` is the single suspension point of the scheduling
/// model. From the outgoing thread's point of view the call blocks:
/// control returns to the call site only when a later hand-off switches
/// back to `from`. Interrupts must be disabled across the call, and are
/// still disabled when it returns.
///
/// Implementations may use platform context-switch primitives,
/// cooperative fibers, or (for deterministic testing) an in-process
/// simulation that records the hand-off and returns immediately.
pub trait ContextSwitchHal {
    /// Transfers the processor from `from` to `to`
    fn switch(&mut self, from: ThreadId, to: ThreadId);
}
