//! Interrupt level abstraction

/// Interrupt controller trait
///
/// This trait abstracts the processor's interrupt level and the
/// deferred-yield flag. The scheduler relies on interrupts being
/// disabled as its mutual-exclusion surrogate: it cannot take ordinary
/// locks, because waiting on a lock would re-enter thread selection.
///
/// The deferred-yield flag requests a cooperative context switch at the
/// next safe return point, in lieu of immediate preemption.
pub trait InterruptHal {
    /// Sets the interrupt level, returning the previous level
    ///
    /// `true` enables interrupts, `false` disables them. Returning the
    /// old level lets callers restore it when leaving a critical
    /// section.
    fn set_enabled(&mut self, enabled: bool) -> bool;

    /// Returns whether interrupts are currently enabled
    fn interrupts_enabled(&self) -> bool;

    /// Requests a cooperative yield at the next safe return point
    fn request_yield_on_return(&mut self);

    /// Returns whether a deferred yield has been requested
    fn yield_requested(&self) -> bool;

    /// Consumes the deferred-yield flag
    ///
    /// Returns `true` if a yield had been requested; the flag is clear
    /// afterwards.
    fn take_yield_request(&mut self) -> bool;
}
