//! # Timer Device
//!
//! Hardware abstraction for monotonic tick measurement.
//!
//! ## Philosophy
//!
//! **Time is a service, not a global variable.**
//!
//! The scheduler consumes ticks only for diagnostic correlation (every
//! audit event carries the tick at which it happened) and for the aging
//! pass, which an external timer drives. This trait does NOT:
//! - Provide wall-clock time
//! - Block or sleep (polling only)
//! - Decide when the aging pass runs (that's the timer handler's job)

/// Hardware timer device trait
///
/// Provides access to a monotonic tick counter. Ticks are cumulative
/// since boot and never decrease.
pub trait TimerDevice {
    /// Returns the current tick count
    ///
    /// Monotonic, cumulative, non-blocking. Tick frequency is
    /// implementation-defined.
    fn poll_ticks(&mut self) -> u64;
}
