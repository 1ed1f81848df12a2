//! # Simulated Interrupt Controller
//!
//! Deterministic interrupt-level bookkeeping for testing.
//!
//! ## Philosophy
//!
//! **Determinism enables thorough testing.**
//!
//! There are no real interrupts in the simulation. What matters to the
//! scheduler is the *level*: every scheduler operation asserts that
//! interrupts are disabled, because that is its mutual-exclusion
//! surrogate on a uniprocessor. This controller tracks the level and
//! the deferred-yield flag, nothing more.

use hal::InterruptHal;

/// Simulated interrupt controller
///
/// Starts with interrupts enabled, matching a machine that has finished
/// booting. Kernel entry points disable interrupts around scheduler
/// work and restore the previous level on the way out.
#[derive(Debug, Clone)]
pub struct SimInterruptController {
    enabled: bool,
    yield_on_return: bool,
}

impl SimInterruptController {
    /// Creates a controller with interrupts enabled
    pub fn new() -> Self {
        Self {
            enabled: true,
            yield_on_return: false,
        }
    }

    /// Creates a controller with interrupts already disabled
    ///
    /// Convenient for unit tests that drive the scheduler directly and
    /// never leave the critical section.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            yield_on_return: false,
        }
    }
}

impl Default for SimInterruptController {
    fn default() -> Self {
        Self::new()
    }
}

impl InterruptHal for SimInterruptController {
    fn set_enabled(&mut self, enabled: bool) -> bool {
        let previous = self.enabled;
        self.enabled = enabled;
        previous
    }

    fn interrupts_enabled(&self) -> bool {
        self.enabled
    }

    fn request_yield_on_return(&mut self) {
        self.yield_on_return = true;
    }

    fn yield_requested(&self) -> bool {
        self.yield_on_return
    }

    fn take_yield_request(&mut self) -> bool {
        let requested = self.yield_on_return;
        self.yield_on_return = false;
        requested
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_enabled_without_pending_yield() {
        let ints = SimInterruptController::new();
        assert!(ints.interrupts_enabled());
        assert!(!ints.yield_requested());
    }

    #[test]
    fn test_set_enabled_returns_previous_level() {
        let mut ints = SimInterruptController::new();
        assert!(ints.set_enabled(false));
        assert!(!ints.interrupts_enabled());
        assert!(!ints.set_enabled(true));
        assert!(ints.interrupts_enabled());
    }

    #[test]
    fn test_take_yield_request_consumes_flag() {
        let mut ints = SimInterruptController::new();
        ints.request_yield_on_return();
        assert!(ints.yield_requested());
        assert!(ints.take_yield_request());
        assert!(!ints.yield_requested());
        assert!(!ints.take_yield_request());
    }

    #[test]
    fn test_disabled_constructor() {
        let ints = SimInterruptController::disabled();
        assert!(!ints.interrupts_enabled());
    }
}
