//! # Simulated Context Switch
//!
//! In-process stand-in for the machine-level register/stack switch.
//!
//! The real primitive suspends the outgoing thread and resumes it at
//! the call site when some later hand-off switches back to it. The
//! simulation has no separate machine stacks, so `switch` records the
//! hand-off and returns immediately; the code following the call then
//! executes on behalf of the *incoming* thread, exactly as the
//! post-switch dispatch epilogue does on real hardware.

use core_types::ThreadId;
use hal::ContextSwitchHal;

/// Recorded hand-off between two threads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwitchRecord {
    pub from: ThreadId,
    pub to: ThreadId,
}

/// Simulated context switch that logs every hand-off
///
/// The log lets tests verify dispatch ordering, e.g. that a finishing
/// thread is reclaimed only after its hand-off was performed.
#[derive(Debug, Clone, Default)]
pub struct SimContextSwitch {
    switches: Vec<SwitchRecord>,
}

impl SimContextSwitch {
    /// Creates a switcher with an empty hand-off log
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all recorded hand-offs, oldest first
    pub fn switches(&self) -> &[SwitchRecord] {
        &self.switches
    }

    /// Returns the most recent hand-off, if any
    pub fn last_switch(&self) -> Option<SwitchRecord> {
        self.switches.last().copied()
    }

    /// Clears the hand-off log
    pub fn clear(&mut self) {
        self.switches.clear();
    }
}

impl ContextSwitchHal for SimContextSwitch {
    fn switch(&mut self, from: ThreadId, to: ThreadId) {
        self.switches.push(SwitchRecord { from, to });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_switch_is_recorded_in_order() {
        let a = ThreadId::from_raw(2);
        let b = ThreadId::from_raw(3);
        let mut switcher = SimContextSwitch::new();

        switcher.switch(a, b);
        switcher.switch(b, a);

        assert_eq!(
            switcher.switches(),
            &[SwitchRecord { from: a, to: b }, SwitchRecord { from: b, to: a }]
        );
        assert_eq!(switcher.last_switch(), Some(SwitchRecord { from: b, to: a }));
    }

    #[test]
    fn test_clear_empties_log() {
        let mut switcher = SimContextSwitch::new();
        switcher.switch(ThreadId::from_raw(0), ThreadId::from_raw(1));
        switcher.clear();
        assert!(switcher.switches().is_empty());
    }
}
