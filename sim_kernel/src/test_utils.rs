//! Test utilities for scheduler and kernel tests
//!
//! This module provides helpers for driving the scheduler directly,
//! without booting a full [`crate::Kernel`]. Tests get a scheduler, a
//! simulated interrupt controller already inside the critical section,
//! a recording context switcher, and a tick counter, all wired the way
//! the kernel wires them.

use crate::address_space::AddressSpace;
use crate::context::SimContextSwitch;
use crate::interrupt::SimInterruptController;
use crate::scheduler::{Scheduler, SchedulerConfig};
use crate::stats::Statistics;
use crate::thread::Thread;
use core_types::ThreadId;

/// Builds a kernel-only thread for tests
pub fn kernel_thread(raw_id: u64, name: &str, priority: u32) -> Thread {
    Thread::new(ThreadId::from_raw(raw_id), name, priority)
}

/// Builds a user-mode thread (with an address space) for tests
pub fn user_thread(raw_id: u64, name: &str, priority: u32, burst_time: u32) -> Thread {
    Thread::new(ThreadId::from_raw(raw_id), name, priority)
        .with_burst_time(burst_time)
        .with_address_space(AddressSpace::new())
}

/// Scheduler plus its collaborators, pre-wired for tests
///
/// Interrupts start disabled: the harness lives permanently inside the
/// critical section, the way the scheduler expects to be called.
pub struct SchedulerHarness {
    pub scheduler: Scheduler,
    pub interrupts: SimInterruptController,
    pub switcher: SimContextSwitch,
    pub stats: Statistics,
}

impl SchedulerHarness {
    /// Harness with the default scheduling policy
    pub fn new() -> Self {
        Self::with_config(SchedulerConfig::default())
    }

    /// Harness with a custom scheduling policy
    pub fn with_config(config: SchedulerConfig) -> Self {
        Self {
            scheduler: Scheduler::with_config(config),
            interrupts: SimInterruptController::disabled(),
            switcher: SimContextSwitch::new(),
            stats: Statistics::new(),
        }
    }

    /// Registers a thread and installs it as the running thread
    pub fn install_running(&mut self, thread: Thread) {
        let id = thread.id();
        self.scheduler.register_thread(thread);
        self.scheduler.set_current(id);
    }

    /// Registers a thread and admits it to the ready queues
    pub fn admit(&mut self, thread: Thread) {
        let id = thread.id();
        let now = self.stats.total_ticks();
        self.scheduler.register_thread(thread);
        self.scheduler.ready_to_run(id, &mut self.interrupts, now);
    }

    /// Re-admits an already registered thread
    pub fn readmit(&mut self, id: ThreadId) {
        let now = self.stats.total_ticks();
        self.scheduler.ready_to_run(id, &mut self.interrupts, now);
    }

    /// Selects the next thread to run, removing it from its queue
    pub fn select(&mut self) -> Option<ThreadId> {
        let now = self.stats.total_ticks();
        self.scheduler.find_next_to_run(&self.interrupts, now)
    }

    /// Dispatches the processor to `next`
    pub fn dispatch(&mut self, next: ThreadId, finishing: bool) {
        let now = self.stats.total_ticks();
        self.scheduler
            .run(next, finishing, &self.interrupts, &mut self.switcher, now);
    }

    /// Advances one timer tick and runs the aging pass
    pub fn tick(&mut self) {
        self.stats.advance(1);
        let now = self.stats.total_ticks();
        self.scheduler.increase_wait_time(&mut self.interrupts, now);
    }
}

impl Default for SchedulerHarness {
    fn default() -> Self {
        Self::new()
    }
}
