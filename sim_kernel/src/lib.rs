//! # Simulated Kernel
//!
//! This crate provides the CPU scheduling core of a teaching kernel as
//! a simulated, in-process implementation.
//!
//! ## Purpose
//!
//! The simulated kernel allows testing scheduling behavior without
//! hardware:
//! - Runs under `cargo test`
//! - Deterministic (controlled ticks, no real concurrency)
//! - Fast (no real context switches)
//! - Inspectable (queues, statuses, and the audit log are accessible)
//!
//! ## Philosophy
//!
//! **Testability is a first-class design constraint.**
//!
//! Scheduler code is usually hard to test because it is welded to the
//! machine. Here the machine-dependent pieces (interrupt level,
//! context switch, tick source) are `hal` traits with deterministic
//! simulations, so every ordering rule and every invariant of the core
//! can be exercised in isolation.
//!
//! ## Structure
//!
//! [`Scheduler`] is the heart: a three-tier feedback queue with
//! admission, selection, dispatch, deferred destruction, and aging.
//! [`Kernel`] wires it to the simulated collaborators and provides the
//! thread factory plus the lifecycle entry points (`yield`, `finish`,
//! `sleep`/`wake`, timer tick) the rest of a kernel would call.

pub mod address_space;
pub mod context;
pub mod interrupt;
pub mod ready_queue;
pub mod scheduler;
pub mod stats;
pub mod test_utils;
pub mod thread;

pub use address_space::{AddressSpace, SpaceState};
pub use context::{SimContextSwitch, SwitchRecord};
pub use interrupt::SimInterruptController;
pub use ready_queue::QueueLevel;
pub use scheduler::{ConfigError, ScheduleEvent, Scheduler, SchedulerConfig};
pub use stats::Statistics;
pub use thread::{Thread, ThreadStatus};

use core_types::ThreadId;
use hal::InterruptHal;

/// Id of the boot thread, running when the kernel comes up
pub const BOOT_THREAD_ID: ThreadId = ThreadId::from_raw(0);

/// Id of the idle thread, schedulable only as a last resort
pub const IDLE_THREAD_ID: ThreadId = ThreadId::from_raw(1);

/// Simulated kernel context
///
/// Owns the scheduler and its collaborators, assigns sequential thread
/// ids, and brackets every scheduler call with the interrupts-disabled
/// critical section a real kernel would use.
pub struct Kernel {
    scheduler: Scheduler,
    interrupts: SimInterruptController,
    stats: Statistics,
    switcher: SimContextSwitch,
    next_thread_id: u64,
}

impl Kernel {
    /// Boots a kernel with the default scheduling policy
    pub fn new() -> Self {
        Self::with_config(SchedulerConfig::default())
    }

    /// Boots a kernel with a custom scheduling policy
    ///
    /// The boot thread (id 0) comes up running; the idle thread (id 1)
    /// is parked in the bottom ready tier as the scheduler's last
    /// resort.
    pub fn with_config(config: SchedulerConfig) -> Self {
        let mut kernel = Self {
            scheduler: Scheduler::with_config(config),
            interrupts: SimInterruptController::new(),
            stats: Statistics::new(),
            switcher: SimContextSwitch::new(),
            next_thread_id: 2,
        };

        kernel
            .scheduler
            .register_thread(Thread::new(BOOT_THREAD_ID, "boot", 0));
        kernel.scheduler.set_current(BOOT_THREAD_ID);

        kernel
            .scheduler
            .register_thread(Thread::new(IDLE_THREAD_ID, "idle", 0));
        kernel.with_interrupts_off(|k| {
            let now = k.stats.total_ticks();
            k.scheduler
                .ready_to_run(IDLE_THREAD_ID, &mut k.interrupts, now);
        });

        kernel
    }

    /// Creates and admits a kernel-only thread
    ///
    /// Ids are handed out sequentially, so spawn order fully determines
    /// every tie-break.
    pub fn spawn_thread(&mut self, name: &str, priority: u32, burst_time: u32) -> ThreadId {
        let thread = self.make_thread(name, priority, burst_time);
        self.admit(thread)
    }

    /// Creates and admits a user-mode thread with a fresh address space
    pub fn spawn_user_thread(&mut self, name: &str, priority: u32, burst_time: u32) -> ThreadId {
        let thread = self
            .make_thread(name, priority, burst_time)
            .with_address_space(AddressSpace::new());
        self.admit(thread)
    }

    fn make_thread(&mut self, name: &str, priority: u32, burst_time: u32) -> Thread {
        let id = ThreadId::from_raw(self.next_thread_id);
        self.next_thread_id += 1;
        Thread::new(id, name, priority).with_burst_time(burst_time)
    }

    fn admit(&mut self, thread: Thread) -> ThreadId {
        let id = thread.id();
        self.scheduler.register_thread(thread);
        self.with_interrupts_off(|k| {
            let now = k.stats.total_ticks();
            k.scheduler.ready_to_run(id, &mut k.interrupts, now);
        });
        id
    }

    /// Returns the running thread's id
    ///
    /// # Panics
    ///
    /// Panics if no thread is running; after boot there always is one.
    pub fn running_thread(&self) -> ThreadId {
        self.scheduler
            .current_thread()
            .unwrap_or_else(|| panic!("kernel has no running thread"))
    }

    /// Yields the processor from the running thread
    ///
    /// The yielder is readmitted to the ready queues *after* the
    /// successor is selected, so it cannot immediately reclaim the
    /// processor from an equal-priority peer. If nothing else is ready
    /// the call is a no-op.
    pub fn yield_current(&mut self) {
        self.with_interrupts_off(|k| {
            let now = k.stats.total_ticks();
            if let Some(next) = k.scheduler.find_next_to_run(&k.interrupts, now) {
                let current = k.running_thread();
                k.scheduler.ready_to_run(current, &mut k.interrupts, now);
                k.scheduler
                    .run(next, false, &k.interrupts, &mut k.switcher, now);
            }
        });
    }

    /// Finishes the running thread
    ///
    /// The thread hands the processor to the next ready thread and is
    /// reclaimed once that hand-off completes, never earlier, because
    /// until the switch it is still executing on its own stack.
    ///
    /// # Panics
    ///
    /// Panics if no ready thread exists to take over. The idle thread
    /// makes that unreachable unless it is the idle thread finishing.
    pub fn finish_current(&mut self) {
        self.with_interrupts_off(|k| {
            let now = k.stats.total_ticks();
            let next = k
                .scheduler
                .find_next_to_run(&k.interrupts, now)
                .unwrap_or_else(|| panic!("finishing thread has no successor to run"));
            k.scheduler
                .run(next, true, &k.interrupts, &mut k.switcher, now);
        });
    }

    /// Blocks the running thread until [`Kernel::wake`]
    ///
    /// # Panics
    ///
    /// Panics if no ready thread exists to take over.
    pub fn sleep_current(&mut self) {
        self.with_interrupts_off(|k| {
            let now = k.stats.total_ticks();
            let current = k.running_thread();
            k.scheduler.block_thread(current);
            let next = k
                .scheduler
                .find_next_to_run(&k.interrupts, now)
                .unwrap_or_else(|| panic!("sleeping thread has no successor to run"));
            k.scheduler
                .run(next, false, &k.interrupts, &mut k.switcher, now);
        });
    }

    /// Wakes a blocked thread by readmitting it to the ready queues
    pub fn wake(&mut self, id: ThreadId) {
        self.with_interrupts_off(|k| {
            let now = k.stats.total_ticks();
            k.scheduler.ready_to_run(id, &mut k.interrupts, now);
        });
    }

    /// Handles one timer tick
    ///
    /// Advances the statistics counter, runs the aging pass, and honors
    /// a pending deferred-yield request at this safe point.
    pub fn on_timer_tick(&mut self) {
        self.stats.advance(1);
        self.with_interrupts_off(|k| {
            let now = k.stats.total_ticks();
            k.scheduler.increase_wait_time(&mut k.interrupts, now);
        });
        if self.interrupts.take_yield_request() {
            self.yield_current();
        }
    }

    /// Returns the current statistics tick
    pub fn now(&self) -> u64 {
        self.stats.total_ticks()
    }

    /// Returns the scheduler for inspection
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Returns the interrupt controller for inspection
    pub fn interrupts(&self) -> &SimInterruptController {
        &self.interrupts
    }

    /// Returns every hand-off performed so far, oldest first
    pub fn switch_log(&self) -> &[SwitchRecord] {
        self.switcher.switches()
    }

    fn with_interrupts_off<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        let previous = self.interrupts.set_enabled(false);
        let result = f(self);
        self.interrupts.set_enabled(previous);
        result
    }
}

impl Default for Kernel {
    fn default() -> Self {
        Self::new()
    }
}
