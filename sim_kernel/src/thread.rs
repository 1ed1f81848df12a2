//! Thread control block
//!
//! A thread is the unit of execution the scheduler manages: an id, the
//! mutable scheduling fields (priority, burst estimate, wait time,
//! status), an optional owned address space for user-mode threads, and
//! a simulated kernel stack with an integrity fencepost.

use crate::address_space::AddressSpace;
use core_types::ThreadId;
use serde::{Deserialize, Serialize};

/// Size of the simulated kernel stack, in bytes
pub const KERNEL_STACK_BYTES: usize = 4096;

/// Sentinel written at the far end of the kernel stack
///
/// If any of these bytes change, the stack grew past its allocation at
/// some point while the thread ran.
const STACK_FENCEPOST: [u8; 4] = [0xde, 0xad, 0xbe, 0xef];

/// Execution status of a thread
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ThreadStatus {
    /// Waiting in a ready queue for the processor
    Ready,
    /// Currently on the processor (at most one thread at a time)
    Running,
    /// Waiting on some event; not schedulable
    Blocked,
    /// Done executing; awaiting deferred reclamation
    Finished,
}

/// Thread control block
///
/// Created by the kernel's thread factory, which assigns sequential
/// ids. All scheduling-relevant mutation goes through the accessors
/// below; the scheduler is the only component expected to call them.
#[derive(Debug)]
pub struct Thread {
    id: ThreadId,
    name: String,
    priority: u32,
    /// Estimate of remaining service demand; orders the top-tier queue
    burst_time: u32,
    /// Ticks spent waiting in a ready queue since the last reset
    wait_time: u64,
    status: ThreadStatus,
    /// Present only for user-mode threads
    address_space: Option<AddressSpace>,
    /// Simulated kernel stack; the fencepost lives at the far end
    kernel_stack: Vec<u8>,
    /// Whether the thread's user registers are saved off the processor
    user_state_saved: bool,
}

impl Thread {
    /// Creates a new kernel-only thread
    ///
    /// The thread starts blocked; admission via the scheduler makes it
    /// ready.
    pub fn new(id: ThreadId, name: impl Into<String>, priority: u32) -> Self {
        let mut kernel_stack = vec![0u8; KERNEL_STACK_BYTES];
        kernel_stack[..STACK_FENCEPOST.len()].copy_from_slice(&STACK_FENCEPOST);
        Self {
            id,
            name: name.into(),
            priority,
            burst_time: 0,
            wait_time: 0,
            status: ThreadStatus::Blocked,
            address_space: None,
            kernel_stack,
            user_state_saved: false,
        }
    }

    /// Sets the burst-time estimate (builder style)
    pub fn with_burst_time(mut self, burst_time: u32) -> Self {
        self.burst_time = burst_time;
        self
    }

    /// Attaches a user address space (builder style)
    pub fn with_address_space(mut self, space: AddressSpace) -> Self {
        self.address_space = Some(space);
        self
    }

    /// Returns the thread id
    pub fn id(&self) -> ThreadId {
        self.id
    }

    /// Returns the thread name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the current scheduling priority
    pub fn priority(&self) -> u32 {
        self.priority
    }

    /// Sets the scheduling priority
    pub fn set_priority(&mut self, priority: u32) {
        self.priority = priority;
    }

    /// Returns the burst-time estimate
    pub fn burst_time(&self) -> u32 {
        self.burst_time
    }

    /// Sets the burst-time estimate
    pub fn set_burst_time(&mut self, burst_time: u32) {
        self.burst_time = burst_time;
    }

    /// Returns ticks waited in a ready queue since the last reset
    pub fn wait_time(&self) -> u64 {
        self.wait_time
    }

    /// Sets the ready-queue wait time
    pub fn set_wait_time(&mut self, wait_time: u64) {
        self.wait_time = wait_time;
    }

    /// Returns the execution status
    pub fn status(&self) -> ThreadStatus {
        self.status
    }

    /// Sets the execution status
    pub fn set_status(&mut self, status: ThreadStatus) {
        self.status = status;
    }

    /// Returns whether this is a user-mode thread
    pub fn has_address_space(&self) -> bool {
        self.address_space.is_some()
    }

    /// Returns the owned address space, if any
    pub fn address_space(&self) -> Option<&AddressSpace> {
        self.address_space.as_ref()
    }

    /// Returns the owned address space mutably, if any
    pub fn address_space_mut(&mut self) -> Option<&mut AddressSpace> {
        self.address_space.as_mut()
    }

    /// Returns whether the user registers are saved off the processor
    pub fn user_state_saved(&self) -> bool {
        self.user_state_saved
    }

    /// Saves the thread's user-mode register state
    ///
    /// Called by the dispatcher before switching away from a user
    /// thread. In simulation this only flips the bookkeeping flag.
    pub fn save_user_state(&mut self) {
        self.user_state_saved = true;
    }

    /// Restores the thread's user-mode register state
    ///
    /// Called by the dispatcher after the thread is switched back in.
    pub fn restore_user_state(&mut self) {
        self.user_state_saved = false;
    }

    /// Verifies the kernel stack fencepost is intact
    ///
    /// An overwritten fencepost means the stack overflowed at some point
    /// while the thread ran. That is an unrecoverable kernel fault.
    pub fn check_overflow(&self) {
        assert!(
            self.kernel_stack[..STACK_FENCEPOST.len()] == STACK_FENCEPOST,
            "kernel stack overflow detected on {}",
            self.id
        );
    }

    #[cfg(test)]
    pub(crate) fn corrupt_stack_for_test(&mut self) {
        self.kernel_stack[0] = 0;
    }
}
