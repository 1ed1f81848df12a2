//! Scheduling Test Utilities
//!
//! This crate provides shared helpers for the scheduling integration
//! tests.
//!
//! ## Test Philosophy
//!
//! - **Strict precedence**: A lower tier never runs while a higher
//!   tier holds a ready thread
//! - **Single membership**: A thread sits in at most one ready queue
//!   at any instant
//! - **No starvation**: Aging eventually promotes any waiting
//!   non-reserved thread
//! - **Deterministic schedules**: Same admissions and ticks produce
//!   the same dispatch order and the same audit log

use core_types::ThreadId;
use sim_kernel::{Kernel, QueueLevel, SchedulerConfig};

/// Boots a kernel with a short aging period so promotion tests finish
/// in a handful of ticks
pub fn fast_aging_kernel(period_to_aging: u64) -> Kernel {
    Kernel::with_config(SchedulerConfig {
        period_to_aging,
        ..SchedulerConfig::default()
    })
}

/// Spawns the classic three-band workload: one thread per tier
///
/// Returns `(top, mid, low)` in tier order.
pub fn spawn_three_bands(kernel: &mut Kernel) -> (ThreadId, ThreadId, ThreadId) {
    let top = kernel.spawn_user_thread("top", 120, 10);
    let mid = kernel.spawn_thread("mid", 70, 0);
    let low = kernel.spawn_thread("low", 20, 0);
    (top, mid, low)
}

/// Asserts that a thread occupies exactly the expected tier (or none)
pub fn assert_sole_membership(kernel: &Kernel, id: ThreadId, expected: Option<QueueLevel>) {
    assert_eq!(kernel.scheduler().queue_level_of(id), expected);
    let residencies = QueueLevel::ALL
        .into_iter()
        .filter(|&level| kernel.scheduler().queue_members(level).contains(&id))
        .count();
    assert_eq!(residencies, usize::from(expected.is_some()));
}
