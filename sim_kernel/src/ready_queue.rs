//! Three-tier ready queue set
//!
//! Holds threads that are ready but not running. Each tier keeps its
//! own discipline: the top tier orders by burst-time estimate, the
//! middle tier by priority, the bottom tier by arrival. Ordering
//! decisions themselves live in the scheduler, which knows the thread
//! table; this module only maintains the queues.
//!
//! Membership is by thread id, and a thread is in at most one tier at
//! any instant. All mutation happens through scheduler operations while
//! interrupts are disabled.

use core_types::ThreadId;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

/// Identifies one of the three ready-queue tiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QueueLevel {
    /// Top tier: shortest burst-time estimate first
    L1,
    /// Middle tier: highest priority first
    L2,
    /// Bottom tier: first come, first served
    L3,
}

impl QueueLevel {
    /// All tiers in selection-precedence order
    pub const ALL: [QueueLevel; 3] = [QueueLevel::L1, QueueLevel::L2, QueueLevel::L3];
}

impl fmt::Display for QueueLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n = match self {
            QueueLevel::L1 => 1,
            QueueLevel::L2 => 2,
            QueueLevel::L3 => 3,
        };
        write!(f, "L[{}]", n)
    }
}

/// The three ready queues
#[derive(Debug, Clone, Default)]
pub(crate) struct ReadyQueueSet {
    l1: VecDeque<ThreadId>,
    l2: VecDeque<ThreadId>,
    l3: VecDeque<ThreadId>,
}

impl ReadyQueueSet {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn queue(&self, level: QueueLevel) -> &VecDeque<ThreadId> {
        match level {
            QueueLevel::L1 => &self.l1,
            QueueLevel::L2 => &self.l2,
            QueueLevel::L3 => &self.l3,
        }
    }

    fn queue_mut(&mut self, level: QueueLevel) -> &mut VecDeque<ThreadId> {
        match level {
            QueueLevel::L1 => &mut self.l1,
            QueueLevel::L2 => &mut self.l2,
            QueueLevel::L3 => &mut self.l3,
        }
    }

    /// Membership test within one tier
    pub(crate) fn contains(&self, level: QueueLevel, id: ThreadId) -> bool {
        self.queue(level).contains(&id)
    }

    /// Returns the tier a thread currently sits in, if any
    pub(crate) fn level_of(&self, id: ThreadId) -> Option<QueueLevel> {
        QueueLevel::ALL
            .into_iter()
            .find(|&level| self.contains(level, id))
    }

    /// Returns the first thread of a tier without removing it
    pub(crate) fn head(&self, level: QueueLevel) -> Option<ThreadId> {
        self.queue(level).front().copied()
    }

    /// Removes and returns the first thread of a tier
    pub(crate) fn pop_head(&mut self, level: QueueLevel) -> Option<ThreadId> {
        self.queue_mut(level).pop_front()
    }

    /// Appends a thread at the tail of a tier (FIFO discipline)
    pub(crate) fn push_back(&mut self, level: QueueLevel, id: ThreadId) {
        self.queue_mut(level).push_back(id);
    }

    /// Inserts a thread keeping the tier ordered
    ///
    /// `precedes(a, b)` must return whether `a` goes strictly before
    /// `b` under the tier's discipline. The thread lands before the
    /// first member it precedes, or at the tail. Equal keys therefore
    /// keep insertion order, but the disciplines used here always
    /// tie-break on the unique thread id.
    pub(crate) fn insert_ordered<F>(&mut self, level: QueueLevel, id: ThreadId, precedes: F)
    where
        F: Fn(ThreadId, ThreadId) -> bool,
    {
        let queue = self.queue_mut(level);
        let position = queue
            .iter()
            .position(|&member| precedes(id, member))
            .unwrap_or(queue.len());
        queue.insert(position, id);
    }

    /// Removes a specific thread from a tier; no-op if absent
    pub(crate) fn remove(&mut self, level: QueueLevel, id: ThreadId) {
        self.queue_mut(level).retain(|&member| member != id);
    }

    /// Snapshot of a tier's membership, head first
    ///
    /// The aging pass iterates over this snapshot so that relocations
    /// mid-pass cannot skip or double-visit a thread.
    pub(crate) fn members(&self, level: QueueLevel) -> Vec<ThreadId> {
        self.queue(level).iter().copied().collect()
    }

    /// Number of threads in a tier
    pub(crate) fn len(&self, level: QueueLevel) -> usize {
        self.queue(level).len()
    }

    /// Whether a tier holds no threads
    pub(crate) fn is_empty(&self, level: QueueLevel) -> bool {
        self.queue(level).is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: u64) -> ThreadId {
        ThreadId::from_raw(raw)
    }

    #[test]
    fn test_new_set_is_empty() {
        let queues = ReadyQueueSet::new();
        for level in QueueLevel::ALL {
            assert!(queues.is_empty(level));
            assert_eq!(queues.head(level), None);
        }
    }

    #[test]
    fn test_fifo_append_and_pop() {
        let mut queues = ReadyQueueSet::new();
        queues.push_back(QueueLevel::L3, id(4));
        queues.push_back(QueueLevel::L3, id(2));
        queues.push_back(QueueLevel::L3, id(9));

        assert_eq!(queues.pop_head(QueueLevel::L3), Some(id(4)));
        assert_eq!(queues.pop_head(QueueLevel::L3), Some(id(2)));
        assert_eq!(queues.pop_head(QueueLevel::L3), Some(id(9)));
        assert_eq!(queues.pop_head(QueueLevel::L3), None);
    }

    #[test]
    fn test_ordered_insert_respects_predicate() {
        // Order ascending by raw id.
        let mut queues = ReadyQueueSet::new();
        let asc = |a: ThreadId, b: ThreadId| a.as_raw() < b.as_raw();
        queues.insert_ordered(QueueLevel::L1, id(5), asc);
        queues.insert_ordered(QueueLevel::L1, id(3), asc);
        queues.insert_ordered(QueueLevel::L1, id(8), asc);

        assert_eq!(queues.members(QueueLevel::L1), vec![id(3), id(5), id(8)]);
    }

    #[test]
    fn test_membership_is_per_tier() {
        let mut queues = ReadyQueueSet::new();
        queues.push_back(QueueLevel::L2, id(7));

        assert!(queues.contains(QueueLevel::L2, id(7)));
        assert!(!queues.contains(QueueLevel::L1, id(7)));
        assert_eq!(queues.level_of(id(7)), Some(QueueLevel::L2));
        assert_eq!(queues.level_of(id(8)), None);
    }

    #[test]
    fn test_remove_specific_member() {
        let mut queues = ReadyQueueSet::new();
        queues.push_back(QueueLevel::L3, id(1));
        queues.push_back(QueueLevel::L3, id(2));
        queues.push_back(QueueLevel::L3, id(3));

        queues.remove(QueueLevel::L3, id(2));
        assert_eq!(queues.members(QueueLevel::L3), vec![id(1), id(3)]);

        // Removing an absent member is a silent no-op.
        queues.remove(QueueLevel::L3, id(2));
        assert_eq!(queues.len(QueueLevel::L3), 2);
    }

    #[test]
    fn test_members_snapshot_is_detached() {
        let mut queues = ReadyQueueSet::new();
        queues.push_back(QueueLevel::L3, id(1));
        let snapshot = queues.members(QueueLevel::L3);
        queues.pop_head(QueueLevel::L3);
        assert_eq!(snapshot, vec![id(1)]);
    }

    #[test]
    fn test_level_display() {
        assert_eq!(format!("{}", QueueLevel::L1), "L[1]");
        assert_eq!(format!("{}", QueueLevel::L3), "L[3]");
    }
}
