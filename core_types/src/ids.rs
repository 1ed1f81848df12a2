//! Unique identifiers for kernel entities

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a thread
///
/// Thread ids are assigned sequentially by the kernel's thread factory
/// and are never reused while a thread is live. Because they are
/// strictly increasing, they double as a deterministic tie-breaker
/// whenever two threads compare equal on a scheduling key.
///
/// The lowest ids are reserved for the boot and idle threads.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct ThreadId(u64);

impl ThreadId {
    /// Creates a thread id from a raw counter value
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw counter value
    pub const fn as_raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Thread({})", self.0)
    }
}

/// Unique identifier for a user address space
///
/// Address spaces exist only for user-mode threads; kernel-only threads
/// have none. Unlike thread ids, address space ids carry no ordering
/// meaning, so a random UUID is sufficient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AddressSpaceId(Uuid);

impl AddressSpaceId {
    /// Creates a new random address space ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an address space ID from a UUID
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner UUID
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for AddressSpaceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AddressSpaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Space({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thread_id_round_trip() {
        let id = ThreadId::from_raw(7);
        assert_eq!(id.as_raw(), 7);
    }

    #[test]
    fn test_thread_id_ordering_follows_raw_value() {
        let low = ThreadId::from_raw(2);
        let high = ThreadId::from_raw(9);
        assert!(low < high);
        assert_eq!(low.max(high), high);
    }

    #[test]
    fn test_thread_id_display() {
        let id = ThreadId::from_raw(3);
        assert_eq!(format!("{}", id), "Thread(3)");
    }

    #[test]
    fn test_thread_id_serde_round_trip() {
        let id = ThreadId::from_raw(42);
        let json = serde_json::to_string(&id).unwrap();
        let back: ThreadId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }

    #[test]
    fn test_address_space_id_creation() {
        let id1 = AddressSpaceId::new();
        let id2 = AddressSpaceId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_address_space_id_from_uuid() {
        let uuid = Uuid::new_v4();
        let id = AddressSpaceId::from_uuid(uuid);
        assert_eq!(id.as_uuid(), uuid);
    }

    #[test]
    fn test_address_space_id_display() {
        let id = AddressSpaceId::new();
        let display = format!("{}", id);
        assert!(display.starts_with("Space("));
    }
}
