//! Address space state for user threads
//!
//! This module provides the simulation-level view of a user address
//! space: just enough state to observe the save/restore protocol the
//! dispatcher follows around a context switch. There is no MMU
//! integration; real translation and protection belong to the memory
//! subsystem, which is outside this core.

use core_types::AddressSpaceId;
use serde::{Deserialize, Serialize};

/// Activation state of an address space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpaceState {
    /// The space's machine state is loaded on the processor
    Active,
    /// The space's machine state has been saved off the processor
    Saved,
}

/// Simulated user address space
///
/// Owned by user-mode threads; kernel-only threads have none. The
/// dispatcher saves this state when switching away from its owner and
/// restores it when the owner is switched back in.
#[derive(Debug, Clone)]
pub struct AddressSpace {
    id: AddressSpaceId,
    state: SpaceState,
    /// Number of times this space has been activated
    activations: u64,
}

impl AddressSpace {
    /// Creates a new address space in the saved state
    ///
    /// A fresh space is not on the processor until its owning thread is
    /// dispatched for the first time.
    pub fn new() -> Self {
        Self {
            id: AddressSpaceId::new(),
            state: SpaceState::Saved,
            activations: 0,
        }
    }

    /// Returns the address space id
    pub fn id(&self) -> AddressSpaceId {
        self.id
    }

    /// Returns the current activation state
    pub fn state(&self) -> SpaceState {
        self.state
    }

    /// Returns how many times this space has been activated
    pub fn activations(&self) -> u64 {
        self.activations
    }

    /// Saves the space's machine state off the processor
    pub fn save_state(&mut self) {
        self.state = SpaceState::Saved;
    }

    /// Restores the space's machine state onto the processor
    pub fn restore_state(&mut self) {
        self.state = SpaceState::Active;
        self.activations += 1;
    }
}

impl Default for AddressSpace {
    fn default() -> Self {
        Self::new()
    }
}
