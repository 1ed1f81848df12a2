//! # Hardware Abstraction Layer (HAL)
//!
//! This crate defines the hardware trait seams the scheduling core
//! depends on.
//!
//! ## Philosophy
//!
//! **Machine dependence must be fully abstracted and swappable.**
//!
//! The scheduler never touches hardware directly. Interrupt level
//! control, the low-level context switch, and the tick source are all
//! traits, so the core logic runs unchanged against real hardware or
//! against the deterministic simulations used in tests.
//!
//! ## Design Principles
//!
//! 1. **Trait-based**: All machine operations go through traits
//! 2. **Testable**: Every trait has a trivial in-process implementation
//! 3. **Semantics over mechanism**: The context-switch contract specifies
//!    what the caller observes, not how the switch is performed

pub mod context;
pub mod interrupts;
pub mod timer;

pub use context::ContextSwitchHal;
pub use interrupts::InterruptHal;
pub use timer::TimerDevice;
