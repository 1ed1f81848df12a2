//! # Core Types
//!
//! This crate defines the fundamental identifier types used throughout
//! the simulated kernel.
//!
//! ## Philosophy
//!
//! Core types are designed with these principles:
//! - **Explicit over implicit**: Identifiers are typed and cannot be confused.
//! - **Determinism first**: Scheduling identifiers are sequential, so
//!   tie-breaking on id produces the same order on every run.
//!
//! ## Key Types
//!
//! - [`ThreadId`]: Sequential identifier for threads, used as the
//!   deterministic tie-breaker in ready-queue ordering
//! - [`AddressSpaceId`]: Unique identifier for user address spaces

pub mod ids;

pub use ids::{AddressSpaceId, ThreadId};
