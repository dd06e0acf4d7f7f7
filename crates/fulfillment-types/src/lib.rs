//! Common types module for the order fulfillment system.
//!
//! This module defines the core data types and structures used throughout
//! the fulfillment system. It provides a centralized location for shared
//! types to ensure consistency across all components.

/// Employee and role types used for stage assignments.
pub mod employee;
/// Event types for inter-service communication.
pub mod events;
/// Order, stage, and history types for the fulfillment pipeline.
pub mod order;

// Re-export all types for convenient access
pub use employee::*;
pub use events::*;
pub use order::*;
