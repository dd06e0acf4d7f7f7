//! Core fulfillment engine for the order fulfillment system.
//!
//! This module provides the order-fulfillment state machine and its
//! employee-allocation protocol: validating an order's stage before
//! advancing, claiming a ranked candidate employee with race-safe fallback,
//! recording the assignment in the order's timed history, and releasing
//! employees on every transition, finalization, and rollback path.

use fulfillment_storage::StorageError;
use fulfillment_types::{Role, Stage};
use thiserror::Error;

pub mod assignment;
pub mod engine;
pub mod event_bus;
pub mod state;

pub use engine::{FulfillmentEngine, ReleaseReport};
pub use event_bus::EventBus;

/// Errors that can occur during fulfillment operations.
#[derive(Debug, Error)]
pub enum EngineError {
	/// The order does not exist.
	#[error("Order {order_id} not found at location {location_id}")]
	NotFound {
		location_id: String,
		order_id: String,
	},
	/// The order's current stage does not permit the requested transition.
	#[error("Invalid transition from {from} to {to}")]
	InvalidTransition { from: Stage, to: Stage },
	/// No employee of the required role could be claimed.
	#[error("No {role} available")]
	NoCapacity { role: Role },
	/// The storage backend failed.
	#[error("Storage error: {0}")]
	Storage(#[from] StorageError),
}
