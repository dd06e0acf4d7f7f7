//! Storage module for the order fulfillment system.
//!
//! This module defines the interfaces of the two storage collaborators the
//! engine depends on: the order store and the employee store. The employee
//! store exposes the atomic claim primitive the whole allocation protocol
//! rests on; the order store exposes a stage-conditional write so a stale
//! transition can never overwrite a newer one.

use async_trait::async_trait;
use fulfillment_types::{Employee, Order, Role, Stage};
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod memory;
}

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
	/// Error that occurs when a requested record is not found.
	#[error("Not found")]
	NotFound,
	/// Error that occurs when a conditional write loses its race.
	#[error("Conflict: {0}")]
	Conflict(String),
	/// Error that occurs in the storage backend.
	#[error("Backend error: {0}")]
	Backend(String),
}

/// Keyed record storage for orders.
///
/// Orders are keyed by `(location_id, order_id)`. Implementations must make
/// `update_if_stage` a single atomic check-and-set against the persisted
/// record.
#[async_trait]
pub trait OrderStore: Send + Sync {
	/// Retrieves an order by its composite key.
	async fn get(&self, location_id: &str, order_id: &str) -> Result<Order, StorageError>;

	/// Stores an order, creating or overwriting the record.
	async fn put(&self, order: &Order) -> Result<(), StorageError>;

	/// Writes an order only while the persisted record is still in
	/// `expected` stage.
	///
	/// Fails with [`StorageError::Conflict`] when another write moved the
	/// order first, and with [`StorageError::NotFound`] when the record does
	/// not exist.
	async fn update_if_stage(&self, order: &Order, expected: Stage) -> Result<(), StorageError>;
}

/// Keyed record storage for employees.
///
/// Employees are keyed by `(location_id, employee_id)`. The `try_claim`
/// operation is the single correctness-critical primitive of the allocation
/// protocol: among any number of concurrent claimants for one employee,
/// exactly one may succeed.
#[async_trait]
pub trait EmployeeStore: Send + Sync {
	/// Retrieves an employee by its composite key.
	async fn get(&self, location_id: &str, employee_id: &str) -> Result<Employee, StorageError>;

	/// Stores an employee, creating or overwriting the record.
	async fn put(&self, employee: &Employee) -> Result<(), StorageError>;

	/// Lists unoccupied employees of the given role at a location, in no
	/// particular order. Ranking is the caller's concern.
	async fn list_available(
		&self,
		location_id: &str,
		role: Role,
	) -> Result<Vec<Employee>, StorageError>;

	/// Atomically flips the employee's `occupied` flag from false to true.
	///
	/// Returns `Ok(true)` if this caller won the claim, `Ok(false)` if the
	/// employee was already occupied, and [`StorageError::NotFound`] if the
	/// employee does not exist.
	async fn try_claim(&self, location_id: &str, employee_id: &str)
		-> Result<bool, StorageError>;

	/// Unconditionally marks the employee as unoccupied.
	///
	/// Idempotent: releasing an already-free employee is a no-op, not an
	/// error.
	async fn release(&self, location_id: &str, employee_id: &str) -> Result<(), StorageError>;
}
