//! Stage transition, finalization, and rollback engine.
//!
//! The engine owns every mutation of an order: advancing it along the
//! pipeline with a freshly claimed employee, confirming delivery, and
//! rolling back assignments on failure. All writes go through the order
//! store's stage-conditional update (rollback excepted, which is
//! last-write-wins by design), so a propagated error always leaves the
//! persisted order exactly as it was before the call.

use chrono::Utc;
use fulfillment_notify::Notifier;
use fulfillment_storage::{EmployeeStore, OrderStore, StorageError};
use fulfillment_types::{
	EmployeeRef, FulfillmentEvent, Order, OrderEvent, ReleaseReason, Stage, StageEntry,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::instrument;

use crate::event_bus::EventBus;
use crate::{assignment, state, EngineError};

/// Result of a rollback sweep over an order's employees.
///
/// Individual release failures are collected here rather than thrown; the
/// order's visible state stays consistent even when an employee remains
/// incorrectly occupied, which is an operational alert rather than a
/// state-machine error.
#[derive(Debug, Default, Serialize)]
pub struct ReleaseReport {
	/// Ids of employees released by the sweep.
	pub released: Vec<String>,
	/// Per-employee release failures, as `"<id>: <error>"`.
	pub errors: Vec<String>,
}

impl ReleaseReport {
	/// Number of employees the sweep released.
	pub fn released_count(&self) -> usize {
		self.released.len()
	}
}

/// Engine driving orders through the fulfillment pipeline.
pub struct FulfillmentEngine {
	orders: Arc<dyn OrderStore>,
	employees: Arc<dyn EmployeeStore>,
	notifier: Arc<dyn Notifier>,
	event_bus: EventBus,
}

impl FulfillmentEngine {
	pub fn new(
		orders: Arc<dyn OrderStore>,
		employees: Arc<dyn EmployeeStore>,
		notifier: Arc<dyn Notifier>,
		event_bus: EventBus,
	) -> Self {
		Self {
			orders,
			employees,
			notifier,
			event_bus,
		}
	}

	/// The engine's event bus, for subscribing to post-commit events.
	pub fn event_bus(&self) -> &EventBus {
		&self.event_bus
	}

	/// Advances an order to the next pipeline stage, claiming an employee of
	/// the stage's role.
	///
	/// Fails with `NotFound` if the order is absent, `InvalidTransition` if
	/// the order is not in the stage immediately preceding `target`, and
	/// `NoCapacity` when no employee of the required role can be claimed.
	/// Every failure leaves the persisted order untouched.
	#[instrument(skip(self))]
	pub async fn advance(
		&self,
		location_id: &str,
		order_id: &str,
		target: Stage,
	) -> Result<Order, EngineError> {
		let order = self.load(location_id, order_id).await?;

		// Hard precondition: the order must sit exactly one stage behind the
		// target. Never silently corrected.
		let role = match target.required_role() {
			Some(role) if state::is_valid_transition(order.stage, target) => role,
			_ => {
				return Err(EngineError::InvalidTransition {
					from: order.stage,
					to: target,
				})
			},
		};

		let candidates =
			assignment::select_candidates(&*self.employees, location_id, role).await?;
		if candidates.is_empty() {
			tracing::warn!(role = %role, "No candidates available");
			return Err(EngineError::NoCapacity { role });
		}

		let employees = Arc::clone(&self.employees);
		let location = location_id.to_string();
		let claimed = assignment::assign_first(candidates, move |id| {
			let employees = Arc::clone(&employees);
			let location = location.clone();
			async move { employees.try_claim(&location, &id).await }
		})
		.await
		.ok_or(EngineError::NoCapacity { role })?;

		let now = Utc::now();
		let mut updated = order.clone();
		let previous = updated.active_entry_mut().and_then(|entry| {
			let held = entry.employee.clone();
			entry.close(now);
			held
		});
		updated
			.history
			.push(StageEntry::open(target, now, Some(EmployeeRef::from(&claimed))));
		updated.stage = target;
		updated.updated_at = now;

		if let Err(e) = self.orders.update_if_stage(&updated, order.stage).await {
			// The claim must not outlive a failed commit.
			self.release_logged(location_id, &claimed.id).await;
			return Err(self.map_commit_error(e, location_id, order_id, target).await);
		}

		// The advance has committed; releasing the previous stage's employee
		// is a separate step whose failure must not roll it back.
		if let Some(prev) = previous {
			self.release_logged(location_id, &prev.id).await;
		}

		self.emit(
			&updated,
			OrderEvent::StageChanged {
				order_id: updated.order_id.clone(),
				customer_id: updated.customer_id.clone(),
				stage: target,
				employee: Some(EmployeeRef::from(&claimed)),
			},
		)
		.await;

		tracing::info!(
			employee_id = %claimed.id,
			stage = %target,
			"Order advanced"
		);
		Ok(updated)
	}

	/// Marks an order delivered after the customer confirmed receipt.
	///
	/// The order must be in `shipping`; otherwise fails with
	/// `InvalidTransition` and mutates nothing. Closes every open history
	/// entry, releases the employees those entries held, and clears the
	/// pending confirmation token.
	#[instrument(skip(self))]
	pub async fn confirm_delivery(
		&self,
		location_id: &str,
		order_id: &str,
	) -> Result<Order, EngineError> {
		let order = self.load(location_id, order_id).await?;
		if !state::is_valid_transition(order.stage, Stage::Delivered) {
			return Err(EngineError::InvalidTransition {
				from: order.stage,
				to: Stage::Delivered,
			});
		}

		let now = Utc::now();
		let mut updated = order.clone();
		let held = updated.close_open_entries(now);
		updated.stage = Stage::Delivered;
		updated.pending_confirmation_token = None;
		updated.updated_at = now;

		if let Err(e) = self.orders.update_if_stage(&updated, order.stage).await {
			return Err(self
				.map_commit_error(e, location_id, order_id, Stage::Delivered)
				.await);
		}

		for employee in held {
			self.release_logged(location_id, &employee.id).await;
		}

		self.emit(
			&updated,
			OrderEvent::Completed {
				order_id: updated.order_id.clone(),
				customer_id: updated.customer_id.clone(),
			},
		)
		.await;

		tracing::info!("Order delivered");
		Ok(updated)
	}

	/// Releases every employee an order ever held and closes its history.
	///
	/// Used by the outer driver on saturation, timeout, or irrecoverable
	/// error. The sweep covers every distinct employee referenced anywhere
	/// in the history; each release is attempted independently and failures
	/// are collected into the report, never thrown. Systemic reasons cancel
	/// the order; others leave the stage unchanged so the caller can retry
	/// the pipeline from the top.
	#[instrument(skip(self))]
	pub async fn release_order(
		&self,
		location_id: &str,
		order_id: &str,
		reason: ReleaseReason,
	) -> Result<ReleaseReport, EngineError> {
		let order = self.load(location_id, order_id).await?;

		let mut report = ReleaseReport::default();
		for employee in order.assigned_employees() {
			match self.employees.release(location_id, &employee.id).await {
				Ok(()) => {
					tracing::info!(
						employee_id = %employee.id,
						role = %employee.role,
						reason = %reason,
						"Employee released"
					);
					report.released.push(employee.id.clone());
				},
				Err(e) => {
					tracing::warn!(
						employee_id = %employee.id,
						error = %e,
						"Failed to release employee"
					);
					report.errors.push(format!("{}: {}", employee.id, e));
				},
			}
		}

		let now = Utc::now();
		let mut updated = order.clone();
		updated.close_open_entries(now);
		updated.pending_confirmation_token = None;
		let cancelled =
			reason.is_systemic() && state::is_valid_transition(order.stage, Stage::Cancelled);
		if cancelled {
			updated.stage = Stage::Cancelled;
		}
		updated.updated_at = now;

		// A rollback racing a transition resolves last-write-wins on the
		// order record; the losing side's claim or release is redundant, not
		// corrupting.
		self.orders.put(&updated).await?;

		if cancelled {
			self.emit(
				&updated,
				OrderEvent::Cancelled {
					order_id: updated.order_id.clone(),
					customer_id: updated.customer_id.clone(),
					reason,
				},
			)
			.await;
		}

		tracing::info!(
			released = report.released_count(),
			errors = report.errors.len(),
			cancelled,
			"Order released"
		);
		Ok(report)
	}

	/// Stores the opaque token the outer driver waits on for delivery
	/// confirmation. The order must be in `shipping`.
	#[instrument(skip(self, token))]
	pub async fn set_confirmation_token(
		&self,
		location_id: &str,
		order_id: &str,
		token: String,
	) -> Result<Order, EngineError> {
		let order = self.load(location_id, order_id).await?;
		if order.stage != Stage::Shipping {
			return Err(EngineError::InvalidTransition {
				from: order.stage,
				to: Stage::Delivered,
			});
		}

		let mut updated = order.clone();
		updated.pending_confirmation_token = Some(token);
		updated.updated_at = Utc::now();

		if let Err(e) = self.orders.update_if_stage(&updated, Stage::Shipping).await {
			return Err(self
				.map_commit_error(e, location_id, order_id, Stage::Delivered)
				.await);
		}
		Ok(updated)
	}

	/// Loads an order, mapping a storage miss to the engine's `NotFound`.
	async fn load(&self, location_id: &str, order_id: &str) -> Result<Order, EngineError> {
		self.orders
			.get(location_id, order_id)
			.await
			.map_err(|e| match e {
				StorageError::NotFound => EngineError::NotFound {
					location_id: location_id.to_string(),
					order_id: order_id.to_string(),
				},
				other => other.into(),
			})
	}

	/// Maps a failed conditional commit to an engine error. A conflict means
	/// the validated precondition no longer holds, so it surfaces as
	/// `InvalidTransition` against the stage the order actually reached.
	async fn map_commit_error(
		&self,
		error: StorageError,
		location_id: &str,
		order_id: &str,
		target: Stage,
	) -> EngineError {
		match error {
			StorageError::Conflict(_) => {
				let from = self
					.orders
					.get(location_id, order_id)
					.await
					.map(|o| o.stage)
					.unwrap_or(target);
				EngineError::InvalidTransition { from, to: target }
			},
			StorageError::NotFound => EngineError::NotFound {
				location_id: location_id.to_string(),
				order_id: order_id.to_string(),
			},
			other => other.into(),
		}
	}

	/// Releases an employee, logging instead of propagating failure. A stuck
	/// occupied employee is an operational alert, not a state-machine error.
	async fn release_logged(&self, location_id: &str, employee_id: &str) {
		if let Err(e) = self.employees.release(location_id, employee_id).await {
			tracing::warn!(
				employee_id = %employee_id,
				error = %e,
				"Failed to release employee"
			);
		}
	}

	/// Publishes a post-commit event and pushes the matching notification.
	/// Both are best-effort.
	async fn emit(&self, order: &Order, event: OrderEvent) {
		let payload = serde_json::to_value(&event).unwrap_or(serde_json::Value::Null);
		let event_type = event.event_type();
		self.event_bus.publish(FulfillmentEvent::Order(event));
		if let Err(e) = self
			.notifier
			.notify(&order.order_id, &order.customer_id, event_type, payload)
			.await
		{
			tracing::warn!(error = %e, "Notification failed");
		}
	}
}
