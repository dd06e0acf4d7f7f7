//! Order and pipeline stage types for the fulfillment system.
//!
//! This module defines the order record, its stage enum, and the timed
//! history entries that record which employee worked each stage. The stage
//! enum also carries the fixed pipeline tables (prior stage, required role)
//! that the transition engine validates against.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{EmployeeRef, Role};

/// Stage of an order in the fulfillment pipeline.
///
/// Orders move along the fixed chain
/// `processing -> cooking -> packing -> shipping -> delivered`, or from any
/// non-terminal stage to `cancelled` via a rollback.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
	/// Order has been created and is awaiting a cook.
	Processing,
	/// A cook is preparing the order.
	Cooking,
	/// A packer is packing the order.
	Packing,
	/// A courier is delivering the order.
	Shipping,
	/// The customer confirmed receipt. Terminal.
	Delivered,
	/// The order was rolled back. Terminal.
	Cancelled,
}

impl Stage {
	/// Returns the stage an order must currently be in for this stage to be
	/// a valid `advance` target. `None` for stages that are never targets of
	/// a plain advance (the initial stage and both terminals).
	pub fn expected_prior(&self) -> Option<Stage> {
		match self {
			Stage::Cooking => Some(Stage::Processing),
			Stage::Packing => Some(Stage::Cooking),
			Stage::Shipping => Some(Stage::Packing),
			Stage::Processing | Stage::Delivered | Stage::Cancelled => None,
		}
	}

	/// Returns the employee role this stage requires, if any.
	pub fn required_role(&self) -> Option<Role> {
		match self {
			Stage::Cooking => Some(Role::Cook),
			Stage::Packing => Some(Role::Packer),
			Stage::Shipping => Some(Role::Courier),
			Stage::Processing | Stage::Delivered | Stage::Cancelled => None,
		}
	}

	/// Returns true for stages that accept no further transitions.
	pub fn is_terminal(&self) -> bool {
		matches!(self, Stage::Delivered | Stage::Cancelled)
	}
}

impl fmt::Display for Stage {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let s = match self {
			Stage::Processing => "processing",
			Stage::Cooking => "cooking",
			Stage::Packing => "packing",
			Stage::Shipping => "shipping",
			Stage::Delivered => "delivered",
			Stage::Cancelled => "cancelled",
		};
		write!(f, "{}", s)
	}
}

/// One timed entry in an order's stage history.
///
/// At most one entry is open (`active = true`) at any time. Entries for
/// `processing` and the terminal stages never carry an employee.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StageEntry {
	/// The stage this entry records.
	pub stage: Stage,
	/// When the stage started.
	pub started_at: DateTime<Utc>,
	/// When the stage ended; `None` while the entry is open.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub ended_at: Option<DateTime<Utc>>,
	/// Whether this entry is the order's currently running stage.
	pub active: bool,
	/// The employee working this stage, if the stage requires one.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub employee: Option<EmployeeRef>,
}

impl StageEntry {
	/// Creates an open entry starting now.
	pub fn open(stage: Stage, started_at: DateTime<Utc>, employee: Option<EmployeeRef>) -> Self {
		Self {
			stage,
			started_at,
			ended_at: None,
			active: true,
			employee,
		}
	}

	/// Closes the entry, filling `ended_at` if it is still unset.
	pub fn close(&mut self, ended_at: DateTime<Utc>) {
		self.active = false;
		if self.ended_at.is_none() {
			self.ended_at = Some(ended_at);
		}
	}
}

/// An order moving through the fulfillment pipeline.
///
/// Identity is the composite `(location_id, order_id)` and is immutable once
/// created. The record is mutated only by the transition engine (advancing
/// the stage, appending and closing history) and by the finalization and
/// rollback paths.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
	/// Location the order belongs to.
	pub location_id: String,
	/// Unique identifier of the order within its location.
	pub order_id: String,
	/// Identifier of the customer who placed the order, used for
	/// notifications.
	pub customer_id: String,
	/// Current pipeline stage.
	pub stage: Stage,
	/// Ordered stage history; append-only except for closing the open entry.
	pub history: Vec<StageEntry>,
	/// Opaque token set while the order waits for an external delivery
	/// confirmation; cleared on finalize or rollback.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub pending_confirmation_token: Option<String>,
	/// Timestamp when this order was created.
	pub created_at: DateTime<Utc>,
	/// Timestamp when this order was last updated.
	pub updated_at: DateTime<Utc>,
}

impl Order {
	/// Creates a new order in `processing` with one open history entry and
	/// no employee.
	pub fn new(
		location_id: impl Into<String>,
		order_id: impl Into<String>,
		customer_id: impl Into<String>,
		now: DateTime<Utc>,
	) -> Self {
		Self {
			location_id: location_id.into(),
			order_id: order_id.into(),
			customer_id: customer_id.into(),
			stage: Stage::Processing,
			history: vec![StageEntry::open(Stage::Processing, now, None)],
			pending_confirmation_token: None,
			created_at: now,
			updated_at: now,
		}
	}

	/// Returns the currently open history entry, if any.
	pub fn active_entry(&self) -> Option<&StageEntry> {
		self.history.iter().find(|e| e.active)
	}

	/// Mutable access to the currently open history entry.
	pub fn active_entry_mut(&mut self) -> Option<&mut StageEntry> {
		self.history.iter_mut().find(|e| e.active)
	}

	/// Closes every open history entry and returns the employees those
	/// entries referenced. More than one open entry should never exist, but
	/// sweeping them all is safe and idempotent.
	pub fn close_open_entries(&mut self, now: DateTime<Utc>) -> Vec<EmployeeRef> {
		let mut held = Vec::new();
		for entry in self.history.iter_mut().filter(|e| e.active) {
			if let Some(employee) = &entry.employee {
				held.push(employee.clone());
			}
			entry.close(now);
		}
		held
	}

	/// Returns every distinct employee referenced anywhere in the history,
	/// active or not, deduplicated by id in first-seen order.
	pub fn assigned_employees(&self) -> Vec<EmployeeRef> {
		let mut seen = Vec::new();
		for entry in &self.history {
			if let Some(employee) = &entry.employee {
				if !seen
					.iter()
					.any(|e: &EmployeeRef| e.id == employee.id)
				{
					seen.push(employee.clone());
				}
			}
		}
		seen
	}
}

/// Reason supplied when rolling back an order's employee assignments.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReleaseReason {
	/// No capacity anywhere in the pipeline; the order cannot proceed.
	Saturated,
	/// The outer driver gave up after retrying; the order is abandoned.
	ExhaustedRetries,
	/// A stage timed out; the caller may reset and retry the pipeline.
	Timeout,
	/// A workflow step failed; the caller may reset and retry the pipeline.
	WorkflowError,
}

impl ReleaseReason {
	/// Systemic reasons cancel the order outright; the rest leave the stage
	/// untouched so the caller can reset and retry.
	pub fn is_systemic(&self) -> bool {
		matches!(self, ReleaseReason::Saturated | ReleaseReason::ExhaustedRetries)
	}
}

impl fmt::Display for ReleaseReason {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let s = match self {
			ReleaseReason::Saturated => "saturated",
			ReleaseReason::ExhaustedRetries => "exhausted_retries",
			ReleaseReason::Timeout => "timeout",
			ReleaseReason::WorkflowError => "workflow_error",
		};
		write!(f, "{}", s)
	}
}
