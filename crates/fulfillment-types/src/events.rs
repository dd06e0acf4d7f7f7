//! Event types for inter-service communication.
//!
//! This module defines the event system used by the fulfillment engine for
//! asynchronous communication with observers. Events are published on the
//! core's event bus after a state mutation has committed, so consumers only
//! ever see durable stage changes.

use crate::{EmployeeRef, ReleaseReason, Stage};
use serde::{Deserialize, Serialize};

/// Main event type encompassing all fulfillment events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum FulfillmentEvent {
	/// Events from the order pipeline.
	Order(OrderEvent),
}

/// Events related to an order moving through the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OrderEvent {
	/// An order advanced to a new stage.
	StageChanged {
		order_id: String,
		customer_id: String,
		stage: Stage,
		employee: Option<EmployeeRef>,
	},
	/// An order's delivery was confirmed and the order is complete.
	Completed {
		order_id: String,
		customer_id: String,
	},
	/// An order was cancelled during rollback.
	Cancelled {
		order_id: String,
		customer_id: String,
		reason: ReleaseReason,
	},
}

impl OrderEvent {
	/// Wire name of the event, used by the notifier.
	pub fn event_type(&self) -> &'static str {
		match self {
			OrderEvent::StageChanged { .. } => "STAGE_CHANGED",
			OrderEvent::Completed { .. } => "ORDER_COMPLETED",
			OrderEvent::Cancelled { .. } => "ORDER_CANCELLED",
		}
	}
}
