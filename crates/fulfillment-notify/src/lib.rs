//! Notification module for the order fulfillment system.
//!
//! This module defines the interface for pushing stage-change notifications
//! to a connected client. Delivery is strictly best-effort: the engine
//! invokes the notifier only after a state mutation has committed, logs any
//! failure, and never lets one affect the outcome of an operation.

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur during notification delivery.
#[derive(Debug, Error)]
pub enum NotifyError {
	/// Error that occurs when the notification could not be delivered.
	#[error("Delivery failed: {0}")]
	Delivery(String),
}

/// Trait defining the interface for notification delivery.
///
/// Implementations push an event about one order to the customer's
/// connected client. Callers treat every error as non-fatal.
#[async_trait]
pub trait Notifier: Send + Sync {
	/// Sends an event about an order to the given customer.
	async fn notify(
		&self,
		order_id: &str,
		customer_id: &str,
		event_type: &str,
		payload: serde_json::Value,
	) -> Result<(), NotifyError>;
}

/// Notifier that logs events through `tracing` instead of delivering them.
///
/// The default for the service when no push gateway is configured.
pub struct TracingNotifier;

#[async_trait]
impl Notifier for TracingNotifier {
	async fn notify(
		&self,
		order_id: &str,
		customer_id: &str,
		event_type: &str,
		payload: serde_json::Value,
	) -> Result<(), NotifyError> {
		tracing::info!(
			order_id = %order_id,
			customer_id = %customer_id,
			event_type = %event_type,
			payload = %payload,
			"Order notification"
		);
		Ok(())
	}
}
