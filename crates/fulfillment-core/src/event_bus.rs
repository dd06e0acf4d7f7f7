//! Event bus for broadcasting fulfillment events.
//!
//! Events are published after a state mutation has durably committed, so
//! subscribers only ever observe stage changes that are persisted. A bus
//! with no subscribers silently drops events; publishing is never an error
//! for the publisher.

use fulfillment_types::FulfillmentEvent;
use tokio::sync::broadcast;

/// Broadcast channel for fulfillment events.
#[derive(Clone)]
pub struct EventBus {
	sender: broadcast::Sender<FulfillmentEvent>,
}

impl EventBus {
	/// Creates an event bus with the given channel capacity.
	pub fn new(capacity: usize) -> Self {
		let (sender, _) = broadcast::channel(capacity);
		Self { sender }
	}

	/// Publishes an event to all current subscribers.
	///
	/// Returns the number of subscribers the event reached; zero subscribers
	/// is not an error.
	pub fn publish(&self, event: FulfillmentEvent) -> usize {
		self.sender.send(event).unwrap_or(0)
	}

	/// Creates a new subscription receiving all events published after this
	/// call.
	pub fn subscribe(&self) -> broadcast::Receiver<FulfillmentEvent> {
		self.sender.subscribe()
	}
}

impl Default for EventBus {
	fn default() -> Self {
		Self::new(128)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use fulfillment_types::OrderEvent;

	#[tokio::test]
	async fn subscribers_receive_published_events() {
		let bus = EventBus::new(8);
		let mut receiver = bus.subscribe();

		let reached = bus.publish(FulfillmentEvent::Order(OrderEvent::Completed {
			order_id: "ord-1".to_string(),
			customer_id: "cust-1".to_string(),
		}));
		assert_eq!(reached, 1);

		let event = receiver.recv().await.unwrap();
		let FulfillmentEvent::Order(OrderEvent::Completed { order_id, .. }) = event else {
			panic!("unexpected event");
		};
		assert_eq!(order_id, "ord-1");
	}

	#[test]
	fn publish_without_subscribers_is_a_noop() {
		let bus = EventBus::new(8);
		let reached = bus.publish(FulfillmentEvent::Order(OrderEvent::Completed {
			order_id: "ord-1".to_string(),
			customer_id: "cust-1".to_string(),
		}));
		assert_eq!(reached, 0);
	}
}
