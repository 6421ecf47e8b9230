//! In-process broadcast bus for committed-change events.

use tailor_types::FulfillmentEvent;
use tokio::sync::broadcast;

/// Cloneable handle to a broadcast channel of [`FulfillmentEvent`]s.
///
/// Publishing never blocks; slow subscribers lag and miss events rather
/// than holding up the publisher.
#[derive(Clone)]
pub struct EventBus {
	sender: broadcast::Sender<FulfillmentEvent>,
}

impl EventBus {
	pub fn new(capacity: usize) -> Self {
		let (sender, _) = broadcast::channel(capacity);
		Self { sender }
	}

	/// Publishes an event. Fails only when nobody is subscribed.
	pub fn publish(
		&self,
		event: FulfillmentEvent,
	) -> Result<usize, broadcast::error::SendError<FulfillmentEvent>> {
		self.sender.send(event)
	}

	pub fn subscribe(&self) -> broadcast::Receiver<FulfillmentEvent> {
		self.sender.subscribe()
	}
}
