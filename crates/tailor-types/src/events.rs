//! Event types for inter-component communication.
//!
//! The executor publishes events after an order's lock is released. Consumers
//! such as the notification handler react to them without ever holding up the
//! transition that produced them.

use crate::{ActorRole, Order, OrderStatus, PaymentStatus, StatusDimension};
use serde::{Deserialize, Serialize};

/// Main event type encompassing all engine events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum FulfillmentEvent {
	/// Events about individual orders.
	Order(OrderEvent),
	/// Events from housekeeping jobs.
	Maintenance(MaintenanceEvent),
}

/// Events related to a single order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OrderEvent {
	/// A new order has been placed.
	Created { order: Order },
	/// A status, rider status or tailor status transition was committed.
	StatusChanged {
		order: Order,
		previous_status: OrderStatus,
		dimension: StatusDimension,
		actor_role: ActorRole,
	},
	/// The payment dimension moved.
	PaymentChanged {
		order: Order,
		previous: PaymentStatus,
		actor_role: ActorRole,
	},
	/// A pending order was removed.
	Deleted { order_id: String },
}

/// Events related to scheduled housekeeping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum MaintenanceEvent {
	/// The stale pickup sweep finished a pass.
	PickupSweepCompleted { collected: usize },
}
