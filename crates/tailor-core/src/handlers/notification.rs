//! Turns committed order changes into notifications for the parties
//! involved.

use std::sync::Arc;
use tailor_notify::{NotificationService, StatusNotification};
use tailor_types::{truncate_id, ActorRole, OrderEvent, StatusDimension};
use tracing::instrument;

pub struct NotificationHandler {
	notifications: Arc<NotificationService>,
}

impl NotificationHandler {
	pub fn new(notifications: Arc<NotificationService>) -> Self {
		Self { notifications }
	}

	/// Delivers the notification for `event`, if it has one. Returns how
	/// many notifiers accepted it.
	#[instrument(skip_all)]
	pub async fn handle(&self, event: &OrderEvent) -> usize {
		if self.notifications.is_empty() {
			return 0;
		}
		let Some(notification) = notification_for(event) else {
			return 0;
		};

		let delivered = self.notifications.dispatch(&notification).await;
		tracing::debug!(
			order_id = %truncate_id(&notification.order_id),
			change = %notification.change,
			delivered,
			"Notification dispatched"
		);
		delivered
	}
}

/// Builds the notification for an order event. Deletions notify nobody.
pub fn notification_for(event: &OrderEvent) -> Option<StatusNotification> {
	match event {
		OrderEvent::Created { order } => Some(StatusNotification::for_order(
			order,
			"created",
			ActorRole::Customer,
			format!("Order {} has been placed", order.order_number),
		)),
		OrderEvent::StatusChanged {
			order,
			previous_status,
			dimension,
			actor_role,
		} => {
			let message = if order.status != *previous_status {
				format!(
					"Order {} moved from {} to {}",
					order.order_number, previous_status, order.status
				)
			} else {
				let value = match dimension {
					StatusDimension::RiderStatus => order.rider_status.as_str(),
					StatusDimension::TailorStatus => order.tailor_status.as_str(),
					StatusDimension::PaymentStatus => order.payment_status.as_str(),
					StatusDimension::Status => order.status.as_str(),
				};
				format!("Order {}: {} is now {}", order.order_number, dimension, value)
			};
			Some(
				StatusNotification::for_order(order, dimension.as_str(), *actor_role, message)
					.with_previous_status(*previous_status),
			)
		},
		OrderEvent::PaymentChanged {
			order, actor_role, ..
		} => Some(StatusNotification::for_order(
			order,
			StatusDimension::PaymentStatus.as_str(),
			*actor_role,
			format!(
				"Payment for order {} is now {}",
				order.order_number, order.payment_status
			),
		)),
		OrderEvent::Deleted { .. } => None,
	}
}
