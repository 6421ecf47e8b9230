//! Notification module for the fulfillment engine.
//!
//! After a change to an order is committed, the parties involved are told
//! about it through one or more notifiers. Delivery is best-effort: a
//! notifier failing never affects the order itself.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tailor_types::{
	ActorRole, ConfigSchema, ImplementationRegistry, Order, OrderStatus, PaymentStatus, RiderStatus,
	TailorStatus,
};
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod log;
	pub mod webhook;
}

/// Errors that can occur while delivering a notification.
#[derive(Debug, Error)]
pub enum NotifyError {
	/// The remote endpoint could not be reached.
	#[error("Network error: {0}")]
	Network(String),
	/// The endpoint answered with a failure.
	#[error("Delivery rejected: {0}")]
	Rejected(String),
	/// The notifier settings are invalid.
	#[error("Configuration error: {0}")]
	Configuration(String),
}

/// A party that should hear about a change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Audience {
	pub role: ActorRole,
	pub id: String,
}

/// Payload handed to every notifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusNotification {
	pub order_id: String,
	pub order_number: String,
	/// What changed: a dimension name such as `rider_status`, or `created`.
	pub change: String,
	/// Aggregate status before the change. Equal to `status` when the
	/// change left it alone.
	pub previous_status: OrderStatus,
	pub status: OrderStatus,
	pub rider_status: RiderStatus,
	pub tailor_status: TailorStatus,
	pub payment_status: PaymentStatus,
	pub actor_role: ActorRole,
	pub audience: Vec<Audience>,
	pub message: String,
	pub occurred_at: u64,
}

impl StatusNotification {
	/// Builds a notification for `order` addressed to every assigned party
	/// other than the role that made the change.
	pub fn for_order(
		order: &Order,
		change: impl Into<String>,
		actor_role: ActorRole,
		message: impl Into<String>,
	) -> Self {
		let mut audience = vec![Audience {
			role: ActorRole::Customer,
			id: order.customer_id.clone(),
		}];
		if let Some(tailor_id) = &order.tailor_id {
			audience.push(Audience {
				role: ActorRole::Tailor,
				id: tailor_id.clone(),
			});
		}
		if let Some(rider_id) = &order.rider_id {
			audience.push(Audience {
				role: ActorRole::Rider,
				id: rider_id.clone(),
			});
		}
		audience.retain(|party| party.role != actor_role);

		Self {
			order_id: order.id.clone(),
			order_number: order.order_number.clone(),
			change: change.into(),
			previous_status: order.status,
			status: order.status,
			rider_status: order.rider_status,
			tailor_status: order.tailor_status,
			payment_status: order.payment_status,
			actor_role,
			audience,
			message: message.into(),
			occurred_at: order.updated_at,
		}
	}

	pub fn with_previous_status(mut self, previous_status: OrderStatus) -> Self {
		self.previous_status = previous_status;
		self
	}
}

/// Interface implemented by every notification channel.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotifierInterface: Send + Sync {
	/// Returns the configuration schema for this notifier.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;

	/// Delivers one notification.
	async fn notify(&self, notification: &StatusNotification) -> Result<(), NotifyError>;
}

/// Type alias for notifier factory functions.
pub type NotifierFactory = fn(&toml::Value) -> Result<Box<dyn NotifierInterface>, NotifyError>;

/// Registry trait for notifier implementations.
pub trait NotifierRegistry: ImplementationRegistry<Factory = NotifierFactory> {}

/// Get all registered notifier implementations as (name, factory) pairs.
pub fn get_all_implementations() -> Vec<(&'static str, NotifierFactory)> {
	use implementations::{log, webhook};

	vec![
		(log::Registry::NAME, log::Registry::factory()),
		(webhook::Registry::NAME, webhook::Registry::factory()),
	]
}

/// Fans a notification out to every configured notifier.
pub struct NotificationService {
	notifiers: Vec<(String, Box<dyn NotifierInterface>)>,
}

impl NotificationService {
	pub fn new(notifiers: Vec<(String, Box<dyn NotifierInterface>)>) -> Self {
		Self { notifiers }
	}

	pub fn is_empty(&self) -> bool {
		self.notifiers.is_empty()
	}

	/// Delivers to all notifiers concurrently and returns how many succeeded.
	///
	/// Failures are logged and otherwise ignored.
	pub async fn dispatch(&self, notification: &StatusNotification) -> usize {
		let deliveries = self.notifiers.iter().map(|(name, notifier)| async move {
			match notifier.notify(notification).await {
				Ok(()) => true,
				Err(e) => {
					tracing::warn!(
						notifier = %name,
						order_number = %notification.order_number,
						error = %e,
						"Notification delivery failed"
					);
					false
				},
			}
		});

		futures::future::join_all(deliveries)
			.await
			.into_iter()
			.filter(|delivered| *delivered)
			.count()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use tailor_types::{OrderType, ServiceMode};

	fn sample_order() -> Order {
		Order {
			id: "order-1".into(),
			order_number: "ORD-20250101-0a1b2c3d".into(),
			order_type: OrderType::FabricOnly,
			service_mode: ServiceMode::HomeDelivery,
			status: OrderStatus::Confirmed,
			rider_status: RiderStatus::None,
			tailor_status: TailorStatus::Accepted,
			payment_status: PaymentStatus::Pending,
			customer_id: "cust-1".into(),
			tailor_id: Some("tailor-1".into()),
			rider_id: None,
			recipients: vec![],
			measurements_on_file: false,
			stitching_completion_date: None,
			version: 2,
			created_at: 100,
			updated_at: 200,
			status_changed_at: 200,
		}
	}

	#[test]
	fn test_audience_excludes_acting_role() {
		let notification = StatusNotification::for_order(
			&sample_order(),
			"tailor_status",
			ActorRole::Tailor,
			"Tailor accepted the order",
		);
		assert_eq!(
			notification.audience,
			vec![Audience {
				role: ActorRole::Customer,
				id: "cust-1".into()
			}]
		);
		assert_eq!(notification.occurred_at, 200);
		assert_eq!(notification.previous_status, OrderStatus::Confirmed);

		let moved = notification.with_previous_status(OrderStatus::Pending);
		assert_eq!(moved.previous_status, OrderStatus::Pending);
		assert_eq!(moved.status, OrderStatus::Confirmed);
	}

	#[tokio::test]
	async fn test_dispatch_counts_successes_and_swallows_failures() {
		let mut ok = MockNotifierInterface::new();
		ok.expect_notify().times(1).returning(|_| Ok(()));
		let mut failing = MockNotifierInterface::new();
		failing
			.expect_notify()
			.times(1)
			.returning(|_| Err(NotifyError::Rejected("503".into())));

		let service = NotificationService::new(vec![
			("ok".into(), Box::new(ok)),
			("failing".into(), Box::new(failing)),
		]);
		let notification = StatusNotification::for_order(
			&sample_order(),
			"status",
			ActorRole::Admin,
			"Order confirmed",
		);
		assert_eq!(service.dispatch(&notification).await, 1);
	}

	#[tokio::test]
	async fn test_empty_service_delivers_nothing() {
		let service = NotificationService::new(vec![]);
		assert!(service.is_empty());
		let notification =
			StatusNotification::for_order(&sample_order(), "created", ActorRole::Customer, "");
		assert_eq!(service.dispatch(&notification).await, 0);
	}
}
