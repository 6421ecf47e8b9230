//! Order record and status vocabulary for the fulfillment engine.
//!
//! An order carries three status dimensions (aggregate status, rider activity
//! and tailor activity) plus an independent payment dimension. The order type
//! and service mode are fixed at creation and select which transition branch
//! applies to the order for its entire lifetime.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error returned when a status or variant string cannot be parsed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Unknown {kind} value: {value}")]
pub struct ParseVocabularyError {
	pub kind: &'static str,
	pub value: String,
}

/// Declares a snake_case string enum with `as_str`, `Display`, `FromStr`
/// and an `ALL` listing in declaration order.
macro_rules! vocabulary {
	(
		$(#[$meta:meta])*
		$name:ident, $kind:literal {
			$( $(#[$vmeta:meta])* $variant:ident => $text:literal ),+ $(,)?
		}
	) => {
		$(#[$meta])*
		#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
		#[serde(rename_all = "snake_case")]
		pub enum $name {
			$( $(#[$vmeta])* $variant ),+
		}

		impl $name {
			/// Every variant in declaration order.
			pub const ALL: &'static [$name] = &[$( $name::$variant ),+];

			/// Returns the wire representation of this value.
			pub fn as_str(&self) -> &'static str {
				match self {
					$( $name::$variant => $text ),+
				}
			}
		}

		impl fmt::Display for $name {
			fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				f.write_str(self.as_str())
			}
		}

		impl FromStr for $name {
			type Err = ParseVocabularyError;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				match s {
					$( $text => Ok($name::$variant), )+
					_ => Err(ParseVocabularyError {
						kind: $kind,
						value: s.to_string(),
					}),
				}
			}
		}
	};
}

vocabulary! {
	/// Aggregate, customer-facing lifecycle stage of an order.
	///
	/// Written only by the status deriver or by the two explicit terminal
	/// overrides (cancel and collect).
	OrderStatus, "status" {
		Pending => "pending",
		Confirmed => "confirmed",
		InProgress => "in_progress",
		ReadyForDelivery => "ready_for_delivery",
		ReadyForPickup => "ready_for_pickup",
		Delivered => "delivered",
		Collected => "collected",
		Cancelled => "cancelled",
	}
}

impl OrderStatus {
	/// Terminal statuses freeze every dimension of the order.
	pub fn is_terminal(&self) -> bool {
		matches!(
			self,
			OrderStatus::Delivered | OrderStatus::Collected | OrderStatus::Cancelled
		)
	}

	/// Position of this status on the lifecycle ladder.
	///
	/// The two "ready" statuses share a rank because a branch only ever
	/// reaches one of them.
	pub fn rank(&self) -> u8 {
		match self {
			OrderStatus::Pending => 0,
			OrderStatus::Confirmed => 1,
			OrderStatus::InProgress => 2,
			OrderStatus::ReadyForDelivery | OrderStatus::ReadyForPickup => 3,
			OrderStatus::Delivered | OrderStatus::Collected | OrderStatus::Cancelled => 4,
		}
	}
}

vocabulary! {
	/// Activity status of the rider attached to a home-delivery order.
	RiderStatus, "rider_status" {
		None => "none",
		Accepted => "accepted",
		OnWayToPickup => "on_way_to_pickup",
		PickedUp => "picked_up",
		OnWayToDelivery => "on_way_to_delivery",
		OnWayToMeasurement => "on_way_to_measurement",
		Measuring => "measuring",
		MeasurementTaken => "measurement_taken",
		Delivered => "delivered",
	}
}

vocabulary! {
	/// Activity status of the tailor preparing the order.
	TailorStatus, "tailor_status" {
		None => "none",
		Accepted => "accepted",
		InProgress => "in_progress",
		StitchingStarted => "stitching_started",
		Stitched => "stitched",
		MeasurementsComplete => "measurements_complete",
	}
}

vocabulary! {
	/// Payment state. Moves one way only: pending, paid, refunded.
	PaymentStatus, "payment_status" {
		Pending => "pending",
		Paid => "paid",
		Refunded => "refunded",
	}
}

vocabulary! {
	/// Commercial variant of the order.
	OrderType, "order_type" {
		FabricOnly => "fabric_only",
		FabricWithStitching => "fabric_with_stitching",
		MeasurementService => "measurement_service",
	}
}

vocabulary! {
	/// Fulfillment mode; decides whether a rider takes part at all.
	ServiceMode, "service_mode" {
		HomeDelivery => "home_delivery",
		WalkIn => "walk_in",
	}
}

vocabulary! {
	/// Role under which an actor requests a change.
	ActorRole, "actor_role" {
		Customer => "customer",
		Tailor => "tailor",
		Rider => "rider",
		Admin => "admin",
		/// Internal jobs such as the stale pickup sweep.
		System => "system",
	}
}

/// The party requesting a change: a role and, except for system jobs,
/// the id of the user acting under that role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
	pub role: ActorRole,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub id: Option<String>,
}

impl Actor {
	pub fn new(role: ActorRole, id: impl Into<String>) -> Self {
		Self {
			role,
			id: Some(id.into()),
		}
	}

	pub fn customer(id: impl Into<String>) -> Self {
		Self::new(ActorRole::Customer, id)
	}

	pub fn tailor(id: impl Into<String>) -> Self {
		Self::new(ActorRole::Tailor, id)
	}

	pub fn rider(id: impl Into<String>) -> Self {
		Self::new(ActorRole::Rider, id)
	}

	pub fn admin(id: impl Into<String>) -> Self {
		Self::new(ActorRole::Admin, id)
	}

	/// The anonymous actor used by scheduled jobs.
	pub fn system() -> Self {
		Self {
			role: ActorRole::System,
			id: None,
		}
	}
}

/// A person the garments are made for. Measurements live in a separate
/// record; the order only keeps the reference once one is taken.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
	pub id: String,
	pub name: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub measurement_id: Option<String>,
}

impl Recipient {
	pub fn is_measured(&self) -> bool {
		self.measurement_id.is_some()
	}
}

/// A garment order and its lifecycle state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
	/// Unique identifier for this order.
	pub id: String,
	/// Human-facing order number, generated once at creation.
	pub order_number: String,
	pub order_type: OrderType,
	pub service_mode: ServiceMode,
	/// Aggregate status derived from the sub-statuses.
	pub status: OrderStatus,
	pub rider_status: RiderStatus,
	pub tailor_status: TailorStatus,
	pub payment_status: PaymentStatus,
	pub customer_id: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub tailor_id: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub rider_id: Option<String>,
	#[serde(default)]
	pub recipients: Vec<Recipient>,
	/// Whether every recipient already had measurements when the order
	/// was placed. Lets the rider skip the measurement visit.
	#[serde(default)]
	pub measurements_on_file: bool,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub stitching_completion_date: Option<NaiveDate>,
	/// Incremented on every committed change.
	pub version: u64,
	/// Timestamp when this order was created.
	pub created_at: u64,
	/// Timestamp when this order was last updated.
	pub updated_at: u64,
	/// Timestamp of the last change to the aggregate status.
	pub status_changed_at: u64,
}

impl Order {
	/// True when the order has at least one recipient and every recipient
	/// has recorded measurements.
	pub fn recipients_measured(&self) -> bool {
		!self.recipients.is_empty() && self.recipients.iter().all(Recipient::is_measured)
	}

	pub fn is_walk_in(&self) -> bool {
		self.service_mode == ServiceMode::WalkIn
	}

	pub fn is_terminal(&self) -> bool {
		self.status.is_terminal()
	}

	/// Returns the assignee id for a tailor or rider role.
	pub fn assignee(&self, role: ActorRole) -> Option<&str> {
		match role {
			ActorRole::Tailor => self.tailor_id.as_deref(),
			ActorRole::Rider => self.rider_id.as_deref(),
			_ => None,
		}
	}

	pub fn recipient_mut(&mut self, recipient_id: &str) -> Option<&mut Recipient> {
		self.recipients.iter_mut().find(|r| r.id == recipient_id)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_status_round_trips_through_strings() {
		for status in OrderStatus::ALL {
			assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), *status);
		}
		assert_eq!(
			"on_way_to_measurement".parse::<RiderStatus>().unwrap(),
			RiderStatus::OnWayToMeasurement
		);
	}

	#[test]
	fn test_unknown_value_is_rejected() {
		let err = "shipped".parse::<OrderStatus>().unwrap_err();
		assert_eq!(err.kind, "status");
		assert!(err.to_string().contains("shipped"));
	}

	#[test]
	fn test_serde_uses_snake_case() {
		let json = serde_json::to_string(&TailorStatus::StitchingStarted).unwrap();
		assert_eq!(json, "\"stitching_started\"");
		let mode: ServiceMode = serde_json::from_str("\"walk_in\"").unwrap();
		assert_eq!(mode, ServiceMode::WalkIn);
	}

	#[test]
	fn test_terminal_statuses() {
		let terminal: Vec<_> = OrderStatus::ALL
			.iter()
			.filter(|s| s.is_terminal())
			.collect();
		assert_eq!(
			terminal,
			vec![
				&OrderStatus::Delivered,
				&OrderStatus::Collected,
				&OrderStatus::Cancelled
			]
		);
	}

	fn order_with(recipients: Vec<Recipient>) -> Order {
		Order {
			id: "order-1".into(),
			order_number: "ORD-20260101-ABCDEF01".into(),
			order_type: OrderType::FabricWithStitching,
			service_mode: ServiceMode::WalkIn,
			status: OrderStatus::Pending,
			rider_status: RiderStatus::None,
			tailor_status: TailorStatus::None,
			payment_status: PaymentStatus::Pending,
			customer_id: "cust-1".into(),
			tailor_id: None,
			rider_id: None,
			recipients,
			measurements_on_file: false,
			stitching_completion_date: None,
			version: 0,
			created_at: 0,
			updated_at: 0,
			status_changed_at: 0,
		}
	}

	#[test]
	fn test_recipients_measured_requires_every_recipient() {
		let mut order = order_with(vec![
			Recipient {
				id: "r1".into(),
				name: "Amina".into(),
				measurement_id: Some("m1".into()),
			},
			Recipient {
				id: "r2".into(),
				name: "Bilal".into(),
				measurement_id: None,
			},
		]);
		assert!(!order.recipients_measured());

		order.recipient_mut("r2").unwrap().measurement_id = Some("m2".into());
		assert!(order.recipients_measured());

		assert!(!order_with(Vec::new()).recipients_measured());
	}
}
