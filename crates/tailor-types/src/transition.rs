//! Transition request and projection types.
//!
//! These types describe what a caller wants to change on an order and what
//! the rule table offers in return. They carry no logic of their own.

use crate::{OrderStatus, RiderStatus, TailorStatus};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the independently tracked status dimensions of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusDimension {
	Status,
	RiderStatus,
	TailorStatus,
	PaymentStatus,
}

impl StatusDimension {
	pub fn as_str(&self) -> &'static str {
		match self {
			StatusDimension::Status => "status",
			StatusDimension::RiderStatus => "rider_status",
			StatusDimension::TailorStatus => "tailor_status",
			StatusDimension::PaymentStatus => "payment_status",
		}
	}

	/// Sub-status dimensions win ties against the aggregate status when the
	/// same value is offered by both.
	pub fn is_sub_status(&self) -> bool {
		matches!(
			self,
			StatusDimension::RiderStatus | StatusDimension::TailorStatus
		)
	}
}

impl fmt::Display for StatusDimension {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// The values a caller asks for. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesiredTransition {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub status: Option<OrderStatus>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub rider_status: Option<RiderStatus>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub tailor_status: Option<TailorStatus>,
}

impl DesiredTransition {
	pub fn status(status: OrderStatus) -> Self {
		Self {
			status: Some(status),
			..Self::default()
		}
	}

	pub fn rider(rider_status: RiderStatus) -> Self {
		Self {
			rider_status: Some(rider_status),
			..Self::default()
		}
	}

	pub fn tailor(tailor_status: TailorStatus) -> Self {
		Self {
			tailor_status: Some(tailor_status),
			..Self::default()
		}
	}

	pub fn is_empty(&self) -> bool {
		self.status.is_none() && self.rider_status.is_none() && self.tailor_status.is_none()
	}
}

/// Next values reachable from the current state, per dimension.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowedTransitions {
	pub status: Vec<OrderStatus>,
	pub rider_status: Vec<RiderStatus>,
	pub tailor_status: Vec<TailorStatus>,
}

impl AllowedTransitions {
	pub fn is_empty(&self) -> bool {
		self.status.is_empty() && self.rider_status.is_empty() && self.tailor_status.is_empty()
	}

	/// Merges another set into this one, keeping first-seen order.
	pub fn merge(&mut self, other: AllowedTransitions) {
		fn extend_unique<T: PartialEq>(into: &mut Vec<T>, from: Vec<T>) {
			for value in from {
				if !into.contains(&value) {
					into.push(value);
				}
			}
		}
		extend_unique(&mut self.status, other.status);
		extend_unique(&mut self.rider_status, other.rider_status);
		extend_unique(&mut self.tailor_status, other.tailor_status);
	}
}

/// A human-meaningful next action offered to a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuAction {
	pub dimension: StatusDimension,
	pub value: String,
	pub label: String,
	pub requires_confirmation: bool,
}
