//! Client-facing projection of the rule table.
//!
//! Every response that lists next actions goes through [`build_menu`], so
//! the labels and confirmation flags are defined once.

use super::allowed_transitions;
use tailor_types::{
	ActorRole, MenuAction, Order, OrderStatus, RiderStatus, StatusDimension, TailorStatus,
};

/// Builds the list of actions `role` can take next on `order`.
///
/// Values equal to the current ones are dropped. Sub-status actions come
/// first; an aggregate status action whose value is already offered as a
/// sub-status is left out.
pub fn build_menu(order: &Order, role: ActorRole, recipients_measured: bool) -> Vec<MenuAction> {
	let allowed = allowed_transitions(order, role, recipients_measured);

	let mut actions: Vec<MenuAction> = allowed
		.tailor_status
		.iter()
		.filter(|s| **s != order.tailor_status)
		.map(|s| tailor_action(*s))
		.chain(
			allowed
				.rider_status
				.iter()
				.filter(|s| **s != order.rider_status)
				.map(|s| rider_action(*s)),
		)
		.collect();

	for status in allowed.status.iter().filter(|s| **s != order.status) {
		let superseded = actions.iter().any(|a| a.value == status.as_str());
		if !superseded {
			actions.push(status_action(*status));
		}
	}
	actions
}

fn action(dimension: StatusDimension, value: &str, label: &str, confirm: bool) -> MenuAction {
	MenuAction {
		dimension,
		value: value.to_string(),
		label: label.to_string(),
		requires_confirmation: confirm,
	}
}

fn status_action(status: OrderStatus) -> MenuAction {
	let (label, confirm) = match status {
		OrderStatus::Cancelled => ("Cancel order", true),
		OrderStatus::Collected => ("Confirm collection", false),
		OrderStatus::Pending => ("Mark as pending", false),
		OrderStatus::Confirmed => ("Confirm order", false),
		OrderStatus::InProgress => ("Mark in progress", false),
		OrderStatus::ReadyForDelivery => ("Mark ready for delivery", false),
		OrderStatus::ReadyForPickup => ("Mark ready for pickup", false),
		OrderStatus::Delivered => ("Mark as delivered", true),
	};
	action(StatusDimension::Status, status.as_str(), label, confirm)
}

fn tailor_action(status: TailorStatus) -> MenuAction {
	let (label, confirm) = match status {
		TailorStatus::Accepted => ("Accept order", true),
		TailorStatus::InProgress => ("Start work", false),
		TailorStatus::StitchingStarted => ("Start stitching", false),
		TailorStatus::Stitched => ("Mark as stitched", false),
		TailorStatus::MeasurementsComplete => ("Complete measurements", false),
		TailorStatus::None => ("Reset", false),
	};
	action(StatusDimension::TailorStatus, status.as_str(), label, confirm)
}

fn rider_action(status: RiderStatus) -> MenuAction {
	let (label, confirm) = match status {
		RiderStatus::Accepted => ("Accept delivery", true),
		RiderStatus::OnWayToPickup => ("Head to pickup", false),
		RiderStatus::PickedUp => ("Confirm pickup", false),
		RiderStatus::OnWayToDelivery => ("Start delivery", false),
		RiderStatus::OnWayToMeasurement => ("Head to measurement", false),
		RiderStatus::Measuring => ("Start measuring", false),
		RiderStatus::MeasurementTaken => ("Confirm measurements taken", false),
		RiderStatus::Delivered => ("Confirm delivery", true),
		RiderStatus::None => ("Reset", false),
	};
	action(StatusDimension::RiderStatus, status.as_str(), label, confirm)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::{home, measured, walk_in};
	use tailor_types::OrderType;

	#[test]
	fn test_customer_menu_on_pending_order() {
		let order = walk_in(OrderType::FabricOnly);
		let menu = build_menu(&order, ActorRole::Customer, false);
		assert_eq!(menu.len(), 1);
		assert_eq!(menu[0].dimension, StatusDimension::Status);
		assert_eq!(menu[0].value, "cancelled");
		assert_eq!(menu[0].label, "Cancel order");
		assert!(menu[0].requires_confirmation);
	}

	#[test]
	fn test_accept_requires_confirmation() {
		let order = home(OrderType::FabricOnly);
		let menu = build_menu(&order, ActorRole::Tailor, false);
		assert_eq!(menu.len(), 1);
		assert_eq!(menu[0].value, "accepted");
		assert!(menu[0].requires_confirmation);
	}

	#[test]
	fn test_rider_delivery_requires_confirmation() {
		let mut order = home(OrderType::FabricOnly);
		order.tailor_status = TailorStatus::Accepted;
		order.rider_status = RiderStatus::PickedUp;
		let menu = build_menu(&order, ActorRole::Rider, false);
		let values: Vec<_> = menu.iter().map(|a| a.value.as_str()).collect();
		assert_eq!(values, vec!["on_way_to_delivery", "delivered"]);
		assert!(!menu[0].requires_confirmation);
		assert!(menu[1].requires_confirmation);
	}

	#[test]
	fn test_menu_respects_measurement_indicator() {
		let mut order = walk_in(OrderType::FabricWithStitching);
		order.tailor_status = TailorStatus::InProgress;
		assert!(build_menu(&order, ActorRole::Tailor, false).is_empty());

		let order = measured(order);
		let menu = build_menu(&order, ActorRole::Tailor, true);
		assert_eq!(menu[0].label, "Start stitching");
	}

	#[test]
	fn test_admin_menu_lists_sub_status_actions_first() {
		let mut order = home(OrderType::FabricOnly);
		order.tailor_status = TailorStatus::Accepted;
		let menu = build_menu(&order, ActorRole::Admin, false);
		let values: Vec<_> = menu.iter().map(|a| a.value.as_str()).collect();
		assert_eq!(values, vec!["accepted", "cancelled"]);
		assert_eq!(menu[0].dimension, StatusDimension::RiderStatus);
	}

	#[test]
	fn test_terminal_order_has_empty_menu() {
		let mut order = walk_in(OrderType::FabricOnly);
		order.status = OrderStatus::Cancelled;
		for role in ActorRole::ALL {
			assert!(build_menu(&order, *role, true).is_empty());
		}
	}
}
