//! Transition rules for the order lifecycle.
//!
//! The rule table answers one question: from the order's current state,
//! which next values may a given role set on each dimension? The answer
//! depends on the order's branch (its service mode and order type), the
//! current sub-statuses and, for a few tailor moves, on whether every
//! recipient has recorded measurements.
//!
//! The submodules build on the table:
//! - [`gate`] validates a concrete request against it,
//! - [`derive`] recomputes the aggregate status after a sub-status write,
//! - [`menu`] projects it into client-facing actions,
//! - [`payment`] holds the separate one-way payment rules.

pub mod derive;
pub mod gate;
pub mod menu;
pub mod payment;

pub use derive::{derive_status, sync};
pub use gate::{validate, Rejection, RejectionKind};
pub use menu::build_menu;
pub use payment::validate_payment;

use tailor_types::{
	ActorRole, AllowedTransitions, Order, OrderStatus, OrderType, RiderStatus, ServiceMode,
	TailorStatus,
};

/// The rule set an order follows for its whole lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Branch {
	/// Customer brings fabric to the shop and collects there. No rider.
	WalkIn(OrderType),
	HomeFabricOnly,
	HomeStitching,
	/// Rider-only home measurement visit.
	HomeMeasurement,
}

impl Branch {
	pub fn of(order: &Order) -> Self {
		match (order.service_mode, order.order_type) {
			(ServiceMode::WalkIn, order_type) => Branch::WalkIn(order_type),
			(ServiceMode::HomeDelivery, OrderType::FabricOnly) => Branch::HomeFabricOnly,
			(ServiceMode::HomeDelivery, OrderType::FabricWithStitching) => Branch::HomeStitching,
			(ServiceMode::HomeDelivery, OrderType::MeasurementService) => Branch::HomeMeasurement,
		}
	}
}

/// Returns the next values `role` may set on `order`.
///
/// `recipients_measured` gates the tailor moves that need measurements
/// before they are offered at all. Terminal orders offer nothing.
pub fn allowed_transitions(
	order: &Order,
	role: ActorRole,
	recipients_measured: bool,
) -> AllowedTransitions {
	if order.is_terminal() {
		return AllowedTransitions::default();
	}

	match role {
		ActorRole::Customer => AllowedTransitions {
			status: customer_moves(order),
			..Default::default()
		},
		ActorRole::System => AllowedTransitions {
			status: collect_move(order),
			..Default::default()
		},
		ActorRole::Tailor => AllowedTransitions {
			tailor_status: tailor_moves(order, recipients_measured),
			..Default::default()
		},
		ActorRole::Rider => AllowedTransitions {
			rider_status: rider_moves(order),
			..Default::default()
		},
		ActorRole::Admin => {
			let mut allowed = AllowedTransitions::default();
			for delegated in [
				ActorRole::Customer,
				ActorRole::Tailor,
				ActorRole::Rider,
				ActorRole::System,
			] {
				allowed.merge(allowed_transitions(order, delegated, recipients_measured));
			}
			allowed
		},
	}
}

fn customer_moves(order: &Order) -> Vec<OrderStatus> {
	let mut moves = Vec::new();
	if order.status == OrderStatus::Pending {
		moves.push(OrderStatus::Cancelled);
	}
	moves.extend(collect_move(order));
	moves
}

fn collect_move(order: &Order) -> Vec<OrderStatus> {
	if order.is_walk_in() && order.status == OrderStatus::ReadyForPickup {
		vec![OrderStatus::Collected]
	} else {
		Vec::new()
	}
}

fn tailor_moves(order: &Order, recipients_measured: bool) -> Vec<TailorStatus> {
	let branch = Branch::of(order);
	match (branch, order.tailor_status) {
		(Branch::HomeMeasurement, _) => vec![],
		(_, TailorStatus::None) => vec![TailorStatus::Accepted],
		// The tailor only hands the fabric over; the rider does the rest.
		(Branch::HomeFabricOnly, _) => vec![],
		(_, TailorStatus::Accepted) => vec![TailorStatus::InProgress],
		(Branch::WalkIn(OrderType::FabricOnly), TailorStatus::InProgress) => vec![TailorStatus::Stitched],
		(Branch::WalkIn(OrderType::FabricWithStitching), TailorStatus::InProgress) if recipients_measured => {
			vec![TailorStatus::StitchingStarted]
		},
		(Branch::WalkIn(OrderType::MeasurementService), TailorStatus::InProgress) if recipients_measured => {
			vec![TailorStatus::MeasurementsComplete]
		},
		(Branch::HomeStitching, TailorStatus::InProgress)
			if order.rider_status == RiderStatus::MeasurementTaken && recipients_measured =>
		{
			vec![TailorStatus::StitchingStarted]
		},
		(Branch::WalkIn(_) | Branch::HomeStitching, TailorStatus::StitchingStarted) => vec![TailorStatus::Stitched],
		_ => vec![],
	}
}

fn rider_moves(order: &Order) -> Vec<RiderStatus> {
	match Branch::of(order) {
		Branch::WalkIn(_) => vec![],
		Branch::HomeFabricOnly => match order.rider_status {
			RiderStatus::None if order.tailor_status == TailorStatus::Accepted => vec![RiderStatus::Accepted],
			RiderStatus::Accepted => vec![RiderStatus::OnWayToPickup, RiderStatus::PickedUp],
			other => delivery_relay(other),
		},
		Branch::HomeStitching => match order.rider_status {
			RiderStatus::None if matches!(
				order.tailor_status,
				TailorStatus::Accepted | TailorStatus::InProgress
			) =>
			{
				vec![RiderStatus::Accepted]
			},
			RiderStatus::Accepted if order.measurements_on_file => vec![RiderStatus::MeasurementTaken],
			RiderStatus::Accepted => vec![RiderStatus::OnWayToMeasurement],
			RiderStatus::OnWayToMeasurement => vec![RiderStatus::Measuring],
			RiderStatus::Measuring => vec![RiderStatus::MeasurementTaken],
			RiderStatus::MeasurementTaken if order.tailor_status == TailorStatus::Stitched => {
				vec![RiderStatus::OnWayToPickup, RiderStatus::PickedUp]
			},
			other => delivery_relay(other),
		},
		Branch::HomeMeasurement => match order.rider_status {
			RiderStatus::None => vec![RiderStatus::Accepted],
			RiderStatus::Accepted => vec![RiderStatus::OnWayToMeasurement],
			RiderStatus::OnWayToMeasurement => vec![RiderStatus::Measuring],
			RiderStatus::Measuring => vec![RiderStatus::MeasurementTaken],
			RiderStatus::MeasurementTaken => vec![RiderStatus::OnWayToDelivery, RiderStatus::Delivered],
			other => delivery_relay(other),
		},
	}
}

/// Pickup-to-doorstep leg shared by every home-delivery branch.
fn delivery_relay(current: RiderStatus) -> Vec<RiderStatus> {
	match current {
		RiderStatus::OnWayToPickup => vec![RiderStatus::PickedUp],
		RiderStatus::PickedUp => vec![RiderStatus::OnWayToDelivery, RiderStatus::Delivered],
		RiderStatus::OnWayToDelivery => vec![RiderStatus::Delivered],
		_ => vec![],
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::{home, measured, walk_in};

	#[test]
	fn test_terminal_orders_offer_nothing() {
		for status in [
			OrderStatus::Delivered,
			OrderStatus::Collected,
			OrderStatus::Cancelled,
		] {
			let mut order = walk_in(OrderType::FabricOnly);
			order.status = status;
			for role in ActorRole::ALL {
				assert!(allowed_transitions(&order, *role, true).is_empty());
			}
		}
	}

	#[test]
	fn test_walk_in_never_offers_rider_moves() {
		let order = walk_in(OrderType::FabricWithStitching);
		assert!(allowed_transitions(&order, ActorRole::Rider, true).is_empty());
		assert!(allowed_transitions(&order, ActorRole::Admin, true)
			.rider_status
			.is_empty());
	}

	#[test]
	fn test_walk_in_stitching_waits_for_measurements() {
		let mut order = walk_in(OrderType::FabricWithStitching);
		order.tailor_status = TailorStatus::InProgress;
		assert!(allowed_transitions(&order, ActorRole::Tailor, false)
			.tailor_status
			.is_empty());
		assert_eq!(
			allowed_transitions(&order, ActorRole::Tailor, true).tailor_status,
			vec![TailorStatus::StitchingStarted]
		);
	}

	#[test]
	fn test_walk_in_measurement_service_completes_measurements() {
		let mut order = walk_in(OrderType::MeasurementService);
		order.tailor_status = TailorStatus::InProgress;
		assert_eq!(
			allowed_transitions(&order, ActorRole::Tailor, true).tailor_status,
			vec![TailorStatus::MeasurementsComplete]
		);
	}

	#[test]
	fn test_fabric_only_rider_waits_for_tailor() {
		let mut order = home(OrderType::FabricOnly);
		assert!(allowed_transitions(&order, ActorRole::Rider, false).is_empty());

		order.tailor_status = TailorStatus::Accepted;
		assert_eq!(
			allowed_transitions(&order, ActorRole::Rider, false).rider_status,
			vec![RiderStatus::Accepted]
		);
		// The tailor has nothing further to do on this branch.
		assert!(allowed_transitions(&order, ActorRole::Tailor, false).is_empty());
	}

	#[test]
	fn test_fabric_only_delivery_relay() {
		let mut order = home(OrderType::FabricOnly);
		order.tailor_status = TailorStatus::Accepted;
		order.rider_status = RiderStatus::Accepted;
		assert_eq!(
			allowed_transitions(&order, ActorRole::Rider, false).rider_status,
			vec![RiderStatus::OnWayToPickup, RiderStatus::PickedUp]
		);
		order.rider_status = RiderStatus::PickedUp;
		assert_eq!(
			allowed_transitions(&order, ActorRole::Rider, false).rider_status,
			vec![RiderStatus::OnWayToDelivery, RiderStatus::Delivered]
		);
	}

	#[test]
	fn test_stitching_rider_skips_visit_when_measurements_on_file() {
		let mut order = measured(home(OrderType::FabricWithStitching));
		order.tailor_status = TailorStatus::InProgress;
		order.rider_status = RiderStatus::Accepted;
		assert_eq!(
			allowed_transitions(&order, ActorRole::Rider, true).rider_status,
			vec![RiderStatus::OnWayToMeasurement]
		);

		order.measurements_on_file = true;
		assert_eq!(
			allowed_transitions(&order, ActorRole::Rider, true).rider_status,
			vec![RiderStatus::MeasurementTaken]
		);
	}

	#[test]
	fn test_stitching_rider_resumes_only_after_stitched() {
		let mut order = measured(home(OrderType::FabricWithStitching));
		order.rider_status = RiderStatus::MeasurementTaken;
		order.tailor_status = TailorStatus::StitchingStarted;
		assert!(allowed_transitions(&order, ActorRole::Rider, true).is_empty());

		order.tailor_status = TailorStatus::Stitched;
		assert_eq!(
			allowed_transitions(&order, ActorRole::Rider, true).rider_status,
			vec![RiderStatus::OnWayToPickup, RiderStatus::PickedUp]
		);
	}

	#[test]
	fn test_stitching_tailor_waits_for_rider_measurement() {
		let mut order = measured(home(OrderType::FabricWithStitching));
		order.tailor_status = TailorStatus::InProgress;
		order.rider_status = RiderStatus::Measuring;
		assert!(allowed_transitions(&order, ActorRole::Tailor, true).is_empty());

		order.rider_status = RiderStatus::MeasurementTaken;
		assert_eq!(
			allowed_transitions(&order, ActorRole::Tailor, true).tailor_status,
			vec![TailorStatus::StitchingStarted]
		);
	}

	#[test]
	fn test_measurement_service_is_rider_only() {
		let mut order = home(OrderType::MeasurementService);
		assert!(allowed_transitions(&order, ActorRole::Tailor, true).is_empty());
		assert_eq!(
			allowed_transitions(&order, ActorRole::Rider, true).rider_status,
			vec![RiderStatus::Accepted]
		);
		order.rider_status = RiderStatus::MeasurementTaken;
		assert_eq!(
			allowed_transitions(&order, ActorRole::Rider, true).rider_status,
			vec![RiderStatus::OnWayToDelivery, RiderStatus::Delivered]
		);
	}

	#[test]
	fn test_customer_and_system_status_moves() {
		let mut order = walk_in(OrderType::FabricOnly);
		assert_eq!(
			allowed_transitions(&order, ActorRole::Customer, false).status,
			vec![OrderStatus::Cancelled]
		);
		assert!(allowed_transitions(&order, ActorRole::System, false).is_empty());

		order.status = OrderStatus::ReadyForPickup;
		assert_eq!(
			allowed_transitions(&order, ActorRole::Customer, false).status,
			vec![OrderStatus::Collected]
		);
		assert_eq!(
			allowed_transitions(&order, ActorRole::System, false).status,
			vec![OrderStatus::Collected]
		);
	}

	#[test]
	fn test_admin_is_union_of_roles() {
		let mut order = home(OrderType::FabricOnly);
		order.tailor_status = TailorStatus::Accepted;
		let admin = allowed_transitions(&order, ActorRole::Admin, false);
		assert_eq!(admin.status, vec![OrderStatus::Cancelled]);
		assert_eq!(admin.rider_status, vec![RiderStatus::Accepted]);
		assert!(admin.tailor_status.is_empty());
	}
}
