//! Aggregate status derivation.
//!
//! The aggregate status is a function of the sub-statuses. It is recomputed
//! after every sub-status write and only ever moves forward: a derived
//! target is applied only when it ranks above the current status.

use super::Branch;
use tailor_types::{Order, OrderStatus, RiderStatus, TailorStatus};

/// Computes the status the order's sub-statuses call for, ignoring the
/// current aggregate status.
pub fn derive_status(order: &Order) -> OrderStatus {
	if matches!(order.status, OrderStatus::Collected | OrderStatus::Cancelled) {
		return order.status;
	}
	if order.rider_status == RiderStatus::Delivered {
		return OrderStatus::Delivered;
	}

	let tailor = order.tailor_status;
	let rider = order.rider_status;
	match Branch::of(order) {
		Branch::WalkIn(_) => match tailor {
			TailorStatus::None => OrderStatus::Pending,
			TailorStatus::Accepted => OrderStatus::Confirmed,
			TailorStatus::InProgress | TailorStatus::StitchingStarted => OrderStatus::InProgress,
			TailorStatus::Stitched | TailorStatus::MeasurementsComplete => {
				OrderStatus::ReadyForPickup
			},
		},
		Branch::HomeFabricOnly => {
			if matches!(rider, RiderStatus::PickedUp | RiderStatus::OnWayToDelivery) {
				OrderStatus::ReadyForDelivery
			} else if rider != RiderStatus::None {
				OrderStatus::InProgress
			} else if tailor != TailorStatus::None {
				OrderStatus::Confirmed
			} else {
				OrderStatus::Pending
			}
		},
		Branch::HomeStitching => {
			let out_for_delivery = matches!(
				rider,
				RiderStatus::OnWayToPickup | RiderStatus::PickedUp | RiderStatus::OnWayToDelivery
			);
			if tailor == TailorStatus::Stitched && out_for_delivery {
				OrderStatus::ReadyForDelivery
			} else if rider != RiderStatus::None {
				OrderStatus::InProgress
			} else if tailor != TailorStatus::None {
				OrderStatus::Confirmed
			} else {
				OrderStatus::Pending
			}
		},
		Branch::HomeMeasurement => match rider {
			RiderStatus::None => OrderStatus::Pending,
			RiderStatus::Accepted | RiderStatus::OnWayToMeasurement => OrderStatus::Confirmed,
			_ => OrderStatus::InProgress,
		},
	}
}

/// Advances `order.status` to the derived status if that moves it forward.
///
/// Returns whether the status changed. Calling it again right away is a
/// no-op.
pub fn sync(order: &mut Order) -> bool {
	let target = derive_status(order);
	if target.rank() > order.status.rank() {
		order.status = target;
		true
	} else {
		false
	}
}
