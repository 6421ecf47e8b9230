//! Shared fixtures for unit tests.

use tailor_types::{
	Order, OrderStatus, OrderType, PaymentStatus, Recipient, RiderStatus, ServiceMode,
	TailorStatus,
};

pub const CUSTOMER: &str = "cust-1";
pub const TAILOR: &str = "tailor-1";
pub const RIDER: &str = "rider-1";

/// A fresh order in `pending/none/none` with one unmeasured recipient.
pub fn order(order_type: OrderType, service_mode: ServiceMode) -> Order {
	Order {
		id: "8c1f6a52-5f0e-4d5c-9a77-0d1e2f3a4b5c".into(),
		order_number: "ORD-20250101-8C1F6A52".into(),
		order_type,
		service_mode,
		status: OrderStatus::Pending,
		rider_status: RiderStatus::None,
		tailor_status: TailorStatus::None,
		payment_status: PaymentStatus::Pending,
		customer_id: CUSTOMER.into(),
		tailor_id: None,
		rider_id: None,
		recipients: vec![Recipient {
			id: "rcp-1".into(),
			name: "Amina".into(),
			measurement_id: None,
		}],
		measurements_on_file: false,
		stitching_completion_date: None,
		version: 1,
		created_at: 1_700_000_000,
		updated_at: 1_700_000_000,
		status_changed_at: 1_700_000_000,
	}
}

pub fn walk_in(order_type: OrderType) -> Order {
	order(order_type, ServiceMode::WalkIn)
}

pub fn home(order_type: OrderType) -> Order {
	order(order_type, ServiceMode::HomeDelivery)
}

/// Marks every recipient as measured.
pub fn measured(mut order: Order) -> Order {
	for (i, recipient) in order.recipients.iter_mut().enumerate() {
		recipient.measurement_id = Some(format!("msr-{}", i + 1));
	}
	order
}
