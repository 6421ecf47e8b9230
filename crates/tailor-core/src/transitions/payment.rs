//! Payment rules.
//!
//! Payment moves one way, pending to paid to refunded, independently of the
//! fulfillment dimensions. A terminal order freezes payment too.

use super::gate::{check_ownership, Rejection};
use tailor_types::{Actor, ActorRole, Order, PaymentStatus, StatusDimension};

/// Validates a payment change. Returns `None` when `desired` is already
/// the current payment status.
pub fn validate_payment(
	order: &Order,
	desired: PaymentStatus,
	actor: &Actor,
) -> Result<Option<PaymentStatus>, Rejection> {
	if order.is_terminal() {
		return Err(Rejection::TerminalOrder(order.status));
	}
	check_ownership(order, actor, &[])?;
	if desired == order.payment_status {
		return Ok(None);
	}

	let permitted = match (order.payment_status, desired) {
		(PaymentStatus::Pending, PaymentStatus::Paid) => matches!(
			actor.role,
			ActorRole::Customer | ActorRole::Admin | ActorRole::System
		),
		(PaymentStatus::Paid, PaymentStatus::Refunded) => {
			matches!(actor.role, ActorRole::Admin | ActorRole::System)
		},
		_ => false,
	};

	if permitted {
		Ok(Some(desired))
	} else {
		Err(Rejection::NotAllowed {
			role: actor.role,
			dimension: StatusDimension::PaymentStatus,
			from: order.payment_status.as_str().to_string(),
			to: desired.as_str().to_string(),
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::{walk_in, CUSTOMER, TAILOR};
	use crate::transitions::RejectionKind;
	use tailor_types::{OrderStatus, OrderType};

	#[test]
	fn test_customer_pays_admin_refunds() {
		let mut order = walk_in(OrderType::FabricOnly);
		assert_eq!(
			validate_payment(&order, PaymentStatus::Paid, &Actor::customer(CUSTOMER)),
			Ok(Some(PaymentStatus::Paid))
		);

		order.payment_status = PaymentStatus::Paid;
		let refused = validate_payment(&order, PaymentStatus::Refunded, &Actor::customer(CUSTOMER));
		assert_eq!(refused.unwrap_err().kind(), RejectionKind::IllegalTransition);
		assert_eq!(
			validate_payment(&order, PaymentStatus::Refunded, &Actor::admin("ops")),
			Ok(Some(PaymentStatus::Refunded))
		);
	}

	#[test]
	fn test_payment_never_moves_backwards() {
		let mut order = walk_in(OrderType::FabricOnly);
		order.payment_status = PaymentStatus::Refunded;
		for desired in [PaymentStatus::Pending, PaymentStatus::Paid] {
			let result = validate_payment(&order, desired, &Actor::admin("ops"));
			assert_eq!(result.unwrap_err().kind(), RejectionKind::IllegalTransition);
		}
		assert_eq!(
			validate_payment(&order, PaymentStatus::Refunded, &Actor::admin("ops")),
			Ok(None)
		);
	}

	#[test]
	fn test_tailor_cannot_mark_paid() {
		let mut order = walk_in(OrderType::FabricOnly);
		order.tailor_id = Some(TAILOR.into());
		let result = validate_payment(&order, PaymentStatus::Paid, &Actor::tailor(TAILOR));
		assert_eq!(result.unwrap_err().kind(), RejectionKind::IllegalTransition);
	}

	#[test]
	fn test_other_customer_is_forbidden() {
		let order = walk_in(OrderType::FabricOnly);
		let result = validate_payment(&order, PaymentStatus::Paid, &Actor::customer("cust-9"));
		assert_eq!(result.unwrap_err().kind(), RejectionKind::Forbidden);
	}

	#[test]
	fn test_terminal_order_freezes_payment() {
		let mut order = walk_in(OrderType::FabricOnly);
		order.status = OrderStatus::Cancelled;
		let result = validate_payment(&order, PaymentStatus::Paid, &Actor::admin("ops"));
		assert_eq!(result, Err(Rejection::TerminalOrder(OrderStatus::Cancelled)));
	}
}
