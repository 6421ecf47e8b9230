//! Precondition gate for status transitions.
//!
//! Checks run in a fixed order and stop at the first failure: terminal
//! status, ownership, the measurement gate, rule table membership, role hard
//! rules, then domain preconditions. Every failure is a typed [`Rejection`].

use super::allowed_transitions;
use tailor_types::{
	Actor, ActorRole, DesiredTransition, Order, OrderStatus, OrderType, RiderStatus,
	StatusDimension, TailorStatus,
};
use thiserror::Error;

/// Why a requested change was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
	#[error("Order is already {0}")]
	TerminalOrder(OrderStatus),
	#[error("Role {0} may not perform this action")]
	RoleNotPermitted(ActorRole),
	#[error("An actor id is required for role {0}")]
	MissingActorId(ActorRole),
	#[error("{role} {actor_id} is not a party to this order")]
	NotAParty { role: ActorRole, actor_id: String },
	#[error("Only one status dimension may change per request")]
	MultipleDimensions,
	#[error("{role} cannot move {dimension} from {from} to {to}")]
	NotAllowed {
		role: ActorRole,
		dimension: StatusDimension,
		from: String,
		to: String,
	},
	#[error("Orders can only be cancelled by the customer or an admin while pending")]
	CancellationRefused,
	#[error("Only walk-in orders that are ready for pickup can be collected")]
	CollectionRefused,
	#[error("Not every recipient has recorded measurements")]
	MeasurementsIncomplete,
	#[error("A stitching completion date has not been set")]
	CompletionDateMissing,
	#[error("Only pending orders can be deleted")]
	NotPending,
}

/// Error category a rejection surfaces as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionKind {
	TerminalOrder,
	Forbidden,
	IllegalTransition,
	PreconditionFailed,
}

impl Rejection {
	pub fn kind(&self) -> RejectionKind {
		match self {
			Rejection::TerminalOrder(_) => RejectionKind::TerminalOrder,
			Rejection::RoleNotPermitted(_)
			| Rejection::MissingActorId(_)
			| Rejection::NotAParty { .. } => RejectionKind::Forbidden,
			Rejection::MultipleDimensions
			| Rejection::NotAllowed { .. }
			| Rejection::CancellationRefused
			| Rejection::CollectionRefused
			| Rejection::NotPending => RejectionKind::IllegalTransition,
			Rejection::MeasurementsIncomplete | Rejection::CompletionDateMissing => {
				RejectionKind::PreconditionFailed
			},
		}
	}
}

/// The single dimension a request changes, with its new value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
	Status(OrderStatus),
	Rider(RiderStatus),
	Tailor(TailorStatus),
}

impl Change {
	pub fn dimension(&self) -> StatusDimension {
		match self {
			Change::Status(_) => StatusDimension::Status,
			Change::Rider(_) => StatusDimension::RiderStatus,
			Change::Tailor(_) => StatusDimension::TailorStatus,
		}
	}

	pub fn value(&self) -> &'static str {
		match self {
			Change::Status(s) => s.as_str(),
			Change::Rider(s) => s.as_str(),
			Change::Tailor(s) => s.as_str(),
		}
	}

	/// True when this is the tailor's or rider's own `accepted` move.
	fn is_accept_for(&self, role: ActorRole) -> bool {
		match (role, self) {
			(ActorRole::Tailor, Change::Tailor(TailorStatus::Accepted)) => true,
			(ActorRole::Rider, Change::Rider(RiderStatus::Accepted)) => true,
			_ => false,
		}
	}
}

/// Values in `desired` that differ from the order's current ones.
pub fn differing(order: &Order, desired: &DesiredTransition) -> Vec<Change> {
	let mut changes = Vec::new();
	if let Some(status) = desired.status.filter(|s| *s != order.status) {
		changes.push(Change::Status(status));
	}
	if let Some(rider) = desired.rider_status.filter(|s| *s != order.rider_status) {
		changes.push(Change::Rider(rider));
	}
	if let Some(tailor) = desired.tailor_status.filter(|s| *s != order.tailor_status) {
		changes.push(Change::Tailor(tailor));
	}
	changes
}

/// Validates `desired` for `actor` against the current `order`.
///
/// Returns the change to apply, or `None` when the request matches the
/// order as it already is.
pub fn validate(
	order: &Order,
	desired: &DesiredTransition,
	actor: &Actor,
	recipients_measured: bool,
) -> Result<Option<Change>, Rejection> {
	if desired.is_empty() {
		return Ok(None);
	}
	if order.is_terminal() {
		return Err(Rejection::TerminalOrder(order.status));
	}

	let changes = differing(order, desired);
	check_ownership(order, actor, &changes)?;

	let change = match changes.as_slice() {
		[] => return Ok(None),
		[only] => *only,
		_ => return Err(Rejection::MultipleDimensions),
	};

	check_measurement_gate(order, actor.role, change, recipients_measured)?;
	check_membership(order, actor.role, change)?;
	check_hard_rules(order, actor.role, change)?;
	check_preconditions(order, change, recipients_measured)?;

	Ok(Some(change))
}

/// Customers must own the order. Tailors and riders must be assigned, or be
/// claiming an unassigned slot with their own `accepted` move among `changes`.
pub fn check_ownership(
	order: &Order,
	actor: &Actor,
	changes: &[Change],
) -> Result<(), Rejection> {
	let role = actor.role;
	if matches!(role, ActorRole::Admin | ActorRole::System) {
		return Ok(());
	}
	let actor_id = actor
		.id
		.as_deref()
		.filter(|id| !id.is_empty())
		.ok_or(Rejection::MissingActorId(role))?;

	let owns = match role {
		ActorRole::Customer => order.customer_id == actor_id,
		_ => match order.assignee(role) {
			Some(assigned) => assigned == actor_id,
			None => changes.iter().any(|c| c.is_accept_for(role)),
		},
	};

	if owns {
		Ok(())
	} else {
		Err(Rejection::NotAParty {
			role,
			actor_id: actor_id.to_string(),
		})
	}
}

/// Missing measurements block stitching on any stitched order, whatever the
/// rider's progress.
fn check_measurement_gate(
	order: &Order,
	role: ActorRole,
	change: Change,
	recipients_measured: bool,
) -> Result<(), Rejection> {
	let stitching = change == Change::Tailor(TailorStatus::StitchingStarted)
		&& order.order_type == OrderType::FabricWithStitching
		&& order.tailor_status == TailorStatus::InProgress
		&& matches!(role, ActorRole::Tailor | ActorRole::Admin);
	if stitching && !recipients_measured {
		return Err(Rejection::MeasurementsIncomplete);
	}
	Ok(())
}

/// Membership is checked against the structural table: data preconditions
/// are assumed met here and enforced separately so they surface as their
/// own rejection.
fn check_membership(order: &Order, role: ActorRole, change: Change) -> Result<(), Rejection> {
	let allowed = allowed_transitions(order, role, true);
	let permitted = match change {
		Change::Status(s) => allowed.status.contains(&s),
		Change::Rider(s) => allowed.rider_status.contains(&s),
		Change::Tailor(s) => allowed.tailor_status.contains(&s),
	};

	if permitted {
		return Ok(());
	}
	let from = match change {
		Change::Status(_) => order.status.as_str(),
		Change::Rider(_) => order.rider_status.as_str(),
		Change::Tailor(_) => order.tailor_status.as_str(),
	};
	Err(Rejection::NotAllowed {
		role,
		dimension: change.dimension(),
		from: from.to_string(),
		to: change.value().to_string(),
	})
}

fn check_hard_rules(order: &Order, role: ActorRole, change: Change) -> Result<(), Rejection> {
	match change {
		Change::Status(OrderStatus::Cancelled) => {
			let role_may_cancel = matches!(role, ActorRole::Customer | ActorRole::Admin);
			if !role_may_cancel || order.status != OrderStatus::Pending {
				return Err(Rejection::CancellationRefused);
			}
		},
		Change::Status(OrderStatus::Collected) => {
			let role_may_collect = matches!(
				role,
				ActorRole::Customer | ActorRole::System | ActorRole::Admin
			);
			if !role_may_collect
				|| !order.is_walk_in()
				|| order.status != OrderStatus::ReadyForPickup
			{
				return Err(Rejection::CollectionRefused);
			}
		},
		_ => {},
	}
	Ok(())
}

fn check_preconditions(
	order: &Order,
	change: Change,
	recipients_measured: bool,
) -> Result<(), Rejection> {
	match change {
		Change::Tailor(TailorStatus::StitchingStarted) => {
			if !recipients_measured {
				return Err(Rejection::MeasurementsIncomplete);
			}
			if order.stitching_completion_date.is_none() {
				return Err(Rejection::CompletionDateMissing);
			}
		},
		Change::Rider(RiderStatus::MeasurementTaken)
		| Change::Tailor(TailorStatus::MeasurementsComplete) => {
			if !recipients_measured {
				return Err(Rejection::MeasurementsIncomplete);
			}
		},
		_ => {},
	}
	Ok(())
}
