//! Order state machine.
//!
//! Every write to an order goes through [`OrderStateMachine`]. Status,
//! sub-status and payment changes run the full transition path: lock, load,
//! gate, apply, derive, persist, record history, then publish an event once
//! the lock is released. The supporting mutators (assignment, measurements,
//! completion date) share the lock but never touch a status field.

use crate::engine::event_bus::EventBus;
use crate::history::{entry_for, HistoryLog};
use crate::state::locks::OrderLocks;
use crate::transitions::gate::{self, Change};
use crate::transitions::{derive, validate_payment, Rejection, RejectionKind};
use chrono::{NaiveDate, Utc};
use std::sync::Arc;
use tailor_storage::{StorageError, StorageService};
use tailor_types::{
	current_timestamp, truncate_id, Actor, ActorRole, DesiredTransition, FulfillmentEvent,
	HistoryEntry, Order, OrderEvent, OrderStatus, OrderType, PaymentStatus, Recipient,
	RiderStatus, ServiceMode, StatusDimension, StorageKey, TailorStatus,
};
use thiserror::Error;
use tracing::instrument;

/// Attempts at drawing an unused order number before giving up.
const ORDER_NUMBER_ATTEMPTS: usize = 5;

const MEASUREMENT_ROLES: [ActorRole; 4] = [
	ActorRole::Customer,
	ActorRole::Tailor,
	ActorRole::Rider,
	ActorRole::Admin,
];

/// Errors returned by the state machine.
#[derive(Debug, Error)]
pub enum TransitionError {
	#[error("Order not found: {0}")]
	NotFound(String),
	#[error("Recipient not found: {0}")]
	RecipientNotFound(String),
	#[error("{0}")]
	Forbidden(Rejection),
	#[error("{0}")]
	IllegalTransition(Rejection),
	#[error("{0}")]
	TerminalOrder(Rejection),
	#[error("{0}")]
	PreconditionFailed(Rejection),
	#[error("Order is at version {actual}, expected {expected}")]
	Conflict { expected: u64, actual: u64 },
	#[error("Invalid request: {0}")]
	InvalidRequest(String),
	#[error("Storage error: {0}")]
	Storage(String),
}

impl From<Rejection> for TransitionError {
	fn from(rejection: Rejection) -> Self {
		match rejection.kind() {
			RejectionKind::TerminalOrder => TransitionError::TerminalOrder(rejection),
			RejectionKind::Forbidden => TransitionError::Forbidden(rejection),
			RejectionKind::IllegalTransition => TransitionError::IllegalTransition(rejection),
			RejectionKind::PreconditionFailed => TransitionError::PreconditionFailed(rejection),
		}
	}
}

impl TransitionError {
	/// The gate rejection behind this error, if any.
	pub fn rejection(&self) -> Option<&Rejection> {
		match self {
			TransitionError::Forbidden(r)
			| TransitionError::IllegalTransition(r)
			| TransitionError::TerminalOrder(r)
			| TransitionError::PreconditionFailed(r) => Some(r),
			_ => None,
		}
	}
}

fn storage_error(order_id: &str, err: StorageError) -> TransitionError {
	match err {
		StorageError::NotFound => TransitionError::NotFound(order_id.to_string()),
		other => TransitionError::Storage(other.to_string()),
	}
}

/// A requested status, rider status or tailor status change.
#[derive(Debug, Clone)]
pub struct TransitionCommand {
	pub desired: DesiredTransition,
	pub actor: Actor,
	pub notes: Option<String>,
	/// Refuse the change unless the order is still at this version.
	pub expected_version: Option<u64>,
}

impl TransitionCommand {
	pub fn new(desired: DesiredTransition, actor: Actor) -> Self {
		Self {
			desired,
			actor,
			notes: None,
			expected_version: None,
		}
	}

	pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
		self.notes = Some(notes.into());
		self
	}

	pub fn expecting_version(mut self, version: u64) -> Self {
		self.expected_version = Some(version);
		self
	}
}

/// A requested payment status change.
#[derive(Debug, Clone)]
pub struct PaymentCommand {
	pub payment_status: PaymentStatus,
	pub actor: Actor,
	pub notes: Option<String>,
}

/// Result of a transition call.
#[derive(Debug, Clone)]
pub struct TransitionOutcome {
	/// The order as stored after the call.
	pub order: Order,
	pub previous_status: OrderStatus,
	/// False when the request matched the order as it already was.
	pub changed: bool,
}

/// Everything needed to place an order.
#[derive(Debug, Clone)]
pub struct NewOrder {
	pub order_type: OrderType,
	pub service_mode: ServiceMode,
	pub customer_id: String,
	pub tailor_id: Option<String>,
	pub rider_id: Option<String>,
	/// Recipient names with the measurements already on file for them.
	pub recipients: Vec<(String, Option<String>)>,
	pub stitching_completion_date: Option<NaiveDate>,
}

/// Serialised, audited access to order records.
pub struct OrderStateMachine {
	storage: Arc<StorageService>,
	history: Arc<dyn HistoryLog>,
	event_bus: EventBus,
	locks: OrderLocks,
}

impl OrderStateMachine {
	pub fn new(
		storage: Arc<StorageService>,
		history: Arc<dyn HistoryLog>,
		event_bus: EventBus,
	) -> Self {
		Self {
			storage,
			history,
			event_bus,
			locks: OrderLocks::new(),
		}
	}

	pub fn event_bus(&self) -> &EventBus {
		&self.event_bus
	}

	/// Places a new order in `pending/none/none` with payment pending.
	pub async fn create_order(&self, new: NewOrder) -> Result<Order, TransitionError> {
		if new.customer_id.trim().is_empty() {
			return Err(TransitionError::InvalidRequest(
				"customer_id must not be empty".into(),
			));
		}
		if new.service_mode == ServiceMode::WalkIn && new.rider_id.is_some() {
			return Err(TransitionError::InvalidRequest(
				"walk-in orders have no rider".into(),
			));
		}
		if new.recipients.iter().any(|(name, _)| name.trim().is_empty()) {
			return Err(TransitionError::InvalidRequest(
				"recipient names must not be empty".into(),
			));
		}

		let id = uuid::Uuid::new_v4().to_string();
		let order_number = self.unused_order_number().await?;
		let now = current_timestamp();
		let recipients: Vec<Recipient> = new
			.recipients
			.into_iter()
			.map(|(name, measurement_id)| Recipient {
				id: uuid::Uuid::new_v4().to_string(),
				name,
				measurement_id: measurement_id.filter(|m| !m.is_empty()),
			})
			.collect();

		let mut order = Order {
			id: id.clone(),
			order_number: order_number.clone(),
			order_type: new.order_type,
			service_mode: new.service_mode,
			status: OrderStatus::Pending,
			rider_status: RiderStatus::None,
			tailor_status: TailorStatus::None,
			payment_status: PaymentStatus::Pending,
			customer_id: new.customer_id,
			tailor_id: new.tailor_id.filter(|t| !t.is_empty()),
			rider_id: new.rider_id.filter(|r| !r.is_empty()),
			recipients,
			measurements_on_file: false,
			stitching_completion_date: new.stitching_completion_date,
			version: 1,
			created_at: now,
			updated_at: now,
			status_changed_at: now,
		};
		order.measurements_on_file = order.recipients_measured();

		self.storage
			.store(StorageKey::Orders.as_str(), &id, &order)
			.await
			.map_err(|e| storage_error(&id, e))?;
		self.storage
			.store(StorageKey::OrderByNumber.as_str(), &order_number, &id)
			.await
			.map_err(|e| storage_error(&id, e))?;

		tracing::info!(
			order_id = %truncate_id(&id),
			order_number = %order_number,
			order_type = %order.order_type,
			service_mode = %order.service_mode,
			"Order placed"
		);
		self.event_bus
			.publish(FulfillmentEvent::Order(OrderEvent::Created {
				order: order.clone(),
			}))
			.ok();
		Ok(order)
	}

	async fn unused_order_number(&self) -> Result<String, TransitionError> {
		let namespace = StorageKey::OrderByNumber.as_str();
		for _ in 0..ORDER_NUMBER_ATTEMPTS {
			let candidate = generate_order_number();
			let taken = self
				.storage
				.exists(namespace, &candidate)
				.await
				.map_err(|e| TransitionError::Storage(e.to_string()))?;
			if !taken {
				return Ok(candidate);
			}
			tracing::debug!(order_number = %candidate, "Order number taken, drawing another");
		}
		Err(TransitionError::Storage(
			"could not allocate an unused order number".into(),
		))
	}

	pub async fn get_order(&self, order_id: &str) -> Result<Order, TransitionError> {
		self.storage
			.retrieve(StorageKey::Orders.as_str(), order_id)
			.await
			.map_err(|e| storage_error(order_id, e))
	}

	pub async fn get_order_by_number(&self, order_number: &str) -> Result<Order, TransitionError> {
		let order_id: String = self
			.storage
			.retrieve(StorageKey::OrderByNumber.as_str(), order_number)
			.await
			.map_err(|e| storage_error(order_number, e))?;
		self.get_order(&order_id).await
	}

	pub async fn list_orders(&self) -> Result<Vec<Order>, TransitionError> {
		self.storage
			.retrieve_all(StorageKey::Orders.as_str())
			.await
			.map_err(|e| TransitionError::Storage(e.to_string()))
	}

	/// Audit trail of an order, oldest entry first.
	pub async fn history(&self, order_id: &str) -> Result<Vec<HistoryEntry>, TransitionError> {
		self.get_order(order_id).await?;
		self.history
			.entries(order_id)
			.await
			.map_err(|e| TransitionError::Storage(e.to_string()))
	}

	/// Applies one status, rider status or tailor status change.
	#[instrument(skip_all, fields(order_id = %truncate_id(order_id), role = %command.actor.role))]
	pub async fn transition(
		&self,
		order_id: &str,
		command: TransitionCommand,
	) -> Result<TransitionOutcome, TransitionError> {
		let guard = self.locks.acquire(order_id).await;

		let mut order = self.get_order(order_id).await?;
		check_version(&order, command.expected_version)?;
		let previous_status = order.status;

		let measured = order.recipients_measured();
		let change = match gate::validate(&order, &command.desired, &command.actor, measured) {
			Ok(Some(change)) => change,
			Ok(None) => {
				tracing::debug!("Requested values already current");
				return Ok(TransitionOutcome {
					order,
					previous_status,
					changed: false,
				});
			},
			Err(rejection) => {
				tracing::info!(reason = %rejection, "Transition rejected");
				return Err(rejection.into());
			},
		};

		apply(&mut order, change, &command.actor);
		derive::sync(&mut order);
		let now = current_timestamp();
		order.version += 1;
		order.updated_at = now;
		if order.status != previous_status {
			order.status_changed_at = now;
		}
		self.persist(&order).await?;

		self.record(entry_for(
			&order,
			previous_status,
			change.dimension(),
			change.value(),
			&command.actor,
			command.notes.as_deref(),
		))
		.await;
		drop(guard);

		tracing::info!(
			dimension = %change.dimension(),
			value = change.value(),
			previous_status = %previous_status,
			status = %order.status,
			version = order.version,
			"Transition committed"
		);
		self.event_bus
			.publish(FulfillmentEvent::Order(OrderEvent::StatusChanged {
				order: order.clone(),
				previous_status,
				dimension: change.dimension(),
				actor_role: command.actor.role,
			}))
			.ok();

		Ok(TransitionOutcome {
			order,
			previous_status,
			changed: true,
		})
	}

	/// Applies a payment status change.
	#[instrument(skip_all, fields(order_id = %truncate_id(order_id), role = %command.actor.role))]
	pub async fn transition_payment(
		&self,
		order_id: &str,
		command: PaymentCommand,
	) -> Result<TransitionOutcome, TransitionError> {
		let guard = self.locks.acquire(order_id).await;

		let mut order = self.get_order(order_id).await?;
		let previous_status = order.status;
		let previous_payment = order.payment_status;

		let Some(payment_status) =
			validate_payment(&order, command.payment_status, &command.actor)?
		else {
			return Ok(TransitionOutcome {
				order,
				previous_status,
				changed: false,
			});
		};

		order.payment_status = payment_status;
		order.version += 1;
		order.updated_at = current_timestamp();
		self.persist(&order).await?;

		self.record(entry_for(
			&order,
			previous_status,
			StatusDimension::PaymentStatus,
			payment_status.as_str(),
			&command.actor,
			command.notes.as_deref(),
		))
		.await;
		drop(guard);

		tracing::info!(
			previous = %previous_payment,
			payment_status = %payment_status,
			"Payment status changed"
		);
		self.event_bus
			.publish(FulfillmentEvent::Order(OrderEvent::PaymentChanged {
				order: order.clone(),
				previous: previous_payment,
				actor_role: command.actor.role,
			}))
			.ok();

		Ok(TransitionOutcome {
			order,
			previous_status,
			changed: true,
		})
	}

	/// Removes a pending order together with its history.
	#[instrument(skip_all, fields(order_id = %truncate_id(order_id)))]
	pub async fn delete_order(&self, order_id: &str, actor: &Actor) -> Result<(), TransitionError> {
		let guard = self.locks.acquire(order_id).await;

		let order = self.get_order(order_id).await?;
		require_role(actor, &[ActorRole::Customer, ActorRole::Admin])?;
		if order.is_terminal() {
			return Err(Rejection::TerminalOrder(order.status).into());
		}
		gate::check_ownership(&order, actor, &[])?;
		if order.status != OrderStatus::Pending {
			return Err(Rejection::NotPending.into());
		}

		self.storage
			.remove(StorageKey::Orders.as_str(), order_id)
			.await
			.map_err(|e| storage_error(order_id, e))?;
		if let Err(e) = self
			.storage
			.remove(StorageKey::OrderByNumber.as_str(), &order.order_number)
			.await
		{
			tracing::warn!(error = %e, "Failed to remove order number index entry");
		}
		if let Err(e) = self.history.clear(order_id).await {
			tracing::warn!(error = %e, "Failed to clear order history");
		}
		drop(guard);
		self.locks.forget(order_id);

		tracing::info!(order_number = %order.order_number, "Order deleted");
		self.event_bus
			.publish(FulfillmentEvent::Order(OrderEvent::Deleted {
				order_id: order_id.to_string(),
			}))
			.ok();
		Ok(())
	}

	/// Attaches a measurement record to one recipient.
	#[instrument(skip_all, fields(order_id = %truncate_id(order_id)))]
	pub async fn record_measurement(
		&self,
		order_id: &str,
		recipient_id: &str,
		measurement_id: &str,
		actor: &Actor,
	) -> Result<Order, TransitionError> {
		if measurement_id.trim().is_empty() {
			return Err(TransitionError::InvalidRequest(
				"measurement_id must not be empty".into(),
			));
		}
		self.mutate(order_id, actor, &MEASUREMENT_ROLES, |order| {
			let recipient = order
				.recipient_mut(recipient_id)
				.ok_or_else(|| TransitionError::RecipientNotFound(recipient_id.to_string()))?;
			recipient.measurement_id = Some(measurement_id.to_string());
			Ok(())
		})
		.await
	}

	/// Sets the date the tailor promises stitching will be finished.
	#[instrument(skip_all, fields(order_id = %truncate_id(order_id)))]
	pub async fn set_stitching_completion_date(
		&self,
		order_id: &str,
		date: NaiveDate,
		actor: &Actor,
	) -> Result<Order, TransitionError> {
		self.mutate(order_id, actor, &[ActorRole::Tailor, ActorRole::Admin], |order| {
			if order.order_type == OrderType::MeasurementService {
				return Err(TransitionError::InvalidRequest(
					"measurement-only orders are not stitched".into(),
				));
			}
			order.stitching_completion_date = Some(date);
			Ok(())
		})
		.await
	}

	/// Assigns or reassigns the tailor and/or rider.
	#[instrument(skip_all, fields(order_id = %truncate_id(order_id)))]
	pub async fn assign(
		&self,
		order_id: &str,
		tailor_id: Option<String>,
		rider_id: Option<String>,
		actor: &Actor,
	) -> Result<Order, TransitionError> {
		let tailor_id = tailor_id.filter(|t| !t.is_empty());
		let rider_id = rider_id.filter(|r| !r.is_empty());
		if tailor_id.is_none() && rider_id.is_none() {
			return Err(TransitionError::InvalidRequest(
				"nothing to assign".into(),
			));
		}
		self.mutate(order_id, actor, &[ActorRole::Admin], |order| {
			if rider_id.is_some() && order.is_walk_in() {
				return Err(TransitionError::InvalidRequest(
					"walk-in orders have no rider".into(),
				));
			}
			if let Some(tailor_id) = tailor_id {
				order.tailor_id = Some(tailor_id);
			}
			if let Some(rider_id) = rider_id {
				order.rider_id = Some(rider_id);
			}
			Ok(())
		})
		.await
	}

	/// Shared path of the non-status mutators. The closure never sees a
	/// terminal order and its status fields are restored if it touches them.
	async fn mutate<F>(
		&self,
		order_id: &str,
		actor: &Actor,
		roles: &[ActorRole],
		update: F,
	) -> Result<Order, TransitionError>
	where
		F: FnOnce(&mut Order) -> Result<(), TransitionError>,
	{
		let _guard = self.locks.acquire(order_id).await;

		let mut order = self.get_order(order_id).await?;
		require_role(actor, roles)?;
		if order.is_terminal() {
			return Err(Rejection::TerminalOrder(order.status).into());
		}
		gate::check_ownership(&order, actor, &[])?;

		let statuses = (
			order.status,
			order.rider_status,
			order.tailor_status,
			order.payment_status,
		);
		update(&mut order)?;
		(
			order.status,
			order.rider_status,
			order.tailor_status,
			order.payment_status,
		) = statuses;

		order.version += 1;
		order.updated_at = current_timestamp();
		self.persist(&order).await?;
		tracing::debug!(version = order.version, "Order updated");
		Ok(order)
	}

	async fn persist(&self, order: &Order) -> Result<(), TransitionError> {
		self.storage
			.update(StorageKey::Orders.as_str(), &order.id, order)
			.await
			.map_err(|e| storage_error(&order.id, e))
	}

	async fn record(&self, entry: HistoryEntry) {
		if let Err(e) = self.history.append(entry).await {
			tracing::warn!(error = %e, "Failed to append history entry");
		}
	}
}

fn check_version(order: &Order, expected: Option<u64>) -> Result<(), TransitionError> {
	match expected {
		Some(expected) if expected != order.version => Err(TransitionError::Conflict {
			expected,
			actual: order.version,
		}),
		_ => Ok(()),
	}
}

fn require_role(actor: &Actor, roles: &[ActorRole]) -> Result<(), TransitionError> {
	if roles.contains(&actor.role) {
		Ok(())
	} else {
		Err(Rejection::RoleNotPermitted(actor.role).into())
	}
}

/// Writes the validated change and records a claim when an unassigned
/// tailor or rider accepts.
fn apply(order: &mut Order, change: Change, actor: &Actor) {
	match change {
		Change::Status(status) => order.status = status,
		Change::Tailor(status) => {
			order.tailor_status = status;
			if actor.role == ActorRole::Tailor && order.tailor_id.is_none() {
				order.tailor_id = actor.id.clone();
			}
		},
		Change::Rider(status) => {
			order.rider_status = status;
			if actor.role == ActorRole::Rider && order.rider_id.is_none() {
				order.rider_id = actor.id.clone();
			}
		},
	}
}

/// `ORD-<YYYYMMDD>-<8 uppercase hex>`.
fn generate_order_number() -> String {
	let suffix = uuid::Uuid::new_v4().simple().to_string();
	format!(
		"ORD-{}-{}",
		Utc::now().format("%Y%m%d"),
		suffix[..8].to_uppercase()
	)
}
