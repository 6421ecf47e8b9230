//! Stale pickup sweep.
//!
//! Walk-in orders left in `ready_for_pickup` past the threshold are marked
//! collected by the `system` actor. The collection runs through the state
//! machine like any other transition, so it is gated and audited.

use crate::engine::event_bus::EventBus;
use crate::state::{OrderStateMachine, TransitionCommand, TransitionError};
use std::sync::Arc;
use tailor_types::{
	current_timestamp, days_to_seconds, truncate_id, Actor, DesiredTransition, FulfillmentEvent,
	MaintenanceEvent, OrderStatus,
};
use tracing::instrument;

pub struct PickupSweeper {
	state_machine: Arc<OrderStateMachine>,
	event_bus: EventBus,
}

impl PickupSweeper {
	pub fn new(state_machine: Arc<OrderStateMachine>, event_bus: EventBus) -> Self {
		Self {
			state_machine,
			event_bus,
		}
	}

	/// Collects every stale walk-in pickup and returns how many were moved.
	pub async fn auto_advance_stale_pickups(
		&self,
		threshold_days: u32,
	) -> Result<usize, TransitionError> {
		self.sweep_at(threshold_days, current_timestamp()).await
	}

	#[instrument(skip_all, fields(threshold_days = threshold_days))]
	pub(crate) async fn sweep_at(
		&self,
		threshold_days: u32,
		now: u64,
	) -> Result<usize, TransitionError> {
		let threshold = days_to_seconds(threshold_days);
		let stale: Vec<_> = self
			.state_machine
			.list_orders()
			.await?
			.into_iter()
			.filter(|order| {
				order.is_walk_in()
					&& order.status == OrderStatus::ReadyForPickup
					&& now.saturating_sub(order.status_changed_at) >= threshold
			})
			.collect();

		let mut collected = 0;
		for order in stale {
			let command = TransitionCommand::new(
				DesiredTransition::status(OrderStatus::Collected),
				Actor::system(),
			)
			.with_notes(format!(
				"Collected automatically after {} days ready for pickup",
				threshold_days
			))
			.expecting_version(order.version);

			match self.state_machine.transition(&order.id, command).await {
				Ok(outcome) if outcome.changed => collected += 1,
				Ok(_) => {},
				Err(TransitionError::Conflict { .. }) => {
					tracing::debug!(
						order_id = %truncate_id(&order.id),
						"Order changed during sweep, leaving it for the next pass"
					);
				},
				Err(e) => {
					tracing::warn!(
						order_id = %truncate_id(&order.id),
						error = %e,
						"Failed to auto-collect order"
					);
				},
			}
		}

		if collected > 0 {
			tracing::info!(collected, "Stale pickups collected");
		}
		self.event_bus
			.publish(FulfillmentEvent::Maintenance(
				MaintenanceEvent::PickupSweepCompleted { collected },
			))
			.ok();
		Ok(collected)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::history::StorageHistoryLog;
	use crate::state::NewOrder;
	use crate::testing::{CUSTOMER, TAILOR};
	use tailor_storage::implementations::memory::MemoryStorage;
	use tailor_storage::StorageService;
	use tailor_types::{ActorRole, OrderType, ServiceMode, TailorStatus};

	fn machine(bus: &EventBus) -> Arc<OrderStateMachine> {
		let storage = Arc::new(StorageService::new(Box::new(MemoryStorage::new())));
		let history = Arc::new(StorageHistoryLog::new(storage.clone()));
		Arc::new(OrderStateMachine::new(storage, history, bus.clone()))
	}

	async fn place(machine: &OrderStateMachine, service_mode: ServiceMode) -> String {
		machine
			.create_order(NewOrder {
				order_type: OrderType::FabricOnly,
				service_mode,
				customer_id: CUSTOMER.into(),
				tailor_id: None,
				rider_id: None,
				recipients: vec![("Amina".into(), None)],
				stitching_completion_date: None,
			})
			.await
			.unwrap()
			.id
	}

	async fn tailor_moves(machine: &OrderStateMachine, order_id: &str, steps: &[TailorStatus]) {
		for step in steps {
			machine
				.transition(
					order_id,
					TransitionCommand::new(DesiredTransition::tailor(*step), Actor::tailor(TAILOR)),
				)
				.await
				.unwrap();
		}
	}

	#[tokio::test]
	async fn test_sweep_collects_only_stale_walk_in_pickups() {
		let bus = EventBus::new(64);
		let machine = machine(&bus);
		let sweeper = PickupSweeper::new(machine.clone(), bus.clone());

		let ready = place(&machine, ServiceMode::WalkIn).await;
		tailor_moves(
			&machine,
			&ready,
			&[
				TailorStatus::Accepted,
				TailorStatus::InProgress,
				TailorStatus::Stitched,
			],
		)
		.await;
		let working = place(&machine, ServiceMode::WalkIn).await;
		tailor_moves(&machine, &working, &[TailorStatus::Accepted]).await;
		let home = place(&machine, ServiceMode::HomeDelivery).await;

		let ready_at = machine.get_order(&ready).await.unwrap().status_changed_at;
		assert_eq!(sweeper.sweep_at(7, ready_at + days_to_seconds(6)).await.unwrap(), 0);

		let mut events = bus.subscribe();
		assert_eq!(sweeper.sweep_at(7, ready_at + days_to_seconds(7)).await.unwrap(), 1);
		assert!(matches!(
			events.recv().await.unwrap(),
			FulfillmentEvent::Order(_)
		));
		assert!(matches!(
			events.recv().await.unwrap(),
			FulfillmentEvent::Maintenance(MaintenanceEvent::PickupSweepCompleted { collected: 1 })
		));

		let collected = machine.get_order(&ready).await.unwrap();
		assert_eq!(collected.status, OrderStatus::Collected);
		let entries = machine.history(&ready).await.unwrap();
		let last = entries.last().unwrap();
		assert_eq!(last.actor_role, ActorRole::System);
		assert!(last.changed_by.is_none());

		assert_eq!(
			machine.get_order(&working).await.unwrap().status,
			OrderStatus::Confirmed
		);
		assert_eq!(
			machine.get_order(&home).await.unwrap().status,
			OrderStatus::Pending
		);

		// A second pass finds nothing left to collect.
		assert_eq!(sweeper.sweep_at(7, ready_at + days_to_seconds(30)).await.unwrap(), 0);
	}
}
