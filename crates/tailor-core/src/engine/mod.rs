//! Fulfillment engine.
//!
//! [`FulfillmentEngine`] owns the state machine and the handlers that react
//! to it. Its run loop fans committed order events out to the notification
//! handler and runs the stale pickup sweep on the configured interval.

pub mod event_bus;
pub mod lifecycle;

use crate::handlers::{NotificationHandler, PickupSweeper};
use crate::state::OrderStateMachine;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tailor_config::Config;
use tailor_storage::StorageService;
use tailor_types::FulfillmentEvent;
use thiserror::Error;
use tokio::sync::{broadcast, Semaphore};

/// Errors that can occur while the engine is running.
#[derive(Debug, Error)]
pub enum EngineError {
	#[error("Service error: {0}")]
	Service(String),
}

/// Main engine coordinating order state, notifications and housekeeping.
#[derive(Clone)]
pub struct FulfillmentEngine {
	pub(crate) config: Config,
	pub(crate) storage: Arc<StorageService>,
	pub(crate) event_bus: event_bus::EventBus,
	pub(crate) state_machine: Arc<OrderStateMachine>,
	pub(crate) notification_handler: Arc<NotificationHandler>,
	pub(crate) sweeper: Arc<PickupSweeper>,
}

impl FulfillmentEngine {
	pub fn new(
		config: Config,
		storage: Arc<StorageService>,
		state_machine: Arc<OrderStateMachine>,
		notification_handler: Arc<NotificationHandler>,
		event_bus: event_bus::EventBus,
	) -> Self {
		let sweeper = Arc::new(PickupSweeper::new(
			state_machine.clone(),
			event_bus.clone(),
		));
		Self {
			config,
			storage,
			event_bus,
			state_machine,
			notification_handler,
			sweeper,
		}
	}

	/// Runs until Ctrl-C.
	pub async fn run(&self) -> Result<(), EngineError> {
		self.run_until(async {
			if let Err(e) = tokio::signal::ctrl_c().await {
				tracing::error!(error = %e, "Failed to listen for shutdown signal");
			}
		})
		.await
	}

	/// Runs the event loop until `shutdown` resolves.
	pub async fn run_until<S>(&self, shutdown: S) -> Result<(), EngineError>
	where
		S: Future<Output = ()>,
	{
		let mut event_receiver = self.event_bus.subscribe();
		let lifecycle = &self.config.lifecycle;

		let sweep_handle = if lifecycle.sweep_interval_seconds > 0 {
			let sweeper = self.sweeper.clone();
			let threshold_days = lifecycle.pickup_auto_collect_days;
			let mut interval =
				tokio::time::interval(Duration::from_secs(lifecycle.sweep_interval_seconds));
			Some(tokio::spawn(async move {
				loop {
					interval.tick().await;
					if let Err(e) = sweeper.auto_advance_stale_pickups(threshold_days).await {
						tracing::warn!(error = %e, "Stale pickup sweep failed");
					}
				}
			}))
		} else {
			None
		};

		let semaphore = Arc::new(Semaphore::new(lifecycle.max_concurrent_notifications));
		tokio::pin!(shutdown);

		loop {
			tokio::select! {
				event = event_receiver.recv() => {
					match event {
						Ok(FulfillmentEvent::Order(event)) => {
							self.spawn_handler(&semaphore, move |engine| async move {
								engine.notification_handler.handle(&event).await;
								Ok(())
							})
							.await;
						},
						Ok(FulfillmentEvent::Maintenance(event)) => {
							tracing::debug!(?event, "Maintenance event");
						},
						Err(broadcast::error::RecvError::Lagged(skipped)) => {
							tracing::warn!(skipped, "Event receiver lagged, notifications dropped");
						},
						Err(broadcast::error::RecvError::Closed) => break,
					}
				}

				_ = &mut shutdown => {
					break;
				}
			}
		}

		if let Some(handle) = sweep_handle {
			handle.abort();
		}
		Ok(())
	}

	pub fn event_bus(&self) -> &event_bus::EventBus {
		&self.event_bus
	}

	pub fn config(&self) -> &Config {
		&self.config
	}

	pub fn storage(&self) -> &Arc<StorageService> {
		&self.storage
	}

	pub fn state_machine(&self) -> &Arc<OrderStateMachine> {
		&self.state_machine
	}

	pub fn sweeper(&self) -> &Arc<PickupSweeper> {
		&self.sweeper
	}

	/// Spawns a handler task once a semaphore permit is available.
	async fn spawn_handler<F, Fut>(&self, semaphore: &Arc<Semaphore>, handler: F)
	where
		F: FnOnce(FulfillmentEngine) -> Fut + Send + 'static,
		Fut: Future<Output = Result<(), EngineError>> + Send,
	{
		let engine = self.clone();
		match semaphore.clone().acquire_owned().await {
			Ok(permit) => {
				tokio::spawn(async move {
					let _permit = permit;
					if let Err(e) = handler(engine).await {
						tracing::error!("Handler error: {}", e);
					}
				});
			},
			Err(e) => {
				tracing::error!("Failed to acquire semaphore permit: {}", e);
			},
		}
	}
}
