//! Builder pattern for constructing the fulfillment engine.
//!
//! Composes a [`FulfillmentEngine`] from configuration-named storage and
//! notifier implementations using factory functions.

use crate::engine::{event_bus::EventBus, FulfillmentEngine};
use crate::handlers::NotificationHandler;
use crate::history::StorageHistoryLog;
use crate::state::OrderStateMachine;
use std::collections::HashMap;
use std::sync::Arc;
use tailor_config::Config;
use tailor_notify::{NotificationService, NotifierInterface, NotifyError};
use tailor_storage::{StorageError, StorageInterface, StorageService};
use thiserror::Error;

/// Errors that can occur during engine construction.
#[derive(Debug, Error)]
pub enum BuilderError {
	#[error("Configuration error: {0}")]
	Config(String),
	#[error("Missing required component: {0}")]
	MissingComponent(String),
}

/// Factory functions for every pluggable component, keyed by the name used
/// in configuration.
pub struct EngineFactories<SF, NF> {
	pub storage_factories: HashMap<String, SF>,
	pub notifier_factories: HashMap<String, NF>,
}

/// Builder for constructing a [`FulfillmentEngine`] with pluggable
/// implementations.
pub struct EngineBuilder {
	config: Config,
}

impl EngineBuilder {
	pub fn new(config: Config) -> Self {
		Self { config }
	}

	pub fn build<SF, NF>(
		self,
		factories: EngineFactories<SF, NF>,
	) -> Result<FulfillmentEngine, BuilderError>
	where
		SF: Fn(&toml::Value) -> Result<Box<dyn StorageInterface>, StorageError>,
		NF: Fn(&toml::Value) -> Result<Box<dyn NotifierInterface>, NotifyError>,
	{
		let primary_storage = &self.config.storage.primary;
		let storage_config = self
			.config
			.storage
			.implementations
			.get(primary_storage)
			.ok_or_else(|| {
				BuilderError::Config(format!(
					"Primary storage '{}' has no configuration section",
					primary_storage
				))
			})?;
		let storage_factory = factories
			.storage_factories
			.get(primary_storage)
			.ok_or_else(|| BuilderError::MissingComponent(format!("storage '{}'", primary_storage)))?;
		let storage_backend = match storage_factory(storage_config) {
			Ok(backend) => {
				tracing::info!(component = "storage", implementation = %primary_storage, enabled = true, "Loaded");
				backend
			},
			Err(e) => {
				tracing::error!(
					component = "storage",
					implementation = %primary_storage,
					error = %e,
					"Failed to create storage implementation"
				);
				return Err(BuilderError::Config(format!(
					"Failed to create storage implementation '{}': {}",
					primary_storage, e
				)));
			},
		};
		let storage = Arc::new(StorageService::new(storage_backend));

		let mut notifiers = Vec::new();
		for (name, config) in &self.config.notifications.implementations {
			let Some(factory) = factories.notifier_factories.get(name) else {
				return Err(BuilderError::MissingComponent(format!("notifier '{}'", name)));
			};
			match factory(config) {
				Ok(notifier) => {
					tracing::info!(component = "notifier", implementation = %name, enabled = true, "Loaded");
					notifiers.push((name.clone(), notifier));
				},
				Err(e) => {
					tracing::error!(
						component = "notifier",
						implementation = %name,
						error = %e,
						"Failed to create notifier implementation"
					);
					return Err(BuilderError::Config(format!(
						"Failed to create notifier implementation '{}': {}",
						name, e
					)));
				},
			}
		}
		if notifiers.is_empty() {
			tracing::warn!(component = "notifier", "No notifiers configured, status changes will not be announced");
		}

		let event_bus = EventBus::new(self.config.lifecycle.event_bus_capacity);
		let history = Arc::new(StorageHistoryLog::new(storage.clone()));
		let state_machine = Arc::new(OrderStateMachine::new(
			storage.clone(),
			history,
			event_bus.clone(),
		));
		let notification_handler = Arc::new(NotificationHandler::new(Arc::new(
			NotificationService::new(notifiers),
		)));

		Ok(FulfillmentEngine::new(
			self.config,
			storage,
			state_machine,
			notification_handler,
			event_bus,
		))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::state::{NewOrder, TransitionCommand};
	use tailor_config::builders::config::ConfigBuilder;
	use tailor_types::{
		Actor, DesiredTransition, OrderStatus, OrderType, ServiceMode, TailorStatus,
	};

	fn factories() -> EngineFactories<tailor_storage::StorageFactory, tailor_notify::NotifierFactory> {
		EngineFactories {
			storage_factories: tailor_storage::get_all_implementations()
				.into_iter()
				.map(|(name, factory)| (name.to_string(), factory))
				.collect(),
			notifier_factories: tailor_notify::get_all_implementations()
				.into_iter()
				.map(|(name, factory)| (name.to_string(), factory))
				.collect(),
		}
	}

	fn table(entries: &[(&str, &str)]) -> toml::Value {
		let mut table = toml::Table::new();
		for (key, value) in entries {
			table.insert(key.to_string(), toml::Value::String(value.to_string()));
		}
		toml::Value::Table(table)
	}

	#[test]
	fn test_unknown_storage_is_missing_component() {
		let config = ConfigBuilder::new().storage("redis", table(&[])).build();
		let result = EngineBuilder::new(config).build(factories());
		assert!(matches!(result, Err(BuilderError::MissingComponent(_))));
	}

	#[test]
	fn test_invalid_notifier_settings_fail_the_build() {
		let config = ConfigBuilder::new()
			.notifier("webhook", table(&[("url", "ftp://example.com")]))
			.build();
		let result = EngineBuilder::new(config).build(factories());
		assert!(matches!(result, Err(BuilderError::Config(_))));
	}

	#[tokio::test]
	async fn test_engine_runs_until_shutdown() {
		let config = ConfigBuilder::new()
			.notifier("log", table(&[]))
			.sweep_interval_seconds(0)
			.build();
		let engine = EngineBuilder::new(config).build(factories()).unwrap();
		engine.initialize().await.unwrap();

		let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
		let runner = engine.clone();
		let handle = tokio::spawn(async move {
			runner
				.run_until(async {
					stop_rx.await.ok();
				})
				.await
		});
		tokio::task::yield_now().await;

		let machine = engine.state_machine();
		let order = machine
			.create_order(NewOrder {
				order_type: OrderType::FabricOnly,
				service_mode: ServiceMode::WalkIn,
				customer_id: "cust-1".into(),
				tailor_id: None,
				rider_id: None,
				recipients: Vec::new(),
				stitching_completion_date: None,
			})
			.await
			.unwrap();
		let outcome = machine
			.transition(
				&order.id,
				TransitionCommand::new(
					DesiredTransition::tailor(TailorStatus::Accepted),
					Actor::tailor("tailor-1"),
				),
			)
			.await
			.unwrap();
		assert_eq!(outcome.order.status, OrderStatus::Confirmed);

		stop_tx.send(()).unwrap();
		handle.await.unwrap().unwrap();
		engine.shutdown().await.unwrap();
	}
}
