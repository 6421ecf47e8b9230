//! Configuration builder for tests and local development.

use crate::{
	ApiConfig, Config, LifecycleConfig, NotificationsConfig, ServiceConfig, StorageConfig,
};
use std::collections::HashMap;

/// Builds a [`Config`] backed by in-memory storage and no notifiers.
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
	service_id: String,
	storage_primary: String,
	storage_settings: toml::Value,
	notifiers: HashMap<String, toml::Value>,
	lifecycle: LifecycleConfig,
	api: Option<ApiConfig>,
}

impl Default for ConfigBuilder {
	fn default() -> Self {
		Self::new()
	}
}

impl ConfigBuilder {
	pub fn new() -> Self {
		Self {
			service_id: "test-atelier".to_string(),
			storage_primary: "memory".to_string(),
			storage_settings: toml::Value::Table(toml::Table::new()),
			notifiers: HashMap::new(),
			lifecycle: LifecycleConfig::default(),
			api: None,
		}
	}

	pub fn service_id(mut self, id: impl Into<String>) -> Self {
		self.service_id = id.into();
		self
	}

	/// Selects the primary storage implementation and its settings table.
	pub fn storage(mut self, primary: impl Into<String>, settings: toml::Value) -> Self {
		self.storage_primary = primary.into();
		self.storage_settings = settings;
		self
	}

	/// Registers a notifier implementation by name.
	pub fn notifier(mut self, name: impl Into<String>, settings: toml::Value) -> Self {
		self.notifiers.insert(name.into(), settings);
		self
	}

	pub fn pickup_auto_collect_days(mut self, days: u32) -> Self {
		self.lifecycle.pickup_auto_collect_days = days;
		self
	}

	pub fn sweep_interval_seconds(mut self, seconds: u64) -> Self {
		self.lifecycle.sweep_interval_seconds = seconds;
		self
	}

	pub fn api(mut self, api: Option<ApiConfig>) -> Self {
		self.api = api;
		self
	}

	pub fn build(self) -> Config {
		let mut implementations = HashMap::new();
		implementations.insert(self.storage_primary.clone(), self.storage_settings);

		Config {
			service: ServiceConfig {
				id: self.service_id,
			},
			storage: StorageConfig {
				primary: self.storage_primary,
				implementations,
			},
			notifications: NotificationsConfig {
				implementations: self.notifiers,
			},
			lifecycle: self.lifecycle,
			api: self.api,
		}
	}
}
