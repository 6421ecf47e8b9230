//! Notifier that writes notifications to the tracing log.

use crate::{NotifierFactory, NotifierInterface, NotifierRegistry, NotifyError, StatusNotification};
use async_trait::async_trait;
use tailor_types::{ConfigSchema, ImplementationRegistry, Schema, ValidationError};

/// Logs each notification at info level.
pub struct LogNotifier;

#[async_trait]
impl NotifierInterface for LogNotifier {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(LogNotifierSchema)
	}

	async fn notify(&self, notification: &StatusNotification) -> Result<(), NotifyError> {
		let audience = notification
			.audience
			.iter()
			.map(|party| format!("{}:{}", party.role, party.id))
			.collect::<Vec<_>>()
			.join(",");
		tracing::info!(
			order_number = %notification.order_number,
			change = %notification.change,
			previous_status = %notification.previous_status,
			status = %notification.status,
			audience = %audience,
			"{}",
			notification.message
		);
		Ok(())
	}
}

/// Configuration schema for LogNotifier. No fields.
pub struct LogNotifierSchema;

impl ConfigSchema for LogNotifierSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		Schema::new(vec![], vec![]).validate(config)
	}
}

pub fn create_notifier(config: &toml::Value) -> Result<Box<dyn NotifierInterface>, NotifyError> {
	LogNotifierSchema
		.validate(config)
		.map_err(|e| NotifyError::Configuration(e.to_string()))?;
	Ok(Box::new(LogNotifier))
}

/// Registry for the log notifier.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "log";
	type Factory = NotifierFactory;

	fn factory() -> Self::Factory {
		create_notifier
	}
}

impl NotifierRegistry for Registry {}
