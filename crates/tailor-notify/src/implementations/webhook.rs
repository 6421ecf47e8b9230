//! Notifier that POSTs each notification as JSON to an HTTP endpoint.

use crate::{NotifierFactory, NotifierInterface, NotifierRegistry, NotifyError, StatusNotification};
use async_trait::async_trait;
use std::time::Duration;
use tailor_types::{ConfigSchema, Field, FieldType, ImplementationRegistry, Schema, ValidationError};

const DEFAULT_TIMEOUT_SECONDS: u64 = 10;

/// Delivers notifications to a webhook URL.
pub struct WebhookNotifier {
	client: reqwest::Client,
	url: String,
}

impl WebhookNotifier {
	pub fn new(url: String, timeout: Duration) -> Result<Self, NotifyError> {
		let client = reqwest::Client::builder()
			.timeout(timeout)
			.build()
			.map_err(|e| NotifyError::Configuration(format!("Failed to build HTTP client: {}", e)))?;
		Ok(Self { client, url })
	}
}

#[async_trait]
impl NotifierInterface for WebhookNotifier {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(WebhookNotifierSchema)
	}

	async fn notify(&self, notification: &StatusNotification) -> Result<(), NotifyError> {
		let response = self
			.client
			.post(&self.url)
			.json(notification)
			.send()
			.await
			.map_err(|e| NotifyError::Network(e.to_string()))?;

		let status = response.status();
		if !status.is_success() {
			return Err(NotifyError::Rejected(format!(
				"{} responded with {}",
				self.url, status
			)));
		}

		tracing::debug!(
			order_number = %notification.order_number,
			url = %self.url,
			"Webhook notification delivered"
		);
		Ok(())
	}
}

/// Configuration schema for WebhookNotifier.
pub struct WebhookNotifierSchema;

impl ConfigSchema for WebhookNotifierSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![Field::new("url", FieldType::String).with_validator(|value| {
				match value.as_str() {
					Some(url) if url.starts_with("http://") || url.starts_with("https://") => Ok(()),
					_ => Err("url must be an http(s) URL".to_string()),
				}
			})],
			vec![Field::new(
				"timeout_seconds",
				FieldType::Integer {
					min: Some(1),
					max: Some(300),
				},
			)],
		);
		schema.validate(config)
	}
}

/// Factory function to create a webhook notifier.
///
/// Configuration parameters:
/// - `url`: Endpoint receiving the JSON payload (required)
/// - `timeout_seconds`: Request timeout (default: 10)
pub fn create_notifier(config: &toml::Value) -> Result<Box<dyn NotifierInterface>, NotifyError> {
	WebhookNotifierSchema
		.validate(config)
		.map_err(|e| NotifyError::Configuration(e.to_string()))?;

	let url = config
		.get("url")
		.and_then(|v| v.as_str())
		.ok_or_else(|| NotifyError::Configuration("url is required".into()))?
		.to_string();
	let timeout = config
		.get("timeout_seconds")
		.and_then(|v| v.as_integer())
		.map(|v| v as u64)
		.unwrap_or(DEFAULT_TIMEOUT_SECONDS);

	Ok(Box::new(WebhookNotifier::new(
		url,
		Duration::from_secs(timeout),
	)?))
}

/// Registry for the webhook notifier.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "webhook";
	type Factory = NotifierFactory;

	fn factory() -> Self::Factory {
		create_notifier
	}
}

impl NotifierRegistry for Registry {}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_factory_requires_url() {
		let config: toml::Value = toml::from_str("timeout_seconds = 5").unwrap();
		let err = create_notifier(&config).err().unwrap();
		assert!(err.to_string().contains("url"));
	}

	#[test]
	fn test_factory_rejects_non_http_url() {
		let config: toml::Value = toml::from_str("url = \"ftp://hooks.example\"").unwrap();
		assert!(matches!(
			create_notifier(&config),
			Err(NotifyError::Configuration(_))
		));
	}

	#[test]
	fn test_factory_accepts_valid_settings() {
		let config: toml::Value =
			toml::from_str("url = \"https://hooks.example/orders\"\ntimeout_seconds = 3").unwrap();
		assert!(create_notifier(&config).is_ok());
	}
}
