//! Startup and shutdown hooks for the fulfillment engine.

use super::{EngineError, FulfillmentEngine};
use tailor_types::StorageKey;

impl FulfillmentEngine {
	/// Checks that the primary storage is reachable before serving.
	pub async fn initialize(&self) -> Result<(), EngineError> {
		let orders = self
			.storage
			.list_ids(StorageKey::Orders.as_str())
			.await
			.map_err(|e| EngineError::Service(e.to_string()))?;
		tracing::info!(
			service_id = %self.config.service.id,
			orders = orders.len(),
			"Initializing fulfillment engine"
		);
		Ok(())
	}

	pub async fn shutdown(&self) -> Result<(), EngineError> {
		tracing::info!("Shutting down fulfillment engine");
		Ok(())
	}
}
