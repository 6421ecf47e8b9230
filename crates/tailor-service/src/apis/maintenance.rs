//! Housekeeping endpoints.

use tailor_core::FulfillmentEngine;
use tailor_types::{APIError, PickupSweepRequest, PickupSweepResponse};

use super::order::api_error;

/// Runs the stale pickup sweep now. Uses the configured threshold unless
/// the request overrides it.
pub async fn run_pickup_sweep(
	engine: &FulfillmentEngine,
	request: PickupSweepRequest,
) -> Result<PickupSweepResponse, APIError> {
	let threshold_days = request
		.threshold_days
		.unwrap_or(engine.config().lifecycle.pickup_auto_collect_days);
	if threshold_days == 0 {
		return Err(APIError::BadRequest {
			error_type: "INVALID_THRESHOLD".into(),
			message: "threshold_days must be at least 1".into(),
		});
	}

	let collected = engine
		.sweeper()
		.auto_advance_stale_pickups(threshold_days)
		.await
		.map_err(api_error)?;
	Ok(PickupSweepResponse { collected })
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::build_engine;
	use tailor_config::builders::config::ConfigBuilder;

	#[tokio::test]
	async fn test_zero_threshold_is_rejected() {
		let engine = build_engine(ConfigBuilder::new().build()).unwrap();
		let err = run_pickup_sweep(
			&engine,
			PickupSweepRequest {
				threshold_days: Some(0),
			},
		)
		.await
		.unwrap_err();
		assert_eq!(err.status_code(), 400);
	}

	#[tokio::test]
	async fn test_sweep_on_empty_store_collects_nothing() {
		let engine = build_engine(ConfigBuilder::new().build()).unwrap();
		let response = run_pickup_sweep(&engine, PickupSweepRequest::default())
			.await
			.unwrap();
		assert_eq!(response.collected, 0);
	}
}
