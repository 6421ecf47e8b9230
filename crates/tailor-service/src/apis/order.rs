//! Order endpoints of the fulfillment API.
//!
//! Each function backs one route in `server.rs`. They translate request
//! bodies into state machine calls and state machine errors into
//! [`APIError`]s; the rules themselves live in `tailor-core`.

use tailor_core::{
	build_menu, FulfillmentEngine, NewOrder, PaymentCommand, Rejection, TransitionCommand,
	TransitionError,
};
use tailor_types::{
	truncate_id, APIError, Actor, ActorQuery, ActorRole, AssignmentRequest, CompletionDateRequest,
	CreateOrderRequest, HistoryResponse, MenuAction, Order, OrderQuery, OrderResponse,
	PaymentRequest, RecordMeasurementRequest, TransitionStatusRequest, TransitionStatusResponse,
};

/// Maps a state machine error onto the HTTP error surface.
pub fn api_error(err: TransitionError) -> APIError {
	let message = err.to_string();
	match err {
		TransitionError::NotFound(_) => APIError::NotFound {
			error_type: "ORDER_NOT_FOUND".into(),
			message,
		},
		TransitionError::RecipientNotFound(_) => APIError::NotFound {
			error_type: "RECIPIENT_NOT_FOUND".into(),
			message,
		},
		TransitionError::Forbidden(_) => APIError::Forbidden {
			error_type: "FORBIDDEN".into(),
			message,
		},
		TransitionError::IllegalTransition(rejection) => APIError::UnprocessableEntity {
			error_type: "ILLEGAL_TRANSITION".into(),
			message,
			details: match rejection {
				Rejection::NotAllowed {
					role,
					dimension,
					from,
					to,
				} => Some(serde_json::json!({
					"role": role,
					"dimension": dimension,
					"from": from,
					"to": to,
				})),
				_ => None,
			},
		},
		TransitionError::TerminalOrder(rejection) => APIError::Conflict {
			error_type: "TERMINAL_ORDER".into(),
			message,
			details: match rejection {
				Rejection::TerminalOrder(status) => Some(serde_json::json!({ "status": status })),
				_ => None,
			},
		},
		TransitionError::PreconditionFailed(rejection) => APIError::PreconditionFailed {
			error_type: match rejection {
				Rejection::MeasurementsIncomplete => "MEASUREMENTS_INCOMPLETE",
				Rejection::CompletionDateMissing => "COMPLETION_DATE_MISSING",
				_ => "PRECONDITION_FAILED",
			}
			.into(),
			message,
		},
		TransitionError::Conflict { expected, actual } => APIError::Conflict {
			error_type: "VERSION_CONFLICT".into(),
			message,
			details: Some(serde_json::json!({
				"expected_version": expected,
				"current_version": actual,
			})),
		},
		TransitionError::InvalidRequest(_) => APIError::BadRequest {
			error_type: "INVALID_REQUEST".into(),
			message,
		},
		TransitionError::Storage(_) => APIError::InternalServerError {
			error_type: "INTERNAL_ERROR".into(),
			message,
		},
	}
}

fn actor(role: ActorRole, id: Option<String>) -> Actor {
	Actor { role, id }
}

/// Action menu for `role`, using the order's current measurement state.
fn menu(order: &Order, role: ActorRole) -> Vec<MenuAction> {
	build_menu(order, role, order.recipients_measured())
}

fn with_menu(order: Order, role: Option<ActorRole>) -> OrderResponse {
	let next_available_actions = role.map(|r| menu(&order, r)).unwrap_or_default();
	OrderResponse {
		order,
		next_available_actions,
	}
}

/// Places a new order. The response carries the customer's menu.
pub async fn create_order(
	engine: &FulfillmentEngine,
	request: CreateOrderRequest,
) -> Result<OrderResponse, APIError> {
	let order = engine
		.state_machine()
		.create_order(NewOrder {
			order_type: request.order_type,
			service_mode: request.service_mode,
			customer_id: request.customer_id,
			tailor_id: request.tailor_id,
			rider_id: request.rider_id,
			recipients: request
				.recipients
				.into_iter()
				.map(|r| (r.name, r.measurement_id))
				.collect(),
			stitching_completion_date: request.stitching_completion_date,
		})
		.await
		.map_err(api_error)?;
	Ok(with_menu(order, Some(ActorRole::Customer)))
}

pub async fn get_order(
	engine: &FulfillmentEngine,
	order_id: &str,
	query: OrderQuery,
) -> Result<OrderResponse, APIError> {
	let order = engine
		.state_machine()
		.get_order(order_id)
		.await
		.map_err(api_error)?;
	Ok(with_menu(order, query.role))
}

pub async fn get_order_by_number(
	engine: &FulfillmentEngine,
	order_number: &str,
	query: OrderQuery,
) -> Result<OrderResponse, APIError> {
	let order = engine
		.state_machine()
		.get_order_by_number(order_number)
		.await
		.map_err(api_error)?;
	Ok(with_menu(order, query.role))
}

pub async fn delete_order(
	engine: &FulfillmentEngine,
	order_id: &str,
	query: ActorQuery,
) -> Result<(), APIError> {
	engine
		.state_machine()
		.delete_order(order_id, &actor(query.role, query.actor_id))
		.await
		.map_err(api_error)
}

/// Applies one status change and returns the new state with the caller's
/// next actions.
pub async fn transition_status(
	engine: &FulfillmentEngine,
	order_id: &str,
	request: TransitionStatusRequest,
) -> Result<TransitionStatusResponse, APIError> {
	let role = request.actor_role;
	let mut command = TransitionCommand::new(request.desired, actor(role, request.actor_id));
	command.notes = request.notes;
	command.expected_version = request.expected_version;

	let outcome = engine
		.state_machine()
		.transition(order_id, command)
		.await
		.map_err(|e| {
			tracing::debug!(order_id = %truncate_id(order_id), error = %e, "Transition refused");
			api_error(e)
		})?;

	let order = outcome.order;
	Ok(TransitionStatusResponse {
		next_available_actions: menu(&order, role),
		order_id: order.id,
		order_number: order.order_number,
		status: order.status,
		rider_status: order.rider_status,
		tailor_status: order.tailor_status,
		updated_at: order.updated_at,
	})
}

pub async fn update_payment(
	engine: &FulfillmentEngine,
	order_id: &str,
	request: PaymentRequest,
) -> Result<OrderResponse, APIError> {
	let role = request.actor_role;
	let outcome = engine
		.state_machine()
		.transition_payment(
			order_id,
			PaymentCommand {
				payment_status: request.payment_status,
				actor: actor(role, request.actor_id),
				notes: request.notes,
			},
		)
		.await
		.map_err(api_error)?;
	Ok(with_menu(outcome.order, Some(role)))
}

pub async fn list_actions(
	engine: &FulfillmentEngine,
	order_id: &str,
	role: ActorRole,
) -> Result<Vec<MenuAction>, APIError> {
	let order = engine
		.state_machine()
		.get_order(order_id)
		.await
		.map_err(api_error)?;
	Ok(menu(&order, role))
}

pub async fn get_history(
	engine: &FulfillmentEngine,
	order_id: &str,
) -> Result<HistoryResponse, APIError> {
	let entries = engine
		.state_machine()
		.history(order_id)
		.await
		.map_err(api_error)?;
	Ok(HistoryResponse {
		order_id: order_id.to_string(),
		entries,
	})
}

pub async fn record_measurement(
	engine: &FulfillmentEngine,
	order_id: &str,
	recipient_id: &str,
	request: RecordMeasurementRequest,
) -> Result<OrderResponse, APIError> {
	let role = request.actor_role;
	let order = engine
		.state_machine()
		.record_measurement(
			order_id,
			recipient_id,
			&request.measurement_id,
			&actor(role, request.actor_id),
		)
		.await
		.map_err(api_error)?;
	Ok(with_menu(order, Some(role)))
}

pub async fn set_completion_date(
	engine: &FulfillmentEngine,
	order_id: &str,
	request: CompletionDateRequest,
) -> Result<OrderResponse, APIError> {
	let role = request.actor_role;
	let order = engine
		.state_machine()
		.set_stitching_completion_date(order_id, request.date, &actor(role, request.actor_id))
		.await
		.map_err(api_error)?;
	Ok(with_menu(order, Some(role)))
}

pub async fn assign(
	engine: &FulfillmentEngine,
	order_id: &str,
	request: AssignmentRequest,
) -> Result<OrderResponse, APIError> {
	let order = engine
		.state_machine()
		.assign(
			order_id,
			request.tailor_id,
			request.rider_id,
			&Actor::admin(request.actor_id),
		)
		.await
		.map_err(api_error)?;
	Ok(with_menu(order, Some(ActorRole::Admin)))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::build_engine;
	use tailor_config::builders::config::ConfigBuilder;
	use tailor_types::{
		DesiredTransition, OrderStatus, OrderType, PaymentStatus, RecipientInput, RiderStatus,
		ServiceMode, TailorStatus,
	};

	fn engine() -> FulfillmentEngine {
		build_engine(ConfigBuilder::new().build()).unwrap()
	}

	fn create_request(order_type: OrderType, service_mode: ServiceMode) -> CreateOrderRequest {
		CreateOrderRequest {
			order_type,
			service_mode,
			customer_id: "cust-1".into(),
			tailor_id: None,
			rider_id: None,
			recipients: vec![RecipientInput {
				name: "Amina".into(),
				measurement_id: None,
			}],
			stitching_completion_date: None,
		}
	}

	fn transition(
		desired: DesiredTransition,
		role: ActorRole,
		actor_id: &str,
	) -> TransitionStatusRequest {
		TransitionStatusRequest {
			desired,
			actor_role: role,
			actor_id: Some(actor_id.into()),
			notes: None,
			expected_version: None,
		}
	}

	#[tokio::test]
	async fn test_create_order_offers_customer_cancel() {
		let engine = engine();
		let response = create_order(&engine, create_request(OrderType::FabricOnly, ServiceMode::WalkIn))
			.await
			.unwrap();
		assert_eq!(response.order.status, OrderStatus::Pending);
		assert_eq!(response.next_available_actions.len(), 1);
		assert_eq!(response.next_available_actions[0].value, "cancelled");
	}

	#[tokio::test]
	async fn test_transition_response_carries_next_actions() {
		let engine = engine();
		let created = create_order(
			&engine,
			create_request(OrderType::FabricOnly, ServiceMode::HomeDelivery),
		)
		.await
		.unwrap();
		let id = created.order.id.clone();

		let response = transition_status(
			&engine,
			&id,
			transition(
				DesiredTransition::tailor(TailorStatus::Accepted),
				ActorRole::Tailor,
				"tailor-1",
			),
		)
		.await
		.unwrap();
		assert_eq!(response.status, OrderStatus::Confirmed);
		assert_eq!(response.order_number, created.order.order_number);
		assert!(response.next_available_actions.is_empty());

		let rider_menu = list_actions(&engine, &id, ActorRole::Rider).await.unwrap();
		assert_eq!(rider_menu.len(), 1);
		assert_eq!(rider_menu[0].value, RiderStatus::Accepted.as_str());
	}

	#[tokio::test]
	async fn test_errors_map_to_status_codes() {
		let engine = engine();
		let missing = get_order(&engine, "no-such-order", OrderQuery::default())
			.await
			.unwrap_err();
		assert_eq!(missing.status_code(), 404);

		let order = create_order(
			&engine,
			create_request(OrderType::FabricWithStitching, ServiceMode::WalkIn),
		)
		.await
		.unwrap()
		.order;

		let stranger = transition_status(
			&engine,
			&order.id,
			transition(
				DesiredTransition::status(OrderStatus::Cancelled),
				ActorRole::Customer,
				"cust-2",
			),
		)
		.await
		.unwrap_err();
		assert_eq!(stranger.status_code(), 403);

		let accept = transition(
			DesiredTransition::tailor(TailorStatus::Accepted),
			ActorRole::Tailor,
			"tailor-1",
		);
		transition_status(&engine, &order.id, accept).await.unwrap();

		let skipped = transition_status(
			&engine,
			&order.id,
			transition(
				DesiredTransition::tailor(TailorStatus::Stitched),
				ActorRole::Tailor,
				"tailor-1",
			),
		)
		.await
		.unwrap_err();
		assert_eq!(skipped.status_code(), 422);

		transition_status(
			&engine,
			&order.id,
			transition(
				DesiredTransition::tailor(TailorStatus::InProgress),
				ActorRole::Tailor,
				"tailor-1",
			),
		)
		.await
		.unwrap();
		let unmeasured = transition_status(
			&engine,
			&order.id,
			transition(
				DesiredTransition::tailor(TailorStatus::StitchingStarted),
				ActorRole::Tailor,
				"tailor-1",
			),
		)
		.await
		.unwrap_err();
		assert_eq!(unmeasured.status_code(), 412);
		assert_eq!(unmeasured.to_error_response().error, "MEASUREMENTS_INCOMPLETE");

		let mut stale = transition(
			DesiredTransition::tailor(TailorStatus::StitchingStarted),
			ActorRole::Tailor,
			"tailor-1",
		);
		stale.expected_version = Some(1);
		let conflict = transition_status(&engine, &order.id, stale).await.unwrap_err();
		assert_eq!(conflict.status_code(), 409);
		assert_eq!(conflict.to_error_response().error, "VERSION_CONFLICT");
	}

	#[tokio::test]
	async fn test_terminal_order_is_a_conflict() {
		let engine = engine();
		let order = create_order(&engine, create_request(OrderType::FabricOnly, ServiceMode::WalkIn))
			.await
			.unwrap()
			.order;
		transition_status(
			&engine,
			&order.id,
			transition(
				DesiredTransition::status(OrderStatus::Cancelled),
				ActorRole::Customer,
				"cust-1",
			),
		)
		.await
		.unwrap();

		let err = update_payment(
			&engine,
			&order.id,
			PaymentRequest {
				payment_status: PaymentStatus::Paid,
				actor_role: ActorRole::Customer,
				actor_id: Some("cust-1".into()),
				notes: None,
			},
		)
		.await
		.unwrap_err();
		assert_eq!(err.status_code(), 409);
		assert_eq!(err.to_error_response().error, "TERMINAL_ORDER");
	}

	#[tokio::test]
	async fn test_measurement_then_history() {
		let engine = engine();
		let order = create_order(
			&engine,
			create_request(OrderType::MeasurementService, ServiceMode::WalkIn),
		)
		.await
		.unwrap()
		.order;
		let recipient_id = order.recipients[0].id.clone();

		let updated = record_measurement(
			&engine,
			&order.id,
			&recipient_id,
			RecordMeasurementRequest {
				measurement_id: "msr-1".into(),
				actor_id: Some("cust-1".into()),
				actor_role: ActorRole::Customer,
			},
		)
		.await
		.unwrap();
		assert!(updated.order.recipients_measured());

		transition_status(
			&engine,
			&order.id,
			transition(
				DesiredTransition::tailor(TailorStatus::Accepted),
				ActorRole::Tailor,
				"tailor-1",
			),
		)
		.await
		.unwrap();

		let history = get_history(&engine, &order.id).await.unwrap();
		assert_eq!(history.entries.len(), 1);
		assert_eq!(history.entries[0].status, OrderStatus::Confirmed);
	}
}
