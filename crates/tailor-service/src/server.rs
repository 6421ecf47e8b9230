//! HTTP server for the fulfillment API.
//!
//! Routes are nested under `/api`. Handlers here only extract the request
//! and delegate to the functions in [`crate::apis`].

use crate::apis::{maintenance, order};
use axum::{
	extract::{DefaultBodyLimit, Path, Query, State},
	http::{HeaderValue, StatusCode},
	response::Json,
	routing::{get, post, put},
	Router,
};
use std::sync::Arc;
use std::time::Duration;
use tailor_config::{ApiConfig, CorsConfig};
use tailor_core::FulfillmentEngine;
use tailor_types::{
	APIError, ActorQuery, AssignmentRequest, CompletionDateRequest, CreateOrderRequest,
	HistoryResponse, MenuAction, OrderQuery, OrderResponse, PaymentRequest, PickupSweepRequest,
	PickupSweepResponse, RecordMeasurementRequest, TransitionStatusRequest,
	TransitionStatusResponse,
};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
	cors::{Any, CorsLayer},
	timeout::TimeoutLayer,
	trace::TraceLayer,
};

/// Shared application state for the API server.
#[derive(Clone)]
pub struct AppState {
	pub engine: Arc<FulfillmentEngine>,
}

/// Builds the API router with its middleware stack.
pub fn router(api_config: &ApiConfig, engine: Arc<FulfillmentEngine>) -> Router {
	let orders = Router::new()
		.route("/orders", post(handle_create_order))
		.route("/orders/by-number/{order_number}", get(handle_get_order_by_number))
		.route("/orders/{id}", get(handle_get_order).delete(handle_delete_order))
		.route("/orders/{id}/transitions", post(handle_transition))
		.route("/orders/{id}/payment", post(handle_payment))
		.route("/orders/{id}/actions", get(handle_actions))
		.route("/orders/{id}/history", get(handle_history))
		.route(
			"/orders/{id}/recipients/{recipient_id}/measurement",
			put(handle_record_measurement),
		)
		.route(
			"/orders/{id}/stitching-completion-date",
			put(handle_completion_date),
		)
		.route("/orders/{id}/assignment", put(handle_assignment))
		.route("/maintenance/pickup-sweep", post(handle_pickup_sweep));

	Router::new()
		.nest("/api", orders)
		.layer(
			ServiceBuilder::new()
				.layer(TraceLayer::new_for_http())
				.layer(cors_layer(api_config.cors.as_ref()))
				.layer(TimeoutLayer::new(Duration::from_secs(
					api_config.timeout_seconds,
				)))
				.layer(DefaultBodyLimit::max(api_config.max_request_size)),
		)
		.with_state(AppState { engine })
}

fn cors_layer(cors: Option<&CorsConfig>) -> CorsLayer {
	match cors {
		Some(cors) => {
			let origins: Vec<HeaderValue> = cors
				.allowed_origins
				.iter()
				.filter_map(|origin| match origin.parse() {
					Ok(value) => Some(value),
					Err(_) => {
						tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
						None
					},
				})
				.collect();
			CorsLayer::new()
				.allow_origin(origins)
				.allow_methods(Any)
				.allow_headers(Any)
		},
		None => CorsLayer::permissive(),
	}
}

/// Starts the HTTP server and serves until the listener fails.
pub async fn start_server(
	api_config: ApiConfig,
	engine: Arc<FulfillmentEngine>,
) -> Result<(), Box<dyn std::error::Error>> {
	let app = router(&api_config, engine);

	let bind_address = format!("{}:{}", api_config.host, api_config.port);
	let listener = TcpListener::bind(&bind_address).await?;

	tracing::info!("Fulfillment API server starting on {}", bind_address);

	axum::serve(listener, app).await?;

	Ok(())
}

async fn handle_create_order(
	State(state): State<AppState>,
	Json(request): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>), APIError> {
	let response = order::create_order(&state.engine, request).await?;
	Ok((StatusCode::CREATED, Json(response)))
}

async fn handle_get_order(
	Path(id): Path<String>,
	Query(query): Query<OrderQuery>,
	State(state): State<AppState>,
) -> Result<Json<OrderResponse>, APIError> {
	Ok(Json(order::get_order(&state.engine, &id, query).await?))
}

async fn handle_get_order_by_number(
	Path(order_number): Path<String>,
	Query(query): Query<OrderQuery>,
	State(state): State<AppState>,
) -> Result<Json<OrderResponse>, APIError> {
	Ok(Json(
		order::get_order_by_number(&state.engine, &order_number, query).await?,
	))
}

async fn handle_delete_order(
	Path(id): Path<String>,
	Query(query): Query<ActorQuery>,
	State(state): State<AppState>,
) -> Result<StatusCode, APIError> {
	order::delete_order(&state.engine, &id, query).await?;
	Ok(StatusCode::NO_CONTENT)
}

async fn handle_transition(
	Path(id): Path<String>,
	State(state): State<AppState>,
	Json(request): Json<TransitionStatusRequest>,
) -> Result<Json<TransitionStatusResponse>, APIError> {
	match order::transition_status(&state.engine, &id, request).await {
		Ok(response) => Ok(Json(response)),
		Err(e) => {
			tracing::warn!("Transition request failed: {}", e);
			Err(e)
		},
	}
}

async fn handle_payment(
	Path(id): Path<String>,
	State(state): State<AppState>,
	Json(request): Json<PaymentRequest>,
) -> Result<Json<OrderResponse>, APIError> {
	Ok(Json(order::update_payment(&state.engine, &id, request).await?))
}

async fn handle_actions(
	Path(id): Path<String>,
	Query(query): Query<ActorQuery>,
	State(state): State<AppState>,
) -> Result<Json<Vec<MenuAction>>, APIError> {
	Ok(Json(order::list_actions(&state.engine, &id, query.role).await?))
}

async fn handle_history(
	Path(id): Path<String>,
	State(state): State<AppState>,
) -> Result<Json<HistoryResponse>, APIError> {
	Ok(Json(order::get_history(&state.engine, &id).await?))
}

async fn handle_record_measurement(
	Path((id, recipient_id)): Path<(String, String)>,
	State(state): State<AppState>,
	Json(request): Json<RecordMeasurementRequest>,
) -> Result<Json<OrderResponse>, APIError> {
	Ok(Json(
		order::record_measurement(&state.engine, &id, &recipient_id, request).await?,
	))
}

async fn handle_completion_date(
	Path(id): Path<String>,
	State(state): State<AppState>,
	Json(request): Json<CompletionDateRequest>,
) -> Result<Json<OrderResponse>, APIError> {
	Ok(Json(
		order::set_completion_date(&state.engine, &id, request).await?,
	))
}

async fn handle_assignment(
	Path(id): Path<String>,
	State(state): State<AppState>,
	Json(request): Json<AssignmentRequest>,
) -> Result<Json<OrderResponse>, APIError> {
	Ok(Json(order::assign(&state.engine, &id, request).await?))
}

async fn handle_pickup_sweep(
	State(state): State<AppState>,
	Json(request): Json<PickupSweepRequest>,
) -> Result<Json<PickupSweepResponse>, APIError> {
	Ok(Json(
		maintenance::run_pickup_sweep(&state.engine, request).await?,
	))
}
