//! API types for the fulfillment HTTP API.
//!
//! This module defines the request and response bodies for the order
//! endpoints and the structured error type they return.

use crate::{
	ActorRole, DesiredTransition, HistoryEntry, MenuAction, Order, OrderStatus, OrderType,
	PaymentStatus, RiderStatus, ServiceMode, TailorStatus,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Recipient line item supplied when placing an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipientInput {
	pub name: String,
	/// Reference to measurements already on file, if any.
	#[serde(default)]
	pub measurement_id: Option<String>,
}

/// Request for placing a new order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderRequest {
	pub order_type: OrderType,
	pub service_mode: ServiceMode,
	pub customer_id: String,
	#[serde(default)]
	pub tailor_id: Option<String>,
	#[serde(default)]
	pub rider_id: Option<String>,
	#[serde(default)]
	pub recipients: Vec<RecipientInput>,
	#[serde(default)]
	pub stitching_completion_date: Option<NaiveDate>,
}

/// Request body of the status transition endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionStatusRequest {
	#[serde(flatten)]
	pub desired: DesiredTransition,
	pub actor_role: ActorRole,
	#[serde(default)]
	pub actor_id: Option<String>,
	#[serde(default)]
	pub notes: Option<String>,
	/// Optimistic concurrency guard; rejects the call if the order moved on.
	#[serde(default)]
	pub expected_version: Option<u64>,
}

/// Response of the status transition endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionStatusResponse {
	pub order_id: String,
	pub order_number: String,
	pub status: OrderStatus,
	pub rider_status: RiderStatus,
	pub tailor_status: TailorStatus,
	pub next_available_actions: Vec<MenuAction>,
	pub updated_at: u64,
}

/// Request body of the payment endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRequest {
	pub payment_status: PaymentStatus,
	pub actor_role: ActorRole,
	#[serde(default)]
	pub actor_id: Option<String>,
	#[serde(default)]
	pub notes: Option<String>,
}

/// Query parameters identifying the caller on read and delete endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorQuery {
	pub role: ActorRole,
	#[serde(default)]
	pub actor_id: Option<String>,
}

/// Optional role used to project the action menu on `GET /orders/{id}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderQuery {
	#[serde(default)]
	pub role: Option<ActorRole>,
}

/// Order representation returned by the read endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderResponse {
	#[serde(flatten)]
	pub order: Order,
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub next_available_actions: Vec<MenuAction>,
}

/// Request for attaching measurements to a recipient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordMeasurementRequest {
	pub measurement_id: String,
	#[serde(default)]
	pub actor_id: Option<String>,
	pub actor_role: ActorRole,
}

/// Request for setting the promised stitching completion date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionDateRequest {
	pub date: NaiveDate,
	pub actor_role: ActorRole,
	#[serde(default)]
	pub actor_id: Option<String>,
}

/// Admin request for assigning a tailor and/or rider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentRequest {
	#[serde(default)]
	pub tailor_id: Option<String>,
	#[serde(default)]
	pub rider_id: Option<String>,
	pub actor_id: String,
}

/// Customer-facing timeline of an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryResponse {
	pub order_id: String,
	pub entries: Vec<HistoryEntry>,
}

/// Request for running the stale pickup sweep on demand.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PickupSweepRequest {
	/// Overrides the configured threshold for this run.
	#[serde(default)]
	pub threshold_days: Option<u32>,
}

/// Result of a stale pickup sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PickupSweepResponse {
	pub collected: usize,
}

/// API error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
	/// Error type/code
	pub error: String,
	/// Human-readable description
	pub message: String,
	/// Additional error context
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub details: Option<serde_json::Value>,
}

/// Structured API error type with appropriate HTTP status mapping.
#[derive(Debug)]
pub enum APIError {
	/// Malformed request (400)
	BadRequest { error_type: String, message: String },
	/// Caller may not act on this order (403)
	Forbidden { error_type: String, message: String },
	/// Order does not exist (404)
	NotFound { error_type: String, message: String },
	/// Order moved on or is already closed (409)
	Conflict {
		error_type: String,
		message: String,
		details: Option<serde_json::Value>,
	},
	/// A domain precondition is unmet (412)
	PreconditionFailed { error_type: String, message: String },
	/// Requested transition is not legal in the current state (422)
	UnprocessableEntity {
		error_type: String,
		message: String,
		details: Option<serde_json::Value>,
	},
	/// Internal server error (500)
	InternalServerError { error_type: String, message: String },
}

impl APIError {
	/// Get the HTTP status code for this error.
	pub fn status_code(&self) -> u16 {
		match self {
			APIError::BadRequest { .. } => 400,
			APIError::Forbidden { .. } => 403,
			APIError::NotFound { .. } => 404,
			APIError::Conflict { .. } => 409,
			APIError::PreconditionFailed { .. } => 412,
			APIError::UnprocessableEntity { .. } => 422,
			APIError::InternalServerError { .. } => 500,
		}
	}

	/// Convert to ErrorResponse for JSON serialization.
	pub fn to_error_response(&self) -> ErrorResponse {
		let (error_type, message, details) = match self {
			APIError::BadRequest {
				error_type,
				message,
			}
			| APIError::Forbidden {
				error_type,
				message,
			}
			| APIError::NotFound {
				error_type,
				message,
			}
			| APIError::PreconditionFailed {
				error_type,
				message,
			}
			| APIError::InternalServerError {
				error_type,
				message,
			} => (error_type, message, None),
			APIError::Conflict {
				error_type,
				message,
				details,
			}
			| APIError::UnprocessableEntity {
				error_type,
				message,
				details,
			} => (error_type, message, details.clone()),
		};
		ErrorResponse {
			error: error_type.clone(),
			message: message.clone(),
			details,
		}
	}
}

impl fmt::Display for APIError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let response = self.to_error_response();
		write!(f, "{} ({}): {}", response.error, self.status_code(), response.message)
	}
}

impl std::error::Error for APIError {}

impl axum::response::IntoResponse for APIError {
	fn into_response(self) -> axum::response::Response {
		use axum::{http::StatusCode, response::Json};

		let status =
			StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
		(status, Json(self.to_error_response())).into_response()
	}
}
