//! Audit trail entries for order transitions.

use crate::{ActorRole, OrderStatus, RiderStatus, StatusDimension, TailorStatus};
use serde::{Deserialize, Serialize};

/// One applied transition. Entries are appended and never edited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
	/// Unique identifier for this entry.
	pub id: String,
	pub order_id: String,
	/// Aggregate status after the change.
	pub status: OrderStatus,
	/// Aggregate status before the change.
	pub previous_status: OrderStatus,
	/// Sub-status snapshot after the change, for customer timelines.
	pub rider_status: RiderStatus,
	pub tailor_status: TailorStatus,
	/// The dimension that drove the change and the value it moved to.
	pub dimension: StatusDimension,
	pub value: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub changed_by: Option<String>,
	pub actor_role: ActorRole,
	#[serde(default)]
	pub notes: String,
	pub created_at: u64,
}
