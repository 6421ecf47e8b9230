//! Audit trail of committed order changes.
//!
//! One entry is appended per committed transition. Appends happen while the
//! order lock is held, so entries for one order are written in commit order.
//! The trail is best-effort: a failed append is logged by the caller and
//! the transition stands.

use async_trait::async_trait;
use std::sync::Arc;
use tailor_storage::{StorageError, StorageService};
use tailor_types::{current_timestamp, Actor, HistoryEntry, Order, OrderStatus, StatusDimension, StorageKey};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HistoryError {
	#[error("Storage error: {0}")]
	Storage(#[from] StorageError),
}

/// Append-only store of history entries.
#[async_trait]
pub trait HistoryLog: Send + Sync {
	async fn append(&self, entry: HistoryEntry) -> Result<(), HistoryError>;

	/// Entries for one order, oldest first.
	async fn entries(&self, order_id: &str) -> Result<Vec<HistoryEntry>, HistoryError>;

	/// Drops the trail of a deleted order.
	async fn clear(&self, order_id: &str) -> Result<(), HistoryError>;
}

/// Keeps each order's entries as one list under the `history` namespace.
pub struct StorageHistoryLog {
	storage: Arc<StorageService>,
}

impl StorageHistoryLog {
	pub fn new(storage: Arc<StorageService>) -> Self {
		Self { storage }
	}
}

#[async_trait]
impl HistoryLog for StorageHistoryLog {
	async fn append(&self, entry: HistoryEntry) -> Result<(), HistoryError> {
		let namespace = StorageKey::History.as_str();
		let mut entries: Vec<HistoryEntry> = self
			.storage
			.try_retrieve(namespace, &entry.order_id)
			.await?
			.unwrap_or_default();
		let order_id = entry.order_id.clone();
		entries.push(entry);
		self.storage.store(namespace, &order_id, &entries).await?;
		Ok(())
	}

	async fn entries(&self, order_id: &str) -> Result<Vec<HistoryEntry>, HistoryError> {
		Ok(self
			.storage
			.try_retrieve(StorageKey::History.as_str(), order_id)
			.await?
			.unwrap_or_default())
	}

	async fn clear(&self, order_id: &str) -> Result<(), HistoryError> {
		self.storage
			.remove(StorageKey::History.as_str(), order_id)
			.await?;
		Ok(())
	}
}

/// Builds the entry recording `order`'s state right after a change to
/// `dimension`.
pub fn entry_for(
	order: &Order,
	previous_status: OrderStatus,
	dimension: StatusDimension,
	value: &str,
	actor: &Actor,
	notes: Option<&str>,
) -> HistoryEntry {
	HistoryEntry {
		id: uuid::Uuid::new_v4().to_string(),
		order_id: order.id.clone(),
		status: order.status,
		previous_status,
		rider_status: order.rider_status,
		tailor_status: order.tailor_status,
		dimension,
		value: value.to_string(),
		changed_by: actor.id.clone(),
		actor_role: actor.role,
		notes: notes.unwrap_or_default().to_string(),
		created_at: current_timestamp(),
	}
}
