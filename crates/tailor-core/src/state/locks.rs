//! Per-order mutual exclusion.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Registry of one async mutex per order id.
///
/// Holding the guard gives exclusive read-modify-write access to that
/// order's record. Different orders never contend.
#[derive(Default)]
pub struct OrderLocks {
	locks: DashMap<String, Arc<Mutex<()>>>,
}

impl OrderLocks {
	pub fn new() -> Self {
		Self::default()
	}

	/// Waits for and returns the lock on `order_id`.
	pub async fn acquire(&self, order_id: &str) -> OwnedMutexGuard<()> {
		// Clone the Arc out so the map shard is not held across the await.
		let lock = self
			.locks
			.entry(order_id.to_string())
			.or_insert_with(|| Arc::new(Mutex::new(())))
			.clone();
		lock.lock_owned().await
	}

	/// Forgets the lock of a deleted order.
	pub fn forget(&self, order_id: &str) {
		self.locks.remove(order_id);
	}

	pub fn len(&self) -> usize {
		self.locks.len()
	}

	pub fn is_empty(&self) -> bool {
		self.locks.is_empty()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::time::Duration;

	#[tokio::test]
	async fn test_same_order_is_serialized() {
		let locks = Arc::new(OrderLocks::new());
		let guard = locks.acquire("a").await;

		let contender = {
			let locks = locks.clone();
			tokio::spawn(async move {
				let _guard = locks.acquire("a").await;
			})
		};
		tokio::time::sleep(Duration::from_millis(20)).await;
		assert!(!contender.is_finished());

		drop(guard);
		contender.await.unwrap();
	}

	#[tokio::test]
	async fn test_different_orders_do_not_contend() {
		let locks = OrderLocks::new();
		let _a = locks.acquire("a").await;
		let _b = tokio::time::timeout(Duration::from_millis(100), locks.acquire("b"))
			.await
			.expect("lock on another order should be free");
		assert_eq!(locks.len(), 2);

		locks.forget("a");
		assert_eq!(locks.len(), 1);
	}
}
