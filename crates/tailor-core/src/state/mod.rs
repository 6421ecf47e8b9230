//! Order state management.
//!
//! [`OrderStateMachine`] is the only writer of order records. Each call
//! holds the order's lock from [`OrderLocks`] for its whole
//! read-modify-write.

pub mod locks;
pub mod order;

pub use locks::OrderLocks;
pub use order::{
	NewOrder, OrderStateMachine, PaymentCommand, TransitionCommand, TransitionError,
	TransitionOutcome,
};
