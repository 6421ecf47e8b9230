//! Core order lifecycle engine for the garment fulfillment service.
//!
//! This crate holds the transition rules, the state machine that applies
//! them, the audit trail and the engine loop that reacts to committed
//! changes. Storage and notification channels are pluggable and supplied
//! through [`builder::EngineBuilder`].

pub mod builder;
pub mod engine;
pub mod handlers;
pub mod history;
pub mod state;
pub mod transitions;

#[cfg(test)]
mod testing;

pub use builder::{BuilderError, EngineBuilder, EngineFactories};
pub use engine::{event_bus::EventBus, EngineError, FulfillmentEngine};
pub use history::{HistoryError, HistoryLog, StorageHistoryLog};
pub use state::{
	NewOrder, OrderStateMachine, PaymentCommand, TransitionCommand, TransitionError,
	TransitionOutcome,
};
pub use transitions::{build_menu, Rejection, RejectionKind};
