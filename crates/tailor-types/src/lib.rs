//! Common types module for the garment fulfillment engine.
//!
//! This module defines the core data types shared by every crate in the
//! workspace: the status vocabulary, the order record, audit entries, events
//! and the HTTP request/response shapes. It carries no business rules.

/// API types for HTTP endpoints and request/response structures.
pub mod api;
/// Event types published after committed changes.
pub mod events;
/// Audit trail entries.
pub mod history;
/// Order record and status vocabulary.
pub mod order;
/// Registry trait for configuration-named implementations.
pub mod registry;
/// Storage types for managing persistent data.
pub mod storage;
/// Transition request and menu projection types.
pub mod transition;
/// Utility functions for formatting and timestamps.
pub mod utils;
/// Configuration validation types for pluggable implementations.
pub mod validation;

// Re-export all types for convenient access
pub use api::*;
pub use events::*;
pub use history::*;
pub use order::*;
pub use registry::ImplementationRegistry;
pub use storage::*;
pub use transition::*;
pub use utils::{current_timestamp, days_to_seconds, truncate_id};
pub use validation::*;
