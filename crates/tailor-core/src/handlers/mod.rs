//! Event handlers run by the engine loop.
//!
//! The notification handler reacts to committed order changes. The pickup
//! sweeper is a housekeeping job the engine runs on an interval.

pub mod notification;
pub mod sweep;

pub use notification::{notification_for, NotificationHandler};
pub use sweep::PickupSweeper;
