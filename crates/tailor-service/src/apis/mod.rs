//! Request handling for the fulfillment HTTP API.

pub mod maintenance;
pub mod order;
