//! Outbound fan-out to connected observers.
//!
//! - [`message::OutboundMessage`]: typed wire messages
//! - [`hub::Broadcaster`]: client registry, subscription routing and
//!   forwarding tasks

pub mod hub;
pub mod message;

pub use hub::{BroadcastHandle, BroadcastSettings, Broadcaster};
pub use message::OutboundMessage;
