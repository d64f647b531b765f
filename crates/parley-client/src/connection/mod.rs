//! Connection state machine with auto-reconnect.
//!
//! Owns the transport through a background IO task and at most one pending
//! reconnect timer. Every transition cancels prior resources before
//! acquiring new ones, and every event is stamped with a generation so a
//! superseded connection can never act on the current one.

mod machine;
mod types;

pub use machine::Connection;
pub use types::{ConnectionState, LinkEvent};

pub(crate) use types::ConnectionEvent;
