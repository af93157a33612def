//! Shared wire types for the Raceline race-state service.
//!
//! The `objects` module is always available. The typed HTTP and WebSocket
//! clients live behind the `client` feature so the server and the core crate
//! do not pull in `reqwest` through this crate.

pub mod objects;

#[cfg(feature = "client")]
pub mod client;
