#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![forbid(unsafe_code)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

pub mod cache;
pub mod config;
pub mod entities;
pub mod events;
pub mod framework;
pub mod ledger;
pub mod market;
pub mod processors;
pub mod telemetry;
pub mod utils;
