#![cfg_attr(not(test), no_std)]

//! Battery monitor for a small battery-powered device.
//!
//! A free-running ADC sampler keeps the latest raw battery level and charge
//! status pin in two atomics. A periodic monitor task drains its control queue,
//! turns the raw level into a percentage and reports both values to a
//! downstream consumer through a bounded status queue.

#[macro_use]
mod fmt;

pub mod config_manager;
pub mod error;
pub mod sampler;
pub mod state_machines;
pub mod tasks;
pub mod telemetry;
pub mod types;

pub use error::Error;
