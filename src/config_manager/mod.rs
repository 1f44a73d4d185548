//! Plain-data configuration for the sampler and the monitor task.
//!
//! Everything here has hardwired defaults measured on the device; `verify()`
//! is run by the initializer before any hardware is touched.

pub mod types;

pub use types::{Calibration, ConfigError, MonitorConfig, Reference, SamplerConfig};
