//! Free-running battery sampler.
//!
//! The converter is configured once and then re-triggers itself after every
//! conversion. The completion handler only stores the result in a
//! [`SampledReading`]: no queues, no blocking, no filtering.

pub mod types;

#[cfg(test)]
pub mod simulated;

use crate::config_manager::types::SamplerConfig;

pub use types::{Conversion, SampledReading};

/// Battery ADC plus status pin, as the sampler needs them.
pub trait SamplerHardware {
    type Error;

    /// Registers the reading every completed conversion is recorded into.
    fn attach(&mut self, reading: &'static SampledReading);

    /// One-time setup: reference, conversion clock, input channel, free-running
    /// trigger and enable. Starts the first conversion.
    fn configure(&mut self, config: &SamplerConfig) -> Result<(), Self::Error>;
}
