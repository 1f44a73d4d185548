//! Host-side stand-in for the battery ADC.

use super::{Conversion, SampledReading, SamplerHardware};
use crate::config_manager::types::SamplerConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rejected;

/// Simulated converter. Tests fire completion events by hand.
#[derive(Default)]
pub struct SimulatedAdc {
    config: Option<SamplerConfig>,
    reading: Option<&'static SampledReading>,
    reject: bool,
    completions: usize,
}

impl SimulatedAdc {
    pub fn new() -> Self {
        Self::default()
    }

    /// A converter whose configuration step always fails.
    pub fn rejecting() -> Self {
        Self {
            reject: true,
            ..Self::default()
        }
    }

    pub fn config(&self) -> Option<SamplerConfig> {
        self.config
    }

    pub fn is_attached(&self) -> bool {
        self.reading.is_some()
    }

    pub fn completions(&self) -> usize {
        self.completions
    }

    /// Fires the completion event. Returns `false` while the converter is not
    /// running or nothing is attached.
    pub fn complete(&mut self, conversion: Conversion) -> bool {
        match (self.config, self.reading) {
            (Some(_), Some(reading)) => {
                reading.record(conversion);
                self.completions += 1;
                true
            }
            _ => false,
        }
    }

    pub fn complete_registers(&mut self, data_low: u8, data_high: u8, port: u8) -> bool {
        self.complete(Conversion::from_registers(data_low, data_high, port))
    }
}

impl SamplerHardware for SimulatedAdc {
    type Error = Rejected;

    fn attach(&mut self, reading: &'static SampledReading) {
        self.reading = Some(reading);
    }

    fn configure(&mut self, config: &SamplerConfig) -> Result<(), Self::Error> {
        if self.reject {
            return Err(Rejected);
        }
        self.config = Some(*config);
        Ok(())
    }
}
