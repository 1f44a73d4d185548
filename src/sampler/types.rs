use core::sync::atomic::{AtomicBool, AtomicU16, Ordering};

/// Result of one finished conversion, as seen by the completion handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Conversion {
    pub raw_level: u16,
    pub status_bit: bool,
}

impl Conversion {
    /// The converter produces right-adjusted 10-bit results.
    pub const RESOLUTION_MASK: u16 = 0x03FF;

    /// Builds a conversion from the raw data registers and the port holding
    /// the status pin (bit 0).
    pub fn from_registers(data_low: u8, data_high: u8, port: u8) -> Self {
        let high = (u16::from(data_high) << 8) & 0x0300;
        Conversion {
            raw_level: high | u16::from(data_low),
            status_bit: port & 1 != 0,
        }
    }
}

/// Latest raw battery level and status pin.
///
/// Each field is atomic on its own. A reader may see a level and a status bit
/// coming from two different conversions, never a torn value.
pub struct SampledReading {
    raw_level: AtomicU16,
    status_bit: AtomicBool,
}

impl SampledReading {
    pub const fn new() -> Self {
        SampledReading {
            raw_level: AtomicU16::new(0),
            status_bit: AtomicBool::new(false),
        }
    }

    /// Completion handler. Runs in interrupt context once per conversion and is
    /// the only writer of both fields.
    pub fn record(&self, conversion: Conversion) {
        self.raw_level.store(conversion.raw_level, Ordering::Relaxed);
        self.status_bit.store(conversion.status_bit, Ordering::Relaxed);
    }

    pub fn raw_level(&self) -> u16 {
        self.raw_level.load(Ordering::Relaxed)
    }

    pub fn status_bit(&self) -> bool {
        self.status_bit.load(Ordering::Relaxed)
    }
}

impl Default for SampledReading {
    fn default() -> Self {
        Self::new()
    }
}
