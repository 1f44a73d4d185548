use embassy_time::Duration;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    InvalidPrescaler,
    ClockOutOfRange,
    InvalidChannel,
    InvalidCalibration,
    InvalidPeriod,
    InvalidPriority,
}

/// ADC voltage reference.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Reference {
    /// Internal bandgap reference (1.1 V on the reference board).
    Internal,
    /// Supply voltage.
    Vdd,
}

/// One-time setup of the free-running battery ADC.
///
/// The converter always runs in free-running mode: every completed conversion
/// immediately starts the next one.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SamplerConfig {
    pub reference: Reference,
    /// Core clock feeding the ADC prescaler.
    #[serde(with = "postcard::fixint::le")]
    pub cpu_hz: u32,
    /// Divider between the core clock and the conversion clock.
    pub prescaler: u8,
    /// Single-ended input channel.
    pub channel: u8,
}

/// Two-point linear map between raw ADC counts and a percentage.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Calibration {
    /// Raw reading of an empty battery.
    pub raw_min: u16,
    /// Raw reading of a full battery.
    pub raw_max: u16,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MonitorConfig {
    #[serde(with = "postcard::fixint::le")]
    pub period_ms: u32,
    pub calibration: Calibration,
}

//
// Implementations
//

impl Default for SamplerConfig {
    /// 1.1 V reference, ADC3 single ended, 12 MHz / 64 = 187.5 kHz conversion clock.
    fn default() -> Self {
        Self {
            reference: Reference::Internal,
            cpu_hz: 12_000_000,
            prescaler: 64,
            channel: 3,
        }
    }
}

impl SamplerConfig {
    /// Full resolution needs a conversion clock inside this window.
    pub const MIN_ADC_CLOCK_HZ: u32 = 50_000;
    pub const MAX_ADC_CLOCK_HZ: u32 = 200_000;
    pub const MAX_CHANNEL: u8 = 7;

    pub fn adc_clock_hz(&self) -> u32 {
        self.cpu_hz / u32::from(self.prescaler.max(1))
    }

    pub fn verify(self) -> Result<Self, ConfigError> {
        if !(2..=128).contains(&self.prescaler) || !self.prescaler.is_power_of_two() {
            return Err(ConfigError::InvalidPrescaler);
        }

        if !(Self::MIN_ADC_CLOCK_HZ..=Self::MAX_ADC_CLOCK_HZ).contains(&self.adc_clock_hz()) {
            return Err(ConfigError::ClockOutOfRange);
        }

        if self.channel > Self::MAX_CHANNEL {
            return Err(ConfigError::InvalidChannel);
        }

        Ok(self)
    }
}

impl Default for Calibration {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl Calibration {
    // Measured by hand on the device.
    pub const DEFAULT: Self = Self {
        raw_min: 545,
        raw_max: 700,
    };

    /// Converts a raw reading into a percentage of the calibrated range.
    ///
    /// Readings outside `raw_min..=raw_max` are not clamped and map below 0 or
    /// above 100.
    pub fn percent(&self, raw: u16) -> f32 {
        let span = f32::from(self.raw_max) - f32::from(self.raw_min);
        (f32::from(raw) - f32::from(self.raw_min)) / (span / 100.0)
    }

    pub fn verify(self) -> Result<Self, ConfigError> {
        if self.raw_max <= self.raw_min {
            return Err(ConfigError::InvalidCalibration);
        }

        Ok(self)
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl MonitorConfig {
    pub const DEFAULT: Self = Self {
        period_ms: 100,
        calibration: Calibration::DEFAULT,
    };

    pub fn period(&self) -> Duration {
        Duration::from_millis(u64::from(self.period_ms))
    }

    pub fn verify(self) -> Result<Self, ConfigError> {
        if self.period_ms == 0 {
            return Err(ConfigError::InvalidPeriod);
        }
        self.calibration.verify()?;

        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_sampler_clock_is_inside_window() {
        let config = SamplerConfig::default();
        assert_eq!(config.adc_clock_hz(), 187_500);
        assert_eq!(config.verify(), Ok(config));
    }

    #[test]
    fn sampler_rejects_bad_prescalers() {
        for prescaler in [0, 1, 3, 48, 255] {
            let config = SamplerConfig {
                prescaler,
                ..Default::default()
            };
            assert_eq!(config.verify(), Err(ConfigError::InvalidPrescaler));
        }
    }

    #[test]
    fn sampler_rejects_clock_outside_window() {
        // 12 MHz / 32 = 375 kHz, too fast for full resolution.
        let fast = SamplerConfig {
            prescaler: 32,
            ..Default::default()
        };
        assert_eq!(fast.verify(), Err(ConfigError::ClockOutOfRange));

        // 1 MHz / 128 = 7.8 kHz, too slow.
        let slow = SamplerConfig {
            cpu_hz: 1_000_000,
            prescaler: 128,
            ..Default::default()
        };
        assert_eq!(slow.verify(), Err(ConfigError::ClockOutOfRange));
    }

    #[test]
    fn sampler_rejects_unknown_channel() {
        let config = SamplerConfig {
            channel: 8,
            ..Default::default()
        };
        assert_eq!(config.verify(), Err(ConfigError::InvalidChannel));
    }

    #[test]
    fn percent_follows_two_point_map() {
        let calibration = Calibration::default();

        assert_eq!(calibration.percent(545), 0.0);
        assert!((calibration.percent(700) - 100.0).abs() < 1e-3);
        assert!((calibration.percent(622) - 49.68).abs() < 0.01);
    }

    #[test]
    fn percent_is_not_clamped() {
        let calibration = Calibration::default();

        assert!(calibration.percent(0) < -350.0);
        assert!(calibration.percent(1023) > 300.0);
    }

    #[test]
    fn calibration_needs_increasing_bounds() {
        let flat = Calibration {
            raw_min: 600,
            raw_max: 600,
        };
        assert_eq!(flat.verify(), Err(ConfigError::InvalidCalibration));
    }

    #[test]
    fn monitor_config_checks_period_and_calibration() {
        assert_eq!(MonitorConfig::default().period(), Duration::from_millis(100));

        let stopped = MonitorConfig {
            period_ms: 0,
            ..Default::default()
        };
        assert_eq!(stopped.verify(), Err(ConfigError::InvalidPeriod));

        let inverted = MonitorConfig {
            calibration: Calibration {
                raw_min: 700,
                raw_max: 545,
            },
            ..Default::default()
        };
        assert_eq!(inverted.verify(), Err(ConfigError::InvalidCalibration));
    }
}
