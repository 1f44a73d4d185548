use batmon::config_manager::types::{Reference, SamplerConfig};
use batmon::sampler::{Conversion, SampledReading, SamplerHardware};
use defmt::{debug, error, info, Format};
use embassy_nrf::gpio::{AnyPin, Input, Pull};
use embassy_nrf::peripherals::{P0_05, SAADC};
use embassy_nrf::saadc::{self, Saadc};

use crate::Irqs;

/// nRF52832 input wired to the battery divider: AIN3 on P0.05.
pub const BATTERY_CHANNEL: u8 = 3;

#[derive(Format, Debug, Clone, Copy)]
pub enum SamplerError {
    AlreadyConfigured,
    ChannelUnavailable,
}

/// SAADC plus charger status pin.
///
/// The SAADC has no free-running mode, so [`NrfSampler::run`] starts the next
/// conversion as soon as the previous one completes.
pub struct NrfSampler {
    parts: Option<(SAADC, P0_05)>,
    adc: Option<Saadc<'static, 1>>,
    status_pin: Input<'static>,
    reading: Option<&'static SampledReading>,
}

impl NrfSampler {
    pub fn new(saadc: SAADC, ain3: P0_05, status_pin: AnyPin) -> Self {
        Self {
            parts: Some((saadc, ain3)),
            adc: None,
            status_pin: Input::new(status_pin, Pull::None),
            reading: None,
        }
    }

    /// Back-to-back conversions, each recorded into the attached reading.
    pub async fn run(&mut self) -> ! {
        let (Some(adc), Some(reading)) = (self.adc.as_mut(), self.reading) else {
            error!("Sampler started before configuration, idling");
            loop {
                core::future::pending::<()>().await;
            }
        };

        adc.calibrate().await;
        info!("Sampler running");

        let mut buf = [0i16; 1];
        loop {
            adc.sample(&mut buf).await;
            // Single-ended inputs read slightly negative around 0 V.
            let raw_level = u16::try_from(buf[0])
                .unwrap_or(0)
                .min(Conversion::RESOLUTION_MASK);
            reading.record(Conversion {
                raw_level,
                status_bit: self.status_pin.is_high(),
            });
        }
    }
}

impl SamplerHardware for NrfSampler {
    type Error = SamplerError;

    fn attach(&mut self, reading: &'static SampledReading) {
        self.reading = Some(reading);
    }

    fn configure(&mut self, config: &SamplerConfig) -> Result<(), Self::Error> {
        if config.channel != BATTERY_CHANNEL {
            return Err(SamplerError::ChannelUnavailable);
        }
        let (instance, ain3) = self.parts.take().ok_or(SamplerError::AlreadyConfigured)?;

        let mut adc_config = saadc::Config::default();
        adc_config.resolution = saadc::Resolution::_10BIT;

        let mut channel_cfg = saadc::ChannelConfig::single_ended(ain3);
        channel_cfg.reference = match config.reference {
            Reference::Internal => saadc::Reference::INTERNAL,
            Reference::Vdd => saadc::Reference::VDD1_4,
        };
        debug!(
            "SAADC on AIN{}, requested conversion clock {} Hz",
            config.channel,
            config.adc_clock_hz()
        );

        self.adc = Some(Saadc::new(instance, Irqs, adc_config, [channel_cfg]));
        Ok(())
    }
}
