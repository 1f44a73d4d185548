use crate::config_manager::types::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// The executor had no room left for the monitor task.
    TaskSpawn,
    /// Sampler, calibration or task configuration rejected by `verify()`.
    Config(ConfigError),
    /// The sampler hardware refused its configuration.
    Hardware,
    /// Status queue full, the rest of this cycle's reports were dropped.
    OutboundFull,
    /// Control queue full, the request never reached the task.
    InboundFull,
    /// Telemetry frame did not fit the buffer.
    Encode,
    /// Telemetry frame was not a valid COBS/postcard status message.
    Decode,
    /// The telemetry link failed to send a frame.
    Transport,
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}
