use crate::types::StatusMessage;

/// Latest known battery state, as a display keeps it.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BatteryStatus {
    pub percent: Option<f32>,
    pub status_pin: Option<bool>,
}

impl BatteryStatus {
    pub fn apply(&mut self, msg: StatusMessage) {
        match msg {
            StatusMessage::BatteryLevel(percent) => self.percent = Some(percent),
            StatusMessage::BatteryStatusPin(pin) => self.status_pin = Some(pin != 0),
        }
    }
}
