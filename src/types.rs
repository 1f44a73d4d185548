use embassy_sync::{
    blocking_mutex::raw::RawMutex,
    channel::{Channel, TrySendError},
};
use serde::{Deserialize, Serialize};

/// Requests sent by the task's owner through the control queue.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ControlMessage {
    /// Park the monitor until it is resumed through its handle.
    SuspendRequest,
    /// Any request the monitor has no use for. Dropped silently.
    Other { kind: u8, value: f32 },
}

/// Reports emitted by the monitor, once per kind and period.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StatusMessage {
    /// Charge left, in percent of the calibrated range.
    BatteryLevel(f32),
    /// Level of the charger status pin, 0 or 1.
    BatteryStatusPin(u8),
}

impl StatusMessage {
    /// Numeric payload, the way the display side consumes it.
    pub fn value(&self) -> f32 {
        match *self {
            StatusMessage::BatteryLevel(percent) => percent,
            StatusMessage::BatteryStatusPin(pin) => f32::from(pin),
        }
    }
}

/// Bounded queue with non-blocking access on both ends.
pub trait Queue<T> {
    /// Enqueues `msg`, handing it back if the queue is full.
    fn try_push(&self, msg: T) -> Result<(), T>;
    /// Dequeues the oldest message, `None` when empty.
    fn try_pop(&self) -> Option<T>;
}

impl<M: RawMutex, T, const N: usize> Queue<T> for Channel<M, T, N> {
    fn try_push(&self, msg: T) -> Result<(), T> {
        match self.try_send(msg) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(msg)) => Err(msg),
        }
    }

    fn try_pop(&self) -> Option<T> {
        self.try_receive().ok()
    }
}
