use embassy_sync::blocking_mutex::raw::RawMutex;

use crate::config_manager::types::ConfigError;
use crate::error::Error;
use crate::sampler::SampledReading;
use crate::state_machines::monitor::{TaskControl, TaskState};
use crate::types::{ControlMessage, Queue, StatusMessage};

/// Where the monitor task runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Priority {
    /// Cooperative thread-mode executor, alongside everything else.
    Thread,
    /// Dedicated interrupt executor at this NVIC level. Lower is more urgent.
    Interrupt(u8),
}

impl Priority {
    /// Lowest usable level on a 3 priority bit core.
    pub const MAX_INTERRUPT_LEVEL: u8 = 7;

    pub fn verify(&self) -> Result<(), ConfigError> {
        match *self {
            Priority::Thread => Ok(()),
            Priority::Interrupt(level) if level <= Self::MAX_INTERRUPT_LEVEL => Ok(()),
            Priority::Interrupt(_) => Err(ConfigError::InvalidPriority),
        }
    }
}

/// Everything the initializer needs besides hardware and configuration.
pub struct MonitorArgs<'a, C, S, M>
where
    C: Queue<ControlMessage> + ?Sized,
    S: Queue<StatusMessage> + ?Sized,
    M: RawMutex,
{
    pub reading: &'static SampledReading,
    pub control_queue: &'a C,
    pub status_queue: &'a S,
    pub control: &'a TaskControl<M>,
    pub priority: Priority,
}

impl<'a, C, S, M> MonitorArgs<'a, C, S, M>
where
    C: Queue<ControlMessage> + ?Sized,
    S: Queue<StatusMessage> + ?Sized,
    M: RawMutex,
{
    pub fn new(
        reading: &'static SampledReading,
        control_queue: &'a C,
        status_queue: &'a S,
        control: &'a TaskControl<M>,
        priority: Priority,
    ) -> Self {
        Self {
            reading,
            control_queue,
            status_queue,
            control,
            priority,
        }
    }
}

/// Owner side of a running monitor.
pub struct MonitorHandle<'a, C, M>
where
    C: Queue<ControlMessage> + ?Sized,
    M: RawMutex,
{
    control_queue: &'a C,
    control: &'a TaskControl<M>,
}

impl<'a, C, M> MonitorHandle<'a, C, M>
where
    C: Queue<ControlMessage> + ?Sized,
    M: RawMutex,
{
    pub(crate) fn new(control_queue: &'a C, control: &'a TaskControl<M>) -> Self {
        Self {
            control_queue,
            control,
        }
    }

    /// Asks the task to park at its next cycle. Never blocks.
    pub fn suspend(&self) -> Result<(), Error> {
        self.control_queue
            .try_push(ControlMessage::SuspendRequest)
            .map_err(|_| Error::InboundFull)?;
        self.control.suspend_requested();

        Ok(())
    }

    /// Ends the oldest suspension, even one the task has not reached yet.
    /// Returns `false` if nothing is suspended or about to be.
    pub fn resume(&self) -> bool {
        self.control.wake()
    }

    pub fn state(&self) -> TaskState {
        self.control.state()
    }
}

impl<C, M> Clone for MonitorHandle<'_, C, M>
where
    C: Queue<ControlMessage> + ?Sized,
    M: RawMutex,
{
    fn clone(&self) -> Self {
        Self {
            control_queue: self.control_queue,
            control: self.control,
        }
    }
}

/// Parks the monitor while the board runs from external power, when the
/// battery divider only shows the charger.
///
/// Repeated reports of the same power state are ignored, so every suspend it
/// sends is matched by exactly one resume.
#[derive(Debug, Default)]
pub struct ExternalPowerGate {
    suspended: bool,
}

impl ExternalPowerGate {
    pub fn update<C, M>(
        &mut self,
        monitor: &MonitorHandle<'_, C, M>,
        plugged_in: bool,
    ) -> Result<(), Error>
    where
        C: Queue<ControlMessage> + ?Sized,
        M: RawMutex,
    {
        match (plugged_in, self.suspended) {
            (true, false) => {
                monitor.suspend()?;
                self.suspended = true;
            }
            (false, true) => {
                self.suspended = false;
                if !monitor.resume() {
                    warn!("Battery monitor had no suspension to end");
                }
            }
            _ => {}
        }

        Ok(())
    }
}
