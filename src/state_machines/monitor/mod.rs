pub mod types;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_time::Duration;

use crate::config_manager::types::Calibration;
use crate::error::Error;
use crate::sampler::SampledReading;
use crate::tasks::types::Priority;
use crate::types::{ControlMessage, Queue, StatusMessage};

pub use types::{Cadence, Clock, CycleReport, TaskControl, TaskState};

/// The periodic battery monitor.
///
/// Every period it drains the control queue without blocking, converts the
/// latest raw level into a percentage and reports level and status pin, in
/// that order, to the status queue.
pub struct MonitorTask<'a, C, S, M>
where
    C: Queue<ControlMessage> + ?Sized,
    S: Queue<StatusMessage> + ?Sized,
    M: RawMutex,
{
    reading: &'a SampledReading,
    control_queue: &'a C,
    status_queue: &'a S,
    control: &'a TaskControl<M>,
    calibration: Calibration,
    period: Duration,
    priority: Priority,
}

impl<'a, C, S, M> MonitorTask<'a, C, S, M>
where
    C: Queue<ControlMessage> + ?Sized,
    S: Queue<StatusMessage> + ?Sized,
    M: RawMutex,
{
    pub(crate) fn new(
        reading: &'a SampledReading,
        control_queue: &'a C,
        status_queue: &'a S,
        control: &'a TaskControl<M>,
        calibration: Calibration,
        period: Duration,
        priority: Priority,
    ) -> Self {
        Self {
            reading,
            control_queue,
            status_queue,
            control,
            calibration,
            period,
            priority,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    /// Runs the monitor. Never returns.
    pub async fn run<K: Clock>(self, mut clock: K) -> ! {
        info!(
            "Battery monitor started, period {} ms",
            self.period.as_millis()
        );
        let mut cadence = Cadence::new(clock.now(), self.period);
        loop {
            self.step(&mut clock, &mut cadence).await;
        }
    }

    /// Sleeps until the next deadline of `cadence`, then runs one cycle.
    pub async fn step<K: Clock>(&self, clock: &mut K, cadence: &mut Cadence) -> CycleReport {
        clock.wait_until(cadence.next_deadline()).await;
        self.cycle().await
    }

    /// One period worth of work: drain, convert, report.
    pub async fn cycle(&self) -> CycleReport {
        let mut report = CycleReport::default();
        self.drain(&mut report).await;

        if let Err(e) = self.emit(&mut report) {
            // Fresh values follow next period, nothing is retried.
            trace!(
                "Cycle abandoned after {} reports: {:?}",
                report.emitted,
                e
            );
        }

        report
    }

    /// Takes every pending control message. Only a suspend request may block,
    /// and only until the wake signal.
    async fn drain(&self, report: &mut CycleReport) {
        while let Some(msg) = self.control_queue.try_pop() {
            report.drained += 1;
            match msg {
                ControlMessage::SuspendRequest => {
                    report.suspensions += 1;
                    self.suspend().await;
                }
                other => {
                    report.ignored += 1;
                    trace!("Ignoring control message {:?}", other);
                }
            }
        }
    }

    async fn suspend(&self) {
        info!("Battery monitor suspended");
        self.control.park().await;
        info!("Battery monitor resumed");
    }

    fn emit(&self, report: &mut CycleReport) -> Result<(), Error> {
        let percent = self.calibration.percent(self.reading.raw_level());
        self.send(StatusMessage::BatteryLevel(percent))?;
        report.emitted += 1;

        let pin = u8::from(self.reading.status_bit());
        self.send(StatusMessage::BatteryStatusPin(pin))?;
        report.emitted += 1;

        Ok(())
    }

    fn send(&self, msg: StatusMessage) -> Result<(), Error> {
        self.status_queue
            .try_push(msg)
            .map_err(|_| Error::OutboundFull)
    }
}
