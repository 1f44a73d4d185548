//! Task construction. The firmware binary owns the executors and spawns what
//! is built here.

pub mod types;

use embassy_sync::blocking_mutex::raw::RawMutex;

use crate::config_manager::types::{MonitorConfig, SamplerConfig};
use crate::error::Error;
use crate::sampler::SamplerHardware;
use crate::state_machines::monitor::MonitorTask;
use crate::types::{ControlMessage, Queue, StatusMessage};

pub use types::{ExternalPowerGate, MonitorArgs, MonitorHandle, Priority};

/// Sets up the sampler and builds the battery monitor.
///
/// The converter is configured once and starts free-running, recording into
/// `args.reading`. Nothing is touched if any configuration is invalid.
pub fn init_battery_monitor<'a, H, C, S, M>(
    hw: &mut H,
    sampler_config: &SamplerConfig,
    monitor_config: &MonitorConfig,
    args: MonitorArgs<'a, C, S, M>,
) -> Result<(MonitorTask<'a, C, S, M>, MonitorHandle<'a, C, M>), Error>
where
    H: SamplerHardware,
    C: Queue<ControlMessage> + ?Sized,
    S: Queue<StatusMessage> + ?Sized,
    M: RawMutex,
{
    let sampler_config = sampler_config.verify()?;
    let monitor_config = monitor_config.verify()?;
    args.priority.verify()?;

    hw.attach(args.reading);
    if hw.configure(&sampler_config).is_err() {
        error!("Sampler rejected its configuration");
        return Err(Error::Hardware);
    }
    debug!(
        "Sampler running at {} Hz on channel {}",
        sampler_config.adc_clock_hz(),
        sampler_config.channel
    );

    let task = MonitorTask::new(
        args.reading,
        args.control_queue,
        args.status_queue,
        args.control,
        monitor_config.calibration,
        monitor_config.period(),
        args.priority,
    );
    let handle = MonitorHandle::new(args.control_queue, args.control);

    Ok((task, handle))
}

#[cfg(test)]
mod tests {
    use core::pin::pin;
    use core::task::Poll;

    use embassy_futures::{block_on, poll_once};
    use embassy_sync::blocking_mutex::raw::{CriticalSectionRawMutex, NoopRawMutex};
    use embassy_sync::channel::Channel;
    use embassy_time::Duration;

    use super::*;
    use crate::config_manager::types::{Calibration, ConfigError};
    use crate::sampler::simulated::SimulatedAdc;
    use crate::sampler::SampledReading;
    use crate::state_machines::monitor::{TaskControl, TaskState};

    type Controls = Channel<NoopRawMutex, ControlMessage, 2>;
    type Statuses = Channel<NoopRawMutex, StatusMessage, 4>;

    #[test]
    fn init_configures_sampler_and_builds_task() {
        static READING: SampledReading = SampledReading::new();
        let controls = Controls::new();
        let statuses = Statuses::new();
        let control = TaskControl::<NoopRawMutex>::new();
        let mut adc = SimulatedAdc::new();

        let args = MonitorArgs::new(
            &READING,
            &controls,
            &statuses,
            &control,
            Priority::Interrupt(2),
        );
        let (task, handle) = init_battery_monitor(
            &mut adc,
            &SamplerConfig::default(),
            &MonitorConfig::default(),
            args,
        )
        .unwrap();

        assert!(adc.is_attached());
        assert_eq!(adc.config(), Some(SamplerConfig::default()));
        assert_eq!(task.period(), Duration::from_millis(100));
        assert_eq!(task.priority(), Priority::Interrupt(2));
        assert_eq!(handle.state(), TaskState::Running);

        assert!(adc.complete_registers(0xBC, 0x02, 0x00));
        assert_eq!(READING.raw_level(), 700);
    }

    #[test]
    fn invalid_configuration_leaves_hardware_untouched() {
        static READING: SampledReading = SampledReading::new();
        let controls = Controls::new();
        let statuses = Statuses::new();
        let control = TaskControl::<NoopRawMutex>::new();
        let mut adc = SimulatedAdc::new();

        let bad_sampler = SamplerConfig {
            prescaler: 2,
            ..SamplerConfig::default()
        };
        let args = MonitorArgs::new(&READING, &controls, &statuses, &control, Priority::Thread);
        let err = init_battery_monitor(&mut adc, &bad_sampler, &MonitorConfig::default(), args)
            .err();
        assert_eq!(err, Some(Error::Config(ConfigError::ClockOutOfRange)));

        let bad_monitor = MonitorConfig {
            period_ms: 100,
            calibration: Calibration {
                raw_min: 700,
                raw_max: 545,
            },
        };
        let args = MonitorArgs::new(&READING, &controls, &statuses, &control, Priority::Thread);
        let err = init_battery_monitor(&mut adc, &SamplerConfig::default(), &bad_monitor, args)
            .err();
        assert_eq!(err, Some(Error::Config(ConfigError::InvalidCalibration)));

        let args = MonitorArgs::new(
            &READING,
            &controls,
            &statuses,
            &control,
            Priority::Interrupt(8),
        );
        let err = init_battery_monitor(
            &mut adc,
            &SamplerConfig::default(),
            &MonitorConfig::default(),
            args,
        )
        .err();
        assert_eq!(err, Some(Error::Config(ConfigError::InvalidPriority)));

        assert!(!adc.is_attached());
        assert_eq!(adc.config(), None);
    }

    #[test]
    fn rejected_hardware_fails_init() {
        static READING: SampledReading = SampledReading::new();
        let controls = Controls::new();
        let statuses = Statuses::new();
        let control = TaskControl::<NoopRawMutex>::new();
        let mut adc = SimulatedAdc::rejecting();

        let args = MonitorArgs::new(&READING, &controls, &statuses, &control, Priority::Thread);
        let err = init_battery_monitor(
            &mut adc,
            &SamplerConfig::default(),
            &MonitorConfig::default(),
            args,
        )
        .err();

        assert_eq!(err, Some(Error::Hardware));
        assert!(!adc.complete_registers(0x00, 0x02, 0x00));
    }

    #[test]
    fn handle_suspends_and_resumes_the_task() {
        static READING: SampledReading = SampledReading::new();
        let controls = Controls::new();
        let statuses = Statuses::new();
        let control = TaskControl::<NoopRawMutex>::new();
        let mut adc = SimulatedAdc::new();

        let args = MonitorArgs::new(&READING, &controls, &statuses, &control, Priority::Thread);
        let (task, handle) = init_battery_monitor(
            &mut adc,
            &SamplerConfig::default(),
            &MonitorConfig::default(),
            args,
        )
        .unwrap();
        let owner = handle.clone();

        assert!(!owner.resume());
        owner.suspend().unwrap();

        let mut cycle = pin!(task.cycle());
        assert!(poll_once(cycle.as_mut()).is_pending());
        assert_eq!(handle.state(), TaskState::Suspended);

        assert!(owner.resume());
        let report = match poll_once(cycle.as_mut()) {
            Poll::Ready(report) => report,
            Poll::Pending => panic!("resume did not wake the task"),
        };
        assert_eq!(report.suspensions, 1);
        assert_eq!(report.emitted, 2);
        assert_eq!(handle.state(), TaskState::Running);
    }

    #[test]
    fn suspend_reports_full_control_queue() {
        static READING: SampledReading = SampledReading::new();
        let controls = Controls::new();
        let statuses = Statuses::new();
        let control = TaskControl::<NoopRawMutex>::new();
        let mut adc = SimulatedAdc::new();

        let args = MonitorArgs::new(&READING, &controls, &statuses, &control, Priority::Thread);
        let (_task, handle) = init_battery_monitor(
            &mut adc,
            &SamplerConfig::default(),
            &MonitorConfig::default(),
            args,
        )
        .unwrap();

        assert_eq!(handle.suspend(), Ok(()));
        assert_eq!(handle.suspend(), Ok(()));
        assert_eq!(handle.suspend(), Err(Error::InboundFull));
    }

    #[test]
    fn resume_before_the_suspend_is_served_is_kept() {
        static READING: SampledReading = SampledReading::new();
        let controls = Controls::new();
        let statuses = Statuses::new();
        let control = TaskControl::<NoopRawMutex>::new();
        let mut adc = SimulatedAdc::new();

        let args = MonitorArgs::new(&READING, &controls, &statuses, &control, Priority::Thread);
        let (task, handle) = init_battery_monitor(
            &mut adc,
            &SamplerConfig::default(),
            &MonitorConfig::default(),
            args,
        )
        .unwrap();

        handle.suspend().unwrap();
        // The task has not run yet, the request is still queued.
        assert!(handle.resume());
        assert!(!handle.resume());

        let report = match poll_once(task.cycle()) {
            Poll::Ready(report) => report,
            Poll::Pending => panic!("early resume was lost"),
        };
        assert_eq!(report.suspensions, 1);
        assert_eq!(report.emitted, 2);
        assert_eq!(handle.state(), TaskState::Running);
    }

    #[test]
    fn each_resume_ends_one_suspension() {
        static READING: SampledReading = SampledReading::new();
        let controls = Controls::new();
        let statuses = Statuses::new();
        let control = TaskControl::<NoopRawMutex>::new();
        let mut adc = SimulatedAdc::new();

        let args = MonitorArgs::new(&READING, &controls, &statuses, &control, Priority::Thread);
        let (task, handle) = init_battery_monitor(
            &mut adc,
            &SamplerConfig::default(),
            &MonitorConfig::default(),
            args,
        )
        .unwrap();

        handle.suspend().unwrap();
        handle.suspend().unwrap();
        assert!(handle.resume());

        let mut cycle = pin!(task.cycle());
        // First request served by the early resume, parked on the second.
        assert!(poll_once(cycle.as_mut()).is_pending());
        assert_eq!(handle.state(), TaskState::Suspended);
        assert!(controls.is_empty());

        assert!(handle.resume());
        let report = match poll_once(cycle.as_mut()) {
            Poll::Ready(report) => report,
            Poll::Pending => panic!("second resume did not reach the task"),
        };
        assert_eq!(report.suspensions, 2);
        assert!(!handle.resume());
    }

    #[test]
    fn resume_from_another_thread_reaches_the_task() {
        static READING: SampledReading = SampledReading::new();
        let controls: Channel<CriticalSectionRawMutex, ControlMessage, 2> = Channel::new();
        let statuses: Channel<CriticalSectionRawMutex, StatusMessage, 4> = Channel::new();
        let control = TaskControl::<CriticalSectionRawMutex>::new();
        let mut adc = SimulatedAdc::new();

        let args = MonitorArgs::new(
            &READING,
            &controls,
            &statuses,
            &control,
            Priority::Interrupt(6),
        );
        let (task, handle) = init_battery_monitor(
            &mut adc,
            &SamplerConfig::default(),
            &MonitorConfig::default(),
            args,
        )
        .unwrap();

        for _ in 0..200 {
            handle.suspend().unwrap();
            // The resume may land before, during or after the park.
            let report = std::thread::scope(|s| {
                let monitor = s.spawn(|| block_on(task.cycle()));
                assert!(handle.resume());
                monitor.join().unwrap()
            });

            assert_eq!(report.suspensions, 1);
            assert_eq!(handle.state(), TaskState::Running);
            while statuses.try_pop().is_some() {}
        }
    }

    #[test]
    fn power_gate_pairs_every_suspend_with_one_resume() {
        static READING: SampledReading = SampledReading::new();
        let controls = Controls::new();
        let statuses = Statuses::new();
        let control = TaskControl::<NoopRawMutex>::new();
        let mut adc = SimulatedAdc::new();

        let args = MonitorArgs::new(&READING, &controls, &statuses, &control, Priority::Thread);
        let (task, handle) = init_battery_monitor(
            &mut adc,
            &SamplerConfig::default(),
            &MonitorConfig::default(),
            args,
        )
        .unwrap();
        let mut gate = ExternalPowerGate::default();

        // A quick unplug and replug is only seen as another "plugged in".
        gate.update(&handle, true).unwrap();
        gate.update(&handle, true).unwrap();
        assert_eq!(controls.len(), 1);

        let mut cycle = pin!(task.cycle());
        assert!(poll_once(cycle.as_mut()).is_pending());
        assert_eq!(handle.state(), TaskState::Suspended);

        gate.update(&handle, false).unwrap();
        gate.update(&handle, false).unwrap();
        let report = match poll_once(cycle.as_mut()) {
            Poll::Ready(report) => report,
            Poll::Pending => panic!("unplug did not resume the monitor"),
        };
        assert_eq!(report.suspensions, 1);
        assert_eq!(handle.state(), TaskState::Running);
        assert!(controls.is_empty());
    }

    #[test]
    fn power_gate_reports_a_full_control_queue() {
        static READING: SampledReading = SampledReading::new();
        let controls = Controls::new();
        let statuses = Statuses::new();
        let control = TaskControl::<NoopRawMutex>::new();
        let mut adc = SimulatedAdc::new();

        let args = MonitorArgs::new(&READING, &controls, &statuses, &control, Priority::Thread);
        let (_task, handle) = init_battery_monitor(
            &mut adc,
            &SamplerConfig::default(),
            &MonitorConfig::default(),
            args,
        )
        .unwrap();
        controls.try_push(ControlMessage::Other { kind: 1, value: 0.0 }).unwrap();
        controls.try_push(ControlMessage::Other { kind: 2, value: 0.0 }).unwrap();

        let mut gate = ExternalPowerGate::default();
        assert_eq!(gate.update(&handle, true), Err(Error::InboundFull));
        // Nothing was sent, so there is nothing to resume either.
        assert_eq!(gate.update(&handle, false), Ok(()));
        assert!(!handle.resume());
    }
}
