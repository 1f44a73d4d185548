#![no_std]
#![no_main]

mod drivers;
mod power_manager;
mod prelude;
mod serial;

use batmon::config_manager::types::{MonitorConfig, SamplerConfig};
use batmon::sampler::SampledReading;
use batmon::state_machines::monitor::{MonitorTask, TaskControl};
use batmon::tasks::{init_battery_monitor, MonitorArgs, MonitorHandle, Priority};
use batmon::types::{ControlMessage, StatusMessage};
use batmon::Error;
use cortex_m_rt::entry;
use defmt::{error, info};
use embassy_executor::{Executor, InterruptExecutor, Spawner};
use embassy_nrf::interrupt;
use embassy_nrf::interrupt::InterruptExt;
use embassy_nrf::{bind_interrupts, gpio::Pin, peripherals, saadc, uarte};
use embassy_sync::{blocking_mutex::raw::CriticalSectionRawMutex, channel::Channel};
use static_cell::StaticCell;

use drivers::{clock::EmbassyClock, sampler::NrfSampler};

bind_interrupts!(pub struct Irqs {
    SAADC => saadc::InterruptHandler;
    UARTE0_UART0 => uarte::InterruptHandler<peripherals::UARTE0>;
});

const QUEUE_LEN: usize = 4;
/// Where the battery monitor runs. Interrupt levels use `MONITOR_EXECUTOR`.
const MONITOR_PRIORITY: Priority = Priority::Interrupt(6);
const MONITOR_CONFIG: MonitorConfig = MonitorConfig::DEFAULT;

type ControlQueue = Channel<CriticalSectionRawMutex, ControlMessage, QUEUE_LEN>;
type StatusQueue = Channel<CriticalSectionRawMutex, StatusMessage, QUEUE_LEN>;
type BatteryMonitor = MonitorTask<'static, ControlQueue, StatusQueue, CriticalSectionRawMutex>;
pub type BatteryMonitorHandle = MonitorHandle<'static, ControlQueue, CriticalSectionRawMutex>;

/// Requests from the power manager to the monitor.
static CONTROL_QUEUE: ControlQueue = Channel::new();
/// Reports from the monitor to the UART forwarder.
pub static STATUS_QUEUE: StatusQueue = Channel::new();
/// Written by the sampler only.
static READING: SampledReading = SampledReading::new();
static MONITOR_CONTROL: TaskControl<CriticalSectionRawMutex> = TaskControl::new();

static EXECUTOR: StaticCell<Executor> = StaticCell::new();
static MONITOR_EXECUTOR: InterruptExecutor = InterruptExecutor::new();

#[interrupt]
unsafe fn SWI1_EGU1() {
    MONITOR_EXECUTOR.on_interrupt()
}

#[embassy_executor::task]
async fn battery_monitor_task(monitor: BatteryMonitor) {
    monitor.run(EmbassyClock).await
}

#[embassy_executor::task]
async fn sampler_task(mut sampler: NrfSampler) {
    sampler.run().await
}

fn nvic_priority(level: u8) -> interrupt::Priority {
    match level {
        0 => interrupt::Priority::P0,
        1 => interrupt::Priority::P1,
        2 => interrupt::Priority::P2,
        3 => interrupt::Priority::P3,
        4 => interrupt::Priority::P4,
        5 => interrupt::Priority::P5,
        6 => interrupt::Priority::P6,
        _ => interrupt::Priority::P7,
    }
}

/// Puts the monitor on the executor its priority asks for.
fn spawn_monitor(spawner: &Spawner, monitor: BatteryMonitor) -> Result<(), Error> {
    let spawned = match monitor.priority() {
        Priority::Thread => spawner.spawn(battery_monitor_task(monitor)),
        Priority::Interrupt(level) => {
            interrupt::SWI1_EGU1.set_priority(nvic_priority(level));
            let spawner = MONITOR_EXECUTOR.start(interrupt::SWI1_EGU1);
            spawner.spawn(battery_monitor_task(monitor))
        }
    };

    spawned.map_err(|_| Error::TaskSpawn)
}

#[embassy_executor::task]
async fn main_task(spawner: Spawner) {
    let mut config = embassy_nrf::config::Config::default();
    config.gpiote_interrupt_priority = embassy_nrf::interrupt::Priority::P2;
    config.time_interrupt_priority = embassy_nrf::interrupt::Priority::P2;
    let p = embassy_nrf::init(config);

    let mut sampler = NrfSampler::new(p.SAADC, p.P0_05, p.P0_06.degrade());
    let args = MonitorArgs::new(
        &READING,
        &CONTROL_QUEUE,
        &STATUS_QUEUE,
        &MONITOR_CONTROL,
        MONITOR_PRIORITY,
    );
    let (monitor, handle) = match init_battery_monitor(
        &mut sampler,
        &SamplerConfig::default(),
        &MONITOR_CONFIG,
        args,
    ) {
        Ok(created) => created,
        Err(e) => {
            error!("Battery monitor init failed: {}", e);
            return;
        }
    };

    spawner.must_spawn(sampler_task(sampler));
    if let Err(e) = spawn_monitor(&spawner, monitor) {
        error!("Battery monitor not started: {}", e);
        return;
    }
    spawner.must_spawn(serial::status_forwarder(p.UARTE0, p.P0_03.degrade()));
    spawner.must_spawn(power_manager::power_state_task(p.P0_04.degrade(), handle));
}

#[entry]
fn main() -> ! {
    info!("Booted successfully!");

    let executor = EXECUTOR.init(Executor::new());
    executor.run(|spawner| spawner.must_spawn(main_task(spawner)));
}
