use defmt::{info, warn};
use embassy_futures::select::select;
use embassy_nrf::gpio::{AnyPin, Input, Pull};
use embassy_sync::{blocking_mutex::raw::ThreadModeRawMutex, signal::Signal};

use batmon::tasks::ExternalPowerGate;

use crate::BatteryMonitorHandle;

/// This flag synchronizes the pin watcher with the hook.
static PLUGGED_SIG: Signal<ThreadModeRawMutex, bool> = Signal::new();

/// Executes whenever the power state changes.
async fn power_hook(monitor: BatteryMonitorHandle) {
    let mut gate = ExternalPowerGate::default();
    loop {
        let plugged_in = PLUGGED_SIG.wait().await;
        if let Err(e) = gate.update(&monitor, plugged_in) {
            warn!("Could not pause battery monitor: {}", e);
        }
    }
}

#[embassy_executor::task]
pub async fn power_state_task(monitor_pin: AnyPin, monitor: BatteryMonitorHandle) {
    let mut plugged_detect = Input::new(monitor_pin, Pull::None);
    select(power_hook(monitor), async {
        loop {
            plugged_detect.wait_for_high().await;
            info!("Plugged in");
            PLUGGED_SIG.signal(true);
            plugged_detect.wait_for_low().await;
            info!("Plugged out");
            PLUGGED_SIG.signal(false);
        }
    })
    .await;
}
