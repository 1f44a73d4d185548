use batmon::telemetry::{encode_frame, BatteryStatus, MAX_FRAME_LEN};
use batmon::types::StatusMessage;
use batmon::Error;
use defmt::{debug, info, warn};
use embassy_nrf::gpio::AnyPin;
use embassy_nrf::peripherals;
use embassy_nrf::uarte::{self, UarteTx};

use crate::{Irqs, STATUS_QUEUE};

/// Sends a COBS-encoded status frame over UART.
async fn send_status(
    tx: &mut UarteTx<'_, peripherals::UARTE0>,
    msg: &StatusMessage,
) -> Result<(), Error> {
    let mut buf = [0u8; MAX_FRAME_LEN];
    let frame = encode_frame(msg, &mut buf)?;

    tx.write(frame).await.map_err(|_| Error::Transport)?;

    Ok(())
}

/// Downstream consumer of the battery monitor. Blocks on the status queue,
/// keeps the latest values and forwards every report on UARTE0.
#[embassy_executor::task]
pub async fn status_forwarder(instance: peripherals::UARTE0, pin_tx: AnyPin) {
    let mut config = uarte::Config::default();
    config.parity = uarte::Parity::EXCLUDED;
    config.baudrate = uarte::Baudrate::BAUD115200;
    let mut tx = UarteTx::new(instance, Irqs, pin_tx, config);

    let mut status = BatteryStatus::default();
    loop {
        let msg = STATUS_QUEUE.receive().await;
        debug!("Status report {}", msg.value());
        status.apply(msg);
        if let StatusMessage::BatteryStatusPin(_) = msg {
            info!("Battery: {}", status);
        }

        if let Err(e) = send_status(&mut tx, &msg).await {
            warn!("Status frame not sent: {}", e);
        }
    }
}
