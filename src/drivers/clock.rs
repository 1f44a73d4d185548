use batmon::state_machines::monitor::Clock;
use embassy_time::{Instant, Timer};

/// Monitor clock backed by the RTC1 time driver.
pub struct EmbassyClock;

impl Clock for EmbassyClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    async fn wait_until(&mut self, deadline: Instant) {
        Timer::at(deadline).await;
    }
}
