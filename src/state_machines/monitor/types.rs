use core::sync::atomic::{AtomicU8, AtomicUsize, Ordering};

use embassy_sync::{blocking_mutex::raw::RawMutex, signal::Signal};
use embassy_time::{Duration, Instant};

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TaskState {
    Running = 0,
    Suspended = 1,
}

impl From<u8> for TaskState {
    fn from(value: u8) -> Self {
        match value {
            // A woken task stays suspended until it is scheduled again.
            SUSPENDED | WOKEN => TaskState::Suspended,
            _ => TaskState::Running,
        }
    }
}

const RUNNING: u8 = TaskState::Running as u8;
const SUSPENDED: u8 = TaskState::Suspended as u8;
const WOKEN: u8 = 2;

/// Per-task notification used to end a suspension, plus the task's state.
///
/// The wake signal travels outside the control queue so a parked task can be
/// resumed while it is not polling that queue. Suspensions requested through
/// [`MonitorHandle`](crate::tasks::MonitorHandle) are counted, and a wake
/// aimed at one of them is kept until the task parks on it.
pub struct TaskControl<M: RawMutex> {
    wake: Signal<M, ()>,
    state: AtomicU8,
    /// Suspend requests sent by the owner and not resumed yet.
    outstanding: AtomicUsize,
    /// Wakes not yet consumed by a parked task.
    credits: AtomicUsize,
}

impl<M: RawMutex> TaskControl<M> {
    pub const fn new() -> Self {
        Self {
            wake: Signal::new(),
            state: AtomicU8::new(RUNNING),
            outstanding: AtomicUsize::new(0),
            credits: AtomicUsize::new(0),
        }
    }

    pub fn state(&self) -> TaskState {
        TaskState::from(self.state.load(Ordering::Acquire))
    }

    /// Sends the wake signal. Returns `false`, and does nothing, when there is
    /// no suspension to end: no suspend request outstanding and the task not
    /// parked.
    pub fn wake(&self) -> bool {
        let woke = if decrement(&self.outstanding) {
            self.credits.fetch_add(1, Ordering::AcqRel);
            true
        } else {
            self.state
                .compare_exchange(SUSPENDED, WOKEN, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
        };

        if woke {
            self.wake.signal(());
        }
        woke
    }

    /// Records a suspend request that made it into the control queue.
    pub(crate) fn suspend_requested(&self) {
        self.outstanding.fetch_add(1, Ordering::AcqRel);
    }

    /// Blocks the calling task until it is woken. No timeout.
    pub(crate) async fn park(&self) {
        self.state.store(SUSPENDED, Ordering::Release);
        loop {
            if decrement(&self.credits)
                || self
                    .state
                    .compare_exchange(WOKEN, RUNNING, Ordering::AcqRel, Ordering::Acquire)
                    .is_ok()
            {
                break;
            }
            // Leftover signals only cost another pass through the checks.
            self.wake.wait().await;
        }
        self.state.store(RUNNING, Ordering::Release);
    }
}

impl<M: RawMutex> Default for TaskControl<M> {
    fn default() -> Self {
        Self::new()
    }
}

fn decrement(counter: &AtomicUsize) -> bool {
    counter
        .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
        .is_ok()
}

/// Absolute wake-up deadlines, one period apart.
///
/// Each deadline is derived from the previous deadline, never from the time
/// the caller got around to asking, so work done inside a period does not
/// shift the following ones.
#[derive(Debug, Clone, Copy)]
pub struct Cadence {
    deadline: Instant,
    period: Duration,
}

impl Cadence {
    pub fn new(start: Instant, period: Duration) -> Self {
        Self {
            deadline: start,
            period,
        }
    }

    pub fn next_deadline(&mut self) -> Instant {
        self.deadline = self.deadline + self.period;
        self.deadline
    }
}

/// Time source of the monitor loop.
#[allow(async_fn_in_trait)]
pub trait Clock {
    fn now(&self) -> Instant;

    /// Sleeps until `deadline`. Returns at once if it already passed.
    async fn wait_until(&mut self, deadline: Instant);
}

/// What a single cycle did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CycleReport {
    /// Control messages taken from the queue.
    pub drained: usize,
    /// Control messages of a kind the monitor does not handle.
    pub ignored: usize,
    /// Suspend requests served, each ended by a wake signal.
    pub suspensions: usize,
    /// Status messages that made it into the status queue.
    pub emitted: usize,
}
