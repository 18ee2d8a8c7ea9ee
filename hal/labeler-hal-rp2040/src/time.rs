//! Time base over embassy-time

use embassy_time::{block_for, Duration, Instant};
use labeler_hal::time::{Clock, Delay};

/// Uptime clock with busy-wait delays
///
/// The machine sequences run synchronously on the controller, so the delay
/// spins instead of yielding to the executor.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbassyTime;

impl Clock for EmbassyTime {
    fn now_ms(&self) -> u64 {
        Instant::now().as_millis()
    }
}

impl Delay for EmbassyTime {
    fn delay_ms(&mut self, ms: u32) {
        block_for(Duration::from_millis(u64::from(ms)));
    }
}
